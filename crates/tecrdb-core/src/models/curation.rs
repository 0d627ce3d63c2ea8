use serde::Deserialize;

/// One line of the manual curation sheet, as typed by the curator.
///
/// Index cells hold a number, a `start-end` range, `New` or `--`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CurationRow {
    #[serde(rename = "Error resolution", default)]
    pub resolution: String,
    #[serde(rename = "Master file index", default)]
    pub master_index: String,
    #[serde(rename = "New index", default)]
    pub new_index: String,
}

impl CurationRow {
    pub fn new(
        resolution: impl Into<String>,
        master_index: impl Into<String>,
        new_index: impl Into<String>,
    ) -> Self {
        Self {
            resolution: resolution.into().trim().to_string(),
            master_index: master_index.into().trim().to_string(),
            new_index: new_index.into().trim().to_string(),
        }
    }
}
