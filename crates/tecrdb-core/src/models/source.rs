use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::field::{blank_as_none, clean};

/// Upstream dataset a new table was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Noor,
    Du,
}

impl SourceKind {
    pub fn all() -> [SourceKind; 2] {
        [SourceKind::Noor, SourceKind::Du]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Noor => "noor",
            SourceKind::Du => "du",
        }
    }

    /// Column holding the enzyme name in this source's native layout.
    pub fn enzyme_column(&self) -> &'static str {
        match self {
            SourceKind::Noor => "enzyme_name",
            SourceKind::Du => "Enzyme",
        }
    }

    /// Column holding the reference id in this source's native layout.
    pub fn reference_column(&self) -> &'static str {
        match self {
            SourceKind::Noor => "reference",
            SourceKind::Du => "Reference_id",
        }
    }

    /// Guess the source from a file name such as `TECRDB_noor.csv`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.rsplit('_').next()?.split('.').next()?;
        stem.parse().ok()
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "noor" => Ok(SourceKind::Noor),
            "du" => Ok(SourceKind::Du),
            other => Err(CoreError::UnknownSource(other.to_string())),
        }
    }
}

/// Row of the equilibrator-derived TECRDB table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NoorRecord {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub enzyme_name: Option<String>,
    /// KEGG-formatted reaction.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub reaction: Option<String>,
    #[serde(rename = "EC", default, deserialize_with = "blank_as_none")]
    pub ec: Option<String>,
    /// Free-text reaction formula.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub temperature: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub p_h: Option<String>,
    #[serde(rename = "K_prime", default, deserialize_with = "blank_as_none")]
    pub k_prime: Option<String>,
    #[serde(rename = "K", default, deserialize_with = "blank_as_none")]
    pub k: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub ionic_strength: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub p_mg: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub method: Option<String>,
}

/// Row of the Du et al. supplementary Keq table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DuRecord {
    #[serde(rename = "Enzyme", default, deserialize_with = "blank_as_none")]
    pub enzyme: Option<String>,
    #[serde(
        rename = "Reaction formula in CID format",
        default,
        deserialize_with = "blank_as_none"
    )]
    pub cid_reaction: Option<String>,
    #[serde(rename = "EC value", default, deserialize_with = "blank_as_none")]
    pub ec: Option<String>,
    #[serde(rename = "Reaction", default, deserialize_with = "blank_as_none")]
    pub reaction: Option<String>,
    #[serde(rename = "Reference_id", default, deserialize_with = "blank_as_none")]
    pub reference_id: Option<String>,
    #[serde(rename = "T(K)", default, deserialize_with = "blank_as_none")]
    pub temperature: Option<String>,
    #[serde(rename = "pH", default, deserialize_with = "blank_as_none")]
    pub ph: Option<String>,
    #[serde(rename = "K'", default, deserialize_with = "blank_as_none")]
    pub k_prime: Option<String>,
    #[serde(rename = "Ionic strength", default, deserialize_with = "blank_as_none")]
    pub ionic_strength: Option<String>,
    #[serde(
        rename = "Buffer/reagents/solute added",
        default,
        deserialize_with = "blank_as_none"
    )]
    pub buffer: Option<String>,
    #[serde(rename = "Method", default, deserialize_with = "blank_as_none")]
    pub method: Option<String>,
    #[serde(rename = "media conditions", default, deserialize_with = "blank_as_none")]
    pub media_conditions: Option<String>,
    #[serde(rename = "electrolytes", default, deserialize_with = "blank_as_none")]
    pub electrolytes: Option<String>,
    #[serde(rename = "pMg", default, deserialize_with = "blank_as_none")]
    pub p_mg: Option<String>,
}

/// A row of a new table in its native layout.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    Noor(NoorRecord),
    Du(DuRecord),
}

/// Common attribute shape every source row is mapped into before matching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedRecord {
    pub source: SourceKind,
    /// Row position in the new table.
    pub source_index: usize,
    pub enzyme: Option<String>,
    pub kegg_reaction: Option<String>,
    pub cid_reaction: Option<String>,
    pub ec: Option<String>,
    pub reaction: Option<String>,
    pub reference_id: Option<String>,
    pub temperature: Option<String>,
    pub ph: Option<String>,
    pub keq: Option<String>,
    pub ionic_strength: Option<String>,
    pub pmg: Option<String>,
    pub method: Option<String>,
    pub buffer: Option<String>,
    pub conditions: Option<String>,
}

impl UnifiedRecord {
    /// Empty record of the given source; handy for building test fixtures.
    pub fn empty(source: SourceKind, source_index: usize) -> Self {
        Self {
            source,
            source_index,
            enzyme: None,
            kegg_reaction: None,
            cid_reaction: None,
            ec: None,
            reaction: None,
            reference_id: None,
            temperature: None,
            ph: None,
            keq: None,
            ionic_strength: None,
            pmg: None,
            method: None,
            buffer: None,
            conditions: None,
        }
    }
}

impl SourceRecord {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceRecord::Noor(_) => SourceKind::Noor,
            SourceRecord::Du(_) => SourceKind::Du,
        }
    }

    pub fn to_unified(&self, source_index: usize) -> UnifiedRecord {
        match self {
            SourceRecord::Noor(row) => UnifiedRecord {
                source: SourceKind::Noor,
                source_index,
                enzyme: row.enzyme_name.clone(),
                kegg_reaction: row.reaction.clone(),
                cid_reaction: None,
                ec: row.ec.clone(),
                reaction: row.description.clone(),
                reference_id: row.reference.clone(),
                temperature: row.temperature.clone(),
                ph: row.p_h.clone(),
                // K' is absent for datums reported as plain K
                keq: row.k_prime.clone().or_else(|| row.k.clone()),
                ionic_strength: row.ionic_strength.clone(),
                pmg: row.p_mg.clone(),
                method: row.method.clone(),
                buffer: None,
                conditions: None,
            },
            SourceRecord::Du(row) => {
                let parts: Vec<&str> = [&row.media_conditions, &row.electrolytes, &row.p_mg]
                    .into_iter()
                    .filter_map(|part| part.as_deref())
                    .map(str::trim)
                    .collect();
                UnifiedRecord {
                    source: SourceKind::Du,
                    source_index,
                    enzyme: row.enzyme.clone(),
                    kegg_reaction: None,
                    cid_reaction: row.cid_reaction.clone(),
                    ec: row.ec.clone(),
                    reaction: row.reaction.clone(),
                    reference_id: row.reference_id.clone(),
                    temperature: row.temperature.clone(),
                    ph: row.ph.clone(),
                    keq: row.k_prime.clone(),
                    ionic_strength: row.ionic_strength.clone(),
                    pmg: row.p_mg.clone(),
                    method: row.method.clone(),
                    buffer: row.buffer.clone(),
                    conditions: clean(Some(parts.join(" ; "))),
                }
            }
        }
    }
}
