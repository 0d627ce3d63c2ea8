//! Blank-aware text fields.
//!
//! Every attribute of a record is carried as optional text. `None` is the
//! in-memory blank; on disk a blank cell is a single space so downstream
//! tooling can tell "intentionally blank" from "never populated".

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

/// Persisted representation of a blank cell.
pub const BLANK: &str = " ";

/// True for the placeholders the upstream tables use for "no value".
pub fn is_blank(value: &str) -> bool {
    matches!(value.trim(), "" | "nan" | "NaN" | "None")
}

/// Collapse blank placeholders into `None`.
pub fn clean(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_blank(v))
}

/// Reference ids carry a per-datum suffix after the first underscore
/// (`77LIE/VAL_1382`); only the stem identifies the publication.
pub fn reference_stem(reference: &str) -> &str {
    reference.split('_').next().unwrap_or(reference).trim()
}

pub(crate) fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(clean(raw))
}

pub(crate) fn index_or_blank<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(text) = clean(raw) else {
        return Ok(None);
    };
    let text = text.trim();
    if let Ok(index) = text.parse::<usize>() {
        return Ok(Some(index));
    }
    // pandas writes integer columns containing blanks as floats ("12.0")
    match text.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 => Ok(Some(value as usize)),
        _ => Err(D::Error::custom(format!("invalid row index '{text}'"))),
    }
}

pub(crate) fn blank_placeholder<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(BLANK))
}

pub(crate) fn index_placeholder<S>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(index) => serializer.serialize_u64(*index as u64),
        None => serializer.serialize_str(BLANK),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_blank() {
        assert!(is_blank(""));
        assert!(is_blank(" "));
        assert!(is_blank("nan"));
        assert!(is_blank("None"));
        assert!(!is_blank("0"));
        assert!(!is_blank("ATP"));
    }

    #[test]
    fn clean_drops_placeholders() {
        assert_eq!(clean(Some(" ".to_string())), None);
        assert_eq!(clean(Some("7.0".to_string())), Some("7.0".to_string()));
        assert_eq!(clean(None), None);
    }

    #[test]
    fn reference_stem_strips_suffix() {
        assert_eq!(reference_stem("77LIE/VAL_1382"), "77LIE/VAL");
        assert_eq!(reference_stem("77LIE/VAL_a_b"), "77LIE/VAL");
        assert_eq!(reference_stem("82TEW/GOL"), "82TEW/GOL");
    }
}
