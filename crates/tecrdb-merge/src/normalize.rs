//! Field normalization: turning free-text cells into comparable values.

use once_cell::sync::Lazy;
use regex::Regex;
use tecrdb_core::{SourceKind, is_blank};

pub use tecrdb_core::reference_stem as strip_reference_suffix;

/// Significant figures kept when comparing `du` values.
const DU_SIGNIFICANT_FIGURES: i32 = 2;

static KEQ_ANNOTATED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w\?\w+").expect("valid keq annotation regex"));
static KEQ_ANNOTATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?\w+").expect("valid keq annotation regex"));

/// Outcome of comparing two cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    /// Both sides are numbers that differ after source-specific rounding.
    NumericMismatch,
    Unequal,
}

impl Comparison {
    pub fn is_equal(self) -> bool {
        self == Comparison::Equal
    }
}

/// True if the text parses as an integer or a finite float.
pub fn is_numeric(value: &str) -> bool {
    let value = value.trim();
    if is_blank(value) {
        return false;
    }
    value.parse::<i64>().is_ok() || value.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Parse `value` and apply the rounding policy of `source`.
///
/// `noor` values are compared exactly; `du` values only keep two significant
/// figures because that table was transcribed with less precision.
pub fn round_for_comparison(value: &str, source: SourceKind) -> Option<f64> {
    let parsed = value.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(match source {
        SourceKind::Noor => parsed,
        SourceKind::Du => round_significant(parsed, DU_SIGNIFICANT_FIGURES),
    })
}

fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(digits - 1 - magnitude);
    if !scale.is_finite() || scale == 0.0 {
        return value;
    }
    (value * scale).round() / scale
}

/// Compare two cells under the rounding policy of `source`.
pub fn compare(a: Option<&str>, b: Option<&str>, source: SourceKind) -> Comparison {
    let a = a.map(str::trim).unwrap_or("");
    let b = b.map(str::trim).unwrap_or("");

    match (is_numeric(a), is_numeric(b)) {
        (true, true) => {
            if round_for_comparison(a, source) == round_for_comparison(b, source) {
                Comparison::Equal
            } else {
                Comparison::NumericMismatch
            }
        }
        // a blank placeholder never vouches for a match
        (false, false) if is_blank(a) || is_blank(b) => Comparison::Unequal,
        _ if a == b => Comparison::Equal,
        _ => Comparison::Unequal,
    }
}

pub fn values_equal(a: Option<&str>, b: Option<&str>, source: SourceKind) -> bool {
    compare(a, b, source).is_equal()
}

/// Drop the `~` (approximate) and `?` (uncertain) markers around a value.
pub fn strip_tolerance_markers(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '~' || c == '?')
}

/// Temperatures were occasionally transcribed with `l` for `1`.
pub fn fix_temperature_transcription(value: &str) -> String {
    value.trim().replace('l', "1")
}

/// Remove `?word` annotations trailing a master Keq (`4.5?approx`).
pub fn strip_keq_annotation(value: &str) -> String {
    if KEQ_ANNOTATED_RE.is_match(value) {
        KEQ_ANNOTATION_RE.replace_all(value, "").into_owned()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_detection() {
        assert!(is_numeric("7"));
        assert!(is_numeric(" 298.15 "));
        assert!(is_numeric("1.2e-3"));
        assert!(is_numeric("-4"));
        assert!(!is_numeric(" "));
        assert!(!is_numeric("nan"));
        assert!(!is_numeric("inf"));
        assert!(!is_numeric("~7.0"));
        assert!(!is_numeric("77LIE/VAL"));
    }

    #[test]
    fn noor_compares_exactly() {
        assert!(values_equal(Some("298.15"), Some("298.150"), SourceKind::Noor));
        assert_eq!(
            compare(Some("298.15"), Some("298.16"), SourceKind::Noor),
            Comparison::NumericMismatch
        );
    }

    #[test]
    fn du_rounds_to_two_significant_figures() {
        assert!(values_equal(Some("298.15"), Some("300"), SourceKind::Du));
        assert!(values_equal(Some("0.0123"), Some("0.012"), SourceKind::Du));
        assert!(values_equal(Some("650"), Some("652.3"), SourceKind::Du));
        assert!(!values_equal(Some("650"), Some("700"), SourceKind::Du));
    }

    #[test]
    fn blank_placeholders_never_match() {
        assert!(!values_equal(Some(" "), Some(" "), SourceKind::Noor));
        assert!(!values_equal(None, Some("77LIE/VAL"), SourceKind::Noor));
        assert!(!values_equal(None, None, SourceKind::Du));
    }

    #[test]
    fn text_compares_after_trimming() {
        assert!(values_equal(Some(" 77LIE/VAL"), Some("77LIE/VAL "), SourceKind::Noor));
        assert!(!values_equal(Some("77LIE/VAL"), Some("82TEW/GOL"), SourceKind::Noor));
        assert!(!values_equal(Some("7"), Some("7a"), SourceKind::Du));
    }

    #[test]
    fn equality_is_symmetric() {
        let samples = [
            "0", "1", "7.0", "7.00", "298.15", "298.2", "300", "0.0123", "0.012", "650",
            "652.3", "-4", "1e3", "1000", "1.05e-4", "0.000105",
        ];
        for source in SourceKind::all() {
            for a in samples {
                for b in samples {
                    assert_eq!(
                        values_equal(Some(a), Some(b), source),
                        values_equal(Some(b), Some(a), source),
                        "{a} vs {b} under {source}"
                    );
                }
            }
        }
    }

    #[test]
    fn tolerance_markers_are_stripped() {
        assert_eq!(strip_tolerance_markers("~7.0"), "7.0");
        assert_eq!(strip_tolerance_markers("?7.0?"), "7.0");
        assert_eq!(strip_tolerance_markers("7.0"), "7.0");
    }

    #[test]
    fn temperature_transcription_is_fixed() {
        assert_eq!(fix_temperature_transcription("3l1.15"), "311.15");
    }

    #[test]
    fn keq_annotation_is_removed() {
        assert_eq!(strip_keq_annotation("4.5?approx"), "4.5");
        assert_eq!(strip_keq_annotation("?4.5"), "?4.5");
        assert_eq!(strip_keq_annotation("650"), "650");
    }
}
