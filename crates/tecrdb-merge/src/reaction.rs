//! Reaction-string canonicalization.
//!
//! The scraped master reactions and the curated source reactions disagree on
//! a handful of typographic conventions. Rather than normalising both sides
//! blindly, the master string is rewritten one rule at a time until it equals
//! the incoming string or the rules run out.

use once_cell::sync::Lazy;
use regex::Regex;
use tecrdb_core::SourceKind;
use tracing::trace;

/// Number of rewrite rules, and so the attempt cap per candidate.
pub const MAX_ATTEMPTS: usize = 5;

static STRAY_MINUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"= -(\w)").expect("valid stray minus regex"));
static D_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\s)-D-").expect("valid D marker regex"));
static CHARGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)(\d)-").expect("valid charge regex"));
static STEREO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\w\)-").expect("valid stereo descriptor regex"));
static LIPOATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-lipoate").expect("valid lipoate regex"));

struct RewriteRule {
    name: &'static str,
    pattern: &'static Lazy<Regex>,
    rewrite: fn(&str, usize) -> String,
}

static RULES: [RewriteRule; MAX_ATTEMPTS] = [
    RewriteRule {
        name: "stray-minus",
        pattern: &STRAY_MINUS_RE,
        rewrite: strip_stray_minus,
    },
    RewriteRule {
        name: "d-marker",
        pattern: &D_MARKER_RE,
        rewrite: strip_d_marker,
    },
    RewriteRule {
        name: "charge-notation",
        pattern: &CHARGE_RE,
        rewrite: reformat_charges,
    },
    RewriteRule {
        name: "stereo-descriptor",
        pattern: &STEREO_RE,
        rewrite: strip_stereo_descriptors,
    },
    RewriteRule {
        name: "lipoate",
        pattern: &LIPOATE_RE,
        rewrite: strip_lipoate_hyphen,
    },
];

fn strip_stray_minus(reaction: &str, _: usize) -> String {
    STRAY_MINUS_RE.replace_all(reaction, "= ${1}").into_owned()
}

fn strip_d_marker(reaction: &str, _: usize) -> String {
    D_MARKER_RE.replacen(reaction, 1, "${1}D-").into_owned()
}

fn strip_stereo_descriptors(reaction: &str, _: usize) -> String {
    STEREO_RE.replace_all(reaction, "").into_owned()
}

fn strip_lipoate_hyphen(reaction: &str, _: usize) -> String {
    LIPOATE_RE.replacen(reaction, 1, "lipoate").into_owned()
}

/// `ATP4-` becomes `ATP-4-`, repeatedly, until no trailing charge is left.
fn reformat_charges(reaction: &str, max_rewrites: usize) -> String {
    let mut current = reaction.to_string();
    for _ in 0..max_rewrites {
        if !CHARGE_RE.is_match(&current) {
            break;
        }
        current = CHARGE_RE.replace_all(&current, "${1}-${2}-").into_owned();
    }
    current
}

/// Undo encoding damage specific to one source before any rule runs.
fn pretreat(reaction: &str, source: SourceKind) -> String {
    match source {
        // UTF-8 α, β and ω read back as Latin-1
        SourceKind::Noor => reaction
            .replace("\u{00ce}\u{00b1}", "")
            .replace("\u{00ce}\u{00b2}", "")
            .replace("\u{00cf}\u{2030}", "-w"),
        SourceKind::Du => reaction.to_string(),
    }
}

/// Result of rewriting a master reaction towards an incoming one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalization {
    pub reaction: String,
    /// Rules consumed before the strings converged (or all of them).
    pub attempts: usize,
    pub converged: bool,
}

#[derive(Debug, Clone)]
pub struct ReactionCanonicalizer {
    max_charge_rewrites: usize,
}

impl Default for ReactionCanonicalizer {
    fn default() -> Self {
        Self {
            max_charge_rewrites: 64,
        }
    }
}

impl ReactionCanonicalizer {
    pub fn new(max_charge_rewrites: usize) -> Self {
        Self {
            max_charge_rewrites: max_charge_rewrites.max(1),
        }
    }

    /// Rewrite `master` until it equals `target`, attempting each rule once
    /// in order. A rule whose pattern is absent still consumes its attempt.
    pub fn canonicalize(&self, master: &str, target: &str, source: SourceKind) -> Canonicalization {
        let target = target.trim();
        let mut reaction = pretreat(master.trim(), source);
        let mut attempts = 0;

        while reaction != target {
            let Some(rule) = RULES.get(attempts) else {
                return Canonicalization {
                    reaction,
                    attempts,
                    converged: false,
                };
            };
            if rule.pattern.is_match(&reaction) {
                reaction = (rule.rewrite)(&reaction, self.max_charge_rewrites);
                trace!(rule = rule.name, %reaction, "rewrote master reaction");
            }
            attempts += 1;
        }

        Canonicalization {
            reaction,
            attempts,
            converged: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(master: &str, target: &str) -> Canonicalization {
        ReactionCanonicalizer::default().canonicalize(master, target, SourceKind::Du)
    }

    #[test]
    fn identical_reactions_need_no_attempt() {
        let result = canon("A + B = C", "A + B = C");
        assert!(result.converged);
        assert_eq!(result.attempts, 0);
    }

    #[test]
    fn stray_minus_is_stripped_first() {
        let result = canon("A + B = -C", "A + B = C");
        assert!(result.converged);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.reaction, "A + B = C");
    }

    #[test]
    fn d_marker_only_first_occurrence() {
        let result = canon(
            "ATP + -D-glucose = ADP + -D-glucose 6-phosphate",
            "ATP + D-glucose = ADP + -D-glucose 6-phosphate",
        );
        assert!(result.converged);
        assert_eq!(result.attempts, 2);
    }

    #[test]
    fn charge_notation_is_reformatted() {
        let result = canon("ATP4- + H2O = ADP3- + phosphate2-", "ATP-4- + H2O = ADP-3- + phosphate-2-");
        assert!(result.converged);
        assert_eq!(result.attempts, 3);
    }

    #[test]
    fn stereo_descriptors_are_removed() {
        let result = canon("(S)-malate + NAD = oxaloacetate + NADH", "malate + NAD = oxaloacetate + NADH");
        assert!(result.converged);
        assert_eq!(result.attempts, 4);
    }

    #[test]
    fn lipoate_hyphen_is_removed() {
        let result = canon("protein N-(-lipoate)lysine = X", "protein N-(lipoate)lysine = X");
        assert!(result.converged);
        assert_eq!(result.attempts, 5);
    }

    #[test]
    fn rules_exhausted_is_a_mismatch() {
        let result = canon("A + B = C", "D + E = F");
        assert!(!result.converged);
        assert_eq!(result.attempts, MAX_ATTEMPTS);
    }

    #[test]
    fn noor_pretreatment_fixes_encoding() {
        let canonicalizer = ReactionCanonicalizer::default();
        let result = canonicalizer.canonicalize(
            "\u{00ce}\u{00b1}-D-glucose = \u{00cf}\u{2030}-hydroxy",
            "-D-glucose = -w-hydroxy",
            SourceKind::Noor,
        );
        assert!(result.converged);
        assert_eq!(result.attempts, 0);
    }

    #[test]
    fn converged_output_is_a_fixed_point() {
        let canonicalizer = ReactionCanonicalizer::default();
        let cases = [
            ("A + B = -C", "A + B = C"),
            ("ATP4- + H2O = ADP3-", "ATP-4- + H2O = ADP-3-"),
            ("(R)-lactate = pyruvate", "lactate = pyruvate"),
        ];
        for (master, target) in cases {
            let first = canonicalizer.canonicalize(master, target, SourceKind::Noor);
            assert!(first.converged, "{master}");
            let second = canonicalizer.canonicalize(&first.reaction, target, SourceKind::Noor);
            assert_eq!(second.reaction, first.reaction);
            assert_eq!(second.attempts, 0);
        }
    }

    #[test]
    fn charge_rewrites_are_bounded() {
        assert_eq!(reformat_charges("X12-", 64), "X-1-2-");
        assert_eq!(reformat_charges("X12-", 1), "X1-2-");
    }
}
