//! Manual curation instructions.

use tecrdb_core::{CurationRow, MasterId, NewId};

use crate::error::{MergeError, Result};

const NEW_MARKER: &str = "New";
const NO_MASTER_MARKER: &str = "--";

/// A curator's decision for one or more new records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurationAction {
    /// Append the records as fresh master rows.
    Insert { new_ids: Vec<NewId> },
    /// Force-merge `new_ids[i]` into `master_ids[i]`.
    Merge {
        master_ids: Vec<MasterId>,
        new_ids: Vec<NewId>,
    },
    /// The records duplicate data already captured and are not expected in
    /// the master table.
    Duplicate { new_ids: Vec<NewId> },
    AlreadyMatched { new_ids: Vec<NewId> },
    /// The curator left no usable instruction.
    Unresolved { new_ids: Vec<NewId> },
}

impl CurationAction {
    pub fn new_ids(&self) -> &[NewId] {
        match self {
            CurationAction::Insert { new_ids }
            | CurationAction::Merge { new_ids, .. }
            | CurationAction::Duplicate { new_ids }
            | CurationAction::AlreadyMatched { new_ids }
            | CurationAction::Unresolved { new_ids } => new_ids,
        }
    }
}

/// Expand `"n"` or an inclusive `"start-end"` into identities.
pub fn parse_index_range(text: &str) -> Result<Vec<usize>> {
    let text = text.trim();
    let invalid = || MergeError::Range(text.to_string());

    let parse = |part: &str| part.trim().parse::<usize>().map_err(|_| invalid());
    match text.split_once('-') {
        None => Ok(vec![parse(text)?]),
        Some((start, end)) => {
            let (start, end) = (parse(start)?, parse(end)?);
            if start > end {
                return Err(invalid());
            }
            Ok((start..=end).collect())
        }
    }
}

/// Interpret a curation row.
pub fn classify(row: &CurationRow) -> Result<CurationAction> {
    let master = row.master_index.trim();
    let resolution = row.resolution.trim();
    let new_ids = parse_index_range(&row.new_index)?;

    if master.eq_ignore_ascii_case(NEW_MARKER) || resolution.contains("sigfig") {
        return Ok(CurationAction::Insert { new_ids });
    }
    if !master.is_empty() && master != NO_MASTER_MARKER {
        let master_ids = parse_index_range(master)?;
        return Ok(CurationAction::Merge {
            master_ids,
            new_ids,
        });
    }

    Ok(if resolution.contains("Duplicate") {
        CurationAction::Duplicate { new_ids }
    } else if resolution.contains("already") {
        CurationAction::AlreadyMatched { new_ids }
    } else {
        CurationAction::Unresolved { new_ids }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_index_and_range() {
        assert_eq!(parse_index_range("12").unwrap(), vec![12]);
        assert_eq!(parse_index_range(" 3-6 ").unwrap(), vec![3, 4, 5, 6]);
        assert_eq!(parse_index_range("4-4").unwrap(), vec![4]);
    }

    #[test]
    fn malformed_ranges_are_rejected() {
        for bad in ["", "abc", "6-3", "1-2-3", "-4", "4-"] {
            assert!(
                matches!(parse_index_range(bad), Err(MergeError::Range(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn new_marker_inserts() {
        let action = classify(&CurationRow::new("missing enzyme", "New", "10-11")).unwrap();
        assert_eq!(action, CurationAction::Insert { new_ids: vec![10, 11] });

        let action = classify(&CurationRow::new("sigfig difference", "--", "7")).unwrap();
        assert_eq!(action, CurationAction::Insert { new_ids: vec![7] });
    }

    #[test]
    fn master_index_merges() {
        let action = classify(&CurationRow::new("typo in reaction", "100-101", "20-21")).unwrap();
        assert_eq!(
            action,
            CurationAction::Merge {
                master_ids: vec![100, 101],
                new_ids: vec![20, 21]
            }
        );
    }

    #[test]
    fn resolution_text_decides_the_rest() {
        let duplicate = classify(&CurationRow::new("Duplicate of 4", "--", "5")).unwrap();
        assert_eq!(duplicate, CurationAction::Duplicate { new_ids: vec![5] });

        let matched = classify(&CurationRow::new("was already matched", "", "6")).unwrap();
        assert_eq!(matched, CurationAction::AlreadyMatched { new_ids: vec![6] });

        let unresolved = classify(&CurationRow::new("unclear", "--", "8")).unwrap();
        assert_eq!(unresolved.new_ids(), &[8]);
        assert!(matches!(unresolved, CurationAction::Unresolved { .. }));
    }

    #[test]
    fn bad_new_index_is_a_range_error() {
        assert!(classify(&CurationRow::new("Duplicate", "--", "x")).is_err());
        assert!(classify(&CurationRow::new("fix", "a-b", "3")).is_err());
    }
}
