//! Field-level reconciliation of a matched master row with a new record.

use tecrdb_core::{MasterId, MasterRecord, MasterTable, UnifiedRecord, is_blank};
use tracing::{debug, warn};

use crate::error::{MergeError, Result};

const MG_ANNOTATION: &str = "-log[Mg+2]";

/// What `reconcile` did to the master table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Fields were folded into the matched row and its provenance set.
    Merged(MasterId),
    /// The row already records this exact new identity.
    Unchanged(MasterId),
    /// The row was claimed by another record of the same source in an
    /// earlier pass, so the new record became a row of its own.
    Appended {
        master_id: MasterId,
        claimed_by: usize,
        new_row: MasterId,
    },
}

impl Reconciled {
    /// Row that now carries the new record.
    pub fn row(&self) -> MasterId {
        match *self {
            Reconciled::Merged(id) | Reconciled::Unchanged(id) => id,
            Reconciled::Appended { new_row, .. } => new_row,
        }
    }
}

/// Fold `new` into master row `master_id`.
///
/// Blank master fields take the new value; populated ones are kept or
/// extended, never cleared. The order of calls matters: merging A then B can
/// differ from B then A.
pub fn reconcile(
    table: &mut MasterTable,
    master_id: MasterId,
    new: &UnifiedRecord,
) -> Result<Reconciled> {
    let record = table
        .get_mut(master_id)
        .ok_or(MergeError::MasterIndexOutOfRange(master_id))?;

    if let Some(claimed_by) = record.provenance(new.source) {
        if claimed_by == new.source_index {
            return Ok(Reconciled::Unchanged(master_id));
        }
        let new_row = table.append(MasterRecord::from_unified(new));
        warn!(
            master_id,
            claimed_by,
            new_index = new.source_index,
            new_row,
            "{} index already set on master row, appended the new record instead",
            new.source
        );
        return Ok(Reconciled::Appended {
            master_id,
            claimed_by,
            new_row,
        });
    }

    fill_if_blank(&mut record.kegg_reaction, new.kegg_reaction.as_deref());
    fill_if_blank(&mut record.cid_reaction, new.cid_reaction.as_deref());
    merge_magnesium(&mut record.conditions, new.pmg.as_deref());
    merge_method(&mut record.method, new.method.as_deref());
    merge_ec(&mut record.ec, new.ec.as_deref());
    merge_ionic_strength(&mut record.ionic_strength, new.ionic_strength.as_deref());

    record.set_provenance(master_id, new.source, new.source_index)?;
    debug!(master_id, new_index = new.source_index, "merged into master row");
    Ok(Reconciled::Merged(master_id))
}

fn blank(value: Option<&str>) -> bool {
    value.is_none_or(is_blank)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !is_blank(v))
}

fn fill_if_blank(field: &mut Option<String>, new: Option<&str>) {
    if let Some(new) = non_blank(new)
        && blank(field.as_deref())
    {
        *field = Some(new.to_string());
    }
}

fn merge_magnesium(conditions: &mut Option<String>, pmg: Option<&str>) {
    let Some(pmg) = non_blank(pmg) else {
        return;
    };
    let annotated = format!("{pmg} = {MG_ANNOTATION}");
    let alternative = format!("{pmg} ({MG_ANNOTATION})");

    let merged = match conditions.as_deref().filter(|c| !is_blank(c)) {
        None => annotated,
        Some(current) if current.contains(&annotated) || current.contains(&alternative) => return,
        Some(current) => format!("{current} or {alternative}"),
    };
    *conditions = Some(merged);
}

fn merge_method(method: &mut Option<String>, new: Option<&str>) {
    let Some(new) = non_blank(new) else {
        return;
    };
    if blank(method.as_deref()) {
        *method = Some(new.to_string());
        return;
    }
    let current = method.as_deref().unwrap_or_default();
    *method = Some(union_tokens(current, new, " and ", " and "));
}

fn merge_ec(ec: &mut Option<String>, new: Option<&str>) {
    let Some(new) = non_blank(new) else {
        return;
    };
    let current = ec.as_deref().map(str::trim).unwrap_or_default();
    if current == new {
        return;
    }
    let current = if is_blank(current) { "" } else { current };
    *ec = Some(union_tokens(current, new, "&", " & "));
}

fn merge_ionic_strength(ionic_strength: &mut Option<String>, new: Option<&str>) {
    let Some(new) = non_blank(new) else {
        return;
    };
    let merged = match ionic_strength.as_deref().filter(|c| !is_blank(c)) {
        None => new.to_string(),
        Some(current) => format!("{} & {new}", current.trim()),
    };
    *ionic_strength = Some(merged);
}

/// Tokens of `current` then unseen tokens of `new`, in first-seen order.
fn union_tokens(current: &str, new: &str, separator: &str, joiner: &str) -> String {
    let mut tokens: Vec<&str> = Vec::new();
    for token in current.split(separator).chain(new.split(separator)) {
        let token = token.trim();
        if !token.is_empty() && !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens.join(joiner)
}

#[cfg(test)]
mod tests {
    use tecrdb_core::SourceKind;

    use super::*;

    fn table_with(record: MasterRecord) -> MasterTable {
        MasterTable::new(vec![record])
    }

    fn noor(index: usize) -> UnifiedRecord {
        UnifiedRecord::empty(SourceKind::Noor, index)
    }

    #[test]
    fn equal_ec_is_unchanged() {
        let mut table = table_with(MasterRecord {
            ec: Some("1.1.1.1".to_string()),
            ..Default::default()
        });
        let mut new = noor(0);
        new.ec = Some("1.1.1.1".to_string());

        assert_eq!(reconcile(&mut table, 0, &new).unwrap(), Reconciled::Merged(0));
        assert_eq!(table.get(0).unwrap().ec.as_deref(), Some("1.1.1.1"));
    }

    #[test]
    fn blank_ec_takes_multi_valued_new_ec() {
        let mut table = table_with(MasterRecord {
            ec: Some(" ".to_string()),
            ..Default::default()
        });
        let mut new = noor(0);
        new.ec = Some("2.7.1.1 & 2.7.1.2".to_string());

        reconcile(&mut table, 0, &new).unwrap();
        assert_eq!(table.get(0).unwrap().ec.as_deref(), Some("2.7.1.1 & 2.7.1.2"));
    }

    #[test]
    fn differing_ec_is_union_joined() {
        let mut table = table_with(MasterRecord {
            ec: Some("2.7.1.1".to_string()),
            ..Default::default()
        });
        let mut new = noor(0);
        new.ec = Some("2.7.1.2&2.7.1.1".to_string());

        reconcile(&mut table, 0, &new).unwrap();
        assert_eq!(table.get(0).unwrap().ec.as_deref(), Some("2.7.1.1 & 2.7.1.2"));
    }

    #[test]
    fn reaction_ids_fill_only_blanks() {
        let mut table = table_with(MasterRecord {
            kegg_reaction: Some("R00299".to_string()),
            ..Default::default()
        });
        let mut new = noor(0);
        new.kegg_reaction = Some("R99999".to_string());
        new.cid_reaction = Some("C00002 = C00008".to_string());

        reconcile(&mut table, 0, &new).unwrap();
        let row = table.get(0).unwrap();
        assert_eq!(row.kegg_reaction.as_deref(), Some("R00299"));
        assert_eq!(row.cid_reaction.as_deref(), Some("C00002 = C00008"));
    }

    #[test]
    fn magnesium_is_annotated_then_appended() {
        let mut table = table_with(MasterRecord::default());
        table.append(MasterRecord {
            conditions: Some("3 = -log[Mg+2]".to_string()),
            ..Default::default()
        });

        let mut first = noor(0);
        first.pmg = Some("3".to_string());
        reconcile(&mut table, 0, &first).unwrap();
        assert_eq!(table.get(0).unwrap().conditions.as_deref(), Some("3 = -log[Mg+2]"));

        let mut second = noor(1);
        second.pmg = Some("2.5".to_string());
        reconcile(&mut table, 1, &second).unwrap();
        assert_eq!(
            table.get(1).unwrap().conditions.as_deref(),
            Some("3 = -log[Mg+2] or 2.5 (-log[Mg+2])")
        );
    }

    #[test]
    fn repeated_magnesium_is_not_appended_twice() {
        let mut conditions = Some("3 = -log[Mg+2]".to_string());
        merge_magnesium(&mut conditions, Some("3"));
        assert_eq!(conditions.as_deref(), Some("3 = -log[Mg+2]"));
    }

    #[test]
    fn method_tokens_are_unioned_in_order() {
        let mut method = Some("spectrophotometry and calorimetry".to_string());
        merge_method(&mut method, Some("calorimetry and HPLC"));
        assert_eq!(method.as_deref(), Some("spectrophotometry and calorimetry and HPLC"));

        let mut blank = None;
        merge_method(&mut blank, Some("HPLC"));
        assert_eq!(blank.as_deref(), Some("HPLC"));
    }

    #[test]
    fn ionic_strength_concatenates_without_dedup() {
        let mut ionic = Some("0.1".to_string());
        merge_ionic_strength(&mut ionic, Some("0.1"));
        assert_eq!(ionic.as_deref(), Some("0.1 & 0.1"));
    }

    #[test]
    fn populated_fields_are_never_blanked() {
        let original = MasterRecord {
            kegg_reaction: Some("R1".to_string()),
            cid_reaction: Some("C1".to_string()),
            ec: Some("1.1.1.1".to_string()),
            conditions: Some("pH buffer".to_string()),
            ionic_strength: Some("0.25".to_string()),
            method: Some("HPLC".to_string()),
            ..Default::default()
        };
        let mut table = table_with(original.clone());
        let mut new = noor(0);
        new.ec = Some(" ".to_string());
        new.method = Some("nan".to_string());

        reconcile(&mut table, 0, &new).unwrap();
        let row = table.get(0).unwrap();
        for ((name, before), (_, after)) in original.text_fields().iter().zip(row.text_fields()) {
            if !blank(*before) {
                assert_eq!(*before, after, "{name} changed");
            }
        }
        assert_eq!(row.noor_index, Some(0));
    }

    #[test]
    fn claimed_row_falls_back_to_append() {
        let mut table = table_with(MasterRecord {
            noor_index: Some(4),
            enzyme: Some("hexokinase".to_string()),
            ..Default::default()
        });
        let mut new = noor(7);
        new.enzyme = Some("hexokinase".to_string());
        new.ec = Some("2.7.1.1".to_string());

        let outcome = reconcile(&mut table, 0, &new).unwrap();
        assert_eq!(
            outcome,
            Reconciled::Appended {
                master_id: 0,
                claimed_by: 4,
                new_row: 1
            }
        );
        assert_eq!(outcome.row(), 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0).unwrap().noor_index, Some(4));
        assert_eq!(table.get(0).unwrap().ec, None);
        assert_eq!(table.get(1).unwrap().noor_index, Some(7));
    }

    #[test]
    fn same_identity_is_unchanged() {
        let mut table = table_with(MasterRecord {
            du_index: Some(2),
            ..Default::default()
        });
        let new = UnifiedRecord::empty(SourceKind::Du, 2);
        assert_eq!(reconcile(&mut table, 0, &new).unwrap(), Reconciled::Unchanged(0));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn out_of_range_master_is_an_error() {
        let mut table = MasterTable::default();
        assert!(matches!(
            reconcile(&mut table, 3, &noor(0)),
            Err(MergeError::MasterIndexOutOfRange(3))
        ));
    }
}
