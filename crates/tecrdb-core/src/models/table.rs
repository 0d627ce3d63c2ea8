use std::collections::HashSet;

use crate::error::{CoreError, Result};
use crate::models::field::reference_stem;
use crate::models::record::MasterRecord;
use crate::models::source::SourceKind;

/// Position of a row in the master table.
pub type MasterId = usize;
/// Position of a row in a new source table.
pub type NewId = usize;

/// The canonical dataset being built. Row identity is the row position, so
/// rows are only ever appended, never removed or reordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterTable {
    records: Vec<MasterRecord>,
}

impl MasterTable {
    pub fn new(records: Vec<MasterRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: MasterId) -> Option<&MasterRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: MasterId) -> Option<&mut MasterRecord> {
        self.records.get_mut(id)
    }

    pub fn records(&self) -> &[MasterRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = (MasterId, &MasterRecord)> {
        self.records.iter().enumerate()
    }

    /// Append a row and return its identity.
    pub fn append(&mut self, record: MasterRecord) -> MasterId {
        self.records.push(record);
        self.records.len() - 1
    }

    /// Rows whose enzyme name equals `enzyme`, in table order.
    pub fn candidates_by_enzyme<'a>(
        &'a self,
        enzyme: &'a str,
    ) -> impl Iterator<Item = (MasterId, &'a MasterRecord)> + 'a {
        let enzyme = enzyme.trim();
        self.iter()
            .filter(move |(_, record)| record.enzyme.as_deref().map(str::trim) == Some(enzyme))
    }

    /// Distinct non-blank enzyme names.
    pub fn enzyme_set(&self) -> HashSet<String> {
        self.records
            .iter()
            .filter_map(|record| record.enzyme.as_deref())
            .map(|enzyme| enzyme.trim().to_string())
            .collect()
    }

    /// Distinct reference stems (suffix after the first `_` dropped).
    pub fn reference_set(&self) -> HashSet<String> {
        self.records
            .iter()
            .filter_map(|record| record.reference_id.as_deref())
            .map(|reference| reference_stem(reference).to_string())
            .collect()
    }

    /// Source indices of `source` already captured somewhere in the table.
    pub fn provenance_indices(&self, source: SourceKind) -> HashSet<usize> {
        self.records
            .iter()
            .filter_map(|record| record.provenance(source))
            .collect()
    }

    pub fn set_provenance(
        &mut self,
        id: MasterId,
        source: SourceKind,
        source_index: usize,
    ) -> Result<()> {
        match self.records.get_mut(id) {
            Some(record) => record.set_provenance(id, source, source_index),
            None => Err(CoreError::RowNotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(enzyme: &str, reference: &str) -> MasterRecord {
        MasterRecord {
            enzyme: Some(enzyme.to_string()),
            reference_id: Some(reference.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn append_returns_position() {
        let mut table = MasterTable::default();
        assert_eq!(table.append(record("hexokinase", "77LIE/VAL_1")), 0);
        assert_eq!(table.append(record("enolase", "80WOL/BAL_2")), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn candidates_follow_table_order() {
        let table = MasterTable::new(vec![
            record("hexokinase", "A_1"),
            record("enolase", "B_1"),
            record(" hexokinase ", "C_1"),
        ]);
        let ids: Vec<MasterId> = table
            .candidates_by_enzyme("hexokinase")
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn reference_set_uses_stems() {
        let table = MasterTable::new(vec![record("a", "77LIE/VAL_1"), record("b", "77LIE/VAL_2")]);
        let refs = table.reference_set();
        assert_eq!(refs.len(), 1);
        assert!(refs.contains("77LIE/VAL"));
    }

    #[test]
    fn provenance_indices_collects_per_source() {
        let mut table = MasterTable::new(vec![record("a", "A"), record("b", "B")]);
        table.set_provenance(1, SourceKind::Du, 7).unwrap();
        assert_eq!(table.provenance_indices(SourceKind::Du), HashSet::from([7]));
        assert!(table.provenance_indices(SourceKind::Noor).is_empty());
        assert!(table.set_provenance(5, SourceKind::Du, 1).is_err());
    }
}
