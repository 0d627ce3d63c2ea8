use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::models::field::{blank_as_none, blank_placeholder, index_or_blank, index_placeholder};
use crate::models::source::{SourceKind, UnifiedRecord};

/// One row of the master table, in persisted column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterRecord {
    /// Row index in the scraped TECRDB baseline; absent for appended rows.
    #[serde(
        rename = "NIST_index",
        default,
        deserialize_with = "index_or_blank",
        serialize_with = "index_placeholder"
    )]
    pub nist_index: Option<usize>,
    #[serde(
        default,
        deserialize_with = "index_or_blank",
        serialize_with = "index_placeholder"
    )]
    pub du_index: Option<usize>,
    #[serde(
        default,
        deserialize_with = "index_or_blank",
        serialize_with = "index_placeholder"
    )]
    pub noor_index: Option<usize>,
    #[serde(
        rename = "Enzyme:",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub enzyme: Option<String>,
    #[serde(
        rename = "KEGG Reaction:",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub kegg_reaction: Option<String>,
    #[serde(
        rename = "CID Reaction:",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub cid_reaction: Option<String>,
    #[serde(
        rename = "EC Value:",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub ec: Option<String>,
    #[serde(
        rename = "Reaction:",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub reaction: Option<String>,
    /// Full citation text.
    #[serde(
        rename = "Reference:",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub reference: Option<String>,
    #[serde(
        rename = "Reference ID:",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub reference_id: Option<String>,
    #[serde(
        rename = "T [K]",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub temperature: Option<String>,
    #[serde(
        rename = "pH",
        alias = "pH ",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub ph: Option<String>,
    #[serde(
        rename = "Keq",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub keq: Option<String>,
    #[serde(
        rename = "Km'",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub km: Option<String>,
    #[serde(
        rename = "Experimental conditions",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub conditions: Option<String>,
    #[serde(
        rename = "Ionic strength [mol/dm^3]",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub ionic_strength: Option<String>,
    #[serde(
        rename = "Enthalpy [kJ/mol]",
        alias = "Enthalpy",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub enthalpy: Option<String>,
    #[serde(
        rename = "solutes [mol/dm^3]",
        alias = "Solutes",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub solutes: Option<String>,
    #[serde(
        rename = "Buffer:",
        alias = "Buffer",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub buffer: Option<String>,
    /// Magnesium potential.
    #[serde(
        rename = "-log[Mg+2]",
        alias = "pMg",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub pmg: Option<String>,
    #[serde(
        rename = "Method:",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub method: Option<String>,
    #[serde(
        rename = "Ionic strength [molal]",
        alias = "Ionic strength [mol/kg]",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub ionic_strength_molal: Option<String>,
    #[serde(
        rename = "solutes [molal]",
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "blank_placeholder"
    )]
    pub solutes_molal: Option<String>,
}

impl MasterRecord {
    /// Build a fresh master row for a new datum that has no counterpart.
    pub fn from_unified(new: &UnifiedRecord) -> Self {
        let mut record = Self {
            nist_index: None,
            du_index: None,
            noor_index: None,
            enzyme: new.enzyme.clone(),
            kegg_reaction: new.kegg_reaction.clone(),
            cid_reaction: new.cid_reaction.clone(),
            ec: new.ec.clone(),
            reaction: new.reaction.clone(),
            reference: None,
            reference_id: new.reference_id.clone(),
            temperature: new.temperature.clone(),
            ph: new.ph.clone(),
            keq: new.keq.clone(),
            km: None,
            conditions: new.conditions.clone(),
            ionic_strength: new.ionic_strength.clone(),
            enthalpy: None,
            solutes: None,
            buffer: new.buffer.clone(),
            pmg: new.pmg.clone(),
            method: new.method.clone(),
            ionic_strength_molal: None,
            solutes_molal: None,
        };
        *record.provenance_slot(new.source) = Some(new.source_index);
        record
    }

    pub fn provenance(&self, source: SourceKind) -> Option<usize> {
        match source {
            SourceKind::Noor => self.noor_index,
            SourceKind::Du => self.du_index,
        }
    }

    fn provenance_slot(&mut self, source: SourceKind) -> &mut Option<usize> {
        match source {
            SourceKind::Noor => &mut self.noor_index,
            SourceKind::Du => &mut self.du_index,
        }
    }

    /// Record that `source_index` of `source` is captured by this row.
    ///
    /// Re-assigning the same index is a no-op; a different index is a conflict.
    pub fn set_provenance(
        &mut self,
        master_index: usize,
        source: SourceKind,
        source_index: usize,
    ) -> Result<()> {
        let slot = self.provenance_slot(source);
        match *slot {
            Some(existing) if existing != source_index => Err(CoreError::ProvenanceConflict {
                master_index,
                source_kind: source,
                existing,
                attempted: source_index,
            }),
            _ => {
                *slot = Some(source_index);
                Ok(())
            }
        }
    }

    /// Named text attributes, in persisted order.
    pub fn text_fields(&self) -> [(&'static str, Option<&str>); 20] {
        [
            ("Enzyme:", self.enzyme.as_deref()),
            ("KEGG Reaction:", self.kegg_reaction.as_deref()),
            ("CID Reaction:", self.cid_reaction.as_deref()),
            ("EC Value:", self.ec.as_deref()),
            ("Reaction:", self.reaction.as_deref()),
            ("Reference:", self.reference.as_deref()),
            ("Reference ID:", self.reference_id.as_deref()),
            ("T [K]", self.temperature.as_deref()),
            ("pH", self.ph.as_deref()),
            ("Keq", self.keq.as_deref()),
            ("Km'", self.km.as_deref()),
            ("Experimental conditions", self.conditions.as_deref()),
            ("Ionic strength [mol/dm^3]", self.ionic_strength.as_deref()),
            ("Enthalpy [kJ/mol]", self.enthalpy.as_deref()),
            ("solutes [mol/dm^3]", self.solutes.as_deref()),
            ("Buffer:", self.buffer.as_deref()),
            ("-log[Mg+2]", self.pmg.as_deref()),
            ("Method:", self.method.as_deref()),
            ("Ionic strength [molal]", self.ionic_strength_molal.as_deref()),
            ("solutes [molal]", self.solutes_molal.as_deref()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_unified_sets_provenance() {
        let mut new = UnifiedRecord::empty(SourceKind::Du, 12);
        new.enzyme = Some("hexokinase".to_string());
        new.keq = Some("650".to_string());

        let record = MasterRecord::from_unified(&new);
        assert_eq!(record.du_index, Some(12));
        assert_eq!(record.noor_index, None);
        assert_eq!(record.nist_index, None);
        assert_eq!(record.enzyme.as_deref(), Some("hexokinase"));
        assert_eq!(record.keq.as_deref(), Some("650"));
    }

    #[test]
    fn provenance_cannot_be_reassigned() {
        let mut record = MasterRecord::default();
        record.set_provenance(0, SourceKind::Noor, 4).unwrap();
        record.set_provenance(0, SourceKind::Noor, 4).unwrap();

        let err = record.set_provenance(0, SourceKind::Noor, 5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ProvenanceConflict { existing: 4, attempted: 5, .. }
        ));
        assert_eq!(record.provenance(SourceKind::Noor), Some(4));
        assert_eq!(record.provenance(SourceKind::Du), None);
    }

    #[test]
    fn text_fields_report_values() {
        let record = MasterRecord {
            ec: Some("2.7.1.1".to_string()),
            ..Default::default()
        };
        let fields = record.text_fields();
        assert!(fields.contains(&("EC Value:", Some("2.7.1.1"))));
        assert!(fields.contains(&("Method:", None)));
    }
}
