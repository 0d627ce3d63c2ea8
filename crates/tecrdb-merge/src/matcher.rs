//! Row matching: find the master row describing the same datum as a new row.

use std::collections::HashMap;

use tecrdb_core::{MasterId, MasterRecord, MasterTable, NewId, SourceKind, UnifiedRecord};
use tracing::{debug, warn};

use crate::error::{MergeError, Rejection, Result};
use crate::normalize::{
    Comparison, compare, fix_temperature_transcription, strip_keq_annotation,
    strip_reference_suffix, strip_tolerance_markers,
};
use crate::reaction::ReactionCanonicalizer;

/// One-to-one mapping between new rows and the master rows they matched
/// during a single pass.
#[derive(Debug, Clone, Default)]
pub struct MatchAssignment {
    by_master: HashMap<MasterId, NewId>,
    by_new: HashMap<NewId, MasterId>,
}

impl MatchAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claimed_by(&self, master_id: MasterId) -> Option<NewId> {
        self.by_master.get(&master_id).copied()
    }

    pub fn master_for(&self, new_id: NewId) -> Option<MasterId> {
        self.by_new.get(&new_id).copied()
    }

    /// Pair `master_id` with `new_id`; either side may only be paired once.
    pub fn claim(&mut self, master_id: MasterId, new_id: NewId) -> Result<()> {
        if let Some(claimed_by) = self.claimed_by(master_id) {
            return Err(MergeError::AlreadyClaimed {
                master_index: master_id,
                claimed_by,
            });
        }
        if let Some(previous) = self.master_for(new_id) {
            return Err(MergeError::AlreadyClaimed {
                master_index: previous,
                claimed_by: new_id,
            });
        }
        self.by_master.insert(master_id, new_id);
        self.by_new.insert(new_id, master_id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_master.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_master.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (MasterId, NewId)> + '_ {
        self.by_master.iter().map(|(master, new)| (*master, *new))
    }
}

/// Result of scanning the master table for one new row.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub master_id: Option<MasterId>,
    /// Every rejection logged while scanning, in candidate order.
    pub rejections: Vec<Rejection>,
}

impl MatchOutcome {
    pub fn duplicate_claims(&self) -> usize {
        self.rejections
            .iter()
            .filter(|r| matches!(r, Rejection::DuplicateClaim { .. }))
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct RowMatcher {
    source: SourceKind,
    canonicalizer: ReactionCanonicalizer,
    verbose: bool,
}

impl RowMatcher {
    pub fn new(source: SourceKind, canonicalizer: ReactionCanonicalizer) -> Self {
        Self {
            source,
            canonicalizer,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// First-fit scan of the rows sharing `new`'s enzyme name.
    ///
    /// Enzyme name is the only partition key; within it candidates are tried
    /// in table order and the first one surviving every check wins.
    pub fn find_match(
        &self,
        new: &UnifiedRecord,
        master: &MasterTable,
        assignment: &MatchAssignment,
    ) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        let Some(enzyme) = new.enzyme.as_deref() else {
            return outcome;
        };

        for (master_id, candidate) in master.candidates_by_enzyme(enzyme) {
            if let Some(claimed_by) = assignment.claimed_by(master_id)
                && claimed_by != new.source_index
            {
                self.reject(
                    &mut outcome.rejections,
                    Rejection::DuplicateClaim {
                        master_index: master_id,
                        claimed_by,
                    },
                );
                continue;
            }

            if self.check_candidate(master_id, candidate, new, &mut outcome.rejections) {
                outcome.master_id = Some(master_id);
                break;
            }
        }

        outcome
    }

    fn check_candidate(
        &self,
        master_id: MasterId,
        candidate: &MasterRecord,
        new: &UnifiedRecord,
        log: &mut Vec<Rejection>,
    ) -> bool {
        let master_reference = candidate.reference_id.as_deref().map(strip_reference_suffix);
        let new_reference = new.reference_id.as_deref().map(str::trim);
        if !self.field_equal(master_id, "reference", master_reference, new_reference, log) {
            self.reject(
                log,
                Rejection::ReferenceConflict {
                    master_index: master_id,
                    master_reference: master_reference.unwrap_or_default().to_string(),
                    new_reference: new_reference.unwrap_or_default().to_string(),
                },
            );
            return false;
        }

        let values = [
            (
                "Keq",
                candidate
                    .keq
                    .as_deref()
                    .map(|keq| strip_tolerance_markers(&strip_keq_annotation(keq)).to_string()),
                new.keq.as_deref().map(|keq| strip_tolerance_markers(keq).to_string()),
            ),
            (
                "T [K]",
                candidate.temperature.as_deref().map(fix_temperature_transcription),
                new.temperature.as_deref().map(fix_temperature_transcription),
            ),
            (
                "pH",
                candidate.ph.as_deref().map(|ph| strip_tolerance_markers(ph).to_string()),
                new.ph.as_deref().map(|ph| strip_tolerance_markers(ph).to_string()),
            ),
        ];
        for (field, master_value, new_value) in values {
            if !self.field_equal(master_id, field, master_value.as_deref(), new_value.as_deref(), log) {
                self.reject(
                    log,
                    Rejection::ValueMismatch {
                        master_index: master_id,
                        new_index: new.source_index,
                        field,
                        master: master_value.unwrap_or_default(),
                        new: new_value.unwrap_or_default(),
                    },
                );
                return false;
            }
        }

        let master_reaction = candidate.reaction.as_deref().unwrap_or("");
        let new_reaction = new.reaction.as_deref().unwrap_or("");
        let canonical = self
            .canonicalizer
            .canonicalize(master_reaction, new_reaction, self.source);
        if !canonical.converged {
            self.reject(
                log,
                Rejection::ReactionMismatch {
                    master_index: master_id,
                    new_index: new.source_index,
                    master_reaction: canonical.reaction,
                    new_reaction: new_reaction.trim().to_string(),
                },
            );
            return false;
        }

        true
    }

    fn field_equal(
        &self,
        master_id: MasterId,
        field: &'static str,
        master: Option<&str>,
        new: Option<&str>,
        log: &mut Vec<Rejection>,
    ) -> bool {
        match compare(master, new, self.source) {
            Comparison::Equal => true,
            Comparison::NumericMismatch => {
                self.reject(
                    log,
                    Rejection::SoftMismatch {
                        master_index: master_id,
                        field,
                        master: master.unwrap_or_default().to_string(),
                        new: new.unwrap_or_default().to_string(),
                    },
                );
                false
            }
            Comparison::Unequal => false,
        }
    }

    fn reject(&self, log: &mut Vec<Rejection>, rejection: Rejection) {
        if self.verbose {
            warn!("{rejection}");
        } else {
            debug!("{rejection}");
        }
        log.push(rejection);
    }
}
