//! One merge pass of a new source table into the master table.
//!
//! A pass moves through fixed stages:
//!
//! ```text
//! Loaded -> RowsAdded -> Matched -> CurationApplied -> Verified -> Exported
//! ```
//!
//! Each stage method checks the current state first. Per-row failures are
//! logged and recorded in the [`MergeReport`]; they never abort the pass.
//! There is no rollback: on cancellation the caller discards the table.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::Serialize;
use tecrdb_core::storage::{save_json, save_master};
use tecrdb_core::{
    CurationRow, MasterId, MasterRecord, MasterTable, MergeConfig, NewId, SourceKind,
    SourceRecord, UnifiedRecord, reference_stem,
};
use tracing::{debug, info, warn};

use crate::arbitrate::{Reconciled, reconcile};
use crate::curation::{CurationAction, classify};
use crate::error::{MergeError, Result};
use crate::matcher::{MatchAssignment, RowMatcher};
use crate::normalize::is_numeric;
use crate::reaction::ReactionCanonicalizer;
use crate::report::MergeReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PassState {
    Loaded,
    RowsAdded,
    Matched,
    CurationApplied,
    Verified,
    Exported,
}

pub struct MergePass<'a> {
    master: &'a mut MasterTable,
    source: SourceKind,
    new_rows: Vec<UnifiedRecord>,
    matcher: RowMatcher,
    verbose: bool,
    state: PassState,
    assignment: MatchAssignment,
    report: MergeReport,
}

impl<'a> MergePass<'a> {
    /// Start a pass. Every record must belong to `source`.
    pub fn new(
        master: &'a mut MasterTable,
        source: SourceKind,
        records: &[SourceRecord],
        config: &MergeConfig,
    ) -> Result<Self> {
        let new_rows = records
            .iter()
            .enumerate()
            .map(|(new_index, record)| {
                if record.kind() == source {
                    Ok(record.to_unified(new_index))
                } else {
                    Err(MergeError::SourceMismatch {
                        new_index,
                        expected: source,
                        found: record.kind(),
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let matcher = RowMatcher::new(
            source,
            ReactionCanonicalizer::new(config.max_charge_rewrites),
        )
        .with_verbose(config.verbose);
        let report = MergeReport::new(source, master.len());

        info!(
            "Starting {} merge: {} master rows, {} new rows",
            source,
            master.len(),
            new_rows.len()
        );

        Ok(Self {
            master,
            source,
            new_rows,
            matcher,
            verbose: config.verbose,
            state: PassState::Loaded,
            assignment: MatchAssignment::new(),
            report,
        })
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn report(&self) -> &MergeReport {
        &self.report
    }

    pub fn into_report(self) -> MergeReport {
        self.report
    }

    pub fn assignment(&self) -> &MatchAssignment {
        &self.assignment
    }

    fn expect_state(&self, expected: PassState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(MergeError::State {
                expected,
                actual: self.state,
            })
        }
    }

    fn advance(&mut self, next: PassState) {
        self.report.master_rows_after = self.master.len();
        debug!("{} merge: {:?} -> {:?}", self.source, self.state, next);
        self.state = next;
    }

    // ─── Stages ────────────────────────────────────────────────

    /// Append every new record whose enzyme or reference the master table
    /// has never seen. These records skip matching.
    pub fn add_rows(&mut self) -> Result<()> {
        self.expect_state(PassState::Loaded)?;

        let master_enzymes = self.master.enzyme_set();
        let master_references = self.master.reference_set();
        let new_enzymes: HashSet<String> = self
            .new_rows
            .iter()
            .filter_map(|row| row.enzyme.as_deref())
            .map(|enzyme| enzyme.trim().to_string())
            .collect();
        let new_references: HashSet<String> = self
            .new_rows
            .iter()
            .filter_map(|row| row.reference_id.as_deref())
            .map(|reference| reference_stem(reference).to_string())
            .collect();

        let missing_enzymes = set_contrast("enzymes", &master_enzymes, &new_enzymes);
        let missing_references = set_contrast("references", &master_references, &new_references);

        for row in &self.new_rows {
            let unknown_enzyme = row
                .enzyme
                .as_deref()
                .is_some_and(|enzyme| missing_enzymes.contains(enzyme.trim()));
            let unknown_reference = row
                .reference_id
                .as_deref()
                .is_some_and(|reference| missing_references.contains(reference_stem(reference)));
            if !(unknown_enzyme || unknown_reference) {
                continue;
            }

            let mut record = MasterRecord::from_unified(row);
            if let Some(conditions) = record.conditions.as_deref()
                && is_numeric(conditions)
            {
                record.conditions = Some(format!("{} = -log[Mg+2]", conditions.trim()));
            }
            self.master.append(record);
            self.report.additions.insert(row.source_index);
        }

        if self.report.additions.is_empty() {
            warn!("No {} rows were added to the master table", self.source);
        } else {
            info!(
                "Added {} new {} rows to the master table",
                self.report.additions.len(),
                self.source
            );
        }

        self.advance(PassState::RowsAdded);
        Ok(())
    }

    /// Match and reconcile every record that was not appended by `add_rows`.
    pub fn match_existing(&mut self) -> Result<()> {
        self.expect_state(PassState::RowsAdded)?;

        for row in &self.new_rows {
            if self.report.additions.contains(&row.source_index) {
                continue;
            }

            let outcome = self.matcher.find_match(row, self.master, &self.assignment);
            self.report.duplicate_claims += outcome.duplicate_claims();

            let Some(master_id) = outcome.master_id else {
                if self.verbose {
                    warn!(
                        "Failed to match {} | {}",
                        row.enzyme.as_deref().unwrap_or_default(),
                        row.source_index
                    );
                }
                self.report.record_unmatched(row.source_index, &outcome.rejections);
                continue;
            };

            if let Err(e) = self.assignment.claim(master_id, row.source_index) {
                warn!("{e}");
                self.report.warnings.push(e.to_string());
                continue;
            }

            match reconcile(self.master, master_id, row) {
                Ok(Reconciled::Appended {
                    master_id,
                    claimed_by,
                    new_row,
                }) => {
                    self.report.warnings.push(format!(
                        "master index {master_id} already holds {} index {claimed_by}; new index {} appended as row {new_row}",
                        self.source, row.source_index
                    ));
                    self.report.matched += 1;
                }
                Ok(_) => self.report.matched += 1,
                Err(e) => {
                    warn!("Could not merge new index {}: {e}", row.source_index);
                    self.report.warnings.push(e.to_string());
                }
            }
        }

        info!(
            "{} matched, {} unmatched, {} duplicate claims",
            self.report.matched, self.report.unmatched_count, self.report.duplicate_claims
        );

        self.advance(PassState::Matched);
        Ok(())
    }

    /// Apply the curator's overrides. Malformed rows are recorded and skipped.
    pub fn apply_curation(&mut self, rows: &[CurationRow]) -> Result<()> {
        self.expect_state(PassState::Matched)?;

        let mut captured = self.master.provenance_indices(self.source);
        for (line, row) in rows.iter().enumerate() {
            let action = match classify(row) {
                Ok(action) => action,
                Err(e) => {
                    self.curation_error(format!("curation row {line}: {e}"));
                    continue;
                }
            };

            match action {
                CurationAction::Insert { new_ids } => {
                    for new_id in new_ids {
                        let new = match self.new_row(new_id) {
                            Ok(new) => new,
                            Err(e) => {
                                self.curation_error(format!("curation row {line}: {e}"));
                                continue;
                            }
                        };
                        if !captured.insert(new_id) {
                            self.repeated(new_id);
                            continue;
                        }
                        self.master.append(MasterRecord::from_unified(&new));
                    }
                }
                CurationAction::Merge {
                    master_ids,
                    new_ids,
                } => {
                    if master_ids.len() != new_ids.len() {
                        self.curation_error(format!(
                            "curation row {line}: {} master indices for {} new indices",
                            master_ids.len(),
                            new_ids.len()
                        ));
                        continue;
                    }
                    for (master_id, new_id) in master_ids.into_iter().zip(new_ids) {
                        self.force_merge(line, master_id, new_id, &mut captured);
                    }
                }
                CurationAction::Duplicate { new_ids } => {
                    info!("The {new_ids:?} new ids are duplicates");
                    self.report.duplicates.extend(new_ids);
                }
                CurationAction::AlreadyMatched { new_ids } => {
                    info!("The {new_ids:?} new ids are already matched");
                }
                CurationAction::Unresolved { new_ids } => {
                    self.curation_error(format!(
                        "curation row {line}: new ids {new_ids:?} were not captured during parsing"
                    ));
                }
            }
        }

        if !self.report.curation_errors.is_empty() {
            warn!("{} curation errors", self.report.curation_errors.len());
        }

        self.advance(PassState::CurationApplied);
        Ok(())
    }

    /// Report new records that are neither in the master table nor marked
    /// as duplicates.
    pub fn verify(&mut self) -> Result<&BTreeSet<NewId>> {
        self.expect_state(PassState::CurationApplied)?;

        let captured = self.master.provenance_indices(self.source);
        self.report.missing = (0..self.new_rows.len())
            .filter(|id| !captured.contains(id) && !self.report.duplicates.contains(id))
            .collect();

        if self.report.missing.is_empty() {
            info!("All {} indices are captured", self.source);
        } else {
            warn!(
                "Missing unique {} indices: {:?}",
                self.source, self.report.missing
            );
        }

        self.advance(PassState::Verified);
        Ok(&self.report.missing)
    }

    /// Run every in-memory stage up to `Verified`.
    pub fn run(&mut self, curation: &[CurationRow]) -> Result<&MergeReport> {
        self.add_rows()?;
        self.match_existing()?;
        self.apply_curation(curation)?;
        self.verify()?;
        Ok(&self.report)
    }

    /// Write the master table as CSV and the unmatched diagnostics as JSON.
    pub fn export(&mut self, merged: &Path, unmatched: &Path) -> Result<()> {
        self.expect_state(PassState::Verified)?;

        save_master(merged, self.master)?;
        save_json(unmatched, &self.report.unmatched)?;
        info!(
            "Exported {} master rows to {}",
            self.master.len(),
            merged.display()
        );

        self.advance(PassState::Exported);
        Ok(())
    }

    // ─── Helpers ───────────────────────────────────────────────

    fn new_row(&self, new_id: NewId) -> Result<UnifiedRecord> {
        self.new_rows
            .get(new_id)
            .cloned()
            .ok_or(MergeError::NewIndexOutOfRange(new_id))
    }

    fn force_merge(
        &mut self,
        line: usize,
        master_id: MasterId,
        new_id: NewId,
        captured: &mut HashSet<NewId>,
    ) {
        if master_id >= self.master.len() {
            self.curation_error(format!(
                "curation row {line}: {}",
                MergeError::MasterIndexOutOfRange(master_id)
            ));
            return;
        }
        let new = match self.new_row(new_id) {
            Ok(new) => new,
            Err(e) => {
                self.curation_error(format!("curation row {line}: {e}"));
                return;
            }
        };
        if !captured.insert(new_id) {
            self.repeated(new_id);
            return;
        }
        match reconcile(self.master, master_id, &new) {
            Ok(Reconciled::Appended { .. }) => self.report.warnings.push(format!(
                "curated master index {master_id} was already claimed; new index {new_id} appended"
            )),
            Ok(_) => {}
            Err(e) => self.curation_error(format!("curation row {line}: {e}")),
        }
    }

    fn repeated(&mut self, new_id: NewId) {
        let message = format!("Repeated {} index {new_id}", self.source);
        if self.verbose {
            warn!("{message}");
        }
        self.report.warnings.push(message);
    }

    fn curation_error(&mut self, message: String) {
        warn!("{message}");
        self.report.curation_errors.push(message);
    }
}

/// Log which `incoming` values `existing` lacks and return them.
fn set_contrast(
    label: &str,
    existing: &HashSet<String>,
    incoming: &HashSet<String>,
) -> HashSet<String> {
    let missing: HashSet<String> = incoming.difference(existing).cloned().collect();
    let extra = existing.difference(incoming).count();
    info!(
        "{label}: {} in the new file are absent from the master, {extra} master {label} are absent from the new file",
        missing.len()
    );
    if !missing.is_empty() {
        let mut listed: Vec<&String> = missing.iter().collect();
        listed.sort();
        debug!("new {label}: {listed:?}");
    }
    missing
}
