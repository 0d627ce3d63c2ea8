use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tecrdb_core::{NewId, SourceKind};

use crate::error::Rejection;

/// Diagnostics of one merge pass. Recorded whether or not verbose logging is on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeReport {
    pub source: SourceKind,
    pub generated_at: DateTime<Utc>,
    pub master_rows_before: usize,
    pub master_rows_after: usize,
    /// New records appended because their enzyme or reference was unknown.
    pub additions: BTreeSet<NewId>,
    pub matched: usize,
    pub unmatched_count: usize,
    /// Rejection history of every record that matched no candidate.
    pub unmatched: BTreeMap<NewId, Vec<String>>,
    pub duplicate_claims: usize,
    pub duplicates: BTreeSet<NewId>,
    /// New records absent from the master table after curation.
    pub missing: BTreeSet<NewId>,
    pub curation_errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl MergeReport {
    pub fn new(source: SourceKind, master_rows_before: usize) -> Self {
        Self {
            source,
            generated_at: Utc::now(),
            master_rows_before,
            master_rows_after: master_rows_before,
            additions: BTreeSet::new(),
            matched: 0,
            unmatched_count: 0,
            unmatched: BTreeMap::new(),
            duplicate_claims: 0,
            duplicates: BTreeSet::new(),
            missing: BTreeSet::new(),
            curation_errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn record_unmatched(&mut self, new_id: NewId, rejections: &[Rejection]) {
        self.unmatched_count += 1;
        self.unmatched
            .insert(new_id, rejections.iter().map(ToString::to_string).collect());
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "source:            {}", self.source)?;
        writeln!(
            f,
            "master rows:       {} -> {}",
            self.master_rows_before, self.master_rows_after
        )?;
        writeln!(f, "added:             {}", self.additions.len())?;
        writeln!(f, "matched:           {}", self.matched)?;
        writeln!(f, "unmatched:         {}", self.unmatched_count)?;
        writeln!(f, "duplicate claims:  {}", self.duplicate_claims)?;
        writeln!(f, "curation errors:   {}", self.curation_errors.len())?;
        if self.missing.is_empty() {
            write!(f, "all indices are captured")
        } else {
            let missing: Vec<String> = self.missing.iter().map(ToString::to_string).collect();
            write!(f, "missing indices:   {}", missing.join(", "))
        }
    }
}
