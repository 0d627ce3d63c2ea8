//! Record matching and field reconciliation between the TECRDB
//! master table and an incoming source table.

pub mod arbitrate;
pub mod curation;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod orchestrator;
pub mod reaction;
pub mod report;

pub use arbitrate::{Reconciled, reconcile};
pub use curation::{CurationAction, classify, parse_index_range};
pub use error::{MergeError, Rejection, Result};
pub use matcher::{MatchAssignment, MatchOutcome, RowMatcher};
pub use normalize::{Comparison, compare, is_numeric, round_for_comparison, values_equal};
pub use orchestrator::{MergePass, PassState};
pub use reaction::{Canonicalization, ReactionCanonicalizer};
pub use report::MergeReport;
