use tecrdb_core::{CoreError, MasterId, NewId, SourceKind};
use thiserror::Error;

use crate::orchestrator::PassState;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("merge pass is in state {actual:?}, expected {expected:?}")]
    State {
        expected: PassState,
        actual: PassState,
    },

    #[error("new table row {new_index} is a {found} record, expected {expected}")]
    SourceMismatch {
        new_index: NewId,
        expected: SourceKind,
        found: SourceKind,
    },

    #[error("invalid index range: '{0}'")]
    Range(String),

    #[error("master index {0} is outside the master table")]
    MasterIndexOutOfRange(MasterId),

    #[error("new index {0} is outside the new table")]
    NewIndexOutOfRange(NewId),

    #[error("master index {master_index} is already claimed by new index {claimed_by}")]
    AlreadyClaimed {
        master_index: MasterId,
        claimed_by: NewId,
    },
}

pub type Result<T> = std::result::Result<T, MergeError>;

/// Why a candidate master row was not accepted for a new record.
///
/// `SoftMismatch` is informational; every other variant disqualifies the
/// candidate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("soft mismatch on {field} at master index {master_index}: {master} vs {new}")]
    SoftMismatch {
        master_index: MasterId,
        field: &'static str,
        master: String,
        new: String,
    },

    #[error("master index {master_index} is already matched to new index {claimed_by}")]
    DuplicateClaim {
        master_index: MasterId,
        claimed_by: NewId,
    },

    #[error(
        "master index {master_index} belongs to reference {master_reference}, not {new_reference}"
    )]
    ReferenceConflict {
        master_index: MasterId,
        master_reference: String,
        new_reference: String,
    },

    #[error(
        "{field} value {new} | {new_index} does not match the existing value {master} | {master_index}"
    )]
    ValueMismatch {
        master_index: MasterId,
        new_index: NewId,
        field: &'static str,
        master: String,
        new: String,
    },

    #[error(
        "master reaction {master_reaction} | {master_index} does not match the new reaction {new_reaction} | {new_index}"
    )]
    ReactionMismatch {
        master_index: MasterId,
        new_index: NewId,
        master_reaction: String,
        new_reaction: String,
    },
}

impl Rejection {
    pub fn is_hard(&self) -> bool {
        !matches!(self, Rejection::SoftMismatch { .. })
    }
}
