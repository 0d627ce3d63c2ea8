pub mod curation;
pub mod field;
pub mod record;
pub mod source;
pub mod table;

pub use curation::CurationRow;
pub use field::{BLANK, clean, is_blank, reference_stem};
pub use record::MasterRecord;
pub use source::{DuRecord, NoorRecord, SourceKind, SourceRecord, UnifiedRecord};
pub use table::{MasterId, MasterTable, NewId};
