pub mod csv_table;
pub mod json_report;

pub use csv_table::{load_curation, load_master, load_source, save_master};
pub use json_report::{load_json, save_json};
