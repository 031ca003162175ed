//! Student master list import and lookup.

pub(crate) mod columns;
pub mod parser;

pub use parser::{CsvRoster, RosterError};
