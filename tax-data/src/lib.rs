//! Loading bracket schedules from CSV so rates can change without a rebuild.

mod loader;

pub use loader::{BracketLoaderError, BracketRecord, BracketTableLoader, BracketTables, Schedule};
