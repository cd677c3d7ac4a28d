//! Domain types for fund snapshots

pub mod fund;
pub mod schema;
pub mod table;

pub use fund::{Fund, MacroSegment};
pub use table::{FundTable, RuleFlags, ScoredFund, ScoredTable};
