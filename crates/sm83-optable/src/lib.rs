pub mod analyze;
pub mod model;

// Re-export commonly used types/functions for consumers
pub use analyze::{family_stats, FamilyStat, Report};
pub use model::{entries_from_str, load_table, Entry, OperandOut};
