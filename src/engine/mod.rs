pub mod ops;
pub mod overdue;
pub mod query;
pub mod summary;
pub mod transition;

pub use ops::*;
pub use query::{Page, SortKey, TaskFilter, PAGE_SIZE};
pub use summary::{BreakdownRow, Summary};
