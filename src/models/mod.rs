pub mod actor;
pub mod task;

pub use actor::*;
pub use task::*;
