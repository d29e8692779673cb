pub mod actions;
pub mod execution;
pub mod observer;
pub mod planning;

pub use actions::*;
pub use execution::*;
pub use observer::*;
pub use planning::*;
