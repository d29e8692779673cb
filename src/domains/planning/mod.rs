pub mod batching;
pub mod ports;
pub mod trajectory;

pub use batching::*;
pub use ports::*;
pub use trajectory::*;
