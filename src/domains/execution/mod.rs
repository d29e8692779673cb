pub mod context;
pub mod cursor;
pub mod driver;
pub mod executor;
pub mod ports;
pub mod protocol;

pub use context::*;
pub use cursor::*;
pub use driver::*;
pub use executor::*;
pub use ports::*;
pub use protocol::*;
