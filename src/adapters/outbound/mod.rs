pub mod buffered_sink;
pub mod channel_transport;
pub mod console_sink;
pub mod file_sink;
pub mod multi_sink;
pub mod noop_sink;

pub use buffered_sink::*;
pub use channel_transport::*;
pub use console_sink::*;
pub use file_sink::*;
pub use multi_sink::*;
pub use noop_sink::*;
