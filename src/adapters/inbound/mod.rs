pub mod broadcast_states;
pub mod memory_io;

pub use broadcast_states::*;
pub use memory_io::*;
