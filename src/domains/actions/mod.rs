pub mod action;
pub mod combined;
pub mod registry;

pub use action::*;
pub use combined::*;
pub use registry::*;
