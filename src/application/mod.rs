pub mod motion_service;

pub use motion_service::*;
