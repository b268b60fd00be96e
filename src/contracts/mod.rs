//! Contract bindings

pub mod eas;

pub use eas::*;
