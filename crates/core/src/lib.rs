//! metrics-lite core: error type, host settings, property stores and the
//! opt-out/debug configuration gate.

pub mod config;
pub mod error;
pub mod gate;
pub mod properties;
