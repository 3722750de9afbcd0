//! HTTP handlers

pub mod health;
pub mod sync;

pub use health::health_check;
pub use sync::trigger_sync;
