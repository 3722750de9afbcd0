//! Domain models for the Hainan Weather Service

mod alert;
mod location;
mod sync;
mod weather;

pub use alert::*;
pub use location::*;
pub use sync::*;
pub use weather::*;
