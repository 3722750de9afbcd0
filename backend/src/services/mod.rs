//! Business logic services for the Hainan Weather Service

pub mod alert;
pub mod dedup;
pub mod location;
pub mod normalizer;
pub mod store;
pub mod sync;
pub mod weather;

pub use alert::PgAlertStore;
pub use dedup::DeduplicationGate;
pub use location::PgLocationStore;
pub use normalizer::AlertNormalizer;
pub use store::{AlertStore, LocationStore, WeatherStore};
pub use sync::{SyncGuard, SyncOutcome, SyncService};
pub use weather::PgWeatherStore;
