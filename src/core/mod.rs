//! Polling engine: data model, normalization, backoff and scheduling

pub mod backoff;
pub mod calculator;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod normalize;
pub mod price;
pub mod scheduler;
pub mod snapshot;

// Re-export main types for cleaner imports
pub use currency::{FxRateProvider, FxTable};
pub use price::PriceProvider;
pub use scheduler::{PollingScheduler, PresentationAdapter, SchedulerHandle, TickerView};
pub use snapshot::{CanonicalPriceSnapshot, Karat, RawPayload};
