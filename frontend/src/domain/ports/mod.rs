//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`AuthApi`, `PredictionSource`, `Sleeper`) are implemented by
//! outbound adapters; `Presentation` is implemented by whichever UI layer
//! renders messages.

mod auth_api;
mod macros;
mod prediction_source;
mod presentation;
mod sleeper;

#[cfg(test)]
pub use auth_api::MockAuthApi;
pub use auth_api::AuthApi;
pub(crate) use macros::define_port_error;
#[cfg(test)]
pub use prediction_source::MockPredictionSource;
pub use prediction_source::PredictionSource;
#[cfg(test)]
pub use presentation::MockPresentation;
pub use presentation::Presentation;
#[cfg(test)]
pub use sleeper::MockSleeper;
pub use sleeper::Sleeper;
