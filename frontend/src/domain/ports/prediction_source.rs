//! Driven port for the price prediction endpoint.

use async_trait::async_trait;

use crate::domain::{ApiError, PredictionForm, PredictionReply};

/// Source of price predictions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionSource: Send + Sync {
    /// `POST /predict` with session credentials.
    async fn predict(&self, form: &PredictionForm) -> Result<PredictionReply, ApiError>;
}
