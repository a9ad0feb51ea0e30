//! [`PredictionSource`] over [`HttpApiClient`].

use async_trait::async_trait;

use super::PREDICT_ENDPOINT;
use super::client::{HttpApiClient, RequestOptions, encode};
use crate::domain::ports::PredictionSource;
use crate::domain::{ApiError, PredictionForm, PredictionReply};

#[async_trait]
impl PredictionSource for HttpApiClient {
    async fn predict(&self, form: &PredictionForm) -> Result<PredictionReply, ApiError> {
        let body = encode(PREDICT_ENDPOINT, form)?;
        self.exchange_as(PREDICT_ENDPOINT, Some(body), RequestOptions::default())
            .await
    }
}
