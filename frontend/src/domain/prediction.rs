//! Car price prediction form handling.
//!
//! Raw form values arrive as strings. Checkbox fields become `0`/`1`,
//! numeric fields are parsed with lenient leading-number semantics and the
//! remaining fields pass through untouched.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::ports::{PredictionSource, define_port_error};
use super::validation::FormRecord;

/// Checkbox fields; presence in the form means checked.
pub const CHECKBOX_FIELDS: [&str; 6] = [
    "carbon_fiber_body",
    "aero_package",
    "limited_edition",
    "has_warranty",
    "non_original_parts",
    "damage",
];

/// Fields submitted as integers.
pub const INTEGER_FIELDS: [&str; 9] = [
    "year",
    "horsepower",
    "torque",
    "weight_kg",
    "top_speed_mph",
    "num_doors",
    "mileage",
    "num_owners",
    "warranty_years",
];

/// Fields submitted as floats.
pub const FLOAT_FIELDS: [&str; 2] = ["zero_to_60_s", "damage_cost"];

/// Fields that must be non-empty and non-zero.
pub const REQUIRED_FIELDS: [&str; 3] = ["year", "brand", "model"];

const DEFAULT_FAILURE: &str = "Prediction failed";

define_port_error! {
    /// Errors surfaced while requesting a prediction.
    pub enum PredictionError {
        /// Required inputs were empty or zero.
        MissingFields { fields: String } => "Missing required fields: {fields}",
        /// The request failed or the backend declined it.
        Failed { reason: String } => "Failed to get prediction: {reason}",
    }
}

/// Typed prediction request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredictionForm(BTreeMap<String, Value>);

impl PredictionForm {
    /// Convert raw form fields into a request body.
    ///
    /// # Examples
    /// ```
    /// use frontend::domain::{FormRecord, PredictionForm};
    /// use serde_json::json;
    ///
    /// let raw = FormRecord::new()
    ///     .with("year", "2020")
    ///     .with("brand", "Ferrari")
    ///     .with("model", "F8")
    ///     .with("damage", "on");
    /// let form = PredictionForm::from_fields(&raw).unwrap();
    /// assert_eq!(form.get("year"), Some(&json!(2020)));
    /// assert_eq!(form.get("damage"), Some(&json!(1)));
    /// assert_eq!(form.get("aero_package"), Some(&json!(0)));
    /// ```
    pub fn from_fields(raw: &FormRecord) -> Result<Self, PredictionError> {
        let mut fields: BTreeMap<String, Value> = raw
            .iter()
            .map(|(name, value)| (name.to_owned(), Value::from(value)))
            .collect();

        for name in CHECKBOX_FIELDS {
            let checked = raw.get(name).is_some();
            fields.insert(name.to_owned(), Value::from(u8::from(checked)));
        }
        for name in INTEGER_FIELDS {
            let parsed = raw.get(name).map_or(0, parse_leading_int);
            fields.insert(name.to_owned(), Value::from(parsed));
        }
        for name in FLOAT_FIELDS {
            let parsed = raw.get(name).map_or(0.0, parse_leading_float);
            fields.insert(name.to_owned(), Value::from(parsed));
        }

        let missing: Vec<&str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|name| fields.get(*name).is_none_or(is_blank))
            .collect();
        if !missing.is_empty() {
            return Err(PredictionError::missing_fields(missing.join(", ")));
        }
        Ok(Self(fields))
    }

    /// Value submitted for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::Bool(flag) => !flag,
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn leading_int_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?\d+")
            .unwrap_or_else(|error| panic!("integer prefix pattern must compile: {error}"))
    })
}

fn leading_float_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?")
            .unwrap_or_else(|error| panic!("float prefix pattern must compile: {error}"))
    })
}

/// Parse the leading integer of `raw`, ignoring leading whitespace and any
/// trailing garbage. Unparsable input yields `0`.
pub(crate) fn parse_leading_int(raw: &str) -> i64 {
    leading_int_pattern()
        .find(raw.trim_start())
        .and_then(|found| found.as_str().parse().ok())
        .unwrap_or(0)
}

/// Parse the leading decimal number of `raw`. Unparsable input yields `0.0`.
pub(crate) fn parse_leading_float(raw: &str) -> f64 {
    leading_float_pattern()
        .find(raw.trim_start())
        .and_then(|found| found.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub predicted_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub database_id: Option<i64>,
    #[serde(default)]
    pub input_data: Map<String, Value>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PredictionReply {
    /// Accept a successful reply or describe why it failed.
    pub fn into_result(self) -> Result<PredictionResult, PredictionError> {
        if !self.success {
            let reason = self
                .message
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| DEFAULT_FAILURE.to_owned());
            return Err(PredictionError::failed(reason));
        }
        let Some(predicted_price) = self.predicted_price else {
            warn!("prediction reply reported success without a price");
            return Err(PredictionError::failed(DEFAULT_FAILURE));
        };
        Ok(PredictionResult {
            predicted_price,
            currency: self.currency.unwrap_or_else(|| "USD".to_owned()),
            database_id: self.database_id,
            input_data: self.input_data,
            timestamp: self.timestamp,
        })
    }
}

/// Accepted prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub predicted_price: f64,
    pub currency: String,
    pub database_id: Option<i64>,
    /// Inputs echoed back by the backend.
    pub input_data: Map<String, Value>,
    pub timestamp: Option<NaiveDateTime>,
}

impl PredictionResult {
    /// Price as whole dollars with thousands separators, e.g. `$45,000`.
    pub fn summary(&self) -> String {
        format!("${}", group_thousands(self.predicted_price.round()))
    }

    /// Vehicle line, e.g. `2020 Ferrari F8`.
    pub fn vehicle(&self) -> String {
        let part = |name: &str| match self.input_data.get(name) {
            Some(Value::String(text)) if !text.is_empty() => text.clone(),
            Some(Value::Number(number)) if number.as_f64() != Some(0.0) => number.to_string(),
            _ => "Unknown".to_owned(),
        };
        format!("{} {} {}", part("year"), part("brand"), part("model"))
    }
}

fn group_thousands(rounded: f64) -> String {
    // Adding zero turns -0.0 into 0.0.
    let text = format!("{:.0}", rounded + 0.0);
    let (sign, digits) = text
        .strip_prefix('-')
        .map_or(("", text.as_str()), |rest| ("-", rest));
    let mut grouped = String::with_capacity(text.len() + digits.len() / 3);
    grouped.push_str(sign);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Submits prediction forms to a [`PredictionSource`].
#[derive(Clone)]
pub struct PredictionService {
    source: Arc<dyn PredictionSource>,
}

impl PredictionService {
    /// Service backed by `source`.
    pub fn new(source: Arc<dyn PredictionSource>) -> Self {
        Self { source }
    }

    /// Convert raw form fields and request a prediction.
    pub async fn submit(&self, raw: &FormRecord) -> Result<PredictionResult, PredictionError> {
        let form = PredictionForm::from_fields(raw)?;
        self.predict(&form).await
    }

    /// Request a prediction for an already converted form.
    pub async fn predict(&self, form: &PredictionForm) -> Result<PredictionResult, PredictionError> {
        debug!(?form, "requesting prediction");
        let reply = self.source.predict(form).await.map_err(|error| {
            warn!(error_code = %error.code(), %error, "prediction request failed");
            PredictionError::failed(error.reason())
        })?;
        let result = reply.into_result()?;
        info!(price = result.predicted_price, currency = %result.currency, "prediction received");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ApiError;
    use crate::domain::ports::MockPredictionSource;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn complete_form() -> FormRecord {
        FormRecord::new()
            .with("year", "2020")
            .with("brand", "Ferrari")
            .with("model", "F8 Tributo")
            .with("horsepower", "710")
            .with("zero_to_60_s", "2.9")
            .with("engine_config", "V8")
            .with("aero_package", "on")
    }

    #[rstest]
    #[case("2020", 2020)]
    #[case("  42", 42)]
    #[case("2020abc", 2020)]
    #[case("-7", -7)]
    #[case("12.9", 12)]
    #[case("abc", 0)]
    #[case("", 0)]
    fn leading_int_semantics(#[case] raw: &str, #[case] expected: i64) {
        assert_eq!(parse_leading_int(raw), expected);
    }

    #[rstest]
    #[case("2.9", 2.9)]
    #[case(".5s", 0.5)]
    #[case("1e3", 1000.0)]
    #[case("3.", 3.0)]
    #[case("x1", 0.0)]
    fn leading_float_semantics(#[case] raw: &str, #[case] expected: f64) {
        assert!((parse_leading_float(raw) - expected).abs() < f64::EPSILON);
    }

    #[rstest]
    fn converts_typed_fields(complete_form: FormRecord) {
        let form = PredictionForm::from_fields(&complete_form).expect("valid form");
        let body = serde_json::to_value(&form).expect("serialise form");

        assert_eq!(body["year"], json!(2020));
        assert_eq!(body["horsepower"], json!(710));
        assert_eq!(body["mileage"], json!(0));
        assert_eq!(body["zero_to_60_s"], json!(2.9));
        assert_eq!(body["damage_cost"], json!(0.0));
        assert_eq!(body["aero_package"], json!(1));
        assert_eq!(body["damage"], json!(0));
        assert_eq!(body["engine_config"], json!("V8"));
    }

    #[rstest]
    #[case(FormRecord::new(), "Missing required fields: year, brand, model")]
    #[case(
        FormRecord::new().with("year", "abc").with("brand", "BMW").with("model", "M3"),
        "Missing required fields: year"
    )]
    #[case(
        FormRecord::new().with("year", "2019").with("brand", "").with("model", "M3"),
        "Missing required fields: brand"
    )]
    fn reports_missing_required_fields(#[case] raw: FormRecord, #[case] expected: &str) {
        let err = PredictionForm::from_fields(&raw).expect_err("missing fields");
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    #[case(45_000.0, "$45,000")]
    #[case(999.4, "$999")]
    #[case(1_234_567.5, "$1,234,568")]
    #[case(0.0, "$0")]
    fn summary_groups_thousands(#[case] price: f64, #[case] expected: &str) {
        let result = PredictionResult {
            predicted_price: price,
            currency: "USD".to_owned(),
            database_id: None,
            input_data: Map::new(),
            timestamp: None,
        };
        assert_eq!(result.summary(), expected);
        assert_eq!(result.vehicle(), "Unknown Unknown Unknown");
    }

    #[rstest]
    #[tokio::test]
    async fn successful_reply_becomes_result(complete_form: FormRecord) {
        let mut source = MockPredictionSource::new();
        source.expect_predict().times(1).returning(|_| {
            serde_json::from_value(json!({
                "success": true,
                "predicted_price": 250000.0,
                "currency": "USD",
                "database_id": 12,
                "input_data": {"year": 2020, "brand": "Ferrari", "model": "F8 Tributo"},
                "timestamp": "2024-05-01T12:30:00.123456",
            }))
            .map_err(|_| ApiError::unexpected())
        });

        let service = PredictionService::new(Arc::new(source));
        let result = service.submit(&complete_form).await.expect("prediction");
        assert_eq!(result.summary(), "$250,000");
        assert_eq!(result.vehicle(), "2020 Ferrari F8 Tributo");
        assert_eq!(result.database_id, Some(12));
        assert!(result.timestamp.is_some());
    }

    #[rstest]
    #[case(json!({"success": false, "message": "Model offline"}), "Failed to get prediction: Model offline")]
    #[case(json!({"success": false}), "Failed to get prediction: Prediction failed")]
    #[case(json!({"success": true}), "Failed to get prediction: Prediction failed")]
    #[tokio::test]
    async fn declined_reply_is_an_error(
        complete_form: FormRecord,
        #[case] body: Value,
        #[case] expected: &str,
    ) {
        let reply: PredictionReply = serde_json::from_value(body).expect("decode reply");
        let mut source = MockPredictionSource::new();
        source.expect_predict().times(1).return_once(move |_| Ok(reply));

        let service = PredictionService::new(Arc::new(source));
        let err = service.submit(&complete_form).await.expect_err("declined");
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    #[case(
        json!({"message": "Service temporarily unavailable"}),
        "Service temporarily unavailable"
    )]
    #[case(
        json!({"error": "Missing required fields", "missing_fields": ["year"]}),
        "Missing required fields"
    )]
    #[case(json!({}), "Request failed with status 400")]
    #[tokio::test]
    async fn rejected_requests_report_the_server_reason(
        complete_form: FormRecord,
        #[case] body: Value,
        #[case] reason: &str,
    ) {
        let mut source = MockPredictionSource::new();
        source
            .expect_predict()
            .times(1)
            .return_once(move |_| Err(ApiError::from_response(400, &body)));

        let service = PredictionService::new(Arc::new(source));
        let err = service.submit(&complete_form).await.expect_err("rejected");
        assert_eq!(err, PredictionError::failed(reason));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_fields_never_reach_the_source() {
        let mut source = MockPredictionSource::new();
        source.expect_predict().never();

        let service = PredictionService::new(Arc::new(source));
        let err = service
            .submit(&FormRecord::new().with("brand", "BMW").with("model", "M3"))
            .await
            .expect_err("missing year");
        assert_eq!(err, PredictionError::missing_fields("year"));
    }
}
