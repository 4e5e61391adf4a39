//! Model performance metrics as reported by the chat backend.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Aggregate metrics from `GET /api/metrics`.
///
/// Every field is optional; the backend omits whatever it has not recorded yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_requests: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub successful_requests: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub success_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_latency: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub p50_latency: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub p95_latency: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub p99_latency: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_context_relevance: Option<f64>,
    #[serde(default)]
    pub latency_over_time: Vec<LatencyPoint>,
}

/// One sample of the 24h latency series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyPoint {
    /// Milliseconds since the epoch.
    #[serde(deserialize_with = "lenient_i64")]
    pub timestamp: i64,
    #[serde(deserialize_with = "lenient_f64_required")]
    pub value: f64,
}

/// `GET /api/metrics/sessions/{id}` body.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionMetrics {
    pub session_id: String,
    #[serde(default)]
    pub metrics: Vec<Value>,
    #[serde(default)]
    pub summary: Option<SessionSummary>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionSummary {
    #[serde(default)]
    pub total_interactions: u64,
    #[serde(default)]
    pub avg_latency: f64,
    #[serde(default)]
    pub avg_relevance_score: f64,
    #[serde(default)]
    pub start_time: Option<Value>,
    #[serde(default)]
    pub end_time: Option<Value>,
}

// Time-series values come back from the store as strings as often as numbers.
fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

fn lenient_f64_required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value_as_f64(&value).ok_or_else(|| serde::de::Error::custom(format!("expected number, got {value}")))
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| serde::de::Error::custom(format!("expected integer, got {value}")))
}
