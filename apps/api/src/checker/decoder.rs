//! Result Decoder: turns scorer stdout into either a score or a rejection.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// The fields the service relies on. Anything else the scorer emits
/// (e.g. `extracted_skills`) stays in the raw payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreResult {
    pub ats_score: f64,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Score { payload: Value, result: ScoreResult },
    /// Well-formed payload with a truthy `error` key: bad input, not a crash.
    Rejected(Value),
}

pub fn decode(stdout: &str) -> Result<Decoded, DecodeError> {
    let payload: Value = serde_json::from_str(stdout.trim())?;

    if payload.get("error").is_some_and(is_truthy) {
        return Ok(Decoded::Rejected(payload));
    }

    let result = ScoreResult::deserialize(&payload)?;
    Ok(Decoded::Score { payload, result })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
