//! Request validation for the serving endpoints

use crate::error::ValidationError;
use crate::models::{Category, Clarity, Color, Cut, Diamond};
use serde_json::{Map, Value};

/// Fields every feature record must carry, in dataset order
pub const REQUIRED_FIELDS: [&str; 9] = [
    "carat", "cut", "color", "clarity", "depth", "table", "x", "y", "z",
];

/// A validated `/predict_price` request
#[derive(Debug, Clone, PartialEq)]
pub struct PredictRequest {
    pub diamond: Diamond,
    /// Name or alias as sent; `None` when the request did not name a model
    pub model_name: Option<String>,
    pub model_version: Option<u32>,
}

/// A validated `/similar_diamonds` request
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarRequest {
    pub diamond: Diamond,
    pub count: usize,
}

/// Parse a request body into a JSON object
pub fn parse_body(body: &[u8]) -> Result<Map<String, Value>, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::MalformedBody("request body is empty".to_string()));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationError::MalformedBody(
            "request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(ValidationError::MalformedBody(e.to_string())),
    }
}

/// Validate the feature record under `data`
pub fn validate_record(data: Option<&Value>) -> Result<Diamond, ValidationError> {
    let record = match data {
        Some(Value::Object(record)) => record,
        Some(_) => {
            return Err(ValidationError::Invalid {
                field: "data".to_string(),
                reason: "must be an object".to_string(),
            })
        }
        None => return Err(ValidationError::MissingFields(vec!["data".to_string()])),
    };

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|f| record.get(**f).map_or(true, Value::is_null))
        .map(|f| f.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    Ok(Diamond {
        carat: positive_number(record, "carat")?,
        cut: category::<Cut>(record)?,
        color: category::<Color>(record)?,
        clarity: category::<Clarity>(record)?,
        depth: positive_number(record, "depth")?,
        table: positive_number(record, "table")?,
        x: positive_number(record, "x")?,
        y: positive_number(record, "y")?,
        z: positive_number(record, "z")?,
    })
}

fn positive_number(record: &Map<String, Value>, field: &str) -> Result<f64, ValidationError> {
    let value = match &record[field] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
    .ok_or_else(|| ValidationError::NotNumeric {
        field: field.to_string(),
    })?;

    if value <= 0.0 {
        return Err(ValidationError::NotPositive {
            field: field.to_string(),
        });
    }
    Ok(value)
}

fn category<C: Category>(record: &Map<String, Value>) -> Result<C, ValidationError> {
    match &record[C::FIELD] {
        Value::String(label) => Ok(C::parse_label(label)?),
        other => Ok(C::parse_label(&other.to_string())?),
    }
}

/// `model_version`: absent or null means latest, otherwise a positive integer
fn model_version(body: &Map<String, Value>) -> Result<Option<u32>, ValidationError> {
    let invalid = || ValidationError::Invalid {
        field: "model_version".to_string(),
        reason: "must be a positive integer or null".to_string(),
    };
    match body.get("model_version") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .filter(|v| *v > 0)
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

fn model_name(body: &Map<String, Value>) -> Result<Option<String>, ValidationError> {
    match body.get("model_name") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(name)) if !name.trim().is_empty() => Ok(Some(name.trim().to_string())),
        Some(_) => Err(ValidationError::Invalid {
            field: "model_name".to_string(),
            reason: "must be a non-empty string".to_string(),
        }),
    }
}

pub fn parse_predict_request(body: &[u8]) -> Result<PredictRequest, ValidationError> {
    let body = parse_body(body)?;
    Ok(PredictRequest {
        diamond: validate_record(body.get("data"))?,
        model_name: model_name(&body)?,
        model_version: model_version(&body)?,
    })
}

pub fn parse_similar_request(body: &[u8]) -> Result<SimilarRequest, ValidationError> {
    let body = parse_body(body)?;
    let diamond = validate_record(body.get("data"))?;

    let count = match body.get("num_similar_diamonds") {
        None | Some(Value::Null) => {
            return Err(ValidationError::MissingFields(vec![
                "num_similar_diamonds".to_string(),
            ]))
        }
        Some(Value::Number(n)) => n.as_u64().filter(|v| *v > 0),
        Some(_) => None,
    }
    .and_then(|v| usize::try_from(v).ok())
    .ok_or_else(|| ValidationError::Invalid {
        field: "num_similar_diamonds".to_string(),
        reason: "must be a positive integer".to_string(),
    })?;

    Ok(SimilarRequest { diamond, count })
}
