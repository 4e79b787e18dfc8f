use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::analyzer::ResultItem;

/// Body of a `/calculate` request: the canvas snapshot as a data URL, plus
/// variable assignments made by earlier expressions on the same canvas
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub image: String,
    #[serde(default)]
    pub dict_of_vars: HashMap<String, Value>,
}

/// Success envelope for `/calculate`
#[derive(Debug, Serialize)]
pub struct CalculateResponse {
    pub message: &'static str,
    pub data: Vec<ResultItem>,
    pub status: &'static str,
}

impl CalculateResponse {
    pub fn new(data: Vec<ResultItem>) -> Self {
        Self {
            message: "Image processed",
            data,
            status: "success",
        }
    }
}

/// Uniform error envelope
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub status: &'static str,
}

impl ErrorEnvelope {
    pub fn new(message: String) -> Self {
        Self {
            message,
            status: "error",
        }
    }
}

/// Error envelope for schema violations; carries the extractor's diagnostics
#[derive(Debug, Serialize)]
pub struct ValidationEnvelope {
    pub message: &'static str,
    pub status: &'static str,
    pub details: String,
}

impl ValidationEnvelope {
    pub fn new(details: String) -> Self {
        Self {
            message: "Validation error",
            status: "error",
            details,
        }
    }
}
