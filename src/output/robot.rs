//! JSON envelopes printed on stdout in robot mode.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ErrorCode, RepoError, Result};

#[derive(Debug, Serialize)]
pub struct RobotResponse<T> {
    pub status: RobotStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Ok,
    Error {
        /// Error code enum value (e.g., "SETUP_FAILURE")
        code: ErrorCode,
        /// Numeric error code (e.g., 101)
        numeric_code: u16,
        message: String,
        /// Actionable suggestion for recovery
        suggestion: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<serde_json::Value>,
        /// Error category (e.g., "setup", "config")
        category: String,
    },
}

pub fn robot_ok<T: Serialize>(data: T) -> RobotResponse<T> {
    RobotResponse {
        status: RobotStatus::Ok,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data,
        warnings: Vec::new(),
    }
}

/// Print `data` wrapped in an ok envelope.
pub fn emit_json<T: Serialize>(data: T) -> Result<()> {
    let json = serde_json::to_string_pretty(&robot_ok(data))?;
    println!("{json}");
    Ok(())
}

/// Error response carrying the structured form of `err`.
pub fn robot_error(err: &RepoError) -> RobotResponse<serde_json::Value> {
    let structured = err.to_structured();
    RobotResponse {
        status: RobotStatus::Error {
            code: structured.code,
            numeric_code: structured.numeric_code,
            message: structured.message,
            suggestion: structured.suggestion,
            context: structured.context,
            category: structured.category,
        },
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data: serde_json::Value::Null,
        warnings: Vec::new(),
    }
}
