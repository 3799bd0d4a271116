//! # HTTP Surface Tests
//!
//! End-to-end tests through the full router (middleware included) over a
//! fresh SQLite database per test.

mod users;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::test_utils::*;

/// `detail` of an error body that carries a plain code.
fn detail_code(body: &Value) -> &str {
    body["detail"].as_str().unwrap_or_default()
}
