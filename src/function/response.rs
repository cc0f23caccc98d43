//! Function response record

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::logger;

/// What a function hands back to the hosting runtime
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FunctionResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl FunctionResponse {
    /// Build a JSON response; serialization failures turn into a 500
    pub fn json<T: Serialize>(status_code: u16, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(json) => Self::with_json_body(status_code, json),
            Err(e) => {
                logger::log_error(&format!("Failed to serialize function response: {e}"));
                Self::with_json_body(500, r#"{"ok":false,"message":"Internal error"}"#.to_string())
            }
        }
    }

    fn with_json_body(status_code: u16, body: String) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            body,
        }
    }

    /// Case-insensitive header lookup
    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
