//! Invocation record
//!
//! One incoming call as the hosting runtime hands it to a function. The JSON
//! shape follows the Netlify/Lambda event (`httpMethod`, `queryStringParameters`,
//! `isBase64Encoded`), so an event captured from a deployed site can be replayed
//! with `fnhost invoke`.

use std::borrow::Cow;
use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::InvocationError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Invocation {
    /// HTTP verb; `None` when the event carries no method at all
    #[serde(rename = "httpMethod", default)]
    pub method: Option<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(rename = "isBase64Encoded", default)]
    pub is_base64_encoded: bool,
    #[serde(
        rename = "queryStringParameters",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub query_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub headers: HashMap<String, String>,
}

impl Invocation {
    pub fn is_method(&self, method: &str) -> bool {
        self.method.as_deref() == Some(method)
    }

    /// Raw body bytes, base64-decoded when the event says so.
    ///
    /// Absent and empty bodies both come back as `None`.
    pub fn body_bytes(&self) -> Result<Option<Cow<'_, [u8]>>, InvocationError> {
        let Some(body) = self.body.as_deref().filter(|b| !b.is_empty()) else {
            return Ok(None);
        };

        if self.is_base64_encoded {
            let decoded = STANDARD.decode(body)?;
            Ok(Some(Cow::Owned(decoded)))
        } else {
            Ok(Some(Cow::Borrowed(body.as_bytes())))
        }
    }
}

#[cfg(test)]
impl Invocation {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_parameters.insert(key.into(), value.into());
        self
    }
}

/// Events from API gateways send `null` instead of `{}` for empty maps
fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}
