//! The `save` function
//!
//! Echoes POST payloads back under `data` and answers every other method with a
//! short usage note. Nothing is stored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Function, FunctionResponse, Invocation};
use crate::error::InvocationError;

pub const NAME: &str = "save";

const RECEIVED_MESSAGE: &str = "Received POST";
const USAGE_MESSAGE: &str = "Netlify function is working. Use POST to send data.";
const MALFORMED_MESSAGE: &str = "Malformed JSON payload";
const TOO_DEEP_MESSAGE: &str = "Payload nested too deeply";
const SUPPORTED_METHODS: [&str; 2] = ["GET", "POST"];

/// Deepest array/object nesting accepted in a POST body
const MAX_NESTING_DEPTH: usize = 256;

#[derive(Serialize)]
struct Received<'a> {
    ok: bool,
    message: &'a str,
    data: &'a Value,
}

#[derive(Serialize)]
struct Usage {
    ok: bool,
    message: &'static str,
    methods: [&'static str; 2],
}

#[derive(Serialize)]
struct Rejected {
    ok: bool,
    message: &'static str,
    error: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SaveFunction;

impl Function for SaveFunction {
    fn name(&self) -> &str {
        NAME
    }

    fn handle(&self, invocation: &Invocation) -> FunctionResponse {
        handle(invocation)
    }
}

pub fn handle(invocation: &Invocation) -> FunctionResponse {
    if !invocation.is_method("POST") {
        return FunctionResponse::json(
            200,
            &Usage {
                ok: true,
                message: USAGE_MESSAGE,
                methods: SUPPORTED_METHODS,
            },
        );
    }

    match decode_payload(invocation) {
        Ok(payload) => FunctionResponse::json(
            200,
            &Received {
                ok: true,
                message: RECEIVED_MESSAGE,
                data: &payload,
            },
        ),
        Err(e) => FunctionResponse::json(
            400,
            &Rejected {
                ok: false,
                message: match e {
                    InvocationError::TooDeep { .. } => TOO_DEEP_MESSAGE,
                    _ => MALFORMED_MESSAGE,
                },
                error: e.to_string(),
            },
        ),
    }
}

/// Missing or empty body decodes to `{}`
fn decode_payload(invocation: &Invocation) -> Result<Value, InvocationError> {
    match invocation.body_bytes()? {
        Some(bytes) => parse_json(&bytes),
        None => Ok(Value::Object(serde_json::Map::new())),
    }
}

/// serde_json's own 128-level cap is lifted; nesting is bounded here instead
fn parse_json(bytes: &[u8]) -> Result<Value, InvocationError> {
    check_nesting(bytes)?;

    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = Value::deserialize(&mut de)?;
    de.end()?;
    Ok(value)
}

/// Count bracket depth outside string literals
fn check_nesting(bytes: &[u8]) -> Result<(), InvocationError> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &b in bytes {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH {
                    return Err(InvocationError::TooDeep {
                        limit: MAX_NESTING_DEPTH,
                    });
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}
