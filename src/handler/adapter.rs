//! HTTP <-> function adapter
//!
//! Turns a hyper request into an `Invocation` and a `FunctionResponse` back
//! into a hyper response, the way a serverless gateway would.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE, SERVER};
use hyper::http::request::Parts;
use hyper::{Response, StatusCode};

use crate::config::HttpConfig;
use crate::function::{FunctionResponse, Invocation};
use crate::http;
use crate::logger;

/// Build the invocation for a request whose body has already been collected
pub fn to_invocation(parts: &Parts, body: &Bytes) -> Invocation {
    let (body, is_base64_encoded) = encode_body(body);

    Invocation {
        method: Some(parts.method.as_str().to_string()),
        path: parts.uri.path().to_string(),
        body,
        is_base64_encoded,
        query_parameters: parse_query(parts.uri.query()),
        headers: collect_headers(parts),
    }
}

/// Text bodies pass through, anything else travels as base64
fn encode_body(body: &Bytes) -> (Option<String>, bool) {
    if body.is_empty() {
        return (None, false);
    }
    match std::str::from_utf8(body) {
        Ok(text) => (Some(text.to_string()), false),
        Err(_) => (Some(STANDARD.encode(body)), true),
    }
}

/// Repeated keys keep the last value
fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return HashMap::new();
    };
    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(e) => {
            logger::log_warning(&format!("Ignoring unparsable query string '{query}': {e}"));
            HashMap::new()
        }
    }
}

/// Lower-case names, repeated headers joined with ", "
fn collect_headers(parts: &Parts) -> HashMap<String, String> {
    let mut headers: HashMap<String, String> = HashMap::new();
    for (name, value) in &parts.headers {
        let Ok(value) = value.to_str() else {
            logger::log_debug(&format!("Skipping non-UTF-8 header {name}"));
            continue;
        };
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    headers
}

/// Build the HTTP response for a function result
pub fn into_http_response(resp: FunctionResponse, config: &HttpConfig) -> Response<Full<Bytes>> {
    let Ok(status) = StatusCode::from_u16(resp.status_code) else {
        logger::log_error(&format!(
            "Function returned invalid status code {}",
            resp.status_code
        ));
        return http::build_502_response(&format!("invalid status code {}", resp.status_code));
    };

    let mut response = Response::new(Full::new(Bytes::from(resp.body)));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &resp.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => logger::log_warning(&format!("Dropping invalid function header '{name}'")),
        }
    }

    if !headers.contains_key(CONTENT_TYPE) {
        if let Ok(value) = HeaderValue::from_str(&config.default_content_type) {
            headers.insert(CONTENT_TYPE, value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(&config.server_name) {
        headers.insert(SERVER, value);
    }
    if config.enable_cors {
        headers.insert(
            "access-control-allow-origin",
            HeaderValue::from_static("*"),
        );
    }

    response
}
