//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: health checks, CORS preflight,
//! body limits and dispatch to registered functions.

use crate::config::AppState;
use crate::handler::adapter;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_log = state.cached_access_log.load(Ordering::Relaxed);

    logger::log_request(req.method(), req.uri(), req.version());
    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let mut entry = access_log.then(|| {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = http_version(req.version()).to_string();
        entry.user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        entry
    });

    let (function, response) = route_request(req, &state).await;

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.function = function;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on path; returns the matched function name for logging
async fn route_request<B>(
    req: Request<B>,
    state: &Arc<AppState>,
) -> (Option<String>, Response<Full<Bytes>>)
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = req.uri().path();

    // 0. Health check endpoints (highest priority, always fast)
    let health = &state.config.routes.health;
    if health.enabled && (path == health.liveness_path || path == health.readiness_path) {
        return (None, http::build_health_response("ok"));
    }

    // 1. Function paths
    let Some(name) = function_name(path, &state.base_path).map(ToString::to_string) else {
        let available: Vec<String> = state
            .functions
            .names()
            .iter()
            .map(|n| format!("{}/{n}", state.base_path))
            .collect();
        return (None, http::build_404_response(&available));
    };

    let Some(function) = state.functions.get(&name) else {
        logger::log_warning(&format!("Request for unknown function '{name}'"));
        return (Some(name.clone()), http::build_function_not_found(&name));
    };

    // 2. CORS preflight is answered by the host
    if state.config.http.enable_cors && req.method() == Method::OPTIONS {
        return (Some(name), http::build_options_response());
    }

    // 3. Body size, declared then actual
    let max_body_size = state.config.http.max_body_size;
    if let Some(resp) = check_content_length(&req, max_body_size) {
        return (Some(name), resp);
    }

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_error(&format!(
                "Request body too large for '{name}' (max: {max_body_size})"
            ));
            return (Some(name), http::build_413_response(max_body_size));
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return (Some(name), http::build_400_response(&e.to_string()));
        }
    };

    // 4. Invoke
    let invocation = adapter::to_invocation(&parts, &body);
    let result = function.handle(&invocation);
    logger::log_invocation(&name, invocation.method.as_deref(), result.status_code);

    let response = adapter::into_http_response(result, &state.config.http);
    (Some(name), response)
}

/// `<base>/<name>` or `<base>/<name>/<rest>` -> `name`
fn function_name<'a>(path: &'a str, base_path: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(base_path)?.strip_prefix('/')?;
    rest.split('/').next().filter(|name| !name.is_empty())
}

/// Reject declared bodies above the limit before reading them
fn check_content_length<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    let Ok(size_str) = content_length.to_str() else {
        logger::log_warning("Content-Length header contains non-ASCII characters");
        return None;
    };
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response(max_body_size))
        }
        Ok(_) => None,
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', relying on streaming limit"
            ));
            None
        }
    }
}

const fn http_version(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
