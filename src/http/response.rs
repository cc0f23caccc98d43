//! HTTP response building module
//!
//! Builders for the responses the host produces on its own, outside any function.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Build JSON response; serialization failures become a 500
pub fn build_json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_plain(
                StatusCode::INTERNAL_SERVER_ERROR,
                "application/json",
                r#"{"ok":false,"message":"Internal server error"}"#,
            );
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 response for a path outside any function
pub fn build_404_response(available: &[String]) -> Response<Full<Bytes>> {
    build_json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({
            "ok": false,
            "message": "Not Found",
            "functions": available,
        }),
    )
}

/// Build 404 response for an unregistered function name
pub fn build_function_not_found(name: &str) -> Response<Full<Bytes>> {
    build_json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({
            "ok": false,
            "message": "Function not found",
            "function": name,
        }),
    )
}

/// Build 413 Payload Too Large response
pub fn build_413_response(max_body_size: u64) -> Response<Full<Bytes>> {
    build_json_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        &serde_json::json!({
            "ok": false,
            "message": "Payload Too Large",
            "max_body_size": max_body_size,
        }),
    )
}

/// Build 400 response for a request body that could not be read
pub fn build_400_response(detail: &str) -> Response<Full<Bytes>> {
    build_json_response(
        StatusCode::BAD_REQUEST,
        &serde_json::json!({
            "ok": false,
            "message": "Could not read request body",
            "error": detail,
        }),
    )
}

/// Build 502 response for a function that returned something unusable
pub fn build_502_response(detail: &str) -> Response<Full<Bytes>> {
    build_json_response(
        StatusCode::BAD_GATEWAY,
        &serde_json::json!({
            "ok": false,
            "message": "Invalid function response",
            "error": detail,
        }),
    )
}

/// Build CORS preflight response
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", ALLOWED_METHODS)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build health check response
pub fn build_health_response(status: &str) -> Response<Full<Bytes>> {
    build_plain(StatusCode::OK, "text/plain", status)
}

fn build_plain(status: StatusCode, content_type: &str, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .header("Cache-Control", "no-cache")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from(body.to_string())))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_function_not_found_body() {
        let resp = build_function_not_found("nope");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()["content-type"], "application/json");
        let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body["function"], "nope");
        assert_eq!(body["ok"], false);
    }

    #[test]
    fn test_options_response_headers() {
        let resp = build_options_response();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()["allow"], ALLOWED_METHODS);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_health_response() {
        let resp = build_health_response("ok");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "ok");
    }
}
