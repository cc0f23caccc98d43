//! Local invocation
//!
//! Runs a registered function once against an event JSON file (or stdin) and
//! returns its response, without starting the HTTP host.

use std::io::Read;
use std::path::Path;

use crate::error::HostError;
use crate::function::{FunctionRegistry, FunctionResponse, Invocation};
use crate::logger;

/// Where the event comes from: `None` for an empty event, `-` for stdin
pub fn read_event(source: Option<&Path>) -> Result<Invocation, HostError> {
    let raw = match source {
        None => return Ok(Invocation::default()),
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)?,
    };

    if raw.trim().is_empty() {
        return Ok(Invocation::default());
    }
    Ok(serde_json::from_str(&raw)?)
}

pub fn invoke(
    registry: &FunctionRegistry,
    name: &str,
    invocation: &Invocation,
) -> Result<FunctionResponse, HostError> {
    let function = registry
        .get(name)
        .ok_or_else(|| HostError::UnknownFunction {
            name: name.to_string(),
            available: registry.names().join(", "),
        })?;

    let response = function.handle(invocation);
    logger::log_invocation(name, invocation.method.as_deref(), response.status_code);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn temp_event(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("fnhost-{}-{name}.json", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_event_from_file() {
        let path = temp_event(
            "post",
            r#"{"httpMethod":"POST","body":"{\"name\":\"ok\"}","queryStringParameters":null}"#,
        );
        let inv = read_event(Some(&path)).unwrap();
        let _ = std::fs::remove_file(&path);

        assert!(inv.is_method("POST"));
        assert_eq!(inv.body.as_deref(), Some(r#"{"name":"ok"}"#));
    }

    #[test]
    fn test_read_event_defaults() {
        assert_eq!(read_event(None).unwrap(), Invocation::default());

        let path = temp_event("blank", "  \n");
        let inv = read_event(Some(&path)).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(inv, Invocation::default());
    }

    #[test]
    fn test_read_event_errors() {
        let path = temp_event("broken", "{not json");
        let result = read_event(Some(&path));
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(HostError::Event(_))));

        let missing = Path::new("/definitely/not/here/event.json");
        assert!(matches!(read_event(Some(missing)), Err(HostError::Io(_))));
    }

    #[test]
    fn test_invoke_save() {
        let registry = FunctionRegistry::with_builtins();
        let inv = Invocation::new("POST").with_body(r#"{"name":"ok"}"#);
        let resp = invoke(&registry, "save", &inv).unwrap();
        assert_eq!(resp.status_code, 200);

        let body: Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(body["data"], json!({"name": "ok"}));
    }

    #[test]
    fn test_invoke_without_method_uses_default_branch() {
        let registry = FunctionRegistry::with_builtins();
        let resp = invoke(&registry, "save", &Invocation::default()).unwrap();
        let body: Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(body["methods"], json!(["GET", "POST"]));
    }

    #[test]
    fn test_invoke_unknown_function() {
        let registry = FunctionRegistry::with_builtins();
        let err = invoke(&registry, "nope", &Invocation::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "function 'nope' is not registered (available: save)"
        );
    }
}
