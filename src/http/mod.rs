//! HTTP protocol layer module
//!
//! Response builders used by the router, kept apart from function logic.

pub mod response;

// Re-export commonly used builders
pub use response::{
    build_400_response, build_404_response, build_413_response, build_502_response,
    build_function_not_found, build_health_response, build_options_response,
};
