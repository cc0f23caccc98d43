//! Request handler module
//!
//! Routes HTTP requests to registered functions and adapts between hyper
//! types and the function invocation model.

pub mod adapter;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
