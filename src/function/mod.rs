//! Serverless functions
//!
//! A function turns one `Invocation` into one `FunctionResponse`. It is handed
//! its input explicitly and never touches the network, disk or shared state, so
//! the same value can run behind the HTTP host or `fnhost invoke`.

mod invocation;
pub mod registry;
mod response;
pub mod save;

pub use invocation::Invocation;
pub use registry::FunctionRegistry;
pub use response::FunctionResponse;

pub trait Function: Send + Sync {
    fn name(&self) -> &str;

    fn handle(&self, invocation: &Invocation) -> FunctionResponse;
}
