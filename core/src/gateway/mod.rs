pub mod error;
pub mod http;
pub mod traits;

#[cfg(test)]
pub mod fake;

pub use error::GatewayError;
pub use http::HttpTaskGateway;
pub use traits::{GatewayResult, TaskGateway};
