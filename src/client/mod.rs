//! Client context and outbound HTTP transport.

pub mod context;
pub mod transport;

pub use context::LarkClient;
pub use transport::{ApiRequest, ApiResponse, FilePart, HttpTransport, Transport};
