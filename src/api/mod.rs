//! Transport to the marketplace API.

mod error;
mod request;

pub use error::{require, ApiError};
pub use request::{Credentials, Endpoint, Envelope, RequestClient};
