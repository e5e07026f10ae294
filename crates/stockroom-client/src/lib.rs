//! Authenticated API client for the Stockroom admin backend.
//!
//! Provides:
//! - [`SessionLayer`] / [`SessionService`]: Tower middleware that attaches credentials and recovers from 401s
//! - [`HttpTransport`]: reqwest-backed inner service
//! - [`EndpointPolicy`]: Public/protected classification of request URLs
//! - [`AdminClient`]: JSON helpers and the public auth flows
//! - [`resources`]: Typed catalog, order, payment, inventory and alert calls
//! - [`ClientError`]: Client-specific error types

mod body;
mod client;
pub mod endpoints;
mod error;
pub mod models;
mod pipeline;
pub mod resources;
mod transport;

pub use body::ApiBody;
pub use client::AdminClient;
pub use endpoints::{DEFAULT_PUBLIC_ENDPOINTS, EndpointPolicy};
pub use error::{ClientError, Result};
pub use pipeline::{SessionLayer, SessionService, TENANT_HEADER};
pub use resources::{PageQuery, PaginatedResponse};
pub use transport::{DEFAULT_REQUEST_TIMEOUT, HttpTransport};
