//! Outbound HTTP plumbing shared by every external collaborator.

pub mod http;

pub use http::{build_client, TransportError};
