pub mod client;
pub mod protocol;

pub use client::{normalize_url, ConnectError, RemoteBridge, RemoteEndpoint, Session, SubmitError};
pub use protocol::{ErrorBody, RunRequest, ServiceInfo};
