//! Location registry transports

pub mod http_client;

pub use http_client::HttpRegistryClient;
