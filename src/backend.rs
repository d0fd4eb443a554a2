pub mod api;
pub use api::BackendApi;
pub mod payloads;
pub mod http_client;
pub use http_client::HttpBackend;
