//! Built-in [`Transport`](docvault_traits::Transport) implementations.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpTransport;
