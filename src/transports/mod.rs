//! Transport implementations for the lobby API.
//!
//! Concrete [`Transport`](crate::Transport) implementations live behind
//! feature gates. Enable the corresponding Cargo feature to pull one in:
//!
//! | Feature          | Transport         |
//! |------------------|-------------------|
//! | `transport-http` | [`HttpTransport`] |
//!
//! # Example
//!
//! ```rust,ignore
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use card_lobby_client::{HttpTransport, Transport};
//! use card_lobby_client::protocol::{paths, Method};
//! use card_lobby_client::transport::ApiRequest;
//!
//! let http = HttpTransport::new("http://localhost:8080")?;
//! let response = http.execute(ApiRequest::new(Method::Get, paths::GAMES)).await?;
//! println!("{} {}", response.status, response.body);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "transport-http")]
pub mod http;

#[cfg(feature = "transport-http")]
pub use http::HttpTransport;
