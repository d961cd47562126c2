//! Tweetline Twitter - search source backed by the Twitter v1.1 search API
//!
//! Authenticates once with app-only (bearer) auth, then serves paginated
//! `search/tweets` queries to the core pipeline's workers.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use tweetline_twitter::{ClientConfig, Credentials, TwitterSearch};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let creds = Credentials::resolve(None, None, Path::new("CREDENTIALS.txt"))?;
//! let source = TwitterSearch::connect(&creds, &ClientConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod credentials;
pub mod http;
pub mod schema;

// Re-exports
pub use api::TwitterSearch;
pub use credentials::Credentials;
pub use http::{ApiError, ClientConfig};
