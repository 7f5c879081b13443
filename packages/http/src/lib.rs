//! # hearth-http
//!
//! Network adapters for Hearth:
//!
//! - [`ReqwestTransport`]: the store [`Transport`](hearth_store::Transport),
//!   over a blocking client
//! - [`HttpFetcher`]: the view loader's [`Fetcher`](hearth_view::Fetcher),
//!   over an async client
//!
//! ```ignore
//! use hearth_http::{HttpFetcher, ReqwestTransport};
//!
//! let fetcher = HttpFetcher::with_default_timeout("http://localhost:8080")?;
//! let transport = ReqwestTransport::with_default_timeout()?
//!     .with_base_url("http://localhost:8080/api/")?;
//! ```

pub mod error;

mod fetcher;
mod transport;

pub use error::Error;
pub use fetcher::HttpFetcher;
pub use transport::ReqwestTransport;
