//! ESPN site API client.
//!
//! Cached, retried GETs against the scoreboard endpoints, and the parser
//! that turns a scoreboard body into [`common::Game`] records.

pub mod cache;
pub mod fetch;
pub mod query;
pub mod scoreboard;
pub mod transport;

pub use cache::{cache_key, write_new, CacheableContent};
pub use fetch::{FetchClient, RetryPolicy};
pub use query::QueryParams;
pub use scoreboard::{EspnScoreboardParser, GameParser};
pub use transport::{HttpTransport, ReqwestTransport};
