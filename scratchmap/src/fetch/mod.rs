//! Tile fetching from the render backend.
//!
//! [`TileFetcher`] downloads one rendered tile per grid coordinate over HTTP
//! and retries failed requests according to a [`RetryPolicy`]. The HTTP
//! client and the tile source are traits so the compositor and the generator
//! can be tested without a network.

mod fetcher;
mod http;
mod retry;

pub use fetcher::{FetchError, TileFetcher, TileSource, TILE_SUFFIX};
pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpError};
pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_MS};

#[cfg(test)]
pub use http::tests::{FlakyHttpClient, MockAsyncHttpClient};
