//! Tile fetcher with fixed-delay retry.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, warn};

use super::http::{AsyncHttpClient, HttpError};
use super::retry::RetryPolicy;
use crate::coord::TileCoord;

/// Resolution suffix appended to every tile path.
pub const TILE_SUFFIX: &str = "@3x.png";

/// A tile could not be retrieved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Tile {zoom}/{tile} failed after {attempts} attempts: {last}")]
    Exhausted {
        zoom: u8,
        tile: TileCoord,
        attempts: u32,
        last: HttpError,
    },
}

/// Anything that can produce the raw bytes of one rendered tile.
pub trait TileSource: Send + Sync {
    fn fetch_tile(
        &self,
        zoom: u8,
        tile: TileCoord,
    ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Fetches tiles from `{base_url}{zoom}/{x}/{y}@3x.png`.
pub struct TileFetcher<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
    retry: RetryPolicy,
}

impl<C: AsyncHttpClient> TileFetcher<C> {
    /// Creates a fetcher. `base_url` is used verbatim as the URL prefix and
    /// normally ends with a slash.
    pub fn new(http_client: C, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            retry,
        }
    }

    pub fn tile_url(&self, zoom: u8, tile: TileCoord) -> String {
        format!("{}{}/{}/{}{}", self.base_url, zoom, tile.x, tile.y, TILE_SUFFIX)
    }
}

impl<C: AsyncHttpClient> TileSource for TileFetcher<C> {
    async fn fetch_tile(&self, zoom: u8, tile: TileCoord) -> Result<Vec<u8>, FetchError> {
        let url = self.tile_url(zoom, tile);
        let mut attempt = 1;
        loop {
            match self.http_client.get(&url).await {
                Ok(bytes) => {
                    debug!(url = %url, attempt, bytes = bytes.len(), "Fetched tile");
                    return Ok(bytes);
                }
                Err(e) => match self.retry.delay_for_attempt(attempt) {
                    Some(delay) => {
                        debug!(url = %url, attempt, error = %e, "Tile request failed, retrying");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        warn!(url = %url, attempts = attempt, error = %e, "Giving up on tile");
                        return Err(FetchError::Exhausted {
                            zoom,
                            tile,
                            attempts: attempt,
                            last: e,
                        });
                    }
                },
            }
        }
    }
}
