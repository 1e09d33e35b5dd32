//! Console messaging endpoint.
//!
//! Prints replies to stdout and copies delivered images to disk, since the
//! generated file is deleted as soon as delivery returns.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use scratchmap::handler::{EndpointError, MessagingEndpoint};

/// Where delivered images are copied.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// Every image overwrites this file.
    File(PathBuf),
    /// Each image gets its own numbered file in this directory.
    Directory(PathBuf),
}

pub struct ConsoleEndpoint {
    delivery: Delivery,
    delivered: AtomicU64,
}

impl ConsoleEndpoint {
    pub fn new(delivery: Delivery) -> Self {
        Self {
            delivery,
            delivered: AtomicU64::new(0),
        }
    }

    /// Number of images delivered so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }

    fn destination(&self, recipient: &str, sequence: u64) -> PathBuf {
        match &self.delivery {
            Delivery::File(path) => path.clone(),
            Delivery::Directory(dir) => {
                dir.join(format!("scratchmap-{}-{}.png", file_safe(recipient), sequence))
            }
        }
    }
}

impl MessagingEndpoint for ConsoleEndpoint {
    async fn send_text(&self, recipient: &str, message: &str) -> Result<(), EndpointError> {
        println!("[{}] {}", recipient, message);
        Ok(())
    }

    async fn send_image(
        &self,
        recipient: &str,
        path: &Path,
        caption: &str,
    ) -> Result<(), EndpointError> {
        let sequence = self.delivered.fetch_add(1, Ordering::SeqCst) + 1;
        let destination = self.destination(recipient, sequence);

        tokio::fs::copy(path, &destination)
            .await
            .map_err(|e| EndpointError {
                recipient: recipient.to_string(),
                reason: format!("copy to {} failed: {}", destination.display(), e),
            })?;

        info!(recipient, path = %destination.display(), "Scratch map delivered");
        println!("[{}] {} ({})", recipient, caption, destination.display());
        Ok(())
    }
}

/// Keeps ASCII letters, digits, `-` and `_`; everything else becomes `_`.
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
