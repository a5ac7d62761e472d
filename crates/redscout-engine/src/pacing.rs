//! Settle waits that a caller can abandon.

use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Operation cancelled")]
pub struct Cancelled;

/// Every suspension point in the engine goes through a `Pacer`, so a single
/// token cancels a stuck login wait or comment loop.
#[derive(Debug, Clone, Default)]
pub struct Pacer {
    token: CancellationToken,
}

impl Pacer {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.token.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    pub async fn settle(&self, delay: Duration) -> Result<(), Cancelled> {
        if delay.is_zero() {
            return self.check();
        }
        tokio::select! {
            _ = self.token.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
