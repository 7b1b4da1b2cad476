//! Ordered fallback across credential sources

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::credential::{AccessToken, TokenCredential};
use crate::error::AuthenticationError;

const NONE_SELECTED: usize = usize::MAX;

/// Tries each source in order; the first token wins
///
/// The source that succeeded is remembered and asked first next time.
pub struct ChainedCredential {
    sources: Vec<(&'static str, Arc<dyn TokenCredential>)>,
    selected: AtomicUsize,
}

impl ChainedCredential {
    pub fn new(sources: Vec<(&'static str, Arc<dyn TokenCredential>)>) -> Self {
        Self {
            sources,
            selected: AtomicUsize::new(NONE_SELECTED),
        }
    }

    /// Names of the sources, in the order they are tried
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|(name, _)| *name).collect()
    }
}

#[async_trait]
impl TokenCredential for ChainedCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthenticationError> {
        let mut attempts = Vec::with_capacity(self.sources.len());

        let selected = self.selected.load(Ordering::Acquire);
        if let Some((name, source)) = self.sources.get(selected) {
            match source.get_token(scope).await {
                Ok(token) => return Ok(token),
                Err(e) => {
                    debug!(source = name, "Previously working credential failed: {}", e);
                    attempts.push(format!("{name}: {e}"));
                }
            }
        }

        for (index, (name, source)) in self.sources.iter().enumerate() {
            if index == selected {
                continue;
            }
            match source.get_token(scope).await {
                Ok(token) => {
                    info!(source = name, "Default credential chain selected a source");
                    self.selected.store(index, Ordering::Release);
                    return Ok(token);
                }
                Err(e) => {
                    debug!(source = name, "Credential source failed: {}", e);
                    attempts.push(format!("{name}: {e}"));
                }
            }
        }

        Err(AuthenticationError::ChainExhausted(attempts))
    }
}
