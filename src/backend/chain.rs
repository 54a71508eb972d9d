//! Ordered fallback across several backends

use super::traits::{Backend, BackendCapabilities, FetchRequest};
use super::JobReporter;
use crate::error::BackendError;
use crate::types::{Asset, VideoInfo};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Tries backends in order until one succeeds
///
/// Each attempt runs under its own time budget. Backends that do not support
/// the operation are skipped without being counted as failures; cancellation
/// stops the chain immediately. If every attempt fails the error lists each
/// attempt in order. A chain of one passes that backend's error through.
pub struct ChainBackend {
    name: String,
    backends: Vec<Arc<dyn Backend>>,
    attempt_timeout: Duration,
}

impl ChainBackend {
    /// Create a chain over `backends`, tried in the given order
    pub fn new(backends: Vec<Arc<dyn Backend>>, attempt_timeout: Duration) -> Self {
        let name = match backends.as_slice() {
            [only] => only.name().to_string(),
            all => format!(
                "chain[{}]",
                all.iter().map(|b| b.name()).collect::<Vec<_>>().join(", ")
            ),
        };
        Self {
            name,
            backends,
            attempt_timeout,
        }
    }

    async fn attempt<T, F>(&self, backend: &dyn Backend, call: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        match tokio::time::timeout(self.attempt_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                backend: backend.name().to_string(),
                after: self.attempt_timeout,
            }),
        }
    }

    fn exhausted(&self, operation: &str, mut failures: Vec<BackendError>) -> BackendError {
        if self.backends.len() == 1
            && let Some(only) = failures.pop()
        {
            return only;
        }
        if failures.is_empty() {
            return BackendError::Unsupported {
                backend: self.name.clone(),
                operation: operation.to_string(),
            };
        }
        BackendError::AllFailed {
            attempts: failures.iter().map(ToString::to_string).collect(),
        }
    }
}

#[async_trait]
impl Backend for ChainBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.backends.iter().fold(
            BackendCapabilities {
                can_describe: false,
                can_fetch: false,
            },
            |acc, b| {
                let caps = b.capabilities();
                BackendCapabilities {
                    can_describe: acc.can_describe || caps.can_describe,
                    can_fetch: acc.can_fetch || caps.can_fetch,
                }
            },
        )
    }

    async fn video_info(&self, url: &str) -> Result<VideoInfo, BackendError> {
        let mut failures = Vec::new();
        for backend in &self.backends {
            if !backend.capabilities().can_describe {
                continue;
            }
            match self.attempt(backend.as_ref(), backend.video_info(url)).await {
                Ok(info) => return Ok(info),
                Err(e) if e.is_unsupported() => continue,
                Err(e) => {
                    tracing::debug!(backend = backend.name(), error = %e, "video info attempt failed");
                    failures.push(e);
                }
            }
        }
        Err(self.exhausted("video_info", failures))
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        reporter: &JobReporter,
    ) -> Result<Asset, BackendError> {
        let mut failures = Vec::new();
        for backend in &self.backends {
            if reporter.is_cancelled() {
                return Err(BackendError::Cancelled);
            }
            if !backend.capabilities().can_fetch {
                continue;
            }
            match self
                .attempt(backend.as_ref(), backend.fetch(request, reporter))
                .await
            {
                Ok(asset) => {
                    tracing::debug!(job_id = %request.job_id, backend = backend.name(), "fetch succeeded");
                    return Ok(asset);
                }
                Err(BackendError::Cancelled) => return Err(BackendError::Cancelled),
                Err(e) if e.is_unsupported() => continue,
                Err(e) => {
                    tracing::warn!(
                        job_id = %request.job_id,
                        backend = backend.name(),
                        error = %e,
                        "fetch attempt failed"
                    );
                    failures.push(e);
                }
            }
        }
        Err(self.exhausted("fetch", failures))
    }
}
