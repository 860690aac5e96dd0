//! Request queue serializing access to the generation engine

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::gateway::dispatcher::{Dispatcher, GenerationRequest, GenerationResult};

/// Request with its response channel
struct QueuedRequest {
    request: GenerationRequest,
    response_tx: oneshot::Sender<Result<GenerationResult>>,
}

/// Configuration for the request queue
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Maximum number of requests waiting for the engine
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    /// Maximum number of generations running at once. The engine shares one
    /// accelerator, so anything above 1 needs an engine that documents
    /// concurrent use.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_pending() -> usize {
    16
}

fn default_max_concurrent() -> usize {
    1
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_pending: default_max_pending(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Request queue in front of the dispatcher
pub struct RequestQueue {
    request_tx: mpsc::Sender<QueuedRequest>,
    config: QueueConfig,
    pending_count: Arc<AtomicU64>,
    processed_count: Arc<AtomicU64>,
}

/// Decrements the pending counter however `submit` exits
struct PendingGuard(Arc<AtomicU64>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl RequestQueue {
    /// Create a request queue and spawn its worker
    pub fn with_config(dispatcher: Arc<Dispatcher>, config: QueueConfig) -> Self {
        let (request_tx, request_rx) = mpsc::channel(config.max_pending.max(1));
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        let processed_count = Arc::new(AtomicU64::new(0));

        // Start the worker task
        tokio::spawn(Self::process_requests(
            request_rx,
            dispatcher,
            semaphore,
            processed_count.clone(),
        ));

        Self {
            request_tx,
            config,
            pending_count: Arc::new(AtomicU64::new(0)),
            processed_count,
        }
    }

    /// Submit a request and wait for its result
    pub async fn submit(&self, request: GenerationRequest) -> Result<GenerationResult> {
        let pending = self.pending_count.fetch_add(1, Ordering::Relaxed);
        let _guard = PendingGuard(self.pending_count.clone());

        if pending >= self.config.max_pending as u64 {
            return Err(AppError::QueueFull);
        }

        let (response_tx, response_rx) = oneshot::channel();

        self.request_tx
            .try_send(QueuedRequest {
                request,
                response_tx,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => AppError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => {
                    AppError::GenerationFailure("Generation worker is not running".to_string())
                }
            })?;

        debug!(pending = pending + 1, "Request queued");

        response_rx.await.map_err(|_| {
            AppError::GenerationFailure("Request processing was cancelled".to_string())
        })?
    }

    /// Process requests from the queue
    async fn process_requests(
        mut request_rx: mpsc::Receiver<QueuedRequest>,
        dispatcher: Arc<Dispatcher>,
        semaphore: Arc<Semaphore>,
        processed_count: Arc<AtomicU64>,
    ) {
        while let Some(queued) = request_rx.recv().await {
            // Acquire before spawning so requests start in arrival order
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    let _ = queued.response_tx.send(Err(AppError::GenerationFailure(
                        "Failed to acquire processing permit".to_string(),
                    )));
                    continue;
                }
            };

            let dispatcher = dispatcher.clone();
            let processed_count = processed_count.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let result = dispatcher.generate(queued.request).await;
                processed_count.fetch_add(1, Ordering::Relaxed);

                // The caller may have gone away; the work is done either way.
                let _ = queued.response_tx.send(result);
            });
        }
    }

    /// Get the number of pending requests
    pub fn pending_count(&self) -> u64 {
        self.pending_count.load(Ordering::Relaxed)
    }

    /// Get the number of processed requests
    pub fn processed_count(&self) -> u64 {
        self.processed_count.load(Ordering::Relaxed)
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pending: self.pending_count(),
            processed: self.processed_count(),
            max_pending: self.config.max_pending,
            max_concurrent: self.config.max_concurrent,
        }
    }
}

/// Queue statistics
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub pending: u64,
    pub processed: u64,
    pub max_pending: usize,
    pub max_concurrent: usize,
}
