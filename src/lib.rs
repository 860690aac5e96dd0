//! Tiered Image Generation Gateway
//!
//! A single-endpoint gateway that maps a coarse quality level onto a fully
//! specified diffusion model configuration, authenticates the caller and
//! returns the generated image as PNG.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod queue;
pub mod response;

pub use error::{AppError, Result};

use std::sync::Arc;

use crate::backend::traits::DiffusionEngine;
use crate::config::Settings;
use crate::gateway::Dispatcher;
use crate::queue::RequestQueue;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<Dispatcher>,
    pub request_queue: Arc<RequestQueue>,
}

impl AppState {
    /// Wire the dispatcher and queue around an engine.
    ///
    /// Spawns the queue worker, so it must be called inside a tokio runtime.
    pub fn new(settings: Arc<Settings>, engine: Arc<dyn DiffusionEngine>) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(settings.clone(), engine));
        let request_queue = Arc::new(RequestQueue::with_config(
            dispatcher.clone(),
            settings.queue.clone(),
        ));

        Self {
            settings,
            dispatcher,
            request_queue,
        }
    }
}
