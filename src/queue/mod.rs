//! Queue module - serialized access to the generation engine

pub mod request_queue;

pub use request_queue::{QueueConfig, QueueStats, RequestQueue};
