//! Gateway module - tier resolution and generation dispatch

pub mod dispatcher;
pub mod tier;

pub use dispatcher::{Dispatcher, GenerationRequest, GenerationResult};
