// Use cases layer: the engine API and its tick scheduler.

pub mod engine;
mod scheduler;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::Engine;
pub use types::EngineSettings;
