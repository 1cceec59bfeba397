// Use-case level settings for the engine.

/// Tuning applied to a newly created engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Fraction of the round-trip time extrapolated when a world is applied.
    pub rtt_scale: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { rtt_scale: 0.5 }
    }
}
