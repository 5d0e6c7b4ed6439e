use serde::Serialize;

/// Overall throughput rating shown next to the FPS counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Excellent,
    Good,
    NeedsOptimization,
}

impl PerformanceTier {
    /// `> 30` excellent, `> 20` good, anything else needs optimisation.
    pub fn classify(fps: u32) -> Self {
        match fps {
            f if f > 30 => Self::Excellent,
            f if f > 20 => Self::Good,
            _ => Self::NeedsOptimization,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::NeedsOptimization => "needs optimization",
        }
    }
}

/// Per-iteration latency rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyClass {
    Good,
    Acceptable,
    Degraded,
}

impl LatencyClass {
    /// `< 20ms` good, `< 50ms` acceptable, else degraded.
    pub fn classify(latency_ms: f64) -> Self {
        if latency_ms < 20.0 {
            Self::Good
        } else if latency_ms < 50.0 {
            Self::Acceptable
        } else {
            Self::Degraded
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub tier: PerformanceTier,
    pub latency: LatencyClass,
}

/// Rate a `(fps, latencyMs)` pair.
pub fn assess(fps: u32, latency_ms: f64) -> Assessment {
    Assessment {
        tier: PerformanceTier::classify(fps),
        latency: LatencyClass::classify(latency_ms),
    }
}
