//! Worker configuration.

use std::time::Duration;

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Run-loop settings.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Upper bound on one blocking pop; shutdown is observed between pops
    pub pop_timeout: Duration,
    /// Pause after a backend error before popping again
    pub error_backoff: Duration,
    /// Where failed and unroutable payloads go. `None` drops them.
    pub dead_letter_queue: Option<String>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            pop_timeout: Duration::from_secs(5),
            error_backoff: Duration::from_secs(1),
            dead_letter_queue: None,
        }
    }
}

/// Settings shared by the stage handlers.
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Chain the script stage into the render stage
    pub render_enabled: bool,
    /// Simulated render time
    pub render_duration: Duration,
    /// Deadline for each generation call
    pub generation_timeout: Duration,
    /// Color grading applied to every scene prompt
    pub scene_style: String,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            render_enabled: false,
            render_duration: Duration::from_secs(10),
            generation_timeout: Duration::from_secs(120),
            scene_style: "vibrant cyberpunk".to_string(),
        }
    }
}

/// Upper bound on one blocking pop, so shutdown is noticed in bounded time.
pub const MAX_POP_TIMEOUT_SECS: u64 = 300;

/// Worker configuration.
#[derive(Debug, Clone, Default)]
pub struct WorkerConfig {
    pub processor: ProcessorConfig,
    pub stages: StageConfig,
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let processor = ProcessorConfig {
            pop_timeout: Duration::from_secs(
                env_u64("WORKER_POP_TIMEOUT_SECS", 5).clamp(1, MAX_POP_TIMEOUT_SECS),
            ),
            error_backoff: Duration::from_secs(1),
            dead_letter_queue: std::env::var("WORKER_DEAD_LETTER_QUEUE")
                .ok()
                .filter(|q| !q.trim().is_empty()),
        };

        let stages = StageConfig {
            render_enabled: std::env::var("WORKER_RENDER_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            render_duration: Duration::from_secs(env_u64("WORKER_RENDER_DURATION_SECS", 10)),
            generation_timeout: Duration::from_secs(env_u64("WORKER_GENERATION_TIMEOUT_SECS", 120)),
            scene_style: std::env::var("WORKER_SCENE_STYLE")
                .unwrap_or_else(|_| "vibrant cyberpunk".to_string()),
        };

        Self { processor, stages }
    }
}
