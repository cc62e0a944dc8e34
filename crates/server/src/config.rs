//! Service configuration.
//!
//! Plain structs with `Default` impls for use in code, plus [`ServiceArgs`]
//! so both binaries accept the same flags and environment variables.

use clap::{Args, ValueEnum};
use sources::DEFAULT_RECOMMENDATION_COUNT;
use std::path::PathBuf;
use std::time::Duration;
use worker_client::{RecommendAction, WorkerConfig};

/// Chance of trying the recommendation path when the viewer has likes
pub const DEFAULT_RECOMMEND_PROBABILITY: f64 = 0.6;

/// Overall deadline for the recommendation path, after which the random
/// path is taken
pub const DEFAULT_RECOMMEND_BUDGET: Duration = Duration::from_secs(5);

/// What to do once a viewer has been shown the whole catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExhaustionPolicy {
    /// Report exhaustion to the client
    #[default]
    Terminal,
    /// Forget what the viewer has seen and start over
    WrapAround,
}

#[derive(Debug, Clone)]
pub struct SelectionConfig {
    pub recommend_probability: f64,
    pub recommend_count: usize,
    pub recommend_budget: Duration,
    pub exhaustion_policy: ExhaustionPolicy,
    pub action: RecommendAction,
}

impl SelectionConfig {
    /// Clamped to `[0, 1]`
    pub fn with_recommend_probability(mut self, probability: f64) -> Self {
        self.recommend_probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn with_recommend_count(mut self, count: usize) -> Self {
        self.recommend_count = count.max(1);
        self
    }

    pub fn with_recommend_budget(mut self, budget: Duration) -> Self {
        self.recommend_budget = budget;
        self
    }

    pub fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion_policy = policy;
        self
    }

    pub fn with_action(mut self, action: RecommendAction) -> Self {
        self.action = action;
        self
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            recommend_probability: DEFAULT_RECOMMEND_PROBABILITY,
            recommend_count: DEFAULT_RECOMMENDATION_COUNT,
            recommend_budget: DEFAULT_RECOMMEND_BUDGET,
            exhaustion_policy: ExhaustionPolicy::default(),
            action: RecommendAction::default(),
        }
    }
}

/// Flags shared by `painting-server` and `painting-recs`
#[derive(Debug, Clone, Args)]
pub struct ServiceArgs {
    /// Artwork catalog (JSON array or JSON lines)
    #[arg(long, env = "CATALOG_PATH", default_value = "data/paintings.json")]
    pub catalog: PathBuf,

    /// Redis URL for viewed sets; in-memory when unset
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Recommendation worker executable
    #[arg(long, env = "WORKER_PROGRAM", default_value = "python3")]
    pub worker_program: PathBuf,

    /// Arguments passed to the worker (comma separated)
    #[arg(
        long,
        env = "WORKER_ARGS",
        value_delimiter = ',',
        default_value = "recommend/chroma_recommendation_service.py"
    )]
    pub worker_args: Vec<String>,

    /// Working directory for the worker
    #[arg(long, env = "WORKER_DIR")]
    pub worker_dir: Option<PathBuf>,

    /// Substring on the worker's stderr that signals readiness
    #[arg(long, env = "WORKER_READY_MARKER", default_value = worker_client::config::DEFAULT_READY_MARKER)]
    pub worker_ready_marker: String,

    /// Per-call worker timeout in milliseconds
    #[arg(long, env = "WORKER_TIMEOUT_MS", default_value_t = 5000)]
    pub worker_timeout_ms: u64,

    /// Delay before respawning a worker that exited, in milliseconds
    #[arg(long, env = "WORKER_BACKOFF_MS", default_value_t = 2000)]
    pub worker_backoff_ms: u64,

    /// Run without a recommendation worker (random path only)
    #[arg(long)]
    pub no_worker: bool,

    /// Probability of trying the recommendation path
    #[arg(long, env = "RECOMMEND_PROBABILITY", default_value_t = DEFAULT_RECOMMEND_PROBABILITY)]
    pub recommend_probability: f64,

    /// Number of recommendations to ask the worker for
    #[arg(long, env = "RECOMMEND_COUNT", default_value_t = DEFAULT_RECOMMENDATION_COUNT)]
    pub recommend_count: usize,

    /// Deadline for the whole recommendation path in milliseconds
    #[arg(long, env = "RECOMMEND_BUDGET_MS", default_value_t = 5000)]
    pub recommend_budget_ms: u64,

    /// Which similarity query to send (recommend or diverse)
    #[arg(long, env = "RECOMMEND_ACTION", default_value = "recommend")]
    pub recommend_action: RecommendAction,

    /// What to do once a viewer has seen every artwork
    #[arg(long, env = "EXHAUSTION_POLICY", value_enum, default_value_t = ExhaustionPolicy::Terminal)]
    pub exhaustion_policy: ExhaustionPolicy,
}

impl ServiceArgs {
    pub fn worker_config(&self) -> WorkerConfig {
        let config = WorkerConfig::new(&self.worker_program)
            .with_args(self.worker_args.iter().cloned())
            .with_ready_marker(self.worker_ready_marker.clone())
            .with_call_timeout(Duration::from_millis(self.worker_timeout_ms))
            .with_restart_backoff(Duration::from_millis(self.worker_backoff_ms));
        match &self.worker_dir {
            Some(dir) => config.with_current_dir(dir),
            None => config,
        }
    }

    pub fn selection_config(&self) -> SelectionConfig {
        SelectionConfig::default()
            .with_recommend_probability(self.recommend_probability)
            .with_recommend_count(self.recommend_count)
            .with_recommend_budget(Duration::from_millis(self.recommend_budget_ms))
            .with_exhaustion_policy(self.exhaustion_policy)
            .with_action(self.recommend_action)
    }
}
