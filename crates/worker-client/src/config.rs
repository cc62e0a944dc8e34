use std::path::PathBuf;
use std::time::Duration;

/// Substring the worker prints on stderr once its model is loaded
pub const DEFAULT_READY_MARKER: &str = "Waiting for requests";

/// Delay between a worker exit and the next spawn
pub const DEFAULT_RESTART_BACKOFF: Duration = Duration::from_secs(2);

/// Per-call timeout for the liked/excluded recommendation workload
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-call timeout for the artist/weight workload
pub const ARTIST_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// How to launch and supervise the recommendation worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub ready_marker: String,
    pub restart_backoff: Duration,
    pub call_timeout: Duration,
}

impl WorkerConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            ready_marker: DEFAULT_READY_MARKER.to_string(),
            restart_backoff: DEFAULT_RESTART_BACKOFF,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn with_ready_marker(mut self, marker: impl Into<String>) -> Self {
        self.ready_marker = marker.into();
        self
    }

    pub fn with_restart_backoff(mut self, backoff: Duration) -> Self {
        self.restart_backoff = backoff;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new("python3").with_args(["recommend/chroma_recommendation_service.py"])
    }
}
