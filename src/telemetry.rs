use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Installs the global fmt subscriber, writing to stderr
///
/// Stdout is kept free for `--dry-run` output. Safe to call more than once;
/// later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Identifier attached to every log line of one pipeline run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Span that scopes all events of the run
    pub fn span(&self, dry_run: bool) -> tracing::Span {
        tracing::info_span!("weekly_run", run_id = %self, dry_run = dry_run)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn test_run_id_displays_as_uuid() {
        let id = RunId::new();
        assert_eq!(id.to_string(), id.0.to_string());
        assert!(Uuid::parse_str(&id.to_string()).is_ok());
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}
