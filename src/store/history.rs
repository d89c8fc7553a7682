use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{WeekRecord, WeeklyRecommendation},
    services::providers::VisitedSource,
    store::json_file,
};

/// Number of full weekly selections kept in the archive
pub const ARCHIVE_CAPACITY: usize = 52;

// ============================================================================
// File shapes
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitedFile {
    #[serde(default)]
    pub visited: Vec<VisitedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitedEntry {
    pub place_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visited_date: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryFile {
    #[serde(default)]
    pub weeks: Vec<WeekRecord>,
}

/// Archive weeks are kept as raw JSON so a record written by an older build
/// survives a rewrite even if it no longer matches the current shape
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveFile {
    #[serde(default)]
    pub weeks: Vec<serde_json::Value>,
}

/// Union of two visited sets
pub fn merge_visited(local: &HashSet<String>, remote: &HashSet<String>) -> HashSet<String> {
    local.union(remote).cloned().collect()
}

/// Visited ids, recommendation history and the public archive
pub struct HistoryStore {
    visited_path: PathBuf,
    history_path: PathBuf,
    archive_path: PathBuf,
    remote: Option<Arc<dyn VisitedSource>>,
}

impl HistoryStore {
    pub fn new(
        visited_path: impl Into<PathBuf>,
        history_path: impl Into<PathBuf>,
        archive_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            visited_path: visited_path.into(),
            history_path: history_path.into(),
            archive_path: archive_path.into(),
            remote: None,
        }
    }

    /// Also consult a remote visited list when loading visited ids
    pub fn with_remote(mut self, remote: Arc<dyn VisitedSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn visited_path(&self) -> &PathBuf {
        &self.visited_path
    }

    pub fn load_local_visited(&self) -> HashSet<String> {
        let file: VisitedFile = json_file::load_or_default(&self.visited_path);
        file.visited
            .into_iter()
            .map(|entry| entry.place_id)
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Local visited ids merged with the remote source, if any
    ///
    /// A failing remote is logged and the local set is used on its own.
    pub async fn load_visited(&self) -> HashSet<String> {
        let local = self.load_local_visited();

        let Some(remote) = &self.remote else {
            tracing::info!(local = local.len(), "Visited ids loaded");
            return local;
        };

        match remote.fetch_visited().await {
            Ok(remote_ids) => {
                let merged = merge_visited(&local, &remote_ids);
                tracing::info!(
                    local = local.len(),
                    remote = remote_ids.len(),
                    merged = merged.len(),
                    source = remote.name(),
                    "Visited ids loaded"
                );
                merged
            }
            Err(e) => {
                tracing::warn!(
                    source = remote.name(),
                    error = %e,
                    "Remote visited list unavailable, using local list only"
                );
                local
            }
        }
    }

    pub fn load_history(&self) -> HistoryFile {
        json_file::load_or_default(&self.history_path)
    }

    /// Ids recommended within the last `weeks` weeks
    pub fn load_recent(&self, weeks: u32) -> HashSet<String> {
        self.load_recent_at(weeks, Utc::now())
    }

    pub fn load_recent_at(&self, weeks: u32, now: DateTime<Utc>) -> HashSet<String> {
        let cutoff = now - Duration::weeks(i64::from(weeks));
        let mut recent = HashSet::new();

        for record in self.load_history().weeks {
            let generated_at = match DateTime::parse_from_rfc3339(&record.generated_at) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(
                        generated_at = %record.generated_at,
                        error = %e,
                        "Skipping history record with unparseable timestamp"
                    );
                    continue;
                }
            };
            if generated_at >= cutoff {
                recent.extend(record.restaurants.into_iter().map(|r| r.place_id));
            }
        }

        tracing::info!(weeks = weeks, recent = recent.len(), "Recent recommendations loaded");
        recent
    }

    /// Prepends the week to the history and to the capped archive
    pub fn record_week(&self, week: &WeeklyRecommendation) -> AppResult<()> {
        let mut history = self.load_history();
        history.weeks.insert(0, week.to_week_record());
        json_file::save(&self.history_path, &history)?;

        let mut archive: ArchiveFile = json_file::load_or_default(&self.archive_path);
        archive.weeks.insert(0, serde_json::to_value(week)?);
        archive.weeks.truncate(ARCHIVE_CAPACITY);
        json_file::save(&self.archive_path, &archive)?;

        tracing::info!(
            week_label = %week.week_label,
            history_weeks = history.weeks.len(),
            archive_weeks = archive.weeks.len(),
            "Week recorded"
        );
        Ok(())
    }
}
