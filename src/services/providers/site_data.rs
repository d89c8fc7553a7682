/// Publishes the weekly selection as static JSON for the website
///
/// Writes `current.json` and mirrors the local visited list so the site can
/// grey out places the user has already been to. The archive lives in the
/// same directory but is maintained by the history store.
use std::fs;
use std::path::PathBuf;

use crate::{
    error::AppResult,
    models::WeeklyRecommendation,
    services::providers::RecommendationSink,
    store::{history::VisitedFile, json_file},
};

pub const CURRENT_FILE: &str = "current.json";
pub const VISITED_FILE: &str = "visited.json";

#[derive(Debug, Clone)]
pub struct SiteDataPublisher {
    site_data_dir: PathBuf,
    visited_path: PathBuf,
}

impl SiteDataPublisher {
    pub fn new(site_data_dir: impl Into<PathBuf>, visited_path: impl Into<PathBuf>) -> Self {
        Self {
            site_data_dir: site_data_dir.into(),
            visited_path: visited_path.into(),
        }
    }

    fn mirror_visited(&self) -> AppResult<()> {
        let target = self.site_data_dir.join(VISITED_FILE);
        if self.visited_path.exists() {
            fs::create_dir_all(&self.site_data_dir)?;
            fs::copy(&self.visited_path, &target)?;
        } else {
            json_file::save(&target, &VisitedFile::default())?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecommendationSink for SiteDataPublisher {
    async fn deliver(&self, week: &WeeklyRecommendation) -> AppResult<()> {
        json_file::save(&self.site_data_dir.join(CURRENT_FILE), week)?;
        self.mirror_visited()?;

        tracing::info!(
            dir = %self.site_data_dir.display(),
            restaurants = week.restaurants.len(),
            "Site data published"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Site data"
    }
}
