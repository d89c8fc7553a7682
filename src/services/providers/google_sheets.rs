/// Google Sheets provider for the shared visited list
///
/// The worksheet doubles as the user's checklist: this client reads the rows
/// marked as visited, and appends each week's new recommendations as
/// unvisited rows for the user to tick off.
///
/// Expected layout (header row first):
/// place_id | name | date_recommended | visited | visited_date
use std::collections::HashSet;
use std::time::Duration;

use reqwest::{Client as HttpClient, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::WeeklyRecommendation,
    services::providers::{RecommendationSink, VisitedSource},
};

pub const SHEET_HEADERS: [&str; 5] = [
    "place_id",
    "name",
    "date_recommended",
    "visited",
    "visited_date",
];

const VISITED_MARKERS: [&str; 4] = ["TRUE", "YES", "1", "○"];

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody {
    values: Vec<Vec<String>>,
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn column_index(header: &[Value], name: &str) -> Option<usize> {
    header
        .iter()
        .position(|cell| cell_text(cell).eq_ignore_ascii_case(name))
}

fn is_visited_marker(raw: &str) -> bool {
    let upper = raw.trim().to_uppercase();
    VISITED_MARKERS.contains(&upper.as_str())
}

/// Ids of rows whose `visited` column holds a truthy marker
pub fn parse_visited_rows(rows: &[Vec<Value>]) -> HashSet<String> {
    let Some((header, body)) = rows.split_first() else {
        return HashSet::new();
    };
    let (Some(id_col), Some(visited_col)) =
        (column_index(header, "place_id"), column_index(header, "visited"))
    else {
        tracing::warn!("Visited worksheet is missing the place_id or visited column");
        return HashSet::new();
    };

    body.iter()
        .filter(|row| {
            row.get(visited_col)
                .map(|cell| is_visited_marker(&cell_text(cell)))
                .unwrap_or(false)
        })
        .filter_map(|row| row.get(id_col).map(cell_text))
        .filter(|id| !id.is_empty())
        .collect()
}

/// Every id already listed in the worksheet, visited or not
pub fn existing_place_ids(rows: &[Vec<Value>]) -> HashSet<String> {
    let Some((header, body)) = rows.split_first() else {
        return HashSet::new();
    };
    let id_col = column_index(header, "place_id").unwrap_or(0);

    body.iter()
        .filter_map(|row| row.get(id_col).map(cell_text))
        .filter(|id| !id.is_empty())
        .collect()
}

/// Rows to append for recommendations not yet in the worksheet
pub fn build_new_rows(week: &WeeklyRecommendation, existing: &HashSet<String>) -> Vec<Vec<String>> {
    let date = week.generated_at.format("%Y-%m-%d").to_string();
    week.restaurants
        .iter()
        .filter(|r| !existing.contains(&r.place_id))
        .map(|r| {
            vec![
                r.place_id.clone(),
                r.name.clone(),
                date.clone(),
                "FALSE".to_string(),
                String::new(),
            ]
        })
        .collect()
}

#[derive(Clone)]
pub struct GoogleSheetsClient {
    http_client: HttpClient,
    api_url: String,
    spreadsheet_id: String,
    worksheet_name: String,
    access_token: String,
}

impl GoogleSheetsClient {
    pub fn new(
        api_url: String,
        spreadsheet_id: String,
        worksheet_name: String,
        access_token: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_url,
            spreadsheet_id,
            worksheet_name,
            access_token,
        })
    }

    /// `{api_url}/spreadsheets/{id}/values/{worksheet}{suffix}`
    fn values_url(&self, suffix: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| AppError::Config(format!("Invalid Sheets API URL: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::Config("Sheets API URL cannot be a base".to_string()))?;
            segments
                .pop_if_empty()
                .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values"])
                .push(&format!("{}{}", self.worksheet_name, suffix));
        }
        Ok(url)
    }

    async fn fetch_rows(&self) -> AppResult<Vec<Vec<Value>>> {
        let url = self.values_url("")?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Sheets API returned status {}: {}",
                status, body
            )));
        }

        let range: ValueRange = response.json().await?;
        Ok(range.values)
    }

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> AppResult<()> {
        let url = self.values_url(":append")?;

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&AppendBody { values: rows })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Sheets API returned status {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl VisitedSource for GoogleSheetsClient {
    async fn fetch_visited(&self) -> AppResult<HashSet<String>> {
        let rows = self.fetch_rows().await?;
        let visited = parse_visited_rows(&rows);

        tracing::info!(
            worksheet = %self.worksheet_name,
            rows = rows.len().saturating_sub(1),
            visited = visited.len(),
            "Visited rows read from spreadsheet"
        );

        Ok(visited)
    }

    fn name(&self) -> &'static str {
        "Google Sheets"
    }
}

#[async_trait::async_trait]
impl RecommendationSink for GoogleSheetsClient {
    async fn deliver(&self, week: &WeeklyRecommendation) -> AppResult<()> {
        let rows = self.fetch_rows().await?;
        let existing = existing_place_ids(&rows);
        let mut new_rows = build_new_rows(week, &existing);

        if new_rows.is_empty() {
            tracing::info!("All recommendations already listed in spreadsheet");
            return Ok(());
        }

        let appended = new_rows.len();
        if rows.is_empty() {
            new_rows.insert(0, SHEET_HEADERS.iter().map(|h| h.to_string()).collect());
        }
        self.append_rows(new_rows).await?;

        tracing::info!(appended = appended, "Recommendations appended to spreadsheet");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Google Sheets"
    }
}
