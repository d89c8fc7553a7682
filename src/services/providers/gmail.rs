/// Gmail notification sink
///
/// Mails a plain-text summary of the week to a single recipient through the
/// Gmail API `users.messages.send` endpoint. The OAuth access token is
/// obtained out of band, as for the Sheets client.
use std::fmt::Write as _;
use std::time::Duration;

use base64::Engine;
use reqwest::{Client as HttpClient, Url};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{Recommendation, WeeklyRecommendation},
    services::providers::RecommendationSink,
};

/// Placeholder replaced by the week label in the subject template
pub const DATE_PLACEHOLDER: &str = "{date}";

const BODY_LINE_WIDTH: usize = 76;

/// Body of `POST users/me/messages/send`
#[derive(Debug, Serialize)]
pub struct SendMessageRequest {
    /// RFC 2822 message, base64url encoded
    pub raw: String,
}

impl SendMessageRequest {
    pub fn from_message(message: &str) -> Self {
        Self {
            raw: base64::engine::general_purpose::URL_SAFE.encode(message.as_bytes()),
        }
    }
}

/// Addressing of the weekly mail
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub to: String,
    pub from: Option<String>,
    pub subject: String,
}

pub fn render_subject(template: &str, week_label: &str) -> String {
    template.replace(DATE_PLACEHOLDER, week_label)
}

fn write_restaurant(out: &mut String, index: usize, r: &Recommendation) {
    let _ = write!(out, "{}. {}", index + 1, r.name);
    if let Some(rating) = r.rating {
        let _ = write!(out, "  ★{:.1}", rating);
    }
    let _ = writeln!(out, " ({} reviews)", r.user_rating_count);

    let _ = writeln!(
        out,
        "   {} | Lunch {} / Dinner {}",
        r.budget_label, r.price_range_lunch, r.price_range_dinner
    );
    if !r.travel_summary.is_empty() {
        let _ = writeln!(out, "   {}", r.travel_summary);
    }
    if !r.address.is_empty() {
        let _ = writeln!(out, "   {}", r.address);
    }
    if let Some(menu) = &r.recommended_menu {
        let _ = writeln!(out, "   \"{}\"", menu);
    }
    if !r.google_maps_url.is_empty() {
        let _ = writeln!(out, "   {}", r.google_maps_url);
    }
}

/// Plain-text summary of the week
pub fn render_body(week: &WeeklyRecommendation, site_url: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Restaurant picks for {}", week.week_label);
    let _ = writeln!(out);

    for (i, r) in week.restaurants.iter().enumerate() {
        write_restaurant(&mut out, i, r);
        let _ = writeln!(out);
    }

    if let Some(url) = site_url.filter(|u| !u.is_empty()) {
        let _ = writeln!(out, "Details: {}", url);
    }
    out
}

/// Header values may not carry line breaks
fn header_value(raw: &str) -> String {
    raw.replace(['\r', '\n'], " ").trim().to_string()
}

/// RFC 2047 encoded word, so non-ASCII subjects survive transport
fn encode_subject(subject: &str) -> String {
    let subject = header_value(subject);
    if subject.is_ascii() {
        subject
    } else {
        format!(
            "=?UTF-8?B?{}?=",
            base64::engine::general_purpose::STANDARD.encode(subject.as_bytes())
        )
    }
}

/// Single-part `text/plain` message with a base64 transfer encoding
pub fn build_message(envelope: &Envelope, body: &str) -> String {
    let mut message = String::new();
    let _ = write!(message, "To: {}\r\n", header_value(&envelope.to));
    if let Some(from) = envelope.from.as_deref().filter(|f| !f.trim().is_empty()) {
        let _ = write!(message, "From: {}\r\n", header_value(from));
    }
    let _ = write!(message, "Subject: {}\r\n", encode_subject(&envelope.subject));
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str("Content-Type: text/plain; charset=\"UTF-8\"\r\n");
    message.push_str("Content-Transfer-Encoding: base64\r\n\r\n");

    let encoded = base64::engine::general_purpose::STANDARD.encode(body.as_bytes());
    // base64 output is ASCII
    for line in encoded.as_bytes().chunks(BODY_LINE_WIDTH) {
        message.push_str(&String::from_utf8_lossy(line));
        message.push_str("\r\n");
    }
    message
}

#[derive(Clone)]
pub struct GmailNotifier {
    http_client: HttpClient,
    api_url: String,
    access_token: String,
    recipient: String,
    sender: Option<String>,
    subject_template: String,
    site_url: Option<String>,
}

impl GmailNotifier {
    pub fn new(
        api_url: String,
        access_token: String,
        recipient: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_url,
            access_token,
            recipient,
            sender: None,
            subject_template: format!("Weekly restaurant picks {}", DATE_PLACEHOLDER),
            site_url: None,
        })
    }

    pub fn with_sender(mut self, sender: Option<String>) -> Self {
        self.sender = sender;
        self
    }

    pub fn with_subject_template(mut self, template: String) -> Self {
        self.subject_template = template;
        self
    }

    pub fn with_site_url(mut self, site_url: Option<String>) -> Self {
        self.site_url = site_url;
        self
    }

    /// `{api_url}/users/me/messages/send`
    fn send_url(&self) -> AppResult<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| AppError::Config(format!("Invalid Gmail API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config("Gmail API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["users", "me", "messages", "send"]);
        Ok(url)
    }

    pub fn envelope(&self, week: &WeeklyRecommendation) -> Envelope {
        Envelope {
            to: self.recipient.clone(),
            from: self.sender.clone(),
            subject: render_subject(&self.subject_template, &week.week_label),
        }
    }

    /// Request body for the given week
    pub fn build_request(&self, week: &WeeklyRecommendation) -> SendMessageRequest {
        let body = render_body(week, self.site_url.as_deref());
        SendMessageRequest::from_message(&build_message(&self.envelope(week), &body))
    }
}

#[async_trait::async_trait]
impl RecommendationSink for GmailNotifier {
    async fn deliver(&self, week: &WeeklyRecommendation) -> AppResult<()> {
        let url = self.send_url()?;

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&self.build_request(week))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Gmail API returned status {}: {}",
                status, body
            )));
        }

        tracing::info!(
            recipient = %self.recipient,
            restaurants = week.restaurants.len(),
            "Weekly mail sent"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Gmail"
    }
}
