use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::models::{Issue, Project, SearchPage, Sprint, SprintPage};
use super::{order_closed_sprints, Tracker};
use crate::config::TrackerConfig;
use crate::error::{Error, Result};

const SPRINT_PAGE_SIZE: u64 = 50;
const SEARCH_PAGE_SIZE: u32 = 100;
const MAX_BACKOFF_SECS: u64 = 30;

/// HTTP client for Jira Server / Data Center using a personal access token.
#[derive(Clone)]
pub struct JiraClient {
    http: reqwest::Client,
    config: TrackerConfig,
}

impl JiraClient {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// GET a JSON resource, retrying timeouts, 429s and 5xx responses with
    /// exponential backoff.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let wait = backoff_secs(attempt);
                log::warn!(
                    "Retrying {path} in {wait}s (attempt {}/{})",
                    attempt + 1,
                    self.config.max_retries + 1
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
            }

            let response = match self
                .http
                .get(&url)
                .bearer_auth(&self.config.token)
                .query(query)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(Error::Http(e));
                }
            };

            let status = response.status();
            if status.is_success() {
                let body = response.text().await?;
                return serde_json::from_str(&body)
                    .map_err(|e| Error::Decode(format!("{path}: {e}")));
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if let Some(retry_after) = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                {
                    let wait = retry_after.min(60);
                    log::warn!("Rate limited (429). Waiting {wait}s as requested");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                last_error = "429 Too Many Requests".to_string();
                continue;
            }

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = format!("{status}: {body}");
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                return Err(Error::NotFound(path.to_string()));
            }

            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        Err(Error::RetriesExhausted {
            attempts: self.config.max_retries + 1,
            last_error,
        })
    }

    /// Page through a board's sprints in the given state.
    async fn fetch_sprints(&self, board_id: u64, state: &str) -> Result<Vec<Sprint>> {
        let path = format!("/rest/agile/1.0/board/{board_id}/sprint");
        let mut start_at = 0;
        let mut sprints = Vec::new();

        loop {
            let query = [
                ("state", state.to_string()),
                ("startAt", start_at.to_string()),
                ("maxResults", SPRINT_PAGE_SIZE.to_string()),
            ];
            let page: SprintPage = self.get_json(&path, &query).await?;
            let page_len = page.values.len() as u64;
            sprints.extend(page.values);
            log::debug!("Fetched {page_len} {state} sprints at offset {start_at}");

            if page.is_last || page_len < SPRINT_PAGE_SIZE {
                break;
            }
            start_at += page_len;
        }

        Ok(sprints)
    }
}

fn backoff_secs(attempt: u32) -> u64 {
    (1u64 << attempt.min(5)).min(MAX_BACKOFF_SECS)
}

#[async_trait]
impl Tracker for JiraClient {
    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn fetch_closed_sprints(&self, board_id: u64) -> Result<Vec<Sprint>> {
        let sprints = self.fetch_sprints(board_id, "closed").await?;
        log::info!("Fetched {} closed sprints for board {board_id}", sprints.len());
        Ok(order_closed_sprints(sprints))
    }

    async fn fetch_active_sprints(&self, board_id: u64) -> Result<Vec<Sprint>> {
        self.fetch_sprints(board_id, "active").await
    }

    async fn search_issues(
        &self,
        jql: &str,
        expand_changelog: bool,
        max_results: Option<u32>,
    ) -> Result<Vec<Issue>> {
        let mut issues: Vec<Issue> = Vec::new();

        loop {
            let collected = issues.len() as u32;
            let page_size = match max_results {
                Some(max) if collected >= max => break,
                Some(max) => (max - collected).min(SEARCH_PAGE_SIZE),
                None => SEARCH_PAGE_SIZE,
            };

            let mut query = vec![
                ("jql", jql.to_string()),
                ("startAt", collected.to_string()),
                ("maxResults", page_size.to_string()),
            ];
            if expand_changelog {
                query.push(("expand", "changelog".to_string()));
            }

            let page: SearchPage = self.get_json("/rest/api/2/search", &query).await?;
            let page_len = page.issues.len();
            issues.extend(page.issues);

            if page_len == 0 || issues.len() as u64 >= page.total {
                break;
            }
        }

        log::info!("JQL '{jql}' returned {} issues", issues.len());
        Ok(issues)
    }

    async fn fetch_issue(&self, key: &str) -> Result<Issue> {
        let path = format!("/rest/api/2/issue/{key}");
        self.get_json(&path, &[]).await
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>> {
        self.get_json("/rest/api/2/project", &[]).await
    }
}
