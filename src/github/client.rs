use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::cache::{cache_key, ResponseCache};
use crate::config::GithubConfig;
use crate::error::{AppError, AppResult};
use crate::rate::RateGuard;

use super::types::{ContributionCalendar, Profile, Repo, RepoParams};

pub const EP_PROFILE: &str = "github/profile";
pub const EP_REPOS: &str = "github/repos";
pub const EP_CONTRIBUTIONS: &str = "github/contributions";

/// Endpoints that draw on the upstream quota, as reported by /health.
pub const ENDPOINTS: [&str; 3] = [EP_PROFILE, EP_REPOS, EP_CONTRIBUTIONS];

const CONTRIBUTIONS_QUERY: &str = "\
query($login: String!) {
  user(login: $login) {
    contributionsCollection {
      contributionCalendar {
        totalContributions
        weeks {
          contributionDays {
            date
            contributionCount
          }
        }
      }
    }
  }
}";

/// Upstream client for the source-hosting API. Every call runs through the
/// response cache; the producer checks the rate guard before spending quota.
pub struct GithubClient {
    http: reqwest::Client,
    config: GithubConfig,
    cache: Arc<ResponseCache>,
    guard: Arc<RateGuard>,
}

impl GithubClient {
    pub fn new(config: GithubConfig, cache: Arc<ResponseCache>, guard: Arc<RateGuard>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            config,
            cache,
            guard,
        }
    }

    pub async fn profile(&self) -> AppResult<Profile> {
        let key = cache_key(EP_PROFILE, []);
        let url = format!(
            "{}/users/{}",
            self.config.api_base_url, self.config.username
        );
        self.cache
            .fetch(&key, self.config.profile_ttl(), || {
                self.get_json(EP_PROFILE, url, Vec::new())
            })
            .await
    }

    pub async fn repos(&self, params: &RepoParams) -> AppResult<Vec<Repo>> {
        let query = params.to_query()?;
        let key = cache_key(EP_REPOS, query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let url = format!(
            "{}/users/{}/repos",
            self.config.api_base_url, self.config.username
        );
        self.cache
            .fetch(&key, self.config.repos_ttl(), || {
                self.get_json(EP_REPOS, url, query.clone())
            })
            .await
    }

    pub async fn contributions(&self) -> AppResult<ContributionCalendar> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or(AppError::Unconfigured("github.token"))?;
        let key = cache_key(EP_CONTRIBUTIONS, []);
        self.cache
            .fetch(&key, self.config.contributions_ttl(), || {
                self.post_contributions_query(token)
            })
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: String,
        query: Vec<(String, String)>,
    ) -> AppResult<T> {
        if !self.guard.can_make_request(endpoint) {
            return Err(AppError::QuotaExhausted(endpoint.to_string()));
        }
        self.guard.record_request(endpoint);

        let mut req = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }
        if !query.is_empty() {
            req = req.query(&query);
        }

        let resp = req.send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "github user {}",
                self.config.username
            )));
        }
        let resp = resp.error_for_status()?;
        Ok(resp.json::<T>().await?)
    }

    async fn post_contributions_query(&self, token: &str) -> AppResult<ContributionCalendar> {
        if !self.guard.can_make_request(EP_CONTRIBUTIONS) {
            return Err(AppError::QuotaExhausted(EP_CONTRIBUTIONS.to_string()));
        }
        self.guard.record_request(EP_CONTRIBUTIONS);

        let body = json!({
            "query": CONTRIBUTIONS_QUERY,
            "variables": { "login": self.config.username },
        });

        let resp = self
            .http
            .post(&self.config.graphql_url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: GraphQlResponse = resp.json().await?;
        if let Some(first) = parsed.errors.iter().flatten().next() {
            return Err(AppError::Upstream(format!("graphql: {}", first.message)));
        }
        parsed
            .data
            .and_then(|d| d.user)
            .map(|u| u.contributions_collection.contribution_calendar)
            .ok_or_else(|| AppError::NotFound(format!("github user {}", self.config.username)))
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    contribution_calendar: ContributionCalendar,
}
