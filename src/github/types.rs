use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Subset of the REST user object the portfolio renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: String,
    pub html_url: String,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub public_repos: i64,
    pub followers: i64,
    pub following: i64,
}

/// Subset of the REST repository object the portfolio renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repo {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: i64,
    pub forks_count: i64,
    #[serde(default)]
    pub topics: Vec<String>,
    pub fork: bool,
    pub archived: bool,
    pub pushed_at: Option<DateTime<Utc>>,
}

/// Accepted query parameters for the repos listing, forwarded upstream.
#[derive(Debug, Default, Deserialize)]
pub struct RepoParams {
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

impl RepoParams {
    /// Validate and turn the params into upstream query pairs.
    pub fn to_query(&self) -> AppResult<Vec<(String, String)>> {
        let mut query = Vec::new();
        if let Some(sort) = &self.sort {
            if !matches!(sort.as_str(), "created" | "updated" | "pushed" | "full_name") {
                return Err(AppError::Validation(format!("unsupported sort: {sort}")));
            }
            query.push(("sort".to_string(), sort.clone()));
        }
        if let Some(direction) = &self.direction {
            if !matches!(direction.as_str(), "asc" | "desc") {
                return Err(AppError::Validation(format!(
                    "unsupported direction: {direction}"
                )));
            }
            query.push(("direction".to_string(), direction.clone()));
        }
        if let Some(per_page) = self.per_page {
            if per_page == 0 || per_page > 100 {
                return Err(AppError::Validation(
                    "per_page must be between 1 and 100".to_string(),
                ));
            }
            query.push(("per_page".to_string(), per_page.to_string()));
        }
        if let Some(page) = self.page {
            if page == 0 {
                return Err(AppError::Validation("page must be at least 1".to_string()));
            }
            query.push(("page".to_string(), page.to_string()));
        }
        Ok(query)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionCalendar {
    pub total_contributions: i64,
    pub weeks: Vec<ContributionWeek>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionWeek {
    pub contribution_days: Vec<ContributionDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDay {
    pub date: String,
    pub contribution_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_params_default_is_empty_query() {
        let query = RepoParams::default().to_query().unwrap();
        assert!(query.is_empty());
    }

    #[test]
    fn test_repo_params_rejects_unknown_sort() {
        let params = RepoParams {
            sort: Some("stars".to_string()),
            ..Default::default()
        };
        assert!(params.to_query().is_err());
    }

    #[test]
    fn test_repo_params_caps_per_page() {
        let params = RepoParams {
            per_page: Some(250),
            ..Default::default()
        };
        assert!(params.to_query().is_err());

        let params = RepoParams {
            per_page: Some(100),
            ..Default::default()
        };
        let query = params.to_query().unwrap();
        assert_eq!(query, vec![("per_page".to_string(), "100".to_string())]);
    }
}
