use axum::extract::{Query, State};
use axum::Json;
use std::sync::Arc;

use crate::error::AppResult;

use super::client::GithubClient;
use super::types::{ContributionCalendar, Profile, Repo, RepoParams};

/// GET /v1/github/profile
pub async fn profile(State(client): State<Arc<GithubClient>>) -> AppResult<Json<Profile>> {
    Ok(Json(client.profile().await?))
}

/// GET /v1/github/repos
pub async fn repos(
    State(client): State<Arc<GithubClient>>,
    Query(params): Query<RepoParams>,
) -> AppResult<Json<Vec<Repo>>> {
    Ok(Json(client.repos(&params).await?))
}

/// GET /v1/github/contributions
pub async fn contributions(
    State(client): State<Arc<GithubClient>>,
) -> AppResult<Json<ContributionCalendar>> {
    Ok(Json(client.contributions().await?))
}
