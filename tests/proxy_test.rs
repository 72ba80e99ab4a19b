use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;

use folio::cache::ResponseCache;
use folio::config::GithubConfig;
use folio::error::AppError;
use folio::github::types::RepoParams;
use folio::github::GithubClient;
use folio::rate::RateGuard;

struct StubState {
    profile_hits: AtomicUsize,
    repo_hits: AtomicUsize,
    last_repo_query: Mutex<Option<String>>,
}

async fn stub_profile(
    State(state): State<Arc<StubState>>,
    Path(username): Path<String>,
) -> Response {
    state.profile_hits.fetch_add(1, Ordering::SeqCst);
    if username != "octocat" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(serde_json::json!({
        "login": "octocat",
        "name": "The Octocat",
        "avatar_url": "https://avatars.example.com/u/1",
        "html_url": "https://github.com/octocat",
        "bio": null,
        "company": "@github",
        "blog": "https://github.blog",
        "location": "San Francisco",
        "public_repos": 8,
        "followers": 4000,
        "following": 9
    }))
    .into_response()
}

async fn stub_repos(
    State(state): State<Arc<StubState>>,
    Path(username): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    state.repo_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_repo_query.lock().unwrap() = query;
    if username != "octocat" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(serde_json::json!([{
        "name": "hello-world",
        "full_name": "octocat/hello-world",
        "html_url": "https://github.com/octocat/hello-world",
        "description": "My first repository",
        "language": "Rust",
        "stargazers_count": 80,
        "forks_count": 9,
        "topics": ["demo"],
        "fork": false,
        "archived": false,
        "pushed_at": "2026-01-15T12:00:00Z"
    }]))
    .into_response()
}

/// Spawn a stub upstream API on a random port.
async fn spawn_stub() -> (SocketAddr, Arc<StubState>) {
    let state = Arc::new(StubState {
        profile_hits: AtomicUsize::new(0),
        repo_hits: AtomicUsize::new(0),
        last_repo_query: Mutex::new(None),
    });

    let app = Router::new()
        .route("/users/{username}", get(stub_profile))
        .route("/users/{username}/repos", get(stub_repos))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

fn client_for(addr: SocketAddr, username: &str, max_requests: usize) -> GithubClient {
    let config = GithubConfig {
        username: username.to_string(),
        api_base_url: format!("http://{addr}"),
        ..Default::default()
    };
    GithubClient::new(
        config,
        Arc::new(ResponseCache::local_only()),
        Arc::new(RateGuard::new(max_requests, Duration::from_secs(3600))),
    )
}

#[tokio::test]
async fn test_profile_is_served_from_cache_on_repeat() {
    let (addr, stub) = spawn_stub().await;
    let client = client_for(addr, "octocat", 4000);

    let first = client.profile().await.unwrap();
    let second = client.profile().await.unwrap();

    assert_eq!(first.login, "octocat");
    assert_eq!(second.name.as_deref(), Some("The Octocat"));
    assert_eq!(stub.profile_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_repos_forwards_params_and_caches_by_key() {
    let (addr, stub) = spawn_stub().await;
    let client = client_for(addr, "octocat", 4000);

    let params = RepoParams {
        sort: Some("updated".to_string()),
        per_page: Some(6),
        ..Default::default()
    };
    let repos = client.repos(&params).await.unwrap();
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].full_name, "octocat/hello-world");

    let sent = stub.last_repo_query.lock().unwrap().clone().unwrap();
    assert!(sent.contains("sort=updated"));
    assert!(sent.contains("per_page=6"));

    // identical params hit the cache, not the upstream
    let params_again = RepoParams {
        sort: Some("updated".to_string()),
        per_page: Some(6),
        ..Default::default()
    };
    client.repos(&params_again).await.unwrap();
    assert_eq!(stub.repo_hits.load(Ordering::SeqCst), 1);

    // different params are a different cache entry
    let other = RepoParams {
        per_page: Some(12),
        ..Default::default()
    };
    client.repos(&other).await.unwrap();
    assert_eq!(stub.repo_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalid_repo_params_never_reach_upstream() {
    let (addr, stub) = spawn_stub().await;
    let client = client_for(addr, "octocat", 4000);

    let params = RepoParams {
        sort: Some("stars".to_string()),
        ..Default::default()
    };
    let err = client.repos(&params).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(stub.repo_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_user_maps_to_not_found() {
    let (addr, _stub) = spawn_stub().await;
    let client = client_for(addr, "ghost", 4000);

    let err = client.profile().await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_exhausted_quota_blocks_upstream_call() {
    let (addr, stub) = spawn_stub().await;
    let client = client_for(addr, "octocat", 0);

    let err = client.profile().await.unwrap_err();
    assert!(matches!(err, AppError::QuotaExhausted(_)));
    assert_eq!(stub.profile_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_contributions_without_token_answers_unconfigured() {
    let (addr, _stub) = spawn_stub().await;
    let client = client_for(addr, "octocat", 4000);

    let err = client.contributions().await.unwrap_err();
    assert!(matches!(err, AppError::Unconfigured(_)));
}
