pub mod client;
pub mod handler;
pub mod types;

pub use client::{GithubClient, ENDPOINTS};
