pub mod cache;
pub mod config;
pub mod contact;
pub mod error;
pub mod github;
pub mod rate;
