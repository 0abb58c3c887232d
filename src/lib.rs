//! MCP server that fetches GitLab merge requests, computes change statistics,
//! and publishes reports to Confluence.

pub mod analysis;
pub mod client;
pub mod config;
pub mod error;
pub mod markup;
pub mod project_access;
pub mod response;
pub mod server;
pub mod tools;
pub mod types;
