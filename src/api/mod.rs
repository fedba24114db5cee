//! JIRA API client and types.
//!
//! This module provides the request layer for the JIRA REST API: input
//! validation, the retrying request executor, and the error taxonomy the
//! CLI branches on.

pub mod auth;
mod client;
pub mod error;
pub mod types;

pub use auth::Credentials;
pub use client::{JiraClient, Method, RetryPolicy};
pub use error::ApiError;
