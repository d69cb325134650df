//! AWS-oriented adapters and handlers for the tenant nuke custom resource.
//!
//! This crate owns runtime integration details (Lambda dispatch, the
//! CloudFormation response protocol, the ZIA HTTP client and credential
//! lookup). Deterministic logic lives in `tenant_nuke_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
