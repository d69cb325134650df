//! Network-free primitives for the tenant nuke custom resource.
//!
//! This crate owns event classification, CloudFormation request/response
//! contracts, lifecycle records and the tenant cleanup routine. It
//! intentionally excludes the Lambda runtime and HTTP client concerns,
//! which live in `tenant_nuke_lambda` behind the traits defined here.

pub mod contract;
pub mod nuke;
pub mod records;
pub mod tenant;
