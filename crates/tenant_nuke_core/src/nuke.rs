//! Bulk deletion of a tenant's user-defined URL categories.
//!
//! The listing is a single call; there is no pagination, batching or rate
//! limiting. A failed delete stops the run and reports how far it got.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::tenant::{CategoryKind, TenantError, TenantSession};

/// Explicit execution deadline for the deadline-aware cleanup variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBudget {
    deadline: Instant,
    reserve: Duration,
}

impl TimeBudget {
    pub fn new(deadline: Instant, reserve: Duration) -> Self {
        Self { deadline, reserve }
    }

    pub fn is_exhausted_at(&self, now: Instant) -> bool {
        now + self.reserve >= self.deadline
    }

    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NukeSummary {
    pub discovered: usize,
    pub deleted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NukeError {
    #[error("failed to list user-defined categories: {0}")]
    Listing(#[source] TenantError),
    #[error("failed to delete category {category_id} after {deleted_before} deletions: {source}")]
    Delete {
        category_id: String,
        deleted_before: usize,
        #[source]
        source: TenantError,
    },
    #[error("ran out of time after deleting {deleted} categories; {remaining} not deleted")]
    OutOfTime { deleted: usize, remaining: usize },
}

pub fn nuke_tenant(session: &dyn TenantSession) -> Result<NukeSummary, NukeError> {
    run_nuke(session, None)
}

/// Same as [`nuke_tenant`], but stops before the next delete once the
/// budget's reserve would be eaten into.
pub fn nuke_tenant_within(
    session: &dyn TenantSession,
    budget: &TimeBudget,
) -> Result<NukeSummary, NukeError> {
    run_nuke(session, Some(budget))
}

fn run_nuke(
    session: &dyn TenantSession,
    budget: Option<&TimeBudget>,
) -> Result<NukeSummary, NukeError> {
    let started_at = Instant::now();
    info!(component = "nuke", event = "nuke_started", "Starting to nuke tenant");

    let categories = match session.list_categories(CategoryKind::UserDefined) {
        Ok(categories) => categories,
        Err(err) => {
            error!(
                component = "nuke",
                event = "listing_failed",
                error = %err,
                "Could not list user-defined categories; nothing deleted"
            );
            return Err(NukeError::Listing(err));
        }
    };

    let discovered = categories.len();
    info!(
        component = "nuke",
        event = "categories_discovered",
        count = discovered,
        "Found categories to delete: {discovered}"
    );

    let mut deleted = 0usize;
    for category in &categories {
        if let Some(budget) = budget {
            let now = Instant::now();
            if budget.is_exhausted_at(now) {
                warn!(
                    component = "nuke",
                    event = "out_of_time",
                    deleted,
                    remaining = discovered - deleted,
                    remaining_ms = budget.remaining_at(now).as_millis() as u64,
                    "Stopping before the execution deadline"
                );
                return Err(NukeError::OutOfTime {
                    deleted,
                    remaining: discovered - deleted,
                });
            }
        }

        if let Err(source) = session.delete_category(&category.id) {
            error!(
                component = "nuke",
                event = "delete_failed",
                category_id = %category.id,
                deleted,
                error = %source,
                "Aborting cleanup after failed delete"
            );
            return Err(NukeError::Delete {
                category_id: category.id.clone(),
                deleted_before: deleted,
                source,
            });
        }
        deleted += 1;
        debug!(
            component = "nuke",
            event = "category_deleted",
            category_id = %category.id,
            name = category.configured_name.as_deref().unwrap_or(""),
            "Deleted category"
        );
    }

    info!(
        component = "nuke",
        event = "nuke_completed",
        deleted,
        duration_ms = started_at.elapsed().as_millis() as u64,
        "Finished deleting categories"
    );
    Ok(NukeSummary {
        discovered,
        deleted,
    })
}
