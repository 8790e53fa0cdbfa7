//! The delegate-permissions boundary.
//!
//! Delegate assignments live in an external authority; this crate only
//! consumes them through [`PermissionsSource`]. The in-memory implementation
//! backs tests and single-node deployments.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateway_security::DelegateType;
use thiserror::Error;

/// Failure talking to the permissions authority.
#[derive(Debug, Error)]
pub enum PermissionsError {
    #[error("permissions source unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of delegate assignments.
///
/// Lookups are point-in-time: grants carry effective windows and only active
/// ones count.
#[async_trait]
pub trait PermissionsSource: Send + Sync {
    /// Delegate types the given user holds over the target enterprise at the
    /// given instant. An empty set means no active assignment.
    async fn delegate_types_for(
        &self,
        delegate_user_id: &str,
        target_enterprise_id: &str,
        at: DateTime<Utc>,
    ) -> Result<BTreeSet<DelegateType>, PermissionsError>;
}

/// One delegate assignment with its effective window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateAssignment {
    pub delegate_user_id: String,
    pub target_enterprise_id: String,
    pub delegate_types: BTreeSet<DelegateType>,
    pub effective_from: DateTime<Utc>,
    /// Open-ended when absent.
    pub effective_until: Option<DateTime<Utc>>,
}

impl DelegateAssignment {
    #[must_use]
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.effective_from && self.effective_until.is_none_or(|until| at < until)
    }
}

/// Fixed assignment table, for tests and single-node setups.
#[derive(Debug, Default)]
pub struct InMemoryPermissionsSource {
    assignments: Vec<DelegateAssignment>,
}

impl InMemoryPermissionsSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_assignment(mut self, assignment: DelegateAssignment) -> Self {
        self.assignments.push(assignment);
        self
    }
}

#[async_trait]
impl PermissionsSource for InMemoryPermissionsSource {
    async fn delegate_types_for(
        &self,
        delegate_user_id: &str,
        target_enterprise_id: &str,
        at: DateTime<Utc>,
    ) -> Result<BTreeSet<DelegateType>, PermissionsError> {
        Ok(self
            .assignments
            .iter()
            .filter(|a| {
                a.delegate_user_id == delegate_user_id
                    && a.target_enterprise_id == target_enterprise_id
                    && a.is_active_at(at)
            })
            .flat_map(|a| a.delegate_types.iter().copied())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn assignment(
        from_offset_days: i64,
        until_offset_days: Option<i64>,
        types: &[DelegateType],
    ) -> DelegateAssignment {
        let now = Utc::now();
        DelegateAssignment {
            delegate_user_id: "user-del".to_owned(),
            target_enterprise_id: "ENT-TARGET".to_owned(),
            delegate_types: types.iter().copied().collect(),
            effective_from: now + Duration::days(from_offset_days),
            effective_until: until_offset_days.map(|d| now + Duration::days(d)),
        }
    }

    #[tokio::test]
    async fn active_assignments_merge_their_types() {
        let source = InMemoryPermissionsSource::new()
            .with_assignment(assignment(-10, None, &[DelegateType::Daa]))
            .with_assignment(assignment(-1, Some(1), &[DelegateType::Rpr]));
        let types = source
            .delegate_types_for("user-del", "ENT-TARGET", Utc::now())
            .await
            .unwrap();
        assert_eq!(
            types,
            [DelegateType::Daa, DelegateType::Rpr].into_iter().collect()
        );
    }

    #[tokio::test]
    async fn expired_and_future_windows_are_excluded() {
        let source = InMemoryPermissionsSource::new()
            .with_assignment(assignment(-10, Some(-1), &[DelegateType::Daa]))
            .with_assignment(assignment(1, None, &[DelegateType::Roi]));
        let types = source
            .delegate_types_for("user-del", "ENT-TARGET", Utc::now())
            .await
            .unwrap();
        assert!(types.is_empty());
    }

    #[tokio::test]
    async fn unknown_target_yields_empty_set() {
        let source =
            InMemoryPermissionsSource::new().with_assignment(assignment(-1, None, &[DelegateType::Daa]));
        let types = source
            .delegate_types_for("user-del", "ENT-OTHER", Utc::now())
            .await
            .unwrap();
        assert!(types.is_empty());
    }
}
