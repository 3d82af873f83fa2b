//! Capability checks consulted before each bucket operation.
//!
//! Policy evaluation lives outside the bucket layer. The controller only asks
//! an [`AccessPolicy`] whether an identity may perform a named action on a
//! bucket.

use dashmap::DashMap;
use tracing::debug;

use crate::error::S3ServiceError;

/// Named bucket actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketAction {
    /// `s3:ListBucket` (HEAD and GET).
    ListBucket,
    /// `s3:CreateBucket`.
    CreateBucket,
    /// `s3:DeleteBucket`.
    DeleteBucket,
}

impl BucketAction {
    /// Returns the IAM action string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListBucket => "s3:ListBucket",
            Self::CreateBucket => "s3:CreateBucket",
            Self::DeleteBucket => "s3:DeleteBucket",
        }
    }
}

impl std::fmt::Display for BucketAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether an identity may perform an action on a bucket.
pub trait AccessPolicy: Send + Sync + std::fmt::Debug {
    /// Returns [`S3ServiceError::AccessDenied`] when the action is refused.
    fn check(&self, identity: &str, action: BucketAction, bucket: &str)
    -> Result<(), S3ServiceError>;
}

/// Allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn check(
        &self,
        _identity: &str,
        _action: BucketAction,
        _bucket: &str,
    ) -> Result<(), S3ServiceError> {
        Ok(())
    }
}

/// Per-identity allow list of actions; identities without an entry are denied.
#[derive(Debug, Default)]
pub struct ActionAllowList {
    grants: DashMap<String, Vec<BucketAction>>,
}

impl ActionAllowList {
    /// Create an empty allow list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `action` to `identity` on every bucket.
    pub fn grant(&self, identity: &str, action: BucketAction) {
        let mut actions = self.grants.entry(identity.to_owned()).or_default();
        if !actions.contains(&action) {
            actions.push(action);
        }
    }
}

impl AccessPolicy for ActionAllowList {
    fn check(
        &self,
        identity: &str,
        action: BucketAction,
        bucket: &str,
    ) -> Result<(), S3ServiceError> {
        let allowed = self
            .grants
            .get(identity)
            .is_some_and(|actions| actions.contains(&action));
        if allowed {
            Ok(())
        } else {
            debug!(identity, %action, bucket, "capability check refused");
            Err(S3ServiceError::AccessDenied)
        }
    }
}
