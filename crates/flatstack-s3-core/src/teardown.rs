//! Segmented-Bucket Teardown.
//!
//! Before a bucket is deleted, its segments container (the parts of
//! multipart uploads) is drained page by page and then deleted:
//!
//! ```text
//! CheckPrimaryEmpty --count > 0--> Aborted (503)
//!        |    \--primary absent--> Done
//!        v
//!    DrainPage --empty page--> DeletePrimary --> Done
//!        |   ^                      \--not empty / internal--> 503
//!        v   |
//!   DeleteSegment (per entry, cursor = last name)
//! ```
//!
//! Conflicts and internal failures are folded into a retryable 503. Busy and
//! timeout signals are returned as backend errors for the interceptor chain to
//! translate.

use flatstack_s3_model::S3ErrorCode;
use flatstack_s3_model::types::ListingRequest;
use tracing::{debug, warn};

use crate::backend::ObjectBackend;
use crate::error::{BackendError, S3ServiceError};
use crate::listing::invoke_listing;

/// Teardown states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TeardownState {
    /// Probe the primary bucket.
    #[default]
    CheckPrimaryEmpty,
    /// List the next page of segments.
    DrainPage,
    /// Delete the segments of the current page.
    DeleteSegment,
    /// Delete the segments container itself.
    DeletePrimary,
    /// Terminal: nothing left to do.
    Done,
    /// Terminal: the primary bucket still holds objects.
    Aborted,
}

impl TeardownState {
    /// Whether the state is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

/// Progress of one teardown; lives for a single DELETE-bucket call.
#[derive(Debug, Clone, Default)]
pub struct SegmentDeletionRun {
    /// Name of the last segment handled.
    pub cursor: Option<String>,
    /// Segments deleted so far.
    pub deleted: usize,
    /// Current state.
    pub state: TeardownState,
    pending: Vec<String>,
}

/// Drains and removes the segments container of one bucket.
#[derive(Debug)]
pub struct SegmentTeardown<'a> {
    backend: &'a dyn ObjectBackend,
    primary: &'a str,
    segments: &'a str,
    page_size: usize,
}

fn escalate(reason: &str) -> S3ServiceError {
    warn!(reason, "bucket teardown escalated to retryable failure");
    S3ServiceError::unavailable(S3ErrorCode::ServiceUnavailable.default_message())
}

impl<'a> SegmentTeardown<'a> {
    /// Prepare a teardown of `segments` on behalf of bucket `primary`.
    #[must_use]
    pub fn new(
        backend: &'a dyn ObjectBackend,
        primary: &'a str,
        segments: &'a str,
        page_size: usize,
    ) -> Self {
        Self {
            backend,
            primary,
            segments,
            page_size: page_size.max(1),
        }
    }

    /// Run the state machine to a terminal state.
    ///
    /// Returns the finished run on `Done`. `Aborted` and escalated failures
    /// surface as [`S3ServiceError::ServiceUnavailable`].
    ///
    /// ```
    /// use flatstack_s3_core::backend::{MemoryBackend, NewObject, ObjectBackend};
    /// use flatstack_s3_core::teardown::{SegmentTeardown, TeardownState};
    ///
    /// # tokio_test::block_on(async {
    /// let backend = MemoryBackend::new();
    /// backend.create_container("photos").await.unwrap();
    /// backend.create_container("photos+segments").await.unwrap();
    /// backend
    ///     .put_object("photos+segments", "upload/0001", NewObject::builder().build())
    ///     .unwrap();
    ///
    /// let run = SegmentTeardown::new(&backend, "photos", "photos+segments", 100)
    ///     .run()
    ///     .await
    ///     .unwrap();
    /// assert_eq!(run.state, TeardownState::Done);
    /// assert_eq!(run.deleted, 1);
    /// assert!(!backend.has_container("photos+segments"));
    /// # });
    /// ```
    pub async fn run(&self) -> Result<SegmentDeletionRun, S3ServiceError> {
        let mut run = SegmentDeletionRun::default();
        while !run.state.is_terminal() {
            run.state = self.step(&mut run).await?;
        }
        if run.state == TeardownState::Aborted {
            return Err(escalate("bucket not empty"));
        }
        debug!(
            bucket = self.primary,
            segments = self.segments,
            deleted = run.deleted,
            "segments container torn down"
        );
        Ok(run)
    }

    async fn step(&self, run: &mut SegmentDeletionRun) -> Result<TeardownState, S3ServiceError> {
        match run.state {
            TeardownState::CheckPrimaryEmpty => self.check_primary().await,
            TeardownState::DrainPage => self.drain_page(run).await,
            TeardownState::DeleteSegment => self.delete_segments(run).await,
            TeardownState::DeletePrimary => self.delete_segments_container().await,
            state @ (TeardownState::Done | TeardownState::Aborted) => Ok(state),
        }
    }

    async fn check_primary(&self) -> Result<TeardownState, S3ServiceError> {
        match self.backend.container_metadata(self.primary).await {
            Ok(meta) if meta.object_count > 0 => {
                debug!(bucket = self.primary, count = meta.object_count, "primary not empty");
                Ok(TeardownState::Aborted)
            }
            Ok(_) => Ok(TeardownState::DrainPage),
            Err(BackendError::NoSuchContainer(_)) => Ok(TeardownState::Done),
            Err(other) => Err(other.into()),
        }
    }

    async fn drain_page(
        &self,
        run: &mut SegmentDeletionRun,
    ) -> Result<TeardownState, S3ServiceError> {
        // The loop ends on an empty page, so no lookahead row is needed.
        let request = ListingRequest {
            limit: self.page_size,
            marker: run.cursor.clone(),
            ..ListingRequest::default()
        };
        match invoke_listing(self.backend, self.segments, &request, self.page_size).await {
            Ok(page) if page.entries.is_empty() => Ok(TeardownState::DeletePrimary),
            Ok(page) => {
                run.pending = page.entries.iter().map(|e| e.name().to_owned()).collect();
                Ok(TeardownState::DeleteSegment)
            }
            Err(BackendError::NoSuchContainer(_)) => Ok(TeardownState::Done),
            Err(BackendError::Internal(_)) => Err(escalate("segment listing failed")),
            Err(other) => Err(other.into()),
        }
    }

    async fn delete_segments(
        &self,
        run: &mut SegmentDeletionRun,
    ) -> Result<TeardownState, S3ServiceError> {
        for name in std::mem::take(&mut run.pending) {
            match self.backend.delete_object(self.segments, &name).await {
                Ok(()) => run.deleted += 1,
                Err(BackendError::NoSuchObject(_)) => {}
                Err(BackendError::NoSuchContainer(_)) => return Ok(TeardownState::Done),
                Err(BackendError::Internal(_)) => return Err(escalate("segment deletion failed")),
                Err(other) => return Err(other.into()),
            }
            run.cursor = Some(name);
        }
        Ok(TeardownState::DrainPage)
    }

    async fn delete_segments_container(&self) -> Result<TeardownState, S3ServiceError> {
        match self.backend.delete_container(self.segments).await {
            Ok(()) | Err(BackendError::NoSuchContainer(_)) => Ok(TeardownState::Done),
            Err(BackendError::ContainerNotEmpty(_) | BackendError::Internal(_)) => {
                Err(escalate("segments container could not be deleted"))
            }
            Err(other) => Err(other.into()),
        }
    }
}
