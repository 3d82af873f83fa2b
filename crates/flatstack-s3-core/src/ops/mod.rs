//! Bucket operation handlers.
//!
//! Each submodule exposes `handle_*` methods on
//! [`crate::controller::BucketController`]. The server binary bridges them to
//! the HTTP layer by implementing the `S3Handler` trait from
//! `flatstack-s3-http`.

pub mod bucket;
pub mod list;

use crate::error::{BackendError, S3ServiceError};

/// Map a container-level backend failure onto the bucket it concerns.
///
/// Categories without a bucket meaning are left for the interceptor chain.
pub(crate) fn bucket_error(bucket: &str, err: BackendError) -> S3ServiceError {
    match err {
        BackendError::NoSuchContainer(_) => S3ServiceError::NoSuchBucket {
            bucket: bucket.to_owned(),
        },
        BackendError::ContainerAlreadyExists(_) => S3ServiceError::BucketAlreadyOwnedByYou {
            bucket: bucket.to_owned(),
        },
        BackendError::ContainerNotEmpty(_) => S3ServiceError::BucketNotEmpty {
            bucket: bucket.to_owned(),
        },
        other => other.into(),
    }
}
