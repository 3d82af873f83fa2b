//! Backend and domain error types.
//!
//! [`BackendError`] is the vocabulary of the flat object store.
//! [`S3ServiceError`] is the bucket layer's own error; converting it into an
//! [`S3Error`] is the generic failure handler that runs after the
//! interceptor chain had its chance to translate backend failures.
//!
//! ```
//! use flatstack_s3_core::error::S3ServiceError;
//! use flatstack_s3_model::{S3Error, S3ErrorCode};
//!
//! let err = S3ServiceError::NoSuchBucket {
//!     bucket: "my-bucket".to_owned(),
//! };
//! let s3_err: S3Error = err.into();
//! assert_eq!(s3_err.code, S3ErrorCode::NoSuchBucket);
//! ```

use flatstack_s3_model::{S3Error, S3ErrorCode};

/// Failures reported by the backend object store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The container does not exist.
    #[error("container not found: {0}")]
    NoSuchContainer(String),

    /// The object does not exist.
    #[error("object not found: {0}")]
    NoSuchObject(String),

    /// The container still holds objects.
    #[error("container not empty: {0}")]
    ContainerNotEmpty(String),

    /// The container already exists.
    #[error("container already exists: {0}")]
    ContainerAlreadyExists(String),

    /// The backend is overloaded.
    #[error("{0}")]
    ServiceBusy(String),

    /// The backend is temporarily unavailable.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// A backend call timed out.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The request deadline expired before the backend answered.
    #[error("deadline reached: {0}")]
    DeadlineReached(String),

    /// The backend refuses the method on this resource.
    #[error("{0}")]
    MethodNotAllowed(String),

    /// Any other backend failure.
    #[error("internal backend error: {0}")]
    Internal(String),
}

/// Bucket-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum S3ServiceError {
    /// The specified bucket does not exist.
    #[error("The specified bucket does not exist")]
    NoSuchBucket {
        /// The bucket name that was not found.
        bucket: String,
    },

    /// The bucket already exists and is owned by you.
    #[error("Your previous request to create the named bucket succeeded and you already own it")]
    BucketAlreadyOwnedByYou {
        /// The bucket name that already exists.
        bucket: String,
    },

    /// The bucket is not empty and cannot be deleted.
    #[error("The bucket you tried to delete is not empty")]
    BucketNotEmpty {
        /// The bucket name that is not empty.
        bucket: String,
    },

    /// The specified bucket name is not valid.
    #[error("Invalid bucket name: {name}: {reason}")]
    InvalidBucketName {
        /// The invalid bucket name.
        name: String,
        /// The reason for the error.
        reason: String,
    },

    /// A request argument is invalid.
    #[error("{message}")]
    InvalidArgument {
        /// Name of the offending parameter.
        name: String,
        /// Value of the offending parameter.
        value: String,
        /// Description of the problem.
        message: String,
    },

    /// The XML body is malformed.
    #[error(
        "The XML you provided was not well-formed or did not validate against our published schema"
    )]
    MalformedXml,

    /// The requested region is not served here.
    #[error("The specified location constraint is not valid: {location}")]
    InvalidLocationConstraint {
        /// The rejected constraint.
        location: String,
    },

    /// Access denied.
    #[error("Access Denied")]
    AccessDenied,

    /// The requested functionality is not implemented.
    #[error("A header you provided implies functionality that is not implemented")]
    NotImplemented,

    /// A CORS preflight without `Origin`.
    #[error("Insufficient information. Origin request header needed.")]
    CorsOriginMissing,

    /// A CORS preflight with an unsupported method.
    #[error("Found unsupported HTTP method in CORS config. Unsupported method is {method}")]
    CorsInvalidAccessControlRequest {
        /// The requested method.
        method: String,
    },

    /// No CORS rule allows the request.
    #[error("CORSResponse: This CORS request is not allowed. This is usually because the evaluation of Origin, request method / Access-Control-Request-Method or Access-Control-Request-Headers are not whitelisted by the resource's CORS spec.")]
    CorsForbidden {
        /// The requested method.
        method: String,
    },

    /// A read precondition matched the current object.
    #[error("Not Modified")]
    NotModified,

    /// A write precondition matched the current object.
    #[error("At least one of the preconditions you specified did not hold")]
    PreconditionFailed,

    /// A retryable condition; surfaced as 503 with `Retry-After`.
    #[error("{message}")]
    ServiceUnavailable {
        /// Message returned to the client.
        message: String,
    },

    /// An untranslated backend failure.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl S3ServiceError {
    /// Convert this error into an [`S3Error`].
    #[must_use]
    pub fn into_s3_error(self) -> S3Error {
        S3Error::from(self)
    }

    /// A retryable error carrying `message`.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }
}

impl From<S3ServiceError> for S3Error {
    fn from(err: S3ServiceError) -> Self {
        match err {
            S3ServiceError::NoSuchBucket { bucket } => S3Error::no_such_bucket(bucket),
            S3ServiceError::BucketAlreadyOwnedByYou { bucket } => {
                S3Error::bucket_already_owned_by_you(bucket)
            }
            S3ServiceError::BucketNotEmpty { bucket } => S3Error::bucket_not_empty(bucket),
            S3ServiceError::InvalidArgument {
                name,
                value,
                message,
            } => S3Error::invalid_argument(name, value, message),
            S3ServiceError::InvalidBucketName { ref name, .. } => {
                let resource = name.clone();
                S3Error::with_message(S3ErrorCode::InvalidBucketName, err.to_string())
                    .with_resource(resource)
            }
            S3ServiceError::ServiceUnavailable { message } => S3Error::service_unavailable(message),
            S3ServiceError::Backend(source) => {
                tracing::warn!(error = %source, "untranslated backend failure");
                S3Error::internal_error(S3ErrorCode::InternalError.default_message())
                    .with_source(source)
            }
            other => {
                let message = other.to_string();
                let code = error_code(&other);
                S3Error::with_message(code, message)
            }
        }
    }
}

/// Map an [`S3ServiceError`] variant to the corresponding [`S3ErrorCode`].
fn error_code(err: &S3ServiceError) -> S3ErrorCode {
    match err {
        S3ServiceError::NoSuchBucket { .. } => S3ErrorCode::NoSuchBucket,
        S3ServiceError::BucketAlreadyOwnedByYou { .. } => S3ErrorCode::BucketAlreadyOwnedByYou,
        S3ServiceError::BucketNotEmpty { .. } => S3ErrorCode::BucketNotEmpty,
        S3ServiceError::InvalidBucketName { .. } => S3ErrorCode::InvalidBucketName,
        S3ServiceError::InvalidArgument { .. } => S3ErrorCode::InvalidArgument,
        S3ServiceError::MalformedXml => S3ErrorCode::MalformedXML,
        S3ServiceError::InvalidLocationConstraint { .. } => S3ErrorCode::InvalidLocationConstraint,
        S3ServiceError::AccessDenied => S3ErrorCode::AccessDenied,
        S3ServiceError::NotImplemented => S3ErrorCode::NotImplemented,
        S3ServiceError::CorsOriginMissing => S3ErrorCode::CORSOriginMissing,
        S3ServiceError::CorsInvalidAccessControlRequest { .. } => {
            S3ErrorCode::CORSInvalidAccessControlRequest
        }
        S3ServiceError::CorsForbidden { .. } => S3ErrorCode::CORSForbidden,
        S3ServiceError::NotModified => S3ErrorCode::NotModified,
        S3ServiceError::PreconditionFailed => S3ErrorCode::PreconditionFailed,
        S3ServiceError::ServiceUnavailable { .. } => S3ErrorCode::ServiceUnavailable,
        S3ServiceError::Backend(_) | S3ServiceError::Internal(_) => S3ErrorCode::InternalError,
    }
}

/// Convenience result type for bucket-layer operations.
pub type S3ServiceResult<T> = Result<T, S3ServiceError>;
