//! Error translation layer.
//!
//! The backend speaks its own failure vocabulary ([`BackendError`]). An
//! [`InterceptorChain`] wraps every operation that touches the backend: each
//! [`Interceptor`] may short-circuit the request up front (`before`) and may
//! claim one category of backend failure and turn it into a protocol error
//! (`translate`). Failures nobody claims fall through to the generic
//! [`From<S3ServiceError> for S3Error`](S3Error) conversion.
//!
//! ```text
//! before(i1) -> before(i2) -> ... -> operation
//!                                       | Err(BackendError)
//!                                       v
//!                 translate(i1) -> translate(i2) -> ... -> InternalError
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use flatstack_s3_model::{S3Error, S3ErrorCode};
use http::Method;
use tracing::{debug, warn};

use crate::backend::ObjectBackend;
use crate::error::{BackendError, S3ServiceError};
use crate::utils::if_none_match_matches;

/// Methods advertised when the backend refuses a write on a WORM container.
pub const WORM_ALLOWED_METHODS: &str = "GET, HEAD, PUT";

/// What an interceptor may inspect about the request it wraps.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP method of the client request.
    pub method: Method,
    /// Backend container the request targets.
    pub container: String,
    /// Object within the container, for object-scoped checks.
    pub object: Option<String>,
    /// Specific object version.
    pub version: Option<String>,
    /// Raw `If-None-Match` header.
    pub if_none_match: Option<String>,
}

impl RequestContext {
    /// Context for a container-level request.
    #[must_use]
    pub fn new(method: Method, container: impl Into<String>) -> Self {
        Self {
            method,
            container: container.into(),
            object: None,
            version: None,
            if_none_match: None,
        }
    }

    /// Scope the request to one object.
    #[must_use]
    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Scope the request to one object version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Attach an `If-None-Match` precondition.
    #[must_use]
    pub fn with_if_none_match(mut self, value: impl Into<String>) -> Self {
        self.if_none_match = Some(value.into());
        self
    }

    fn is_read(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }
}

/// One link of the error translation chain.
#[async_trait]
pub trait Interceptor: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Runs before the wrapped operation; an error short-circuits it.
    async fn before(
        &self,
        _ctx: &RequestContext,
        _backend: &dyn ObjectBackend,
    ) -> Result<(), S3ServiceError> {
        Ok(())
    }

    /// Claim a backend failure, or hand it back untouched.
    fn translate(&self, err: BackendError) -> Result<S3Error, BackendError> {
        Err(err)
    }
}

/// Overloaded backend: 503 with `Retry-After: 1` and the backend's message.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceBusyInterceptor;

impl Interceptor for ServiceBusyInterceptor {
    fn name(&self) -> &'static str {
        "service-busy"
    }

    fn translate(&self, err: BackendError) -> Result<S3Error, BackendError> {
        match err {
            BackendError::ServiceBusy(message) | BackendError::ServiceUnavailable(message) => {
                Ok(S3Error::service_unavailable(message))
            }
            other => Err(other),
        }
    }
}

/// Backend timeout or expired deadline: 503 with `Retry-After: 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutInterceptor;

impl Interceptor for TimeoutInterceptor {
    fn name(&self) -> &'static str {
        "timeout"
    }

    fn translate(&self, err: BackendError) -> Result<S3Error, BackendError> {
        match err {
            BackendError::Timeout(_) | BackendError::DeadlineReached(_) => {
                Ok(S3Error::service_unavailable(err.to_string()))
            }
            other => Err(other),
        }
    }
}

/// Method refused by backend policy: 405, plus `Allow` for WORM containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodNotAllowedInterceptor;

impl Interceptor for MethodNotAllowedInterceptor {
    fn name(&self) -> &'static str {
        "method-not-allowed"
    }

    fn translate(&self, err: BackendError) -> Result<S3Error, BackendError> {
        match err {
            BackendError::MethodNotAllowed(message) => {
                let mut s3_err = S3Error::new(S3ErrorCode::MethodNotAllowed);
                if message.to_lowercase().contains("worm") {
                    s3_err = s3_err.with_header("Allow", WORM_ALLOWED_METHODS);
                }
                Ok(s3_err)
            }
            other => Err(other),
        }
    }
}

/// Absent container: bare 404.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuchContainerInterceptor;

impl Interceptor for NoSuchContainerInterceptor {
    fn name(&self) -> &'static str {
        "no-such-container"
    }

    fn translate(&self, err: BackendError) -> Result<S3Error, BackendError> {
        match err {
            BackendError::NoSuchContainer(container) => Ok(S3Error::not_found(container)),
            other => Err(other),
        }
    }
}

/// `If-None-Match` short-circuit: 304 for reads, 412 otherwise.
///
/// The precondition only applies to an object that currently exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct IfNoneMatchInterceptor;

#[async_trait]
impl Interceptor for IfNoneMatchInterceptor {
    fn name(&self) -> &'static str {
        "if-none-match"
    }

    async fn before(
        &self,
        ctx: &RequestContext,
        backend: &dyn ObjectBackend,
    ) -> Result<(), S3ServiceError> {
        let (Some(condition), Some(object)) = (ctx.if_none_match.as_deref(), ctx.object.as_deref())
        else {
            return Ok(());
        };
        let props = match backend
            .object_properties(&ctx.container, object, ctx.version.as_deref())
            .await
        {
            Ok(props) => props,
            Err(BackendError::NoSuchObject(_) | BackendError::NoSuchContainer(_)) => {
                return Ok(());
            }
            Err(other) => return Err(other.into()),
        };
        if !if_none_match_matches(condition, &props.hash) {
            return Ok(());
        }
        debug!(container = %ctx.container, object, method = %ctx.method, "if-none-match matched");
        if ctx.is_read() {
            Err(S3ServiceError::NotModified)
        } else {
            Err(S3ServiceError::PreconditionFailed)
        }
    }
}

/// An ordered list of interceptors wrapped around backend operations.
#[derive(Debug, Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    /// An empty chain: every backend failure becomes `InternalError`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Busy, timeout, method-not-allowed and conditional-request handling.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with(ServiceBusyInterceptor)
            .with(TimeoutInterceptor)
            .with(MethodNotAllowedInterceptor)
            .with(IfNoneMatchInterceptor)
    }

    /// Append an interceptor.
    #[must_use]
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Names of the interceptors, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Run `op` inside the chain.
    ///
    /// The success value of `op` is returned unchanged.
    pub async fn run<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        backend: &dyn ObjectBackend,
        op: F,
    ) -> Result<T, S3Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, S3ServiceError>>,
    {
        let outcome = async {
            for interceptor in &self.interceptors {
                interceptor.before(ctx, backend).await?;
            }
            op().await
        }
        .await;
        outcome.map_err(|err| self.translate(err))
    }

    /// Turn a failure into a protocol error, giving each interceptor a chance
    /// to claim backend failures first.
    #[must_use]
    pub fn translate(&self, err: S3ServiceError) -> S3Error {
        let S3ServiceError::Backend(mut backend_err) = err else {
            return err.into();
        };
        for interceptor in &self.interceptors {
            match interceptor.translate(backend_err) {
                Ok(s3_err) => {
                    warn!(
                        interceptor = interceptor.name(),
                        code = %s3_err.code,
                        message = %s3_err.message,
                        "translated backend failure"
                    );
                    return s3_err;
                }
                Err(unclaimed) => backend_err = unclaimed,
            }
        }
        S3ServiceError::Backend(backend_err).into()
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::backend::{BackendOp, Fault, MemoryBackend, NewObject};

    async fn backend_with_object(hash: &str) -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.create_container("c").await.expect("create container");
        backend
            .put_object("c", "k", NewObject::builder().hash(hash).size(1).build())
            .expect("put object");
        backend
    }

    async fn fail_with(chain: &InterceptorChain, err: BackendError) -> S3Error {
        let backend = MemoryBackend::new();
        let ctx = RequestContext::new(Method::GET, "c");
        chain
            .run(&ctx, &backend, || async { Err::<(), _>(S3ServiceError::from(err)) })
            .await
            .expect_err("operation fails")
    }

    #[tokio::test]
    async fn test_should_translate_busy_to_retryable_503() {
        let err = fail_with(
            &InterceptorChain::standard(),
            BackendError::ServiceBusy("too many requests".into()),
        )
        .await;
        assert_eq!(err.status_code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.header("Retry-After"), Some("1"));
        assert_eq!(err.message, "too many requests");
    }

    #[tokio::test]
    async fn test_should_translate_timeout_with_stringified_error() {
        let err = fail_with(
            &InterceptorChain::standard(),
            BackendError::DeadlineReached("request expired".into()),
        )
        .await;
        assert_eq!(err.status_code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.header("Retry-After"), Some("1"));
        assert_eq!(err.message, "deadline reached: request expired");
    }

    #[tokio::test]
    async fn test_should_advertise_allow_for_worm_restriction() {
        let chain = InterceptorChain::standard();
        let worm = fail_with(&chain, BackendError::MethodNotAllowed("WORM mode".into())).await;
        assert_eq!(worm.status_code, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(worm.header("Allow"), Some(WORM_ALLOWED_METHODS));

        let plain = fail_with(&chain, BackendError::MethodNotAllowed("read only".into())).await;
        assert_eq!(plain.status_code, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(plain.header("Allow"), None);
    }

    #[tokio::test]
    async fn test_should_translate_missing_container_only_when_opted_in() {
        let missing = BackendError::NoSuchContainer("c".into());

        let bare = fail_with(&InterceptorChain::standard(), missing.clone()).await;
        assert_eq!(bare.status_code, StatusCode::INTERNAL_SERVER_ERROR);

        let chain = InterceptorChain::standard().with(NoSuchContainerInterceptor);
        let err = fail_with(&chain, missing).await;
        assert_eq!(err.status_code, StatusCode::NOT_FOUND);
        assert_eq!(err.code, S3ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_should_fall_through_to_internal_error() {
        let err = fail_with(&InterceptorChain::standard(), BackendError::Internal("x".into())).await;
        assert_eq!(err.code, S3ErrorCode::InternalError);
        assert!(err.headers.is_empty());
    }

    #[tokio::test]
    async fn test_should_preserve_success_value() {
        let backend = MemoryBackend::new();
        let ctx = RequestContext::new(Method::GET, "c");
        let value = InterceptorChain::standard()
            .run(&ctx, &backend, || async { Ok::<_, S3ServiceError>(vec![1, 2, 3]) })
            .await
            .expect("success passes through");
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_should_return_not_modified_for_matching_read() {
        let backend = backend_with_object("abc").await;
        let ctx = RequestContext::new(Method::HEAD, "c")
            .with_object("k")
            .with_if_none_match("\"abc\"");
        let ran = std::cell::Cell::new(false);
        let err = InterceptorChain::standard()
            .run(&ctx, &backend, || async {
                ran.set(true);
                Ok::<_, S3ServiceError>(())
            })
            .await
            .expect_err("short-circuits");
        assert_eq!(err.status_code, StatusCode::NOT_MODIFIED);
        assert!(!ran.get());
    }

    #[tokio::test]
    async fn test_should_return_precondition_failed_for_matching_write() {
        let backend = backend_with_object("abc").await;
        let ctx = RequestContext::new(Method::PUT, "c")
            .with_object("k")
            .with_if_none_match("*");
        let err = InterceptorChain::standard()
            .run(&ctx, &backend, || async { Ok::<_, S3ServiceError>(()) })
            .await
            .expect_err("short-circuits");
        assert_eq!(err.status_code, StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn test_should_proceed_when_object_is_absent() {
        let backend = backend_with_object("abc").await;
        let ctx = RequestContext::new(Method::PUT, "c")
            .with_object("missing")
            .with_if_none_match("*");
        let result = InterceptorChain::standard()
            .run(&ctx, &backend, || async { Ok::<_, S3ServiceError>("created") })
            .await;
        assert_eq!(result.expect("precondition does not apply"), "created");
    }

    #[tokio::test]
    async fn test_should_proceed_when_hash_differs() {
        let backend = backend_with_object("abc").await;
        let ctx = RequestContext::new(Method::GET, "c")
            .with_object("k")
            .with_if_none_match("\"other\"");
        let result = InterceptorChain::standard()
            .run(&ctx, &backend, || async { Ok::<_, S3ServiceError>(7) })
            .await;
        assert_eq!(result.expect("no match"), 7);
    }

    #[tokio::test]
    async fn test_should_translate_failures_of_the_precondition_probe() {
        let backend = backend_with_object("abc").await;
        backend.inject(Fault::new(
            BackendOp::ObjectProperties,
            BackendError::ServiceBusy("probe busy".into()),
        ));
        let ctx = RequestContext::new(Method::GET, "c")
            .with_object("k")
            .with_if_none_match("*");
        let err = InterceptorChain::standard()
            .run(&ctx, &backend, || async { Ok::<_, S3ServiceError>(()) })
            .await
            .expect_err("probe fails");
        assert_eq!(err.status_code, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_should_list_standard_interceptors_in_order() {
        assert_eq!(
            InterceptorChain::standard().names(),
            vec!["service-busy", "timeout", "method-not-allowed", "if-none-match"]
        );
    }
}
