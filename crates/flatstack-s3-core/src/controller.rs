//! The bucket controller.
//!
//! [`BucketController`] owns the collaborators every bucket operation needs:
//! the backend, the capability check, the CORS lookup, the result assembler,
//! and the interceptor chains. The operations themselves live in the
//! [`crate::ops`] submodules.

use std::sync::Arc;

use crate::access::{AccessPolicy, AllowAll};
use crate::backend::ObjectBackend;
use crate::config::S3Config;
use crate::cors::{CorsIndex, CorsLookup};
use crate::interceptor::{InterceptorChain, NoSuchContainerInterceptor};
use crate::listing::ResultAssembler;

/// Bucket-level S3 operations over an [`ObjectBackend`].
///
/// All fields are `Arc`-wrapped or cheap to clone, so one controller can be
/// shared across connection tasks.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use flatstack_s3_core::BucketController;
/// use flatstack_s3_core::backend::MemoryBackend;
/// use flatstack_s3_core::config::S3Config;
///
/// let controller = BucketController::new(S3Config::default(), Arc::new(MemoryBackend::new()));
/// assert_eq!(controller.config().location, "us-east-1");
/// ```
#[derive(Debug, Clone)]
pub struct BucketController {
    pub(crate) config: Arc<S3Config>,
    pub(crate) backend: Arc<dyn ObjectBackend>,
    pub(crate) access: Arc<dyn AccessPolicy>,
    pub(crate) cors: Arc<dyn CorsLookup>,
    pub(crate) assembler: ResultAssembler,
    /// Chain wrapped around every backend-touching operation.
    pub(crate) chain: InterceptorChain,
    /// Like `chain`, plus a bare 404 for absent containers.
    pub(crate) head_chain: InterceptorChain,
}

impl BucketController {
    /// Create a controller that allows every action and has no CORS rules.
    #[must_use]
    pub fn new(config: S3Config, backend: Arc<dyn ObjectBackend>) -> Self {
        let chain = InterceptorChain::standard();
        Self {
            assembler: ResultAssembler::from_config(&config),
            config: Arc::new(config),
            backend,
            access: Arc::new(AllowAll),
            cors: Arc::new(CorsIndex::new()),
            head_chain: chain.clone().with(NoSuchContainerInterceptor),
            chain,
        }
    }

    /// Replace the capability check.
    #[must_use]
    pub fn with_access_policy(mut self, access: Arc<dyn AccessPolicy>) -> Self {
        self.access = access;
        self
    }

    /// Replace the CORS rule lookup.
    #[must_use]
    pub fn with_cors(mut self, cors: Arc<dyn CorsLookup>) -> Self {
        self.cors = cors;
        self
    }

    /// Replace the interceptor chain.
    ///
    /// HEAD requests use `chain` extended with the bare 404 translation.
    #[must_use]
    pub fn with_chain(mut self, chain: InterceptorChain) -> Self {
        self.head_chain = chain.clone().with(NoSuchContainerInterceptor);
        self.chain = chain;
        self
    }

    /// Returns the controller configuration.
    #[must_use]
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &dyn ObjectBackend {
        self.backend.as_ref()
    }
}
