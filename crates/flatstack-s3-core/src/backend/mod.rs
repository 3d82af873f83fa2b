//! The flat, cursor-based object store the bucket layer runs on.
//!
//! Everything the bucket layer needs from the store goes through
//! [`ObjectBackend`]. Listing rows arrive as JSON documents and are decoded
//! into tagged [`Entry`] values at this boundary with [`decode_listing`].

pub mod memory;

use async_trait::async_trait;
use flatstack_s3_model::types::{Entry, ListingRequest};

use crate::error::BackendError;

pub use memory::{BackendOp, Fault, MemoryBackend, NewObject};

/// Container statistics returned by a metadata probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerMetadata {
    /// Number of live objects.
    pub object_count: u64,
    /// Total bytes of live objects.
    pub bytes_used: u64,
}

/// Properties of a single object version.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectProperties {
    /// Content hash as stored.
    pub hash: String,
    /// Size in bytes.
    pub size: u64,
}

/// A flat object store with a single "list after marker, limited to N" primitive.
#[async_trait]
pub trait ObjectBackend: Send + Sync + std::fmt::Debug {
    /// List at most `request.limit` rows of `container` in lexicographic order
    /// strictly after `request.marker`.
    async fn list_container(
        &self,
        container: &str,
        request: &ListingRequest,
    ) -> Result<Vec<Entry>, BackendError>;

    /// Probe container statistics.
    async fn container_metadata(&self, container: &str) -> Result<ContainerMetadata, BackendError>;

    /// Create an empty container.
    async fn create_container(&self, container: &str) -> Result<(), BackendError>;

    /// Delete an empty container.
    async fn delete_container(&self, container: &str) -> Result<(), BackendError>;

    /// Delete one object, including every stored version.
    async fn delete_object(&self, container: &str, name: &str) -> Result<(), BackendError>;

    /// Read the properties of an object, or of one of its versions.
    async fn object_properties(
        &self,
        container: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<ObjectProperties, BackendError>;
}

/// Decode a JSON listing payload into entries, preserving backend order.
pub fn decode_listing(payload: &[u8]) -> Result<Vec<Entry>, BackendError> {
    serde_json::from_slice(payload)
        .map_err(|e| BackendError::Internal(format!("undecodable listing payload: {e}")))
}
