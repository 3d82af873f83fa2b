//! In-memory reference backend.
//!
//! Containers are `BTreeMap`s of names to version stacks (oldest first)
//! behind a `parking_lot` lock. Listings are rendered into the backend's JSON
//! row format and decoded through [`decode_listing`], so the bucket layer sees
//! exactly what a remote store would send.
//!
//! Faults can be injected per operation, container and object to exercise
//! the error translation paths.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use flatstack_s3_model::types::{
    DELETE_MARKER_CONTENT_TYPE, Entry, ListingRequest, NULL_VERSION_ID,
};
use parking_lot::{Mutex, RwLock};
use serde_json::{Value, json};
use typed_builder::TypedBuilder;

use super::{ContainerMetadata, ObjectBackend, ObjectProperties, decode_listing};
use crate::error::BackendError;

/// Backend operations, for fault injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    /// `list_container`.
    List,
    /// `container_metadata`.
    Metadata,
    /// `create_container`.
    CreateContainer,
    /// `delete_container`.
    DeleteContainer,
    /// `delete_object`.
    DeleteObject,
    /// `object_properties`.
    ObjectProperties,
}

/// A scripted failure.
///
/// ```
/// use flatstack_s3_core::backend::{BackendOp, Fault};
/// use flatstack_s3_core::error::BackendError;
///
/// let fault = Fault::new(BackendOp::List, BackendError::ServiceBusy("busy".into()))
///     .on_container("photos")
///     .times(1);
/// # let _ = fault;
/// ```
#[derive(Debug, Clone)]
pub struct Fault {
    op: BackendOp,
    container: Option<String>,
    object: Option<String>,
    error: BackendError,
    remaining: Option<usize>,
}

impl Fault {
    /// Fail every call of `op` with `error`.
    #[must_use]
    pub fn new(op: BackendOp, error: BackendError) -> Self {
        Self {
            op,
            container: None,
            object: None,
            error,
            remaining: None,
        }
    }

    /// Only fail calls against `container`.
    #[must_use]
    pub fn on_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Only fail calls against `object`.
    #[must_use]
    pub fn on_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Fail at most `n` times.
    #[must_use]
    pub fn times(mut self, n: usize) -> Self {
        self.remaining = Some(n);
        self
    }

    fn matches(&self, op: BackendOp, container: &str, object: Option<&str>) -> bool {
        self.op == op
            && self.container.as_deref().is_none_or(|c| c == container)
            && self.object.as_deref().is_none_or(|o| Some(o) == object)
    }
}

/// Attributes of an object written through [`MemoryBackend::put_object`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct NewObject {
    /// Size in bytes.
    #[builder(default)]
    pub size: u64,
    /// Content hash.
    #[builder(default, setter(into))]
    pub hash: String,
    /// Precomputed composite ETag.
    #[builder(default, setter(strip_option, into))]
    pub s3_etag: Option<String>,
    /// Aggregate hash of a segmented object.
    #[builder(default, setter(strip_option, into))]
    pub slo_etag: Option<String>,
    /// Stored content type.
    #[builder(default = String::from("application/octet-stream"), setter(into))]
    pub content_type: String,
}

#[derive(Debug, Clone)]
struct StoredVersion {
    version_id: Option<String>,
    last_modified: DateTime<Utc>,
    object: NewObject,
}

impl StoredVersion {
    fn is_delete_marker(&self) -> bool {
        self.object.content_type == DELETE_MARKER_CONTENT_TYPE
    }

    fn to_row(&self, name: &str, is_latest: bool) -> Value {
        let mut row = json!({
            "name": name,
            "hash": self.object.hash,
            "bytes": self.object.size,
            "last_modified": self.last_modified.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            "content_type": self.object.content_type,
            "is_latest": is_latest,
        });
        if let Some(map) = row.as_object_mut() {
            if let Some(v) = &self.version_id {
                map.insert("version_id".to_owned(), json!(v));
            }
            if let Some(v) = &self.object.s3_etag {
                map.insert("s3_etag".to_owned(), json!(v));
            }
            if let Some(v) = &self.object.slo_etag {
                map.insert("slo_etag".to_owned(), json!(v));
            }
        }
        row
    }
}

type Container = BTreeMap<String, Vec<StoredVersion>>;

/// An in-memory [`ObjectBackend`].
///
/// # Examples
///
/// ```
/// use flatstack_s3_core::backend::{MemoryBackend, NewObject, ObjectBackend};
/// use flatstack_s3_model::types::ListingRequest;
///
/// # tokio_test::block_on(async {
/// let backend = MemoryBackend::new();
/// backend.create_container("photos").await.unwrap();
/// for name in ["a.jpg", "b.jpg", "c.jpg"] {
///     backend
///         .put_object("photos", name, NewObject::builder().size(3).hash("abc").build())
///         .unwrap();
/// }
///
/// let request = ListingRequest {
///     limit: 2,
///     marker: Some("a.jpg".to_owned()),
///     ..ListingRequest::default()
/// };
/// let entries = backend.list_container("photos", &request).await.unwrap();
/// let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
/// assert_eq!(names, vec!["b.jpg", "c.jpg"]);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    containers: RwLock<BTreeMap<String, Container>>,
    versioned: bool,
    faults: Mutex<Vec<Fault>>,
    calls: DashMap<BackendOp, usize>,
    list_limits: Mutex<Vec<usize>>,
    last_version_tick: Mutex<u64>,
}

impl MemoryBackend {
    /// Create an unversioned backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that keeps every object version.
    #[must_use]
    pub fn versioned() -> Self {
        Self {
            versioned: true,
            ..Self::default()
        }
    }

    /// Register a scripted failure.
    pub fn inject(&self, fault: Fault) {
        self.faults.lock().push(fault);
    }

    /// Number of calls made for `op`, failed ones included.
    #[must_use]
    pub fn calls(&self, op: BackendOp) -> usize {
        self.calls.get(&op).map_or(0, |n| *n)
    }

    /// The `limit` of every `list_container` call, in call order.
    #[must_use]
    pub fn list_limits(&self) -> Vec<usize> {
        self.list_limits.lock().clone()
    }

    /// Whether `container` exists.
    #[must_use]
    pub fn has_container(&self, container: &str) -> bool {
        self.containers.read().contains_key(container)
    }

    /// Names currently stored in `container`, versions collapsed.
    #[must_use]
    pub fn object_names(&self, container: &str) -> Vec<String> {
        self.containers
            .read()
            .get(container)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Store an object, returning its version id when versioning is on.
    pub fn put_object(
        &self,
        container: &str,
        name: &str,
        object: NewObject,
    ) -> Result<Option<String>, BackendError> {
        let version_id = self.versioned.then(|| self.next_version_id());
        let mut containers = self.containers.write();
        let objects = containers
            .get_mut(container)
            .ok_or_else(|| BackendError::NoSuchContainer(container.to_owned()))?;
        let stored = StoredVersion {
            version_id: version_id.clone(),
            last_modified: Utc::now(),
            object,
        };
        let versions = objects.entry(name.to_owned()).or_default();
        if !self.versioned {
            versions.clear();
        }
        versions.push(stored);
        Ok(version_id)
    }

    /// Hide an object behind a delete marker.
    ///
    /// Without versioning the object is simply removed.
    pub fn put_delete_marker(
        &self,
        container: &str,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        if !self.versioned {
            let mut containers = self.containers.write();
            let objects = containers
                .get_mut(container)
                .ok_or_else(|| BackendError::NoSuchContainer(container.to_owned()))?;
            objects.remove(name);
            return Ok(None);
        }
        self.put_object(
            container,
            name,
            NewObject::builder()
                .content_type(DELETE_MARKER_CONTENT_TYPE)
                .build(),
        )
    }

    /// Timestamp-shaped, strictly increasing version ids (`1709288430.12345`).
    fn next_version_id(&self) -> String {
        let now = u64::try_from(Utc::now().timestamp_micros() / 10).unwrap_or(0);
        let mut last = self.last_version_tick.lock();
        let tick = now.max(*last + 1);
        *last = tick;
        format!("{:010}.{:05}", tick / 100_000, tick % 100_000)
    }

    fn record(
        &self,
        op: BackendOp,
        container: &str,
        object: Option<&str>,
    ) -> Result<(), BackendError> {
        *self.calls.entry(op).or_insert(0) += 1;
        let mut faults = self.faults.lock();
        let Some(idx) = faults
            .iter()
            .position(|f| f.matches(op, container, object))
        else {
            return Ok(());
        };
        let error = faults[idx].error.clone();
        if let Some(remaining) = faults[idx].remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                faults.remove(idx);
            }
        }
        Err(error)
    }
}

/// Render the rows a listing request selects, in backend order.
fn select_rows(objects: &Container, request: &ListingRequest) -> Vec<Value> {
    let prefix = request.prefix.as_deref().unwrap_or("");
    let delimiter = request.delimiter.as_deref().filter(|d| !d.is_empty());
    let marker = request.marker.as_deref();
    let resume_inside_marker = request.include_versions && request.version_marker.is_some();
    let start = marker.map_or(Bound::Unbounded, Bound::Included);

    let mut rows = Vec::new();
    let mut last_subdir: Option<&str> = None;

    for (name, versions) in objects.range::<str, _>((start, Bound::Unbounded)) {
        if rows.len() >= request.limit {
            break;
        }
        if !name.starts_with(prefix) {
            continue;
        }
        let at_marker = marker == Some(name.as_str());
        if at_marker && !resume_inside_marker {
            continue;
        }

        if let Some(delim) = delimiter {
            if let Some(idx) = name[prefix.len()..].find(delim) {
                let subdir = &name[..prefix.len() + idx + delim.len()];
                if marker == Some(subdir) || last_subdir == Some(subdir) {
                    continue;
                }
                last_subdir = Some(subdir);
                rows.push(json!({ "subdir": subdir }));
                continue;
            }
        }

        if request.include_versions {
            let skip = if at_marker {
                let wanted = request.version_marker.as_deref().unwrap_or(NULL_VERSION_ID);
                match versions
                    .iter()
                    .rev()
                    .position(|v| v.version_id.as_deref().unwrap_or(NULL_VERSION_ID) == wanted)
                {
                    Some(pos) => pos + 1,
                    None => continue,
                }
            } else {
                0
            };
            for (i, version) in versions.iter().rev().enumerate().skip(skip) {
                if rows.len() >= request.limit {
                    break;
                }
                rows.push(version.to_row(name, i == 0));
            }
        } else if let Some(latest) = versions.last() {
            if !latest.is_delete_marker() {
                rows.push(latest.to_row(name, true));
            }
        }
    }
    rows
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn list_container(
        &self,
        container: &str,
        request: &ListingRequest,
    ) -> Result<Vec<Entry>, BackendError> {
        self.list_limits.lock().push(request.limit);
        self.record(BackendOp::List, container, None)?;
        let rows = {
            let containers = self.containers.read();
            let objects = containers
                .get(container)
                .ok_or_else(|| BackendError::NoSuchContainer(container.to_owned()))?;
            select_rows(objects, request)
        };
        let payload = serde_json::to_vec(&rows)
            .map_err(|e| BackendError::Internal(format!("listing encode failed: {e}")))?;
        decode_listing(&payload)
    }

    async fn container_metadata(&self, container: &str) -> Result<ContainerMetadata, BackendError> {
        self.record(BackendOp::Metadata, container, None)?;
        let containers = self.containers.read();
        let objects = containers
            .get(container)
            .ok_or_else(|| BackendError::NoSuchContainer(container.to_owned()))?;
        let mut meta = ContainerMetadata::default();
        for latest in objects.values().filter_map(|versions| versions.last()) {
            if !latest.is_delete_marker() {
                meta.object_count += 1;
                meta.bytes_used += latest.object.size;
            }
        }
        Ok(meta)
    }

    async fn create_container(&self, container: &str) -> Result<(), BackendError> {
        self.record(BackendOp::CreateContainer, container, None)?;
        let mut containers = self.containers.write();
        if containers.contains_key(container) {
            return Err(BackendError::ContainerAlreadyExists(container.to_owned()));
        }
        containers.insert(container.to_owned(), Container::new());
        Ok(())
    }

    async fn delete_container(&self, container: &str) -> Result<(), BackendError> {
        self.record(BackendOp::DeleteContainer, container, None)?;
        let mut containers = self.containers.write();
        let objects = containers
            .get(container)
            .ok_or_else(|| BackendError::NoSuchContainer(container.to_owned()))?;
        if !objects.is_empty() {
            return Err(BackendError::ContainerNotEmpty(container.to_owned()));
        }
        containers.remove(container);
        Ok(())
    }

    async fn delete_object(&self, container: &str, name: &str) -> Result<(), BackendError> {
        self.record(BackendOp::DeleteObject, container, Some(name))?;
        let mut containers = self.containers.write();
        let objects = containers
            .get_mut(container)
            .ok_or_else(|| BackendError::NoSuchContainer(container.to_owned()))?;
        objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BackendError::NoSuchObject(name.to_owned()))
    }

    async fn object_properties(
        &self,
        container: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<ObjectProperties, BackendError> {
        self.record(BackendOp::ObjectProperties, container, Some(name))?;
        let containers = self.containers.read();
        let objects = containers
            .get(container)
            .ok_or_else(|| BackendError::NoSuchContainer(container.to_owned()))?;
        let versions = objects
            .get(name)
            .ok_or_else(|| BackendError::NoSuchObject(name.to_owned()))?;
        let found = match version {
            Some(wanted) => versions
                .iter()
                .find(|v| v.version_id.as_deref().unwrap_or(NULL_VERSION_ID) == wanted),
            None => versions.last(),
        };
        match found {
            Some(v) if !v.is_delete_marker() => Ok(ObjectProperties {
                hash: v.object.hash.clone(),
                size: v.object.size,
            }),
            _ => Err(BackendError::NoSuchObject(name.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(limit: usize) -> ListingRequest {
        ListingRequest {
            limit,
            ..ListingRequest::default()
        }
    }

    fn small(hash: &str) -> NewObject {
        NewObject::builder().size(3).hash(hash).build()
    }

    async fn backend_with(names: &[&str]) -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.create_container("c").await.expect("create container");
        for name in names {
            backend.put_object("c", name, small("h")).expect("put object");
        }
        backend
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(Entry::name).collect()
    }

    #[tokio::test]
    async fn test_should_list_after_marker_with_limit() {
        let backend = backend_with(&["a", "b", "c", "d"]).await;
        let mut req = request(2);
        req.marker = Some("a".to_owned());

        let entries = backend.list_container("c", &req).await.expect("list");
        assert_eq!(names(&entries), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_should_roll_up_common_prefixes() {
        let backend = backend_with(&["a.txt", "photos/1.jpg", "photos/2.jpg", "z.txt"]).await;
        let mut req = request(10);
        req.delimiter = Some("/".to_owned());

        let entries = backend.list_container("c", &req).await.expect("list");
        assert_eq!(names(&entries), vec!["a.txt", "photos/", "z.txt"]);
        assert!(entries[1].is_common_prefix());

        req.marker = Some("photos/".to_owned());
        let entries = backend.list_container("c", &req).await.expect("list");
        assert_eq!(names(&entries), vec!["z.txt"]);
    }

    #[tokio::test]
    async fn test_should_honor_prefix() {
        let backend = backend_with(&["a/1", "a/2", "b/1"]).await;
        let mut req = request(10);
        req.prefix = Some("a/".to_owned());

        let entries = backend.list_container("c", &req).await.expect("list");
        assert_eq!(names(&entries), vec!["a/1", "a/2"]);
    }

    #[tokio::test]
    async fn test_should_list_versions_newest_first() {
        let backend = MemoryBackend::versioned();
        backend.create_container("c").await.expect("create container");
        let v1 = backend.put_object("c", "k", small("h1")).expect("put").expect("version id");
        let v2 = backend.put_object("c", "k", small("h2")).expect("put").expect("version id");
        let dm = backend.put_delete_marker("c", "k").expect("marker").expect("version id");
        assert!(v1 < v2 && v2 < dm);

        let mut req = request(10);
        req.include_versions = true;
        let entries = backend.list_container("c", &req).await.expect("list");
        let ids: Vec<Option<&str>> = entries.iter().map(Entry::version_id).collect();
        assert_eq!(ids, vec![Some(dm.as_str()), Some(v2.as_str()), Some(v1.as_str())]);
        assert!(matches!(&entries[0], Entry::DeleteMarker(m) if m.is_latest));
        assert!(matches!(&entries[1], Entry::Object(o) if !o.is_latest));

        req.marker = Some("k".to_owned());
        req.version_marker = Some(v2.clone());
        let entries = backend.list_container("c", &req).await.expect("list");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].version_id(), Some(v1.as_str()));
    }

    #[tokio::test]
    async fn test_should_hide_deleted_objects_from_live_listing() {
        let backend = MemoryBackend::versioned();
        backend.create_container("c").await.expect("create container");
        backend.put_object("c", "gone", small("h")).expect("put");
        backend.put_object("c", "kept", small("h")).expect("put");
        backend.put_delete_marker("c", "gone").expect("marker");

        let entries = backend.list_container("c", &request(10)).await.expect("list");
        assert_eq!(names(&entries), vec!["kept"]);
        let meta = backend.container_metadata("c").await.expect("metadata");
        assert_eq!(meta.object_count, 1);
    }

    #[tokio::test]
    async fn test_should_refuse_to_delete_non_empty_container() {
        let backend = backend_with(&["a"]).await;
        let err = backend.delete_container("c").await.expect_err("not empty");
        assert_eq!(err, BackendError::ContainerNotEmpty("c".to_owned()));

        backend.delete_object("c", "a").await.expect("delete object");
        backend.delete_container("c").await.expect("delete container");
        assert!(!backend.has_container("c"));
    }

    #[tokio::test]
    async fn test_should_inject_fault_a_limited_number_of_times() {
        let backend = backend_with(&["a"]).await;
        backend.inject(
            Fault::new(BackendOp::List, BackendError::ServiceBusy("busy".into()))
                .on_container("c")
                .times(1),
        );

        let err = backend.list_container("c", &request(5)).await.expect_err("fault");
        assert_eq!(err, BackendError::ServiceBusy("busy".into()));
        backend.list_container("c", &request(5)).await.expect("second call succeeds");
        assert_eq!(backend.calls(BackendOp::List), 2);
    }

    #[tokio::test]
    async fn test_should_scope_fault_to_object() {
        let backend = backend_with(&["a", "b"]).await;
        backend.inject(
            Fault::new(BackendOp::DeleteObject, BackendError::Internal("disk".into()))
                .on_object("b"),
        );

        backend.delete_object("c", "a").await.expect("delete a");
        assert!(backend.delete_object("c", "b").await.is_err());
    }

    #[tokio::test]
    async fn test_should_report_object_properties() {
        let backend = backend_with(&["a"]).await;
        let props = backend.object_properties("c", "a", None).await.expect("props");
        assert_eq!(props.hash, "h");
        let err = backend.object_properties("c", "zz", None).await.expect_err("missing");
        assert_eq!(err, BackendError::NoSuchObject("zz".to_owned()));
    }
}
