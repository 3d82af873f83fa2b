//! Backend Listing Invoker.

use flatstack_s3_model::types::{ListingRequest, Page};

use crate::backend::ObjectBackend;
use crate::error::BackendError;

/// Fetch one page with a single backend call.
///
/// `request.limit` is expected to carry one row of lookahead past
/// `page_size`. When the backend returns more than `page_size` rows the page
/// is truncated and the extra rows are dropped; they only prove that more data
/// remains.
pub async fn invoke_listing(
    backend: &dyn ObjectBackend,
    container: &str,
    request: &ListingRequest,
    page_size: usize,
) -> Result<Page, BackendError> {
    let mut entries = backend.list_container(container, request).await?;
    let truncated = entries.len() > page_size;
    if truncated {
        entries.truncate(page_size);
    }
    Ok(Page { entries, truncated })
}

#[cfg(test)]
mod tests {
    use flatstack_s3_model::Entry;

    use super::*;
    use crate::backend::{BackendOp, MemoryBackend, NewObject};

    async fn backend_with(count: usize) -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.create_container("c").await.expect("create container");
        for i in 0..count {
            let name = char::from(b'a' + u8::try_from(i).expect("small index")).to_string();
            backend
                .put_object("c", &name, NewObject::builder().hash("h").build())
                .expect("put object");
        }
        backend
    }

    fn request(page_size: usize) -> ListingRequest {
        ListingRequest {
            limit: page_size + 1,
            ..ListingRequest::default()
        }
    }

    #[tokio::test]
    async fn test_should_trim_lookahead_entry() {
        let backend = backend_with(3).await;
        let page = invoke_listing(&backend, "c", &request(2), 2).await.expect("list");
        let names: Vec<&str> = page.entries.iter().map(Entry::name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(page.truncated);
        assert_eq!(page.next_cursor_source().map(Entry::name), Some("b"));
        assert_eq!(backend.calls(BackendOp::List), 1);
    }

    #[tokio::test]
    async fn test_should_not_truncate_when_everything_fits() {
        for (page_size, count) in [(3, 3), (5, 3), (1, 0)] {
            let backend = backend_with(count).await;
            let page = invoke_listing(&backend, "c", &request(page_size), page_size)
                .await
                .expect("list");
            assert!(!page.truncated, "N={page_size} M={count}");
            assert_eq!(page.entries.len(), count);
        }
    }

    #[tokio::test]
    async fn test_should_truncate_zero_sized_pages_when_data_remains() {
        let backend = backend_with(2).await;
        let page = invoke_listing(&backend, "c", &request(0), 0).await.expect("list");
        assert!(page.truncated);
        assert!(page.entries.is_empty());

        let empty = backend_with(0).await;
        let page = invoke_listing(&empty, "c", &request(0), 0).await.expect("list");
        assert!(!page.truncated);
    }

    #[tokio::test]
    async fn test_should_propagate_backend_failure() {
        let backend = MemoryBackend::new();
        let err = invoke_listing(&backend, "missing", &request(1), 1)
            .await
            .expect_err("missing container");
        assert_eq!(err, BackendError::NoSuchContainer("missing".to_owned()));
    }
}
