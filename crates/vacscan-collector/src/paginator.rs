use crate::api::{ListingApi, SearchPage};
use crate::error::{CollectError, Result};
use crate::query::with_page;
use crate::retry::RetryPolicy;
use std::sync::Arc;

/// Walks the paginated search endpoint and lists matching vacancy ids.
pub struct ListingPaginator {
    api: Arc<dyn ListingApi>,
    retry: RetryPolicy,
}

impl ListingPaginator {
    pub fn new(api: Arc<dyn ListingApi>, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    /// Collect every id for `canonical`, in page order then item order.
    ///
    /// The unpaged request supplies the page count; pages `0..=pages` are then
    /// requested one by one, stopping at the first page without `items` since
    /// the reported count is not always consistent with the pages served.
    /// Any request that still fails after retries aborts the whole walk.
    pub async fn collect_ids(&self, canonical: &str) -> Result<Vec<String>> {
        let first = self.fetch(canonical, canonical, "page count").await?;
        let pages = first.pages.ok_or_else(|| CollectError::Pagination {
            query: canonical.to_string(),
            stage: "page count".to_string(),
            source: Box::new(CollectError::UnexpectedResponse {
                url: canonical.to_string(),
                reason: "response has no 'pages' field".to_string(),
            }),
        })?;
        tracing::debug!("Query '{}' reports {} pages", canonical, pages);

        let mut ids = Vec::new();
        for page in 0..=pages {
            let stage = format!("page {page}");
            let response = self
                .fetch(canonical, &with_page(canonical, page), &stage)
                .await?;

            let Some(items) = response.items else {
                tracing::debug!("Page {} has no items, stopping", page);
                break;
            };
            ids.extend(items.into_iter().map(|item| item.id));
        }

        tracing::info!("Found {} vacancies for '{}'", ids.len(), canonical);
        Ok(ids)
    }

    async fn fetch(&self, canonical: &str, request: &str, stage: &str) -> Result<SearchPage> {
        let api = &self.api;
        self.retry
            .run(stage, move || api.search(request))
            .await
            .map_err(|e| CollectError::Pagination {
                query: canonical.to_string(),
                stage: stage.to_string(),
                source: Box::new(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ItemRef, VacancyDetail};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned search pages keyed by the full request string.
    #[derive(Default)]
    struct PagedApi {
        pages: HashMap<String, SearchPage>,
        requests: Mutex<Vec<String>>,
    }

    impl PagedApi {
        fn with_page(mut self, request: &str, page: SearchPage) -> Self {
            self.pages.insert(request.to_string(), page);
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().expect("requests lock").clone()
        }
    }

    #[async_trait]
    impl ListingApi for PagedApi {
        async fn search(&self, query: &str) -> Result<SearchPage> {
            self.requests
                .lock()
                .expect("requests lock")
                .push(query.to_string());
            self.pages
                .get(query)
                .cloned()
                .ok_or_else(|| CollectError::HttpStatus {
                    url: query.to_string(),
                    status: 503,
                })
        }

        async fn vacancy(&self, _id: &str) -> Result<VacancyDetail> {
            unreachable!("paginator never fetches details")
        }
    }

    fn count(pages: u32) -> SearchPage {
        SearchPage {
            pages: Some(pages),
            items: None,
        }
    }

    fn items(ids: &[&str]) -> SearchPage {
        SearchPage {
            pages: None,
            items: Some(
                ids.iter()
                    .map(|id| ItemRef { id: (*id).to_string() })
                    .collect(),
            ),
        }
    }

    #[tokio::test]
    async fn test_walks_pages_through_reported_count_inclusive() {
        let api = Arc::new(
            PagedApi::default()
                .with_page("text=a", count(1))
                .with_page("text=a&page=0", items(&["1", "2"]))
                .with_page("text=a&page=1", items(&["3"])),
        );
        let paginator = ListingPaginator::new(api.clone(), RetryPolicy::none());

        // Page 2 (== pages) is requested too and fails: the count is inclusive.
        let err = paginator.collect_ids("text=a").await.expect_err("page 2 missing");
        assert!(matches!(err, CollectError::Pagination { ref stage, .. } if stage == "page 2"));
        assert_eq!(
            api.requests(),
            vec!["text=a", "text=a&page=0", "text=a&page=1", "text=a&page=2"]
        );
    }

    #[tokio::test]
    async fn test_stops_at_first_page_without_items() {
        let api = Arc::new(
            PagedApi::default()
                .with_page("text=a", count(5))
                .with_page("text=a&page=0", items(&["1", "2"]))
                .with_page("text=a&page=1", items(&["3", "4"]))
                .with_page("text=a&page=2", items(&["5"]))
                .with_page("text=a&page=3", SearchPage::default())
                .with_page("text=a&page=4", items(&["never"])),
        );
        let paginator = ListingPaginator::new(api.clone(), RetryPolicy::none());

        let ids = paginator.collect_ids("text=a").await.expect("collect ids");
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(api.requests().len(), 5);
    }

    #[tokio::test]
    async fn test_missing_page_count_is_an_error() {
        let api = Arc::new(PagedApi::default().with_page("text=a", SearchPage::default()));
        let paginator = ListingPaginator::new(api, RetryPolicy::none());

        let err = paginator.collect_ids("text=a").await.expect_err("no page count");
        assert!(matches!(err, CollectError::Pagination { .. }));
        assert!(err.to_string().contains("text=a"));
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_with_context() {
        let api = Arc::new(
            PagedApi::default()
                .with_page("text=a", count(2))
                .with_page("text=a&page=0", items(&["1"])),
        );
        let paginator = ListingPaginator::new(api, RetryPolicy::none());

        let err = paginator.collect_ids("text=a").await.expect_err("page 1 fails");
        let message = err.to_string();
        assert!(message.contains("'text=a'"));
        assert!(message.contains("page 1"));
        assert!(message.contains("503"));
    }
}
