//! Paginated retrieval of search results.
//!
//! This module provides:
//! - [`SearchTransport`] - the single-page request seam (HTTP in production)
//! - [`Fetcher`] - pagination, accumulation and failure classification
//! - [`FetchStats`] - request/failure counters for the run summary
//!
//! # Submodules
//!
//! - [`http`] - `reqwest`-backed transport with basic authentication

pub mod http;

pub use http::HttpTransport;

use crate::model::Issue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Page size requested from the search endpoint.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// Transport-layer failure for a single page request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("search API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode search response: {0}")]
    Decode(String),
}

/// Issues a single page request against the search API.
pub trait SearchTransport {
    /// Fetch the page starting at `start_at` holding at most `max_results` issues.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on connection failure, a non-success status,
    /// or an undecodable body.
    fn search(&self, query: &str, start_at: usize, max_results: usize)
    -> Result<SearchPage, FetchError>;
}

impl<T: SearchTransport + ?Sized> SearchTransport for &T {
    fn search(
        &self,
        query: &str,
        start_at: usize,
        max_results: usize,
    ) -> Result<SearchPage, FetchError> {
        (**self).search(query, start_at, max_results)
    }
}

/// Counters accumulated over one report run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    pub requests: usize,
    pub failed_queries: usize,
    pub issues_received: usize,
    pub cache_hits: usize,
}

/// Pages through the search API and accumulates complete result sets.
///
/// Successful result sets are memoized by query string for the lifetime of
/// the fetcher, so one report run fetches each distinct query once.
pub struct Fetcher<T> {
    transport: T,
    page_size: usize,
    cache: HashMap<String, Vec<Issue>>,
    stats: FetchStats,
}

impl<T: SearchTransport> Fetcher<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_page_size(transport, DEFAULT_PAGE_SIZE)
    }

    #[must_use]
    pub fn with_page_size(transport: T, page_size: usize) -> Self {
        Self {
            transport,
            page_size: page_size.max(1),
            cache: HashMap::new(),
            stats: FetchStats::default(),
        }
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub const fn stats(&self) -> FetchStats {
        self.stats
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Retrieve every issue matching `query`.
    ///
    /// Each page is requested at the count of issues collected so far, so a
    /// server capping pages below `page_size` still yields every issue.
    /// Paging stops once the collected count reaches the total reported by
    /// the first page, or on an empty page. Issues keep their arrival order.
    ///
    /// Any transport failure is logged and yields an empty sequence, and the
    /// partial pages already received are discarded. An empty result
    /// therefore means "no data", not necessarily "no matching issues".
    /// No retry is attempted.
    pub fn fetch(&mut self, query: &str) -> Vec<Issue> {
        if let Some(cached) = self.cache.get(query) {
            self.stats.cache_hits += 1;
            debug!(query, count = cached.len(), "Reusing fetched result set");
            return cached.clone();
        }

        match self.fetch_all_pages(query) {
            Ok(issues) => {
                self.stats.issues_received += issues.len();
                self.cache.insert(query.to_string(), issues.clone());
                issues
            }
            Err(err) => {
                self.stats.failed_queries += 1;
                error!(query, error = %err, "Search API request failed");
                Vec::new()
            }
        }
    }

    fn fetch_all_pages(&mut self, query: &str) -> Result<Vec<Issue>, FetchError> {
        let mut issues = Vec::new();
        let mut start_at = 0;
        let mut total: Option<usize> = None;

        loop {
            self.stats.requests += 1;
            let page = self.transport.search(query, start_at, self.page_size)?;
            let reported_total = *total.get_or_insert(page.total);
            let received = page.issues.len();

            debug!(
                query,
                start_at,
                received,
                total = reported_total,
                "Fetched search page"
            );

            issues.extend(page.issues);
            if issues.len() >= reported_total {
                break;
            }
            if received == 0 {
                warn!(
                    query,
                    received = issues.len(),
                    total = reported_total,
                    "Search API returned an empty page before the reported total"
                );
                break;
            }
            start_at += received;
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IssueFields;
    use std::cell::RefCell;

    fn issue(key: &str) -> Issue {
        Issue {
            key: Some(key.to_string()),
            fields: IssueFields {
                priority: None,
                created: None,
                resolutiondate: None,
                updated: None,
            },
            defect_age: None,
        }
    }

    /// Serves `total` synthetic issues and records every requested offset.
    struct PagedTransport {
        total: usize,
        fail_at: Option<usize>,
        max_page: Option<usize>,
        offsets: RefCell<Vec<usize>>,
    }

    impl PagedTransport {
        fn new(total: usize) -> Self {
            Self {
                total,
                fail_at: None,
                max_page: None,
                offsets: RefCell::new(Vec::new()),
            }
        }
    }

    impl SearchTransport for PagedTransport {
        fn search(
            &self,
            _query: &str,
            start_at: usize,
            max_results: usize,
        ) -> Result<SearchPage, FetchError> {
            self.offsets.borrow_mut().push(start_at);
            if self.fail_at == Some(start_at) {
                return Err(FetchError::Status {
                    status: 502,
                    body: "bad gateway".to_string(),
                });
            }
            let page_len = self.max_page.map_or(max_results, |cap| cap.min(max_results));
            let end = (start_at + page_len).min(self.total);
            Ok(SearchPage {
                total: self.total,
                issues: (start_at..end).map(|n| issue(&format!("QA-{n}"))).collect(),
            })
        }
    }

    #[test]
    fn pages_until_reported_total() {
        let transport = PagedTransport::new(250);
        let mut fetcher = Fetcher::new(&transport);
        let issues = fetcher.fetch("project = QA");

        assert_eq!(*transport.offsets.borrow(), vec![0, 100, 200]);
        assert_eq!(issues.len(), 250);
        assert_eq!(issues[0].key.as_deref(), Some("QA-0"));
        assert_eq!(issues[99].key.as_deref(), Some("QA-99"));
        assert_eq!(issues[249].key.as_deref(), Some("QA-249"));
        assert_eq!(fetcher.stats().requests, 3);
    }

    #[test]
    fn short_pages_advance_by_received_count() {
        let mut transport = PagedTransport::new(250);
        transport.max_page = Some(50);
        let mut fetcher = Fetcher::new(&transport);
        let issues = fetcher.fetch("project = QA");

        assert_eq!(issues.len(), 250);
        assert_eq!(*transport.offsets.borrow(), vec![0, 50, 100, 150, 200]);
        assert_eq!(issues[50].key.as_deref(), Some("QA-50"));
        assert_eq!(issues[249].key.as_deref(), Some("QA-249"));
    }

    #[test]
    fn empty_page_before_total_stops_paging() {
        // Server reports more issues than it ever serves.
        struct Overstated;
        impl SearchTransport for Overstated {
            fn search(
                &self,
                _query: &str,
                start_at: usize,
                _max_results: usize,
            ) -> Result<SearchPage, FetchError> {
                let issues = if start_at == 0 { vec![issue("QA-0")] } else { Vec::new() };
                Ok(SearchPage { total: 500, issues })
            }
        }

        let mut fetcher = Fetcher::new(Overstated);
        assert_eq!(fetcher.fetch("q").len(), 1);
        assert_eq!(fetcher.stats().requests, 2);
    }

    #[test]
    fn empty_total_issues_single_request() {
        let transport = PagedTransport::new(0);
        let mut fetcher = Fetcher::new(&transport);
        assert!(fetcher.fetch("project = QA").is_empty());
        assert_eq!(*transport.offsets.borrow(), vec![0]);
    }

    #[test]
    fn exact_multiple_of_page_size() {
        let transport = PagedTransport::new(200);
        let mut fetcher = Fetcher::new(&transport);
        assert_eq!(fetcher.fetch("q").len(), 200);
        assert_eq!(*transport.offsets.borrow(), vec![0, 100]);
    }

    #[test]
    fn failure_mid_pagination_returns_empty() {
        let mut transport = PagedTransport::new(250);
        transport.fail_at = Some(100);
        let mut fetcher = Fetcher::new(&transport);

        assert!(fetcher.fetch("q").is_empty());
        assert_eq!(*transport.offsets.borrow(), vec![0, 100]);
        assert_eq!(fetcher.stats().failed_queries, 1);
    }

    #[test]
    fn failures_are_not_memoized() {
        let mut transport = PagedTransport::new(10);
        transport.fail_at = Some(0);
        let mut fetcher = Fetcher::new(&transport);

        assert!(fetcher.fetch("q").is_empty());
        assert!(fetcher.fetch("q").is_empty());
        assert_eq!(transport.offsets.borrow().len(), 2);
        assert_eq!(fetcher.stats().cache_hits, 0);
    }

    #[test]
    fn repeated_query_is_served_from_cache() {
        let transport = PagedTransport::new(150);
        let mut fetcher = Fetcher::new(&transport);

        let first = fetcher.fetch("q");
        let second = fetcher.fetch("q");

        assert_eq!(first, second);
        assert_eq!(transport.offsets.borrow().len(), 2);
        assert_eq!(fetcher.stats().cache_hits, 1);
    }

    #[test]
    fn custom_page_size_is_respected() {
        let transport = PagedTransport::new(25);
        let mut fetcher = Fetcher::with_page_size(&transport, 10);
        assert_eq!(fetcher.fetch("q").len(), 25);
        assert_eq!(*transport.offsets.borrow(), vec![0, 10, 20]);
    }

    #[test]
    fn search_page_tolerates_missing_fields() {
        let page: SearchPage = serde_json::from_str("{}").unwrap();
        assert_eq!(page.total, 0);
        assert!(page.issues.is_empty());
    }
}
