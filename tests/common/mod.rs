#![allow(dead_code)]

use defect_report::catalog::{DateWindow, QueryCatalog};
use defect_report::fetch::{FetchError, SearchPage, SearchTransport};
use defect_report::model::{Category, Issue, IssueFields, PriorityField, query};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        defect_report::logging::init_test_logging();
    });
}

pub fn window() -> DateWindow {
    DateWindow::new("2024-01-01", "2024-01-31")
}

/// Template used for every catalog entry: unique per (category, metric).
pub fn template(category: Category, metric: &str) -> String {
    format!(
        "category = {category} AND metric = {metric} AND created >= {{{{start_date}}}} AND created <= {{{{end_date}}}}"
    )
}

/// The template above rendered for [`window`].
pub fn rendered(category: Category, metric: &str) -> String {
    window().apply(&template(category, metric))
}

/// A catalog holding every query a run needs.
pub fn full_catalog() -> QueryCatalog {
    let mut catalog = QueryCatalog::default();
    for category in Category::ALL {
        for metric in query::COMMON {
            catalog.insert(category, metric, template(category, metric));
        }
    }
    for metric in query::DEFECT_SETS {
        catalog.insert(Category::Regression, metric, template(Category::Regression, metric));
    }
    catalog
}

pub fn issue(key: &str, priority: &str) -> Issue {
    Issue {
        key: Some(key.to_string()),
        fields: IssueFields {
            priority: Some(PriorityField {
                name: priority.to_string(),
            }),
            created: None,
            resolutiondate: None,
            updated: None,
        },
        defect_age: None,
    }
}

pub fn defect(key: &str, priority: &str, created: &str, resolved: Option<&str>) -> Issue {
    let mut issue = issue(key, priority);
    issue.fields.created = Some(created.to_string());
    issue.fields.resolutiondate = resolved.map(str::to_string);
    issue
}

pub fn issues(prefix: &str, priority: &str, count: usize) -> Vec<Issue> {
    (0..count)
        .map(|n| issue(&format!("{prefix}-{n}"), priority))
        .collect()
}

/// In-memory search API.
///
/// Serves scripted result sets by query string, slicing them into pages the
/// way the real endpoint does. Unknown queries match nothing.
#[derive(Default)]
pub struct ScriptedTransport {
    results: HashMap<String, Vec<Issue>>,
    failing: HashSet<String>,
    calls: RefCell<Vec<(String, usize, usize)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, query: impl Into<String>, issues: Vec<Issue>) -> Self {
        self.results.insert(query.into(), issues);
        self
    }

    pub fn fail(mut self, query: impl Into<String>) -> Self {
        self.failing.insert(query.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn calls_for(&self, query: &str) -> Vec<usize> {
        self.calls
            .borrow()
            .iter()
            .filter(|(q, _, _)| q == query)
            .map(|(_, start_at, _)| *start_at)
            .collect()
    }
}

impl SearchTransport for ScriptedTransport {
    fn search(
        &self,
        query: &str,
        start_at: usize,
        max_results: usize,
    ) -> Result<SearchPage, FetchError> {
        self.calls
            .borrow_mut()
            .push((query.to_string(), start_at, max_results));

        if self.failing.contains(query) {
            return Err(FetchError::Status {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }

        let all = self.results.get(query).cloned().unwrap_or_default();
        let total = all.len();
        let issues = all.into_iter().skip(start_at).take(max_results).collect();
        Ok(SearchPage { total, issues })
    }
}

/// Write a complete JSON config into `dir` and return its path.
pub fn write_config(dir: &Path, api_url: &str) -> PathBuf {
    let catalog = serde_json::to_value(full_catalog()).expect("catalog json");
    let mut doc = serde_json::json!({
        "api_credentials": {
            "api_url": api_url,
            "api_username": "qa-bot",
            "api_password": "secret"
        },
        "settings": {
            "page_size": 100,
            "timeout_secs": 2,
            "output_dir": dir.join("report")
        }
    });
    if let (Some(target), Some(categories)) = (doc.as_object_mut(), catalog.as_object()) {
        for (name, queries) in categories {
            target.insert(name.clone(), queries.clone());
        }
    }

    let path = dir.join("queries.json");
    std::fs::write(&path, serde_json::to_string_pretty(&doc).expect("config json"))
        .expect("write config");
    path
}
