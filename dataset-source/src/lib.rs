use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use bench_core::{Dataset, DatasetError};
use thiserror::Error;
use tracing::debug;

/// Default location of the benchmark document, relative to the page.
pub const DEFAULT_DATASET_PATH: &str = "data/model_data.json";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request for `{path}` failed: {message}")]
    Request { path: String, message: String },
    #[error("request for `{path}` returned HTTP {status}")]
    Status { path: String, status: u16 },
    #[error("dataset at `{path}` is invalid: {source}")]
    Parse {
        path: String,
        #[source]
        source: DatasetError,
    },
    #[error("no dataset at `{0}`")]
    NotFound(String),
}

/// Single-threaded future resolving to a parsed dataset.
pub type DatasetFuture<E> = Pin<Box<dyn Future<Output = Result<Dataset, E>> + 'static>>;

/// Abstract dataset source: the browser implementation lives behind `wasm32`.
pub trait DatasetSource {
    type Error;

    fn fetch(&self, path: &str) -> DatasetFuture<Self::Error>;
}

fn parse_at(path: &str, text: &str) -> Result<Dataset, SourceError> {
    Dataset::from_json(text).map_err(|source| SourceError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Serves documents registered in memory. Used headless and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: HashMap<String, String>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<String>, json: impl Into<String>) -> Self {
        self.insert(path, json);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, json: impl Into<String>) {
        self.documents.insert(path.into(), json.into());
    }
}

impl DatasetSource for StaticSource {
    type Error = SourceError;

    fn fetch(&self, path: &str) -> DatasetFuture<SourceError> {
        let result = match self.documents.get(path) {
            Some(text) => parse_at(path, text),
            None => Err(SourceError::NotFound(path.to_string())),
        };
        Box::pin(async move { result })
    }
}

/// Fetches the document over HTTP with `gloo-net`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpSource;

#[cfg(target_arch = "wasm32")]
impl DatasetSource for HttpSource {
    type Error = SourceError;

    fn fetch(&self, path: &str) -> DatasetFuture<SourceError> {
        use gloo_net::http::Request;

        let path = path.to_string();
        Box::pin(async move {
            let resp = Request::get(&path)
                .send()
                .await
                .map_err(|e| SourceError::Request {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            if !resp.ok() {
                return Err(SourceError::Status {
                    path,
                    status: resp.status(),
                });
            }
            let body = resp.text().await.map_err(|e| SourceError::Request {
                path: path.clone(),
                message: e.to_string(),
            })?;
            parse_at(&path, &body)
        })
    }
}

/// Wraps a source with a per-path cache of parsed datasets.
///
/// The dataset is immutable for the session, so the timeline and both highlight
/// figures can share one fetch. Two loads racing on a cold path both fetch; the
/// first to finish populates the entry.
pub struct CachedSource<S> {
    source: S,
    entries: RefCell<HashMap<String, Rc<Dataset>>>,
}

impl<S: DatasetSource> CachedSource<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub async fn load(&self, path: &str) -> Result<Rc<Dataset>, S::Error> {
        if let Some(hit) = self.entries.borrow().get(path).cloned() {
            debug!(path, "dataset cache hit");
            return Ok(hit);
        }
        let fetched = Rc::new(self.source.fetch(path).await?);
        debug!(path, models = fetched.models.len(), "dataset loaded");
        let entry = self
            .entries
            .borrow_mut()
            .entry(path.to_string())
            .or_insert(fetched)
            .clone();
        Ok(entry)
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.entries.borrow().contains_key(path)
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;

    const DOC: &str = r#"{
        "models": [{
            "id": "m1", "displayName": "M1", "company": "Acme", "type": "Chat",
            "isClosed": true, "releaseDate": "2025-03-01", "avgSuccessRate": 12.0,
            "taskSuccessRates": { "stack": 12 }
        }],
        "humanBaseline": 88.0
    }"#;

    struct CountingSource {
        inner: StaticSource,
        calls: Rc<Cell<usize>>,
    }

    impl DatasetSource for CountingSource {
        type Error = SourceError;

        fn fetch(&self, path: &str) -> DatasetFuture<SourceError> {
            self.calls.set(self.calls.get() + 1);
            self.inner.fetch(path)
        }
    }

    #[test]
    fn static_source_parses_registered_document() {
        let source = StaticSource::new().with_document(DEFAULT_DATASET_PATH, DOC);
        let ds = block_on(source.fetch(DEFAULT_DATASET_PATH)).unwrap();
        assert_eq!(ds.models[0].id, "m1");
        assert_eq!(ds.human_baseline, 88.0);
    }

    #[test]
    fn missing_and_malformed_documents_are_errors() {
        let source = StaticSource::new().with_document("broken.json", "{ \"models\": ");
        assert!(matches!(
            block_on(source.fetch("nowhere.json")),
            Err(SourceError::NotFound(_))
        ));
        match block_on(source.fetch("broken.json")) {
            Err(SourceError::Parse { path, .. }) => assert_eq!(path, "broken.json"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn cache_fetches_each_path_once() {
        let calls = Rc::new(Cell::new(0));
        let cached = CachedSource::new(CountingSource {
            inner: StaticSource::new().with_document(DEFAULT_DATASET_PATH, DOC),
            calls: calls.clone(),
        });

        let a = block_on(cached.load(DEFAULT_DATASET_PATH)).unwrap();
        let b = block_on(cached.load(DEFAULT_DATASET_PATH)).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(calls.get(), 1);
        assert!(cached.is_cached(DEFAULT_DATASET_PATH));
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let calls = Rc::new(Cell::new(0));
        let cached = CachedSource::new(CountingSource {
            inner: StaticSource::new(),
            calls: calls.clone(),
        });
        assert!(block_on(cached.load("data/missing.json")).is_err());
        assert!(block_on(cached.load("data/missing.json")).is_err());
        assert_eq!(calls.get(), 2);
        assert!(!cached.is_cached("data/missing.json"));
    }
}
