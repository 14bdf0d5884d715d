//! Shared fixtures for integration tests.

pub mod chain_test;
pub mod http_test;
pub mod path_properties_test;

use reqcap::executor::{HttpExecutor, RequestError};
use reqcap::models::{HttpRequest, HttpResponse};
use serde_json::json;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Executor that records every request and answers from a queue.
///
/// Once the queue is empty every request gets `200 {}`.
#[derive(Default)]
pub struct RecordingExecutor {
    pub requests: RefCell<Vec<HttpRequest>>,
    responses: RefCell<Vec<Result<HttpResponse, RequestError>>>,
}

impl RecordingExecutor {
    pub fn respond(self, status: u16, body: serde_json::Value) -> Self {
        self.responses
            .borrow_mut()
            .push(Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn fail(self, error: RequestError) -> Self {
        self.responses.borrow_mut().push(Err(error));
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|r| r.url.clone()).collect()
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl HttpExecutor for RecordingExecutor {
    fn execute(&self, request: &HttpRequest, _timeout: Duration) -> Result<HttpResponse, RequestError> {
        self.requests.borrow_mut().push(request.clone());
        let mut queue = self.responses.borrow_mut();
        if queue.is_empty() {
            Ok(HttpResponse::new(200, json!({})))
        } else {
            queue.remove(0)
        }
    }
}

/// Writes `templates/<name>.yaml` under `root`.
pub fn write_template(root: &Path, name: &str, yaml: &str) {
    let dir = root.join("templates");
    fs::create_dir_all(&dir).expect("Failed to create templates dir");
    fs::write(dir.join(format!("{}.yaml", name)), yaml).expect("Failed to write template");
}
