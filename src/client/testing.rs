//! In-memory upstream for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiError, ApiRequest, Upstream};

/// Serves canned `data` values keyed by path (and page number, for paged
/// routes) and records every request it sees. Unknown routes answer 404.
#[derive(Default)]
pub struct FakeUpstream {
    routes: HashMap<String, Value>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, data: Value) -> Self {
        self.routes.insert(path.to_string(), data);
        self
    }

    pub fn with_page(mut self, path: &str, page: u32, data: Value) -> Self {
        self.routes.insert(format!("{path}#{page}"), data);
        self
    }

    /// Make `path` answer with an upstream envelope error.
    pub fn failing(mut self, path: &str, message: &str) -> Self {
        self.failures.insert(path.to_string(), message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn get(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(message) = self.failures.get(&request.path) {
            return Err(ApiError::Upstream {
                code: "500".to_string(),
                message: message.clone(),
            });
        }

        let key = match request.query.get("page-number") {
            Some(page) => format!("{}#{}", request.path, page),
            None => request.path.clone(),
        };
        self.routes
            .get(&key)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 404,
                message: format!("no route for {key}"),
            })
    }
}
