//! In-memory JSON source serving canned documents by URL

use async_trait::async_trait;
use gizz_quiz::services::{FetchError, JsonSource};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

enum Route {
    Json(Value),
    Fail(FetchError),
}

/// Unknown URLs answer with HTTP 404
#[derive(Default)]
pub struct FakeJsonSource {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeJsonSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: impl Into<String>, doc: Value) {
        self.routes.lock().unwrap().insert(url.into(), Route::Json(doc));
    }

    pub fn fail(&self, url: impl Into<String>, error: FetchError) {
        self.routes.lock().unwrap().insert(url.into(), Route::Fail(error));
    }

    /// Delay every response, to hold fetches in flight
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl JsonSource for FakeJsonSource {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.routes.lock().unwrap().get(url) {
            Some(Route::Json(doc)) => Ok(doc.clone()),
            Some(Route::Fail(error)) => Err(error.clone()),
            None => Err(FetchError::Status(404)),
        }
    }
}
