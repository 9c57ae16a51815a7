/*!
 * Mock back-end implementations for testing
 *
 * This module provides mock translation back-ends so tests never make
 * external API calls. Each mock implements the TranslationBackend trait,
 * produces deterministic "translations", and tracks every call it
 * receives.
 */

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use cuebatch::errors::ProviderError;
use cuebatch::providers::TranslationBackend;

/// Tracks calls received by a mock back-end
#[derive(Debug, Default)]
pub struct CallTracker {
    /// Single-text calls received
    pub single_calls: usize,
    /// Native batch calls received
    pub batch_calls: usize,
    /// Texts seen by single-text calls, in order
    pub seen_texts: Vec<String>,
}

/// How the mock should misbehave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockFailure {
    /// Behave normally
    #[default]
    None,
    /// Fail every call
    All,
    /// Fail only native batch calls
    NativeBatch,
    /// Return one segment fewer than expected from batch calls
    DropLastSegment,
}

/// Deterministic mock translation back-end
///
/// Translates `text` to `[target] text`; any text containing "FAIL_ME"
/// always fails, which tests use for per-item failure injection.
#[derive(Debug)]
pub struct MockBackend {
    id: String,
    failure: Mutex<MockFailure>,
    tracker: Arc<Mutex<CallTracker>>,
}

impl MockBackend {
    /// Create a well-behaved mock under the given provider id
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            failure: Mutex::new(MockFailure::None),
            tracker: Arc::new(Mutex::new(CallTracker::default())),
        }
    }

    /// Create a mock with a failure mode
    pub fn with_failure(id: &str, failure: MockFailure) -> Self {
        let backend = Self::new(id);
        *backend.failure.lock().unwrap() = failure;
        backend
    }

    /// Shared handle to the call tracker
    pub fn tracker(&self) -> Arc<Mutex<CallTracker>> {
        self.tracker.clone()
    }

    /// Change the failure mode
    pub fn set_failure(&self, failure: MockFailure) {
        *self.failure.lock().unwrap() = failure;
    }

    /// The deterministic translated form of a text
    pub fn translated(text: &str, target: &str) -> String {
        format!("[{}] {}", target, text)
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.single_calls += 1;
            tracker.seen_texts.push(text.to_string());
        }

        if *self.failure.lock().unwrap() == MockFailure::All || text.contains("FAIL_ME") {
            return Err(ProviderError::RequestFailed(format!(
                "mock failure for '{}'",
                text
            )));
        }

        Ok(Self::translated(text, target_language))
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_language: &str,
        target_language: &str,
        delimiter: &str,
    ) -> Result<String, ProviderError> {
        self.tracker.lock().unwrap().batch_calls += 1;

        let failure = *self.failure.lock().unwrap();
        if failure == MockFailure::All || failure == MockFailure::NativeBatch {
            return Err(ProviderError::RequestFailed("mock batch failure".into()));
        }
        if texts.iter().any(|t| t.contains("FAIL_ME")) {
            return Err(ProviderError::RequestFailed(
                "mock batch failure on poisoned item".into(),
            ));
        }

        let mut translated: Vec<String> = texts
            .iter()
            .map(|t| Self::translated(t, target_language))
            .collect();
        if failure == MockFailure::DropLastSegment {
            translated.pop();
        }
        Ok(translated.join(delimiter))
    }
}
