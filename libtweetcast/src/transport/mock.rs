//! Mock transport for testing
//!
//! A configurable in-memory transport that records every call and can be told
//! to fail uploads, posts or searches. Clones share the same recorded state,
//! so a test can hand one clone to a `PostingClient` and inspect the other.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::TransportError;
use crate::transport::{
    MediaUploadApi, PostPayload, PostResponse, SearchQuery, SearchResponse, TweetData, TweetsApi,
    UploadParams,
};

/// Configuration for mock transport behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Error returned by every upload
    pub upload_error: Option<TransportError>,

    /// Fail only the upload with this 1-based call number
    pub fail_upload_on: Option<usize>,

    /// Error returned by every post
    pub post_error: Option<TransportError>,

    /// Error returned by every search
    pub search_error: Option<TransportError>,

    /// Tweets returned by search; `None` answers with no `data` field
    pub search_results: Option<Vec<TweetData>>,

    /// Delay before completing operations (simulates network latency)
    pub delay: Duration,
}

/// A recorded upload call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub bytes: Vec<u8>,
    pub params: UploadParams,
}

/// A recorded call of any kind, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upload(RecordedUpload),
    Post(PostPayload),
    Search(SearchQuery),
}

#[derive(Debug, Default)]
struct MockState {
    calls: Mutex<Vec<Call>>,
    upload_count: AtomicUsize,
    post_count: AtomicUsize,
}

/// Mock transport implementing both capability traits
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    config: MockConfig,
    state: Arc<MockState>,
}

impl MockTransport {
    /// Create a mock transport that always succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock transport with the given configuration
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            state: Arc::default(),
        }
    }

    /// Create a mock transport whose uploads fail
    pub fn upload_failure(error: TransportError) -> Self {
        Self::with_config(MockConfig {
            upload_error: Some(error),
            ..Default::default()
        })
    }

    /// Create a mock transport whose posts fail
    pub fn post_failure(error: TransportError) -> Self {
        Self::with_config(MockConfig {
            post_error: Some(error),
            ..Default::default()
        })
    }

    /// Create a mock transport answering searches with the given tweets
    pub fn with_search_results(results: Vec<TweetData>) -> Self {
        Self::with_config(MockConfig {
            search_results: Some(results),
            ..Default::default()
        })
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.state.calls).clone()
    }

    /// Upload calls made so far, in order
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Upload(upload) => Some(upload),
                _ => None,
            })
            .collect()
    }

    /// Post payloads sent so far, in order
    pub fn posts(&self) -> Vec<PostPayload> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Post(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }

    /// Search queries sent so far, in order
    pub fn searches(&self) -> Vec<SearchQuery> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Search(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    pub fn upload_call_count(&self) -> usize {
        self.state.upload_count.load(Ordering::SeqCst)
    }

    pub fn post_call_count(&self) -> usize {
        self.state.post_count.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        lock(&self.state.calls).push(call);
    }

    async fn simulate_latency(&self) {
        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }
    }
}

#[async_trait]
impl MediaUploadApi for MockTransport {
    async fn upload(&self, bytes: &[u8], params: UploadParams) -> Result<String, TransportError> {
        let call_number = self.state.upload_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(Call::Upload(RecordedUpload {
            bytes: bytes.to_vec(),
            params,
        }));

        self.simulate_latency().await;

        if let Some(error) = &self.config.upload_error {
            return Err(error.clone());
        }
        if self.config.fail_upload_on == Some(call_number) {
            return Err(TransportError::new(format!(
                "Mock upload {} failed",
                call_number
            )));
        }

        Ok(format!("media-{}", call_number))
    }
}

#[async_trait]
impl TweetsApi for MockTransport {
    async fn post(&self, payload: &PostPayload) -> Result<PostResponse, TransportError> {
        self.state.post_count.fetch_add(1, Ordering::SeqCst);
        self.record(Call::Post(payload.clone()));

        self.simulate_latency().await;

        if let Some(error) = &self.config.post_error {
            return Err(error.clone());
        }

        // Real responses carry more than id and text
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut data = TweetData::new(id.clone(), payload.text.clone());
        data.extra.insert(
            "edit_history_tweet_ids".to_string(),
            serde_json::json!([id]),
        );

        Ok(PostResponse { data })
    }

    async fn search_recent(&self, query: &SearchQuery) -> Result<SearchResponse, TransportError> {
        self.record(Call::Search(query.clone()));

        self.simulate_latency().await;

        if let Some(error) = &self.config.search_error {
            return Err(error.clone());
        }

        Ok(SearchResponse {
            data: self.config.search_results.clone(),
            meta: None,
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
