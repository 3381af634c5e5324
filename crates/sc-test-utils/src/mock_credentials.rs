//! Mock credential source.

use async_trait::async_trait;
use session_controller::{Credential, CredentialSource, TokenFetchError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Server URL in credentials minted by [`MockCredentialSource`].
pub const MOCK_SERVER_URL: &str = "wss://media.mock";

/// Mock credential source.
///
/// Mints `token-<n>` credentials by default; scripted responses are
/// consumed in order. A gated instance holds every fetch until
/// [`release`](Self::release).
pub struct MockCredentialSource {
    responses: Mutex<VecDeque<Result<Credential, TokenFetchError>>>,
    gate: Option<Arc<Semaphore>>,
    fetches: AtomicUsize,
    last_request: Mutex<Option<(String, String)>>,
}

impl Default for MockCredentialSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCredentialSource {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            gate: None,
            fetches: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    /// Queue the response to a future fetch.
    pub fn push_response(&self, response: Result<Credential, TokenFetchError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Let `n` gated fetches proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Number of fetches started.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// `(room, username)` of the most recent fetch.
    pub fn last_request(&self) -> Option<(String, String)> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialSource for MockCredentialSource {
    async fn fetch(&self, room: &str, username: &str) -> Result<Credential, TokenFetchError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_request.lock().unwrap() = Some((room.to_string(), username.to_string()));

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Credential::new(format!("token-{n}"), MOCK_SERVER_URL)))
    }
}
