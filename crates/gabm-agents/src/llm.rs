//! The LLM collaborator seam.
//!
//! The simulation does not talk to any provider itself. It sees an
//! [`LlmClient`]: send a message and an optional model name, receive text or
//! an error. [`EchoClient`] is the offline stand-in. [`CachedClient`] wraps
//! any client with an injected [`ResponseCache`] that has a fixed capacity,
//! evicts oldest-first, and persists as JSON only when given a path.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::error::LlmError;

/// Something that answers prompts.
pub trait LlmClient {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Send `message`, optionally to a specific `model`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the backend is unavailable or fails.
    fn send(&mut self, message: &str, model: Option<&str>) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// Echo client
// ---------------------------------------------------------------------------

/// Offline client that answers `"Echo: {message}"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoClient;

impl LlmClient for EchoClient {
    fn name(&self) -> &str {
        "echo"
    }

    fn send(&mut self, message: &str, _model: Option<&str>) -> Result<String, LlmError> {
        Ok(format!("Echo: {message}"))
    }
}

// ---------------------------------------------------------------------------
// Response cache
// ---------------------------------------------------------------------------

/// Cache key: model name (empty for the default model) and message.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    /// Model the message was sent to.
    pub model: String,
    /// The prompt.
    pub message: String,
}

impl CacheKey {
    /// Build a key.
    pub fn new(message: &str, model: Option<&str>) -> Self {
        Self {
            model: model.unwrap_or_default().to_owned(),
            message: message.to_owned(),
        }
    }
}

/// One persisted cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CachedResponse {
    key: CacheKey,
    response: String,
}

/// Bounded prompt/response cache with oldest-first eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCache {
    capacity: usize,
    entries: BTreeMap<CacheKey, String>,
    order: VecDeque<CacheKey>,
}

impl ResponseCache {
    /// Create an empty cache holding at most `capacity` entries.
    /// A capacity of zero disables caching.
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: BTreeMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Maximum number of entries.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached response for `key`.
    pub fn get(&self, key: &CacheKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Store a response. Re-inserting a key refreshes its value but keeps
    /// its age. Returns the keys evicted to make room.
    pub fn insert(&mut self, key: CacheKey, response: String) -> Vec<CacheKey> {
        if self.capacity == 0 {
            return Vec::new();
        }
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = response;
            return Vec::new();
        }
        let mut evicted = Vec::new();
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            evicted.push(oldest);
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, response);
        evicted
    }

    /// Load a cache written by [`ResponseCache::save`]. Entries beyond
    /// `capacity` are evicted oldest-first.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::CacheIo`] or [`LlmError::CacheFormat`].
    pub fn load(path: &Path, capacity: usize) -> Result<Self, LlmError> {
        let text = std::fs::read_to_string(path)?;
        let stored: Vec<CachedResponse> = serde_json::from_str(&text)?;
        let mut cache = Self::new(capacity);
        for entry in stored {
            cache.insert(entry.key, entry.response);
        }
        Ok(cache)
    }

    /// Like [`ResponseCache::load`], but a missing or unreadable file gives
    /// an empty cache. Read failures other than a missing file are logged.
    pub fn load_or_empty(path: &Path, capacity: usize) -> Self {
        if !path.exists() {
            return Self::new(capacity);
        }
        Self::load(path, capacity).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "failed to load response cache");
            Self::new(capacity)
        })
    }

    /// Write the cache as JSON, oldest entry first.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::CacheIo`] or [`LlmError::CacheFormat`].
    pub fn save(&self, path: &Path) -> Result<(), LlmError> {
        let stored: Vec<CachedResponse> = self
            .order
            .iter()
            .filter_map(|key| {
                self.entries.get(key).map(|response| CachedResponse {
                    key: key.clone(),
                    response: response.clone(),
                })
            })
            .collect();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Cached client
// ---------------------------------------------------------------------------

/// Wraps a client with a response cache.
#[derive(Debug)]
pub struct CachedClient<C> {
    inner: C,
    cache: ResponseCache,
    path: Option<PathBuf>,
    name: String,
}

impl<C: LlmClient> CachedClient<C> {
    /// Wrap `inner` with an in-memory cache.
    pub fn new(inner: C, cache: ResponseCache) -> Self {
        let name = format!("cached-{}", inner.name());
        Self {
            inner,
            cache,
            path: None,
            name,
        }
    }

    /// Persist the cache to `path` after every miss.
    #[must_use]
    pub fn persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// The cache.
    pub const fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// The wrapped client.
    pub const fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: LlmClient> LlmClient for CachedClient<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, message: &str, model: Option<&str>) -> Result<String, LlmError> {
        let key = CacheKey::new(message, model);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(client = %self.name, model = %key.model, "response cache hit");
            return Ok(hit.to_owned());
        }
        let response = self.inner.send(message, model)?;
        let evicted = self.cache.insert(key, response.clone());
        if !evicted.is_empty() {
            tracing::debug!(client = %self.name, evicted = evicted.len(), "response cache eviction");
        }
        if let Some(path) = self.path.as_deref() {
            self.cache.save(path)?;
        }
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// Agent pass-through
// ---------------------------------------------------------------------------

impl Agent {
    /// Ask `client` about `message` on this agent's behalf.
    ///
    /// Only opinion holders talk to models. Failures are logged and give
    /// `None`, so one unavailable backend does not abort a run.
    pub fn communicate_with_llm(
        &self,
        client: &mut dyn LlmClient,
        message: &str,
        model: Option<&str>,
    ) -> Option<String> {
        if !self.kind().has_opinions() {
            tracing::debug!(agent = %self.id(), kind = %self.kind(), "agent kind does not talk to models");
            return None;
        }
        match client.send(message, model) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(agent = %self.id(), client = client.name(), error = %e, "LLM request failed");
                None
            }
        }
    }
}
