use chrono::{DateTime, Duration, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::config::DEFAULT_IDEMPOTENCY_TTL_SECS;
use crate::errors::{EngineError, Result};
use crate::types::TenantId;

/// request verb, as seen by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// only create/update/replace-style verbs are guarded; reads bypass,
    /// and deletes are explicit-id destructive calls that carry no key
    pub fn is_guarded(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

/// transport-level response the guard caches and replays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    /// serialize a value into a response body
    pub fn json<T: Serialize>(status: u16, value: &T) -> Result<Self> {
        let body = serde_json::to_string(value).map_err(|e| EngineError::Serialization {
            message: e.to_string(),
        })?;
        Ok(Self { status, body })
    }
}

/// execution context for one guarded call
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub tenant: Option<TenantId>,
    pub method: HttpMethod,
    pub path: String,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    tenant: TenantId,
    key: String,
    method: HttpMethod,
    path: String,
}

/// cached outcome of a successfully executed guarded call
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub status: u16,
    pub body: String,
    pub expires_at: DateTime<Utc>,
}

/// request-level idempotency guard for mutating operations
///
/// Composes around a handler as a plain higher-order function: the wrapped
/// operation runs at most once per (tenant, key, method, path) within the
/// TTL, and retries replay the stored response verbatim. Errors are never
/// cached, so a failed attempt stays retryable under the same key. The
/// entry map is checked and populated under one lock held across the
/// wrapped call, so two concurrent identical retries cannot both execute;
/// wrapped operations are short in-memory transactions.
#[derive(Debug)]
pub struct IdempotencyGuard {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl Default for IdempotencyGuard {
    fn default() -> Self {
        Self::new(DEFAULT_IDEMPOTENCY_TTL_SECS)
    }
}

impl IdempotencyGuard {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// run `next` under the idempotency contract
    pub fn execute<F>(
        &self,
        ctx: &RequestContext,
        time: &SafeTimeProvider,
        next: F,
    ) -> Result<Response>
    where
        F: FnOnce() -> Result<Response>,
    {
        if !ctx.method.is_guarded() {
            return next();
        }

        // without a tenant there is no safe cache partition
        let Some(tenant) = ctx.tenant else {
            debug!(path = %ctx.path, "unauthenticated request bypasses idempotency guard");
            return next();
        };

        let Some(key) = ctx.idempotency_key.clone() else {
            return Err(EngineError::MissingIdempotencyKey);
        };

        let cache_key = CacheKey {
            tenant,
            key,
            method: ctx.method,
            path: ctx.path.clone(),
        };

        let now = time.now();
        let mut entries = self.entries.lock().expect("idempotency cache lock poisoned");

        if let Some(entry) = entries.get(&cache_key) {
            if entry.expires_at > now {
                debug!(path = %ctx.path, "idempotent replay, skipping execution");
                return Ok(Response {
                    status: entry.status,
                    body: entry.body.clone(),
                });
            }
            // expired entries are treated as absent
            entries.remove(&cache_key);
        }

        let response = next()?;
        entries.insert(
            cache_key,
            CacheEntry {
                status: response.status,
                body: response.body.clone(),
                expires_at: now + self.ttl,
            },
        );

        Ok(response)
    }

    /// drop expired entries, returning how many were removed
    pub fn purge_expired(&self, time: &SafeTimeProvider) -> usize {
        let now = time.now();
        let mut entries = self.entries.lock().expect("idempotency cache lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("idempotency cache lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
