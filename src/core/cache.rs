//! Product state cache
//!
//! This module provides the [`ProductStateCache`], the read/write gateway to
//! the cache store, and [`InMemoryCacheStore`], a DashMap-backed store usable
//! in-process and in tests.
//!
//! # Design
//!
//! The cache is caller-orchestrated (cache-aside): a `get` miss makes the
//! caller fetch from the source of truth and `put` the result back before
//! proceeding. The cache never fetches on its own and never invalidates
//! itself; entries persist until overwritten by a fresher read, a committed
//! settlement, or an external product-change notification.
//!
//! # Failure handling
//!
//! The remote source of truth is always authoritative, so the cache is never
//! allowed to fail a settlement:
//! - any store error on `get` degrades to a miss,
//! - a fixed per-read timeout bounds cache latency and also degrades to a
//!   miss,
//! - store errors on `put` are logged and swallowed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::warn;

use crate::config::CacheConfig;
use crate::core::traits::CacheStore;
use crate::types::{Account, Credit, CreditCard, ProductKind, ProductSnapshot, SettlementError};

/// Read-through/write-through gateway to the cache store
///
/// Wraps an injected [`CacheStore`] with the timeout and degradation policy
/// described in the module docs, and exposes typed accessors so callers get
/// back concrete snapshots instead of the [`ProductSnapshot`] enum. An entry
/// stored under one kind is invisible to lookups of another kind.
pub struct ProductStateCache {
    store: Arc<dyn CacheStore>,
    read_timeout: Duration,
}

impl ProductStateCache {
    /// Create a cache gateway over the given store
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            read_timeout: config.read_timeout(),
        }
    }

    /// Look up a snapshot, degrading every failure mode to a miss
    ///
    /// Returns `None` on a true miss, on a store error, on a read timeout,
    /// or when the stored entry is of a different kind than requested.
    pub async fn get(&self, kind: ProductKind, id: &str) -> Option<ProductSnapshot> {
        let lookup = self.store.get(kind, id);
        match tokio::time::timeout(self.read_timeout, lookup).await {
            Ok(Ok(Some(snapshot))) if snapshot.kind() == kind => Some(snapshot),
            Ok(Ok(Some(snapshot))) => {
                warn!(
                    ?kind,
                    id,
                    found = ?snapshot.kind(),
                    "cache entry has unexpected kind, treating as miss"
                );
                None
            }
            Ok(Ok(None)) => None,
            Ok(Err(error)) => {
                warn!(?kind, id, %error, "cache read failed, treating as miss");
                None
            }
            Err(_) => {
                warn!(?kind, id, timeout = ?self.read_timeout, "cache read timed out, treating as miss");
                None
            }
        }
    }

    /// Store a snapshot under its own kind and id
    ///
    /// Write failures are logged and swallowed: a cache that cannot be
    /// written must not fail a settlement.
    pub async fn put(&self, snapshot: ProductSnapshot) {
        let kind = snapshot.kind();
        let id = snapshot.id().to_string();
        if let Err(error) = self.store.put(kind, &id, snapshot).await {
            warn!(?kind, id, %error, "cache write failed, entry dropped");
        }
    }

    /// Look up an account snapshot
    pub async fn get_account(&self, id: &str) -> Option<Account> {
        match self.get(ProductKind::Account, id).await {
            Some(ProductSnapshot::Account(account)) => Some(account),
            _ => None,
        }
    }

    /// Look up a credit snapshot
    pub async fn get_credit(&self, id: &str) -> Option<Credit> {
        match self.get(ProductKind::Credit, id).await {
            Some(ProductSnapshot::Credit(credit)) => Some(credit),
            _ => None,
        }
    }

    /// Look up a credit-card snapshot
    pub async fn get_credit_card(&self, id: &str) -> Option<CreditCard> {
        match self.get(ProductKind::CreditCard, id).await {
            Some(ProductSnapshot::CreditCard(card)) => Some(card),
            _ => None,
        }
    }
}

/// In-memory cache store backed by a concurrent map
///
/// Entries are keyed by (kind, id), so the same id can exist independently
/// under different product kinds. There is no TTL and no capacity bound;
/// entries persist until overwritten (last write wins), matching the cache
/// contract. Safe to share across settlement pipelines and the
/// product-change handler without further coordination.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: DashMap<(ProductKind, String), ProductSnapshot>,
}

impl InMemoryCacheStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(
        &self,
        kind: ProductKind,
        id: &str,
    ) -> Result<Option<ProductSnapshot>, SettlementError> {
        Ok(self
            .entries
            .get(&(kind, id.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn put(
        &self,
        kind: ProductKind,
        id: &str,
        snapshot: ProductSnapshot,
    ) -> Result<(), SettlementError> {
        self.entries.insert((kind, id.to_string()), snapshot);
        Ok(())
    }
}
