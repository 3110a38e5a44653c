//! In-memory per-alias token and request counters
//!
//! The ledger is constructed once at startup and shared by handle with every
//! handler. Counters live for the lifetime of the process.

#![allow(clippy::must_use_candidate)]

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use ollagate_core::Alias;
use serde::Serialize;

/// Aggregated usage for one alias
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub embedding_tokens: u64,
    /// Chat and responses requests
    pub total_requests: u64,
    pub embedding_requests: u64,
}

/// Point-in-time copy of every alias' counters
pub type UsageSnapshot = HashMap<String, UsageRecord>;

/// Shared usage store
///
/// Cloning yields another handle onto the same counters. All writers take
/// the map-wide write lock, so a snapshot never observes half of an update.
#[derive(Debug, Clone, Default)]
pub struct UsageLedger {
    records: Arc<RwLock<HashMap<String, UsageRecord>>>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completion request for `alias`
    pub fn record_completion(&self, alias: &Alias, prompt_tokens: u64, completion_tokens: u64) {
        self.update(alias, |record| {
            record.prompt_tokens += prompt_tokens;
            record.completion_tokens += completion_tokens;
            record.total_requests += 1;
        });
    }

    /// Count one embedding request for `alias`
    pub fn record_embedding(&self, alias: &Alias, tokens: u64) {
        self.update(alias, |record| {
            record.embedding_tokens += tokens;
            record.embedding_requests += 1;
        });
    }

    /// Deep copy of all records
    pub fn snapshot(&self) -> UsageSnapshot {
        self.records.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Counters for a single alias, if it has been seen
    pub fn get(&self, alias: &Alias) -> Option<UsageRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(alias.as_str())
            .copied()
    }

    /// Drop every record
    pub fn reset(&self) {
        self.records.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn update(&self, alias: &Alias, apply: impl FnOnce(&mut UsageRecord)) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        apply(records.entry(alias.as_str().to_owned()).or_default());
    }
}
