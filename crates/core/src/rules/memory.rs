//! In-process rule store.
//!
//! Same contract as [`super::SqliteRuleStore`] without persistence. Counts
//! calls so tests can assert which repository operations ran.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{NewRule, Rule, RuleStore};
use crate::Error;

#[derive(Default)]
struct Rules {
    next_id: i64,
    by_id: BTreeMap<i64, Rule>,
}

#[derive(Default)]
struct Calls {
    lookups: AtomicUsize,
    updates: AtomicUsize,
}

/// Rule store kept in memory.
#[derive(Clone, Default)]
pub struct MemoryRuleStore {
    rules: Arc<RwLock<Rules>>,
    calls: Arc<Calls>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get_by_domain`/`get_by_id` calls so far.
    pub fn lookup_calls(&self) -> usize {
        self.calls.lookups.load(Ordering::SeqCst)
    }

    /// Number of `update` calls so far.
    pub fn update_calls(&self) -> usize {
        self.calls.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn get_by_domain(&self, domain: &str) -> Result<Rule, Error> {
        self.calls.lookups.fetch_add(1, Ordering::SeqCst);
        let rules = self.rules.read().await;
        rules
            .by_id
            .values()
            .find(|rule| rule.domain == domain)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("rule for domain '{domain}' not found")))
    }

    async fn get_by_id(&self, id: i64) -> Result<Rule, Error> {
        self.calls.lookups.fetch_add(1, Ordering::SeqCst);
        let rules = self.rules.read().await;
        rules.by_id.get(&id).cloned().ok_or_else(|| Error::NotFound(format!("rule with id '{id}' not found")))
    }

    async fn create(&self, rule: NewRule) -> Result<i64, Error> {
        let mut rules = self.rules.write().await;
        if rules.by_id.values().any(|existing| existing.domain == rule.domain) {
            return Err(Error::Conflict(format!("rule for domain '{}' already exists", rule.domain)));
        }

        rules.next_id += 1;
        let id = rules.next_id;
        let now = Utc::now();
        rules.by_id.insert(
            id,
            Rule {
                id,
                domain: rule.domain,
                blocked: rule.blocked,
                robots_txt: rule.robots_txt,
                version: 1,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update(&self, rule: &Rule) -> Result<Rule, Error> {
        self.calls.updates.fetch_add(1, Ordering::SeqCst);
        let mut rules = self.rules.write().await;
        let stored = rules
            .by_id
            .get_mut(&rule.id)
            .ok_or_else(|| Error::NotFound(format!("rule with id '{}' not found", rule.id)))?;

        if stored.version != rule.version {
            return Err(Error::Conflict(format!(
                "rule with id '{}' was modified concurrently (expected version {}, found {})",
                rule.id, rule.version, stored.version
            )));
        }

        stored.domain.clone_from(&rule.domain);
        stored.robots_txt.clone_from(&rule.robots_txt);
        stored.blocked = rule.blocked;
        stored.version += 1;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), Error> {
        self.rules.write().await.by_id.remove(&id);
        Ok(())
    }
}
