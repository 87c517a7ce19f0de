//! Override rules: operator-supplied robots.txt text keyed by domain.
//!
//! - [`RuleStore`]: repository capability, implemented by [`SqliteRuleStore`]
//!   and the in-process [`MemoryRuleStore`]
//! - [`RuleService`]: validation and read-compare-write updates on top of a store
//! - [`ApiKeyStore`]: hashed API keys guarding rule management
//! - [`RuleDb`]: pooled connections to the rule database

pub mod api_keys;
pub mod memory;
pub mod pool;
pub mod repository;
pub mod service;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

pub use api_keys::{ApiKeyStore, KeyStatus};
pub use memory::MemoryRuleStore;
pub use pool::RuleDb;
pub use repository::SqliteRuleStore;
pub use service::RuleService;

/// A stored override rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: i64,
    /// Lowercase hostname the rule applies to.
    pub domain: String,
    pub blocked: bool,
    pub robots_txt: String,
    /// Optimistic concurrency token, bumped by every update.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for [`RuleStore::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRule {
    pub domain: String,
    pub robots_txt: String,
    pub blocked: bool,
}

/// How a caller addresses an existing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleRef {
    Id(i64),
    /// Any URL on the rule's domain.
    Url(String),
}

/// Persistence of override rules.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn get_by_domain(&self, domain: &str) -> Result<Rule, Error>;

    async fn get_by_id(&self, id: i64) -> Result<Rule, Error>;

    /// Insert a rule and return its id. A second rule for the same domain is a conflict.
    async fn create(&self, rule: NewRule) -> Result<i64, Error>;

    /// Write `rule` if its `version` is still current and return the stored row.
    async fn update(&self, rule: &Rule) -> Result<Rule, Error>;

    /// Remove a rule. Deleting a missing id succeeds.
    async fn delete(&self, id: i64) -> Result<(), Error>;
}
