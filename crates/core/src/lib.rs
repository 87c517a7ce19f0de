//! Core types and shared functionality for crawlgate.
//!
//! This crate provides:
//! - Domain extraction shared by the rule store and the robots cache
//! - Override rule repository backed by pooled SQLite connections
//! - Cache-aside storage for fetched robots.txt bodies
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod migrations;
pub mod rules;

pub use cache::{CacheStore, MemoryCacheStore, OverrideCache, SqliteCacheStore};
pub use config::AppConfig;
pub use domain::TargetUrl;
pub use error::Error;
pub use rules::{ApiKeyStore, KeyStatus, NewRule, Rule, RuleDb, RuleRef, RuleService, RuleStore, SqliteRuleStore};
