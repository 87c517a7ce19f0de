//! Crawl-permission resolution.
//!
//! Precedence, first match wins:
//! 1. Override rule for the domain (synthetic status 200, carries `blocked`)
//! 2. Cached robots.txt (synthetic status 200)
//! 3. Live robots.txt; a non-2xx answer is a disallow echoing status and body
//!
//! Transport failures are errors, never a disallow. Cache failures only cost
//! a refetch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crawlgate_core::{Error, OverrideCache, RuleStore, TargetUrl};

use crate::evaluate::DirectiveEvaluator;
use crate::fetch::RobotsFetcher;

/// Answer to "may this user agent crawl this URL?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlDecision {
    pub is_allowed: bool,
    /// Set only when an override rule marks its domain as blocked.
    pub blocked: bool,
    pub status_code: u16,
    /// Empty unless the decision carries an upstream or request error.
    pub error: String,
}

impl CrawlDecision {
    /// A disallow carrying `status_code` and an explanation.
    pub fn denied(status_code: u16, error: impl Into<String>) -> Self {
        Self { is_allowed: false, blocked: false, status_code, error: error.into() }
    }
}

#[derive(Clone)]
pub struct Resolver {
    rules: Arc<dyn RuleStore>,
    cache: OverrideCache,
    fetcher: Arc<dyn RobotsFetcher>,
    evaluator: Arc<dyn DirectiveEvaluator>,
}

impl Resolver {
    pub fn new(
        rules: Arc<dyn RuleStore>, cache: OverrideCache, fetcher: Arc<dyn RobotsFetcher>,
        evaluator: Arc<dyn DirectiveEvaluator>,
    ) -> Self {
        Self { rules, cache, fetcher, evaluator }
    }

    /// Decide whether `user_agent` may crawl `url`.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` for an empty user agent or a URL without scheme and host
    /// - `Error::Upstream` when robots.txt cannot be retrieved at all
    /// - store errors from the rule lookup, other than a miss
    pub async fn resolve(&self, url: &str, user_agent: &str) -> Result<CrawlDecision, Error> {
        let user_agent = user_agent.trim();
        if user_agent.is_empty() {
            return Err(Error::Validation("user agent must not be empty".into()));
        }
        let target = TargetUrl::parse(url)?;
        let domain = target.domain();

        match self.rules.get_by_domain(domain).await {
            Ok(rule) if !rule.robots_txt.is_empty() => {
                tracing::debug!(domain, rule_id = rule.id, "using override rule");
                let is_allowed = self.evaluator.is_allowed(&rule.robots_txt, user_agent, target.url());
                return Ok(CrawlDecision { is_allowed, blocked: rule.blocked, status_code: 200, error: String::new() });
            }
            Ok(rule) => tracing::debug!(domain, rule_id = rule.id, "override rule has no text, ignoring"),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                tracing::error!(domain, error = %e, "override lookup failed");
                return Err(e);
            }
        }

        let (body, status_code) = match self.cache.get(domain).await {
            Some(body) => (body, 200),
            None => {
                let fetched = self.fetcher.fetch(&target).await?;
                if !fetched.is_success() {
                    tracing::debug!(domain, status_code = fetched.status_code, "robots.txt unavailable, disallowing");
                    return Ok(CrawlDecision::denied(
                        fetched.status_code,
                        String::from_utf8_lossy(&fetched.body).into_owned(),
                    ));
                }
                if !fetched.body.is_empty() {
                    self.cache.put(domain, fetched.body.clone()).await;
                }
                (fetched.body, fetched.status_code)
            }
        };

        let text = String::from_utf8_lossy(&body);
        let is_allowed = self.evaluator.is_allowed(&text, user_agent, target.url());
        tracing::debug!(domain, user_agent, is_allowed, "crawl permission resolved");

        Ok(CrawlDecision { is_allowed, blocked: false, status_code, error: String::new() })
    }
}
