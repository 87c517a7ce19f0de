//! Rule management as exposed to operators.
//!
//! Inputs are validated before any repository call. Updates read the current
//! row first and skip the write entirely when nothing would change.

use std::sync::Arc;

use super::{NewRule, Rule, RuleRef, RuleStore};
use crate::Error;
use crate::domain::domain_of;

#[derive(Clone)]
pub struct RuleService {
    store: Arc<dyn RuleStore>,
}

fn require_text(robots_txt: &str) -> Result<(), Error> {
    if robots_txt.is_empty() {
        return Err(Error::Validation("robots.txt body must not be empty".into()));
    }
    Ok(())
}

impl RuleService {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, rule: &RuleRef) -> Result<Rule, Error> {
        match rule {
            RuleRef::Id(id) => self.store.get_by_id(*id).await,
            RuleRef::Url(url) => self.store.get_by_domain(&domain_of(url)?).await,
        }
    }

    /// Store an override for the domain of `url` and return its id.
    pub async fn create(&self, url: &str, robots_txt: String, blocked: bool) -> Result<i64, Error> {
        let domain = domain_of(url)?;
        require_text(&robots_txt)?;

        let id = self.store.create(NewRule { domain: domain.clone(), robots_txt, blocked }).await?;
        tracing::info!(id, %domain, blocked, "override rule created");
        Ok(id)
    }

    /// Replace the text and blocked flag of an existing rule.
    ///
    /// Returns the current rule untouched when both values already match.
    pub async fn update(&self, rule: &RuleRef, robots_txt: String, blocked: bool) -> Result<Rule, Error> {
        require_text(&robots_txt)?;

        let mut current = self.get(rule).await?;
        if current.robots_txt == robots_txt && current.blocked == blocked {
            tracing::debug!(id = current.id, "override rule unchanged, skipping write");
            return Ok(current);
        }

        current.robots_txt = robots_txt;
        current.blocked = blocked;
        let updated = self.store.update(&current).await?;
        tracing::info!(id = updated.id, domain = %updated.domain, version = updated.version, "override rule updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        self.store.delete(id).await?;
        tracing::info!(id, "override rule deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::MemoryRuleStore;

    fn service() -> (RuleService, MemoryRuleStore) {
        let store = MemoryRuleStore::new();
        (RuleService::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_create_keys_rule_by_hostname() {
        let (service, store) = service();
        let id = service
            .create("https://Example.com/some/path?q=1", "User-agent: *\nDisallow: /".into(), false)
            .await
            .unwrap();

        let rule = store.get_by_domain("example.com").await.unwrap();
        assert_eq!(rule.id, id);

        let by_url = service.get(&RuleRef::Url("http://example.com/other".into())).await.unwrap();
        assert_eq!(by_url.id, id);
    }

    #[tokio::test]
    async fn test_create_validates_before_io() {
        let (service, store) = service();
        assert!(matches!(service.create("not a url", "x".into(), false).await, Err(Error::Validation(_))));
        assert!(matches!(service.create("https://example.com", String::new(), false).await, Err(Error::Validation(_))));
        assert!(store.get_by_domain("example.com").await.is_err());
    }

    #[tokio::test]
    async fn test_whitespace_only_text_is_stored() {
        let (service, store) = service();
        let id = service.create("https://example.com", "\n".into(), false).await.unwrap();
        assert_eq!(store.get_by_domain("example.com").await.unwrap().robots_txt, "\n");

        let rule = service.update(&RuleRef::Id(id), " ".into(), true).await.unwrap();
        assert_eq!(rule.robots_txt, " ");
    }

    #[tokio::test]
    async fn test_update_unchanged_skips_write() {
        let (service, store) = service();
        let id = service.create("https://example.com", "User-agent: *".into(), true).await.unwrap();

        let rule = service.update(&RuleRef::Id(id), "User-agent: *".into(), true).await.unwrap();
        assert_eq!(rule.version, 1);
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_update_changed_blocked_writes() {
        let (service, store) = service();
        let id = service.create("https://example.com", "User-agent: *".into(), false).await.unwrap();

        let rule = service.update(&RuleRef::Url("https://example.com/x".into()), "User-agent: *".into(), true).await.unwrap();
        assert!(rule.blocked);
        assert_eq!(rule.id, id);
        assert_eq!(rule.version, 2);
        assert_eq!(store.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_rule() {
        let (service, store) = service();
        let result = service.update(&RuleRef::Id(9), "x".into(), false).await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_twice_succeeds() {
        let (service, _) = service();
        let id = service.create("https://example.com", "x".into(), false).await.unwrap();
        service.delete(id).await.unwrap();
        service.delete(id).await.unwrap();
        assert!(service.get(&RuleRef::Id(id)).await.unwrap_err().is_not_found());
    }
}
