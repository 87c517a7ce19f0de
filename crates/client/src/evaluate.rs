//! robots.txt directive evaluation.

use robotstxt_rs::RobotsTxt;
use url::{Position, Url};

/// Decides whether `user_agent` may fetch `url` under the given robots.txt text.
pub trait DirectiveEvaluator: Send + Sync {
    fn is_allowed(&self, robots_txt: &str, user_agent: &str, url: &Url) -> bool;
}

/// Evaluator backed by `robotstxt-rs`.
///
/// Matches against the path and query of `url`; the host is already fixed
/// by whichever robots.txt was selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct RobotstxtEvaluator;

impl DirectiveEvaluator for RobotstxtEvaluator {
    fn is_allowed(&self, robots_txt: &str, user_agent: &str, url: &Url) -> bool {
        let robots = RobotsTxt::parse(robots_txt);
        let path = &url[Position::BeforePath..];
        let allowed = robots.can_fetch(user_agent, path);
        tracing::trace!(user_agent, path, allowed, "evaluated robots.txt");
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(robots_txt: &str, user_agent: &str, url: &str) -> bool {
        RobotstxtEvaluator.is_allowed(robots_txt, user_agent, &Url::parse(url).unwrap())
    }

    #[test]
    fn test_allow_rule() {
        assert!(allowed("User-agent: *\nAllow: /test", "bot", "https://example.com/test"));
    }

    #[test]
    fn test_disallow_rule() {
        assert!(!allowed("User-agent: *\nDisallow: /test", "bot", "https://example.com/test"));
    }

    #[test]
    fn test_disallow_does_not_cover_other_paths() {
        assert!(allowed("User-agent: *\nDisallow: /private", "bot", "https://example.com/public"));
    }

    #[test]
    fn test_empty_file_allows_everything() {
        assert!(allowed("", "bot", "https://example.com/anything"));
    }
}
