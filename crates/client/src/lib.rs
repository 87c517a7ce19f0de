//! Crawl-permission resolution for crawlgate.
//!
//! This crate provides the live robots.txt fetcher, directive evaluation
//! and the resolver that combines them with override rules and the robots
//! cache from `crawlgate-core`.

pub mod evaluate;
pub mod fetch;
pub mod resolve;

pub use evaluate::{DirectiveEvaluator, RobotstxtEvaluator};
pub use fetch::{FetchClient, FetchResult, RobotsFetcher};
pub use resolve::{CrawlDecision, Resolver};
