//! Request classification: maps an outgoing request onto the caching
//! strategy that will handle it.
//!
//! Classification is an explicit ordered list of `(predicate, strategy)`
//! rules evaluated first-match-wins, with a fallback strategy so every
//! request maps to exactly one strategy. The default ruleset mirrors how
//! offline-capable web clients behave: non-GET traffic bypasses the cache,
//! API reads go network-first, static assets cache-first, and everything
//! else is served stale-while-revalidate.
//!
//! # Examples
//!
//! ```
//! use offsync_router::{Strategy, StrategyRouter};
//! use offsync_store::Method;
//! use url::Url;
//!
//! let router = StrategyRouter::default();
//! let url = Url::parse("https://app.example.com/api/transactions").unwrap();
//! assert_eq!(router.classify(Method::Get, &url), Strategy::NetworkFirst);
//! ```

pub use regex::Regex;
pub use url;
use serde::{Deserialize, Serialize};
use url::Url;

use offsync_store::Method;

/// File extensions treated as static assets by the default ruleset.
pub const DEFAULT_STATIC_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".woff", ".woff2",
];

/// Default API namespace prefix.
pub const DEFAULT_API_PREFIX: &str = "/api/";

/// Caching policy applied to a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Serve from cache; network only on a miss.
    CacheFirst,
    /// Try the network; fall back to cache when offline.
    NetworkFirst,
    /// Serve from cache immediately, refresh in the background.
    StaleWhileRevalidate,
    /// Never served from cache; failed mutations may be queued for replay.
    Bypass,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
            Strategy::Bypass => "bypass",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    /// Any method other than GET.
    NonGet,
    /// URL path starts with the prefix.
    PathPrefix(String),
    /// URL path ends with one of the extensions.
    PathExtension(Vec<String>),
    /// URL path matches the pattern.
    PathRegex(Regex),
}

/// One classification rule: requests matching the predicate get the rule's
/// strategy.
#[derive(Debug, Clone)]
pub struct Rule {
    predicate: Predicate,
    strategy: Strategy,
}

impl Rule {
    pub fn non_get(strategy: Strategy) -> Self {
        Self {
            predicate: Predicate::NonGet,
            strategy,
        }
    }

    pub fn path_prefix(prefix: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            predicate: Predicate::PathPrefix(prefix.into()),
            strategy,
        }
    }

    pub fn path_extension<S: AsRef<str>>(
        extensions: &[S],
        strategy: Strategy,
    ) -> Self {
        Self {
            predicate: Predicate::PathExtension(
                extensions.iter().map(|e| e.as_ref().to_string()).collect(),
            ),
            strategy,
        }
    }

    pub fn path_regex(
        pattern: &str,
        strategy: Strategy,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            predicate: Predicate::PathRegex(Regex::new(pattern)?),
            strategy,
        })
    }

    fn matches(&self, method: Method, url: &Url) -> bool {
        match &self.predicate {
            Predicate::NonGet => method != Method::Get,
            Predicate::PathPrefix(prefix) => url.path().starts_with(prefix),
            Predicate::PathExtension(extensions) => {
                extensions.iter().any(|ext| url.path().ends_with(ext.as_str()))
            }
            Predicate::PathRegex(pattern) => pattern.is_match(url.path()),
        }
    }
}

/// Ordered rule list with a fallback; classification is total.
#[derive(Debug, Clone)]
pub struct StrategyRouter {
    rules: Vec<Rule>,
    fallback: Strategy,
}

impl StrategyRouter {
    /// Empty router; every request gets the fallback strategy.
    pub fn new(fallback: Strategy) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Append a rule. Rules are evaluated in insertion order.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// The standard ruleset:
    /// 1. non-GET -> `Bypass`
    /// 2. API namespace -> `NetworkFirst`
    /// 3. static asset extension -> `CacheFirst`
    /// 4. everything else -> `StaleWhileRevalidate`
    pub fn standard<S: AsRef<str>>(
        api_prefix: &str,
        static_extensions: &[S],
    ) -> Self {
        Self::new(Strategy::StaleWhileRevalidate)
            .with_rule(Rule::non_get(Strategy::Bypass))
            .with_rule(Rule::path_prefix(api_prefix, Strategy::NetworkFirst))
            .with_rule(Rule::path_extension(
                static_extensions,
                Strategy::CacheFirst,
            ))
    }

    /// First matching rule wins; otherwise the fallback applies.
    pub fn classify(&self, method: Method, url: &Url) -> Strategy {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, url))
            .map(|rule| rule.strategy)
            .unwrap_or(self.fallback)
    }
}

impl Default for StrategyRouter {
    fn default() -> Self {
        Self::standard(DEFAULT_API_PREFIX, DEFAULT_STATIC_EXTENSIONS)
    }
}
