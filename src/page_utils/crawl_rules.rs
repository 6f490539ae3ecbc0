//! Ordered link-following policy.
//!
//! Rules are checked top-down and the first one whose pattern matches (and
//! none of whose deny patterns match) decides what happens to a link. The
//! content rules have to stay ahead of the generic `Team:` rule, otherwise
//! every model and software page would be followed without being emitted.
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageType {
    Model,
    Software,
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageType::Model => write!(f, "Model"),
            PageType::Software => write!(f, "Software"),
        }
    }
}

/// What the crawler does with a discovered link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Fetch only to harvest further links.
    Follow,
    /// Fetch and turn the page into a record of this type. Its links are not
    /// followed.
    FollowAndEmit(PageType),
    /// Never fetched.
    Ignore,
}

#[derive(Debug, Clone)]
pub struct CrawlRule {
    pub url_pattern: Regex,
    pub deny_patterns: Vec<Regex>,
    /// `Some` when matching pages become records.
    pub on_match: Option<PageType>,
}

impl CrawlRule {
    pub fn new(url_pattern: &str, on_match: Option<PageType>) -> Result<Self, regex::Error> {
        Ok(Self {
            url_pattern: Regex::new(url_pattern)?,
            deny_patterns: vec![],
            on_match,
        })
    }

    pub fn deny(mut self, patterns: &[&str]) -> Result<Self, regex::Error> {
        for pattern in patterns {
            self.deny_patterns.push(Regex::new(pattern)?);
        }
        Ok(self)
    }

    pub fn matches(&self, url: &str) -> bool {
        self.url_pattern.is_match(url) && !self.deny_patterns.iter().any(|d| d.is_match(url))
    }

    fn action(&self) -> LinkAction {
        match self.on_match {
            Some(page_type) => LinkAction::FollowAndEmit(page_type),
            None => LinkAction::Follow,
        }
    }
}

/// Pages that trapped the crawler in loops (histories, old revisions, wiki
/// namespaces) or that never hold modelling or software content.
pub const DENY_TOKENS: [&str; 17] = [
    "oldid=",
    "Login",
    "action=history",
    "wiki",
    "Special",
    "Journal",
    "Notebook",
    r"Protocol\w+",
    "Safety",
    "Results",
    "Parts",
    "Description",
    "Judging",
    r"Sustainab\w+",
    "Sponsers",
    "Partnership",
    "Education",
];

static DEFAULT_RULES: Lazy<Vec<CrawlRule>> = Lazy::new(|| {
    vec![
        // Model, Modelling and Modeling
        CrawlRule::new(r"Mode\w+", Some(PageType::Model)).unwrap(),
        // the slash keeps teams with "software" in their name out
        CrawlRule::new("/Software", Some(PageType::Software)).unwrap(),
        CrawlRule::new("Team:", None)
            .and_then(|rule| rule.deny(&DENY_TOKENS))
            .unwrap(),
    ]
});

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CrawlRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
        }
    }
}

impl RuleSet {
    pub fn new(rules: Vec<CrawlRule>) -> Self {
        Self { rules }
    }

    /// First matching rule wins; no match means the link is ignored.
    pub fn evaluate(&self, url: &Url) -> LinkAction {
        let url = url.as_str();
        self.rules
            .iter()
            .find(|rule| rule.matches(url))
            .map_or(LinkAction::Ignore, CrawlRule::action)
    }
}
