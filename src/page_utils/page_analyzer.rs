//! Turns one fetched page into the links worth following and, for content
//! pages, a record for the item pipeline.
use super::{extract_links, extract_text, in_scope, sanitize, LinkAction, RuleSet, UrlData};
use crate::error::Result;
use crate::pipeline::PageRecord;
use reqwest::Url;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    pub url: Url,
    pub action: LinkAction,
}

#[derive(Debug)]
pub struct PageAnalysis {
    /// Empty for content pages, they end the crawl path.
    pub links: Vec<DiscoveredLink>,
    /// `None` unless the page was reached through a content rule.
    pub record: Option<Result<PageRecord>>,
}

/// Off-site links and links no rule accepts are left out.
pub fn discover_links(page: &UrlData, rules: &RuleSet, allowed_domain: &str) -> Vec<DiscoveredLink> {
    let base = page.get_url();
    extract_links(page.get_raw_page(), &base)
        .into_iter()
        .filter(|url| in_scope(url, allowed_domain))
        .filter_map(|url| match rules.evaluate(&url) {
            LinkAction::Ignore => {
                trace!("ignoring {url}");
                None
            }
            action => Some(DiscoveredLink { url, action }),
        })
        .collect()
}

/// Sanitizes the page, extracts its text and assembles the record.
pub fn build_record(page: &UrlData, action: LinkAction) -> Option<Result<PageRecord>> {
    let LinkAction::FollowAndEmit(page_type) = action else {
        return None;
    };
    let clean = sanitize(page.get_raw_page());
    let text = extract_text(&clean);
    Some(PageRecord::new(&page.get_url(), page_type, text))
}

pub fn analyze_page(
    page: &UrlData,
    action: LinkAction,
    rules: &RuleSet,
    allowed_domain: &str,
) -> PageAnalysis {
    let links = match action {
        LinkAction::Follow => discover_links(page, rules, allowed_domain),
        _ => Vec::new(),
    };
    PageAnalysis {
        links,
        record: build_record(page, action),
    }
}
