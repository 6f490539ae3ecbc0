//! url helpers: parsing, scope checks, and deriving team name and year from wiki urls.
use crate::error::{CrawlError, Result};
use num_cpus::get as get_logical;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use std::sync::Arc;

pub static CPU_NUMBER: Lazy<usize> = Lazy::new(get_logical);

static TEAM_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"Team:(.+?)/").unwrap());
static YEAR_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//(.+?)\.igem").unwrap());

pub fn valid_url_format(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)?;
    Ok(parsed)
}

/// Resolves an `href` against the page it was found on.
///
/// Only http(s) links survive, and the fragment is dropped so `#section`
/// anchors of one page collapse into a single frontier entry.
pub fn normalize_link(base: &Url, href: &str) -> Option<Url> {
    let mut url = base.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// True when the url's host is `domain` itself or one of its subdomains.
pub fn in_scope(url: &Url, domain: &str) -> bool {
    match url.host_str() {
        Some(host) => {
            let host = host.to_ascii_lowercase();
            let domain = domain.to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{domain}"))
        }
        None => false,
    }
}

/// `https://2021.igem.org/Team:Acme_Bio/Model` -> `Acme Bio`
pub fn extract_team_name(url: &str) -> Result<String> {
    let captures = TEAM_SEGMENT
        .captures(url)
        .ok_or_else(|| CrawlError::MalformedUrl(format!("no team segment in {url}")))?;
    Ok(captures[1].replace('_', " "))
}

/// `https://2021.igem.org/Team:Acme/Model` -> `2021`
pub fn extract_year(url: &str) -> Result<String> {
    let captures = YEAR_SEGMENT
        .captures(url)
        .ok_or_else(|| CrawlError::MalformedUrl(format!("no year segment in {url}")))?;
    Ok(captures[1].to_string())
}

/// A fetched page as handed over by a [`crate::PageFetcher`].
#[derive(Debug, Clone)]
pub struct UrlData {
    pub status: u16,
    pub body: String,
    /// Where the request ended up after redirects.
    pub final_url: Arc<Url>,
}

impl UrlData {
    pub fn get_url(&self) -> Arc<Url> {
        self.final_url.clone()
    }
    pub fn get_raw_page(&self) -> &str {
        &self.body
    }
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
