use crate::error::DropReason;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters shared by every crawl task and the item pipeline.
#[derive(Debug, Default)]
pub struct CrawlStats {
    pages_fetched: AtomicUsize,
    fetch_failures: AtomicUsize,
    malformed_urls: AtomicUsize,
    exported: AtomicUsize,
    dropped_boilerplate: AtomicUsize,
    dropped_too_short: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub malformed_urls: usize,
    pub exported: usize,
    pub dropped_boilerplate: usize,
    pub dropped_too_short: usize,
}

impl CrawlStats {
    pub fn page_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }
    pub fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }
    pub fn malformed_url(&self) {
        self.malformed_urls.fetch_add(1, Ordering::Relaxed);
    }
    pub fn exported(&self) {
        self.exported.fetch_add(1, Ordering::Relaxed);
    }
    pub fn dropped(&self, reason: DropReason) {
        let counter = match reason {
            DropReason::InvalidBoilerplate => &self.dropped_boilerplate,
            DropReason::TooShort => &self.dropped_too_short,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            malformed_urls: self.malformed_urls.load(Ordering::Relaxed),
            exported: self.exported.load(Ordering::Relaxed),
            dropped_boilerplate: self.dropped_boilerplate.load(Ordering::Relaxed),
            dropped_too_short: self.dropped_too_short.load(Ordering::Relaxed),
        }
    }
}

impl CrawlSummary {
    pub fn dropped(&self) -> usize {
        self.dropped_boilerplate + self.dropped_too_short
    }
}
