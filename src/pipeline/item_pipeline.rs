//! Per-record filtering, transformation and export.
use super::{JsonLinesExporter, PageRecord, Summarizer};
use crate::error::{CrawlError, DropReason, Result};
use crate::stats::CrawlStats;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Text found on placeholder pages that match the content rules but hold
/// nothing worth keeping.
pub const BOILERPLATE_PHRASES: [&str; 6] = [
    "No Page Text",
    "The requested page title was invalid",
    "This page is used by the judges to evaluate your team",
    "This is a template page",
    "There is currently no text",
    "In order to be considered for the",
];

/// Counted in characters, not bytes.
pub const MIN_TEXT_LENGTH: usize = 100;

static EQUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\$.+?\$\$").unwrap());

/// Removes `$$...$$` math blocks, shortest match first.
pub fn strip_equations(text: &str) -> String {
    EQUATION.replace_all(text, "").into_owned()
}

fn check_boilerplate(text: &str) -> Result<()> {
    match BOILERPLATE_PHRASES.iter().find(|phrase| text.contains(*phrase)) {
        Some(phrase) => {
            debug!("boilerplate phrase {phrase:?} found");
            Err(CrawlError::dropped(DropReason::InvalidBoilerplate))
        }
        None => Ok(()),
    }
}

fn check_length(text: &str) -> Result<()> {
    if text.chars().count() < MIN_TEXT_LENGTH {
        return Err(CrawlError::dropped(DropReason::TooShort));
    }
    Ok(())
}

/// Receives records from every crawl task and writes the accepted ones
/// through a single exporter.
pub struct ItemPipeline<W: Write> {
    exporter: Mutex<JsonLinesExporter<W>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    stats: Arc<CrawlStats>,
}

impl<W: Write + Send> ItemPipeline<W> {
    pub fn new(
        exporter: JsonLinesExporter<W>,
        summarizer: Option<Arc<dyn Summarizer>>,
        stats: Arc<CrawlStats>,
    ) -> Self {
        Self {
            exporter: Mutex::new(exporter),
            summarizer,
            stats,
        }
    }

    /// Filters, transforms and exports one record.
    ///
    /// A dropped record comes back as [`CrawlError::DroppedItem`] and never
    /// reaches the exporter. Records are written in the order they get
    /// through here.
    pub async fn process_item(&self, record: PageRecord) -> Result<()> {
        let url = record.get_url().to_string();
        let result = self.run_stages(record).await;
        match &result {
            Ok(()) => {
                self.stats.exported();
                info!("exported {url}");
            }
            Err(CrawlError::DroppedItem { reason }) => {
                self.stats.dropped(*reason);
                debug!("dropped {url}: {reason}");
            }
            Err(e) => warn!("could not export {url}: {e}"),
        }
        result
    }

    async fn run_stages(&self, mut record: PageRecord) -> Result<()> {
        check_boilerplate(record.get_page_text())?;
        check_length(record.get_page_text())?;

        let stripped = strip_equations(record.get_page_text());
        check_length(&stripped)?;
        record.set_page_text(stripped);

        if let Some(summarizer) = &self.summarizer {
            match summarizer.summarize(record.get_page_text()).await {
                Ok(summary) => record.set_page_text(summary),
                Err(e) => warn!(
                    "keeping full text of {}, summarizer failed: {e}",
                    record.get_url()
                ),
            }
        }

        self.exporter.lock().await.export(&record)
    }

    /// Flushes and closes the output. Later calls are no-ops returning `None`.
    pub async fn finish(&self) -> Result<Option<W>> {
        self.exporter.lock().await.finish()
    }
}
