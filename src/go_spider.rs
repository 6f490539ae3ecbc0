//! The crawl loop: frontier bookkeeping, bounded concurrent fetching and
//! hand-off of content pages to the item pipeline.
use crate::error::{CrawlError, Result};
use crate::page_utils::{
    analyze_page, in_scope, valid_url_format, DiscoveredLink, FetchLimiter, HttpFetcher, LinkAction,
    PageFetcher, RuleSet, CPU_NUMBER,
};
use crate::pipeline::{ItemPipeline, JsonLinesExporter, Summarizer};
use crate::stats::{CrawlStats, CrawlSummary};
use crate::Config;
use dashmap::DashSet;
use reqwest::Url;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub struct Crawler<W: Write> {
    fetcher: Arc<dyn PageFetcher>,
    rules: Arc<RuleSet>,
    pipeline: Arc<ItemPipeline<W>>,
    limiter: FetchLimiter,
    allowed_domain: Arc<str>,
    visited: DashSet<Url>,
    // html work runs on the blocking pool, bounded to the core count
    parsing: Arc<Semaphore>,
    stats: Arc<CrawlStats>,
}

impl<W: Write + Send + 'static> Crawler<W> {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        rules: RuleSet,
        pipeline: Arc<ItemPipeline<W>>,
        config: &Config,
        stats: Arc<CrawlStats>,
    ) -> Self {
        Self {
            fetcher,
            rules: Arc::new(rules),
            pipeline,
            limiter: FetchLimiter::new(config.concurrent_requests, config.concurrent_per_host),
            allowed_domain: Arc::from(config.allowed_domain.as_str()),
            visited: DashSet::new(),
            parsing: Arc::new(Semaphore::new(*CPU_NUMBER)),
            stats,
        }
    }

    /// Crawls from `seed` until no unvisited link that a rule accepts is left.
    ///
    /// The seed itself is only harvested for links. Every url is fetched at
    /// most once, no matter how many pages link to it.
    pub async fn crawl(self: &Arc<Self>, seed: Url) {
        let mut tasks = JoinSet::new();
        self.visited.insert(seed.clone());
        tasks.spawn(Arc::clone(self).visit(seed, LinkAction::Follow));

        while let Some(joined) = tasks.join_next().await {
            let links = match joined {
                Ok(links) => links,
                Err(e) => {
                    warn!("page task failed: {e}");
                    continue;
                }
            };
            for DiscoveredLink { url, action } in links {
                if self.visited.insert(url.clone()) {
                    debug!("queueing {url} as {action:?}");
                    tasks.spawn(Arc::clone(self).visit(url, action));
                }
            }
        }
    }

    async fn visit(self: Arc<Self>, url: Url, action: LinkAction) -> Vec<DiscoveredLink> {
        let permit = self.limiter.acquire(&url).await;
        let fetched = self.fetcher.fetch(&url).await;
        drop(permit);

        let page = match fetched {
            Ok(page) => page,
            Err(e) => {
                self.stats.fetch_failed();
                warn!("{e}");
                return vec![];
            }
        };
        self.stats.page_fetched();
        if !page.is_success() {
            self.stats.fetch_failed();
            let e = CrawlError::HttpStatus {
                url: url.to_string(),
                status: page.status,
            };
            debug!("dead end: {e}");
            return vec![];
        }
        let final_url = page.get_url();
        if !in_scope(&final_url, &self.allowed_domain) {
            self.stats.fetch_failed();
            warn!("{url} redirected out of {} to {final_url}", self.allowed_domain);
            return vec![];
        }
        // a redirect may land on a page another task already owns
        if *final_url != url && !self.visited.insert((*final_url).clone()) {
            debug!("{url} redirected to already visited {final_url}");
            return vec![];
        }

        let Ok(parse_permit) = self.parsing.clone().acquire_owned().await else {
            return vec![];
        };
        let rules = self.rules.clone();
        let domain = self.allowed_domain.clone();
        let analysis = tokio::task::spawn_blocking(move || {
            let analysis = analyze_page(&page, action, &rules, &domain);
            drop(parse_permit);
            analysis
        })
        .await;
        let analysis = match analysis {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("analysis of {url} failed: {e}");
                return vec![];
            }
        };

        match analysis.record {
            Some(Ok(record)) => {
                // drops and export failures are logged and counted by the pipeline
                let _ = self.pipeline.process_item(record).await;
            }
            Some(Err(e)) => {
                self.stats.malformed_url();
                warn!("skipping {url}: {e}");
            }
            None => {}
        }
        analysis.links
    }
}

/// Runs one complete crawl against `fetcher`, writing accepted records to
/// `config.output`.
///
/// The output file is opened before anything is fetched; failing to open it
/// is the only fatal error. The file is flushed and closed however the crawl
/// ends, including Ctrl-C.
pub async fn run_crawl(
    config: &Config,
    fetcher: Arc<dyn PageFetcher>,
    summarizer: Option<Arc<dyn Summarizer>>,
) -> Result<CrawlSummary> {
    config.validate()?;
    let seed = valid_url_format(&config.start_point)?;
    let exporter = JsonLinesExporter::create(&config.output)?;

    let stats = Arc::new(CrawlStats::default());
    let pipeline = Arc::new(ItemPipeline::new(exporter, summarizer, stats.clone()));
    let crawler = Arc::new(Crawler::new(
        fetcher,
        RuleSet::default(),
        pipeline.clone(),
        config,
        stats.clone(),
    ));

    info!("crawling from {seed} within {}", config.allowed_domain);
    let interrupt = async {
        // without a signal handler the crawl simply runs to completion
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    tokio::select! {
        _ = crawler.crawl(seed) => {},
        _ = interrupt => warn!("interrupted, closing {}", config.output.display()),
    }

    drop(pipeline.finish().await?);
    let summary = stats.summary();
    info!(
        "crawl finished: {} pages fetched, {} fetch failures, {} exported, {} dropped, {} malformed urls",
        summary.pages_fetched,
        summary.fetch_failures,
        summary.exported,
        summary.dropped(),
        summary.malformed_urls
    );
    if summary.exported + summary.dropped() + summary.malformed_urls == 0 {
        warn!("no content page was reached; the crawl rules may no longer fit the site layout");
    }
    Ok(summary)
}

pub async fn start_process(
    config: Config,
    summarizer: Option<Arc<dyn Summarizer>>,
) -> Result<CrawlSummary> {
    let fetcher = HttpFetcher::new(
        config.get_timeout(),
        config.concurrent_per_host,
        &config.allowed_domain,
    )?;
    run_crawl(&config, Arc::new(fetcher), summarizer).await
}
