use crate::error::{CrawlError, Result};
use crate::pipeline::{HttpSummarizer, Summarizer};
use crate::{start_process, valid_url_format, CrawlSummary};
use clap::{command, value_parser, Arg};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const HELP: &str = r#"
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading}
    {usage}

{all-args}{after-help}
"#;

pub const DEFAULT_START_POINT: &str =
    "https://old.igem.org/Team_List?year=2021&name=Championship&division=igem";

pub type CResult<T> = std::result::Result<T, Box<dyn Error>>;

#[derive(Debug, Clone)]
pub struct Config {
    pub start_point: String,    // seed url, the only entry point of the crawl
    pub allowed_domain: String, // nothing outside this domain is fetched
    pub output: PathBuf,        // json lines file, truncated every run
    pub concurrent_requests: usize,
    pub concurrent_per_host: usize,
    pub timeout: u64, // seconds per request
    pub log_file: Option<PathBuf>,
    pub summarizer_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        // 60/30 stays under the rate at which the wiki servers start blocking
        Self {
            start_point: DEFAULT_START_POINT.to_string(),
            allowed_domain: "igem.org".to_string(),
            output: PathBuf::from("samara.jl"),
            concurrent_requests: 60,
            concurrent_per_host: 30,
            timeout: 30,
            log_file: None,
            summarizer_url: None,
        }
    }
}

impl Config {
    pub fn get_url(&self) -> &str {
        &self.start_point
    }
    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrent_requests == 0 || self.concurrent_per_host == 0 {
            return Err(CrawlError::Config(
                "concurrency limits must be at least 1".into(),
            ));
        }
        if self.allowed_domain.trim().is_empty() {
            return Err(CrawlError::Config("allowed domain is empty".into()));
        }
        Ok(())
    }

    /// Builds the summarization client when an endpoint is configured.
    pub fn summarizer(&self) -> Result<Option<Arc<dyn Summarizer>>> {
        match &self.summarizer_url {
            Some(url) => {
                let summarizer: Arc<dyn Summarizer> = Arc::new(HttpSummarizer::new(
                    valid_url_format(url)?,
                    self.get_timeout(),
                )?);
                Ok(Some(summarizer))
            }
            None => Ok(None),
        }
    }
}

pub fn get_args() -> CResult<Config> {
    let defaults = Config::default();
    let matches = command!()
        .about("Crawls iGEM team wikis and exports their modelling and software pages")
        .help_template(HELP)
        .next_line_help(true)
        .arg(
            Arg::new("start_point")
                .short('s')
                .long("start-point")
                .value_name("URL")
                .num_args(1)
                .default_value(DEFAULT_START_POINT)
                .long_help("page the crawl starts from; it is only searched for links, never exported"),
        )
        .arg(
            Arg::new("allowed_domain")
                .short('d')
                .long("allowed-domain")
                .value_name("HOST")
                .num_args(1)
                .default_value("igem.org")
                .long_help("links outside this domain and its subdomains are never fetched"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .default_value("samara.jl")
                .long_help("json lines file the records are written to, overwritten on every run"),
        )
        .arg(
            Arg::new("concurrent_requests")
                .short('c')
                .long("concurrent-requests")
                .value_name("NUMBER")
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("60")
                .long_help("maximum number of requests in flight; going much higher gets the crawler blocked"),
        )
        .arg(
            Arg::new("concurrent_per_host")
                .short('p')
                .long("concurrent-per-host")
                .value_name("NUMBER")
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("30")
                .long_help("maximum number of requests in flight against a single host"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .num_args(1)
                .value_parser(value_parser!(u64))
                .default_value("30")
                .long_help("time a single request may take before it counts as failed"),
        )
        .arg(
            Arg::new("log_file")
                .short('l')
                .long("log-file")
                .value_name("PATH")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .long_help("write logs to this file instead of stderr"),
        )
        .arg(
            Arg::new("summarizer_url")
                .long("summarizer-url")
                .value_name("URL")
                .num_args(1)
                .long_help("summarization endpoint; when set, exported page text is replaced by its summary"),
        )
        .get_matches();

    Ok(Config {
        start_point: matches
            .get_one::<String>("start_point")
            .cloned()
            .unwrap_or(defaults.start_point),
        allowed_domain: matches
            .get_one::<String>("allowed_domain")
            .cloned()
            .unwrap_or(defaults.allowed_domain),
        output: matches
            .get_one::<PathBuf>("output")
            .cloned()
            .unwrap_or(defaults.output),
        concurrent_requests: matches
            .get_one::<usize>("concurrent_requests")
            .copied()
            .unwrap_or(defaults.concurrent_requests),
        concurrent_per_host: matches
            .get_one::<usize>("concurrent_per_host")
            .copied()
            .unwrap_or(defaults.concurrent_per_host),
        timeout: matches
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(defaults.timeout),
        log_file: matches.get_one::<PathBuf>("log_file").cloned(),
        summarizer_url: matches.get_one::<String>("summarizer_url").cloned(),
    })
}

pub async fn run(config: Config) -> CResult<CrawlSummary> {
    let summarizer = config.summarizer()?;
    let summary = start_process(config, summarizer).await?;
    Ok(summary)
}
