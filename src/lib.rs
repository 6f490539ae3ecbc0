//! # iGEM Wiki Crawler
//!
//! This project is a command-line application that crawls the iGEM team wikis starting from
//! a team list, finds every team's modelling and software pages, and exports their cleaned text
//! as JSON lines for later analysis.
//!
//! ## Features
//!
//! - Rule based link following: model and software pages are exported, other team pages are
//!   only searched for further links, everything else is ignored.
//! - Scripts, styles, navigation, headings, lists and tables are stripped before the article
//!   text under `#bodyContent` is extracted and normalized.
//! - Placeholder pages, pages with too little text and embedded `$$...$$` equations are
//!   filtered out before export.
//! - Optional summarization of every exported page through an external endpoint.
//! - Bounded concurrency, overall and per host, to stay under the wiki's rate limits.
//!
//! ## Usage
//!
//! ### Command-Line Options
//!
//! | Option                          | Description                                              | Default Value          |
//! |---------------------------------|----------------------------------------------------------|------------------------|
//! | `-s, --start-point <URL>`       | Page the crawl starts from.                              | 2021 championship list |
//! | `-d, --allowed-domain <HOST>`   | Domain (and subdomains) the crawler may fetch from.      | `igem.org`             |
//! | `-o, --output <PATH>`           | JSON lines output file, overwritten on every run.        | `samara.jl`            |
//! | `-c, --concurrent-requests <N>` | Maximum number of requests in flight.                    | 60                     |
//! | `-p, --concurrent-per-host <N>` | Maximum number of requests in flight per host.           | 30                     |
//! | `-t, --timeout <SECONDS>`       | Timeout of a single request.                             | 30                     |
//! | `-l, --log-file <PATH>`         | Write logs to a file instead of stderr.                  | N/A                    |
//! | `--summarizer-url <URL>`        | Summarization endpoint applied to exported text.         | N/A                    |
//!
//! ### Example
//!
//! ```bash
//! ./wikicrawl -o samara.jl -l scraper.log
//! ```
//!
//! Every line of `samara.jl` then looks like:
//!
//! ```json
//! {"url":"https://2021.igem.org/Team:Acme/Model","pagetype":"Model","teamname":"Acme","year":"2021","pagetext":"..."}
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).
mod error;
pub use error::{CrawlError, DropReason, Result};
mod interface;
pub use interface::{get_args, run, CResult, Config, DEFAULT_START_POINT};
mod pipeline;
pub use pipeline::*;
mod page_utils;
pub use page_utils::*;
mod go_spider;
pub use go_spider::{run_crawl, start_process, Crawler};
mod log_creation;
pub use log_creation::*;
mod stats;
pub use stats::{CrawlStats, CrawlSummary};
