use async_trait::async_trait;
use reqwest::Url;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wikicrawl::{
    run_crawl, Config, CrawlError, PageFetcher, PageRecord, PageType, UrlData, DEFAULT_START_POINT,
};

static MODEL_URL: &str = "https://2021.igem.org/Team:Acme/Modelling";

const LONG_PROSE: &str = "sufficiently long prose exceeding one hundred characters about how \
    the team modelled gene expression with differential equations";

/// A wiki held in memory. Unknown urls answer 404.
#[derive(Default)]
struct FakeWiki {
    pages: HashMap<String, (u16, String)>,
    redirects: HashMap<String, String>,
    hits: Mutex<HashMap<String, usize>>,
    delay: Duration,
}

impl FakeWiki {
    fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), (200, body.into()));
        self
    }
    fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), (status, String::new()));
        self
    }
    /// Serves `to` whenever `from` is requested, reporting `to` as the final url.
    fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }
    fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
    fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
    fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl PageFetcher for FakeWiki {
    async fn fetch(&self, url: &Url) -> wikicrawl::Result<UrlData> {
        *self
            .hits
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;
        tokio::time::sleep(self.delay).await;
        let final_url = match self.redirects.get(url.as_str()) {
            Some(target) => Url::parse(target).unwrap(),
            None => url.clone(),
        };
        let (status, body) = self
            .pages
            .get(final_url.as_str())
            .cloned()
            .unwrap_or((404, "not found".to_string()));
        Ok(UrlData {
            status,
            body,
            final_url: Arc::new(final_url),
        })
    }
}

fn links(urls: &[&str]) -> String {
    let anchors: String = urls
        .iter()
        .map(|u| format!("<li><a href=\"{u}\">link</a></li>"))
        .collect();
    format!("<html><body><ul>{anchors}</ul></body></html>")
}

fn body_content(text: &str) -> String {
    format!("<html><body><div id=\"bodyContent\"><p>{text}</p></div></body></html>")
}

fn config(output: &Path) -> Config {
    Config {
        output: output.to_path_buf(),
        concurrent_requests: 8,
        concurrent_per_host: 4,
        ..Config::default()
    }
}

fn read_records(path: &Path) -> Vec<PageRecord> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).expect("every line is one complete record"))
        .collect()
}

#[tokio::test]
async fn model_page_is_exported_with_normalized_text() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("samara.jl");
    let wiki = Arc::new(
        FakeWiki::default()
            .page(DEFAULT_START_POINT, links(&[MODEL_URL]))
            .page(MODEL_URL, body_content(&format!("Some   \n\t {LONG_PROSE}"))),
    );

    let summary = run_crawl(&config(&output), wiki.clone(), None).await.unwrap();

    let records = read_records(&output);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.get_url(), MODEL_URL);
    assert_eq!(record.get_page_type(), PageType::Model);
    assert_eq!(record.get_team_name(), "Acme");
    assert_eq!(record.get_year(), "2021");
    assert_eq!(record.get_page_text(), format!("Some {LONG_PROSE}"));
    assert!(!record.get_page_text().contains("  "));
    assert!(!record.get_page_text().contains(['\n', '\t']));

    let line = std::fs::read_to_string(&output).unwrap();
    let raw: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(raw["pagetype"], "Model");
    assert_eq!(raw["teamname"], "Acme");
    assert_eq!(summary.exported, 1);
    assert_eq!(summary.pages_fetched, 2);
}

#[tokio::test]
async fn template_page_yields_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("samara.jl");
    let software = "https://2021.igem.org/Team:Acme/Software";
    let wiki = Arc::new(
        FakeWiki::default()
            .page(DEFAULT_START_POINT, links(&[software]))
            .page(software, body_content("This is a template page")),
    );

    let summary = run_crawl(&config(&output), wiki.clone(), None).await.unwrap();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
    assert_eq!(summary.dropped_boilerplate, 1);
    assert_eq!(summary.exported, 0);
    assert_eq!(wiki.hits(software), 1);
}

#[tokio::test]
async fn team_pages_are_followed_but_not_exported() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("samara.jl");
    let home = "https://2021.igem.org/Team:Acme";
    let notebook = "https://2021.igem.org/Team:Acme/Notebook";
    let offsite = "https://github.com/acme/Team:Acme/Model";
    let wiki = Arc::new(
        FakeWiki::default()
            .page(DEFAULT_START_POINT, links(&[home, offsite]))
            .page(home, links(&[MODEL_URL, notebook, home]))
            .page(MODEL_URL, body_content(LONG_PROSE))
            .page(notebook, body_content(LONG_PROSE))
            .page(offsite, body_content(LONG_PROSE)),
    );

    let summary = run_crawl(&config(&output), wiki.clone(), None).await.unwrap();

    let records = read_records(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get_url(), MODEL_URL);
    assert_eq!(wiki.hits(home), 1);
    assert_eq!(wiki.hits(notebook), 0);
    assert_eq!(wiki.hits(offsite), 0);
    assert_eq!(summary.pages_fetched, 3);
}

#[tokio::test]
async fn dead_ends_do_not_stop_the_crawl() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("samara.jl");
    let broken = "https://2021.igem.org/Team:Broken";
    let missing = "https://2021.igem.org/Team:Gone/Model";
    let wiki = Arc::new(
        FakeWiki::default()
            .page(DEFAULT_START_POINT, links(&[broken, missing, MODEL_URL]))
            .status(broken, 500)
            .page(MODEL_URL, body_content(LONG_PROSE)),
    );

    let summary = run_crawl(&config(&output), wiki.clone(), None).await.unwrap();

    assert_eq!(read_records(&output).len(), 1);
    assert_eq!(summary.fetch_failures, 2);
    assert_eq!(wiki.hits(missing), 1);
}

#[tokio::test]
async fn pages_without_team_segment_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("samara.jl");
    // matches the model rule but has no slash after the team name
    let odd = "https://2021.igem.org/Team:Acme_Modelling";
    let wiki = Arc::new(
        FakeWiki::default()
            .page(DEFAULT_START_POINT, links(&[odd, MODEL_URL]))
            .page(odd, body_content(LONG_PROSE))
            .page(MODEL_URL, body_content(LONG_PROSE)),
    );

    let summary = run_crawl(&config(&output), wiki.clone(), None).await.unwrap();

    assert_eq!(summary.malformed_urls, 1);
    assert_eq!(read_records(&output).len(), 1);
}

#[tokio::test]
async fn previous_output_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("samara.jl");
    std::fs::write(&output, "{\"left\": \"over\"}\n").unwrap();
    let wiki = Arc::new(FakeWiki::default().page(DEFAULT_START_POINT, links(&[])));

    run_crawl(&config(&output), wiki, None).await.unwrap();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
}

#[tokio::test]
async fn unopenable_output_aborts_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let wiki = Arc::new(FakeWiki::default().page(DEFAULT_START_POINT, links(&[MODEL_URL])));

    // a directory cannot be opened as the output file
    let result = run_crawl(&config(dir.path()), wiki.clone(), None).await;

    assert!(matches!(result, Err(CrawlError::Output(_))));
    assert_eq!(wiki.total_hits(), 0);
}

#[tokio::test]
async fn concurrent_workers_fetch_each_url_once() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("samara.jl");
    let teams = 20;
    let homes: Vec<String> = (0..teams)
        .map(|i| format!("https://2021.igem.org/Team:T{i}"))
        .collect();
    let models: Vec<String> = homes.iter().map(|h| format!("{h}/Model")).collect();

    let mut wiki = FakeWiki::default().delay(Duration::from_millis(5));
    let home_refs: Vec<&str> = homes.iter().map(String::as_str).collect();
    wiki = wiki.page(DEFAULT_START_POINT, links(&home_refs));
    for (i, home) in homes.iter().enumerate() {
        // every team page links to every other team and to two model pages
        let mut targets = home_refs.clone();
        targets.push(&models[i]);
        targets.push(&models[0]);
        wiki = wiki
            .page(home, links(&targets))
            .page(&models[i], body_content(&format!("Team {i} {LONG_PROSE}")));
    }
    let wiki = Arc::new(wiki);

    let summary = run_crawl(&config(&output), wiki.clone(), None).await.unwrap();

    for url in homes.iter().chain(models.iter()) {
        assert_eq!(wiki.hits(url), 1, "{url}");
    }
    assert_eq!(wiki.hits(DEFAULT_START_POINT), 1);

    let records = read_records(&output);
    assert_eq!(records.len(), teams);
    assert_eq!(summary.exported, teams);
    let team_names: HashSet<_> = records.iter().map(|r| r.get_team_name().to_string()).collect();
    assert_eq!(team_names.len(), teams);
}

#[tokio::test]
async fn offsite_redirect_targets_are_never_exported() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("samara.jl");
    let hijacked = "https://2021.igem.org/Team:Acme/Model";
    let lookalike = "https://2021.igem.org.evil.com/Team:Acme/Model";
    let wiki = Arc::new(
        FakeWiki::default()
            .page(DEFAULT_START_POINT, links(&[hijacked]))
            .redirect(hijacked, lookalike)
            .page(lookalike, body_content(LONG_PROSE)),
    );

    let summary = run_crawl(&config(&output), wiki.clone(), None).await.unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written, "");
    assert!(!written.contains("evil.com"));
    assert_eq!(summary.exported, 0);
    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(wiki.hits(hijacked), 1);
}

#[tokio::test]
async fn redirects_onto_a_visited_page_are_not_exported_twice() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("samara.jl");
    let alias = "https://2021.igem.org/Team:Acme/Modeling";
    let home = "https://2021.igem.org/Team:Acme";
    let wiki = Arc::new(
        FakeWiki::default()
            .page(DEFAULT_START_POINT, links(&[home]))
            .page(home, links(&[MODEL_URL, alias]))
            .redirect(alias, MODEL_URL)
            .page(MODEL_URL, body_content(LONG_PROSE)),
    );

    let summary = run_crawl(&config(&output), wiki.clone(), None).await.unwrap();

    let records = read_records(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get_url(), MODEL_URL);
    assert_eq!(summary.exported, 1);
}

#[tokio::test]
async fn links_on_content_pages_are_not_followed() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("samara.jl");
    let other_team = "https://2021.igem.org/Team:Other";
    let other_model = "https://2021.igem.org/Team:Other/Model";
    let model_page = format!(
        "<html><body><div id=\"bodyContent\"><p>{LONG_PROSE}</p></div>\
         <a href=\"{other_team}\">them</a><a href=\"{other_model}\">their model</a></body></html>"
    );
    let wiki = Arc::new(
        FakeWiki::default()
            .page(DEFAULT_START_POINT, links(&[MODEL_URL]))
            .page(MODEL_URL, model_page)
            .page(other_team, links(&[other_model]))
            .page(other_model, body_content(LONG_PROSE)),
    );

    let summary = run_crawl(&config(&output), wiki.clone(), None).await.unwrap();

    assert_eq!(read_records(&output).len(), 1);
    assert_eq!(wiki.hits(other_team), 0);
    assert_eq!(wiki.hits(other_model), 0);
    assert_eq!(summary.pages_fetched, 2);
}
