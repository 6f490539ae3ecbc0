//! Optional text shortening before export.
//!
//! The crawler does not summarize anything itself; it talks to an external
//! service through [`Summarizer`]. [`HttpSummarizer`] speaks the inference
//! endpoint format used by hosted seq2seq models: `{"inputs": "..."}` in,
//! `[{"summary_text": "..."}]` out.
use crate::error::{CrawlError, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Text in, shorter text out.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Word budget per request, roughly what a 1024 token model input holds.
pub const DEFAULT_CHUNK_WORDS: usize = 700;

#[derive(Serialize)]
struct SummaryRequest<'a> {
    inputs: &'a str,
}

#[derive(Deserialize)]
struct SummaryResponse {
    summary_text: String,
}

pub struct HttpSummarizer {
    client: Client,
    endpoint: Url,
    chunk_words: usize,
}

impl HttpSummarizer {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CrawlError::Config(format!("cannot build summarizer client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            chunk_words: DEFAULT_CHUNK_WORDS,
        })
    }

    pub fn chunk_words(mut self, chunk_words: usize) -> Self {
        self.chunk_words = chunk_words.max(1);
        self
    }

    async fn summarize_chunk(&self, chunk: &str) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&SummaryRequest { inputs: chunk })
            .send()
            .await
            .map_err(|e| CrawlError::Summarize(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Summarize(format!(
                "{} answered with status {status}",
                self.endpoint
            )));
        }
        let summaries: Vec<SummaryResponse> = response
            .json()
            .await
            .map_err(|e| CrawlError::Summarize(e.to_string()))?;
        Ok(summaries
            .into_iter()
            .map(|s| s.summary_text)
            .collect::<Vec<_>>()
            .join(" "))
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let chunks = chunk_sentences(text, self.chunk_words);
        debug!("summarizing {} chunk(s)", chunks.len());
        let mut summary = String::new();
        for chunk in &chunks {
            summary.push_str(&self.summarize_chunk(chunk).await?);
        }
        Ok(summary)
    }
}

/// Splits after `.`, `!` or `?` when followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = vec![];
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if let Some(&(next, n)) = chars.peek() {
            if n.is_whitespace() {
                let sentence = text[start..next].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = next;
            }
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Packs whole sentences into chunks of at most `max_words` words. A sentence
/// longer than the budget becomes a chunk of its own.
pub fn chunk_sentences(text: &str, max_words: usize) -> Vec<String> {
    let mut chunks = vec![];
    let mut chunk = String::new();
    let mut words = 0;
    for sentence in split_sentences(text) {
        let sentence_words = sentence.split_whitespace().count();
        if words > 0 && words + sentence_words > max_words {
            chunks.push(std::mem::take(&mut chunk));
            words = 0;
        }
        if !chunk.is_empty() {
            chunk.push(' ');
        }
        chunk.push_str(sentence);
        words += sentence_words;
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}
