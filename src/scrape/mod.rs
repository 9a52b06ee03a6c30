//! Fetch a medstat.dk page and turn its statistics table into a [`ResultTable`].
//!
//! The work happens in three stages that must run in order:
//! `fetch` → `parse` → `normalize`. [`Scraper`] tracks which stage has been
//! reached and refuses out-of-order calls with [`Error::State`]; [`scrape`]
//! runs all three in one go.
//!
//! ```no_run
//! # use medstat_rs::scrape::Scraper;
//! let mut scraper = Scraper::new("https://medstat.dk/en/viewDataTables/medicineAndMedicalGroups/...");
//! scraper.fetch()?;
//! scraper.parse()?;
//! let table = scraper.normalize()?;
//! println!("{table}");
//! # Ok::<(), medstat_rs::Error>(())
//! ```

pub mod table;

pub use table::{clean_cell, detect_unit, extract_table, normalize_table};

use crate::error::{Error, Result};
use crate::models::{RawTable, ResultTable};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use std::time::Duration;

/// HTTP settings for the single GET a scraper performs.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Total request timeout; `None` keeps reqwest's default.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: concat!("medstat_rs/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl FetchConfig {
    fn client(&self) -> reqwest::Result<HttpClient> {
        let mut builder = HttpClient::builder()
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(self.user_agent.as_str());
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        builder.build()
    }
}

#[derive(Debug, Clone)]
enum Stage {
    Pending,
    Fetched { html: String },
    Parsed { html: String, rows: RawTable },
}

/// Stateful handle over one statistics page.
#[derive(Debug, Clone)]
pub struct Scraper {
    url: String,
    config: FetchConfig,
    stage: Stage,
}

impl Scraper {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_config(url, FetchConfig::default())
    }

    pub fn with_config(url: impl Into<String>, config: FetchConfig) -> Self {
        Self {
            url: url.into(),
            config,
            stage: Stage::Pending,
        }
    }

    /// Start from already downloaded HTML (e.g. a saved page); `fetch` is skipped.
    pub fn from_html(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            config: FetchConfig::default(),
            stage: Stage::Fetched { html: html.into() },
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw page body, once fetched.
    pub fn html(&self) -> Option<&str> {
        match &self.stage {
            Stage::Pending => None,
            Stage::Fetched { html } | Stage::Parsed { html, .. } => Some(html),
        }
    }

    /// Extracted rows, once parsed.
    pub fn rows(&self) -> Option<&RawTable> {
        match &self.stage {
            Stage::Parsed { rows, .. } => Some(rows),
            _ => None,
        }
    }

    /// GET the page. One attempt; any network error or non-2xx status fails.
    ///
    /// Fetching again discards previously parsed rows.
    pub fn fetch(&mut self) -> Result<()> {
        let url = self.url.as_str();
        let http = self.config.client().map_err(|e| Error::fetch(url, e))?;
        log::debug!("GET {url}");
        let html = http
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| Error::fetch(url, e))?;
        log::debug!("fetched {} bytes from {url}", html.len());
        self.stage = Stage::Fetched { html };
        Ok(())
    }

    /// Locate the statistics table and extract its rows.
    pub fn parse(&mut self) -> Result<&RawTable> {
        let html = match std::mem::replace(&mut self.stage, Stage::Pending) {
            Stage::Pending => {
                return Err(Error::State(
                    "HTML content not fetched. Call fetch() first.",
                ));
            }
            Stage::Fetched { html } | Stage::Parsed { html, .. } => html,
        };
        let rows = match extract_table(&html) {
            Ok(rows) => rows,
            Err(e) => {
                self.stage = Stage::Fetched { html };
                return Err(e);
            }
        };
        self.stage = Stage::Parsed { html, rows };
        self.rows()
            .ok_or(Error::State("Table not parsed yet. Call parse() first."))
    }

    /// Convert the parsed rows into a [`ResultTable`].
    pub fn normalize(&self) -> Result<ResultTable> {
        match &self.stage {
            Stage::Pending => Err(Error::State(
                "HTML content not fetched. Call fetch() first.",
            )),
            Stage::Fetched { .. } => Err(Error::State(
                "Table not parsed yet. Call parse() first.",
            )),
            Stage::Parsed { rows, .. } => normalize_table(rows),
        }
    }

    /// Run whichever stages are still outstanding and normalize.
    pub fn run(&mut self) -> Result<ResultTable> {
        if matches!(self.stage, Stage::Pending) {
            self.fetch()?;
        }
        if !matches!(self.stage, Stage::Parsed { .. }) {
            self.parse()?;
        }
        self.normalize()
    }
}

/// Fetch, parse and normalize the table at `url`.
pub fn scrape(url: &str) -> Result<ResultTable> {
    Scraper::new(url).run()
}
