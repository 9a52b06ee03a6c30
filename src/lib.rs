//! medstat_rs
//!
//! Fetch medicine statistics tables from [medstat.dk](https://medstat.dk), normalize
//! them into a numeric table per ATC code, and chart them over time. Pairs with the
//! `medstat` CLI.
//!
//! ### Features
//! - Build validated query URLs (years, region, sector, gender, age group, measure)
//! - Scrape the statistics table and clean it into numeric year columns
//! - Save as CSV or JSON, or print per-code summary statistics
//! - Render PNG/SVG line charts, one line per ATC code
//!
//! ### Example
//! ```no_run
//! use medstat_rs::{QueryBuilder, scrape, viz};
//!
//! let url = QueryBuilder::new(["N06A", "N06AB"])
//!     .years(["2021", "2022", "2023"])
//!     .generate_url()?;
//! let table = scrape::scrape(&url)?;
//! medstat_rs::storage::save_csv(&table, "n06a.csv")?;
//! viz::render(&table, &viz::RenderConfig::default())?.save("n06a.png", viz::DEFAULT_DPI)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod error;
pub mod models;
pub mod query;
pub mod scrape;
pub mod stats;
pub mod storage;
pub mod viz;

pub use error::{Error, Result};
pub use models::{ResultRow, ResultTable, Unit};
pub use query::{QueryBuilder, QueryParameters};
pub use scrape::Scraper;
