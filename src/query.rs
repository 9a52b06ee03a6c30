//! Query URL construction for the medstat.dk "medicine and medical groups" tables.
//!
//! The site takes the whole query as one percent-encoded JSON object appended to
//! the base path. Key order and separators are part of that contract:
//!
//! ```text
//! {"year": [...], "region": [...], "gender": [...], "ageGroup": [...],
//!  "searchVariable": [...], "errorMessages": [], "atcCode": [...], "sector": [...]}
//! ```
//!
//! Typical usage:
//! ```
//! # use medstat_rs::query::QueryBuilder;
//! # use medstat_rs::models::{Gender, Sector};
//! let url = QueryBuilder::new(["N06A", "N06AB"])
//!     .years(["2022", "2023"])
//!     .sector(Sector::Primary)
//!     .gender(Gender::Women)
//!     .generate_url()?;
//! assert!(url.starts_with(medstat_rs::query::BASE_URL));
//! # Ok::<(), medstat_rs::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::models::{AgeGroup, Gender, Region, SearchVariable, Sector};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use std::fmt::Write as _;
use std::io;

pub const BASE_URL: &str = "https://medstat.dk/en/viewDataTables/medicineAndMedicalGroups/";

/// Used when the caller does not pick any years.
pub const DEFAULT_YEARS: [&str; 3] = ["2023", "2022", "2021"];

pub const MIN_YEAR: i32 = 1996;
pub const MAX_YEAR: i32 = 2023;

// Same unreserved set as a typical `quote()`: alphanumerics plus `_ . - ~ /`.
const SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

const NON_PRIMARY_MSG: &str =
    "non-primary sectors only support volume measurements and cannot filter by gender or age group";

/// A validated query. Only obtainable through [`QueryBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameters {
    atc_codes: Vec<String>,
    years: Vec<String>,
    region: Region,
    sector: Sector,
    genders: Vec<Gender>,
    age_group: AgeGroup,
    search_variable: SearchVariable,
}

impl QueryParameters {
    pub fn atc_codes(&self) -> &[String] {
        &self.atc_codes
    }

    pub fn years(&self) -> &[String] {
        &self.years
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }

    pub fn genders(&self) -> &[Gender] {
        &self.genders
    }

    pub fn age_group(&self) -> &AgeGroup {
        &self.age_group
    }

    pub fn search_variable(&self) -> SearchVariable {
        self.search_variable
    }

    /// The JSON object the site expects, before percent-encoding.
    ///
    /// Non-ASCII characters are written as `\uXXXX` escapes.
    pub fn to_json(&self) -> Result<String> {
        let payload = Payload {
            year: &self.years,
            region: [self.region.code()],
            gender: self.genders.iter().map(|g| g.code()).collect(),
            age_group: self.age_group.codes(),
            search_variable: [self.search_variable.code()],
            error_messages: [],
            atc_code: &self.atc_codes,
            sector: [self.sector.code()],
        };
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        payload
            .serialize(&mut ser)
            .map_err(|e| Error::Encode(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| Error::Encode(e.to_string()))
    }

    pub fn to_url(&self) -> Result<String> {
        let json = self.to_json()?;
        Ok(format!(
            "{}{}",
            BASE_URL,
            percent_encoding::utf8_percent_encode(&json, SAFE)
        ))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    year: &'a [String],
    region: [&'static str; 1],
    gender: Vec<&'static str>,
    age_group: Vec<String>,
    search_variable: [&'static str; 1],
    error_messages: [&'static str; 0],
    atc_code: &'a [String],
    sector: [&'static str; 1],
}

/// Compact JSON with `", "` and `": "` separators and ASCII-only output.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    writer.write_all(format!("\\u{unit:04x}").as_bytes())?;
                }
            }
        }
        Ok(())
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Collects query options; [`build`](Self::build) validates them.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    atc_codes: Vec<String>,
    years: Option<Vec<String>>,
    region: Region,
    sector: Sector,
    genders: Vec<Gender>,
    age_group: AgeGroup,
    search_variable: SearchVariable,
}

impl QueryBuilder {
    pub fn new<I, S>(atc_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            atc_codes: atc_codes.into_iter().map(Into::into).collect(),
            genders: vec![Gender::All],
            ..Self::default()
        }
    }

    /// Years as text; each must be an integer in `1996..=2023`.
    pub fn years<I, S>(mut self, years: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.years = Some(years.into_iter().map(Into::into).collect());
        self
    }

    pub fn region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    pub fn sector(mut self, sector: Sector) -> Self {
        self.sector = sector;
        self
    }

    /// Single gender; stored as a one-element list.
    pub fn gender(mut self, gender: Gender) -> Self {
        self.genders = vec![gender];
        self
    }

    pub fn genders<I>(mut self, genders: I) -> Self
    where
        I: IntoIterator<Item = Gender>,
    {
        self.genders = genders.into_iter().collect();
        self
    }

    pub fn age_group(mut self, age_group: AgeGroup) -> Self {
        self.age_group = age_group;
        self
    }

    pub fn search_variable(mut self, search_variable: SearchVariable) -> Self {
        self.search_variable = search_variable;
        self
    }

    /// Validate and freeze the query.
    ///
    /// On failure the table of valid options is written to stderr before the
    /// error is returned.
    pub fn build(&self) -> Result<QueryParameters> {
        self.validate().inspect_err(|e| {
            log::debug!("query rejected: {e}");
            eprintln!("\nError: {e}");
            print_options();
        })
    }

    pub fn generate_url(&self) -> Result<String> {
        self.build()?.to_url()
    }

    fn validate(&self) -> Result<QueryParameters> {
        if self.atc_codes.is_empty() {
            return Err(Error::InvalidArgument(
                "atc_codes must be a non-empty list".into(),
            ));
        }
        if self.atc_codes.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::InvalidArgument(
                "atc_codes must not contain blank codes".into(),
            ));
        }

        let years = match &self.years {
            Some(ys) if !ys.is_empty() => ys
                .iter()
                .map(|y| parse_year(y))
                .collect::<Result<Vec<_>>>()?,
            _ => DEFAULT_YEARS.iter().map(|y| y.to_string()).collect(),
        };

        if self.genders.is_empty() {
            return Err(Error::InvalidArgument(
                "gender must be a code or a non-empty list of codes".into(),
            ));
        }

        if let AgeGroup::Ages(ages) = &self.age_group {
            if ages.is_empty() {
                return Err(Error::InvalidArgument(
                    "age_group must be 'A' or a non-empty list of integers".into(),
                ));
            }
            if let Some(a) = ages.iter().find(|a| **a > 999) {
                return Err(Error::InvalidArgument(format!(
                    "age {a} does not fit a three-digit age code"
                )));
            }
        }

        if self.sector != Sector::Primary
            && (self.genders.iter().any(|g| *g != Gender::All)
                || !self.age_group.is_all()
                || !self.search_variable.is_volume())
        {
            return Err(Error::Validation(NON_PRIMARY_MSG.into()));
        }

        Ok(QueryParameters {
            atc_codes: self.atc_codes.iter().map(|c| c.trim().to_string()).collect(),
            years,
            region: self.region,
            sector: self.sector,
            genders: self.genders.clone(),
            age_group: self.age_group.clone(),
            search_variable: self.search_variable,
        })
    }
}

fn parse_year(raw: &str) -> Result<String> {
    let year: i32 = raw
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("invalid year: {raw:?}")))?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(Error::Validation(format!(
            "Year must be between {MIN_YEAR} and {MAX_YEAR}, got {year}"
        )));
    }
    Ok(year.to_string())
}

/// Every valid option value per category, plus the sector restriction note.
pub fn options_table() -> String {
    fn section<T: Copy>(
        out: &mut String,
        name: &str,
        items: &[T],
        code: fn(T) -> &'static str,
        label: fn(T) -> &'static str,
    ) {
        let _ = writeln!(out, "\n{name}:");
        for item in items {
            let _ = writeln!(out, "  {}: {}", code(*item), label(*item));
        }
    }

    let mut out = String::from("\nAVAILABLE OPTIONS:\n");
    section(&mut out, "REGION", Region::ALL, Region::code, Region::label);
    section(&mut out, "SECTOR", Sector::ALL, Sector::code, Sector::label);
    section(&mut out, "GENDER", Gender::ALL, Gender::code, Gender::label);
    out.push_str("\nAGE_GROUP:\n  A: All\n  [15, 16, 17, 18]: 15, 16, 17, 18 year olds\n");
    section(
        &mut out,
        "SEARCH_VARIABLE",
        SearchVariable::ALL,
        SearchVariable::code,
        SearchVariable::label,
    );
    out.push_str(
        "\nNote that non-primary sectors only support volume measurements and cannot filter by gender or age group\n",
    );
    out.push_str("If you want to filter by gender or age group, set sector to '0' (Primary Sector)\n");
    out
}

pub fn print_options() {
    eprint!("{}", options_table());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatter_uses_spaced_separators() {
        let q = QueryBuilder::new(["N06A"]).years(["2021"]).build().unwrap();
        assert_eq!(
            q.to_json().unwrap(),
            r#"{"year": ["2021"], "region": ["0"], "gender": ["A"], "ageGroup": ["A"], "searchVariable": ["sold_volume"], "errorMessages": [], "atcCode": ["N06A"], "sector": ["0"]}"#
        );
    }

    #[test]
    fn non_ascii_is_escaped_like_ascii_json() {
        let q = QueryBuilder::new(["N\u{e6}06", "\u{1F48A}"]).build().unwrap();
        let json = q.to_json().unwrap();
        assert!(json.is_ascii());
        assert!(json.contains(r#""atcCode": ["N\u00e606", "\ud83d\udc8a"]"#), "{json}");
    }

    #[test]
    fn years_are_trimmed_and_normalized() {
        assert_eq!(parse_year(" 2001 ").unwrap(), "2001");
        assert!(parse_year("20x1").is_err());
    }

    #[test]
    fn options_table_lists_every_category() {
        let t = options_table();
        for heading in ["REGION:", "SECTOR:", "GENDER:", "AGE_GROUP:", "SEARCH_VARIABLE:"] {
            assert!(t.contains(heading), "missing {heading}");
        }
        assert!(t.contains("sold_volume_1000_day: Sold volume per 1,000 inhabitants per day"));
    }
}
