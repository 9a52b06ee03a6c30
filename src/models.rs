use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generates a code-backed option enum with a static lookup table.
///
/// Every variant carries the wire code sent to medstat.dk and the
/// human-readable label used when dumping the valid options.
macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $( $variant:ident => ($code:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            pub fn code(self) -> &'static str {
                match self {
                    $( $name::$variant => $code ),+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.code() == s)
                    .ok_or_else(|| Error::Validation(format!("invalid {}: {:?}", $what, s)))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

code_enum! {
    /// Danish region the statistics are restricted to.
    Region, "region" {
        Denmark => ("0", "Denmark"),
        Capital => ("1", "Capital Region"),
        Zealand => ("2", "Region Zealand"),
        SouthernDenmark => ("3", "Region of Southern Denmark"),
        CentralDenmark => ("4", "Central Denmark Region"),
        NorthDenmark => ("5", "North Denmark Region"),
    }
}

code_enum! {
    /// Health-system segment the statistics are drawn from.
    Sector, "sector" {
        Primary => ("0", "Primary Sector"),
        Hospital => ("1", "Hospital Sector"),
        Total => ("2", "Total"),
    }
}

code_enum! {
    Gender, "gender" {
        All => ("A", "All"),
        Men => ("1", "Men"),
        Women => ("2", "Women"),
    }
}

code_enum! {
    /// Measurement requested from the statistics table.
    SearchVariable, "search variable" {
        PeopleCount => ("people_count", "Number of users"),
        PeopleCountPer1000 => ("people_count_1000", "Number of users per 1000 inhabitants"),
        SoldVolume => ("sold_volume", "Sold volume"),
        SoldVolumePer1000Day => ("sold_volume_1000_day", "Sold volume per 1,000 inhabitants per day"),
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::Denmark
    }
}

impl Default for Sector {
    fn default() -> Self {
        Sector::Primary
    }
}

impl Default for Gender {
    fn default() -> Self {
        Gender::All
    }
}

impl Default for SearchVariable {
    fn default() -> Self {
        SearchVariable::SoldVolume
    }
}

impl SearchVariable {
    /// Volume measurements are the only ones the non-primary sectors publish.
    pub fn is_volume(self) -> bool {
        matches!(
            self,
            SearchVariable::SoldVolume | SearchVariable::SoldVolumePer1000Day
        )
    }
}

/// Age filter: everyone, or an explicit list of ages in years.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AgeGroup {
    #[default]
    All,
    Ages(Vec<u16>),
}

impl AgeGroup {
    /// Wire codes: `"A"` or zero-padded three-digit ages (`15` → `"015"`).
    pub fn codes(&self) -> Vec<String> {
        match self {
            AgeGroup::All => vec!["A".to_string()],
            AgeGroup::Ages(ages) => ages.iter().map(|a| format!("{a:03}")).collect(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, AgeGroup::All)
    }
}

impl FromStr for AgeGroup {
    type Err = Error;

    /// Accepts `A` or a comma/semicolon separated list of integer ages.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("a") {
            return Ok(AgeGroup::All);
        }
        let ages = s
            .split([',', ';'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<u16>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| {
                Error::InvalidArgument(format!(
                    "age_group must be 'A' or a list of integers, got {s:?}"
                ))
            })?;
        if ages.is_empty() {
            return Err(Error::InvalidArgument(
                "age_group must be 'A' or a list of integers".into(),
            ));
        }
        Ok(AgeGroup::Ages(ages))
    }
}

/// Measurement unit of a statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    /// Defined Daily Doses.
    #[serde(rename = "DDD")]
    Ddd,
    Sales,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Ddd => "DDD",
            Unit::Sales => "Sales",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text cells as extracted from the HTML table, one `Vec` per `<tr>`.
pub type RawTable = Vec<Vec<String>>;

/// Names of the metadata columns that precede the year columns.
pub const META_COLUMNS: [&str; 3] = ["ATC-code", "Setting", "Unit"];

/// One ATC code's values, aligned with `ResultTable::years`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub atc_code: String,
    pub values: Vec<Option<f64>>,
}

/// Normalized statistics table.
///
/// Logical columns are `ATC-code`, `Setting`, `Unit` followed by `years`.
/// `setting` and `unit` are shared by every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub setting: String,
    pub unit: Unit,
    pub years: Vec<String>,
    pub rows: Vec<ResultRow>,
    /// Year labels dropped because no row had a value for them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_years: Vec<String>,
}

impl ResultTable {
    /// Full column header: metadata columns then surviving years.
    pub fn columns(&self) -> Vec<String> {
        META_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.years.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value for the given ATC code and year label (first matching row).
    pub fn value(&self, atc_code: &str, year: &str) -> Option<f64> {
        let col = self.years.iter().position(|y| y == year)?;
        self.rows
            .iter()
            .find(|r| r.atc_code == atc_code)
            .and_then(|r| r.values.get(col).copied().flatten())
    }
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.columns();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                let mut cells = vec![
                    r.atc_code.clone(),
                    self.setting.clone(),
                    self.unit.to_string(),
                ];
                cells.extend(r.values.iter().map(|v| match v {
                    Some(x) => format!("{x}"),
                    None => "NA".to_string(),
                }));
                cells
            })
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|i| {
                body.iter()
                    .filter_map(|row| row.get(i))
                    .chain(std::iter::once(&header[i]))
                    .map(|c| c.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let write_row = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            let line = cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{c:<w$}"))
                .collect::<Vec<_>>()
                .join("  ");
            writeln!(f, "{}", line.trim_end())
        };

        write_row(f, &header)?;
        for row in &body {
            write_row(f, row)?;
        }
        Ok(())
    }
}
