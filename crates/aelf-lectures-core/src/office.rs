//! Offices and office dates.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// A liturgical office, i.e. the kind of feed being requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Office {
    /// Readings of the mass.
    Mass,
    /// Liturgical information for the day (feast, color, season).
    Information,
    /// Office of readings.
    Readings,
    /// Morning prayer.
    Lauds,
    /// Mid-morning prayer.
    Terce,
    /// Midday prayer.
    Sext,
    /// Mid-afternoon prayer.
    Nones,
    /// Evening prayer.
    Vespers,
    /// Night prayer.
    Compline,
}

impl Office {
    /// All offices, in the order of the liturgical day.
    pub const ALL: [Office; 9] = [
        Office::Information,
        Office::Mass,
        Office::Readings,
        Office::Lauds,
        Office::Terce,
        Office::Sext,
        Office::Nones,
        Office::Vespers,
        Office::Compline,
    ];

    /// Name of the office as it appears in API URLs.
    pub fn url_name(self) -> &'static str {
        match self {
            Self::Mass => "messes",
            Self::Information => "informations",
            Self::Readings => "lectures",
            Self::Lauds => "laudes",
            Self::Terce => "tierce",
            Self::Sext => "sexte",
            Self::Nones => "none",
            Self::Vespers => "vepres",
            Self::Compline => "complies",
        }
    }
}

impl fmt::Display for Office {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url_name())
    }
}

/// Error returned when parsing an unknown office name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown office '{0}'")]
pub struct UnknownOffice(pub String);

impl FromStr for Office {
    type Err = UnknownOffice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Office::ALL
            .into_iter()
            .find(|office| office.url_name() == s)
            .ok_or_else(|| UnknownOffice(s.to_string()))
    }
}

/// The calendar date an office is requested for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OfficeDate(NaiveDate);

impl OfficeDate {
    /// Create a date from its components, `None` if they do not form a valid date.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today's date in the local timezone.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// The underlying chrono date.
    pub fn naive(self) -> NaiveDate {
        self.0
    }

    /// Year component.
    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// ISO 8601 representation (`YYYY-MM-DD`), as used in API URLs.
    pub fn to_iso_string(self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl From<NaiveDate> for OfficeDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for OfficeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for OfficeDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_office_url_names_round_trip() {
        for office in Office::ALL {
            assert_eq!(office.url_name().parse::<Office>(), Ok(office));
        }
        assert_eq!(Office::Lauds.to_string(), "laudes");
        assert!("matins".parse::<Office>().is_err());
    }

    #[test]
    fn test_office_date_iso() {
        let date = OfficeDate::from_ymd(2024, 3, 1).unwrap();
        assert_eq!(date.to_iso_string(), "2024-03-01");
        assert_eq!(date.to_string(), "2024-03-01");
        assert_eq!("2024-03-01".parse::<OfficeDate>().unwrap(), date);
        assert!("01/03/2024".parse::<OfficeDate>().is_err());
        assert!(OfficeDate::from_ymd(2023, 2, 29).is_none());
    }
}
