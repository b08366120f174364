//! Billing period calendar type.
//!
//! A [`Period`] identifies one (year, month) billing cycle. Charges are
//! keyed by period and never re-keyed, so the type is a small immutable
//! value with ordering, a `YYYY-MM` wire form, and the due-date math used
//! everywhere a due date is computed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};

/// Years accepted for billing periods. Keeps every derived `Date` inside
/// the representable calendar range.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1970..=9999;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("month out of range: {0} (expected 1-12)")]
    MonthOutOfRange(u8),
    #[error("year out of range: {0}")]
    YearOutOfRange(i32),
    #[error("malformed period {0:?} (expected YYYY-MM)")]
    Malformed(String),
}

/// One (year, month) billing cycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "PeriodParts", into = "PeriodParts")]
pub struct Period {
    year: i32,
    month: u8,
}

/// Raw serde representation of a [`Period`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PeriodParts {
    year: i32,
    month: u8,
}

impl TryFrom<PeriodParts> for Period {
    type Error = PeriodError;

    fn try_from(parts: PeriodParts) -> Result<Self, Self::Error> {
        Period::new(parts.year, parts.month)
    }
}

impl From<Period> for PeriodParts {
    fn from(period: Period) -> Self {
        Self {
            year: period.year,
            month: period.month,
        }
    }
}

impl Period {
    /// Build a validated period. Months are 1-12.
    pub fn new(year: i32, month: u8) -> Result<Self, PeriodError> {
        if !YEAR_RANGE.contains(&year) {
            return Err(PeriodError::YearOutOfRange(year));
        }
        if !(1..=12).contains(&month) {
            return Err(PeriodError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    /// The period containing the given calendar date.
    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    /// The period containing today (UTC).
    pub fn current() -> Self {
        Self::containing(OffsetDateTime::now_utc().date())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    fn month_enum(&self) -> Month {
        // Month is validated in `new`, so the fallback is unreachable.
        Month::try_from(self.month).unwrap_or(Month::January)
    }

    pub fn first_day(&self) -> Date {
        Date::from_calendar_date(self.year, self.month_enum(), 1).unwrap_or(Date::MIN)
    }

    pub fn last_day(&self) -> Date {
        let day = time::util::days_in_year_month(self.year, self.month_enum());
        Date::from_calendar_date(self.year, self.month_enum(), day).unwrap_or(Date::MIN)
    }

    /// Due date for charges in this period under a fixed day-of-month
    /// policy. Days past the end of the month clamp to its last day, so a
    /// configured day 31 behaves as "last day of month".
    pub fn due_date(&self, due_day: u8) -> Date {
        let last = time::util::days_in_year_month(self.year, self.month_enum());
        let day = due_day.clamp(1, last);
        Date::from_calendar_date(self.year, self.month_enum(), day).unwrap_or(Date::MIN)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PeriodError::Malformed(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(malformed)?;
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u8 = month.parse().map_err(|_| malformed())?;
        Self::new(year, month)
    }
}

/// Whole days the due date lies in the past, floored at zero.
pub fn days_overdue(due_date: Date, today: Date) -> i64 {
    (today - due_date).whole_days().max(0)
}

/// Serde helpers rendering `time::Date` as a `YYYY-MM-DD` string.
pub mod serde_date {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::format_description::BorrowedFormatItem;
    use time::macros::format_description;
    use time::Date;

    const FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = date.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Date::parse(&raw, FORMAT).map_err(D::Error::custom)
    }

    /// Same format for `Option<Date>` fields.
    pub mod option {
        use super::FORMAT;
        use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S: Serializer>(
            date: &Option<Date>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Date>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            raw.map(|s| Date::parse(&s, FORMAT).map_err(D::Error::custom))
                .transpose()
        }
    }
}
