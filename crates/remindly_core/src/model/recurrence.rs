//! Recurrence rule model and its persisted wire shape.
//!
//! # Responsibility
//! - Represent recurrence as a tagged variant instead of a loose record.
//! - Convert to/from the JSON blob stored in `reminders.recurrence`.
//!
//! # Invariants
//! - `interval >= 1` for every variant.
//! - `day_of_month`, when set, is within `1..=31`.
//! - A stored `{"type":"none"}` decodes to "no recurrence", never to a rule.
//!
//! # See also
//! - `schedule::engine` for the date arithmetic over these rules.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Repetition pattern of a recurring reminder.
///
/// `days_of_week` and `day_of_month` are descriptive metadata. Occurrence
/// arithmetic only adds `interval` periods to the previous occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    Daily {
        interval: u32,
    },
    Weekly {
        interval: u32,
        days_of_week: Vec<Weekday>,
    },
    Monthly {
        interval: u32,
        day_of_month: Option<u32>,
    },
}

/// Full recurrence rule: pattern plus optional series end date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecurrenceRecord", into = "RecurrenceRecord")]
pub struct RecurrenceRule {
    pub pattern: Recurrence,
    /// No occurrence may be generated after midnight at the start of this date.
    pub end_date: Option<NaiveDate>,
}

/// Discriminator used by the persisted wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    None,
    Daily,
    Weekly,
    Monthly,
}

/// Persisted/exported JSON shape of a recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRecord {
    #[serde(rename = "type")]
    pub kind: RecurrenceType,
    #[serde(default)]
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Recurrence validation/decoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    ZeroInterval,
    DayOfMonthOutOfRange(u32),
    WeekdayOutOfRange(u8),
    InvalidEndDate(String),
    /// `type = none` cannot be turned into a rule.
    NoRecurrence,
    Malformed(String),
}

impl Display for RecurrenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroInterval => write!(f, "recurrence interval must be at least 1"),
            Self::DayOfMonthOutOfRange(day) => {
                write!(f, "day of month must be within 1..=31, got {day}")
            }
            Self::WeekdayOutOfRange(day) => {
                write!(f, "weekday index must be within 0..=6, got {day}")
            }
            Self::InvalidEndDate(value) => write!(f, "invalid recurrence end date `{value}`"),
            Self::NoRecurrence => write!(f, "recurrence type `none` carries no rule"),
            Self::Malformed(details) => write!(f, "malformed recurrence: {details}"),
        }
    }
}

impl Error for RecurrenceError {}

impl RecurrenceRule {
    pub fn daily(interval: u32) -> Self {
        Self {
            pattern: Recurrence::Daily { interval },
            end_date: None,
        }
    }

    pub fn weekly(interval: u32, days_of_week: Vec<Weekday>) -> Self {
        Self {
            pattern: Recurrence::Weekly {
                interval,
                days_of_week,
            },
            end_date: None,
        }
    }

    pub fn monthly(interval: u32, day_of_month: Option<u32>) -> Self {
        Self {
            pattern: Recurrence::Monthly {
                interval,
                day_of_month,
            },
            end_date: None,
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn interval(&self) -> u32 {
        match &self.pattern {
            Recurrence::Daily { interval }
            | Recurrence::Weekly { interval, .. }
            | Recurrence::Monthly { interval, .. } => *interval,
        }
    }

    pub fn kind(&self) -> RecurrenceType {
        match &self.pattern {
            Recurrence::Daily { .. } => RecurrenceType::Daily,
            Recurrence::Weekly { .. } => RecurrenceType::Weekly,
            Recurrence::Monthly { .. } => RecurrenceType::Monthly,
        }
    }

    pub fn validate(&self) -> Result<(), RecurrenceError> {
        if self.interval() == 0 {
            return Err(RecurrenceError::ZeroInterval);
        }
        if let Recurrence::Monthly {
            day_of_month: Some(day),
            ..
        } = &self.pattern
        {
            if !(1..=31).contains(day) {
                return Err(RecurrenceError::DayOfMonthOutOfRange(*day));
            }
        }
        Ok(())
    }

    /// Applies creation-time defaults relative to the first occurrence.
    ///
    /// A weekly rule without weekdays gets the weekday of `first`; weekday
    /// lists are sorted Sunday-first and deduplicated.
    pub fn normalized_for(mut self, first: NaiveDateTime) -> Self {
        if let Recurrence::Weekly { days_of_week, .. } = &mut self.pattern {
            if days_of_week.is_empty() {
                days_of_week.push(first.weekday());
            }
            days_of_week.sort_by_key(|day| day.num_days_from_sunday());
            days_of_week.dedup();
        }
        self
    }

    /// Decodes the persisted record. `type = none` yields `Ok(None)`.
    pub fn from_record(record: RecurrenceRecord) -> Result<Option<Self>, RecurrenceError> {
        match Self::try_from(record) {
            Ok(rule) => Ok(Some(rule)),
            Err(RecurrenceError::NoRecurrence) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Decodes the JSON text stored in `reminders.recurrence`.
    pub fn from_json(value: &str) -> Result<Option<Self>, RecurrenceError> {
        let record: RecurrenceRecord = serde_json::from_str(value)
            .map_err(|err| RecurrenceError::Malformed(err.to_string()))?;
        Self::from_record(record)
    }

    /// Encodes the rule as compact wire JSON.
    pub fn to_json(&self) -> String {
        let record = RecurrenceRecord::from(self.clone());
        serde_json::to_string(&record).unwrap_or_else(|_| "null".to_string())
    }
}

impl TryFrom<RecurrenceRecord> for RecurrenceRule {
    type Error = RecurrenceError;

    fn try_from(record: RecurrenceRecord) -> Result<Self, Self::Error> {
        let pattern = match record.kind {
            RecurrenceType::None => return Err(RecurrenceError::NoRecurrence),
            RecurrenceType::Daily => Recurrence::Daily {
                interval: record.interval,
            },
            RecurrenceType::Weekly => {
                let days_of_week = record
                    .days_of_week
                    .unwrap_or_default()
                    .into_iter()
                    .map(|index| {
                        weekday_from_sunday_index(index)
                            .ok_or(RecurrenceError::WeekdayOutOfRange(index))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Recurrence::Weekly {
                    interval: record.interval,
                    days_of_week,
                }
            }
            RecurrenceType::Monthly => Recurrence::Monthly {
                interval: record.interval,
                day_of_month: record.day_of_month,
            },
        };

        let end_date = match record.end_date.as_deref() {
            Some(value) => Some(parse_end_date(value)?),
            None => None,
        };

        let rule = Self { pattern, end_date };
        rule.validate()?;
        Ok(rule)
    }
}

impl From<RecurrenceRule> for RecurrenceRecord {
    fn from(rule: RecurrenceRule) -> Self {
        let kind = rule.kind();
        let interval = rule.interval();
        let (days_of_week, day_of_month) = match rule.pattern {
            Recurrence::Daily { .. } => (None, None),
            Recurrence::Weekly { days_of_week, .. } => (
                Some(
                    days_of_week
                        .iter()
                        .map(|day| day.num_days_from_sunday() as u8)
                        .collect(),
                ),
                None,
            ),
            Recurrence::Monthly { day_of_month, .. } => (None, day_of_month),
        };
        Self {
            kind,
            interval,
            days_of_week,
            day_of_month,
            end_date: rule
                .end_date
                .map(|date| date.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Maps `0=Sunday..6=Saturday` to a chrono weekday.
pub fn weekday_from_sunday_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

fn parse_end_date(value: &str) -> Result<NaiveDate, RecurrenceError> {
    let trimmed = value.trim();
    // Full datetimes are accepted; only the calendar date is significant.
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| RecurrenceError::InvalidEndDate(value.to_string()))
}
