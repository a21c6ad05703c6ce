#![forbid(unsafe_code)]

use time::Date;
use time::format_description::FormatItem;
use time::macros::format_description;

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Inclusive calendar range covered by a framework.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Period {
    start: Date,
    end: Date,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeriodError {
    InvalidDate { field: &'static str },
    EndBeforeStart,
}

impl PeriodError {
    pub fn message(&self) -> String {
        match self {
            Self::InvalidDate { field } => format!("{field} must be a YYYY-MM-DD date"),
            Self::EndBeforeStart => "end_date must not be before start_date".to_string(),
        }
    }
}

impl Period {
    pub fn try_new(start: Date, end: Date) -> Result<Self, PeriodError> {
        if end < start {
            return Err(PeriodError::EndBeforeStart);
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, PeriodError> {
        let start = parse_date("start_date", start)?;
        let end = parse_date("end_date", end)?;
        Self::try_new(start, end)
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Both ends are inclusive, so a period ending the day before another starts
    /// does not overlap it.
    pub fn overlaps(&self, other: &Period) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

pub fn parse_date(field: &'static str, value: &str) -> Result<Date, PeriodError> {
    Date::parse(value.trim(), ISO_DATE).map_err(|_| PeriodError::InvalidDate { field })
}

pub fn format_date(date: Date) -> String {
    date.format(ISO_DATE).unwrap_or_else(|_| {
        format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        )
    })
}
