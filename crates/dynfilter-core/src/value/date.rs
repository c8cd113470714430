use serde::{Serialize, Serializer};
use std::fmt::{self, Display};
use time::{Date as TimeDate, Month, PrimitiveDateTime, Time, macros::format_description};

///
/// Date
///
/// Calendar date without a time component.
/// Keys render as ISO `YYYY-MM-DD`; labels render as `DD/MM/YYYY`.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Date(TimeDate);

impl Date {
    #[must_use]
    pub fn new_checked(y: i32, m: u8, d: u8) -> Option<Self> {
        let month = Month::try_from(m).ok()?;
        let date = TimeDate::from_calendar_date(y, month, d).ok()?;

        Some(Self(date))
    }

    /// Parse an ISO `YYYY-MM-DD` string into a `Date`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        TimeDate::parse(s, format_description!("[year]-[month]-[day]"))
            .ok()
            .map(Self)
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.0.year()
    }

    #[must_use]
    pub fn month(self) -> u8 {
        self.0.month().into()
    }

    #[must_use]
    pub const fn day(self) -> u8 {
        self.0.day()
    }

    /// Render as ISO `YYYY-MM-DD`.
    #[must_use]
    pub fn to_iso(self) -> String {
        // date-only descriptions cannot fail for a calendar date
        self.0
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default()
    }

    /// Render in the display format `DD/MM/YYYY`.
    #[must_use]
    pub fn to_display(self) -> String {
        self.0
            .format(format_description!("[day]/[month]/[year]"))
            .unwrap_or_default()
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso())
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso())
    }
}

///
/// Timestamp
///
/// Date with a wall-clock time, no offset.
/// Formats and projects through its date component.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timestamp(PrimitiveDateTime);

impl Timestamp {
    #[must_use]
    pub fn new_checked(date: Date, hour: u8, minute: u8, second: u8) -> Option<Self> {
        let time = Time::from_hms(hour, minute, second).ok()?;

        Some(Self(PrimitiveDateTime::new(date.0, time)))
    }

    /// Parse `YYYY-MM-DD HH:MM:SS`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        PrimitiveDateTime::parse(
            s,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
        .ok()
        .map(Self)
    }

    #[must_use]
    pub const fn date(self) -> Date {
        Date(self.0.date())
    }

    #[must_use]
    pub fn to_iso(self) -> String {
        self.0
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .unwrap_or_default()
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso())
    }
}

///
/// TESTS
///
