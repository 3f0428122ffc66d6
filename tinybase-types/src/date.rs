use std::fmt;

use tinybase_error::Error;

/// A calendar date, ordered by `(year, month, day)` (§3 "Scalar types").
///
/// Unlike the lexer, which only recognises the `YYYY-MM-DD` *shape*,
/// [`Date::new`] validates that the fields name a real calendar date
/// (month in 1..=12, day within the month, including leap years).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Date {
    year: i32,
    month: u8,
    day: u8,
}

impl Date {
    /// Validates and builds a date, or reports a [`Error::TypeMismatch`].
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, Error> {
        if !(1..=12).contains(&month) {
            return Err(Error::TypeMismatch(format!(
                "invalid date: month {} out of range",
                month
            )));
        }
        if day < 1 || day > days_in_month(year, month) {
            return Err(Error::TypeMismatch(format!(
                "invalid date: day {} out of range for {:04}-{:02}",
                day, year, month
            )));
        }
        Ok(Date {
            year,
            month: month as u8,
            day: day as u8,
        })
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The calendar month, 1-12.
    pub fn month(&self) -> u32 {
        self.month as u32
    }

    /// The calendar day, 1-31.
    pub fn day(&self) -> u32 {
        self.day as u32
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_leap_day() {
        assert!(Date::new(2024, 2, 29).is_ok());
    }

    #[test]
    fn rejects_non_leap_day() {
        assert!(Date::new(2023, 2, 29).is_err());
    }

    #[test]
    fn rejects_month_out_of_range() {
        assert!(Date::new(2024, 13, 1).is_err());
    }

    #[test]
    fn orders_by_year_then_month_then_day() {
        let a = Date::new(2024, 1, 31).unwrap();
        let b = Date::new(2024, 2, 1).unwrap();
        assert!(a < b);
    }
}
