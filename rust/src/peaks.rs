//! Seasonal demand peaks as ready-made reinforcement events.

use chrono::{Duration, NaiveDate, Weekday};

use crate::models::ReinforcementEvent;

/// Black Friday: the day after the fourth Thursday of November.
pub fn black_friday(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Thu, 4).map(|d| d + Duration::days(1))
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Reinforcement events for the retail peaks of `year`.
///
/// Epiphany and the winter sales fall in January of the following year.
/// Returns an empty list for years chrono cannot represent.
pub fn seasonal_peaks(year: i32) -> Vec<ReinforcementEvent> {
    let build = || -> Option<Vec<ReinforcementEvent>> {
        let friday = black_friday(year)?;
        let next = year + 1;
        Some(vec![
            ReinforcementEvent::new(&format!("Black Friday {}", year), friday, friday, 2, 0),
            ReinforcementEvent::new(
                &format!("Black Friday weekend {}", year),
                friday + Duration::days(1),
                friday + Duration::days(2),
                0,
                1,
            ),
            ReinforcementEvent::new(&format!("Christmas {}", year), ymd(year, 12, 15)?, ymd(year, 12, 31)?, 1, 1),
            ReinforcementEvent::new(&format!("Epiphany {}", next), ymd(next, 1, 2)?, ymd(next, 1, 6)?, 1, 1),
            ReinforcementEvent::new(&format!("Winter sales {}", next), ymd(next, 1, 7)?, ymd(next, 1, 20)?, 1, 1),
            ReinforcementEvent::new(&format!("Summer sales {}", year), ymd(year, 7, 1)?, ymd(year, 7, 15)?, 1, 1),
        ])
    };
    build().unwrap_or_default()
}
