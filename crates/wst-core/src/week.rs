//! Weekly reset boundaries. Regions reset on Tuesday at 15:00 UTC; a week is
//! identified by the date of the reset that opened it, as `YYYYMMDD`.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};

use crate::config::Config;
use crate::store::CharacterStore;

pub const RESET_WEEKDAY: Weekday = Weekday::Tue;
pub const RESET_HOUR: u32 = 15;

/// Config key holding the week the collection was last reset for.
pub const LAST_WEEK_KEY: &str = "last_week_id";

pub fn week_id_for(at: DateTime<Utc>) -> String {
    let mut days_back = (at.weekday().num_days_from_monday() + 7
        - RESET_WEEKDAY.num_days_from_monday())
        % 7;
    if days_back == 0 && at.hour() < RESET_HOUR {
        days_back = 7;
    }
    let reset_day = (at - Duration::days(days_back as i64)).date_naive();
    format!(
        "{:04}{:02}{:02}",
        reset_day.year(),
        reset_day.month(),
        reset_day.day()
    )
}

pub fn current_week_id() -> String {
    week_id_for(Utc::now())
}

/// Reset every character's weekly fields if `current_week` differs from the
/// week recorded in `config`. The first call only records the week.
///
/// Returns true when a reset happened. Neither store is saved here.
pub fn check_weekly_reset(
    config: &mut Config,
    store: &mut CharacterStore,
    current_week: &str,
) -> bool {
    let last = config.get_str(LAST_WEEK_KEY).map(str::to_string);
    match last {
        None => {
            config.set(LAST_WEEK_KEY, current_week);
            false
        }
        Some(last) if last != current_week => {
            tracing::info!(from = %last, to = %current_week, "weekly reset");
            store.reset_weekly_all();
            config.set(LAST_WEEK_KEY, current_week);
            true
        }
        Some(_) => false,
    }
}
