//! Worker names and date windows

use chrono::{Days, NaiveDate};
use tweetline_core::WorkerPlan;

const NATO: [&str; 26] = [
    "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel", "India", "Juliett",
    "Kilo", "Lima", "Mike", "November", "Oscar", "Papa", "Quebec", "Romeo", "Sierra", "Tango",
    "Uniform", "Victor", "Whiskey", "Xray", "Yankee", "Zulu",
];

/// Name for the worker at `idx` (0-based)
pub fn worker_name(idx: usize) -> String {
    match NATO.get(idx) {
        Some(name) => (*name).to_string(),
        None => format!("Worker{}", idx + 1),
    }
}

/// One plan per worker: the window upper bound is `today + 1`, stepping back
/// one day per worker.
pub fn plan_windows(workers: usize, today: NaiveDate) -> Vec<WorkerPlan> {
    let upper = today.checked_add_days(Days::new(1)).unwrap_or(today);
    (0..workers)
        .map(|idx| WorkerPlan {
            name: worker_name(idx),
            until: upper
                .checked_sub_days(Days::new(idx as u64))
                .unwrap_or(NaiveDate::MIN),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn nato_then_numbered() {
        assert_eq!(worker_name(0), "Alpha");
        assert_eq!(worker_name(6), "Golf");
        assert_eq!(worker_name(25), "Zulu");
        assert_eq!(worker_name(26), "Worker27");
    }

    #[test]
    fn windows_step_back_from_tomorrow() {
        let plans = plan_windows(3, date(2024, 3, 1));
        let untils: Vec<NaiveDate> = plans.iter().map(|p| p.until).collect();
        assert_eq!(untils, [date(2024, 3, 2), date(2024, 3, 1), date(2024, 2, 29)]);
        assert_eq!(plans[2].name, "Charlie");
    }

    #[test]
    fn crosses_year_boundary() {
        let plans = plan_windows(2, date(2023, 12, 31));
        assert_eq!(plans[0].until, date(2024, 1, 1));
        assert_eq!(plans[1].until, date(2023, 12, 31));
    }

    #[test]
    fn zero_workers() {
        assert!(plan_windows(0, date(2024, 1, 1)).is_empty());
    }
}
