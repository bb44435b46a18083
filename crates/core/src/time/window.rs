use chrono::{DateTime, Duration, NaiveDate, Utc};

const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/// Trailing time window that news searches are restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewsWindow {
    lookback: Duration,
}

impl Default for NewsWindow {
    fn default() -> Self {
        Self {
            lookback: Duration::hours(DEFAULT_LOOKBACK_HOURS),
        }
    }
}

impl NewsWindow {
    pub fn from_hours(hours: i64) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (1..=24 * 30).contains(&hours),
            "news window must be 1..=720 hours (got {hours})"
        );
        Ok(Self {
            lookback: Duration::hours(hours),
        })
    }

    pub fn from_settings(hours: Option<i64>) -> anyhow::Result<Self> {
        hours.map_or_else(|| Ok(Self::default()), Self::from_hours)
    }

    pub fn lookback(&self) -> Duration {
        self.lookback
    }

    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.lookback
    }

    /// Calendar date (UTC) the window opens on. Search APIs take day granularity.
    pub fn from_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.start(now).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_is_previous_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 30, 0).unwrap();
        let window = NewsWindow::default();
        assert_eq!(window.lookback(), Duration::hours(24));
        assert_eq!(
            window.from_date(now),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }

    #[test]
    fn custom_window() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let window = NewsWindow::from_hours(72).unwrap();
        assert_eq!(
            window.start(now),
            Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(NewsWindow::from_hours(0).is_err());
        assert!(NewsWindow::from_hours(-5).is_err());
        assert!(NewsWindow::from_hours(24 * 31).is_err());
        assert_eq!(NewsWindow::from_settings(None).unwrap(), NewsWindow::default());
    }
}
