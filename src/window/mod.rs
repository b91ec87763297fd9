use crate::error::WidgetError;
use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// The timezone releases are displayed in: a named IANA zone from config,
/// or the process-local zone when none is set.
#[derive(Debug, Clone, Copy)]
pub enum DisplayZone {
    Local,
    Named(Tz),
}

impl DisplayZone {
    pub fn resolve(name: &str) -> Result<Self, WidgetError> {
        if name.is_empty() {
            return Ok(DisplayZone::Local);
        }
        name.parse::<Tz>()
            .map(DisplayZone::Named)
            .map_err(|_| WidgetError::Timezone(name.to_string()))
    }

    pub fn to_zone(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            DisplayZone::Local => instant.with_timezone(&Local).fixed_offset(),
            DisplayZone::Named(tz) => instant.with_timezone(tz).fixed_offset(),
        }
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_zone(instant).date_naive()
    }

    fn from_local(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            DisplayZone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|t| t.with_timezone(&Utc)),
            DisplayZone::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|t| t.with_timezone(&Utc)),
        }
    }

    /// UTC instant of local midnight on `date`. When midnight falls into a
    /// DST gap the first existing wall-clock hour is used instead.
    fn start_of_day(&self, date: NaiveDate) -> Result<DateTime<Utc>, WidgetError> {
        let midnight = date.and_time(NaiveTime::MIN);
        if let Some(instant) = self.from_local(midnight) {
            return Ok(instant);
        }
        self.from_local(midnight + Duration::hours(1))
            .ok_or_else(|| WidgetError::Timezone(self.name()))
    }

    fn name(&self) -> String {
        match self {
            DisplayZone::Local => "local".to_string(),
            DisplayZone::Named(tz) => tz.name().to_string(),
        }
    }
}

/// Lookback values outside [0, 6] are treated as zero.
pub fn clamp_lookback(days: i32) -> i64 {
    if (0..=6).contains(&days) {
        i64::from(days)
    } else {
        0
    }
}

/// Two windows derived from one reference instant (now + day offset):
/// the local-day acceptance window releases must land in, and a wider UTC
/// window used only for the upstream query's start/end parameters.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseWindow {
    pub query_start: DateTime<Utc>,
    pub query_end: DateTime<Utc>,
    pub accept_start: DateTime<Utc>,
    pub accept_end: DateTime<Utc>,
}

impl ReleaseWindow {
    pub fn compute(
        now: DateTime<Utc>,
        zone: DisplayZone,
        day_offset: i32,
        lookback_days: i32,
    ) -> Result<Self, WidgetError> {
        let lookback = clamp_lookback(lookback_days);
        let reference = now + Duration::days(i64::from(day_offset));

        // Acceptance window: the reference day in the display zone,
        // stretched back over the lookback days.
        let local_date = zone.local_date(reference);
        let accept_start = zone.start_of_day(local_date - Duration::days(lookback))?;
        let accept_end = zone.start_of_day(local_date + Duration::days(1))? - Duration::milliseconds(1);

        // Query window: the reference UTC day widened by one day on each
        // side, so upstream servers in any zone return everything the
        // acceptance window could keep.
        let utc_date = reference.date_naive();
        let query_start = utc_midnight(utc_date - Duration::days(lookback + 1));
        let query_end = utc_midnight(utc_date + Duration::days(2)) - Duration::milliseconds(1);

        Ok(ReleaseWindow {
            query_start,
            query_end,
            accept_start,
            accept_end,
        })
    }

    /// Acceptance test, inclusive on both bounds.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.accept_start && instant <= self.accept_end
    }
}

fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
