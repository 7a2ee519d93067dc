use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use parking_lot::Mutex;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Converts epoch seconds (UTC) into the host's local wall-clock time.
///
/// Total over `f64`: non-finite or unrepresentable inputs saturate to the
/// nearest representable instant instead of failing. Whether the result lies
/// in the past is for the caller to decide.
pub fn to_local(epoch_seconds: f64) -> DateTime<Local> {
    to_zone(epoch_seconds, &Local)
}

/// Same conversion as [`to_local`], into an arbitrary zone.
pub fn to_zone<Tz: TimeZone>(epoch_seconds: f64, tz: &Tz) -> DateTime<Tz> {
    to_utc(epoch_seconds).with_timezone(tz)
}

fn to_utc(epoch_seconds: f64) -> DateTime<Utc> {
    if epoch_seconds.is_nan() {
        return DateTime::UNIX_EPOCH;
    }
    let saturated = if epoch_seconds.is_sign_negative() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    };
    if !epoch_seconds.is_finite() {
        return saturated;
    }

    let whole = epoch_seconds.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return saturated;
    }
    let nanos = ((epoch_seconds - whole) * NANOS_PER_SECOND).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)).unwrap_or(saturated)
}

/// Source of "now" for scheduling decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn at_epoch(epoch_seconds: f64) -> Self {
        Self::new(to_local(epoch_seconds))
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, Timelike};

    #[test]
    fn epoch_zero_is_unix_epoch_in_local_zone() {
        let local = to_local(0.0);
        assert_eq!(local.timestamp(), 0);
        assert_eq!(local, DateTime::<Utc>::UNIX_EPOCH.with_timezone(&Local));
    }

    #[test]
    fn fixed_offset_shifts_wall_clock_only() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let converted = to_zone(0.0, &plus_two);
        assert_eq!(
            converted.naive_local(),
            NaiveDate::from_ymd_opt(1970, 1, 1)
                .unwrap()
                .and_hms_opt(2, 0, 0)
                .unwrap()
        );
        assert_eq!(converted.timestamp(), 0);

        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let converted = to_zone(1_700_000_000.0, &minus_five);
        assert_eq!(converted.timestamp(), 1_700_000_000);
        assert_eq!(converted.hour(), 17);
    }

    #[test]
    fn keeps_fractional_seconds() {
        let converted = to_zone(1.25, &Utc);
        assert_eq!(converted.timestamp(), 1);
        assert_eq!(converted.timestamp_subsec_millis(), 250);

        let negative = to_zone(-0.5, &Utc);
        assert_eq!(negative.timestamp(), -1);
        assert_eq!(negative.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn non_finite_inputs_do_not_panic() {
        assert_eq!(to_zone(f64::NAN, &Utc), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(to_zone(f64::INFINITY, &Utc), DateTime::<Utc>::MAX_UTC);
        assert_eq!(to_zone(f64::NEG_INFINITY, &Utc), DateTime::<Utc>::MIN_UTC);
        assert_eq!(to_zone(1e300, &Utc), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::at_epoch(1_000.0);
        clock.advance(Duration::seconds(30));
        assert_eq!(clock.now().timestamp(), 1_030);
    }
}
