use chrono::{DateTime, TimeZone, Utc};

/// Source of the current time for `Date` and `Expires` headers.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Formats a timestamp the way HTTP date headers expect it.
///
/// The day of month is not zero padded, matching `Tue, 3 Jun 2008 11:05:30 GMT`.
///
/// ```
/// # use chrono::{TimeZone, Utc};
/// # use rawhttp::clock::rfc1123;
/// let t = Utc.with_ymd_and_hms(2008, 6, 3, 11, 5, 30).unwrap();
/// assert_eq!(rfc1123(&t), "Tue, 3 Jun 2008 11:05:30 GMT");
/// ```
pub fn rfc1123<Tz: TimeZone>(time: &DateTime<Tz>) -> String {
    time.with_timezone(&Utc)
        .format("%a, %-d %b %Y %H:%M:%S GMT")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn offsets_are_rendered_in_gmt() {
        let kyiv = FixedOffset::east_opt(3 * 3600).unwrap();
        let t = kyiv.with_ymd_and_hms(2019, 1, 15, 2, 0, 0).unwrap();
        assert_eq!(rfc1123(&t), "Mon, 14 Jan 2019 23:00:00 GMT");
    }

    #[test]
    fn fixed_clock_never_moves() {
        let t = Utc.with_ymd_and_hms(2020, 2, 29, 12, 0, 0).unwrap();
        let clock = FixedClock(t);
        assert_eq!(clock.now(), t);
        assert_eq!(clock.now(), clock.now());
    }
}
