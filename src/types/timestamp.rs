use std::error::Error;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, SubsecRound, TimeZone, Utc};
use tokio_postgres::types::{FromSql, Timestamp, Type};

use crate::error::{PgTimeError, Result};

/// Truncates a timestamp to microsecond precision, the resolution PostgreSQL
/// stores `timestamp` and `timestamptz` values at.
pub fn truncate_to_micros<Tz: TimeZone>(value: DateTime<Tz>) -> DateTime<Tz> {
    value.trunc_subsecs(6)
}

/// True when both values denote the same point in time, whatever their offsets.
pub fn instant_eq<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> bool {
    a == b
}

/// True when both values denote the same instant and carry the same UTC offset.
pub fn strict_eq<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> bool {
    a == b && a.offset().fix() == b.offset().fix()
}

/// The decoded content of a timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampValue {
    Finite(DateTime<FixedOffset>),
    Infinity,
    NegativeInfinity,
}

/// A timestamp decoded from its binary representation, keeping track of
/// whether the source column carried a time zone.
///
/// Accepts both `timestamptz` and `timestamp` columns. Wall-clock values from
/// a `timestamp` column are interpreted as UTC. The special values `infinity`
/// and `-infinity` decode to [`TimestampValue::Infinity`] and
/// [`TimestampValue::NegativeInfinity`].
///
/// # Example
/// ```ignore
/// let row = client.query_one(READ_USER, &[&"bob"]).await?;
/// let created_at: Timestamptz = row.get("created_at");
/// assert!(created_at.has_time_zone());
/// let instant = created_at.time()?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamptz {
    value: TimestampValue,
    has_time_zone: bool,
}

impl Timestamptz {
    pub fn new(value: TimestampValue, has_time_zone: bool) -> Self {
        Self {
            value,
            has_time_zone,
        }
    }

    pub fn value(&self) -> TimestampValue {
        self.value
    }

    /// Whether the source column was `timestamptz` rather than `timestamp`.
    pub fn has_time_zone(&self) -> bool {
        self.has_time_zone
    }

    pub fn is_finite(&self) -> bool {
        matches!(self.value, TimestampValue::Finite(_))
    }

    /// Returns the decoded instant.
    /// Fails for `infinity` and `-infinity`.
    pub fn time(&self) -> Result<DateTime<FixedOffset>> {
        match self.value {
            TimestampValue::Finite(instant) => Ok(instant),
            TimestampValue::Infinity | TimestampValue::NegativeInfinity => {
                Err(PgTimeError::InfiniteTimestamp)
            }
        }
    }
}

impl<'a> FromSql<'a> for Timestamptz {
    fn from_sql(
        ty: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn Error + Sync + Send>> {
        if *ty == Type::TIMESTAMPTZ {
            let decoded = Timestamp::<DateTime<Utc>>::from_sql(ty, raw)?;
            Ok(Self::new(to_value(decoded, |v| v.fixed_offset()), true))
        } else {
            let decoded = Timestamp::<NaiveDateTime>::from_sql(ty, raw)?;
            Ok(Self::new(
                to_value(decoded, |v| Utc.from_utc_datetime(&v).fixed_offset()),
                false,
            ))
        }
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::TIMESTAMPTZ || *ty == Type::TIMESTAMP
    }
}

fn to_value<T>(
    decoded: Timestamp<T>,
    finite: impl FnOnce(T) -> DateTime<FixedOffset>,
) -> TimestampValue {
    match decoded {
        Timestamp::Value(v) => TimestampValue::Finite(finite(v)),
        Timestamp::PosInfinity => TimestampValue::Infinity,
        Timestamp::NegInfinity => TimestampValue::NegativeInfinity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn decode(ty: &Type, raw: &[u8]) -> Timestamptz {
        Timestamptz::from_sql(ty, raw).unwrap()
    }

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2009, 11, 10, 23, 0, 0).unwrap()
    }

    #[test]
    fn test_decode_timestamptz() {
        // 2009-11-10T23:00:00Z is 311209200 seconds after the PostgreSQL epoch.
        let raw = 311_209_200_000_000i64.to_be_bytes();
        let decoded = decode(&Type::TIMESTAMPTZ, &raw);

        assert!(decoded.has_time_zone());
        assert!(decoded.is_finite());
        assert!(strict_eq(&decoded.time().unwrap(), &created_at()));
    }

    #[test]
    fn test_decode_before_epoch() {
        let decoded = decode(&Type::TIMESTAMP, &(-1i64).to_be_bytes());
        let expected = Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap()
            + TimeDelta::microseconds(999_999);

        assert!(!decoded.has_time_zone());
        assert_eq!(decoded.time().unwrap(), expected);
    }

    #[test]
    fn test_decode_infinity() {
        let inf = decode(&Type::TIMESTAMPTZ, &i64::MAX.to_be_bytes());
        let neg = decode(&Type::TIMESTAMP, &i64::MIN.to_be_bytes());

        assert_eq!(inf.value(), TimestampValue::Infinity);
        assert_eq!(neg.value(), TimestampValue::NegativeInfinity);
        assert!(!inf.is_finite());
        assert!(matches!(inf.time(), Err(PgTimeError::InfiniteTimestamp)));
    }

    #[test]
    fn test_decode_rejects_short_payload() {
        assert!(Timestamptz::from_sql(&Type::TIMESTAMPTZ, &[0, 1, 2]).is_err());
    }

    #[test]
    fn test_accepts_only_timestamp_types() {
        assert!(<Timestamptz as FromSql>::accepts(&Type::TIMESTAMPTZ));
        assert!(<Timestamptz as FromSql>::accepts(&Type::TIMESTAMP));
        assert!(!<Timestamptz as FromSql>::accepts(&Type::DATE));
        assert!(!<Timestamptz as FromSql>::accepts(&Type::INT8));
    }

    #[test]
    fn test_truncate_to_micros() {
        let precise = created_at() + TimeDelta::nanoseconds(123_456_789);
        let truncated = truncate_to_micros(precise);

        assert_eq!(truncated, created_at() + TimeDelta::microseconds(123_456));
        assert_eq!(truncate_to_micros(truncated), truncated);
    }

    #[test]
    fn test_strict_and_instant_equality() {
        let utc = created_at();
        let plus_two = utc.with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap());

        assert!(instant_eq(&utc, &plus_two));
        assert!(!strict_eq(&utc, &plus_two));
        assert!(strict_eq(&utc, &utc.fixed_offset()));
        assert!(!instant_eq(&utc, &(utc + TimeDelta::microseconds(1))));
    }
}
