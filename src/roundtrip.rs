//! The timestamp round-trip check.
//!
//! A user is inserted and read back by username. The fixed historical
//! `created_at` must come back strictly equal (same instant and offset). The
//! "now" `updated_at`, truncated to microseconds before insert, must come back
//! as the same instant.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use tracing::{debug, info};

use crate::error::{PgTimeError, Result};
use crate::schema::User;
use crate::traits::AccountRepository;
use crate::types::{instant_eq, strict_eq, truncate_to_micros};

/// Username of the fixture user.
pub const BOB: &str = "bob";

const BOB_CREATED_AT: NaiveDateTime = match (
    NaiveDate::from_ymd_opt(2009, 11, 10),
    NaiveTime::from_hms_opt(23, 0, 0),
) {
    (Some(date), Some(time)) => NaiveDateTime::new(date, time),
    _ => panic!("invalid fixture timestamp"),
};

/// 2009-11-10T23:00:00Z, the fixture's `created_at`.
pub fn bob_created_at() -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&BOB_CREATED_AT).fixed_offset()
}

/// The fixture user with `updated_at` set to `now` normalized to UTC and
/// truncated to microseconds.
pub fn bob<Tz: TimeZone>(now: DateTime<Tz>) -> User {
    let updated_at = truncate_to_micros(now.with_timezone(&Utc)).fixed_offset();
    User::new(BOB, bob_created_at(), updated_at)
}

/// Compares a user read back from the database with the one inserted.
pub fn verify_round_trip(expected: &User, actual: &User) -> Result<()> {
    if !instant_eq(&expected.updated_at, &actual.updated_at) {
        return Err(mismatch("updated_at", &expected.updated_at, &actual.updated_at));
    }
    if !strict_eq(&expected.created_at, &actual.created_at) {
        return Err(mismatch("created_at", &expected.created_at, &actual.created_at));
    }
    Ok(())
}

fn mismatch(
    field: &'static str,
    expected: &DateTime<FixedOffset>,
    actual: &DateTime<FixedOffset>,
) -> PgTimeError {
    PgTimeError::Mismatch {
        field,
        expected: expected.to_rfc3339(),
        actual: actual.to_rfc3339(),
    }
}

/// Ensures the schema, clears the table, inserts `user` and reads it back.
///
/// Returns the stored user. Any error aborts the run; nothing is retried.
pub async fn run_round_trip(repo: &dyn AccountRepository, user: &User) -> Result<User> {
    repo.ensure_schema().await?;
    let deleted = repo.delete_all().await?;
    debug!(repo = repo.label(), deleted, "Cleared account table");

    repo.create(user).await?;
    let stored = repo
        .find_by_username(&user.username)
        .await?
        .ok_or(PgTimeError::UnexpectedRowCount {
            expected: 1,
            actual: 0,
        })?;

    verify_round_trip(user, &stored)?;
    info!(
        repo = repo.label(),
        id = stored.id,
        created_at = %stored.created_at,
        updated_at = %stored.updated_at,
        "Round trip verified"
    );
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 15).unwrap() + TimeDelta::nanoseconds(987_654_321)
    }

    #[test]
    fn test_bob_fixture() {
        let user = bob(now());

        assert_eq!(user.id, 0);
        assert_eq!(user.username, "bob");
        assert_eq!(user.created_at.to_rfc3339(), "2009-11-10T23:00:00+00:00");
        assert_eq!(
            user.updated_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 15).unwrap()
                + TimeDelta::microseconds(987_654)
        );
        assert_eq!(user.updated_at.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_bob_created_at_is_fixed_instant() {
        let created_at = bob_created_at();
        assert_eq!(created_at.timestamp(), 1_257_894_000);
        assert_eq!(created_at.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_bob_normalizes_offset_to_utc() {
        let berlin = FixedOffset::east_opt(3600).unwrap();
        let user = bob(now().with_timezone(&berlin));
        assert_eq!(user.updated_at.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_verify_accepts_identical_users() {
        let expected = bob(now());
        let mut actual = expected.clone();
        actual.id = 1;
        assert!(verify_round_trip(&expected, &actual).is_ok());
    }

    #[test]
    fn test_verify_updated_at_uses_instant_equality() {
        let expected = bob(now());
        let mut actual = expected.clone();
        actual.updated_at = expected
            .updated_at
            .with_timezone(&FixedOffset::west_opt(5 * 3600).unwrap());
        assert!(verify_round_trip(&expected, &actual).is_ok());

        actual.updated_at = expected.updated_at + TimeDelta::microseconds(1);
        match verify_round_trip(&expected, &actual).unwrap_err() {
            PgTimeError::Mismatch { field, .. } => assert_eq!(field, "updated_at"),
            other => panic!("Expected Mismatch error, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_created_at_uses_strict_equality() {
        let expected = bob(now());
        let mut actual = expected.clone();
        actual.created_at = expected
            .created_at
            .with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap());

        match verify_round_trip(&expected, &actual).unwrap_err() {
            PgTimeError::Mismatch {
                field,
                expected,
                actual,
            } => {
                assert_eq!(field, "created_at");
                assert_eq!(expected, "2009-11-10T23:00:00+00:00");
                assert_eq!(actual, "2009-11-11T01:00:00+02:00");
            }
            other => panic!("Expected Mismatch error, got {:?}", other),
        }
    }

    #[test]
    fn test_untruncated_now_would_not_round_trip() {
        let expected = User::new(BOB, bob_created_at(), now().fixed_offset());
        let stored = User::new(BOB, bob_created_at(), bob(now()).updated_at);
        assert!(verify_round_trip(&expected, &stored).is_err());
    }
}
