//! Visit lifecycle: visitor status transitions, check-in/check-out,
//! badge issuance and classification queries.
//!
//! A visitor moves pending -> approved -> rejected (disapproval) or
//! pending -> rejected; a visit moves scheduled -> checked_in -> checked_out
//! with checked_out terminal. All transitions take an explicit [`Actor`] and
//! read time from the [`Clock`] collaborator; atomicity of each
//! read-check-write lives in the repository layer.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::ActivityAction,
        user::Actor,
        visit::{CheckInRequest, CheckedInEntry, Visit},
        visitor::{Visitor, VisitorStatus},
    },
    repository::Repository,
};

use super::clock::Clock;

/// Issued badge format: BADGE- followed by 8 uppercase hex characters
static BADGE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^BADGE-[A-Z0-9]{8}$").expect("badge regex"));

const BADGE_CHARSET: &[u8] = b"0123456789ABCDEF";
const BADGE_LEN: usize = 8;
const BADGE_RETRIES: usize = 3;

/// Generate a fresh badge number, e.g. `BADGE-3F09A1CC`
pub fn generate_badge_number() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..BADGE_LEN)
        .map(|_| BADGE_CHARSET[rng.gen_range(0..BADGE_CHARSET.len())] as char)
        .collect();
    format!("BADGE-{}", suffix)
}

/// Check a caller-supplied badge number against the issued format
pub fn is_valid_badge(badge: &str) -> bool {
    BADGE_FORMAT.is_match(badge)
}

/// Format time on premises as "{h}h {m}m", or "{m}m" under an hour.
/// An open visit measures against `now`; a check-in in the future clamps
/// to "0m".
pub fn format_duration(
    check_in: DateTime<Utc>,
    check_out: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> String {
    let end = check_out.unwrap_or(now);
    let minutes = (end - check_in).num_minutes().max(0);
    let hours = minutes / 60;
    let minutes = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// UTC bounds of a calendar day as the half-open interval
/// `[D 00:00:00, D+1 00:00:00)`
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
    (start, start + Duration::days(1))
}

/// UTC bounds of the Sunday-started calendar week containing `date`,
/// half-open like [`day_bounds`]
pub fn week_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let first_day = date.week(Weekday::Sun).first_day();
    let start = first_day.and_hms_opt(0, 0, 0).unwrap().and_utc();
    (start, start + Duration::days(7))
}

/// Live duration of an open visit
pub fn open_visit_duration(check_in: DateTime<Utc>, clock: &dyn Clock) -> String {
    format_duration(check_in, None, clock.now())
}

#[derive(Clone)]
pub struct LifecycleService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

/// Which record a check-out targets
#[derive(Debug, Clone, Copy)]
pub enum CheckOutTarget {
    /// Close whichever visit the visitor has open
    Visitor(i32),
    /// Close one specific visit
    Visit(i32),
}

impl LifecycleService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Approve a visitor. Accepted from any non-approved status; approving
    /// an already-approved visitor is a precondition failure. Existing visits
    /// are untouched.
    pub async fn approve(&self, visitor_id: i32, actor: Actor) -> AppResult<Visitor> {
        let updated = self
            .repository
            .visitors
            .set_status(
                visitor_id,
                &[VisitorStatus::Pending, VisitorStatus::Rejected],
                VisitorStatus::Approved,
                None,
            )
            .await?;

        let visitor = match updated {
            Some(v) => v,
            None => {
                // Row exists but was not in a transitionable status, or is gone
                self.repository.visitors.get_by_id(visitor_id).await?;
                return Err(AppError::PreconditionFailed(
                    "Visitor is already approved".to_string(),
                ));
            }
        };

        self.repository
            .activity
            .record(
                ActivityAction::Approve,
                Some(visitor_id),
                None,
                Some(actor.user_id),
                None,
            )
            .await?;

        tracing::info!(visitor_id, actor_id = actor.user_id, "visitor approved");
        Ok(visitor)
    }

    /// Reject a visitor, storing the reason in their notes. Allowed from
    /// pending or approved (disapproval); rejected is terminal.
    pub async fn reject(&self, visitor_id: i32, reason: &str, actor: Actor) -> AppResult<Visitor> {
        let note = format!("Rejected: {}", reason);
        let updated = self
            .repository
            .visitors
            .set_status(
                visitor_id,
                &[VisitorStatus::Pending, VisitorStatus::Approved],
                VisitorStatus::Rejected,
                Some(&note),
            )
            .await?;

        let visitor = match updated {
            Some(v) => v,
            None => {
                self.repository.visitors.get_by_id(visitor_id).await?;
                return Err(AppError::PreconditionFailed(
                    "Visitor is already rejected".to_string(),
                ));
            }
        };

        self.repository
            .activity
            .record(
                ActivityAction::Reject,
                Some(visitor_id),
                None,
                Some(actor.user_id),
                Some(reason),
            )
            .await?;

        tracing::info!(visitor_id, actor_id = actor.user_id, "visitor rejected");
        Ok(visitor)
    }

    /// Check a visitor in. Requires approved status and no open visit; finds
    /// or creates today's visit and issues a badge when none was supplied.
    pub async fn check_in(
        &self,
        visitor_id: i32,
        request: CheckInRequest,
        actor: Actor,
    ) -> AppResult<Visit> {
        let now = self.clock.now();
        let (day_start, day_end) = day_bounds(now.date_naive());

        let supplied = match request.badge_number {
            Some(ref badge) => {
                if !is_valid_badge(badge) {
                    return Err(AppError::Validation(format!(
                        "Badge number does not match BADGE-XXXXXXXX: {}",
                        badge
                    )));
                }
                true
            }
            None => false,
        };

        let mut attempts = 0;
        let visit = loop {
            let badge = request
                .badge_number
                .clone()
                .unwrap_or_else(generate_badge_number);

            match self
                .repository
                .visits
                .check_in(visitor_id, request.visit_id, &badge, now, day_start, day_end)
                .await
            {
                Ok(visit) => break visit,
                // Only generated badges are retried on collision
                Err(AppError::BadgeCollision) if !supplied && attempts < BADGE_RETRIES => {
                    attempts += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }
        };

        self.repository
            .activity
            .record(
                ActivityAction::CheckIn,
                Some(visitor_id),
                Some(visit.id),
                Some(actor.user_id),
                visit.badge_number.as_deref(),
            )
            .await?;

        tracing::info!(
            visitor_id,
            visit_id = visit.id,
            actor_id = actor.user_id,
            "visitor checked in"
        );
        Ok(visit)
    }

    /// Check out a visit or a visitor's open visit
    pub async fn check_out(&self, target: CheckOutTarget, actor: Actor) -> AppResult<Visit> {
        let now = self.clock.now();

        let visit = match target {
            CheckOutTarget::Visitor(visitor_id) => {
                self.repository.visits.check_out_visitor(visitor_id, now).await?
            }
            CheckOutTarget::Visit(visit_id) => {
                self.repository.visits.check_out_visit(visit_id, now).await?
            }
        };

        self.repository
            .activity
            .record(
                ActivityAction::CheckOut,
                Some(visit.visitor_id),
                Some(visit.id),
                Some(actor.user_id),
                None,
            )
            .await?;

        tracing::info!(
            visit_id = visit.id,
            visitor_id = visit.visitor_id,
            actor_id = actor.user_id,
            "visitor checked out"
        );
        Ok(visit)
    }

    /// Close every open visit (evacuation/incident). Idempotent: a second
    /// call finds zero open visits.
    pub async fn emergency_checkout_all(&self, actor: Actor) -> AppResult<u64> {
        let now = self.clock.now();
        let count = self.repository.visits.emergency_checkout_all(now).await?;

        self.repository
            .activity
            .record(
                ActivityAction::EmergencyCheckout,
                None,
                None,
                Some(actor.user_id),
                Some(&format!("{} visits closed", count)),
            )
            .await?;

        tracing::warn!(count, actor_id = actor.user_id, "emergency checkout");
        Ok(count)
    }

    /// Everyone currently on premises, with live durations
    pub async fn currently_checked_in(&self) -> AppResult<Vec<CheckedInEntry>> {
        let rows = self.repository.visits.currently_checked_in().await?;

        Ok(rows
            .into_iter()
            .map(|row| CheckedInEntry {
                visit_id: row.visit_id,
                visitor: row.visitor,
                host: row.host,
                checked_in_at: row.checked_in_at,
                badge_number: row.badge_number,
                duration: open_visit_duration(row.checked_in_at, self.clock.as_ref()),
            })
            .collect())
    }

    /// Visitors awaiting approval
    pub async fn pending_approvals(&self) -> AppResult<Vec<Visitor>> {
        self.repository.visitors.pending_approvals().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::MockClock;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn duration_with_hours_and_minutes() {
        let start = at(2024, 3, 1, 9, 0, 0);
        let end = start + Duration::minutes(125);
        assert_eq!(format_duration(start, Some(end), end), "2h 5m");
    }

    #[test]
    fn duration_under_an_hour_uses_minutes_only() {
        let start = at(2024, 3, 1, 9, 0, 0);
        let now = start + Duration::minutes(45);
        assert_eq!(format_duration(start, None, now), "45m");
    }

    #[test]
    fn duration_clamps_future_check_in_to_zero() {
        let now = at(2024, 3, 1, 9, 0, 0);
        let start = now + Duration::minutes(10);
        assert_eq!(format_duration(start, None, now), "0m");
    }

    #[test]
    fn duration_exact_hour() {
        let start = at(2024, 3, 1, 9, 0, 0);
        let end = start + Duration::hours(3);
        assert_eq!(format_duration(start, Some(end), end), "3h 0m");
    }

    #[test]
    fn open_visit_duration_reads_the_clock() {
        let start = at(2024, 3, 1, 9, 0, 0);
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .return_const(start + Duration::minutes(95));
        assert_eq!(open_visit_duration(start, &clock), "1h 35m");
    }

    #[test]
    fn generated_badges_match_the_issued_format() {
        for _ in 0..100 {
            let badge = generate_badge_number();
            assert!(is_valid_badge(&badge), "bad badge: {}", badge);
        }
    }

    #[test]
    fn badge_validation_rejects_malformed_values() {
        assert!(is_valid_badge("BADGE-0A1B2C3D"));
        assert!(!is_valid_badge("BADGE-0a1b2c3d"));
        assert!(!is_valid_badge("BADGE-0A1B2C3"));
        assert!(!is_valid_badge("BADGE-0A1B2C3D4"));
        assert!(!is_valid_badge("badge-0A1B2C3D"));
        assert!(!is_valid_badge("0A1B2C3D"));
    }

    #[test]
    fn day_bounds_are_half_open() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = day_bounds(date);

        assert_eq!(start, at(2024, 3, 15, 0, 0, 0));
        assert_eq!(end, at(2024, 3, 16, 0, 0, 0));

        let in_range = |t: DateTime<Utc>| t >= start && t < end;

        // 23:59:59.999 of the prior day is out, midnight is in,
        // 00:00:00.001 of the next day is out
        assert!(!in_range(start - Duration::milliseconds(1)));
        assert!(in_range(start));
        assert!(in_range(end - Duration::milliseconds(1)));
        assert!(!in_range(end));
        assert!(!in_range(end + Duration::milliseconds(1)));
    }

    #[test]
    fn week_bounds_start_on_sunday() {
        // 2024-03-15 is a Friday; its week starts Sunday 2024-03-10
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = week_bounds(date);

        assert_eq!(start, at(2024, 3, 10, 0, 0, 0));
        assert_eq!(end, at(2024, 3, 17, 0, 0, 0));

        let in_range = |t: DateTime<Utc>| t >= start && t < end;

        // A visit exactly at week start is included; one millisecond
        // earlier falls in the previous week
        assert!(in_range(start));
        assert!(!in_range(start - Duration::milliseconds(1)));
    }

    #[test]
    fn week_bounds_on_a_sunday_are_that_week() {
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let (start, end) = week_bounds(sunday);
        assert_eq!(start, at(2024, 3, 10, 0, 0, 0));
        assert_eq!(end, at(2024, 3, 17, 0, 0, 0));
    }
}
