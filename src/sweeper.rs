//! Daily removal of accounts older than the retention window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};

use crate::pili::{HubError, RoomHub};
use crate::storage::AccountStore;
use crate::utils::now_unix;

/// Accounts are kept for 30 days after creation.
pub const RETENTION_WINDOW_SECS: i64 = 30 * 24 * 60 * 60;

/// Wall-clock time of day the sweep runs at.
pub fn sweep_time() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// Creation timestamps at or before this instant are expired.
pub fn cutoff(now: i64) -> i64 {
    now - RETENTION_WINDOW_SECS
}

/// Next 23:59:59 strictly after `now`, in `now`'s time zone.
pub fn next_run_after<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();
    for date in [Some(today), today.checked_add_days(Days::new(1))]
        .into_iter()
        .flatten()
    {
        if let Some(candidate) = tz
            .from_local_datetime(&date.and_time(sweep_time()))
            .earliest()
        {
            if candidate > *now {
                return candidate;
            }
        }
    }
    // Only reachable if 23:59:59 does not exist locally on both days.
    now.clone() + chrono::Duration::days(1)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub cutoff: i64,
    /// Names whose records were removed from the store.
    pub deleted: Vec<String>,
    pub rooms_deleted: usize,
    pub room_failures: usize,
}

/// Runs one sweep at `now` (Unix seconds).
///
/// Room deletion and record deletion are attempted independently; failures
/// are logged and counted, never returned. Records are removed even when
/// their room could not be deleted, so such a room is never retried.
pub async fn sweep_once(store: &dyn AccountStore, hub: &dyn RoomHub, now: i64) -> SweepReport {
    let mut report = SweepReport {
        cutoff: cutoff(now),
        ..SweepReport::default()
    };

    let expired = match store.list_created_before(report.cutoff).await {
        Ok(accounts) => accounts,
        Err(e) => {
            tracing::error!(error = %e, "delete expired accounts: listing failed");
            Vec::new()
        }
    };

    for account in &expired {
        match hub.delete_room(&account.room).await {
            Ok(()) | Err(HubError::NotFound(_)) => report.rooms_deleted += 1,
            Err(e) => {
                report.room_failures += 1;
                tracing::error!(room = %account.room, name = %account.name, error = %e,
                    "delete expired accounts: room deletion failed");
            }
        }
    }

    match store.delete_created_before(report.cutoff).await {
        Ok(names) => report.deleted = names,
        Err(e) => tracing::error!(error = %e, "delete expired accounts: record deletion failed"),
    }

    tracing::info!(
        cutoff = report.cutoff,
        accounts = report.deleted.len(),
        rooms = report.rooms_deleted,
        room_failures = report.room_failures,
        "expired accounts swept"
    );
    report
}

/// Sweeps forever: once right away if `run_immediately`, then every day at
/// 23:59:59 local time.
pub async fn run_sweeper(
    store: Arc<dyn AccountStore>,
    hub: Arc<dyn RoomHub>,
    run_immediately: bool,
) {
    if run_immediately {
        sweep_once(store.as_ref(), hub.as_ref(), now_unix()).await;
    }
    loop {
        let now = Local::now();
        let next = next_run_after(&now);
        let wait = (next.clone() - now).to_std().unwrap_or(Duration::from_secs(1));
        tracing::debug!(next = %next, "next expiry sweep scheduled");
        actix_web::rt::time::sleep(wait).await;
        sweep_once(store.as_ref(), hub.as_ref(), now_unix()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn retention_is_thirty_days() {
        assert_eq!(RETENTION_WINDOW_SECS, 2_592_000);
        assert_eq!(cutoff(3_000_000), 408_000);
    }

    #[test]
    fn next_run_is_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        let next = next_run_after(&now);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap());
    }

    #[test]
    fn at_the_instant_moves_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();
        let next = next_run_after(&now);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 11, 23, 59, 59).unwrap());
    }

    #[test]
    fn crosses_month_and_year() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(500);
        let next = next_run_after(&now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 1, 23, 59, 59).unwrap());
    }

    #[test]
    fn uses_local_wall_clock_of_the_zone() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let next = next_run_after(&now);
        assert_eq!(next.time(), sweep_time());
        assert_eq!(next.date_naive(), now.date_naive());
    }

    #[test]
    fn next_run_is_within_a_day() {
        let start = Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap();
        for minutes in (0..48 * 60).step_by(37) {
            let now = start + chrono::Duration::minutes(minutes);
            let next = next_run_after(&now);
            assert!(next > now);
            assert!(next - now <= chrono::Duration::days(1));
            assert_eq!(next.time(), sweep_time());
        }
    }
}
