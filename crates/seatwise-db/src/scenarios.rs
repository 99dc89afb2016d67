//! End-to-end tests driving [`AvailabilityEngine`] against a real SQLite
//! database, with venue configuration and reservations flowing through the
//! repositories rather than in-memory fakes.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use seatwise_core::shift::SpecialHours;
use seatwise_core::{EngineError, HoldStatus, Shift, Table, TableType, TimeWindowRequest};
use seatwise_engine::{AvailabilityEngine, EngineConfig, OrchestratorError};

use crate::pool::{Database, DbConfig};

const VENUE: &str = "venue-harbor";

fn saturday() -> NaiveDate {
    // 2026-03-14 is a Saturday.
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

fn sunday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn morning_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(at(9, 0))
}

fn table(id: &str, number: &str, max: u32) -> Table {
    Table {
        id: id.to_string(),
        venue_id: VENUE.to_string(),
        table_number: number.to_string(),
        capacity_min: 2,
        capacity_max: max,
        table_type: TableType::Standard,
        is_active: true,
    }
}

fn dinner_shift() -> Shift {
    Shift {
        open: at(18, 0),
        close: at(23, 0),
        turnover_minutes: 90,
        seating_duration_minutes: Some(60),
    }
}

/// Seeds an in-memory venue: Saturday dinner service 18:00-23:00, two
/// joinable four-tops.
async fn seeded_engine() -> (Database, AvailabilityEngine) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let venues = db.venues();

    venues.upsert_venue(VENUE, "Harbor House", 30).await.unwrap();
    venues.insert_table(&table("t-1", "T1", 4)).await.unwrap();
    venues.insert_table(&table("t-2", "T2", 4)).await.unwrap();
    venues.add_join("t-1", "t-2").await.unwrap();
    venues
        .insert_shift(VENUE, Weekday::Sat, &dinner_shift())
        .await
        .unwrap();

    let engine = AvailabilityEngine::new(
        Arc::new(db.reservations()),
        Arc::new(db.venues()),
        Arc::new(db.reservations()),
        EngineConfig::default(),
    );
    (db, engine)
}

fn evening_request(party_size: u32) -> TimeWindowRequest {
    TimeWindowRequest {
        venue_id: VENUE.to_string(),
        date: saturday(),
        start: at(18, 0),
        end: at(21, 0),
        party_size,
    }
}

fn free_slots(results: &[seatwise_core::SlotResult]) -> Vec<NaiveTime> {
    results
        .iter()
        .filter(|r| !r.is_empty())
        .map(|r| r.slot.time())
        .collect()
}

#[tokio::test]
async fn test_empty_evening_offers_every_slot() {
    let (_db, engine) = seeded_engine().await;

    let results = engine
        .search_time_range_at(&evening_request(2), morning_of(saturday()))
        .await
        .unwrap();

    // 18:00 through 20:30 at 30-minute granularity, end exclusive.
    assert_eq!(results.len(), 6);
    assert_eq!(free_slots(&results).len(), 6);
}

#[tokio::test]
async fn test_confirmed_booking_leaves_edge_slots_free() {
    let (_db, engine) = seeded_engine().await;
    let now = morning_of(saturday());

    // Book both tables 19:00-20:00; the 90-minute turn holds them to 20:30.
    for _ in 0..2 {
        let handle = engine
            .reserve_at(VENUE, saturday(), at(19, 0), 2, None, now)
            .await
            .unwrap();
        engine
            .confirm_at(&handle.reservation_id, now)
            .await
            .unwrap();
    }

    let results = engine
        .search_time_range_at(&evening_request(2), now)
        .await
        .unwrap();

    assert_eq!(free_slots(&results), vec![at(18, 0), at(20, 30)]);
}

#[tokio::test]
async fn test_party_of_six_gets_the_pair() {
    let (_db, engine) = seeded_engine().await;

    let result = engine
        .check_availability_at(VENUE, saturday(), at(19, 0), 6, morning_of(saturday()))
        .await
        .unwrap();

    assert_eq!(result.candidates.len(), 1);
    let pair = &result.candidates[0];
    assert_eq!(pair.table_ids, vec!["t-1".to_string(), "t-2".to_string()]);
    assert_eq!(pair.combined_capacity, 8);
    assert!(pair.requires_combination);
    assert_eq!(result.total_capacity, 8);
}

#[tokio::test]
async fn test_window_before_opening_rejected() {
    let (_db, engine) = seeded_engine().await;

    let request = TimeWindowRequest {
        start: at(17, 0),
        end: at(17, 30),
        ..evening_request(2)
    };
    let err = engine
        .search_time_range_at(&request, morning_of(saturday()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Engine(EngineError::InvalidRequest { .. })
    ));
}

#[tokio::test]
async fn test_special_closure_blocks_the_date() {
    let (db, engine) = seeded_engine().await;

    db.venues()
        .insert_special_hours(
            VENUE,
            &SpecialHours {
                date: saturday(),
                is_closed: true,
                shifts: Vec::new(),
                reason: Some("private event".to_string()),
            },
        )
        .await
        .unwrap();

    let err = engine
        .search_time_range_at(&evening_request(2), morning_of(saturday()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Engine(EngineError::InvalidShift { .. })
    ));
}

#[tokio::test]
async fn test_special_hours_open_an_otherwise_closed_day() {
    let (db, engine) = seeded_engine().await;

    // No weekly Sunday service; a dated override opens a lunch shift.
    db.venues()
        .insert_special_hours(
            VENUE,
            &SpecialHours {
                date: sunday(),
                is_closed: false,
                shifts: vec![Shift {
                    open: at(12, 0),
                    close: at(15, 0),
                    turnover_minutes: 90,
                    seating_duration_minutes: Some(60),
                }],
                reason: Some("brunch pop-up".to_string()),
            },
        )
        .await
        .unwrap();

    let result = engine
        .check_availability_at(VENUE, sunday(), at(12, 0), 2, morning_of(sunday()))
        .await
        .unwrap();

    assert!(!result.is_empty());
}

#[tokio::test]
async fn test_hold_blocks_until_ttl_elapses() {
    let (_db, engine) = seeded_engine().await;
    let now = morning_of(saturday());

    // Two tables seat a party of two each; claim both with unconfirmed holds.
    for _ in 0..2 {
        let handle = engine
            .reserve_at(VENUE, saturday(), at(19, 0), 2, None, now)
            .await
            .unwrap();
        assert_eq!(handle.status, HoldStatus::Proposed);
    }

    // One minute in, both holds are still live.
    let err = engine
        .reserve_at(
            VENUE,
            saturday(),
            at(19, 0),
            2,
            None,
            now + chrono::Duration::minutes(1),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Engine(EngineError::SlotNoLongerAvailable { .. })
    ));

    // Past the five-minute TTL the slot frees up again.
    let handle = engine
        .reserve_at(
            VENUE,
            saturday(),
            at(19, 0),
            2,
            None,
            now + chrono::Duration::minutes(6),
        )
        .await
        .unwrap();
    assert_eq!(handle.status, HoldStatus::Proposed);
}

#[tokio::test]
async fn test_cancel_releases_the_slot() {
    let (_db, engine) = seeded_engine().await;
    let now = morning_of(saturday());

    // Party of six takes the only pair, then walks away.
    let handle = engine
        .reserve_at(VENUE, saturday(), at(19, 0), 6, None, now)
        .await
        .unwrap();
    let cancelled = engine.cancel(&handle.reservation_id).await.unwrap();
    assert_eq!(cancelled.status, HoldStatus::Cancelled);

    let result = engine
        .check_availability_at(VENUE, saturday(), at(19, 0), 6, now)
        .await
        .unwrap();
    assert_eq!(result.candidates.len(), 1);
}

#[tokio::test]
async fn test_pinned_table_is_never_swapped_for_its_sibling() {
    let (_db, engine) = seeded_engine().await;
    let now = morning_of(saturday());

    // The caller's search showed t-1; a rival confirms on it first.
    let rival = engine
        .reserve_at(
            VENUE,
            saturday(),
            at(19, 0),
            2,
            Some(["t-1".to_string()].as_slice()),
            now,
        )
        .await
        .unwrap();
    engine.confirm_at(&rival.reservation_id, now).await.unwrap();

    // t-2 is free, but the caller pinned t-1 and must re-run search.
    let err = engine
        .reserve_at(
            VENUE,
            saturday(),
            at(19, 0),
            2,
            Some(["t-1".to_string()].as_slice()),
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Engine(EngineError::SlotNoLongerAvailable { .. })
    ));

    let result = engine
        .check_availability_at(VENUE, saturday(), at(19, 0), 2, now)
        .await
        .unwrap();
    let offered: Vec<_> = result
        .candidates
        .iter()
        .map(|c| c.table_ids.clone())
        .collect();
    assert_eq!(offered, vec![vec!["t-2".to_string()]]);
}

#[tokio::test]
async fn test_confirm_after_ttl_reports_slot_lost() {
    let (_db, engine) = seeded_engine().await;
    let now = morning_of(saturday());

    let handle = engine
        .reserve_at(VENUE, saturday(), at(19, 0), 2, None, now)
        .await
        .unwrap();

    let err = engine
        .confirm_at(
            &handle.reservation_id,
            now + chrono::Duration::minutes(6),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Engine(EngineError::SlotNoLongerAvailable { .. })
    ));
}
