//! # Availability Engine
//!
//! The orchestrator: wires the pure core components to the injected
//! collaborators and owns the hold lifecycle.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      search_time_range                                  │
//! │                                                                         │
//! │  validate request ─► booking window ─► resolve shift ─► load catalog   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  generate candidates ─► fetch reservations ─► build interval index     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  probe every slot in the window ─► Vec<SlotResult>                     │
//! │                                                                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                           reserve                                       │
//! │                                                                         │
//! │  probe the one slot ─► resolve pinned tables (or pick best)            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  revalidate the chosen candidate against the fresh index               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  insert-if-no-overlap (held row, TTL) ─► ReservationHandle(Proposed)   │
//! │                                                                         │
//! │  The persistence layer is the arbiter: the in-process index is         │
//! │  advisory and a lost race surfaces as ReservationConflict.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Hold State Machine
//! ```text
//!   reserve ──► Proposed ──┬── confirm (before TTL) ──► Confirmed
//!                          ├── TTL elapses ───────────► Expired
//!                          └── cancel ────────────────► Cancelled
//! ```
//! Expired holds are never deleted eagerly; they stop occupying tables the
//! moment an index is built past their expiry instant.

use std::future::Future;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use seatwise_core::candidates::{self, CandidateOptions};
use seatwise_core::prober::{self, ProbeOptions};
use seatwise_core::selector;
use seatwise_core::shift::ShiftSpan;
use seatwise_core::validation;
use seatwise_core::{
    Candidate, EngineError, HoldPolicy, HoldStatus, IntervalIndex, SlotResult, TableCatalog,
    TableId, TimeWindowRequest,
};

use crate::cache::{spawn_invalidation_listener, ChangeEvent, SearchCache};
use crate::config::EngineConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::store::{
    ConfirmOutcome, HoldRequest, PersistenceLayer, ReservationStore, StoreError, VenueConfigStore,
};

// =============================================================================
// Reservation Handle
// =============================================================================

/// The caller-facing view of a hold or reservation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReservationHandle {
    pub reservation_id: String,
    pub venue_id: String,
    pub table_ids: Vec<TableId>,
    /// Seating start.
    #[ts(as = "String")]
    pub slot: NaiveDateTime,
    /// Seating end (exclusive). Turnover extends occupancy past this.
    #[ts(as = "String")]
    pub end: NaiveDateTime,
    pub status: HoldStatus,
    /// TTL instant while the hold is proposed; `None` once confirmed.
    #[ts(as = "Option<String>")]
    pub expires_at: Option<NaiveDateTime>,
}

// =============================================================================
// Availability Engine
// =============================================================================

/// Orchestrates searches and the reserve/confirm/cancel lifecycle.
///
/// ## Construction
/// ```ignore
/// let engine = AvailabilityEngine::new(reservations, venues, persistence, config);
/// engine.attach_change_feed(db.change_feed().subscribe());
/// ```
pub struct AvailabilityEngine {
    reservations: Arc<dyn ReservationStore>,
    venues: Arc<dyn VenueConfigStore>,
    persistence: Arc<dyn PersistenceLayer>,
    config: EngineConfig,
    cache: Option<Arc<SearchCache>>,
}

impl AvailabilityEngine {
    pub fn new(
        reservations: Arc<dyn ReservationStore>,
        venues: Arc<dyn VenueConfigStore>,
        persistence: Arc<dyn PersistenceLayer>,
        config: EngineConfig,
    ) -> Self {
        let cache = config.cache_ttl().map(|ttl| Arc::new(SearchCache::new(ttl)));
        AvailabilityEngine {
            reservations,
            venues,
            persistence,
            config,
            cache,
        }
    }

    /// Subscribes the search cache to a change-event feed.
    ///
    /// No-op when caching is disabled.
    pub fn attach_change_feed(
        &self,
        events: tokio::sync::broadcast::Receiver<ChangeEvent>,
    ) -> Option<tokio::task::JoinHandle<()>> {
        self.cache
            .as_ref()
            .map(|cache| spawn_invalidation_listener(cache.clone(), events))
    }

    /// The active configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Searches a time window for available slots, against the wall clock.
    pub async fn search_time_range(
        &self,
        request: &TimeWindowRequest,
    ) -> OrchestratorResult<Vec<SlotResult>> {
        self.search_time_range_at(request, Local::now().naive_local())
            .await
    }

    /// Searches a time window for available slots, as of `now`.
    ///
    /// ## Returns
    /// One [`SlotResult`] per probed slot, in window order. A slot with an
    /// empty candidate list is a normal "nothing fits" answer, never an
    /// error.
    pub async fn search_time_range_at(
        &self,
        request: &TimeWindowRequest,
        now: NaiveDateTime,
    ) -> OrchestratorResult<Vec<SlotResult>> {
        validation::validate_request_shape(request).map_err(EngineError::from)?;

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(
                &request.venue_id,
                request.date,
                request.start,
                request.end,
                request.party_size,
            ) {
                debug!(venue_id = %request.venue_id, date = %request.date, "Search served from cache");
                return Ok(hit);
            }
        }

        let (catalog, spans) = self.load_venue(&request.venue_id, request.date, now).await?;

        let window_start = request.date.and_time(request.start);
        // end <= start means the window runs past midnight
        let window_end = if request.end > request.start {
            request.date.and_time(request.end)
        } else {
            request.date.and_time(request.end) + Duration::days(1)
        };

        let span = spans
            .iter()
            .find(|s| s.contains_window(window_start, window_end))
            .ok_or_else(|| EngineError::InvalidRequest {
                reason: format!(
                    "window {}-{} falls outside operating hours",
                    request.start, request.end
                ),
            })?;

        let index = self
            .build_index(&request.venue_id, span, now)
            .await?;
        let candidates = self.generate_candidates(&catalog, request.party_size);

        let options = ProbeOptions {
            granularity_minutes: self.config.search.slot_granularity_minutes,
            seating_duration_minutes: span.effective_seating_minutes(request.party_size),
            hard_close: Some(span.close),
            policy: HoldPolicy::Include,
        };
        let results = prober::probe_window(
            &index,
            &candidates,
            &catalog,
            window_start,
            window_end,
            &options,
        );

        info!(
            venue_id = %request.venue_id,
            date = %request.date,
            party_size = request.party_size,
            slots = results.len(),
            "Search complete"
        );

        if let Some(cache) = &self.cache {
            cache.insert(
                &request.venue_id,
                request.date,
                request.start,
                request.end,
                request.party_size,
                results.clone(),
            );
        }

        Ok(results)
    }

    /// Checks a single slot, against the wall clock.
    pub async fn check_availability(
        &self,
        venue_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        party_size: u32,
    ) -> OrchestratorResult<SlotResult> {
        self.check_availability_at(venue_id, date, time, party_size, Local::now().naive_local())
            .await
    }

    /// Checks a single slot, as of `now`.
    ///
    /// An empty candidate list in the result means the slot cannot seat the
    /// party; it is never an error.
    pub async fn check_availability_at(
        &self,
        venue_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        party_size: u32,
        now: NaiveDateTime,
    ) -> OrchestratorResult<SlotResult> {
        let probe = self
            .probe_one_slot(venue_id, date, time, party_size, now)
            .await?;
        Ok(probe.result)
    }

    // =========================================================================
    // Hold Lifecycle
    // =========================================================================

    /// Places a hold on a slot, against the wall clock.
    ///
    /// See [`AvailabilityEngine::reserve_at`] for the `tables` contract.
    pub async fn reserve(
        &self,
        venue_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        party_size: u32,
        tables: Option<&[TableId]>,
    ) -> OrchestratorResult<ReservationHandle> {
        self.reserve_at(
            venue_id,
            date,
            time,
            party_size,
            tables,
            Local::now().naive_local(),
        )
        .await
    }

    /// Places a hold on a slot, as of `now`.
    ///
    /// ## Selection Contract
    /// `tables` pins the exact candidate a caller picked out of a search
    /// result. A pinned candidate is revalidated against a freshly built
    /// index; if any member table got taken in the meantime the call fails
    /// with [`EngineError::SlotNoLongerAvailable`] even when sibling
    /// candidates are still free. The caller re-searches and retries; the
    /// engine never seats a party at tables they never saw.
    ///
    /// `None` leaves the choice to the engine: the least-wasteful free
    /// candidate wins, ties broken by the lowest table id.
    ///
    /// ## Errors
    /// - [`EngineError::InvalidRequest`] when the pinned tables are not a
    ///   valid assignment for the party (unknown ids, broken clique, or a
    ///   capacity mismatch)
    /// - [`EngineError::SlotNoLongerAvailable`] when the candidate is taken
    /// - [`OrchestratorError::ReservationConflict`] when the durable write
    ///   loses the race
    pub async fn reserve_at(
        &self,
        venue_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        party_size: u32,
        tables: Option<&[TableId]>,
        now: NaiveDateTime,
    ) -> OrchestratorResult<ReservationHandle> {
        let probe = self
            .probe_one_slot(venue_id, date, time, party_size, now)
            .await?;

        let chosen = match tables {
            Some(ids) => {
                let mut pinned: Vec<TableId> = ids.to_vec();
                pinned.sort();
                // The generated list is the universe of valid assignments;
                // occupancy is the revalidation step's concern.
                probe
                    .generated
                    .iter()
                    .find(|c| c.table_ids == pinned)
                    .cloned()
                    .ok_or_else(|| EngineError::InvalidRequest {
                        reason: format!(
                            "tables {pinned:?} are not a valid assignment for a party of {party_size}"
                        ),
                    })?
            }
            None => selector::best_candidate(&probe.result.candidates, party_size)
                .cloned()
                .ok_or(EngineError::SlotNoLongerAvailable {
                    slot: probe.slot,
                    table_ids: Vec::new(),
                })?,
        };

        selector::revalidate(&chosen, &probe.index, probe.slot, probe.seating_minutes)
            .map_err(OrchestratorError::Engine)?;

        let expires_at = now + self.config.hold_ttl();
        let hold = HoldRequest {
            venue_id: venue_id.to_string(),
            table_ids: chosen.table_ids.clone(),
            start: probe.slot,
            end: probe.seating_end,
            expires_at,
        };

        let reservation_id = match self
            .with_deadline("insert_if_free", self.persistence.insert_if_free(&hold, now))
            .await
        {
            Ok(id) => id,
            Err(OrchestratorError::Store(StoreError::Conflict(_))) => {
                return Err(OrchestratorError::ReservationConflict {
                    slot: probe.slot,
                    table_ids: chosen.table_ids,
                });
            }
            Err(other) => return Err(other),
        };

        self.invalidate_cached(venue_id, date);
        info!(
            venue_id,
            reservation_id = %reservation_id,
            slot = %probe.slot,
            tables = ?chosen.table_ids,
            "Hold placed"
        );

        Ok(ReservationHandle {
            reservation_id,
            venue_id: venue_id.to_string(),
            table_ids: chosen.table_ids,
            slot: probe.slot,
            end: probe.seating_end,
            status: HoldStatus::Proposed,
            expires_at: Some(expires_at),
        })
    }

    /// Confirms a proposed hold, against the wall clock.
    pub async fn confirm(&self, reservation_id: &str) -> OrchestratorResult<ReservationHandle> {
        self.confirm_at(reservation_id, Local::now().naive_local())
            .await
    }

    /// Confirms a proposed hold, as of `now`.
    ///
    /// ## Errors
    /// - [`EngineError::SlotNoLongerAvailable`] when the hold's TTL elapsed
    ///   before the confirm arrived
    pub async fn confirm_at(
        &self,
        reservation_id: &str,
        now: NaiveDateTime,
    ) -> OrchestratorResult<ReservationHandle> {
        validation::validate_uuid("reservation_id", reservation_id).map_err(EngineError::from)?;

        let outcome = self
            .with_deadline(
                "confirm_hold",
                self.persistence.confirm_hold(reservation_id, now),
            )
            .await?;

        match outcome {
            ConfirmOutcome::Confirmed(row) => {
                self.invalidate_cached(&row.venue_id, row.start.date());
                info!(reservation_id, slot = %row.start, "Hold confirmed");
                Ok(ReservationHandle {
                    reservation_id: row.id,
                    venue_id: row.venue_id,
                    table_ids: row.table_ids,
                    slot: row.start,
                    end: row.end,
                    status: HoldStatus::Confirmed,
                    expires_at: None,
                })
            }
            ConfirmOutcome::Expired(row) => {
                debug!(reservation_id, expired_at = ?row.hold_expires_at, "Confirm arrived after TTL");
                Err(EngineError::SlotNoLongerAvailable {
                    slot: row.start,
                    table_ids: row.table_ids,
                }
                .into())
            }
        }
    }

    /// Cancels a proposed hold, releasing its tables immediately.
    pub async fn cancel(&self, reservation_id: &str) -> OrchestratorResult<ReservationHandle> {
        validation::validate_uuid("reservation_id", reservation_id).map_err(EngineError::from)?;

        let row = self
            .with_deadline("cancel_hold", self.persistence.cancel_hold(reservation_id))
            .await?;

        self.invalidate_cached(&row.venue_id, row.start.date());
        info!(reservation_id, slot = %row.start, "Hold cancelled");

        Ok(ReservationHandle {
            reservation_id: row.id,
            venue_id: row.venue_id,
            table_ids: row.table_ids,
            slot: row.start,
            end: row.end,
            status: HoldStatus::Cancelled,
            expires_at: None,
        })
    }

    // =========================================================================
    // Internal Plumbing
    // =========================================================================

    /// Applies the configured deadline to a collaborator call.
    async fn with_deadline<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> OrchestratorResult<T> {
        match tokio::time::timeout(self.config.call_deadline(), fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(OrchestratorError::Store(e)),
            Err(_) => Err(OrchestratorError::TimedOut { operation }),
        }
    }

    /// Loads catalog and resolved shift spans, enforcing the booking window.
    async fn load_venue(
        &self,
        venue_id: &str,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> OrchestratorResult<(TableCatalog, Vec<ShiftSpan>)> {
        let window_days = self
            .with_deadline(
                "booking_window_days",
                self.venues.booking_window_days(venue_id),
            )
            .await?;
        validation::validate_booking_date(date, now.date(), window_days)
            .map_err(EngineError::from)?;

        let shift_config = self
            .with_deadline("shift_config", self.venues.shift_config(venue_id))
            .await?;
        let spans = shift_config.resolve(date)?;

        let catalog = self
            .with_deadline("table_catalog", self.venues.table_catalog(venue_id))
            .await?;

        Ok((catalog, spans))
    }

    /// Fetches reservations around a span and builds the interval index.
    ///
    /// The fetch range is padded by the turnover on both sides so a seating
    /// that starts before the span but occupies into it is not missed.
    async fn build_index(
        &self,
        venue_id: &str,
        span: &ShiftSpan,
        now: NaiveDateTime,
    ) -> OrchestratorResult<IntervalIndex> {
        let pad = Duration::minutes(i64::from(span.turnover_minutes));
        let rows = self
            .with_deadline(
                "fetch_day",
                self.reservations
                    .fetch_day(venue_id, span.open - pad, span.close + pad),
            )
            .await?;
        let index = IntervalIndex::build(&rows, span.turnover_minutes, now);
        debug!(
            venue_id,
            occupied_tables = index.occupied_table_count(),
            "Availability index built"
        );
        Ok(index)
    }

    fn generate_candidates(&self, catalog: &TableCatalog, party_size: u32) -> Vec<Candidate> {
        let options = CandidateOptions {
            max_oversize_ratio: self.config.search.max_oversize_ratio,
            type_preference: self.config.search.type_preference.clone(),
        };
        candidates::generate(catalog, party_size, &options)
    }

    /// Shared path for single-slot operations.
    async fn probe_one_slot(
        &self,
        venue_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        party_size: u32,
        now: NaiveDateTime,
    ) -> OrchestratorResult<SlotProbe> {
        validation::validate_party_size(party_size).map_err(EngineError::from)?;

        let (catalog, spans) = self.load_venue(venue_id, date, now).await?;
        let slot = date.and_time(time);

        // seating length depends on the span, so containment is per-span
        let located = spans.iter().find_map(|span| {
            let seating_minutes = span.effective_seating_minutes(party_size);
            let seating_end = slot + Duration::minutes(i64::from(seating_minutes));
            span.contains_window(slot, seating_end)
                .then_some((span, seating_minutes, seating_end))
        });
        let (span, seating_minutes, seating_end) =
            located.ok_or_else(|| EngineError::InvalidRequest {
                reason: format!("slot {time} falls outside operating hours"),
            })?;

        let index = self.build_index(venue_id, span, now).await?;
        let generated = self.generate_candidates(&catalog, party_size);

        let options = ProbeOptions {
            granularity_minutes: self.config.search.slot_granularity_minutes,
            seating_duration_minutes: seating_minutes,
            hard_close: Some(span.close),
            policy: HoldPolicy::Include,
        };
        let result = prober::probe_slot(&index, &generated, &catalog, slot, seating_end, &options);

        Ok(SlotProbe {
            slot,
            seating_minutes,
            seating_end,
            index,
            generated,
            result,
        })
    }

    fn invalidate_cached(&self, venue_id: &str, date: NaiveDate) {
        if let Some(cache) = &self.cache {
            cache.invalidate(venue_id, date);
        }
    }
}

/// Everything a single-slot operation learns on its way to a result.
struct SlotProbe {
    slot: NaiveDateTime,
    seating_minutes: u32,
    seating_end: NaiveDateTime,
    index: IntervalIndex,
    /// Every valid assignment for the party, occupancy not yet applied.
    generated: Vec<Candidate>,
    result: SlotResult,
}

// =============================================================================
// Unit Tests
// =============================================================================
