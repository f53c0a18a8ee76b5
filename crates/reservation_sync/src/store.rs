use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use calendar_grid::{ChangeProposal, DragItem};
use campground_model::{
    Blackout, BlackoutDraft, CalendarSnapshot, EntityKey, MonthRange, ModelError, is_temp_id,
    temp_id,
};
use futures_util::future::{AbortHandle, abortable};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    AvailabilityProbe, AvailabilityResult, CalendarApi, CreateBlackoutPatch, DeleteBlackoutPatch,
    Notice, Notifier, OptimisticPatch, ReschedulePatch, RescheduleRequest, RescheduleResponse,
    StuckSavingWatchdog, SyncConfig, SyncError, UpdateBlackoutPatch, attempt,
};

struct InFlight {
    generation: u64,
    handle: AbortHandle,
}

/// Owner of the calendar snapshot.
///
/// Every read goes through the watch channel returned by [`subscribe`](Self::subscribe).
/// Every write is an optimistic patch applied by this store, so the grid and
/// any renderer always see the local change before the server confirms it.
pub struct CalendarStore {
    api: Arc<dyn CalendarApi>,
    notifier: Arc<dyn Notifier>,
    config: SyncConfig,
    state: watch::Sender<Arc<CalendarSnapshot>>,
    month: Mutex<Option<MonthRange>>,
    load_generation: AtomicU64,
    in_flight: Mutex<HashMap<EntityKey, InFlight>>,
    next_generation: AtomicU64,
    last_trigger: Mutex<Option<Instant>>,
    watchdog: Mutex<StuckSavingWatchdog>,
    failsafe: Mutex<Option<JoinHandle<()>>>,
}

impl CalendarStore {
    /// Create an empty store
    pub fn new(
        api: Arc<dyn CalendarApi>,
        notifier: Arc<dyn Notifier>,
        config: Option<SyncConfig>,
    ) -> Self {
        let config = config.unwrap_or_default();
        let (state, _) = watch::channel(Arc::new(CalendarSnapshot::default()));
        let watchdog = StuckSavingWatchdog::new(config.stuck_timeout, config.failsafe_throttle);

        Self {
            api,
            notifier,
            config,
            state,
            month: Mutex::new(None),
            load_generation: AtomicU64::new(0),
            in_flight: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            last_trigger: Mutex::new(None),
            watchdog: Mutex::new(watchdog),
            failsafe: Mutex::new(None),
        }
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<CalendarSnapshot>> {
        self.state.subscribe()
    }

    /// The latest snapshot
    pub fn snapshot(&self) -> Arc<CalendarSnapshot> {
        self.state.borrow().clone()
    }

    /// Month the store is showing, once one has been loaded
    pub async fn current_month(&self) -> Option<MonthRange> {
        *self.month.lock().await
    }

    /// Fetch `month` and publish it.
    ///
    /// The previous snapshot stays published while the request runs. When a
    /// newer load starts before this one answers, this answer is dropped.
    pub async fn load_month(&self, month: MonthRange) -> Result<(), SyncError> {
        *self.month.lock().await = Some(month);
        let generation = self.load_generation.fetch_add(1, Ordering::SeqCst) + 1;

        info!("Loading calendar for {}", month);
        let snapshot = self.api.fetch_calendar(month).await?;

        if self.load_generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale calendar for {}", month);
            return Ok(());
        }

        info!(
            "Loaded calendar for {}: {} campsites, {} reservations, {} blackouts",
            month,
            snapshot.campsites.len(),
            snapshot.reservations.len(),
            snapshot.blackouts.len()
        );
        self.state.send_replace(Arc::new(snapshot));
        self.diagnose().await;
        Ok(())
    }

    /// Refetch the current month, discarding optimistic state
    pub async fn revalidate(&self) -> Result<(), SyncError> {
        let Some(month) = self.current_month().await else {
            return Ok(());
        };
        self.load_month(month).await
    }

    /// The window regained focus; returns whether a refresh ran
    pub async fn on_focus(&self) -> Result<bool, SyncError> {
        self.refresh_if_due("focus").await
    }

    /// The network came back; returns whether a refresh ran
    pub async fn on_reconnect(&self) -> Result<bool, SyncError> {
        self.refresh_if_due("reconnect").await
    }

    async fn refresh_if_due(&self, trigger: &str) -> Result<bool, SyncError> {
        {
            let mut last = self.last_trigger.lock().await;
            let now = Instant::now();
            if last.is_some_and(|at| now.duration_since(at) < self.config.focus_dedupe) {
                debug!("Skipping {} refresh, one ran moments ago", trigger);
                return Ok(false);
            }
            *last = Some(now);
        }

        debug!("Refreshing calendar on {}", trigger);
        self.revalidate().await?;
        Ok(true)
    }

    /// Create a blackout, shown at once under a temporary id
    pub async fn create_blackout(&self, draft: BlackoutDraft) -> Result<Blackout, SyncError> {
        draft.check()?;

        let patch = CreateBlackoutPatch::new(draft.clone(), temp_id());
        let created = self.run(patch, self.api.create_blackout(&draft)).await?;

        info!("Created blackout {}", created.id);
        self.notifier.notify(Notice::success("Blackout created"));
        Ok(created)
    }

    /// Replace the editable fields of a blackout
    pub async fn update_blackout(
        &self,
        id: &str,
        draft: BlackoutDraft,
    ) -> Result<Blackout, SyncError> {
        self.ensure_exists(&EntityKey::Blackout(id.to_string()))?;
        draft.check()?;

        let patch = UpdateBlackoutPatch::new(id.to_string(), draft.clone());
        let updated = self.run(patch, self.api.update_blackout(id, &draft)).await?;

        info!("Updated blackout {}", id);
        self.notifier.notify(Notice::success("Blackout updated"));
        Ok(updated)
    }

    /// Delete a blackout
    pub async fn delete_blackout(&self, id: &str) -> Result<(), SyncError> {
        self.ensure_exists(&EntityKey::Blackout(id.to_string()))?;

        let patch = DeleteBlackoutPatch::new(id.to_string());
        self.run(patch, self.api.delete_blackout(id)).await?;

        info!("Deleted blackout {}", id);
        self.notifier.notify(Notice::success("Blackout deleted"));
        Ok(())
    }

    /// Move and/or re-date a reservation
    pub async fn reschedule(
        &self,
        request: RescheduleRequest,
    ) -> Result<RescheduleResponse, SyncError> {
        self.ensure_exists(&EntityKey::Reservation(request.reservation_id.clone()))?;
        request.check()?;

        let patch = ReschedulePatch::new(request.clone());
        let response = self
            .run(patch, self.api.reschedule_reservation(&request))
            .await?;

        info!(
            "Rescheduled reservation {} to {} - {}",
            response.reservation.id, response.reservation.check_in, response.reservation.check_out
        );
        self.notifier.notify(Notice::success("Reservation updated"));
        if response.notification_sent {
            self.notifier
                .notify(Notice::info("The guest has been notified of the change"));
        }
        Ok(response)
    }

    /// Persist a move or resize released on the grid
    pub async fn commit_change(&self, proposal: &ChangeProposal) -> Result<(), SyncError> {
        if !proposal.changed() {
            return Ok(());
        }

        match &proposal.item {
            DragItem::Reservation(reservation) => {
                let request = RescheduleRequest {
                    reservation_id: reservation.id.clone(),
                    campsite_id: proposal.campsite_id(),
                    check_in: proposal.start,
                    check_out: proposal.end,
                };
                self.reschedule(request).await?;
            }
            DragItem::Blackout(blackout) => {
                let Some(draft) = proposal.blackout_draft() else {
                    return Err(SyncError::NotFound(blackout.id.clone()));
                };
                self.update_blackout(&blackout.id, draft).await?;
            }
        }

        Ok(())
    }

    /// Ask the server whether a campsite can take a booking
    pub async fn check_availability(
        &self,
        probe: &AvailabilityProbe,
    ) -> Result<AvailabilityResult, SyncError> {
        probe.validate().map_err(ModelError::from)?;
        Ok(self.api.check_availability(probe).await?)
    }

    /// Spawn the stuck-saving failsafe.
    ///
    /// The task only holds a weak reference and ends once the store is dropped.
    pub async fn start_failsafe(self: &Arc<Self>) {
        let store: Weak<Self> = Arc::downgrade(self);
        let period = self.config.failsafe_poll_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.failsafe_tick(Instant::now()).await;
            }
        });

        if let Some(previous) = self.failsafe.lock().await.replace(handle) {
            previous.abort();
        }
        info!("🛟 Stuck-saving failsafe started");
    }

    /// Stop the failsafe task
    pub async fn stop_failsafe(&self) {
        if let Some(handle) = self.failsafe.lock().await.take() {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// One failsafe inspection; returns whether it forced a refresh
    pub async fn failsafe_tick(&self, now: Instant) -> bool {
        let saving = self.state.borrow().saving_keys();
        if !self.watchdog.lock().await.check(&saving, now) {
            return false;
        }

        self.notifier.notify(Notice::info(
            "Some changes are taking longer than expected. Refreshing the calendar.",
        ));
        if let Err(e) = self.revalidate().await {
            warn!("Failsafe refresh failed: {}", e);
        }
        true
    }

    fn ensure_exists(&self, key: &EntityKey) -> Result<(), SyncError> {
        if is_temp_id(key.id()) {
            return Err(SyncError::PendingEntity(key.id().to_string()));
        }

        let snapshot = self.state.borrow();
        let found = match key {
            EntityKey::Reservation(id) => snapshot.reservation(id).is_some(),
            EntityKey::Blackout(id) => snapshot.blackout(id).is_some(),
        };

        if found {
            Ok(())
        } else {
            Err(SyncError::NotFound(key.id().to_string()))
        }
    }

    async fn run<P, F>(&self, patch: P, request: F) -> Result<P::Output, SyncError>
    where
        P: OptimisticPatch,
        F: Future<Output = Result<P::Output, crate::ApiError>>,
    {
        let key = patch.key();
        let description = patch.describe();
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let (request, handle) = abortable(request);

        let superseded = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.insert(key.clone(), InFlight { generation, handle }) {
                Some(previous) => {
                    previous.handle.abort();
                    true
                }
                None => false,
            }
        };
        if superseded {
            info!("Superseding in-flight change to {}", key.id());
        }

        let result = attempt(&self.state, patch, request).await;

        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight
                .get(&key)
                .is_some_and(|entry| entry.generation == generation)
            {
                in_flight.remove(&key);
            }
        }

        match &result {
            Ok(_) => self.diagnose().await,
            Err(SyncError::Superseded) => {}
            Err(e) => {
                self.notifier
                    .notify(Notice::error(format!("Failed to {}: {}", description, e)));

                // The rolled-back baseline was itself optimistic.
                if superseded {
                    if let Err(e) = self.revalidate().await {
                        warn!("Refresh after failed superseding change failed: {}", e);
                    }
                }
            }
        }

        result
    }

    async fn diagnose(&self) {
        if !cfg!(debug_assertions) {
            return;
        }

        let snapshot = self.snapshot();
        for id in snapshot.duplicate_ids() {
            warn!("Duplicate id {} in calendar snapshot", id);
        }

        let in_flight = self.in_flight.lock().await;
        for blackout in snapshot.blackouts.iter().filter(|b| is_temp_id(&b.id)) {
            if !in_flight.contains_key(&EntityKey::Blackout(blackout.id.clone())) {
                warn!("Orphaned temporary blackout {}", blackout.id);
            }
        }
    }
}

impl Drop for CalendarStore {
    fn drop(&mut self) {
        if let Some(handle) = self.failsafe.get_mut().take() {
            handle.abort();
        }
        for entry in self.in_flight.get_mut().values() {
            entry.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimistic::tests::{blackout, date, reservation, snapshot};
    use crate::{ApiError, NoticeLevel};
    use campground_model::Placement;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::oneshot;

    struct Step<T> {
        gate: Option<oneshot::Receiver<()>>,
        result: Result<T, ApiError>,
    }

    impl<T> Step<T> {
        fn ready(result: Result<T, ApiError>) -> Self {
            Self { gate: None, result }
        }

        fn gated(result: Result<T, ApiError>) -> (Self, oneshot::Sender<()>) {
            let (tx, rx) = oneshot::channel();
            (
                Self {
                    gate: Some(rx),
                    result,
                },
                tx,
            )
        }
    }

    type Queue<T> = std::sync::Mutex<VecDeque<Step<T>>>;

    async fn next<T>(queue: &Queue<T>) -> Option<Result<T, ApiError>> {
        let step = queue.lock().unwrap().pop_front()?;
        if let Some(gate) = step.gate {
            let _ = gate.await;
        }
        Some(step.result)
    }

    #[derive(Default)]
    struct MockApi {
        calendar: std::sync::Mutex<CalendarSnapshot>,
        calendars: Queue<CalendarSnapshot>,
        blackouts: Queue<Blackout>,
        deletes: Queue<()>,
        reschedules: Queue<RescheduleResponse>,
        fetches: AtomicUsize,
        mutations: AtomicUsize,
    }

    impl MockApi {
        fn with_calendar(calendar: CalendarSnapshot) -> Self {
            let api = Self::default();
            *api.calendar.lock().unwrap() = calendar;
            api
        }

        fn unscripted() -> ApiError {
            ApiError::Network("no scripted response".to_string())
        }
    }

    #[async_trait::async_trait]
    impl CalendarApi for MockApi {
        async fn fetch_calendar(&self, _month: MonthRange) -> Result<CalendarSnapshot, ApiError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match next(&self.calendars).await {
                Some(result) => result,
                None => Ok(self.calendar.lock().unwrap().clone()),
            }
        }

        async fn reschedule_reservation(
            &self,
            _request: &RescheduleRequest,
        ) -> Result<RescheduleResponse, ApiError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            next(&self.reschedules).await.unwrap_or_else(|| Err(Self::unscripted()))
        }

        async fn create_blackout(&self, _draft: &BlackoutDraft) -> Result<Blackout, ApiError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            next(&self.blackouts).await.unwrap_or_else(|| Err(Self::unscripted()))
        }

        async fn update_blackout(
            &self,
            _id: &str,
            _draft: &BlackoutDraft,
        ) -> Result<Blackout, ApiError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            next(&self.blackouts).await.unwrap_or_else(|| Err(Self::unscripted()))
        }

        async fn delete_blackout(&self, _id: &str) -> Result<(), ApiError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            next(&self.deletes).await.unwrap_or_else(|| Err(Self::unscripted()))
        }

        async fn check_availability(
            &self,
            _probe: &AvailabilityProbe,
        ) -> Result<AvailabilityResult, ApiError> {
            Ok(AvailabilityResult {
                available: true,
                conflicts: Vec::new(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notices: std::sync::Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        fn levels(&self) -> Vec<NoticeLevel> {
            self.notices.lock().unwrap().iter().map(|n| n.level).collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    fn june() -> MonthRange {
        MonthRange::new(2024, 6).unwrap()
    }

    async fn loaded_store() -> (CalendarStore, Arc<MockApi>, Arc<RecordingNotifier>) {
        let api = Arc::new(MockApi::with_calendar(snapshot()));
        let notifier = Arc::new(RecordingNotifier::default());
        let store = CalendarStore::new(api.clone(), notifier.clone(), None);
        store.load_month(june()).await.unwrap();
        (store, api, notifier)
    }

    fn move_r1_to_s2() -> RescheduleRequest {
        RescheduleRequest {
            reservation_id: "r1".to_string(),
            campsite_id: Some("s2".to_string()),
            check_in: date("2024-06-14"),
            check_out: date("2024-06-17"),
        }
    }

    fn response_for(request: &RescheduleRequest, notification_sent: bool) -> RescheduleResponse {
        let mut stored = reservation(
            &request.reservation_id,
            request.campsite_id.as_deref(),
            "2024-06-01",
            "2024-06-02",
        );
        stored.check_in = request.check_in;
        stored.check_out = request.check_out;
        RescheduleResponse {
            reservation: stored,
            notification_sent,
        }
    }

    #[tokio::test]
    async fn test_load_month_publishes_snapshot() {
        let (store, api, _) = loaded_store().await;
        let rx = store.subscribe();

        assert_eq!(**rx.borrow(), snapshot());
        assert_eq!(store.current_month().await, Some(june()));
        assert_eq!(api.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_data() {
        let (store, api, _) = loaded_store().await;
        api.calendars
            .lock()
            .unwrap()
            .push_back(Step::ready(Err(ApiError::Network("offline".to_string()))));

        let result = store.load_month(MonthRange::new(2024, 7).unwrap()).await;

        assert!(matches!(result, Err(SyncError::Api(ApiError::Network(_)))));
        assert_eq!(*store.snapshot(), snapshot());
    }

    #[tokio::test]
    async fn test_stale_month_response_is_discarded() {
        let api = Arc::new(MockApi::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = CalendarStore::new(api.clone(), notifier, None);

        let mut june_data = snapshot();
        june_data.reservations.truncate(1);
        let mut july_data = snapshot();
        july_data.blackouts.clear();

        let (june_step, june_gate) = Step::gated(Ok(june_data));
        api.calendars.lock().unwrap().push_back(june_step);
        api.calendars
            .lock()
            .unwrap()
            .push_back(Step::ready(Ok(july_data.clone())));

        let july = MonthRange::new(2024, 7).unwrap();
        let later = async {
            tokio::task::yield_now().await;
            store.load_month(july).await.unwrap();
            june_gate.send(()).unwrap();
        };
        let (june_result, _) = tokio::join!(store.load_month(june()), later);

        assert!(june_result.is_ok());
        assert_eq!(*store.snapshot(), july_data);
        assert_eq!(store.current_month().await, Some(july));
    }

    #[tokio::test]
    async fn test_create_blackout_swaps_in_server_entity() {
        let (store, api, notifier) = loaded_store().await;
        let draft = BlackoutDraft {
            campsite_id: Some("s2".to_string()),
            start_date: date("2024-06-15"),
            end_date: date("2024-06-16"),
            reason: "Tree removal".to_string(),
        };
        api.blackouts
            .lock()
            .unwrap()
            .push_back(Step::ready(Ok(Blackout::from_draft("b7".to_string(), &draft))));

        let created = store.create_blackout(draft).await.unwrap();

        assert_eq!(created.id, "b7");
        let current = store.snapshot();
        assert_eq!(current.blackouts.len(), 4);
        assert!(current.blackouts.iter().all(|b| !is_temp_id(&b.id) && !b.saving));
        assert_eq!(notifier.levels(), vec![NoticeLevel::Success]);
    }

    #[tokio::test]
    async fn test_invalid_draft_is_rejected_before_any_request() {
        let (store, api, _) = loaded_store().await;
        let draft = BlackoutDraft {
            campsite_id: None,
            start_date: date("2024-06-16"),
            end_date: date("2024-06-15"),
            reason: "Backwards".to_string(),
        };

        let result = store.create_blackout(draft).await;

        assert!(matches!(
            result,
            Err(SyncError::Model(ModelError::InvalidDateRange { .. }))
        ));
        assert_eq!(api.mutations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_reschedule_rolls_back_and_notifies() {
        let (store, api, notifier) = loaded_store().await;
        api.reschedules
            .lock()
            .unwrap()
            .push_back(Step::ready(Err(ApiError::Conflict("Dates overlap".to_string()))));

        let result = store.reschedule(move_r1_to_s2()).await;

        assert_eq!(
            result,
            Err(SyncError::Api(ApiError::Conflict("Dates overlap".to_string())))
        );
        assert_eq!(*store.snapshot(), snapshot());
        assert_eq!(notifier.levels(), vec![NoticeLevel::Error]);
    }

    #[tokio::test]
    async fn test_reschedule_reports_guest_notification() {
        let (store, api, notifier) = loaded_store().await;
        let request = move_r1_to_s2();
        api.reschedules
            .lock()
            .unwrap()
            .push_back(Step::ready(Ok(response_for(&request, true))));

        store.reschedule(request).await.unwrap();

        let moved = store.snapshot().reservation("r1").cloned().unwrap();
        assert_eq!(moved.placement(), Placement::Site("s2".to_string()));
        assert_eq!(moved.check_in, date("2024-06-14"));
        assert!(!moved.saving);
        assert_eq!(
            notifier.levels(),
            vec![NoticeLevel::Success, NoticeLevel::Info]
        );
    }

    #[tokio::test]
    async fn test_temp_and_missing_ids_are_rejected() {
        let (store, api, _) = loaded_store().await;
        let draft = BlackoutDraft::from(&blackout("b1", Some("s1"), "2024-06-20", "2024-06-23"));

        let pending = store.update_blackout(&temp_id(), draft.clone()).await;
        assert!(matches!(pending, Err(SyncError::PendingEntity(_))));

        let missing = store.delete_blackout("nope").await;
        assert_eq!(missing, Err(SyncError::NotFound("nope".to_string())));

        assert_eq!(api.mutations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_newer_change_supersedes_in_flight_one() {
        let (store, api, notifier) = loaded_store().await;
        let first = move_r1_to_s2();
        let second = RescheduleRequest {
            check_out: date("2024-06-18"),
            ..first.clone()
        };

        let (slow, _gate) = Step::gated(Ok(response_for(&first, false)));
        api.reschedules.lock().unwrap().push_back(slow);
        api.reschedules
            .lock()
            .unwrap()
            .push_back(Step::ready(Ok(response_for(&second, false))));

        let later = async {
            tokio::task::yield_now().await;
            store.reschedule(second).await
        };
        let (first_result, second_result) = tokio::join!(store.reschedule(first), later);

        assert_eq!(first_result, Err(SyncError::Superseded));
        assert!(second_result.is_ok());

        let stored = store.snapshot().reservation("r1").cloned().unwrap();
        assert_eq!(stored.check_out, date("2024-06-18"));
        assert!(!stored.saving);
        assert_eq!(notifier.levels(), vec![NoticeLevel::Success]);
    }

    #[tokio::test]
    async fn test_failed_superseding_change_revalidates() {
        let (store, api, notifier) = loaded_store().await;
        let first = move_r1_to_s2();
        let second = RescheduleRequest {
            check_out: date("2024-06-18"),
            ..first.clone()
        };

        let (slow, _gate) = Step::gated(Ok(response_for(&first, false)));
        api.reschedules.lock().unwrap().push_back(slow);
        api.reschedules
            .lock()
            .unwrap()
            .push_back(Step::ready(Err(ApiError::Network("offline".to_string()))));

        let later = async {
            tokio::task::yield_now().await;
            store.reschedule(second).await
        };
        let (first_result, second_result) = tokio::join!(store.reschedule(first), later);

        assert_eq!(first_result, Err(SyncError::Superseded));
        assert!(matches!(second_result, Err(SyncError::Api(_))));
        assert_eq!(api.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(*store.snapshot(), snapshot());
        assert_eq!(notifier.levels(), vec![NoticeLevel::Error]);
    }

    #[tokio::test]
    async fn test_commit_change_routes_blackout_moves_to_update() {
        let (store, api, _) = loaded_store().await;
        let original = store.snapshot().blackout("b3").cloned().unwrap();
        let proposal = ChangeProposal {
            item: DragItem::Blackout(original.clone()),
            placement: Placement::Site("s1".to_string()),
            start: date("2024-06-07"),
            end: date("2024-06-08"),
        };
        let mut server = original.clone();
        server.campsite_id = Some("s1".to_string());
        server.start_date = date("2024-06-07");
        server.end_date = date("2024-06-08");
        api.blackouts
            .lock()
            .unwrap()
            .push_back(Step::ready(Ok(server.clone())));

        store.commit_change(&proposal).await.unwrap();

        assert_eq!(store.snapshot().blackout("b3"), Some(&server));

        let unchanged = ChangeProposal {
            item: DragItem::Blackout(server.clone()),
            placement: Placement::Site("s1".to_string()),
            start: server.start_date,
            end: server.end_date,
        };
        store.commit_change(&unchanged).await.unwrap();
        assert_eq!(api.mutations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_focus_and_reconnect_are_deduplicated() {
        let (store, api, _) = loaded_store().await;

        assert!(store.on_focus().await.unwrap());
        assert!(!store.on_reconnect().await.unwrap());
        assert_eq!(api.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failsafe_refreshes_stuck_entities_once() {
        let api = Arc::new(MockApi::with_calendar(snapshot()));
        let notifier = Arc::new(RecordingNotifier::default());
        let config = SyncConfig {
            stuck_timeout: Duration::from_secs(10),
            failsafe_throttle: Duration::from_secs(5),
            ..SyncConfig::default()
        };
        let store = CalendarStore::new(api.clone(), notifier.clone(), Some(config));
        store.load_month(june()).await.unwrap();

        store.state.send_modify(|snapshot| {
            let current = Arc::make_mut(snapshot);
            current.reservations[0].saving = true;
            current.blackouts[1].saving = true;
        });

        let start = Instant::now();
        assert!(!store.failsafe_tick(start).await);
        assert!(store.failsafe_tick(start + Duration::from_secs(11)).await);

        assert_eq!(api.fetches.load(Ordering::SeqCst), 2);
        assert!(store.snapshot().saving_keys().is_empty());
        assert_eq!(notifier.levels(), vec![NoticeLevel::Info]);
        assert!(!store.failsafe_tick(start + Duration::from_secs(30)).await);
    }

    #[tokio::test]
    async fn test_failsafe_task_stops_with_store() {
        let api = Arc::new(MockApi::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(CalendarStore::new(api, notifier, None));

        store.start_failsafe().await;
        assert!(store.failsafe.lock().await.is_some());

        store.stop_failsafe().await;
        assert!(store.failsafe.lock().await.is_none());
    }
}
