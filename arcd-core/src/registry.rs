//! Admission, routing and timers for live events.
//!
//! The registry owns every tracked event. Admission checks run under the
//! table lock, so two concurrent starts of the same kind can never both
//! succeed. The table lock is only held for short sections and never while
//! waiting for an event's own lock; event callbacks report what should happen
//! next as [`Directives`] which are applied here once the event is released.

use crate::events::{
    Admission, Directive, Directives, EventAction, EventContext, EventError, EventId, EventTimer,
    GameEvent, OngoingEvent, ParticipationEvent, SharedState,
};
use arcd_sdk::objects::{EventKind, EventState, EventSummary, UserName};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    /// Another event of the same kind objected.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Failed(#[from] EventError),
    #[error("the arcade is closing, no new events can start")]
    ShuttingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Live,
    CoolingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerPurpose {
    Participation,
    Event(EventTimer),
    Cooldown,
}

struct ScheduledTimer {
    id: u64,
    handle: JoinHandle<()>,
}

struct TrackedEvent {
    id: EventId,
    kind: EventKind,
    state: SharedState,
    phase: Phase,
    cooldown: Duration,
    event: Arc<Mutex<GameEvent>>,
    timers: Vec<ScheduledTimer>,
}

impl TrackedEvent {
    fn ongoing(&self) -> OngoingEvent {
        OngoingEvent {
            id: self.id,
            kind: self.kind,
            state: self.state.get(),
            cooling_down: self.phase == Phase::CoolingDown,
        }
    }

    fn handle(&self) -> EventHandle {
        EventHandle {
            id: self.id,
            kind: self.kind,
            state: self.state.clone(),
            event: self.event.clone(),
        }
    }

    fn abort_timers(&mut self) {
        for timer in self.timers.drain(..) {
            timer.handle.abort();
        }
    }
}

/// Shared reference to a tracked event.
#[derive(Clone)]
pub struct EventHandle {
    id: EventId,
    kind: EventKind,
    state: SharedState,
    event: Arc<Mutex<GameEvent>>,
}

impl EventHandle {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn state(&self) -> EventState {
        self.state.get()
    }

    pub async fn lock(&self) -> MutexGuard<'_, GameEvent> {
        self.event.lock().await
    }
}

struct RegistryInner {
    ctx: EventContext,
    table: Mutex<Vec<TrackedEvent>>,
    next_timer: AtomicU64,
    shutdown_tx: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct EventRegistry {
    inner: Arc<RegistryInner>,
}

impl EventRegistry {
    pub fn new(ctx: EventContext) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(RegistryInner {
                ctx,
                table: Mutex::new(Vec::new()),
                next_timer: AtomicU64::new(0),
                shutdown_tx,
            }),
        }
    }

    pub fn context(&self) -> &EventContext {
        &self.inner.ctx
    }

    fn is_shutting_down(&self) -> bool {
        *self.inner.shutdown_tx.borrow()
    }

    /// Admit and start `event` on behalf of `user`.
    ///
    /// Every tracked event of the same kind gets to object first. A rejected
    /// event is dropped before it has touched the ledger.
    pub async fn request_start(
        &self,
        event: impl Into<GameEvent>,
        user: &UserName,
    ) -> Result<EventHandle, StartError> {
        let mut event = event.into();
        let kind = event.kind();
        if self.is_shutting_down() {
            return Err(StartError::ShuttingDown);
        }

        let mut table = self.inner.table.lock().await;
        // shutdown() may have drained the table while we waited for the lock.
        if self.is_shutting_down() {
            return Err(StartError::ShuttingDown);
        }
        for tracked in table.iter().filter(|t| t.kind == kind) {
            if let Admission::Rejected(message) = event.check_for_ongoing_event(&tracked.ongoing(), user)
            {
                debug!(%kind, %user, existing = %tracked.id, "Start rejected");
                return Err(StartError::Rejected(message));
            }
        }

        let directives = match event.start(&self.inner.ctx).await {
            Ok(directives) => directives,
            Err(e) => {
                info!(%kind, %user, error = %e, "Event failed to start");
                return Err(StartError::Failed(e));
            }
        };

        let id = Uuid::new_v4();
        let window = event.participation_window();
        let mut tracked = TrackedEvent {
            id,
            kind,
            state: event.shared_state(),
            phase: Phase::Live,
            cooldown: event.cooldown(),
            event: Arc::new(Mutex::new(event)),
            timers: Vec::new(),
        };
        if let Some(window) = window {
            let timer = self.spawn_timer(id, TimerPurpose::Participation, window);
            tracked.timers.push(timer);
        }
        let handle = tracked.handle();
        table.push(tracked);
        drop(table);

        info!(event_id = %id, %kind, %user, "Event started");
        self.apply(id, directives).await;
        Ok(handle)
    }

    /// Route a follow-up action to a live event.
    pub async fn act(&self, handle: &EventHandle, action: EventAction) -> Result<(), EventError> {
        let mut event = handle.lock().await;
        if !self.is_live(handle.id).await {
            return Err(EventError::EventGone(handle.kind));
        }
        debug!(event_id = %handle.id, action = action.name(), user = %action.user(), "Routing action");
        let directives = event.handle(action, &self.inner.ctx).await?;
        drop(event);
        self.apply(handle.id, directives).await;
        Ok(())
    }

    /// Deregister an event immediately.
    pub async fn stop(&self, id: EventId) {
        let mut table = self.inner.table.lock().await;
        let Some(index) = table.iter().position(|t| t.id == id) else {
            return;
        };
        let mut tracked = table.swap_remove(index);
        tracked.abort_timers();
        info!(event_id = %id, kind = %tracked.kind, "Event stopped");
    }

    /// End an event and keep it tracked, blocking new events of its kind,
    /// until its cooldown elapses.
    pub async fn stop_and_cooldown(&self, id: EventId) {
        if self.is_shutting_down() {
            return;
        }
        let mut table = self.inner.table.lock().await;
        let Some(tracked) = table.iter_mut().find(|t| t.id == id) else {
            return;
        };
        if tracked.phase == Phase::CoolingDown {
            return;
        }
        tracked.phase = Phase::CoolingDown;
        tracked.state.advance(EventState::Ended);
        tracked.abort_timers();
        let timer = self.spawn_timer(id, TimerPurpose::Cooldown, tracked.cooldown);
        tracked.timers.push(timer);
        info!(event_id = %id, kind = %tracked.kind, cooldown_secs = tracked.cooldown.as_secs(), "Event cooling down");
    }

    /// Handles to every tracked event of `kind`, cooling ones included.
    pub async fn query(&self, kind: EventKind) -> Vec<EventHandle> {
        self.query_by(|event| event.kind == kind).await
    }

    pub async fn query_by(&self, predicate: impl Fn(&OngoingEvent) -> bool) -> Vec<EventHandle> {
        let table = self.inner.table.lock().await;
        table
            .iter()
            .filter(|t| predicate(&t.ongoing()))
            .map(TrackedEvent::handle)
            .collect()
    }

    pub async fn get(&self, id: EventId) -> Option<EventHandle> {
        let table = self.inner.table.lock().await;
        table.iter().find(|t| t.id == id).map(TrackedEvent::handle)
    }

    /// First live (not cooling) event of `kind` matching `predicate`.
    pub async fn find(
        &self,
        kind: EventKind,
        predicate: impl Fn(&GameEvent) -> bool,
    ) -> Option<EventHandle> {
        let candidates = self.live_handles(kind).await;
        for handle in candidates {
            if predicate(&*handle.lock().await) {
                return Some(handle);
            }
        }
        None
    }

    pub async fn find_by_participant(&self, kind: EventKind, user: &UserName) -> Option<EventHandle> {
        self.find(kind, |event| event.participants().contains(user)).await
    }

    /// Snapshot of one event. Works for events that are no longer tracked.
    pub async fn summary(&self, handle: &EventHandle) -> EventSummary {
        let participants = handle.lock().await.participants();
        let cooling_down = {
            let table = self.inner.table.lock().await;
            table
                .iter()
                .any(|t| t.id == handle.id && t.phase == Phase::CoolingDown)
        };
        EventSummary {
            id: handle.id,
            kind: handle.kind,
            state: handle.state(),
            cooling_down,
            participants,
        }
    }

    pub async fn summaries(&self) -> Vec<EventSummary> {
        let snapshot = {
            let table = self.inner.table.lock().await;
            table
                .iter()
                .map(|t| (t.ongoing(), t.event.clone()))
                .collect::<Vec<_>>()
        };
        let mut summaries = Vec::with_capacity(snapshot.len());
        for (ongoing, event) in snapshot {
            let participants = event.lock().await.participants();
            summaries.push(EventSummary {
                id: ongoing.id,
                kind: ongoing.kind,
                state: ongoing.state,
                cooling_down: ongoing.cooling_down,
                participants,
            });
        }
        summaries
    }

    /// Cancel every timer and return escrow held by live events.
    ///
    /// Cooling events are simply dropped. No event can start afterwards.
    pub async fn shutdown(&self) {
        self.inner.shutdown_tx.send_replace(true);
        let drained = {
            let mut table = self.inner.table.lock().await;
            let mut drained = std::mem::take(&mut *table);
            for tracked in &mut drained {
                tracked.abort_timers();
            }
            drained
        };
        let live = drained.iter().filter(|t| t.phase == Phase::Live).count();
        info!(tracked = drained.len(), live, "Shutting down event registry");
        for tracked in drained.into_iter().filter(|t| t.phase == Phase::Live) {
            tracked.event.lock().await.abort(&self.inner.ctx).await;
        }
    }

    async fn live_handles(&self, kind: EventKind) -> Vec<EventHandle> {
        self.query_by(|event| event.kind == kind && !event.cooling_down).await
    }

    async fn is_live(&self, id: EventId) -> bool {
        let table = self.inner.table.lock().await;
        table
            .iter()
            .any(|t| t.id == id && t.phase == Phase::Live)
    }

    async fn apply(&self, id: EventId, directives: Directives) {
        for directive in directives {
            match directive {
                Directive::Schedule { timer, after } => {
                    self.schedule(id, TimerPurpose::Event(timer), after).await;
                }
                Directive::Stop => self.stop(id).await,
                Directive::Cooldown => self.stop_and_cooldown(id).await,
            }
        }
    }

    async fn schedule(&self, id: EventId, purpose: TimerPurpose, after: Duration) {
        if self.is_shutting_down() {
            return;
        }
        let mut table = self.inner.table.lock().await;
        let Some(tracked) = table
            .iter_mut()
            .find(|t| t.id == id && t.phase == Phase::Live)
        else {
            return;
        };
        let timer = self.spawn_timer(id, purpose, after);
        tracked.timers.push(timer);
    }

    fn spawn_timer(&self, id: EventId, purpose: TimerPurpose, after: Duration) -> ScheduledTimer {
        let timer_id = self.inner.next_timer.fetch_add(1, Ordering::Relaxed);
        let registry: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        let mut shutdown_rx = self.inner.shutdown_tx.subscribe();
        debug!(event_id = %id, ?purpose, after_ms = after.as_millis() as u64, "Timer scheduled");

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => return,
                _ = tokio::time::sleep(after) => {}
            }
            if let Some(inner) = registry.upgrade() {
                EventRegistry { inner }.fire(id, timer_id, purpose).await;
            }
        });
        ScheduledTimer {
            id: timer_id,
            handle,
        }
    }

    async fn fire(&self, id: EventId, timer_id: u64, purpose: TimerPurpose) {
        // A timer that is no longer registered was cancelled after it woke up.
        let (event, phase) = {
            let mut table = self.inner.table.lock().await;
            let Some(tracked) = table.iter_mut().find(|t| t.id == id) else {
                return;
            };
            let Some(index) = tracked.timers.iter().position(|t| t.id == timer_id) else {
                return;
            };
            tracked.timers.swap_remove(index);
            (tracked.event.clone(), tracked.phase)
        };

        match (purpose, phase) {
            (TimerPurpose::Cooldown, _) => {
                {
                    let mut table = self.inner.table.lock().await;
                    table.retain(|t| t.id != id);
                }
                event.lock().await.on_cooldown_complete(&self.inner.ctx).await;
                info!(event_id = %id, "Cooldown complete");
            }
            (_, Phase::CoolingDown) => {}
            (purpose, Phase::Live) => {
                let mut guard = event.lock().await;
                if guard.state() == EventState::Ended || !self.is_live(id).await {
                    return;
                }
                let result = match purpose {
                    TimerPurpose::Event(timer) => guard.on_timer(timer, &self.inner.ctx).await,
                    _ => guard.participation_period_ended(&self.inner.ctx).await,
                };
                drop(guard);
                match result {
                    Ok(directives) => self.apply(id, directives).await,
                    Err(e) => {
                        error!(event_id = %id, ?purpose, error = %e, "Timer callback failed, stopping event");
                        self.stop(id).await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuctionConfig, DuelConfig, HeistConfig, TradeConfig};
    use crate::events::{Auction, BankHeist, CardTrade, Duel};
    use crate::testing::{Fixture, user};
    use arcd_sdk::objects::{TradeAsk, Weapon};

    fn heist(name: &str, wager: i64) -> BankHeist {
        BankHeist::new(user(name), wager, &HeistConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_heist_is_rejected_without_ledger_effect() {
        let fixture = Fixture::with_balances(&[("alice", 100), ("bob", 100)]);
        let registry = EventRegistry::new(fixture.context());
        registry.request_start(heist("alice", 10), &user("alice")).await.unwrap();

        let second = registry.request_start(heist("bob", 10), &user("bob")).await;

        assert!(matches!(second, Err(StartError::Rejected(_))));
        assert_eq!(fixture.balance("bob").await, 100);
        assert_eq!(fixture.ledger.journal().await.len(), 1);
        assert_eq!(registry.query(EventKind::BankHeist).await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_heist_starts_admit_one() {
        for _ in 0..20 {
            let names: Vec<String> = (0..16).map(|i| format!("user{i}")).collect();
            let balances: Vec<(&str, i64)> = names.iter().map(|n| (n.as_str(), 100)).collect();
            let fixture = Fixture::with_balances(&balances);
            let registry = EventRegistry::new(fixture.context());

            let attempts: Vec<_> = names
                .iter()
                .map(|name| {
                    let registry = registry.clone();
                    let name = name.clone();
                    tokio::spawn(async move {
                        registry.request_start(heist(&name, 10), &user(&name)).await
                    })
                })
                .collect();
            let mut admitted = 0;
            for attempt in attempts {
                match attempt.await.unwrap() {
                    Ok(_) => admitted += 1,
                    Err(e) => assert!(matches!(e, StartError::Rejected(_))),
                }
            }

            assert_eq!(admitted, 1);
            assert_eq!(fixture.ledger.journal().await.len(), 1);
            assert_eq!(registry.query(EventKind::BankHeist).await.len(), 1);
            registry.shutdown().await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_start_racing_shutdown_is_refunded() {
        for _ in 0..20 {
            let fixture = Fixture::with_balances(&[("alice", 100), ("bob", 100)]);
            let registry = EventRegistry::new(fixture.context());

            let start = {
                let registry = registry.clone();
                tokio::spawn(async move {
                    registry.request_start(heist("alice", 10), &user("alice")).await
                })
            };
            let stop = {
                let registry = registry.clone();
                tokio::spawn(async move { registry.shutdown().await })
            };
            let started = start.await.unwrap();
            stop.await.unwrap();

            assert!(matches!(started, Ok(_) | Err(StartError::ShuttingDown)));
            assert_eq!(fixture.balance("alice").await, 100);
            assert!(registry.summaries().await.is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_heist_runs_to_cooldown_and_reopens() {
        let fixture = Fixture::with_balances(&[("alice", 100), ("bob", 100)]);
        let registry = EventRegistry::new(fixture.context());
        let config = HeistConfig::default();
        let handle = registry.request_start(heist("alice", 10), &user("alice")).await.unwrap();
        registry
            .act(&handle, EventAction::Join { user: user("bob"), wager: 20 })
            .await
            .unwrap();

        tokio::time::sleep(config.join_window() + config.suspense() + Duration::from_secs(1)).await;

        assert_eq!(handle.state(), EventState::Ended);
        let cooling = registry.query_by(|e| e.cooling_down).await;
        assert_eq!(cooling.len(), 1);
        let again = registry.request_start(heist("bob", 10), &user("bob")).await;
        assert!(matches!(again, Err(StartError::Rejected(_))));

        tokio::time::sleep(config.cooldown()).await;

        assert!(registry.query(EventKind::BankHeist).await.is_empty());
        assert!(fixture.notifier.contains("banks have reopened"));
        registry.request_start(heist("bob", 10), &user("bob")).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_weapon_deadline_refunds_through_timer() {
        let fixture = Fixture::with_balances(&[("alice", 100), ("bob", 100)]);
        let registry = EventRegistry::new(fixture.context());
        let duel = Duel::new(user("alice"), Some(user("bob")), 30, &DuelConfig::default()).unwrap();
        let handle = registry.request_start(duel, &user("alice")).await.unwrap();
        registry
            .act(&handle, EventAction::Accept { user: user("bob") })
            .await
            .unwrap();
        registry
            .act(
                &handle,
                EventAction::ChooseWeapon {
                    user: user("bob"),
                    weapon: Weapon::Rock,
                },
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(registry.query(EventKind::Duel).await.is_empty());
        assert_eq!(fixture.balance("alice").await, 100);
        assert_eq!(fixture.balance("bob").await, 100);
        let late = registry
            .act(&handle, EventAction::Accept { user: user("bob") })
            .await;
        assert_eq!(late.err(), Some(EventError::EventGone(EventKind::Duel)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolved_duel_cools_down() {
        let fixture = Fixture::with_balances(&[("alice", 100), ("bob", 100)]);
        let registry = EventRegistry::new(fixture.context());
        let config = DuelConfig::default();
        let duel = Duel::new(user("alice"), None, 30, &config).unwrap();
        let handle = registry.request_start(duel, &user("alice")).await.unwrap();
        registry.act(&handle, EventAction::Accept { user: user("bob") }).await.unwrap();
        for (name, weapon) in [("alice", Weapon::Rock), ("bob", Weapon::Scissors)] {
            registry
                .act(&handle, EventAction::ChooseWeapon { user: user(name), weapon })
                .await
                .unwrap();
        }

        let summaries = registry.summaries().await;
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].cooling_down);
        assert_eq!(summaries[0].participants, vec![user("alice"), user("bob")]);
        assert_eq!(fixture.balance("alice").await, 130);

        tokio::time::sleep(config.cooldown() + Duration::from_secs(1)).await;
        assert!(registry.summaries().await.is_empty());
        assert!(fixture.notifier.contains("dueling grounds are open"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_start_leaves_nothing_behind() {
        let fixture = Fixture::new(&[], &[]);
        let registry = EventRegistry::new(fixture.context());
        let trade = CardTrade::new(
            user("alice"),
            "Golden Kappa",
            TradeAsk::Points(10),
            None,
            &TradeConfig::default(),
        )
        .unwrap();

        let result = registry.request_start(trade, &user("alice")).await;

        assert!(matches!(result, Err(StartError::Failed(EventError::Ledger(_)))));
        assert!(registry.summaries().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_auction_closes_itself() {
        let fixture = Fixture::with_balances(&[("alice", 100)]);
        let registry = EventRegistry::new(fixture.context());
        let auction = Auction::new(
            user("host"),
            "Signed poster",
            5,
            Some(Duration::from_secs(30)),
            &AuctionConfig::default(),
        )
        .unwrap();
        let handle = registry.request_start(auction, &user("host")).await.unwrap();
        registry
            .act(&handle, EventAction::Bid { user: user("alice"), amount: 40 })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(handle.state(), EventState::Ended);
        assert_eq!(fixture.balance("alice").await, 60);
        assert!(fixture.notifier.contains("@alice wins Signed poster"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_refunds_live_escrow() {
        let fixture = Fixture::with_balances(&[("alice", 100), ("bob", 100)]);
        let registry = EventRegistry::new(fixture.context());
        let handle = registry.request_start(heist("alice", 10), &user("alice")).await.unwrap();
        registry
            .act(&handle, EventAction::Join { user: user("bob"), wager: 50 })
            .await
            .unwrap();

        registry.shutdown().await;
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(fixture.balance("alice").await, 100);
        assert_eq!(fixture.balance("bob").await, 100);
        assert!(registry.summaries().await.is_empty());
        assert!(matches!(
            registry.request_start(heist("bob", 10), &user("bob")).await,
            Err(StartError::ShuttingDown)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_find_by_participant_skips_other_events() {
        let fixture = Fixture::with_balances(&[("alice", 100), ("bob", 100)]);
        let registry = EventRegistry::new(fixture.context());
        registry.request_start(heist("alice", 10), &user("alice")).await.unwrap();

        assert!(
            registry
                .find_by_participant(EventKind::BankHeist, &user("alice"))
                .await
                .is_some()
        );
        assert!(
            registry
                .find_by_participant(EventKind::BankHeist, &user("bob"))
                .await
                .is_none()
        );
        assert!(
            registry
                .find_by_participant(EventKind::Duel, &user("alice"))
                .await
                .is_none()
        );
    }
}
