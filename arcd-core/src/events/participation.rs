//! The lifecycle every event kind shares.
//!
//! A [`Participation`] owns the event state, the ordered participant table
//! and the two standard durations. Variants embed one and layer their own
//! phases and resolution rules on top.

use super::{EventContext, EventError};
use crate::ledger::PointLedger;
use arcd_sdk::objects::{EventState, UserName};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tracing::error;

pub trait Participant: Send {
    fn user(&self) -> &UserName;
    /// Points committed by this participant. May be zero.
    fn wager(&self) -> i64;
}

/// A participant with nothing beyond a wager (heist crew, arena fighter,
/// auction bidder, trade partner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entrant {
    pub user: UserName,
    pub wager: i64,
}

impl Entrant {
    pub fn new(user: UserName, wager: i64) -> Self {
        Self { user, wager }
    }
}

impl Participant for Entrant {
    fn user(&self) -> &UserName {
        &self.user
    }

    fn wager(&self) -> i64 {
        self.wager
    }
}

/// Event state readable without locking the event.
///
/// The registry reads it during admission checks while the event itself may
/// be busy settling. Writes only ever move the state forward.
#[derive(Debug, Clone, Default)]
pub struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub fn get(&self) -> EventState {
        EventState::from_repr(self.0.load(Ordering::Acquire))
    }

    /// Move to `next` unless the state is already there or further along.
    /// Returns whether the state changed.
    pub fn advance(&self, next: EventState) -> bool {
        let previous = self.0.fetch_max(next as u8, Ordering::AcqRel);
        previous < next as u8
    }
}

pub struct Participation<P> {
    state: SharedState,
    participants: Vec<P>,
    participation_window: Option<Duration>,
    cooldown: Duration,
}

impl<P: Participant> Participation<P> {
    /// `participation_window` of `None` means the event has no fixed join
    /// phase and concludes through its own actions.
    pub fn new(participation_window: Option<Duration>, cooldown: Duration) -> Self {
        Self {
            state: SharedState::default(),
            participants: Vec::new(),
            participation_window,
            cooldown,
        }
    }

    pub fn state(&self) -> EventState {
        self.state.get()
    }

    pub fn shared_state(&self) -> SharedState {
        self.state.clone()
    }

    pub fn advance(&self, next: EventState) -> bool {
        self.state.advance(next)
    }

    pub fn is_open(&self) -> bool {
        self.state() == EventState::Open
    }

    pub fn is_ended(&self) -> bool {
        self.state() == EventState::Ended
    }

    pub fn participation_window(&self) -> Option<Duration> {
        self.participation_window
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn participants(&self) -> &[P] {
        &self.participants
    }

    pub fn usernames(&self) -> Vec<UserName> {
        self.participants.iter().map(|p| p.user().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, user: &UserName) -> bool {
        self.find(user).is_some()
    }

    pub fn find(&self, user: &UserName) -> Option<&P> {
        self.participants.iter().find(|p| p.user() == user)
    }

    pub fn find_mut(&mut self, user: &UserName) -> Option<&mut P> {
        self.participants.iter_mut().find(|p| p.user() == user)
    }

    pub fn total_wagers(&self) -> i64 {
        self.participants.iter().map(Participant::wager).sum()
    }

    /// Add a participant, escrowing their wager when `deduct` is set.
    ///
    /// Returns `Ok(false)` without touching the ledger if the user already
    /// takes part. The deduction happens before the participant is recorded;
    /// if the ledger refuses it the table is left unchanged.
    pub async fn add_participant(
        &mut self,
        participant: P,
        deduct: bool,
        ledger: &dyn PointLedger,
        reason: &str,
    ) -> Result<bool, EventError> {
        if self.contains(participant.user()) {
            return Ok(false);
        }
        if deduct && participant.wager() > 0 {
            ledger
                .change_points(participant.user(), -participant.wager(), reason)
                .await?;
        }
        self.participants.push(participant);
        Ok(true)
    }

    /// Return every participant's wager.
    pub async fn refund_all(&self, ctx: &EventContext, reason: &str) {
        let Some(first) = self.participants.first() else {
            return;
        };
        let uniform = self.participants.iter().all(|p| p.wager() == first.wager());
        if uniform {
            if first.wager() == 0 {
                return;
            }
            let users = self.usernames();
            match ctx
                .ledger
                .change_points_for_users(&users, first.wager(), reason)
                .await
            {
                Ok(()) => return,
                Err(e) => {
                    error!(error = %e, reason, "Batch refund failed, refunding one by one");
                }
            }
        }
        for participant in &self.participants {
            settle(ctx, participant.user(), participant.wager(), reason).await;
        }
    }
}

/// Credit (or debit) a user as part of a settlement.
///
/// A failure is logged and reported as `false`; settlement carries on with
/// the remaining participants.
pub async fn settle(ctx: &EventContext, user: &UserName, delta: i64, reason: &str) -> bool {
    if delta == 0 {
        return true;
    }
    match ctx.ledger.change_points(user, delta, reason).await {
        Ok(_) => true,
        Err(e) => {
            error!(%user, delta, reason, error = %e, "Settlement failed");
            false
        }
    }
}
