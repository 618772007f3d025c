//! Interfaces to the shared point ledger and card inventory.
//!
//! The ledger is the only state shared between events. Every mutation is an
//! atomic read-modify-write: a change that would leave a balance negative is
//! refused as a whole, which is what lets events validate and escrow a wager
//! in a single call.

pub mod memory;

pub use memory::{LedgerEntry, MemoryInventory, MemoryLedger};

use arcd_sdk::objects::UserName;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("@{user}, you need {needed} points but only have {balance}")]
    InsufficientPoints {
        user: UserName,
        balance: i64,
        needed: i64,
    },
    #[error("@{user}, you do not own the card \"{card}\"")]
    CardNotOwned { user: UserName, card: String },
    #[error("ledger backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait PointLedger: Send + Sync {
    async fn balance(&self, user: &UserName) -> Result<i64, LedgerError>;

    /// Apply `delta` to the user's balance and return the new balance.
    ///
    /// Fails with [`LedgerError::InsufficientPoints`] and changes nothing if
    /// the balance would drop below zero.
    async fn change_points(
        &self,
        user: &UserName,
        delta: i64,
        reason: &str,
    ) -> Result<i64, LedgerError>;

    /// Apply the same `delta` to every user, all or nothing.
    async fn change_points_for_users(
        &self,
        users: &[UserName],
        delta: i64,
        reason: &str,
    ) -> Result<(), LedgerError>;
}

#[async_trait]
pub trait CardInventory: Send + Sync {
    async fn owns(&self, user: &UserName, card: &str) -> Result<bool, LedgerError>;

    /// Remove one copy of `card` from the user's inventory.
    async fn take_card(&self, user: &UserName, card: &str) -> Result<(), LedgerError>;

    async fn give_card(&self, user: &UserName, card: &str) -> Result<(), LedgerError>;
}
