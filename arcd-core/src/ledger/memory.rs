//! In-memory ledger and inventory.
//!
//! Used by the server when no external point store is wired in, and by the
//! tests. The ledger keeps a journal of every applied change so settlements
//! can be audited after the fact.

use super::{CardInventory, LedgerError, PointLedger};
use arcd_sdk::objects::UserName;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// One applied balance change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub user: UserName,
    pub delta: i64,
    pub reason: String,
}

#[derive(Default)]
struct Book {
    balances: HashMap<UserName, i64>,
    journal: Vec<LedgerEntry>,
}

impl Book {
    fn balance(&self, user: &UserName) -> i64 {
        self.balances.get(user).copied().unwrap_or(0)
    }

    fn ensure_covers(&self, user: &UserName, delta: i64) -> Result<(), LedgerError> {
        let balance = self.balance(user);
        if balance + delta < 0 {
            return Err(LedgerError::InsufficientPoints {
                user: user.clone(),
                balance,
                needed: -delta,
            });
        }
        Ok(())
    }

    fn apply(&mut self, user: &UserName, delta: i64, reason: &str) -> i64 {
        let balance = self.balances.entry(user.clone()).or_insert(0);
        *balance += delta;
        self.journal.push(LedgerEntry {
            user: user.clone(),
            delta,
            reason: reason.to_string(),
        });
        *balance
    }
}

/// Point balances held in process memory.
#[derive(Default)]
pub struct MemoryLedger {
    book: RwLock<Book>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed balances without recording journal entries.
    pub fn with_balances(balances: impl IntoIterator<Item = (UserName, i64)>) -> Self {
        let book = Book {
            balances: balances.into_iter().collect(),
            journal: Vec::new(),
        };
        Self {
            book: RwLock::new(book),
        }
    }

    pub async fn journal(&self) -> Vec<LedgerEntry> {
        self.book.read().await.journal.clone()
    }

    /// Sum of all journaled changes. Zero means every escrowed point was
    /// given back.
    pub async fn net_change(&self) -> i64 {
        self.book.read().await.journal.iter().map(|e| e.delta).sum()
    }
}

#[async_trait]
impl PointLedger for MemoryLedger {
    async fn balance(&self, user: &UserName) -> Result<i64, LedgerError> {
        Ok(self.book.read().await.balance(user))
    }

    async fn change_points(
        &self,
        user: &UserName,
        delta: i64,
        reason: &str,
    ) -> Result<i64, LedgerError> {
        let mut book = self.book.write().await;
        book.ensure_covers(user, delta)?;
        let balance = book.apply(user, delta, reason);
        debug!(%user, delta, balance, reason, "Changed points");
        Ok(balance)
    }

    async fn change_points_for_users(
        &self,
        users: &[UserName],
        delta: i64,
        reason: &str,
    ) -> Result<(), LedgerError> {
        let mut book = self.book.write().await;
        for user in users {
            book.ensure_covers(user, delta)?;
        }
        for user in users {
            book.apply(user, delta, reason);
        }
        debug!(users = users.len(), delta, reason, "Changed points for users");
        Ok(())
    }
}

/// Trading cards held in process memory. Card names match case-insensitively.
#[derive(Default)]
pub struct MemoryInventory {
    cards: RwLock<HashMap<UserName, Vec<String>>>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(cards: impl IntoIterator<Item = (UserName, Vec<String>)>) -> Self {
        Self {
            cards: RwLock::new(cards.into_iter().collect()),
        }
    }

    pub async fn cards_of(&self, user: &UserName) -> Vec<String> {
        self.cards
            .read()
            .await
            .get(user)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CardInventory for MemoryInventory {
    async fn owns(&self, user: &UserName, card: &str) -> Result<bool, LedgerError> {
        let cards = self.cards.read().await;
        Ok(cards
            .get(user)
            .is_some_and(|owned| owned.iter().any(|c| c.eq_ignore_ascii_case(card))))
    }

    async fn take_card(&self, user: &UserName, card: &str) -> Result<(), LedgerError> {
        let mut cards = self.cards.write().await;
        let owned = cards.get_mut(user);
        let position = owned
            .as_ref()
            .and_then(|owned| owned.iter().position(|c| c.eq_ignore_ascii_case(card)));
        match (owned, position) {
            (Some(owned), Some(index)) => {
                owned.swap_remove(index);
                debug!(%user, card, "Took card");
                Ok(())
            }
            _ => Err(LedgerError::CardNotOwned {
                user: user.clone(),
                card: card.to_string(),
            }),
        }
    }

    async fn give_card(&self, user: &UserName, card: &str) -> Result<(), LedgerError> {
        self.cards
            .write()
            .await
            .entry(user.clone())
            .or_default()
            .push(card.to_string());
        debug!(%user, card, "Gave card");
        Ok(())
    }
}
