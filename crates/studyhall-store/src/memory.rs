//! In-memory storage implementation.
//!
//! This module provides the `MemoryStore` implementation of the `Store` trait.
//!
//! Every user record lives behind its own `Mutex`, indexed by a `RwLock`ed map.
//! The map lock is only held long enough to find or insert an entry; balance
//! checks and mutations happen under the per-user lock, so two users never
//! contend with each other. Sessions follow the same layout so that the
//! active-to-ended transition is exactly-once per session.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use studyhall_core::{
    seed_teachers, Booking, BookingId, BookingStatus, CreditMeta, CreditTransaction, Note,
    NoteId, NoteOrder, SessionId, Teacher, TransactionSource, User, UserId, VideoSession,
};

use crate::error::{Result, StoreError};
use crate::{Store, StoreStats};

/// A user together with its append-only transaction log.
#[derive(Debug)]
struct Account {
    user: User,
    transactions: Vec<CreditTransaction>,
}

impl Account {
    fn record(&mut self, tx: CreditTransaction) {
        self.user.credits = tx.balance_after;
        self.transactions.push(tx);
    }
}

type Shared<T> = Arc<Mutex<T>>;

/// Memory-resident storage implementation.
pub struct MemoryStore {
    starting_credits: i64,
    accounts: RwLock<HashMap<UserId, Shared<Account>>>,
    payment_refs: Mutex<HashSet<String>>,
    sessions: RwLock<HashMap<SessionId, Shared<VideoSession>>>,
    notes: RwLock<HashMap<NoteId, Note>>,
    teachers: Vec<Teacher>,
    bookings: RwLock<HashMap<BookingId, Booking>>,
}

impl MemoryStore {
    /// Create an empty store. New users start with `starting_credits`.
    #[must_use]
    pub fn new(starting_credits: i64) -> Self {
        Self {
            starting_credits,
            accounts: RwLock::new(HashMap::new()),
            payment_refs: Mutex::new(HashSet::new()),
            sessions: RwLock::new(HashMap::new()),
            notes: RwLock::new(HashMap::new()),
            teachers: seed_teachers(),
            bookings: RwLock::new(HashMap::new()),
        }
    }

    /// Look up an existing account entry.
    fn account(&self, user_id: &UserId) -> Option<Shared<Account>> {
        self.accounts.read().get(user_id).cloned()
    }

    /// Look up an account entry, creating it if absent.
    fn account_or_create(&self, user_id: &UserId) -> Shared<Account> {
        if let Some(entry) = self.account(user_id) {
            return entry;
        }

        let mut accounts = self.accounts.write();
        let entry = accounts.entry(user_id.clone()).or_insert_with(|| {
            let mut account = Account {
                user: User::new(user_id.clone(), 0),
                transactions: Vec::new(),
            };
            // The starting grant is a transaction so the log always sums to the balance.
            if self.starting_credits > 0 {
                account.record(CreditTransaction::credit(
                    user_id.clone(),
                    self.starting_credits,
                    self.starting_credits,
                    CreditMeta::from_source(TransactionSource::System),
                ));
            }
            tracing::debug!(user_id = %user_id, credits = %account.user.credits, "User created");
            Arc::new(Mutex::new(account))
        });

        Arc::clone(entry)
    }

    fn session(&self, session_id: &SessionId) -> Result<Shared<VideoSession>> {
        let sessions = self.sessions.read();
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound {
                session_id: session_id.to_string(),
            })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(studyhall_core::DEFAULT_STARTING_CREDITS)
    }
}

impl Store for MemoryStore {
    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn get_or_create_user(&self, user_id: &UserId) -> Result<User> {
        let entry = self.account_or_create(user_id);
        let account = entry.lock();
        Ok(account.user.clone())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let Some(entry) = self.account(user_id) else {
            return Ok(None);
        };
        let account = entry.lock();
        Ok(Some(account.user.clone()))
    }

    fn add_credits(&self, user_id: &UserId, amount: i64, meta: CreditMeta) -> Result<User> {
        if amount <= 0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        let entry = self.account_or_create(user_id);
        let mut account = entry.lock();

        let balance_after = account
            .user
            .credits
            .checked_add(amount)
            .ok_or(StoreError::InvalidAmount(amount))?;

        // Claimed under the user lock; nothing after this point can fail.
        if let Some(reference) = &meta.external_ref {
            let mut refs = self.payment_refs.lock();
            if !refs.insert(reference.clone()) {
                return Err(StoreError::DuplicateReference {
                    reference: reference.clone(),
                });
            }
        }

        let source = meta.source;
        account.record(CreditTransaction::credit(
            user_id.clone(),
            amount,
            balance_after,
            meta,
        ));

        tracing::info!(
            user_id = %user_id,
            amount = %amount,
            source = %source,
            balance = %balance_after,
            "Credits added"
        );

        Ok(account.user.clone())
    }

    fn consume_credits(
        &self,
        user_id: &UserId,
        amount: i64,
        source: TransactionSource,
    ) -> Result<User> {
        if amount <= 0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        let entry = self
            .account(user_id)
            .ok_or_else(|| StoreError::UserNotFound {
                user_id: user_id.to_string(),
            })?;
        let mut account = entry.lock();

        if !account.user.has_sufficient_credits(amount) {
            return Err(StoreError::InsufficientCredits {
                balance: account.user.credits,
                required: amount,
            });
        }

        let balance_after = account.user.credits - amount;
        account.record(CreditTransaction::debit(
            user_id.clone(),
            amount,
            balance_after,
            source,
        ));

        tracing::info!(
            user_id = %user_id,
            amount = %amount,
            source = %source,
            balance = %balance_after,
            "Credits consumed"
        );

        Ok(account.user.clone())
    }

    fn has_payment_reference(&self, reference: &str) -> Result<bool> {
        let refs = self.payment_refs.lock();
        Ok(refs.contains(reference))
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>> {
        let entry = self
            .account(user_id)
            .ok_or_else(|| StoreError::UserNotFound {
                user_id: user_id.to_string(),
            })?;
        let account = entry.lock();

        Ok(account
            .transactions
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    // =========================================================================
    // Video Session Operations
    // =========================================================================

    fn put_session(&self, session: &VideoSession) -> Result<()> {
        let mut sessions = self.sessions.write();
        sessions.insert(session.id, Arc::new(Mutex::new(session.clone())));
        Ok(())
    }

    fn get_session(&self, session_id: &SessionId) -> Result<Option<VideoSession>> {
        match self.session(session_id) {
            Ok(entry) => Ok(Some(entry.lock().clone())),
            Err(StoreError::SessionNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn end_session(&self, session_id: &SessionId) -> Result<VideoSession> {
        let entry = self.session(session_id)?;
        let mut session = entry.lock();

        if session.ended_at.is_some() {
            return Err(StoreError::AlreadyEnded {
                session_id: session_id.to_string(),
            });
        }

        session.ended_at = Some(Utc::now());
        Ok(session.clone())
    }

    fn set_session_peer(&self, session_id: &SessionId, peer: &UserId) -> Result<VideoSession> {
        let entry = self.session(session_id)?;
        let mut session = entry.lock();

        if session.ended_at.is_some() {
            return Err(StoreError::AlreadyEnded {
                session_id: session_id.to_string(),
            });
        }

        session.peer_user_id = Some(peer.clone());
        Ok(session.clone())
    }

    fn list_sessions_by_user(&self, user_id: &UserId) -> Result<Vec<VideoSession>> {
        let entries: Vec<_> = {
            let sessions = self.sessions.read();
            sessions.values().cloned().collect()
        };

        let mut list = Vec::new();
        for entry in entries {
            let session = entry.lock();
            if session.involves(user_id) {
                list.push(session.clone());
            }
        }

        list.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.id.cmp(&b.id)));
        Ok(list)
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    fn put_note(&self, note: &Note) -> Result<()> {
        let mut notes = self.notes.write();
        notes.insert(note.id, note.clone());
        Ok(())
    }

    fn get_note(&self, note_id: &NoteId) -> Result<Option<Note>> {
        let notes = self.notes.read();
        Ok(notes.get(note_id).cloned())
    }

    fn list_notes(&self, category: Option<&str>, order: NoteOrder) -> Result<Vec<Note>> {
        let notes = self.notes.read();
        let mut list: Vec<Note> = notes
            .values()
            .filter(|n| category.map_or(true, |c| n.category == c))
            .cloned()
            .collect();

        match order {
            NoteOrder::Popular => list.sort_by(|a, b| {
                b.downloads
                    .cmp(&a.downloads)
                    .then(b.created_at.cmp(&a.created_at))
            }),
            NoteOrder::Latest => list.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        Ok(list)
    }

    fn increment_note_downloads(&self, note_id: &NoteId) -> Result<Note> {
        let mut notes = self.notes.write();
        let note = notes.get_mut(note_id).ok_or_else(|| StoreError::NotFound {
            entity: "note",
            id: note_id.to_string(),
        })?;
        note.downloads += 1;
        Ok(note.clone())
    }

    fn list_teachers(&self) -> Result<Vec<Teacher>> {
        Ok(self.teachers.clone())
    }

    fn put_booking(&self, booking: &Booking) -> Result<()> {
        let mut bookings = self.bookings.write();
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    fn set_booking_status(
        &self,
        booking_id: &BookingId,
        status: BookingStatus,
    ) -> Result<Booking> {
        let mut bookings = self.bookings.write();
        let booking = bookings
            .get_mut(booking_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "booking",
                id: booking_id.to_string(),
            })?;
        booking.status = status;
        Ok(booking.clone())
    }

    fn stats(&self) -> Result<StoreStats> {
        let accounts: Vec<_> = {
            let accounts = self.accounts.read();
            accounts.values().cloned().collect()
        };

        let mut total_revenue_credits = 0;
        for entry in &accounts {
            let account = entry.lock();
            total_revenue_credits += account
                .transactions
                .iter()
                .filter(|tx| tx.source == TransactionSource::Stripe)
                .map(|tx| tx.amount)
                .sum::<i64>();
        }

        let notes = self.notes.read();
        let total_sessions = self.sessions.read().len();

        Ok(StoreStats {
            total_sessions,
            total_revenue_credits,
            users: accounts.len(),
            notes: notes.len(),
            downloads: notes.values().map(|n| n.downloads).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyhall_core::NewNote;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn admin() -> CreditMeta {
        CreditMeta::from_source(TransactionSource::Admin)
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let store = MemoryStore::new(3);
        let id = user("u1");

        let first = store.get_or_create_user(&id).unwrap();
        let second = store.get_or_create_user(&id).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.credits, 3);
        assert_eq!(store.list_transactions_by_user(&id, 10, 0).unwrap().len(), 1);
    }

    #[test]
    fn consume_rejects_overdraft_and_keeps_balance() {
        let store = MemoryStore::new(3);
        let id = user("u1");
        store.get_or_create_user(&id).unwrap();

        let result = store.consume_credits(&id, 5, TransactionSource::Manual);
        assert!(matches!(
            result,
            Err(StoreError::InsufficientCredits {
                balance: 3,
                required: 5
            })
        ));
        assert_eq!(store.balance(&id).unwrap(), 3);
        assert_eq!(store.list_transactions_by_user(&id, 10, 0).unwrap().len(), 1);
    }

    #[test]
    fn consume_unknown_user_fails() {
        let store = MemoryStore::new(3);
        let result = store.consume_credits(&user("ghost"), 1, TransactionSource::Manual);
        assert!(matches!(result, Err(StoreError::UserNotFound { .. })));
        assert!(store.get_user(&user("ghost")).unwrap().is_none());
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let store = MemoryStore::new(3);
        let id = user("u1");
        store.get_or_create_user(&id).unwrap();

        assert!(matches!(
            store.add_credits(&id, 0, admin()),
            Err(StoreError::InvalidAmount(0))
        ));
        assert!(matches!(
            store.consume_credits(&id, -2, TransactionSource::Manual),
            Err(StoreError::InvalidAmount(-2))
        ));
        assert_eq!(store.balance(&id).unwrap(), 3);
    }

    #[test]
    fn add_creates_user_and_records_source() {
        let store = MemoryStore::new(3);
        let id = user("u1");

        let updated = store.add_credits(&id, 10, admin()).unwrap();
        assert_eq!(updated.credits, 13);

        let txs = store.list_transactions_by_user(&id, 10, 0).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].source, TransactionSource::Admin);
        assert_eq!(txs[0].amount, 10);
        assert_eq!(txs[0].balance_after, 13);
        assert_eq!(txs[1].source, TransactionSource::System);
    }

    #[test]
    fn repeated_payment_reference_credits_once() {
        let store = MemoryStore::new(0);
        let id = user("u1");

        store
            .add_credits(&id, 25, CreditMeta::payment("cs_test_a"))
            .unwrap();
        let again = store.add_credits(&id, 25, CreditMeta::payment("cs_test_a"));

        assert!(matches!(again, Err(StoreError::DuplicateReference { .. })));
        assert_eq!(store.balance(&id).unwrap(), 25);
        assert!(store.has_payment_reference("cs_test_a").unwrap());
        assert!(!store.has_payment_reference("cs_test_b").unwrap());
    }

    #[test]
    fn transactions_page_newest_first() {
        let store = MemoryStore::new(0);
        let id = user("u1");
        for amount in 1..=3 {
            store.add_credits(&id, amount, admin()).unwrap();
        }

        let page1 = store.list_transactions_by_user(&id, 2, 0).unwrap();
        let page2 = store.list_transactions_by_user(&id, 2, 2).unwrap();
        assert_eq!(page1.iter().map(|t| t.amount).collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(page2.iter().map(|t| t.amount).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn concurrent_spending_never_overdraws() {
        let store = MemoryStore::new(0);
        let id = user("u1");
        store.add_credits(&id, 100, admin()).unwrap();

        let successes: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    scope.spawn(|| {
                        (0..20)
                            .filter(|_| {
                                store
                                    .consume_credits(&id, 1, TransactionSource::Manual)
                                    .is_ok()
                            })
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(successes, 100);
        assert_eq!(store.balance(&id).unwrap(), 0);
    }

    #[test]
    fn concurrent_adds_and_consumes_match_the_log() {
        let store = MemoryStore::new(3);
        let id = user("u1");
        store.get_or_create_user(&id).unwrap();

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = &store;
                let id = &id;
                scope.spawn(move || {
                    for i in 0..50 {
                        if (worker + i) % 3 == 0 {
                            store.add_credits(id, 2, admin()).unwrap();
                        } else {
                            let _ = store.consume_credits(id, 1, TransactionSource::Manual);
                        }
                    }
                });
            }
        });

        let txs = store.list_transactions_by_user(&id, usize::MAX, 0).unwrap();
        let sum: i64 = txs.iter().map(|t| t.amount).sum();
        assert_eq!(sum, store.balance(&id).unwrap());
        assert!(txs.iter().all(|t| t.balance_after >= 0));
    }

    #[test]
    fn end_session_is_exactly_once() {
        let store = MemoryStore::new(3);
        let session = VideoSession::new(user("u1"), 1);
        store.put_session(&session).unwrap();

        let ended = store.end_session(&session.id).unwrap();
        assert!(ended.ended_at.is_some());
        assert!(matches!(
            store.end_session(&session.id),
            Err(StoreError::AlreadyEnded { .. })
        ));
        assert!(matches!(
            store.end_session(&SessionId::generate()),
            Err(StoreError::SessionNotFound { .. })
        ));
    }

    #[test]
    fn sessions_listed_for_creator_and_peer() {
        let store = MemoryStore::new(3);
        let a = user("a");
        let b = user("b");

        let first = VideoSession::new(a.clone(), 1);
        let second = VideoSession::new(b.clone(), 1);
        store.put_session(&first).unwrap();
        store.put_session(&second).unwrap();
        store.set_session_peer(&first.id, &b).unwrap();

        assert_eq!(store.list_sessions_by_user(&a).unwrap().len(), 1);
        let for_b = store.list_sessions_by_user(&b).unwrap();
        assert_eq!(for_b.len(), 2);
        assert!(for_b[0].started_at <= for_b[1].started_at);
    }

    #[test]
    fn notes_sort_by_popularity() {
        let store = MemoryStore::new(3);
        let make = |title: &str, category: &str| {
            Note::new(NewNote {
                owner_user_id: user("owner"),
                title: title.into(),
                description: String::new(),
                category: category.into(),
                price_credits: 1,
                storage_path: format!("notes/{title}.pdf"),
            })
        };
        let calculus = make("calculus", "math");
        let algebra = make("algebra", "math");
        let cells = make("cells", "biology");
        for note in [&calculus, &algebra, &cells] {
            store.put_note(note).unwrap();
        }
        store.increment_note_downloads(&algebra.id).unwrap();

        let popular = store.list_notes(Some("math"), NoteOrder::Popular).unwrap();
        assert_eq!(popular.len(), 2);
        assert_eq!(popular[0].id, algebra.id);

        assert!(matches!(
            store.increment_note_downloads(&NoteId::generate()),
            Err(StoreError::NotFound { entity: "note", .. })
        ));
    }

    #[test]
    fn stats_count_stripe_revenue_only() {
        let store = MemoryStore::new(3);
        store
            .add_credits(&user("a"), 10, CreditMeta::payment("cs_1"))
            .unwrap();
        store.add_credits(&user("b"), 7, admin()).unwrap();
        store.put_session(&VideoSession::new(user("a"), 1)).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.users, 2);
        assert_eq!(stats.total_revenue_credits, 10);
        assert_eq!(stats.total_sessions, 1);
    }
}
