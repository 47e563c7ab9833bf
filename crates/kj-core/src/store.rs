//! # Content Store
//!
//! Accessors over the three flat collections (questions, chain items, users)
//! and the session pointer, all living in a [`KeyValueStore`] as JSON.
//!
//! Views never fail: an unreadable collection reads as empty and a failed
//! write is logged and dropped. Mutations are stricter. They re-read the
//! collection they rewrite and stop with `AppError::Internal` when it cannot
//! be read or decoded, so a bad read never turns into a truncating write.
//!
//! Read-modify-write sequences run under one async lock, and a chain append
//! persists the chain and its parent's counters in a single batched write.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::clock::SystemClock;
use crate::error::{AppError, DuplicateField, Result};
use crate::models::{
    Category, CategoryFilter, CategoryStat, ChainItem, ChainItemId, ChainKind, NewChainItem,
    NewQuestion, NewUser, Question, QuestionId, RecentEntry, TrendingQuestion, User, UserId,
};
use crate::ranking;
use crate::traits::{Clock, KeyValueStore};

pub const QUESTIONS_KEY: &str = "kkojil_questions";
pub const CHAINS_KEY: &str = "kkojil_chains";
pub const USERS_KEY: &str = "kkojil_users";
pub const CURRENT_USER_KEY: &str = "kkojil_current_user";

pub struct ContentStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
    /// Last id handed out; ids are creation millis, bumped to stay unique.
    last_id: AtomicI64,
}

impl ContentStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(kv, Arc::new(SystemClock))
    }

    pub fn with_clock(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            kv,
            clock,
            write_lock: Mutex::new(()),
            last_id: AtomicI64::new(0),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn next_id(&self, now: DateTime<Utc>) -> i64 {
        let now_ms = now.timestamp_millis();
        let mut last = self.last_id.load(Ordering::Acquire);
        loop {
            let next = now_ms.max(last + 1);
            match self
                .last_id
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    // ── Raw access ──────────────────────────────────────────────────────────

    /// `Ok(None)` when the key is absent, an error when the value cannot be
    /// fetched or decoded.
    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = match self.kv.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(e) => return Err(AppError::Internal(format!("failed to read {key}: {e}"))),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::Internal(format!("stored {key} is not valid JSON: {e}")))
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.load(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "unreadable value, treating it as empty");
                None
            }
        }
    }

    /// A collection that is about to be rewritten. Unlike [`Self::read_list`],
    /// an unreadable collection is an error, so it is never replaced by a
    /// list holding only the new record.
    async fn load_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.load(key).await {
            Ok(list) => Ok(list.unwrap_or_default()),
            Err(e) => {
                error!(key, error = %e, "refusing to overwrite unreadable collection");
                Err(e)
            }
        }
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.read(key).await.unwrap_or_default()
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!(key, error = %e, "failed to serialize value");
                return;
            }
        };
        if let Err(e) = self.kv.set(key, raw).await {
            error!(key, error = %e, "failed to write to store");
        }
    }

    // ── Questions ───────────────────────────────────────────────────────────

    /// All questions, newest first.
    pub async fn list_questions(&self) -> Vec<Question> {
        self.read_list(QUESTIONS_KEY).await
    }

    pub async fn get_question(&self, id: QuestionId) -> Option<Question> {
        self.list_questions().await.into_iter().find(|q| q.id == id)
    }

    pub async fn add_question(&self, new: NewQuestion) -> Result<Question> {
        let _guard = self.write_lock.lock().await;
        let mut questions: Vec<Question> = self.load_list(QUESTIONS_KEY).await?;

        let now = self.now();
        let question = Question {
            id: QuestionId(self.next_id(now)),
            title: new.title,
            category: new.category,
            author: new.author,
            time: new.time,
            chain_count: 0,
            last_question: None,
            created_at: now,
        };

        questions.insert(0, question.clone());
        self.write(QUESTIONS_KEY, &questions).await;
        debug!(id = %question.id, category = %question.category, "question added");
        Ok(question)
    }

    pub async fn search_questions(&self, query: &str) -> Vec<Question> {
        ranking::search(&self.list_questions().await, query)
    }

    pub async fn questions_by_category(&self, filter: CategoryFilter) -> Vec<Question> {
        ranking::filter_by_category(&self.list_questions().await, filter)
    }

    pub async fn trending(&self) -> Vec<TrendingQuestion> {
        ranking::trending(&self.list_questions().await, self.now())
    }

    pub async fn category_stats(&self) -> Vec<CategoryStat> {
        ranking::category_stats(&self.list_questions().await)
    }

    pub async fn recent_content(&self) -> Vec<RecentEntry> {
        let questions = self.list_questions().await;
        let chains: Vec<ChainItem> = self.read_list(CHAINS_KEY).await;
        ranking::recent_content(&questions, &chains)
    }

    // ── Chains ──────────────────────────────────────────────────────────────

    /// Chain of `parent`, oldest first.
    pub async fn list_chain(&self, parent: QuestionId) -> Vec<ChainItem> {
        let mut chain: Vec<ChainItem> = self
            .read_list::<ChainItem>(CHAINS_KEY)
            .await
            .into_iter()
            .filter(|c| c.parent_id == parent)
            .collect();
        chain.sort_by_key(|c| (c.created_at, c.id));
        chain
    }

    /// Kind of the next entry in `parent`'s chain.
    pub async fn next_chain_kind(&self, parent: QuestionId) -> ChainKind {
        ChainKind::following(self.list_chain(parent).await.last().map(|c| c.kind))
    }

    /// Appends to a chain and refreshes the parent's `chain_count` and
    /// `last_question` in the same write.
    ///
    /// `new.level` must be the next 1-based position in the chain.
    pub async fn append_chain_item(&self, new: NewChainItem) -> Result<ChainItem> {
        let _guard = self.write_lock.lock().await;
        self.append_locked(new).await
    }

    /// Appends the next entry of `parent`'s chain, choosing its level and
    /// kind while holding the write lock.
    pub async fn append_next_chain_item(
        &self,
        parent: QuestionId,
        text: String,
        author: String,
        time: String,
    ) -> Result<ChainItem> {
        let _guard = self.write_lock.lock().await;
        let chain = self.list_chain(parent).await;
        self.append_locked(NewChainItem {
            parent_id: parent,
            text,
            author,
            time,
            level: chain.len() as u32 + 1,
            kind: ChainKind::following(chain.last().map(|c| c.kind)),
        })
        .await
    }

    /// Caller holds `write_lock`.
    async fn append_locked(&self, new: NewChainItem) -> Result<ChainItem> {
        let mut questions: Vec<Question> = self.load_list(QUESTIONS_KEY).await?;
        let parent = questions
            .iter_mut()
            .find(|q| q.id == new.parent_id)
            .ok_or_else(|| AppError::NotFound("question".into(), new.parent_id.to_string()))?;

        let mut chains: Vec<ChainItem> = self.load_list(CHAINS_KEY).await?;
        let chain_len = chains.iter().filter(|c| c.parent_id == new.parent_id).count() as u32;
        let level = chain_len + 1;
        if new.level != level {
            return Err(AppError::ValidationError(format!(
                "chain level must be {level}, got {}",
                new.level
            )));
        }

        let now = self.now();
        let item = ChainItem {
            id: ChainItemId(self.next_id(now)),
            parent_id: new.parent_id,
            text: new.text,
            author: new.author,
            time: new.time,
            level,
            created_at: now,
            kind: new.kind,
        };
        chains.push(item.clone());

        // chain length + 1 counts the root question itself
        parent.chain_count = level + 1;
        parent.last_question = Some(item.text.clone());

        match (serde_json::to_string(&chains), serde_json::to_string(&questions)) {
            (Ok(chains_raw), Ok(questions_raw)) => {
                let batch = vec![
                    (CHAINS_KEY.to_string(), chains_raw),
                    (QUESTIONS_KEY.to_string(), questions_raw),
                ];
                if let Err(e) = self.kv.set_many(batch).await {
                    error!(parent = %item.parent_id, error = %e, "failed to persist chain append");
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                error!(parent = %item.parent_id, error = %e, "failed to serialize chain append");
            }
        }

        debug!(parent = %item.parent_id, level, kind = %item.kind, "chain item appended");
        Ok(item)
    }

    // ── Users & session ─────────────────────────────────────────────────────

    pub async fn list_users(&self) -> Vec<User> {
        self.read_list(USERS_KEY).await
    }

    /// Stores a new account. Email is checked for collisions before username,
    /// and a rejected registration writes nothing.
    pub async fn register_user(&self, new: NewUser) -> Result<User> {
        let _guard = self.write_lock.lock().await;
        let mut users: Vec<User> = self.load_list(USERS_KEY).await?;

        if users.iter().any(|u| u.email == new.email) {
            return Err(AppError::Conflict(DuplicateField::Email));
        }
        if users.iter().any(|u| u.username == new.username) {
            return Err(AppError::Conflict(DuplicateField::Username));
        }

        let now = self.now();
        let user = User {
            id: UserId(self.next_id(now)),
            username: new.username,
            email: new.email,
            password: new.password,
            display_name: new.display_name,
            bio: new.bio,
            joined_at: now,
            avatar: new.avatar,
        };

        users.push(user.clone());
        self.write(USERS_KEY, &users).await;
        info!(username = %user.username, "user registered");
        Ok(user)
    }

    /// Exact email + password match. On success the user becomes the session.
    pub async fn login(&self, email: &str, password: &str) -> Option<User> {
        let user = self
            .list_users()
            .await
            .into_iter()
            .find(|u| u.email == email && u.password == password)?;

        self.write(CURRENT_USER_KEY, &user).await;
        info!(username = %user.username, "user logged in");
        Some(user)
    }

    pub async fn logout(&self) {
        if let Err(e) = self.kv.remove(CURRENT_USER_KEY).await {
            error!(error = %e, "failed to clear session");
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.read(CURRENT_USER_KEY).await
    }

    /// Replaces the stored record with the same id, and the session copy
    /// when it belongs to the same user.
    pub async fn update_user(&self, updated: User) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let users: Vec<User> = self
            .load_list::<User>(USERS_KEY)
            .await?
            .into_iter()
            .map(|u| if u.id == updated.id { updated.clone() } else { u })
            .collect();
        self.write(USERS_KEY, &users).await;

        if self
            .current_user()
            .await
            .is_some_and(|current| current.id == updated.id)
        {
            self.write(CURRENT_USER_KEY, &updated).await;
        }
        Ok(())
    }

    pub async fn is_username_available(&self, username: &str) -> bool {
        !self.list_users().await.iter().any(|u| u.username == username)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.list_users()
            .await
            .into_iter()
            .find(|u| u.username == username)
    }

    // ── Seeding ─────────────────────────────────────────────────────────────

    /// Writes the starter questions when the collection is empty. Returns
    /// whether anything was written; an unreadable collection is left alone.
    pub async fn seed_defaults(&self) -> bool {
        let _guard = self.write_lock.lock().await;
        match self.load_list::<Question>(QUESTIONS_KEY).await {
            Ok(existing) if existing.is_empty() => {}
            _ => return false,
        }

        let now = self.now();
        let defaults: Vec<Question> = DEFAULT_QUESTIONS
            .iter()
            .zip(1..)
            .map(|(seed, id)| {
                let created_at = now - Duration::hours(seed.hours_ago);
                Question {
                    id: QuestionId(id),
                    title: seed.title.to_string(),
                    category: seed.category,
                    author: seed.author.to_string(),
                    time: ranking::format_time_ago(created_at, now),
                    chain_count: seed.chain_count,
                    last_question: Some(seed.last_question.to_string()),
                    created_at,
                }
            })
            .collect();

        self.write(QUESTIONS_KEY, &defaults).await;
        info!(count = defaults.len(), "seeded default questions");
        true
    }
}

struct SeedQuestion {
    title: &'static str,
    category: Category,
    author: &'static str,
    hours_ago: i64,
    chain_count: u32,
    last_question: &'static str,
}

const DEFAULT_QUESTIONS: [SeedQuestion; 6] = [
    SeedQuestion {
        title: "What matters most when becoming a developer?",
        category: Category::Development,
        author: "CodingNewbie",
        hours_ago: 2,
        chain_count: 5,
        last_question: "Then which language should I start with?",
    },
    SeedQuestion {
        title: "Can artificial intelligence replace human creativity?",
        category: Category::Philosophy,
        author: "Thinker",
        hours_ago: 4,
        chain_count: 3,
        last_question: "What is the essence of creativity?",
    },
    SeedQuestion {
        title: "What is the most important issue in politics right now?",
        category: Category::Politics,
        author: "CivicMinded",
        hours_ago: 6,
        chain_count: 8,
        last_question: "There are many issues, but the biggest is economic inequality.",
    },
    SeedQuestion {
        title: "How do you get over burnout?",
        category: Category::Daily,
        author: "TiredWorker",
        hours_ago: 8,
        chain_count: 12,
        last_question: "Any tips for balancing rest and work?",
    },
    SeedQuestion {
        title: "Frontend or backend: which should I learn first?",
        category: Category::Development,
        author: "CareerWorries",
        hours_ago: 24,
        chain_count: 15,
        last_question: "What are the realistic pros and cons of being a full-stack developer?",
    },
    SeedQuestion {
        title: "If you could live your life again, would you choose differently?",
        category: Category::Philosophy,
        author: "WhatIf",
        hours_ago: 48,
        chain_count: 20,
        last_question: "Isn't it past regret that made who we are now?",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::traits::MockKeyValueStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapStore {
        entries: std::sync::Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }
        async fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
            self.entries.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
        async fn set_many(&self, entries: Vec<(String, String)>) -> anyhow::Result<()> {
            self.entries.lock().unwrap().extend(entries);
            Ok(())
        }
        async fn remove(&self, key: &str) -> anyhow::Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
    }

    fn store() -> (ContentStore, Arc<MapStore>, Arc<FixedClock>) {
        let kv = Arc::new(MapStore::default());
        let clock = Arc::new(FixedClock::new(start()));
        (
            ContentStore::with_clock(kv.clone(), clock.clone()),
            kv,
            clock,
        )
    }

    fn new_question(title: &str, category: Category) -> NewQuestion {
        NewQuestion {
            title: title.into(),
            category,
            author: "ferris".into(),
            time: "just now".into(),
        }
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password: "crab123".into(),
            display_name: username.to_uppercase(),
            bio: None,
            avatar: None,
        }
    }

    async fn append(store: &ContentStore, parent: QuestionId, text: &str) -> Result<ChainItem> {
        let chain = store.list_chain(parent).await;
        store
            .append_chain_item(NewChainItem {
                parent_id: parent,
                text: text.into(),
                author: "ferris".into(),
                time: "just now".into(),
                level: chain.len() as u32 + 1,
                kind: ChainKind::following(chain.last().map(|c| c.kind)),
            })
            .await
    }

    #[tokio::test]
    async fn new_questions_are_prepended() {
        let (store, _, clock) = store();
        let first = store.add_question(new_question("first", Category::Daily)).await.unwrap();
        clock.advance(Duration::seconds(1));
        let second = store.add_question(new_question("second", Category::Daily)).await.unwrap();

        assert_eq!(first.chain_count, 0);
        assert_eq!(first.created_at, start());
        let listed = store.list_questions().await;
        assert_eq!(listed, vec![second.clone(), first]);
        assert_eq!(store.get_question(second.id).await, Some(second));
    }

    #[tokio::test]
    async fn ids_stay_unique_within_one_millisecond() {
        let (store, _, _) = store();
        let a = store.add_question(new_question("a", Category::Daily)).await.unwrap();
        let b = store.add_question(new_question("b", Category::Daily)).await.unwrap();
        assert_eq!(a.id.0, start().timestamp_millis());
        assert_eq!(b.id.0, a.id.0 + 1);
    }

    #[tokio::test]
    async fn appending_updates_parent_counters() {
        let (store, _, clock) = store();
        let q = store.add_question(new_question("root", Category::Development)).await.unwrap();

        let first = append(&store, q.id, "an answer").await.unwrap();
        assert_eq!(first.level, 1);
        assert_eq!(first.kind, ChainKind::Answer);
        assert_eq!(store.get_question(q.id).await.unwrap().chain_count, 2);

        for text in ["follow-up?", "another answer"] {
            clock.advance(Duration::seconds(5));
            let before = store.get_question(q.id).await.unwrap().chain_count;
            let item = append(&store, q.id, text).await.unwrap();
            let after = store.get_question(q.id).await.unwrap();
            assert_eq!(after.chain_count, before + 1);
            assert_eq!(after.last_question.as_deref(), Some(text));
            assert_eq!(store.list_chain(q.id).await.last(), Some(&item));
        }

        let kinds: Vec<ChainKind> = store.list_chain(q.id).await.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ChainKind::Answer, ChainKind::Question, ChainKind::Answer]
        );
        assert_eq!(store.next_chain_kind(q.id).await, ChainKind::Question);
    }

    #[tokio::test]
    async fn chains_are_kept_per_parent() {
        let (store, _, _) = store();
        let a = store.add_question(new_question("a", Category::Daily)).await.unwrap();
        let b = store.add_question(new_question("b", Category::Daily)).await.unwrap();
        append(&store, a.id, "for a").await.unwrap();
        append(&store, b.id, "for b").await.unwrap();
        append(&store, a.id, "for a again").await.unwrap();

        assert_eq!(store.list_chain(a.id).await.len(), 2);
        assert_eq!(store.list_chain(b.id).await.len(), 1);
        assert!(store.list_chain(QuestionId(42)).await.is_empty());
    }

    #[tokio::test]
    async fn append_rejects_unknown_parent_and_wrong_level() {
        let (store, _, _) = store();
        let missing = append(&store, QuestionId(7), "orphan").await;
        assert!(matches!(missing, Err(AppError::NotFound(..))));

        let q = store.add_question(new_question("root", Category::Daily)).await.unwrap();
        let skipped = store
            .append_chain_item(NewChainItem {
                parent_id: q.id,
                text: "too deep".into(),
                author: "ferris".into(),
                time: "just now".into(),
                level: 3,
                kind: ChainKind::Answer,
            })
            .await;
        assert!(matches!(skipped, Err(AppError::ValidationError(_))));
        assert!(store.list_chain(q.id).await.is_empty());
        assert_eq!(store.get_question(q.id).await.unwrap().chain_count, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_do_not_lose_updates() {
        let (store, _, _) = store();
        let store = Arc::new(store);
        let parent = store.add_question(new_question("busy", Category::Daily)).await.unwrap().id;

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append_next_chain_item(
                        parent,
                        format!("reply {i}"),
                        "ferris".into(),
                        "just now".into(),
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let chain = store.list_chain(parent).await;
        assert_eq!(chain.len(), 8);
        let levels: Vec<u32> = chain.iter().map(|c| c.level).collect();
        assert_eq!(levels, (1..=8).collect::<Vec<u32>>());
        assert!(chain.windows(2).all(|w| w[0].kind != w[1].kind));
        assert_eq!(store.get_question(parent).await.unwrap().chain_count, 9);
    }

    #[tokio::test]
    async fn derived_views_read_the_stored_snapshot() {
        let (store, _, clock) = store();
        let dev = store.add_question(new_question("Lifetimes explained", Category::Development)).await.unwrap();
        clock.advance(Duration::minutes(1));
        store.add_question(new_question("Morning routines", Category::Daily)).await.unwrap();
        clock.advance(Duration::minutes(1));
        append(&store, dev.id, "They are scopes").await.unwrap();

        assert_eq!(store.search_questions("LIFETIME").await.len(), 1);
        assert!(store.search_questions("monads").await.is_empty());
        assert_eq!(
            store
                .questions_by_category(CategoryFilter::Only(Category::Daily))
                .await
                .len(),
            1
        );
        assert_eq!(store.questions_by_category(CategoryFilter::All).await.len(), 2);

        let stats = store.category_stats().await;
        assert_eq!(stats.iter().map(|s| s.count).sum::<usize>(), 2);

        let trending = store.trending().await;
        assert_eq!(trending[0].question.id, dev.id);
        assert_eq!(trending[0].popularity_score, 2 * 2 + 7);

        let recent = store.recent_content().await;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].kind, ChainKind::Answer);
        assert_eq!(recent[0].content, "They are scopes");
    }

    #[tokio::test]
    async fn duplicate_registration_leaves_store_unchanged() {
        let (store, kv, _) = store();
        store.register_user(new_user("ferris", "ferris@example.com")).await.unwrap();
        let snapshot = kv.entries.lock().unwrap().get(USERS_KEY).cloned();

        let same_email = store.register_user(new_user("other", "ferris@example.com")).await;
        assert!(matches!(
            same_email,
            Err(AppError::Conflict(DuplicateField::Email))
        ));
        let same_name = store.register_user(new_user("ferris", "new@example.com")).await;
        assert!(matches!(
            same_name,
            Err(AppError::Conflict(DuplicateField::Username))
        ));

        assert_eq!(kv.entries.lock().unwrap().get(USERS_KEY).cloned(), snapshot);
        assert_eq!(store.list_users().await.len(), 1);
    }

    #[tokio::test]
    async fn login_sets_session_and_update_follows_it() {
        let (store, _, _) = store();
        let ferris = store.register_user(new_user("ferris", "ferris@example.com")).await.unwrap();
        let corro = store.register_user(new_user("corro", "corro@example.com")).await.unwrap();

        assert!(store.login("ferris@example.com", "wrong").await.is_none());
        assert!(store.current_user().await.is_none());

        let session = store.login("ferris@example.com", "crab123").await.unwrap();
        assert_eq!(session.id, ferris.id);
        assert_eq!(store.current_user().await, Some(ferris.clone()));

        let mut edited = ferris.clone();
        edited.bio = Some("Rustacean".into());
        store.update_user(edited.clone()).await.unwrap();
        assert_eq!(store.current_user().await, Some(edited.clone()));
        assert_eq!(store.find_user_by_username("ferris").await, Some(edited));

        let mut other = corro.clone();
        other.display_name = "Corro the Unsafe".into();
        store.update_user(other).await.unwrap();
        assert_eq!(store.current_user().await.unwrap().id, ferris.id);

        store.logout().await;
        assert!(store.current_user().await.is_none());
    }

    #[tokio::test]
    async fn username_availability() {
        let (store, _, _) = store();
        assert!(store.is_username_available("ferris").await);
        store.register_user(new_user("ferris", "ferris@example.com")).await.unwrap();
        assert!(!store.is_username_available("ferris").await);
        assert!(store.is_username_available("Ferris2").await);
    }

    #[tokio::test]
    async fn seeding_only_fills_an_empty_store() {
        let (store, _, _) = store();
        assert!(store.seed_defaults().await);
        let seeded = store.list_questions().await;
        assert_eq!(seeded.len(), 6);
        assert_eq!(seeded[0].id, QuestionId(1));
        assert_eq!(seeded[0].time, "2 hours ago");
        assert_eq!(seeded[5].time, "2 days ago");
        assert!(!store.seed_defaults().await);
    }

    #[tokio::test]
    async fn question_collection_round_trips_through_json() {
        let (store, kv, _) = store();
        store.add_question(new_question("one", Category::Politics)).await.unwrap();
        store.add_question(new_question("two", Category::Philosophy)).await.unwrap();
        let before = store.list_questions().await;

        let raw = kv.entries.lock().unwrap().get(QUESTIONS_KEY).cloned().unwrap();
        assert!(raw.contains("\"chainCount\":0"));
        assert!(raw.contains("\"createdAt\":"));
        let reloaded: Vec<Question> = serde_json::from_str(&raw).unwrap();
        assert_eq!(reloaded, before);
    }

    #[tokio::test]
    async fn failed_reads_degrade_to_empty() {
        let mut kv = MockKeyValueStore::new();
        kv.expect_get()
            .returning(|_| Err(anyhow::anyhow!("disk on fire")));
        let store = ContentStore::new(Arc::new(kv));

        assert!(store.list_questions().await.is_empty());
        assert!(store.search_questions("anything").await.is_empty());
        assert!(store.trending().await.is_empty());
        assert!(store.current_user().await.is_none());
        assert!(store.is_username_available("ferris").await);
    }

    #[tokio::test]
    async fn corrupt_values_degrade_to_empty() {
        let mut kv = MockKeyValueStore::new();
        kv.expect_get()
            .returning(|_| Ok(Some("{not json".to_string())));
        let store = ContentStore::new(Arc::new(kv));

        assert!(store.list_questions().await.is_empty());
        assert!(store.list_chain(QuestionId(1)).await.is_empty());
        assert!(store.list_users().await.is_empty());
    }

    #[tokio::test]
    async fn failed_writes_are_swallowed() {
        let mut kv = MockKeyValueStore::new();
        kv.expect_get().returning(|_| Ok(None));
        kv.expect_set()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("quota exceeded")));
        kv.expect_remove()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("quota exceeded")));
        let store = ContentStore::new(Arc::new(kv));

        let q = store.add_question(new_question("lost", Category::Daily)).await.unwrap();
        assert_eq!(q.title, "lost");
        store.logout().await;
    }

    #[tokio::test]
    async fn unreadable_questions_are_never_overwritten() {
        let (store, kv, _) = store();
        let raw = r#"[
            {"id":2,"title":"keep me","category":"daily","author":"a","time":"1 hour ago","chainCount":0,"createdAt":1700000000000},
            {"id":1,"title":"odd one","category":"기타","author":"b","time":"2 hours ago","chainCount":0,"createdAt":1699990000000}
        ]"#;
        kv.entries
            .lock()
            .unwrap()
            .insert(QUESTIONS_KEY.to_string(), raw.to_string());

        assert!(store.list_questions().await.is_empty());

        let added = store.add_question(new_question("new", Category::Daily)).await;
        assert!(matches!(added, Err(AppError::Internal(_))));
        let appended = store
            .append_next_chain_item(QuestionId(2), "hi".into(), "ferris".into(), "just now".into())
            .await;
        assert!(matches!(appended, Err(AppError::Internal(_))));
        assert!(!store.seed_defaults().await);

        let entries = kv.entries.lock().unwrap();
        assert_eq!(entries.get(QUESTIONS_KEY).map(String::as_str), Some(raw));
        assert!(entries.get(CHAINS_KEY).is_none());
    }

    #[tokio::test]
    async fn failed_user_read_blocks_account_writes() {
        let mut kv = MockKeyValueStore::new();
        kv.expect_get()
            .returning(|_| Err(anyhow::anyhow!("disk on fire")));
        kv.expect_set().times(0);
        kv.expect_set_many().times(0);
        let store = ContentStore::new(Arc::new(kv));

        let registered = store
            .register_user(new_user("ferris", "ferris@example.com"))
            .await;
        assert!(matches!(registered, Err(AppError::Internal(_))));

        let existing = User {
            id: UserId(1),
            username: "ferris".into(),
            email: "ferris@example.com".into(),
            password: "crab123".into(),
            display_name: "Ferris".into(),
            bio: None,
            joined_at: start(),
            avatar: None,
        };
        let updated = store.update_user(existing).await;
        assert!(matches!(updated, Err(AppError::Internal(_))));
    }
}
