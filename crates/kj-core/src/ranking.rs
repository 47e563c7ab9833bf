//! # Derived views
//!
//! Pure functions over a snapshot of the collections. Nothing here touches
//! storage, so every function takes `now` explicitly.

use chrono::{DateTime, Utc};

use crate::models::{
    Category, CategoryFilter, CategoryStat, ChainItem, ChainKind, Question, RecentEntry,
    TrendingQuestion,
};

/// Size of the trending sidebar.
pub const TRENDING_LIMIT: usize = 4;

/// Size of the recent-activity feed.
pub const RECENT_LIMIT: usize = 5;

/// Questions older than this many days get no recency bonus.
const RECENCY_WINDOW_DAYS: i64 = 7;

const MS_PER_MINUTE: i64 = 60 * 1000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Milliseconds elapsed since `at`, clamped at zero for future timestamps.
fn elapsed_ms(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - at).num_milliseconds().max(0)
}

/// Whole days since `created_at`, truncated.
pub fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    elapsed_ms(created_at, now) / MS_PER_DAY
}

/// `max(0, 7 - floor(age in days))`.
pub fn recency_score(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    (RECENCY_WINDOW_DAYS - age_in_days(created_at, now)).max(0) as u32
}

/// `chainCount * 2 + recencyScore`.
pub fn popularity_score(question: &Question, now: DateTime<Utc>) -> u32 {
    question
        .chain_count
        .saturating_mul(2)
        .saturating_add(recency_score(question.created_at, now))
}

/// Top questions by popularity score. Equal scores put the newer question
/// first, then the larger id.
pub fn trending(questions: &[Question], now: DateTime<Utc>) -> Vec<TrendingQuestion> {
    let mut scored: Vec<TrendingQuestion> = questions
        .iter()
        .map(|q| TrendingQuestion {
            popularity_score: popularity_score(q, now),
            question: q.clone(),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.popularity_score
            .cmp(&a.popularity_score)
            .then_with(|| b.question.created_at.cmp(&a.question.created_at))
            .then_with(|| b.question.id.cmp(&a.question.id))
    });
    scored.truncate(TRENDING_LIMIT);
    scored
}

/// Case-insensitive substring match on title, category and author.
pub fn search(questions: &[Question], query: &str) -> Vec<Question> {
    let needle = query.to_lowercase();
    questions
        .iter()
        .filter(|q| {
            q.title.to_lowercase().contains(&needle)
                || q.category.as_str().contains(&needle)
                || q.category.label().contains(&needle)
                || q.author.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

pub fn filter_by_category(questions: &[Question], filter: CategoryFilter) -> Vec<Question> {
    questions
        .iter()
        .filter(|q| filter.matches(q))
        .cloned()
        .collect()
}

/// Question count for each category, in `Category::ALL` order.
pub fn category_stats(questions: &[Question]) -> Vec<CategoryStat> {
    Category::ALL
        .into_iter()
        .map(|name| CategoryStat {
            name,
            count: questions.iter().filter(|q| q.category == name).count(),
        })
        .collect()
}

/// The newest questions and chain entries, merged.
pub fn recent_content(questions: &[Question], chains: &[ChainItem]) -> Vec<RecentEntry> {
    let mut merged: Vec<(DateTime<Utc>, RecentEntry)> = questions
        .iter()
        .map(|q| {
            (
                q.created_at,
                RecentEntry {
                    kind: ChainKind::Question,
                    content: q.title.clone(),
                    time: q.time.clone(),
                    author: q.author.clone(),
                },
            )
        })
        .chain(chains.iter().map(|c| {
            (
                c.created_at,
                RecentEntry {
                    kind: c.kind,
                    content: c.text.clone(),
                    time: c.time.clone(),
                    author: c.author.clone(),
                },
            )
        }))
        .collect();

    // stable: equal timestamps keep questions ahead of chain entries
    merged.sort_by(|a, b| b.0.cmp(&a.0));
    merged
        .into_iter()
        .take(RECENT_LIMIT)
        .map(|(_, entry)| entry)
        .collect()
}

/// Relative label for `at`: "just now", "N minutes ago", "N hours ago" or
/// "N days ago". Units are truncated, never rounded.
pub fn format_time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = elapsed_ms(at, now);
    let minutes = diff / MS_PER_MINUTE;
    let hours = diff / MS_PER_HOUR;
    let days = diff / MS_PER_DAY;

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        ago(minutes, "minute")
    } else if hours < 24 {
        ago(hours, "hour")
    } else {
        ago(days, "day")
    }
}

fn ago(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
