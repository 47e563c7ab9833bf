//! # Domain Models
//!
//! The records kept in the key-value store. Fields serialize in camelCase and
//! timestamps as epoch milliseconds, which is the layout the store persists.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Millisecond creation timestamp of a root question.
    QuestionId
);
id_type!(
    /// Millisecond creation timestamp of a chain item.
    ChainItemId
);
id_type!(
    /// Millisecond join timestamp of a user.
    UserId
);

/// The fixed set of question categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "정치")]
    Politics,
    #[serde(alias = "개발")]
    Development,
    #[serde(alias = "철학")]
    Philosophy,
    #[serde(alias = "일상")]
    Daily,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 4] = [
        Category::Politics,
        Category::Development,
        Category::Philosophy,
        Category::Daily,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Politics => "politics",
            Category::Development => "development",
            Category::Philosophy => "philosophy",
            Category::Daily => "daily",
        }
    }

    /// Korean label used by the first generation of stored data.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Politics => "정치",
            Category::Development => "개발",
            Category::Philosophy => "철학",
            Category::Daily => "일상",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s) || c.label() == s)
            .ok_or_else(|| AppError::ValidationError(format!("unknown category '{s}'")))
    }
}

/// A category filter; `All` is the "no filter" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, question: &Question) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => question.category == *category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "전체" => Ok(CategoryFilter::All),
            s if s.eq_ignore_ascii_case("all") => Ok(CategoryFilter::All),
            s => s.parse().map(CategoryFilter::Only),
        }
    }
}

/// A root question. Its chain hangs off it through `ChainItem::parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    pub category: Category,
    /// Display name of the author at posting time.
    pub author: String,
    /// Relative-time label captured at creation ("just now", "2 hours ago").
    pub time: String,
    /// Cached chain length + 1, rewritten on every append.
    pub chain_count: u32,
    /// Text of the latest chain entry, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_question: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields of a new question; the store assigns the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub title: String,
    pub category: Category,
    pub author: String,
    pub time: String,
}

/// Whether a chain entry asks or answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    Question,
    Answer,
}

impl ChainKind {
    /// Kind of the entry that follows `last`. A chain opens with an answer
    /// to the root question and alternates from there.
    pub fn following(last: Option<ChainKind>) -> ChainKind {
        match last {
            None | Some(ChainKind::Question) => ChainKind::Answer,
            Some(ChainKind::Answer) => ChainKind::Question,
        }
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChainKind::Question => "question",
            ChainKind::Answer => "answer",
        })
    }
}

/// One entry in a question's chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainItem {
    pub id: ChainItemId,
    pub parent_id: QuestionId,
    pub text: String,
    pub author: String,
    pub time: String,
    /// 1-based position in the parent's chain; the root question is level 0.
    pub level: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ChainKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChainItem {
    pub parent_id: QuestionId,
    pub text: String,
    pub author: String,
    pub time: String,
    pub level: u32,
    pub kind: ChainKind,
}

/// A registered account. The password is kept in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub joined_at: DateTime<Utc>,
    /// Data URI or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// A user as shown to other parties: everything except the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub joined_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            bio: user.bio.clone(),
            joined_at: user.joined_at,
            avatar: user.avatar.clone(),
        }
    }
}

/// Number of questions filed under one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStat {
    pub name: Category,
    pub count: usize,
}

/// A question paired with the score it was ranked by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingQuestion {
    #[serde(flatten)]
    pub question: Question,
    pub popularity_score: u32,
}

/// One line of the recent-activity feed. Questions appear as
/// `ChainKind::Question` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentEntry {
    #[serde(rename = "type")]
    pub kind: ChainKind,
    pub content: String,
    pub time: String,
    pub author: String,
}
