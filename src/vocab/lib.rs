use anyhow::Result;
use chrono::{DateTime, Utc};
use libsql::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::parse_optional_timestamp;

/// Learning stage of one word for one user. Ordered: `New < Learned < Mastered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    New,
    Learned,
    Mastered,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::New => "new",
            ProgressStatus::Learned => "learned",
            ProgressStatus::Mastered => "mastered",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(ProgressStatus::New),
            "learned" => Some(ProgressStatus::Learned),
            "mastered" => Some(ProgressStatus::Mastered),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub word_id: i64,
    pub term: String,
    pub definition: String,
    pub phonetic: Option<String>,
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserWordProgress {
    pub user_word_id: i64,
    pub user_id: i64,
    pub word_id: i64,
    pub status: ProgressStatus,
    pub times_seen: i64,
    pub last_seen_at: Option<DateTime<Utc>>,
}

/// A word plus the current user's progress row, absent when the user has none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WordWithProgress {
    #[serde(flatten)]
    pub word: Word,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_word_progress: Option<UserWordProgress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProgressSummary {
    pub total: i64,
    pub new: i64,
    pub learned: i64,
    pub mastered: i64,
}

const PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~', '(', ')',
];

/// Normalises a clicked token into a lookup key: punctuation stripped, trimmed, lowercased.
pub fn clean_term(raw: &str) -> String {
    raw.chars()
        .filter(|c| !PUNCTUATION.contains(c))
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Pairs every word with its progress row by `word_id`. Output order follows `words`.
pub fn pair_words_with_progress(words: Vec<Word>, progress: Vec<UserWordProgress>) -> Vec<WordWithProgress> {
    let mut by_word: HashMap<i64, UserWordProgress> = progress.into_iter().map(|p| (p.word_id, p)).collect();

    words
        .into_iter()
        .map(|word| WordWithProgress {
            user_word_progress: by_word.remove(&word.word_id),
            word,
        })
        .collect()
}

const PROGRESS_COLUMNS: &str = "user_word_id, user_id, word_id, status, times_seen, last_seen_at";

pub struct Vocab<'a> {
    conn: &'a Connection,
}

impl<'a> Vocab<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn list_words(&self) -> Result<Vec<Word>> {
        let query = r#"
            SELECT word_id, term, definition, phonetic, audio_url
            FROM word
            ORDER BY word_id
        "#;

        let mut rows = self.conn.query(query, ()).await?;
        let mut words = Vec::new();

        while let Some(row) = rows.next().await? {
            words.push(self.row_to_word(&row)?);
        }

        Ok(words)
    }

    pub async fn get_word(&self, word_id: i64) -> Result<Option<Word>> {
        let query = r#"
            SELECT word_id, term, definition, phonetic, audio_url
            FROM word WHERE word_id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![word_id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_word(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Case-insensitive exact match on `term`; the lowest id wins on duplicates.
    pub async fn find_word_by_term(&self, term: &str) -> Result<Option<Word>> {
        let query = r#"
            SELECT word_id, term, definition, phonetic, audio_url
            FROM word WHERE lower(term) = lower(?)
            ORDER BY word_id
            LIMIT 1
        "#;

        let mut rows = self.conn.query(query, libsql::params![term]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_word(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list_progress_for_user(&self, user_id: i64) -> Result<Vec<UserWordProgress>> {
        let query = format!("SELECT {PROGRESS_COLUMNS} FROM user_word_progress WHERE user_id = ?");

        let mut rows = self.conn.query(&query, libsql::params![user_id]).await?;
        let mut progress = Vec::new();

        while let Some(row) = rows.next().await? {
            progress.push(self.row_to_progress(&row)?);
        }

        Ok(progress)
    }

    pub async fn get_progress(&self, user_word_id: i64) -> Result<Option<UserWordProgress>> {
        let query = format!("SELECT {PROGRESS_COLUMNS} FROM user_word_progress WHERE user_word_id = ?");

        let mut rows = self.conn.query(&query, libsql::params![user_word_id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_progress(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn get_progress_for_word(&self, word_id: i64, user_id: i64) -> Result<Option<UserWordProgress>> {
        let query = format!("SELECT {PROGRESS_COLUMNS} FROM user_word_progress WHERE word_id = ? AND user_id = ?");

        let mut rows = self.conn.query(&query, libsql::params![word_id, user_id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_progress(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Every word, each paired with `user_id`'s progress when a row exists.
    pub async fn list_words_with_progress(&self, user_id: i64) -> Result<Vec<WordWithProgress>> {
        let words = self.list_words().await?;
        let progress = self.list_progress_for_user(user_id).await?;
        Ok(pair_words_with_progress(words, progress))
    }

    pub async fn get_word_with_progress(&self, word_id: i64, user_id: i64) -> Result<Option<WordWithProgress>> {
        let Some(word) = self.get_word(word_id).await? else {
            return Ok(None);
        };
        self.attach_progress(word, user_id).await.map(Some)
    }

    pub async fn lookup_term(&self, raw: &str, user_id: i64) -> Result<Option<WordWithProgress>> {
        let Some(word) = self.find_word_by_term(&clean_term(raw)).await? else {
            return Ok(None);
        };
        self.attach_progress(word, user_id).await.map(Some)
    }

    async fn attach_progress(&self, word: Word, user_id: i64) -> Result<WordWithProgress> {
        let user_word_progress = self.get_progress_for_word(word.word_id, user_id).await?;
        Ok(WordWithProgress {
            word,
            user_word_progress,
        })
    }

    /// Records an interaction and marks the word mastered: `times_seen + 1`,
    /// `status = mastered`, `last_seen_at = now`. The increment happens in the
    /// statement itself, so concurrent calls never lose a count.
    /// Returns `None` (and changes nothing) when no row has this id.
    pub async fn mark_mastered(&self, user_word_id: i64) -> Result<Option<UserWordProgress>> {
        let query = format!(
            r#"
            UPDATE user_word_progress
            SET times_seen = times_seen + 1,
                status = ?,
                last_seen_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE user_word_id = ?
            RETURNING {PROGRESS_COLUMNS}
            "#
        );

        let mut rows = self
            .conn
            .query(&query, libsql::params![ProgressStatus::Mastered.as_str(), user_word_id])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_progress(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Status counts over every word; words without a progress row count as new.
    pub async fn progress_summary(&self, user_id: i64) -> Result<ProgressSummary> {
        let query = r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN p.status = 'learned' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN p.status = 'mastered' THEN 1 ELSE 0 END), 0)
            FROM word w
            LEFT JOIN user_word_progress p ON p.word_id = w.word_id AND p.user_id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![user_id]).await?;

        let Some(row) = rows.next().await? else {
            return Ok(ProgressSummary::default());
        };

        let total: i64 = row.get(0)?;
        let learned: i64 = row.get(1)?;
        let mastered: i64 = row.get(2)?;

        Ok(ProgressSummary {
            total,
            new: total - learned - mastered,
            learned,
            mastered,
        })
    }

    fn row_to_word(&self, row: &libsql::Row) -> Result<Word> {
        Ok(Word {
            word_id: row.get(0)?,
            term: row.get(1)?,
            definition: row.get(2)?,
            phonetic: row.get(3)?,
            audio_url: row.get(4)?,
        })
    }

    fn row_to_progress(&self, row: &libsql::Row) -> Result<UserWordProgress> {
        let status_str: String = row.get(3)?;
        let status = ProgressStatus::from_str(&status_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid progress status: {}", status_str))?;

        Ok(UserWordProgress {
            user_word_id: row.get(0)?,
            user_id: row.get(1)?,
            word_id: row.get(2)?,
            status,
            times_seen: row.get(4)?,
            last_seen_at: parse_optional_timestamp(row.get(5)?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn seeded() -> Database {
        let db = Database::open_local(":memory:").await.unwrap();
        db.seed_data(1).await.unwrap();
        db
    }

    async fn progress_id_for(vocab: &Vocab<'_>, term: &str) -> i64 {
        vocab
            .lookup_term(term, 1)
            .await
            .unwrap()
            .and_then(|w| w.user_word_progress)
            .map(|p| p.user_word_id)
            .expect("seeded progress row")
    }

    #[test]
    fn test_status_order() {
        assert!(ProgressStatus::New < ProgressStatus::Learned);
        assert!(ProgressStatus::Learned < ProgressStatus::Mastered);
        assert_eq!(ProgressStatus::from_str("MASTERED"), Some(ProgressStatus::Mastered));
        assert_eq!(ProgressStatus::from_str("forgotten"), None);
    }

    #[test]
    fn test_clean_term() {
        assert_eq!(clean_term("matey,"), "matey");
        assert_eq!(clean_term("(Hours)."), "hours");
        assert_eq!(clean_term("I'll"), "i'll");
        assert_eq!(clean_term("--"), "");
    }

    #[test]
    fn test_pairing_leaves_missing_progress_absent() {
        let words = vec![
            Word {
                word_id: 1,
                term: "work".into(),
                definition: "effort".into(),
                phonetic: None,
                audio_url: None,
            },
            Word {
                word_id: 2,
                term: "shift".into(),
                definition: "period".into(),
                phonetic: None,
                audio_url: None,
            },
        ];
        let progress = vec![UserWordProgress {
            user_word_id: 10,
            user_id: 1,
            word_id: 2,
            status: ProgressStatus::Learned,
            times_seen: 3,
            last_seen_at: None,
        }];

        let paired = pair_words_with_progress(words, progress);
        assert_eq!(paired.len(), 2);
        assert!(paired[0].user_word_progress.is_none());
        assert_eq!(paired[1].user_word_progress.as_ref().unwrap().user_word_id, 10);

        let json = serde_json::to_value(&paired[0]).unwrap();
        assert!(json.get("userWordProgress").is_none());
        assert_eq!(json["wordId"], 1);
        assert!(json["phonetic"].is_null());
    }

    #[tokio::test]
    async fn test_mark_mastered_repeats() {
        let db = seeded().await;
        let vocab = Vocab::new(db.connection());
        let id = progress_id_for(&vocab, "application").await;

        let before = vocab.get_progress(id).await.unwrap().unwrap();
        assert_eq!(before.status, ProgressStatus::New);
        assert!(before.last_seen_at.is_none());

        let first = vocab.mark_mastered(id).await.unwrap().unwrap();
        let second = vocab.mark_mastered(id).await.unwrap().unwrap();

        assert_eq!(first.status, ProgressStatus::Mastered);
        assert_eq!(second.status, ProgressStatus::Mastered);
        assert_eq!(first.times_seen, before.times_seen + 1);
        assert_eq!(second.times_seen, first.times_seen + 1);
        assert!(second.last_seen_at.is_some());
        assert!(second.last_seen_at >= first.last_seen_at);
    }

    #[tokio::test]
    async fn test_mark_mastered_missing_changes_nothing() {
        let db = seeded().await;
        let vocab = Vocab::new(db.connection());
        let before = vocab.list_progress_for_user(1).await.unwrap();

        assert!(vocab.mark_mastered(9999).await.unwrap().is_none());

        let after = vocab.list_progress_for_user(1).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_list_covers_every_word() {
        let db = seeded().await;
        db.connection()
            .execute("DELETE FROM user_word_progress WHERE word_id IN (1, 2)", ())
            .await
            .unwrap();

        let vocab = Vocab::new(db.connection());
        let words = vocab.list_words_with_progress(1).await.unwrap();
        assert_eq!(words.len(), 6);
        assert_eq!(words.iter().filter(|w| w.user_word_progress.is_none()).count(), 2);

        // another user sees every word but no progress
        let other = vocab.list_words_with_progress(2).await.unwrap();
        assert_eq!(other.len(), 6);
        assert!(other.iter().all(|w| w.user_word_progress.is_none()));
    }

    #[tokio::test]
    async fn test_lookup_term_cleans_input() {
        let db = seeded().await;
        let vocab = Vocab::new(db.connection());

        let found = vocab.lookup_term("Matey,", 1).await.unwrap().unwrap();
        assert_eq!(found.word.term, "matey");
        assert!(found.user_word_progress.is_some());
        assert!(vocab.lookup_term("barrow", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_progress_summary() {
        let db = seeded().await;
        let vocab = Vocab::new(db.connection());

        let id = progress_id_for(&vocab, "work").await;
        vocab.mark_mastered(id).await.unwrap();
        db.connection()
            .execute("DELETE FROM user_word_progress WHERE word_id = 6", ())
            .await
            .unwrap();

        let summary = vocab.progress_summary(1).await.unwrap();
        assert_eq!(
            summary,
            ProgressSummary {
                total: 6,
                new: 5,
                learned: 0,
                mastered: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_progress_summary_empty() {
        let db = Database::open_local(":memory:").await.unwrap();
        let summary = Vocab::new(db.connection()).progress_summary(1).await.unwrap();
        assert_eq!(summary, ProgressSummary::default());
    }
}
