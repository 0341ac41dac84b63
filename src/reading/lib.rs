use anyhow::Result;
use libsql::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::vocab::{Word, clean_term};

/// Illustration used when a passage carries no media reference of its own.
pub const DEFAULT_IMAGE_URL: &str = "https://images.unsplash.com/photo-1495474472287-4d71bcdd2085?w=800&q=80";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    pub passage_id: i64,
    pub title: String,
    pub body_text: String,
    pub reading_level: i64,
    pub audio_url: Option<String>,
}

/// Wire shape of a passage: the stored columns plus the `id`/`content`/`level`/`imageUrl`
/// aliases the reader screen consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PassageResponse {
    #[serde(flatten)]
    pub passage: Passage,
    pub id: i64,
    pub content: String,
    pub level: String,
    pub image_url: String,
}

impl From<Passage> for PassageResponse {
    fn from(passage: Passage) -> Self {
        PassageResponse {
            id: passage.passage_id,
            content: passage.body_text.clone(),
            level: passage.reading_level.to_string(),
            image_url: passage
                .audio_url
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            passage,
        }
    }
}

/// One clickable token of a passage body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub text: String,
    pub lookup: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub word_id: Option<i64>,
}

/// Splits `body` on spaces and links each token to a vocabulary word when its
/// cleaned form matches a term case-insensitively.
pub fn tokenize(body: &str, words: &[Word]) -> Vec<Token> {
    let mut terms: HashMap<String, i64> = HashMap::new();
    for word in words {
        terms.entry(word.term.to_lowercase()).or_insert(word.word_id);
    }

    body.split(' ')
        .filter(|text| !text.is_empty())
        .map(|text| {
            let lookup = clean_term(text);
            Token {
                word_id: terms.get(&lookup).copied(),
                text: text.to_string(),
                lookup,
            }
        })
        .collect()
}

pub struct Reading<'a> {
    conn: &'a Connection,
}

impl<'a> Reading<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn list_passages(&self) -> Result<Vec<Passage>> {
        let query = r#"
            SELECT passage_id, title, body_text, reading_level, audio_url
            FROM passage
            ORDER BY passage_id
        "#;

        let mut rows = self.conn.query(query, ()).await?;
        let mut passages = Vec::new();

        while let Some(row) = rows.next().await? {
            passages.push(self.row_to_passage(&row)?);
        }

        Ok(passages)
    }

    pub async fn get_passage(&self, passage_id: i64) -> Result<Option<Passage>> {
        let query = r#"
            SELECT passage_id, title, body_text, reading_level, audio_url
            FROM passage WHERE passage_id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![passage_id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_passage(&row)?))
        } else {
            Ok(None)
        }
    }

    fn row_to_passage(&self, row: &libsql::Row) -> Result<Passage> {
        Ok(Passage {
            passage_id: row.get(0)?,
            title: row.get(1)?,
            body_text: row.get(2)?,
            reading_level: row.get(3)?,
            audio_url: row.get(4)?,
        })
    }
}
