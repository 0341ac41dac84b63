use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::model::parse_timestamp;

pub const DEFAULT_TITLE: &str = "Adventure Game Session";

/// First narrator turn stored with every new session.
pub const OPENING_SCENE: &str = "You find yourself at the edge of a mysterious forest. The trees whisper in a language you don't understand. A path splits in two: one leads towards a glowing cave (Cave), and the other towards a mountain peak (Mountain). What do you do?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationWithMessages {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateConversation {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessage {
    pub content: String,
}

pub struct Adventure<'a> {
    db: &'a Database,
}

impl<'a> Adventure<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Creates a session and stores the opening scene as its first assistant message.
    pub async fn create_conversation(&self, input: CreateConversation) -> Result<Conversation> {
        let title = input
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let _guard = self.db.tx_guard().await;
        let conn = self.db.connection();

        conn.execute("BEGIN TRANSACTION", ()).await?;

        let result = async {
            let conversation = self.insert_conversation(&title).await?;
            self.insert_message(conversation.id, Role::Assistant, OPENING_SCENE)
                .await?;
            Ok::<Conversation, anyhow::Error>(conversation)
        }
        .await;

        match result {
            Ok(conversation) => {
                conn.execute("COMMIT", ()).await?;
                Ok(conversation)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    async fn insert_conversation(&self, title: &str) -> Result<Conversation> {
        let query = r#"
            INSERT INTO conversations (title)
            VALUES (?)
            RETURNING id, title, created_at
        "#;

        let mut rows = self.db.connection().query(query, libsql::params![title]).await?;

        if let Some(row) = rows.next().await? {
            self.row_to_conversation(&row)
        } else {
            anyhow::bail!("Failed to create conversation")
        }
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let query = r#"
            SELECT id, title, created_at
            FROM conversations
            ORDER BY created_at DESC, id DESC
        "#;

        let mut rows = self.db.connection().query(query, ()).await?;
        let mut conversations = Vec::new();

        while let Some(row) = rows.next().await? {
            conversations.push(self.row_to_conversation(&row)?);
        }

        Ok(conversations)
    }

    pub async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>> {
        let query = "SELECT id, title, created_at FROM conversations WHERE id = ?";

        let mut rows = self.db.connection().query(query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_conversation(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn get_conversation_with_messages(&self, id: i64) -> Result<Option<ConversationWithMessages>> {
        let Some(conversation) = self.get_conversation(id).await? else {
            return Ok(None);
        };
        let messages = self.list_messages(id).await?;

        Ok(Some(ConversationWithMessages {
            conversation,
            messages,
        }))
    }

    pub async fn list_messages(&self, conversation_id: i64) -> Result<Vec<Message>> {
        let query = r#"
            SELECT id, conversation_id, role, content, created_at
            FROM messages
            WHERE conversation_id = ?
            ORDER BY id ASC
        "#;

        let mut rows = self
            .db
            .connection()
            .query(query, libsql::params![conversation_id])
            .await?;
        let mut messages = Vec::new();

        while let Some(row) = rows.next().await? {
            messages.push(self.row_to_message(&row)?);
        }

        Ok(messages)
    }

    /// Appends a message. `None` when the conversation does not exist.
    pub async fn add_message(&self, conversation_id: i64, role: Role, content: &str) -> Result<Option<Message>> {
        let _guard = self.db.tx_guard().await;
        if self.get_conversation(conversation_id).await?.is_none() {
            return Ok(None);
        }
        self.insert_message(conversation_id, role, content).await.map(Some)
    }

    async fn insert_message(&self, conversation_id: i64, role: Role, content: &str) -> Result<Message> {
        let query = r#"
            INSERT INTO messages (conversation_id, role, content)
            VALUES (?, ?, ?)
            RETURNING id, conversation_id, role, content, created_at
        "#;

        let mut rows = self
            .db
            .connection()
            .query(query, libsql::params![conversation_id, role.as_str(), content])
            .await?;

        if let Some(row) = rows.next().await? {
            self.row_to_message(&row)
        } else {
            anyhow::bail!("Failed to create message")
        }
    }

    pub async fn delete_conversation(&self, id: i64) -> Result<bool> {
        let _guard = self.db.tx_guard().await;
        let conn = self.db.connection();

        conn.execute("BEGIN TRANSACTION", ()).await?;

        let result = async {
            conn.execute("DELETE FROM messages WHERE conversation_id = ?", libsql::params![id])
                .await?;
            let deleted = conn
                .execute("DELETE FROM conversations WHERE id = ?", libsql::params![id])
                .await?;
            Ok::<bool, anyhow::Error>(deleted > 0)
        }
        .await;

        match result {
            Ok(deleted) => {
                conn.execute("COMMIT", ()).await?;
                Ok(deleted)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    fn row_to_conversation(&self, row: &libsql::Row) -> Result<Conversation> {
        let created_at: String = row.get(2)?;
        Ok(Conversation {
            id: row.get(0)?,
            title: row.get(1)?,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    fn row_to_message(&self, row: &libsql::Row) -> Result<Message> {
        let role_str: String = row.get(2)?;
        let role = Role::from_str(&role_str).ok_or_else(|| anyhow::anyhow!("Invalid message role: {}", role_str))?;
        let created_at: String = row.get(4)?;

        Ok(Message {
            id: row.get(0)?,
            conversation_id: row.get(1)?,
            role,
            content: row.get(3)?,
            created_at: parse_timestamp(&created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_conversation_opens_with_scene() {
        let db = Database::open_local(":memory:").await.unwrap();
        let adventure = Adventure::new(&db);

        let conversation = adventure
            .create_conversation(CreateConversation { title: Some("  ".into()) })
            .await
            .unwrap();
        assert_eq!(conversation.title, DEFAULT_TITLE);

        let full = adventure
            .get_conversation_with_messages(conversation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(full.messages.len(), 1);
        assert_eq!(full.messages[0].role, Role::Assistant);
        assert_eq!(full.messages[0].content, OPENING_SCENE);
    }

    #[tokio::test]
    async fn test_messages_keep_order() {
        let db = Database::open_local(":memory:").await.unwrap();
        let adventure = Adventure::new(&db);
        let conversation = adventure
            .create_conversation(CreateConversation::default())
            .await
            .unwrap();

        adventure.add_message(conversation.id, Role::User, "Cave").await.unwrap();
        adventure
            .add_message(conversation.id, Role::Assistant, "It is dark.")
            .await
            .unwrap();

        let messages = adventure.list_messages(conversation.id).await.unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, [OPENING_SCENE, "Cave", "It is dark."]);
    }

    #[tokio::test]
    async fn test_missing_conversation() {
        let db = Database::open_local(":memory:").await.unwrap();
        let adventure = Adventure::new(&db);

        assert!(adventure.add_message(42, Role::User, "hello").await.unwrap().is_none());
        assert!(adventure.get_conversation_with_messages(42).await.unwrap().is_none());
        assert!(!adventure.delete_conversation(42).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_messages() {
        let db = Database::open_local(":memory:").await.unwrap();
        let adventure = Adventure::new(&db);
        let conversation = adventure
            .create_conversation(CreateConversation::default())
            .await
            .unwrap();

        assert!(adventure.delete_conversation(conversation.id).await.unwrap());
        assert!(adventure.list_messages(conversation.id).await.unwrap().is_empty());
        assert!(adventure.list_conversations().await.unwrap().is_empty());
    }
}
