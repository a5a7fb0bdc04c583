//! Persona store.
//!
//! SQLite-backed persistence for persona profiles, interview responses,
//! chat sessions/messages, and the query log. Attribute and confidence
//! records are stored as JSON text columns so the typed escape hatch
//! round-trips untouched.

use crate::error::LensError;
use crate::persona::{
    ChatTurn, ConfidenceLabel, PersonaAttributes, PersonaProfile, QuestionAnswer, TurnRole,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const SCHEMA_VERSION: u32 = 1;

/// Fields an owner may edit on a persona. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaUpdate {
    pub narrative: Option<String>,
    pub attributes: Option<PersonaAttributes>,
    pub published: Option<bool>,
}

/// Aggregate counters for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_personas: i64,
    pub total_sessions: i64,
    pub total_messages: i64,
    pub avg_latency_ms: i64,
}

/// Persona store backed by SQLite.
pub struct PersonaStore {
    conn: Arc<Mutex<Connection>>,
}

impl PersonaStore {
    /// Open or create the store at a specific path.
    pub fn open(path: &Path) -> Result<Self, LensError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LensError::Storage(format!("Failed to create {:?}: {}", parent, e)))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| LensError::Storage(format!("Failed to open {:?}: {}", path, e)))?;
        Self::from_connection(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, LensError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LensError::Storage(format!("Failed to open in-memory db: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, LensError> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), LensError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS persona_profiles (
                id TEXT PRIMARY KEY,
                owner TEXT,
                narrative TEXT NOT NULL,
                attributes TEXT NOT NULL,
                confidence TEXT NOT NULL,
                published INTEGER NOT NULL DEFAULT 0,
                version INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS raw_responses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                contributor TEXT NOT NULL,
                question_number INTEGER NOT NULL,
                question_text TEXT NOT NULL,
                response_text TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(contributor, question_number)
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS chat_sessions (
                id TEXT PRIMARY KEY,
                persona_id TEXT NOT NULL,
                user_ref TEXT,
                title TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                confidence TEXT,
                explanation TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS query_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT,
                model TEXT NOT NULL,
                latency_ms INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS schema_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('version', ?)",
            params![SCHEMA_VERSION.to_string()],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_personas_published ON persona_profiles(published)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_personas_owner ON persona_profiles(owner)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_messages_session ON chat_messages(session_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_responses_contributor ON raw_responses(contributor)",
            [],
        )?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Personas
    // ------------------------------------------------------------------

    pub fn insert_persona(&self, persona: &PersonaProfile) -> Result<(), LensError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO persona_profiles
                (id, owner, narrative, attributes, confidence, published, version, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                persona.id.to_string(),
                persona.owner,
                persona.narrative,
                to_json(&persona.attributes)?,
                to_json(&persona.confidence)?,
                persona.published,
                persona.version,
                persona.created_at,
                persona.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_persona(&self, id: Uuid) -> Result<Option<PersonaProfile>, LensError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, owner, narrative, attributes, confidence, published, version, created_at, updated_at
             FROM persona_profiles WHERE id = ?",
            params![id.to_string()],
            row_to_persona,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Fetch a persona only if it is published.
    pub fn get_published(&self, id: Uuid) -> Result<Option<PersonaProfile>, LensError> {
        Ok(self.get_persona(id)?.filter(|p| p.published))
    }

    pub fn list_published(&self) -> Result<Vec<PersonaProfile>, LensError> {
        self.list_where("WHERE published = 1")
    }

    pub fn list_by_owner(&self, owner: &str) -> Result<Vec<PersonaProfile>, LensError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, owner, narrative, attributes, confidence, published, version, created_at, updated_at
             FROM persona_profiles WHERE owner = ? ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![owner], row_to_persona)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn list_all(&self) -> Result<Vec<PersonaProfile>, LensError> {
        self.list_where("")
    }

    fn list_where(&self, clause: &str) -> Result<Vec<PersonaProfile>, LensError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT id, owner, narrative, attributes, confidence, published, version, created_at, updated_at
             FROM persona_profiles {} ORDER BY created_at DESC",
            clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_persona)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Apply an owner edit. Bumps `updated_at`; version stays where it is.
    /// Returns false when the persona does not exist.
    pub fn update_persona(&self, id: Uuid, update: &PersonaUpdate) -> Result<bool, LensError> {
        let Some(mut persona) = self.get_persona(id)? else {
            return Ok(false);
        };

        if let Some(narrative) = &update.narrative {
            persona.narrative = narrative.clone();
        }
        if let Some(attributes) = &update.attributes {
            persona.attributes = attributes.clone();
        }
        if let Some(published) = update.published {
            persona.published = published;
        }

        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE persona_profiles
             SET narrative = ?, attributes = ?, published = ?, updated_at = ?
             WHERE id = ?",
            params![
                persona.narrative,
                to_json(&persona.attributes)?,
                persona.published,
                Utc::now(),
                id.to_string(),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_persona(&self, id: Uuid) -> Result<bool, LensError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "DELETE FROM persona_profiles WHERE id = ?",
            params![id.to_string()],
        )?;
        Ok(changed > 0)
    }

    // ------------------------------------------------------------------
    // Interview responses
    // ------------------------------------------------------------------

    /// Insert or replace the answer for (contributor, question_number).
    /// Re-answering a question never creates a duplicate row.
    pub fn upsert_response(
        &self,
        contributor: &str,
        answer: &QuestionAnswer,
    ) -> Result<(), LensError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO raw_responses (contributor, question_number, question_text, response_text, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(contributor, question_number)
            DO UPDATE SET question_text = excluded.question_text,
                          response_text = excluded.response_text,
                          updated_at = excluded.updated_at
            "#,
            params![
                contributor,
                answer.question_number,
                answer.question_text,
                answer.response_text,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    /// All answers for one contributor, ordered by question number.
    pub fn responses_for(&self, contributor: &str) -> Result<Vec<QuestionAnswer>, LensError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT question_number, question_text, response_text
             FROM raw_responses WHERE contributor = ? ORDER BY question_number ASC",
        )?;
        let rows = stmt.query_map(params![contributor], |row| {
            Ok(QuestionAnswer {
                question_number: row.get(0)?,
                question_text: row.get(1)?,
                response_text: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Chat sessions and messages
    // ------------------------------------------------------------------

    pub fn create_session(
        &self,
        persona_id: Uuid,
        user_ref: Option<&str>,
        title: &str,
    ) -> Result<Uuid, LensError> {
        let id = Uuid::new_v4();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO chat_sessions (id, persona_id, user_ref, title, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                id.to_string(),
                persona_id.to_string(),
                user_ref,
                title,
                Utc::now(),
            ],
        )?;
        Ok(id)
    }

    pub fn append_message(&self, session_id: Uuid, turn: &ChatTurn) -> Result<(), LensError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO chat_messages (session_id, role, content, confidence, explanation, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                session_id.to_string(),
                turn.role.as_str(),
                turn.content,
                turn.confidence.map(|c| c.as_str()),
                turn.explanation,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    /// The most recent `limit` turns of a session, oldest first.
    pub fn session_history(&self, session_id: Uuid, limit: usize) -> Result<Vec<ChatTurn>, LensError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT role, content, confidence, explanation FROM chat_messages
             WHERE session_id = ? ORDER BY id DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(params![session_id.to_string(), limit as i64], |row| {
            let role: String = row.get(0)?;
            let confidence: Option<String> = row.get(2)?;
            Ok(ChatTurn {
                role: if role == "assistant" {
                    TurnRole::Assistant
                } else {
                    TurnRole::User
                },
                content: row.get(1)?,
                confidence: confidence.map(|c| ConfidenceLabel::parse_lenient(&c)),
                explanation: row.get(3)?,
            })
        })?;
        let mut turns = rows.collect::<Result<Vec<_>, _>>()?;
        turns.reverse();
        Ok(turns)
    }

    // ------------------------------------------------------------------
    // Query log and stats
    // ------------------------------------------------------------------

    pub fn record_query(
        &self,
        session_id: Option<Uuid>,
        model: &str,
        latency_ms: u64,
    ) -> Result<(), LensError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO query_log (session_id, model, latency_ms, created_at) VALUES (?, ?, ?, ?)",
            params![
                session_id.map(|s| s.to_string()),
                model,
                latency_ms as i64,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    pub fn stats(&self) -> Result<StoreStats, LensError> {
        let conn = self.conn.lock().unwrap();
        let total_personas: i64 = conn.query_row(
            "SELECT COUNT(*) FROM persona_profiles WHERE published = 1",
            [],
            |row| row.get(0),
        )?;
        let total_sessions: i64 =
            conn.query_row("SELECT COUNT(*) FROM chat_sessions", [], |row| row.get(0))?;
        let total_messages: i64 =
            conn.query_row("SELECT COUNT(*) FROM chat_messages", [], |row| row.get(0))?;
        let avg_latency_ms: f64 = conn.query_row(
            "SELECT COALESCE(AVG(latency_ms), 0) FROM query_log",
            [],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            total_personas,
            total_sessions,
            total_messages,
            avg_latency_ms: avg_latency_ms.round() as i64,
        })
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, LensError> {
    serde_json::to_string(value).map_err(|e| LensError::Storage(e.to_string()))
}

fn row_to_persona(row: &Row<'_>) -> rusqlite::Result<PersonaProfile> {
    let id: String = row.get(0)?;
    let attributes: String = row.get(3)?;
    let confidence: String = row.get(4)?;
    let created_at: DateTime<Utc> = row.get(7)?;
    let updated_at: DateTime<Utc> = row.get(8)?;

    Ok(PersonaProfile {
        id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
        owner: row.get(1)?,
        narrative: row.get(2)?,
        attributes: serde_json::from_str(&attributes).unwrap_or_default(),
        confidence: serde_json::from_str(&confidence).unwrap_or_default(),
        published: row.get(5)?,
        version: row.get(6)?,
        created_at,
        updated_at,
    })
}
