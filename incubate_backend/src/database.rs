use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::entry::{Entry, EntryDetail, EntryType, GoalItem, NewTodo, ReflectionQa, TodoItem};

/// Cap used when callers do not ask for a specific page size.
pub const DEFAULT_FETCH_LIMIT: usize = 1000;

const ENTRY_COLUMNS: &str =
    "id, user_id, type, title, text, tags, created_at, updated_at, deleted_at";

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T08:30:00.123Z`.
/// Fixed width, so lexical order matches chronological order.
pub fn to_iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn from_iso(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Synchronous access to the journal file. Owned by exactly one thread at a
/// time; see [`crate::store::JournalStore`] for the shared async handle.
pub struct JournalDatabase {
    conn: Connection,
    user_id: String,
}

impl JournalDatabase {
    /// Create or open the database, creating parent directories as needed.
    pub fn open<P: AsRef<Path>>(path: P, user_id: &str) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;
        let db = Self {
            conn,
            user_id: user_id.to_string(),
        };
        db.ensure_schema()?;
        tracing::info!("Opened journal database at {:?}", path);
        Ok(db)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn ensure_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS entries (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    type TEXT NOT NULL CHECK (type IN ('raw','todos','goals','reflection')),
                    title TEXT,
                    text TEXT NOT NULL,
                    tags TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    deleted_at TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_entries_user ON entries(user_id);
                CREATE INDEX IF NOT EXISTS idx_entries_type ON entries(type);
                CREATE INDEX IF NOT EXISTS idx_entries_created ON entries(type, created_at DESC);

                CREATE TABLE IF NOT EXISTS todo_items (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    entry_id TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    text TEXT NOT NULL,
                    is_done INTEGER NOT NULL DEFAULT 0
                );
                CREATE INDEX IF NOT EXISTS idx_todo_entry_pos ON todo_items(entry_id, position);

                CREATE TABLE IF NOT EXISTS goal_items (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    entry_id TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    bullet TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_goal_entry_pos ON goal_items(entry_id, position);

                CREATE TABLE IF NOT EXISTS reflection_qas (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    entry_id TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    question TEXT NOT NULL,
                    answer TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_reflection_entry_pos
                    ON reflection_qas(entry_id, position);

                CREATE TABLE IF NOT EXISTS app_state (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                "#,
            )
            .context("Failed to create journal schema")?;
        Ok(())
    }

    // ========================================================================
    // Entries
    // ========================================================================

    /// Upsert by primary key.
    pub fn insert(&self, entry: &Entry) -> Result<()> {
        insert_entry(&self.conn, entry)
    }

    pub fn fetch_all_active(&self, limit: usize) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS}
             FROM entries
             WHERE deleted_at IS NULL
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1"
        ))?;
        let entries = stmt
            .query_map([limit], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn fetch_by_type(&self, entry_type: EntryType, limit: usize) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS}
             FROM entries
             WHERE type = ?1 AND deleted_at IS NULL
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2"
        ))?;
        let entries = stmt
            .query_map(params![entry_type.as_db_str(), limit], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// The entry plus the child collection matching its type, or `None` when
    /// the entry is missing or soft-deleted.
    pub fn fetch_entry_detail(&self, id: &str) -> Result<Option<EntryDetail>> {
        let entry = self
            .conn
            .query_row(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1 AND deleted_at IS NULL"
                ),
                [id],
                entry_from_row,
            )
            .optional()?;

        let Some(entry) = entry else {
            return Ok(None);
        };

        let detail = match entry.entry_type {
            EntryType::Raw => EntryDetail::Raw(entry),
            EntryType::Todos => {
                let items = self.todo_items_for(&entry.id)?;
                EntryDetail::Todos { entry, items }
            }
            EntryType::Goals => {
                let items = self.goal_items_for(&entry.id)?;
                EntryDetail::Goals { entry, items }
            }
            EntryType::Reflection => {
                let qas = self.reflection_qas_for(&entry.id)?;
                EntryDetail::Reflection { entry, qas }
            }
        };
        Ok(Some(detail))
    }

    pub fn save_new_raw(&mut self, title: Option<&str>, body: &str) -> Result<Entry> {
        let entry = self.new_entry(EntryType::Raw, title, body);
        let tx = self.conn.transaction()?;
        insert_entry(&tx, &entry)?;
        tx.commit()?;
        tracing::debug!("Saved raw entry {}", entry.id);
        Ok(entry)
    }

    pub fn save_new_todos(&mut self, title: &str, items: &[NewTodo]) -> Result<Entry> {
        let entry = self.new_entry(EntryType::Todos, Some(title), "");
        let tx = self.conn.transaction()?;
        insert_entry(&tx, &entry)?;
        insert_todo_items(&tx, &entry.id, items)?;
        tx.commit()?;
        tracing::debug!("Saved todo entry {} with {} item(s)", entry.id, items.len());
        Ok(entry)
    }

    pub fn save_new_goals(&mut self, title: &str, bullets: &[String]) -> Result<Entry> {
        let entry = self.new_entry(EntryType::Goals, Some(title), "");
        let tx = self.conn.transaction()?;
        insert_entry(&tx, &entry)?;
        insert_goal_items(&tx, &entry.id, bullets)?;
        tx.commit()?;
        tracing::debug!("Saved goal entry {} with {} bullet(s)", entry.id, bullets.len());
        Ok(entry)
    }

    pub fn save_new_reflection(
        &mut self,
        title: Option<&str>,
        text: &str,
        qas: &[(String, String)],
    ) -> Result<Entry> {
        let entry = self.new_entry(EntryType::Reflection, title, text);
        let tx = self.conn.transaction()?;
        insert_entry(&tx, &entry)?;
        insert_reflection_qas(&tx, &entry.id, qas)?;
        tx.commit()?;
        tracing::debug!("Saved reflection entry {} with {} Q&A(s)", entry.id, qas.len());
        Ok(entry)
    }

    /// Updates title, text, and `updated_at`. Returns whether a row matched.
    pub fn update_entry_meta(&self, id: &str, title: Option<&str>, text: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE entries SET title = ?1, text = ?2, updated_at = ?3 WHERE id = ?4",
            params![title, text, to_iso(Utc::now()), id],
        )?;
        Ok(changed > 0)
    }

    pub fn update_entry_date(&self, id: &str, created_at: DateTime<Utc>) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE entries SET created_at = ?1 WHERE id = ?2",
            params![to_iso(created_at), id],
        )?;
        Ok(changed > 0)
    }

    /// Marks the entry deleted. Child rows stay in place.
    pub fn soft_delete_entry(&self, id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE entries SET deleted_at = ?1 WHERE id = ?2",
            params![to_iso(Utc::now()), id],
        )?;
        Ok(changed > 0)
    }

    // ========================================================================
    // Child items
    // ========================================================================

    pub fn update_todo_item(&self, id: i64, is_done: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE todo_items SET is_done = ?1 WHERE id = ?2",
            params![is_done as i64, id],
        )?;
        Ok(changed > 0)
    }

    pub fn update_goal_bullet(&self, id: i64, bullet: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE goal_items SET bullet = ?1 WHERE id = ?2",
            params![bullet, id],
        )?;
        Ok(changed > 0)
    }

    /// Deletes every Q&A of the entry and reinserts `qas` in order. Returns
    /// `false`, writing nothing, unless `entry_id` is an active reflection.
    pub fn update_reflection_qas(
        &mut self,
        entry_id: &str,
        qas: &[(String, String)],
    ) -> Result<bool> {
        let tx = self.conn.transaction()?;
        if !touch_entry(&tx, entry_id, EntryType::Reflection)? {
            return Ok(false);
        }
        tx.execute("DELETE FROM reflection_qas WHERE entry_id = ?1", [entry_id])?;
        insert_reflection_qas(&tx, entry_id, qas)?;
        tx.commit()?;
        Ok(true)
    }

    /// Deletes every to-do of the entry and reinserts `items` in order.
    /// Only applies to an active `todos` entry.
    pub fn replace_todo_items(&mut self, entry_id: &str, items: &[NewTodo]) -> Result<bool> {
        let tx = self.conn.transaction()?;
        if !touch_entry(&tx, entry_id, EntryType::Todos)? {
            return Ok(false);
        }
        tx.execute("DELETE FROM todo_items WHERE entry_id = ?1", [entry_id])?;
        insert_todo_items(&tx, entry_id, items)?;
        tx.commit()?;
        Ok(true)
    }

    /// Deletes every goal bullet of the entry and reinserts `bullets` in
    /// order. Only applies to an active `goals` entry.
    pub fn replace_goal_items(&mut self, entry_id: &str, bullets: &[String]) -> Result<bool> {
        let tx = self.conn.transaction()?;
        if !touch_entry(&tx, entry_id, EntryType::Goals)? {
            return Ok(false);
        }
        tx.execute("DELETE FROM goal_items WHERE entry_id = ?1", [entry_id])?;
        insert_goal_items(&tx, entry_id, bullets)?;
        tx.commit()?;
        Ok(true)
    }

    fn todo_items_for(&self, entry_id: &str) -> Result<Vec<TodoItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, entry_id, position, text, is_done
             FROM todo_items
             WHERE entry_id = ?1
             ORDER BY position ASC",
        )?;
        let items = stmt
            .query_map([entry_id], |row| {
                Ok(TodoItem {
                    id: row.get(0)?,
                    entry_id: row.get(1)?,
                    position: position_from(row.get(2)?),
                    text: row.get(3)?,
                    is_done: row.get::<_, i64>(4)? == 1,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn goal_items_for(&self, entry_id: &str) -> Result<Vec<GoalItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, entry_id, position, bullet
             FROM goal_items
             WHERE entry_id = ?1
             ORDER BY position ASC",
        )?;
        let items = stmt
            .query_map([entry_id], |row| {
                Ok(GoalItem {
                    id: row.get(0)?,
                    entry_id: row.get(1)?,
                    position: position_from(row.get(2)?),
                    bullet: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn reflection_qas_for(&self, entry_id: &str) -> Result<Vec<ReflectionQa>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, entry_id, position, question, answer
             FROM reflection_qas
             WHERE entry_id = ?1
             ORDER BY position ASC",
        )?;
        let qas = stmt
            .query_map([entry_id], |row| {
                Ok(ReflectionQa {
                    id: row.get(0)?,
                    entry_id: row.get(1)?,
                    position: position_from(row.get(2)?),
                    question: row.get(3)?,
                    answer: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(qas)
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    pub fn get_state(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM app_state WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_state(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete_state(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM app_state WHERE key = ?1", [key])?;
        Ok(())
    }

    fn new_entry(&self, entry_type: EntryType, title: Option<&str>, text: &str) -> Entry {
        Entry::new(
            &self.user_id,
            entry_type,
            title.map(str::to_string),
            text.to_string(),
            Utc::now().trunc_subsecs(3),
        )
    }
}

fn insert_entry(conn: &Connection, entry: &Entry) -> Result<()> {
    let tags_json =
        serde_json::to_string(&entry.tags).context("Failed to serialize entry tags")?;
    conn.execute(
        "INSERT OR REPLACE INTO entries
         (id, user_id, type, title, text, tags, created_at, updated_at, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            entry.id,
            entry.user_id,
            entry.entry_type.as_db_str(),
            entry.title,
            entry.text,
            tags_json,
            to_iso(entry.created_at),
            to_iso(entry.updated_at),
            entry.deleted_at.map(to_iso),
        ],
    )
    .with_context(|| format!("Failed to insert entry {}", entry.id))?;
    Ok(())
}

fn insert_todo_items(conn: &Connection, entry_id: &str, items: &[NewTodo]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO todo_items (entry_id, position, text, is_done) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, item) in items.iter().enumerate() {
        stmt.execute(params![entry_id, position, item.text, item.is_done as i64])?;
    }
    Ok(())
}

fn insert_goal_items(conn: &Connection, entry_id: &str, bullets: &[String]) -> Result<()> {
    let mut stmt =
        conn.prepare("INSERT INTO goal_items (entry_id, position, bullet) VALUES (?1, ?2, ?3)")?;
    for (position, bullet) in bullets.iter().enumerate() {
        stmt.execute(params![entry_id, position, bullet])?;
    }
    Ok(())
}

fn insert_reflection_qas(
    conn: &Connection,
    entry_id: &str,
    qas: &[(String, String)],
) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO reflection_qas (entry_id, position, question, answer) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, (question, answer)) in qas.iter().enumerate() {
        stmt.execute(params![entry_id, position, question, answer])?;
    }
    Ok(())
}

/// Bumps `updated_at` on an active entry of the given type. Returns whether
/// such an entry exists.
fn touch_entry(conn: &Connection, entry_id: &str, entry_type: EntryType) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE entries SET updated_at = ?1
         WHERE id = ?2 AND type = ?3 AND deleted_at IS NULL",
        params![to_iso(Utc::now()), entry_id, entry_type.as_db_str()],
    )?;
    Ok(changed > 0)
}

fn position_from(raw: i64) -> usize {
    usize::try_from(raw).unwrap_or(0)
}

fn decode_tags(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(tags) => tags,
        Err(e) => {
            tracing::debug!("Ignoring undecodable tags {:?}: {}", raw, e);
            Vec::new()
        }
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    let created_raw: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(created_raw.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let updated_at = row
        .get::<_, Option<String>>(7)?
        .as_deref()
        .and_then(from_iso)
        .unwrap_or(created_at);
    let deleted_at = row.get::<_, Option<String>>(8)?.as_deref().and_then(from_iso);
    let tags_raw: Option<String> = row.get(5)?;

    Ok(Entry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        entry_type: EntryType::from_db(&row.get::<_, String>(2)?),
        title: row.get(3)?,
        text: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        tags: decode_tags(tags_raw.as_deref()),
        created_at,
        updated_at,
        deleted_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    fn temp_db() -> (TempDir, JournalDatabase) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = JournalDatabase::open(dir.path().join("journal.sqlite"), "local-user")
            .expect("db init");
        (dir, db)
    }

    #[test]
    fn raw_entry_roundtrip() {
        let (_dir, mut db) = temp_db();

        let saved = db.save_new_raw(Some("T"), "B").expect("save raw");
        let detail = db
            .fetch_entry_detail(&saved.id)
            .expect("fetch detail")
            .expect("entry exists");

        let EntryDetail::Raw(entry) = detail else {
            panic!("expected raw detail");
        };
        assert_eq!(entry.title.as_deref(), Some("T"));
        assert_eq!(entry.text, "B");
        assert_eq!(entry.entry_type, EntryType::Raw);
        assert_eq!(entry.user_id, "local-user");
        assert!(entry.deleted_at.is_none());
    }

    #[test]
    fn soft_deleted_entry_disappears_from_active_queries() {
        let (_dir, mut db) = temp_db();

        let todos = db
            .save_new_todos("Errands", &[NewTodo::new("milk", false)])
            .expect("save todos");
        assert!(db.soft_delete_entry(&todos.id).expect("soft delete"));

        assert!(db.fetch_entry_detail(&todos.id).expect("fetch").is_none());
        assert!(db.fetch_all_active(DEFAULT_FETCH_LIMIT).expect("all").is_empty());
        assert!(db
            .fetch_by_type(EntryType::Todos, DEFAULT_FETCH_LIMIT)
            .expect("by type")
            .is_empty());
        assert!(!db.soft_delete_entry("missing").expect("missing id"));
    }

    #[test]
    fn todo_positions_follow_insertion_order() {
        let (_dir, mut db) = temp_db();

        let items: Vec<NewTodo> = (0..6)
            .map(|i| NewTodo::new(format!("task {}", i), i % 2 == 0))
            .collect();
        let entry = db.save_new_todos("Today", &items).expect("save todos");

        for _ in 0..2 {
            let Some(EntryDetail::Todos { items: stored, .. }) =
                db.fetch_entry_detail(&entry.id).expect("fetch")
            else {
                panic!("expected todos detail");
            };
            let positions: Vec<usize> = stored.iter().map(|item| item.position).collect();
            assert_eq!(positions, vec![0, 1, 2, 3, 4, 5]);
            assert_eq!(stored[3].text, "task 3");
            assert!(stored[4].is_done);
            assert!(!stored[5].is_done);
        }
    }

    #[test]
    fn single_field_child_updates() {
        let (_dir, mut db) = temp_db();

        let todos = db
            .save_new_todos("List", &[NewTodo::new("stretch", false)])
            .expect("save todos");
        let goals = db
            .save_new_goals("Goals", &["read more".to_string()])
            .expect("save goals");

        let Some(EntryDetail::Todos { items, .. }) = db.fetch_entry_detail(&todos.id).unwrap()
        else {
            panic!("expected todos");
        };
        assert!(db.update_todo_item(items[0].id, true).expect("toggle"));

        let Some(EntryDetail::Goals { items: bullets, .. }) =
            db.fetch_entry_detail(&goals.id).unwrap()
        else {
            panic!("expected goals");
        };
        assert!(db
            .update_goal_bullet(bullets[0].id, "read two books")
            .expect("edit bullet"));

        let Some(EntryDetail::Todos { items, .. }) = db.fetch_entry_detail(&todos.id).unwrap()
        else {
            panic!("expected todos");
        };
        assert!(items[0].is_done);
        let Some(EntryDetail::Goals { items: bullets, .. }) =
            db.fetch_entry_detail(&goals.id).unwrap()
        else {
            panic!("expected goals");
        };
        assert_eq!(bullets[0].bullet, "read two books");
    }

    #[test]
    fn reflection_qas_are_replaced_not_accumulated() {
        let (_dir, mut db) = temp_db();

        let entry = db
            .save_new_reflection(Some("Evening"), "a", &[("q".to_string(), "a".to_string())])
            .expect("save reflection");

        for round in 0..10 {
            let qas: Vec<(String, String)> = (0..3)
                .map(|i| (format!("question {}", i), format!("answer {} {}", round, i)))
                .collect();
            assert!(db.update_reflection_qas(&entry.id, &qas).expect("replace qas"));

            let count: i64 = db
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM reflection_qas WHERE entry_id = ?1",
                    [&entry.id],
                    |row| row.get(0),
                )
                .expect("count");
            assert_eq!(count, 3);
        }

        let Some(EntryDetail::Reflection { qas, .. }) = db.fetch_entry_detail(&entry.id).unwrap()
        else {
            panic!("expected reflection");
        };
        assert_eq!(qas[2].answer, "answer 9 2");
    }

    #[test]
    fn replacing_todos_and_goals_rewrites_positions() {
        let (_dir, mut db) = temp_db();

        let todos = db
            .save_new_todos(
                "List",
                &[NewTodo::new("a", false), NewTodo::new("b", false), NewTodo::new("c", true)],
            )
            .expect("save todos");
        assert!(db
            .replace_todo_items(&todos.id, &[NewTodo::new("c", true), NewTodo::new("a", false)])
            .expect("replace todos"));
        let Some(EntryDetail::Todos { items, .. }) = db.fetch_entry_detail(&todos.id).unwrap()
        else {
            panic!("expected todos");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "c");
        assert_eq!(items[1].position, 1);

        let goals = db
            .save_new_goals("Goals", &["one".to_string(), "two".to_string()])
            .expect("save goals");
        assert!(db.replace_goal_items(&goals.id, &[]).expect("clear goals"));
        let Some(EntryDetail::Goals { items, .. }) = db.fetch_entry_detail(&goals.id).unwrap()
        else {
            panic!("expected goals");
        };
        assert!(items.is_empty());
    }

    fn child_row_count(db: &JournalDatabase, table: &str, entry_id: &str) -> i64 {
        db.conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE entry_id = ?1"),
                [entry_id],
                |row| row.get(0),
            )
            .expect("count")
    }

    #[test]
    fn child_replace_on_missing_id_writes_nothing() {
        let (_dir, mut db) = temp_db();
        let qas = vec![
            ("q1".to_string(), "a1".to_string()),
            ("q2".to_string(), "a2".to_string()),
        ];

        assert!(!db.update_reflection_qas("no-such-entry", &qas).expect("qas"));
        assert!(!db
            .replace_todo_items("no-such-entry", &[NewTodo::new("x", false)])
            .expect("todos"));
        assert!(!db
            .replace_goal_items("no-such-entry", &["x".to_string()])
            .expect("goals"));

        assert_eq!(child_row_count(&db, "reflection_qas", "no-such-entry"), 0);
        assert_eq!(child_row_count(&db, "todo_items", "no-such-entry"), 0);
        assert_eq!(child_row_count(&db, "goal_items", "no-such-entry"), 0);
    }

    #[test]
    fn child_replace_requires_matching_active_entry() {
        let (_dir, mut db) = temp_db();

        let raw = db.save_new_raw(None, "plain note").expect("raw");
        assert!(!db
            .replace_todo_items(&raw.id, &[NewTodo::new("x", false)])
            .expect("todos on raw"));
        assert!(!db
            .update_reflection_qas(&raw.id, &[("q".to_string(), "a".to_string())])
            .expect("qas on raw"));
        assert_eq!(child_row_count(&db, "todo_items", &raw.id), 0);
        assert_eq!(child_row_count(&db, "reflection_qas", &raw.id), 0);

        let goals = db.save_new_goals("Goals", &["one".to_string()]).expect("goals");
        assert!(db.soft_delete_entry(&goals.id).expect("delete"));
        assert!(!db
            .replace_goal_items(&goals.id, &["two".to_string(), "three".to_string()])
            .expect("goals on deleted"));
        assert_eq!(child_row_count(&db, "goal_items", &goals.id), 1);
    }

    #[test]
    fn active_entries_are_newest_first_and_capped() {
        let (_dir, mut db) = temp_db();
        let now = Utc::now();

        let mut ids = Vec::new();
        for days_ago in [3, 1, 2] {
            let entry = db.save_new_raw(None, &format!("{} days ago", days_ago)).unwrap();
            db.update_entry_date(&entry.id, now - ChronoDuration::days(days_ago))
                .unwrap();
            ids.push(entry.id);
        }
        db.save_new_goals("Goals", &[]).unwrap();

        let all = db.fetch_all_active(DEFAULT_FETCH_LIMIT).expect("all");
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].entry_type, EntryType::Goals);
        assert_eq!(all[1].id, ids[1]);
        assert_eq!(all[3].id, ids[0]);

        let capped = db.fetch_by_type(EntryType::Raw, 2).expect("raw");
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[0].id, ids[1]);
        assert_eq!(capped[1].id, ids[2]);
    }

    #[test]
    fn corrupt_or_missing_tags_decode_to_empty() {
        let (_dir, db) = temp_db();
        let mut entry = Entry::new("local-user", EntryType::Raw, None, "x".into(), Utc::now());
        entry.tags = vec!["demo".to_string()];
        db.insert(&entry).expect("insert");

        let stored = db.fetch_all_active(10).unwrap();
        assert_eq!(stored[0].tags, vec!["demo".to_string()]);

        db.conn
            .execute("UPDATE entries SET tags = '{not json' WHERE id = ?1", [&entry.id])
            .unwrap();
        assert!(db.fetch_all_active(10).unwrap()[0].tags.is_empty());

        db.conn
            .execute("UPDATE entries SET tags = NULL WHERE id = ?1", [&entry.id])
            .unwrap();
        assert!(db.fetch_all_active(10).unwrap()[0].tags.is_empty());
    }

    #[test]
    fn insert_is_an_upsert_and_meta_update_touches_title_and_text() {
        let (_dir, mut db) = temp_db();
        let mut entry = db.save_new_raw(None, "first").unwrap();

        entry.text = "second".to_string();
        db.insert(&entry).expect("upsert");
        assert_eq!(db.fetch_all_active(10).unwrap().len(), 1);

        assert!(db
            .update_entry_meta(&entry.id, Some("Titled"), "third")
            .expect("meta"));
        let stored = db.fetch_entry_detail(&entry.id).unwrap().unwrap().into_entry();
        assert_eq!(stored.title.as_deref(), Some("Titled"));
        assert_eq!(stored.text, "third");
        assert_eq!(to_iso(stored.created_at), to_iso(entry.created_at));
    }

    #[test]
    fn timestamps_use_millisecond_iso_format() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T08:30:00.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(to_iso(ts), "2024-05-01T08:30:00.123Z");
        assert_eq!(from_iso("2024-05-01T08:30:00.123Z").map(to_iso), Some(to_iso(ts)));
        assert!(from_iso("yesterday").is_none());
    }

    #[test]
    fn app_state_roundtrip() {
        let (_dir, db) = temp_db();
        assert_eq!(db.get_state("first_name").unwrap(), None);
        db.set_state("first_name", "Robin").unwrap();
        db.set_state("first_name", "Sam").unwrap();
        assert_eq!(db.get_state("first_name").unwrap().as_deref(), Some("Sam"));
        db.delete_state("first_name").unwrap();
        assert_eq!(db.get_state("first_name").unwrap(), None);
    }
}
