use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::sync::oneshot;

use crate::database::JournalDatabase;
use crate::entry::{Entry, EntryDetail, EntryType, NewTodo};

type Reply<T> = oneshot::Sender<Result<T>>;

/// One queued request for the store thread.
enum StoreCommand {
    Insert {
        entry: Entry,
        reply: Reply<()>,
    },
    FetchAllActive {
        limit: usize,
        reply: Reply<Vec<Entry>>,
    },
    FetchByType {
        entry_type: EntryType,
        limit: usize,
        reply: Reply<Vec<Entry>>,
    },
    FetchEntryDetail {
        id: String,
        reply: Reply<Option<EntryDetail>>,
    },
    SaveNewRaw {
        title: Option<String>,
        body: String,
        reply: Reply<Entry>,
    },
    SaveNewTodos {
        title: String,
        items: Vec<NewTodo>,
        reply: Reply<Entry>,
    },
    SaveNewGoals {
        title: String,
        bullets: Vec<String>,
        reply: Reply<Entry>,
    },
    SaveNewReflection {
        title: Option<String>,
        text: String,
        qas: Vec<(String, String)>,
        reply: Reply<Entry>,
    },
    UpdateEntryMeta {
        id: String,
        title: Option<String>,
        text: String,
        reply: Reply<bool>,
    },
    UpdateEntryDate {
        id: String,
        created_at: DateTime<Utc>,
        reply: Reply<bool>,
    },
    SoftDeleteEntry {
        id: String,
        reply: Reply<bool>,
    },
    UpdateTodoItem {
        id: i64,
        is_done: bool,
        reply: Reply<bool>,
    },
    UpdateGoalBullet {
        id: i64,
        bullet: String,
        reply: Reply<bool>,
    },
    UpdateReflectionQas {
        entry_id: String,
        qas: Vec<(String, String)>,
        reply: Reply<bool>,
    },
    ReplaceTodoItems {
        entry_id: String,
        items: Vec<NewTodo>,
        reply: Reply<bool>,
    },
    ReplaceGoalItems {
        entry_id: String,
        bullets: Vec<String>,
        reply: Reply<bool>,
    },
    GetState {
        key: String,
        reply: Reply<Option<String>>,
    },
    SetState {
        key: String,
        value: String,
        reply: Reply<()>,
    },
    DeleteState {
        key: String,
        reply: Reply<()>,
    },
}

/// Cloneable async handle to the journal. A single thread owns the SQLite
/// connection and serves requests in FIFO order from a bounded queue; callers
/// wait when the queue is full.
#[derive(Clone)]
pub struct JournalStore {
    tx: flume::Sender<StoreCommand>,
}

impl JournalStore {
    /// Open the database on the calling thread, then hand it to the store thread.
    pub fn open<P: AsRef<Path>>(path: P, user_id: &str, capacity: usize) -> Result<Self> {
        let db = JournalDatabase::open(path, user_id)?;
        Self::spawn(db, capacity)
    }

    pub fn spawn(db: JournalDatabase, capacity: usize) -> Result<Self> {
        let (tx, rx) = flume::bounded(capacity.max(1));
        std::thread::Builder::new()
            .name("incubate-store".to_string())
            .spawn(move || run_store(db, rx))
            .context("Failed to spawn journal store thread")?;
        Ok(Self { tx })
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> StoreCommand) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send_async(build(reply_tx))
            .await
            .map_err(|_| anyhow!("journal store is closed"))?;
        reply_rx
            .await
            .map_err(|_| anyhow!("journal store is closed"))?
    }

    pub async fn insert(&self, entry: Entry) -> Result<()> {
        self.request(|reply| StoreCommand::Insert { entry, reply })
            .await
    }

    pub async fn fetch_all_active(&self, limit: usize) -> Result<Vec<Entry>> {
        self.request(|reply| StoreCommand::FetchAllActive { limit, reply })
            .await
    }

    pub async fn fetch_by_type(&self, entry_type: EntryType, limit: usize) -> Result<Vec<Entry>> {
        self.request(|reply| StoreCommand::FetchByType {
            entry_type,
            limit,
            reply,
        })
        .await
    }

    pub async fn fetch_entry_detail(&self, id: &str) -> Result<Option<EntryDetail>> {
        let id = id.to_string();
        self.request(|reply| StoreCommand::FetchEntryDetail { id, reply })
            .await
    }

    pub async fn save_new_raw(&self, title: Option<&str>, body: &str) -> Result<Entry> {
        let title = title.map(str::to_string);
        let body = body.to_string();
        self.request(|reply| StoreCommand::SaveNewRaw { title, body, reply })
            .await
    }

    pub async fn save_new_todos(&self, title: &str, items: Vec<NewTodo>) -> Result<Entry> {
        let title = title.to_string();
        self.request(|reply| StoreCommand::SaveNewTodos {
            title,
            items,
            reply,
        })
        .await
    }

    pub async fn save_new_goals(&self, title: &str, bullets: Vec<String>) -> Result<Entry> {
        let title = title.to_string();
        self.request(|reply| StoreCommand::SaveNewGoals {
            title,
            bullets,
            reply,
        })
        .await
    }

    /// Entry and Q&A rows are written in one transaction.
    pub async fn save_new_reflection(
        &self,
        title: Option<&str>,
        text: &str,
        qas: Vec<(String, String)>,
    ) -> Result<Entry> {
        let title = title.map(str::to_string);
        let text = text.to_string();
        self.request(|reply| StoreCommand::SaveNewReflection {
            title,
            text,
            qas,
            reply,
        })
        .await
    }

    pub async fn update_entry_meta(
        &self,
        id: &str,
        title: Option<&str>,
        text: &str,
    ) -> Result<bool> {
        let id = id.to_string();
        let title = title.map(str::to_string);
        let text = text.to_string();
        self.request(|reply| StoreCommand::UpdateEntryMeta {
            id,
            title,
            text,
            reply,
        })
        .await
    }

    pub async fn update_entry_date(&self, id: &str, created_at: DateTime<Utc>) -> Result<bool> {
        let id = id.to_string();
        self.request(|reply| StoreCommand::UpdateEntryDate {
            id,
            created_at,
            reply,
        })
        .await
    }

    pub async fn soft_delete_entry(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.request(|reply| StoreCommand::SoftDeleteEntry { id, reply })
            .await
    }

    pub async fn update_todo_item(&self, id: i64, is_done: bool) -> Result<bool> {
        self.request(|reply| StoreCommand::UpdateTodoItem { id, is_done, reply })
            .await
    }

    pub async fn update_goal_bullet(&self, id: i64, bullet: &str) -> Result<bool> {
        let bullet = bullet.to_string();
        self.request(|reply| StoreCommand::UpdateGoalBullet { id, bullet, reply })
            .await
    }

    pub async fn update_reflection_qas(
        &self,
        entry_id: &str,
        qas: Vec<(String, String)>,
    ) -> Result<bool> {
        let entry_id = entry_id.to_string();
        self.request(|reply| StoreCommand::UpdateReflectionQas {
            entry_id,
            qas,
            reply,
        })
        .await
    }

    pub async fn replace_todo_items(&self, entry_id: &str, items: Vec<NewTodo>) -> Result<bool> {
        let entry_id = entry_id.to_string();
        self.request(|reply| StoreCommand::ReplaceTodoItems {
            entry_id,
            items,
            reply,
        })
        .await
    }

    pub async fn replace_goal_items(&self, entry_id: &str, bullets: Vec<String>) -> Result<bool> {
        let entry_id = entry_id.to_string();
        self.request(|reply| StoreCommand::ReplaceGoalItems {
            entry_id,
            bullets,
            reply,
        })
        .await
    }

    pub async fn get_state(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.request(|reply| StoreCommand::GetState { key, reply })
            .await
    }

    pub async fn set_state(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.request(|reply| StoreCommand::SetState { key, value, reply })
            .await
    }

    pub async fn delete_state(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.request(|reply| StoreCommand::DeleteState { key, reply })
            .await
    }
}

fn run_store(mut db: JournalDatabase, rx: flume::Receiver<StoreCommand>) {
    tracing::debug!("Journal store thread started for user {}", db.user_id());
    for command in rx.iter() {
        handle_command(&mut db, command);
    }
    tracing::debug!("Journal store thread stopped (all handles dropped)");
}

fn handle_command(db: &mut JournalDatabase, command: StoreCommand) {
    match command {
        StoreCommand::Insert { entry, reply } => respond(reply, db.insert(&entry)),
        StoreCommand::FetchAllActive { limit, reply } => {
            respond(reply, db.fetch_all_active(limit))
        }
        StoreCommand::FetchByType {
            entry_type,
            limit,
            reply,
        } => respond(reply, db.fetch_by_type(entry_type, limit)),
        StoreCommand::FetchEntryDetail { id, reply } => respond(reply, db.fetch_entry_detail(&id)),
        StoreCommand::SaveNewRaw { title, body, reply } => {
            respond(reply, db.save_new_raw(title.as_deref(), &body))
        }
        StoreCommand::SaveNewTodos {
            title,
            items,
            reply,
        } => respond(reply, db.save_new_todos(&title, &items)),
        StoreCommand::SaveNewGoals {
            title,
            bullets,
            reply,
        } => respond(reply, db.save_new_goals(&title, &bullets)),
        StoreCommand::SaveNewReflection {
            title,
            text,
            qas,
            reply,
        } => respond(reply, db.save_new_reflection(title.as_deref(), &text, &qas)),
        StoreCommand::UpdateEntryMeta {
            id,
            title,
            text,
            reply,
        } => respond(reply, db.update_entry_meta(&id, title.as_deref(), &text)),
        StoreCommand::UpdateEntryDate {
            id,
            created_at,
            reply,
        } => respond(reply, db.update_entry_date(&id, created_at)),
        StoreCommand::SoftDeleteEntry { id, reply } => respond(reply, db.soft_delete_entry(&id)),
        StoreCommand::UpdateTodoItem { id, is_done, reply } => {
            respond(reply, db.update_todo_item(id, is_done))
        }
        StoreCommand::UpdateGoalBullet { id, bullet, reply } => {
            respond(reply, db.update_goal_bullet(id, &bullet))
        }
        StoreCommand::UpdateReflectionQas {
            entry_id,
            qas,
            reply,
        } => respond(reply, db.update_reflection_qas(&entry_id, &qas)),
        StoreCommand::ReplaceTodoItems {
            entry_id,
            items,
            reply,
        } => respond(reply, db.replace_todo_items(&entry_id, &items)),
        StoreCommand::ReplaceGoalItems {
            entry_id,
            bullets,
            reply,
        } => respond(reply, db.replace_goal_items(&entry_id, &bullets)),
        StoreCommand::GetState { key, reply } => respond(reply, db.get_state(&key)),
        StoreCommand::SetState { key, value, reply } => respond(reply, db.set_state(&key, &value)),
        StoreCommand::DeleteState { key, reply } => respond(reply, db.delete_state(&key)),
    }
}

fn respond<T>(reply: Reply<T>, result: Result<T>) {
    if let Err(e) = &result {
        tracing::debug!("Journal store request failed: {:#}", e);
    }
    // The caller may have stopped waiting; nothing to do then.
    let _ = reply.send(result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DEFAULT_FETCH_LIMIT;
    use tempfile::TempDir;

    fn temp_store(capacity: usize) -> (TempDir, JournalStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JournalStore::open(dir.path().join("journal.sqlite"), "local-user", capacity)
            .expect("store init");
        (dir, store)
    }

    #[tokio::test]
    async fn writes_are_visible_to_the_next_read() {
        let (_dir, store) = temp_store(4);

        let entry = store.save_new_raw(Some("T"), "B").await.expect("save");
        let detail = store
            .fetch_entry_detail(&entry.id)
            .await
            .expect("fetch")
            .expect("exists");
        assert_eq!(detail.entry().text, "B");

        assert!(store.soft_delete_entry(&entry.id).await.expect("delete"));
        assert!(store
            .fetch_entry_detail(&entry.id)
            .await
            .expect("fetch after delete")
            .is_none());
    }

    #[tokio::test]
    async fn concurrent_callers_all_complete_through_a_tiny_queue() {
        let (_dir, store) = temp_store(1);

        let mut handles = Vec::new();
        for i in 0..24 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .save_new_todos(&format!("list {}", i), vec![NewTodo::new("x", false)])
                    .await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("save");
        }

        let todos = store
            .fetch_by_type(EntryType::Todos, DEFAULT_FETCH_LIMIT)
            .await
            .expect("fetch todos");
        assert_eq!(todos.len(), 24);
    }

    #[tokio::test]
    async fn requests_from_one_caller_apply_in_order() {
        let (_dir, store) = temp_store(8);

        let entry = store
            .save_new_reflection(None, "a", vec![("q".into(), "a".into())])
            .await
            .expect("save");
        for round in 0..10 {
            let replaced = store
                .update_reflection_qas(
                    &entry.id,
                    vec![
                        ("q1".to_string(), format!("a{}", round)),
                        ("q2".to_string(), format!("b{}", round)),
                    ],
                )
                .await
                .expect("replace");
            assert!(replaced);
        }

        let Some(EntryDetail::Reflection { qas, .. }) =
            store.fetch_entry_detail(&entry.id).await.expect("fetch")
        else {
            panic!("expected reflection");
        };
        assert_eq!(qas.len(), 2);
        assert_eq!(qas[0].answer, "a9");
    }

    #[tokio::test]
    async fn pipelined_requests_from_one_task_apply_in_send_order() {
        let (_dir, store) = temp_store(1);
        let entry = store
            .save_new_reflection(None, "", Vec::new())
            .await
            .expect("save");
        let round = |n: usize| -> Vec<(String, String)> {
            (0..=n).map(|i| (format!("q{}", i), format!("round {}", n))).collect()
        };

        // All five are queued before any reply is awaited.
        let (r0, r1, r2, r3, r4) = tokio::join!(
            store.update_reflection_qas(&entry.id, round(0)),
            store.update_reflection_qas(&entry.id, round(1)),
            store.update_reflection_qas(&entry.id, round(2)),
            store.update_reflection_qas(&entry.id, round(3)),
            store.update_reflection_qas(&entry.id, round(4)),
        );
        for result in [r0, r1, r2, r3, r4] {
            assert!(result.expect("replace"));
        }

        let Some(EntryDetail::Reflection { entry: stored, qas }) =
            store.fetch_entry_detail(&entry.id).await.expect("fetch")
        else {
            panic!("expected reflection");
        };
        assert_eq!(qas.len(), 5);
        assert!(qas.iter().all(|qa| qa.answer == "round 4"));
        assert!(stored.updated_at >= entry.updated_at);
    }

    #[tokio::test]
    async fn replace_on_unknown_entry_reports_false() {
        let (_dir, store) = temp_store(2);
        assert!(!store
            .replace_todo_items("missing", vec![NewTodo::new("x", false)])
            .await
            .expect("replace"));
    }

    #[tokio::test]
    async fn state_roundtrip_through_handle() {
        let (_dir, store) = temp_store(2);
        store.set_state("first_name", "Ada").await.expect("set");
        assert_eq!(
            store.get_state("first_name").await.expect("get").as_deref(),
            Some("Ada")
        );
        store.delete_state("first_name").await.expect("delete");
        assert!(store.get_state("first_name").await.expect("get").is_none());
    }

    #[test]
    fn open_fails_for_unwritable_location() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"file").expect("write blocker");
        let result = JournalStore::open(blocker.join("db.sqlite"), "local-user", 4);
        assert!(result.is_err());
    }
}
