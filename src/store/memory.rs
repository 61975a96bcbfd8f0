use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{AccountStore, GithubUser, NewTask, Result, Session, TaskPatch, TaskRecord, TaskStore};

/// Non-persistent backend used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    tasks: RwLock<Vec<TaskRecord>>,
    users: RwLock<HashMap<String, GithubUser>>,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned_by(record: &TaskRecord, owner: Option<&str>) -> bool {
    record.owner_id.as_deref() == owner
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list(&self, owner: Option<&str>) -> Result<Vec<TaskRecord>> {
        let mut tasks: Vec<TaskRecord> = self
            .tasks
            .read()
            .iter()
            .filter(|t| owned_by(t, owner))
            .cloned()
            .collect();

        tasks.sort_by_key(|t| t.creation_date);
        Ok(tasks)
    }

    async fn insert(&self, task: NewTask) -> Result<TaskRecord> {
        let record = TaskRecord {
            id: Uuid::new_v4(),
            owner_id: task.owner_id,
            task: task.task,
            creation_date: task.creation_date,
            due_date: task.due_date,
            completed: false,
        };

        self.tasks.write().push(record.clone());
        Ok(record)
    }

    async fn update(&self, owner: Option<&str>, id: Uuid, patch: TaskPatch) -> Result<bool> {
        let mut tasks = self.tasks.write();

        match tasks.iter_mut().find(|t| t.id == id && owned_by(t, owner)) {
            Some(record) => {
                patch.apply(record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, owner: Option<&str>, id: Uuid) -> Result<bool> {
        let mut tasks = self.tasks.write();
        let before = tasks.len();
        tasks.retain(|t| !(t.id == id && owned_by(t, owner)));

        Ok(tasks.len() != before)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn upsert_user(&self, user: GithubUser) -> Result<GithubUser> {
        let mut users = self.users.write();
        let entry = users
            .entry(user.github_id.clone())
            .or_insert_with(|| user.clone());

        // blank profile fields from GitHub keep what we already had
        if !user.username.is_empty() {
            entry.username = user.username;
        }
        if !user.display_name.is_empty() {
            entry.display_name = user.display_name;
        }
        if !user.avatar.is_empty() {
            entry.avatar = user.avatar;
        }

        Ok(entry.clone())
    }

    async fn create_session(&self, session: Session) -> Result<()> {
        self.sessions.write().insert(session.id, session);
        Ok(())
    }

    async fn find_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Session>> {
        Ok(self
            .sessions
            .read()
            .get(&id)
            .filter(|s| s.expires_at > now)
            .cloned())
    }

    async fn delete_session(&self, id: Uuid) -> Result<()> {
        self.sessions.write().remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn new_task(owner: Option<&str>, text: &str, created: DateTime<Utc>) -> NewTask {
        NewTask {
            owner_id: owner.map(str::to_string),
            task: text.to_string(),
            creation_date: created,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped_and_ordered() {
        let store = MemoryStore::new();
        let now = Utc::now();

        store.insert(new_task(Some("1"), "second", now)).await.unwrap();
        store
            .insert(new_task(Some("1"), "first", now - Duration::minutes(1)))
            .await
            .unwrap();
        store.insert(new_task(Some("2"), "other", now)).await.unwrap();

        let tasks = store.list(Some("1")).await.unwrap();
        let texts: Vec<&str> = tasks.iter().map(|t| t.task.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);

        assert!(store.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_applies_only_given_fields() {
        let store = MemoryStore::new();
        let mut task = new_task(None, "write report", Utc::now());
        task.due_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        let record = store.insert(task).await.unwrap();

        let patch = TaskPatch {
            completed: Some(true),
            ..Default::default()
        };
        assert!(store.update(None, record.id, patch).await.unwrap());

        let stored = &store.list(None).await.unwrap()[0];
        assert!(stored.completed);
        assert_eq!(stored.task, "write report");
        assert_eq!(stored.due_date, NaiveDate::from_ymd_opt(2024, 6, 1));

        let clear = TaskPatch {
            due_date: Some(None),
            ..Default::default()
        };
        assert!(store.update(None, record.id, clear).await.unwrap());
        assert_eq!(store.list(None).await.unwrap()[0].due_date, None);
    }

    #[tokio::test]
    async fn test_foreign_owner_cannot_touch_task() {
        let store = MemoryStore::new();
        let record = store
            .insert(new_task(Some("alice"), "secret", Utc::now()))
            .await
            .unwrap();

        assert!(!store
            .update(Some("bob"), record.id, TaskPatch::default())
            .await
            .unwrap());
        assert!(!store.delete(Some("bob"), record.id).await.unwrap());
        assert!(store.delete(Some("alice"), record.id).await.unwrap());
        assert!(!store.delete(Some("alice"), record.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_user_keeps_existing_fields() {
        let store = MemoryStore::new();
        store
            .upsert_user(GithubUser {
                github_id: "42".into(),
                username: "octo".into(),
                display_name: "Octo Cat".into(),
                avatar: "https://example.com/a.png".into(),
            })
            .await
            .unwrap();

        let user = store
            .upsert_user(GithubUser {
                github_id: "42".into(),
                username: "octocat".into(),
                display_name: String::new(),
                avatar: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(user.username, "octocat");
        assert_eq!(user.display_name, "Octo Cat");
        assert_eq!(user.avatar, "https://example.com/a.png");
    }

    #[tokio::test]
    async fn test_expired_session_is_missing() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            github_id: "42".into(),
            username: "octo".into(),
            created_at: now - Duration::days(8),
            expires_at: now - Duration::days(1),
        };
        store.create_session(session.clone()).await.unwrap();

        assert!(store.find_session(session.id, now).await.unwrap().is_none());
        assert!(store
            .find_session(session.id, now - Duration::days(2))
            .await
            .unwrap()
            .is_some());
    }
}
