use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccountStore, GithubUser, NewTask, Result, Session, TaskPatch, TaskRecord, TaskStore};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list(&self, owner: Option<&str>) -> Result<Vec<TaskRecord>> {
        let rec = sqlx::query_as::<_, TaskRecord>(
            r#"
            SELECT id, owner_id, task, creation_date, due_date, completed
            FROM tasks
            WHERE owner_id IS NOT DISTINCT FROM $1
            ORDER BY creation_date ASC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rec)
    }

    async fn insert(&self, task: NewTask) -> Result<TaskRecord> {
        let rec = sqlx::query_as::<_, TaskRecord>(
            r#"
            INSERT INTO tasks (id, owner_id, task, creation_date, due_date, completed)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING id, owner_id, task, creation_date, due_date, completed
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&task.owner_id)
        .bind(&task.task)
        .bind(task.creation_date)
        .bind(task.due_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(rec)
    }

    async fn update(&self, owner: Option<&str>, id: Uuid, patch: TaskPatch) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET
                task = COALESCE($3, task),
                creation_date = COALESCE($4, creation_date),
                due_date = CASE WHEN $5 THEN $6 ELSE due_date END,
                completed = COALESCE($7, completed)
            WHERE id = $1 AND owner_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(patch.task)
        .bind(patch.creation_date)
        .bind(patch.due_date.is_some())
        .bind(patch.due_date.flatten())
        .bind(patch.completed)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, owner: Option<&str>, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND owner_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn upsert_user(&self, user: GithubUser) -> Result<GithubUser> {
        let rec = sqlx::query_as::<_, GithubUser>(
            r#"
            INSERT INTO users (github_id, username, display_name, avatar)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (github_id) DO UPDATE SET
                username = COALESCE(NULLIF(EXCLUDED.username, ''), users.username),
                display_name = COALESCE(NULLIF(EXCLUDED.display_name, ''), users.display_name),
                avatar = COALESCE(NULLIF(EXCLUDED.avatar, ''), users.avatar)
            RETURNING github_id, username, display_name, avatar
            "#,
        )
        .bind(&user.github_id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.avatar)
        .fetch_one(&self.pool)
        .await?;

        Ok(rec)
    }

    async fn create_session(&self, session: Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, github_id, username, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.id)
        .bind(&session.github_id)
        .bind(&session.username)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Session>> {
        let rec = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, github_id, username, created_at, expires_at
            FROM sessions
            WHERE id = $1 AND expires_at > $2
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rec)
    }

    async fn delete_session(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// These run against the database in `DATABASE_URL` and are skipped without
/// one. Each test works under its own random owner id.
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    async fn store() -> Option<PgStore> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping Postgres store test");
            return None;
        };
        Some(PgStore::connect(&url).await.unwrap())
    }

    fn new_task(owner: Option<&str>, text: &str, due: Option<NaiveDate>) -> NewTask {
        NewTask {
            owner_id: owner.map(str::to_string),
            task: text.to_string(),
            creation_date: Utc::now(),
            due_date: due,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_patch_clears_or_keeps_due_date() {
        let Some(store) = store().await else { return };
        let owner = Uuid::new_v4().to_string();

        let rec = store
            .insert(new_task(Some(&owner), "file taxes", Some(date("2024-04-15"))))
            .await
            .unwrap();
        assert_eq!(rec.due_date, Some(date("2024-04-15")));
        assert!(!rec.completed);

        let touched = store
            .update(
                Some(&owner),
                rec.id,
                TaskPatch {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(touched);

        let listed = store.list(Some(&owner)).await.unwrap();
        assert_eq!(listed[0].due_date, Some(date("2024-04-15")));
        assert_eq!(listed[0].task, "file taxes");
        assert!(listed[0].completed);

        store
            .update(
                Some(&owner),
                rec.id,
                TaskPatch {
                    due_date: Some(None),
                    task: Some("file taxes early".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let listed = store.list(Some(&owner)).await.unwrap();
        assert_eq!(listed[0].due_date, None);
        assert_eq!(listed[0].task, "file taxes early");
        assert!(listed[0].completed);

        assert!(store.delete(Some(&owner), rec.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_owner_scoping_includes_unowned_rows() {
        let Some(store) = store().await else { return };
        let owner = Uuid::new_v4().to_string();
        let other = Uuid::new_v4().to_string();

        let mine = store.insert(new_task(Some(&owner), "mine", None)).await.unwrap();
        let shared = store.insert(new_task(None, "shared", None)).await.unwrap();

        let ids = |rows: Vec<TaskRecord>| rows.into_iter().map(|r| r.id).collect::<Vec<_>>();

        assert_eq!(ids(store.list(Some(&owner)).await.unwrap()), vec![mine.id]);
        assert!(store.list(Some(&other)).await.unwrap().is_empty());
        let unowned = ids(store.list(None).await.unwrap());
        assert!(unowned.contains(&shared.id));
        assert!(!unowned.contains(&mine.id));

        let patch = TaskPatch {
            completed: Some(true),
            ..Default::default()
        };
        assert!(!store.update(Some(&other), mine.id, patch.clone()).await.unwrap());
        assert!(!store.update(None, mine.id, patch.clone()).await.unwrap());
        assert!(!store.update(Some(&owner), shared.id, patch.clone()).await.unwrap());
        assert!(store.update(None, shared.id, patch).await.unwrap());

        assert!(!store.delete(Some(&other), mine.id).await.unwrap());
        assert!(!store.delete(Some(&owner), shared.id).await.unwrap());
        assert!(store.delete(None, shared.id).await.unwrap());
        assert!(store.delete(Some(&owner), mine.id).await.unwrap());
        assert!(store.list(Some(&owner)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_keeps_profile_fields_and_sessions_expire() {
        let Some(store) = store().await else { return };
        let github_id = Uuid::new_v4().to_string();

        store
            .upsert_user(GithubUser {
                github_id: github_id.clone(),
                username: "octo".into(),
                display_name: "Octo Cat".into(),
                avatar: "https://example.com/a.png".into(),
            })
            .await
            .unwrap();
        let user = store
            .upsert_user(GithubUser {
                github_id: github_id.clone(),
                username: "octo2".into(),
                display_name: String::new(),
                avatar: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(user.username, "octo2");
        assert_eq!(user.display_name, "Octo Cat");
        assert_eq!(user.avatar, "https://example.com/a.png");

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            github_id,
            username: user.username,
            created_at: now,
            expires_at: now + Duration::days(1),
        };
        store.create_session(session.clone()).await.unwrap();

        let found = store.find_session(session.id, now).await.unwrap().unwrap();
        assert_eq!(found.github_id, session.github_id);
        assert!(store
            .find_session(session.id, now + Duration::days(2))
            .await
            .unwrap()
            .is_none());

        store.delete_session(session.id).await.unwrap();
        assert!(store.find_session(session.id, now).await.unwrap().is_none());
    }
}
