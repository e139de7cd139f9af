use anyhow::Result;
use argon2::Argon2;
use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
use libsql::Connection;

use crate::api::{FolderCreate, FolderUpdate, ScheduleCreate, ScheduleUpdate, UserCreate};
use crate::model::{Folder, Schedule, User, new_id};

/// Hashes a password into an argon2id PHC string with a fresh random salt.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Users and the folders and schedules they own.
///
/// Owner and folder ids are stored exactly as supplied by the caller.
pub struct Workspace<'a> {
    conn: &'a Connection,
}

impl<'a> Workspace<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn create_user(&self, input: UserCreate) -> Result<User> {
        let query = r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, email, password_hash
        "#;

        let password_hash = hash_password(&input.password)?;
        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![new_id(), input.name, input.email, password_hash],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(self.row_to_user(&row)?)
        } else {
            anyhow::bail!("Failed to create user")
        }
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let query = r#"
            SELECT id, name, email, password_hash
            FROM users WHERE id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_user(&row)?))
        } else {
            Ok(None)
        }
    }

    fn row_to_user(&self, row: &libsql::Row) -> Result<User> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
        })
    }

    pub async fn create_folder(&self, input: FolderCreate) -> Result<Folder> {
        let query = r#"
            INSERT INTO folders (id, owner_id, name)
            VALUES (?, ?, ?)
            RETURNING id, owner_id, name
        "#;

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![new_id(), input.owner_id.to_string(), input.name],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(self.row_to_folder(&row)?)
        } else {
            anyhow::bail!("Failed to create folder")
        }
    }

    pub async fn get_folder(&self, id: &str) -> Result<Option<Folder>> {
        let query = "SELECT id, owner_id, name FROM folders WHERE id = ?";

        let mut rows = self.conn.query(query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_folder(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        let mut rows = self
            .conn
            .query("SELECT id, owner_id, name FROM folders ORDER BY rowid", ())
            .await?;
        let mut folders = Vec::new();

        while let Some(row) = rows.next().await? {
            folders.push(self.row_to_folder(&row)?);
        }

        Ok(folders)
    }

    pub async fn list_folders_by_owner(&self, owner_id: &str) -> Result<Vec<Folder>> {
        let query = r#"
            SELECT id, owner_id, name
            FROM folders
            WHERE owner_id = ?
            ORDER BY rowid
        "#;

        let mut rows = self.conn.query(query, libsql::params![owner_id]).await?;
        let mut folders = Vec::new();

        while let Some(row) = rows.next().await? {
            folders.push(self.row_to_folder(&row)?);
        }

        Ok(folders)
    }

    pub async fn update_folder(&self, id: &str, input: FolderUpdate) -> Result<Option<Folder>> {
        if self.get_folder(id).await?.is_none() {
            return Ok(None);
        }

        let mut updates = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(name) = &input.name {
            updates.push("name = ?");
            params.push(name.clone().into());
        }

        if updates.is_empty() {
            return self.get_folder(id).await;
        }

        params.push(id.to_string().into());
        let query = format!("UPDATE folders SET {} WHERE id = ?", updates.join(", "));

        self.conn.execute(&query, params).await?;
        self.get_folder(id).await
    }

    /// Schedules pointing at the folder are left in place.
    pub async fn delete_folder(&self, id: &str) -> Result<bool> {
        let result = self
            .conn
            .execute("DELETE FROM folders WHERE id = ?", libsql::params![id])
            .await?;
        Ok(result > 0)
    }

    fn row_to_folder(&self, row: &libsql::Row) -> Result<Folder> {
        Ok(Folder {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
        })
    }

    pub async fn create_schedule(&self, input: ScheduleCreate) -> Result<Schedule> {
        let query = r#"
            INSERT INTO schedules (id, owner_id, folder_id, name, cron_expression, target_url)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, owner_id, folder_id, name, cron_expression, target_url
        "#;

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![
                    new_id(),
                    input.owner_id.to_string(),
                    input.folder_id.to_string(),
                    input.name,
                    input.cron_expression,
                    input.target_url
                ],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(self.row_to_schedule(&row)?)
        } else {
            anyhow::bail!("Failed to create schedule")
        }
    }

    pub async fn get_schedule(&self, id: &str) -> Result<Option<Schedule>> {
        let query = r#"
            SELECT id, owner_id, folder_id, name, cron_expression, target_url
            FROM schedules WHERE id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_schedule(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list_schedules(&self) -> Result<Vec<Schedule>> {
        let query = r#"
            SELECT id, owner_id, folder_id, name, cron_expression, target_url
            FROM schedules
            ORDER BY rowid
        "#;

        let mut rows = self.conn.query(query, ()).await?;
        let mut schedules = Vec::new();

        while let Some(row) = rows.next().await? {
            schedules.push(self.row_to_schedule(&row)?);
        }

        Ok(schedules)
    }

    pub async fn update_schedule(
        &self,
        id: &str,
        input: ScheduleUpdate,
    ) -> Result<Option<Schedule>> {
        if self.get_schedule(id).await?.is_none() {
            return Ok(None);
        }

        let mut updates = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(name) = &input.name {
            updates.push("name = ?");
            params.push(name.clone().into());
        }
        if let Some(cron_expression) = &input.cron_expression {
            updates.push("cron_expression = ?");
            params.push(cron_expression.clone().into());
        }
        if let Some(target_url) = &input.target_url {
            updates.push("target_url = ?");
            params.push(target_url.clone().into());
        }
        if let Some(folder_id) = &input.folder_id {
            updates.push("folder_id = ?");
            params.push(folder_id.to_string().into());
        }

        if updates.is_empty() {
            return self.get_schedule(id).await;
        }

        params.push(id.to_string().into());
        let query = format!("UPDATE schedules SET {} WHERE id = ?", updates.join(", "));

        self.conn.execute(&query, params).await?;
        self.get_schedule(id).await
    }

    pub async fn delete_schedule(&self, id: &str) -> Result<bool> {
        let result = self
            .conn
            .execute("DELETE FROM schedules WHERE id = ?", libsql::params![id])
            .await?;
        Ok(result > 0)
    }

    fn row_to_schedule(&self, row: &libsql::Row) -> Result<Schedule> {
        Ok(Schedule {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            folder_id: row.get(2)?,
            name: row.get(3)?,
            cron_expression: row.get(4)?,
            target_url: row.get(5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::open_store;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};
    use uuid::Uuid;

    fn verify_password(stored: &str, password: &str) -> bool {
        let parsed = PasswordHash::new(stored).unwrap();
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    fn schedule(owner: Uuid, folder: Uuid) -> ScheduleCreate {
        ScheduleCreate {
            name: "weekly digest".into(),
            cron_expression: "0 9 * * MON".into(),
            target_url: "https://example.com/hook".into(),
            folder_id: folder,
            owner_id: owner,
        }
    }

    #[test]
    fn password_hashes_are_salted() {
        let a = hash_password("hunter2").unwrap();
        let b = hash_password("hunter2").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"), "{a}");
        assert!(verify_password(&a, "hunter2"));
        assert!(!verify_password(&a, "hunter3"));
    }

    #[tokio::test]
    async fn users_store_only_the_hash() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let ws = Workspace::new(&conn);

        let user = ws
            .create_user(UserCreate {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                password: "hunter2".into(),
            })
            .await
            .unwrap();

        let stored = ws.get_user(&user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "hunter2");
        assert!(verify_password(&stored.password_hash, "hunter2"));
    }

    #[tokio::test]
    async fn duplicate_emails_are_rejected() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let ws = Workspace::new(&conn);

        let input = UserCreate {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "pw".into(),
        };
        ws.create_user(input.clone()).await.unwrap();
        assert!(ws.create_user(input).await.is_err());
    }

    #[tokio::test]
    async fn folder_round_trip_and_partial_update() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let ws = Workspace::new(&conn);
        let owner = Uuid::new_v4();

        let folder = ws
            .create_folder(FolderCreate {
                name: "A".into(),
                owner_id: owner,
            })
            .await
            .unwrap();

        let listed = ws.list_folders().await.unwrap();
        assert_eq!(listed, vec![folder.clone()]);
        assert_eq!(listed[0].owner_id, owner.to_string());

        let unchanged = ws
            .update_folder(&folder.id, FolderUpdate::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged, folder);

        let renamed = ws
            .update_folder(
                &folder.id,
                FolderUpdate {
                    name: Some("B".into()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "B");
        assert_eq!(renamed.owner_id, folder.owner_id);
        assert_eq!(renamed.id, folder.id);
    }

    #[tokio::test]
    async fn missing_folders_are_reported_as_none() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let ws = Workspace::new(&conn);

        let update = FolderUpdate {
            name: Some("B".into()),
        };
        assert!(ws.update_folder("missing", update).await.unwrap().is_none());
        assert!(!ws.delete_folder("missing").await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_folder_keeps_its_schedules() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let ws = Workspace::new(&conn);
        let owner = Uuid::new_v4();

        let folder = ws
            .create_folder(FolderCreate {
                name: "Reports".into(),
                owner_id: owner,
            })
            .await
            .unwrap();
        let folder_id = Uuid::parse_str(&folder.id).unwrap();
        let sched = ws.create_schedule(schedule(owner, folder_id)).await.unwrap();

        assert!(ws.delete_folder(&folder.id).await.unwrap());
        assert!(ws.get_folder(&folder.id).await.unwrap().is_none());

        let remaining = ws.get_schedule(&sched.id).await.unwrap().unwrap();
        assert_eq!(remaining.folder_id, folder.id);
    }

    #[tokio::test]
    async fn folders_by_owner_filters_on_owner() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let ws = Workspace::new(&conn);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        for (name, owner) in [("a1", alice), ("b1", bob), ("a2", alice)] {
            ws.create_folder(FolderCreate {
                name: name.into(),
                owner_id: owner,
            })
            .await
            .unwrap();
        }

        let names: Vec<_> = ws
            .list_folders_by_owner(&alice.to_string())
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["a1", "a2"]);
        assert_eq!(ws.list_folders().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn schedule_update_applies_only_present_fields() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let ws = Workspace::new(&conn);
        let owner = Uuid::new_v4();
        let new_folder = Uuid::new_v4();

        let created = ws
            .create_schedule(schedule(owner, Uuid::new_v4()))
            .await
            .unwrap();

        let updated = ws
            .update_schedule(
                &created.id,
                ScheduleUpdate {
                    cron_expression: Some("*/5 * * * *".into()),
                    folder_id: Some(new_folder),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.cron_expression, "*/5 * * * *");
        assert_eq!(updated.folder_id, new_folder.to_string());
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.target_url, created.target_url);
        assert_eq!(updated.owner_id, created.owner_id);

        assert!(ws.delete_schedule(&created.id).await.unwrap());
        assert!(ws.list_schedules().await.unwrap().is_empty());
        assert!(!ws.delete_schedule(&created.id).await.unwrap());
    }
}
