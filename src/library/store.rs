use anyhow::Result;
use libsql::{Connection, TransactionBehavior};

use crate::api::{MaterialCreate, SummaryCreate, TagCreate};
use crate::model::{Material, MaterialTag, Summary, Tag, new_id, now_timestamp};

const MATERIAL_COLUMNS: &str = "id, title, url, pdf_file, youtube_link, created_at";

/// Materials, their summaries, and the tags attached to them.
pub struct Library<'a> {
    conn: &'a Connection,
}

impl<'a> Library<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn create_material(&self, input: MaterialCreate) -> Result<Material> {
        let query = format!(
            r#"
            INSERT INTO materials ({MATERIAL_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {MATERIAL_COLUMNS}
            "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    new_id(),
                    input.title,
                    input.url,
                    input.pdf_file,
                    input.youtube_link,
                    now_timestamp()
                ],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(self.row_to_material(&row)?)
        } else {
            anyhow::bail!("Failed to create material")
        }
    }

    pub async fn get_material(&self, id: &str) -> Result<Option<Material>> {
        let query = format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = ?");

        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_material(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Case-sensitive substring match on the title; an empty keyword matches every row.
    pub async fn search_materials(&self, keyword: &str) -> Result<Vec<Material>> {
        let query = format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE instr(title, ?) > 0");

        let mut rows = self.conn.query(&query, libsql::params![keyword]).await?;
        let mut materials = Vec::new();

        while let Some(row) = rows.next().await? {
            materials.push(self.row_to_material(&row)?);
        }

        Ok(materials)
    }

    pub async fn recent_materials(&self, limit: i64) -> Result<Vec<Material>> {
        // rowid breaks ties between rows stamped within the same microsecond
        let query = format!(
            r#"
            SELECT {MATERIAL_COLUMNS}
            FROM materials
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#
        );

        let mut rows = self.conn.query(&query, libsql::params![limit]).await?;
        let mut materials = Vec::new();

        while let Some(row) = rows.next().await? {
            materials.push(self.row_to_material(&row)?);
        }

        Ok(materials)
    }

    fn row_to_material(&self, row: &libsql::Row) -> Result<Material> {
        Ok(Material {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            pdf_file: row.get(3)?,
            youtube_link: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    /// The material id is stored as given; it is not checked against `materials`.
    pub async fn create_summary(&self, input: SummaryCreate) -> Result<Summary> {
        let query = r#"
            INSERT INTO summaries (id, material_id, content, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, material_id, content, created_at
        "#;

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![
                    new_id(),
                    input.material_id.to_string(),
                    input.content,
                    now_timestamp()
                ],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(self.row_to_summary(&row)?)
        } else {
            anyhow::bail!("Failed to create summary")
        }
    }

    pub async fn list_summaries_by_material(&self, material_id: &str) -> Result<Vec<Summary>> {
        let query = r#"
            SELECT id, material_id, content, created_at
            FROM summaries
            WHERE material_id = ?
            ORDER BY created_at ASC, rowid ASC
        "#;

        let mut rows = self.conn.query(query, libsql::params![material_id]).await?;
        let mut summaries = Vec::new();

        while let Some(row) = rows.next().await? {
            summaries.push(self.row_to_summary(&row)?);
        }

        Ok(summaries)
    }

    fn row_to_summary(&self, row: &libsql::Row) -> Result<Summary> {
        Ok(Summary {
            id: row.get(0)?,
            material_id: row.get(1)?,
            content: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    pub async fn create_tag(&self, input: TagCreate) -> Result<Tag> {
        let query = r#"
            INSERT INTO tags (id, name)
            VALUES (?, ?)
            RETURNING id, name
        "#;

        let mut rows = self
            .conn
            .query(query, libsql::params![new_id(), input.name])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(self.row_to_tag(&row)?)
        } else {
            anyhow::bail!("Failed to create tag")
        }
    }

    pub async fn get_tag(&self, id: &str) -> Result<Option<Tag>> {
        let mut rows = self
            .conn
            .query("SELECT id, name FROM tags WHERE id = ?", libsql::params![id])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_tag(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut rows = self
            .conn
            .query("SELECT id, name FROM tags ORDER BY name ASC", ())
            .await?;
        let mut tags = Vec::new();

        while let Some(row) = rows.next().await? {
            tags.push(self.row_to_tag(&row)?);
        }

        Ok(tags)
    }

    pub async fn get_or_create_tag(&self, name: &str) -> Result<Tag> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO tags (id, name) VALUES (?, ?)",
                libsql::params![new_id(), name],
            )
            .await?;

        let mut rows = self
            .conn
            .query(
                "SELECT id, name FROM tags WHERE name = ? LIMIT 1",
                libsql::params![name],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(self.row_to_tag(&row)?)
        } else {
            anyhow::bail!("Failed to get or create tag: {}", name)
        }
    }

    fn row_to_tag(&self, row: &libsql::Row) -> Result<Tag> {
        Ok(Tag {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    /// Attaches the tag called `name` to a material, creating the tag if needed.
    ///
    /// Returns `None` when the material does not exist. Attaching the same tag twice
    /// leaves a single association row.
    pub async fn tag_material(&self, material_id: &str, name: &str) -> Result<Option<Tag>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;
        let scoped = Library::new(&tx);

        if scoped.get_material(material_id).await?.is_none() {
            return Ok(None);
        }

        let tag = scoped.get_or_create_tag(name).await?;
        scoped
            .link(&MaterialTag {
                material_id: material_id.to_string(),
                tag_id: tag.id.clone(),
            })
            .await?;

        tx.commit().await?;
        Ok(Some(tag))
    }

    async fn link(&self, link: &MaterialTag) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO material_tags (material_id, tag_id) VALUES (?, ?)",
                libsql::params![link.material_id.as_str(), link.tag_id.as_str()],
            )
            .await?;
        Ok(())
    }

    pub async fn tags_for_material(&self, material_id: &str) -> Result<Vec<Tag>> {
        let query = r#"
            SELECT tags.id, tags.name
            FROM material_tags
            JOIN tags ON tags.id = material_tags.tag_id
            WHERE material_tags.material_id = ?
            ORDER BY tags.name ASC
        "#;

        let mut rows = self.conn.query(query, libsql::params![material_id]).await?;
        let mut tags = Vec::new();

        while let Some(row) = rows.next().await? {
            tags.push(self.row_to_tag(&row)?);
        }

        Ok(tags)
    }

    pub async fn materials_for_tag(&self, tag_id: &str) -> Result<Vec<Material>> {
        let query = r#"
            SELECT materials.id, materials.title, materials.url, materials.pdf_file,
                   materials.youtube_link, materials.created_at
            FROM material_tags
            JOIN materials ON materials.id = material_tags.material_id
            WHERE material_tags.tag_id = ?
            ORDER BY materials.created_at DESC, materials.rowid DESC
        "#;

        let mut rows = self.conn.query(query, libsql::params![tag_id]).await?;
        let mut materials = Vec::new();

        while let Some(row) = rows.next().await? {
            materials.push(self.row_to_material(&row)?);
        }

        Ok(materials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::open_store;
    use uuid::Uuid;

    fn material(title: &str) -> MaterialCreate {
        MaterialCreate {
            title: title.to_string(),
            url: None,
            pdf_file: None,
            youtube_link: None,
        }
    }

    #[tokio::test]
    async fn created_material_is_readable_by_id() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let lib = Library::new(&conn);

        let created = lib
            .create_material(MaterialCreate {
                url: Some("https://example.com/calc".into()),
                ..material("Calc I Notes")
            })
            .await
            .unwrap();
        let fetched = lib.get_material(&created.id).await.unwrap().unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.url.as_deref(), Some("https://example.com/calc"));
        assert!(fetched.pdf_file.is_none());
    }

    #[tokio::test]
    async fn material_ids_are_unique() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let lib = Library::new(&conn);

        let a = lib.create_material(material("A")).await.unwrap();
        let b = lib.create_material(material("A")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn search_is_a_case_sensitive_substring_match() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let lib = Library::new(&conn);

        for title in ["FinSight intro", "Intro to finance", "Calc I Notes"] {
            lib.create_material(material(title)).await.unwrap();
        }

        let all = lib.search_materials("").await.unwrap();
        assert_eq!(all.len(), 3);

        let fin = lib.search_materials("Fin").await.unwrap();
        assert_eq!(fin.len(), 1);
        assert_eq!(fin[0].title, "FinSight intro");

        assert!(lib.search_materials("%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recent_materials_are_newest_first() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let lib = Library::new(&conn);

        let t1 = lib.create_material(material("t1")).await.unwrap();
        let t2 = lib.create_material(material("t2")).await.unwrap();
        let t3 = lib.create_material(material("t3")).await.unwrap();

        let recent = lib.recent_materials(2).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec![t3.id.as_str(), t2.id.as_str()]);

        let everything = lib.recent_materials(100).await.unwrap();
        assert_eq!(everything.last().unwrap().id, t1.id);
        assert!(lib.recent_materials(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn summaries_may_reference_unknown_materials() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let lib = Library::new(&conn);

        let orphan = Uuid::new_v4();
        let summary = lib
            .create_summary(SummaryCreate {
                content: "dangling".into(),
                material_id: orphan,
            })
            .await
            .unwrap();

        assert_eq!(summary.material_id, orphan.to_string());
        let listed = lib.list_summaries_by_material(&orphan.to_string()).await.unwrap();
        assert_eq!(listed, vec![summary]);
    }

    #[tokio::test]
    async fn duplicate_tag_names_violate_the_unique_constraint() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let lib = Library::new(&conn);

        lib.create_tag(TagCreate { name: "finance".into() }).await.unwrap();
        let err = lib
            .create_tag(TagCreate { name: "finance".into() })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("UNIQUE"), "{err}");
    }

    #[tokio::test]
    async fn tagging_is_navigable_from_both_sides() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let lib = Library::new(&conn);

        let calc = lib.create_material(material("Calc I Notes")).await.unwrap();
        let stats = lib.create_material(material("Stats")).await.unwrap();

        let math = lib.tag_material(&calc.id, "math").await.unwrap().unwrap();
        let again = lib.tag_material(&calc.id, "math").await.unwrap().unwrap();
        assert_eq!(math, again);
        lib.tag_material(&stats.id, "math").await.unwrap().unwrap();
        lib.tag_material(&calc.id, "exam").await.unwrap().unwrap();

        let calc_tags: Vec<_> = lib
            .tags_for_material(&calc.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(calc_tags, vec!["exam", "math"]);

        let tagged = lib.materials_for_tag(&math.id).await.unwrap();
        assert_eq!(tagged.len(), 2);
        assert_eq!(lib.list_tags().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn tagging_a_missing_material_creates_nothing() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let lib = Library::new(&conn);

        let result = lib.tag_material("missing", "math").await.unwrap();
        assert!(result.is_none());
        assert!(lib.list_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tagged_materials_with_equal_timestamps_keep_a_stable_order() {
        let (db, _dir) = open_store().await;
        let conn = db.session().unwrap();
        let lib = Library::new(&conn);

        for id in ["m-1", "m-2", "m-3"] {
            conn.execute(
                "INSERT INTO materials (id, title, created_at) VALUES (?, ?, '2024-01-01T00:00:00.000000Z')",
                libsql::params![id, id],
            )
            .await
            .unwrap();
            lib.tag_material(id, "same-instant").await.unwrap().unwrap();
        }

        let tag = lib.get_or_create_tag("same-instant").await.unwrap();
        for _ in 0..3 {
            let ids: Vec<_> = lib
                .materials_for_tag(&tag.id)
                .await
                .unwrap()
                .into_iter()
                .map(|m| m.id)
                .collect();
            assert_eq!(ids, vec!["m-3", "m-2", "m-1"]);
        }
    }
}

