//! Config template repository.

use sqlx::SqlitePool;

use super::models::{ConfigTemplate, TemplateInput};
use super::StorageError;

const TEMPLATE_COLUMNS: &str = "id, name, description, system_type, system_version, \
     config_content, kernel_params, packages, status, created_at";

pub struct TemplateRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TemplateRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<ConfigTemplate>, StorageError> {
        let query = format!("SELECT {} FROM config_templates ORDER BY id", TEMPLATE_COLUMNS);
        Ok(sqlx::query_as::<_, ConfigTemplate>(&query).fetch_all(self.pool).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<ConfigTemplate>, StorageError> {
        let query = format!("SELECT {} FROM config_templates WHERE id = ?", TEMPLATE_COLUMNS);
        Ok(sqlx::query_as::<_, ConfigTemplate>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Insert a new active template, returning its id.
    pub async fn create(&self, input: &TemplateInput) -> Result<i64, StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO config_templates
                (name, description, system_type, system_version, config_content, kernel_params, packages, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'active')
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.system_type)
        .bind(&input.system_version)
        .bind(&input.config_content)
        .bind(&input.kernel_params)
        .bind(&input.packages)
        .execute(self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn update(&self, id: i64, input: &TemplateInput) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE config_templates
            SET name = ?, description = ?, system_type = ?, system_version = ?,
                config_content = ?, kernel_params = ?, packages = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.system_type)
        .bind(&input.system_version)
        .bind(&input.config_content)
        .bind(&input.kernel_params)
        .bind(&input.packages)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("template {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn input(name: &str) -> TemplateInput {
        TemplateInput {
            name: name.into(),
            system_type: "centos".into(),
            system_version: "7".into(),
            packages: "vim,net-tools".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let db = Database::new(":memory:").await.unwrap();
        let repo = db.templates();

        let id = repo.create(&input("base")).await.unwrap();
        let template = repo.get(id).await.unwrap().unwrap();
        assert_eq!(template.name, "base");
        assert_eq!(template.status, "active");

        repo.update(id, &input("renamed")).await.unwrap();
        assert_eq!(repo.get(id).await.unwrap().unwrap().name, "renamed");
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_template() {
        let db = Database::new(":memory:").await.unwrap();
        let repo = db.templates();

        assert!(repo.get(42).await.unwrap().is_none());
        assert!(matches!(repo.update(42, &input("x")).await, Err(StorageError::NotFound(_))));
    }
}
