use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    entities::{
        content::{ContentBlock, ContentRow},
        event::{Event, EventInsert, EventRow},
    },
    errors::AppError,
    repositories::sqlx_repo::SqlxEventRepo,
};

const EVENT_COLUMNS: &str = "id, title, description, image_url, image_path, created_at, width, height";
const CONTENT_COLUMNS: &str = "id, event_id, kind, body, created_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;
    async fn create_event(&self, event: &EventInsert) -> Result<Event, AppError>;
    async fn get_event(&self, id: &Uuid) -> Result<Option<Event>, AppError>;
    /// Newest first.
    async fn list_events(&self) -> Result<Vec<Event>, AppError>;
    async fn delete_event(&self, id: &Uuid) -> Result<(), AppError>;
    async fn add_content(&self, block: &ContentBlock) -> Result<(), AppError>;
    async fn get_content(&self, event_id: &Uuid, content_id: &Uuid) -> Result<Option<ContentBlock>, AppError>;
    /// Oldest first.
    async fn list_content(&self, event_id: &Uuid) -> Result<Vec<ContentBlock>, AppError>;
    async fn delete_content(&self, event_id: &Uuid, content_id: &Uuid) -> Result<(), AppError>;
}

impl SqlxEventRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxEventRepo { pool }
    }
}

#[async_trait]
impl EventRepository for SqlxEventRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn create_event(&self, event: &EventInsert) -> Result<Event, AppError> {
        let sql = format!(
            "INSERT INTO events (id, title, description, image_url, image_path, created_at, width, height) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.image_url)
            .bind(&event.image_path)
            .bind(event.created_at)
            .bind(event.width.map(|w| w as i32))
            .bind(event.height.map(|h| h as i32))
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(row.into())
    }

    async fn get_event(&self, id: &Uuid) -> Result<Option<Event>, AppError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(row.map(Event::from))
    }

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn delete_event(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Event {} not found", id)));
        }
        Ok(())
    }

    async fn add_content(&self, block: &ContentBlock) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO event_content (id, event_id, kind, body, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(block.id)
        .bind(block.event_id)
        .bind(block.body.kind())
        .bind(Json(&block.body))
        .bind(block.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::NotFound(format!("Event {} not found", block.event_id))
            }
            _ => AppError::from(e),
        })?;

        Ok(())
    }

    async fn get_content(&self, event_id: &Uuid, content_id: &Uuid) -> Result<Option<ContentBlock>, AppError> {
        let sql = format!("SELECT {CONTENT_COLUMNS} FROM event_content WHERE event_id = $1 AND id = $2");
        let row = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(event_id)
            .bind(content_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(row.map(ContentBlock::from))
    }

    async fn list_content(&self, event_id: &Uuid) -> Result<Vec<ContentBlock>, AppError> {
        let sql = format!(
            "SELECT {CONTENT_COLUMNS} FROM event_content WHERE event_id = $1 ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(rows.into_iter().map(ContentBlock::from).collect())
    }

    async fn delete_content(&self, event_id: &Uuid, content_id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM event_content WHERE event_id = $1 AND id = $2")
            .bind(event_id)
            .bind(content_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Content {} not found", content_id)));
        }
        Ok(())
    }
}
