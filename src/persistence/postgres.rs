//! PostgreSQL implementation of the ticket store.
//!
//! Ticket numbering runs inside one transaction that row-locks the category
//! before reading today's maximum, so concurrent creations in the same
//! category are serialized by the database. The unique index on
//! `(category_id, created_on, ticket_number)` backs this up: a violation
//! surfaces as [`QueueError::SequenceConflict`] instead of a duplicate.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::TicketStore;
use super::models::{CategoryRow, DisplaySettingsRow, TICKET_COLUMNS, TicketRow};
use crate::config::QueueConfig;
use crate::domain::{Category, DisplaySettings, QueueStats, Ticket, TicketStatus, format_code};
use crate::error::QueueError;

/// PostgreSQL-backed ticket store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool, retrying while the database comes up.
    ///
    /// Makes up to `database_connect_retries` attempts spaced
    /// `database_retry_delay_secs` apart. This is the only place store
    /// failures are retried.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::StoreUnavailable`] once every attempt failed.
    pub async fn connect(config: &QueueConfig) -> Result<Self, QueueError> {
        let options = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs));
        let attempts = config.database_connect_retries.max(1);
        let delay = Duration::from_secs(config.database_retry_delay_secs);

        let mut attempt = 1u32;
        loop {
            match options.clone().connect(&config.database_url).await {
                Ok(pool) => {
                    tracing::info!(attempt, "connected to database");
                    return Ok(Self::new(pool));
                }
                Err(err) if attempt < attempts => {
                    tracing::warn!(attempt, attempts, error = %err, "waiting for database");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(attempts, error = %err, "could not connect to database");
                    return Err(QueueError::StoreUnavailable(err.to_string()));
                }
            }
        }
    }

    /// Applies the embedded schema migrations and seed rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::StoreUnavailable`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), QueueError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| QueueError::StoreUnavailable(e.to_string()))?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

impl TicketStore for PostgresStore {
    async fn create_ticket(&self, category_id: i32) -> Result<Ticket, QueueError> {
        let mut tx = self.pool.begin().await?;

        // Holding this row lock until commit serializes numbering per category.
        let prefix: Option<String> =
            sqlx::query_scalar("SELECT prefix FROM categories WHERE id = $1 FOR UPDATE")
                .bind(category_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(prefix) = prefix else {
            return Err(QueueError::CategoryNotFound(category_id));
        };

        let last: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(ticket_number), 0) FROM queues \
             WHERE category_id = $1 AND created_on = (now() AT TIME ZONE 'UTC')::date",
        )
        .bind(category_id)
        .fetch_one(&mut *tx)
        .await?;

        let ticket_number = last
            .checked_add(1)
            .ok_or_else(|| QueueError::Internal("ticket number overflow".to_string()))?;
        let formatted_code = format_code(&prefix, ticket_number);

        let sql = format!(
            "INSERT INTO queues (category_id, ticket_number, formatted_code, status) \
             VALUES ($1, $2, $3, 'waiting') RETURNING {TICKET_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(category_id)
            .bind(ticket_number)
            .bind(&formatted_code)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ticket::try_from(row)
    }

    async fn get_ticket(&self, id: i64) -> Result<Ticket, QueueError> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM queues WHERE id = $1");
        sqlx::query_as::<_, TicketRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(QueueError::TicketNotFound(id))
            .and_then(Ticket::try_from)
    }

    async fn find_by_code(&self, code: &str) -> Result<Ticket, QueueError> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM queues \
             WHERE formatted_code = $1 AND created_on = (now() AT TIME ZONE 'UTC')::date \
             ORDER BY id ASC LIMIT 1"
        );
        sqlx::query_as::<_, TicketRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| QueueError::TicketCodeNotFound(code.to_string()))
            .and_then(Ticket::try_from)
    }

    async fn transition(
        &self,
        id: i64,
        to: TicketStatus,
        counter: Option<i32>,
    ) -> Result<Ticket, QueueError> {
        let sources: Vec<String> = to
            .allowed_sources()
            .iter()
            .map(|status| status.as_str().to_string())
            .collect();

        let sql = format!(
            "UPDATE queues \
             SET status = $2, counter_number = COALESCE($3, counter_number), updated_at = now() \
             WHERE id = $1 AND status = ANY($4) RETURNING {TICKET_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(id)
            .bind(to.as_str())
            .bind(counter)
            .bind(sources)
            .fetch_optional(&self.pool)
            .await?;
        if let Some(row) = updated {
            return Ticket::try_from(row);
        }

        // Nothing matched: tell a missing ticket apart from a refused move.
        let current: Option<String> = sqlx::query_scalar("SELECT status FROM queues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match current {
            None => Err(QueueError::TicketNotFound(id)),
            Some(status) => Err(QueueError::InvalidTransition {
                id,
                from: status.parse().map_err(QueueError::Internal)?,
                to,
            }),
        }
    }

    async fn claim_next_waiting(
        &self,
        category_id: i32,
        counter: i32,
    ) -> Result<Option<Ticket>, QueueError> {
        let sql = format!(
            "UPDATE queues SET status = 'calling', counter_number = $2, updated_at = now() \
             WHERE id = ( \
                 SELECT id FROM queues \
                 WHERE category_id = $1 AND status = 'waiting' \
                   AND created_on = (now() AT TIME ZONE 'UTC')::date \
                 ORDER BY id ASC LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) RETURNING {TICKET_COLUMNS}"
        );
        sqlx::query_as::<_, TicketRow>(&sql)
            .bind(category_id)
            .bind(counter)
            .fetch_optional(&self.pool)
            .await?
            .map(Ticket::try_from)
            .transpose()
    }

    async fn list_waiting(&self) -> Result<Vec<Ticket>, QueueError> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM queues \
             WHERE status = 'waiting' AND created_on = (now() AT TIME ZONE 'UTC')::date \
             ORDER BY category_id ASC, id ASC"
        );
        sqlx::query_as::<_, TicketRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Ticket::try_from)
            .collect()
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Ticket>, QueueError> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM queues ORDER BY id DESC LIMIT $1");
        sqlx::query_as::<_, TicketRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Ticket::try_from)
            .collect()
    }

    async fn stats(&self) -> Result<QueueStats, QueueError> {
        let (waiting, calling, serving, finished, skipped, total) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64)>(
                "SELECT \
                    COUNT(*) FILTER (WHERE status = 'waiting'), \
                    COUNT(*) FILTER (WHERE status = 'calling'), \
                    COUNT(*) FILTER (WHERE status = 'serving'), \
                    COUNT(*) FILTER (WHERE status = 'finished'), \
                    COUNT(*) FILTER (WHERE status = 'skipped'), \
                    COUNT(*) \
                 FROM queues WHERE created_on = (now() AT TIME ZONE 'UTC')::date",
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(QueueStats {
            waiting,
            calling,
            serving,
            finished,
            skipped,
            total,
        })
    }

    async fn reset_today(&self) -> Result<u64, QueueError> {
        let result =
            sqlx::query("DELETE FROM queues WHERE created_on = (now() AT TIME ZONE 'UTC')::date")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn categories(&self) -> Result<Vec<Category>, QueueError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, prefix, color_code FROM categories ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn display_settings(&self) -> Result<DisplaySettings, QueueError> {
        let row = sqlx::query_as::<_, DisplaySettingsRow>(
            "SELECT video_url, title, subtitle FROM display_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(DisplaySettings::from).unwrap_or_default())
    }

    async fn update_display_settings(&self, settings: &DisplaySettings) -> Result<(), QueueError> {
        sqlx::query(
            "INSERT INTO display_settings (id, video_url, title, subtitle, updated_at) \
             VALUES (1, $1, $2, $3, now()) \
             ON CONFLICT (id) DO UPDATE SET \
                video_url = EXCLUDED.video_url, \
                title = EXCLUDED.title, \
                subtitle = EXCLUDED.subtitle, \
                updated_at = EXCLUDED.updated_at",
        )
        .bind(&settings.video_url)
        .bind(&settings.title)
        .bind(&settings.subtitle)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
