use crate::models::{ClickEvent, ShortLink};
use crate::storage::{GroupCount, Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS urls (
                id TEXT PRIMARY KEY,
                original_url TEXT NOT NULL,
                short_code TEXT NOT NULL UNIQUE,
                created_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS clicks (
                id TEXT PRIMARY KEY,
                url_id TEXT NOT NULL REFERENCES urls(id),
                clicked_at BIGINT NOT NULL,
                ip_address TEXT NOT NULL DEFAULT '',
                user_agent TEXT NOT NULL DEFAULT '',
                referrer TEXT NOT NULL DEFAULT '',
                device_type TEXT NOT NULL DEFAULT '',
                location TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_clicks_url_clicked_at ON clicks(url_id, clicked_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn create_link(
        &self,
        id: &str,
        short_code: &str,
        original_url: &str,
        created_at: i64,
    ) -> StorageResult<ShortLink> {
        let result = sqlx::query(
            r#"
            INSERT INTO urls (id, original_url, short_code, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (short_code) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(original_url)
        .bind(short_code)
        .bind(created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        Ok(ShortLink {
            id: id.to_string(),
            original_url: original_url.to_string(),
            short_code: short_code.to_string(),
            created_at,
        })
    }

    async fn get_link(&self, short_code: &str) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, original_url, short_code, created_at
            FROM urls
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn exists(&self, short_code: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM urls WHERE short_code = $1")
            .bind(short_code)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count > 0)
    }

    async fn insert_click(&self, click: &ClickEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO clicks (id, url_id, clicked_at, ip_address, user_agent, referrer, device_type, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&click.id)
        .bind(&click.url_id)
        .bind(click.clicked_at)
        .bind(&click.ip_address)
        .bind(&click.user_agent)
        .bind(&click.referrer)
        .bind(&click.device_type)
        .bind(&click.location)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn count_clicks(&self, url_id: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clicks WHERE url_id = $1")
            .bind(url_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn top_user_agents(&self, url_id: &str, limit: i64) -> Result<Vec<GroupCount>> {
        let rows = sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT user_agent, COUNT(*) AS count
            FROM clicks
            WHERE url_id = $1 AND user_agent IS NOT NULL AND user_agent != ''
            GROUP BY user_agent
            ORDER BY count DESC, user_agent ASC
            LIMIT $2
            "#,
        )
        .bind(url_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn top_referrers(
        &self,
        url_id: &str,
        own_domain: &str,
        direct_label: &str,
        limit: i64,
    ) -> Result<Vec<GroupCount>> {
        let rows = sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT
                CASE
                    WHEN referrer IS NULL OR referrer = '' THEN $1
                    WHEN strpos(referrer, $2) > 0 THEN $3
                    ELSE referrer
                END AS source,
                COUNT(*) AS count
            FROM clicks
            WHERE url_id = $4
            GROUP BY source
            ORDER BY count DESC, source ASC
            LIMIT $5
            "#,
        )
        .bind(direct_label)
        .bind(own_domain)
        .bind(direct_label)
        .bind(url_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn top_ips(&self, url_id: &str, limit: i64) -> Result<Vec<GroupCount>> {
        let rows = sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT ip_address, COUNT(*) AS count
            FROM clicks
            WHERE url_id = $1 AND ip_address IS NOT NULL AND ip_address != ''
            GROUP BY ip_address
            ORDER BY count DESC, ip_address ASC
            LIMIT $2
            "#,
        )
        .bind(url_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn hourly_buckets(
        &self,
        url_id: &str,
        utc_offset_secs: i64,
        limit: i64,
    ) -> Result<Vec<(i64, i64)>> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT ((clicked_at + $1) / 3600) * 3600 - $2 AS bucket, COUNT(*) AS count
            FROM clicks
            WHERE url_id = $3
            GROUP BY bucket
            ORDER BY bucket DESC
            LIMIT $4
            "#,
        )
        .bind(utc_offset_secs)
        .bind(utc_offset_secs)
        .bind(url_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn device_type_counts(&self, url_id: &str) -> Result<Vec<GroupCount>> {
        let rows = sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT COALESCE(device_type, '') AS device, COUNT(*) AS count
            FROM clicks
            WHERE url_id = $1
            GROUP BY device
            ORDER BY count DESC
            "#,
        )
        .bind(url_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn blank_device_user_agents(&self, url_id: &str) -> Result<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            r#"
            SELECT COALESCE(user_agent, '')
            FROM clicks
            WHERE url_id = $1 AND (device_type IS NULL OR device_type = '')
            "#,
        )
        .bind(url_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn top_locations(
        &self,
        url_id: &str,
        unknown_label: &str,
        limit: i64,
    ) -> Result<Vec<GroupCount>> {
        let rows = sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT location, COUNT(*) AS count
            FROM clicks
            WHERE url_id = $1 AND location IS NOT NULL AND location != '' AND location != $2
            GROUP BY location
            ORDER BY count DESC, location ASC
            LIMIT $3
            "#,
        )
        .bind(url_id)
        .bind(unknown_label)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn user_agents(&self, url_id: &str) -> Result<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            r#"
            SELECT user_agent
            FROM clicks
            WHERE url_id = $1 AND user_agent IS NOT NULL AND user_agent != ''
            "#,
        )
        .bind(url_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn recent_clicks(&self, url_id: &str, limit: i64) -> Result<Vec<ClickEvent>> {
        let rows = sqlx::query_as::<_, ClickEvent>(
            r#"
            SELECT id, url_id, clicked_at,
                COALESCE(ip_address, '') AS ip_address,
                COALESCE(user_agent, '') AS user_agent,
                COALESCE(referrer, '') AS referrer,
                COALESCE(device_type, '') AS device_type,
                COALESCE(location, '') AS location
            FROM clicks
            WHERE url_id = $1
            ORDER BY clicked_at DESC
            LIMIT $2
            "#,
        )
        .bind(url_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }
}
