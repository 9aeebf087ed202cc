use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::sync::{BloomFilterSpec, FeedKind, RevisionTagStore};

use super::FeedPersistence;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, Serialize)]
pub struct StoredTagRow {
    pub feed: String,
    pub tag: String,
    pub updated_at: DateTime<Utc>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_tags(&self) -> Result<Vec<StoredTagRow>> {
        let rows = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            r#"
            SELECT feed, tag, updated_at
            FROM blocker.revision_tag
            ORDER BY feed
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let out = rows
            .into_iter()
            .map(|(feed, tag, updated_at)| StoredTagRow { feed, tag, updated_at })
            .collect();
        Ok(out)
    }
}

#[async_trait]
impl RevisionTagStore for PgStore {
    async fn tag(&self, kind: FeedKind) -> Result<Option<String>> {
        let tag = sqlx::query_scalar::<_, String>("SELECT tag FROM blocker.revision_tag WHERE feed = $1")
            .bind(kind.name())
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    async fn set_tag(&self, kind: FeedKind, tag: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blocker.revision_tag (feed, tag, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (feed)
            DO UPDATE SET tag = EXCLUDED.tag, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(kind.name())
        .bind(tag)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl FeedPersistence for PgStore {
    async fn blob(&self, kind: FeedKind) -> Result<Option<Bytes>> {
        let data = sqlx::query_scalar::<_, Vec<u8>>("SELECT data FROM blocker.feed_blob WHERE feed = $1")
            .bind(kind.name())
            .fetch_optional(&self.pool)
            .await?;
        Ok(data.map(Bytes::from))
    }

    async fn put_blob(&self, kind: FeedKind, data: &[u8]) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blocker.feed_blob (feed, data, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (feed)
            DO UPDATE SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(kind.name())
        .bind(data)
        .execute(&self.pool)
        .await
        .with_context(|| format!("persist {kind}"))?;
        Ok(())
    }

    async fn has_blob(&self, kind: FeedKind) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM blocker.feed_blob WHERE feed = $1 AND length(data) > 0)",
        )
        .bind(kind.name())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn https_whitelist(&self) -> Result<Vec<String>> {
        let hosts = sqlx::query_scalar::<_, String>("SELECT host FROM blocker.https_whitelist ORDER BY host")
            .fetch_all(&self.pool)
            .await?;
        Ok(hosts)
    }

    async fn put_https_whitelist(&self, hosts: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM blocker.https_whitelist")
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO blocker.https_whitelist (host)
            SELECT unnest($1::TEXT[])
            ON CONFLICT (host) DO NOTHING
            "#,
        )
        .bind(hosts.to_vec())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn bloom_filter(&self) -> Result<Option<(BloomFilterSpec, Bytes)>> {
        let row = sqlx::query_as::<_, (i64, f64, i64, String, Vec<u8>)>(
            r#"
            SELECT bit_count, error_rate, total_entries, sha256, data
            FROM blocker.bloom_filter
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(bit_count, error_rate, total_entries, sha256, data)| {
            (spec_from_row(bit_count, error_rate, total_entries, sha256), Bytes::from(data))
        }))
    }

    async fn bloom_filter_spec(&self) -> Result<Option<BloomFilterSpec>> {
        let row = sqlx::query_as::<_, (i64, f64, i64, String)>(
            "SELECT bit_count, error_rate, total_entries, sha256 FROM blocker.bloom_filter WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(bit_count, error_rate, total_entries, sha256)| {
            spec_from_row(bit_count, error_rate, total_entries, sha256)
        }))
    }

    async fn put_bloom_filter(&self, spec: &BloomFilterSpec, data: &[u8]) -> Result<()> {
        let bit_count = i64::try_from(spec.bit_count).context("bit count out of range")?;
        let total_entries = i64::try_from(spec.total_entries).context("total entries out of range")?;
        sqlx::query(
            r#"
            INSERT INTO blocker.bloom_filter (id, bit_count, error_rate, total_entries, sha256, data, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, now())
            ON CONFLICT (id)
            DO UPDATE SET bit_count = EXCLUDED.bit_count,
                          error_rate = EXCLUDED.error_rate,
                          total_entries = EXCLUDED.total_entries,
                          sha256 = EXCLUDED.sha256,
                          data = EXCLUDED.data,
                          updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(bit_count)
        .bind(spec.error_rate)
        .bind(total_entries)
        .bind(&spec.sha256)
        .bind(data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_legacy(&self, names: &[&str]) -> Result<u64> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let res = sqlx::query("DELETE FROM blocker.feed_blob WHERE feed = ANY($1::TEXT[])")
            .bind(names)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}

fn spec_from_row(bit_count: i64, error_rate: f64, total_entries: i64, sha256: String) -> BloomFilterSpec {
    BloomFilterSpec {
        bit_count: bit_count.max(0) as u64,
        error_rate,
        total_entries: total_entries.max(0) as u64,
        sha256,
    }
}
