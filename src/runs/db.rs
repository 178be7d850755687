use anyhow::Result;
use sqlx::PgConnection;

use crate::channels::types::ChannelRecord;

use super::types::ParsingRun;

pub async fn insert_run(conn: &mut PgConnection, category: &str, status: &str, total: i64) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO parsing_history
            (category, started_at, completed_at, status, total_channels, success_count, error_count)
        VALUES ($1, NOW(), NOW(), $2, $3, $3, 0)
        RETURNING id::BIGINT
        "#,
    )
    .bind(category)
    .bind(status)
    .bind(total)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

// Returns 0 when (link, parsing_id) already exists.
pub async fn insert_channel(conn: &mut PgConnection, parsing_id: i64, c: &ChannelRecord) -> Result<u64> {
    let res = sqlx::query(
        r#"
        INSERT INTO channels
            (parsing_id, name, link, description, admin, category, subcategory, subscribers)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (link, parsing_id) DO NOTHING
        "#,
    )
    .bind(parsing_id)
    .bind(&c.name)
    .bind(&c.link)
    .bind(&c.description)
    .bind(&c.admin)
    .bind(&c.category)
    .bind(&c.subcategory)
    .bind(c.subscribers)
    .execute(&mut *conn)
    .await?;
    Ok(res.rows_affected())
}

pub async fn recent_runs(conn: &mut PgConnection, limit: i64) -> Result<Vec<ParsingRun>> {
    let rows = sqlx::query_as::<_, ParsingRun>(
        r#"
        SELECT id::BIGINT                        AS id,
               category::text                    AS category,
               started_at::timestamptz           AS started_at,
               completed_at::timestamptz         AS completed_at,
               status::text                      AS status,
               COALESCE(total_channels, 0)::BIGINT AS total_channels,
               COALESCE(success_count, 0)::BIGINT  AS success_count,
               COALESCE(error_count, 0)::BIGINT    AS error_count
        FROM parsing_history
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}
