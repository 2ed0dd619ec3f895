/*
 * Responsibility
 * - Queries against the `entries` table
 */
use sqlx::PgPool;

use crate::repos::error::RepoError;

pub async fn count(pool: &PgPool) -> Result<i64, RepoError> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM entries
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
