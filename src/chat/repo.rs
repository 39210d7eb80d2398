use sqlx::PgPool;
use uuid::Uuid;

use crate::chat::repo_types::{ChatEntry, RecentChatUser};

const CHAT_COLUMNS: &str = "id, user_id, session_id, user_message, ai_response, created_at";

/// How many exchanges we keep per user. Older rows are pruned after insert.
pub const HISTORY_KEEP: i64 = 10;

pub async fn insert_entry(
    db: &PgPool,
    user_id: Uuid,
    session_id: Uuid,
    user_message: &str,
    ai_response: &str,
) -> sqlx::Result<ChatEntry> {
    sqlx::query_as::<_, ChatEntry>(&format!(
        r#"
        INSERT INTO chat_history (user_id, session_id, user_message, ai_response)
        VALUES ($1, $2, $3, $4)
        RETURNING {CHAT_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(session_id)
    .bind(user_message)
    .bind(ai_response)
    .fetch_one(db)
    .await
}

/// Delete everything past the `keep` newest rows for one user. Timestamp
/// ties break on id so the keep-set is deterministic. Returns how many rows
/// went away.
pub async fn prune_history(db: &PgPool, user_id: Uuid, keep: i64) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM chat_history
        WHERE user_id = $1
          AND id NOT IN (
              SELECT id FROM chat_history
              WHERE user_id = $1
              ORDER BY created_at DESC, id DESC
              LIMIT $2
          )
        "#,
    )
    .bind(user_id)
    .bind(keep)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn history_for_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> sqlx::Result<Vec<ChatEntry>> {
    sqlx::query_as::<_, ChatEntry>(&format!(
        r#"
        SELECT {CHAT_COLUMNS} FROM chat_history
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await
}

pub async fn count_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chat_history WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
}

pub async fn delete_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM chat_history WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn recent_users(db: &PgPool, limit: i64) -> sqlx::Result<Vec<RecentChatUser>> {
    sqlx::query_as::<_, RecentChatUser>(
        r#"
        SELECT user_id, MAX(created_at) AS last_chat, COUNT(*) AS total_chats
        FROM chat_history
        GROUP BY user_id
        ORDER BY last_chat DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await
}

pub async fn total_chats(db: &PgPool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chat_history")
        .fetch_one(db)
        .await
}

pub async fn total_users_with_chats(db: &PgPool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT user_id) FROM chat_history")
        .fetch_one(db)
        .await
}

pub async fn chats_last_7_days(db: &PgPool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM chat_history WHERE created_at >= now() - interval '7 days'",
    )
    .fetch_one(db)
    .await
}

// Retention behavior lives in SQL, so these tests need a running Postgres
// with migrations applied. Set DATABASE_URL and run `cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::User;
    use sqlx::postgres::PgPoolOptions;

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for db tests");
        PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to test database")
    }

    #[tokio::test]
    #[ignore]
    async fn prune_keeps_ten_newest_entries() {
        let db = test_pool().await;
        let suffix = Uuid::new_v4().simple().to_string();
        let user = User::create(
            &db,
            &format!("chat-{suffix}@example.com"),
            &format!("chat-{suffix}"),
            None,
            "$argon2id$v=19$m=19456,t=2,p=1$dGVzdA$dGVzdA",
        )
        .await
        .expect("create user");

        for i in 0..11 {
            insert_entry(
                &db,
                user.id,
                Uuid::new_v4(),
                &format!("question {i}"),
                "answer",
            )
            .await
            .expect("insert entry");
        }

        let pruned = prune_history(&db, user.id, HISTORY_KEEP)
            .await
            .expect("prune");
        assert_eq!(pruned, 1);
        assert_eq!(
            count_for_user(&db, user.id).await.expect("count"),
            HISTORY_KEEP
        );

        let entries = history_for_user(&db, user.id, HISTORY_KEEP)
            .await
            .expect("history");
        assert_eq!(entries.len(), HISTORY_KEEP as usize);
        assert!(entries.iter().any(|e| e.user_message == "question 10"));
        assert!(entries.iter().all(|e| e.user_message != "question 0"));

        // chat rows cascade with the user
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.id)
            .execute(&db)
            .await
            .expect("cleanup");
    }

    #[tokio::test]
    #[ignore]
    async fn prune_is_noop_under_the_cap() {
        let db = test_pool().await;
        let suffix = Uuid::new_v4().simple().to_string();
        let user = User::create(
            &db,
            &format!("cap-{suffix}@example.com"),
            &format!("cap-{suffix}"),
            None,
            "$argon2id$v=19$m=19456,t=2,p=1$dGVzdA$dGVzdA",
        )
        .await
        .expect("create user");

        for i in 0..3 {
            insert_entry(&db, user.id, Uuid::new_v4(), &format!("q {i}"), "a")
                .await
                .expect("insert entry");
        }

        let pruned = prune_history(&db, user.id, HISTORY_KEEP)
            .await
            .expect("prune");
        assert_eq!(pruned, 0);
        assert_eq!(count_for_user(&db, user.id).await.expect("count"), 3);

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.id)
            .execute(&db)
            .await
            .expect("cleanup");
    }
}
