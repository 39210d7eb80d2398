use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

const USER_COLUMNS: &str =
    "id, email, username, full_name, password_hash, is_active, is_admin, created_at, updated_at";

impl User {
    pub async fn find_by_username(db: &PgPool, username: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn list_all(db: &PgPool) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await
    }

    /// Insert a new user with a pre-hashed password.
    pub async fn create(
        db: &PgPool,
        email: &str,
        username: &str,
        full_name: Option<&str>,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, full_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(username)
        .bind(full_name)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    /// Partial update. `None` fields keep their current value; `updated_at`
    /// always bumps. Returns `None` when the user does not exist.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        email: Option<&str>,
        username: Option<&str>,
        full_name: Option<&str>,
        password_hash: Option<&str>,
        is_active: Option<bool>,
        is_admin: Option<bool>,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                username = COALESCE($3, username),
                full_name = COALESCE($4, full_name),
                password_hash = COALESCE($5, password_hash),
                is_active = COALESCE($6, is_active),
                is_admin = COALESCE($7, is_admin),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(email)
        .bind(username)
        .bind(full_name)
        .bind(password_hash)
        .bind(is_active)
        .bind(is_admin)
        .fetch_optional(db)
        .await
    }
}

// Uniqueness is enforced by the users table constraints; exercising the 409
// mapping needs a running Postgres with migrations applied. Set DATABASE_URL
// and run `cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use sqlx::postgres::PgPoolOptions;

    const TEST_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$dGVzdA$dGVzdA";

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
    async fn duplicate_email_and_username_map_to_conflict() {
        let db = test_pool().await;
        let suffix = Uuid::new_v4().simple().to_string();
        let email = format!("dup-{suffix}@example.com");
        let username = format!("dup-{suffix}");

        let first = User::create(&db, &email, &username, None, TEST_HASH)
            .await
            .expect("first create");

        let err = User::create(&db, &email, &format!("other-{suffix}"), None, TEST_HASH)
            .await
            .unwrap_err();
        match AppError::from(err) {
            AppError::Conflict(msg) => assert!(msg.contains("Email")),
            other => panic!("expected conflict, got {other:?}"),
        }

        let err = User::create(
            &db,
            &format!("other-{suffix}@example.com"),
            &username,
            None,
            TEST_HASH,
        )
        .await
        .unwrap_err();
        match AppError::from(err) {
            AppError::Conflict(msg) => assert!(msg.contains("Username")),
            other => panic!("expected conflict, got {other:?}"),
        }

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(first.id)
            .execute(&db)
            .await
            .expect("cleanup");
    }
}
