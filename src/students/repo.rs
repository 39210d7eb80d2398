use sqlx::PgPool;
use time::{Duration, OffsetDateTime};

use crate::students::repo_types::{DepartmentCount, Student};

const STUDENT_COLUMNS: &str = "id, student_id, name, department, email, created_at, updated_at";

impl Student {
    pub async fn find(db: &PgPool, student_id: &str) -> sqlx::Result<Option<Student>> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = $1"
        ))
        .bind(student_id)
        .fetch_optional(db)
        .await
    }

    pub async fn list(db: &PgPool) -> sqlx::Result<Vec<Student>> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        student_id: &str,
        name: &str,
        department: &str,
        email: &str,
    ) -> sqlx::Result<Student> {
        sqlx::query_as::<_, Student>(&format!(
            r#"
            INSERT INTO students (student_id, name, department, email)
            VALUES ($1, $2, $3, $4)
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(student_id)
        .bind(name)
        .bind(department)
        .bind(email)
        .fetch_one(db)
        .await
    }

    /// Partial update keyed by the campus identifier. Returns `None` when the
    /// student does not exist.
    pub async fn update(
        db: &PgPool,
        student_id: &str,
        name: Option<&str>,
        department: Option<&str>,
        email: Option<&str>,
    ) -> sqlx::Result<Option<Student>> {
        sqlx::query_as::<_, Student>(&format!(
            r#"
            UPDATE students SET
                name = COALESCE($2, name),
                department = COALESCE($3, department),
                email = COALESCE($4, email),
                updated_at = now()
            WHERE student_id = $1
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(student_id)
        .bind(name)
        .bind(department)
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, student_id: &str) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM students WHERE student_id = $1")
            .bind(student_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(db: &PgPool) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
            .fetch_one(db)
            .await
    }

    pub async fn count_by_department(db: &PgPool) -> sqlx::Result<Vec<DepartmentCount>> {
        sqlx::query_as::<_, DepartmentCount>(
            r#"
            SELECT department, COUNT(*) AS count
            FROM students
            GROUP BY department
            ORDER BY count DESC, department ASC
            "#,
        )
        .fetch_all(db)
        .await
    }

    pub async fn recent(db: &PgPool, limit: i64) -> sqlx::Result<Vec<Student>> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(db)
        .await
    }
}

/// Append one activity-log row. Best-effort metric feed, called after the
/// student write has already committed.
pub async fn log_activity(db: &PgPool, student_id: &str, activity: &str) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO activity_logs (student_id, activity) VALUES ($1, $2)")
        .bind(student_id)
        .bind(activity)
        .execute(db)
        .await?;
    Ok(())
}

/// Distinct students with any logged activity in the trailing window.
pub async fn active_students_since(db: &PgPool, window: Duration) -> sqlx::Result<i64> {
    let since = OffsetDateTime::now_utc() - window;
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT student_id) FROM activity_logs WHERE occurred_at >= $1",
    )
    .bind(since)
    .fetch_one(db)
    .await
}
