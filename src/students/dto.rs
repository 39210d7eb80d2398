use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::students::repo_types::Student;

/// Request body for onboarding a student.
#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub student_id: String,
    pub name: String,
    pub department: String,
    pub email: String,
}

/// Partial update of a student record.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub id: Uuid,
    pub student_id: String,
    pub name: String,
    pub department: String,
    pub email: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Student> for StudentResponse {
    fn from(s: Student) -> Self {
        Self {
            id: s.id,
            student_id: s.student_id,
            name: s.name,
            department: s.department,
            email: s.email,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteStudentResponse {
    pub deleted: bool,
}
