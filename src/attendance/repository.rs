//! Handle database requests.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::attendance::{Attendance, NewAttendance};
use crate::error::Result;
use crate::model::PageRequest;

const COLUMNS: &str = "id, student_id, class, semester, present_days, sick_days, excused_days, \
    absent_days, effective_days, present_percentage";

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Insert the attendance of a semester, or replace the existing one.
    async fn upsert(&self, student_id: i64, attendance: &NewAttendance) -> Result<Attendance>;
    /// Attendance of a student by class then semester, with the total count.
    async fn find_by_student(
        &self,
        student_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<Attendance>, i64)>;
}

#[derive(Clone)]
pub struct PgAttendanceRepository {
    pool: PgPool,
}

impl PgAttendanceRepository {
    /// Create a new [`PgAttendanceRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceRepository for PgAttendanceRepository {
    async fn upsert(&self, student_id: i64, attendance: &NewAttendance) -> Result<Attendance> {
        let query = format!(
            r#"INSERT INTO attendance (student_id, class, semester, present_days, sick_days,
                excused_days, absent_days, effective_days, present_percentage)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (student_id, class, semester) DO UPDATE SET
                present_days = EXCLUDED.present_days, sick_days = EXCLUDED.sick_days,
                excused_days = EXCLUDED.excused_days, absent_days = EXCLUDED.absent_days,
                effective_days = EXCLUDED.effective_days,
                present_percentage = EXCLUDED.present_percentage
                RETURNING {COLUMNS}"#
        );

        Ok(sqlx::query_as::<_, Attendance>(&query)
            .bind(student_id)
            .bind(&attendance.class)
            .bind(attendance.semester)
            .bind(attendance.present_days)
            .bind(attendance.sick_days)
            .bind(attendance.excused_days)
            .bind(attendance.absent_days)
            .bind(attendance.effective_days)
            .bind(attendance.present_percentage())
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_student(
        &self,
        student_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<Attendance>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM attendance WHERE student_id = $1")
                .bind(student_id)
                .fetch_one(&self.pool)
                .await?;

        let query = format!(
            r#"SELECT {COLUMNS} FROM attendance WHERE student_id = $1
                ORDER BY CASE class WHEN 'X' THEN 1 WHEN 'XI' THEN 2 ELSE 3 END, semester
                LIMIT $2 OFFSET $3"#
        );
        let attendance = sqlx::query_as::<_, Attendance>(&query)
            .bind(student_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((attendance, total))
    }
}
