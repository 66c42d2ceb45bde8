use std::sync::Arc;

use validator::Validate;

use crate::attendance::{Attendance, AttendanceRepository, NewAttendance};
use crate::error::{Result, ServerError};
use crate::model::{Page, PageRequest};
use crate::student::StudentRepository;

/// Business rules around attendance.
#[derive(Clone)]
pub struct AttendanceService {
    students: Arc<dyn StudentRepository>,
    attendance: Arc<dyn AttendanceRepository>,
}

impl AttendanceService {
    /// Create a new [`AttendanceService`].
    pub fn new(
        students: Arc<dyn StudentRepository>,
        attendance: Arc<dyn AttendanceRepository>,
    ) -> Self {
        Self {
            students,
            attendance,
        }
    }

    /// Record the attendance of a semester. Recording the same class and
    /// semester twice replaces the first one.
    pub async fn record(&self, student_id: i64, attendance: NewAttendance) -> Result<Attendance> {
        self.students.ensure_exists(student_id).await?;
        attendance.validate()?;

        if attendance.present_days > attendance.effective_days {
            return Err(ServerError::BadRequest(
                "present days cannot exceed effective days".into(),
            ));
        }

        let attendance = self.attendance.upsert(student_id, &attendance).await?;
        tracing::info!(
            student_id,
            class = %attendance.class,
            semester = attendance.semester,
            "attendance recorded"
        );

        Ok(attendance)
    }

    pub async fn list(&self, student_id: i64, page: PageRequest) -> Result<Page<Attendance>> {
        self.students.ensure_exists(student_id).await?;

        let (attendance, total) = self.attendance.find_by_student(student_id, page).await?;
        Ok(Page::new(attendance, page, total))
    }
}
