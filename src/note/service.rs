use std::sync::Arc;

use validator::Validate;

use crate::error::{Result, ServerError};
use crate::note::{Internship, NewInternship, NewSemesterNote, NoteRepository, SemesterNote};
use crate::student::StudentRepository;

/// Business rules around semester notes.
#[derive(Clone)]
pub struct NoteService {
    students: Arc<dyn StudentRepository>,
    notes: Arc<dyn NoteRepository>,
}

impl NoteService {
    /// Create a new [`NoteService`].
    pub fn new(students: Arc<dyn StudentRepository>, notes: Arc<dyn NoteRepository>) -> Self {
        Self { students, notes }
    }

    pub async fn create(&self, student_id: i64, note: NewSemesterNote) -> Result<SemesterNote> {
        self.students.ensure_exists(student_id).await?;
        note.validate()?;

        let note = self.notes.insert(student_id, &note).await?;
        tracing::info!(student_id, note_id = note.id, "semester note created");

        Ok(note)
    }

    pub async fn list(&self, student_id: i64) -> Result<Vec<SemesterNote>> {
        self.students.ensure_exists(student_id).await?;
        self.notes.find_by_student(student_id).await
    }

    pub async fn add_internship(
        &self,
        note_id: i64,
        internship: NewInternship,
    ) -> Result<Internship> {
        if self.notes.find_by_id(note_id).await?.is_none() {
            return Err(ServerError::NotFound("semester note"));
        }

        let internship = internship.sanitized();
        internship.validate()?;

        let internship = self.notes.insert_internship(note_id, &internship).await?;
        tracing::info!(note_id, internship_id = internship.id, "internship added");

        Ok(internship)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::{MemoryNoteRepository, MemoryStudentRepository, new_student};

    async fn setup() -> (NoteService, i64) {
        let students = Arc::new(MemoryStudentRepository::default());
        let student = students
            .insert(&new_student("2024001", "0051234567", "Budi"))
            .await
            .unwrap();

        let service = NoteService::new(students, Arc::new(MemoryNoteRepository::default()));
        (service, student.id)
    }

    fn note(class: &str, semester: i32) -> NewSemesterNote {
        NewSemesterNote {
            class: class.into(),
            semester,
        }
    }

    #[tokio::test]
    async fn test_notes_carry_internships() {
        let (service, student_id) = setup().await;

        service.create(student_id, note("XII", 1)).await.unwrap();
        let note = service.create(student_id, note("XI", 2)).await.unwrap();
        service
            .add_internship(note.id, NewInternship {
                company: "PT Pindad".into(),
                months: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();

        let notes = service.list(student_id).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].class, "XI");
        assert_eq!(notes[0].internships.len(), 1);
        assert_eq!(notes[0].internships[0].company, "PT Pindad");
        assert!(notes[1].internships.is_empty());
    }

    #[tokio::test]
    async fn test_rejections() {
        let (service, student_id) = setup().await;

        service.create(student_id, note("X", 1)).await.unwrap();
        assert!(matches!(
            service.create(student_id, note("X", 1)).await,
            Err(ServerError::Conflict(_))
        ));
        assert!(matches!(
            service.create(student_id, note("X", 3)).await,
            Err(ServerError::Validation(_))
        ));
        assert!(matches!(
            service
                .add_internship(99, NewInternship { company: "PT Pindad".into(), ..Default::default() })
                .await,
            Err(ServerError::NotFound("semester note"))
        ));
        assert!(matches!(
            service
                .add_internship(1, NewInternship {
                    company: "PT Pindad".into(),
                    months: Some(48),
                    ..Default::default()
                })
                .await,
            Err(ServerError::Validation(_))
        ));
    }
}
