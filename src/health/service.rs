use std::sync::Arc;

use validator::Validate;

use crate::error::{Result, ServerError};
use crate::health::{HealthRecord, HealthRepository, Illness, NewHealthRecord, NewIllness};
use crate::student::StudentRepository;

/// Business rules around health records.
#[derive(Clone)]
pub struct HealthService {
    students: Arc<dyn StudentRepository>,
    records: Arc<dyn HealthRepository>,
}

impl HealthService {
    /// Create a new [`HealthService`].
    pub fn new(
        students: Arc<dyn StudentRepository>,
        records: Arc<dyn HealthRepository>,
    ) -> Self {
        Self { students, records }
    }

    /// Create the health record of a student or update the existing one.
    /// Illness history is kept across updates.
    pub async fn save(&self, student_id: i64, record: NewHealthRecord) -> Result<HealthRecord> {
        self.students.ensure_exists(student_id).await?;

        let record = record.sanitized();
        record.validate()?;

        let mut record = self.records.upsert(student_id, &record).await?;
        record.illnesses = self.records.illnesses(record.id).await?;
        tracing::info!(student_id, health_record_id = record.id, "health record saved");

        Ok(record)
    }

    pub async fn add_illness(&self, record_id: i64, illness: NewIllness) -> Result<Illness> {
        if !self.records.exists(record_id).await? {
            return Err(ServerError::NotFound("health record"));
        }

        let illness = illness.sanitized();
        illness.validate()?;

        let illness = self.records.insert_illness(record_id, &illness).await?;
        tracing::info!(health_record_id = record_id, illness_id = illness.id, "illness added");

        Ok(illness)
    }

    pub async fn delete_illness(&self, id: i64) -> Result<()> {
        if !self.records.delete_illness(id).await? {
            return Err(ServerError::NotFound("illness"));
        }

        tracing::info!(illness_id = id, "illness deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::{MemoryHealthRepository, MemoryStudentRepository, new_student};

    async fn setup() -> (HealthService, i64) {
        let students = Arc::new(MemoryStudentRepository::default());
        let student = students
            .insert(&new_student("2024001", "0051234567", "Budi"))
            .await
            .unwrap();

        let service = HealthService::new(students, Arc::new(MemoryHealthRepository::default()));
        (service, student.id)
    }

    #[tokio::test]
    async fn test_illnesses_survive_updates() {
        let (service, student_id) = setup().await;

        let record = service
            .save(student_id, NewHealthRecord {
                entry_weight: Some(50.5),
                blood_type: Some(" ab ".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(record.blood_type.as_deref(), Some("AB"));
        assert!(record.illnesses.is_empty());

        let illness = service
            .add_illness(record.id, NewIllness {
                name: "Demam berdarah".into(),
                year: Some(2020),
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = service
            .save(student_id, NewHealthRecord {
                exit_weight: Some(55.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.entry_weight, None);
        assert_eq!(updated.illnesses, vec![illness.clone()]);

        service.delete_illness(illness.id).await.unwrap();
        assert!(matches!(
            service.delete_illness(illness.id).await,
            Err(ServerError::NotFound("illness"))
        ));
    }

    #[tokio::test]
    async fn test_rejections() {
        let (service, student_id) = setup().await;

        assert!(matches!(
            service
                .save(student_id, NewHealthRecord {
                    blood_type: Some("C".into()),
                    ..Default::default()
                })
                .await,
            Err(ServerError::Validation(_))
        ));
        assert!(matches!(
            service
                .add_illness(42, NewIllness { name: "Flu".into(), ..Default::default() })
                .await,
            Err(ServerError::NotFound("health record"))
        ));

        let record = service.save(student_id, NewHealthRecord::default()).await.unwrap();
        assert!(matches!(
            service
                .add_illness(record.id, NewIllness { name: "  ".into(), ..Default::default() })
                .await,
            Err(ServerError::Validation(_))
        ));
    }
}
