use std::sync::Arc;

use validator::Validate;

use crate::error::{Result, ServerError};
use crate::model::{sanitize, sanitize_opt};
use crate::parent::{NewParent, Parent, ParentChanges, ParentRepository};
use crate::student::StudentRepository;

/// Business rules around parents.
#[derive(Clone)]
pub struct ParentService {
    students: Arc<dyn StudentRepository>,
    parents: Arc<dyn ParentRepository>,
}

impl ParentService {
    /// Create a new [`ParentService`].
    pub fn new(
        students: Arc<dyn StudentRepository>,
        parents: Arc<dyn ParentRepository>,
    ) -> Self {
        Self { students, parents }
    }

    /// Attach a parent to an existing student.
    pub async fn create(&self, student_id: i64, mut parent: NewParent) -> Result<Parent> {
        self.students.ensure_exists(student_id).await?;

        parent.name = sanitize(&parent.name);
        parent.nationality = sanitize(&parent.nationality);
        parent.birth_place = sanitize_opt(parent.birth_place.as_deref());
        parent.last_education = sanitize_opt(parent.last_education.as_deref());
        parent.occupation = sanitize_opt(parent.occupation.as_deref());
        parent.address = sanitize_opt(parent.address.as_deref());
        parent.phone = sanitize_opt(parent.phone.as_deref());
        parent.validate()?;

        let parent = self.parents.insert(student_id, &parent).await?;
        tracing::info!(student_id, parent_id = parent.id, "parent created");

        Ok(parent)
    }

    pub async fn update(&self, id: i64, changes: ParentChanges) -> Result<Parent> {
        let mut parent = self
            .parents
            .find_by_id(id)
            .await?
            .ok_or(ServerError::NotFound("parent"))?;

        let changes = ParentChanges {
            name: changes.name.as_deref().map(sanitize),
            nationality: changes.nationality.as_deref().map(sanitize),
            birth_place: changes.birth_place.as_deref().map(sanitize),
            last_education: changes.last_education.as_deref().map(sanitize),
            occupation: changes.occupation.as_deref().map(sanitize),
            address: changes.address.as_deref().map(sanitize),
            phone: changes.phone.as_deref().map(sanitize),
            ..changes
        };
        changes.validate()?;
        changes.apply(&mut parent);

        self.parents.update(&parent).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.parents.delete(id).await? {
            return Err(ServerError::NotFound("parent"));
        }

        tracing::info!(parent_id = id, "parent deleted");
        Ok(())
    }
}
