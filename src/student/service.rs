use std::sync::{Arc, LazyLock};

use regex_lite::Regex;
use validator::Validate;

use crate::Repositories;
use crate::address::AddressRepository;
use crate::education::EducationRepository;
use crate::error::{Result, ServerError};
use crate::guardian::GuardianRepository;
use crate::health::HealthRepository;
use crate::model::{Page, sanitize, sanitize_opt};
use crate::parent::ParentRepository;
use crate::student::{
    NewStudent, Student, StudentChanges, StudentDetail, StudentQuery,
    StudentRepository,
};

static NISN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid NISN pattern"));

/// NISN is the 10-digit national student number.
pub fn is_valid_nisn(nisn: &str) -> bool {
    NISN.is_match(nisn)
}

/// Business rules around students.
#[derive(Clone)]
pub struct StudentService {
    students: Arc<dyn StudentRepository>,
    parents: Arc<dyn ParentRepository>,
    addresses: Arc<dyn AddressRepository>,
    guardians: Arc<dyn GuardianRepository>,
    health: Arc<dyn HealthRepository>,
    education: Arc<dyn EducationRepository>,
}

impl StudentService {
    /// Create a new [`StudentService`] reading the records attached to a
    /// student from `repositories`.
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            students: Arc::clone(&repositories.students),
            parents: Arc::clone(&repositories.parents),
            addresses: Arc::clone(&repositories.addresses),
            guardians: Arc::clone(&repositories.guardians),
            health: Arc::clone(&repositories.health),
            education: Arc::clone(&repositories.education),
        }
    }

    /// Find a student or fail with `404`.
    pub async fn find(&self, id: i64) -> Result<Student> {
        self.students
            .find_by_id(id)
            .await?
            .ok_or(ServerError::NotFound("student"))
    }

    pub async fn create(&self, mut student: NewStudent) -> Result<Student> {
        student.registration_number = sanitize(&student.registration_number);
        student.nisn = student.nisn.trim().to_owned();
        student.full_name = sanitize(&student.full_name);
        student.nickname = sanitize_opt(student.nickname.as_deref());
        student.birth_place = sanitize(&student.birth_place);
        student.religion = sanitize(&student.religion);
        student.nationality = sanitize(&student.nationality);
        student.home_language = sanitize(&student.home_language);
        // escaping may push text past its column size.
        student.validate()?;

        self.ensure_unique(&student.nisn, &student.registration_number, None)
            .await?;

        let student = self.students.insert(&student).await?;
        tracing::info!(student_id = student.id, "student created");

        Ok(student)
    }

    pub async fn list(&self, query: &StudentQuery) -> Result<Page<Student>> {
        let (students, total) = self.students.find_all(query).await?;
        Ok(Page::new(students, query.page, total))
    }

    /// Student with parents, address, guardian, health record and previous
    /// education.
    pub async fn detail(&self, id: i64) -> Result<StudentDetail> {
        let student = self.find(id).await?;

        let (parents, address, guardian, health, education) = tokio::try_join!(
            self.parents.find_by_student(id),
            self.addresses.find_by_student(id),
            self.guardians.find_by_student(id),
            self.health.find_by_student(id),
            self.education.find_by_student(id),
        )?;

        Ok(StudentDetail {
            student,
            parents,
            address,
            guardian,
            health,
            education,
        })
    }

    pub async fn update(&self, id: i64, changes: StudentChanges) -> Result<Student> {
        let mut student = self.find(id).await?;

        let changes = StudentChanges {
            registration_number: changes.registration_number.as_deref().map(sanitize),
            nisn: changes.nisn.map(|nisn| nisn.trim().to_owned()),
            full_name: changes.full_name.as_deref().map(sanitize),
            nickname: changes.nickname.as_deref().map(sanitize),
            birth_place: changes.birth_place.as_deref().map(sanitize),
            religion: changes.religion.as_deref().map(sanitize),
            nationality: changes.nationality.as_deref().map(sanitize),
            home_language: changes.home_language.as_deref().map(sanitize),
            ..changes
        };
        changes.validate()?;

        changes.apply(&mut student);
        self.ensure_unique(&student.nisn, &student.registration_number, Some(id))
            .await?;

        let student = self.students.update(&student).await?;
        tracing::info!(student_id = student.id, "student updated");

        Ok(student)
    }

    /// Soft delete a student.
    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.students.delete(id).await? {
            return Err(ServerError::NotFound("student"));
        }

        tracing::info!(student_id = id, "student deleted");
        Ok(())
    }

    async fn ensure_unique(
        &self,
        nisn: &str,
        registration_number: &str,
        except: Option<i64>,
    ) -> Result<()> {
        if !is_valid_nisn(nisn) {
            return Err(ServerError::BadRequest("NISN must be 10 digits".into()));
        }

        if self.students.nisn_taken(nisn, except).await? {
            return Err(ServerError::Conflict("NISN already exists".into()));
        }

        if self
            .students
            .registration_number_taken(registration_number, except)
            .await?
        {
            return Err(ServerError::Conflict(
                "registration number already exists".into(),
            ));
        }

        Ok(())
    }
}
