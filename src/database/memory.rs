//! In-memory repositories, MUST NEVER be used in production.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::Repositories;
use crate::address::{Address, AddressRepository, NewAddress};
use crate::attendance::{Attendance, AttendanceRepository, NewAttendance};
use crate::diploma::{DiplomaGrade, DiplomaRepository, NewDiplomaGrade};
use crate::education::{EducationRepository, NewEducation, PreviousEducation};
use crate::error::{Result, ServerError};
use crate::grade::{
    GradeFilter, GradeRepository, NewGrade, SemesterGrade, Subject,
};
use crate::guardian::{Guardian, GuardianRepository, NewGuardian};
use crate::health::{HealthRecord, HealthRepository, Illness, NewHealthRecord, NewIllness};
use crate::model::{PageRequest, SortDirection};
use crate::note::{Internship, NewInternship, NewSemesterNote, NoteRepository, SemesterNote};
use crate::parent::{NewParent, Parent, ParentRepository};
use crate::student::{
    DEFAULT_NATIONALITY, NewStudent, Student, StudentQuery, StudentRepository,
    StudentSort,
};
use crate::user::{NewUser, User, UserRepository};

impl Repositories {
    /// Empty repositories, subjects aside.
    pub fn memory() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::default()),
            students: Arc::new(MemoryStudentRepository::default()),
            parents: Arc::new(MemoryParentRepository::default()),
            grades: Arc::new(MemoryGradeRepository::default()),
            addresses: Arc::new(MemoryAddressRepository::default()),
            guardians: Arc::new(MemoryGuardianRepository::default()),
            health: Arc::new(MemoryHealthRepository::default()),
            education: Arc::new(MemoryEducationRepository::default()),
            attendance: Arc::new(MemoryAttendanceRepository::default()),
            diplomas: Arc::new(MemoryDiplomaRepository::default()),
            notes: Arc::new(MemoryNoteRepository::default()),
        }
    }
}

fn class_rank(class: &str) -> u8 {
    match class {
        "X" => 1,
        "XI" => 2,
        "XII" => 3,
        _ => u8::MAX,
    }
}

fn paginate<T>(items: Vec<T>, page: Option<PageRequest>) -> Vec<T> {
    match page {
        Some(page) => items
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect(),
        None => items,
    }
}

pub fn new_student(registration_number: &str, nisn: &str, name: &str) -> NewStudent {
    NewStudent {
        registration_number: registration_number.into(),
        nisn: nisn.into(),
        full_name: name.into(),
        nickname: None,
        gender: "L".into(),
        birth_place: "Bandung".into(),
        birth_date: NaiveDate::from_ymd_opt(2008, 5, 17).unwrap(),
        religion: "Islam".into(),
        child_order: 1,
        siblings: 2,
        nationality: DEFAULT_NATIONALITY.into(),
        home_language: DEFAULT_NATIONALITY.into(),
    }
}

pub fn new_parent(kind: &str, name: &str) -> NewParent {
    NewParent {
        kind: kind.into(),
        name: name.into(),
        birth_place: None,
        birth_date: None,
        nationality: DEFAULT_NATIONALITY.into(),
        last_education: Some("SMA".into()),
        occupation: Some("Petani".into()),
        monthly_income: Some(3_500_000.0),
        address: None,
        phone: None,
        alive: true,
    }
}

pub fn new_guardian(name: &str) -> NewGuardian {
    NewGuardian {
        name: name.into(),
        gender: "L".into(),
        birth_place: None,
        birth_date: None,
        nationality: DEFAULT_NATIONALITY.into(),
        last_education: None,
        occupation: Some("Wiraswasta".into()),
        monthly_income: None,
        address: None,
        phone: None,
        relationship: Some("Paman".into()),
    }
}

pub fn new_education(school_name: &str) -> NewEducation {
    NewEducation {
        kind: "new_student".into(),
        admitted_on: NaiveDate::from_ymd_opt(2024, 7, 15).unwrap(),
        school_name: school_name.into(),
        school_address: None,
        diploma_number: Some("DN-02/D-SMP/13/0123456".into()),
        diploma_date: NaiveDate::from_ymd_opt(2024, 6, 1),
        skhun_number: None,
        skhun_date: None,
        admitted_class: Some("X".into()),
        transfer_reason: None,
    }
}

/// Attendance over 100 effective days.
pub fn new_attendance(class: &str, semester: i32, present_days: i32) -> NewAttendance {
    NewAttendance {
        class: class.into(),
        semester,
        present_days,
        sick_days: 0,
        excused_days: 0,
        absent_days: 0,
        effective_days: 100,
    }
}

pub fn new_diploma_grade(subject_id: i64, final_score: f64) -> NewDiplomaGrade {
    NewDiplomaGrade {
        subject_id,
        final_score,
        graduation_year: Some("2027".into()),
        diploma_number: None,
        graduated_on: None,
    }
}

pub fn new_grade(subject_id: i64, class: &str, semester: i32) -> NewGrade {
    NewGrade {
        subject_id,
        class: class.into(),
        semester,
        academic_year: "2024/2025".into(),
        knowledge_score: 85,
        knowledge_grade: Some("B".into()),
        knowledge_description: None,
        skill_score: 90,
        skill_grade: Some("A".into()),
        skill_description: None,
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn deactivate(&self, id: i64) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|user| user.id == id) {
            user.is_active = false;
        }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|user| user.username == username).cloned())
    }

    async fn exists(&self, username: &str, email: &str) -> Result<bool> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .any(|user| user.username == username || user.email == email))
    }

    async fn insert(&self, user: &NewUser) -> Result<User> {
        let mut users = self.users.lock().unwrap();
        let now = Utc::now();
        let user = User {
            id: users.len() as i64 + 1,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        users.push(user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemoryStudentRepository {
    students: Mutex<Vec<Student>>,
}

fn duplicate(students: &[Student], candidate: &Student) -> bool {
    students.iter().any(|student| {
        student.id != candidate.id
            && student.deleted_at.is_none()
            && (student.nisn == candidate.nisn
                || student.registration_number == candidate.registration_number)
    })
}

#[async_trait]
impl StudentRepository for MemoryStudentRepository {
    async fn insert(&self, student: &NewStudent) -> Result<Student> {
        let mut students = self.students.lock().unwrap();
        let now = Utc::now();
        let student = Student {
            id: students.len() as i64 + 1,
            registration_number: student.registration_number.clone(),
            nisn: student.nisn.clone(),
            full_name: student.full_name.clone(),
            nickname: student.nickname.clone(),
            gender: student.gender.clone(),
            birth_place: student.birth_place.clone(),
            birth_date: student.birth_date,
            religion: student.religion.clone(),
            child_order: student.child_order,
            siblings: student.siblings,
            nationality: student.nationality.clone(),
            home_language: student.home_language.clone(),
            photo_path: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        if duplicate(&students, &student) {
            return Err(ServerError::Conflict(
                "NISN or registration number already exists".into(),
            ));
        }

        students.push(student.clone());
        Ok(student)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Student>> {
        let students = self.students.lock().unwrap();
        Ok(students
            .iter()
            .find(|student| student.id == id && student.deleted_at.is_none())
            .cloned())
    }

    async fn find_all(&self, query: &StudentQuery) -> Result<(Vec<Student>, i64)> {
        let students = self.students.lock().unwrap();
        let search = query.search.as_deref().map(str::to_lowercase);

        let mut found: Vec<Student> = students
            .iter()
            .filter(|student| student.deleted_at.is_none())
            .filter(|student| match &search {
                Some(search) => [
                    &student.full_name,
                    &student.nisn,
                    &student.registration_number,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(search.as_str())),
                None => true,
            })
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            let order = match query.sort_by {
                StudentSort::CreatedAt => a.created_at.cmp(&b.created_at),
                StudentSort::FullName => a.full_name.cmp(&b.full_name),
                StudentSort::Nisn => a.nisn.cmp(&b.nisn),
                StudentSort::RegistrationNumber => {
                    a.registration_number.cmp(&b.registration_number)
                },
                StudentSort::BirthDate => a.birth_date.cmp(&b.birth_date),
            }
            .then(a.id.cmp(&b.id));

            match query.sort_dir {
                SortDirection::Asc => order,
                SortDirection::Desc => order.reverse(),
            }
        });

        let total = found.len() as i64;
        Ok((paginate(found, Some(query.page)), total))
    }

    async fn update(&self, student: &Student) -> Result<Student> {
        let mut students = self.students.lock().unwrap();
        if duplicate(&students, student) {
            return Err(ServerError::Conflict(
                "NISN or registration number already exists".into(),
            ));
        }

        let stored = students
            .iter_mut()
            .find(|stored| stored.id == student.id && stored.deleted_at.is_none())
            .ok_or(ServerError::NotFound("student"))?;

        *stored = Student {
            updated_at: Utc::now(),
            ..student.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut students = self.students.lock().unwrap();
        match students
            .iter_mut()
            .find(|student| student.id == id && student.deleted_at.is_none())
        {
            Some(student) => {
                student.deleted_at = Some(Utc::now());
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn nisn_taken(&self, nisn: &str, except: Option<i64>) -> Result<bool> {
        let students = self.students.lock().unwrap();
        Ok(students.iter().any(|student| {
            student.deleted_at.is_none()
                && student.nisn == nisn
                && Some(student.id) != except
        }))
    }

    async fn registration_number_taken(
        &self,
        number: &str,
        except: Option<i64>,
    ) -> Result<bool> {
        let students = self.students.lock().unwrap();
        Ok(students.iter().any(|student| {
            student.deleted_at.is_none()
                && student.registration_number == number
                && Some(student.id) != except
        }))
    }
}

#[derive(Default)]
pub struct MemoryParentRepository {
    parents: Mutex<Vec<Parent>>,
}

#[async_trait]
impl ParentRepository for MemoryParentRepository {
    async fn insert(&self, student_id: i64, parent: &NewParent) -> Result<Parent> {
        let mut parents = self.parents.lock().unwrap();
        let parent = Parent {
            id: parents.iter().map(|parent| parent.id).max().unwrap_or(0) + 1,
            student_id,
            kind: parent.kind.clone(),
            name: parent.name.clone(),
            birth_place: parent.birth_place.clone(),
            birth_date: parent.birth_date,
            nationality: parent.nationality.clone(),
            last_education: parent.last_education.clone(),
            occupation: parent.occupation.clone(),
            monthly_income: parent.monthly_income,
            address: parent.address.clone(),
            phone: parent.phone.clone(),
            alive: parent.alive,
        };

        parents.push(parent.clone());
        Ok(parent)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Parent>> {
        let parents = self.parents.lock().unwrap();
        Ok(parents.iter().find(|parent| parent.id == id).cloned())
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Vec<Parent>> {
        let parents = self.parents.lock().unwrap();
        Ok(parents
            .iter()
            .filter(|parent| parent.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn update(&self, parent: &Parent) -> Result<Parent> {
        let mut parents = self.parents.lock().unwrap();
        let stored = parents
            .iter_mut()
            .find(|stored| stored.id == parent.id)
            .ok_or(ServerError::NotFound("parent"))?;

        *stored = parent.clone();
        Ok(parent.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut parents = self.parents.lock().unwrap();
        let before = parents.len();
        parents.retain(|parent| parent.id != id);

        Ok(parents.len() != before)
    }
}

pub struct MemoryGradeRepository {
    subjects: Vec<Subject>,
    grades: Mutex<Vec<SemesterGrade>>,
}

/// Seeded subjects, with inactive `C01`.
fn subjects() -> Vec<Subject> {
    let subject = |id: i64, code: &str, name: &str, group: &str, active: bool| Subject {
        id,
        code: code.into(),
        name: name.into(),
        group: group.into(),
        subgroup: None,
        active,
    };

    vec![
        subject(1, "A01", "Pendidikan Agama dan Budi Pekerti", "A", true),
        subject(2, "A03", "Bahasa Indonesia", "A", true),
        subject(3, "A02", "Pendidikan Pancasila", "A", true),
        subject(4, "C01", "Simulasi Digital", "C", false),
    ]
}

impl Default for MemoryGradeRepository {
    fn default() -> Self {
        Self {
            subjects: subjects(),
            grades: Mutex::new(Vec::new()),
        }
    }
}

impl MemoryGradeRepository {
    fn build(
        &self,
        grades: &[SemesterGrade],
        student_id: i64,
        grade: &NewGrade,
    ) -> Result<SemesterGrade> {
        let subject = self
            .subjects
            .iter()
            .find(|subject| subject.id == grade.subject_id)
            .ok_or(ServerError::NotFound("subject"))?;

        let duplicate = grades.iter().any(|stored| {
            stored.student_id == student_id
                && stored.subject_id == grade.subject_id
                && stored.class == grade.class
                && stored.semester == grade.semester
                && stored.academic_year == grade.academic_year
        });
        if duplicate {
            return Err(ServerError::Conflict(
                "grade already exists for this subject and semester".into(),
            ));
        }

        Ok(SemesterGrade {
            id: grades.len() as i64 + 1,
            student_id,
            subject_id: subject.id,
            subject_code: subject.code.clone(),
            subject_name: subject.name.clone(),
            class: grade.class.clone(),
            semester: grade.semester,
            academic_year: grade.academic_year.clone(),
            knowledge_score: grade.knowledge_score,
            knowledge_grade: grade.knowledge_grade.clone(),
            knowledge_description: grade.knowledge_description.clone(),
            skill_score: grade.skill_score,
            skill_grade: grade.skill_grade.clone(),
            skill_description: grade.skill_description.clone(),
        })
    }
}

#[async_trait]
impl GradeRepository for MemoryGradeRepository {
    async fn subjects(&self) -> Result<Vec<Subject>> {
        let mut subjects: Vec<Subject> = self
            .subjects
            .iter()
            .filter(|subject| subject.active)
            .cloned()
            .collect();
        subjects.sort_by(|a, b| a.code.cmp(&b.code));

        Ok(subjects)
    }

    async fn find_subject(&self, id: i64) -> Result<Option<Subject>> {
        Ok(self.subjects.iter().find(|subject| subject.id == id).cloned())
    }

    async fn insert(&self, student_id: i64, grade: &NewGrade) -> Result<SemesterGrade> {
        let mut grades = self.grades.lock().unwrap();
        let grade = self.build(&grades, student_id, grade)?;

        grades.push(grade.clone());
        Ok(grade)
    }

    async fn insert_batch(&self, student_id: i64, batch: &[NewGrade]) -> Result<()> {
        let mut grades = self.grades.lock().unwrap();
        // Work on a copy to keep the batch atomic.
        let mut staged = grades.clone();

        for grade in batch {
            let grade = self.build(&staged, student_id, grade)?;
            staged.push(grade);
        }

        *grades = staged;
        Ok(())
    }

    async fn find_by_student(
        &self,
        student_id: i64,
        filter: &GradeFilter,
        page: Option<PageRequest>,
    ) -> Result<(Vec<SemesterGrade>, i64)> {
        let grades = self.grades.lock().unwrap();
        let mut found: Vec<SemesterGrade> = grades
            .iter()
            .filter(|grade| grade.student_id == student_id)
            .filter(|grade| filter.class.as_ref().is_none_or(|class| &grade.class == class))
            .filter(|grade| filter.semester.is_none_or(|semester| grade.semester == semester))
            .filter(|grade| {
                filter
                    .academic_year
                    .as_ref()
                    .is_none_or(|year| &grade.academic_year == year)
            })
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            class_rank(&a.class)
                .cmp(&class_rank(&b.class))
                .then(a.semester.cmp(&b.semester))
                .then(a.subject_code.cmp(&b.subject_code))
                .then(a.id.cmp(&b.id))
        });

        let total = found.len() as i64;
        Ok((paginate(found, page), total))
    }
}

fn next_id<T>(items: &[T], id: impl Fn(&T) -> i64) -> i64 {
    items.iter().map(id).max().unwrap_or(0) + 1
}

#[derive(Default)]
pub struct MemoryAddressRepository {
    addresses: Mutex<Vec<Address>>,
}

#[async_trait]
impl AddressRepository for MemoryAddressRepository {
    async fn upsert(&self, student_id: i64, address: &NewAddress) -> Result<Address> {
        let mut addresses = self.addresses.lock().unwrap();
        let id = match addresses.iter().find(|stored| stored.student_id == student_id) {
            Some(stored) => stored.id,
            None => next_id(&addresses, |address| address.id),
        };
        let address = Address {
            id,
            student_id,
            street: address.street.clone(),
            village: address.village.clone(),
            district: address.district.clone(),
            city: address.city.clone(),
            province: address.province.clone(),
            postal_code: address.postal_code.clone(),
            phone: address.phone.clone(),
            lives_with: address.lives_with.clone(),
            distance_km: address.distance_km,
            transport: address.transport.clone(),
        };

        addresses.retain(|stored| stored.student_id != student_id);
        addresses.push(address.clone());
        Ok(address)
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Option<Address>> {
        let addresses = self.addresses.lock().unwrap();
        Ok(addresses
            .iter()
            .find(|address| address.student_id == student_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryGuardianRepository {
    guardians: Mutex<Vec<Guardian>>,
}

#[async_trait]
impl GuardianRepository for MemoryGuardianRepository {
    async fn upsert(&self, student_id: i64, guardian: &NewGuardian) -> Result<Guardian> {
        let mut guardians = self.guardians.lock().unwrap();
        let id = match guardians.iter().find(|stored| stored.student_id == student_id) {
            Some(stored) => stored.id,
            None => next_id(&guardians, |guardian| guardian.id),
        };
        let guardian = Guardian {
            id,
            student_id,
            name: guardian.name.clone(),
            gender: guardian.gender.clone(),
            birth_place: guardian.birth_place.clone(),
            birth_date: guardian.birth_date,
            nationality: guardian.nationality.clone(),
            last_education: guardian.last_education.clone(),
            occupation: guardian.occupation.clone(),
            monthly_income: guardian.monthly_income,
            address: guardian.address.clone(),
            phone: guardian.phone.clone(),
            relationship: guardian.relationship.clone(),
        };

        guardians.retain(|stored| stored.student_id != student_id);
        guardians.push(guardian.clone());
        Ok(guardian)
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Option<Guardian>> {
        let guardians = self.guardians.lock().unwrap();
        Ok(guardians
            .iter()
            .find(|guardian| guardian.student_id == student_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryHealthRepository {
    records: Mutex<Vec<HealthRecord>>,
    illnesses: Mutex<Vec<Illness>>,
}

#[async_trait]
impl HealthRepository for MemoryHealthRepository {
    async fn upsert(&self, student_id: i64, record: &NewHealthRecord) -> Result<HealthRecord> {
        let mut records = self.records.lock().unwrap();
        let id = match records.iter().find(|stored| stored.student_id == student_id) {
            Some(stored) => stored.id,
            None => next_id(&records, |record| record.id),
        };
        let record = HealthRecord {
            id,
            student_id,
            entry_weight: record.entry_weight,
            entry_height: record.entry_height,
            exit_weight: record.exit_weight,
            exit_height: record.exit_height,
            blood_type: record.blood_type.clone(),
            physical_fitness: record.physical_fitness.clone(),
            illnesses: Vec::new(),
        };

        records.retain(|stored| stored.student_id != student_id);
        records.push(record.clone());
        Ok(record)
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Option<HealthRecord>> {
        let record = {
            let records = self.records.lock().unwrap();
            records
                .iter()
                .find(|record| record.student_id == student_id)
                .cloned()
        };

        match record {
            Some(mut record) => {
                record.illnesses = self.illnesses(record.id).await?;
                Ok(Some(record))
            },
            None => Ok(None),
        }
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().any(|record| record.id == id))
    }

    async fn illnesses(&self, record_id: i64) -> Result<Vec<Illness>> {
        let illnesses = self.illnesses.lock().unwrap();
        let mut found: Vec<Illness> = illnesses
            .iter()
            .filter(|illness| illness.health_record_id == record_id)
            .cloned()
            .collect();
        found.sort_by_key(|illness| (illness.year.is_none(), illness.year, illness.id));

        Ok(found)
    }

    async fn insert_illness(&self, record_id: i64, illness: &NewIllness) -> Result<Illness> {
        let mut illnesses = self.illnesses.lock().unwrap();
        let illness = Illness {
            id: next_id(&illnesses, |illness| illness.id),
            health_record_id: record_id,
            name: illness.name.clone(),
            year: illness.year,
            duration: illness.duration.clone(),
            notes: illness.notes.clone(),
        };

        illnesses.push(illness.clone());
        Ok(illness)
    }

    async fn delete_illness(&self, id: i64) -> Result<bool> {
        let mut illnesses = self.illnesses.lock().unwrap();
        let before = illnesses.len();
        illnesses.retain(|illness| illness.id != id);

        Ok(illnesses.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryEducationRepository {
    educations: Mutex<Vec<PreviousEducation>>,
}

#[async_trait]
impl EducationRepository for MemoryEducationRepository {
    async fn insert(&self, student_id: i64, education: &NewEducation) -> Result<PreviousEducation> {
        let mut educations = self.educations.lock().unwrap();
        let education = PreviousEducation {
            id: next_id(&educations, |education| education.id),
            student_id,
            kind: education.kind.clone(),
            admitted_on: education.admitted_on,
            school_name: education.school_name.clone(),
            school_address: education.school_address.clone(),
            diploma_number: education.diploma_number.clone(),
            diploma_date: education.diploma_date,
            skhun_number: education.skhun_number.clone(),
            skhun_date: education.skhun_date,
            admitted_class: education.admitted_class.clone(),
            transfer_reason: education.transfer_reason.clone(),
        };

        educations.push(education.clone());
        Ok(education)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PreviousEducation>> {
        let educations = self.educations.lock().unwrap();
        Ok(educations.iter().find(|education| education.id == id).cloned())
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Vec<PreviousEducation>> {
        let educations = self.educations.lock().unwrap();
        let mut found: Vec<PreviousEducation> = educations
            .iter()
            .filter(|education| education.student_id == student_id)
            .cloned()
            .collect();
        found.sort_by_key(|education| (education.admitted_on, education.id));

        Ok(found)
    }

    async fn update(&self, education: &PreviousEducation) -> Result<PreviousEducation> {
        let mut educations = self.educations.lock().unwrap();
        let stored = educations
            .iter_mut()
            .find(|stored| stored.id == education.id)
            .ok_or(ServerError::NotFound("education"))?;

        *stored = education.clone();
        Ok(education.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut educations = self.educations.lock().unwrap();
        let before = educations.len();
        educations.retain(|education| education.id != id);

        Ok(educations.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryAttendanceRepository {
    attendance: Mutex<Vec<Attendance>>,
}

#[async_trait]
impl AttendanceRepository for MemoryAttendanceRepository {
    async fn upsert(&self, student_id: i64, attendance: &NewAttendance) -> Result<Attendance> {
        let mut stored = self.attendance.lock().unwrap();
        let same_semester = |item: &Attendance| {
            item.student_id == student_id
                && item.class == attendance.class
                && item.semester == attendance.semester
        };
        let id = match stored.iter().find(|item| same_semester(*item)) {
            Some(item) => item.id,
            None => next_id(&stored, |item| item.id),
        };
        let attendance = Attendance {
            id,
            student_id,
            class: attendance.class.clone(),
            semester: attendance.semester,
            present_days: attendance.present_days,
            sick_days: attendance.sick_days,
            excused_days: attendance.excused_days,
            absent_days: attendance.absent_days,
            effective_days: attendance.effective_days,
            present_percentage: attendance.present_percentage(),
        };

        stored.retain(|item| !same_semester(item));
        stored.push(attendance.clone());
        Ok(attendance)
    }

    async fn find_by_student(
        &self,
        student_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<Attendance>, i64)> {
        let stored = self.attendance.lock().unwrap();
        let mut found: Vec<Attendance> = stored
            .iter()
            .filter(|item| item.student_id == student_id)
            .cloned()
            .collect();
        found.sort_by_key(|item| (class_rank(&item.class), item.semester));

        let total = found.len() as i64;
        Ok((paginate(found, Some(page)), total))
    }
}

pub struct MemoryDiplomaRepository {
    subjects: Vec<Subject>,
    grades: Mutex<Vec<DiplomaGrade>>,
}

impl Default for MemoryDiplomaRepository {
    fn default() -> Self {
        Self {
            subjects: subjects(),
            grades: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DiplomaRepository for MemoryDiplomaRepository {
    async fn insert(&self, student_id: i64, grade: &NewDiplomaGrade) -> Result<DiplomaGrade> {
        let mut grades = self.grades.lock().unwrap();
        let subject = self
            .subjects
            .iter()
            .find(|subject| subject.id == grade.subject_id)
            .ok_or(ServerError::NotFound("subject"))?;

        if grades
            .iter()
            .any(|stored| stored.student_id == student_id && stored.subject_id == subject.id)
        {
            return Err(ServerError::Conflict(
                "diploma grade already exists for this subject".into(),
            ));
        }

        let grade = DiplomaGrade {
            id: next_id(&grades, |grade| grade.id),
            student_id,
            subject_id: subject.id,
            subject_code: subject.code.clone(),
            subject_name: subject.name.clone(),
            final_score: grade.final_score,
            graduation_year: grade.graduation_year.clone(),
            diploma_number: grade.diploma_number.clone(),
            graduated_on: grade.graduated_on,
        };

        grades.push(grade.clone());
        Ok(grade)
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Vec<DiplomaGrade>> {
        let grades = self.grades.lock().unwrap();
        let mut found: Vec<DiplomaGrade> = grades
            .iter()
            .filter(|grade| grade.student_id == student_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.subject_code.cmp(&b.subject_code).then(a.id.cmp(&b.id)));

        Ok(found)
    }
}

#[derive(Default)]
pub struct MemoryNoteRepository {
    notes: Mutex<Vec<SemesterNote>>,
}

#[async_trait]
impl NoteRepository for MemoryNoteRepository {
    async fn insert(&self, student_id: i64, note: &NewSemesterNote) -> Result<SemesterNote> {
        let mut notes = self.notes.lock().unwrap();
        if notes.iter().any(|stored| {
            stored.student_id == student_id
                && stored.class == note.class
                && stored.semester == note.semester
        }) {
            return Err(ServerError::Conflict("semester note already exists".into()));
        }

        let note = SemesterNote {
            id: next_id(&notes, |note| note.id),
            student_id,
            class: note.class.clone(),
            semester: note.semester,
            internships: Vec::new(),
        };

        notes.push(note.clone());
        Ok(note)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<SemesterNote>> {
        let notes = self.notes.lock().unwrap();
        Ok(notes
            .iter()
            .find(|note| note.id == id)
            .map(|note| SemesterNote {
                internships: Vec::new(),
                ..note.clone()
            }))
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Vec<SemesterNote>> {
        let notes = self.notes.lock().unwrap();
        let mut found: Vec<SemesterNote> = notes
            .iter()
            .filter(|note| note.student_id == student_id)
            .cloned()
            .collect();
        found.sort_by_key(|note| (class_rank(&note.class), note.semester));

        Ok(found)
    }

    async fn insert_internship(
        &self,
        note_id: i64,
        internship: &NewInternship,
    ) -> Result<Internship> {
        let mut notes = self.notes.lock().unwrap();
        let id = next_id(
            &notes
                .iter()
                .flat_map(|note| note.internships.iter())
                .collect::<Vec<_>>(),
            |internship| internship.id,
        );
        let note = notes
            .iter_mut()
            .find(|note| note.id == note_id)
            .ok_or(ServerError::NotFound("semester note"))?;

        let internship = Internship {
            id,
            note_id,
            company: internship.company.clone(),
            location: internship.location.clone(),
            months: internship.months,
            description: internship.description.clone(),
        };

        note.internships.push(internship.clone());
        Ok(internship)
    }
}
