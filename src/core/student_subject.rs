//! Student enrollments in subjects.

use crate::{
    core::{delete_or_404, ensure_exists, ensure_exists_opt, find_or_404},
    entities::{AcademicYear, StudentProfile, StudentSubject, Subject, student_subject},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QueryTrait, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Body of an enrollment request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnrollment {
    /// Student profile id
    pub student_id: Uuid,
    /// Subject id
    pub subject_id: Uuid,
    /// Academic year of the enrollment
    #[serde(default)]
    pub academic_year_id: Option<Uuid>,
}

/// Body of an update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentChanges {
    /// New academic year
    pub academic_year_id: Option<Uuid>,
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubjectFilter {
    /// Only enrollments of this student
    pub student_id: Option<Uuid>,
    /// Only enrollments in this subject
    pub subject_id: Option<Uuid>,
}

/// Lists enrollments, oldest first.
pub async fn list_student_subjects(
    db: &DatabaseConnection,
    filter: &StudentSubjectFilter,
) -> Result<Vec<student_subject::Model>> {
    StudentSubject::find()
        .apply_if(filter.student_id, |q, v| {
            q.filter(student_subject::Column::StudentId.eq(v))
        })
        .apply_if(filter.subject_id, |q, v| {
            q.filter(student_subject::Column::SubjectId.eq(v))
        })
        .order_by_asc(student_subject::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one enrollment.
pub async fn get_student_subject(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<student_subject::Model> {
    find_or_404::<StudentSubject, _>(db, "student subject", id).await
}

/// Enrolls a student in a subject. A student is enrolled in a subject at
/// most once per academic year.
#[instrument(skip(db))]
pub async fn enroll_student(
    db: &DatabaseConnection,
    input: NewEnrollment,
) -> Result<student_subject::Model> {
    ensure_exists::<StudentProfile, _>(db, "student", input.student_id).await?;
    ensure_exists::<Subject, _>(db, "subject", input.subject_id).await?;
    ensure_exists_opt::<AcademicYear, _>(db, "academic year", input.academic_year_id).await?;

    let same_year = match input.academic_year_id {
        Some(year_id) => student_subject::Column::AcademicYearId.eq(year_id),
        None => student_subject::Column::AcademicYearId.is_null(),
    };
    let duplicate = StudentSubject::find()
        .filter(student_subject::Column::StudentId.eq(input.student_id))
        .filter(student_subject::Column::SubjectId.eq(input.subject_id))
        .filter(same_year)
        .one(db)
        .await?;
    if duplicate.is_some() {
        return Err(Error::Conflict {
            message: "Student is already enrolled in this subject".to_string(),
        });
    }

    let created = student_subject::ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(input.student_id),
        subject_id: Set(input.subject_id),
        academic_year_id: Set(input.academic_year_id),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await?;
    info!(enrollment_id = %created.id, "Student enrolled");
    Ok(created)
}

/// Moves an enrollment to another academic year.
#[instrument(skip(db))]
pub async fn update_student_subject(
    db: &DatabaseConnection,
    id: Uuid,
    changes: EnrollmentChanges,
) -> Result<student_subject::Model> {
    let mut enrollment: student_subject::ActiveModel = get_student_subject(db, id).await?.into();
    if let Some(year_id) = changes.academic_year_id {
        ensure_exists::<AcademicYear, _>(db, "academic year", year_id).await?;
        enrollment.academic_year_id = Set(Some(year_id));
    }
    enrollment.update(db).await.map_err(Into::into)
}

/// Deletes an enrollment.
#[instrument(skip(db))]
pub async fn delete_student_subject(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<StudentSubject, _>(db, "student subject", id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_enroll_and_filter() -> Result<()> {
        let db = setup_test_db().await?;
        let college = create_test_college(&db, "City Medical College").await?;
        let asha = create_test_student(&db, college.id, "Asha", "MBBS-001").await?;
        let ravi = create_test_student(&db, college.id, "Ravi", "MBBS-002").await?;
        let year = create_test_academic_year(&db, "2024-2025").await?;
        let phase = create_test_phase(&db, year.id, "Phase I").await?;
        let anatomy = create_test_subject(&db, phase.id, "ANAT101", "Anatomy").await?;

        for student in [&asha, &ravi] {
            enroll_student(
                &db,
                NewEnrollment {
                    student_id: student.id,
                    subject_id: anatomy.id,
                    academic_year_id: Some(year.id),
                },
            )
            .await?;
        }

        let for_asha = list_student_subjects(
            &db,
            &StudentSubjectFilter {
                student_id: Some(asha.id),
                subject_id: None,
            },
        )
        .await?;
        assert_eq!(for_asha.len(), 1);

        let for_subject = list_student_subjects(
            &db,
            &StudentSubjectFilter {
                student_id: None,
                subject_id: Some(anatomy.id),
            },
        )
        .await?;
        assert_eq!(for_subject.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_enrollment_conflicts() -> Result<()> {
        let db = setup_test_db().await?;
        let college = create_test_college(&db, "City Medical College").await?;
        let asha = create_test_student(&db, college.id, "Asha", "MBBS-001").await?;
        let year = create_test_academic_year(&db, "2024-2025").await?;
        let phase = create_test_phase(&db, year.id, "Phase I").await?;
        let anatomy = create_test_subject(&db, phase.id, "ANAT101", "Anatomy").await?;

        let input = NewEnrollment {
            student_id: asha.id,
            subject_id: anatomy.id,
            academic_year_id: None,
        };
        enroll_student(&db, input.clone()).await?;
        let again = enroll_student(&db, input).await;
        assert!(matches!(again.unwrap_err(), Error::Conflict { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_enroll_unknown_student() -> Result<()> {
        let db = setup_test_db().await?;
        let year = create_test_academic_year(&db, "2024-2025").await?;
        let phase = create_test_phase(&db, year.id, "Phase I").await?;
        let anatomy = create_test_subject(&db, phase.id, "ANAT101", "Anatomy").await?;

        let result = enroll_student(
            &db,
            NewEnrollment {
                student_id: Uuid::new_v4(),
                subject_id: anatomy.id,
                academic_year_id: None,
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
