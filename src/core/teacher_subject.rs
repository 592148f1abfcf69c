//! Teacher-subject assignments.
//!
//! Assignments are written as a set: posting the subjects for a (teacher,
//! academic year, phase) tuple replaces whatever that tuple held before.
//! The delete and the inserts run in one transaction.

use crate::{
    core::{delete_or_404, ensure_exists, find_or_404},
    entities::{AcademicYear, Phase, Subject, TeacherProfile, TeacherSubject, teacher_subject},
    errors::Result,
};
use sea_orm::{QueryOrder, QueryTrait, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, instrument};

/// Replace-set request for one (teacher, academic year, phase) tuple.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAssignment {
    /// Teacher profile id
    pub teacher_id: Uuid,
    /// Academic year of the assignment
    pub academic_year_id: Uuid,
    /// Phase of the assignment
    pub phase_id: Uuid,
    /// Complete list of subjects; duplicates collapse, empty clears the tuple
    pub subject_ids: Vec<Uuid>,
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSubjectFilter {
    /// Only rows of this teacher
    pub teacher_id: Option<Uuid>,
    /// Only rows of this subject
    pub subject_id: Option<Uuid>,
    /// Only rows of this academic year
    pub academic_year_id: Option<Uuid>,
    /// Only rows of this phase
    pub phase_id: Option<Uuid>,
}

/// Lists assignments, oldest first.
pub async fn list_teacher_subjects(
    db: &DatabaseConnection,
    filter: &TeacherSubjectFilter,
) -> Result<Vec<teacher_subject::Model>> {
    TeacherSubject::find()
        .apply_if(filter.teacher_id, |q, v| {
            q.filter(teacher_subject::Column::TeacherId.eq(v))
        })
        .apply_if(filter.subject_id, |q, v| {
            q.filter(teacher_subject::Column::SubjectId.eq(v))
        })
        .apply_if(filter.academic_year_id, |q, v| {
            q.filter(teacher_subject::Column::AcademicYearId.eq(v))
        })
        .apply_if(filter.phase_id, |q, v| {
            q.filter(teacher_subject::Column::PhaseId.eq(v))
        })
        .order_by_asc(teacher_subject::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one assignment row.
pub async fn get_teacher_subject(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<teacher_subject::Model> {
    find_or_404::<TeacherSubject, _>(db, "teacher subject", id).await
}

/// Replaces the subject set of a (teacher, academic year, phase) tuple.
///
/// Rows of other tuples, including other phases of the same teacher, are
/// untouched. Returns the new rows in request order.
#[instrument(skip(db))]
pub async fn assign_subjects(
    db: &DatabaseConnection,
    input: SubjectAssignment,
) -> Result<Vec<teacher_subject::Model>> {
    let mut seen = HashSet::new();
    let subject_ids: Vec<Uuid> = input
        .subject_ids
        .into_iter()
        .filter(|id| seen.insert(*id))
        .collect();

    let txn = db.begin().await?;
    ensure_exists::<TeacherProfile, _>(&txn, "teacher", input.teacher_id).await?;
    ensure_exists::<AcademicYear, _>(&txn, "academic year", input.academic_year_id).await?;
    ensure_exists::<Phase, _>(&txn, "phase", input.phase_id).await?;
    for subject_id in &subject_ids {
        ensure_exists::<Subject, _>(&txn, "subject", *subject_id).await?;
    }

    let removed = TeacherSubject::delete_many()
        .filter(teacher_subject::Column::TeacherId.eq(input.teacher_id))
        .filter(teacher_subject::Column::AcademicYearId.eq(input.academic_year_id))
        .filter(teacher_subject::Column::PhaseId.eq(input.phase_id))
        .exec(&txn)
        .await?;

    let now = chrono::Utc::now();
    let mut created = Vec::with_capacity(subject_ids.len());
    for subject_id in subject_ids {
        let row = teacher_subject::ActiveModel {
            id: Set(Uuid::new_v4()),
            teacher_id: Set(input.teacher_id),
            subject_id: Set(subject_id),
            academic_year_id: Set(input.academic_year_id),
            phase_id: Set(input.phase_id),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;
        created.push(row);
    }
    txn.commit().await?;

    info!(
        teacher_id = %input.teacher_id,
        removed = removed.rows_affected,
        assigned = created.len(),
        "Teacher subjects replaced"
    );
    Ok(created)
}

/// Deletes one assignment row.
#[instrument(skip(db))]
pub async fn delete_teacher_subject(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<TeacherSubject, _>(db, "teacher subject", id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{errors::Error, test_utils::*};

    struct Fixture {
        teacher: Uuid,
        year: Uuid,
        phase_one: Uuid,
        phase_two: Uuid,
        subjects: Vec<Uuid>,
    }

    async fn fixture(db: &DatabaseConnection) -> Result<Fixture> {
        let college = create_test_college(db, "City Medical College").await?;
        let teacher = create_test_teacher(db, college.id, "Lakshmi", "EMP-001").await?;
        let year = create_test_academic_year(db, "2024-2025").await?;
        let phase_one = create_test_phase(db, year.id, "Phase I").await?;
        let phase_two = create_test_phase(db, year.id, "Phase II").await?;
        let mut subjects = Vec::new();
        for code in ["ANAT101", "PHYS101", "BIOC101"] {
            subjects.push(create_test_subject(db, phase_one.id, code, code).await?.id);
        }
        Ok(Fixture {
            teacher: teacher.id,
            year: year.id,
            phase_one: phase_one.id,
            phase_two: phase_two.id,
            subjects,
        })
    }

    fn request(f: &Fixture, phase_id: Uuid, subject_ids: Vec<Uuid>) -> SubjectAssignment {
        SubjectAssignment {
            teacher_id: f.teacher,
            academic_year_id: f.year,
            phase_id,
            subject_ids,
        }
    }

    fn subjects_of(rows: &[teacher_subject::Model], phase_id: Uuid) -> HashSet<Uuid> {
        rows.iter()
            .filter(|r| r.phase_id == phase_id)
            .map(|r| r.subject_id)
            .collect()
    }

    #[tokio::test]
    async fn test_reassignment_replaces_tuple_only() -> Result<()> {
        let db = setup_test_db().await?;
        let f = fixture(&db).await?;
        let (s1, s2, s3) = (f.subjects[0], f.subjects[1], f.subjects[2]);

        assign_subjects(&db, request(&f, f.phase_one, vec![s1, s2])).await?;
        assign_subjects(&db, request(&f, f.phase_two, vec![s1])).await?;
        assign_subjects(&db, request(&f, f.phase_one, vec![s3])).await?;

        let rows = list_teacher_subjects(
            &db,
            &TeacherSubjectFilter {
                teacher_id: Some(f.teacher),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(subjects_of(&rows, f.phase_one), HashSet::from([s3]));
        assert_eq!(subjects_of(&rows, f.phase_two), HashSet::from([s1]));
        assert_eq!(rows.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_subject_ids_collapse() -> Result<()> {
        let db = setup_test_db().await?;
        let f = fixture(&db).await?;
        let s1 = f.subjects[0];

        let created = assign_subjects(&db, request(&f, f.phase_one, vec![s1, s1, s1])).await?;
        assert_eq!(created.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_set_clears_tuple() -> Result<()> {
        let db = setup_test_db().await?;
        let f = fixture(&db).await?;
        assign_subjects(&db, request(&f, f.phase_one, f.subjects.clone())).await?;
        assign_subjects(&db, request(&f, f.phase_one, Vec::new())).await?;

        let rows = list_teacher_subjects(&db, &TeacherSubjectFilter::default()).await?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_subject_leaves_set_unchanged() -> Result<()> {
        let db = setup_test_db().await?;
        let f = fixture(&db).await?;
        let s1 = f.subjects[0];
        assign_subjects(&db, request(&f, f.phase_one, vec![s1])).await?;

        let result =
            assign_subjects(&db, request(&f, f.phase_one, vec![f.subjects[1], Uuid::new_v4()]))
                .await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        let rows = list_teacher_subjects(&db, &TeacherSubjectFilter::default()).await?;
        assert_eq!(subjects_of(&rows, f.phase_one), HashSet::from([s1]));
        Ok(())
    }
}
