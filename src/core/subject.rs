//! Subject business logic.

use crate::{
    core::{delete_or_404, ensure_exists, ensure_exists_opt, find_or_404},
    entities::{Course, Phase, Subject, subject},
    errors::Result,
    validation::{FieldErrors, Validate},
};
use sea_orm::{QueryOrder, QueryTrait, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    /// Subject name
    pub name: String,
    /// Short code, e.g. `"ANAT101"`
    pub code: String,
    /// Phase the subject is taught in
    pub phase_id: Uuid,
    /// Optional owning course
    #[serde(default)]
    pub course_id: Option<Uuid>,
    /// Approval flag, defaults to `false`
    #[serde(default)]
    pub is_approved: bool,
}

impl Validate for NewSubject {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name("name", &self.name);
        errors.check_present("code", &self.code);
        errors.into_result()
    }
}

/// Body of an update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectChanges {
    /// New name
    pub name: Option<String>,
    /// New code
    pub code: Option<String>,
    /// Move to another phase
    pub phase_id: Option<Uuid>,
    /// Attach to a course
    pub course_id: Option<Uuid>,
    /// Approve or revoke approval
    pub is_approved: Option<bool>,
}

impl Validate for SubjectChanges {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name_opt("name", self.name.as_deref());
        if let Some(code) = &self.code {
            errors.check_present("code", code);
        }
        errors.into_result()
    }
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectFilter {
    /// Only subjects of this phase
    pub phase_id: Option<Uuid>,
    /// Only subjects of this course
    pub course_id: Option<Uuid>,
    /// Only approved (`true`) or unapproved (`false`) subjects
    pub approved: Option<bool>,
}

/// Lists subjects ordered by code.
pub async fn list_subjects(
    db: &DatabaseConnection,
    filter: &SubjectFilter,
) -> Result<Vec<subject::Model>> {
    Subject::find()
        .apply_if(filter.phase_id, |q, v| q.filter(subject::Column::PhaseId.eq(v)))
        .apply_if(filter.course_id, |q, v| {
            q.filter(subject::Column::CourseId.eq(v))
        })
        .apply_if(filter.approved, |q, v| {
            q.filter(subject::Column::IsApproved.eq(v))
        })
        .order_by_asc(subject::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one subject.
pub async fn get_subject(db: &DatabaseConnection, id: Uuid) -> Result<subject::Model> {
    find_or_404::<Subject, _>(db, "subject", id).await
}

/// Creates a subject in an existing phase.
#[instrument(skip(db))]
pub async fn create_subject(db: &DatabaseConnection, input: NewSubject) -> Result<subject::Model> {
    input.validate()?;
    ensure_exists::<Phase, _>(db, "phase", input.phase_id).await?;
    ensure_exists_opt::<Course, _>(db, "course", input.course_id).await?;

    let now = chrono::Utc::now();
    let created = subject::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        code: Set(input.code.trim().to_string()),
        phase_id: Set(input.phase_id),
        course_id: Set(input.course_id),
        is_approved: Set(input.is_approved),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    info!(subject_id = %created.id, code = %created.code, "Subject created");
    Ok(created)
}

/// Merges `changes` into an existing subject.
#[instrument(skip(db))]
pub async fn update_subject(
    db: &DatabaseConnection,
    id: Uuid,
    changes: SubjectChanges,
) -> Result<subject::Model> {
    changes.validate()?;

    let mut subject: subject::ActiveModel = get_subject(db, id).await?.into();
    if let Some(name) = changes.name {
        subject.name = Set(name.trim().to_string());
    }
    if let Some(code) = changes.code {
        subject.code = Set(code.trim().to_string());
    }
    if let Some(phase_id) = changes.phase_id {
        ensure_exists::<Phase, _>(db, "phase", phase_id).await?;
        subject.phase_id = Set(phase_id);
    }
    if let Some(course_id) = changes.course_id {
        ensure_exists::<Course, _>(db, "course", course_id).await?;
        subject.course_id = Set(Some(course_id));
    }
    if let Some(approved) = changes.is_approved {
        subject.is_approved = Set(approved);
    }
    subject.updated_at = Set(chrono::Utc::now());
    subject.update(db).await.map_err(Into::into)
}

/// Deletes a subject.
#[instrument(skip(db))]
pub async fn delete_subject(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<Subject, _>(db, "subject", id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{errors::Error, test_utils::*};

    #[tokio::test]
    async fn test_approval_filter() -> Result<()> {
        let db = setup_test_db().await?;
        let year = create_test_academic_year(&db, "2024-2025").await?;
        let phase = create_test_phase(&db, year.id, "Phase I").await?;
        let anatomy = create_test_subject(&db, phase.id, "ANAT101", "Anatomy").await?;
        create_test_subject(&db, phase.id, "PHYS101", "Physiology").await?;

        update_subject(
            &db,
            anatomy.id,
            SubjectChanges {
                is_approved: Some(true),
                ..Default::default()
            },
        )
        .await?;

        let approved = list_subjects(
            &db,
            &SubjectFilter {
                approved: Some(true),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].code, "ANAT101");

        let pending = list_subjects(
            &db,
            &SubjectFilter {
                phase_id: Some(phase.id),
                approved: Some(false),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].code, "PHYS101");
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_code_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let year = create_test_academic_year(&db, "2024-2025").await?;
        let phase = create_test_phase(&db, year.id, "Phase I").await?;

        let result = create_subject(
            &db,
            NewSubject {
                name: "Anatomy".to_string(),
                code: "  ".to_string(),
                phase_id: phase.id,
                course_id: None,
                is_approved: false,
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        assert!(list_subjects(&db, &SubjectFilter::default()).await?.is_empty());
        Ok(())
    }
}
