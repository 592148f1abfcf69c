//! Log-book entry business logic.
//!
//! Entry payloads are checked against their template whenever they are
//! written: on creation and when `data` is replaced by an update.

use crate::{
    core::{
        clean_opt, delete_or_404, ensure_exists, ensure_exists_opt, find_or_404,
        logbook_template::{get_template, schema_of},
    },
    entities::{
        Course, LogBookEntry, Phase, StudentProfile, Subject, TemplateType, logbook_entry,
    },
    errors::Result,
};
use sea_orm::{QueryOrder, QueryTrait, Set, prelude::*};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    /// Template the entry fills in
    pub template_id: Uuid,
    /// Student profile writing the entry
    pub student_id: Uuid,
    /// Subject; taken from the template for subject templates when absent
    #[serde(default)]
    pub subject_id: Option<Uuid>,
    /// Course context
    #[serde(default)]
    pub course_id: Option<Uuid>,
    /// Phase context
    #[serde(default)]
    pub phase_id: Option<Uuid>,
    /// Field values keyed by field name; template defaults when absent
    #[serde(default)]
    pub data: Option<Value>,
    /// Student's remarks
    #[serde(default)]
    pub student_remarks: Option<String>,
    /// Teacher's remarks
    #[serde(default)]
    pub teacher_remarks: Option<String>,
}

/// Body of an update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryChanges {
    /// Replacement payload, revalidated against the template
    pub data: Option<Value>,
    /// New student remarks
    pub student_remarks: Option<String>,
    /// New teacher remarks
    pub teacher_remarks: Option<String>,
    /// New subject
    pub subject_id: Option<Uuid>,
    /// New course
    pub course_id: Option<Uuid>,
    /// New phase
    pub phase_id: Option<Uuid>,
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFilter {
    /// Only entries of this student
    pub student_id: Option<Uuid>,
    /// Only entries of this template
    pub template_id: Option<Uuid>,
    /// Only entries of this subject
    pub subject_id: Option<Uuid>,
    /// Only entries of this course
    pub course_id: Option<Uuid>,
    /// Only entries of this phase
    pub phase_id: Option<Uuid>,
}

async fn check_context(
    db: &DatabaseConnection,
    subject_id: Option<Uuid>,
    course_id: Option<Uuid>,
    phase_id: Option<Uuid>,
) -> Result<()> {
    ensure_exists_opt::<Subject, _>(db, "subject", subject_id).await?;
    ensure_exists_opt::<Course, _>(db, "course", course_id).await?;
    ensure_exists_opt::<Phase, _>(db, "phase", phase_id).await
}

/// Lists entries, oldest first.
pub async fn list_entries(
    db: &DatabaseConnection,
    filter: &EntryFilter,
) -> Result<Vec<logbook_entry::Model>> {
    LogBookEntry::find()
        .apply_if(filter.student_id, |q, v| {
            q.filter(logbook_entry::Column::StudentId.eq(v))
        })
        .apply_if(filter.template_id, |q, v| {
            q.filter(logbook_entry::Column::TemplateId.eq(v))
        })
        .apply_if(filter.subject_id, |q, v| {
            q.filter(logbook_entry::Column::SubjectId.eq(v))
        })
        .apply_if(filter.course_id, |q, v| {
            q.filter(logbook_entry::Column::CourseId.eq(v))
        })
        .apply_if(filter.phase_id, |q, v| {
            q.filter(logbook_entry::Column::PhaseId.eq(v))
        })
        .order_by_asc(logbook_entry::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one entry.
pub async fn get_entry(db: &DatabaseConnection, id: Uuid) -> Result<logbook_entry::Model> {
    find_or_404::<LogBookEntry, _>(db, "logbook entry", id).await
}

/// Creates an entry. Unknown payload keys and mistyped values are rejected;
/// missing fields, required or not, are accepted.
#[instrument(skip(db, input), fields(template_id = %input.template_id, student_id = %input.student_id))]
pub async fn create_entry(
    db: &DatabaseConnection,
    input: NewEntry,
) -> Result<logbook_entry::Model> {
    let template = get_template(db, input.template_id).await?;
    ensure_exists::<StudentProfile, _>(db, "student", input.student_id).await?;

    let schema = schema_of(&template)?;
    let data = input.data.unwrap_or_else(|| schema.default_entry());
    schema.validate_entry(&data)?;

    let subject_id = match template.template_type {
        TemplateType::Subject => input.subject_id.or(template.subject_id),
        TemplateType::General => input.subject_id,
    };
    check_context(db, subject_id, input.course_id, input.phase_id).await?;

    let now = chrono::Utc::now();
    let created = logbook_entry::ActiveModel {
        id: Set(Uuid::new_v4()),
        template_id: Set(template.id),
        student_id: Set(input.student_id),
        subject_id: Set(subject_id),
        course_id: Set(input.course_id),
        phase_id: Set(input.phase_id),
        data: Set(data),
        student_remarks: Set(clean_opt(input.student_remarks)),
        teacher_remarks: Set(clean_opt(input.teacher_remarks)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    info!(entry_id = %created.id, "Log-book entry created");
    Ok(created)
}

/// Merges `changes` into an entry. A replacement payload is checked against
/// the entry's template as it is now.
#[instrument(skip(db, changes))]
pub async fn update_entry(
    db: &DatabaseConnection,
    id: Uuid,
    changes: EntryChanges,
) -> Result<logbook_entry::Model> {
    let current = get_entry(db, id).await?;
    if let Some(data) = &changes.data {
        let template = get_template(db, current.template_id).await?;
        schema_of(&template)?.validate_entry(data)?;
    }
    check_context(db, changes.subject_id, changes.course_id, changes.phase_id).await?;

    let mut entry: logbook_entry::ActiveModel = current.into();
    if let Some(data) = changes.data {
        entry.data = Set(data);
    }
    if changes.student_remarks.is_some() {
        entry.student_remarks = Set(clean_opt(changes.student_remarks));
    }
    if changes.teacher_remarks.is_some() {
        entry.teacher_remarks = Set(clean_opt(changes.teacher_remarks));
    }
    if changes.subject_id.is_some() {
        entry.subject_id = Set(changes.subject_id);
    }
    if changes.course_id.is_some() {
        entry.course_id = Set(changes.course_id);
    }
    if changes.phase_id.is_some() {
        entry.phase_id = Set(changes.phase_id);
    }
    entry.updated_at = Set(chrono::Utc::now());
    entry.update(db).await.map_err(Into::into)
}

/// Deletes an entry.
#[instrument(skip(db))]
pub async fn delete_entry(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<LogBookEntry, _>(db, "logbook entry", id).await
}
