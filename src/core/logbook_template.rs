//! Log-book template business logic.
//!
//! The schema document is validated structurally on every write and stored in
//! canonical form. Changing a template never touches entries already stored
//! against it.

use crate::{
    core::{delete_or_404, ensure_exists_opt, find_or_404},
    entities::{College, LogBookTemplate, Subject, TemplateType, logbook_template},
    errors::Result,
    template::TemplateSchema,
    validation::FieldErrors,
};
use sea_orm::{QueryOrder, QueryTrait, Set, prelude::*};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    /// Template name
    pub name: String,
    /// `general` or `subject`
    pub template_type: TemplateType,
    /// Subject, required for `subject` templates
    #[serde(default)]
    pub subject_id: Option<Uuid>,
    /// Owning college
    #[serde(default)]
    pub college_id: Option<Uuid>,
    /// Schema document
    pub schema: Value,
}

/// Body of an update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateChanges {
    /// New name
    pub name: Option<String>,
    /// New type
    pub template_type: Option<TemplateType>,
    /// New subject
    pub subject_id: Option<Uuid>,
    /// New college
    pub college_id: Option<Uuid>,
    /// Replacement schema document
    pub schema: Option<Value>,
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFilter {
    /// Only templates of this type
    pub template_type: Option<TemplateType>,
    /// Only templates of this subject
    pub subject_id: Option<Uuid>,
    /// Only templates of this college
    pub college_id: Option<Uuid>,
}

/// Checks the template-level rules and returns the canonical schema document.
fn checked_schema(
    name: &str,
    template_type: TemplateType,
    subject_id: Option<Uuid>,
    schema: &Value,
) -> Result<Value> {
    let mut errors = FieldErrors::new();
    errors.check_name("name", name);
    if template_type == TemplateType::Subject && subject_id.is_none() {
        errors.add("subjectId", "is required for subject templates");
    }
    errors.into_result()?;

    let parsed = TemplateSchema::from_json(schema)?;
    parsed.validate()?;
    parsed.to_json()
}

/// Parses the schema stored on a template.
pub fn schema_of(template: &logbook_template::Model) -> Result<TemplateSchema> {
    TemplateSchema::from_json(&template.schema)
}

/// Lists templates ordered by name.
pub async fn list_templates(
    db: &DatabaseConnection,
    filter: &TemplateFilter,
) -> Result<Vec<logbook_template::Model>> {
    LogBookTemplate::find()
        .apply_if(filter.template_type, |q, v| {
            q.filter(logbook_template::Column::TemplateType.eq(v))
        })
        .apply_if(filter.subject_id, |q, v| {
            q.filter(logbook_template::Column::SubjectId.eq(v))
        })
        .apply_if(filter.college_id, |q, v| {
            q.filter(logbook_template::Column::CollegeId.eq(v))
        })
        .order_by_asc(logbook_template::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one template.
pub async fn get_template<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<logbook_template::Model> {
    find_or_404::<LogBookTemplate, _>(db, "logbook template", id).await
}

/// Creates a template after validating its schema.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_template(
    db: &DatabaseConnection,
    input: NewTemplate,
) -> Result<logbook_template::Model> {
    let schema = checked_schema(
        &input.name,
        input.template_type,
        input.subject_id,
        &input.schema,
    )?;
    ensure_exists_opt::<Subject, _>(db, "subject", input.subject_id).await?;
    ensure_exists_opt::<College, _>(db, "college", input.college_id).await?;

    let now = chrono::Utc::now();
    let created = logbook_template::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        template_type: Set(input.template_type),
        subject_id: Set(input.subject_id),
        college_id: Set(input.college_id),
        schema: Set(schema),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    info!(template_id = %created.id, "Log-book template created");
    Ok(created)
}

/// Merges `changes` into a template and revalidates the merged result.
#[instrument(skip(db, changes))]
pub async fn update_template(
    db: &DatabaseConnection,
    id: Uuid,
    changes: TemplateChanges,
) -> Result<logbook_template::Model> {
    let current = get_template(db, id).await?;

    let name = changes.name.unwrap_or_else(|| current.name.clone());
    let template_type = changes.template_type.unwrap_or(current.template_type);
    let subject_id = changes.subject_id.or(current.subject_id);
    let college_id = changes.college_id.or(current.college_id);
    let schema = changes.schema.unwrap_or_else(|| current.schema.clone());

    let schema = checked_schema(&name, template_type, subject_id, &schema)?;
    ensure_exists_opt::<Subject, _>(db, "subject", changes.subject_id).await?;
    ensure_exists_opt::<College, _>(db, "college", changes.college_id).await?;

    let mut template: logbook_template::ActiveModel = current.into();
    template.name = Set(name.trim().to_string());
    template.template_type = Set(template_type);
    template.subject_id = Set(subject_id);
    template.college_id = Set(college_id);
    template.schema = Set(schema);
    template.updated_at = Set(chrono::Utc::now());
    template.update(db).await.map_err(Into::into)
}

/// Deletes a template.
#[instrument(skip(db))]
pub async fn delete_template(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<LogBookTemplate, _>(db, "logbook template", id).await
}
