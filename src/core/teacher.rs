//! Teacher profiles: registration and search.

use crate::{
    config::Settings,
    core::{
        clean_opt, contains_pattern, delete_or_404, ensure_exists, find_or_404, search_limit,
        student::SearchQuery,
        user::{self, AccountRef},
    },
    entities::{College, Role, TeacherProfile, teacher_profile, user as user_entity},
    errors::{Error, Result},
    notify::{self, Mailer},
    validation::{FieldErrors, check_image, flexible_date, flexible_date_opt},
};
use chrono::NaiveDate;
use sea_orm::{
    Condition, QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Body of a registration request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeacher {
    /// Account to attach to or create
    #[serde(flatten)]
    pub account: AccountRef,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Job title, e.g. `"Associate Professor"`
    pub designation: String,
    /// College staff id
    pub employee_id: String,
    /// First working day
    #[serde(deserialize_with = "flexible_date")]
    pub joining_date: NaiveDate,
    /// Contact number
    #[serde(default)]
    pub phone: Option<String>,
    /// Profile image URL on an allowed host
    #[serde(default)]
    pub profile_image: Option<String>,
    /// College the teacher works at
    pub college_id: Uuid,
}

impl NewTeacher {
    fn validate(&self, allowed_image_hosts: &[String]) -> Result<()> {
        let mut errors = FieldErrors::new();
        self.account.check(&mut errors);
        errors.check_present("firstName", &self.first_name);
        errors.check_present("lastName", &self.last_name);
        errors.check_name("designation", &self.designation);
        errors.check_present("employeeId", &self.employee_id);
        check_image(
            &mut errors,
            "profileImage",
            self.profile_image.as_deref(),
            allowed_image_hosts,
        );
        errors.into_result()
    }
}

/// Result of a registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRegistration {
    /// The stored profile
    #[serde(flatten)]
    pub profile: teacher_profile::Model,
    /// The account the profile belongs to
    pub user: user_entity::Model,
    /// Set when the welcome email could not be delivered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<&'static str>,
}

/// Body of an update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherChanges {
    /// New given name
    pub first_name: Option<String>,
    /// New family name
    pub last_name: Option<String>,
    /// New job title
    pub designation: Option<String>,
    /// New staff id
    pub employee_id: Option<String>,
    /// New joining date
    #[serde(default, deserialize_with = "flexible_date_opt")]
    pub joining_date: Option<NaiveDate>,
    /// New contact number
    pub phone: Option<String>,
    /// New profile image URL
    pub profile_image: Option<String>,
}

impl TeacherChanges {
    fn validate(&self, allowed_image_hosts: &[String]) -> Result<()> {
        let mut errors = FieldErrors::new();
        for (field, value) in [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("employeeId", &self.employee_id),
        ] {
            if let Some(v) = value {
                errors.check_present(field, v);
            }
        }
        errors.check_name_opt("designation", self.designation.as_deref());
        check_image(
            &mut errors,
            "profileImage",
            self.profile_image.as_deref(),
            allowed_image_hosts,
        );
        errors.into_result()
    }
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherFilter {
    /// Only teachers of this college
    pub college_id: Option<Uuid>,
}

/// Lists teacher profiles ordered by last then first name.
pub async fn list_teachers(
    db: &DatabaseConnection,
    filter: &TeacherFilter,
) -> Result<Vec<teacher_profile::Model>> {
    TeacherProfile::find()
        .apply_if(filter.college_id, |q, v| {
            q.filter(teacher_profile::Column::CollegeId.eq(v))
        })
        .order_by_asc(teacher_profile::Column::LastName)
        .order_by_asc(teacher_profile::Column::FirstName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one teacher profile.
pub async fn get_teacher<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<teacher_profile::Model> {
    find_or_404::<TeacherProfile, _>(db, "teacher", id).await
}

/// Case-insensitive search over names, employee id and designation.
#[instrument(skip(db))]
pub async fn search_teachers(
    db: &DatabaseConnection,
    query: &SearchQuery,
) -> Result<Vec<teacher_profile::Model>> {
    let needle = query.q.trim().to_lowercase();
    let condition = if needle.is_empty() {
        Condition::all()
    } else {
        [
            teacher_profile::Column::FirstName,
            teacher_profile::Column::LastName,
            teacher_profile::Column::EmployeeId,
            teacher_profile::Column::Designation,
        ]
        .into_iter()
        .fold(Condition::any(), |cond, col| {
            cond.add(Expr::expr(Func::lower(Expr::col(col))).like(contains_pattern(&needle)))
        })
    };

    TeacherProfile::find()
        .filter(condition)
        .order_by_asc(teacher_profile::Column::LastName)
        .limit(search_limit(query.limit))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Registers a teacher: account (when needed) and profile in one
/// transaction, then the welcome email for new accounts.
#[instrument(skip(db, mailer, settings, input), fields(employee_id = %input.employee_id))]
pub async fn register_teacher(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    settings: &Settings,
    input: NewTeacher,
) -> Result<TeacherRegistration> {
    input.validate(&settings.images.allowed_domains)?;

    let txn = db.begin().await?;
    ensure_exists::<College, _>(&txn, "college", input.college_id).await?;

    let name = format!("{} {}", input.first_name.trim(), input.last_name.trim());
    let (account, password) =
        user::account_for_profile(&txn, input.account, &name, Role::Teacher, input.college_id)
            .await?;

    let taken = TeacherProfile::find()
        .filter(teacher_profile::Column::UserId.eq(account.id))
        .one(&txn)
        .await?;
    if taken.is_some() {
        return Err(Error::Conflict {
            message: format!("User {} already has a teacher profile", account.id),
        });
    }

    let now = chrono::Utc::now();
    let profile = teacher_profile::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(account.id),
        first_name: Set(input.first_name.trim().to_string()),
        last_name: Set(input.last_name.trim().to_string()),
        designation: Set(input.designation.trim().to_string()),
        employee_id: Set(input.employee_id.trim().to_string()),
        joining_date: Set(input.joining_date),
        phone: Set(clean_opt(input.phone)),
        profile_image: Set(clean_opt(input.profile_image)),
        college_id: Set(input.college_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;
    info!(teacher_id = %profile.id, user_id = %account.id, "Teacher registered");

    let email_error = password.and_then(|password| {
        let email = notify::welcome_email(&settings.email, &account, &password);
        notify::deliver(mailer, &email)
    });

    Ok(TeacherRegistration {
        profile,
        user: account,
        email_error,
    })
}

/// Merges `changes` into an existing profile.
#[instrument(skip(db, settings))]
pub async fn update_teacher(
    db: &DatabaseConnection,
    settings: &Settings,
    id: Uuid,
    changes: TeacherChanges,
) -> Result<teacher_profile::Model> {
    changes.validate(&settings.images.allowed_domains)?;

    let mut profile: teacher_profile::ActiveModel = get_teacher(db, id).await?.into();
    if let Some(v) = changes.first_name {
        profile.first_name = Set(v.trim().to_string());
    }
    if let Some(v) = changes.last_name {
        profile.last_name = Set(v.trim().to_string());
    }
    if let Some(v) = changes.designation {
        profile.designation = Set(v.trim().to_string());
    }
    if let Some(v) = changes.employee_id {
        profile.employee_id = Set(v.trim().to_string());
    }
    if let Some(v) = changes.joining_date {
        profile.joining_date = Set(v);
    }
    if changes.phone.is_some() {
        profile.phone = Set(clean_opt(changes.phone));
    }
    if changes.profile_image.is_some() {
        profile.profile_image = Set(clean_opt(changes.profile_image));
    }
    profile.updated_at = Set(chrono::Utc::now());
    profile.update(db).await.map_err(Into::into)
}

/// Deletes a teacher profile. The login account is kept.
#[instrument(skip(db))]
pub async fn delete_teacher(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<TeacherProfile, _>(db, "teacher", id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{test_utils::*, validation::from_json};
    use serde_json::json;

    #[tokio::test]
    async fn test_register_teacher() -> Result<()> {
        let db = setup_test_db().await?;
        let college = create_test_college(&db, "City Medical College").await?;
        let mailer = RecordingMailer::default();

        let input: NewTeacher = from_json(json!({
            "email": "dr.iyer@college.edu",
            "password": "initial-pass",
            "firstName": "Lakshmi",
            "lastName": "Iyer",
            "designation": "Professor",
            "employeeId": "EMP-042",
            "joiningDate": "2019-07-15T00:00:00Z",
            "collegeId": college.id,
        }))?;
        let registration = register_teacher(&db, &mailer, &test_settings(), input).await?;

        assert_eq!(registration.user.role, Role::Teacher);
        assert_eq!(
            registration.profile.joining_date,
            NaiveDate::from_ymd_opt(2019, 7, 15).unwrap()
        );
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains("initial-pass"));

        let body = serde_json::to_value(&registration)?;
        assert_eq!(body["joiningDate"], "2019-07-15");
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_account_must_be_teacher() -> Result<()> {
        let db = setup_test_db().await?;
        let college = create_test_college(&db, "City Medical College").await?;
        let student = create_test_student(&db, college.id, "Asha", "MBBS-001").await?;

        let input: NewTeacher = from_json(json!({
            "userId": student.user_id,
            "firstName": "Asha",
            "lastName": "Rao",
            "designation": "Tutor",
            "employeeId": "EMP-001",
            "joiningDate": "2024-01-01",
            "collegeId": college.id,
        }))?;
        let result =
            register_teacher(&db, &RecordingMailer::default(), &test_settings(), input).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        assert!(list_teachers(&db, &TeacherFilter::default()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_search_teachers_by_designation() -> Result<()> {
        let db = setup_test_db().await?;
        let college = create_test_college(&db, "City Medical College").await?;
        create_test_teacher(&db, college.id, "Lakshmi", "EMP-001").await?;
        let other = create_test_teacher(&db, college.id, "Vikram", "EMP-002").await?;
        update_teacher(
            &db,
            &test_settings(),
            other.id,
            TeacherChanges {
                designation: Some("Head of Department".to_string()),
                ..Default::default()
            },
        )
        .await?;

        let found = search_teachers(
            &db,
            &SearchQuery {
                q: "head".to_string(),
                limit: Some(10),
            },
        )
        .await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Vikram");
        Ok(())
    }

    #[tokio::test]
    async fn test_search_teachers_ignores_wildcards() -> Result<()> {
        let db = setup_test_db().await?;
        let college = create_test_college(&db, "City Medical College").await?;
        create_test_teacher(&db, college.id, "Lakshmi", "EMP-001").await?;

        let found = search_teachers(
            &db,
            &SearchQuery {
                q: "_".to_string(),
                limit: None,
            },
        )
        .await?;
        assert!(found.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_teacher() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_teacher(
            &db,
            &test_settings(),
            Uuid::new_v4(),
            TeacherChanges::default(),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
