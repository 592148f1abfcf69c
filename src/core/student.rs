//! Student profiles: registration, verification and search.
//!
//! Registering a student creates the login account and the profile in one
//! transaction, then sends a welcome email. Email failures are reported in
//! the result and never undo the registration.

use crate::{
    config::Settings,
    core::{
        clean_opt, contains_pattern, delete_or_404, ensure_exists, ensure_exists_opt, find_or_404,
        search_limit,
        user::{self, AccountRef},
    },
    entities::{
        AcademicYear, Branch, College, Course, Role, StudentProfile, User, VerificationStatus,
        student_profile, user as user_entity,
    },
    errors::{Error, Result},
    notify::{self, Mailer},
    validation::{FieldErrors, check_image},
};
use sea_orm::{
    Condition, QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Body of a registration request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    /// Account to attach to or create
    #[serde(flatten)]
    pub account: AccountRef,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// College enrollment (roll) number
    pub enrollment_number: String,
    /// Contact number
    #[serde(default)]
    pub phone: Option<String>,
    /// Profile image URL on an allowed host
    #[serde(default)]
    pub profile_image: Option<String>,
    /// College the student belongs to
    pub college_id: Uuid,
    /// Branch placement
    #[serde(default)]
    pub branch_id: Option<Uuid>,
    /// Course placement
    #[serde(default)]
    pub course_id: Option<Uuid>,
    /// Academic year placement
    #[serde(default)]
    pub academic_year_id: Option<Uuid>,
}

impl NewStudent {
    fn validate(&self, allowed_image_hosts: &[String]) -> Result<()> {
        let mut errors = FieldErrors::new();
        self.account.check(&mut errors);
        errors.check_present("firstName", &self.first_name);
        errors.check_present("lastName", &self.last_name);
        errors.check_present("enrollmentNumber", &self.enrollment_number);
        check_image(
            &mut errors,
            "profileImage",
            self.profile_image.as_deref(),
            allowed_image_hosts,
        );
        errors.into_result()
    }

    fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Result of a registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRegistration {
    /// The stored profile
    #[serde(flatten)]
    pub profile: student_profile::Model,
    /// The account the profile belongs to
    pub user: user_entity::Model,
    /// Set when the welcome email could not be delivered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<&'static str>,
}

/// Body of an update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentChanges {
    /// New given name
    pub first_name: Option<String>,
    /// New family name
    pub last_name: Option<String>,
    /// New enrollment number
    pub enrollment_number: Option<String>,
    /// New contact number
    pub phone: Option<String>,
    /// New profile image URL
    pub profile_image: Option<String>,
    /// Verification status; subject to the same transition rule as a review
    pub status: Option<VerificationStatus>,
    /// New branch
    pub branch_id: Option<Uuid>,
    /// New course
    pub course_id: Option<Uuid>,
    /// New academic year
    pub academic_year_id: Option<Uuid>,
}

impl StudentChanges {
    fn validate(&self, allowed_image_hosts: &[String]) -> Result<()> {
        let mut errors = FieldErrors::new();
        for (field, value) in [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("enrollmentNumber", &self.enrollment_number),
        ] {
            if let Some(v) = value {
                errors.check_present(field, v);
            }
        }
        check_image(
            &mut errors,
            "profileImage",
            self.profile_image.as_deref(),
            allowed_image_hosts,
        );
        errors.into_result()
    }
}

/// Body of a reviewer decision.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDecision {
    /// Target status
    pub status: VerificationStatus,
    /// Optional note shown to the student
    #[serde(default)]
    pub review_note: Option<String>,
}

/// Result of a reviewer decision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    /// The updated profile
    #[serde(flatten)]
    pub profile: student_profile::Model,
    /// Set when the notification email could not be delivered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<&'static str>,
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFilter {
    /// Only students of this college
    pub college_id: Option<Uuid>,
    /// Only students of this branch
    pub branch_id: Option<Uuid>,
    /// Only students of this course
    pub course_id: Option<Uuid>,
    /// Only students of this academic year
    pub academic_year_id: Option<Uuid>,
    /// Only students with this verification status
    pub status: Option<VerificationStatus>,
}

/// Free-text search parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    /// Text to look for; blank matches everything
    #[serde(default)]
    pub q: String,
    /// Maximum rows, see [`search_limit`]
    pub limit: Option<u64>,
}

fn check_transition(from: VerificationStatus, to: VerificationStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

async fn check_placement<C: ConnectionTrait>(
    db: &C,
    branch_id: Option<Uuid>,
    course_id: Option<Uuid>,
    academic_year_id: Option<Uuid>,
) -> Result<()> {
    ensure_exists_opt::<Branch, _>(db, "branch", branch_id).await?;
    ensure_exists_opt::<Course, _>(db, "course", course_id).await?;
    ensure_exists_opt::<AcademicYear, _>(db, "academic year", academic_year_id).await
}

/// Lists student profiles ordered by last then first name.
pub async fn list_students(
    db: &DatabaseConnection,
    filter: &StudentFilter,
) -> Result<Vec<student_profile::Model>> {
    StudentProfile::find()
        .apply_if(filter.college_id, |q, v| {
            q.filter(student_profile::Column::CollegeId.eq(v))
        })
        .apply_if(filter.branch_id, |q, v| {
            q.filter(student_profile::Column::BranchId.eq(v))
        })
        .apply_if(filter.course_id, |q, v| {
            q.filter(student_profile::Column::CourseId.eq(v))
        })
        .apply_if(filter.academic_year_id, |q, v| {
            q.filter(student_profile::Column::AcademicYearId.eq(v))
        })
        .apply_if(filter.status, |q, v| {
            q.filter(student_profile::Column::Status.eq(v))
        })
        .order_by_asc(student_profile::Column::LastName)
        .order_by_asc(student_profile::Column::FirstName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one student profile.
pub async fn get_student<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<student_profile::Model> {
    find_or_404::<StudentProfile, _>(db, "student", id).await
}

/// Case-insensitive search over names and enrollment number.
#[instrument(skip(db))]
pub async fn search_students(
    db: &DatabaseConnection,
    query: &SearchQuery,
) -> Result<Vec<student_profile::Model>> {
    let needle = query.q.trim().to_lowercase();
    let condition = if needle.is_empty() {
        Condition::all()
    } else {
        [
            student_profile::Column::FirstName,
            student_profile::Column::LastName,
            student_profile::Column::EnrollmentNumber,
        ]
        .into_iter()
        .fold(Condition::any(), |cond, col| {
            cond.add(Expr::expr(Func::lower(Expr::col(col))).like(contains_pattern(&needle)))
        })
    };

    StudentProfile::find()
        .filter(condition)
        .order_by_asc(student_profile::Column::LastName)
        .order_by_asc(student_profile::Column::FirstName)
        .limit(search_limit(query.limit))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Registers a student: account (when needed) and profile in one
/// transaction, then the welcome email for new accounts.
#[instrument(skip(db, mailer, settings, input), fields(enrollment = %input.enrollment_number))]
pub async fn register_student(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    settings: &Settings,
    input: NewStudent,
) -> Result<StudentRegistration> {
    input.validate(&settings.images.allowed_domains)?;

    let txn = db.begin().await?;
    ensure_exists::<College, _>(&txn, "college", input.college_id).await?;
    check_placement(&txn, input.branch_id, input.course_id, input.academic_year_id).await?;

    let name = input.full_name();
    let (account, password) =
        user::account_for_profile(&txn, input.account, &name, Role::Student, input.college_id)
            .await?;

    let taken = StudentProfile::find()
        .filter(student_profile::Column::UserId.eq(account.id))
        .one(&txn)
        .await?;
    if taken.is_some() {
        return Err(Error::Conflict {
            message: format!("User {} already has a student profile", account.id),
        });
    }

    let now = chrono::Utc::now();
    let profile = student_profile::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(account.id),
        first_name: Set(input.first_name.trim().to_string()),
        last_name: Set(input.last_name.trim().to_string()),
        enrollment_number: Set(input.enrollment_number.trim().to_string()),
        phone: Set(clean_opt(input.phone)),
        profile_image: Set(clean_opt(input.profile_image)),
        status: Set(VerificationStatus::Pending),
        review_note: Set(None),
        college_id: Set(input.college_id),
        branch_id: Set(input.branch_id),
        course_id: Set(input.course_id),
        academic_year_id: Set(input.academic_year_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;
    info!(student_id = %profile.id, user_id = %account.id, "Student registered");

    let email_error = password.and_then(|password| {
        let email = notify::welcome_email(&settings.email, &account, &password);
        notify::deliver(mailer, &email)
    });

    Ok(StudentRegistration {
        profile,
        user: account,
        email_error,
    })
}

/// Merges `changes` into an existing profile.
#[instrument(skip(db, settings))]
pub async fn update_student(
    db: &DatabaseConnection,
    settings: &Settings,
    id: Uuid,
    changes: StudentChanges,
) -> Result<student_profile::Model> {
    changes.validate(&settings.images.allowed_domains)?;

    let current = get_student(db, id).await?;
    if let Some(next) = changes.status {
        if next != current.status {
            check_transition(current.status, next)?;
        }
    }
    check_placement(
        db,
        changes.branch_id,
        changes.course_id,
        changes.academic_year_id,
    )
    .await?;

    let mut profile: student_profile::ActiveModel = current.into();
    if let Some(v) = changes.first_name {
        profile.first_name = Set(v.trim().to_string());
    }
    if let Some(v) = changes.last_name {
        profile.last_name = Set(v.trim().to_string());
    }
    if let Some(v) = changes.enrollment_number {
        profile.enrollment_number = Set(v.trim().to_string());
    }
    if changes.phone.is_some() {
        profile.phone = Set(clean_opt(changes.phone));
    }
    if changes.profile_image.is_some() {
        profile.profile_image = Set(clean_opt(changes.profile_image));
    }
    if let Some(status) = changes.status {
        profile.status = Set(status);
    }
    if changes.branch_id.is_some() {
        profile.branch_id = Set(changes.branch_id);
    }
    if changes.course_id.is_some() {
        profile.course_id = Set(changes.course_id);
    }
    if changes.academic_year_id.is_some() {
        profile.academic_year_id = Set(changes.academic_year_id);
    }
    profile.updated_at = Set(chrono::Utc::now());
    profile.update(db).await.map_err(Into::into)
}

/// Applies a reviewer decision and notifies the student.
///
/// Only `PENDING -> APPROVED` and `PENDING -> REJECTED` are accepted.
#[instrument(skip(db, mailer, settings))]
pub async fn review_student(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    settings: &Settings,
    id: Uuid,
    decision: StatusDecision,
) -> Result<VerificationOutcome> {
    let current = get_student(db, id).await?;
    check_transition(current.status, decision.status)?;

    let user_id = current.user_id;
    let note = clean_opt(decision.review_note);
    let mut profile: student_profile::ActiveModel = current.into();
    profile.status = Set(decision.status);
    profile.review_note = Set(note.clone());
    profile.updated_at = Set(chrono::Utc::now());
    let updated = profile.update(db).await?;
    info!(student_id = %id, status = decision.status.as_str(), "Student reviewed");

    let email_error = match User::find_by_id(user_id).one(db).await? {
        Some(account) => {
            let email = notify::verification_email(
                &settings.email,
                &account,
                decision.status,
                note.as_deref(),
            );
            notify::deliver(mailer, &email)
        }
        None => {
            warn!(student_id = %id, %user_id, "Reviewed student has no account");
            None
        }
    };

    Ok(VerificationOutcome {
        profile: updated,
        email_error,
    })
}

/// Deletes a student profile. The login account is kept.
#[instrument(skip(db))]
pub async fn delete_student(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<StudentProfile, _>(db, "student", id).await
}
