//! User accounts and passwords.
//!
//! Passwords are hashed with argon2 and never leave this module in clear text,
//! except for generated temporary passwords which are returned once so the
//! caller can put them in a welcome email.

use crate::{
    config::Settings,
    core::{delete_or_404, ensure_exists_opt, find_or_404},
    entities::{College, Role, User, user},
    errors::{Error, Result},
    notify::{self, Mailer},
    validation::{FieldErrors, Validate},
};
use argon2::password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use sea_orm::{QueryOrder, QueryTrait, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Length of generated temporary passwords.
const TEMP_PASSWORD_LEN: usize = 12;

/// Hashes a password with argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Checks `password` against a stored argon2 hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| Error::PasswordHash {
        message: e.to_string(),
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Generates a random temporary password for a new account.
#[must_use]
pub fn temporary_password() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(TEMP_PASSWORD_LEN)
        .collect()
}

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Login email, stored lowercase
    pub email: String,
    /// Display name
    pub name: String,
    /// Initial password; a temporary one is generated when absent
    #[serde(default)]
    pub password: Option<String>,
    /// Account role
    pub role: Role,
    /// College the account belongs to
    #[serde(default)]
    pub college_id: Option<Uuid>,
}

impl Validate for NewUser {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_email("email", &self.email);
        errors.check_name("name", &self.name);
        if let Some(password) = &self.password {
            errors.check_password("password", password);
        }
        errors.into_result()
    }
}

/// A freshly created account and the clear-text password it was given.
#[derive(Debug, Clone)]
pub struct CreatedAccount {
    /// The stored user
    pub user: user::Model,
    /// Password to hand to the user
    pub password: String,
}

/// Body of an update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    /// New display name
    pub name: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New role
    pub role: Option<Role>,
    /// New college
    pub college_id: Option<Uuid>,
}

impl Validate for UserChanges {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name_opt("name", self.name.as_deref());
        if let Some(email) = &self.email {
            errors.check_email("email", email);
        }
        errors.into_result()
    }
}

/// Body of a password change.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    /// Current password, checked when supplied
    #[serde(default)]
    pub current_password: Option<String>,
    /// Replacement password
    pub new_password: String,
}

impl Validate for PasswordChange {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_password("newPassword", &self.new_password);
        errors.into_result()
    }
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    /// Only accounts with this role
    pub role: Option<Role>,
    /// Only accounts of this college
    pub college_id: Option<Uuid>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn ensure_email_free<C>(db: &C, email: &str, except: Option<Uuid>) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;
    match existing {
        Some(found) if Some(found.id) != except => Err(Error::Conflict {
            message: format!("Email {email} is already registered"),
        }),
        _ => Ok(()),
    }
}

/// Account part of a student or teacher registration.
///
/// Either names an existing account with `userId`, or carries the `email`
/// (and optionally `password`) of an account to create.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRef {
    /// Existing account to attach the profile to
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Email of the account to create
    #[serde(default)]
    pub email: Option<String>,
    /// Initial password of the account to create
    #[serde(default)]
    pub password: Option<String>,
}

impl AccountRef {
    /// Records format errors into `errors`.
    pub fn check(&self, errors: &mut FieldErrors) {
        if self.user_id.is_some() {
            return;
        }
        match self.email.as_deref() {
            Some(email) => errors.check_email("email", email),
            None => errors.add("email", "is required when userId is absent"),
        }
        if let Some(password) = &self.password {
            errors.check_password("password", password);
        }
    }
}

/// Resolves the account a new profile belongs to, creating it when needed.
///
/// Returns the account and, for new accounts, the clear-text password to
/// send in the welcome email. Existing accounts must have `role`.
pub async fn account_for_profile<C: ConnectionTrait>(
    db: &C,
    account: AccountRef,
    name: &str,
    role: Role,
    college_id: Uuid,
) -> Result<(user::Model, Option<String>)> {
    if let Some(user_id) = account.user_id {
        let existing = get_user(db, user_id).await?;
        if existing.role != role {
            return Err(Error::Validation {
                message: "Invalid request body".to_string(),
                details: serde_json::json!({
                    "userId": format!("account role must be {}", role.as_str())
                }),
            });
        }
        return Ok((existing, None));
    }

    let created = create_user(
        db,
        NewUser {
            email: account.email.unwrap_or_default(),
            name: name.to_string(),
            password: account.password,
            role,
            college_id: Some(college_id),
        },
    )
    .await?;
    Ok((created.user, Some(created.password)))
}

/// Lists accounts ordered by email.
pub async fn list_users(db: &DatabaseConnection, filter: &UserFilter) -> Result<Vec<user::Model>> {
    User::find()
        .apply_if(filter.role, |q, v| q.filter(user::Column::Role.eq(v)))
        .apply_if(filter.college_id, |q, v| {
            q.filter(user::Column::CollegeId.eq(v))
        })
        .order_by_asc(user::Column::Email)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one account.
pub async fn get_user<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<user::Model> {
    find_or_404::<User, _>(db, "user", id).await
}

/// Creates an account. Works on a plain connection or inside a transaction.
///
/// The email must be unused; new accounts always start with the first-login
/// flag set.
#[instrument(skip(db, input), fields(email = %input.email, role = input.role.as_str()))]
pub async fn create_user<C: ConnectionTrait>(db: &C, input: NewUser) -> Result<CreatedAccount> {
    input.validate()?;
    ensure_exists_opt::<College, _>(db, "college", input.college_id).await?;

    let email = normalize_email(&input.email);
    ensure_email_free(db, &email, None).await?;

    let password = input.password.unwrap_or_else(temporary_password);
    let now = chrono::Utc::now();
    let created = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        name: Set(input.name.trim().to_string()),
        password_hash: Set(hash_password(&password)?),
        role: Set(input.role),
        college_id: Set(input.college_id),
        is_first_login: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    info!(user_id = %created.id, "User created");
    Ok(CreatedAccount {
        user: created,
        password,
    })
}

/// Result of creating an account through the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistration {
    /// The stored account
    #[serde(flatten)]
    pub user: user::Model,
    /// Set when the welcome email could not be delivered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<&'static str>,
}

/// Creates an account and sends its welcome email.
#[instrument(skip(db, mailer, settings, input))]
pub async fn register_user(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    settings: &Settings,
    input: NewUser,
) -> Result<UserRegistration> {
    let created = create_user(db, input).await?;
    let email = notify::welcome_email(&settings.email, &created.user, &created.password);
    Ok(UserRegistration {
        email_error: notify::deliver(mailer, &email),
        user: created.user,
    })
}

/// Merges `changes` into an existing account.
#[instrument(skip(db))]
pub async fn update_user(
    db: &DatabaseConnection,
    id: Uuid,
    changes: UserChanges,
) -> Result<user::Model> {
    changes.validate()?;

    let mut account: user::ActiveModel = get_user(db, id).await?.into();
    if let Some(name) = changes.name {
        account.name = Set(name.trim().to_string());
    }
    if let Some(email) = changes.email {
        let email = normalize_email(&email);
        ensure_email_free(db, &email, Some(id)).await?;
        account.email = Set(email);
    }
    if let Some(role) = changes.role {
        account.role = Set(role);
    }
    if let Some(college_id) = changes.college_id {
        ensure_exists_opt::<College, _>(db, "college", Some(college_id)).await?;
        account.college_id = Set(Some(college_id));
    }
    account.updated_at = Set(chrono::Utc::now());
    account.update(db).await.map_err(Into::into)
}

/// Replaces the password of an account and clears its first-login flag.
///
/// When `current_password` is supplied it must match the stored hash.
#[instrument(skip(db, change))]
pub async fn change_password(
    db: &DatabaseConnection,
    id: Uuid,
    change: PasswordChange,
) -> Result<user::Model> {
    change.validate()?;

    let current = get_user(db, id).await?;
    if let Some(given) = &change.current_password {
        if !verify_password(given, &current.password_hash)? {
            warn!(user_id = %id, "Password change rejected: current password mismatch");
            return Err(Error::Unauthorized {
                message: "Current password is incorrect".to_string(),
            });
        }
    }

    let mut account: user::ActiveModel = current.into();
    account.password_hash = Set(hash_password(&change.new_password)?);
    account.is_first_login = Set(false);
    account.updated_at = Set(chrono::Utc::now());
    let updated = account.update(db).await?;
    info!(user_id = %updated.id, "Password changed");
    Ok(updated)
}

/// Deletes an account.
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<User, _>(db, "user", id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn admin_input(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "College Admin".to_string(),
            password: Some("secret-pass".to_string()),
            role: Role::CollegeAdmin,
            college_id: None,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert_ne!(hash, "hunter22");
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_temporary_password_shape() {
        let a = temporary_password();
        let b = temporary_password();
        assert_eq!(a.len(), TEMP_PASSWORD_LEN);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_create_user_normalizes_email() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_user(&db, admin_input("  Admin@College.EDU ")).await?;
        assert_eq!(created.user.email, "admin@college.edu");
        assert!(created.user.is_first_login);
        assert!(verify_password("secret-pass", &created.user.password_hash)?);

        // Hash is never serialized
        let body = serde_json::to_value(&created.user)?;
        assert!(body.get("passwordHash").is_none());
        assert_eq!(body["role"], "COLLEGE_ADMIN");
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() -> Result<()> {
        let db = setup_test_db().await?;
        create_user(&db, admin_input("admin@college.edu")).await?;
        let second = create_user(&db, admin_input("ADMIN@college.edu")).await;
        assert!(matches!(second.unwrap_err(), Error::Conflict { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_generated_password_when_absent() -> Result<()> {
        let db = setup_test_db().await?;
        let mut input = admin_input("temp@college.edu");
        input.password = None;
        let created = create_user(&db, input).await?;
        assert_eq!(created.password.len(), TEMP_PASSWORD_LEN);
        assert!(verify_password(&created.password, &created.user.password_hash)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_change_password_clears_first_login() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_user(&db, admin_input("admin@college.edu")).await?;

        let wrong = change_password(
            &db,
            created.user.id,
            PasswordChange {
                current_password: Some("not-it".to_string()),
                new_password: "brand-new-pass".to_string(),
            },
        )
        .await;
        assert!(matches!(wrong.unwrap_err(), Error::Unauthorized { .. }));
        assert!(get_user(&db, created.user.id).await?.is_first_login);

        let updated = change_password(
            &db,
            created.user.id,
            PasswordChange {
                current_password: Some("secret-pass".to_string()),
                new_password: "brand-new-pass".to_string(),
            },
        )
        .await?;
        assert!(!updated.is_first_login);
        assert!(verify_password("brand-new-pass", &updated.password_hash)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_user_reports_email_failure() -> Result<()> {
        let db = setup_test_db().await?;
        let registration = register_user(
            &db,
            &RecordingMailer::failing(),
            &test_settings(),
            admin_input("admin@college.edu"),
        )
        .await?;
        assert_eq!(registration.email_error, Some(notify::EMAIL_DELIVERY_FAILED));
        assert_eq!(list_users(&db, &UserFilter::default()).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_users_by_role() -> Result<()> {
        let db = setup_test_db().await?;
        create_user(&db, admin_input("a@college.edu")).await?;
        let mut admin = admin_input("root@college.edu");
        admin.role = Role::Admin;
        create_user(&db, admin).await?;

        let admins = list_users(
            &db,
            &UserFilter {
                role: Some(Role::Admin),
                college_id: None,
            },
        )
        .await?;
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].email, "root@college.edu");
        Ok(())
    }
}
