//! Role-based landing: where a signed-in user goes next.
//!
//! A session with no role stays where it is. Accounts that still carry the
//! first-login flag are sent to the change-password page first, with their
//! dashboard remembered as the next stop.

use crate::{
    core::user::get_user,
    entities::Role,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Path of the change-password page.
pub const CHANGE_PASSWORD_PATH: &str = "/change-password";

/// One of the four role dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// `/student/dashboard`
    StudentDashboard,
    /// `/teacher/dashboard`
    TeacherDashboard,
    /// `/college-admin/dashboard`
    CollegeAdminDashboard,
    /// `/admin/dashboard`
    AdminDashboard,
}

impl Destination {
    /// Dashboard of `role`.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Student => Self::StudentDashboard,
            Role::Teacher => Self::TeacherDashboard,
            Role::CollegeAdmin => Self::CollegeAdminDashboard,
            Role::Admin => Self::AdminDashboard,
        }
    }

    /// Client route of the dashboard.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::StudentDashboard => "/student/dashboard",
            Self::TeacherDashboard => "/teacher/dashboard",
            Self::CollegeAdminDashboard => "/college-admin/dashboard",
            Self::AdminDashboard => "/admin/dashboard",
        }
    }
}

impl Serialize for Destination {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

/// What the client should do after sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Landing {
    /// No role: stay on the current page
    Stay,
    /// Detour through the change-password page, then go to `next`
    ChangePassword {
        /// Change-password route
        path: &'static str,
        /// Dashboard to continue to afterwards
        next: Destination,
    },
    /// Go straight to a dashboard
    Dashboard {
        /// Dashboard route
        path: Destination,
    },
}

/// Decides the landing for a role and first-login flag.
#[must_use]
pub const fn landing_for(role: Option<Role>, first_login: bool) -> Landing {
    match (role, first_login) {
        (None, _) => Landing::Stay,
        (Some(role), true) => Landing::ChangePassword {
            path: CHANGE_PASSWORD_PATH,
            next: Destination::for_role(role),
        },
        (Some(role), false) => Landing::Dashboard {
            path: Destination::for_role(role),
        },
    }
}

/// Landing lookup parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingQuery {
    /// Role carried by the session
    pub role: Option<Role>,
    /// Signed-in account; when present its stored role and first-login flag win
    pub user_id: Option<Uuid>,
}

/// Resolves the landing for a session, reading the account when one is named.
pub async fn resolve_landing(db: &DatabaseConnection, query: &LandingQuery) -> Result<Landing> {
    match query.user_id {
        Some(id) => {
            let account = get_user(db, id).await?;
            Ok(landing_for(Some(account.role), account.is_first_login))
        }
        None => Ok(landing_for(query.role, false)),
    }
}
