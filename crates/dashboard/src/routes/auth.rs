//! Authentication route handlers.
//!
//! Login checks an email/password pair with [`AuthService`] and stores the
//! signed-in user in the session. Logout flushes the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::gate::{PROTECTED_PREFIX, is_safe_callback};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "callbackUrl", default)]
    pub callback_url: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub email: String,
    pub callback_url: String,
}

/// Keep a callback only if it points back into the dashboard.
fn safe_callback(target: Option<String>) -> Option<String> {
    target.filter(|t| is_safe_callback(t))
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<LoginQuery>) -> LoginTemplate {
    LoginTemplate {
        error: None,
        email: String::new(),
        callback_url: safe_callback(query.callback_url).unwrap_or_default(),
    }
}

/// Handle login form submission.
///
/// On success the session id is cycled, the user stored, and the browser sent
/// to the callback target (or `/dashboard`). On failure the form is
/// re-rendered with a message that does not say which part was wrong.
///
/// # Errors
///
/// Returns `AppError::Session` if the session cannot be written.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let callback = safe_callback(form.callback_url);

    match AuthService::new(state.users())
        .verify(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            let current = CurrentUser::from(user);
            set_current_user(&session, &current).await?;
            set_sentry_user(&current.id, Some(current.email.as_str()));
            info!(user_id = %current.id, "User signed in");

            let target = callback.unwrap_or_else(|| PROTECTED_PREFIX.to_string());
            Ok(Redirect::to(&target).into_response())
        }
        Err(e) => {
            let status = match e {
                AuthError::InvalidCredentials => {
                    warn!("Login rejected");
                    StatusCode::UNAUTHORIZED
                }
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            let page = LoginTemplate {
                error: Some(e.user_message().to_string()),
                email: form.email,
                callback_url: callback.unwrap_or_default(),
            };
            Ok((status, page).into_response())
        }
    }
}

/// Handle logout.
///
/// # Errors
///
/// Returns `AppError::Session` if the session cannot be deleted.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    info!("User signed out");
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_callback_filters_foreign_targets() {
        assert_eq!(
            safe_callback(Some("/dashboard/invoices".to_string())).as_deref(),
            Some("/dashboard/invoices")
        );
        assert_eq!(safe_callback(Some("https://evil.example.com".to_string())), None);
        assert_eq!(safe_callback(None), None);
    }
}
