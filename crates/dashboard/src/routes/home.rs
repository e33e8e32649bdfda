//! Landing page route handler.

use askama::Template;
use askama_web::WebTemplate;

use crate::filters;
use crate::middleware::gate::LOGIN_PATH;

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub login_path: &'static str,
}

/// Display the landing page.
///
/// Signed-in users never see this; the gate sends them to the dashboard.
pub async fn index() -> HomeTemplate {
    HomeTemplate {
        login_path: LOGIN_PATH,
    }
}
