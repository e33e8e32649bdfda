//! Dashboard overview route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CardData, CurrentUser, LatestInvoice};
use crate::state::AppState;

/// Overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/index.html")]
pub struct OverviewTemplate {
    pub user: CurrentUser,
    pub cards: CardData,
    pub latest: Vec<LatestInvoice>,
}

/// Display the overview: headline cards and the latest invoices.
///
/// # Errors
///
/// Returns `AppError::Database` if either read fails.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<OverviewTemplate> {
    let service = state.invoice_service();
    let (cards, latest) =
        tokio::try_join!(service.fetch_card_data(), service.fetch_latest_invoices())?;

    Ok(OverviewTemplate {
        user,
        cards,
        latest,
    })
}
