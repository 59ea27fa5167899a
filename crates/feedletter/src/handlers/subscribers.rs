use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;

use feedletter_core::serde::deserialize_optional_string;
use feedletter_core::subscriber::Subscriber;

use super::admin::AdminAuth;
use super::pages::{ConfirmedPage, HtmlTemplate, UnsubscribedPage};
use crate::handlers::AppError;
use crate::services::subscribers::{self, DeleteTarget};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EmailParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub token: Option<String>,
}

/// List all subscribers (GET /api/subscribers). Admin only.
pub async fn list_subscribers(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Subscriber>>, AppError> {
    Ok(Json(subscribers::list(&state).await?))
}

/// Subscribe (POST /api/subscribers).
///
/// Reads `email` from a form body, falling back to the query string, and
/// redirects the browser to the blog's success page.
pub async fn create_subscriber(
    State(state): State<AppState>,
    Query(query): Query<EmailParams>,
    form: Result<Form<EmailParams>, FormRejection>,
) -> Result<Redirect, AppError> {
    let email = form
        .ok()
        .and_then(|Form(params)| params.email)
        .or(query.email)
        .unwrap_or_default();

    let redirect = subscribers::subscribe(&state, &email).await?;
    Ok(Redirect::to(&redirect))
}

/// Confirm a subscription (GET /api/subscribers/confirm?token=).
pub async fn confirm_subscriber(
    State(state): State<AppState>,
    Query(params): Query<TokenParams>,
) -> Result<HtmlTemplate<ConfirmedPage>, AppError> {
    let email = subscribers::confirm(&state, params.token.as_deref().unwrap_or_default()).await?;

    Ok(HtmlTemplate(ConfirmedPage {
        newsletter_name: state.config.newsletter_name.clone(),
        email,
        site_url: state.config.site_url.clone(),
    }))
}

/// Unsubscribe (GET /api/subscribers/unsubscribe?token=).
pub async fn unsubscribe_subscriber(
    State(state): State<AppState>,
    Query(params): Query<TokenParams>,
) -> Result<HtmlTemplate<UnsubscribedPage>, AppError> {
    let email =
        subscribers::unsubscribe(&state, params.token.as_deref().unwrap_or_default()).await?;

    Ok(HtmlTemplate(UnsubscribedPage {
        newsletter_name: state.config.newsletter_name.clone(),
        email,
        site_url: state.config.site_url.clone(),
    }))
}

/// Delete a subscriber by id (DELETE /api/subscribers/{id}). Admin only.
pub async fn delete_subscriber(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    subscribers::delete(&state, DeleteTarget::Id(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a subscriber by email (DELETE /api/subscribers?email=). Admin only.
pub async fn delete_subscriber_by_email(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Query(params): Query<EmailParams>,
) -> Result<Response, AppError> {
    let Some(email) = params.email else {
        return Ok((
            StatusCode::BAD_REQUEST,
            "Either a subscriber id or an email is required",
        )
            .into_response());
    };

    subscribers::delete(&state, DeleteTarget::Email(email)).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
