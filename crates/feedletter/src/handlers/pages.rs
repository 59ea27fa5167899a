use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Template wrapper that converts Askama templates into HTML responses.
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "Failed to render page");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to render template: {err}"),
                )
                    .into_response()
            }
        }
    }
}

/// Shown after following the confirmation link.
#[derive(Template)]
#[template(path = "pages/confirmed.html")]
pub struct ConfirmedPage {
    pub newsletter_name: String,
    pub email: String,
    pub site_url: Option<String>,
}

/// Shown after following an unsubscribe link.
#[derive(Template)]
#[template(path = "pages/unsubscribed.html")]
pub struct UnsubscribedPage {
    pub newsletter_name: String,
    pub email: String,
    pub site_url: Option<String>,
}
