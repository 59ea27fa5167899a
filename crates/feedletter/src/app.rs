use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        health::{livez, readyz},
        subscribers::{
            confirm_subscriber, create_subscriber, delete_subscriber, delete_subscriber_by_email,
            list_subscribers, unsubscribe_subscriber,
        },
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    // The subscribe form is posted from the blog, which lives on another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let api_routes = Router::new()
        .route(
            "/subscribers",
            get(list_subscribers)
                .post(create_subscriber)
                .delete(delete_subscriber_by_email),
        )
        .route("/subscribers/confirm", get(confirm_subscriber))
        .route("/subscribers/unsubscribe", get(unsubscribe_subscriber))
        .route("/subscribers/{id}", delete(delete_subscriber))
        .layer(cors);

    Router::new()
        .route("/livez", get(livez))
        .route("/readyz", get(readyz))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}
