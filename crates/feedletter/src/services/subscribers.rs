//! Subscriber lifecycle: subscribe, confirm, unsubscribe and admin removal.

use anyhow::Context;
use chrono::Utc;

use feedletter_core::storage::RepositoryError;
use feedletter_core::subscriber::{
    confirm_link, decode_token, success_redirect, validate_email, Subscriber,
};

use crate::mail::templates;
use crate::state::AppState;

/// How an admin identifies the subscriber to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Id(i64),
    Email(String),
}

fn subscriber_not_found(id: impl Into<String>) -> anyhow::Error {
    RepositoryError::NotFound {
        entity_type: "Subscriber",
        id: id.into(),
    }
    .into()
}

/// Registers a pending subscriber and mails the confirmation link.
///
/// Subscribing again with a known email re-sends the link without touching
/// the stored subscriber. Returns the redirect target for the browser.
pub async fn subscribe(state: &AppState, raw_email: &str) -> anyhow::Result<String> {
    let email = validate_email(raw_email)?;

    let inserted = state.subscribers.insert_pending(&email, Utc::now()).await?;
    if inserted {
        tracing::info!(email = %email, "Subscriber registered");
    } else {
        tracing::debug!(email = %email, "Subscriber already known, re-sending confirmation");
    }

    let link = confirm_link(&state.config.public_url, &email);
    let mail = templates::confirm_mail(&email, &link, &state.config.newsletter_name)
        .context("Failed to render confirmation mail")?;
    state
        .mailer
        .send(&mail)
        .await
        .context("Failed to send confirmation mail")?;

    Ok(success_redirect(state.config.site_url.as_deref()))
}

/// Activates the subscriber a confirmation token belongs to.
pub async fn confirm(state: &AppState, token: &str) -> anyhow::Result<String> {
    let email = decode_token(token)?;

    if !state.subscribers.activate(&email, Utc::now()).await? {
        return Err(subscriber_not_found(email));
    }

    tracing::info!(email = %email, "Subscriber confirmed");
    Ok(email)
}

/// Unsubscribes the owner of a token and mails them a notice.
///
/// A failing notice is logged; the unsubscribe still stands.
pub async fn unsubscribe(state: &AppState, token: &str) -> anyhow::Result<String> {
    let email = decode_token(token)?;

    if !state.subscribers.deactivate(&email, Utc::now()).await? {
        return Err(subscriber_not_found(email));
    }

    tracing::info!(email = %email, "Subscriber unsubscribed");

    let notice = templates::unsubscribe_notice_mail(
        &email,
        &state.config.newsletter_name,
        state.config.site_url.as_deref(),
    );
    match notice {
        Ok(mail) => {
            if let Err(err) = state.mailer.send(&mail).await {
                tracing::warn!(email = %email, error = %err, "Failed to send unsubscribe notice");
            }
        }
        Err(err) => {
            tracing::warn!(email = %email, error = %err, "Failed to render unsubscribe notice");
        }
    }

    Ok(email)
}

/// Every subscriber, newest first.
pub async fn list(state: &AppState) -> anyhow::Result<Vec<Subscriber>> {
    Ok(state.subscribers.list_subscribers().await?)
}

/// Deletes a subscriber and, through the cascade, their messages.
pub async fn delete(state: &AppState, target: DeleteTarget) -> anyhow::Result<()> {
    let deleted = match &target {
        DeleteTarget::Id(id) => state.subscribers.delete_subscriber(*id).await?,
        DeleteTarget::Email(raw) => {
            let email = validate_email(raw)?;
            state.subscribers.delete_subscriber_by_email(&email).await?
        }
    };

    if !deleted {
        return Err(match target {
            DeleteTarget::Id(id) => subscriber_not_found(id.to_string()),
            DeleteTarget::Email(email) => subscriber_not_found(email),
        });
    }

    tracing::info!(?target, "Subscriber deleted");
    Ok(())
}
