//! Email bodies rendered with askama.

use askama::Template;

use feedletter_core::feed::FeedEntry;
use feedletter_core::mail::OutgoingMail;
use feedletter_core::message::UNSUBSCRIBE_PLACEHOLDER;

#[derive(Template)]
#[template(path = "email/new_post.html")]
struct NewPostEmail<'a> {
    title: &'a str,
    link: &'a str,
    /// Feed-provided HTML, rendered unescaped.
    description: Option<&'a str>,
    newsletter_name: &'a str,
    unsubscribe_link: &'a str,
}

#[derive(Template)]
#[template(path = "email/confirm.html")]
struct ConfirmEmail<'a> {
    newsletter_name: &'a str,
    confirm_link: &'a str,
}

#[derive(Template)]
#[template(path = "email/unsubscribe_notice.html")]
struct UnsubscribeNoticeEmail<'a> {
    newsletter_name: &'a str,
    site_url: Option<&'a str>,
}

/// Campaign body announcing `entry`. The unsubscribe link is left as the
/// placeholder and filled in per recipient.
pub fn new_post_html(entry: &FeedEntry, newsletter_name: &str) -> Result<String, askama::Error> {
    NewPostEmail {
        title: &entry.title,
        link: &entry.link,
        description: entry.description.as_deref(),
        newsletter_name,
        unsubscribe_link: UNSUBSCRIBE_PLACEHOLDER,
    }
    .render()
}

/// Mail asking a new subscriber to confirm.
pub fn confirm_mail(
    to: &str,
    confirm_link: &str,
    newsletter_name: &str,
) -> Result<OutgoingMail, askama::Error> {
    let html = ConfirmEmail {
        newsletter_name,
        confirm_link,
    }
    .render()?;

    let text = format!(
        "Thanks for subscribing to {newsletter_name}.\n\n\
         Confirm your subscription: {confirm_link}\n\n\
         If you did not subscribe, you can ignore this email."
    );

    Ok(OutgoingMail::text(
        to,
        format!("Confirm your subscription to {newsletter_name}"),
        text,
    )
    .with_html(html))
}

/// Mail confirming that a subscriber left.
pub fn unsubscribe_notice_mail(
    to: &str,
    newsletter_name: &str,
    site_url: Option<&str>,
) -> Result<OutgoingMail, askama::Error> {
    let html = UnsubscribeNoticeEmail {
        newsletter_name,
        site_url,
    }
    .render()?;

    let mut text = format!("You will no longer receive {newsletter_name}.");
    if let Some(site_url) = site_url {
        text.push_str(&format!("\n\nYou can subscribe again at {site_url}."));
    }

    Ok(OutgoingMail::text(
        to,
        format!("You have unsubscribed from {newsletter_name}"),
        text,
    )
    .with_html(html))
}
