//! SQL statements used by the repository, SQLite dialect.
//!
//! Bind order is shared with the PostgreSQL statements.

// Subscribers

pub const INSERT_PENDING_SUBSCRIBER: &str = "INSERT INTO newsletter_subscribers (email, status, created_at) \
     VALUES (?, 'pending', ?) \
     ON CONFLICT (email) DO NOTHING";

pub const ACTIVATE_SUBSCRIBER: &str = "UPDATE newsletter_subscribers \
     SET status = 'active', confirmed_at = ? \
     WHERE email = ?";

pub const DEACTIVATE_SUBSCRIBER: &str = "UPDATE newsletter_subscribers \
     SET status = 'unsubscribed', unsubscribed_at = ? \
     WHERE email = ?";

pub const SELECT_SUBSCRIBERS: &str =
    "SELECT id, email, status, created_at, confirmed_at, unsubscribed_at \
     FROM newsletter_subscribers \
     ORDER BY id DESC";

pub const SELECT_ACTIVE_SUBSCRIBER_IDS: &str =
    "SELECT id FROM newsletter_subscribers WHERE status = 'active' ORDER BY id";

pub const DELETE_SUBSCRIBER_BY_ID: &str = "DELETE FROM newsletter_subscribers WHERE id = ?";

pub const DELETE_SUBSCRIBER_BY_EMAIL: &str = "DELETE FROM newsletter_subscribers WHERE email = ?";

// Campaigns

pub const UPSERT_CAMPAIGN: &str =
    "INSERT INTO campaigns (source, subject, html, status, scheduled_at, created_at) \
     VALUES (?, ?, ?, 'scheduled', ?, ?) \
     ON CONFLICT (source) DO UPDATE SET source = excluded.source \
     RETURNING id";

pub const SELECT_CAMPAIGN_ID_BY_SOURCE: &str = "SELECT id FROM campaigns WHERE source = ?";

pub const SELECT_CAMPAIGN_BY_ID: &str =
    "SELECT id, source, subject, html, status, scheduled_at, created_at \
     FROM campaigns WHERE id = ?";

pub const UPDATE_CAMPAIGN_STATUS: &str = "UPDATE campaigns SET status = ? WHERE id = ?";

pub const SELECT_UNSETTLED_CAMPAIGNS: &str = "SELECT c.id, c.status FROM campaigns c \
     WHERE c.status = 'scheduled' \
        OR EXISTS (SELECT 1 FROM messages m WHERE m.campaign_id = c.id AND m.status = 'queued') \
     ORDER BY c.id";

// Messages

pub const INSERT_QUEUED_MESSAGE: &str =
    "INSERT INTO messages (campaign_id, subscriber_id, status, created_at) \
     VALUES (?, ?, 'queued', ?) \
     ON CONFLICT (campaign_id, subscriber_id) DO NOTHING";

pub const SELECT_QUEUED_MESSAGES: &str = "SELECT m.id, m.campaign_id, m.subscriber_id, s.email, \
            s.status AS subscriber_status, c.subject, c.html \
     FROM messages m \
     JOIN newsletter_subscribers s ON s.id = m.subscriber_id \
     JOIN campaigns c ON c.id = m.campaign_id \
     WHERE m.status = 'queued' \
     ORDER BY m.id \
     LIMIT ?";

pub const MARK_MESSAGE_SENT: &str =
    "UPDATE messages SET status = 'sent', sent_at = ?, error = NULL WHERE id = ?";

pub const MARK_MESSAGE_FAILED: &str =
    "UPDATE messages SET status = 'failed', error = ? WHERE id = ?";

pub const COUNT_MESSAGES_BY_STATUS: &str = "SELECT status, COUNT(*) AS count \
     FROM messages WHERE campaign_id = ? \
     GROUP BY status";

// Health

pub const PING: &str = "SELECT 1";
