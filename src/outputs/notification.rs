//! Deciding whether to notify, and what to say.
//!
//! [`build_notification`] is pure: it turns the run's new records into a
//! [`Notification`] or decides there is nothing to send. Delivery goes
//! through the [`Notifier`] trait so the transport stays outside the
//! pipeline. The bundled [`OutboxNotifier`] drops the rendered message into a
//! directory that an external mailer picks up.

use crate::config::NotificationSettings;
use crate::error::{Result, TenderError};
use crate::models::Batch;
use chrono::{DateTime, Local};
use std::fmt::Write;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// One new tender as shown in a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEntry {
    pub title: String,
    pub date: String,
    pub link: Option<String>,
}

/// New tenders of a single site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSection {
    pub site: String,
    pub entries: Vec<NotificationEntry>,
}

/// A message ready to hand to a [`Notifier`].
#[derive(Debug, Clone)]
pub struct Notification {
    pub subject: String,
    pub sender: String,
    pub recipient: String,
    pub generated_at: DateTime<Local>,
    /// Only sites with at least one new record.
    pub sections: Vec<SiteSection>,
}

impl Notification {
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    /// Render the message body as HTML.
    pub fn to_html(&self) -> String {
        let mut body = String::from("<html><body><h2>New Tenders Notification</h2>");
        for section in &self.sections {
            let _ = write!(body, "<h3>{}</h3><ul>", escape_html(&section.site));
            for entry in &section.entries {
                let _ = write!(
                    body,
                    "<li><strong>{}</strong> - {}",
                    escape_html(&entry.title),
                    escape_html(&entry.date)
                );
                if let Some(link) = &entry.link {
                    let _ = write!(body, " - <a href='{}'>Download/View</a>", escape_html(link));
                }
                body.push_str("</li>");
            }
            body.push_str("</ul>");
        }
        body.push_str("</body></html>");
        body
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build the notification for this run's new records.
///
/// # Returns
///
/// `None` when notifications are disabled or no site has a new record.
pub fn build_notification(
    new: &Batch,
    settings: &NotificationSettings,
    now: DateTime<Local>,
) -> Option<Notification> {
    if !settings.enabled {
        info!("Notifications are disabled");
        return None;
    }

    let sections: Vec<SiteSection> = new
        .iter()
        .filter(|(_, records)| !records.is_empty())
        .map(|(site, records)| SiteSection {
            site: site.clone(),
            entries: records
                .iter()
                .map(|r| NotificationEntry {
                    title: r.title.clone(),
                    date: r.date.clone(),
                    link: Some(r.link.clone()).filter(|l| !l.is_empty()),
                })
                .collect(),
        })
        .collect();

    if sections.is_empty() {
        info!("No new tenders to notify about");
        return None;
    }

    Some(Notification {
        subject: format!("New Tenders Notification - {}", now.format("%Y-%m-%d")),
        sender: settings.sender.clone(),
        recipient: settings.recipient.clone(),
        generated_at: now,
        sections,
    })
}

/// Delivery collaborator for notifications.
pub trait Notifier {
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Writes each notification as an HTML file into an outbox directory.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    dir: PathBuf,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Notifier for OutboxNotifier {
    #[instrument(level = "info", skip_all, fields(dir = %self.dir.display()))]
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        if notification.recipient.trim().is_empty() {
            return Err(TenderError::Delivery("no recipient configured".to_string()));
        }
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!(
            "notification_{}.html",
            notification.generated_at.format("%Y%m%d_%H%M%S")
        ));
        fs::write(&path, notification.to_html()).await?;
        info!(
            path = %path.display(),
            sender = %notification.sender,
            recipient = %notification.recipient,
            subject = %notification.subject,
            entries = notification.entry_count(),
            "Queued notification"
        );
        Ok(())
    }
}
