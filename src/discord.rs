//! Discord rendering of status reports
//!
//! Builds the message payloads a Discord integration posts in reply to the
//! `status` and `add-server` commands. Nothing here talks to Discord.

use serde::Serialize;

use crate::registry::{HealthState, Target};
use crate::report::{ReportDetail, ReportEntry, StatusReport};

/// Discord allows at most this many embeds per message
const MAX_EMBEDS: usize = 10;

const COLOR_ONLINE: u32 = 3066993; // Green
const COLOR_OFFLINE: u32 = 15158332; // Red
const COLOR_UNKNOWN: u32 = 9807270; // Grey

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Default)]
pub struct MessageBuilder {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl ToString) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn build(self) -> Message {
        Message {
            content: self.content,
            embeds: self.embeds,
        }
    }
}

fn status_label(health: HealthState) -> &'static str {
    match health {
        HealthState::Online => "🟢 Online",
        HealthState::Offline => "🔴 Offline",
        HealthState::Unknown => "⚪ Unknown",
    }
}

fn field(name: &str, value: String) -> EmbedField {
    EmbedField {
        name: name.to_string(),
        value,
        inline: true,
    }
}

/// Render a full report as plain Discord markdown
pub fn status_markdown(report: &StatusReport) -> String {
    let mut message = String::from("# Server Status Report\n\n");
    for entry in &report.entries {
        message.push_str(&entry_markdown(entry));
        message.push('\n');
    }
    message
}

fn entry_markdown(entry: &ReportEntry) -> String {
    let mut message = format!("**{}** | {}\n", entry.name, status_label(entry.health));
    message += &format!(">>> URL: {}\n", entry.endpoint);
    message += &format!("Last Checked: {}\n", entry.last_checked);

    match &entry.detail {
        Some(ReportDetail::Metrics(metrics)) => {
            let or_na = |value: Option<String>| value.unwrap_or_else(|| "n/a".to_string());
            message += "**System Info:**\n";
            message += &format!("Hostname: `{}`\n", or_na(metrics.hostname.clone()));
            message += &format!("Platform: `{}`\n", or_na(metrics.platform.clone()));
            message += &format!(
                "Uptime: `{} hours`\n",
                or_na(metrics.uptime_hours.map(|h| h.to_string()))
            );
            message += &format!(
                "Memory Usage: `{}%`\n",
                or_na(metrics.memory_used_percent.map(|p| format!("{p:.2}")))
            );
            message += &format!(
                "CPU Usage: `{}%`\n",
                or_na(metrics.cpu_usage_percent.map(|p| format!("{p:.2}")))
            );
        }
        Some(ReportDetail::Error(error)) => {
            let heading = match error.kind {
                crate::monitors::FailureKind::Timeout => "Timeout Error",
                crate::monitors::FailureKind::ConnectionRefused => "Connection Error",
                crate::monitors::FailureKind::Other => "Error",
            };
            message += &format!("❌ **{heading}**: {}\n", error.message);
        }
        None => {}
    }

    message
}

/// Render a report as an embed-per-server message
///
/// Servers beyond Discord's embed limit are summarised in the content line.
pub fn status_message(report: &StatusReport) -> Message {
    let total = report.entries.len();
    let mut content = format!(
        "**Server Status Report** | {} online, {} offline, {} unknown",
        report.online, report.offline, report.unknown
    );
    if total > MAX_EMBEDS {
        content += &format!(" (showing first {MAX_EMBEDS} of {total})");
    }

    let timestamp = report.generated_at.to_rfc3339();

    report
        .entries
        .iter()
        .take(MAX_EMBEDS)
        .map(|entry| entry_embed(entry, &timestamp))
        .fold(MessageBuilder::new().content(content), |builder, embed| {
            builder.add_embed(embed)
        })
        .build()
}

fn entry_embed(entry: &ReportEntry, timestamp: &str) -> Embed {
    let color = match entry.health {
        HealthState::Online => COLOR_ONLINE,
        HealthState::Offline => COLOR_OFFLINE,
        HealthState::Unknown => COLOR_UNKNOWN,
    };

    let mut fields = vec![field("🕒 Last Checked", entry.last_checked.clone())];
    let mut description = None;

    match &entry.detail {
        Some(ReportDetail::Metrics(metrics)) => {
            if let Some(hostname) = &metrics.hostname {
                fields.push(field("🖥️ Hostname", format!("`{hostname}`")));
            }
            if let Some(platform) = &metrics.platform {
                fields.push(field("📦 Platform", format!("`{platform}`")));
            }
            if let Some(hours) = metrics.uptime_hours {
                fields.push(field("⏱️ Uptime", format!("{hours} hours")));
            }
            if let Some(memory) = metrics.memory_used_percent {
                fields.push(field("🧠 Memory Usage", format!("{memory:.1}%")));
            }
            if let Some(cpu) = metrics.cpu_usage_percent {
                fields.push(field("💻 CPU Usage", format!("{cpu:.1}%")));
            }
        }
        Some(ReportDetail::Error(error)) => {
            description = Some(format!("❌ {}", error.message));
        }
        None => {}
    }

    Embed {
        title: Some(format!("{} | {}", entry.name, status_label(entry.health))),
        description,
        color: Some(color),
        fields,
        footer: Some(EmbedFooter {
            text: entry.endpoint.clone(),
        }),
        timestamp: Some(timestamp.to_string()),
    }
}

/// Confirmation for a successful `add-server`
pub fn added_message(target: &Target) -> Message {
    MessageBuilder::new()
        .content(format!("Added server: {} ({})", target.name, target.endpoint))
        .build()
}
