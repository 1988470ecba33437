use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-conversation card owned by the originating application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub tenant_id: String,
    pub conversation_id: String,
    pub last_message_preview: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryUpdate {
    pub last_message_preview: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: u32,
    pub updated_at: DateTime<Utc>,
}

impl SummaryUpdate {
    pub fn merge_into(&self, summary: &mut ConversationSummary) {
        summary.last_message_preview = self.last_message_preview.clone();
        summary.last_message_at = Some(self.last_message_at);
        summary.unread_count = self.unread_count;
        summary.updated_at = self.updated_at;
    }
}

/// Fixed preview shown on the conversation card for a message of the given type.
pub fn preview_for_attachment<'a>(attachment_type: Option<&str>, text: &'a str) -> &'a str {
    let kind = attachment_type.unwrap_or("text");
    let family = kind.split('/').next().unwrap_or(kind);
    match family {
        "text" => text,
        "video" => "🎥 Video",
        "image" => "📷 Image",
        "audio" => "🎤 Audio",
        _ => "📎 Attachment",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_depends_on_media_family() {
        assert_eq!(preview_for_attachment(Some("video/mp4"), "ignored"), "🎥 Video");
        assert_eq!(preview_for_attachment(Some("image/png"), ""), "📷 Image");
        assert_eq!(preview_for_attachment(Some("audio/ogg"), ""), "🎤 Audio");
        assert_eq!(preview_for_attachment(Some("application/pdf"), ""), "📎 Attachment");
        assert_eq!(preview_for_attachment(None, "hello"), "hello");
        assert_eq!(preview_for_attachment(Some("text"), "hello"), "hello");
    }
}
