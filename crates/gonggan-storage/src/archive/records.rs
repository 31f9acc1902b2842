//! JSON records stored inside the container.
//!
//! Field names follow the camelCase layout of the archive format so files
//! written by earlier releases keep importing.

use chrono::{DateTime, Utc};
use gonggan_models::{ContentKind, FileKind, ImageStatus, Sender};
use serde::{Deserialize, Serialize};

use crate::time_utils::iso8601;

fn default_true() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    /// Id of the exported space; informational only, imports mint a new one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "iso8601::option")]
    pub last_active: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_private: bool,
    #[serde(default)]
    pub instructions: String,
    #[serde(default = "default_true")]
    pub web_search_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRecord {
    pub id: String,
    pub title: String,
    #[serde(with = "iso8601")]
    pub last_message_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub sender: Sender,
    pub content_type: ContentKind,
    /// Text, or a `data:` URL for image messages.
    pub content: String,
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_streaming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Older manifests may omit the id.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(with = "iso8601")]
    pub added_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub has_content: bool,
    /// Entry under `files/` when it differs from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_name: Option<String>,
}

impl FileRecord {
    pub fn entry(&self) -> &str {
        self.entry_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryRecord {
    pub id: String,
    pub prompt: String,
    pub aspect_ratio: String,
    pub quality: String,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    pub status: ImageStatus,
    /// Entry under `images/`; null for images that were never completed.
    #[serde(default)]
    pub file_name: Option<String>,
    /// Payload type when it is not PNG. Absent in older archives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: String,
    pub content: String,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_defaults_for_older_archives() {
        let record: MetadataRecord =
            serde_json::from_str(r#"{"title":"Old","isPrivate":false}"#).unwrap();
        assert_eq!(record.title, "Old");
        assert!(!record.is_private);
        assert!(record.web_search_enabled);
        assert!(record.instructions.is_empty());
        assert!(record.last_active.is_none());
        assert!(record.version.is_none());
    }

    #[test]
    fn test_message_record_wire_names() {
        let record: MessageRecord = serde_json::from_str(
            r#"{"id":"m1","type":"AI","contentType":"TEXT","content":"hi",
                "timestamp":"2026-01-02T03:04:05.000Z","isStreaming":false}"#,
        )
        .unwrap();
        assert_eq!(record.sender, Sender::Ai);
        assert_eq!(record.content_type, ContentKind::Text);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "AI");
        assert_eq!(json["contentType"], "TEXT");
        assert!(json.get("isStreaming").is_none());
        assert!(json.get("quotedContext").is_none());
    }

    #[test]
    fn test_gallery_record_writes_null_file_name() {
        let record = GalleryRecord {
            id: "g1".into(),
            prompt: "p".into(),
            aspect_ratio: "1:1".into(),
            quality: "1K".into(),
            created_at: gonggan_models::now(),
            status: ImageStatus::Failed,
            file_name: None,
            mime_type: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["fileName"].is_null());
        assert!(json.get("mimeType").is_none());
        assert_eq!(json["status"], "failed");
    }

    #[test]
    fn test_file_record_entry_falls_back_to_name() {
        let record: FileRecord = serde_json::from_str(
            r#"{"name":"a.pdf","type":"pdf","addedAt":"2026-01-02T03:04:05.000Z","hasContent":true}"#,
        )
        .unwrap();
        assert!(record.id.is_none());
        assert_eq!(record.entry(), "a.pdf");
    }
}
