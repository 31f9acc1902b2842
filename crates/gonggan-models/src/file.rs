//! Context files attached to a space.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts")]
use ts_rs::TS;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Doc,
    Image,
    Txt,
    Link,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Doc => "doc",
            FileKind::Image => "image",
            FileKind::Txt => "txt",
            FileKind::Link => "link",
        }
    }
}

/// A context artifact attached to a space.
///
/// Every kind except `link` carries an inline payload; `link` carries a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SpaceFile {
    pub id: String,
    pub name: String,
    pub kind: FileKind,
    #[serde(default)]
    pub size: Option<String>,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default, with = "crate::encoding::base64_bytes::option")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub data: Option<Vec<u8>>,
    #[serde(default)]
    pub url: Option<String>,
}

impl SpaceFile {
    /// Build a file from uploaded bytes, inferring kind and size label.
    pub fn upload(name: impl Into<String>, mime_type: Option<&str>, data: Vec<u8>) -> Self {
        let name = name.into();
        let mime = mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or("application/octet-stream")
            .to_string();
        Self {
            id: crate::new_id(),
            kind: infer_file_kind(&name, &mime),
            size: Some(size_label(data.len())),
            name,
            added_at: crate::now(),
            mime_type: Some(mime),
            data: Some(data),
            url: None,
        }
    }

    pub fn link(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: crate::new_id(),
            name: url.clone(),
            kind: FileKind::Link,
            size: None,
            added_at: crate::now(),
            mime_type: None,
            data: None,
            url: Some(url),
        }
    }

    /// Whether an inline payload is present and meaningful for this kind.
    pub fn has_payload(&self) -> bool {
        self.kind != FileKind::Link && self.data.is_some()
    }
}

/// Classify an upload by MIME type first, then by extension.
pub fn infer_file_kind(name: &str, mime_type: &str) -> FileKind {
    let name = name.to_ascii_lowercase();
    if mime_type.contains("pdf") {
        FileKind::Pdf
    } else if mime_type.contains("image") {
        FileKind::Image
    } else if name.ends_with(".doc") || name.ends_with(".docx") {
        FileKind::Doc
    } else {
        FileKind::Txt
    }
}

/// Human readable size: whole KB below one megabyte, one decimal MB above.
pub fn size_label(len: usize) -> String {
    let len = len as f64;
    if len < MIB {
        format!("{:.0} KB", len / KIB)
    } else {
        format!("{:.1} MB", len / MIB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_file_kind() {
        assert_eq!(infer_file_kind("a.pdf", "application/pdf"), FileKind::Pdf);
        assert_eq!(infer_file_kind("a.png", "image/png"), FileKind::Image);
        assert_eq!(
            infer_file_kind("Report.DOCX", "application/octet-stream"),
            FileKind::Doc
        );
        assert_eq!(infer_file_kind("notes.md", "text/markdown"), FileKind::Txt);
    }

    #[test]
    fn test_size_label() {
        assert_eq!(size_label(0), "0 KB");
        assert_eq!(size_label(2048), "2 KB");
        assert_eq!(size_label(3 * 1024 * 1024 + 512 * 1024), "3.5 MB");
    }

    #[test]
    fn test_link_has_no_payload() {
        let link = SpaceFile::link("https://example.com");
        assert_eq!(link.kind, FileKind::Link);
        assert_eq!(link.url.as_deref(), Some("https://example.com"));
        assert!(!link.has_payload());

        let upload = SpaceFile::upload("a.txt", Some("text/plain"), b"hi".to_vec());
        assert!(upload.has_payload());
        assert_eq!(upload.mime_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_payload_serializes_as_base64() {
        let upload = SpaceFile::upload("a.txt", None, b"hi".to_vec());
        let json = serde_json::to_value(&upload).unwrap();
        assert_eq!(json["data"], "aGk=");
        assert_eq!(json["mimeType"], "application/octet-stream");
    }
}
