use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use gonggan_models::{
    FileKind, GeneratedImage, ImageData, ImageStatus, Message, Note, Sender, Space, SpaceFile,
    Thread,
};
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use super::*;
use crate::error::ArchiveError;

fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
    zip.file_names().map(str::to_string).collect()
}

fn entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = zip.by_name(name).unwrap();
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    out
}

fn sample_space() -> Space {
    let mut space = Space::new("소설 작업실");
    space.description = "draft".into();
    space.instructions = "Answer tersely".into();
    space.web_search_enabled = false;
    space.last_active = at(1_767_322_245_678);

    let mut user = Message::user("why?").with_quoted_context("the sky is blue");
    user.timestamp = at(1_767_322_000_001);
    let mut reply = Message::ai_text("because");
    reply.timestamp = at(1_767_322_000_002);
    let mut picture = Message::ai_image(ImageData::new("image/jpeg", vec![0xff, 0xd8, 0x00]));
    picture.timestamp = at(1_767_322_000_003);

    let mut thread = Thread::new("first");
    thread.last_message_at = at(1_767_322_000_003);
    thread.messages = vec![Arc::new(user), Arc::new(reply), Arc::new(picture)];
    let mut empty = Thread::new("empty");
    empty.last_message_at = at(1_767_000_000_000);
    space.threads = vec![Arc::new(thread), Arc::new(empty)];

    let mut pdf = SpaceFile::upload("report.pdf", Some("application/pdf"), vec![1, 2, 3, 0, 255]);
    pdf.added_at = at(1_767_100_000_000);
    let mut dup = SpaceFile::upload("report.pdf", Some("application/pdf"), vec![9, 9]);
    dup.added_at = at(1_767_100_000_001);
    let mut link = SpaceFile::link("https://example.com/a");
    link.added_at = at(1_767_100_000_002);
    space.files = vec![Arc::new(pdf), Arc::new(dup), Arc::new(link)];

    let mut done = GeneratedImage::placeholder("cat", "1:1", "1K");
    done.created_at = at(1_767_200_000_000);
    assert!(done.complete(ImageData::png(vec![0x89, b'P', b'N', b'G'])));
    let mut failed = GeneratedImage::placeholder("dog", "16:9", "2K");
    failed.created_at = at(1_767_200_000_001);
    assert!(failed.fail());
    let mut pending = GeneratedImage::placeholder("owl", "3:4", "1K");
    pending.created_at = at(1_767_200_000_002);
    space.generated_images = vec![Arc::new(done), Arc::new(failed), Arc::new(pending)];

    let mut note = Note::new("회의 메모\n내용");
    note.created_at = at(1_767_300_000_000);
    space.notes = vec![Arc::new(note)];

    space
}

#[test]
fn test_round_trip_preserves_everything_but_space_id() {
    let space = sample_space();
    let bytes = write_archive(&space).unwrap();
    let ImportedSpace {
        space: mut imported,
        warnings,
    } = read_archive(&bytes).unwrap();

    assert!(warnings.is_empty(), "{warnings:?}");
    assert_ne!(imported.id, space.id);
    imported.id = space.id.clone();
    assert_eq!(imported, space);
}

#[test]
fn test_payload_bytes_survive_unchanged() {
    let space = sample_space();
    let imported = read_archive(&write_archive(&space).unwrap()).unwrap().space;

    for (before, after) in space.files.iter().zip(&imported.files) {
        assert_eq!(
            before.data.as_deref().map(digest),
            after.data.as_deref().map(digest),
            "{}",
            before.name
        );
    }
    let before = space.generated_images[0].image.as_ref().unwrap();
    let after = imported.generated_images[0].image.as_ref().unwrap();
    assert_eq!(digest(&before.bytes), digest(&after.bytes));
}

#[test]
fn test_entry_layout() {
    let space = sample_space();
    let bytes = write_archive(&space).unwrap();
    let names = entry_names(&bytes);
    let image_id = &space.generated_images[0].id;
    let note = &space.notes[0];

    assert_eq!(names[0], METADATA_ENTRY);
    for expected in [
        THREADS_ENTRY.to_string(),
        FILES_MANIFEST_ENTRY.to_string(),
        GALLERY_ENTRY.to_string(),
        NOTES_ENTRY.to_string(),
        "files/report.pdf".to_string(),
        "files/report (1).pdf".to_string(),
        format!("images/img_{image_id}.png"),
        format!("notes/회의_메모_{}.txt", note.short_id()),
    ] {
        assert!(names.contains(&expected), "missing {expected}: {names:?}");
    }
    assert_eq!(
        names.iter().filter(|n| n.starts_with("images/")).count(),
        1,
        "only completed images carry a payload"
    );

    let metadata: serde_json::Value =
        serde_json::from_slice(&entry(&bytes, METADATA_ENTRY)).unwrap();
    assert_eq!(metadata["version"], FORMAT_VERSION);
    assert_eq!(metadata["lastActive"], "2026-01-02T02:50:45.678Z");
    assert_eq!(metadata["webSearchEnabled"], false);

    let manifest: serde_json::Value =
        serde_json::from_slice(&entry(&bytes, FILES_MANIFEST_ENTRY)).unwrap();
    assert!(manifest[0].get("entryName").is_none());
    assert_eq!(manifest[1]["entryName"], "report (1).pdf");
    assert_eq!(manifest[2]["hasContent"], false);
    assert_eq!(manifest[2]["type"], "link");

    let threads: serde_json::Value =
        serde_json::from_slice(&entry(&bytes, THREADS_ENTRY)).unwrap();
    let image_message = &threads[0]["messages"][2];
    assert_eq!(image_message["contentType"], "IMAGE");
    assert_eq!(image_message["content"], "data:image/jpeg;base64,/9gA");
    assert_eq!(threads[0]["messages"][0]["quotedContext"], "the sky is blue");
}

#[test]
fn test_same_space_writes_same_bytes() {
    let space = sample_space();
    assert_eq!(write_archive(&space).unwrap(), write_archive(&space).unwrap());
}

#[test]
fn test_missing_metadata_is_fatal() {
    let bytes = zip_of(&[(THREADS_ENTRY, b"[]")]);
    let err = read_archive(&bytes).unwrap_err();
    assert!(matches!(err, ArchiveError::MissingMetadata));
}

#[test]
fn test_malformed_threads_names_the_entry() {
    let bytes = zip_of(&[
        (METADATA_ENTRY, br#"{"title":"x"}"#),
        (THREADS_ENTRY, b"{not json"),
    ]);
    match read_archive(&bytes).unwrap_err() {
        ArchiveError::MalformedEntry { entry, .. } => assert_eq!(entry, THREADS_ENTRY),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_not_a_zip_is_an_error() {
    assert!(matches!(
        read_archive(b"plain text").unwrap_err(),
        ArchiveError::Zip(_)
    ));
}

#[test]
fn test_legacy_messages_migrate_into_one_thread() {
    let messages = r#"[
        {"id":"m1","type":"USER","contentType":"TEXT","content":"hi","timestamp":"2024-05-01T10:00:00.000Z"},
        {"id":"m2","type":"AI","contentType":"TEXT","content":"hello","timestamp":"2024-05-01T10:00:01.000Z","isStreaming":true},
        {"id":"m3","type":"USER","contentType":"TEXT","content":"[인용된 컨텍스트]:\n\"hello\"\n\n[사용자 질문]:\nmeaning?","timestamp":"2024-05-01T10:00:02.500Z"}
    ]"#;
    let bytes = zip_of(&[
        (METADATA_ENTRY, br#"{"title":"old","description":"d","isPrivate":false}"#),
        (LEGACY_MESSAGES_ENTRY, messages.as_bytes()),
    ]);

    let space = read_archive(&bytes).unwrap().space;
    assert_eq!(space.title, "old");
    assert!(!space.is_private);
    assert!(space.web_search_enabled);
    assert!(space.instructions.is_empty());
    assert!(space.files.is_empty());
    assert!(space.generated_images.is_empty());
    assert!(space.notes.is_empty());

    assert_eq!(space.threads.len(), 1);
    let thread = &space.threads[0];
    assert_eq!(thread.id, LEGACY_THREAD_ID);
    assert_eq!(thread.title, LEGACY_THREAD_TITLE);
    assert_eq!(thread.last_message_at, at(1_714_557_602_500));

    let ids: Vec<&str> = thread.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["m1", "m2", "m3"]);
    assert_eq!(thread.messages[1].sender, Sender::Ai);
    assert!(!thread.has_streaming());
    assert_eq!(thread.messages[2].text(), Some("meaning?"));
    assert_eq!(thread.messages[2].quoted_context.as_deref(), Some("hello"));
}

#[test]
fn test_empty_legacy_list_still_creates_thread() {
    let bytes = zip_of(&[
        (METADATA_ENTRY, br#"{"title":"old"}"#),
        (LEGACY_MESSAGES_ENTRY, b"[]"),
    ]);
    let space = read_archive(&bytes).unwrap().space;
    assert_eq!(space.threads.len(), 1);
    assert!(space.threads[0].messages.is_empty());
}

#[test]
fn test_missing_payloads_degrade_with_warnings() {
    let manifest = r#"[
        {"id":"f1","name":"gone.pdf","type":"pdf","size":"1 KB","addedAt":"2024-05-01T10:00:00.000Z","mimeType":"application/pdf","hasContent":true},
        {"id":"f2","name":"here.txt","type":"txt","addedAt":"2024-05-01T10:00:00.000Z","mimeType":"text/plain","hasContent":true},
        {"name":"https://x.dev","type":"link","addedAt":"2024-05-01T10:00:00.000Z","url":"https://x.dev","hasContent":true}
    ]"#;
    let gallery = r#"[
        {"id":"g1","prompt":"p","aspectRatio":"1:1","quality":"1K","createdAt":"2024-05-01T10:00:00.000Z","status":"completed","fileName":"img_g1.png"},
        {"id":"g2","prompt":"p","aspectRatio":"1:1","quality":"1K","createdAt":"2024-05-01T10:00:00.000Z","status":"completed","fileName":null}
    ]"#;
    let bytes = zip_of(&[
        (METADATA_ENTRY, br#"{"title":"t"}"#),
        (THREADS_ENTRY, b"[]"),
        (FILES_MANIFEST_ENTRY, manifest.as_bytes()),
        ("files/here.txt", b"ok"),
        (GALLERY_ENTRY, gallery.as_bytes()),
    ]);

    let ImportedSpace { space, warnings } = read_archive(&bytes).unwrap();

    assert_eq!(space.files.len(), 3);
    assert!(space.files[0].data.is_none());
    assert_eq!(space.files[1].data.as_deref(), Some(&b"ok"[..]));
    assert_eq!(space.files[2].kind, FileKind::Link);
    assert!(space.files[2].data.is_none());
    assert!(!space.files[2].id.is_empty());

    assert!(space.generated_images[0].image.is_none());
    assert!(space.generated_images[1].image.is_none());
    assert_eq!(space.generated_images[1].status, ImageStatus::Completed);

    assert_eq!(
        warnings,
        vec![
            ImportWarning::MissingFilePayload {
                file_id: "f1".into(),
                entry: "files/gone.pdf".into(),
            },
            ImportWarning::MissingGalleryImage {
                image_id: "g1".into(),
                entry: "images/img_g1.png".into(),
            },
        ]
    );
}

#[test]
fn test_newer_version_reads_best_effort() {
    let bytes = zip_of(&[
        (METADATA_ENTRY, br#"{"title":"future","version":"9.0","extra":1}"#),
        (THREADS_ENTRY, b"[]"),
    ]);
    let space = read_archive(&bytes).unwrap().space;
    assert_eq!(space.title, "future");
}

#[test]
fn test_streaming_flag_is_not_restored() {
    let mut space = Space::new("live");
    let mut thread = Thread::new("t");
    thread
        .messages
        .push(Arc::new(Message::streaming_placeholder("m1")));
    space.threads.push(Arc::new(thread));

    let imported = read_archive(&write_archive(&space).unwrap()).unwrap().space;
    assert!(!imported.threads[0].has_streaming());
}

#[test]
fn test_live_timestamps_round_trip() {
    let mut space = Space::new("live");
    let mut thread = Thread::new("t");
    thread.messages.push(Arc::new(Message::user("지금")));
    thread.messages.push(Arc::new(Message::ai_text("응답")));
    space.threads.push(Arc::new(thread));
    space.files.push(Arc::new(SpaceFile::link("https://example.com")));
    space
        .generated_images
        .push(Arc::new(GeneratedImage::placeholder("p", "1:1", "1K")));
    space.notes.push(Arc::new(Note::new("memo")));

    let mut imported = read_archive(&write_archive(&space).unwrap()).unwrap().space;
    imported.id = space.id.clone();
    assert_eq!(imported, space);
}

#[test]
fn test_gallery_keeps_non_png_mime_type() {
    let mut space = Space::new("사진");
    let mut photo = GeneratedImage::placeholder("cat", "1:1", "1K");
    assert!(photo.complete(ImageData::new("image/jpeg", vec![0xff, 0xd8])));
    space.generated_images.push(Arc::new(photo));

    let bytes = write_archive(&space).unwrap();
    let gallery: serde_json::Value =
        serde_json::from_slice(&entry(&bytes, GALLERY_ENTRY)).unwrap();
    assert_eq!(gallery[0]["mimeType"], "image/jpeg");

    let imported = read_archive(&bytes).unwrap().space;
    let image = imported.generated_images[0].image.as_ref().unwrap();
    assert_eq!(image.mime_type, "image/jpeg");
    assert_eq!(image.bytes, vec![0xff, 0xd8]);
}

/// Rewrite the single central directory record so it claims an absurd
/// uncompressed size through a zip64 extra field.
fn with_huge_size_claim(bytes: &[u8]) -> Vec<u8> {
    const CENTRAL_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];
    const END_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];

    let central = bytes
        .windows(4)
        .position(|w| w == CENTRAL_SIGNATURE)
        .unwrap();
    let end = bytes.windows(4).rposition(|w| w == END_SIGNATURE).unwrap();
    let name_len = u16::from_le_bytes([bytes[central + 28], bytes[central + 29]]) as usize;
    let extra_len = u16::from_le_bytes([bytes[central + 30], bytes[central + 31]]);

    let mut zip64 = vec![0x01, 0x00, 0x08, 0x00];
    zip64.extend_from_slice(&0xFFFF_FFFF_FFFF_FF00u64.to_le_bytes());

    let mut out = bytes.to_vec();
    out[central + 24..central + 28].copy_from_slice(&u32::MAX.to_le_bytes());
    out[central + 30..central + 32].copy_from_slice(&(extra_len + 12).to_le_bytes());
    let insert_at = central + 46 + name_len;
    out.splice(insert_at..insert_at, zip64);

    let end = end + 12;
    let cd_size = u32::from_le_bytes(out[end + 12..end + 16].try_into().unwrap());
    out[end + 12..end + 16].copy_from_slice(&(cd_size + 12).to_le_bytes());
    out
}

#[test]
fn test_declared_entry_size_is_not_trusted() {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file(
        METADATA_ENTRY,
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored),
    )
    .unwrap();
    zip.write_all(r#"{"title":"크기"}"#.as_bytes()).unwrap();
    let bytes = with_huge_size_claim(&zip.finish().unwrap().into_inner());

    let claimed = ZipArchive::new(Cursor::new(&bytes[..]))
        .unwrap()
        .by_name(METADATA_ENTRY)
        .unwrap()
        .size();
    assert_eq!(claimed, 0xFFFF_FFFF_FFFF_FF00);

    let space = read_archive(&bytes).unwrap().space;
    assert_eq!(space.title, "크기");
}
