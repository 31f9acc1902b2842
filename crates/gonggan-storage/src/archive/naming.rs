//! Entry and file naming rules.

use std::collections::HashSet;
use std::fmt::Display;
use std::sync::LazyLock;

use chrono::{DateTime, TimeZone};
use gonggan_models::Note;
use regex::Regex;

use super::ARCHIVE_EXTENSION;

static TITLE_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9가-힣]").expect("valid title regex"));

static SLUG_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9가-힣\s]").expect("valid slug regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const SLUG_MAX_CHARS: usize = 20;
const EMPTY_SLUG: &str = "memo";

/// Replace every character outside letters, digits and Hangul with `_`.
pub fn sanitize_title(title: &str) -> String {
    TITLE_UNSAFE.replace_all(title, "_").into_owned()
}

/// `<sanitized title>_<YYYYMMDDHHmm>.gonggan`, stamped in the given zone.
pub fn export_file_name<Tz>(title: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}_{}.{}",
        sanitize_title(title),
        at.format("%Y%m%d%H%M"),
        ARCHIVE_EXTENSION
    )
}

/// Slug derived from the first line of a note.
pub fn note_slug(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default().trim();
    let head: String = first_line.chars().take(SLUG_MAX_CHARS).collect();
    let cleaned = SLUG_UNSAFE.replace_all(&head, "");
    let slug = WHITESPACE_RUN.replace_all(cleaned.trim(), "_");
    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug.into_owned()
    }
}

/// `<slug>_<last 4 chars of id>.txt`
pub fn note_file_name(note: &Note) -> String {
    format!("{}_{}.txt", note_slug(&note.content), note.short_id())
}

/// Hands out entry names that are unique within one archive.
#[derive(Debug, Default)]
pub(crate) struct EntryNames {
    taken: HashSet<String>,
}

impl EntryNames {
    /// Claim `name`, or `<stem> (n).<ext>` when it is already taken.
    pub(crate) fn claim_file(&mut self, name: &str) -> String {
        self.claim(name, |n| numbered_name(name, n))
    }

    /// Claim `name`, or `<stem>_<n>.txt` when it is already taken.
    pub(crate) fn claim_note(&mut self, name: &str) -> String {
        let stem = name.strip_suffix(".txt").unwrap_or(name);
        self.claim(name, |n| format!("{stem}_{n}.txt"))
    }

    fn claim(&mut self, name: &str, variant: impl Fn(usize) -> String) -> String {
        let mut candidate = name.to_string();
        let mut n = 1;
        while self.taken.contains(&candidate) {
            candidate = variant(n);
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

/// `<stem> (n).<ext>`
pub(crate) fn numbered_name(name: &str, n: usize) -> String {
    match split_extension(name) {
        (stem, Some(ext)) => format!("{stem} ({n}).{ext}"),
        (stem, None) => format!("{stem} ({n})"),
    }
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_sanitize_title_keeps_hangul() {
        assert_eq!(sanitize_title("My 공간/v2!"), "My_공간_v2_");
        assert_eq!(sanitize_title("abc"), "abc");
    }

    #[test]
    fn test_export_file_name() {
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(
            export_file_name("소설 쓰기", &at),
            "소설_쓰기_202603090705.gonggan"
        );
    }

    #[test]
    fn test_note_slug_rules() {
        assert_eq!(note_slug("  Hello,   world! \nsecond"), "Hello_world");
        assert_eq!(note_slug("회의 메모: 3월"), "회의_메모_3월");
        assert_eq!(note_slug("!!!"), "memo");
        assert_eq!(note_slug(""), "memo");
        assert_eq!(note_slug("abcdefghijklmnopqrstuvwxyz"), "abcdefghijklmnopqrst");
    }

    #[test]
    fn test_note_file_name_uses_id_suffix() {
        let mut note = Note::new("Idea\nmore");
        note.id = "note-1234abcd".into();
        assert_eq!(note_file_name(&note), "Idea_abcd.txt");
        note.id = "ab".into();
        assert_eq!(note_file_name(&note), "Idea_ab.txt");
    }

    #[test]
    fn test_duplicate_file_names_get_counters() {
        let mut names = EntryNames::default();
        assert_eq!(names.claim_file("a.pdf"), "a.pdf");
        assert_eq!(names.claim_file("a.pdf"), "a (1).pdf");
        assert_eq!(names.claim_file("a.pdf"), "a (2).pdf");
        assert_eq!(names.claim_file("README"), "README");
        assert_eq!(names.claim_file("README"), "README (1)");
    }

    #[test]
    fn test_duplicate_note_names_get_suffix() {
        let mut names = EntryNames::default();
        assert_eq!(names.claim_note("memo_abcd.txt"), "memo_abcd.txt");
        assert_eq!(names.claim_note("memo_abcd.txt"), "memo_abcd_1.txt");
    }
}
