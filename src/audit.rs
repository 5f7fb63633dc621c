//! Append-only, human-readable audit files, one text blob per file type
//! under the `<slug>_backup` key. Pure side channel: nothing reads these back
//! programmatically, and a failed append never blocks the mutation it
//! mirrors.

use crate::error::{PortalError, PortalResult};
use crate::store::SharedStore;
use crate::utils::now_utc_iso;

const ENTRY_RULE: &str = "----------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditFile {
    StudentProgress,
    UserEvents,
    DownloadHistory,
    CourseEnrollments,
    EventRegistrations,
    ChatHistory,
    UserActions,
    GeneralForms,
    Donations,
    /// Unknown file types still get a blob, with the generic entry layout.
    Custom(String),
}

impl AuditFile {
    pub fn slug(&self) -> String {
        match self {
            AuditFile::StudentProgress => "student_progress".to_string(),
            AuditFile::UserEvents => "user_events".to_string(),
            AuditFile::DownloadHistory => "download_history".to_string(),
            AuditFile::CourseEnrollments => "course_enrollments".to_string(),
            AuditFile::EventRegistrations => "event_registrations".to_string(),
            AuditFile::ChatHistory => "chat_history".to_string(),
            AuditFile::UserActions => "user_actions".to_string(),
            AuditFile::GeneralForms => "general_forms".to_string(),
            AuditFile::Donations => "donations".to_string(),
            AuditFile::Custom(slug) => slug
                .chars()
                .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
                .collect(),
        }
    }

    pub fn key(&self) -> String {
        format!("{}_backup", self.slug())
    }

    fn title(&self) -> String {
        match self {
            AuditFile::StudentProgress => "Student Progress".to_string(),
            AuditFile::UserEvents => "User Events".to_string(),
            AuditFile::DownloadHistory => "Download History".to_string(),
            AuditFile::CourseEnrollments => "Course Enrollments".to_string(),
            AuditFile::EventRegistrations => "Event Registrations".to_string(),
            AuditFile::ChatHistory => "Chat History".to_string(),
            AuditFile::UserActions => "User Actions".to_string(),
            AuditFile::GeneralForms => "Contact Submissions".to_string(),
            AuditFile::Donations => "Donations".to_string(),
            AuditFile::Custom(slug) => slug.clone(),
        }
    }

    /// Counter noun in the `Total X: N` header line.
    fn noun(&self) -> &str {
        match self {
            AuditFile::StudentProgress => "Progress Updates",
            AuditFile::UserEvents => "Events",
            AuditFile::DownloadHistory => "Downloads",
            AuditFile::CourseEnrollments => "Enrollments",
            AuditFile::EventRegistrations => "Registrations",
            AuditFile::ChatHistory => "Messages",
            AuditFile::UserActions => "Actions",
            AuditFile::GeneralForms => "Submissions",
            AuditFile::Donations => "Donations",
            AuditFile::Custom(_) => "Entries",
        }
    }

    fn entry_heading(&self) -> &str {
        match self {
            AuditFile::StudentProgress => "New Progress Update",
            AuditFile::UserEvents => "New User Event",
            AuditFile::DownloadHistory => "New Download",
            AuditFile::CourseEnrollments => "New Course Enrollment",
            AuditFile::EventRegistrations => "New Event Registration",
            AuditFile::ChatHistory => "New Chat Message",
            AuditFile::UserActions => "New User Action",
            AuditFile::GeneralForms => "New Contact Submission",
            AuditFile::Donations => "New Donation Received",
            AuditFile::Custom(_) => "New Entry",
        }
    }
}

#[derive(Clone)]
pub struct AuditLog {
    store: SharedStore,
}

impl AuditLog {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Appends one formatted entry and bumps the running total in the file's
    /// own header. The counter line is matched only within the header block
    /// of this file's blob, never inside appended entries; the site's
    /// scripts matched the first "Total" line anywhere in the concatenated
    /// text, which could hit the wrong file.
    pub fn append(&self, file: &AuditFile, fields: &[(&str, String)]) -> PortalResult<()> {
        let key = file.key();
        let blob = match self.store.get(&key) {
            Ok(Some(blob)) => blob,
            Ok(None) => synthesize_header(file),
            Err(err) => {
                tracing::warn!(file = %key, error = ?err, "audit read failed, starting fresh blob");
                synthesize_header(file)
            }
        };

        // Header is everything before the first blank line; entries never
        // get scanned for counter lines.
        let (header, entries) = match blob.split_once("\n\n") {
            Some((header, entries)) => (header.to_string(), entries.to_string()),
            None => (blob.trim_end_matches('\n').to_string(), String::new()),
        };
        let header = bump_counter(&header, file);
        let entry = format_entry(file, fields);
        let blob = format!("{header}\n\n{entries}{entry}");

        self.store.set(&key, &blob).map_err(PortalError::Store)
    }

    /// The raw blob, for display only.
    pub fn read(&self, file: &AuditFile) -> Option<String> {
        self.store.get(&file.key()).ok().flatten()
    }

    /// Running total parsed from the header, zero when the file is absent.
    pub fn entry_count(&self, file: &AuditFile) -> usize {
        let Some(blob) = self.read(file) else {
            return 0;
        };
        let header = blob.split_once("\n\n").map(|(h, _)| h).unwrap_or(&blob);
        header
            .lines()
            .find_map(|line| {
                let rest = line.strip_prefix("Total ")?;
                rest.rsplit_once(": ")?.1.trim().parse().ok()
            })
            .unwrap_or(0)
    }
}

fn synthesize_header(file: &AuditFile) -> String {
    let title = format!("{} Log", file.title());
    let underline = "=".repeat(title.len());
    format!(
        "{title}\n{underline}\nCreated: {}\nTotal {}: 0",
        now_utc_iso(),
        file.noun()
    )
}

/// Increments the `Total X: N` counter line within the header block.
fn bump_counter(header: &str, file: &AuditFile) -> String {
    let mut bumped = false;
    let lines: Vec<String> = header
        .lines()
        .map(|line| {
            if !bumped && line.starts_with("Total ") {
                if let Some((label, count)) = line.rsplit_once(": ") {
                    if let Ok(n) = count.trim().parse::<usize>() {
                        bumped = true;
                        return format!("{label}: {}", n + 1);
                    }
                }
            }
            line.to_string()
        })
        .collect();
    let mut header = lines.join("\n");

    // A hand-edited or truncated header loses its counter line; restore it
    // rather than silently stopping the count.
    if !bumped {
        header.push_str(&format!("\nTotal {}: 1", file.noun()));
    }
    header
}

fn format_entry(file: &AuditFile, fields: &[(&str, String)]) -> String {
    let heading = file.entry_heading();
    let underline = "=".repeat(heading.len());
    let mut entry = format!("{heading}\n{underline}\nTimestamp: {}\n", now_utc_iso());
    for (name, value) in fields {
        entry.push_str(&format!("{name}: {value}\n"));
    }
    entry.push_str(ENTRY_RULE);
    entry.push_str("\n\n");
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn log() -> AuditLog {
        AuditLog::new(MemoryStore::shared())
    }

    #[test]
    fn first_append_synthesizes_header_with_counter() {
        let log = log();
        log.append(&AuditFile::Donations, &[("Amount", "0.5 BTC".into())])
            .unwrap();

        let blob = log.read(&AuditFile::Donations).expect("blob");
        assert!(blob.starts_with("Donations Log\n============="));
        assert!(blob.contains("Total Donations: 1"));
        assert!(blob.contains("New Donation Received"));
        assert!(blob.contains("Amount: 0.5 BTC"));
    }

    #[test]
    fn counter_tracks_append_count() {
        let log = log();
        for i in 0..5 {
            log.append(
                &AuditFile::StudentProgress,
                &[("Progress", format!("{}%", i * 10))],
            )
            .unwrap();
        }
        assert_eq!(log.entry_count(&AuditFile::StudentProgress), 5);

        let blob = log.read(&AuditFile::StudentProgress).expect("blob");
        assert_eq!(blob.matches("New Progress Update").count(), 5);
    }

    #[test]
    fn counter_update_ignores_total_lines_inside_entries() {
        let log = log();
        log.append(
            &AuditFile::GeneralForms,
            &[("Message", "Total Submissions: 999".into())],
        )
        .unwrap();
        log.append(&AuditFile::GeneralForms, &[("Message", "hi".into())])
            .unwrap();

        assert_eq!(log.entry_count(&AuditFile::GeneralForms), 2);
        let blob = log.read(&AuditFile::GeneralForms).expect("blob");
        assert!(blob.contains("Total Submissions: 999"));
    }

    #[test]
    fn files_keep_independent_counters() {
        let log = log();
        log.append(&AuditFile::UserActions, &[("Action", "login".into())])
            .unwrap();
        log.append(&AuditFile::ChatHistory, &[("From", "bot".into())])
            .unwrap();
        log.append(&AuditFile::UserActions, &[("Action", "logout".into())])
            .unwrap();

        assert_eq!(log.entry_count(&AuditFile::UserActions), 2);
        assert_eq!(log.entry_count(&AuditFile::ChatHistory), 1);
    }

    #[test]
    fn unknown_file_type_gets_generic_entry() {
        let log = log();
        let file = AuditFile::Custom("Quiz Attempts".into());
        log.append(&file, &[("Score", "7/10".into())]).unwrap();

        assert_eq!(file.key(), "quiz_attempts_backup");
        let blob = log.read(&file).expect("blob");
        assert!(blob.contains("New Entry"));
        assert!(blob.contains("Total Entries: 1"));
    }
}
