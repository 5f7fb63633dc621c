//! Dashboard flows for the logged-in user: subject progress, resource
//! downloads with badge awards, and course enrollment events.

use crate::audit::{AuditFile, AuditLog};
use crate::error::{PortalError, PortalResult};
use crate::session::SessionService;
use crate::store::collection::{Collection, IdStrategy};
use crate::store::models::{DownloadRecord, UserEventRecord, UserRecord};
use crate::store::SharedStore;

const USER_EVENTS_COLLECTION: &str = "userEvents";
const RESOURCES_SUBJECT: &str = "resources";
const RESOURCE_MASTER_BADGE: &str = "resource-master";
const DOWNLOAD_PROGRESS_STEP: u8 = 10;

#[derive(Clone)]
pub struct DashboardService {
    store: SharedStore,
    sessions: SessionService,
    audit: AuditLog,
}

impl DashboardService {
    pub fn new(store: SharedStore, sessions: SessionService) -> Self {
        let audit = AuditLog::new(store.clone());
        Self {
            store,
            sessions,
            audit,
        }
    }

    /// Sets a subject's completion percent for the current user, clamped to
    /// 0 through 100.
    pub fn update_progress(&self, subject: &str, percent: u8) -> PortalResult<UserRecord> {
        let mut user = self.require_user()?;
        let percent = percent.min(100);
        user.progress.insert(subject.to_string(), percent);
        let user = self.sessions.update_user(user)?;

        self.audit(
            AuditFile::StudentProgress,
            &[
                ("Student", user.username.clone()),
                ("Subject", subject.to_string()),
                ("Progress", format!("{percent}%")),
            ],
        );
        Ok(user)
    }

    /// Records a resource download: appends to the per-user history, bumps
    /// the resources progress by 10 capped at 100, and awards the
    /// resource-master badge once the bar fills.
    pub fn record_download(&self, resource: &str, kind: &str) -> PortalResult<DownloadRecord> {
        let mut user = self.require_user()?;

        let history = self.download_history(&user.username);
        let record = history.upsert(DownloadRecord {
            id: None,
            resource: resource.to_string(),
            kind: kind.to_string(),
            timestamp: String::new(),
        })?;

        let current = user.progress.get(RESOURCES_SUBJECT).copied().unwrap_or(0);
        let bumped = current.saturating_add(DOWNLOAD_PROGRESS_STEP).min(100);
        user.progress.insert(RESOURCES_SUBJECT.to_string(), bumped);
        if bumped >= 100 {
            user.badges.insert(RESOURCE_MASTER_BADGE.to_string());
        }
        let user = self.sessions.update_user(user)?;

        self.audit(
            AuditFile::DownloadHistory,
            &[
                ("Student", user.username.clone()),
                ("Resource", resource.to_string()),
                ("Type", kind.to_string()),
            ],
        );
        Ok(record)
    }

    /// Records a course enrollment as a user event and links it from the
    /// user's event list.
    pub fn enroll(&self, course: &str, level: &str) -> PortalResult<UserEventRecord> {
        let mut user = self.require_user()?;

        let events: Collection<UserEventRecord> = Collection::new(
            self.store.clone(),
            USER_EVENTS_COLLECTION,
            IdStrategy::Sequential,
        );
        let event = events.upsert(UserEventRecord {
            id: None,
            username: user.username.clone(),
            kind: "course_enrollment".to_string(),
            detail: format!("{course} ({level})"),
            timestamp: String::new(),
        })?;

        if let Some(id) = event.id.clone() {
            user.events.push(id);
        }
        let user = self.sessions.update_user(user)?;

        self.audit(
            AuditFile::CourseEnrollments,
            &[
                ("Student", user.username.clone()),
                ("Course", course.to_string()),
                ("Level", level.to_string()),
            ],
        );
        Ok(event)
    }

    pub fn download_history(&self, username: &str) -> Collection<DownloadRecord> {
        Collection::new(
            self.store.clone(),
            format!("downloadHistory_{username}"),
            IdStrategy::Sequential,
        )
    }

    fn require_user(&self) -> PortalResult<UserRecord> {
        self.sessions
            .current()
            .ok_or_else(|| PortalError::Validation("You must be logged in".to_string()))
    }

    fn audit(&self, file: AuditFile, fields: &[(&str, String)]) {
        if let Err(err) = self.audit.append(&file, fields) {
            tracing::warn!(error = ?err, "audit append failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SignupInput;
    use crate::store::models::AccountType;
    use crate::store::MemoryStore;

    fn setup() -> DashboardService {
        let store = MemoryStore::shared();
        let sessions = SessionService::new(store.clone());
        sessions
            .signup(SignupInput {
                first_name: "Alice".into(),
                last_name: "Mokoena".into(),
                username: "alice".into(),
                password: "longenoughpassword12".into(),
                account_type: AccountType::Student,
                dob: "2001-04-02".into(),
            })
            .expect("signup");
        DashboardService::new(store, sessions)
    }

    #[test]
    fn progress_updates_clamp_to_one_hundred() {
        let dashboard = setup();
        let user = dashboard.update_progress("mathematics", 250).unwrap();
        assert_eq!(user.progress.get("mathematics"), Some(&100));
    }

    #[test]
    fn operations_require_a_session() {
        let dashboard = setup();
        dashboard.sessions.logout().unwrap();
        assert!(matches!(
            dashboard.update_progress("mathematics", 10),
            Err(PortalError::Validation(_))
        ));
    }

    #[test]
    fn downloads_accumulate_history_and_progress() {
        let dashboard = setup();
        dashboard.record_download("Algebra Notes", "pdf").unwrap();
        dashboard.record_download("Kanji Deck", "deck").unwrap();

        let history = dashboard.download_history("alice").load();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].resource, "Algebra Notes");

        let user = dashboard.sessions.current().expect("session");
        assert_eq!(user.progress.get(RESOURCES_SUBJECT), Some(&20));
        assert!(!user.badges.contains(RESOURCE_MASTER_BADGE));
    }

    #[test]
    fn tenth_download_awards_resource_master() {
        let dashboard = setup();
        for i in 0..10 {
            dashboard
                .record_download(&format!("Resource {i}"), "pdf")
                .unwrap();
        }
        let user = dashboard.sessions.current().expect("session");
        assert_eq!(user.progress.get(RESOURCES_SUBJECT), Some(&100));
        assert!(user.badges.contains(RESOURCE_MASTER_BADGE));

        // Further downloads stay capped.
        dashboard.record_download("One more", "pdf").unwrap();
        let user = dashboard.sessions.current().expect("session");
        assert_eq!(user.progress.get(RESOURCES_SUBJECT), Some(&100));
    }

    #[test]
    fn enrollment_links_event_to_user() {
        let dashboard = setup();
        let event = dashboard.enroll("Japanese Immersion", "beginner").unwrap();
        assert_eq!(event.detail, "Japanese Immersion (beginner)");

        let user = dashboard.sessions.current().expect("session");
        assert_eq!(user.events.len(), 1);
        assert_eq!(user.events[0], event.id.unwrap());
    }
}
