//! Current-user session context. At most one active user, held under the
//! `currentUser` key outside any collection; every surface reads it on load
//! to decide what to render.

use crate::audit::{AuditFile, AuditLog};
use crate::error::{PortalError, PortalResult};
use crate::store::collection::{Collection, IdStrategy};
use crate::store::models::{AccountType, UserRecord};
use crate::store::SharedStore;
use std::collections::{BTreeMap, BTreeSet};

pub const SESSION_KEY: &str = "currentUser";
const USERS_COLLECTION: &str = "userData";
const MIN_PASSWORD_LEN: usize = 12;

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub account_type: AccountType,
    pub dob: String,
}

#[derive(Clone)]
pub struct SessionService {
    store: SharedStore,
    users: Collection<UserRecord>,
    audit: AuditLog,
}

impl SessionService {
    pub fn new(store: SharedStore) -> Self {
        let users = Collection::new(store.clone(), USERS_COLLECTION, IdStrategy::Sequential);
        let audit = AuditLog::new(store.clone());
        Self {
            store,
            users,
            audit,
        }
    }

    pub fn users(&self) -> &Collection<UserRecord> {
        &self.users
    }

    /// Exact username and password match against the users collection. The
    /// two failure causes are deliberately indistinguishable.
    pub fn login(&self, username: &str, password: &str) -> PortalResult<UserRecord> {
        let user = self
            .users
            .load()
            .into_iter()
            .find(|u| u.username == username && u.password == password)
            .ok_or(PortalError::Auth)?;

        self.set_session(&user)?;
        self.audit_action("login", username);
        Ok(user)
    }

    /// Creates the account, persists it, and establishes the session.
    pub fn signup(&self, input: SignupInput) -> PortalResult<UserRecord> {
        if input.username.trim().is_empty() {
            return Err(PortalError::Validation("Username is required".to_string()));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PortalError::Validation(
                "Password must be at least 12 characters long".to_string(),
            ));
        }
        if self.users.exists(|u| u.username == input.username) {
            return Err(PortalError::Validation(
                "Username already exists".to_string(),
            ));
        }

        let user = self.users.upsert(UserRecord {
            id: None,
            first_name: input.first_name,
            last_name: input.last_name,
            username: input.username,
            password: input.password,
            account_type: input.account_type,
            dob: input.dob,
            join_date: String::new(),
            progress: BTreeMap::new(),
            badges: BTreeSet::new(),
            events: Vec::new(),
        })?;

        self.set_session(&user)?;
        self.audit_action("signup", &user.username);
        Ok(user)
    }

    pub fn logout(&self) -> PortalResult<()> {
        let username = self.current().map(|u| u.username);
        self.store.remove(SESSION_KEY).map_err(PortalError::Store)?;
        if let Some(username) = username {
            self.audit_action("logout", &username);
        }
        Ok(())
    }

    /// Clears the session only; collections are untouched. The caller is
    /// expected to navigate back to the login surface.
    pub fn switch_account(&self) -> PortalResult<()> {
        self.store.remove(SESSION_KEY).map_err(PortalError::Store)
    }

    /// The active user, or None when logged out or the session is unreadable.
    pub fn current(&self) -> Option<UserRecord> {
        let raw = self.store.get(SESSION_KEY).ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!(error = ?err, "corrupt session, treating as logged out");
                None
            }
        }
    }

    /// Persists a mutated user and refreshes the session copy when it points
    /// at the same account.
    pub fn update_user(&self, user: UserRecord) -> PortalResult<UserRecord> {
        let user = self.users.upsert(user)?;
        if self.current().is_some_and(|c| c.id == user.id) {
            self.set_session(&user)?;
        }
        Ok(user)
    }

    fn set_session(&self, user: &UserRecord) -> PortalResult<()> {
        let raw = serde_json::to_string(user)
            .map_err(|err| PortalError::Store(anyhow::Error::from(err)))?;
        self.store.set(SESSION_KEY, &raw).map_err(PortalError::Store)
    }

    fn audit_action(&self, action: &str, username: &str) {
        let fields = [
            ("Action", action.to_string()),
            ("Username", username.to_string()),
        ];
        if let Err(err) = self.audit.append(&AuditFile::UserActions, &fields) {
            tracing::warn!(error = ?err, "audit append failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> SessionService {
        SessionService::new(MemoryStore::shared())
    }

    fn alice() -> SignupInput {
        SignupInput {
            first_name: "Alice".into(),
            last_name: "Mokoena".into(),
            username: "alice".into(),
            password: "longenoughpassword12".into(),
            account_type: AccountType::Student,
            dob: "2001-04-02".into(),
        }
    }

    #[test]
    fn signup_establishes_session_with_fresh_account_state() {
        let sessions = service();
        let user = sessions.signup(alice()).expect("signup");

        assert!(user.id.is_some());
        assert!(!user.join_date.is_empty());
        assert!(user.progress.is_empty());
        assert!(user.badges.is_empty());
        assert!(user.events.is_empty());

        let current = sessions.current().expect("logged in");
        assert_eq!(current.username, "alice");
    }

    #[test]
    fn password_boundary_is_twelve_characters() {
        let sessions = service();

        let mut short = alice();
        short.password = "elevenchars".into();
        assert!(matches!(
            sessions.signup(short),
            Err(PortalError::Validation(_))
        ));

        let mut exact = alice();
        exact.password = "twelve_chars".into();
        assert!(sessions.signup(exact).is_ok());
    }

    #[test]
    fn duplicate_username_is_rejected_regardless_of_other_fields() {
        let sessions = service();
        sessions.signup(alice()).expect("first signup");

        let mut dup = alice();
        dup.first_name = "Different".into();
        dup.password = "anotherlongpassword".into();
        dup.account_type = AccountType::Lecturer;
        assert!(matches!(
            sessions.signup(dup),
            Err(PortalError::Validation(_))
        ));
    }

    #[test]
    fn login_round_trip_and_generic_denial() {
        let sessions = service();
        let created = sessions.signup(alice()).expect("signup");
        sessions.logout().expect("logout");
        assert!(sessions.current().is_none());

        let user = sessions
            .login("alice", "longenoughpassword12")
            .expect("login");
        assert_eq!(user.id, created.id);

        assert!(matches!(
            sessions.login("alice", "wrongpassword"),
            Err(PortalError::Auth)
        ));
        assert!(matches!(
            sessions.login("nobody", "longenoughpassword12"),
            Err(PortalError::Auth)
        ));
    }

    #[test]
    fn switch_account_clears_session_but_keeps_users() {
        let sessions = service();
        sessions.signup(alice()).expect("signup");
        sessions.switch_account().expect("switch");

        assert!(sessions.current().is_none());
        assert_eq!(sessions.users().len(), 1);
    }

    #[test]
    fn update_user_refreshes_session_copy() {
        let sessions = service();
        let mut user = sessions.signup(alice()).expect("signup");
        user.progress.insert("mathematics".into(), 40);
        sessions.update_user(user).expect("update");

        let current = sessions.current().expect("logged in");
        assert_eq!(current.progress.get("mathematics"), Some(&40));
    }
}
