//! Contact form intake: the `contactSubmissions` collection plus the
//! contact-submission audit mirror.

use crate::audit::{AuditFile, AuditLog};
use crate::error::{PortalError, PortalResult};
use crate::store::collection::{Collection, IdStrategy};
use crate::store::models::ContactRecord;
use crate::store::SharedStore;

const CONTACTS_COLLECTION: &str = "contactSubmissions";

#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Clone)]
pub struct ContactService {
    submissions: Collection<ContactRecord>,
    audit: AuditLog,
}

impl ContactService {
    pub fn new(store: SharedStore) -> Self {
        let submissions =
            Collection::new(store.clone(), CONTACTS_COLLECTION, IdStrategy::Timestamped);
        let audit = AuditLog::new(store);
        Self { submissions, audit }
    }

    pub fn submit(&self, input: NewContact) -> PortalResult<ContactRecord> {
        if input.name.trim().is_empty() || input.message.trim().is_empty() {
            return Err(PortalError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }

        let contact = self.submissions.upsert(ContactRecord {
            id: None,
            name: input.name,
            email: input.email,
            phone: input.phone,
            subject: input.subject,
            message: input.message,
            timestamp: String::new(),
        })?;

        let fields = [
            ("Name", contact.name.clone()),
            ("Email", contact.email.clone()),
            (
                "Phone",
                contact
                    .phone
                    .clone()
                    .unwrap_or_else(|| "Not provided".to_string()),
            ),
            ("Subject", contact.subject.clone()),
            ("Message", contact.message.clone()),
        ];
        if let Err(err) = self.audit.append(&AuditFile::GeneralForms, &fields) {
            tracing::warn!(error = ?err, "audit append failed");
        }

        Ok(contact)
    }

    pub fn list(&self) -> Vec<ContactRecord> {
        self.submissions.load()
    }
}
