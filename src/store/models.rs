//! Typed record schemas for every collection the portal persists. The
//! original scripts trusted caller-provided object shapes; these are the
//! explicit replacements. Field names serialize in the camelCase layout the
//! stored format already uses.

use crate::store::collection::{Record, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Student,
    Lecturer,
}

/// Forum category. Anything outside the three course areas round-trips as a
/// free-form string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    English,
    Japanese,
    Math,
    Other(String),
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "english" => Category::English,
            "japanese" => Category::Japanese,
            "math" => Category::Math,
            _ => Category::Other(value),
        }
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::English => "english".to_string(),
            Category::Japanese => "japanese".to_string(),
            Category::Math => "math".to_string(),
            Category::Other(other) => other,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from(self.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    /// Stored and compared as plaintext. The source site is an offline demo
    /// and the stored format is preserved for fidelity; unsuitable for any
    /// real deployment.
    pub password: String,
    pub account_type: AccountType,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub join_date: String,
    /// Subject name to completion percent, 0 through 100.
    #[serde(default)]
    pub progress: BTreeMap<String, u8>,
    #[serde(default)]
    pub badges: BTreeSet<String>,
    /// References into the userEvents collection.
    #[serde(default)]
    pub events: Vec<RecordId>,
}

impl Record for UserRecord {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
    fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
    fn created_at(&self) -> &str {
        &self.join_date
    }
    fn set_created_at(&mut self, timestamp: String) {
        self.join_date = timestamp;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumThreadRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub title: String,
    pub content: String,
    pub category: Category,
    /// Display name only; no referential integrity against the users
    /// collection.
    pub author: String,
    #[serde(default)]
    pub date: String,
    /// Kept equal to the length of the thread's reply sub-collection.
    #[serde(default)]
    pub replies: usize,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Record for ForumThreadRecord {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
    fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
    fn created_at(&self) -> &str {
        &self.date
    }
    fn set_created_at(&mut self, timestamp: String) {
        self.date = timestamp;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub likes: u32,
}

impl Record for ReplyRecord {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
    fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
    fn created_at(&self) -> &str {
        &self.date
    }
    fn set_created_at(&mut self, timestamp: String) {
        self.date = timestamp;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Amount as entered, e.g. "0.005".
    pub amount: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_email: Option<String>,
    #[serde(default)]
    pub bitcoin_address: String,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub newsletter: bool,
    #[serde(default)]
    pub timestamp: String,
}

impl Record for DonationRecord {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
    fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
    fn created_at(&self) -> &str {
        &self.timestamp
    }
    fn set_created_at(&mut self, timestamp: String) {
        self.timestamp = timestamp;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Record for ContactRecord {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
    fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
    fn created_at(&self) -> &str {
        &self.timestamp
    }
    fn set_created_at(&mut self, timestamp: String) {
        self.timestamp = timestamp;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub resource: String,
    pub kind: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Record for DownloadRecord {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
    fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
    fn created_at(&self) -> &str {
        &self.timestamp
    }
    fn set_created_at(&mut self, timestamp: String) {
        self.timestamp = timestamp;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub username: String,
    pub kind: String,
    pub detail: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Record for UserEventRecord {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
    fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
    fn created_at(&self) -> &str {
        &self.timestamp
    }
    fn set_created_at(&mut self, timestamp: String) {
        self.timestamp = timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_record_serializes_in_stored_layout() {
        let user = UserRecord {
            id: Some(RecordId::Number(1)),
            first_name: "Alice".into(),
            last_name: "Mokoena".into(),
            username: "alice".into(),
            password: "longenoughpassword12".into(),
            account_type: AccountType::Student,
            dob: "2001-04-02".into(),
            join_date: "2024-01-01T00:00:00Z".into(),
            progress: BTreeMap::new(),
            badges: BTreeSet::new(),
            events: Vec::new(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["firstName"], "Alice");
        assert_eq!(json["accountType"], "student");
        assert_eq!(json["joinDate"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn category_falls_back_to_free_form() {
        let cat: Category = serde_json::from_str("\"Math\"").unwrap();
        assert_eq!(cat, Category::Math);
        let cat: Category = serde_json::from_str("\"study tips\"").unwrap();
        assert_eq!(cat, Category::Other("study tips".into()));
        assert_eq!(serde_json::to_string(&cat).unwrap(), "\"study tips\"");
    }
}
