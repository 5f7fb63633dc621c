//! Forum thread store: a Record Collection specialization with view counts,
//! reply sub-collections, and per-user like state.

use crate::audit::{AuditFile, AuditLog};
use crate::error::{PortalError, PortalResult};
use crate::store::collection::{Collection, IdStrategy, RecordId};
use crate::store::models::{Category, ForumThreadRecord, ReplyRecord};
use crate::store::SharedStore;
use regex::Regex;
use std::collections::BTreeMap;

const THREADS_COLLECTION: &str = "forumThreads";
const MAX_TAGS: usize = 3;

#[derive(Debug, Clone)]
pub struct NewThread {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub author: String,
}

/// What a like toggle applies to. Reply likes are scoped by their thread
/// because reply ids are only sequential within one thread.
#[derive(Debug, Clone)]
pub enum LikeTarget {
    Thread(RecordId),
    Reply {
        thread_id: RecordId,
        reply_id: RecordId,
    },
}

impl LikeTarget {
    fn state_key(&self) -> String {
        match self {
            LikeTarget::Thread(id) => format!("thread_{id}"),
            LikeTarget::Reply {
                thread_id,
                reply_id,
            } => format!("reply_{thread_id}_{reply_id}"),
        }
    }
}

#[derive(Clone)]
pub struct ForumService {
    store: SharedStore,
    threads: Collection<ForumThreadRecord>,
    audit: AuditLog,
}

impl ForumService {
    pub fn new(store: SharedStore) -> Self {
        let threads = Collection::new(store.clone(), THREADS_COLLECTION, IdStrategy::Timestamped);
        let audit = AuditLog::new(store.clone());
        Self {
            store,
            threads,
            audit,
        }
    }

    pub fn list_threads(&self) -> Vec<ForumThreadRecord> {
        self.threads.load()
    }

    pub fn get_thread(&self, id: &RecordId) -> Option<ForumThreadRecord> {
        self.threads.find_by_id(id)
    }

    pub fn create_thread(&self, input: NewThread) -> PortalResult<ForumThreadRecord> {
        if input.title.trim().is_empty() {
            return Err(PortalError::Validation(
                "Please enter a title for your thread".to_string(),
            ));
        }
        if input.content.trim().is_empty() {
            return Err(PortalError::Validation(
                "Please enter content for your thread".to_string(),
            ));
        }

        let tags = extract_tags(&input.content);
        let thread = self.threads.upsert(ForumThreadRecord {
            id: None,
            title: input.title,
            content: input.content,
            category: input.category,
            author: input.author,
            date: String::new(),
            replies: 0,
            views: 0,
            likes: 0,
            tags,
        })?;

        self.audit_action("new_thread", &thread.author, &thread.title);
        Ok(thread)
    }

    /// Bumps the view counter. Repeated views by the same visitor all count;
    /// there is no dedup requirement.
    pub fn increment_view(&self, id: &RecordId) -> PortalResult<u64> {
        let mut thread = self
            .threads
            .find_by_id(id)
            .ok_or_else(|| PortalError::NotFound("thread".to_string()))?;
        thread.views += 1;
        let thread = self.threads.upsert(thread)?;
        Ok(thread.views)
    }

    pub fn replies(&self, thread_id: &RecordId) -> Vec<ReplyRecord> {
        self.replies_collection(thread_id).load()
    }

    /// Appends a reply and keeps the parent thread's `replies` count equal to
    /// the sub-collection length. Both writes happen in-process within this
    /// call; there is no partial state to observe afterwards.
    pub fn add_reply(
        &self,
        thread_id: &RecordId,
        content: &str,
        author: &str,
    ) -> PortalResult<ReplyRecord> {
        if content.trim().is_empty() {
            return Err(PortalError::Validation(
                "Please enter a reply".to_string(),
            ));
        }
        let mut thread = self
            .threads
            .find_by_id(thread_id)
            .ok_or_else(|| PortalError::NotFound("thread".to_string()))?;

        let replies = self.replies_collection(thread_id);
        let reply = replies.upsert(ReplyRecord {
            id: None,
            content: content.to_string(),
            author: author.to_string(),
            date: String::new(),
            likes: 0,
        })?;

        thread.replies = replies.len();
        self.threads.upsert(thread)?;

        self.audit_action("new_reply", author, &format!("thread {thread_id}"));
        Ok(reply)
    }

    /// Flips the per-user like state for the target and adjusts the visible
    /// aggregate by one in the matching direction. Toggling twice restores
    /// both the state and the count. Two tabs toggling concurrently can make
    /// the aggregate drift; known limitation of the storage model.
    pub fn toggle_like(&self, target: &LikeTarget, username: &str) -> PortalResult<bool> {
        let key = format!("userLikes_{username}");
        let mut likes: BTreeMap<String, bool> = self
            .store
            .get(&key)
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        let state_key = target.state_key();
        let liked = !likes.get(&state_key).copied().unwrap_or(false);
        likes.insert(state_key, liked);

        match target {
            LikeTarget::Thread(id) => {
                let mut thread = self
                    .threads
                    .find_by_id(id)
                    .ok_or_else(|| PortalError::NotFound("thread".to_string()))?;
                thread.likes = adjust(thread.likes, liked);
                self.threads.upsert(thread)?;
            }
            LikeTarget::Reply {
                thread_id,
                reply_id,
            } => {
                let replies = self.replies_collection(thread_id);
                let mut reply = replies
                    .find_by_id(reply_id)
                    .ok_or_else(|| PortalError::NotFound("reply".to_string()))?;
                reply.likes = adjust(reply.likes, liked);
                replies.upsert(reply)?;
            }
        }

        let raw = serde_json::to_string(&likes)
            .map_err(|err| PortalError::Store(anyhow::Error::from(err)))?;
        self.store.set(&key, &raw).map_err(PortalError::Store)?;
        Ok(liked)
    }

    /// Case-insensitive substring match across title, content, and tags.
    /// No ranking, no pagination; matches come back in collection order.
    pub fn search(&self, term: &str) -> Vec<ForumThreadRecord> {
        let needle = term.to_lowercase();
        self.threads
            .load()
            .into_iter()
            .filter(|thread| {
                thread.title.to_lowercase().contains(&needle)
                    || thread.content.to_lowercase().contains(&needle)
                    || thread
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&needle))
            })
            .collect()
    }

    fn replies_collection(&self, thread_id: &RecordId) -> Collection<ReplyRecord> {
        Collection::new(
            self.store.clone(),
            format!("forumReplies_{thread_id}"),
            IdStrategy::Sequential,
        )
    }

    fn audit_action(&self, action: &str, username: &str, detail: &str) {
        let fields = [
            ("Action", action.to_string()),
            ("Username", username.to_string()),
            ("Detail", detail.to_string()),
        ];
        if let Err(err) = self.audit.append(&AuditFile::UserActions, &fields) {
            tracing::warn!(error = ?err, "audit append failed");
        }
    }
}

fn adjust(count: u32, liked: bool) -> u32 {
    if liked {
        count + 1
    } else {
        count.saturating_sub(1)
    }
}

/// Up to three `#tag` markers pulled from the content, in order of
/// appearance.
fn extract_tags(content: &str) -> Vec<String> {
    let re = Regex::new(r"#(\w+)").expect("static tag pattern");
    re.captures_iter(content)
        .take(MAX_TAGS)
        .map(|cap| cap[1].to_string())
        .collect()
}
