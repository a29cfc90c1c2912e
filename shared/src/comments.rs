use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::capabilities::http::{GatewayError, GatewayResult, NewCommentRequest, RequestFence};
use crate::mapper::parse_api_date;
use crate::{ValidationError, ANONYMOUS_AUTHOR, EMPTY_COMMENT_CONTENT};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiCommentUser {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiComment {
    pub comment: Option<String>,
    /// Older responses carry the text here instead of `comment`.
    pub content: Option<String>,
    pub created_at: Option<String>,
    pub event_uuid: Option<String>,
    pub user: Option<ApiCommentUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author_name: String,
    pub content: String,
    pub created_at: Option<String>,
    pub event_uuid: String,
    /// Locally inserted while the post is in flight.
    pub pending: bool,
}

impl Comment {
    #[must_use]
    pub fn from_api(api: &ApiComment, event_uuid: &str) -> Self {
        let non_blank = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();
        Self {
            author_name: api
                .user
                .as_ref()
                .and_then(|u| non_blank(&u.name))
                .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string()),
            content: non_blank(&api.comment)
                .or_else(|| non_blank(&api.content))
                .unwrap_or_else(|| EMPTY_COMMENT_CONTENT.to_string()),
            created_at: non_blank(&api.created_at),
            event_uuid: non_blank(&api.event_uuid).unwrap_or_else(|| event_uuid.to_string()),
            pending: false,
        }
    }

    /// Avatar text: the first two characters of the author name, upper-cased.
    #[must_use]
    pub fn initials(&self) -> String {
        self.author_name.chars().take(2).collect::<String>().to_uppercase()
    }

    #[must_use]
    pub fn time_text(&self) -> String {
        match &self.created_at {
            None => "Just now".to_string(),
            Some(raw) => parse_api_date(raw).map_or_else(
                || raw.clone(),
                |dt| dt.format("%b %-d, %Y, %-I:%M %p").to_string(),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed {
        message: String,
    },
}

/// Comments of the event shown on the detail page.
///
/// The displayed list is whatever the last successful fetch returned. With
/// optimistic posting enabled a pending entry is shown until the refresh
/// that follows the post replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentThread {
    event_uuid: Option<String>,
    comments: Vec<Comment>,
    status: ThreadStatus,
    fence: RequestFence,
    posting: bool,
}

impl CommentThread {
    /// Marks the thread loading for `event_uuid` and returns the fetch ticket.
    pub fn begin_load(&mut self, event_uuid: &str) -> u64 {
        if self.event_uuid.as_deref() != Some(event_uuid) {
            self.comments.clear();
            self.posting = false;
        }
        self.event_uuid = Some(event_uuid.to_string());
        self.status = ThreadStatus::Loading;
        self.fence.issue()
    }

    /// Applies a fetch result. A 404 means "no comments yet". Returns false
    /// when the response was superseded by a newer fetch and dropped.
    pub fn finish_load(&mut self, ticket: u64, result: GatewayResult<Vec<ApiComment>>) -> bool {
        if !self.fence.is_current(ticket) {
            return false;
        }
        let uuid = self.event_uuid.clone().unwrap_or_default();
        match result {
            Ok(list) => {
                self.comments = list.iter().map(|c| Comment::from_api(c, &uuid)).collect();
                self.status = ThreadStatus::Ready;
            }
            Err(e) if e.is_not_found() => {
                self.comments.clear();
                self.status = ThreadStatus::Ready;
            }
            Err(e) => {
                self.comments.clear();
                self.status = ThreadStatus::Failed {
                    message: e.message().to_string(),
                };
            }
        }
        true
    }

    /// Validates a new comment without touching state.
    pub fn prepare_post(&self, text: &str) -> Result<NewCommentRequest, ValidationError> {
        let comment = text.trim();
        if comment.is_empty() {
            return Err(ValidationError::EmptyComment);
        }
        let event_uuid = self
            .event_uuid
            .clone()
            .ok_or(ValidationError::MissingField { field: "Event ID" })?;
        Ok(NewCommentRequest {
            event_uuid,
            comment: comment.to_string(),
        })
    }

    pub fn begin_post(&mut self, request: &NewCommentRequest, optimistic: bool) {
        self.posting = true;
        if optimistic {
            self.comments.insert(
                0,
                Comment {
                    author_name: ANONYMOUS_AUTHOR.to_string(),
                    content: request.comment.clone(),
                    created_at: None,
                    event_uuid: request.event_uuid.clone(),
                    pending: true,
                },
            );
        }
    }

    /// Settles a post. Pending entries are rolled back on failure; on success
    /// the caller refreshes from the server.
    pub fn finish_post(&mut self, result: GatewayResult<()>) -> Result<(), GatewayError> {
        self.posting = false;
        if result.is_err() {
            self.comments.retain(|c| !c.pending);
        }
        result
    }

    /// Comments in display order: pending first, then newest first. Entries
    /// without a readable timestamp sort last.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Comment> {
        let mut sorted: Vec<&Comment> = self.comments.iter().collect();
        sorted.sort_by_key(|c| {
            (
                !c.pending,
                Reverse(c.created_at.as_deref().and_then(parse_api_date)),
            )
        });
        sorted
    }

    #[must_use]
    pub fn event_uuid(&self) -> Option<&str> {
        self.event_uuid.as_deref()
    }

    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    #[must_use]
    pub fn status(&self) -> &ThreadStatus {
        &self.status
    }

    #[must_use]
    pub fn is_posting(&self) -> bool {
        self.posting
    }
}
