use crate::{client::OpenAiClient, ApiResponseOrError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub id: String,
    pub object: String,
    pub created_at: u32,
    /// The thread ID that this message belongs to.
    pub thread_id: String,
    /// The status of the message, which can be either in_progress, incomplete, or completed.
    pub status: Option<String>,
    /// The entity that produced the message. One of user or assistant
    pub role: Role,
    /// The content of the message.
    pub content: Vec<Content>,
    /// The assistant that produced the message.
    pub assistant_id: Option<String>,
    /// The ID of the run associated with the creation of this message. Value is null when messages are created manually using the create message or create thread endpoints.
    pub run_id: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

impl Message {
    /// Concatenated value of every text segment, in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|content| match content {
                Content::Text { text } => Some(text.value.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text { text: Text },
    ImageFile { image_file: ImageFile },
    ImageUrl { image_url: ImageUrl },
    Refusal { refusal: String },
    /// Segment types this client does not model.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Text {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    /// The marker in the message text that the annotation replaces, e.g. `【4:0†source】`.
    pub text: String,
    pub start_index: u32,
    pub end_index: u32,
    pub file_citation: Option<FileReference>,
    pub file_path: Option<FileReference>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FileReference {
    pub file_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageFile {
    pub file_id: String,
    pub detail: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageUrl {
    pub url: String,
    pub detail: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateMessageRequest {
    pub role: Role,
    pub content: String,
}

impl CreateMessageRequest {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

impl OpenAiClient {
    pub async fn create_message(
        &self,
        thread_id: &str,
        request: CreateMessageRequest,
    ) -> ApiResponseOrError<Message> {
        self.post(format!("threads/{thread_id}/messages"), request)
            .await
    }

    /// Lists every message on the thread in ascending order, optionally
    /// only those after the message `after_id`.
    pub async fn list_messages(
        &self,
        thread_id: &str,
        after_id: Option<String>,
    ) -> ApiResponseOrError<Vec<Message>> {
        self.list(format!("threads/{thread_id}/messages"), after_id)
            .await
    }
}
