//! A single conversation with one assistant on one thread.
use tracing::debug;

use crate::{
    assistants::{
        messages::{CreateMessageRequest, Message},
        runs::{wait_on_run, CreateRunBuilder, PollOptions, Run},
        threads::Thread,
        Assistant,
    },
    client::OpenAiClient,
    text::strip_citations,
    ApiResponseOrError, OpenAiError,
};

/// What one [`ChatSession::send`] produced.
#[derive(Debug, Clone)]
pub struct Reply {
    /// The run after it reached a terminal status.
    pub run: Run,
    /// Messages added to the thread after the user's message.
    pub messages: Vec<Message>,
    /// Text of `messages`, concatenated, with citation markers removed.
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    client: OpenAiClient,
    assistant: Assistant,
    thread: Thread,
    poll: PollOptions,
    instructions: Option<String>,
}

impl ChatSession {
    /// Retrieves the assistant and opens a fresh thread for it.
    pub async fn start(
        client: OpenAiClient,
        assistant_id: &str,
        poll: PollOptions,
    ) -> ApiResponseOrError<Self> {
        let assistant = client.get_assistant(assistant_id).await?;
        let thread = client.create_thread().await?;
        debug!("started thread {} with assistant {}", thread.id, assistant.id);

        Ok(Self {
            client,
            assistant,
            thread,
            poll,
            instructions: None,
        })
    }

    /// Sends `instructions` with every run in place of the assistant's own.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    /// Posts `content` as a user message, runs the assistant, waits for the
    /// run and collects everything posted after the user message.
    ///
    /// The reply is returned whatever terminal status the run ended in.
    pub async fn send(&self, content: &str) -> ApiResponseOrError<Reply> {
        let thread_id = self.thread.id.as_str();
        let message = self
            .client
            .create_message(thread_id, CreateMessageRequest::user(content))
            .await?;

        let mut request = CreateRunBuilder::default().assistant_id(self.assistant.id.as_str());
        if let Some(instructions) = &self.instructions {
            request = request.instructions(instructions.as_str());
        }
        let request = request
            .build()
            .map_err(|error| OpenAiError::new(error.to_string(), "invalid_request".to_string()))?;

        let run = self.client.create_run(thread_id, request).await?;
        let run = wait_on_run(&self.client, run, thread_id, &self.poll).await?;
        debug!("run {} finished as {}", run.id, run.status);

        let messages = self
            .client
            .list_messages(thread_id, Some(message.id))
            .await?;
        let text: String = messages.iter().map(Message::text).collect();
        let text = strip_citations(&text).into_owned();

        Ok(Reply {
            run,
            messages,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assistants::runs::Status, client::tests::mock_client};
    use httpmock::prelude::*;
    use serde_json::json;

    fn run_body(status: &str) -> serde_json::Value {
        json!({
            "id": "run_1",
            "object": "thread.run",
            "created_at": 1_700_000_000,
            "assistant_id": "asst_tree",
            "thread_id": "thread_1",
            "status": status,
            "last_error": null,
            "usage": null
        })
    }

    async fn mock_session_start(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/assistants/asst_tree");
                then.status(200).json_body(json!({
                    "id": "asst_tree",
                    "object": "assistant",
                    "created_at": 1_700_000_000,
                    "name": null,
                    "description": null,
                    "model": "gpt-4o",
                    "instructions": null,
                    "tools": [],
                    "metadata": {}
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/threads");
                then.status(200).json_body(json!({
                    "id": "thread_1",
                    "object": "thread",
                    "created_at": 1_700_000_000,
                    "metadata": {}
                }));
            })
            .await;
    }

    #[tokio::test]
    async fn send_runs_one_full_turn() {
        let server = MockServer::start_async().await;
        mock_session_start(&server).await;
        let post_message = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/threads/thread_1/messages")
                    .json_body(json!({ "role": "user", "content": "How should I study?" }));
                then.status(200).json_body(json!({
                    "id": "msg_user",
                    "object": "thread.message",
                    "created_at": 1_700_000_001,
                    "thread_id": "thread_1",
                    "role": "user",
                    "content": [{ "type": "text", "text": { "value": "How should I study?", "annotations": [] } }],
                    "assistant_id": null,
                    "run_id": null,
                    "metadata": {}
                }));
            })
            .await;
        let create_run = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/threads/thread_1/runs")
                    .json_body(json!({ "assistant_id": "asst_tree" }));
                then.status(200).json_body(run_body("queued"));
            })
            .await;
        let retrieve_run = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/threads/thread_1/runs/run_1");
                then.status(200).json_body(run_body("completed"));
            })
            .await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/threads/thread_1/messages")
                    .query_param("order", "asc")
                    .query_param("after", "msg_user");
                then.status(200).json_body(json!({
                    "object": "list",
                    "data": [{
                        "id": "msg_reply",
                        "object": "thread.message",
                        "created_at": 1_700_000_003,
                        "thread_id": "thread_1",
                        "role": "assistant",
                        "content": [
                            { "type": "text", "text": { "value": "Take short breaks 【3:1†source】...", "annotations": [] } },
                            { "type": "text", "text": { "value": " Sleep well...", "annotations": [] } }
                        ],
                        "assistant_id": "asst_tree",
                        "run_id": "run_1",
                        "metadata": {}
                    }],
                    "first_id": "msg_reply",
                    "last_id": "msg_reply",
                    "has_more": false
                }));
            })
            .await;

        let session = ChatSession::start(mock_client(&server), "asst_tree", PollOptions::default())
            .await
            .unwrap();
        assert_eq!(session.thread().id, "thread_1");
        assert_eq!(session.assistant().id, "asst_tree");

        let reply = session.send("How should I study?").await.unwrap();

        post_message.assert_async().await;
        create_run.assert_async().await;
        retrieve_run.assert_hits_async(1).await;
        list.assert_async().await;
        assert_eq!(reply.run.status, Status::Completed);
        assert_eq!(reply.messages.len(), 1);
        assert_eq!(reply.text, "Take short breaks ... Sleep well...");
    }

    #[tokio::test]
    async fn instructions_are_sent_with_each_run() {
        let server = MockServer::start_async().await;
        mock_session_start(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/threads/thread_1/messages");
                then.status(200).json_body(json!({
                    "id": "msg_user",
                    "object": "thread.message",
                    "created_at": 1_700_000_001,
                    "thread_id": "thread_1",
                    "role": "user",
                    "content": []
                }));
            })
            .await;
        let create_run = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/threads/thread_1/runs")
                    .json_body(json!({
                        "assistant_id": "asst_tree",
                        "instructions": "You are a kind old tree. End every sentence with '...'."
                    }));
                then.status(200).json_body(run_body("completed"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/threads/thread_1/messages");
                then.status(200).json_body(json!({
                    "object": "list",
                    "data": [],
                    "first_id": null,
                    "last_id": null,
                    "has_more": false
                }));
            })
            .await;

        let session = ChatSession::start(mock_client(&server), "asst_tree", PollOptions::default())
            .await
            .unwrap()
            .with_instructions("You are a kind old tree. End every sentence with '...'.");
        session.send("I am tired").await.unwrap();
        session.send("Still tired").await.unwrap();

        create_run.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn start_fails_for_unknown_assistant() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/assistants/asst_missing");
                then.status(404).json_body(json!({
                    "error": {
                        "message": "No assistant found with id 'asst_missing'.",
                        "type": "invalid_request_error",
                        "param": null,
                        "code": null
                    }
                }));
            })
            .await;

        let error = ChatSession::start(mock_client(&server), "asst_missing", PollOptions::default())
            .await
            .unwrap_err();
        assert_eq!(error.error_type, "invalid_request_error");
    }
}
