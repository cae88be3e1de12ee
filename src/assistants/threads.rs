use serde::Deserialize;
use std::collections::HashMap;

use crate::{
    client::{Empty, OpenAiClient},
    ApiResponseOrError,
};

#[derive(Debug, Deserialize, Clone)]
pub struct Thread {
    pub id: String,
    pub object: String,
    pub created_at: u32,
    /// Set of 16 key-value pairs that can be attached to an object. This can be useful for storing additional information about the object in a structured format. Keys can be a maximum of 64 characters long and values can be a maximum of 512 characters long.
    pub metadata: Option<HashMap<String, String>>,
}

impl OpenAiClient {
    /// Creates an empty thread.
    pub async fn create_thread(&self) -> ApiResponseOrError<Thread> {
        self.post("threads", Empty {}).await
    }
}
