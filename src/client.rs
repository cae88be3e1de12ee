use std::str::FromStr;

use crate::{ApiResponseOrError, Credentials, OpenAiError};
use anyhow::Result;
use reqwest::{
    header::{HeaderName, HeaderValue, AUTHORIZATION},
    Client, Method, Response,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

#[derive(Clone)]
pub struct OpenAiClient {
    credentials: Credentials,
    client: Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OpenAiClient({})", self.credentials.base_url())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiErrorWrapper {
    error: OpenAiError,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Empty {}

impl OpenAiClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .default_headers(
                [
                    (
                        AUTHORIZATION,
                        HeaderValue::from_str(&format!("Bearer {}", credentials.api_key()))?,
                    ),
                    (
                        HeaderName::from_str("OpenAI-Beta")?,
                        HeaderValue::from_str("assistants=v2")?,
                    ),
                ]
                .into_iter()
                .collect(),
            )
            .build()?;

        Ok(Self {
            credentials,
            client,
        })
    }

    async fn request_inner<S, R>(
        &self,
        method: Method,
        route: R,
        body: Option<S>,
    ) -> Result<Response, reqwest::Error>
    where
        R: Into<String>,
        S: Serialize,
    {
        let url = format!("{}{}", self.credentials.base_url(), route.into());
        debug!("OpenAI Request[{method}] {url}");

        let mut request = self.client.request(method.clone(), url.as_str());

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;

        debug!(
            "OpenAI Response[{method}] {} {url}",
            response.status().as_str()
        );
        Ok(response)
    }

    pub async fn request<S, R, T>(
        &self,
        method: Method,
        route: R,
        body: Option<S>,
    ) -> ApiResponseOrError<T>
    where
        R: Into<String>,
        S: Serialize,
        T: DeserializeOwned,
    {
        let response = self.request_inner(method, route, body).await?;
        if response.status().is_success() {
            return Ok(response.json::<T>().await?);
        }

        let status = response.status();
        let result = response.text().await?;
        if let Ok(api_response) = serde_json::from_str::<OpenAiErrorWrapper>(&result) {
            Err(api_response.error)
        } else if result.is_empty() {
            Err(OpenAiError::new(status.to_string(), "unknown".to_string()))
        } else {
            Err(OpenAiError::new(result, "unknown".to_string()))
        }
    }

    pub async fn get<R, T>(&self, route: R) -> ApiResponseOrError<T>
    where
        R: Into<String>,
        T: DeserializeOwned,
    {
        self.request::<(), R, T>(Method::GET, route, None).await
    }

    pub async fn post<S, R, T>(&self, route: R, body: S) -> ApiResponseOrError<T>
    where
        R: Into<String>,
        S: Serialize,
        T: DeserializeOwned,
    {
        self.request(Method::POST, route, Some(body)).await
    }

    /// Fetches every page of a list endpoint in ascending order, starting
    /// after the object with id `after` when given.
    pub async fn list<R, T>(&self, route: R, after: Option<String>) -> ApiResponseOrError<Vec<T>>
    where
        R: Into<String>,
        T: DeserializeOwned,
    {
        let route = route.into();
        let mut cursor = after;
        let mut data = Vec::new();

        loop {
            let page_route = match &cursor {
                Some(after) => format!("{route}?order=asc&after={after}"),
                None => format!("{route}?order=asc"),
            };
            let list: List<T> = self.get(page_route).await?;
            data.extend(list.data);

            match list.last_id {
                Some(last_id) if list.has_more => cursor = Some(last_id),
                _ => break,
            }
        }

        Ok(data)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct List<T> {
    pub first_id: Option<String>,
    pub last_id: Option<String>,
    pub data: Vec<T>,
    pub has_more: bool,
}
