//! Authenticated transport to the resource API.

use reqwest::{Client, Method, RequestBuilder};
use secrecy::ExposeSecret;
use serde_json::Value;
use url::Url;

use harness_http::{Retryable, RetryPolicy, endpoint};
use harness_security::SecurityContext;

use crate::outcome::{Outcome, classify, find_item};

/// File sent as `multipart/form-data`.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content: Vec<u8>,
    pub purpose: String,
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Upload(Upload),
}

/// An attempt that may succeed if repeated.
#[derive(Debug)]
struct Transient(String);

impl std::fmt::Display for Transient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Retryable for Transient {
    fn is_retryable(&self) -> bool {
        true
    }
}

/// HTTP access to `<api_url>/v1`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    retry: RetryPolicy,
}

impl ApiClient {
    #[must_use]
    pub fn new(client: Client, base: Url, retry: RetryPolicy) -> Self {
        Self {
            client,
            base,
            retry,
        }
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Issue one logical request, retrying transport faults and 5xx.
    pub async fn send(
        &self,
        ctx: &SecurityContext,
        method: Method,
        path: &[&str],
        body: &RequestBody,
    ) -> Outcome {
        let mut segments = Vec::with_capacity(path.len() + 1);
        segments.push("v1");
        segments.extend_from_slice(path);
        let url = match endpoint(&self.base, &segments) {
            Ok(url) => url,
            Err(e) => return Outcome::transport(e.to_string()),
        };

        let label = format!("{method} {}", url.path());
        let result = self
            .retry
            .run(&label, || {
                let request = self.build(ctx, method.clone(), url.clone(), body);
                async move {
                    let response = match request.send().await {
                        Ok(response) => response,
                        Err(e) if e.is_retryable() => return Err(Transient(e.to_string())),
                        Err(e) => return Ok(Outcome::transport(e.to_string())),
                    };
                    let status = response.status();
                    let bytes = response
                        .bytes()
                        .await
                        .map_err(|e| Transient(format!("reading body: {e}")))?;
                    match classify(status, &bytes) {
                        Outcome::TransportError { message } => Err(Transient(message)),
                        outcome => Ok(outcome),
                    }
                }
            })
            .await;

        let outcome = result.unwrap_or_else(|Transient(message)| Outcome::transport(message));
        tracing::debug!(request = %label, outcome = %outcome.summary(), "probe response");
        outcome
    }

    /// List a collection and look for `key` among ids and names.
    ///
    /// Success with the matching entry, `NotFound` when the listing
    /// succeeded but does not contain it, otherwise the listing outcome.
    ///
    /// Only the first page is searched: `has_more` and cursors are not
    /// followed, so an entry beyond the server's default page size reads as
    /// `NotFound`.
    pub async fn find(&self, ctx: &SecurityContext, path: &[&str], key: &str) -> Outcome {
        match self.send(ctx, Method::GET, path, &RequestBody::Empty).await {
            Outcome::Success { body } => find_item(&body, key)
                .map_or(Outcome::NotFound, |item| Outcome::success(item.clone())),
            other => other,
        }
    }

    fn build(
        &self,
        ctx: &SecurityContext,
        method: Method,
        url: Url,
        body: &RequestBody,
    ) -> RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(token) = ctx.bearer_token() {
            request = request.bearer_auth(token.expose_secret());
        }
        match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(value),
            RequestBody::Upload(upload) => {
                let part = reqwest::multipart::Part::bytes(upload.content.clone())
                    .file_name(upload.file_name.clone());
                let form = reqwest::multipart::Form::new()
                    .text("purpose", upload.purpose.clone())
                    .part("file", part);
                request.multipart(form)
            }
        }
    }
}
