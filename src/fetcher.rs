use crate::error::{PipelineError, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroU32;
use tracing::{debug, warn};

/// 1 initial attempt + 10 retries
pub const MAX_ATTEMPTS: u32 = 11;

/// HTTP fetch with a fixed attempt ceiling.
///
/// Failed attempts (transport error, non-success status, unparseable body)
/// are retried immediately with no backoff. Once the ceiling is reached the
/// call fails with [`PipelineError::FetchExhausted`], which aborts the
/// enclosing request. Every attempt first waits on the outbound rate limiter.
pub struct RetryingFetcher {
    client: Client,
    max_attempts: u32,
    rate_limiter: DefaultDirectRateLimiter,
}

impl RetryingFetcher {
    pub fn new(client: Client, requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            client,
            max_attempts: MAX_ATTEMPTS,
            rate_limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.run(url, || self.client.get(url).query(query), parse_json)
            .await
    }

    pub async fn post_json<B, T>(&self, url: &str, headers: &[(&str, &str)], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.run(
            url,
            || {
                headers
                    .iter()
                    .fold(self.client.post(url), |req, (name, value)| {
                        req.header(*name, *value)
                    })
                    .json(body)
            },
            parse_json,
        )
        .await
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.run(url, || self.client.get(url), |body| Ok(body.to_string()))
            .await
    }

    async fn run<T, B, P>(&self, url: &str, build: B, parse: P) -> Result<T>
    where
        B: Fn() -> RequestBuilder,
        P: Fn(&str) -> std::result::Result<T, String>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.rate_limiter.until_ready().await;

            let outcome = match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    match response.text().await {
                        Ok(body) if status.is_success() => parse(&body),
                        Ok(body) => Err(format!("status {}: {}", status, truncate(&body, 200))),
                        Err(e) => Err(format!("failed to read body: {}", e)),
                    }
                }
                Err(e) => Err(e.to_string()),
            };

            match outcome {
                Ok(value) => {
                    debug!("Fetched {} on attempt {}", url, attempt);
                    return Ok(value);
                }
                Err(e) if attempt >= self.max_attempts => {
                    return Err(PipelineError::FetchExhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    warn!(
                        "Fetch attempt {}/{} for {} failed: {}. Retrying...",
                        attempt, self.max_attempts, url, e
                    );
                }
            }
        }
    }
}

fn parse_json<T: DeserializeOwned>(body: &str) -> std::result::Result<T, String> {
    serde_json::from_str(body).map_err(|e| format!("unparseable body: {}", e))
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> RetryingFetcher {
        RetryingFetcher::new(Client::new(), 6000)
    }

    #[tokio::test]
    async fn recovers_after_three_transient_failures() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(3)
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let value: Value = assert_ok!(
            fetcher()
                .get_json(&format!("{}/data", server.uri()), &[])
                .await
        );
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn unparseable_body_counts_as_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
            .expect(1)
            .mount(&server)
            .await;

        let value: Vec<u32> = fetcher().get_json(&server.uri(), &[]).await.unwrap();
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn gives_up_after_eleven_attempts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(u64::from(MAX_ATTEMPTS))
            .mount(&server)
            .await;

        let result: Result<Value> = fetcher()
            .post_json(&server.uri(), &[], &json!({ "query": "{}" }))
            .await;

        match assert_err!(result) {
            PipelineError::FetchExhausted { attempts, .. } => assert_eq!(attempts, MAX_ATTEMPTS),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn post_sends_headers_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": 1 })))
            .expect(1)
            .mount(&server)
            .await;

        let value: Value = fetcher()
            .post_json(&server.uri(), &[("x-api-key", "secret")], &json!({}))
            .await
            .unwrap();
        assert_eq!(value["data"], 1);
    }
}
