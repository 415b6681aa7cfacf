use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::storage::memory::Record;
use crate::storage::protocol::*;

/// HTTP client for node-to-node calls.
///
/// Every call carries an explicit timeout and is tried exactly once; callers
/// decide what a failure means (usually "skip this candidate").
#[derive(Clone, Default)]
pub struct PeerClient {
    http_client: reqwest::Client,
}

impl PeerClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn url(addr: &str, path: &str) -> String {
        format!("http://{}{}", addr, path)
    }

    async fn send<B, T>(
        &self,
        method: Method,
        addr: &str,
        path: &str,
        body: Option<&B>,
        timeout: Duration,
    ) -> Result<(StatusCode, T)>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .http_client
            .request(method, Self::url(addr, path))
            .timeout(timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let parsed = response
            .json::<T>()
            .await
            .map_err(|e| anyhow::anyhow!("Bad response from {} ({}): {}", addr, status, e))?;

        Ok((status, parsed))
    }

    /// Sends a PUT whose answer the caller does not parse.
    pub async fn put_unit<B: Serialize + ?Sized>(
        &self,
        addr: &str,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<StatusCode> {
        let response = self
            .http_client
            .put(Self::url(addr, path))
            .json(body)
            .timeout(timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "PUT {} on {} failed: {}",
                path,
                addr,
                response.status()
            ));
        }
        Ok(response.status())
    }

    /// Forwards a key request to a replica and returns its status and body
    /// unchanged, whatever the status.
    pub async fn forward_key(
        &self,
        method: Method,
        addr: &str,
        key: &str,
        request: &KeyRequest,
        timeout: Duration,
    ) -> Result<(StatusCode, KeyResponse)> {
        let path = format!("{}/{}", ENDPOINT_KEYS, key);
        self.send(method, addr, &path, Some(request), timeout).await
    }

    pub async fn key_count(&self, addr: &str, timeout: Duration) -> Result<KeyCountResponse> {
        let (status, body) = self
            .send::<(), KeyCountResponse>(Method::GET, addr, ENDPOINT_KEY_COUNT, None, timeout)
            .await?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("Key count on {} failed: {}", addr, status));
        }
        Ok(body)
    }

    pub async fn validate(
        &self,
        addr: &str,
        key: &str,
        request: &KeyRequest,
        timeout: Duration,
    ) -> Result<ValidationResponse> {
        let path = format!("{}/{}", ENDPOINT_VALIDATE, key);
        let (_, body) = self
            .send(Method::PUT, addr, &path, Some(request), timeout)
            .await?;
        Ok(body)
    }

    pub async fn pull_record(
        &self,
        addr: &str,
        key: &str,
        request: &KeyRequest,
        timeout: Duration,
    ) -> Result<Option<Record>> {
        let path = format!("{}/{}", ENDPOINT_PULL_RECORD, key);
        let (status, body): (StatusCode, PullRecordResponse) = self
            .send(Method::PUT, addr, &path, Some(request), timeout)
            .await?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("Pull from {} failed: {}", addr, status));
        }
        Ok(body.record)
    }
}
