//! Test HTTP client.
//!
//! Keeps its own cookie jar so tests can inspect and rewrite cookies the way
//! a hostile client would.

use std::collections::BTreeMap;

use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;

use super::server::TestServer;

/// A test client bound to one server.
pub struct TestClient {
    http: reqwest::Client,
    base: String,
    cookies: BTreeMap<String, String>,
}

impl TestClient {
    pub fn new(server: &TestServer) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: server.url(""),
            cookies: BTreeMap::new(),
        }
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub fn remove_cookie(&mut self, name: &str) {
        self.cookies.remove(name);
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base, path));
        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(COOKIE, header);
        }
        builder
    }

    fn absorb(&mut self, response: &Response) {
        for value in response.headers().get_all(SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            let pair = value.split(';').next().unwrap_or("");
            if let Some((name, val)) = pair.split_once('=') {
                self.cookies
                    .insert(name.trim().to_string(), val.trim().to_string());
            }
        }
    }

    async fn send(&mut self, builder: RequestBuilder) -> anyhow::Result<Response> {
        let response = builder.send().await?;
        self.absorb(&response);
        Ok(response)
    }

    pub async fn get(&mut self, path: &str) -> anyhow::Result<Response> {
        let builder = self.request(Method::GET, path);
        self.send(builder).await
    }

    pub async fn post_json(&mut self, path: &str, body: &Value) -> anyhow::Result<Response> {
        let builder = self.request(Method::POST, path).json(body);
        self.send(builder).await
    }

    /// POST an already-encoded `application/x-www-form-urlencoded` body.
    pub async fn post_form(&mut self, path: &str, body: &str) -> anyhow::Result<Response> {
        let builder = self
            .request(Method::POST, path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.to_string());
        self.send(builder).await
    }

    pub async fn delete(&mut self, path: &str) -> anyhow::Result<Response> {
        let builder = self.request(Method::DELETE, path);
        self.send(builder).await
    }

    /// POST /download/:id with a challenge token.
    pub async fn download(&mut self, id: &str, token: &str) -> anyhow::Result<Response> {
        self.post_json(
            &format!("/download/{id}"),
            &serde_json::json!({ "h-captcha-response": token }),
        )
        .await
    }

    /// Download counter for `id` as reported by /stats.
    pub async fn downloads_of(&mut self, id: &str) -> anyhow::Result<i64> {
        let stats: Value = self.get("/stats").await?.json().await?;
        Ok(stats["macros"][id].as_i64().unwrap_or(-1))
    }
}
