use anyhow::{bail, Context, Result};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Cookie name the server uses for admin sessions.
const AUTH_COOKIE: &str = "auth";

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Thin JSON client for the larder server. Holds the admin session cookie
/// once [`Client::login`] succeeds.
pub struct Client {
    base: String,
    http: reqwest::Client,
    cookie: Option<String>,
}

impl Client {
    pub fn new(server: &str) -> Self {
        Self {
            base: server.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            cookie: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/api/admin/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await
            .context("Failed to send login request")?;

        if !response.status().is_success() {
            bail!("Login failed: {}", failure_message(response).await);
        }

        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(session_cookie)
            .context("Login response did not set a session cookie")?;
        self.cookie = Some(cookie);
        Ok(())
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.cookie {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.authed(self.http.get(self.url(path)));
        decode(request.send().await.with_context(|| format!("GET {}", path))?).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.authed(self.http.post(self.url(path)).json(body));
        decode(request.send().await.with_context(|| format!("POST {}", path))?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.authed(self.http.delete(self.url(path)));
        decode(request.send().await.with_context(|| format!("DELETE {}", path))?).await
    }
}

/// `auth=<token>` out of a `Set-Cookie` header value.
fn session_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name == AUTH_COOKIE && !value.is_empty()).then(|| pair.to_string())
}

async fn failure_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiMessage>(&body) {
        Ok(ApiMessage {
            message,
            error: Some(code),
        }) => format!("{} ({}, {})", message, code, status),
        Ok(ApiMessage { message, .. }) => format!("{} ({})", message, status),
        Err(_) => format!("{}: {}", status, body),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        bail!("{}", failure_message(response).await);
    }
    response
        .json::<T>()
        .await
        .context("Failed to decode response body")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_auth_cookie() {
        assert_eq!(
            session_cookie("auth=abc123; Path=/; Max-Age=3600; HttpOnly; SameSite=Strict"),
            Some("auth=abc123".to_string())
        );
        assert_eq!(session_cookie("theme=dark; Path=/"), None);
        assert_eq!(session_cookie("auth=; Max-Age=0"), None);
    }

    #[test]
    fn base_url_is_normalised() {
        let client = Client::new("http://localhost:3000/");
        assert_eq!(client.url("/api/ping"), "http://localhost:3000/api/ping");
    }
}
