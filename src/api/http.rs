use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use crate::config::TaskboardConfig;
use crate::error::ApiError;

/// Name of the session cookie the backend sets on login/register.
pub const SESSION_COOKIE: &str = "token";

/// A parsed response body: JSON when the server says so, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Decode into a typed value. Text bodies are given one chance to parse
    /// as JSON, for servers that forget the content type.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Self::Json(value) => {
                serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
            }
            Self::Text(text) => {
                serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("{}: {}", e, text)))
            }
        }
    }

    /// Message for a failed request: the body's `message` field, else the raw
    /// body, else a generic status line.
    pub fn error_message(&self, status: StatusCode) -> String {
        let generic = || format!("HTTP Error {}", status.as_u16());
        match self {
            Self::Json(value) => {
                if let Some(msg) = value
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                {
                    return msg.to_string();
                }
                match value {
                    Value::Null => generic(),
                    Value::String(s) if s.is_empty() => generic(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }
            }
            Self::Text(text) if !text.trim().is_empty() => text.clone(),
            Self::Text(_) => generic(),
        }
    }
}

/// Per-call knobs. The cookie jar is not one of them.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let text = serde_json::to_string(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.body = Some(text);
        Ok(self)
    }
}

/// Where a session cookie was stored: its path and, when the server named
/// one, its domain. The jar keys cookies by both.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CookieScope {
    path: String,
    domain: Option<String>,
}

impl CookieScope {
    /// Scope of a `Set-Cookie` header for the session cookie, resolving a
    /// missing `Path` to the request's default path.
    fn from_set_cookie(header: &str, request_url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, _) = parts.next()?.trim().split_once('=')?;
        if name.trim() != SESSION_COOKIE {
            return None;
        }
        let mut scope = Self {
            path: default_cookie_path(request_url.path()),
            domain: None,
        };
        for attr in parts {
            let Some((key, value)) = attr.trim().split_once('=') else {
                continue;
            };
            let value = value.trim();
            if key.trim().eq_ignore_ascii_case("path") && value.starts_with('/') {
                scope.path = value.to_string();
            } else if key.trim().eq_ignore_ascii_case("domain") && !value.is_empty() {
                scope.domain = Some(value.trim_start_matches('.').to_string());
            }
        }
        Some(scope)
    }

    fn expired_cookie(&self) -> String {
        let mut cookie = format!(
            "{}=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path={}",
            SESSION_COOKIE, self.path
        );
        if let Some(domain) = &self.domain {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
        cookie
    }
}

/// RFC 6265 default-path: the request path up to, not including, its last `/`.
fn default_cookie_path(request_path: &str) -> String {
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => request_path[..i].to_string(),
    }
}

/// `/`, `/api`, `/api/v1` for a base path of `/api/v1`.
fn path_prefixes(path: &str) -> Vec<String> {
    let mut prefixes = vec!["/".to_string()];
    let mut current = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current.push('/');
        current.push_str(segment);
        prefixes.push(current.clone());
    }
    prefixes
}

/// JSON-over-HTTP client with a cookie jar shared by every request.
///
/// Cloning is cheap and clones share the session.
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    jar: Arc<Jar>,
    session_scopes: Arc<Mutex<BTreeSet<CookieScope>>>,
    http: Client,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ApiError::Url(format!("{}: {}", base_url, e)))?;

        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url,
            jar,
            session_scopes: Arc::new(Mutex::new(BTreeSet::new())),
            http,
        })
    }

    pub fn from_config(config: &TaskboardConfig) -> Result<Self, ApiError> {
        Self::new(config.base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resolve(&self, endpoint: &str) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url, endpoint);
        Url::parse(&raw).map_err(|e| ApiError::Url(format!("{}: {}", raw, e)))
    }

    /// Issue one request. A single attempt: no retry, no timeout.
    ///
    /// `Content-Type: application/json` is the default header; caller headers
    /// replace it by name. A caller `Cookie` header is dropped so the session
    /// always comes from the jar.
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ResponseBody, ApiError> {
        let url = self.resolve(endpoint)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for name in options.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in options.headers.iter() {
            if name == COOKIE {
                log::debug!("Ignoring caller Cookie header for {}", url);
                continue;
            }
            headers.append(name.clone(), value.clone());
        }

        log::debug!("API request: {} {}", options.method, url);
        if crate::debug_logging() {
            if let Some(body) = &options.body {
                log::debug!("API request body: {}", body);
            }
        }

        let mut req = self
            .http
            .request(options.method.clone(), url.clone())
            .headers(headers);
        if let Some(body) = options.body {
            req = req.body(body);
        }

        let resp = req.send().await.map_err(|e| {
            log::error!("API error: {} {}: {}", options.method, url, e);
            ApiError::from(e)
        })?;

        let status = resp.status();
        log::debug!("API response status: {} for {}", status, url);
        self.remember_session_scopes(resp.headers(), &url);

        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let text = resp.text().await?;

        let body = if is_json {
            match parse_json_text(&text) {
                Ok(value) => ResponseBody::Json(value),
                // An error page mislabelled as JSON still carries a usable message.
                Err(_) if !status.is_success() => ResponseBody::Text(text),
                Err(e) => return Err(ApiError::Decode(format!("{}: {}", e, text))),
            }
        } else {
            ResponseBody::Text(text)
        };

        if crate::debug_logging() {
            log::debug!("API response data: {:?}", body);
        }

        if !status.is_success() {
            let message = body.error_message(status);
            log::error!("API error: {} {} -> {}: {}", options.method, url, status, message);
            return Err(ApiError::Http { status, message });
        }

        Ok(body)
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(endpoint, options).await?.into_json()
    }

    /// Whether the jar currently holds a non-empty session cookie for the API.
    pub fn has_session(&self) -> bool {
        let Ok(url) = Url::parse(&self.base_url) else {
            return false;
        };
        self.jar
            .cookies(&url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
            .is_some_and(|cookies| {
                cookies.split(';').any(|pair| {
                    pair.trim()
                        .split_once('=')
                        .is_some_and(|(name, value)| name == SESSION_COOKIE && !value.is_empty())
                })
            })
    }

    fn remember_session_scopes(&self, headers: &HeaderMap, url: &Url) {
        let scopes = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| CookieScope::from_set_cookie(v, url));
        if let Ok(mut known) = self.session_scopes.lock() {
            known.extend(scopes);
        }
    }

    /// Expire the session cookie locally, whatever the server thinks.
    ///
    /// Covers every path the server ever set it on, plus each prefix of the
    /// base path, so no copy of the cookie survives.
    pub fn clear_session(&self) {
        let Ok(url) = Url::parse(&self.base_url) else {
            return;
        };
        let mut scopes: BTreeSet<CookieScope> = path_prefixes(url.path())
            .into_iter()
            .map(|path| CookieScope { path, domain: None })
            .collect();
        if let Ok(mut known) = self.session_scopes.lock() {
            scopes.append(&mut known);
        }
        for scope in &scopes {
            self.jar.add_cookie_str(&scope.expired_cookie(), &url);
        }
        log::debug!("Cleared local session cookie on {} path(s)", scopes.len());
    }
}

fn parse_json_text(text: &str) -> Result<Value, serde_json::Error> {
    if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, HttpClient) {
        let server = MockServer::start().await;
        let client = HttpClient::new(&format!("{}/api/v1", server.uri())).unwrap();
        (server, client)
    }

    async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "token=abc123; Path=/; HttpOnly")
                    .set_body_json(serde_json::json!({ "id": "u1", "name": "Ana" })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn json_body_is_parsed() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "a": 1 }])))
            .mount(&server)
            .await;

        let body = client.request("/tasks", RequestOptions::get()).await.unwrap();
        assert_eq!(body, ResponseBody::Json(serde_json::json!([{ "a": 1 }])));
    }

    #[tokio::test]
    async fn non_json_body_is_raw_text() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/verify"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("OK"),
            )
            .mount(&server)
            .await;

        let body = client.request("/verify", RequestOptions::get()).await.unwrap();
        assert_eq!(body, ResponseBody::Text("OK".to_string()));
    }

    #[tokio::test]
    async fn error_message_prefers_message_field() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "message": "Invalid credentials" })),
            )
            .mount(&server)
            .await;

        let err = client
            .request("/login", RequestOptions::post())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Http {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid credentials".to_string()
            }
        );
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn error_message_falls_back_to_raw_body() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/profile"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("content-type", "text/html")
                    .set_body_string("Forbidden here"),
            )
            .mount(&server)
            .await;

        let err = client.request("/profile", RequestOptions::get()).await.unwrap_err();
        assert_eq!(err.to_string(), "Forbidden here");
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn error_message_falls_back_to_status() {
        let (server, client) = setup().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/tasks/1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client
            .request("/tasks/1", RequestOptions::delete())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP Error 500");
    }

    #[tokio::test]
    async fn json_error_without_message_uses_body_text() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(serde_json::json!({ "error": "bad" })),
            )
            .mount(&server)
            .await;

        let err = client.request("/tasks", RequestOptions::get()).await.unwrap_err();
        assert_eq!(err.to_string(), r#"{"error":"bad"}"#);
    }

    #[tokio::test]
    async fn body_and_caller_headers_are_sent() {
        let (server, client) = setup().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/profile/edit"))
            .and(header("x-request-source", "test"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({ "name": "Ana" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
            .mount(&server)
            .await;

        let options = RequestOptions::put()
            .header(
                HeaderName::from_static("x-request-source"),
                HeaderValue::from_static("test"),
            )
            .json(&serde_json::json!({ "name": "Ana" }))
            .unwrap();
        assert!(client.request("/profile/edit", options).await.is_ok());
    }

    #[tokio::test]
    async fn session_cookie_cannot_be_overridden() {
        let (server, client) = setup().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/verify"))
            .and(header("cookie", "token=abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
            .mount(&server)
            .await;

        client.request("/login", RequestOptions::post()).await.unwrap();
        assert!(client.has_session());

        let forged = RequestOptions::get().header(COOKIE, HeaderValue::from_static("token=forged"));
        assert!(client.request("/verify", forged).await.is_ok());
        assert!(client.request("/verify", RequestOptions::get()).await.is_ok());
    }

    #[tokio::test]
    async fn clear_session_drops_cookie() {
        let (server, client) = setup().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
            .mount(&server)
            .await;

        client.request("/login", RequestOptions::post()).await.unwrap();
        client.clear_session();
        assert!(!client.has_session());

        client.request("/verify", RequestOptions::get()).await.unwrap();
        let requests = server.received_requests().await.unwrap();
        let verify = requests.last().unwrap();
        assert!(verify.headers.get("cookie").is_none());
    }

    #[tokio::test]
    async fn clear_session_drops_cookie_set_below_root() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "token=scoped; Path=/api; HttpOnly")
                    .set_body_json(serde_json::json!({ "id": "u1" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "token=nested")
                    .set_body_json(serde_json::json!({ "ok": true })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
            .mount(&server)
            .await;

        client.request("/login", RequestOptions::post()).await.unwrap();
        client.request("/auth/refresh", RequestOptions::post()).await.unwrap();
        assert!(client.has_session());

        client.clear_session();
        assert!(!client.has_session());

        client.request("/auth/verify", RequestOptions::get()).await.unwrap();
        let requests = server.received_requests().await.unwrap();
        let verify = requests.last().unwrap();
        assert!(verify.headers.get("cookie").is_none());
    }

    #[test]
    fn session_cookie_scope_from_header() {
        let url = Url::parse("http://localhost:3000/api/v1/auth/login").unwrap();
        assert_eq!(
            CookieScope::from_set_cookie("token=x; path=/api; Domain=.localhost", &url),
            Some(CookieScope {
                path: "/api".to_string(),
                domain: Some("localhost".to_string()),
            })
        );
        assert_eq!(
            CookieScope::from_set_cookie("token=x; HttpOnly", &url).map(|s| s.path),
            Some("/api/v1/auth".to_string())
        );
        assert_eq!(CookieScope::from_set_cookie("theme=dark; Path=/", &url), None);
        assert_eq!(default_cookie_path("/login"), "/");
        assert_eq!(path_prefixes("/api/v1/"), vec!["/", "/api", "/api/v1"]);
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        // Grab a free port and release it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = HttpClient::new(&format!("http://127.0.0.1:{}/api/v1", port)).unwrap();
        let err = client.request("/verify", RequestOptions::get()).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[tokio::test]
    async fn success_body_typed_decode() {
        #[derive(serde::Deserialize)]
        struct Echo {
            name: String,
        }

        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "Ana" })))
            .mount(&server)
            .await;

        let echo: Echo = client
            .request_json("/profile", RequestOptions::get())
            .await
            .unwrap();
        assert_eq!(echo.name, "Ana");

        let wrong: Result<Vec<Echo>, _> = client.request_json("/profile", RequestOptions::get()).await;
        assert!(matches!(wrong, Err(ApiError::Decode(_))));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(HttpClient::new("not a url"), Err(ApiError::Url(_))));
    }
}
