pub mod call;

pub use call::CallArgs;

use crate::auth::TokenAuth;
use crate::config::settings::default_server_url;
use crate::parser::template::PathTemplate;
use anyhow::{bail, Result};
use http::Method;
use reqwest::{Client, Response};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// Service API version used when none is given.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Client handle for one service endpoint, e.g. the membership `User/`
/// service. Holds the application name, the parsed service-path template and
/// the default headers sent with every call. Immutable after construction
/// apart from the write-once resolution of the default server url.
///
/// Responses come back exactly as the transport produced them: no status
/// inspection, no retries, no error translation.
#[derive(Debug)]
pub struct ApiClient {
    application: String,
    service_path: PathTemplate,
    api_version: String,
    server_url: OnceLock<String>,
    default_headers: HashMap<String, String>,
    http: Client,
}

impl Clone for ApiClient {
    fn clone(&self) -> Self {
        let server_url = OnceLock::new();
        if let Some(url) = self.server_url.get() {
            let _ = server_url.set(url.clone());
        }
        Self {
            application: self.application.clone(),
            service_path: self.service_path.clone(),
            api_version: self.api_version.clone(),
            server_url,
            default_headers: self.default_headers.clone(),
            http: self.http.clone(),
        }
    }
}

impl ApiClient {
    pub fn new(application: impl Into<String>, service_path: &str) -> Self {
        let http = Client::builder().build().expect("failed to build HTTP client");
        let mut default_headers = HashMap::new();
        default_headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            application: application.into(),
            service_path: PathTemplate::parse(service_path),
            api_version: DEFAULT_API_VERSION.to_string(),
            server_url: OnceLock::new(),
            default_headers,
            http,
        }
    }

    /// Pin the server url instead of resolving it from settings on first use.
    pub fn with_server_url(self, server_url: impl Into<String>) -> Self {
        let _ = self
            .server_url
            .set(server_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Create a new resource. POST to the collection uri.
    pub async fn create(&self, args: CallArgs) -> Result<Response> {
        self.call(Method::POST, None, args).await
    }

    /// Retrieve the resource addressed by `pk`.
    pub async fn read(&self, pk: &str, args: CallArgs) -> Result<Response> {
        self.call(Method::GET, Some(pk), args).await
    }

    /// Replace the resource addressed by `pk`.
    pub async fn update(&self, pk: &str, args: CallArgs) -> Result<Response> {
        self.call(Method::PUT, Some(pk), args).await
    }

    /// Update a subset of the fields of the resource addressed by `pk`.
    pub async fn partial_update(&self, pk: &str, args: CallArgs) -> Result<Response> {
        self.call(Method::PATCH, Some(pk), args).await
    }

    /// Delete the resource addressed by `pk`.
    pub async fn delete(&self, pk: &str, args: CallArgs) -> Result<Response> {
        self.call(Method::DELETE, Some(pk), args).await
    }

    /// Delete part of a collection; the body carries the elements to delete.
    pub async fn bulk_delete(&self, args: CallArgs) -> Result<Response> {
        self.call(Method::DELETE, None, args).await
    }

    /// List the resources in a collection.
    pub async fn list(&self, args: CallArgs) -> Result<Response> {
        self.call(Method::GET, None, args).await
    }

    /// Check existence of a resource (`pk` given) or a collection.
    pub async fn head(&self, pk: Option<&str>, args: CallArgs) -> Result<Response> {
        self.call(Method::HEAD, pk, args).await
    }

    async fn call(&self, method: Method, pk: Option<&str>, args: CallArgs) -> Result<Response> {
        let CallArgs {
            token,
            data,
            params,
            headers,
            timeout,
            kwargs,
        } = args;

        let (path_args, transport_args) = self.service_path.split_args(&kwargs);
        if !transport_args.is_empty() {
            let keys: Vec<&str> = transport_args.keys().map(|k| k.as_str()).collect();
            bail!("unknown transport argument(s): {}", keys.join(", "));
        }

        let uri = self.build_uri(pk, &path_args)?;
        let merged_headers = self.merge_headers(headers);

        // Every verb carries a JSON body, an empty object when none was given.
        let body = serde_json::to_string(&data.unwrap_or_else(|| Value::Object(Map::new())))?;

        tracing::debug!(method = %method, uri = %uri, "dispatching request");

        let mut request = self.http.request(method, &uri).body(body);
        for (name, value) in &merged_headers {
            request = request.header(name, value);
        }
        if let Some(params) = &params {
            request = request.query(params);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        if let Some(token) = &token {
            request = TokenAuth::new(token).apply(request);
        }

        Ok(request.send().await?)
    }

    /// Absolute uri for a call: `server/application/version/service-path[pk/]`.
    fn build_uri(&self, pk: Option<&str>, path_args: &BTreeMap<String, String>) -> Result<String> {
        let server_url = self.resolved_server_url()?;
        let rendered = self.service_path.render(path_args)?;
        let mut uri = [
            server_url.as_str(),
            self.application.as_str(),
            self.api_version.as_str(),
            rendered.as_str(),
        ]
        .join("/");
        if let Some(pk) = pk {
            uri.push_str(pk);
            uri.push('/');
        }
        Ok(uri)
    }

    /// Default headers first, per-call values win on collision.
    fn merge_headers(&self, overrides: HashMap<String, String>) -> HashMap<String, String> {
        let mut merged = self.default_headers.clone();
        merged.extend(overrides);
        merged
    }

    /// Server url pinned at construction, or resolved from settings once and
    /// cached on the handle.
    fn resolved_server_url(&self) -> Result<String> {
        if let Some(url) = self.server_url.get() {
            return Ok(url.clone());
        }
        let url = default_server_url()?;
        Ok(self.server_url.get_or_init(|| url).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("Membership", "User/").with_server_url("http://api.example.com")
    }

    #[test]
    fn collection_uri_joins_server_application_and_version() {
        let uri = client().build_uri(None, &BTreeMap::new()).unwrap();
        assert_eq!(uri, "http://api.example.com/Membership/v1/User/");
    }

    #[test]
    fn resource_uri_ends_with_pk_and_trailing_slash() {
        let uri = client().build_uri(Some("7"), &BTreeMap::new()).unwrap();
        assert_eq!(uri, "http://api.example.com/Membership/v1/User/7/");
    }

    #[test]
    fn trailing_slash_on_server_url_is_stripped() {
        let client =
            ApiClient::new("Membership", "User/").with_server_url("http://api.example.com/");
        let uri = client.build_uri(None, &BTreeMap::new()).unwrap();
        assert_eq!(uri, "http://api.example.com/Membership/v1/User/");
    }

    #[test]
    fn api_version_override_lands_in_uri() {
        let client = ApiClient::new("Membership", "User/")
            .with_server_url("http://api.example.com")
            .with_api_version("v2");
        let uri = client.build_uri(None, &BTreeMap::new()).unwrap();
        assert_eq!(uri, "http://api.example.com/Membership/v2/User/");
    }

    #[test]
    fn templated_uri_substitutes_path_args() {
        let client = ApiClient::new("Membership", "Member/%(idMember)s/Territories/")
            .with_server_url("http://api.example.com");
        let mut path_args = BTreeMap::new();
        path_args.insert("idMember".to_string(), "42".to_string());
        let uri = client.build_uri(None, &path_args).unwrap();
        assert_eq!(
            uri,
            "http://api.example.com/Membership/v1/Member/42/Territories/"
        );
    }

    #[test]
    fn missing_path_arg_is_a_render_error() {
        let client = ApiClient::new("Membership", "Member/%(idMember)s/Territories/")
            .with_server_url("http://api.example.com");
        let err = client.build_uri(None, &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("idMember"));
    }

    #[test]
    fn per_call_headers_override_defaults() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "content-type".to_string(),
            "application/vnd.custom+json".to_string(),
        );
        overrides.insert("x-request-id".to_string(), "r-1".to_string());
        let merged = client().merge_headers(overrides);
        assert_eq!(
            merged.get("content-type").unwrap(),
            "application/vnd.custom+json"
        );
        assert_eq!(merged.get("x-request-id").unwrap(), "r-1");
    }

    #[test]
    fn default_headers_survive_when_not_overridden() {
        let merged = client().merge_headers(HashMap::new());
        assert_eq!(merged.get("content-type").unwrap(), "application/json");
    }

    #[test]
    fn clone_keeps_the_resolved_server_url() {
        let original = client();
        let cloned = original.clone();
        let uri = cloned.build_uri(None, &BTreeMap::new()).unwrap();
        assert_eq!(uri, "http://api.example.com/Membership/v1/User/");
    }
}
