//! BoxCast API client

use std::sync::Arc;
use std::thread;

use serde_json::{Map, Value};
use url::Url;

use crate::config::ClientConfig;
use crate::dispatch::CallbackQueue;
use crate::error::BoxCastError;
use crate::http::{encode_query, HttpRequest, HttpResponse, Method, Transport, UreqTransport};

/// Request parameters, sent as a query string or a JSON body depending on the method.
pub type Parameters = Map<String, Value>;

/// Authorization and environment context used to build requests.
pub trait Scope: Send + Sync {
    fn is_authorized(&self) -> bool;
    fn api_url(&self) -> &str;
    fn additional_headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Unauthenticated access to public resources.
#[derive(Debug, Clone)]
pub struct PublicScope {
    api_url: String,
}

impl PublicScope {
    pub fn new() -> Self {
        Self::with_api_url("https://api.boxcast.com")
    }

    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for PublicScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope for PublicScope {
    fn is_authorized(&self) -> bool {
        true
    }

    fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// The client for the BoxCast API.
///
/// Cloning is cheap; clones share the scope, transport and callback queue.
#[derive(Clone)]
pub struct BoxCastClient {
    scope: Arc<dyn Scope>,
    transport: Arc<dyn Transport>,
    callbacks: CallbackQueue,
}

impl BoxCastClient {
    pub fn new(scope: Arc<dyn Scope>, transport: Arc<dyn Transport>, callbacks: CallbackQueue) -> Self {
        Self { scope, transport, callbacks }
    }

    /// Build a client for the public scope over a `ureq` transport.
    pub fn from_config(config: &ClientConfig) -> Result<Self, BoxCastError> {
        let callbacks = CallbackQueue::spawn("boxcast-callbacks").map_err(|e| {
            tracing::error!(error = %e, "failed to start callback queue");
            BoxCastError::Unknown
        })?;
        Ok(Self::new(
            Arc::new(PublicScope::with_api_url(&config.api_url)),
            Arc::new(UreqTransport::new(config.request_timeout())),
            callbacks,
        ))
    }

    pub fn is_authorized(&self) -> bool {
        self.scope.is_authorized()
    }

    pub fn scope(&self) -> &dyn Scope {
        self.scope.as_ref()
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    pub fn callbacks(&self) -> &CallbackQueue {
        &self.callbacks
    }

    // Raw requests

    pub fn get(&self, path: &str, parameters: Option<&Parameters>) -> Result<HttpResponse, BoxCastError> {
        self.request(path, Method::Get, parameters)
    }

    pub fn post(&self, path: &str, parameters: Option<&Parameters>) -> Result<HttpResponse, BoxCastError> {
        self.request(path, Method::Post, parameters)
    }

    pub fn delete(&self, path: &str) -> Result<HttpResponse, BoxCastError> {
        self.request(path, Method::Delete, None)
    }

    // JSON requests

    pub fn get_json(&self, path: &str, parameters: Option<&Parameters>) -> Result<Value, BoxCastError> {
        self.request_json(path, Method::Get, parameters)
    }

    pub fn post_json(&self, path: &str, parameters: Option<&Parameters>) -> Result<Value, BoxCastError> {
        self.request_json(path, Method::Post, parameters)
    }

    pub fn put_json(&self, path: &str, parameters: &Parameters) -> Result<Value, BoxCastError> {
        self.request_json(path, Method::Put, Some(parameters))
    }

    fn request_json(
        &self,
        path: &str,
        method: Method,
        parameters: Option<&Parameters>,
    ) -> Result<Value, BoxCastError> {
        let response = self.request(path, method, parameters)?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Execute a request against the scope's API URL.
    ///
    /// Returns the response for any 2xx status; other statuses are mapped
    /// through the server's error body.
    pub fn request(
        &self,
        path: &str,
        method: Method,
        parameters: Option<&Parameters>,
    ) -> Result<HttpResponse, BoxCastError> {
        let url = format!("{}{}", self.scope.api_url(), path);
        let request = build_request(&url, method, parameters, &self.scope.additional_headers())?;

        tracing::debug!(method = method.as_str(), url = %request.url, "api request");
        let response = self.transport.execute(&request)?;

        if !response.is_success() {
            tracing::debug!(status = response.status, url = %request.url, "api request failed");
            return Err(BoxCastError::from_response_body(&response.body));
        }
        Ok(response)
    }

    /// Run `work` on a background thread and deliver its result on the callback queue.
    pub(crate) fn spawn_request<T, W, C>(&self, work: W, completion: C)
    where
        T: Send + 'static,
        W: FnOnce(&BoxCastClient) -> Result<T, BoxCastError> + Send + 'static,
        C: FnOnce(Result<T, BoxCastError>) + Send + 'static,
    {
        let client = self.clone();
        thread::spawn(move || {
            let result = work(&client);
            client.callbacks.dispatch(move || completion(result));
        });
    }
}

/// Render a parameter value for a query string. Strings are used verbatim.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build a request for `url`, placing parameters according to the method.
pub fn build_request(
    url: &str,
    method: Method,
    parameters: Option<&Parameters>,
    additional_headers: &[(String, String)],
) -> Result<HttpRequest, BoxCastError> {
    let mut parsed = Url::parse(url).map_err(|_| BoxCastError::InvalidUrl)?;
    let mut body = None;

    if let Some(parameters) = parameters {
        if method.uses_query_string() {
            let query = encode_query(parameters.iter().map(|(k, v)| (k.as_str(), query_value(v))));
            if !query.is_empty() {
                parsed.set_query(Some(&query));
            }
        } else {
            body = Some(serde_json::to_vec_pretty(parameters)?);
        }
    }

    let mut request = HttpRequest::new(method, parsed.as_str());
    request.set_header("Accept", "application/json");
    if body.is_some() {
        request.set_header("Content-Type", "application/json");
    }
    request.body = body;

    for (name, value) in additional_headers {
        request.set_header(name, value);
    }
    Ok(request)
}
