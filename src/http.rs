//! HTTP transport seam and request encoding helpers

use std::time::Duration;

use crate::error::BoxCastError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// GET and DELETE carry their parameters in the query string.
    pub fn uses_query_string(&self) -> bool {
        matches!(self, Method::Get | Method::Delete)
    }
}

/// A fully built request, ready for a `Transport`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set a header, replacing any existing value with the same (case-insensitive) name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes requests. Implementations return `Err` only when no HTTP response
/// was obtained; non-2xx statuses come back as `Ok`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, BoxCastError>;
}

/// Blocking transport backed by a `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, BoxCastError> {
        let url = request.url.as_str();
        let headers = request.headers.as_slice();

        let result = match request.method {
            Method::Get => with_headers(self.agent.get(url), headers).call(),
            Method::Delete => with_headers(self.agent.delete(url), headers).call(),
            Method::Post | Method::Put => {
                let builder = if request.method == Method::Post {
                    self.agent.post(url)
                } else {
                    self.agent.put(url)
                };
                let builder = with_headers(builder, headers);
                match &request.body {
                    Some(body) => builder.send(body.as_slice()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| BoxCastError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| BoxCastError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

/// Percent-encode a query value. ASCII alphanumerics and `-._~/?` pass through.
pub fn percent_encode_rfc3986(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%2F", "/")
        .replace("%3F", "?")
}

/// Percent-encode one path segment. Unlike query values, `/` and `?` are escaped.
pub fn encode_path_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Render `key=value` pairs joined with `&`, encoding each value.
pub fn encode_query<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, percent_encode_rfc3986(&value)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Records every request and replays queued responses in order.
    /// With nothing queued it answers `200` with an empty body.
    #[derive(Default)]
    pub struct MockTransport {
        requests: Mutex<Vec<HttpRequest>>,
        responses: Mutex<VecDeque<Result<HttpResponse, BoxCastError>>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, status: u16, body: &str) {
            self.responses.lock().unwrap().push_back(Ok(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            }));
        }

        pub fn fail(&self, error: BoxCastError) {
            self.responses.lock().unwrap().push_back(Err(error));
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn last_request(&self) -> Option<HttpRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    impl Transport for MockTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, BoxCastError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(HttpResponse { status: 200, body: Vec::new() }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreserved_characters_pass_through() {
        let value = "AZaz09-._~/?";
        assert_eq!(percent_encode_rfc3986(value), value);
        assert_eq!(urlencoding::decode(&percent_encode_rfc3986(value)).unwrap(), value);
    }

    #[test]
    fn test_path_segments_escape_separators() {
        assert_eq!(encode_path_segment("abc-123"), "abc-123");
        assert_eq!(encode_path_segment("a/b?c"), "a%2Fb%3Fc");
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        assert_eq!(percent_encode_rfc3986("timeframe:current"), "timeframe%3Acurrent");
        assert_eq!(percent_encode_rfc3986("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(percent_encode_rfc3986("é"), "%C3%A9");
    }

    #[test]
    fn test_encoded_query_decodes_to_original() {
        let original = "timeframe:current timeframe:preroll";
        let encoded = percent_encode_rfc3986(original);
        assert!(!encoded.contains(' '));
        assert_eq!(urlencoding::decode(&encoded).unwrap(), original);
    }

    #[test]
    fn test_encode_query_joins_pairs() {
        let query = encode_query(vec![("l", "20".to_string()), ("s", "-starts_at".to_string())]);
        assert_eq!(query, "l=20&s=-starts_at");
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut request = HttpRequest::new(Method::Get, "https://api.boxcast.com/");
        request.set_header("Accept", "text/plain");
        request.set_header("accept", "application/json");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("ACCEPT"), Some("application/json"));
    }

    #[test]
    fn test_status_success_range() {
        let ok = HttpResponse { status: 204, body: Vec::new() };
        let redirect = HttpResponse { status: 302, body: Vec::new() };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }
}
