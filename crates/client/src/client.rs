//! The session routing client: resolves the initial target, stamps the
//! token onto outgoing requests, and follows tokens handed back by the
//! server.

use std::sync::Arc;
use std::time::Instant;

use ermes_domain::config::{ClientConfig, InitialTarget, DEFAULT_TOKEN_HEADER_NAME};
use ermes_domain::error::{Error, Result};
use ermes_domain::trace::TraceEvent;
use ermes_domain::{Scheme, SessionToken};
use parking_lot::RwLock;
use reqwest::header::{HeaderName, HeaderValue};

use crate::origin::{parse_origin, OriginProvider};
use crate::routing::RoutingTarget;
use crate::transport::{CredentialPolicy, RequestOptions, Response, Transport, TransportRequest};

/// Routes every request of one session to the backend host the server bound
/// it to.
///
/// Create via [`ClientBuilder`](crate::builder::ClientBuilder) or
/// [`SessionRoutingClient::new`].
///
/// # Concurrency
///
/// The client is `Send + Sync` and `dispatch` takes `&self`, but the
/// routing target is a single last-writer-wins cell: if two in-flight
/// dispatches both come back with different tokens, whichever response is
/// processed last wins. Use one client per logical session when that
/// matters.
pub struct SessionRoutingClient {
    transport: Arc<dyn Transport>,
    scheme: Scheme,
    token_header_name: String,
    token_header: HeaderName,
    target: RwLock<RoutingTarget>,
}

impl std::fmt::Debug for SessionRoutingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRoutingClient")
            .field("scheme", &self.scheme)
            .field("token_header_name", &self.token_header_name)
            .field("target", &*self.target.read())
            .finish_non_exhaustive()
    }
}

impl SessionRoutingClient {
    /// Header used when the configuration does not name one.
    pub const DEFAULT_TOKEN_HEADER_NAME: &'static str = DEFAULT_TOKEN_HEADER_NAME;

    /// Start a new builder.
    pub fn builder() -> crate::builder::ClientBuilder {
        crate::builder::ClientBuilder::new()
    }

    /// Resolve the initial routing target from `config`.
    ///
    /// `origins` is only consulted for [`InitialTarget::Environment`].
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        origins: &dyn OriginProvider,
    ) -> Result<Self> {
        let token_header = HeaderName::from_bytes(config.token_header_name.as_bytes())
            .map_err(|e| {
                Error::Validation(format!(
                    "invalid token header name {:?}: {e}",
                    config.token_header_name
                ))
            })?;

        let (source, scheme, target) = match &config.initial {
            InitialTarget::Token { token, scheme } => {
                token.validate()?;
                let target = RoutingTarget::Bound {
                    token: token.clone(),
                };
                ("token", *scheme, target)
            }
            InitialTarget::Origin { origin } => {
                let origin = parse_origin(origin)?;
                let target = RoutingTarget::Unresolved {
                    host: origin.host().to_owned(),
                };
                ("origin", origin.scheme(), target)
            }
            InitialTarget::Environment => {
                let origin = origins.current_origin().ok_or_else(|| {
                    Error::Config(
                        "no origin resolvable: set an explicit origin or token, \
                         or run where the environment provides one"
                            .into(),
                    )
                })?;
                let target = RoutingTarget::Unresolved {
                    host: origin.host().to_owned(),
                };
                ("environment", origin.scheme(), target)
            }
        };

        TraceEvent::ClientResolved {
            source: source.into(),
            scheme: scheme.to_string(),
            host: target.authority().to_owned(),
            bound: target.is_bound(),
        }
        .emit();

        Ok(Self {
            transport,
            scheme,
            token_header_name: config.token_header_name.clone(),
            token_header,
            target: RwLock::new(target),
        })
    }

    // ── accessors ────────────────────────────────────────────────────

    /// The bound session token, or `None` before the server has issued one.
    ///
    /// Returns a copy; the client's own state cannot be changed through it.
    pub fn token(&self) -> Option<SessionToken> {
        self.target.read().token().cloned()
    }

    /// A snapshot of the current routing target.
    pub fn routing_target(&self) -> RoutingTarget {
        self.target.read().clone()
    }

    /// Scheme fixed at construction, used for every request.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Header name the token is sent and read under, as configured.
    pub fn token_header_name(&self) -> &str {
        &self.token_header_name
    }

    /// `scheme://authority` the next request will be sent to.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.target.read().authority())
    }

    // ── dispatch ─────────────────────────────────────────────────────

    /// `GET path` with default options.
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.dispatch(path, RequestOptions::default()).await
    }

    /// Send one request to the current routing target.
    ///
    /// `path` is appended to `scheme://authority` as-is. When a session is
    /// bound, the token header is set (replacing any caller value).
    /// Credentials are always included.
    ///
    /// A 2xx response carrying the token header rebinds the client to the
    /// returned token, even if one was already bound. A token header that
    /// does not decode fails the call with [`Error::TokenDecode`] and leaves
    /// the routing target untouched. Non-2xx responses are returned as-is
    /// and never change the target.
    pub async fn dispatch(&self, path: &str, options: RequestOptions) -> Result<Response> {
        let target = self.target.read().clone();
        let url = format!("{}://{}{}", self.scheme, target.authority(), path);

        let mut headers = options.headers;
        if let Some(token) = target.token() {
            let value = token.to_header_value()?;
            let value = HeaderValue::from_bytes(value.as_bytes()).map_err(|e| {
                Error::Validation(format!("token cannot be sent as a header value: {e}"))
            })?;
            headers.insert(self.token_header.clone(), value);
        }

        if let Some(policy) = options.credentials {
            if policy != CredentialPolicy::Include {
                tracing::debug!(requested = ?policy, "credential policy forced to include");
            }
        }

        let req = TransportRequest {
            url: url.clone(),
            method: options.method.clone(),
            headers,
            body: options.body,
            credentials: CredentialPolicy::Include,
            timeout: options.timeout,
        };

        let start = Instant::now();
        let response = self.transport.send(req).await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "request failed");
            e
        })?;

        TraceEvent::RequestDispatched {
            method: options.method.to_string(),
            url: url.clone(),
            bound: target.is_bound(),
            status: response.status.as_u16(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();

        self.follow_token(&url, &response)?;
        Ok(response)
    }

    /// Rebind to the token carried by a successful response, if any.
    fn follow_token(&self, url: &str, response: &Response) -> Result<()> {
        if !response.is_success() {
            return Ok(());
        }
        let Some(raw) = response.headers.get(&self.token_header) else {
            return Ok(());
        };

        let token = std::str::from_utf8(raw.as_bytes())
            .map_err(|e| Error::TokenDecode(format!("token header is not UTF-8: {e}")))
            .and_then(|raw| {
                if raw.trim().is_empty() {
                    Ok(None)
                } else {
                    SessionToken::from_header_value(raw).map(Some)
                }
            });

        let token = match token {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(()),
            Err(e) => {
                TraceEvent::TokenRejected {
                    url: url.to_owned(),
                    status: response.status.as_u16(),
                    reason: e.to_string(),
                }
                .emit();
                return Err(e);
            }
        };

        let host = token.host().to_owned();
        let session_id_len = token.session_id().len();
        let next = RoutingTarget::Bound { token };
        let previous = std::mem::replace(&mut *self.target.write(), next.clone());

        match previous {
            RoutingTarget::Unresolved {
                host: previous_host,
            } => TraceEvent::SessionBound {
                previous_host,
                host,
                session_id_len,
            }
            .emit(),
            RoutingTarget::Bound { token: old } if Some(&old) == next.token() => {
                tracing::debug!(host = %host, "session token refreshed unchanged");
            }
            RoutingTarget::Bound { token: old } => TraceEvent::SessionRotated {
                previous_host: old.host().to_owned(),
                host,
                session_id_len,
            }
            .emit(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origin::{NoOrigin, StaticOrigin};
    use async_trait::async_trait;
    use ermes_domain::Origin;
    use parking_lot::Mutex;
    use reqwest::header::HeaderMap;
    use reqwest::{Method, StatusCode};
    use std::collections::{HashMap, VecDeque};
    use tokio::sync::oneshot;

    const X: &str = "X-ErmesSessionToken";

    // ── Test transport: replays scripted responses, records requests ─────

    #[derive(Default)]
    struct Scripted {
        requests: Mutex<Vec<TransportRequest>>,
        responses: Mutex<VecDeque<Result<Response>>>,
    }

    impl Scripted {
        fn push(&self, response: Response) {
            self.responses.lock().push_back(Ok(response));
        }

        fn push_err(&self, err: Error) {
            self.responses.lock().push_back(Err(err));
        }

        fn last(&self) -> TransportRequest {
            self.requests.lock().last().cloned().expect("no request sent")
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn send(&self, req: TransportRequest) -> Result<Response> {
            self.requests.lock().push(req);
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(Response::new(StatusCode::OK)))
        }
    }

    fn ok() -> Response {
        Response::new(StatusCode::OK)
    }

    fn with_token_header(status: StatusCode, value: &str) -> Response {
        let mut resp = Response::new(status);
        resp.headers.insert(X, HeaderValue::from_str(value).unwrap());
        resp
    }

    fn token_json(host: &str, session_id: &str) -> String {
        format!(r#"{{"host":"{host}","sessionId":"{session_id}"}}"#)
    }

    fn client_for(config: ClientConfig) -> (SessionRoutingClient, Arc<Scripted>) {
        let transport = Arc::new(Scripted::default());
        let client = SessionRoutingClient::new(&config, transport.clone(), &NoOrigin).unwrap();
        (client, transport)
    }

    // ── Construction ─────────────────────────────────────────────────────

    #[test]
    fn construction_fails_without_any_origin() {
        let transport = Arc::new(Scripted::default());
        let err = SessionRoutingClient::new(&ClientConfig::default(), transport, &NoOrigin)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }

    #[test]
    fn environment_origin_is_used_when_available() {
        let transport = Arc::new(Scripted::default());
        let env = StaticOrigin(Origin::new(Scheme::Http, "page.example:8080").unwrap());
        let client = SessionRoutingClient::new(&ClientConfig::default(), transport, &env).unwrap();

        assert_eq!(client.scheme(), Scheme::Http);
        assert_eq!(client.base_url(), "http://page.example:8080");
        assert!(client.token().is_none());
    }

    #[test]
    fn explicit_origin_ignores_environment() {
        let transport = Arc::new(Scripted::default());
        let env = StaticOrigin(Origin::new(Scheme::Http, "page.example").unwrap());
        let config = ClientConfig::with_origin("https://a.example");
        let client = SessionRoutingClient::new(&config, transport, &env).unwrap();
        assert_eq!(client.base_url(), "https://a.example");
    }

    #[test]
    fn explicit_token_starts_bound() {
        let token = SessionToken::new("svc1.internal", "abc").unwrap();
        let (client, _) = client_for(ClientConfig::with_token(token.clone(), Scheme::Https));
        assert_eq!(client.token(), Some(token.clone()));
        assert_eq!(client.routing_target(), RoutingTarget::Bound { token });
    }

    #[test]
    fn malformed_configured_token_host_is_a_validation_error() {
        // Deserialized tokens skip `SessionToken::new`, so build one that way.
        let token: SessionToken =
            serde_json::from_str(r#"{"host":"svc1.internal/","sessionId":"abc"}"#).unwrap();
        let config = ClientConfig::with_token(token, Scheme::Https);
        let err = SessionRoutingClient::new(&config, Arc::new(Scripted::default()), &NoOrigin)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
    }

    #[test]
    fn invalid_header_name_is_a_validation_error() {
        let config = ClientConfig {
            token_header_name: "not a header".into(),
            ..ClientConfig::with_origin("https://a.example")
        };
        let err = SessionRoutingClient::new(&config, Arc::new(Scripted::default()), &NoOrigin)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
    }

    #[test]
    fn unparsable_origin_is_a_config_error() {
        let config = ClientConfig::with_origin("https://a.example/api");
        let err = SessionRoutingClient::new(&config, Arc::new(Scripted::default()), &NoOrigin)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }

    #[test]
    fn default_header_name_is_exposed_on_the_client() {
        assert_eq!(SessionRoutingClient::DEFAULT_TOKEN_HEADER_NAME, X);
        let (client, _) = client_for(ClientConfig::with_origin("https://a.example"));
        assert_eq!(client.token_header_name(), X);
    }

    // ── Dispatch ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn first_request_goes_to_explicit_origin() {
        let (client, transport) = client_for(ClientConfig::with_origin("https://a.example"));
        client.get("/r").await.unwrap();

        let req = transport.last();
        assert_eq!(req.url, "https://a.example/r");
        assert!(req.headers.get(X).is_none());
    }

    #[tokio::test]
    async fn returned_token_redirects_next_request() {
        let (client, transport) = client_for(ClientConfig::with_origin("https://a.example"));
        transport.push(with_token_header(StatusCode::OK, &token_json("b.example", "s1")));

        client.get("/r").await.unwrap();
        client.get("/r").await.unwrap();

        let req = transport.last();
        assert_eq!(req.url, "https://b.example/r");
        assert_eq!(
            req.headers.get(X).unwrap().to_str().unwrap(),
            r#"{"host":"b.example","sessionId":"s1"}"#
        );
    }

    #[tokio::test]
    async fn credentials_are_always_included() {
        let (client, transport) = client_for(ClientConfig::with_origin("https://a.example"));

        for policy in [None, Some(CredentialPolicy::Omit), Some(CredentialPolicy::SameOrigin)] {
            let options = RequestOptions {
                credentials: policy,
                ..RequestOptions::default()
            };
            client.dispatch("/r", options).await.unwrap();
            assert_eq!(transport.last().credentials, CredentialPolicy::Include);
        }
    }

    #[tokio::test]
    async fn identical_token_twice_is_idempotent() {
        let (client, transport) = client_for(ClientConfig::with_origin("https://a.example"));
        let json = token_json("b.example", "s1");
        transport.push(with_token_header(StatusCode::OK, &json));
        transport.push(with_token_header(StatusCode::OK, &json));

        client.get("/one").await.unwrap();
        let after_first = client.routing_target();
        client.get("/two").await.unwrap();

        assert_eq!(client.routing_target(), after_first);
        assert_eq!(transport.last().url, "https://b.example/two");
    }

    #[tokio::test]
    async fn non_success_response_never_rebinds() {
        let (client, transport) = client_for(ClientConfig::with_origin("https://a.example"));
        for status in [
            StatusCode::MULTIPLE_CHOICES,
            StatusCode::FOUND,
            StatusCode::NOT_FOUND,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            transport.push(with_token_header(status, &token_json("b.example", "s1")));
            let resp = client.get("/r").await.unwrap();
            assert_eq!(resp.status, status);
            assert!(client.token().is_none());
        }
        client.get("/r").await.unwrap();
        assert_eq!(transport.last().url, "https://a.example/r");
    }

    #[tokio::test]
    async fn undecodable_token_rejects_and_keeps_state() {
        let token = SessionToken::new("svc1.internal", "abc").unwrap();
        let (client, transport) = client_for(ClientConfig::with_token(token.clone(), Scheme::Https));

        let trailing_slash = token_json("b.example/", "s1");
        for bad in ["not json", r#"{"host":"b.example"}"#, trailing_slash.as_str()] {
            transport.push(with_token_header(StatusCode::OK, bad));
            let err = client.get("/r").await.unwrap_err();
            assert!(matches!(err, Error::TokenDecode(_)), "{bad}: {err}");
            assert_eq!(client.token(), Some(token.clone()));
        }
    }

    #[tokio::test]
    async fn non_utf8_token_header_is_a_decode_error() {
        let (client, transport) = client_for(ClientConfig::with_origin("https://a.example"));
        let mut resp = ok();
        resp.headers
            .insert(X, HeaderValue::from_bytes(&[0xff, 0xfe, b'{']).unwrap());
        transport.push(resp);

        let err = client.get("/r").await.unwrap_err();
        assert!(matches!(err, Error::TokenDecode(_)));
        assert!(client.token().is_none());
    }

    #[tokio::test]
    async fn unsendable_response_token_is_rejected_and_client_keeps_working() {
        let (client, transport) = client_for(ClientConfig::with_origin("https://a.example"));
        // Plain ASCII on the wire, but the escape decodes to DEL.
        transport.push(with_token_header(
            StatusCode::OK,
            r#"{"host":"b.example","sessionId":"s\u007f1"}"#,
        ));

        let err = client.get("/r").await.unwrap_err();
        assert!(matches!(err, Error::TokenDecode(_)), "{err}");
        assert!(client.token().is_none());

        client.get("/next").await.unwrap();
        client.get("/next").await.unwrap();
        assert_eq!(transport.requests.lock().len(), 3);
        assert_eq!(transport.last().url, "https://a.example/next");
    }

    #[test]
    fn unsendable_configured_token_is_a_validation_error() {
        assert!(matches!(
            SessionToken::new("svc1.internal", "a\u{7f}b"),
            Err(Error::Validation(_))
        ));

        let token: SessionToken =
            serde_json::from_str(r#"{"host":"svc1.internal","sessionId":"a\u007fb"}"#).unwrap();
        let config = ClientConfig::with_token(token, Scheme::Https);
        let err = SessionRoutingClient::new(&config, Arc::new(Scripted::default()), &NoOrigin)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
    }

    #[tokio::test]
    async fn empty_token_header_counts_as_absent() {
        let (client, transport) = client_for(ClientConfig::with_origin("https://a.example"));
        transport.push(with_token_header(StatusCode::OK, ""));

        client.get("/r").await.unwrap();
        assert!(client.token().is_none());
    }

    #[tokio::test]
    async fn explicit_token_scenario() {
        let token = SessionToken::new("svc1.internal", "abc").unwrap();
        let (client, transport) = client_for(ClientConfig::with_token(token, Scheme::Http));

        client.get("/ping").await.unwrap();

        let req = transport.last();
        assert_eq!(req.url, "http://svc1.internal/ping");
        assert_eq!(
            req.headers.get(X).unwrap().to_str().unwrap(),
            r#"{"host":"svc1.internal","sessionId":"abc"}"#
        );
    }

    #[tokio::test]
    async fn rotated_token_overrides_bound_session() {
        let token = SessionToken::new("svc1.internal", "abc").unwrap();
        let (client, transport) = client_for(ClientConfig::with_token(token, Scheme::Https));
        transport.push(with_token_header(StatusCode::OK, &token_json("svc2.internal", "def")));

        client.get("/migrate").await.unwrap();
        client.get("/r").await.unwrap();

        let bound = client.token().unwrap();
        assert_eq!(bound.host(), "svc2.internal");
        assert_eq!(bound.session_id(), "def");
        assert_eq!(transport.last().url, "https://svc2.internal/r");
    }

    #[tokio::test]
    async fn caller_options_pass_through_and_token_header_is_overwritten() {
        let token = SessionToken::new("svc1.internal", "abc").unwrap();
        let (client, transport) = client_for(ClientConfig::with_token(token, Scheme::Https));

        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.append(X, HeaderValue::from_static("stale-1"));
        headers.append(X, HeaderValue::from_static("stale-2"));
        let options = RequestOptions {
            method: Method::PUT,
            headers,
            body: Some(b"{\"a\":1}".to_vec()),
            ..RequestOptions::default()
        };
        client.dispatch("/items/1", options).await.unwrap();

        let req = transport.last();
        assert_eq!(req.method, Method::PUT);
        assert_eq!(req.body.as_deref(), Some(&b"{\"a\":1}"[..]));
        assert_eq!(req.headers["content-type"], "application/json");
        let values: Vec<_> = req.headers.get_all(X).iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], r#"{"host":"svc1.internal","sessionId":"abc"}"#);
    }

    #[tokio::test]
    async fn path_is_appended_verbatim() {
        let (client, transport) = client_for(ClientConfig::with_origin("https://a.example"));
        client.get("?q=1").await.unwrap();
        assert_eq!(transport.last().url, "https://a.example?q=1");
    }

    #[tokio::test]
    async fn custom_header_name_is_used_both_ways() {
        let config = ClientConfig {
            token_header_name: "X-Affinity".into(),
            ..ClientConfig::with_origin("https://a.example")
        };
        let (client, transport) = client_for(config);

        // Default header name is not recognised.
        transport.push(with_token_header(StatusCode::OK, &token_json("b.example", "s1")));
        client.get("/r").await.unwrap();
        assert!(client.token().is_none());

        let mut resp = ok();
        resp.headers.insert(
            "x-affinity",
            HeaderValue::from_str(&token_json("c.example", "s2")).unwrap(),
        );
        transport.push(resp);
        client.get("/r").await.unwrap();
        client.get("/r").await.unwrap();

        let req = transport.last();
        assert_eq!(req.url, "https://c.example/r");
        assert!(req.headers.get("X-Affinity").is_some());
        assert!(req.headers.get(X).is_none());
    }

    #[tokio::test]
    async fn transport_errors_propagate_and_keep_state() {
        let (client, transport) = client_for(ClientConfig::with_origin("https://a.example"));
        transport.push_err(Error::Http("connection refused".into()));

        let err = client.get("/r").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert_eq!(client.base_url(), "https://a.example");
    }

    #[tokio::test]
    async fn token_accessor_returns_a_copy() {
        let token = SessionToken::new("svc1.internal", "abc").unwrap();
        let (client, _) = client_for(ClientConfig::with_token(token, Scheme::Https));

        let copy = client.token().unwrap();
        drop(copy);
        assert_eq!(client.token().unwrap().host(), "svc1.internal");
    }

    // ── Cancellation and concurrency ────────────────────────────────────

    struct NeverResponds;

    #[async_trait]
    impl Transport for NeverResponds {
        async fn send(&self, _req: TransportRequest) -> Result<Response> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn cancelled_dispatch_leaves_target_unchanged() {
        let config = ClientConfig::with_origin("https://a.example");
        let client = SessionRoutingClient::new(&config, Arc::new(NeverResponds), &NoOrigin).unwrap();

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(20), client.get("/r")).await;
        assert!(result.is_err());
        assert_eq!(
            client.routing_target(),
            RoutingTarget::Unresolved {
                host: "a.example".into()
            }
        );
    }

    /// Releases each response only when the test says so.
    #[derive(Default)]
    struct Gated {
        gates: Mutex<HashMap<String, oneshot::Receiver<Response>>>,
    }

    impl Gated {
        fn gate(&self, url: &str) -> oneshot::Sender<Response> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().insert(url.to_owned(), rx);
            tx
        }
    }

    #[async_trait]
    impl Transport for Gated {
        async fn send(&self, req: TransportRequest) -> Result<Response> {
            let rx = self
                .gates
                .lock()
                .remove(&req.url)
                .ok_or_else(|| Error::Http(format!("no gate for {}", req.url)))?;
            rx.await.map_err(|_| Error::Http("gate dropped".into()))
        }
    }

    #[tokio::test]
    async fn concurrent_dispatches_resolve_last_writer_wins() {
        let transport = Arc::new(Gated::default());
        let gate_a = transport.gate("https://a.example/a");
        let gate_b = transport.gate("https://a.example/b");

        let config = ClientConfig::with_origin("https://a.example");
        let client =
            Arc::new(SessionRoutingClient::new(&config, transport.clone(), &NoOrigin).unwrap());

        let first = tokio::spawn({
            let client = client.clone();
            async move { client.get("/a").await }
        });
        let second = tokio::spawn({
            let client = client.clone();
            async move { client.get("/b").await }
        });

        // Let both requests reach the transport before releasing either.
        while !transport.gates.lock().is_empty() {
            tokio::task::yield_now().await;
        }

        gate_b
            .send(with_token_header(StatusCode::OK, &token_json("b.example", "sb")))
            .unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(client.token().unwrap().host(), "b.example");

        gate_a
            .send(with_token_header(StatusCode::OK, &token_json("a2.example", "sa")))
            .unwrap();
        first.await.unwrap().unwrap();
        assert_eq!(client.token().unwrap().host(), "a2.example");
    }
}
