use axum::Json;
use axum::body::Body;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::StatusCode;
use http::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue};
use tollgate_core::ConnectionSecret;
use tollgate_identity::Authenticated;
use tollgate_registry::RegistryClient;

use crate::{ForwardError, ForwardTokenIssuer};

/// Authenticated proxy in front of the registry's forward endpoint
#[derive(Debug, Clone)]
pub struct ProxyGateway {
    registry: RegistryClient,
    issuer: ForwardTokenIssuer,
}

impl ProxyGateway {
    pub const fn new(registry: RegistryClient, issuer: ForwardTokenIssuer) -> Self {
        Self { registry, issuer }
    }

    pub const fn issuer(&self) -> &ForwardTokenIssuer {
        &self.issuer
    }

    /// Forward a caller's request body to `target` through the registry
    ///
    /// The caller must already hold a live session. The target is checked
    /// before the connection secret. The body is sent once, unchanged, with
    /// a forward token scoped to the connection as the bearer credential.
    pub async fn forward(
        &self,
        caller: &Authenticated,
        connection_secret: Option<&str>,
        target: Option<&str>,
        body: Bytes,
    ) -> Result<ForwardResponse, ForwardError> {
        let target = target.filter(|target| !target.is_empty()).ok_or(ForwardError::MissingTarget)?;
        let secret = connection_secret
            .and_then(ConnectionSecret::parse)
            .ok_or(ForwardError::MissingSecretHeader)?;

        let token = self.issuer.issue(&secret);

        tracing::info!(user_id = %caller.user.id, target, bytes = body.len(), "forwarding request");

        let upstream = self
            .registry
            .forward(token.expose(), target, body)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, target, "forward request failed");
                ForwardError::Proxy(e.to_string())
            })?;

        ForwardResponse::relay(upstream).await
    }
}

/// An upstream response ready to be written back to the caller
#[derive(Debug)]
pub enum ForwardResponse {
    /// `text/event-stream`, relayed chunk by chunk as it arrives
    Stream {
        status: StatusCode,
        upstream: reqwest::Response,
    },
    /// JSON, re-emitted with the upstream status
    Json {
        status: StatusCode,
        body: serde_json::Value,
    },
    /// Anything else, relayed as text
    Text {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: String,
    },
}

impl ForwardResponse {
    /// Classify an upstream response by its content type
    ///
    /// Event streams are left unread so the body can be piped through
    /// without buffering.
    async fn relay(upstream: reqwest::Response) -> Result<Self, ForwardError> {
        let status = upstream.status();
        let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
        let kind = content_type
            .as_ref()
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if kind.contains("text/event-stream") {
            return Ok(Self::Stream { status, upstream });
        }

        if kind.contains("application/json") {
            let body = upstream.json().await.map_err(read_failed)?;
            return Ok(Self::Json { status, body });
        }

        let body = upstream.text().await.map_err(read_failed)?;
        Ok(Self::Text {
            status,
            content_type,
            body,
        })
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Stream { status, .. } | Self::Json { status, .. } | Self::Text { status, .. } => *status,
        }
    }
}

fn read_failed(error: reqwest::Error) -> ForwardError {
    tracing::error!(error = %error, "failed to read forwarded response");
    ForwardError::Proxy(error.to_string())
}

impl IntoResponse for ForwardResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Stream { status, upstream } => (
                status,
                [(CONTENT_TYPE, "text/event-stream"), (CACHE_CONTROL, "no-cache")],
                Body::from_stream(upstream.bytes_stream()),
            )
                .into_response(),
            Self::Json { status, body } => (status, Json(body)).into_response(),
            Self::Text {
                status,
                content_type,
                body,
            } => {
                let mut response = (status, body).into_response();
                if let Some(content_type) = content_type {
                    response.headers_mut().insert(CONTENT_TYPE, content_type);
                }
                response
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::time::Duration;

    use axum::Router;
    use axum::routing::post;
    use futures_util::StreamExt as _;
    use http_body_util::BodyExt as _;
    use jiff::Timestamp;
    use secrecy::SecretString;
    use tollgate_identity::User;
    use url::Url;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const SSE_CHUNKS: [&str; 3] = ["data: one\n\n", "data: two\n\n", "data: three\n\n"];

    fn caller() -> Authenticated {
        Authenticated {
            token: "session".to_owned(),
            user: User {
                id: "usr_0000000000000001".to_owned(),
                email: "ada@travel.test".to_owned(),
                name: "Ada".to_owned(),
                password_hash: String::new(),
                created_at: Timestamp::UNIX_EPOCH,
                billing: None,
            },
            issued_at: Timestamp::UNIX_EPOCH,
        }
    }

    fn issuer() -> ForwardTokenIssuer {
        ForwardTokenIssuer::new(SecretString::from("sk_platform"), SecretString::from("ps_meter"))
    }

    fn gateway(base_url: &str) -> ProxyGateway {
        let registry = RegistryClient::new(
            Url::parse(base_url).unwrap(),
            SecretString::from("sk_platform"),
            Duration::from_secs(2),
        )
        .unwrap();
        ProxyGateway::new(registry, issuer())
    }

    async fn sse_upstream() -> Response {
        let chunks = futures_util::stream::iter(SSE_CHUNKS).then(|chunk| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, Infallible>(Bytes::from_static(chunk.as_bytes()))
        });

        ([(CONTENT_TYPE, "text/event-stream")], Body::from_stream(chunks)).into_response()
    }

    #[tokio::test]
    async fn event_stream_chunks_are_relayed_in_order() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/forward", post(sse_upstream));
        tokio::spawn(async move { axum::serve(listener, app).await });

        let gateway = gateway(&format!("http://{addr}/"));
        let relayed = gateway
            .forward(
                &caller(),
                Some("cs_abc"),
                Some("https://llm.test/v1/chat"),
                Bytes::from_static(b"{\"stream\":true}"),
            )
            .await
            .unwrap();

        assert!(matches!(relayed, ForwardResponse::Stream { .. }));

        let response = relayed.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/event-stream");
        assert_eq!(response.headers()[CACHE_CONTROL], "no-cache");

        let mut body = response.into_body();
        let mut frames = Vec::new();
        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame.unwrap().into_data() {
                frames.push(data);
            }
        }

        let expected: Vec<Bytes> = SSE_CHUNKS.iter().map(|chunk| Bytes::from_static(chunk.as_bytes())).collect();
        assert_eq!(frames, expected);
    }

    #[tokio::test]
    async fn json_is_relayed_with_upstream_status() {
        let server = MockServer::start().await;
        let token = issuer().issue(&ConnectionSecret::parse("cs_abc").unwrap());

        Mock::given(method("POST"))
            .and(path("/forward"))
            .and(query_param("u", "https://llm.test/v1/chat"))
            .and(header("authorization", format!("Bearer {}", token.expose()).as_str()))
            .and(body_string("{\"model\":\"m\"}"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({"error": "slow down"})))
            .expect(1)
            .mount(&server)
            .await;

        let relayed = gateway(&format!("{}/", server.uri()))
            .forward(
                &caller(),
                Some(" cs_abc "),
                Some("https://llm.test/v1/chat"),
                Bytes::from_static(b"{\"model\":\"m\"}"),
            )
            .await
            .unwrap();

        assert_eq!(relayed.status(), StatusCode::TOO_MANY_REQUESTS);
        let ForwardResponse::Json { body, .. } = relayed else {
            panic!("expected a JSON relay");
        };
        assert_eq!(body["error"], "slow down");
    }

    #[tokio::test]
    async fn other_content_is_relayed_as_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/forward"))
            .respond_with(ResponseTemplate::new(502).set_body_raw("bad gateway", "text/plain"))
            .mount(&server)
            .await;

        let response = gateway(&format!("{}/", server.uri()))
            .forward(&caller(), Some("cs_abc"), Some("https://llm.test"), Bytes::new())
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"bad gateway");
    }

    #[tokio::test]
    async fn target_is_checked_before_secret() {
        let gateway = gateway("http://127.0.0.1:9/");

        let err = gateway.forward(&caller(), None, None, Bytes::new()).await.unwrap_err();
        assert!(matches!(err, ForwardError::MissingTarget));

        let err = gateway
            .forward(&caller(), Some("undefined"), Some("https://llm.test"), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::MissingSecretHeader));
    }

    #[tokio::test]
    async fn network_failure_is_a_proxy_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = gateway(&format!("http://{addr}/"))
            .forward(&caller(), Some("cs_abc"), Some("https://llm.test"), Bytes::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::Proxy(_)));
    }
}
