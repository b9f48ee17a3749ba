// REST backend: `/events` CRUD over JSON
use crate::error::{StoreError, StoreResult};
use crate::model::{Event, EventPatch};
use crate::store::EventStore;
use crate::store::wire::{backend_message, decode_event, decode_event_list};
use async_trait::async_trait;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{Method, Request, Uri};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use log::{debug, warn};
use std::fmt;
use std::time::Instant;
use url::Url;

type HttpsClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, String>;

#[derive(Clone)]
pub struct HttpEventStore {
    client: HttpsClient,
    base_url: Url,
}

impl fmt::Debug for HttpEventStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpEventStore")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl HttpEventStore {
    pub fn new(base_url: &str) -> StoreResult<Self> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| StoreError::transport(format!("invalid API url `{base_url}`: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(StoreError::transport(format!(
                "API url `{base_url}` cannot carry a path"
            )));
        }

        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        root_store.add_parsable_certificates(result.certs);
        if root_store.is_empty() {
            // Plain http still works; https requests will fail the handshake.
            warn!("event=tls_roots module=store status=empty backend=http");
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let client: HttpsClient = Client::builder(TokioExecutor::new()).build(https_connector);

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> StoreResult<Uri> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| StoreError::transport("API url cannot carry a path"))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        url.as_str()
            .parse::<Uri>()
            .map_err(|e| StoreError::transport(format!("invalid request uri `{url}`: {e}")))
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<String>,
    ) -> StoreResult<Vec<u8>> {
        let uri = self.endpoint(segments)?;
        let path = uri.path().to_string();
        let started_at = Instant::now();

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(uri)
            .header(ACCEPT, "application/json");
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(body.unwrap_or_default())
            .map_err(|e| StoreError::transport(e.to_string()))?;

        let response = self.client.request(request).await.map_err(|e| {
            warn!(
                "event=store_request module=store backend=http status=error method={method} path={path} error={e}"
            );
            StoreError::transport(format!("{method} {path} failed: {e}"))
        })?;

        let (parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(|e| StoreError::transport(format!("{method} {path}: reading body: {e}")))?
            .to_bytes();

        debug!(
            "event=store_request module=store backend=http method={method} path={path} http_status={} duration_ms={}",
            parts.status.as_u16(),
            started_at.elapsed().as_millis()
        );

        if !parts.status.is_success() {
            let message = backend_message(&bytes).unwrap_or_else(|| {
                format!("{method} {path} failed with status {}", parts.status)
            });
            return Err(StoreError::Transport(message));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl EventStore for HttpEventStore {
    async fn list(&self) -> StoreResult<Vec<Event>> {
        let body = self.send(Method::GET, &["events"], None).await?;
        decode_event_list(&body)
    }

    async fn create(&self, event: &Event) -> StoreResult<Event> {
        let payload = serde_json::to_string(event)?;
        let body = self.send(Method::POST, &["events"], Some(payload)).await?;
        decode_event(&body)
    }

    async fn update(&self, id: &str, patch: &EventPatch) -> StoreResult<Event> {
        let payload = serde_json::to_string(patch)?;
        let body = self
            .send(Method::POST, &["events", "update", id], Some(payload))
            .await?;
        decode_event(&body)
    }

    async fn delete(&self, id: &str) -> StoreResult<Event> {
        let body = self.send(Method::DELETE, &["events", id], None).await?;
        decode_event(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn endpoint_keeps_base_path_and_encodes_ids() {
        let store = HttpEventStore::new("http://localhost:3001/api/").unwrap();
        let uri = store
            .endpoint(&["events", "update", "1704067200000-Team sync/retro"])
            .unwrap();
        assert_eq!(
            uri.to_string(),
            "http://localhost:3001/api/events/update/1704067200000-Team%20sync%2Fretro"
        );
    }

    #[tokio::test]
    async fn bare_host_gets_root_path() {
        let store = HttpEventStore::new("http://localhost:3001").unwrap();
        assert_eq!(
            store.endpoint(&["events"]).unwrap().to_string(),
            "http://localhost:3001/events"
        );
    }

    #[test]
    fn rejects_non_urls() {
        assert!(matches!(
            HttpEventStore::new("not a url"),
            Err(StoreError::Transport(_))
        ));
    }
}
