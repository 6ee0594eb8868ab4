//! Same-origin relay of raw file content for previews.
//!
//! `GET /proxy?url=<encoded>` fetches the target and returns it with CORS
//! and no-cache headers. PDF documents are marked for inline display.

use std::{net::SocketAddr, sync::Arc};

use futures::Future;
use http::{
    header::{self, HeaderName, HeaderValue},
    Method, Request, Response, StatusCode, Uri,
};
use repodrive::{config::ProxyConfig, raw_url::PROXY_ROUTE};
use serde_json::json;
use tokio::{
    io::BufReader,
    net::{TcpListener, TcpStream},
};
use url::Url;

use crate::server;

/// Value of the `X-Proxy-Source` response header
pub const PROXY_SOURCE: &str = "repodrive";

const X_PROXY_SOURCE: &str = "x-proxy-source";

#[derive(Clone)]
pub struct Proxy {
    client: reqwest::Client,
    allowed_hosts: Arc<[String]>,
}

impl Proxy {
    pub fn new(client: reqwest::Client, config: &ProxyConfig) -> Self {
        Self {
            client,
            allowed_hosts: config.allowed_hosts.iter().map(|h| h.to_ascii_lowercase()).collect(),
        }
    }

    /// An empty allow list accepts any host.
    fn is_allowed(&self, url: &Url) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        self.allowed_hosts
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(host))
    }

    pub async fn handle(&self, req: Request<Vec<u8>>) -> Response<Vec<u8>> {
        if req.uri().path() != PROXY_ROUTE {
            return json_response(StatusCode::NOT_FOUND, json!({ "error": "Not found" }));
        }
        match *req.method() {
            Method::OPTIONS => preflight(),
            Method::GET => self.get(req.uri()).await,
            _ => json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed" }),
            ),
        }
    }

    async fn get(&self, uri: &Uri) -> Response<Vec<u8>> {
        let Some(target) = target_param(uri) else {
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({ "error": "URL parameter is required" }),
            );
        };
        let url = match Url::parse(&target) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => {
                return json_response(
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Invalid URL parameter" }),
                )
            }
        };
        if !self.is_allowed(&url) {
            log::warn!("Refusing to proxy {url}");
            return json_response(
                StatusCode::FORBIDDEN,
                json!({ "error": format!("Host not allowed: {}", url.host_str().unwrap_or_default()) }),
            );
        }

        log::info!("Proxying {url}");
        match self.forward(&url).await {
            Ok(resp) => resp,
            Err(err) => {
                log::error!("Proxying {url} failed: {err}");
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to proxy request", "message": err.to_string() }),
                )
            }
        }
    }

    async fn forward(&self, url: &Url) -> reqwest::Result<Response<Vec<u8>>> {
        let res = self
            .client
            .get(url.clone())
            .header(header::USER_AGENT, crate::USER_AGENT)
            .header(header::ACCEPT, "*/*")
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            log::warn!("Upstream {url} returned {status}");
            return Ok(json_response(
                status,
                json!({ "error": format!("Failed to fetch: {status}") }),
            ));
        }

        let content_type = res.headers().get(header::CONTENT_TYPE).cloned();
        let content_length = res.headers().get(header::CONTENT_LENGTH).cloned();
        let content_disposition = res.headers().get(header::CONTENT_DISPOSITION).cloned();
        let body = res.bytes().await?;

        let is_pdf = content_type
            .as_ref()
            .and_then(|ct| ct.to_str().ok())
            .map(|ct| ct.contains("application/pdf"))
            .unwrap_or(false)
            || url.path().to_ascii_lowercase().ends_with(".pdf");

        let mut resp = Response::new(body.to_vec());
        let headers = resp.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            content_type
                .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream")),
        );
        if let Some(len) = content_length {
            if len.to_str().ok().and_then(|l| l.parse::<usize>().ok()) == Some(body.len()) {
                headers.insert(header::CONTENT_LENGTH, len);
            }
        }
        if let Some(cd) = content_disposition {
            headers.insert(header::CONTENT_DISPOSITION, cd);
        }
        if is_pdf {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
            headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        }
        headers.insert(
            HeaderName::from_static(X_PROXY_SOURCE),
            HeaderValue::from_static(PROXY_SOURCE),
        );
        no_cache_headers(headers);
        cors_headers(headers);
        Ok(resp)
    }

    /// Reads a single request from `stream` and answers it.
    pub async fn serve_connection(&self, mut stream: TcpStream) -> anyhow::Result<()> {
        let (read, write) = stream.split();
        let req = server::parse_request(BufReader::new(read)).await?;
        log::trace!("{} {}", req.method(), req.uri());
        let mut resp = self.handle(req).await;
        resp.headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
        server::write_response(resp, write).await
    }
}

/// Accepts connections until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, proxy: Proxy, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    log::info!("Proxy listening on http://{}{PROXY_ROUTE}", listener.local_addr()?);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("Proxy shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer): (TcpStream, SocketAddr) = accepted?;
                let proxy = proxy.clone();
                tokio::spawn(async move {
                    if let Err(err) = proxy.serve_connection(stream).await {
                        log::warn!("Connection from {peer}: {err:#}");
                    }
                });
            }
        }
    }
}

fn target_param(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn preflight() -> Response<Vec<u8>> {
    let mut resp = Response::new(Vec::new());
    *resp.status_mut() = StatusCode::OK;
    let headers = resp.headers_mut();
    cors_headers(headers);
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    resp
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Vec<u8>> {
    let mut resp = Response::new(body.to_string().into_bytes());
    *resp.status_mut() = status;
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    cors_headers(headers);
    resp
}

fn cors_headers(headers: &mut http::HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

fn no_cache_headers(headers: &mut http::HeaderMap) {
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
}
