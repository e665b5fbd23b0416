//! HEAD probes over HTTP.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use sitediag_core::{CollectionError, CollectionResult, ProbeResponse};
use tracing::debug;

const USER_AGENT: &str = concat!("sitediag/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;

/// Issues HEAD requests with a shared `reqwest` client.
///
/// Redirects are followed like `fetch` does; status and headers describe the
/// final response.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// `timeout` caps each request at the transport level as well.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub async fn head(&self, url: &str) -> CollectionResult<ProbeResponse> {
        let started = Instant::now();
        let response = self.client.head(url).send().await.map_err(|e| map_error(url, e))?;
        let elapsed = started.elapsed();

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        debug!(
            url = %url,
            final_url = %response.url(),
            status = response.status().as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "HEAD probe answered"
        );

        Ok(ProbeResponse {
            status: response.status().as_u16(),
            headers,
            elapsed,
        })
    }
}

fn map_error(url: &str, err: reqwest::Error) -> CollectionError {
    if err.is_timeout() {
        CollectionError::timeout(format!("HEAD {url} timed out: {err}"))
    } else if err.is_builder() {
        CollectionError::parse(format!("invalid probe URL {url}: {err}"))
    } else {
        CollectionError::network(format!("HEAD {url} failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitediag_core::CollectionCause;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local HTTP/1.1 server answering from `route(path)` until the test ends.
    async fn serve(route: fn(&str) -> String) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = stream.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);
                    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                    let _ = stream.write_all(route(&path).as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        addr
    }

    fn redirecting_site(path: &str) -> String {
        match path {
            "/robots.txt" => "HTTP/1.1 301 Moved Permanently\r\nLocation: /static/robots.txt\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
            "/static/robots.txt" => "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 42\r\nX-Served-By: static\r\nConnection: close\r\n\r\n".to_string(),
            _ => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
        }
    }

    #[tokio::test]
    async fn test_redirects_are_followed() {
        let addr = serve(redirecting_site).await;
        let prober = HttpProber::new(Duration::from_secs(5)).unwrap();

        let resp = prober.head(&format!("http://{addr}/robots.txt")).await.unwrap();
        assert_eq!(resp.status, 200);
        assert!(resp.is_success());
        assert_eq!(resp.header("x-served-by"), Some("static"));
        assert_eq!(resp.content_length(), Some(42));
    }

    #[tokio::test]
    async fn test_missing_file_keeps_status() {
        let addr = serve(redirecting_site).await;
        let prober = HttpProber::new(Duration::from_secs(5)).unwrap();

        let resp = prober.head(&format!("http://{addr}/sitemap.xml")).await.unwrap();
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("sitediag/"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_parse_error() {
        let prober = HttpProber::new(Duration::from_secs(1)).unwrap();
        let err = prober.head("not a url").await.unwrap_err();
        assert_eq!(err.cause, CollectionCause::Parse);
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober = HttpProber::new(Duration::from_secs(2)).unwrap();
        let err = prober
            .head(&format!("http://{addr}/"))
            .await
            .unwrap_err();
        assert_eq!(err.cause, CollectionCause::Network);
    }
}
