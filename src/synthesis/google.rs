use async_trait::async_trait;
use anyhow::{Context, Result};
use bytes::BytesMut;
use log::{debug, warn};
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;
use tokio::net::TcpStream;
use url::Url;

use super::TtsClient;
use crate::app_config::{ProxyConfig, ProxyMode, SynthesisConfig};
use crate::errors::TtsError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Google Translate TTS client
#[derive(Debug)]
pub struct GoogleTts {
    /// HTTP client, built once with timeout and proxy
    client: Client,
    /// Base endpoint, e.g. `https://translate.google.com`
    endpoint: Url,
    /// Host and port used by the reachability probe
    probe_target: Option<(String, u16)>,
    /// Bound on the probe connect
    timeout: Duration,
    /// Longest chunk sent in one request
    max_chars: usize,
}

impl GoogleTts {
    /// Create a client from the synthesis and proxy settings
    pub fn new(config: &SynthesisConfig, proxy: &ProxyConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid TTS endpoint: {}", config.endpoint))?;
        let timeout = Duration::from_secs(config.timeout_secs);

        let mut builder = Client::builder().timeout(timeout).user_agent(USER_AGENT);
        builder = match proxy.mode {
            ProxyMode::Auto => builder,
            ProxyMode::Off => builder.no_proxy(),
            ProxyMode::Manual => {
                let url = proxy.proxy_url().context("Manual proxy mode needs host and port")?;
                debug!("Using proxy {}", url);
                builder.proxy(Proxy::all(&url).with_context(|| format!("Invalid proxy URL: {}", url))?)
            }
        };
        let client = builder.build().context("Failed to build HTTP client")?;

        // behind a manual proxy only the proxy itself must be reachable
        let probe_target = match proxy.mode {
            ProxyMode::Manual => Some((proxy.host.trim().to_string(), proxy.port)),
            ProxyMode::Auto | ProxyMode::Off => config.endpoint_host().map(|host| (host, config.probe_port)),
        };

        Ok(Self {
            client,
            probe_target,
            endpoint,
            timeout,
            max_chars: config.max_chars_per_request.max(1),
        })
    }

    /// Host and port the reachability probe connects to
    pub fn probe_target(&self) -> Option<(&str, u16)> {
        self.probe_target.as_ref().map(|(host, port)| (host.as_str(), *port))
    }

    /// Request URL for one chunk
    pub fn chunk_url(&self, chunk: &str, lang: &str, index: usize, total: usize) -> Result<Url, TtsError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| TtsError::Generation(format!("Endpoint cannot be a base URL: {}", self.endpoint)))?
            .pop_if_empty()
            .push("translate_tts");
        url.query_pairs_mut()
            .append_pair("ie", "UTF-8")
            .append_pair("client", "tw-ob")
            .append_pair("tl", lang)
            .append_pair("q", chunk)
            .append_pair("total", &total.to_string())
            .append_pair("idx", &index.to_string())
            .append_pair("textlen", &chunk.chars().count().to_string());
        Ok(url)
    }

    async fn fetch_chunk(&self, url: Url) -> Result<bytes::Bytes, TtsError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TtsError::Network(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("TTS service returned {}", status);
            return Err(if is_transient(status) {
                TtsError::Network(message)
            } else {
                TtsError::Generation(message)
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| TtsError::Network(format!("Failed to read audio: {}", e)))
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl TtsClient for GoogleTts {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, TtsError> {
        let chunks = split_text(text, self.max_chars);
        if chunks.is_empty() {
            return Err(TtsError::Generation("Nothing to synthesize".to_string()));
        }

        let mut audio = BytesMut::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let url = self.chunk_url(chunk, lang, index, chunks.len())?;
            debug!("Fetching chunk {}/{} ({} chars)", index + 1, chunks.len(), chunk.chars().count());
            let bytes = self.fetch_chunk(url).await?;
            if bytes.is_empty() {
                return Err(TtsError::Generation(format!(
                    "Empty audio for chunk {}/{}",
                    index + 1,
                    chunks.len()
                )));
            }
            audio.extend_from_slice(&bytes);
        }

        Ok(audio.to_vec())
    }

    async fn probe(&self) -> Result<(), TtsError> {
        let Some((host, port)) = &self.probe_target else {
            return Err(TtsError::Network(format!("Endpoint has no host: {}", self.endpoint)));
        };

        match tokio::time::timeout(self.timeout, TcpStream::connect((host.as_str(), *port))).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => {
                warn!("{}:{} is unreachable: {}", host, port, e);
                Err(TtsError::Network(format!("Cannot reach {}:{}: {}", host, port, e)))
            }
            Err(_) => Err(TtsError::Network(format!(
                "Timed out after {:?} connecting to {}:{}",
                self.timeout, host, port
            ))),
        }
    }

    fn name(&self) -> &str {
        "google"
    }
}

/// Split text into chunks of at most `max_chars` characters on whitespace
///
/// A word longer than `max_chars` is cut by characters.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
