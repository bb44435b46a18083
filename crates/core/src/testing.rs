//! Hand-written fakes for the provider traits, plus a one-shot HTTP server for the real clients.

use crate::domain::financials::FinancialSnapshot;
use crate::domain::news::NewsArticle;
use crate::domain::notification::NotificationMessage;
use crate::domain::symbol::Symbol;
use crate::error::{ProviderUnavailable, Stage};
use crate::ingest::financials::FinancialsProvider;
use crate::ingest::news::NewsProvider;
use crate::llm::error::InferenceUnavailable;
use crate::llm::{CompletionRequest, LlmClient, Provider};
use crate::notify::DeliveryChannel;
use crate::time::window::NewsWindow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub struct FakeNews {
    pub articles: Vec<NewsArticle>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeNews {
    pub fn with_titles(titles: &[&str]) -> Self {
        Self {
            articles: titles.iter().map(|t| NewsArticle::titled(*t)).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            articles: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl NewsProvider for FakeNews {
    fn provider_name(&self) -> &'static str {
        "fake_news"
    }

    async fn fetch_news(
        &self,
        _topic: &str,
        _window: NewsWindow,
    ) -> anyhow::Result<Vec<NewsArticle>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            let err = ProviderUnavailable::new(Stage::News, "fake_news", "connection refused");
            return Err(err.into());
        }
        Ok(self.articles.clone())
    }
}

pub struct FakeFinancials {
    pub snapshot: Option<FinancialSnapshot>,
    pub calls: AtomicUsize,
}

impl FakeFinancials {
    pub fn with(snapshot: serde_json::Value) -> Self {
        Self {
            snapshot: Some(serde_json::from_value(snapshot).unwrap()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            snapshot: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl FinancialsProvider for FakeFinancials {
    fn provider_name(&self) -> &'static str {
        "fake_financials"
    }

    async fn fetch_financials(&self, _symbol: &Symbol) -> anyhow::Result<FinancialSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot.clone().ok_or_else(|| {
            ProviderUnavailable::new(Stage::Financials, "fake_financials", "HTTP 503").into()
        })
    }
}

pub struct FakeLlm {
    pub response: Option<String>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeLlm {
    pub fn replying(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.requests.lock().unwrap().last().map(|r| r.prompt.clone())
    }
}

#[async_trait::async_trait]
impl LlmClient for FakeLlm {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String> {
        self.requests.lock().unwrap().push(req);
        self.response
            .clone()
            .ok_or_else(|| InferenceUnavailable::new(Provider::OpenAI, "http", "status=500").into())
    }
}

pub struct FakeDelivery {
    pub fail: bool,
    pub sent: Mutex<Vec<NotificationMessage>>,
}

impl Default for FakeDelivery {
    fn default() -> Self {
        Self {
            fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }
}

impl FakeDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for FakeDelivery {
    fn channel_name(&self) -> &'static str {
        "fake_delivery"
    }

    async fn deliver(&self, message: &NotificationMessage) -> anyhow::Result<String> {
        if self.fail {
            let err = ProviderUnavailable::new(Stage::Delivery, "fake_delivery", "HTTP 401");
            return Err(err.into());
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(format!("SM{:04}", sent.len()))
    }
}

/// Accepts a single connection on an ephemeral local port, answers it with `status` and a JSON
/// `body`, and returns the base url to point a client at.
pub async fn serve_once(status: &str, body: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status}\r\n\
         content-type: application/json\r\n\
         content-length: {}\r\n\
         connection: close\r\n\r\n{body}",
        body.len()
    );

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}")
}

// Reads through the headers and any content-length body.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + body_len {
            return;
        }
    }
}
