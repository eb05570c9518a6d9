//! Shared helpers for infra integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tradelink_core::{OutboundRequest, Session, Transport, TradingClient};
use tradelink_domain::{ApiError, AppCredential, AuthScheme, Environment, Result};
use tradelink_infra::QuickXmlCodec;

/// Install a test subscriber once so `RUST_LOG` works for these tests.
pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// What happened on the wire or in a page callback, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Sent(usize),
    Delivered(usize),
}

/// Transport that records every request and answers by requested page.
///
/// The page is read from the `<PageNumber>` element of the request body;
/// requests without one are answered with the first page. With a latency
/// set, each send holds its slot for that long so overlapping sends show
/// up in [`PagedTransport::peak_in_flight`].
pub struct PagedTransport {
    pages: Vec<String>,
    latency: Option<Duration>,
    requests: Mutex<Vec<OutboundRequest>>,
    events: Mutex<Vec<Event>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl PagedTransport {
    pub fn new(pages: Vec<String>) -> Arc<Self> {
        Self::build(pages, None)
    }

    pub fn with_latency(pages: Vec<String>, latency: Duration) -> Arc<Self> {
        Self::build(pages, Some(latency))
    }

    fn build(pages: Vec<String>, latency: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            latency,
            requests: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Most sends that were outstanding at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Record that a page reached the caller's callback.
    pub fn delivered(&self, page: usize) {
        self.events.lock().push(Event::Delivered(page));
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl Transport for PagedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<String> {
        let page = requested_page(&request.body).unwrap_or(1);
        self.requests.lock().push(request);
        self.events.lock().push(Event::Sent(page));

        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(outstanding, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.pages
            .get(page - 1)
            .cloned()
            .ok_or_else(|| ApiError::Transport(format!("no canned reply for page {page}")))
    }
}

/// Page number found in a request body, if any.
pub fn requested_page(body: &str) -> Option<usize> {
    let start = body.find("<PageNumber>")? + "<PageNumber>".len();
    let end = body[start..].find("</PageNumber>")? + start;
    body[start..end].trim().parse().ok()
}

/// `GetOrders` reply page carrying `order_ids`.
pub fn orders_page(page: usize, total_pages: usize, order_ids: &[&str]) -> String {
    let orders: String = order_ids
        .iter()
        .map(|id| format!("<Order><OrderID>{id}</OrderID><OrderStatus>Completed</OrderStatus></Order>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<GetOrdersResponse xmlns="urn:ebay:apis:eBLBaseComponents">
  <Timestamp>2024-05-01T12:00:0{page}.000Z</Timestamp>
  <Ack>Success</Ack>
  <Version>1061</Version>
  <PaginationResult>
    <TotalNumberOfPages>{total_pages}</TotalNumberOfPages>
    <TotalNumberOfEntries>{entries}</TotalNumberOfEntries>
  </PaginationResult>
  <HasMoreOrders>{more}</HasMoreOrders>
  <OrderArray>{orders}</OrderArray>
  <OrdersPerPage>100</OrdersPerPage>
  <PageNumber>{page}</PageNumber>
  <ReturnedOrderCountActual>{count}</ReturnedOrderCountActual>
</GetOrdersResponse>"#,
        entries = order_ids.len(),
        more = page < total_pages,
        count = order_ids.len(),
    )
}

/// Reply with the given ack and error entries `(code, severity, short message)`.
pub fn reply_with_errors(root: &str, ack: &str, errors: &[(&str, &str, &str)]) -> String {
    let errors: String = errors
        .iter()
        .map(|(code, severity, message)| {
            format!(
                "<Errors><ShortMessage>{message}</ShortMessage><LongMessage>{message}</LongMessage>\
                 <ErrorCode>{code}</ErrorCode><SeverityCode>{severity}</SeverityCode>\
                 <ErrorClassification>RequestError</ErrorClassification></Errors>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<{root} xmlns="urn:ebay:apis:eBLBaseComponents"><Timestamp>2024-05-01T12:00:00.000Z</Timestamp><Ack>{ack}</Ack>{errors}<Version>1061</Version></{root}>"#
    )
}

pub fn bearer_session(token: &str) -> Session {
    Session::new(AuthScheme::OAuthBearer, Environment::Sandbox, token, None)
        .expect("bearer session")
}

pub fn signed_session(token: &str) -> Session {
    Session::new(
        AuthScheme::SignedAppCredential,
        Environment::Sandbox,
        token,
        Some(AppCredential::new("client", "dev", "cert")),
    )
    .expect("signed session")
}

pub fn client(session: Session, transport: Arc<PagedTransport>) -> TradingClient {
    init_tracing();
    TradingClient::new(session, transport, Arc::new(QuickXmlCodec::new()))
}
