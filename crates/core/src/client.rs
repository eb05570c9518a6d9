//! Trading client - generic dispatch over the operation catalog
//!
//! Every operation goes through [`TradingClient::call`] (merged result) or
//! [`TradingClient::call_each`] (per-page callback). Both fetch page 1,
//! read its pagination position and then fetch the remaining pages: one at
//! a time for merged calls, in concurrent pairs for streaming calls.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};
use tradelink_domain::constants::STREAMING_BATCH_SIZE;
use tradelink_domain::{AckStatus, ApiError, ClientConfig, Headers, Result};
use uuid::Uuid;

use crate::catalog::{Endpoint, Operation, OperationDescriptor};
use crate::classifier::classify;
use crate::envelope::{build_envelope, describe};
use crate::pagination::{merge_pages, PagePlan};
use crate::ports::{OutboundRequest, Transport, XmlCodec};
use crate::session::Session;
use crate::tree::{merge_options, OptionsTree};

/// One request/response pair, reported to the exchange observer before the
/// response is parsed
#[derive(Debug, Clone, Copy)]
pub struct Exchange<'a> {
    pub operation: Operation,
    pub page: u32,
    pub request_xml: &'a str,
    pub response_xml: &'a str,
}

/// Hook receiving every exchange of a client
pub type ExchangeObserver = Arc<dyn Fn(&Exchange<'_>) + Send + Sync>;

/// Per-call parse and header options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Array fields added to the catalog's list for this call
    pub array_fields: Vec<String>,
    /// Headers overriding computed headers of the same name
    pub extra_headers: Headers,
}

impl CallOptions {
    pub fn with_array_field(mut self, name: impl Into<String>) -> Self {
        self.array_fields.push(name.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }
}

/// A call whose options are merged and whose parse rules are fixed
struct PreparedCall {
    descriptor: OperationDescriptor,
    options: OptionsTree,
    array_fields: std::collections::BTreeSet<String>,
    extra_headers: Headers,
}

/// Client for the XML Trading API
pub struct TradingClient {
    session: RwLock<Session>,
    transport: Arc<dyn Transport>,
    codec: Arc<dyn XmlCodec>,
    observer: Option<ExchangeObserver>,
}

impl std::fmt::Debug for TradingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradingClient")
            .field("session", &*self.session.read())
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl TradingClient {
    pub fn new(session: Session, transport: Arc<dyn Transport>, codec: Arc<dyn XmlCodec>) -> Self {
        Self { session: RwLock::new(session), transport, codec, observer: None }
    }

    /// Build a client from configuration.
    ///
    /// # Errors
    /// Any construction error kind, see [`Session::from_config`].
    pub fn from_config(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        codec: Arc<dyn XmlCodec>,
    ) -> Result<Self> {
        Ok(Self::new(Session::from_config(config)?, transport, codec))
    }

    /// Register a hook that sees the request and raw response of every page.
    pub fn with_observer(mut self, observer: impl Fn(&Exchange<'_>) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    /// Replace the auth token. Requests built after this returns use it.
    ///
    /// # Errors
    /// Returns `ApiError::NoAuthToken` if `token` is empty.
    pub fn rotate_token(&self, token: impl Into<String>) -> Result<()> {
        self.session.write().rotate_token(token)?;
        info!("Auth token rotated");
        Ok(())
    }

    /// Replace the auth token and its expiry.
    ///
    /// # Errors
    /// Returns `ApiError::NoAuthToken` if `token` is empty.
    pub fn rotate_token_until(&self, token: impl Into<String>, expires_at: DateTime<Utc>) -> Result<()> {
        self.session.write().rotate_token_until(token, expires_at)?;
        info!(%expires_at, "Auth token rotated");
        Ok(())
    }

    pub fn is_expired(&self) -> bool {
        self.session.read().is_expired_at(Utc::now())
    }

    /// Run `operation` and merge every page into one result.
    ///
    /// `options` must be a mapping or null; it is layered over the
    /// operation's defaults.
    ///
    /// # Errors
    /// - `ApiError::InvalidOptions` for non-mapping options
    /// - `ApiError::TokenExpired` before any request once the token expired
    /// - `ApiError::RemoteOperationFailed` when any page reports `Failure`
    /// - transport and decode failures of any page
    #[instrument(skip(self, operation, options, call), fields(operation = %operation, call_id = %Uuid::new_v4()))]
    pub async fn call(&self, operation: Operation, options: Value, call: CallOptions) -> Result<Value> {
        let prepared = self.prepare(operation, options, call)?;

        let first = self.fetch_page(&prepared, None).await?;
        let plan = prepared.descriptor.page_info(&first).plan();

        let PagePlan::Remaining(remaining) = plan else {
            info!(pages = 1, "Call complete");
            return Ok(first);
        };
        debug!(first = *remaining.start(), last = *remaining.end(), "Fetching remaining pages");

        let mut replies = vec![first];
        for page in remaining {
            replies.push(self.fetch_page(&prepared, Some(page)).await?);
        }

        info!(pages = replies.len(), "Call complete");
        Ok(merge_pages(replies))
    }

    /// Run `operation`, handing each page to `callback` instead of merging.
    ///
    /// Page 1 is delivered first. Remaining pages are fetched two at a time;
    /// the callback runs for each page as it resolves and batches run in
    /// order.
    ///
    /// # Errors
    /// Any error of [`TradingClient::call`], or the first error returned by
    /// `callback`.
    #[instrument(skip(self, operation, options, callback, call), fields(operation = %operation, call_id = %Uuid::new_v4()))]
    pub async fn call_each<F, Fut>(
        &self,
        operation: Operation,
        options: Value,
        callback: F,
        call: CallOptions,
    ) -> Result<()>
    where
        F: Fn(Value) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let prepared = self.prepare(operation, options, call)?;

        let first = self.fetch_page(&prepared, None).await?;
        let plan = prepared.descriptor.page_info(&first).plan();
        callback(first).await?;

        let callback = &callback;
        let prepared = &prepared;
        for batch in plan.batches(STREAMING_BATCH_SIZE) {
            debug!(?batch, "Fetching page batch");
            try_join_all(batch.into_iter().map(|page| async move {
                let reply = self.fetch_page(prepared, Some(page)).await?;
                callback(reply).await
            }))
            .await?;
        }

        info!(pages = plan.request_count(), "Streaming call complete");
        Ok(())
    }

    /// [`TradingClient::call`] addressed by wire name.
    ///
    /// # Errors
    /// Returns `ApiError::UnknownOperation` for names outside the catalog,
    /// otherwise as [`TradingClient::call`].
    pub async fn call_named(&self, name: &str, options: Value, call: CallOptions) -> Result<Value> {
        self.call(Operation::parse(name)?, options, call).await
    }

    fn prepare(&self, operation: Operation, options: Value, call: CallOptions) -> Result<PreparedCall> {
        let overrides = match options {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(ApiError::InvalidOptions(format!(
                    "the options for {operation} must be a mapping, got {}",
                    describe(&other)
                )))
            }
        };

        let descriptor = operation.descriptor();
        let mut merged = descriptor.default_options(Utc::now());
        merge_options(&mut merged, overrides);

        Ok(PreparedCall {
            array_fields: descriptor.array_fields_with(&call.array_fields),
            descriptor,
            options: merged,
            extra_headers: call.extra_headers,
        })
    }

    async fn fetch_page(&self, call: &PreparedCall, page: Option<u32>) -> Result<Value> {
        let operation = call.descriptor.operation;
        let mut options = call.options.clone();

        let (url, headers) = {
            let session = self.session.read();
            session.ensure_fresh(Utc::now())?;
            if call.descriptor.injects_credentials() {
                session.inject_credentials(&mut options);
            }
            match call.descriptor.endpoint {
                Endpoint::Trading => (
                    session.trading_url().to_string(),
                    session.trading_headers(operation.name(), &call.extra_headers),
                ),
                Endpoint::Shopping => (
                    session.shopping_url().to_string(),
                    session.shopping_headers(operation.name(), &call.extra_headers)?,
                ),
            }
        };

        if let Some(page) = page {
            call.descriptor.inject_page(&mut options, page);
        }

        let request_xml = build_envelope(self.codec.as_ref(), operation.name(), &Value::Object(options))?;
        let page_number = page.unwrap_or(1);
        debug!(page = page_number, url = %url, "Dispatching request");

        let response_xml = self
            .transport
            .send(OutboundRequest::post(url, headers, request_xml.clone()))
            .await?;

        if let Some(observer) = &self.observer {
            observer(&Exchange {
                operation,
                page: page_number,
                request_xml: &request_xml,
                response_xml: &response_xml,
            });
        }

        let reply = strip_root(self.codec.to_structured(&response_xml, &call.array_fields)?)?;

        match classify(operation.name(), &reply) {
            Ok(AckStatus::Warning) => {
                warn!(page = page_number, "Reply carries Warning status");
            }
            Ok(_) => {}
            Err(err) => {
                warn!(page = page_number, error = %err, "Remote operation failed");
                return Err(err);
            }
        }

        debug!(page = page_number, "Page received");
        Ok(reply)
    }
}

/// Unwrap `{ Root: content }` into `content`.
fn strip_root(document: Value) -> Result<Value> {
    match document {
        Value::Object(map) => map
            .into_iter()
            .next()
            .map(|(_, content)| content)
            .ok_or_else(|| ApiError::Decode("reply document has no root element".to_string())),
        other => Err(ApiError::Decode(format!("reply document is {}", describe(&other)))),
    }
}

macro_rules! operation_methods {
    ($($method:ident, $each:ident => $operation:ident;)+) => {
        impl TradingClient {
            $(
                #[doc = concat!("Run `", stringify!($operation), "`, merging every page.")]
                ///
                /// # Errors
                /// See [`TradingClient::call`].
                pub async fn $method(&self, options: Value, call: CallOptions) -> Result<Value> {
                    self.call(Operation::$operation, options, call).await
                }

                #[doc = concat!("Run `", stringify!($operation), "`, streaming each page to `callback`.")]
                ///
                /// # Errors
                /// See [`TradingClient::call_each`].
                pub async fn $each<F, Fut>(&self, options: Value, callback: F, call: CallOptions) -> Result<()>
                where
                    F: Fn(Value) -> Fut,
                    Fut: Future<Output = Result<()>>,
                {
                    self.call_each(Operation::$operation, options, callback, call).await
                }
            )+
        }
    };
}

operation_methods! {
    get_seller_list, get_seller_list_each => GetSellerList;
    get_orders, get_orders_each => GetOrders;
    get_user, get_user_each => GetUser;
    complete_sale, complete_sale_each => CompleteSale;
    set_notification_preferences, set_notification_preferences_each => SetNotificationPreferences;
    add_fixed_price_item, add_fixed_price_item_each => AddFixedPriceItem;
    get_user_preferences, get_user_preferences_each => GetUserPreferences;
    get_my_ebay_selling, get_my_ebay_selling_each => GetMyeBaySelling;
    set_user_preferences, set_user_preferences_each => SetUserPreferences;
    revise_inventory_status, revise_inventory_status_each => ReviseInventoryStatus;
    revise_fixed_price_item, revise_fixed_price_item_each => ReviseFixedPriceItem;
    upload_site_hosted_pictures, upload_site_hosted_pictures_each => UploadSiteHostedPictures;
    verify_add_fixed_price_item, verify_add_fixed_price_item_each => VerifyAddFixedPriceItem;
    get_item, get_item_each => GetItem;
    add_member_message_rtq, add_member_message_rtq_each => AddMemberMessageRTQ;
    get_notifications_usage, get_notifications_usage_each => GetNotificationsUsage;
    get_multiple_items, get_multiple_items_each => GetMultipleItems;
}
