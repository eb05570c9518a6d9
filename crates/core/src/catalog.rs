//! Operation catalog
//!
//! A static table, per supported operation, of default options, reply
//! array fields, optional custom pagination handling, and the endpoint the
//! operation is sent to. The client consults it through a single generic
//! dispatch path.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value};
use tradelink_domain::constants::{
    ACTIVE_LIST_FIELD, DEFAULT_ENTRIES_PER_PAGE, DEFAULT_LOOKBACK_DAYS,
    NOTIFICATION_PAYLOAD_VERSION, PAGE_NUMBER_FIELD, PAGINATION_FIELD, PAGINATION_RESULT_FIELD,
    TOTAL_PAGES_FIELD,
};
use tradelink_domain::{ApiError, Result};

use crate::pagination::{
    default_page_info, inject_page_number, PageExtractor, PageInfo, PageInjector,
};
use crate::tree::{lookup, object, parse_number, set_path, OptionsTree};

/// Supported remote operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    GetSellerList,
    GetOrders,
    GetUser,
    CompleteSale,
    SetNotificationPreferences,
    AddFixedPriceItem,
    GetUserPreferences,
    GetMyeBaySelling,
    SetUserPreferences,
    ReviseInventoryStatus,
    ReviseFixedPriceItem,
    UploadSiteHostedPictures,
    VerifyAddFixedPriceItem,
    GetItem,
    AddMemberMessageRTQ,
    GetNotificationsUsage,
    GetMultipleItems,
}

impl Operation {
    pub const ALL: [Self; 17] = [
        Self::GetSellerList,
        Self::GetOrders,
        Self::GetUser,
        Self::CompleteSale,
        Self::SetNotificationPreferences,
        Self::AddFixedPriceItem,
        Self::GetUserPreferences,
        Self::GetMyeBaySelling,
        Self::SetUserPreferences,
        Self::ReviseInventoryStatus,
        Self::ReviseFixedPriceItem,
        Self::UploadSiteHostedPictures,
        Self::VerifyAddFixedPriceItem,
        Self::GetItem,
        Self::AddMemberMessageRTQ,
        Self::GetNotificationsUsage,
        Self::GetMultipleItems,
    ];

    /// Wire name, as sent in the call-name header and request root
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetSellerList => "GetSellerList",
            Self::GetOrders => "GetOrders",
            Self::GetUser => "GetUser",
            Self::CompleteSale => "CompleteSale",
            Self::SetNotificationPreferences => "SetNotificationPreferences",
            Self::AddFixedPriceItem => "AddFixedPriceItem",
            Self::GetUserPreferences => "GetUserPreferences",
            Self::GetMyeBaySelling => "GetMyeBaySelling",
            Self::SetUserPreferences => "SetUserPreferences",
            Self::ReviseInventoryStatus => "ReviseInventoryStatus",
            Self::ReviseFixedPriceItem => "ReviseFixedPriceItem",
            Self::UploadSiteHostedPictures => "UploadSiteHostedPictures",
            Self::VerifyAddFixedPriceItem => "VerifyAddFixedPriceItem",
            Self::GetItem => "GetItem",
            Self::AddMemberMessageRTQ => "AddMemberMessageRTQ",
            Self::GetNotificationsUsage => "GetNotificationsUsage",
            Self::GetMultipleItems => "GetMultipleItems",
        }
    }

    /// Look up an operation by its wire name.
    ///
    /// # Errors
    /// Returns `ApiError::UnknownOperation` for names outside the catalog.
    pub fn parse(name: &str) -> Result<Self> {
        name.parse()
    }

    pub fn descriptor(self) -> OperationDescriptor {
        match self {
            Self::GetSellerList => OperationDescriptor {
                defaults: seller_list_defaults,
                array_fields: &["Item", "Variation", "NameValueList", "Value", "PictureDetails"],
                ..OperationDescriptor::basic(self)
            },
            Self::GetOrders => OperationDescriptor {
                defaults: orders_defaults,
                array_fields: &["Transaction", "Value", "PictureDetails", "Order", "NameValueList"],
                ..OperationDescriptor::basic(self)
            },
            Self::GetUser => OperationDescriptor {
                defaults: |_| object(json!({ "DetailLevel": "ReturnAll" })),
                ..OperationDescriptor::basic(self)
            },
            Self::SetNotificationPreferences => OperationDescriptor {
                defaults: |_| {
                    object(json!({
                        "ApplicationDeliveryPreferences": {
                            "PayloadVersion": NOTIFICATION_PAYLOAD_VERSION
                        },
                        "Version": NOTIFICATION_PAYLOAD_VERSION,
                        "WarningLevel": "High"
                    }))
                },
                ..OperationDescriptor::basic(self)
            },
            Self::GetUserPreferences => OperationDescriptor {
                defaults: |_| {
                    object(json!({
                        "ShowSellerPaymentPreferences": true,
                        "ErrorLanguage": "en_US",
                        "WarningLevel": "High"
                    }))
                },
                ..OperationDescriptor::basic(self)
            },
            Self::GetMyeBaySelling => OperationDescriptor {
                defaults: |_| {
                    object(json!({
                        "SellingSummary": { "Include": true },
                        "ErrorLanguage": "en_US",
                        "WarningLevel": "High"
                    }))
                },
                array_fields: &["Item", "Variation", "NameValueList", "Value"],
                page_extractor: Some(selling_page_info),
                page_injector: Some(inject_selling_page),
                ..OperationDescriptor::basic(self)
            },
            Self::SetUserPreferences => OperationDescriptor {
                defaults: |_| {
                    object(json!({
                        "OutOfStockControlPreference": true,
                        "ErrorLanguage": "en_US",
                        "WarningLevel": "High"
                    }))
                },
                ..OperationDescriptor::basic(self)
            },
            Self::GetItem => OperationDescriptor {
                defaults: |_| {
                    object(json!({
                        "ErrorLanguage": "en_US",
                        "WarningLevel": "High",
                        "DetailLevel": "ItemReturnDescription"
                    }))
                },
                array_fields: &["Variation", "NameValueList", "Value"],
                ..OperationDescriptor::basic(self)
            },
            Self::GetMultipleItems => OperationDescriptor {
                defaults: |_| object(json!({ "IncludeSelector": "Variations, Details" })),
                array_fields: &["Item", "Variation", "NameValueList"],
                endpoint: Endpoint::Shopping,
                ..OperationDescriptor::basic(self)
            },
            Self::CompleteSale
            | Self::AddFixedPriceItem
            | Self::ReviseInventoryStatus
            | Self::ReviseFixedPriceItem
            | Self::UploadSiteHostedPictures
            | Self::VerifyAddFixedPriceItem
            | Self::AddMemberMessageRTQ
            | Self::GetNotificationsUsage => OperationDescriptor::basic(self),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|operation| operation.name() == s)
            .ok_or_else(|| ApiError::UnknownOperation(s.to_string()))
    }
}

/// Remote API an operation is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Environment-determined Trading endpoint, session headers
    Trading,
    /// Fixed Shopping endpoint with its own header set
    Shopping,
}

/// Static description of one operation
#[derive(Clone, Copy)]
pub struct OperationDescriptor {
    pub operation: Operation,
    defaults: fn(DateTime<Utc>) -> OptionsTree,
    pub array_fields: &'static [&'static str],
    pub page_extractor: Option<PageExtractor>,
    pub page_injector: Option<PageInjector>,
    pub endpoint: Endpoint,
}

impl fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("operation", &self.operation)
            .field("array_fields", &self.array_fields)
            .field("custom_pagination", &self.page_extractor.is_some())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl OperationDescriptor {
    const fn basic(operation: Operation) -> Self {
        Self {
            operation,
            defaults: base_defaults,
            array_fields: &[],
            page_extractor: None,
            page_injector: None,
            endpoint: Endpoint::Trading,
        }
    }

    /// Fresh default options, with time windows anchored at `now`
    pub fn default_options(&self, now: DateTime<Utc>) -> OptionsTree {
        (self.defaults)(now)
    }

    /// Catalog array fields plus any per-call additions
    pub fn array_fields_with<'a>(&self, extra: impl IntoIterator<Item = &'a String>) -> BTreeSet<String> {
        self.array_fields
            .iter()
            .map(|name| (*name).to_string())
            .chain(extra.into_iter().cloned())
            .collect()
    }

    /// False for operations that authenticate without requester credentials
    pub fn injects_credentials(&self) -> bool {
        self.endpoint == Endpoint::Trading
    }

    pub fn page_info(&self, reply: &Value) -> PageInfo {
        self.page_extractor.unwrap_or(default_page_info)(reply)
    }

    pub fn inject_page(&self, options: &mut OptionsTree, page: u32) {
        self.page_injector.unwrap_or(inject_page_number)(options, page);
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn base_defaults(_now: DateTime<Utc>) -> OptionsTree {
    object(json!({ "ErrorLanguage": "en_US", "WarningLevel": "High" }))
}

fn seller_list_defaults(now: DateTime<Utc>) -> OptionsTree {
    object(json!({
        "StartTimeFrom": timestamp(now - Duration::days(DEFAULT_LOOKBACK_DAYS)),
        "StartTimeTo": timestamp(now),
        "IncludeWatchCount": true,
        "Pagination": { "EntriesPerPage": DEFAULT_ENTRIES_PER_PAGE, "PageNumber": 1 },
        "WarningLevel": "High",
        "ErrorLanguage": "en_US",
        "DetailLevel": "ItemReturnDescription",
        "IncludeVariations": true
    }))
}

fn orders_defaults(now: DateTime<Utc>) -> OptionsTree {
    object(json!({
        "CreateTimeFrom": timestamp(now - Duration::days(DEFAULT_LOOKBACK_DAYS)),
        "CreateTimeTo": timestamp(now),
        "WarningLevel": "High",
        "OrderRole": "Seller",
        "OrderStatus": "Completed",
        "Pagination": { "EntriesPerPage": DEFAULT_ENTRIES_PER_PAGE, "PageNumber": 1 }
    }))
}

/// Selling summaries report the page count in the top-level `PageNumber`
/// when present, otherwise under `ActiveList.PaginationResult`.
fn selling_page_info(reply: &Value) -> PageInfo {
    let total_pages = parse_number(lookup(reply, &[PAGE_NUMBER_FIELD]))
        .or_else(|| {
            parse_number(lookup(reply, &[ACTIVE_LIST_FIELD, PAGINATION_RESULT_FIELD, TOTAL_PAGES_FIELD]))
        })
        .unwrap_or(0.0);
    let page_number =
        parse_number(lookup(reply, &[ACTIVE_LIST_FIELD, PAGINATION_RESULT_FIELD, PAGE_NUMBER_FIELD]))
            .unwrap_or(1.0);
    PageInfo { page_number, total_pages }
}

fn inject_selling_page(options: &mut OptionsTree, page: u32) {
    if options.contains_key(ACTIVE_LIST_FIELD) {
        set_path(options, &[ACTIVE_LIST_FIELD, PAGINATION_FIELD, PAGE_NUMBER_FIELD], json!(page));
    } else {
        inject_page_number(options, page);
    }
}
