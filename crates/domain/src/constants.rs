//! Wire-level constants
//!
//! Centralized location for endpoints, header names and reply field names
//! shared by the envelope builder, header manager and pagination engine.

// Endpoints
pub const SANDBOX_TRADING_URL: &str = "https://api.sandbox.ebay.com/ws/api.dll";
pub const PRODUCTION_TRADING_URL: &str = "https://api.ebay.com/ws/api.dll";
pub const SHOPPING_URL: &str = "http://open.api.ebay.com/shopping";
pub const SANDBOX_IDENTITY_URL: &str = "https://api.sandbox.ebay.com/";
pub const PRODUCTION_IDENTITY_URL: &str = "https://api.ebay.com/";
pub const TOKEN_PATH: &str = "identity/v1/oauth2/token";

// Envelope
pub const XMLNS: &str = "urn:ebay:apis:eBLBaseComponents";
pub const REQUEST_SUFFIX: &str = "Request";
/// Reserved options key holding a mapping of element attributes
pub const ATTRIBUTES_KEY: &str = "@";
/// Reserved options key holding element text next to attributes
pub const TEXT_KEY: &str = "#";
/// Key used by the decoder for the text of an element that also has attributes
pub const DECODED_TEXT_KEY: &str = "$t";

// Headers
pub const COMPATIBILITY_LEVEL: &str = "1061";
pub const SITE_ID: &str = "0";
pub const SHOPPING_API_VERSION: &str = "1089";
pub const TRADING_CONTENT_TYPE: &str = "text/xml";
pub const SHOPPING_CONTENT_TYPE: &str = "application/xml";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_COMPATIBILITY_LEVEL: &str = "X-EBAY-API-COMPATIBILITY-LEVEL";
pub const HEADER_SITE_ID: &str = "X-EBAY-API-SITEID";
pub const HEADER_CALL_NAME: &str = "X-EBAY-API-CALL-NAME";
pub const HEADER_APP_NAME: &str = "X-EBAY-API-APP-NAME";
pub const HEADER_DEV_NAME: &str = "X-EBAY-API-DEV-NAME";
pub const HEADER_CERT_NAME: &str = "X-EBAY-API-CERT-NAME";
pub const HEADER_IAF_TOKEN: &str = "X-EBAY-API-IAF-TOKEN";
pub const HEADER_SHOPPING_APP_ID: &str = "X-EBAY-API-APP-ID";
pub const HEADER_SHOPPING_SITE_ID: &str = "X-EBAY-API-SITE-ID";
pub const HEADER_SHOPPING_VERSION: &str = "X-EBAY-API-VERSION";
pub const HEADER_REQUEST_ENCODING: &str = "X-EBAY-API-REQUEST-ENCODING";

// Request fields
pub const REQUESTER_CREDENTIALS: &str = "RequesterCredentials";
pub const AUTH_TOKEN_FIELD: &str = "eBayAuthToken";
pub const PAGINATION_FIELD: &str = "Pagination";

// Reply fields
pub const ACK_FIELD: &str = "Ack";
pub const ERRORS_FIELD: &str = "Errors";
pub const PAGE_NUMBER_FIELD: &str = "PageNumber";
pub const PAGINATION_RESULT_FIELD: &str = "PaginationResult";
pub const TOTAL_PAGES_FIELD: &str = "TotalNumberOfPages";
pub const ACTIVE_LIST_FIELD: &str = "ActiveList";

/// Error code whose parameter (the existing listing id) is appended to the
/// failure message.
pub const DUPLICATE_LISTING_ERROR_CODE: &str = "21919067";

// Catalog defaults
pub const DEFAULT_LOOKBACK_DAYS: i64 = 120;
pub const DEFAULT_ENTRIES_PER_PAGE: u32 = 100;
pub const NOTIFICATION_PAYLOAD_VERSION: u32 = 1061;

/// Pages fetched concurrently per batch in streaming mode
pub const STREAMING_BATCH_SIZE: usize = 2;
