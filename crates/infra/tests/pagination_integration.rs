//! End-to-end pagination through the real XML codec.

mod support;

use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use serde_json::json;
use support::{bearer_session, client, orders_page, reply_with_errors, signed_session, Event, PagedTransport};
use tradelink_core::CallOptions;
use tradelink_domain::ApiErrorKind;

fn three_pages() -> Vec<String> {
    vec![
        orders_page(1, 3, &["1-1", "1-2"]),
        orders_page(2, 3, &["2-1", "2-2", "2-3"]),
        orders_page(3, 3, &["3-1"]),
    ]
}

const LATENCY: std::time::Duration = std::time::Duration::from_millis(20);

fn numbered_pages(total: usize) -> Vec<String> {
    (1..=total).map(|page| orders_page(page, total, &[&page.to_string()])).collect()
}

fn position(events: &[Event], event: Event) -> usize {
    events
        .iter()
        .position(|seen| *seen == event)
        .unwrap_or_else(|| panic!("{event:?} never happened in {events:?}"))
}

fn order_ids(reply: &serde_json::Value) -> Vec<String> {
    reply["OrderArray"]["Order"]
        .as_array()
        .expect("orders are a sequence")
        .iter()
        .map(|order| order["OrderID"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn merges_every_page_in_order() {
    let transport = PagedTransport::new(three_pages());
    let client = client(bearer_session("token"), transport.clone());

    let merged = client.get_orders(json!({}), CallOptions::default()).await.unwrap();

    assert_eq!(order_ids(&merged), vec!["1-1", "1-2", "2-1", "2-2", "2-3", "3-1"]);
    assert!(merged.get("PageNumber").is_none());
    assert_eq!(merged["Ack"], "Success");
    assert_eq!(merged["HasMoreOrders"], "false");
    assert_eq!(transport.request_count(), 3);

    let pages: Vec<_> =
        transport.requests().iter().map(|request| support::requested_page(&request.body)).collect();
    assert_eq!(pages, vec![Some(1), Some(2), Some(3)]);
}

#[tokio::test]
async fn absent_forced_names_stay_empty_after_merge() {
    let transport = PagedTransport::new(three_pages());
    let client = client(bearer_session("token"), transport.clone());

    let merged = client.get_orders(json!({}), CallOptions::default()).await.unwrap();

    for name in ["Transaction", "Value", "PictureDetails", "NameValueList"] {
        assert_eq!(merged[name], json!([]), "{name}");
    }
    assert!(merged.get("Order").is_none());
    assert!(merged["OrderArray"]["Order"][0].get("Transaction").is_none());
}

#[tokio::test]
async fn single_page_is_returned_unchanged() {
    let transport = PagedTransport::new(vec![orders_page(1, 1, &["only"])]);
    let client = client(bearer_session("token"), transport.clone());

    let reply = client.get_orders(json!(null), CallOptions::default()).await.unwrap();

    assert_eq!(order_ids(&reply), vec!["only"]);
    assert_eq!(reply["PageNumber"], "1");
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn missing_pagination_fields_mean_one_request() {
    let transport = PagedTransport::new(vec![reply_with_errors("GetUserResponse", "Success", &[])]);
    let client = client(bearer_session("token"), transport.clone());

    let reply = client.get_user(json!({}), CallOptions::default()).await.unwrap();

    assert_eq!(reply["Ack"], "Success");
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn expired_token_sends_nothing() {
    let transport = PagedTransport::new(three_pages());
    let session = bearer_session("token").with_expiry(Utc::now() - Duration::minutes(1));
    let client = client(session, transport.clone());

    let err = client.get_orders(json!({}), CallOptions::default()).await.unwrap_err();

    assert_eq!(err.kind(), ApiErrorKind::TokenExpired);
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn warning_reply_is_returned() {
    let transport = PagedTransport::new(vec![reply_with_errors(
        "CompleteSaleResponse",
        "Warning",
        &[("21917091", "Warning", "Requested StartPrice is unchanged")],
    )]);
    let client = client(signed_session("token"), transport);

    let reply = client.complete_sale(json!({ "OrderID": "1" }), CallOptions::default()).await.unwrap();

    assert_eq!(reply["Ack"], "Warning");
    assert_eq!(reply["Errors"]["ErrorCode"], "21917091");
}

#[tokio::test]
async fn failure_joins_error_codes() {
    let transport = PagedTransport::new(vec![reply_with_errors(
        "GetItemResponse",
        "Failure",
        &[("1", "Error", "first"), ("2", "Error", "second"), ("3", "Warning", "third")],
    )]);
    let client = client(bearer_session("token"), transport);

    let err = client.get_item(json!({ "ItemID": "42" }), CallOptions::default()).await.unwrap_err();

    assert_eq!(err.kind(), ApiErrorKind::RemoteOperationFailed);
    assert_eq!(err.to_string(), "GetItem failed: first,second");
    assert_eq!(err.remote_errors().len(), 3);
}

#[tokio::test]
async fn failure_on_later_page_aborts_the_call() {
    let transport = PagedTransport::new(vec![
        orders_page(1, 3, &["1-1"]),
        reply_with_errors("GetOrdersResponse", "Failure", &[("10007", "Error", "Internal error")]),
        orders_page(3, 3, &["3-1"]),
    ]);
    let client = client(bearer_session("token"), transport.clone());

    let err = client.get_orders(json!({}), CallOptions::default()).await.unwrap_err();

    assert_eq!(err.kind(), ApiErrorKind::RemoteOperationFailed);
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn streaming_delivers_first_page_first() {
    let transport = PagedTransport::new(vec![
        orders_page(1, 4, &["1"]),
        orders_page(2, 4, &["2"]),
        orders_page(3, 4, &["3"]),
        orders_page(4, 4, &["4"]),
    ]);
    let client = client(bearer_session("token"), transport.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));

    client
        .get_orders_each(
            json!({}),
            |page| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().extend(order_ids(&page));
                    Ok(())
                }
            },
            CallOptions::default(),
        )
        .await
        .unwrap();

    let seen = seen.lock().clone();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0], "1");
    let mut rest = seen[1..].to_vec();
    rest.sort();
    assert_eq!(rest, vec!["2", "3", "4"]);
    assert_eq!(transport.request_count(), 4);
}

#[tokio::test]
async fn streaming_stops_on_callback_error() {
    let transport = PagedTransport::new(three_pages());
    let client = client(bearer_session("token"), transport.clone());

    let err = client
        .get_orders_each(
            json!({}),
            |_| async { Err(tradelink_domain::ApiError::Callback("storage unavailable".into())) },
            CallOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ApiErrorKind::Callback);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn selling_summary_paginates_active_list() {
    let page = |number: usize, ids: &[&str]| {
        let items: String = ids.iter().map(|id| format!("<Item><ItemID>{id}</ItemID></Item>")).collect();
        format!(
            r#"<GetMyeBaySellingResponse xmlns="urn:ebay:apis:eBLBaseComponents"><Ack>Success</Ack>
<ActiveList><ItemArray>{items}</ItemArray><PaginationResult><TotalNumberOfPages>2</TotalNumberOfPages>
<TotalNumberOfEntries>3</TotalNumberOfEntries></PaginationResult></ActiveList></GetMyeBaySellingResponse>"#
        )
        .replace("<PaginationResult>", &format!("<PaginationResult><PageNumber>{number}</PageNumber>"))
    };
    let transport = PagedTransport::new(vec![page(1, &["a", "b"]), page(2, &["c"])]);
    let client = client(bearer_session("token"), transport.clone());

    let merged = client
        .get_my_ebay_selling(
            json!({ "ActiveList": { "Include": true, "Pagination": { "EntriesPerPage": 2 } } }),
            CallOptions::default(),
        )
        .await
        .unwrap();

    let ids: Vec<_> = merged["ActiveList"]["ItemArray"]["Item"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["ItemID"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    let second = &transport.requests()[1].body;
    assert!(second.contains("<ActiveList><Include>true</Include><Pagination><EntriesPerPage>2</EntriesPerPage><PageNumber>2</PageNumber></Pagination></ActiveList>"));
}

#[tokio::test]
async fn merged_call_fetches_one_page_at_a_time() {
    let transport = PagedTransport::with_latency(three_pages(), LATENCY);
    let client = client(bearer_session("token"), transport.clone());

    let merged = client.get_orders(json!({}), CallOptions::default()).await.unwrap();

    assert_eq!(order_ids(&merged).len(), 6);
    assert_eq!(transport.peak_in_flight(), 1);
    assert_eq!(
        transport.events(),
        vec![Event::Sent(1), Event::Sent(2), Event::Sent(3)]
    );
}

#[tokio::test]
async fn streaming_keeps_two_pages_in_flight() {
    let transport = PagedTransport::with_latency(numbered_pages(5), LATENCY);
    let client = client(bearer_session("token"), transport.clone());

    client
        .get_orders_each(
            json!({}),
            |page| {
                let transport = Arc::clone(&transport);
                async move {
                    for id in order_ids(&page) {
                        transport.delivered(id.parse().unwrap());
                    }
                    Ok(())
                }
            },
            CallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(transport.request_count(), 5);
    assert_eq!(transport.peak_in_flight(), 2);

    let events = transport.events();
    let sent_four = position(&events, Event::Sent(4));
    assert!(position(&events, Event::Delivered(1)) < position(&events, Event::Sent(2)));
    assert!(position(&events, Event::Delivered(2)) < sent_four);
    assert!(position(&events, Event::Delivered(3)) < sent_four);
    assert!(position(&events, Event::Sent(3)) < position(&events, Event::Delivered(2)));
    assert!(position(&events, Event::Sent(5)) < position(&events, Event::Delivered(4)));
}
