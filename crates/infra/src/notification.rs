//! Platform notification payloads
//!
//! Notifications arrive as SOAP envelopes whose body wraps an ordinary
//! reply document. Only the unwrapping lives here. Signature checks and
//! field extraction are left to the caller.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;
use tradelink_core::XmlCodec;
use tradelink_domain::{ApiError, Result};

use crate::xml::QuickXmlCodec;

const ENVELOPE: &str = "soapenv:Envelope";
const BODY: &str = "soapenv:Body";
const FORCED_ARRAYS: [&str; 1] = ["Message"];

/// Parse a notification envelope and return the content of the reply it
/// carries.
///
/// `Message` elements are always sequences so single and multiple message
/// payloads share a shape.
///
/// # Errors
/// Returns `ApiError::Decode` when the text is not XML or has no SOAP body.
pub fn parse_notification(xml: &str) -> Result<Value> {
    let force_array: BTreeSet<String> = FORCED_ARRAYS.iter().map(|name| (*name).to_string()).collect();
    let mut document = QuickXmlCodec::new().to_structured(xml, &force_array)?;

    let body = document
        .get_mut(ENVELOPE)
        .and_then(|envelope| envelope.get_mut(BODY))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| ApiError::Decode("notification has no SOAP body".to_string()))?;

    let (event, reply) = body
        .iter_mut()
        .find(|(name, _)| !name.starts_with("xmlns"))
        .ok_or_else(|| ApiError::Decode("notification body is empty".to_string()))?;
    debug!(event = %event, "parsed notification");

    Ok(reply.take())
}

#[cfg(test)]
mod tests {
    use tradelink_domain::ApiErrorKind;

    use super::*;

    fn notification(messages: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"
 xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
 <soapenv:Header>
  <ebl:RequesterCredentials soapenv:mustUnderstand="0" xmlns:ebl="urn:ebay:apis:eBLBaseComponents">
   <ebl:NotificationSignature>ABC123==</ebl:NotificationSignature>
  </ebl:RequesterCredentials>
 </soapenv:Header>
 <soapenv:Body>
  <GetMyMessagesResponse xmlns="urn:ebay:apis:eBLBaseComponents">
   <Timestamp>2005-08-04T22:52:20.701Z</Timestamp>
   <Ack>Success</Ack>
   <NotificationEventName>MyMessageseBayMessageHeader</NotificationEventName>
   <RecipientUserID>sampleuser</RecipientUserID>
   <Messages>{messages}</Messages>
  </GetMyMessagesResponse>
 </soapenv:Body>
</soapenv:Envelope>"#
        )
    }

    fn message(id: &str) -> String {
        format!(
            "<Message><Sender>testuser</Sender><MessageID>{id}</MessageID>\
             <ResponseDetails><ResponseEnabled>false</ResponseEnabled></ResponseDetails></Message>"
        )
    }

    #[test]
    fn unwraps_reply_from_body() {
        let reply = parse_notification(&notification(&message("1989403"))).unwrap();

        assert_eq!(reply["Ack"], "Success");
        assert_eq!(reply["NotificationEventName"], "MyMessageseBayMessageHeader");
        assert!(reply.get("soapenv:Header").is_none());
    }

    #[test]
    fn single_message_is_a_sequence() {
        let reply = parse_notification(&notification(&message("1989403"))).unwrap();

        let messages = reply["Messages"]["Message"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["MessageID"], "1989403");
    }

    #[test]
    fn multiple_messages_keep_document_order() {
        let body = format!("{}{}", message("1989403"), message("1989404"));
        let reply = parse_notification(&notification(&body)).unwrap();

        let ids: Vec<_> = reply["Messages"]["Message"]
            .as_array()
            .unwrap()
            .iter()
            .map(|message| message["MessageID"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["1989403", "1989404"]);
    }

    #[test]
    fn missing_body_is_decode_error() {
        let err = parse_notification(
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"/>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Decode);

        let err = parse_notification("<soapenv:Envelope><soapenv:Body>").unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Decode);
    }
}
