mod common;

use push_delivery::adapters::push::{HttpResponse, ResponseParser};
use push_delivery::adapters::push::apns::{ApnsBatchResult, ApnsParser};
use push_delivery::adapters::push::email::{EmailParser, MailResult};
use push_delivery::adapters::push::fcm::{FcmBatchParser, FcmResponse};
use push_delivery::adapters::push::jpush::{JPUSH_REPORT_URL, JPushReportParser, JPushReportResult};
use push_delivery::adapters::push::wns::{HEADER_DEVICE_CONNECTION_STATUS, HEADER_NOTIFICATION_STATUS, WnsParser};
use push_delivery::diagnostics::RecordingLogger;
use push_delivery::domain::report::StatusSource;
use push_delivery::domain::status::PushNotificationStatus;
use push_delivery::error::DeliveryError;
use push_delivery::services::notification_response::NotificationResponse;
use std::collections::{BTreeSet, HashMap};

fn key_set(response: &NotificationResponse) -> BTreeSet<String> {
    response.to_report().endpoints().map(str::to_owned).collect()
}

#[test]
fn test_every_parser_reports_exactly_the_sent_endpoints() {
    common::setup_tracing();
    let logger = RecordingLogger::new();
    let endpoints = common::endpoints(&["endpoint1", "endpoint2", "endpoint3"]);
    let expected: BTreeSet<String> = endpoints.iter().cloned().collect();

    let apns = ApnsParser::default()
        .parse(&ApnsBatchResult::new().with_recipients(&endpoints), &endpoints, &logger)
        .unwrap();

    let fcm_raw: HashMap<String, HttpResponse> = endpoints.iter().map(|e| (e.clone(), common::response(200))).collect();
    let fcm = FcmBatchParser.parse(&fcm_raw, &endpoints, &logger).unwrap();
    let mut cumulative = FcmResponse::new();
    cumulative.add_batch_response(&fcm, &endpoints);

    let mail_raw: HashMap<String, MailResult> = endpoints.iter().map(|e| (e.clone(), MailResult::sent())).collect();
    let email = EmailParser.parse(&mail_raw, &endpoints, &logger).unwrap();

    let jpush_raw = JPushReportResult {
        message_id: 1,
        response: HttpResponse::new(JPUSH_REPORT_URL, 200).with_body(r#"{"endpoint1": {"status": 0}}"#),
    };
    let jpush = JPushReportParser.parse(&jpush_raw, &endpoints, &logger).unwrap();

    let responses = [
        NotificationResponse::from(apns),
        NotificationResponse::from(cumulative),
        NotificationResponse::from(email),
        NotificationResponse::from(jpush),
    ];
    for response in &responses {
        assert_eq!(key_set(response), expected, "{}", response.provider());
        assert_eq!(response.get_status("not-sent"), PushNotificationStatus::Unknown);
    }
}

#[test]
fn test_wns_failure_is_logged_with_headers() {
    let logger = RecordingLogger::new();
    let raw = common::response(200)
        .with_header(HEADER_NOTIFICATION_STATUS, "dropped")
        .with_header(HEADER_DEVICE_CONNECTION_STATUS, "disconnected");

    let response = NotificationResponse::from(WnsParser.parse(&raw, &common::endpoints(&["channel"]), &logger).unwrap());

    assert_eq!(response.get_status("channel"), PushNotificationStatus::ClientError);
    let records = logger.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].field("nstatus"), Some("dropped"));
    assert_eq!(records[0].field("dstatus"), Some("disconnected"));
    assert_eq!(records[0].field("error_description"), Some(""));
}

#[test]
fn test_successes_never_log() {
    let logger = RecordingLogger::new();
    let endpoints = common::endpoints(&["a", "b"]);

    let raw: HashMap<String, HttpResponse> = endpoints.iter().map(|e| (e.clone(), common::response(200))).collect();
    FcmBatchParser.parse(&raw, &endpoints, &logger).unwrap();
    let raw = common::response(200).with_header(HEADER_NOTIFICATION_STATUS, "received");
    WnsParser.parse(&raw, &common::endpoints(&["a"]), &logger).unwrap();

    assert!(logger.is_empty());
}

#[test]
fn test_duplicate_endpoints_are_rejected_everywhere() {
    let logger = RecordingLogger::new();
    let endpoints = common::endpoints(&["dup", "dup"]);

    let apns = ApnsParser::default().parse(&ApnsBatchResult::new(), &endpoints, &logger);
    assert!(matches!(apns, Err(DeliveryError::DuplicateEndpoint(_))));

    let email = EmailParser.parse(&HashMap::new(), &endpoints, &logger);
    assert!(matches!(email, Err(DeliveryError::DuplicateEndpoint(_))));

    let fcm = FcmBatchParser.parse(&HashMap::new(), &endpoints, &logger);
    assert!(matches!(fcm, Err(DeliveryError::DuplicateEndpoint(_))));
}
