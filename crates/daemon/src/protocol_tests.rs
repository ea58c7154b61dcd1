// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol unit tests

use super::*;
use herald_core::{EventLevel, EventMessage};

#[test]
fn send_request_carries_the_wire_record() {
    let message = EventMessage::new("herald.audit.login", EventLevel::Info);
    let request = Request::Send {
        message: message.serialize(),
    };

    let encoded = encode(&request).expect("encode failed");
    let json: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
    assert_eq!(json["type"], "Send");
    assert_eq!(json["message"]["eventName"], "herald.audit.login");
    assert_eq!(json["message"]["__type"], "$$EventMessage");

    let decoded: Request = decode(&encoded).expect("decode failed");
    assert_eq!(request, decoded);
}

#[test]
fn events_mode_defaults_to_all() {
    let decoded: Request = decode(br#"{"type":"Events"}"#).unwrap();
    assert_eq!(
        decoded,
        Request::Events {
            mode: EventQuery::All
        }
    );

    let unsent: Request = decode(br#"{"type":"Events","mode":"unsent"}"#).unwrap();
    assert_eq!(
        unsent,
        Request::Events {
            mode: EventQuery::Unsent
        }
    );
}

#[test]
fn destinations_id_is_optional() {
    let decoded: Request = decode(br#"{"type":"Destinations"}"#).unwrap();
    assert_eq!(decoded, Request::Destinations { id: None });
}

#[test]
fn status_response_survives_encoding() {
    let response = Response::Status {
        status: DaemonStatus {
            uptime_secs: 3600,
            destinations: 2,
            listening: 1,
            unsent: 4,
        },
    };

    let encoded = encode(&response).expect("encode failed");
    let decoded: Response = decode(&encoded).expect("decode failed");

    assert_eq!(response, decoded);
}

#[test]
fn unknown_request_type_is_a_json_error() {
    let err = decode::<Request>(br#"{"type":"Reboot"}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::Json(_)));
}

#[tokio::test]
async fn write_message_adds_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data)
        .await
        .expect("write failed");

    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");
    assert_eq!(read_back, data);
}

#[tokio::test]
async fn empty_stream_reads_as_closed() {
    let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
    assert!(matches!(
        read_message(&mut cursor).await,
        Err(ProtocolError::ConnectionClosed)
    ));
}

#[tokio::test]
async fn oversized_length_is_rejected() {
    let mut frame = ((MAX_MESSAGE_SIZE + 1) as u32).to_be_bytes().to_vec();
    frame.extend_from_slice(b"{}");
    let mut cursor = std::io::Cursor::new(frame);

    assert!(matches!(
        read_message(&mut cursor).await,
        Err(ProtocolError::MessageTooLarge { .. })
    ));
}

#[tokio::test]
async fn read_request_times_out_on_silent_peer() {
    let (_client, server) = tokio::io::duplex(64);
    let (mut reader, _writer) = tokio::io::split(server);

    let err = read_request(&mut reader, Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Timeout));
}
