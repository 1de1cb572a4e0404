use super::*;
use pin_common::{ErrorCode, InjectPoint};
use pin_dialect::DialectModule;
use pretty_assertions::assert_eq;
use std::io::Cursor;
use std::time::Duration;

fn invoke() -> Envelope {
    Envelope::new(Message::Invoke {
        inject_point: InjectPoint::BeforeIpa,
        module: DialectModule::new("m"),
    })
}

#[test]
fn test_frame_header_is_big_endian_length() {
    let frame = encode_frame(&invoke()).unwrap();
    let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    assert_eq!(len, frame.len() - 4);

    let body = read_frame(&mut Cursor::new(frame)).unwrap().unwrap();
    assert_eq!(decode_body(&body).unwrap(), invoke());
}

#[test]
fn test_wire_names() {
    let json = serde_json::to_value(invoke()).unwrap();
    assert_eq!(json["body"]["type"], "invoke");
    assert_eq!(json["body"]["inject_point"], "before-ipa");

    let error = Message::Result {
        inject_point: InjectPoint::AfterInline,
        payload: ResultPayload::Error {
            code: ErrorCode::PassFailure,
            message: "boom".to_string(),
            pass: Some("inline".to_string()),
        },
    };
    let json = serde_json::to_value(&error).unwrap();
    assert_eq!(json["payload"]["kind"], "error");
    assert_eq!(json["payload"]["code"], "pass-failure");
}

#[test]
fn test_version_is_checked_before_body() {
    // The body is not a valid message at all; the version must still win
    let body = br#"{"schema_version": 7, "body": {"type": "no-such-message"}}"#;
    match decode_body(body) {
        Err(ProtocolError::VersionMismatch { expected, found }) => {
            assert_eq!(expected, SCHEMA_VERSION);
            assert_eq!(found, 7);
        }
        other => panic!("expected version mismatch, got {:?}", other),
    }

    assert!(matches!(
        decode_body(br#"{"body": {"type": "goodbye"}}"#),
        Err(ProtocolError::VersionMismatch { found: 0, .. })
    ));
}

#[test]
fn test_oversized_frame_is_refused() {
    let mut frame = (MAX_FRAME_LEN as u32 + 1).to_be_bytes().to_vec();
    frame.extend_from_slice(b"{}");
    assert!(matches!(
        read_frame(&mut Cursor::new(frame)),
        Err(ProtocolError::FrameTooLarge { .. })
    ));
}

#[test]
fn test_clean_and_truncated_eof() {
    assert!(read_frame(&mut Cursor::new(Vec::new())).unwrap().is_none());

    let mut frame = encode_frame(&invoke()).unwrap();
    frame.truncate(frame.len() - 1);
    assert!(matches!(read_frame(&mut Cursor::new(frame)), Err(ProtocolError::Io(_))));
}

#[test]
fn test_memory_pair_delivers_in_order() {
    let (mut host, mut server) = MemoryTransport::pair();
    host.send_message(Message::Hello { client: "t".to_string(), dialect_version: 1 }).unwrap();
    host.send(&invoke()).unwrap();

    assert_eq!(server.recv(None).unwrap().body.kind(), "hello");
    assert_eq!(server.recv(None).unwrap(), invoke());
}

#[test]
fn test_memory_timeout_and_disconnect() {
    let (mut host, server) = MemoryTransport::pair();
    assert!(matches!(host.recv(Some(Duration::from_millis(10))), Err(ProtocolError::Timeout)));

    drop(server);
    assert!(matches!(host.recv(Some(Duration::from_millis(10))), Err(ProtocolError::Disconnected)));
    assert!(matches!(host.send(&invoke()), Err(ProtocolError::Disconnected)));
}

#[test]
fn test_memory_rejects_foreign_version() {
    let (mut host, mut server) = MemoryTransport::pair();
    let mut stale = invoke();
    stale.schema_version = SCHEMA_VERSION + 1;
    let body = serde_json::to_vec(&stale).unwrap();
    let mut frame = (body.len() as u32).to_be_bytes().to_vec();
    frame.extend_from_slice(&body);
    host.send_raw(frame).unwrap();

    assert!(matches!(server.recv(None), Err(ProtocolError::VersionMismatch { .. })));
}

#[test]
fn test_stream_transport_reads_all_frames_then_disconnects() {
    let mut input = encode_frame(&invoke()).unwrap();
    input.extend(encode_frame(&Envelope::new(Message::Goodbye)).unwrap());

    let mut transport = StreamTransport::new(Cursor::new(input), Vec::new()).unwrap();
    assert_eq!(transport.recv(Some(Duration::from_secs(5))).unwrap(), invoke());
    assert_eq!(transport.recv(Some(Duration::from_secs(5))).unwrap().body, Message::Goodbye);
    assert!(matches!(
        transport.recv(Some(Duration::from_secs(5))),
        Err(ProtocolError::Disconnected),
    ));

    transport.send_message(Message::Goodbye).unwrap();
}

#[test]
fn test_protocol_errors_are_fatal() {
    let error = ProtocolError::Timeout.into_plugin_error();
    assert!(!error.is_recoverable());
    assert_eq!(error.code(), ErrorCode::Protocol);
}
