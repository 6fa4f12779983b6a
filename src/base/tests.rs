use crate::base::neterror::NetError;

#[test]
fn test_net_error_roundtrip() {
    // Standard Chromium error
    let original = NetError::ConnectionRefused;
    let code = original.as_i32();
    assert_eq!(code, -102);
    let converted = NetError::from(code);
    assert!(matches!(converted, NetError::ConnectionRefused));

    // Crate-specific error
    let custom = NetError::MultiplexAborted;
    let custom_code = custom.as_i32();
    assert_eq!(custom_code, -1001);
    let custom_converted = NetError::from(custom_code);
    assert!(matches!(custom_converted, NetError::MultiplexAborted));
}

#[test]
fn test_unknown_error() {
    let err = NetError::from(-9999);
    assert!(matches!(err, NetError::Unknown(-9999)));
}

#[test]
fn test_contextual_variants_share_base_code() {
    let err = NetError::ConnectionFailedTo {
        host: "example.com".into(),
        port: 80,
        reason: "refused".into(),
    };
    assert_eq!(err.as_i32(), NetError::ConnectionFailed.as_i32());
}

#[test]
fn test_batch_fatal_classification() {
    assert!(NetError::MultiplexAborted.is_batch_fatal());
    assert!(NetError::IncompleteBatch {
        expected: 3,
        completed: 1
    }
    .is_batch_fatal());
    assert!(!NetError::ConnectionRefused.is_batch_fatal());
    assert!(!NetError::TooManyRedirects.is_batch_fatal());
}

#[test]
fn test_io_error_mapping() {
    use std::io::{Error, ErrorKind};

    let refused: NetError = Error::new(ErrorKind::ConnectionRefused, "x").into();
    assert_eq!(refused, NetError::ConnectionRefused);

    let timeout: NetError = Error::new(ErrorKind::TimedOut, "x").into();
    assert_eq!(timeout, NetError::ConnectionTimedOut);
}
