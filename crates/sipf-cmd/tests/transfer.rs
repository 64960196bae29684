mod common;

use common::{block, session};
use sipf_transport::ByteChannel;

const EOT: u8 = 0x04;
const ACK: u8 = 0x06;
const NAK: u8 = 0x15;
const CAN: u8 = 0x18;

fn file(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn fput_streams_blocks_into_upload() {
    let data = file(200);
    let mut input = block(1, &data[..128]);
    input.extend(block(1, &data[..128]));
    input.extend(block(2, &data[128..]));
    input.push(EOT);
    let (mut session, backend) = session(&input);

    let response = session.dispatch(b"FPUT log.bin 000000C8");
    assert_eq!(response, b"000000C8\r\nOK\r\n");

    assert_eq!(backend.lock().unwrap().files["log.bin"], data);
    assert_eq!(session.channel().output(), &[NAK, ACK, ACK, ACK, ACK]);
    assert!(session.channel().echo_enabled());
}

#[test]
fn fput_naks_bad_first_block() {
    let data = file(10);
    let mut corrupted = block(1, &data);
    corrupted[50] ^= 0xFF;
    let mut input = corrupted;
    input.extend(block(1, &data));
    input.push(EOT);
    let (mut session, backend) = session(&input);

    assert_eq!(session.dispatch(b"FPUT f 0000000A"), b"0000000A\r\nOK\r\n");
    assert_eq!(backend.lock().unwrap().files["f"], data);
    assert_eq!(session.channel().output(), &[NAK, NAK, ACK, ACK]);
}

#[test]
fn fput_without_sender_cancels() {
    let (mut session, backend) = session(b"");

    assert_eq!(session.dispatch(b"FPUT f 00000010"), b"NG\r\n");
    assert!(backend.lock().unwrap().files.is_empty());

    let output = session.channel().output();
    assert!(output.ends_with(&[CAN, CAN]));
    assert_eq!(output.iter().filter(|&&b| b == NAK).count(), 11);
    assert!(session.channel().echo_enabled());
}

#[test]
fn fput_short_transfer_fails() {
    let data = file(100);
    let mut input = block(1, &data);
    input.push(EOT);
    let (mut session, backend) = session(&input);

    assert_eq!(session.dispatch(b"FPUT f 00000100"), b"NG\r\n");
    assert!(backend.lock().unwrap().files.is_empty());
    assert!(session.channel().output().ends_with(&[CAN, CAN]));
}

#[test]
fn fput_recovers_from_corrupted_middle_block() {
    let data = file(300);
    let mut bad = block(2, &data[128..256]);
    bad[70] ^= 0x01;
    let mut input = block(1, &data[..128]);
    input.extend(bad);
    input.extend(block(2, &data[128..256]));
    input.extend(block(3, &data[256..]));
    input.push(EOT);
    let (mut session, backend) = session(&input);

    assert_eq!(session.dispatch(b"FPUT f 0000012C"), b"0000012C\r\nOK\r\n");
    assert_eq!(backend.lock().unwrap().files["f"], data);
    assert_eq!(session.channel().output(), &[NAK, ACK, NAK, ACK, ACK, ACK]);
}

#[test]
fn fput_naks_block_out_of_sequence() {
    let data = file(300);
    let mut input = block(1, &data[..128]);
    input.extend(block(3, &data[256..]));
    input.extend(block(2, &data[128..256]));
    input.extend(block(3, &data[256..]));
    input.push(EOT);
    let (mut session, backend) = session(&input);

    assert_eq!(session.dispatch(b"FPUT f 0000012C"), b"0000012C\r\nOK\r\n");
    assert_eq!(backend.lock().unwrap().files["f"], data);
    assert_eq!(session.channel().output(), &[NAK, ACK, NAK, ACK, ACK, ACK]);
}

#[test]
fn fput_truncated_first_block_cancels() {
    let first = block(1, &file(16));
    let (mut session, backend) = session(&first[..40]);

    assert_eq!(session.dispatch(b"FPUT f 00000010"), b"NG\r\n");
    assert!(backend.lock().unwrap().files.is_empty());
    assert_eq!(session.channel().output(), &[NAK, CAN, CAN]);
    assert!(session.channel().echo_enabled());
}

#[test]
fn fput_stall_inside_block_cancels_and_drops_remnant() {
    let data = file(256);
    let second = block(2, &data[128..]);
    let mut input = block(1, &data[..128]);
    input.extend_from_slice(&second[..60]);
    let (mut session, backend) = session(&input);
    session.channel_mut().push_timeout();
    session.channel_mut().push_input(&second[60..]);

    assert_eq!(session.dispatch(b"FPUT f 00000100"), b"NG\r\n");
    assert!(backend.lock().unwrap().files.is_empty());
    assert_eq!(session.channel().output(), &[NAK, ACK, CAN, CAN]);
    assert_eq!(session.channel().remaining_input(), 0);
}

#[test]
fn fput_parameter_errors() {
    let (mut session, _) = session(b"");
    assert_eq!(session.dispatch(b"FPUT f"), b"ILLEGAL PARAMETER\r\nNG\r\n");
    assert_eq!(session.dispatch(b"FPUT f 10"), b"ILLEGAL PARAMETER\r\nNG\r\n");
    assert_eq!(session.dispatch(b"FPUT a/b 00000010"), b"ILLEGAL PARAMETER\r\nNG\r\n");
    assert!(session.channel().output().is_empty());
}

#[test]
fn fget_sends_file_as_blocks() {
    let data = file(200);
    let (mut session, backend) = session(&[NAK, ACK, ACK, ACK]);
    backend
        .lock()
        .unwrap()
        .files
        .insert("report.csv".into(), data.clone());

    let response = session.dispatch(b"FGET report.csv");
    assert_eq!(response, b"\r\n000000C8\r\nOK\r\n");

    let mut expected = block(1, &data[..128]);
    expected.extend(block(2, &data[128..]));
    expected.push(EOT);
    assert_eq!(session.channel().output(), expected.as_slice());
    assert!(session.channel().echo_enabled());
}

#[test]
fn fget_missing_file_cancels() {
    let (mut session, _) = session(&[NAK]);

    assert_eq!(session.dispatch(b"FGET nothing"), b"\r\nNG\r\n");
    assert_eq!(session.channel().output(), &[CAN, CAN]);
}

#[test]
fn fget_without_request_fails() {
    let (mut session, backend) = session(b"");
    backend.lock().unwrap().files.insert("f".into(), file(10));

    assert_eq!(session.dispatch(b"FGET f"), b"\r\nNG\r\n");
    assert!(session.channel().output().ends_with(&[CAN, CAN]));
}
