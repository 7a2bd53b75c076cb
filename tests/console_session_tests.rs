//! Console sessions over an async byte stream, as the binary runs them.

mod mock_support;

use lora_relay::modbus::MockSerialPort;
use lora_relay::run_console;
use mock_support::boot;
use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::test]
async fn test_session_over_mock_serial_port() {
    let h = boot();
    let radio = h.radio.clone();
    let node = Arc::new(Mutex::new(h.node));

    let port = MockSerialPort::new();
    port.queue_line("AT+");
    port.queue_line("AT+SETSF=9");
    port.queue_line("");
    port.queue_line("AT+SETSF=99");
    port.queue_line("AT+VERSION");

    run_console(node.clone(), port.clone(), port.clone())
        .await
        .unwrap();

    assert_eq!(
        port.tx_lines(),
        vec![
            "OK".to_string(),
            "OK".to_string(),
            "ERROR: Invalid SF (6-12)".to_string(),
            format!("VERSION:{}", env!("CARGO_PKG_VERSION")),
            "OK".to_string(),
        ]
    );
    assert_eq!(node.lock().await.config().lora_spreading_factor, 9);
    assert_eq!(radio.apply_count(), 1);
}

#[tokio::test]
async fn test_replies_terminated_with_crlf() {
    let h = boot();
    let node = Arc::new(Mutex::new(h.node));

    let port = MockSerialPort::new();
    port.queue_line("AT+BEACON=1");
    run_console(node, port.clone(), port.clone()).await.unwrap();

    assert_eq!(port.get_tx_data(), b"Beacon enabled\r\nOK\r\n".to_vec());
}

#[tokio::test]
async fn test_session_with_scripted_reader() {
    let h = boot();
    let node = Arc::new(Mutex::new(h.node));

    let reader = tokio_test::io::Builder::new()
        .read(b"AT+SETTXPWR=")
        .read(b"10\r\nAT+SETTX")
        .read(b"PWR=30\r\n")
        .build();
    let out = MockSerialPort::new();
    run_console(node.clone(), reader, out.clone()).await.unwrap();

    assert_eq!(
        out.tx_lines(),
        vec!["OK".to_string(), "ERROR: Invalid TX power (2-22)".to_string()]
    );
    assert_eq!(node.lock().await.config().tx_output_power, 10);
}

#[tokio::test]
async fn test_non_utf8_line_rejected_and_session_continues() {
    let h = boot();
    let node = Arc::new(Mutex::new(h.node));

    let port = MockSerialPort::new();
    port.queue_rx_data(b"AT+\xff\xfe\r\n");
    port.queue_line("AT+SETSF=9");
    run_console(node.clone(), port.clone(), port.clone())
        .await
        .unwrap();

    assert_eq!(
        port.tx_lines(),
        vec!["ERROR: Invalid command".to_string(), "OK".to_string()]
    );
    assert_eq!(node.lock().await.config().lora_spreading_factor, 9);
}

#[tokio::test]
async fn test_read_error_ends_session() {
    let h = boot();
    let node = Arc::new(Mutex::new(h.node));

    let port = MockSerialPort::new();
    port.set_next_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged"));
    let result = run_console(node, port.clone(), port.clone()).await;
    assert!(result.is_err());
    assert!(port.get_tx_data().is_empty());
}

#[tokio::test]
async fn test_scheduler_fires_beacon_in_background() {
    let h = boot();
    let clock = h.clock.clone();
    let beacons = h.beacons.clone();
    let node = Arc::new(Mutex::new(h.node));

    node.lock().await.handle_line("AT+BEACON=1");
    clock.advance(5000);

    let task = tokio::spawn(lora_relay::run_scheduler(
        node.clone(),
        std::time::Duration::from_millis(1),
    ));
    for _ in 0..200 {
        if !beacons.delivered().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    task.abort();
    assert_eq!(beacons.delivered().len(), 1);
}
