use std::time::Duration;
use telemetry_link::link::serial_mock::{MockByteSource, MockSourceFactory};
use telemetry_link::util::encode_wire;
use telemetry_link::{
    run_live, ByteSource, DecodedReading, DeviceKind, Frame, MonitorConfig, NegotiationConfig,
    TelemetryError, TelemetryMonitor,
};

const READ_TIMEOUT: Duration = Duration::from_millis(100);

fn wire(device_type: u8, device_id: u8, data: u8) -> Vec<u8> {
    encode_wire(Frame::build(device_type, device_id, 0x11, data).as_bytes()).into_bytes()
}

#[tokio::test]
async fn test_live_session_until_source_ends() {
    let mut source = MockByteSource::ending();
    let observer = source.clone();
    source.queue_rx_data(&wire(0x01, 0x01, 25));
    source.queue_rx_data(b"7E 02 01 11 37 00 00 7E ");
    source.queue_rx_data(&wire(0x02, 0x01, 55));

    let mut seen: Vec<DecodedReading> = Vec::new();
    let stats = run_live(&mut source, READ_TIMEOUT, std::future::pending(), |r| {
        seen.push(*r)
    })
    .await
    .unwrap();

    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].device, DeviceKind::Temperature);
    assert_eq!(seen[0].data, 25);
    assert!(!seen[1].checksum.is_ok());
    assert_eq!(seen[2].device, DeviceKind::Humidity);
    assert_eq!(stats.valid_readings, 2);
    assert_eq!(stats.checksum_mismatches, 1);
    assert_eq!(observer.closes(), 1);
    assert!(!observer.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_live_session_interrupted() {
    let mut source = MockByteSource::new();
    let observer = source.clone();
    source.queue_rx_data(&wire(0x01, 0x03, 19));

    let mut count = 0;
    let stats = run_live(
        &mut source,
        READ_TIMEOUT,
        tokio::time::sleep(Duration::from_secs(1)),
        |_| count += 1,
    )
    .await
    .unwrap();

    assert_eq!(count, 1);
    assert_eq!(stats.readings(), 1);
    assert_eq!(observer.closes(), 1);
}

#[tokio::test]
async fn test_read_error_propagates_and_closes() {
    let mut source = MockByteSource::new();
    let observer = source.clone();
    source.queue_rx_data(&wire(0x01, 0x01, 25));
    source.set_next_error(TelemetryError::SerialPortError("device unplugged".into()));

    let result = run_live(&mut source, READ_TIMEOUT, std::future::pending(), |_| {}).await;

    assert!(matches!(result, Err(TelemetryError::SerialPortError(_))));
    assert_eq!(observer.closes(), 1);
}

#[tokio::test]
async fn test_noise_only_stream() {
    let mut source = MockByteSource::ending();
    source.queue_rx_data(b"hello 12 34 \xF0\xF1 zz 7E 7E ");

    let stats = run_live(&mut source, READ_TIMEOUT, std::future::pending(), |_| {
        panic!("no reading expected")
    })
    .await
    .unwrap();

    assert_eq!(stats.readings(), 0);
    assert!(stats.malformed_bytes >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_monitor_negotiates_then_decodes() {
    let monitor = TelemetryMonitor::new(MonitorConfig {
        port: Some("mock".into()),
        ..Default::default()
    })
    .unwrap();
    let mut factory = MockSourceFactory::new()
        .with_noise(&[0xFE, 0x81, b' '])
        .with_script(2400, &wire(0x02, 0x07, 48));

    let mut seen = Vec::new();
    let report = monitor
        .run(
            &mut factory,
            tokio::time::sleep(Duration::from_secs(30)),
            |r| seen.push(*r),
        )
        .await
        .unwrap();

    assert_eq!(report.baudrate, 2400);
    // Negotiation probes 300, 1200, 2400, then the live phase reopens 2400
    assert_eq!(factory.opened_rates(), vec![300, 1200, 2400, 2400]);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].device_id, 0x07);
    assert_eq!(report.stats.valid_readings, 1);
    for source in factory.handed_out() {
        assert_eq!(source.closes(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_monitor_fixed_rate_skips_negotiation() {
    let monitor = TelemetryMonitor::new(MonitorConfig {
        baudrate: Some(57600),
        negotiation: NegotiationConfig {
            candidates: vec![],
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap();
    let mut factory = MockSourceFactory::new().with_script(57600, &wire(0x01, 0x01, 30));

    let report = monitor
        .run(&mut factory, tokio::time::sleep(Duration::from_secs(1)), |_| {})
        .await
        .unwrap();

    assert_eq!(report.baudrate, 57600);
    assert_eq!(factory.opened_rates(), vec![57600]);
    assert_eq!(report.stats.readings(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_monitor_interrupted_during_negotiation() {
    let monitor = TelemetryMonitor::new(MonitorConfig::default()).unwrap();
    let mut factory = MockSourceFactory::new();

    let result = monitor
        .run(
            &mut factory,
            tokio::time::sleep(Duration::from_millis(500)),
            |_| {},
        )
        .await;

    assert!(matches!(result, Err(TelemetryError::Interrupted)));
    assert_eq!(factory.opened_rates(), vec![300]);
    assert_eq!(factory.handed_out()[0].closes(), 1);
}
