use std::time::Duration;
use telemetry_link::link::serial_mock::MockSourceFactory;
use telemetry_link::util::encode_wire;
use telemetry_link::{BaudNegotiator, BaudRate, Frame, NegotiationConfig, TelemetryError};

/// What a UART at the wrong bit rate tends to produce
const GARBAGE: &[u8] = &[0xF0, 0x8A, b'3', b' ', 0xFF, b'E', 0x00, b' '];

fn valid_wire() -> Vec<u8> {
    encode_wire(Frame::build(0x01, 0x01, 0x11, 0x19).as_bytes()).into_bytes()
}

fn assert_each_closed_once(factory: &MockSourceFactory) {
    for (i, source) in factory.handed_out().iter().enumerate() {
        assert_eq!(source.closes(), 1, "source #{i} closed {} times", source.closes());
    }
}

#[test]
fn test_baud_rate_enum() {
    assert_eq!(BaudRate::Baud300.as_u32(), 300);
    assert_eq!(BaudRate::Baud115200.as_u32(), 115200);
    assert_eq!(BaudRate::try_from(9600).unwrap(), BaudRate::Baud9600);
    assert!(matches!(
        BaudRate::try_from(14400),
        Err(TelemetryError::InvalidConfig(_))
    ));
    assert_eq!(BaudRate::Baud4800.to_string(), "4800");
}

#[tokio::test(start_paused = true)]
async fn test_detects_first_rate_with_valid_frame() {
    let mut factory = MockSourceFactory::new()
        .with_noise(GARBAGE)
        .with_script(9600, &valid_wire())
        .with_script(19200, &valid_wire());

    let rate = BaudNegotiator::default()
        .negotiate(&mut factory, std::future::pending())
        .await
        .unwrap();

    assert_eq!(rate, BaudRate::Baud9600);
    // Nothing above the winning rate is tried
    assert_eq!(factory.opened_rates(), vec![300, 1200, 2400, 4800, 9600]);
    assert_each_closed_once(&factory);
}

#[tokio::test(start_paused = true)]
async fn test_each_probe_is_bounded_by_the_window() {
    let mut factory = MockSourceFactory::new().with_script(4800, &valid_wire());
    let start = tokio::time::Instant::now();

    let rate = BaudNegotiator::default()
        .negotiate(&mut factory, std::future::pending())
        .await
        .unwrap();

    assert_eq!(rate, BaudRate::Baud4800);
    // Three silent candidates at two seconds each, the fourth succeeds at once
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(6), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(6500), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_checksum_mismatch_does_not_win() {
    let mut factory = MockSourceFactory::new()
        .with_script(300, b"7E 01 01 11 19 3A 4F 7E ")
        .with_script(1200, &valid_wire());

    let rate = BaudNegotiator::default()
        .negotiate(&mut factory, std::future::pending())
        .await
        .unwrap();

    assert_eq!(rate, BaudRate::Baud1200);
    assert_each_closed_once(&factory);
}

#[tokio::test(start_paused = true)]
async fn test_open_failure_skips_candidate() {
    let mut factory = MockSourceFactory::new()
        .with_failing_rate(300)
        .with_script(300, &valid_wire())
        .with_script(1200, &valid_wire());

    let rate = BaudNegotiator::default()
        .negotiate(&mut factory, std::future::pending())
        .await
        .unwrap();

    assert_eq!(rate, BaudRate::Baud1200);
    assert_eq!(factory.opened_rates(), vec![300, 1200]);
    assert_eq!(factory.handed_out().len(), 1);
    assert_each_closed_once(&factory);
}

#[tokio::test(start_paused = true)]
async fn test_no_rate_found() {
    let mut factory = MockSourceFactory::new().with_noise(GARBAGE);

    let result = BaudNegotiator::default()
        .negotiate(&mut factory, std::future::pending())
        .await;

    assert!(matches!(result, Err(TelemetryError::NoBaudFound { tried: 9 })));
    assert_eq!(factory.opened_rates().len(), 9);
    assert_each_closed_once(&factory);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_during_probe() {
    let mut factory = MockSourceFactory::new().with_noise(GARBAGE);

    let result = BaudNegotiator::default()
        .negotiate(
            &mut factory,
            tokio::time::sleep(Duration::from_millis(3500)),
        )
        .await;

    assert!(matches!(result, Err(TelemetryError::Interrupted)));
    // Interrupted while probing the second candidate
    assert_eq!(factory.opened_rates(), vec![300, 1200]);
    assert_each_closed_once(&factory);
}

#[tokio::test(start_paused = true)]
async fn test_custom_candidates() {
    let config = NegotiationConfig {
        candidates: vec![BaudRate::Baud115200, BaudRate::Baud9600],
        window: Duration::from_millis(500),
        read_timeout: Duration::from_millis(50),
    };
    let mut factory = MockSourceFactory::new().with_script(9600, &valid_wire());

    let rate = BaudNegotiator::new(config)
        .negotiate(&mut factory, std::future::pending())
        .await
        .unwrap();

    assert_eq!(rate, BaudRate::Baud9600);
    assert_eq!(factory.opened_rates(), vec![115200, 9600]);
}

#[tokio::test]
async fn test_invalid_config_probes_nothing() {
    let config = NegotiationConfig {
        window: Duration::ZERO,
        ..Default::default()
    };
    let mut factory = MockSourceFactory::new();

    let result = BaudNegotiator::new(config)
        .negotiate(&mut factory, std::future::pending())
        .await;

    assert!(matches!(result, Err(TelemetryError::InvalidConfig(_))));
    assert!(factory.opened_rates().is_empty());
}
