#![no_main]

use libfuzzer_sys::fuzz_target;
use telemetry_link::DecodingSession;

fuzz_target!(|data: &[u8]| {
    // Arbitrary line noise must never panic the pipeline
    let mut session = DecodingSession::for_probe();
    let readings = session.feed_all(data);

    let stats = session.stats();
    assert_eq!(stats.bytes_received, data.len() as u64);
    assert_eq!(stats.readings(), readings.len() as u64);
});
