#![no_main]

use libfuzzer_sys::fuzz_target;
use telemetry_link::{crc16, interpret, ChecksumStatus, Frame};

fuzz_target!(|data: [u8; 8]| {
    let frame = Frame(data);
    match interpret(&frame) {
        Ok(reading) => {
            assert_eq!(data[7], 0x7E);
            let matches = crc16(&data[1..5]) == u16::from_be_bytes([data[5], data[6]]);
            assert_eq!(reading.checksum == ChecksumStatus::Ok, matches);
        }
        Err(_) => assert_ne!(data[7], 0x7E),
    }
});
