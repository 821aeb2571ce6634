//! The link module contains the protocol engine: CRC, ASCII-hex decoding,
//! frame assembly and interpretation, baud negotiation, and the byte
//! sources it runs on.

pub mod assembler;
pub mod baud;
pub mod crc;
pub mod frame;
pub mod hex_decoder;
pub mod serial;
pub mod serial_mock;
pub mod session;
pub mod source;

pub use assembler::FrameAssembler;
pub use baud::{BaudNegotiator, BaudRate, NegotiationConfig};
pub use crc::crc16;
pub use frame::{interpret, ChecksumStatus, DecodedReading, DeviceKind, Frame, FrameError};
pub use hex_decoder::AsciiHexDecoder;
pub use serial::{
    find_matching_port, list_ports, PortDescription, SerialByteSource, SerialConfig,
    SerialSourceFactory,
};
pub use session::{run_live, DecodingSession, SessionStats};
pub use source::{ByteSource, SourceFactory};
