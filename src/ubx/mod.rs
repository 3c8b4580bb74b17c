//! UBX binary protocol support
//!
//! The receiver frames every message as
//! `[0xB5 0x62] [CLASS] [ID] [LEN u16 LE] [PAYLOAD] [CK_A CK_B]` with an
//! 8-bit Fletcher checksum. This module owns framing and payload decoding;
//! it knows nothing about threads, queues or telemetry.

mod decoder;
mod messages;
mod ring_buffer;

pub use decoder::{checksum, encode_frame, FrameDecoder, MAX_PAYLOAD_SIZE, SYNC1, SYNC2};
pub use messages::{
    FixType, NavPvt, NavRelPosNed, NavSat, ParsedMessage, CLASS_NAV, ID_NAV_PVT, ID_NAV_RELPOSNED,
    ID_NAV_SAT,
};
