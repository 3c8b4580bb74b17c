//! Incremental UBX frame decoder
//!
//! Frame format: [0xB5 0x62] [CLASS] [ID] [LEN_LO LEN_HI] [PAYLOAD] [CK_A CK_B]
//!
//! Checksum: 8-bit Fletcher over CLASS, ID, LEN and PAYLOAD.
//!
//! The decoder is pure byte-in/message-out: the pipeline feeds it raw reads
//! and matches explicitly on the result of `next_message`. Framing failures
//! are soft classifications; the decoder resynchronizes on the next sync
//! pattern and never terminates the stream.

use super::messages::ParsedMessage;
use super::ring_buffer::RingBuffer;
use crate::error::FrameError;

/// Sync byte 1
pub const SYNC1: u8 = 0xB5;
/// Sync byte 2
pub const SYNC2: u8 = 0x62;

/// Largest payload the decoder will accept
///
/// NAV-SAT grows with the satellite count (8 + 12 per SV); 2 KiB covers any
/// constellation mix with headroom. A larger declared length is treated as
/// line noise.
pub const MAX_PAYLOAD_SIZE: usize = 2048;

/// Smallest complete frame: sync(2) + class(1) + id(1) + len(2) + ck(2)
const MIN_FRAME_SIZE: usize = 8;

/// Frame overhead around the payload
const FRAME_OVERHEAD: usize = 8;

/// 8-bit Fletcher checksum over class, id, length and payload bytes
pub fn checksum(data: &[u8]) -> [u8; 2] {
    let mut ck_a: u8 = 0;
    let mut ck_b: u8 = 0;
    for &b in data {
        ck_a = ck_a.wrapping_add(b);
        ck_b = ck_b.wrapping_add(ck_a);
    }
    [ck_a, ck_b]
}

/// Build a complete frame around a payload (test fixtures and loopbacks)
pub fn encode_frame(class: u8, id: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(FRAME_OVERHEAD + payload.len());
    frame.push(SYNC1);
    frame.push(SYNC2);
    frame.push(class);
    frame.push(id);
    frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    frame.extend_from_slice(payload);
    let ck = checksum(&frame[2..]);
    frame.extend_from_slice(&ck);
    frame
}

/// Ring-buffer based UBX frame decoder
pub struct FrameDecoder {
    buffer: RingBuffer<8192>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buffer: RingBuffer::new(),
        }
    }

    /// Append raw bytes from the channel
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Drop all buffered bytes (software side of a channel flush)
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Try to extract the next message from the buffered bytes
    ///
    /// Returns `Ok(None)` when more bytes are needed, `Ok(Some(_))` for a
    /// checksum-validated frame (which may still classify as
    /// `Unrecognized`), and `Err(_)` for a corrupt frame that was skipped.
    /// After an error the decoder has already advanced past the bad sync
    /// and can be polled again immediately.
    pub fn next_message(&mut self) -> Result<Option<ParsedMessage>, FrameError> {
        if self.buffer.len() < MIN_FRAME_SIZE {
            return Ok(None);
        }

        // Find sync bytes (0xB5 0x62)
        let Some(sync_idx) = self.buffer.find_pattern_2(SYNC1, SYNC2) else {
            // No sync found; keep the last byte in case it is the first
            // half of a sync pair split across reads
            self.buffer.advance(self.buffer.len() - 1);
            return Ok(None);
        };

        if sync_idx > 0 {
            self.buffer.advance(sync_idx);
        }

        if self.buffer.len() < MIN_FRAME_SIZE {
            return Ok(None);
        }

        let len_lo = self.buffer.get(4).unwrap_or(0);
        let len_hi = self.buffer.get(5).unwrap_or(0);
        let payload_len = u16::from_le_bytes([len_lo, len_hi]) as usize;

        if payload_len > MAX_PAYLOAD_SIZE {
            // Corrupt length field; don't trust it, resync past this marker
            self.buffer.advance(1);
            return Err(FrameError::Oversized {
                len: payload_len,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let total_len = FRAME_OVERHEAD + payload_len;
        if self.buffer.len() < total_len {
            // Wait for the rest of the frame
            return Ok(None);
        }

        // Checksum covers class, id, length and payload
        let expected = {
            let Some(body) = self.buffer.get_slice(2, 4 + payload_len) else {
                self.buffer.advance(1);
                return Err(FrameError::Truncated);
            };
            checksum(body)
        };
        let actual = [
            self.buffer.get(total_len - 2).unwrap_or(0),
            self.buffer.get(total_len - 1).unwrap_or(0),
        ];

        if expected != actual {
            // Only advance past the sync marker; the length field cannot be
            // trusted, so let the next poll resync on a later pattern
            self.buffer.advance(1);
            return Err(FrameError::BadChecksum { expected, actual });
        }

        let class = self.buffer.get(2).unwrap_or(0);
        let id = self.buffer.get(3).unwrap_or(0);
        let message = {
            let Some(payload) = self.buffer.get_slice(6, payload_len) else {
                self.buffer.advance(1);
                return Err(FrameError::Truncated);
            };
            ParsedMessage::from_frame(class, id, payload)
        };

        self.buffer.advance(total_len);
        Ok(Some(message))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
