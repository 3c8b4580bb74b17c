//! UBX NAV message catalogue
//!
//! Decodes the payloads of the three NAV-class messages the daemon
//! forwards. Field offsets and scalings follow the u-blox interface
//! description; everything outside the catalogue is `Unrecognized`.

/// NAV message class
pub const CLASS_NAV: u8 = 0x01;
/// NAV-PVT message id
pub const ID_NAV_PVT: u8 = 0x07;
/// NAV-RELPOSNED message id
pub const ID_NAV_RELPOSNED: u8 = 0x3C;
/// NAV-SAT message id
pub const ID_NAV_SAT: u8 = 0x35;

/// NAV-PVT fixed payload length
const NAV_PVT_LEN: usize = 92;
/// NAV-RELPOSNED version 1 payload length
const NAV_RELPOSNED_LEN: usize = 64;
/// NAV-SAT header length (before the per-satellite blocks)
const NAV_SAT_HEADER_LEN: usize = 8;

/// diffSoln bit in the NAV-PVT flags byte
const PVT_FLAG_DIFF_SOLN: u8 = 0x02;

/// Receiver-reported quality of the position solution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FixType {
    NoFix = 0,
    DeadReckoningOnly = 1,
    Fix2D = 2,
    Fix3D = 3,
    GnssDeadReckoningCombined = 4,
    TimeOnly = 5,
}

impl FixType {
    /// Map the raw wire value onto the closed set
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(FixType::NoFix),
            1 => Some(FixType::DeadReckoningOnly),
            2 => Some(FixType::Fix2D),
            3 => Some(FixType::Fix3D),
            4 => Some(FixType::GnssDeadReckoningCombined),
            5 => Some(FixType::TimeOnly),
            _ => None,
        }
    }

    /// Human-readable label for log lines
    pub fn label(self) -> &'static str {
        match self {
            FixType::NoFix => "NO_FIX",
            FixType::DeadReckoningOnly => "DEAD_RECKONING_ONLY",
            FixType::Fix2D => "2D",
            FixType::Fix3D => "3D",
            FixType::GnssDeadReckoningCombined => "GNSS_DEAD_RECKONING_COMBINED",
            FixType::TimeOnly => "TIME_ONLY",
        }
    }
}

/// Position/velocity/time solution (NAV-PVT)
#[derive(Debug, Clone, PartialEq)]
pub struct NavPvt {
    /// GPS time of week (ms)
    pub itow_ms: u32,
    /// Latitude in degrees (wire unit is 1e-7 deg)
    pub lat_deg: f64,
    /// Longitude in degrees (wire unit is 1e-7 deg)
    pub lon_deg: f64,
    /// Height above mean sea level (mm)
    pub height_msl_mm: i32,
    /// Horizontal accuracy estimate (mm)
    pub h_acc_mm: u32,
    /// Vertical accuracy estimate (mm)
    pub v_acc_mm: u32,
    pub fix_type: FixType,
    /// Whether correction data from a reference station was applied
    pub diff_soln: bool,
}

impl NavPvt {
    /// Height above mean sea level in meters
    pub fn height_msl_m(&self) -> f64 {
        f64::from(self.height_msl_mm) / 1000.0
    }
}

/// Relative position of the rover antenna w.r.t. the base (NAV-RELPOSNED)
#[derive(Debug, Clone, PartialEq)]
pub struct NavRelPosNed {
    /// Heading of the baseline in degrees (wire unit is 1e-5 deg)
    pub heading_deg: f64,
    /// Heading accuracy estimate in degrees (wire unit is 1e-5 deg)
    pub heading_acc_deg: f64,
    /// North offset in meters, cm field combined with the 0.1 mm component
    pub rel_pos_n_m: f64,
    /// East offset in meters
    pub rel_pos_e_m: f64,
    /// Down offset in meters
    pub rel_pos_d_m: f64,
}

/// Satellite summary (NAV-SAT header; per-satellite blocks are skipped)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavSat {
    /// GPS time of week (ms)
    pub itow_ms: u32,
    /// Number of satellites used in the solution
    pub num_svs: u16,
}

/// One decoded message from the receiver's catalogue
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedMessage {
    NavPvt(NavPvt),
    NavRelPosNed(NavRelPosNed),
    NavSat(NavSat),
    /// Failed framing/checksum, outside the catalogue, or malformed payload
    Unrecognized,
}

impl ParsedMessage {
    /// Decode a validated frame body into a catalogue message
    ///
    /// The frame has already passed checksum validation; anything that
    /// still fails here (unknown class/id, short or out-of-range payload)
    /// is classified `Unrecognized`, never partially trusted.
    pub fn from_frame(class: u8, id: u8, payload: &[u8]) -> Self {
        match (class, id) {
            (CLASS_NAV, ID_NAV_PVT) => parse_nav_pvt(payload)
                .map(ParsedMessage::NavPvt)
                .unwrap_or(ParsedMessage::Unrecognized),
            (CLASS_NAV, ID_NAV_RELPOSNED) => parse_nav_relposned(payload)
                .map(ParsedMessage::NavRelPosNed)
                .unwrap_or(ParsedMessage::Unrecognized),
            (CLASS_NAV, ID_NAV_SAT) => parse_nav_sat(payload)
                .map(ParsedMessage::NavSat)
                .unwrap_or(ParsedMessage::Unrecognized),
            _ => ParsedMessage::Unrecognized,
        }
    }
}

fn parse_nav_pvt(payload: &[u8]) -> Option<NavPvt> {
    if payload.len() < NAV_PVT_LEN {
        return None;
    }

    let fix_type = FixType::from_raw(payload[20])?;
    let flags = payload[21];

    Some(NavPvt {
        itow_ms: u32_at(payload, 0),
        lon_deg: f64::from(i32_at(payload, 24)) * 1e-7,
        lat_deg: f64::from(i32_at(payload, 28)) * 1e-7,
        height_msl_mm: i32_at(payload, 36),
        h_acc_mm: u32_at(payload, 40),
        v_acc_mm: u32_at(payload, 44),
        fix_type,
        diff_soln: (flags & PVT_FLAG_DIFF_SOLN) != 0,
    })
}

fn parse_nav_relposned(payload: &[u8]) -> Option<NavRelPosNed> {
    // Version 1 of the message; version 0 lacks the heading fields
    if payload.len() < NAV_RELPOSNED_LEN || payload[0] != 0x01 {
        return None;
    }

    // cm-resolution offsets plus the 0.1 mm high-precision components
    let ned = |cm_off: usize, hp_off: usize| {
        f64::from(i32_at(payload, cm_off)) * 1e-2 + f64::from(payload[hp_off] as i8) * 1e-4
    };

    Some(NavRelPosNed {
        heading_deg: f64::from(i32_at(payload, 24)) * 1e-5,
        heading_acc_deg: f64::from(u32_at(payload, 52)) * 1e-5,
        rel_pos_n_m: ned(8, 32),
        rel_pos_e_m: ned(12, 33),
        rel_pos_d_m: ned(16, 34),
    })
}

fn parse_nav_sat(payload: &[u8]) -> Option<NavSat> {
    if payload.len() < NAV_SAT_HEADER_LEN {
        return None;
    }

    Some(NavSat {
        itow_ms: u32_at(payload, 0),
        num_svs: u16::from(payload[5]),
    })
}

#[inline]
fn u32_at(p: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([p[off], p[off + 1], p[off + 2], p[off + 3]])
}

#[inline]
fn i32_at(p: &[u8], off: usize) -> i32 {
    i32::from_le_bytes([p[off], p[off + 1], p[off + 2], p[off + 3]])
}
