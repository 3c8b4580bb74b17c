//! Geodetic helpers
//!
//! Forward UTM projection of WGS84 coordinates. Used only to enrich log
//! lines with metric positions; telemetry forwarding never depends on it.

/// WGS84 equatorial radius (m)
const R: f64 = 6_378_137.0;
/// UTM scale factor at the central meridian
const K0: f64 = 0.9996;
/// WGS84 first eccentricity squared
const E: f64 = 0.006_694_38;
/// Second eccentricity squared, e² / (1 - e²)
const E_P2: f64 = E / (1.0 - E);

// Meridian arc series coefficients
const M1: f64 = 1.0 - E / 4.0 - 3.0 * E * E / 64.0 - 5.0 * E * E * E / 256.0;
const M2: f64 = 3.0 * E / 8.0 + 3.0 * E * E / 32.0 + 45.0 * E * E * E / 1024.0;
const M3: f64 = 15.0 * E * E / 256.0 + 45.0 * E * E * E / 1024.0;
const M4: f64 = 35.0 * E * E * E / 3072.0;

/// Latitude bands C..X, 8 degrees each, from 80S northward
const ZONE_LETTERS: &[u8] = b"CDEFGHJKLMNPQRSTUVWXX";

/// Metric position in a UTM zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmCoordinate {
    pub easting_m: f64,
    pub northing_m: f64,
    pub zone_number: u8,
    pub zone_letter: char,
}

impl std::fmt::Display for UtmCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.2}, {:.2}, {}{})",
            self.easting_m, self.northing_m, self.zone_number, self.zone_letter
        )
    }
}

/// Project WGS84 latitude/longitude (degrees) onto the UTM grid
///
/// Returns `None` outside the UTM latitude range (80S..84N).
pub fn utm_from_latlon(lat_deg: f64, lon_deg: f64) -> Option<UtmCoordinate> {
    if !(-80.0..=84.0).contains(&lat_deg) || !(-180.0..=180.0).contains(&lon_deg) {
        return None;
    }

    let zone_number = zone_number(lat_deg, lon_deg);
    let zone_letter = ZONE_LETTERS[((lat_deg + 80.0) as usize) >> 3] as char;

    let lat = lat_deg.to_radians();
    let lat_sin = lat.sin();
    let lat_cos = lat.cos();
    let lat_tan = lat_sin / lat_cos;
    let lat_tan2 = lat_tan * lat_tan;
    let lat_tan4 = lat_tan2 * lat_tan2;

    let central_lon = f64::from(zone_number - 1) * 6.0 - 180.0 + 3.0;
    let n = R / (1.0 - E * lat_sin * lat_sin).sqrt();
    let c = E_P2 * lat_cos * lat_cos;
    let a = lat_cos * (lon_deg - central_lon).to_radians();
    let a2 = a * a;
    let a3 = a2 * a;
    let a4 = a3 * a;
    let a5 = a4 * a;
    let a6 = a5 * a;

    let m = R
        * (M1 * lat - M2 * (2.0 * lat).sin() + M3 * (4.0 * lat).sin() - M4 * (6.0 * lat).sin());

    let easting_m = K0
        * n
        * (a + a3 / 6.0 * (1.0 - lat_tan2 + c)
            + a5 / 120.0 * (5.0 - 18.0 * lat_tan2 + lat_tan4 + 72.0 * c - 58.0 * E_P2))
        + 500_000.0;

    let mut northing_m = K0
        * (m + n
            * lat_tan
            * (a2 / 2.0
                + a4 / 24.0 * (5.0 - lat_tan2 + 9.0 * c + 4.0 * c * c)
                + a6 / 720.0 * (61.0 - 58.0 * lat_tan2 + lat_tan4 + 600.0 * c - 330.0 * E_P2)));
    if lat_deg < 0.0 {
        northing_m += 10_000_000.0;
    }

    Some(UtmCoordinate {
        easting_m,
        northing_m,
        zone_number,
        zone_letter,
    })
}

/// Longitude zone with the Norway and Svalbard exceptions
fn zone_number(lat_deg: f64, lon_deg: f64) -> u8 {
    if (56.0..64.0).contains(&lat_deg) && (3.0..12.0).contains(&lon_deg) {
        return 32;
    }

    if (72.0..=84.0).contains(&lat_deg) && lon_deg >= 0.0 {
        if lon_deg < 9.0 {
            return 31;
        } else if lon_deg < 21.0 {
            return 33;
        } else if lon_deg < 33.0 {
            return 35;
        } else if lon_deg < 42.0 {
            return 37;
        }
    }

    (((lon_deg + 180.0) / 6.0) as u8 + 1).min(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_projection() {
        let utm = utm_from_latlon(51.2, 7.5).unwrap();
        assert_eq!(utm.zone_number, 32);
        assert_eq!(utm.zone_letter, 'U');
        assert!((utm.easting_m - 395_201.31).abs() < 0.05);
        assert!((utm.northing_m - 5_673_135.24).abs() < 0.05);
    }

    #[test]
    fn test_southern_hemisphere_offset() {
        let utm = utm_from_latlon(-33.9, 18.4).unwrap();
        assert_eq!(utm.zone_number, 34);
        assert_eq!(utm.zone_letter, 'H');
        assert!(utm.northing_m > 6_000_000.0);
    }

    #[test]
    fn test_norway_exception() {
        assert_eq!(utm_from_latlon(60.0, 5.0).unwrap().zone_number, 32);
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(utm_from_latlon(89.0, 0.0), None);
        assert_eq!(utm_from_latlon(0.0, 181.0), None);
    }
}
