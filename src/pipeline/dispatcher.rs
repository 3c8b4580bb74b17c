//! Message dispatch: projecting decoded navigation messages onto the
//! telemetry bus
//!
//! Runs entirely on the consumer thread. Each message kind maps to fixed
//! bus packets; one derived packet (combined accuracy) spans kinds and is
//! gated on having seen every accuracy input at least once.

use super::health::TrackedKind;
use crate::config::TelemetryManifest;
use crate::error::Result;
use crate::geo;
use crate::telemetry::{TelemetryPacket, TelemetrySink};
use crate::ubx::{NavPvt, NavRelPosNed, NavSat, ParsedMessage};

/// Dispatch lifecycle: nothing special happens before the first fix,
/// afterwards the stream is live until shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    AwaitingFirstFix,
    Streaming,
}

/// Consumer-side projector from `ParsedMessage` to telemetry packets
pub struct Dispatcher<S: TelemetrySink> {
    sink: S,
    manifest: TelemetryManifest,
    state: DispatchState,
    /// Latest observed accuracy inputs; the combined accuracy packet is
    /// eligible once all three are present
    h_acc_mm: Option<u32>,
    v_acc_mm: Option<u32>,
    heading_acc_deg: Option<f64>,
    /// Log a UTM projection of each fix alongside the raw coordinates
    project_fixes: bool,
}

impl<S: TelemetrySink> Dispatcher<S> {
    pub fn new(sink: S, manifest: TelemetryManifest, project_fixes: bool) -> Self {
        Self {
            sink,
            manifest,
            state: DispatchState::AwaitingFirstFix,
            h_acc_mm: None,
            v_acc_mm: None,
            heading_acc_deg: None,
            project_fixes,
        }
    }

    /// Forward one decoded message
    ///
    /// Returns the tracked kind that was dispatched so the caller can feed
    /// the health counters, or `None` for messages that produce no
    /// telemetry (`Unrecognized` is handled by the caller before this).
    pub fn dispatch(&mut self, msg: &ParsedMessage) -> Result<Option<TrackedKind>> {
        let kind = match msg {
            ParsedMessage::NavPvt(pvt) => {
                self.dispatch_pvt(pvt)?;
                TrackedKind::PositionFix
            }
            ParsedMessage::NavRelPosNed(rel) => {
                self.dispatch_relposned(rel)?;
                TrackedKind::RelativePosition
            }
            ParsedMessage::NavSat(sat) => {
                self.dispatch_sat(sat)?;
                TrackedKind::SatelliteInfo
            }
            ParsedMessage::Unrecognized => return Ok(None),
        };

        self.forward_accuracy_if_complete()?;
        Ok(Some(kind))
    }

    fn dispatch_pvt(&mut self, pvt: &NavPvt) -> Result<()> {
        self.sink.send(
            &TelemetryPacket::floats(
                self.manifest.gps_lat_lon,
                vec![pvt.lat_deg as f32, pvt.lon_deg as f32],
            ),
            false,
        )?;

        if self.project_fixes {
            if let Some(utm) = geo::utm_from_latlon(pvt.lat_deg, pvt.lon_deg) {
                log::info!("UTM position: {}", utm);
            }
        }

        log::info!(
            "NAV-PVT: lat = {}, lon = {}, alt = {} m, horizontal_accur = {} m, vertical_accur = {} m, fix_type = {}, diff? = {}",
            pvt.lat_deg,
            pvt.lon_deg,
            pvt.height_msl_m(),
            f64::from(pvt.h_acc_mm) / 1000.0,
            f64::from(pvt.v_acc_mm) / 1000.0,
            pvt.fix_type.label(),
            pvt.diff_soln,
        );

        self.h_acc_mm = Some(pvt.h_acc_mm);
        self.v_acc_mm = Some(pvt.v_acc_mm);
        self.state = DispatchState::Streaming;
        Ok(())
    }

    fn dispatch_relposned(&mut self, rel: &NavRelPosNed) -> Result<()> {
        // Sign convention: the receiver's relative heading is mirrored
        // before transmission
        let heading = -(rel.heading_deg as f32);

        self.sink.send(
            &TelemetryPacket::floats(self.manifest.compass_data, vec![heading]),
            false,
        )?;
        // Orientation packet carries [roll, pitch, yaw]
        self.sink.send(
            &TelemetryPacket::floats(self.manifest.imu_data, vec![0.0, 0.0, heading]),
            false,
        )?;

        log::info!(
            "NAV-RELPOSNED: relative_position_heading = {}, heading_accur = {}, ned = ({:.4}, {:.4}, {:.4}) m",
            rel.heading_deg,
            rel.heading_acc_deg,
            rel.rel_pos_n_m,
            rel.rel_pos_e_m,
            rel.rel_pos_d_m,
        );

        self.heading_acc_deg = Some(rel.heading_acc_deg);
        Ok(())
    }

    fn dispatch_sat(&mut self, sat: &NavSat) -> Result<()> {
        self.sink.send(
            &TelemetryPacket::shorts(self.manifest.satellite_count, vec![sat.num_svs as i16]),
            false,
        )?;

        log::info!(
            "NAV-SAT: gps_time = {} ms, num_sats = {}",
            sat.itow_ms,
            sat.num_svs
        );
        Ok(())
    }

    /// Combined accuracy packet (horizontal m, vertical m, heading deg),
    /// sent after every qualifying dispatch once all inputs are known
    fn forward_accuracy_if_complete(&mut self) -> Result<()> {
        let (Some(h_acc_mm), Some(v_acc_mm), Some(heading_acc_deg)) =
            (self.h_acc_mm, self.v_acc_mm, self.heading_acc_deg)
        else {
            return Ok(());
        };

        self.sink.send(
            &TelemetryPacket::floats(
                self.manifest.accuracy_data,
                vec![
                    h_acc_mm as f32 / 1000.0,
                    v_acc_mm as f32 / 1000.0,
                    heading_acc_deg as f32,
                ],
            ),
            false,
        )?;
        Ok(())
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Hand the sink back to the owner for orderly close
    pub fn into_sink(self) -> S {
        self.sink
    }
}
