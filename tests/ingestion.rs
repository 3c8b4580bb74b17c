//! End-to-end pipeline tests over mock transport and sink
//!
//! These exercise the full producer/consumer path: frames injected into the
//! mock serial channel come out of the telemetry sink as typed packets, in
//! order, with the health policy flushing at the documented thresholds.

use disha_gnss::config::TelemetryManifest;
use disha_gnss::pipeline::{Dispatcher, IngestionPipeline};
use disha_gnss::telemetry::{MockSink, PacketValues, TelemetryPacket};
use disha_gnss::transport::MockTransport;
use disha_gnss::ubx::{encode_frame, CLASS_NAV, ID_NAV_PVT, ID_NAV_RELPOSNED, ID_NAV_SAT};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

fn wait_until<F: Fn() -> bool>(what: &str, cond: F) {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while !cond() {
        if Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        thread::sleep(Duration::from_millis(5));
    }
}

fn nav_pvt_frame(lat_1e7: i32, lon_1e7: i32, hacc_mm: u32, vacc_mm: u32) -> Vec<u8> {
    let mut p = vec![0u8; 92];
    p[0..4].copy_from_slice(&1000u32.to_le_bytes()); // iTOW
    p[20] = 3; // 3D fix
    p[21] = 0x02; // diffSoln
    p[24..28].copy_from_slice(&lon_1e7.to_le_bytes());
    p[28..32].copy_from_slice(&lat_1e7.to_le_bytes());
    p[36..40].copy_from_slice(&12345i32.to_le_bytes()); // hMSL
    p[40..44].copy_from_slice(&hacc_mm.to_le_bytes());
    p[44..48].copy_from_slice(&vacc_mm.to_le_bytes());
    encode_frame(CLASS_NAV, ID_NAV_PVT, &p)
}

fn nav_relposned_frame(heading_1e5: i32, heading_acc_1e5: u32) -> Vec<u8> {
    let mut p = vec![0u8; 64];
    p[0] = 0x01; // version
    p[24..28].copy_from_slice(&heading_1e5.to_le_bytes());
    p[52..56].copy_from_slice(&heading_acc_1e5.to_le_bytes());
    encode_frame(CLASS_NAV, ID_NAV_RELPOSNED, &p)
}

fn nav_sat_frame(num_svs: u8) -> Vec<u8> {
    let mut p = vec![0u8; 8];
    p[0..4].copy_from_slice(&777_000u32.to_le_bytes());
    p[4] = 0x01; // version
    p[5] = num_svs;
    encode_frame(CLASS_NAV, ID_NAV_SAT, &p)
}

struct Harness {
    transport: MockTransport,
    sink: MockSink,
    stop: Arc<AtomicBool>,
    consumer: thread::JoinHandle<()>,
}

impl Harness {
    fn start(transport: MockTransport) -> Self {
        let sink = MockSink::new();
        let stop = Arc::new(AtomicBool::new(false));
        let dispatcher = Dispatcher::new(sink.clone(), TelemetryManifest::default(), false);
        let pipeline =
            IngestionPipeline::start(transport.clone(), dispatcher, Arc::clone(&stop)).unwrap();

        let consumer = thread::spawn(move || {
            let (_dispatcher, _status) = pipeline.run();
        });

        Self {
            transport,
            sink,
            stop,
            consumer,
        }
    }

    fn shutdown(self) -> Vec<TelemetryPacket> {
        self.stop.store(true, Ordering::Relaxed);
        self.consumer.join().unwrap();
        self.sink.sent()
    }
}

fn assert_floats(packet: &TelemetryPacket, data_id: u16, expected: &[f32]) {
    assert_eq!(packet.data_id, data_id);
    let PacketValues::Float(values) = &packet.values else {
        panic!("expected float packet for data_id {}", data_id);
    };
    assert_eq!(values.len(), expected.len());
    for (got, want) in values.iter().zip(expected) {
        assert!(
            (got - want).abs() < 1e-4,
            "data_id {}: got {:?}, want {:?}",
            data_id,
            values,
            expected
        );
    }
}

/// Six valid frames covering all three kinds: telemetry comes out in decode
/// order with converted fields, and the low-water rule fires exactly one
/// flush once every kind has been dispatched twice.
#[test]
fn scenario_six_frames_low_water_flush() {
    let ids = TelemetryManifest::default();
    let transport = MockTransport::new();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&nav_pvt_frame(378_418_100, -921_812_300, 1500, 2500));
    bytes.extend_from_slice(&nav_pvt_frame(378_418_200, -921_812_400, 1500, 2500));
    bytes.extend_from_slice(&nav_relposned_frame(4_500_000, 80_000)); // 45 deg, 0.8 deg
    bytes.extend_from_slice(&nav_relposned_frame(4_600_000, 80_000));
    bytes.extend_from_slice(&nav_sat_frame(17));
    bytes.extend_from_slice(&nav_sat_frame(18));
    transport.inject_read(&bytes);

    let harness = Harness::start(transport.clone());
    wait_until("all telemetry dispatched", || harness.sink.sent().len() >= 12);
    wait_until("low-water flush", || transport.flush_count() >= 1);
    let sent = harness.shutdown();

    assert_eq!(transport.flush_count(), 1);
    assert_eq!(sent.len(), 12);

    // Fix packets
    assert_floats(&sent[0], ids.gps_lat_lon, &[37.84181, -92.18123]);
    assert_floats(&sent[1], ids.gps_lat_lon, &[37.84182, -92.18124]);

    // First heading: compass + orientation, then the accuracy packet
    // unlocks (all three accuracy inputs now observed)
    assert_floats(&sent[2], ids.compass_data, &[-45.0]);
    assert_floats(&sent[3], ids.imu_data, &[0.0, 0.0, -45.0]);
    assert_floats(&sent[4], ids.accuracy_data, &[1.5, 2.5, 0.8]);

    assert_floats(&sent[5], ids.compass_data, &[-46.0]);
    assert_floats(&sent[6], ids.imu_data, &[0.0, 0.0, -46.0]);
    assert_floats(&sent[7], ids.accuracy_data, &[1.5, 2.5, 0.8]);

    // Satellite counts, each followed by the accuracy packet
    assert_eq!(sent[8].data_id, ids.satellite_count);
    assert_eq!(sent[8].values, PacketValues::Short(vec![17]));
    assert_floats(&sent[9], ids.accuracy_data, &[1.5, 2.5, 0.8]);
    assert_eq!(sent[10].values, PacketValues::Short(vec![18]));
    assert_floats(&sent[11], ids.accuracy_data, &[1.5, 2.5, 0.8]);
}

/// One kind running away (11 satellite messages, others at zero) triggers
/// exactly one backlog flush.
#[test]
fn high_water_flush_on_runaway_kind() {
    let transport = MockTransport::new();
    let mut bytes = Vec::new();
    for i in 0..11 {
        bytes.extend_from_slice(&nav_sat_frame(10 + i));
    }
    transport.inject_read(&bytes);

    let harness = Harness::start(transport.clone());
    wait_until("all satellite packets", || harness.sink.sent().len() >= 11);
    wait_until("backlog flush", || transport.flush_count() >= 1);
    let sent = harness.shutdown();

    assert_eq!(transport.flush_count(), 1);
    assert!(sent
        .iter()
        .all(|p| p.data_id == TelemetryManifest::default().satellite_count));
}

/// A frame with a mutated checksum never surfaces as telemetry; it is
/// classified unrecognized and triggers an immediate flush, while the valid
/// frame behind it still gets through.
#[test]
fn corrupt_frame_flushes_and_is_dropped() {
    let transport = MockTransport::new();

    let mut corrupt = nav_sat_frame(9);
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0xFF;

    let mut bytes = corrupt;
    bytes.extend_from_slice(&nav_sat_frame(12));
    transport.inject_read(&bytes);

    let harness = Harness::start(transport.clone());
    wait_until("valid frame dispatched", || harness.sink.sent().len() >= 1);
    wait_until("corrupt-frame flush", || transport.flush_count() >= 1);
    let sent = harness.shutdown();

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].values, PacketValues::Short(vec![12]));
}

/// No accuracy packet before all three accuracy inputs have been observed.
#[test]
fn accuracy_packet_gated_on_heading() {
    let ids = TelemetryManifest::default();
    let transport = MockTransport::new();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&nav_sat_frame(11));
    bytes.extend_from_slice(&nav_pvt_frame(378_418_100, -921_812_300, 1000, 2000));
    bytes.extend_from_slice(&nav_sat_frame(12));
    transport.inject_read(&bytes);

    let harness = Harness::start(transport.clone());
    wait_until("three packets", || harness.sink.sent().len() == 3);
    assert!(harness
        .sink
        .sent()
        .iter()
        .all(|p| p.data_id != ids.accuracy_data));

    // Heading accuracy completes the set; the very next dispatch emits it
    harness.transport.inject_read(&nav_relposned_frame(1_000_000, 50_000));
    wait_until("accuracy packet", || {
        harness
            .sink
            .sent()
            .last()
            .is_some_and(|p| p.data_id == ids.accuracy_data)
    });
    harness.shutdown();
}

/// Asserting the stop signal terminates both threads promptly, and messages
/// already queued are dispatched before the consumer exits.
#[test]
fn shutdown_drains_queue_within_poll_interval() {
    let transport = MockTransport::new();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&nav_sat_frame(5));
    bytes.extend_from_slice(&nav_sat_frame(6));
    transport.inject_read(&bytes);

    let sink = MockSink::new();
    let stop = Arc::new(AtomicBool::new(false));
    let dispatcher = Dispatcher::new(sink.clone(), TelemetryManifest::default(), false);
    let pipeline =
        IngestionPipeline::start(transport.clone(), dispatcher, Arc::clone(&stop)).unwrap();

    // Let the reader pull everything into the queue, then stop before
    // running the consumer at all
    wait_until("reader consumed input", || transport.pending() == 0);
    thread::sleep(Duration::from_millis(20));
    stop.store(true, Ordering::Relaxed);

    let started = Instant::now();
    let (_dispatcher, status) = pipeline.run();
    status.unwrap();
    let elapsed = started.elapsed();

    assert!(
        elapsed < Duration::from_millis(500),
        "shutdown took {:?}",
        elapsed
    );
    assert_eq!(sink.sent().len(), 2, "queued messages must drain on exit");
}

/// A channel I/O failure is fatal: the reader stops, takes the consumer
/// down with it, and the failure surfaces in the pipeline's terminal
/// status.
#[test]
fn channel_error_terminates_pipeline() {
    let transport = MockTransport::new();
    transport.fail_reads();

    let sink = MockSink::new();
    let stop = Arc::new(AtomicBool::new(false));
    let dispatcher = Dispatcher::new(sink.clone(), TelemetryManifest::default(), false);
    let pipeline = IngestionPipeline::start(transport, dispatcher, Arc::clone(&stop)).unwrap();

    let started = Instant::now();
    let (_dispatcher, status) = pipeline.run();

    assert!(status.is_err(), "channel failure must surface at join");
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(sink.sent().is_empty());
}
