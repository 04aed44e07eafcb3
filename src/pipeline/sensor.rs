use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use anyhow::Result;
use crossbeam_channel::Sender;

use super::compositor::{CompositedFrame, FrameCompositor};
use super::synthetic::SyntheticSensor;
use crate::{
    error::SensorError,
    types::{ColorImage, ColorPoint, FrameSet, Resolution, SkeletonPoint},
};

pub const COLOR_RESOLUTION: Resolution = Resolution::new(640, 480);
pub const DEPTH_RESOLUTION: Resolution = Resolution::new(320, 240);

/// Geometric calibration between the depth camera, the color camera and
/// skeleton space.
pub trait CoordinateMapper: Sync {
    /// Maps a depth pixel and its raw value to color pixel coordinates at
    /// `target`. The result may fall outside the color image.
    fn map_depth_to_color(&self, x: i32, y: i32, raw_depth: u16, target: Resolution) -> ColorPoint;

    fn map_skeleton_point_to_color(&self, point: SkeletonPoint, target: Resolution) -> ColorPoint;
}

pub trait SensorSource {
    /// Blocks until the sensor has the next set of frames ready.
    fn next_frame_set(&mut self) -> Result<FrameSet>;

    fn mapper(&self) -> &dyn CoordinateMapper;
}

#[derive(Clone, Debug)]
pub enum SensorKind {
    Synthetic,
}

#[derive(Clone, Debug)]
pub struct SensorDevice {
    pub kind: SensorKind,
    pub label: String,
}

impl SensorDevice {
    pub fn synthetic() -> Self {
        Self {
            kind: SensorKind::Synthetic,
            label: "合成深度传感器 (演示)".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct SensorStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SensorStream {
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SensorStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn available_sensors() -> Result<Vec<SensorDevice>, SensorError> {
    #[allow(unused_mut)]
    let mut devices = Vec::new();

    #[cfg(feature = "demo-sensor")]
    devices.push(SensorDevice::synthetic());

    require_any(devices)
}

fn require_any(devices: Vec<SensorDevice>) -> Result<Vec<SensorDevice>, SensorError> {
    if devices.is_empty() {
        return Err(SensorError::NoSensor);
    }
    Ok(devices)
}

pub fn open_sensor(device: &SensorDevice) -> Box<dyn SensorSource> {
    match &device.kind {
        SensorKind::Synthetic => Box::new(SyntheticSensor::new()),
    }
}

pub fn start_sensor_stream(
    device: SensorDevice,
    background: Arc<ColorImage>,
    frame_tx: Sender<CompositedFrame>,
) -> Result<SensorStream, SensorError> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::Builder::new()
        .name("sensor-worker".to_string())
        .spawn(move || {
            let mut source = open_sensor(&device);
            log::info!("sensor stream started: {}", device.label);

            let mut compositor = FrameCompositor::new(background);
            while !stop_flag.load(Ordering::Relaxed) {
                let frames = match source.next_frame_set() {
                    Ok(frames) => frames,
                    Err(err) => {
                        log::warn!("sensor frame read failed: {err:?}");
                        continue;
                    }
                };

                let composited = compositor.process(frames, source.mapper());

                // The UI only keeps the newest snapshot; drop when it is behind.
                let _ = frame_tx.try_send(composited);
            }

            log::info!("sensor stream stopped: {}", device.label);
        })
        .map_err(|err| SensorError::Init(format!("failed to spawn sensor worker: {err}")))?;

    Ok(SensorStream {
        stop,
        handle: Some(handle),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossbeam_channel::{TryRecvError, bounded};

    use super::*;
    use crate::types::WHITE;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    fn background() -> Arc<ColorImage> {
        Arc::new(ColorImage::filled(
            DEPTH_RESOLUTION.width,
            DEPTH_RESOLUTION.height,
            WHITE,
        ))
    }

    fn drain_until_disconnected(rx: &crossbeam_channel::Receiver<CompositedFrame>) {
        while rx.try_recv().is_ok() {}
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[test]
    fn empty_device_list_is_no_sensor() {
        assert!(matches!(require_any(Vec::new()), Err(SensorError::NoSensor)));
        let devices = require_any(vec![SensorDevice::synthetic()]).unwrap();
        assert_eq!(devices.len(), 1);
    }

    #[cfg(feature = "demo-sensor")]
    #[test]
    fn demo_build_lists_the_synthetic_sensor() {
        let devices = available_sensors().unwrap();
        assert!(matches!(devices[0].kind, SensorKind::Synthetic));
    }

    #[test]
    fn worker_delivers_snapshots_and_joins_on_stop() {
        let (tx, rx) = bounded(1);
        let stream = start_sensor_stream(SensorDevice::synthetic(), background(), tx).unwrap();

        let frame = rx.recv_timeout(RECV_TIMEOUT).unwrap();
        assert_eq!(frame.active_player, 2);
        assert!(frame.overlay.is_some());
        assert!(frame.video.is_some());

        stream.stop();
        // The worker owns the only sender, so it is gone once the thread joined.
        drain_until_disconnected(&rx);
    }

    #[test]
    fn slow_consumer_never_blocks_the_worker() {
        let (tx, rx) = bounded(1);
        let stream = start_sensor_stream(SensorDevice::synthetic(), background(), tx).unwrap();

        thread::sleep(Duration::from_millis(300));
        assert!(rx.len() <= 1);

        let first = rx.recv_timeout(RECV_TIMEOUT).unwrap();
        let next = rx.recv_timeout(RECV_TIMEOUT).unwrap();
        assert!(next.sequence > first.sequence + 1);

        drop(stream);
        drain_until_disconnected(&rx);
    }
}
