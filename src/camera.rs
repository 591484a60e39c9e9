use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use anyhow::{Result, anyhow};
use crossbeam_channel::Sender;
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraIndex, CameraInfo, FrameFormat, RequestedFormat, RequestedFormatType,
    },
};
use rayon::prelude::*;

use crate::error::CaptureError;
use crate::settings::SettingsStore;
use crate::types::Frame;

// Prefer pixel formats that are widely supported on macOS (the built-in
// cameras often reject YUYV even though Nokhwa reports it).
const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
    FrameFormat::MJPEG,
    FrameFormat::NV12,
    FrameFormat::RAWRGB,
    FrameFormat::RAWBGR,
];

fn requested_formats() -> [RequestedFormat<'static>; 4] {
    [
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestFrameRate,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestResolution,
            PREFERRED_PIXEL_FORMATS,
        ),
        // Fall back to any format Nokhwa can decode, but prefer higher FPS
        // so drivers with very low default rates still stream.
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ]
}

#[derive(Clone, Debug)]
pub struct CameraDevice {
    pub index: CameraIndex,
    pub label: String,
}

impl CameraDevice {
    /// Stable key used for the persisted selection.
    pub fn id(&self) -> String {
        self.index.as_string()
    }
}

/// A running capture thread. Stopping is idempotent and also happens on
/// drop, so home/retry/hide can never leak a stream.
#[derive(Debug)]
pub struct CameraStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CameraStream {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn available_cameras() -> Result<Vec<CameraDevice>> {
    let cameras = query(ApiBackend::Auto)?;
    Ok(cameras
        .into_iter()
        .map(|info| CameraDevice {
            index: info.index().clone(),
            label: format_camera_label(&info),
        })
        .collect())
}

fn format_camera_label(info: &CameraInfo) -> String {
    info.human_name()
}

/// Picks the device to open: the requested one if it is still attached,
/// otherwise the persisted one, otherwise the first available device. When
/// the persisted device has disappeared the selection is updated so the
/// fallback sticks across sessions.
pub fn resolve_device(
    devices: &[CameraDevice],
    requested: Option<&str>,
    settings: &SettingsStore,
) -> Result<CameraDevice, CaptureError> {
    if devices.is_empty() {
        return Err(CaptureError::DeviceChange(
            "no capture devices attached".to_string(),
        ));
    }

    let find = |id: &str| devices.iter().find(|device| device.id() == id);

    if let Some(device) = requested.and_then(|id| find(id)) {
        return Ok(device.clone());
    }

    if let Some(saved) = settings.camera_id() {
        if let Some(device) = find(&saved) {
            return Ok(device.clone());
        }
        let fallback = devices[0].clone();
        log::warn!(
            "persisted camera {saved:?} is gone, falling back to {}",
            fallback.label
        );
        settings.set_camera_id(&fallback.id());
        return Ok(fallback);
    }

    Ok(devices[0].clone())
}

fn build_camera(index: CameraIndex) -> Result<Camera> {
    let mut last_err = None;

    for requested in requested_formats() {
        match Camera::new(index.clone(), requested) {
            Ok(mut camera) => match camera.open_stream() {
                Ok(()) => return Ok(camera),
                Err(err) => last_err = Some(err.into()),
            },
            Err(err) => last_err = Some(err.into()),
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("failed to open camera with any supported format")))
}

/// Spawns the capture thread for `device`, feeding decoded RGBA frames into
/// `frame_tx`. Frames are dropped when the consumer is busy; only one
/// stream may exist at a time, so callers stop the previous stream first.
pub fn start_camera_stream(device: &CameraDevice, frame_tx: Sender<Frame>) -> Result<CameraStream> {
    // Fail fast before spawning the capture thread.
    build_camera(device.index.clone())?;

    let index = device.index.clone();
    let label = device.label.clone();
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let mut camera = match build_camera(index) {
            Ok(cam) => cam,
            Err(err) => {
                log::error!("failed to open camera {label}: {err:?}");
                return;
            }
        };

        log::info!("camera stream started on {label}");

        while !stop_flag.load(Ordering::Relaxed) {
            let frame = match camera.frame() {
                Ok(frame) => frame,
                Err(err) => {
                    log::warn!("camera frame read failed: {err:?}");
                    continue;
                }
            };

            let decoded = match frame.decode_image::<RgbFormat>() {
                Ok(img) => img,
                Err(err) => {
                    log::warn!("failed to decode camera frame: {err:?}");
                    continue;
                }
            };

            let (width, height) = decoded.dimensions();
            let rgb = decoded.into_raw();
            if rgb.is_empty() {
                continue;
            }

            // Expand RGB to RGBA so the preprocessor sees one layout.
            let pixel_count = rgb.len() / 3;
            let mut rgba = vec![0u8; pixel_count * 4];
            rgba.par_chunks_mut(4)
                .zip(rgb.par_chunks_exact(3))
                .for_each(|(dst, src)| {
                    dst[0] = src[0];
                    dst[1] = src[1];
                    dst[2] = src[2];
                    dst[3] = 255;
                });

            let frame = Frame {
                rgba,
                width,
                height,
                timestamp: Instant::now(),
            };

            // Drop the frame if the capture loop is still busy with the
            // previous one.
            let _ = frame_tx.try_send(frame);
        }

        log::info!("camera stream stopped on {label}");
    });

    Ok(CameraStream {
        stop,
        handle: Some(handle),
    })
}
