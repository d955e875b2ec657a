use super::device::{CameraDevice, CaptureConstraints, MediaDevices, MediaStream};
use crate::error::CameraError;
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use tracing::{debug, info, warn};

const PULL_TIMEOUT_SECONDS: u64 = 2;

/// V4L2 cameras through GStreamer
pub struct GstMediaDevices;

impl GstMediaDevices {
    pub fn new() -> Result<Self, CameraError> {
        gstreamer::init().map_err(|e| {
            CameraError::DeviceUnavailable(format!("Failed to initialize GStreamer: {}", e))
        })?;
        Ok(Self)
    }

    fn build_pipeline_string(constraints: &CaptureConstraints) -> String {
        let source = match &constraints.device_id {
            Some(device) => format!("v4l2src device={}", device),
            None => "v4l2src".to_string(),
        };

        format!(
            "{} ! videoconvert ! videoscale ! \
             video/x-raw,width={},height={} ! \
             jpegenc ! \
             appsink name=sink sync=false max-buffers=1 drop=true",
            source, constraints.target_width, constraints.target_height
        )
    }
}

#[async_trait]
impl MediaDevices for GstMediaDevices {
    async fn enumerate_video_devices(&self) -> Result<Vec<CameraDevice>, CameraError> {
        tokio::task::spawn_blocking(|| {
            let monitor = gstreamer::DeviceMonitor::new();
            monitor.add_filter(Some("Video/Source"), None);
            monitor
                .start()
                .map_err(|e| CameraError::Enumeration(e.to_string()))?;

            let devices = monitor
                .devices()
                .into_iter()
                .filter_map(|device| {
                    let label = device.display_name().to_string();
                    let path = device.properties().and_then(|props| {
                        props
                            .get::<String>("api.v4l2.path")
                            .or_else(|_| props.get::<String>("device.path"))
                            .ok()
                    });
                    path.map(|id| CameraDevice::new(id, label))
                })
                .collect::<Vec<_>>();

            monitor.stop();
            Ok(devices)
        })
        .await
        .map_err(|e| CameraError::Enumeration(e.to_string()))?
    }

    async fn open_stream(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        let description = Self::build_pipeline_string(constraints);
        info!("Creating GStreamer pipeline: {}", description);

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| CameraError::DeviceUnavailable(format!("Failed to create pipeline: {}", e)))?
            .downcast::<Pipeline>()
            .map_err(|_| CameraError::DeviceUnavailable("Failed to downcast to Pipeline".into()))?;

        let appsink = pipeline
            .by_name("sink")
            .and_then(|element| element.downcast::<AppSink>().ok())
            .ok_or_else(|| CameraError::DeviceUnavailable("Pipeline has no appsink".into()))?;

        pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
            CameraError::PermissionDenied(format!("Failed to start camera pipeline: {}", e))
        })?;

        Ok(Box::new(GstStream { pipeline, appsink }))
    }
}

struct GstStream {
    pipeline: Pipeline,
    appsink: AppSink,
}

#[async_trait]
impl MediaStream for GstStream {
    async fn capture_frame(&mut self) -> Option<Vec<u8>> {
        let appsink = self.appsink.clone();

        let result = tokio::task::spawn_blocking(move || {
            let sample = appsink
                .try_pull_sample(gstreamer::ClockTime::from_seconds(PULL_TIMEOUT_SECONDS))?;
            let buffer = sample.buffer()?;
            let map = buffer.map_readable().ok()?;
            Some(map.as_slice().to_vec())
        })
        .await;

        match result {
            Ok(frame) => {
                if frame.is_none() {
                    debug!("No sample available from appsink");
                }
                frame
            }
            Err(e) => {
                warn!("Frame pull task failed: {}", e);
                None
            }
        }
    }
}

impl Drop for GstStream {
    fn drop(&mut self) {
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!("Failed to stop camera pipeline: {}", e);
        }
    }
}
