use super::device::{CameraDevice, CaptureConstraints, MediaDevices, MediaStream};
use crate::error::CameraError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Minimal JPEG payload (SOI, APP0 stub, EOI) handed out by the mock stream
pub const MOCK_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];

#[derive(Debug)]
struct MockState {
    devices: Vec<CameraDevice>,
    enumeration_error: Option<CameraError>,
    grant_error: Option<CameraError>,
    frames: VecDeque<Option<Vec<u8>>>,
    opened: Vec<CaptureConstraints>,
    enumerations: usize,
}

/// Scripted media backend for tests and headless runs
#[derive(Clone)]
pub struct MockMediaDevices {
    state: Arc<Mutex<MockState>>,
}

impl MockMediaDevices {
    /// Create a mock exposing the given devices; every grant succeeds
    pub fn new(devices: Vec<CameraDevice>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                devices,
                enumeration_error: None,
                grant_error: None,
                frames: VecDeque::new(),
                opened: Vec::new(),
                enumerations: 0,
            })),
        }
    }

    /// A mock with `count` devices labelled "Camera 1", "Camera 2", ...
    pub fn with_cameras(count: usize) -> Self {
        Self::new(
            (1..=count)
                .map(|n| CameraDevice::new(format!("cam-{}", n), format!("Camera {}", n)))
                .collect(),
        )
    }

    /// Make every subsequent grant fail with `error`
    pub fn deny_with(&self, error: CameraError) {
        self.state.lock().grant_error = Some(error);
    }

    /// Make every subsequent enumeration fail with `error`
    pub fn fail_enumeration(&self, error: CameraError) {
        self.state.lock().enumeration_error = Some(error);
    }

    pub fn set_devices(&self, devices: Vec<CameraDevice>) {
        let mut state = self.state.lock();
        state.devices = devices;
        state.enumeration_error = None;
    }

    /// Queue the next frame result; `None` simulates an empty read
    pub fn queue_frame(&self, frame: Option<Vec<u8>>) {
        self.state.lock().frames.push_back(frame);
    }

    /// Constraints of every stream opened so far
    pub fn opened_streams(&self) -> Vec<CaptureConstraints> {
        self.state.lock().opened.clone()
    }

    pub fn enumeration_count(&self) -> usize {
        self.state.lock().enumerations
    }
}

#[async_trait]
impl MediaDevices for MockMediaDevices {
    async fn enumerate_video_devices(&self) -> Result<Vec<CameraDevice>, CameraError> {
        let mut state = self.state.lock();
        state.enumerations += 1;

        match &state.enumeration_error {
            Some(error) => Err(error.clone()),
            None => Ok(state.devices.clone()),
        }
    }

    async fn open_stream(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        let mut state = self.state.lock();

        if let Some(error) = &state.grant_error {
            return Err(error.clone());
        }

        debug!("Mock stream opened for {:?}", constraints.device_id);
        state.opened.push(constraints.clone());

        Ok(Box::new(MockStream {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockStream {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl MediaStream for MockStream {
    async fn capture_frame(&mut self) -> Option<Vec<u8>> {
        self.state
            .lock()
            .frames
            .pop_front()
            .unwrap_or_else(|| Some(MOCK_JPEG.to_vec()))
    }
}
