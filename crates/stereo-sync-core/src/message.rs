//! Camera message types exchanged with the synchronizer.
//!
//! [`Image`] is the frame payload and [`CameraInfo`] carries the
//! calibration that belongs to it. Both own their buffers, so storing
//! them in a slot never aliases data held by the sender.

use crate::types::{Header, Stamped};

/// An uncompressed image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    pub header: Header,

    /// Number of rows.
    pub height: u32,

    /// Number of columns.
    pub width: u32,

    /// Pixel encoding, e.g. `mono8` or `rgb8`.
    pub encoding: String,

    pub is_bigendian: bool,

    /// Full row length in bytes.
    pub step: u32,

    /// Pixel data, `step * height` bytes.
    pub data: Vec<u8>,
}

impl Image {
    /// Create an image with a tightly packed row layout.
    pub fn new(
        header: Header,
        width: u32,
        height: u32,
        encoding: impl Into<String>,
        bytes_per_pixel: u32,
        data: Vec<u8>,
    ) -> Self {
        Self {
            header,
            height,
            width,
            encoding: encoding.into(),
            is_bigendian: false,
            step: width * bytes_per_pixel,
            data,
        }
    }
}

impl Stamped for Image {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }
}

/// A sub-window of the full camera resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionOfInterest {
    pub x_offset: u32,
    pub y_offset: u32,
    pub height: u32,
    pub width: u32,
    pub do_rectify: bool,
}

/// Calibration and acquisition parameters of a camera.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraInfo {
    pub header: Header,
    pub height: u32,
    pub width: u32,

    /// Name of the distortion model, e.g. `plumb_bob`.
    pub distortion_model: String,

    /// Distortion coefficients. The length depends on the model.
    pub d: Vec<f64>,

    /// Intrinsic camera matrix, row-major 3x3.
    pub k: [f64; 9],

    /// Rectification matrix, row-major 3x3.
    pub r: [f64; 9],

    /// Projection matrix, row-major 3x4.
    pub p: [f64; 12],

    pub binning_x: u32,
    pub binning_y: u32,
    pub roi: RegionOfInterest,
}

impl CameraInfo {
    pub fn new(header: Header, width: u32, height: u32) -> Self {
        Self {
            header,
            height,
            width,
            ..Default::default()
        }
    }

    /// Set the distortion model and its coefficients.
    pub fn with_distortion(mut self, model: impl Into<String>, d: Vec<f64>) -> Self {
        self.distortion_model = model.into();
        self.d = d;
        self
    }
}

impl Stamped for CameraInfo {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }
}

/// Reports the length of the variable-sized part of a message.
///
/// The synchronizer logs when a slot receives a message whose length
/// differs from the one it replaces.
pub trait PayloadLen {
    fn payload_len(&self) -> usize;
}

impl PayloadLen for Image {
    fn payload_len(&self) -> usize {
        self.data.len()
    }
}

impl PayloadLen for CameraInfo {
    fn payload_len(&self) -> usize {
        self.d.len()
    }
}
