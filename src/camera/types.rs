use serde::Serialize;
use std::fmt;

/// Stable camera identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a new `DeviceId` from a raw string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the inner string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discovered camera device.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDevice {
    pub id: DeviceId,
    pub name: String,
    pub is_connected: bool,
}

/// Pixel layout of a raw frame delivered by a capture stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Packed RGBA, 4 bytes per pixel, top-down.
    Rgba8,
    /// Packed RGB, 3 bytes per pixel, top-down.
    Rgb24,
    /// Packed BGR, 3 bytes per pixel, rows stored bottom-up.
    Bgr24BottomUp,
    /// Packed 4:2:2 YUYV.
    Yuy2,
    /// Planar Y followed by interleaved UV at half resolution.
    Nv12,
}

impl PixelFormat {
    /// Number of bytes a `width` x `height` image occupies in this format.
    pub fn buffer_len(self, width: usize, height: usize) -> usize {
        match self {
            Self::Rgba8 => width * height * 4,
            Self::Rgb24 | Self::Bgr24BottomUp => width * height * 3,
            Self::Yuy2 => width * height * 2,
            Self::Nv12 => width * height + width.div_ceil(2) * 2 * height.div_ceil(2),
        }
    }
}

/// A frame as delivered by a capture stack, before normalisation.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Capture timestamp in microseconds on the source's monotonic clock.
    pub timestamp_us: u64,
}

/// A decoded camera frame: packed RGBA pixels plus a monotonic timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw pixel data (RGBA, row-major, top-down).
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Capture timestamp in microseconds.
    pub timestamp_us: u64,
}

impl Frame {
    /// Create a frame filled with a single RGBA colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4], timestamp_us: u64) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self {
            data,
            width,
            height,
            timestamp_us,
        }
    }

    /// Whether the frame carries no pixels (a device that has not started).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether `data` matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.width as usize * self.height as usize * 4
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    /// Read one RGBA pixel, `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Mutable access to one RGBA pixel, `None` when out of bounds.
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> Option<&mut [u8]> {
        let i = self.offset(x, y)?;
        self.data.get_mut(i..i + 4)
    }
}
