// Pixel format normalisation: every raw capture format is converted to
// packed top-down RGBA before it reaches the pipeline.

use crate::camera::types::{Frame, PixelFormat, RawFrame};

/// Normalise a raw frame to RGBA.
///
/// Returns `None` when the buffer is smaller than the declared dimensions
/// require, or when the dimensions are zero.
pub fn normalise(raw: &RawFrame) -> Option<Frame> {
    let width = raw.width as usize;
    let height = raw.height as usize;
    if width == 0 || height == 0 || raw.data.len() < raw.format.buffer_len(width, height) {
        return None;
    }

    let data = match raw.format {
        PixelFormat::Rgba8 => raw.data[..width * height * 4].to_vec(),
        PixelFormat::Rgb24 => rgb_to_rgba(&raw.data, width, height),
        PixelFormat::Bgr24BottomUp => convert_bgr_bottom_up_to_rgba(&raw.data, width, height),
        PixelFormat::Yuy2 => convert_yuy2_to_rgba(&raw.data, width, height),
        PixelFormat::Nv12 => convert_nv12_to_rgba(&raw.data, width, height),
    };
    if data.is_empty() {
        return None;
    }

    Some(Frame {
        data,
        width: raw.width,
        height: raw.height,
        timestamp_us: raw.timestamp_us,
    })
}

/// Expand packed RGB24 to RGBA with an opaque alpha channel.
pub fn rgb_to_rgba(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    let expected = width * height * 3;
    if rgb.len() < expected {
        return Vec::new();
    }
    let mut rgba = Vec::with_capacity(width * height * 4);
    for px in rgb[..expected].chunks_exact(3) {
        rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    rgba
}

/// Convert BGR24 bottom-up data to RGBA top-down.
///
/// Rows are flipped vertically and blue/red channels swapped.
pub fn convert_bgr_bottom_up_to_rgba(bgr: &[u8], width: usize, height: usize) -> Vec<u8> {
    let stride = width * 3;
    let expected = stride * height;
    if bgr.len() < expected {
        return Vec::new();
    }

    let mut rgba = vec![0u8; width * height * 4];
    for y in 0..height {
        let src_row = &bgr[(height - 1 - y) * stride..(height - y) * stride];
        let dst_row = &mut rgba[y * width * 4..(y + 1) * width * 4];
        for x in 0..width {
            dst_row[x * 4] = src_row[x * 3 + 2];
            dst_row[x * 4 + 1] = src_row[x * 3 + 1];
            dst_row[x * 4 + 2] = src_row[x * 3];
            dst_row[x * 4 + 3] = 255;
        }
    }
    rgba
}

/// BT.601 YUV to RGB with fixed-point integer arithmetic (<<8).
fn yuv_to_rgba(y: i32, u: i32, v: i32) -> [u8; 4] {
    [
        ((y * 256 + 359 * v) >> 8).clamp(0, 255) as u8,
        ((y * 256 - 88 * u - 183 * v) >> 8).clamp(0, 255) as u8,
        ((y * 256 + 454 * u) >> 8).clamp(0, 255) as u8,
        255,
    ]
}

/// Convert YUY2 (YUYV) packed data to RGBA.
///
/// YUY2 stores two pixels per 4-byte macro-pixel: [Y0, U, Y1, V].
/// Width must be even.
pub fn convert_yuy2_to_rgba(yuy2: &[u8], width: usize, height: usize) -> Vec<u8> {
    let expected = width * height * 2;
    if yuy2.len() < expected || width == 0 || height == 0 {
        return Vec::new();
    }

    let mut rgba = vec![0u8; width * height * 4];
    for i in 0..(width * height / 2) {
        let y0 = yuy2[i * 4] as i32;
        let u = yuy2[i * 4 + 1] as i32 - 128;
        let y1 = yuy2[i * 4 + 2] as i32;
        let v = yuy2[i * 4 + 3] as i32 - 128;

        let base = i * 8;
        rgba[base..base + 4].copy_from_slice(&yuv_to_rgba(y0, u, v));
        rgba[base + 4..base + 8].copy_from_slice(&yuv_to_rgba(y1, u, v));
    }
    rgba
}

/// Convert NV12 planar data to RGBA.
///
/// Each 2x2 block of pixels shares one interleaved U,V pair; odd widths and
/// heights round the chroma plane up.
pub fn convert_nv12_to_rgba(nv12: &[u8], width: usize, height: usize) -> Vec<u8> {
    let expected = PixelFormat::Nv12.buffer_len(width, height);
    if nv12.len() < expected || width == 0 || height == 0 {
        return Vec::new();
    }
    // Odd widths still carry one full U,V pair for the last column.
    let uv_stride = width.div_ceil(2) * 2;

    let y_plane = &nv12[..width * height];
    let uv_plane = &nv12[width * height..];

    let mut rgba = vec![0u8; width * height * 4];
    for row in 0..height {
        for col in 0..width {
            let y = y_plane[row * width + col] as i32;
            let uv_index = (row / 2) * uv_stride + (col / 2) * 2;
            let (Some(&u), Some(&v)) = (uv_plane.get(uv_index), uv_plane.get(uv_index + 1)) else {
                return Vec::new();
            };

            let base = (row * width + col) * 4;
            rgba[base..base + 4].copy_from_slice(&yuv_to_rgba(y, u as i32 - 128, v as i32 - 128));
        }
    }
    rgba
}
