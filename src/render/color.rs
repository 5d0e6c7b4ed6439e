//! Colour helpers for garment fills.

/// Packed 8-bit RGB.
pub type Rgb = [u8; 3];

/// Convert HSL (hue in degrees, saturation and lightness in [0, 1]) to RGB.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Rgb {
    let h = hue.rem_euclid(360.0) / 60.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = l - chroma / 2.0;
    [to_u8(r + m), to_u8(g + m), to_u8(b + m)]
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex(s: &str) -> Option<Rgb> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Linear interpolation between two colours, `t` in [0, 1].
pub fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

/// Darker shade used at the hem of a flat-coloured garment.
pub fn shade(c: Rgb, factor: f32) -> Rgb {
    let f = factor.clamp(0.0, 1.0);
    [
        (c[0] as f32 * f).round() as u8,
        (c[1] as f32 * f).round() as u8,
        (c[2] as f32 * f).round() as u8,
    ]
}

/// Alpha-blend `src` over one RGBA pixel in place.
pub fn blend_over(dst: &mut [u8], src: Rgb, alpha: f32) {
    let a = alpha.clamp(0.0, 1.0);
    for (d, s) in dst.iter_mut().take(3).zip(src) {
        *d = (s as f32 * a + *d as f32 * (1.0 - a)).round() as u8;
    }
    if let Some(da) = dst.get_mut(3) {
        *da = (255.0 * a + *da as f32 * (1.0 - a)).round() as u8;
    }
}
