//! Per-channel arithmetic for the blend modes.
//!
//! All functions here are pure and work in raw 0–255 integer space. Products
//! are normalized with round-to-nearest (`(n + 127) / 255`); truncating
//! instead darkens every multiply-family result by up to one step.

/// `round(a * b / 255)` for a product that fits in `u32`.
#[inline]
pub fn mul_div255(a: u32, b: u32) -> u32 {
    (a * b + 127) / 255
}

#[inline]
pub fn add(base: u8, over: u8) -> u8 {
    base.saturating_add(over)
}

/// Base minus overlay, floored at zero.
#[inline]
pub fn subtract(base: u8, over: u8) -> u8 {
    base.saturating_sub(over)
}

#[inline]
pub fn multiply(base: u8, over: u8) -> u8 {
    mul_div255(u32::from(base), u32::from(over)) as u8
}

#[inline]
pub fn screen(base: u8, over: u8) -> u8 {
    255 - multiply(255 - base, 255 - over)
}

/// Multiply for dark bases, screen for light ones. The split is `base < 128`.
#[inline]
pub fn overlay(base: u8, over: u8) -> u8 {
    if base < 128 {
        mul_div255(2 * u32::from(base), u32::from(over)) as u8
    } else {
        let inv = mul_div255(2 * u32::from(255 - base), u32::from(255 - over));
        (255 - inv) as u8
    }
}

/// `clamp(value + delta, 0, 255)`.
#[inline]
pub fn offset(value: u8, delta: i32) -> u8 {
    (i32::from(value).saturating_add(delta)).clamp(0, 255) as u8
}

/// `clamp(round(value * factor), 0, 255)` for a finite, non-negative factor.
#[inline]
pub fn scale(value: u8, factor: f32) -> u8 {
    (f32::from(value) * factor).round().clamp(0.0, 255.0) as u8
}

/// Rec. 601 luma of a BGR pixel, rounded to nearest.
#[inline]
pub fn luma(bgr: [u8; 3]) -> u8 {
    let [b, g, r] = bgr.map(f32::from);
    (0.114 * b + 0.587 * g + 0.299 * r).round().clamp(0.0, 255.0) as u8
}
