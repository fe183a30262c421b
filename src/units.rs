//! Unit conversion utilities.
//!
//! PresentationML positions and extents are expressed in English Metric Units.
//! 1 EMU = 1/914400 inch = 1/360000 cm.

pub const EMUS_PER_INCH: i64 = 914_400;
pub const EMUS_PER_CM: i64 = 360_000;
pub const EMUS_PER_PT: i64 = 12_700;

/// EMUs for a length in inches.
#[inline]
pub fn inches(value: f64) -> i64 {
    (value * EMUS_PER_INCH as f64) as i64
}

/// EMUs for a length in points (1/72 inch).
#[inline]
pub fn points(value: f64) -> i64 {
    (value * EMUS_PER_PT as f64) as i64
}

/// EMUs for a length in centimeters.
#[inline]
pub fn centimeters(value: f64) -> i64 {
    (value * EMUS_PER_CM as f64) as i64
}

#[inline]
pub fn emu_to_inches(emu: i64) -> f64 {
    emu as f64 / EMUS_PER_INCH as f64
}

/// Font sizes in `a:rPr sz` attributes are hundredths of a point.
#[inline]
pub fn pt_to_centipoints(pt: f64) -> i64 {
    (pt * 100.0).round() as i64
}
