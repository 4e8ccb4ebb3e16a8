//! Pure calculation functions for resize geometry.
//!
//! All functions here are pure and testable without any I/O or images.

/// Source region to take and output size to scale it to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeGeometry {
    pub src_x: u32,
    pub src_y: u32,
    pub src_width: u32,
    pub src_height: u32,
    pub width: u32,
    pub height: u32,
}

/// Scale `current` down to fit within `max` while keeping its aspect ratio.
///
/// A zero bound means "unbounded" on that axis. Never upscales.
///
/// # Examples
/// ```
/// # use attachment_meta::imaging::constrain_dimensions;
/// // 4000x3000 into a 1024 box → 1024x768
/// assert_eq!(constrain_dimensions((4000, 3000), (1024, 1024)), (1024, 768));
///
/// // width-only bound
/// assert_eq!(constrain_dimensions((4000, 3000), (768, 0)), (768, 576));
/// ```
pub fn constrain_dimensions(current: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (cur_w, cur_h) = current;
    let (max_w, max_h) = max;

    let mut ratio: f64 = 1.0;
    if max_w > 0 && cur_w > max_w {
        ratio = ratio.min(max_w as f64 / cur_w as f64);
    }
    if max_h > 0 && cur_h > max_h {
        ratio = ratio.min(max_h as f64 / cur_h as f64);
    }

    let w = ((cur_w as f64 * ratio).round() as u32).max(1);
    let h = ((cur_h as f64 * ratio).round() as u32).max(1);
    (w, h)
}

/// Work out how to produce a `max` sized variant from an `original`.
///
/// - Without `crop`, the whole image is scaled to fit inside the box.
/// - With `crop`, the output is exactly the box (clamped to the original),
///   taken from the centred region with the box's aspect ratio.
///
/// Returns `None` when there is nothing to do: a degenerate original, no
/// bounds at all, or a result that would not be smaller than the original.
pub fn resize_geometry(original: (u32, u32), max: (u32, u32), crop: bool) -> Option<ResizeGeometry> {
    let (orig_w, orig_h) = original;
    let (max_w, max_h) = max;

    if orig_w == 0 || orig_h == 0 || (max_w == 0 && max_h == 0) {
        return None;
    }

    let geometry = if crop {
        let aspect = orig_w as f64 / orig_h as f64;
        let mut new_w = max_w.min(orig_w);
        let mut new_h = max_h.min(orig_h);
        if new_w == 0 {
            new_w = ((new_h as f64 * aspect).round() as u32).max(1);
        }
        if new_h == 0 {
            new_h = ((new_w as f64 / aspect).round() as u32).max(1);
        }

        let scale = (new_w as f64 / orig_w as f64).max(new_h as f64 / orig_h as f64);
        let src_w = ((new_w as f64 / scale).round() as u32).min(orig_w);
        let src_h = ((new_h as f64 / scale).round() as u32).min(orig_h);

        ResizeGeometry {
            src_x: (orig_w - src_w) / 2,
            src_y: (orig_h - src_h) / 2,
            src_width: src_w,
            src_height: src_h,
            width: new_w,
            height: new_h,
        }
    } else {
        let (w, h) = constrain_dimensions(original, max);
        ResizeGeometry {
            src_x: 0,
            src_y: 0,
            src_width: orig_w,
            src_height: orig_h,
            width: w,
            height: h,
        }
    };

    if geometry.width >= orig_w && geometry.height >= orig_h {
        return None;
    }
    Some(geometry)
}
