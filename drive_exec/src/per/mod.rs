//! # Perception module
//!
//! Extracts the geometry of a coloured target, such as the line painted on the floor, from a
//! colour camera frame.
//!
//! Extraction converts the (optionally cropped) frame into HSV, thresholds it with a
//! [`ColorRange`], finds all 8-connected regions of in-range pixels and reports the largest one if
//! it is big enough.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod contour;
mod hsv;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use contour::*;
pub use hsv::*;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Colour of the bounding box drawn by [`annotate`].
const BBOX_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);

/// Colour of the centroid marker drawn by [`annotate`].
const CENTROID_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);

/// Half length of the arms of the centroid marker.
///
/// Units: pixels
const CENTROID_MARKER_HALF_LEN: i64 = 4;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The part of the frame searched for the target.
///
/// End bounds are exclusive, `None` extends the region to the edge of the frame. Bounds beyond
/// the frame are clipped to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropRegion {
    pub top_row: u32,
    pub bottom_row: Option<u32>,
    pub left_col: u32,
    pub right_col: Option<u32>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CropRegion {
    /// The whole frame.
    pub const FULL: CropRegion = CropRegion {
        top_row: 0,
        bottom_row: None,
        left_col: 0,
        right_col: None,
    };

    /// Keep all rows from `top_row` to the bottom of the frame.
    pub fn rows_from(top_row: u32) -> Self {
        Self {
            top_row,
            ..Self::FULL
        }
    }

    /// Clip the region to a frame of the given size, returning `(top, left, height, width)`.
    ///
    /// Returns `None` if nothing of the frame remains.
    pub fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let bottom = self.bottom_row.unwrap_or(height).min(height);
        let right = self.right_col.unwrap_or(width).min(width);

        if self.top_row >= bottom || self.left_col >= right {
            return None;
        }

        Some((
            self.top_row,
            self.left_col,
            bottom - self.top_row,
            right - self.left_col,
        ))
    }
}

impl Default for CropRegion {
    /// Floor rows in front of the car for a 240 row frame.
    fn default() -> Self {
        Self::rows_from(180)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the in-range mask for a region of the frame, indexed `[row, col]` relative to the region.
pub fn threshold(
    frame: &RgbImage,
    color_range: &ColorRange,
    crop: &CropRegion,
) -> Option<(Array2<bool>, (usize, usize))> {
    let (top, left, height, width) = crop.clip(frame.width(), frame.height())?;

    let mask = Array2::from_shape_fn((height as usize, width as usize), |(r, c)| {
        let px = frame.get_pixel(left + c as u32, top + r as u32);
        color_range.contains(&rgb_to_hsv(*px))
    });

    Some((mask, (top as usize, left as usize)))
}

/// Find the largest region of the frame whose colour lies inside `color_range`.
///
/// Only the part of the frame inside `crop` is searched, but the returned contour is in full
/// frame coordinates. Returns `None` if the frame or crop is empty, or if the largest region is
/// smaller than `min_area` pixels.
pub fn extract(
    frame: &RgbImage,
    color_range: &ColorRange,
    min_area: usize,
    crop: &CropRegion,
) -> Option<Contour> {
    let (mask, (row_offset, col_offset)) = threshold(frame, color_range, crop)?;

    let contours = find_contours(&mask);

    match largest(&contours) {
        Some(c) if c.area >= min_area => Some(c.offset(row_offset, col_offset)),
        _ => None,
    }
}

/// Draw the contour's bounding box and centroid onto a copy of the frame.
pub fn annotate(frame: &RgbImage, contour: &Contour) -> RgbImage {
    let mut img = frame.clone();
    let bbox = &contour.bbox;

    for col in bbox.min_col..=bbox.max_col {
        put_pixel_checked(&mut img, col as i64, bbox.min_row as i64, BBOX_COLOUR);
        put_pixel_checked(&mut img, col as i64, bbox.max_row as i64, BBOX_COLOUR);
    }
    for row in bbox.min_row..=bbox.max_row {
        put_pixel_checked(&mut img, bbox.min_col as i64, row as i64, BBOX_COLOUR);
        put_pixel_checked(&mut img, bbox.max_col as i64, row as i64, BBOX_COLOUR);
    }

    let cx = contour.centroid_col.round() as i64;
    let cy = contour.centroid_row.round() as i64;
    for d in -CENTROID_MARKER_HALF_LEN..=CENTROID_MARKER_HALF_LEN {
        put_pixel_checked(&mut img, cx + d, cy, CENTROID_COLOUR);
        put_pixel_checked(&mut img, cx, cy + d, CENTROID_COLOUR);
    }

    img
}

fn put_pixel_checked(img: &mut RgbImage, x: i64, y: i64, colour: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, colour);
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    const GREY: Rgb<u8> = Rgb([90, 90, 90]);

    fn blue_range() -> ColorRange {
        ColorRange::new(Hsv::new(100, 150, 150), Hsv::new(130, 255, 255))
    }

    /// Grey frame with a filled blue rectangle covering rows `r0..r1` and cols `c0..c1`.
    fn frame_with_rect(w: u32, h: u32, r0: u32, r1: u32, c0: u32, c1: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            if y >= r0 && y < r1 && x >= c0 && x < c1 {
                BLUE
            } else {
                GREY
            }
        })
    }

    #[test]
    fn test_extract_single_region() {
        let frame = frame_with_rect(320, 240, 200, 220, 100, 140);

        let c = extract(&frame, &blue_range(), 30, &CropRegion::FULL).unwrap();
        assert_eq!(c.area, 20 * 40);
        assert_eq!(c.centroid_row, 209.5);
        assert_eq!(c.centroid_col, 119.5);

        // Cropping keeps full frame coordinates
        let cropped = extract(&frame, &blue_range(), 30, &CropRegion::default()).unwrap();
        assert_eq!(cropped, c);
    }

    #[test]
    fn test_extract_min_area() {
        let frame = frame_with_rect(320, 240, 200, 205, 100, 105);

        assert!(extract(&frame, &blue_range(), 26, &CropRegion::FULL).is_none());
        assert_eq!(
            extract(&frame, &blue_range(), 25, &CropRegion::FULL)
                .unwrap()
                .area,
            25
        );
    }

    #[test]
    fn test_extract_picks_largest() {
        let mut frame = frame_with_rect(320, 240, 190, 200, 10, 20);
        for y in 210..230 {
            for x in 250..280 {
                frame.put_pixel(x, y, BLUE);
            }
        }

        let c = extract(&frame, &blue_range(), 30, &CropRegion::FULL).unwrap();
        assert_eq!(c.area, 600);
        assert_eq!(c.centroid_col, 264.5);
    }

    #[test]
    fn test_extract_empty() {
        let empty = RgbImage::new(0, 0);
        assert!(extract(&empty, &blue_range(), 0, &CropRegion::FULL).is_none());

        // Crop below the bottom of the frame
        let frame = frame_with_rect(320, 100, 0, 100, 0, 320);
        assert!(extract(&frame, &blue_range(), 0, &CropRegion::default()).is_none());

        // No blue at all
        let grey = frame_with_rect(320, 240, 0, 0, 0, 0);
        assert!(extract(&grey, &blue_range(), 0, &CropRegion::FULL).is_none());
    }

    #[test]
    fn test_annotate() {
        let frame = frame_with_rect(64, 64, 10, 20, 10, 30);
        let c = extract(&frame, &blue_range(), 1, &CropRegion::FULL).unwrap();

        let img = annotate(&frame, &c);
        assert_eq!(img.dimensions(), frame.dimensions());
        assert_eq!(*img.get_pixel(10, 10), BBOX_COLOUR);
        assert_eq!(*img.get_pixel(29, 19), BBOX_COLOUR);
        assert_eq!(*img.get_pixel(20, 15), CENTROID_COLOUR);

        // Original untouched
        assert_eq!(*frame.get_pixel(10, 10), BLUE);
    }
}
