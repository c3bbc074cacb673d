//! # Camera Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use image::{DynamicImage, RgbImage};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A decoded colour camera image.
#[derive(Clone)]
pub struct CamImage {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// The image itself
    pub image: DynamicImage,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CamImage {
    /// Create a new camera image from an RGB buffer, timestamped now.
    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            timestamp: Utc::now(),
            image: DynamicImage::ImageRgb8(image),
        }
    }

    /// Get the image as an 8 bit RGB buffer, converting if the camera produced another layout.
    pub fn to_rgb(&self) -> RgbImage {
        match self.image {
            DynamicImage::ImageRgb8(ref i) => i.clone(),
            ref other => other.to_rgb8(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_to_rgb_converts_layout() {
        let mut rgb = RgbImage::new(4, 3);
        rgb.put_pixel(2, 1, Rgb([10, 200, 30]));

        let cam_image = CamImage::from_rgb(rgb.clone());
        assert_eq!(cam_image.to_rgb(), rgb);

        // A camera producing RGBA is converted down to RGB
        let rgba = CamImage {
            timestamp: cam_image.timestamp,
            image: DynamicImage::ImageRgba8(DynamicImage::ImageRgb8(rgb.clone()).to_rgba8()),
        };
        assert_eq!(rgba.to_rgb(), rgb);
    }
}
