use image::RgbaImage;

/// Mean paper color measured in the top-left corner of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundSample {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl BackgroundSample {
    /// Average over a `patch x patch` square, clamped to the image.
    ///
    /// An empty image samples as white paper.
    pub fn from_corner(img: &RgbaImage, patch: u32) -> Self {
        let side_x = patch.min(img.width());
        let side_y = patch.min(img.height());
        let count = side_x as u64 * side_y as u64;
        if count == 0 {
            return Self {
                r: 255.0,
                g: 255.0,
                b: 255.0,
            };
        }

        let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
        for y in 0..side_y {
            for x in 0..side_x {
                let p = img.get_pixel(x, y);
                r += p[0] as u64;
                g += p[1] as u64;
                b += p[2] as u64;
            }
        }

        let n = count as f32;
        Self {
            r: r as f32 / n,
            g: g as f32 / n,
            b: b as f32 / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_mean_of_corner() {
        let mut img = RgbaImage::from_pixel(20, 20, Rgba([200, 200, 200, 255]));
        img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        // Pixel outside the patch does not count.
        img.put_pixel(15, 15, Rgba([0, 0, 0, 255]));

        let sample = BackgroundSample::from_corner(&img, 2);
        assert_eq!(sample.r, 150.0);
        assert_eq!(sample.g, 150.0);
        assert_eq!(sample.b, 150.0);
    }

    #[test]
    fn test_patch_clamped_to_small_image() {
        let img = RgbaImage::from_pixel(3, 1, Rgba([10, 20, 30, 255]));
        let sample = BackgroundSample::from_corner(&img, 12);
        assert_eq!((sample.r, sample.g, sample.b), (10.0, 20.0, 30.0));
    }
}
