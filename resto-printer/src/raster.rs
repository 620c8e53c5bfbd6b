//! Monochrome raster images (logos)
//!
//! Images are dithered to 1 bit with Floyd–Steinberg and packed 8 dots per
//! byte, MSB first. Each row is sent as its own `GS v 0` command, which
//! keeps individual commands small for printers with tiny input buffers.

/// Default maximum dot width (58mm heads print 384 dots)
pub const DEFAULT_MAX_DOTS: u32 = 384;

/// A packed 1-bit image ready for printing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    /// `height` rows of `width_bytes()` bytes each; bit set = black dot
    data: Vec<u8>,
}

impl Raster {
    /// Dither an 8-bit grayscale buffer (0 = black, 255 = white)
    ///
    /// `luma` must hold `width * height` samples; missing samples count
    /// as white.
    pub fn from_luma(width: u32, height: u32, luma: &[u8]) -> Self {
        let w = width as usize;
        let h = height as usize;
        let mut work: Vec<f32> = (0..w * h)
            .map(|i| luma.get(i).copied().unwrap_or(255) as f32)
            .collect();

        let width_bytes = w.div_ceil(8);
        let mut data = vec![0u8; width_bytes * h];

        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                let old = work[idx];
                let new = if old < 128.0 { 0.0 } else { 255.0 };
                if new == 0.0 {
                    data[y * width_bytes + x / 8] |= 0x80 >> (x % 8);
                }

                let err = old - new;
                if x + 1 < w {
                    work[idx + 1] += err * 7.0 / 16.0;
                }
                if y + 1 < h {
                    if x > 0 {
                        work[idx + w - 1] += err * 3.0 / 16.0;
                    }
                    work[idx + w] += err * 5.0 / 16.0;
                    if x + 1 < w {
                        work[idx + w + 1] += err * 1.0 / 16.0;
                    }
                }
            }
        }

        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per packed row
    pub fn width_bytes(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Packed row `y`
    pub fn row(&self, y: u32) -> &[u8] {
        let wb = self.width_bytes();
        let start = y as usize * wb;
        &self.data[start..start + wb]
    }

    /// ESC/POS commands: one `GS v 0` (normal mode) per row
    pub fn to_escpos(&self) -> Vec<u8> {
        let wb = self.width_bytes();
        let mut out = Vec::with_capacity((wb + 8) * self.height as usize);
        for y in 0..self.height {
            // GS v 0 m xL xH yL yH
            out.extend_from_slice(&[
                0x1D,
                0x76,
                0x30,
                0x00,
                (wb & 0xFF) as u8,
                ((wb >> 8) & 0xFF) as u8,
                0x01,
                0x00,
            ]);
            out.extend_from_slice(self.row(y));
        }
        out
    }
}

#[cfg(feature = "image")]
mod load {
    use super::Raster;
    use crate::error::PrintResult;
    use image::{DynamicImage, GenericImageView};
    use std::path::Path;
    use tracing::{info, instrument};

    impl Raster {
        /// Resize (keeping aspect ratio) to at most `max_dots` wide and dither
        ///
        /// Transparent pixels are composed over white paper.
        pub fn from_image(img: &DynamicImage, max_dots: u32) -> Self {
            let (w, h) = img.dimensions();
            let resized = if w > max_dots && w > 0 {
                let new_h = ((h as u64 * max_dots as u64) / w as u64).max(1) as u32;
                img.resize_exact(max_dots, new_h, image::imageops::FilterType::Triangle)
            } else {
                img.clone()
            };

            let rgba = resized.to_rgba8();
            let (rw, rh) = rgba.dimensions();
            let luma: Vec<u8> = rgba
                .pixels()
                .map(|p| {
                    let l = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
                    let a = p[3] as f32 / 255.0;
                    (l * a + 255.0 * (1.0 - a)).round().clamp(0.0, 255.0) as u8
                })
                .collect();

            Raster::from_luma(rw, rh, &luma)
        }

        /// Load a logo file
        #[instrument(skip(path), fields(path = %path.as_ref().display()))]
        pub fn load(path: impl AsRef<Path>, max_dots: u32) -> PrintResult<Self> {
            let img = image::open(path.as_ref())?;
            let raster = Raster::from_image(&img, max_dots);
            info!(
                width = raster.width(),
                height = raster.height(),
                "logo rasterized"
            );
            Ok(raster)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_black_and_white() {
        let black = Raster::from_luma(10, 2, &[0u8; 20]);
        assert_eq!(black.width_bytes(), 2);
        assert_eq!(black.row(0), &[0xFF, 0xC0]);

        let white = Raster::from_luma(8, 1, &[255u8; 8]);
        assert_eq!(white.row(0), &[0x00]);
    }

    #[test]
    fn test_mid_gray_dithers_to_half_coverage() {
        let r = Raster::from_luma(16, 16, &[128u8; 256]);
        let black: u32 = (0..16).map(|y| r.row(y).iter().map(|b| b.count_ones()).sum::<u32>()).sum();
        assert!((96..=160).contains(&black), "black dots = {black}");
    }

    #[test]
    fn test_escpos_row_prefix() {
        let r = Raster::from_luma(8, 2, &[0u8; 16]);
        let bytes = r.to_escpos();
        assert_eq!(bytes.len(), 2 * (8 + 1));
        assert_eq!(&bytes[..9], &[0x1D, 0x76, 0x30, 0x00, 0x01, 0x00, 0x01, 0x00, 0xFF]);
    }

    #[cfg(feature = "image")]
    #[test]
    fn test_from_image_limits_width() {
        let img = image::DynamicImage::new_rgba8(800, 200);
        let r = Raster::from_image(&img, DEFAULT_MAX_DOTS);
        assert_eq!(r.width(), 384);
        assert_eq!(r.height(), 96);
        // Fully transparent renders as blank paper
        assert!(r.row(0).iter().all(|b| *b == 0));
    }
}
