//! Page-image cleanup between rendering and recognition.
//!
//! Scanned circulaires are frequently low-contrast photocopies, and
//! Tesseract's Arabic models are sensitive to gray noise around the glyph
//! strokes. The cleanup pass is the standard document recipe: grayscale,
//! 2x upscale, Otsu binarization, then a light sharpen.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageOutputFormat};

use super::ExtractionError;

const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Prepare a rendered page image for OCR. Accepts any decodable image,
/// returns PNG bytes.
pub fn prepare_for_ocr(image_bytes: &[u8]) -> Result<Vec<u8>, ExtractionError> {
    let decoded = image::load_from_memory(image_bytes)
        .map_err(|e| ExtractionError::ImageProcessing(e.to_string()))?;
    let gray = decoded.to_luma8();

    let (width, height) = gray.dimensions();
    let mut scaled = imageops::resize(&gray, width * 2, height * 2, FilterType::Triangle);

    let threshold = otsu_threshold(&scaled);
    for pixel in scaled.pixels_mut() {
        pixel[0] = if pixel[0] > threshold { 255 } else { 0 };
    }

    let sharpened = imageops::filter3x3(&scaled, &SHARPEN_KERNEL);

    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(sharpened)
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(e.to_string()))?;
    Ok(buf)
}

/// Otsu's method: pick the threshold maximizing between-class variance of
/// the gray histogram.
fn otsu_threshold(img: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in img.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    let weighted_total: u64 = histogram
        .iter()
        .enumerate()
        .map(|(value, &count)| value as u64 * count)
        .sum();

    let mut background_weight = 0u64;
    let mut background_sum = 0u64;
    let mut best_threshold = 0u8;
    let mut best_variance = 0.0f64;

    for value in 0..256usize {
        background_weight += histogram[value];
        if background_weight == 0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }
        background_sum += value as u64 * histogram[value];

        let background_mean = background_sum as f64 / background_weight as f64;
        let foreground_mean = (weighted_total - background_sum) as f64 / foreground_weight as f64;
        let mean_diff = background_mean - foreground_mean;
        let variance = background_weight as f64 * foreground_weight as f64 * mean_diff * mean_diff;

        if variance > best_variance {
            best_variance = variance;
            best_threshold = value as u8;
        }
    }

    best_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(img: GrayImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn otsu_splits_a_bimodal_histogram() {
        let img = GrayImage::from_fn(8, 8, |x, _| {
            if x < 4 {
                image::Luma([30u8])
            } else {
                image::Luma([220u8])
            }
        });
        let t = otsu_threshold(&img);
        assert!(t >= 30 && t < 220, "threshold {t} outside the two modes");
    }

    #[test]
    fn cleanup_doubles_size_and_binarizes() {
        let img = GrayImage::from_fn(6, 6, |x, y| image::Luma([(x * 30 + y * 10) as u8]));
        let cleaned = prepare_for_ocr(&png_bytes(img)).unwrap();

        let out = image::load_from_memory(&cleaned).unwrap().to_luma8();
        assert_eq!(out.dimensions(), (12, 12));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn undecodable_input_is_an_image_error() {
        let result = prepare_for_ocr(b"definitely not an image");
        assert!(matches!(result, Err(ExtractionError::ImageProcessing(_))));
    }
}
