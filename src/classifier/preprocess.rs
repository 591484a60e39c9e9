use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use ndarray::Array4;

use crate::error::CaptureError;
use crate::types::Frame;

pub const IMG_SIZE: u32 = 96;

// BT.601 luma coefficients, the transform the classifier was trained with.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Converts a raw RGBA frame into the classifier input: a centered
/// scale-to-cover crop resampled to 96×96, grayscaled and normalized to
/// `[0,1]`, shaped `(1, 96, 96, 1)`.
pub fn preprocess_frame(frame: &Frame) -> Result<Array4<f32>, CaptureError> {
    let invalid = || CaptureError::InvalidFrame {
        width: frame.width,
        height: frame.height,
    };

    if frame.width == 0 || frame.height == 0 {
        return Err(invalid());
    }
    if frame.rgba.len() != frame.width as usize * frame.height as usize * 4 {
        return Err(invalid());
    }

    let size = IMG_SIZE as f64;
    let scale = (size / frame.width as f64).max(size / frame.height as f64);
    let crop_w = size / scale;
    let crop_h = size / scale;
    let left = (frame.width as f64 - crop_w) / 2.0;
    let top = (frame.height as f64 - crop_h) / 2.0;

    let src = Image::from_vec_u8(
        frame.width,
        frame.height,
        frame.rgba.clone(),
        PixelType::U8x4,
    )
    .map_err(|_| invalid())?;
    let mut dst = Image::new(IMG_SIZE, IMG_SIZE, PixelType::U8x4);

    let options = ResizeOptions::new()
        .crop(left, top, crop_w, crop_h)
        .resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|_| invalid())?;

    let side = IMG_SIZE as usize;
    let mut input = Array4::<f32>::zeros((1, side, side, 1));
    for (i, px) in dst.buffer().chunks_exact(4).enumerate() {
        let luma = LUMA_R * px[0] as f32 + LUMA_G * px[1] as f32 + LUMA_B * px[2] as f32;
        input[[0, i / side, i % side, 0]] = luma / 255.0;
    }

    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width * height {
            rgba.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Frame {
            rgba,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn rejects_zero_dimension_frames() {
        let frame = Frame {
            rgba: Vec::new(),
            width: 0,
            height: 480,
            timestamp: Instant::now(),
        };
        assert!(matches!(
            preprocess_frame(&frame),
            Err(CaptureError::InvalidFrame { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_buffer_length() {
        let frame = Frame {
            rgba: vec![0; 16],
            width: 640,
            height: 480,
            timestamp: Instant::now(),
        };
        assert!(matches!(
            preprocess_frame(&frame),
            Err(CaptureError::InvalidFrame { .. })
        ));
    }

    #[test]
    fn output_has_expected_shape_and_range() {
        let frame = solid_frame(640, 480, [255, 255, 255]);
        let input = preprocess_frame(&frame).unwrap();
        assert_eq!(input.shape(), &[1, 96, 96, 1]);
        // A white frame maps to full luminance everywhere.
        assert!(input.iter().all(|&v| (v - 1.0).abs() < 1e-3));
    }

    #[test]
    fn grayscale_uses_luma_weights() {
        let frame = solid_frame(200, 200, [255, 0, 0]);
        let input = preprocess_frame(&frame).unwrap();
        let expected = 0.299;
        assert!(input.iter().all(|&v| (v - expected).abs() < 1e-2));
    }

    #[test]
    fn wide_frames_are_center_cropped() {
        // 300×100 frame, black except for a white 100-wide center band.
        // Scale-to-cover crops exactly that center square, so a plain
        // squash-resize (which would keep the black thirds) fails this.
        let width = 300u32;
        let height = 100u32;
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..height {
            for x in 0..width {
                let v = if (100..200).contains(&x) { 255u8 } else { 0u8 };
                rgba.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let frame = Frame {
            rgba,
            width,
            height,
            timestamp: Instant::now(),
        };

        let input = preprocess_frame(&frame).unwrap();
        let bright = input.iter().filter(|&&v| v > 0.9).count();
        assert!(
            bright > (96 * 96) * 9 / 10,
            "crop must land on the center band, got {bright} bright pixels"
        );
    }
}
