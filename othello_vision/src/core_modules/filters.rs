// THEORY:
// Pixel-level preprocessing shared by the extraction and motion stages.
// - `resize_to_width` brings every frame to the analysis resolution.
// - `bilateral_filter` smooths sensor noise inside pieces while keeping the
//   piece/board boundary sharp, so cell colors stay inside their color boxes.
// - `blurred_gray` is the heavy Gaussian blur the motion gate compares.
// None of these mutate their input.

use crate::config::SmoothingParams;
use image::imageops::{self, FilterType};
use image::{GrayImage, Rgb, RgbImage};

/// Largest L1 distance between two RGB triples.
const MAX_COLOR_DISTANCE: usize = 255 * 3;

/// Resizes `frame` so its width equals `target_width`. The height is scaled by
/// the same ratio and truncated.
pub fn resize_to_width(frame: &RgbImage, target_width: u32) -> RgbImage {
    let (width, height) = frame.dimensions();
    if width == target_width || width == 0 || height == 0 {
        return frame.clone();
    }
    let scale = target_width as f64 / width as f64;
    let target_height = ((height as f64 * scale) as u32).max(1);
    imageops::resize(frame, target_width, target_height, FilterType::Triangle)
}

/// Edge-preserving smoothing. Each output pixel is the average of the pixels
/// inside a disc of `diameter`, weighted by spatial distance and by the L1
/// color distance to the centre pixel.
pub fn bilateral_filter(image: &RgbImage, params: &SmoothingParams) -> RgbImage {
    let radius = (params.diameter / 2) as i32;
    if radius == 0 {
        return image.clone();
    }
    let (width, height) = image.dimensions();

    let color_coeff = -0.5 / (params.sigma_color * params.sigma_color);
    let space_coeff = -0.5 / (params.sigma_space * params.sigma_space);

    let color_weights: Vec<f32> = (0..=MAX_COLOR_DISTANCE)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let mut kernel = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = dx * dx + dy * dy;
            if r2 > radius * radius {
                continue;
            }
            kernel.push((dx, dy, (r2 as f32 * space_coeff).exp()));
        }
    }

    let src = image.as_raw();
    let stride = width as usize * 3;
    let mut out = RgbImage::new(width, height);

    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let ci = y as usize * stride + x as usize * 3;
            let center = [src[ci], src[ci + 1], src[ci + 2]];

            let mut acc = [0f32; 3];
            let mut total = 0f32;
            for &(dx, dy, space_weight) in &kernel {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                    continue;
                }
                let ni = ny as usize * stride + nx as usize * 3;
                let distance = (0..3)
                    .map(|c| (src[ni + c] as i32 - center[c] as i32).unsigned_abs() as usize)
                    .sum::<usize>();
                let weight = space_weight * color_weights[distance];
                for c in 0..3 {
                    acc[c] += weight * src[ni + c] as f32;
                }
                total += weight;
            }

            let px = [
                (acc[0] / total).round().clamp(0.0, 255.0) as u8,
                (acc[1] / total).round().clamp(0.0, 255.0) as u8,
                (acc[2] / total).round().clamp(0.0, 255.0) as u8,
            ];
            out.put_pixel(x as u32, y as u32, Rgb(px));
        }
    }
    out
}

/// Sigma that OpenCV derives for a Gaussian kernel of side `kernel` when no
/// sigma is given.
pub fn sigma_for_kernel(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Grayscale conversion followed by a Gaussian blur of the given kernel side.
pub fn blurred_gray(frame: &RgbImage, blur_kernel: u32) -> GrayImage {
    let gray = imageops::grayscale(frame);
    imageops::blur(&gray, sigma_for_kernel(blur_kernel))
}
