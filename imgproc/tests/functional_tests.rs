use cv_imgproc::*;
use image::{GrayImage, Luma};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_grid(rng: &mut StdRng, width: usize, height: usize, channels: usize) -> Vec<f32> {
    (0..width * height * channels)
        .map(|_| rng.gen_range(-2.0f32..2.0))
        .collect()
}

fn brute_force_sum(
    data: &[f32],
    width: usize,
    channels: usize,
    (x, y, w, h): (usize, usize, usize, usize),
    channel: usize,
) -> f64 {
    let mut sum = 0.0f64;
    for row in y..y + h {
        for col in x..x + w {
            sum += data[(row * width + col) * channels + channel] as f64;
        }
    }
    sum
}

#[test]
fn test_integral_matches_brute_force_random_windows() {
    let mut rng = StdRng::seed_from_u64(7);
    let (width, height, channels) = (37, 23, 3);
    let data = random_grid(&mut rng, width, height, channels);
    let table =
        IntegralImage::new(&data, width, height, channels, false, channels, width * channels)
            .unwrap();

    for _ in 0..200 {
        let x = rng.gen_range(0..width);
        let y = rng.gen_range(0..height);
        let w = rng.gen_range(1..=width - x);
        let h = rng.gen_range(1..=height - y);
        for c in 0..channels {
            let expected = brute_force_sum(&data, width, channels, (x, y, w, h), c);
            let got = table.sum(x as i64, y as i64, w as i64, h as i64, c) as f64;
            assert!(
                (got - expected).abs() < 1e-3,
                "window ({x},{y},{w},{h}) channel {c}: {got} vs {expected}"
            );
        }
        assert_eq!(table.area(x as i64, y as i64, w as i64, h as i64), w * h);
    }
}

#[test]
fn test_integral_single_pixel_and_full_grid() {
    let mut rng = StdRng::seed_from_u64(11);
    let (width, height) = (16, 9);
    let data = random_grid(&mut rng, width, height, 1);
    let table = IntegralImage::new(&data, width, height, 1, false, 1, width).unwrap();

    for y in 0..height {
        for x in 0..width {
            let got = table.sum(x as i64, y as i64, 1, 1, 0);
            assert!((got - data[y * width + x]).abs() < 1e-6);
        }
    }

    let total: f64 = data.iter().map(|&v| v as f64).sum();
    let got = table.sum(0, 0, width as i64, height as i64, 0) as f64;
    assert!((got - total).abs() < 1e-3);
    assert_eq!(table.finite_count(0, 0, width as i64, height as i64), (width * height) as u32);
}

#[test]
fn test_integral_second_order_terms() {
    let mut rng = StdRng::seed_from_u64(3);
    let (width, height, channels) = (12, 10, 3);
    let data = random_grid(&mut rng, width, height, channels);
    let table =
        IntegralImage::new(&data, width, height, channels, true, channels, width * channels)
            .unwrap();
    assert!(table.has_second_order());

    let (x, y, w, h) = (2, 3, 7, 5);
    for i in 0..channels {
        for j in 0..channels {
            let mut expected = 0.0f64;
            for row in y..y + h {
                for col in x..x + w {
                    let p = (row * width + col) * channels;
                    expected += data[p + i] as f64 * data[p + j] as f64;
                }
            }
            let got = table.second_order_sum(x as i64, y as i64, w as i64, h as i64, i, j);
            assert!((got.unwrap() as f64 - expected).abs() < 1e-3);
        }
    }
}

#[test]
fn test_integral_clamps_windows_outside_grid() {
    let data = vec![1.0f32; 8 * 6];
    let table = IntegralImage::new(&data, 8, 6, 1, false, 1, 8).unwrap();

    // Window hanging off the top-left corner keeps only the inside 3x2 part
    assert_eq!(table.sum(-2, -3, 5, 5, 0), 6.0);
    assert_eq!(table.area(-2, -3, 5, 5), 6);

    // Window covering the whole grid and more
    assert_eq!(table.sum(-10, -10, 100, 100, 0), 48.0);
    assert_eq!(table.finite_count(-10, -10, 100, 100), 48);

    let bounds = table.clamp_window(6, 4, 10, 10).unwrap();
    assert_eq!((bounds.x0, bounds.y0, bounds.x1, bounds.y1), (6, 4, 8, 6));
    assert_eq!(bounds.area(), 4);
    assert!(table.clamp_window(8, 0, 3, 3).is_none());
}

#[test]
fn test_integral_reads_strided_buffer() {
    // Two channels stored in 4-float elements, rows padded by 3 floats
    let (width, height) = (5, 4);
    let element_stride = 4;
    let row_stride = width * element_stride + 3;
    let mut data = vec![100.0f32; row_stride * height];
    for y in 0..height {
        for x in 0..width {
            let i = y * row_stride + x * element_stride;
            data[i] = (x + y) as f32;
            data[i + 1] = 1.0;
        }
    }

    let table = IntegralImage::new(&data, width, height, 2, false, element_stride, row_stride)
        .unwrap();
    assert_eq!(table.sum(0, 0, 5, 4, 1), 20.0);
    // sum of (x + y) over the 2x2 window at (1, 1)
    assert_eq!(table.sum(1, 1, 2, 2, 0), 2.0 + 3.0 + 3.0 + 4.0);
}

#[test]
fn test_integral_skips_non_finite_samples() {
    let mut data = vec![1.0f32; 6 * 6];
    data[2 * 6 + 2] = f32::NAN;
    data[4 * 6 + 5] = f32::INFINITY;
    let table = IntegralImage::new(&data, 6, 6, 1, true, 1, 6).unwrap();

    assert_eq!(table.sum(0, 0, 6, 6, 0), 34.0);
    assert_eq!(table.finite_count(0, 0, 6, 6), 34);
    assert_eq!(table.second_order_sum(0, 0, 6, 6, 0, 0), Some(34.0));
    // Windows after the invalid samples are unaffected
    assert_eq!(table.sum(3, 3, 2, 2, 0), 4.0);
    assert!(table.sum(0, 0, 6, 6, 0).is_finite());
}

#[test]
fn test_integral_rejects_bad_layout() {
    let data = vec![0.0f32; 10];
    assert!(IntegralImage::new(&data, 0, 2, 1, false, 1, 5).is_err());
    assert!(IntegralImage::new(&data, 5, 2, 3, false, 2, 10).is_err());
    assert!(IntegralImage::new(&data, 5, 2, 1, false, 1, 4).is_err());
    assert!(IntegralImage::new(&data, 5, 3, 1, false, 1, 5).is_err());
}

#[test]
fn test_chamfer_zero_at_sources_and_increasing() {
    let mut mask = GrayImage::from_pixel(40, 20, Luma([255]));
    for y in 0..20 {
        mask.put_pixel(5, y, Luma([0]));
    }
    let dist = chamfer_distance_transform(&mask);

    for y in 0..20 {
        assert_eq!(dist.get_pixel(5, y)[0], 0.0);
    }
    // Strictly increasing moving right along a row through uniform background
    let row = 10;
    for x in 6..39 {
        let here = dist.get_pixel(x, row)[0];
        let next = dist.get_pixel(x + 1, row)[0];
        assert!(next > here, "distance not increasing at x={x}: {here} -> {next}");
    }
    assert_eq!(dist.get_pixel(15, row)[0], 10.0);
    assert_eq!(dist.get_pixel(0, row)[0], 5.0);
}

#[test]
fn test_chamfer_diagonal_line() {
    let mut mask = GrayImage::from_pixel(30, 30, Luma([255]));
    mask.put_pixel(0, 0, Luma([0]));
    let dist = chamfer_distance_transform(&mask);

    for i in 1..29u32 {
        let here = dist.get_pixel(i, i)[0];
        assert!((here - CHAMFER_DIAGONAL * i as f32).abs() < 1e-4);
        assert!(dist.get_pixel(i + 1, i + 1)[0] > here);
    }
}
