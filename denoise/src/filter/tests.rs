use super::*;
use crate::backend::Sequential;
use crate::config::{DEFAULT_MAX_WINDOW, DEFAULT_MIN_WINDOW, Strategy};
use crate::error::Error;
use crate::noise::add_salt_and_pepper;

fn smooth(width: usize, height: usize, channels: usize) -> Raster {
    let mut data = Vec::with_capacity(width * height * channels);
    for row in 0..height {
        for col in 0..width {
            for c in 0..channels {
                data.push((40 + row + 2 * col + 17 * c) as u8);
            }
        }
    }
    Raster::new_with_data(width, height, channels, data).unwrap()
}

fn total_abs_error(a: &Raster, b: &Raster) -> u64 {
    a.data()
        .iter()
        .zip(b.data())
        .map(|(&x, &y)| u64::from(x.abs_diff(y)))
        .sum()
}

#[test]
fn test_filter_preserves_dimensions() {
    let source = smooth(23, 11, 1);
    let output = filter(&source, DEFAULT_MIN_WINDOW, DEFAULT_MAX_WINDOW).unwrap();

    assert_eq!(output.width(), 23);
    assert_eq!(output.height(), 11);
    assert_eq!(output.channels(), 1);
}

#[test]
fn test_invalid_windows_rejected_before_work() {
    let source = smooth(4, 4, 1);
    for (min, max) in [(4, 7), (3, 8), (9, 7), (0, 3)] {
        assert!(
            matches!(filter(&source, min, max), Err(Error::InvalidConfig(_))),
            "({min}, {max})"
        );
    }
}

#[test]
fn test_removes_salt_and_pepper() {
    let clean = smooth(48, 40, 1);
    let mut noisy = clean.clone();
    let corrupted = add_salt_and_pepper(&mut noisy, 0.1, 42).unwrap();
    assert!(corrupted > 0);

    let output = filter(&noisy, 3, 7).unwrap();

    let before = total_abs_error(&noisy, &clean);
    let after = total_abs_error(&output, &clean);
    assert!(
        after * 20 < before,
        "expected most noise removed: before {before}, after {after}"
    );
    assert!(output.data().iter().all(|&v| v != 0 && v != 255));
}

#[test]
fn test_clean_interior_untouched() {
    // Strictly increasing ramp: every interior window has lo < centre < hi.
    let clean = smooth(20, 20, 1);
    let output = filter(&clean, 3, 5).unwrap();

    for row in 1..19 {
        for col in 1..19 {
            assert_eq!(output.get(row, col, 0), clean.get(row, col, 0));
        }
    }
}

#[test]
fn test_channels_filtered_independently() {
    let mut rgb = smooth(16, 12, 3);
    add_salt_and_pepper(&mut rgb, 0.15, 9).unwrap();

    let filter = AdaptiveMedianFilter::new(FilterConfig::new(3, 5)).unwrap();
    let output = filter.apply(&rgb).unwrap();
    assert_eq!(output.channels(), 3);

    for c in 0..3 {
        let plane = filter.apply(&rgb.channel(c)).unwrap();
        assert_eq!(output.channel(c), plane, "channel {c}");
    }
}

#[test]
fn test_with_backend() {
    let filter =
        AdaptiveMedianFilter::with_backend(WindowSize::new(3, 5), Box::new(Sequential)).unwrap();
    assert_eq!(filter.backend_name(), "sequential");
    assert_eq!(filter.window(), WindowSize::new(3, 5));

    assert!(
        AdaptiveMedianFilter::with_backend(WindowSize::new(5, 3), Box::new(Sequential)).is_err()
    );
}

#[test]
fn test_backend_output_length_checked() {
    #[derive(Debug)]
    struct Short;

    impl Decomposition for Short {
        fn name(&self) -> &'static str {
            "short"
        }

        fn run(&self, padded: &PaddedRaster, _window: WindowSize) -> Result<Vec<u8>> {
            Ok(vec![0; padded.width()])
        }
    }

    let filter = AdaptiveMedianFilter::with_backend(WindowSize::new(3, 3), Box::new(Short)).unwrap();
    assert!(matches!(
        filter.apply(&smooth(4, 4, 1)),
        Err(Error::MalformedRaster(_))
    ));
}

#[test]
fn test_one_pixel_image() {
    let source = Raster::new_with_data(1, 1, 1, vec![200]).unwrap();
    let filter =
        AdaptiveMedianFilter::new(FilterConfig::new(3, 7).strategy(Strategy::Sequential)).unwrap();
    assert_eq!(filter.apply(&source).unwrap().data(), &[200]);
}
