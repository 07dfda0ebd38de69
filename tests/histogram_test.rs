// Histogram convenience operation against stub histogram functions

use std::collections::HashMap;
use std::sync::Arc;

use libc::{c_double, c_int, c_uchar, c_uint, c_void};

use fia_bind::ffi::fia_sys::FIBITMAP;
use fia_bind::image::MAX_HISTOGRAM_BINS;
use fia_bind::{BaseImage, FiaError, FiaImage, Histogram, ImageHandle, ImageType, SymbolSource};

unsafe extern "C" fn stub_rgb_histogram(
    _dib: *mut c_void,
    _min: c_uchar,
    _max: c_uchar,
    bins: c_int,
    red: *mut c_uint,
    green: *mut c_uint,
    blue: *mut c_uint,
) -> c_int {
    for i in 0..bins as usize {
        unsafe {
            *red.add(i) = i as c_uint;
            *green.add(i) = 2 * i as c_uint;
            *blue.add(i) = 1;
        }
    }
    1
}

unsafe extern "C" fn stub_histogram(
    _dib: *mut c_void,
    _min: c_double,
    _max: c_double,
    bins: c_int,
    hist: *mut c_uint,
) -> c_int {
    for i in 0..bins as usize {
        unsafe { *hist.add(i) = (i % 7) as c_uint };
    }
    1
}

unsafe extern "C" fn stub_histogram_fails(
    _dib: *mut c_void,
    _min: c_double,
    _max: c_double,
    _bins: c_int,
    _hist: *mut c_uint,
) -> c_int {
    0
}

struct StubLibrary {
    symbols: HashMap<&'static str, *const c_void>,
}

impl StubLibrary {
    fn new(histogram: *const c_void) -> Self {
        let mut symbols = HashMap::new();
        symbols.insert("FIA_RGBHistogram", stub_rgb_histogram as *const c_void);
        symbols.insert("FIA_Histogram", histogram);
        StubLibrary { symbols }
    }
}

impl SymbolSource for StubLibrary {
    fn name(&self) -> &str {
        "stub"
    }

    fn resolve(&self, symbol: &str) -> fia_bind::Result<*const c_void> {
        self.symbols
            .get(symbol)
            .copied()
            .ok_or_else(|| FiaError::symbol_resolution(symbol))
    }
}

struct SyntheticImage {
    bpp: u32,
    image_type: ImageType,
}

impl BaseImage for SyntheticImage {
    fn bitmap(&self) -> ImageHandle {
        ImageHandle::from_raw(0x2000 as *mut FIBITMAP)
    }

    fn bpp(&self) -> u32 {
        self.bpp
    }

    fn image_type(&self) -> ImageType {
        self.image_type
    }
}

fn image(bpp: u32, image_type: ImageType) -> FiaImage<SyntheticImage> {
    FiaImage::new(
        SyntheticImage { bpp, image_type },
        Arc::new(StubLibrary::new(stub_histogram as *const c_void)),
    )
}

#[test]
fn test_24bit_raster_gives_three_channels() {
    let histogram = image(24, ImageType::Bitmap)
        .histogram(0.0, 255.0, 256)
        .expect("histogram should succeed");

    match &histogram {
        Histogram::Rgb { red, green, blue } => {
            assert_eq!(red.len(), 256);
            assert_eq!(green.len(), 256);
            assert_eq!(blue.len(), 256);
            assert_eq!(red[10], 10);
            assert_eq!(green[10], 20);
            assert!(blue.iter().all(|&v| v == 1));
        }
        other => panic!("expected RGB histogram, got {other:?}"),
    }
    assert_eq!(histogram.channels().len(), 3);
}

#[test]
fn test_32bit_raster_gives_three_channels() {
    let histogram = image(32, ImageType::Bitmap)
        .histogram(0.0, 255.0, 64)
        .unwrap();
    assert!(matches!(histogram, Histogram::Rgb { .. }));
}

#[test]
fn test_8bit_greyscale_gives_one_channel() {
    let histogram = image(8, ImageType::Bitmap)
        .histogram(0.0, 255.0, 256)
        .unwrap();

    let channels = histogram.channels();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].len(), 256);
    assert_eq!(channels[0][8], 1);
}

#[test]
fn test_float_image_gives_one_channel() {
    let histogram = image(32, ImageType::Float)
        .histogram(-1.0, 1.0, 100)
        .unwrap();
    assert!(matches!(histogram, Histogram::Grey(ref v) if v.len() == 100));
}

#[test]
fn test_colour_scientific_type_unsupported() {
    let result = image(48, ImageType::Rgb16).histogram(0.0, 65535.0, 256);
    assert!(matches!(
        result,
        Err(FiaError::UnsupportedImageFormatError(_))
    ));
}

#[test]
fn test_unknown_type_unsupported() {
    let result = image(8, ImageType::Unknown).histogram(0.0, 255.0, 256);
    assert!(matches!(
        result,
        Err(FiaError::UnsupportedImageFormatError(_))
    ));
}

#[test]
fn test_zero_bins_rejected() {
    let result = image(8, ImageType::Bitmap).histogram(0.0, 255.0, 0);
    assert!(matches!(result, Err(FiaError::ArgumentTypeError(_))));
}

#[test]
fn test_oversized_bin_count_rejected() {
    let result = image(8, ImageType::Bitmap).histogram(0.0, 255.0, MAX_HISTOGRAM_BINS + 1);
    assert!(matches!(result, Err(FiaError::ArgumentTypeError(_))));

    let result = image(24, ImageType::Bitmap).histogram(0.0, 255.0, i32::MAX as usize);
    assert!(matches!(result, Err(FiaError::ArgumentTypeError(_))));
}

#[test]
fn test_bin_count_at_limit_accepted() {
    let histogram = image(16, ImageType::UInt16)
        .histogram(0.0, 65535.0, MAX_HISTOGRAM_BINS)
        .unwrap();
    assert_eq!(histogram.channels()[0].len(), MAX_HISTOGRAM_BINS);
}

#[test]
fn test_native_failure_reported() {
    let image = FiaImage::new(
        SyntheticImage {
            bpp: 8,
            image_type: ImageType::Bitmap,
        },
        Arc::new(StubLibrary::new(stub_histogram_fails as *const c_void)),
    );
    let result = image.histogram(0.0, 255.0, 256);
    assert!(matches!(result, Err(FiaError::NativeCallError(_))));
}

#[test]
fn test_repeated_histogram_identical() {
    let image = image(24, ImageType::Bitmap);
    let first = image.histogram(0.0, 255.0, 256).unwrap();
    let second = image.histogram(0.0, 255.0, 256).unwrap();
    assert_eq!(first, second);
}
