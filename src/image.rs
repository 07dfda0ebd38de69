//! `FiaImage`: FreeImageAlgorithms operations on top of a base image.
//!
//! The base image (the sibling FreeImage binding) owns the pixel data and
//! is abstracted by [`BaseImage`]. This wrapper only adds the library handle
//! and the typed entry points.

use std::path::Path;
use std::sync::Arc;

use libc::c_int;
use tracing::debug;

use crate::error::{FiaError, Result};
use crate::ffi::fia_sys::{self, FiaHistogramFn, FiaRgbHistogramFn, ImageHandle};
use crate::ffi::invoke::{self, Arg, CallOutcome, ReturnValue};
use crate::ffi::library::SymbolSource;
use crate::ffi::registry::{self, Operation};

/// Upper bound on histogram buckets; enough for full 16-bit resolution
/// with headroom for scientific types.
pub const MAX_HISTOGRAM_BINS: usize = 1 << 20;

/// FreeImage's pixel storage types (`FREE_IMAGE_TYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Unknown,
    /// Standard raster: 1/4/8/16/24/32 bpp.
    Bitmap,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float,
    Double,
    Complex,
    Rgb16,
    Rgba16,
    RgbF,
    RgbaF,
}

impl ImageType {
    /// Map a raw `FREE_IMAGE_TYPE` value; unrecognised values are `Unknown`.
    pub fn from_raw(value: c_int) -> Self {
        match value {
            fia_sys::FIT_BITMAP => ImageType::Bitmap,
            fia_sys::FIT_UINT16 => ImageType::UInt16,
            fia_sys::FIT_INT16 => ImageType::Int16,
            fia_sys::FIT_UINT32 => ImageType::UInt32,
            fia_sys::FIT_INT32 => ImageType::Int32,
            fia_sys::FIT_FLOAT => ImageType::Float,
            fia_sys::FIT_DOUBLE => ImageType::Double,
            fia_sys::FIT_COMPLEX => ImageType::Complex,
            fia_sys::FIT_RGB16 => ImageType::Rgb16,
            fia_sys::FIT_RGBA16 => ImageType::Rgba16,
            fia_sys::FIT_RGBF => ImageType::RgbF,
            fia_sys::FIT_RGBAF => ImageType::RgbaF,
            _ => ImageType::Unknown,
        }
    }

    /// Single-channel scientific types.
    fn is_scalar(self) -> bool {
        matches!(
            self,
            ImageType::UInt16
                | ImageType::Int16
                | ImageType::UInt32
                | ImageType::Int32
                | ImageType::Float
                | ImageType::Double
        )
    }
}

/// What the sibling base-image binding has to provide.
pub trait BaseImage {
    /// The underlying FIBITMAP.
    fn bitmap(&self) -> ImageHandle;
    /// Bits per pixel.
    fn bpp(&self) -> u32;
    fn image_type(&self) -> ImageType;
}

/// Histogram counts, one sequence per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Histogram {
    Rgb {
        red: Vec<u32>,
        green: Vec<u32>,
        blue: Vec<u32>,
    },
    Grey(Vec<u32>),
}

impl Histogram {
    pub fn channels(&self) -> Vec<&[u32]> {
        match self {
            Histogram::Rgb { red, green, blue } => {
                vec![red.as_slice(), green.as_slice(), blue.as_slice()]
            }
            Histogram::Grey(values) => vec![values.as_slice()],
        }
    }
}

/// A base image extended with FreeImageAlgorithms operations.
pub struct FiaImage<I> {
    base: I,
    library: Arc<dyn SymbolSource>,
}

impl<I: BaseImage> FiaImage<I> {
    pub fn new(base: I, library: Arc<dyn SymbolSource>) -> Self {
        FiaImage { base, library }
    }

    pub fn base(&self) -> &I {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut I {
        &mut self.base
    }

    pub fn into_inner(self) -> I {
        self.base
    }

    pub fn library(&self) -> &Arc<dyn SymbolSource> {
        &self.library
    }

    /// Invoke a catalogue operation with this image as the implicit first
    /// argument.
    pub fn call(&self, op: Operation, args: &[Arg]) -> Result<CallOutcome> {
        invoke::invoke(
            self.library.as_ref(),
            op.descriptor(),
            self.base.bitmap(),
            args,
        )
    }

    /// Like [`FiaImage::call`], addressing the operation by its logical name.
    pub fn call_by_name(&self, name: &str, args: &[Arg]) -> Result<CallOutcome> {
        let descriptor = registry::lookup(name)?;
        invoke::invoke(self.library.as_ref(), descriptor, self.base.bitmap(), args)
    }

    pub fn set_rainbow_palette(&self) -> Result<()> {
        self.call_checked(Operation::SetRainBowPalette, &[])
    }

    pub fn set_grey_level_palette(&self) -> Result<()> {
        self.call_checked(Operation::SetGreyLevelPalette, &[])
    }

    pub fn set_log_colour_palette(&self) -> Result<()> {
        self.call_checked(Operation::SetLogColourPalette, &[])
    }

    pub fn set_temperature_palette(&self) -> Result<()> {
        self.call_checked(Operation::SetTemperaturePalette, &[])
    }

    pub fn set_false_colour_palette(&self, wavelength: f64) -> Result<()> {
        self.call_checked(Operation::SetFalseColourPalette, &[Arg::Double(wavelength)])
    }

    /// Histogram equalisation in place.
    pub fn hist_eq(&self) -> Result<()> {
        self.call_checked(Operation::HistEq, &[])
    }

    pub fn grey_level_average(&self) -> Result<f64> {
        let outcome = self.call(Operation::GetGreyLevelAverage, &[])?;
        expect_double(Operation::GetGreyLevelAverage, outcome.value)
    }

    pub fn is_grey_scale(&self) -> Result<bool> {
        let outcome = self.call(Operation::IsGreyScale, &[])?;
        Ok(expect_int(Operation::IsGreyScale, outcome.value)? != 0)
    }

    /// Returns the native return value and the value written to the
    /// out-parameter.
    pub fn mono_image_find_white_area(&self) -> Result<(i32, f64)> {
        let outcome = self.call(Operation::MonoImageFindWhiteArea, &[Arg::Out])?;
        let value = expect_int(Operation::MonoImageFindWhiteArea, outcome.value)?;
        Ok((value, out_value(Operation::MonoImageFindWhiteArea, &outcome, 0)?))
    }

    /// Smallest and largest pixel value in the image.
    pub fn find_min_max(&self) -> Result<(f64, f64)> {
        let outcome = self.call(Operation::FindMinMax, &[Arg::Out, Arg::Out])?;
        Ok((
            out_value(Operation::FindMinMax, &outcome, 0)?,
            out_value(Operation::FindMinMax, &outcome, 1)?,
        ))
    }

    /// Largest value representable by the image's pixel type.
    pub fn max_possible_value(&self) -> Result<f64> {
        let outcome = self.call(Operation::GetMaxPossibleValue, &[Arg::Out])?;
        out_value(Operation::GetMaxPossibleValue, &outcome, 0)
    }

    /// Smallest value representable by the image's pixel type.
    pub fn min_possible_value(&self) -> Result<f64> {
        let outcome = self.call(Operation::GetMinPossibleValue, &[Arg::Out])?;
        out_value(Operation::GetMinPossibleValue, &outcome, 0)
    }

    pub fn save_to_file(&self, path: &Path, bit_depth: i32) -> Result<()> {
        let path = path.to_str().ok_or_else(|| {
            FiaError::argument_type(format!("path is not valid UTF-8: {}", path.display()))
        })?;
        self.call_checked(Operation::SaveToFile, &[Arg::from(path), Arg::Int(bit_depth)])
    }

    /// Histogram over `[min, max]` with `bins` buckets.
    ///
    /// 24/32 bpp standard rasters give one sequence per colour channel;
    /// greyscale rasters and scalar scientific types give a single sequence.
    /// For colour images `min` and `max` are clamped to the byte range.
    pub fn histogram(&self, min: f64, max: f64, bins: usize) -> Result<Histogram> {
        if bins == 0 {
            return Err(FiaError::argument_type("histogram needs at least one bin"));
        }
        if bins > MAX_HISTOGRAM_BINS {
            return Err(FiaError::argument_type(format!(
                "histogram bin count {bins} exceeds the limit of {MAX_HISTOGRAM_BINS}"
            )));
        }
        let bins_c = c_int::try_from(bins).map_err(|_| {
            FiaError::argument_type(format!("histogram bin count {bins} exceeds int range"))
        })?;

        let bitmap = self.base.bitmap();
        let bpp = self.base.bpp();
        let image_type = self.base.image_type();

        let mut red = vec![0_u32; bins];

        if bpp >= 24 && image_type == ImageType::Bitmap {
            let mut green = vec![0_u32; bins];
            let mut blue = vec![0_u32; bins];

            let addr = self.library.resolve(fia_sys::FIA_RGB_HISTOGRAM)?;
            debug!(bpp, bins, "computing RGB histogram");
            // Safety: FIA_RGBHistogram has the declared signature and writes
            // exactly `bins` entries into each array.
            let status = unsafe {
                let f: FiaRgbHistogramFn = fia_sys::cast_symbol(addr);
                f(
                    bitmap.as_ptr(),
                    to_byte(min),
                    to_byte(max),
                    bins_c,
                    red.as_mut_ptr(),
                    green.as_mut_ptr(),
                    blue.as_mut_ptr(),
                )
            };
            check_status(fia_sys::FIA_RGB_HISTOGRAM, status)?;
            Ok(Histogram::Rgb { red, green, blue })
        } else if image_type == ImageType::Bitmap || image_type.is_scalar() {
            let addr = self.library.resolve(fia_sys::FIA_HISTOGRAM)?;
            debug!(bpp, bins, ?image_type, "computing greyscale histogram");
            // Safety: FIA_Histogram has the declared signature and writes
            // exactly `bins` entries.
            let status = unsafe {
                let f: FiaHistogramFn = fia_sys::cast_symbol(addr);
                f(bitmap.as_ptr(), min, max, bins_c, red.as_mut_ptr())
            };
            check_status(fia_sys::FIA_HISTOGRAM, status)?;
            Ok(Histogram::Grey(red))
        } else {
            Err(FiaError::unsupported_image_format(format!(
                "no histogram for {image_type:?} image at {bpp} bpp"
            )))
        }
    }

    fn call_checked(&self, op: Operation, args: &[Arg]) -> Result<()> {
        let outcome = self.call(op, args)?;
        check_status(op.descriptor().symbol, expect_int(op, outcome.value)?)
    }
}

fn check_status(symbol: &str, status: c_int) -> Result<()> {
    if status == fia_sys::FIA_ERROR {
        Err(FiaError::native_call(format!("{symbol} returned FIA_ERROR")))
    } else {
        Ok(())
    }
}

fn expect_int(op: Operation, value: ReturnValue) -> Result<i32> {
    value
        .as_int()
        .ok_or_else(|| FiaError::native_call(format!("{op}: expected int return, got {value:?}")))
}

fn expect_double(op: Operation, value: ReturnValue) -> Result<f64> {
    value
        .as_double()
        .ok_or_else(|| FiaError::native_call(format!("{op}: expected double return, got {value:?}")))
}

fn out_value(op: Operation, outcome: &CallOutcome, index: usize) -> Result<f64> {
    outcome
        .outputs
        .get(index)
        .copied()
        .ok_or_else(|| FiaError::native_call(format!("{op}: missing out-parameter {index}")))
}

fn to_byte(v: f64) -> u8 {
    v.clamp(0.0, 255.0) as u8
}
