// Hand-written declarations for the parts of FreeImageAlgorithms that are
// called through fixed, non-table-driven signatures.
// Symbols are resolved at runtime, so these are function pointer types
// rather than an `extern` block.

use libc::{c_char, c_double, c_int, c_uchar, c_uint, c_void};

/// Opaque representation of FreeImage's FIBITMAP structure.
/// We never access internal fields; all interaction goes through the C API.
#[repr(C)]
pub struct FIBITMAP {
    _opaque: [u8; 0],
}

/// Borrowed reference to a FIBITMAP owned by the image library.
///
/// The binding passes it through unchanged and never dereferences it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct ImageHandle(*mut FIBITMAP);

impl ImageHandle {
    pub fn from_raw(ptr: *mut FIBITMAP) -> Self {
        ImageHandle(ptr)
    }

    pub fn as_ptr(self) -> *mut FIBITMAP {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

/// Status returned by most FIA_* functions on failure.
pub const FIA_ERROR: c_int = 0;
/// Status returned by most FIA_* functions on success.
pub const FIA_SUCCESS: c_int = 1;

/// FreeImage's `FREE_IMAGE_TYPE` values.
pub const FIT_UNKNOWN: c_int = 0;
pub const FIT_BITMAP: c_int = 1;
pub const FIT_UINT16: c_int = 2;
pub const FIT_INT16: c_int = 3;
pub const FIT_UINT32: c_int = 4;
pub const FIT_INT32: c_int = 5;
pub const FIT_FLOAT: c_int = 6;
pub const FIT_DOUBLE: c_int = 7;
pub const FIT_COMPLEX: c_int = 8;
pub const FIT_RGB16: c_int = 9;
pub const FIT_RGBA16: c_int = 10;
pub const FIT_RGBF: c_int = 11;
pub const FIT_RGBAF: c_int = 12;

// --- Library initialisation (exported through FreeImage) ---

pub const FREEIMAGE_INITIALISE: &str = "FreeImage_Initialise";
pub type FreeImageInitialiseFn = unsafe extern "C" fn(load_local_plugins_only: c_int);

// --- Diagnostic message output ---

/// Exported names of the message-callback setter, newest first.
pub const FIA_SET_OUTPUT_MESSAGE: &[&str] =
    &["FIA_SetOutputMessage", "FreeImageAlgorithms_SetOutputMessage"];
/// Receives a NUL-terminated message formatted by the library.
pub type OutputMessageFn = unsafe extern "C" fn(message: *const c_char);
pub type SetOutputMessageFn = unsafe extern "C" fn(omf: Option<OutputMessageFn>);

// --- Histograms ---

pub const FIA_HISTOGRAM: &str = "FIA_Histogram";
pub type FiaHistogramFn = unsafe extern "C" fn(
    dib: *mut FIBITMAP,
    min: c_double,
    max: c_double,
    number_of_bins: c_int,
    hist: *mut c_uint,
) -> c_int;

pub const FIA_RGB_HISTOGRAM: &str = "FIA_RGBHistogram";
pub type FiaRgbHistogramFn = unsafe extern "C" fn(
    dib: *mut FIBITMAP,
    min: c_uchar,
    max: c_uchar,
    number_of_bins: c_int,
    rhist: *mut c_uint,
    ghist: *mut c_uint,
    bhist: *mut c_uint,
) -> c_int;

/// Reinterpret a resolved symbol address as a typed function pointer.
///
/// # Safety
/// `addr` must be non-null and point to a function whose C signature is
/// exactly `F`. `F` must be a function pointer type.
pub unsafe fn cast_symbol<F: Copy>(addr: *const c_void) -> F {
    debug_assert_eq!(
        std::mem::size_of::<F>(),
        std::mem::size_of::<*const c_void>()
    );
    unsafe { std::mem::transmute_copy::<*const c_void, F>(&addr) }
}
