//! Runtime binding to the FreeImageAlgorithms native library.
//!
//! The library is located and loaded at runtime ([`LibraryLoader`]), a closed
//! catalogue of function signatures ([`Operation`]) drives argument
//! marshaling ([`invoke`]), and [`FiaImage`] exposes typed operations on top
//! of a base image supplied by the FreeImage binding.

pub mod config;
pub mod error;
pub mod ffi;
pub mod image;

pub use error::{FiaError, Result};
pub use ffi::fia_sys::ImageHandle;
pub use ffi::invoke::{Arg, CallOutcome, ReturnValue, invoke};
pub use ffi::library::{LibraryLoader, NativeLibrary, SymbolSource};
pub use ffi::registry::{FunctionDescriptor, Operation, ParamKind, ReturnKind, lookup};
pub use image::{BaseImage, FiaImage, Histogram, ImageType};
