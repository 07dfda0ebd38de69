//! Argument marshaling and invocation of table-driven native functions.

use std::ffi::CString;
use std::marker::PhantomData;

use libc::{c_double, c_int, c_void};
use tracing::debug;

use super::fia_sys::{self, ImageHandle};
use super::library::SymbolSource;
use super::registry::{FunctionDescriptor, ParamKind, ReturnKind};
use crate::error::{FiaError, Result};

/// Caller-supplied value for one trailing parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Int(i32),
    Double(f64),
    Str(String),
    /// Placeholder for an out-parameter slot. Any value is accepted in an
    /// out slot and ignored; this variant just makes the intent explicit.
    Out,
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Int(v)
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Double(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Str(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Str(v)
    }
}

/// Direct return value of a native call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnValue {
    Void,
    Int(i32),
    Double(f64),
}

impl ReturnValue {
    pub fn as_int(self) -> Option<i32> {
        match self {
            ReturnValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_double(self) -> Option<f64> {
        match self {
            ReturnValue::Double(v) => Some(v),
            _ => None,
        }
    }
}

/// Result of an invocation: the return value followed by every
/// out-parameter's final value, in parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub value: ReturnValue,
    pub outputs: Vec<f64>,
}

/// An argument reduced to its C ABI class.
#[derive(Debug, Clone, Copy)]
enum NativeArg {
    Ptr(*mut c_void),
    Int(c_int),
    Double(c_double),
}

/// A resolved function together with its marshaled arguments.
///
/// Pointer arguments refer into `strings` and `out_cells`, which are heap
/// allocations owned here, so they stay put when the struct moves.
pub struct BoundCall<'a> {
    descriptor: &'static FunctionDescriptor,
    addr: *const c_void,
    args: Vec<NativeArg>,
    _strings: Vec<CString>,
    out_cells: Box<[f64]>,
    _source: PhantomData<&'a ()>,
}

impl<'a> BoundCall<'a> {
    /// Resolve `descriptor`'s symbol and marshal `args` against its
    /// parameter list. `image` fills slot 0.
    pub fn bind<S: SymbolSource + ?Sized>(
        source: &'a S,
        descriptor: &'static FunctionDescriptor,
        image: ImageHandle,
        args: &[Arg],
    ) -> Result<Self> {
        let addr = source.resolve(descriptor.symbol)?;

        let trailing = descriptor.trailing_params();
        if args.len() != trailing.len() {
            return Err(FiaError::arity_mismatch(
                descriptor.name,
                trailing.len(),
                args.len(),
            ));
        }

        let mut out_cells = vec![0.0_f64; descriptor.out_count()].into_boxed_slice();
        let out_base = out_cells.as_mut_ptr();
        let mut next_out = 0;

        let mut strings = Vec::new();
        let mut native = Vec::with_capacity(descriptor.params.len());
        native.push(NativeArg::Ptr(image.as_ptr().cast()));

        for (index, (kind, arg)) in trailing.iter().zip(args).enumerate() {
            let marshaled = match (kind, arg) {
                (ParamKind::Int, Arg::Int(v)) => NativeArg::Int(*v),
                (ParamKind::Double, Arg::Double(v)) => NativeArg::Double(*v),
                (ParamKind::Double, Arg::Int(v)) => NativeArg::Double(f64::from(*v)),
                (ParamKind::Str, Arg::Str(s)) => {
                    let c = CString::new(s.as_str()).map_err(|_| {
                        FiaError::argument_type(format!(
                            "{}: argument {} contains an interior NUL byte",
                            descriptor.name,
                            index + 1
                        ))
                    })?;
                    let ptr = c.as_ptr() as *mut c_void;
                    strings.push(c);
                    NativeArg::Ptr(ptr)
                }
                (ParamKind::OutDouble, _) => {
                    // Safety: next_out < out_count by construction.
                    let cell = unsafe { out_base.add(next_out) };
                    next_out += 1;
                    NativeArg::Ptr(cell.cast())
                }
                (ParamKind::Image, _) => {
                    return Err(FiaError::unsupported_signature(format!(
                        "{}: image handle declared after slot 0",
                        descriptor.name
                    )));
                }
                (kind, arg) => {
                    return Err(FiaError::argument_type(format!(
                        "{}: argument {} expects {kind:?}, got {arg:?}",
                        descriptor.name,
                        index + 1
                    )));
                }
            };
            native.push(marshaled);
        }

        Ok(BoundCall {
            descriptor,
            addr,
            args: native,
            _strings: strings,
            out_cells,
            _source: PhantomData,
        })
    }

    /// Invoke the native function and collect the results.
    pub fn call(self) -> Result<CallOutcome> {
        debug!(
            operation = self.descriptor.name,
            symbol = self.descriptor.symbol,
            "invoking native function"
        );
        let value = unsafe { dispatch(self.addr, self.descriptor, &self.args)? };
        Ok(CallOutcome {
            value,
            outputs: self.out_cells.to_vec(),
        })
    }
}

/// Resolve, marshal, and call `descriptor` in one step.
pub fn invoke<S: SymbolSource + ?Sized>(
    source: &S,
    descriptor: &'static FunctionDescriptor,
    image: ImageHandle,
    args: &[Arg],
) -> Result<CallOutcome> {
    BoundCall::bind(source, descriptor, image, args)?.call()
}

/// Call `addr` as a C function taking the listed `expr => type` arguments,
/// returning according to the descriptor's return kind.
macro_rules! call_as {
    ($addr:expr, $ret:expr; $($arg:expr => $ty:ty),+) => {
        match $ret {
            ReturnKind::Void => {
                let f: unsafe extern "C" fn($($ty),+) = fia_sys::cast_symbol($addr);
                f($($arg),+);
                ReturnValue::Void
            }
            ReturnKind::Int => {
                let f: unsafe extern "C" fn($($ty),+) -> c_int = fia_sys::cast_symbol($addr);
                ReturnValue::Int(f($($arg),+))
            }
            ReturnKind::Double => {
                let f: unsafe extern "C" fn($($ty),+) -> c_double = fia_sys::cast_symbol($addr);
                ReturnValue::Double(f($($arg),+))
            }
        }
    };
}

/// Dispatch on the ABI shape of the argument list. Up to two trailing
/// arguments of any class are supported.
///
/// # Safety
/// `addr` must be a function whose C signature matches `descriptor`, and
/// every pointer in `args` must be valid for the call.
unsafe fn dispatch(
    addr: *const c_void,
    descriptor: &FunctionDescriptor,
    args: &[NativeArg],
) -> Result<ReturnValue> {
    use NativeArg::{Double as D, Int as I, Ptr as P};

    type Ptr = *mut c_void;
    let ret = descriptor.ret;

    let value = unsafe {
        match *args {
            [P(a)] => call_as!(addr, ret; a => Ptr),

            [P(a), P(b)] => call_as!(addr, ret; a => Ptr, b => Ptr),
            [P(a), I(b)] => call_as!(addr, ret; a => Ptr, b => c_int),
            [P(a), D(b)] => call_as!(addr, ret; a => Ptr, b => c_double),

            [P(a), P(b), P(c)] => call_as!(addr, ret; a => Ptr, b => Ptr, c => Ptr),
            [P(a), P(b), I(c)] => call_as!(addr, ret; a => Ptr, b => Ptr, c => c_int),
            [P(a), P(b), D(c)] => call_as!(addr, ret; a => Ptr, b => Ptr, c => c_double),
            [P(a), I(b), P(c)] => call_as!(addr, ret; a => Ptr, b => c_int, c => Ptr),
            [P(a), I(b), I(c)] => call_as!(addr, ret; a => Ptr, b => c_int, c => c_int),
            [P(a), I(b), D(c)] => call_as!(addr, ret; a => Ptr, b => c_int, c => c_double),
            [P(a), D(b), P(c)] => call_as!(addr, ret; a => Ptr, b => c_double, c => Ptr),
            [P(a), D(b), I(c)] => call_as!(addr, ret; a => Ptr, b => c_double, c => c_int),
            [P(a), D(b), D(c)] => call_as!(addr, ret; a => Ptr, b => c_double, c => c_double),

            _ => {
                return Err(FiaError::unsupported_signature(format!(
                    "{}: {} parameters with kinds {:?}",
                    descriptor.name,
                    descriptor.params.len(),
                    descriptor.params
                )));
            }
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::registry::Operation;
    use std::ptr;

    struct NoSymbols;

    impl SymbolSource for NoSymbols {
        fn name(&self) -> &str {
            "none"
        }

        fn resolve(&self, symbol: &str) -> Result<*const c_void> {
            Err(FiaError::symbol_resolution(symbol))
        }
    }

    unsafe extern "C" fn identity_int(_dib: *mut c_void, v: c_int) -> c_int {
        v
    }

    struct One(*const c_void);

    impl SymbolSource for One {
        fn name(&self) -> &str {
            "one"
        }

        fn resolve(&self, _symbol: &str) -> Result<*const c_void> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_missing_symbol_reported() {
        let result = invoke(
            &NoSymbols,
            Operation::HistEq.descriptor(),
            ImageHandle::from_raw(ptr::null_mut()),
            &[],
        );
        assert!(matches!(result, Err(FiaError::SymbolResolutionError(_))));
    }

    #[test]
    fn test_unsupported_shape_rejected() {
        static WIDE: FunctionDescriptor = FunctionDescriptor {
            name: "wide",
            symbol: "wide",
            ret: ReturnKind::Int,
            params: &[
                ParamKind::Image,
                ParamKind::Int,
                ParamKind::Int,
                ParamKind::Int,
            ],
        };
        let source = One(identity_int as *const c_void);
        let result = invoke(
            &source,
            &WIDE,
            ImageHandle::from_raw(ptr::null_mut()),
            &[Arg::Int(1), Arg::Int(2), Arg::Int(3)],
        );
        assert!(matches!(result, Err(FiaError::UnsupportedSignatureError(_))));
    }

    #[test]
    fn test_string_with_nul_rejected() {
        let source = One(identity_int as *const c_void);
        let result = invoke(
            &source,
            Operation::SaveToFile.descriptor(),
            ImageHandle::from_raw(ptr::null_mut()),
            &[Arg::Str("a\0b".into()), Arg::Int(8)],
        );
        assert!(matches!(result, Err(FiaError::ArgumentTypeError(_))));
    }

    #[test]
    fn test_int_widened_for_double_slot() {
        unsafe extern "C" fn echo_double(_dib: *mut c_void, v: c_double) -> c_int {
            v as c_int
        }
        let source = One(echo_double as *const c_void);
        let outcome = invoke(
            &source,
            Operation::SetFalseColourPalette.descriptor(),
            ImageHandle::from_raw(ptr::null_mut()),
            &[Arg::Int(550)],
        )
        .unwrap();
        assert_eq!(outcome.value, ReturnValue::Int(550));
        assert!(outcome.outputs.is_empty());
    }
}
