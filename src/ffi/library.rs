//! Runtime loading of the native library and symbol lookup.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libc::{c_char, c_void};
use libloading::{Library, Symbol};
use tracing::{debug, info, warn};

use super::fia_sys::{self, FreeImageInitialiseFn, SetOutputMessageFn};
use crate::config::settings::Settings;
use crate::error::{FiaError, Result};

/// Anything that can hand out raw function addresses by symbol name.
///
/// [`NativeLibrary`] is the production implementation; tests provide
/// in-process stubs.
pub trait SymbolSource {
    /// Name the source was loaded under, for diagnostics.
    fn name(&self) -> &str;

    /// Resolve `symbol` to a non-null function address.
    ///
    /// The address stays valid for as long as `self` is alive.
    fn resolve(&self, symbol: &str) -> Result<*const c_void>;
}

/// A loaded FreeImageAlgorithms shared library.
#[derive(Debug)]
pub struct NativeLibrary {
    library: Library,
    name: String,
    path: PathBuf,
    initialised: bool,
    forwarding_messages: bool,
}

impl NativeLibrary {
    /// Open the library at `path` (or a bare file name for the system loader).
    fn open(name: &str, path: &Path) -> Result<Self> {
        // Safety: loading runs the library's initialisers. We trust the
        // library the caller configured.
        let library = unsafe { Library::new(path) }.map_err(|e| {
            FiaError::library_load(format!("Failed to load '{}': {e}", path.display()))
        })?;

        Ok(NativeLibrary {
            library,
            name: name.to_string(),
            path: path.to_path_buf(),
            initialised: false,
            forwarding_messages: false,
        })
    }

    /// Path or file name the library was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the one-time `FreeImage_Initialise` call ran after loading.
    ///
    /// Initialisation failure does not fail the load, so callers that depend
    /// on it should check this flag.
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Whether native diagnostic messages are being forwarded to `tracing`.
    pub fn is_forwarding_messages(&self) -> bool {
        self.forwarding_messages
    }

    fn forward_messages(&mut self) {
        match install_message_handler(&*self) {
            Ok(symbol) => {
                self.forwarding_messages = true;
                debug!(library = %self.name, symbol, "native message handler installed");
            }
            Err(e) => {
                warn!(library = %self.name, error = %e, "native message handler not installed, continuing");
            }
        }
    }

    fn initialise(&mut self) {
        match self.resolve(fia_sys::FREEIMAGE_INITIALISE) {
            Ok(addr) => {
                // Safety: FreeImage_Initialise has the declared signature.
                unsafe {
                    let init: FreeImageInitialiseFn = fia_sys::cast_symbol(addr);
                    init(0);
                }
                self.initialised = true;
                debug!(library = %self.name, "FreeImage_Initialise called");
            }
            Err(e) => {
                warn!(library = %self.name, error = %e, "library initialisation failed, continuing");
            }
        }
    }
}

impl SymbolSource for NativeLibrary {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, symbol: &str) -> Result<*const c_void> {
        let c_name = CString::new(symbol)
            .map_err(|_| FiaError::symbol_resolution(format!("Invalid symbol name: {symbol:?}")))?;

        // Safety: we only read the symbol's address here. Type safety is
        // enforced at the call site from the function descriptor.
        let sym: Symbol<*const c_void> = unsafe { self.library.get(c_name.as_bytes_with_nul()) }
            .map_err(|e| {
                FiaError::symbol_resolution(format!(
                    "Symbol '{symbol}' not found in '{}': {e}",
                    self.path.display()
                ))
            })?;

        let addr = *sym;
        if addr.is_null() {
            return Err(FiaError::symbol_resolution(format!(
                "Symbol '{symbol}' resolved to null in '{}'",
                self.path.display()
            )));
        }
        Ok(addr)
    }
}

/// Register [`forward_native_message`] as the library's message callback.
///
/// Returns the setter symbol that was found.
pub fn install_message_handler<S: SymbolSource + ?Sized>(source: &S) -> Result<&'static str> {
    let mut last_err = None;
    for &symbol in fia_sys::FIA_SET_OUTPUT_MESSAGE {
        match source.resolve(symbol) {
            Ok(addr) => {
                // Safety: the setter takes a single nullable callback pointer.
                unsafe {
                    let set: SetOutputMessageFn = fia_sys::cast_symbol(addr);
                    set(Some(forward_native_message));
                }
                return Ok(symbol);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| FiaError::symbol_resolution("no message setter symbols")))
}

/// Message callback handed to the native library. Logs at `warn`.
///
/// # Safety
/// `message` must be null or a valid NUL-terminated string.
pub unsafe extern "C" fn forward_native_message(message: *const c_char) {
    if message.is_null() {
        return;
    }
    let text = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    warn!(target: "fia_bind::native", text = %text, "native library message");
}

/// Outcome of the single load attempt made for a library name.
enum Attempt {
    Loaded(Arc<NativeLibrary>),
    NotFound(String),
    LoadFailed(String),
}

impl Attempt {
    fn replay(&self, name: &str) -> Result<Arc<NativeLibrary>> {
        match self {
            Attempt::Loaded(library) => Ok(Arc::clone(library)),
            Attempt::NotFound(msg) => Err(FiaError::library_not_found(format!(
                "'{name}' failed on an earlier attempt: {msg}"
            ))),
            Attempt::LoadFailed(msg) => Err(FiaError::library_load(format!(
                "'{name}' failed on an earlier attempt: {msg}"
            ))),
        }
    }
}

/// Locates and loads native libraries, remembering every attempt.
///
/// Each library name is attempted at most once per loader. Later calls get
/// the cached handle, or an error of the original kind if the attempt failed.
pub struct LibraryLoader {
    default_name: String,
    search_dirs: Vec<PathBuf>,
    initialise: bool,
    forward_messages: bool,
    attempts: HashMap<String, Attempt>,
}

impl LibraryLoader {
    pub fn new(settings: &Settings) -> Self {
        LibraryLoader {
            default_name: settings.library_name.clone(),
            search_dirs: settings.effective_search_dirs(),
            initialise: settings.initialise,
            forward_messages: settings.forward_messages,
            attempts: HashMap::new(),
        }
    }

    /// Directories searched before the system loader, in order.
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Load `library_name`, or the configured default when `None`.
    pub fn load(&mut self, library_name: Option<&str>) -> Result<Arc<NativeLibrary>> {
        let name = library_name.unwrap_or(self.default_name.as_str()).to_string();

        if let Some(previous) = self.attempts.get(&name) {
            return previous.replay(&name);
        }

        match self.open(&name) {
            Ok(mut library) => {
                if self.initialise && !cfg!(windows) {
                    library.initialise();
                }
                if self.forward_messages {
                    library.forward_messages();
                }
                info!(
                    library = %name,
                    path = %library.path().display(),
                    initialised = library.is_initialised(),
                    forwarding_messages = library.is_forwarding_messages(),
                    "native library loaded"
                );
                let library = Arc::new(library);
                self.attempts
                    .insert(name, Attempt::Loaded(Arc::clone(&library)));
                Ok(library)
            }
            Err(e) => {
                let attempt = match &e {
                    FiaError::LibraryLoadError(msg) => Attempt::LoadFailed(msg.clone()),
                    other => Attempt::NotFound(other.to_string()),
                };
                self.attempts.insert(name, attempt);
                Err(e)
            }
        }
    }

    fn open(&self, name: &str) -> Result<NativeLibrary> {
        let as_path = Path::new(name);
        if as_path.components().count() > 1 {
            if !as_path.is_file() {
                return Err(FiaError::library_not_found(format!(
                    "No library at '{}'",
                    as_path.display()
                )));
            }
            return NativeLibrary::open(name, as_path);
        }

        let file_name = if has_library_extension(name) {
            name.to_string()
        } else {
            platform_lib_name(name)
        };

        for dir in &self.search_dirs {
            let candidate = dir.join(&file_name);
            debug!(candidate = %candidate.display(), "probing for native library");
            if candidate.is_file() {
                return NativeLibrary::open(name, &candidate);
            }
        }

        debug!(file_name = %file_name, "falling back to system library search");
        NativeLibrary::open(name, Path::new(&file_name)).map_err(|e| {
            FiaError::library_not_found(format!(
                "Cannot find '{name}' (tried '{file_name}' in {} search directories and the system loader): {e}",
                self.search_dirs.len()
            ))
        })
    }
}

/// Platform-specific file name for a bare library name.
pub fn platform_lib_name(name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{name}.dll")
    } else if cfg!(target_os = "macos") {
        format!("lib{name}.dylib")
    } else {
        format!("lib{name}.so")
    }
}

fn has_library_extension(name: &str) -> bool {
    name.ends_with(".so")
        || name.contains(".so.")
        || name.ends_with(".dylib")
        || name.ends_with(".dll")
}
