pub mod fia_sys;
pub mod invoke;
pub mod library;
pub mod registry;
