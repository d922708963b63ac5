// src/ffi/mod.rs
//! Raw ABI surface of the vendor SDK

pub mod types;
pub mod library;

pub use types::*;
pub use library::{NativeApi, VendorLibrary, vendor_library_name, default_library_name};
