//! Platform layers. Each one owns the `Context` and its devices and runs
//! the main loop.

pub mod headless;

#[cfg(target_os = "windows")]
pub mod win32;
