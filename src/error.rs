//! Error types.
//!
//! Only environmental failures are represented here: things a caller can react to by
//! supplying different input or giving up cleanly. Misuse of the API (an unresolved
//! uniform name, a handle the driver refused to allocate, compiling a shader twice) is a
//! logic bug and panics at the call site instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::shader::ShaderStage;

/// Shorthand for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  // ========================================================================
  // Startup
  // ========================================================================
  /// The windowing subsystem (winit event loop) could not be created.
  #[error("Unable to initialize the windowing subsystem: {0}")]
  EventLoop(#[from] winit::error::EventLoopError),

  /// The display produced no native window for the requested attributes.
  #[error("Unable to create window: {0}")]
  WindowCreation(String),

  /// The window did not expose a usable raw handle.
  #[error("Window handle unavailable: {0}")]
  WindowHandle(#[from] raw_window_handle::HandleError),

  /// The display or config selection failed before a context existed.
  #[error("Unable to create GL context: {0}")]
  ContextCreation(String),

  /// Context creation, surface creation, make-current or swap failed.
  #[error("GL platform error: {0}")]
  Glutin(#[from] glutin::error::Error),

  /// Core entry points could not be resolved after the context was made current.
  #[error("Unable to load GL functions: {0}")]
  LoaderInit(String),

  /// The driver created a context older than the one requested.
  #[error("Requested GL {requested_major}.{requested_minor}, got {found_major}.{found_minor}")]
  UnsupportedVersion {
    requested_major: u8,
    requested_minor: u8,
    found_major:     u32,
    found_minor:     u32,
  },

  // ========================================================================
  // Shaders
  // ========================================================================
  /// A raw stage enum that is not a vertex, fragment or geometry shader.
  #[error("Unsupported shader stage 0x{0:04X}")]
  UnsupportedStage(u32),

  /// Shader source could not be read from a file or stream.
  #[error("Unable to read shader source {path:?}: {source}")]
  SourceRead {
    path:   Option<PathBuf>,
    #[source]
    source: std::io::Error,
  },

  #[error("{stage} shader failed to compile:\n{log}")]
  Compile { stage: ShaderStage, log: String },

  #[error("Program failed to link:\n{log}")]
  Link { log: String },

  // ========================================================================
  // Images
  // ========================================================================
  #[error("Unable to decode image {path:?}: {source}")]
  ImageDecode {
    path:   PathBuf,
    #[source]
    source: image::ImageError,
  },
}
