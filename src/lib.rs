//! Thin, ownership-checked wrappers over an OpenGL device.
//!
//! Open a [`Window`] first; every other resource is created against the [`Context`] it
//! hands out and releases its device object on drop. Misuse of the API (compiling twice,
//! setting a uniform on an inactive program, describing attributes with nothing bound)
//! panics. Failures that depend on the environment (no display, unsupported GL version,
//! unreadable files, rejected shader sources) are returned as [`Error`].
//!
//! With the `headless` feature, `headless::HeadlessGl` and `headless::HeadlessSurface`
//! stand in for the driver and the window where no display is available.

pub mod buffer;
pub mod context;
pub mod device;
pub mod error;
#[cfg(any(test, feature = "headless"))]
pub mod headless;
pub mod image_data;
mod native;
pub mod probe;
pub mod program;
pub mod shader;
pub mod vertex_array;
pub mod window;

// Re-export commonly used items
pub use buffer::VertexBuffer;
pub use context::Context;
pub use device::{AttribLocation, GlApi, RawHandle, UniformLocation};
pub use error::{Error, Result};
pub use image_data::{ChannelFormat, DecodedImage};
pub use probe::check_errors;
pub use program::{AttribPointer, LinkState, Program, UniformValue};
pub use shader::{CompileState, Shader, ShaderStage};
pub use vertex_array::VertexArray;
pub use window::{ContextProperties, Surface, Window, WindowDescriptor};
pub use winit::keyboard::KeyCode;
