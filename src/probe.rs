//! Device error probe.
//!
//! `glGetError` reports one pending error flag per call, so draining means calling it until
//! it returns `NO_ERROR`. Without a current context some drivers report an error forever;
//! the drain stops after [`MAX_DRAINED_ERRORS`] reads.

use crate::context::Context;

pub const MAX_DRAINED_ERRORS: usize = 32;

/// Human readable name for a `glGetError` code.
pub fn error_name(code: u32) -> &'static str {
  match code {
    glow::NO_ERROR => "GL_NO_ERROR",
    glow::INVALID_ENUM => "GL_INVALID_ENUM",
    glow::INVALID_VALUE => "GL_INVALID_VALUE",
    glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
    glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
    glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
    glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
    glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
    glow::CONTEXT_LOST => "GL_CONTEXT_LOST",
    _ => "unknown GL error",
  }
}

/// Reads every pending error code off the device, oldest first.
pub fn drain_errors(context: &Context) -> Vec<u32> {
  let mut codes = Vec::new();
  while codes.len() < MAX_DRAINED_ERRORS {
    match context.api().get_error() {
      glow::NO_ERROR => break,
      code => codes.push(code),
    }
  }
  codes
}

/// Drains pending device errors, logs each one and returns how many were found.
///
/// Call it after anything that may have upset the driver; a return of zero means the
/// device had nothing to report.
pub fn check_errors(context: &Context) -> usize {
  let codes = drain_errors(context);
  for code in &codes {
    log::warn!("glGetError returned 0x{:04X} ({})", code, error_name(*code));
  }
  codes.len()
}
