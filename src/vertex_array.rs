//! Vertex array objects.
//!
//! A vertex array records which attributes are enabled and where each reads from; it is
//! configured through [`crate::Program::vertex_attrib_pointer_f32`] while bound.

use std::fmt;
use std::rc::Rc;

use crate::{context::Context, device::RawHandle};

/// Owned vertex array object. While bound, attribute pointer calls configure it.
pub struct VertexArray {
  context: Rc<Context>,
  handle:  RawHandle,
}

impl VertexArray {
  /// # Panics
  /// If the device refuses to allocate a vertex array.
  pub fn new(context: &Rc<Context>) -> Self {
    let handle = match context.api().create_vertex_array() {
      Ok(handle) => handle,
      Err(e) => panic!("Unable to generate vertex array: {e}"),
    };
    log::debug!("Created vertex array {}", handle);

    Self { context: context.clone(), handle }
  }

  /// Makes this the bound vertex array of the context.
  pub fn bind(&self) {
    self.context.bind_vertex_array(Some(self.handle));
  }

  pub fn is_bound(&self) -> bool {
    self.context.bound_vertex_array() == Some(self.handle)
  }

  /// Raw device name of the vertex array object.
  pub fn handle(&self) -> RawHandle {
    self.handle
  }
}

impl fmt::Debug for VertexArray {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("VertexArray").field("handle", &self.handle).finish()
  }
}

impl Drop for VertexArray {
  fn drop(&mut self) {
    if !self.context.is_alive() {
      return;
    }
    self.context.api().delete_vertex_array(self.handle);
    self.context.forget_vertex_array(self.handle);
    log::trace!("Deleted vertex array {}", self.handle);
  }
}
