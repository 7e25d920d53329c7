//! Vertex buffer objects.
//!
//! Uploads are whole-buffer replacements with `STATIC_DRAW` usage: the data is written once
//! and drawn many times. There is no partial update or streaming path.

use std::fmt;
use std::mem::size_of;
use std::rc::Rc;

use bytemuck::Pod;

use crate::{context::Context, device::RawHandle};

/// Owned `ARRAY_BUFFER` object.
pub struct VertexBuffer {
  context:    Rc<Context>,
  handle:     RawHandle,
  size_bytes: usize,
}

impl VertexBuffer {
  /// # Panics
  /// If the device refuses to allocate a buffer.
  pub fn new(context: &Rc<Context>) -> Self {
    let handle = match context.api().create_buffer() {
      Ok(handle) => handle,
      Err(e) => panic!("Unable to generate vertex buffer: {e}"),
    };
    log::debug!("Created vertex buffer {}", handle);

    Self {
      context: context.clone(),
      handle,
      size_bytes: 0,
    }
  }

  /// Binds this buffer as the array buffer upload/read target.
  pub fn bind(&self) {
    self.context.bind_array_buffer(Some(self.handle));
  }

  pub fn is_bound(&self) -> bool {
    self.context.bound_array_buffer() == Some(self.handle)
  }

  /// Binds the buffer and replaces its contents with `elements`.
  ///
  /// The byte length is `elements.len() * size_of::<T>()`.
  pub fn data<T: Pod>(&mut self, elements: &[T]) {
    self.bind();
    let bytes: &[u8] = bytemuck::cast_slice(elements);
    debug_assert_eq!(bytes.len(), elements.len() * size_of::<T>());

    self.context.api().buffer_data(glow::ARRAY_BUFFER, bytes, glow::STATIC_DRAW);
    self.size_bytes = bytes.len();
    log::debug!(
      "Uploaded {} bytes ({} elements) to vertex buffer {}",
      bytes.len(),
      elements.len(),
      self.handle,
    );
  }

  /// Size of the last upload in bytes.
  pub fn size_bytes(&self) -> usize {
    self.size_bytes
  }

  /// Raw device name of the buffer object.
  pub fn handle(&self) -> RawHandle {
    self.handle
  }
}

impl fmt::Debug for VertexBuffer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("VertexBuffer")
      .field("handle", &self.handle)
      .field("size_bytes", &self.size_bytes)
      .finish()
  }
}

impl Drop for VertexBuffer {
  fn drop(&mut self) {
    if !self.context.is_alive() {
      log::trace!("Vertex buffer {} went down with its context", self.handle);
      return;
    }
    self.context.api().delete_buffer(self.handle);
    self.context.forget_array_buffer(self.handle);
    log::trace!("Deleted vertex buffer {}", self.handle);
  }
}
