//! The current device context and its bind slots.
//!
//! OpenGL keeps "the active program", "the bound vertex array" and "the bound array
//! buffer" as global state of the current context. [`Context`] mirrors each of those as an
//! explicit slot. Slots change only through [`Context::bind_program`],
//! [`Context::bind_vertex_array`] and [`Context::bind_array_buffer`], which the wrappers
//! call from their `use_program`/`bind` methods and from `Drop`.
//!
//! Wrappers share the context through `Rc`, so they can outlive the [`crate::Window`]
//! that created it. Once the window is gone the context is marked lost: wrappers dropped
//! afterwards skip their device calls (the objects died with the GL context), and any
//! other use of the device panics.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::device::{GlApi, RawHandle};

/// One current GL context as seen by the wrappers.
pub struct Context {
  api:          Rc<dyn GlApi>,
  alive:        Cell<bool>,
  program:      Cell<Option<RawHandle>>,
  vertex_array: Cell<Option<RawHandle>>,
  array_buffer: Cell<Option<RawHandle>>,
}

impl Context {
  /// Wraps a device API object whose context is already current on this thread.
  pub fn new(api: Rc<dyn GlApi>) -> Rc<Self> {
    Rc::new(Self {
      api,
      alive: Cell::new(true),
      program: Cell::new(None),
      vertex_array: Cell::new(None),
      array_buffer: Cell::new(None),
    })
  }

  /// The device entry points.
  ///
  /// # Panics
  /// If the window owning the GL context has been destroyed.
  pub fn api(&self) -> &dyn GlApi {
    assert!(self.alive.get(), "Device context used after its window was destroyed");
    &*self.api
  }

  /// False once the owning window has been dropped.
  pub fn is_alive(&self) -> bool {
    self.alive.get()
  }

  pub(crate) fn mark_lost(&self) {
    if self.alive.replace(false) {
      log::debug!("Device context lost");
    }
    self.program.set(None);
    self.vertex_array.set(None);
    self.array_buffer.set(None);
  }

  /// Program in the active slot, as last set through this context.
  pub fn bound_program(&self) -> Option<RawHandle> {
    self.program.get()
  }

  pub fn bound_vertex_array(&self) -> Option<RawHandle> {
    self.vertex_array.get()
  }

  pub fn bound_array_buffer(&self) -> Option<RawHandle> {
    self.array_buffer.get()
  }

  /// Makes `program` the active program, or clears the slot with `None`.
  pub fn bind_program(&self, program: Option<RawHandle>) {
    self.api().use_program(program);
    self.program.set(program);
    log::trace!("Active program: {:?}", program);
  }

  /// Binds `vertex_array` for attribute setup and draws.
  pub fn bind_vertex_array(&self, vertex_array: Option<RawHandle>) {
    self.api().bind_vertex_array(vertex_array);
    self.vertex_array.set(vertex_array);
    log::trace!("Bound vertex array: {:?}", vertex_array);
  }

  /// Binds `buffer` as the `ARRAY_BUFFER` target.
  pub fn bind_array_buffer(&self, buffer: Option<RawHandle>) {
    self.api().bind_buffer(glow::ARRAY_BUFFER, buffer);
    self.array_buffer.set(buffer);
    log::trace!("Bound array buffer: {:?}", buffer);
  }

  // GL silently reverts a slot to zero when the bound object is deleted. These keep the
  // mirror in step without issuing a redundant bind.
  pub(crate) fn forget_program(&self, program: RawHandle) {
    if self.program.get() == Some(program) {
      self.program.set(None);
    }
  }

  pub(crate) fn forget_vertex_array(&self, vertex_array: RawHandle) {
    if self.vertex_array.get() == Some(vertex_array) {
      self.vertex_array.set(None);
    }
  }

  pub(crate) fn forget_array_buffer(&self, buffer: RawHandle) {
    if self.array_buffer.get() == Some(buffer) {
      self.array_buffer.set(None);
    }
  }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context")
      .field("alive", &self.alive.get())
      .field("program", &self.program.get())
      .field("vertex_array", &self.vertex_array.get())
      .field("array_buffer", &self.array_buffer.get())
      .finish_non_exhaustive()
  }
}
