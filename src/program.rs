//! Linked shader programs.
//!
//! A [`Program`] is the single place draw-time state goes through: it links shader units,
//! resolves attribute and uniform names, pushes uniform values and describes how raw
//! buffer bytes map onto vertex attributes.
//!
//! # Binding protocol
//! * `set_uniform*` requires this program to be the active one ([`Program::use_program`])
//! * `vertex_attrib_pointer_f32` requires the target [`VertexArray`] to be bound and an array
//!   buffer to be bound; the attribute reads from that buffer
//!
//! Breaking either rule is a logic error and panics. Asking for a name the linked program
//! does not define panics too: shader and host code are written together, so a miss is a
//! typo, not a runtime condition.

use std::cell::RefCell;
use std::fmt;
use std::mem::size_of;
use std::rc::Rc;

use glam::{Mat4, Vec3, Vec4};
use rustc_hash::FxHashMap;

use crate::{
  context::Context,
  device::{AttribLocation, GlApi, RawHandle, UniformLocation},
  error::{Error, Result},
  shader::Shader,
  vertex_array::VertexArray,
};

/// Where a [`Program`] stands after its most recent `link` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
  Unlinked,
  Linked,
  Failed,
}

/// A value that can be pushed to a uniform location.
pub trait UniformValue {
  fn upload(&self, api: &dyn GlApi, location: UniformLocation);
}

impl UniformValue for f32 {
  fn upload(&self, api: &dyn GlApi, location: UniformLocation) {
    api.uniform_1_f32(location, *self);
  }
}

impl UniformValue for i32 {
  fn upload(&self, api: &dyn GlApi, location: UniformLocation) {
    api.uniform_1_i32(location, *self);
  }
}

impl UniformValue for Vec3 {
  fn upload(&self, api: &dyn GlApi, location: UniformLocation) {
    api.uniform_3_f32(location, self.x, self.y, self.z);
  }
}

impl UniformValue for Vec4 {
  fn upload(&self, api: &dyn GlApi, location: UniformLocation) {
    api.uniform_4_f32(location, self.x, self.y, self.z, self.w);
  }
}

impl UniformValue for Mat4 {
  fn upload(&self, api: &dyn GlApi, location: UniformLocation) {
    // glam stores matrices column-major, which is what GL reads with transpose off.
    api.uniform_matrix_4_f32(location, &self.to_cols_array());
  }
}

/// Byte layout of one float attribute inside an interleaved vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribPointer {
  pub location:   AttribLocation,
  pub components: i32,
  pub normalized: bool,
  /// Distance in bytes between consecutive vertices.
  pub stride:     i32,
  /// Byte offset of the attribute's first component inside a vertex.
  pub offset:     i32,
}

impl AttribPointer {
  /// Layout for an `f32` attribute where `element_offset` and `stride_elements` are counted
  /// in floats rather than bytes.
  pub fn f32(
    location: AttribLocation,
    element_offset: usize,
    components: i32,
    normalized: bool,
    stride_elements: usize,
  ) -> Self {
    Self {
      location,
      components,
      normalized,
      stride: float_bytes(stride_elements),
      offset: float_bytes(element_offset),
    }
  }
}

/// Byte size of `elements` floats as a GL size.
///
/// # Panics
/// If the size overflows `usize` or does not fit a `GLsizei`.
fn float_bytes(elements: usize) -> i32 {
  elements
    .checked_mul(size_of::<f32>())
    .and_then(|bytes| i32::try_from(bytes).ok())
    .unwrap_or_else(|| panic!("{elements} floats does not fit a GLsizei"))
}

#[derive(Default)]
struct LocationCache {
  uniforms: FxHashMap<String, UniformLocation>,
  attribs:  FxHashMap<String, AttribLocation>,
}

/// A device program object plus the shader units attached to it.
pub struct Program {
  context:   Rc<Context>,
  handle:    RawHandle,
  attached:  Vec<RawHandle>,
  state:     LinkState,
  locations: RefCell<LocationCache>,
}

impl Program {
  /// Allocates a device program object.
  ///
  /// # Panics
  /// If the device refuses to allocate a program object.
  pub fn new(context: &Rc<Context>) -> Self {
    let handle = match context.api().create_program() {
      Ok(handle) => handle,
      Err(e) => panic!("Unable to create program: {e}"),
    };
    log::debug!("Created program {}", handle);

    Self {
      context: context.clone(),
      handle,
      attached: Vec::new(),
      state: LinkState::Unlinked,
      locations: RefCell::default(),
    }
  }

  /// Attaches a shader unit. Attaching after a link leaves the program unlinked until
  /// [`Program::link`] runs again.
  pub fn attach(&mut self, shader: &Shader) {
    let shader = shader.handle();
    if self.attached.contains(&shader) {
      return;
    }
    self.context.api().attach_shader(self.handle, shader);
    self.attached.push(shader);
    self.state = LinkState::Unlinked;
  }

  pub fn detach(&mut self, shader: &Shader) {
    let shader = shader.handle();
    if let Some(index) = self.attached.iter().position(|attached| *attached == shader) {
      self.context.api().detach_shader(self.handle, shader);
      self.attached.swap_remove(index);
      self.state = LinkState::Unlinked;
    }
  }

  /// Pins fragment output `name` to color attachment `slot`. Takes effect on the next link.
  pub fn bind_fragment_location(&mut self, name: &str, slot: u32) {
    self.context.api().bind_frag_data_location(self.handle, slot, name);
  }

  /// Links the attached shaders. On failure the error carries the linker log.
  pub fn link(&mut self) -> Result<()> {
    let api = self.context.api();
    api.link_program(self.handle);
    *self.locations.borrow_mut() = LocationCache::default();

    if api.program_link_status(self.handle) {
      self.state = LinkState::Linked;
      log::debug!("Linked program {} ({} shaders)", self.handle, self.attached.len());
      Ok(())
    } else {
      self.state = LinkState::Failed;
      log::debug!("Program {} failed to link", self.handle);
      Err(Error::Link { log: api.program_info_log(self.handle) })
    }
  }

  /// The device's link log for this program.
  pub fn info_log(&self) -> String {
    self.context.api().program_info_log(self.handle)
  }

  /// Makes this the active program for uniform updates and draws.
  ///
  /// # Panics
  /// If the program is not linked.
  pub fn use_program(&self) {
    assert!(
      self.state == LinkState::Linked,
      "Attempt to use program {} which is not linked",
      self.handle,
    );
    self.context.bind_program(Some(self.handle));
  }

  /// True while this is the program in the context's active slot.
  pub fn is_active(&self) -> bool {
    self.context.bound_program() == Some(self.handle)
  }

  /// # Panics
  /// If the linked program has no active uniform called `name`.
  pub fn uniform_location(&self, name: &str) -> UniformLocation {
    if let Some(location) = self.locations.borrow().uniforms.get(name) {
      return *location;
    }
    let location = self
      .context
      .api()
      .uniform_location(self.handle, name)
      .unwrap_or_else(|| panic!("Unable to find uniform `{name}` in program {}", self.handle));
    self.locations.borrow_mut().uniforms.insert(name.to_owned(), location);
    location
  }

  /// # Panics
  /// If the linked program has no active attribute called `name`.
  pub fn attrib_location(&self, name: &str) -> AttribLocation {
    if let Some(location) = self.locations.borrow().attribs.get(name) {
      return *location;
    }
    let location = self
      .context
      .api()
      .attrib_location(self.handle, name)
      .unwrap_or_else(|| panic!("Unable to find attribute `{name}` in program {}", self.handle));
    self.locations.borrow_mut().attribs.insert(name.to_owned(), location);
    location
  }

  /// # Panics
  /// If this program is not the active one.
  pub fn set_uniform<V: UniformValue>(&self, location: UniformLocation, value: V) {
    assert!(
      self.is_active(),
      "Attempt to set a uniform on program {} while it is not in use",
      self.handle,
    );
    value.upload(self.context.api(), location);
  }

  pub fn set_uniform_by_name<V: UniformValue>(&self, name: &str, value: V) {
    let location = self.uniform_location(name);
    self.set_uniform(location, value);
  }

  /// Enables attribute `attr` on `vertex_array` and describes where its floats live in the
  /// bound array buffer.
  ///
  /// `element_offset` and `stride_elements` count floats, so a buffer of interleaved
  /// `[x, y, z, r, g, b]` vertices uses `(0, 3, 6)` for the position and `(3, 3, 6)` for
  /// the color. Returns the byte layout that was applied.
  ///
  /// # Panics
  /// If `vertex_array` is not bound, no array buffer is bound, or `attr` does not exist.
  pub fn vertex_attrib_pointer_f32(
    &self,
    vertex_array: &VertexArray,
    attr: &str,
    element_offset: usize,
    components: i32,
    normalized: bool,
    stride_elements: usize,
  ) -> AttribPointer {
    assert!(
      self.context.bound_vertex_array() == Some(vertex_array.handle()),
      "Vertex array {} must be bound before describing attribute `{attr}`",
      vertex_array.handle(),
    );
    assert!(
      self.context.bound_array_buffer().is_some(),
      "An array buffer must be bound before describing attribute `{attr}`",
    );

    let location = self.attrib_location(attr);
    let pointer =
      AttribPointer::f32(location, element_offset, components, normalized, stride_elements);

    let api = self.context.api();
    api.enable_vertex_array_attrib(vertex_array.handle(), location);
    api.vertex_attrib_pointer_f32(
      location,
      pointer.components,
      pointer.normalized,
      pointer.stride,
      pointer.offset,
    );
    log::trace!("Attribute `{}` of program {}: {:?}", attr, self.handle, pointer);
    pointer
  }

  /// Raw device name of the program object.
  pub fn handle(&self) -> RawHandle {
    self.handle
  }

  /// Result of the last link, or `Unlinked` if attachments changed since.
  pub fn state(&self) -> LinkState {
    self.state
  }

  pub fn is_linked(&self) -> bool {
    self.state == LinkState::Linked
  }

  pub fn attached_shaders(&self) -> &[RawHandle] {
    &self.attached
  }
}

impl fmt::Debug for Program {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Program")
      .field("handle", &self.handle)
      .field("attached", &self.attached)
      .field("state", &self.state)
      .finish()
  }
}

impl Drop for Program {
  fn drop(&mut self) {
    if !self.context.is_alive() {
      log::trace!("Program {} went down with its context", self.handle);
      return;
    }
    self.context.api().delete_program(self.handle);
    self.context.forget_program(self.handle);
    log::trace!("Deleted program {}", self.handle);
  }
}
