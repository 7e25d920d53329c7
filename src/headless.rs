//! A software stand-in for the device, plus a window surface that needs no display.
//!
//! [`HeadlessGl`] keeps the object tables a driver would keep (shaders, programs, vertex
//! arrays, buffers, the error queue) and records everything the wrappers push into it, so
//! the whole crate can run and be inspected on machines without a GPU.
//!
//! Its "compiler" is a structural check rather than a GLSL front end: a source compiles
//! when it opens with a `#version` directive, defines `main` and has balanced brackets.
//! Linking needs a compiled vertex and fragment stage. Attribute, uniform and output
//! locations are assigned in declaration order from the `in`/`attribute`, `uniform` and
//! fragment `out` declarations of the attached sources.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::num::NonZeroU32;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use winit::keyboard::KeyCode;

use crate::{
  device::{AttribLocation, GlApi, RawHandle, UniformLocation},
  error::Result,
  window::Surface,
};

/// Last value pushed to a uniform location.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformRecord {
  Float(f32),
  Int(i32),
  Vec3([f32; 3]),
  Vec4([f32; 4]),
  Mat4([f32; 16]),
}

/// Arguments of a `glVertexAttribPointer` call as the device received them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribPointerRecord {
  pub size:       i32,
  pub normalized: bool,
  pub stride:     i32,
  pub offset:     i32,
  pub buffer:     Option<RawHandle>,
}

struct ShaderObject {
  stage:    u32,
  source:   String,
  compiled: bool,
  log:      String,
}

#[derive(Default)]
struct ProgramObject {
  attached:       Vec<RawHandle>,
  linked:         bool,
  log:            String,
  frag_locations: FxHashMap<String, u32>,
  outputs:        FxHashMap<String, u32>,
  attribs:        FxHashMap<String, u32>,
  uniforms:       FxHashMap<String, u32>,
  uniform_values: FxHashMap<u32, UniformRecord>,
}

#[derive(Default)]
struct VertexArrayObject {
  enabled:  BTreeSet<u32>,
  pointers: FxHashMap<u32, AttribPointerRecord>,
}

struct BufferObject {
  data:  Vec<u8>,
  usage: Option<u32>,
}

#[derive(Default)]
struct DeviceState {
  next_handle:        u32,
  fail_allocations:   bool,
  errors:             VecDeque<u32>,
  shaders:            FxHashMap<RawHandle, ShaderObject>,
  programs:           FxHashMap<RawHandle, ProgramObject>,
  vertex_arrays:      FxHashMap<RawHandle, VertexArrayObject>,
  buffers:            FxHashMap<RawHandle, BufferObject>,
  current_program:    Option<RawHandle>,
  bound_vertex_array: Option<RawHandle>,
  bound_array_buffer: Option<RawHandle>,
}

impl DeviceState {
  fn allocate(&mut self) -> std::result::Result<RawHandle, String> {
    if self.fail_allocations {
      return Err("out of device objects".to_owned());
    }
    self.next_handle += 1;
    NonZeroU32::new(self.next_handle).ok_or_else(|| "handle space exhausted".to_owned())
  }

  fn error(&mut self, code: u32) {
    self.errors.push_back(code);
  }
}

#[derive(Default)]
pub struct HeadlessGl {
  state: RefCell<DeviceState>,
}

impl HeadlessGl {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes every following allocation fail, as a driver out of objects would.
  pub fn fail_allocations(&self, fail: bool) {
    self.state.borrow_mut().fail_allocations = fail;
  }

  /// Queues an error code for the next `get_error` calls.
  pub fn push_error(&self, code: u32) {
    self.state.borrow_mut().error(code);
  }

  pub fn pending_errors(&self) -> usize {
    self.state.borrow().errors.len()
  }

  pub fn live_shaders(&self) -> usize {
    self.state.borrow().shaders.len()
  }

  pub fn live_programs(&self) -> usize {
    self.state.borrow().programs.len()
  }

  pub fn live_vertex_arrays(&self) -> usize {
    self.state.borrow().vertex_arrays.len()
  }

  pub fn live_buffers(&self) -> usize {
    self.state.borrow().buffers.len()
  }

  pub fn current_program(&self) -> Option<RawHandle> {
    self.state.borrow().current_program
  }

  pub fn bound_vertex_array(&self) -> Option<RawHandle> {
    self.state.borrow().bound_vertex_array
  }

  pub fn bound_array_buffer(&self) -> Option<RawHandle> {
    self.state.borrow().bound_array_buffer
  }

  /// Source text last given to `shader`.
  pub fn source_of(&self, shader: RawHandle) -> Option<String> {
    self.state.borrow().shaders.get(&shader).map(|s| s.source.clone())
  }

  pub fn buffer_contents(&self, buffer: RawHandle) -> Option<Vec<u8>> {
    self.state.borrow().buffers.get(&buffer).map(|b| b.data.clone())
  }

  pub fn buffer_usage(&self, buffer: RawHandle) -> Option<u32> {
    self.state.borrow().buffers.get(&buffer).and_then(|b| b.usage)
  }

  pub fn enabled_attribs(&self, vertex_array: RawHandle) -> Vec<u32> {
    self
      .state
      .borrow()
      .vertex_arrays
      .get(&vertex_array)
      .map(|vao| vao.enabled.iter().copied().collect())
      .unwrap_or_default()
  }

  pub fn attrib_pointer(&self, vertex_array: RawHandle, index: u32) -> Option<AttribPointerRecord> {
    self
      .state
      .borrow()
      .vertex_arrays
      .get(&vertex_array)
      .and_then(|vao| vao.pointers.get(&index).copied())
  }

  pub fn uniform_value(&self, program: RawHandle, location: UniformLocation) -> Option<UniformRecord> {
    self
      .state
      .borrow()
      .programs
      .get(&program)
      .and_then(|p| p.uniform_values.get(&location.0).cloned())
  }

  /// Color attachment the fragment output `name` was assigned at the last link.
  pub fn fragment_output(&self, program: RawHandle, name: &str) -> Option<u32> {
    self.state.borrow().programs.get(&program).and_then(|p| p.outputs.get(name).copied())
  }

  fn set_uniform(&self, location: UniformLocation, value: UniformRecord) {
    let mut guard = self.state.borrow_mut();
    let state = &mut *guard;
    let Some(program) = state.current_program.and_then(|h| state.programs.get_mut(&h)) else {
      state.error(glow::INVALID_OPERATION);
      return;
    };
    if program.uniforms.values().any(|l| *l == location.0) {
      program.uniform_values.insert(location.0, value);
    } else {
      state.error(glow::INVALID_OPERATION);
    }
  }
}

impl GlApi for HeadlessGl {
  fn get_error(&self) -> u32 {
    self.state.borrow_mut().errors.pop_front().unwrap_or(glow::NO_ERROR)
  }

  fn create_shader(&self, stage: u32) -> std::result::Result<RawHandle, String> {
    let mut state = self.state.borrow_mut();
    if ![glow::VERTEX_SHADER, glow::FRAGMENT_SHADER, glow::GEOMETRY_SHADER].contains(&stage) {
      state.error(glow::INVALID_ENUM);
      return Err(format!("invalid shader type 0x{stage:04X}"));
    }
    let handle = state.allocate()?;
    state.shaders.insert(handle, ShaderObject {
      stage,
      source: String::new(),
      compiled: false,
      log: String::new(),
    });
    Ok(handle)
  }

  fn shader_source(&self, shader: RawHandle, source: &str) {
    let mut state = self.state.borrow_mut();
    match state.shaders.get_mut(&shader) {
      Some(object) => object.source = source.to_owned(),
      None => state.error(glow::INVALID_VALUE),
    }
  }

  fn compile_shader(&self, shader: RawHandle) {
    let mut state = self.state.borrow_mut();
    match state.shaders.get_mut(&shader) {
      Some(object) => match check_source(&object.source) {
        Ok(()) => {
          object.compiled = true;
          object.log.clear();
        }
        Err(log) => {
          object.compiled = false;
          object.log = log;
        }
      },
      None => state.error(glow::INVALID_VALUE),
    }
  }

  fn shader_compile_status(&self, shader: RawHandle) -> bool {
    self.state.borrow().shaders.get(&shader).is_some_and(|s| s.compiled)
  }

  fn shader_info_log(&self, shader: RawHandle) -> String {
    self.state.borrow().shaders.get(&shader).map(|s| s.log.clone()).unwrap_or_default()
  }

  fn delete_shader(&self, shader: RawHandle) {
    let mut state = self.state.borrow_mut();
    if state.shaders.remove(&shader).is_none() {
      state.error(glow::INVALID_VALUE);
    }
  }

  fn create_program(&self) -> std::result::Result<RawHandle, String> {
    let mut state = self.state.borrow_mut();
    let handle = state.allocate()?;
    state.programs.insert(handle, ProgramObject::default());
    Ok(handle)
  }

  fn attach_shader(&self, program: RawHandle, shader: RawHandle) {
    let mut state = self.state.borrow_mut();
    if !state.shaders.contains_key(&shader) {
      state.error(glow::INVALID_VALUE);
      return;
    }
    match state.programs.get_mut(&program) {
      Some(object) if object.attached.contains(&shader) => state.error(glow::INVALID_OPERATION),
      Some(object) => object.attached.push(shader),
      None => state.error(glow::INVALID_VALUE),
    }
  }

  fn detach_shader(&self, program: RawHandle, shader: RawHandle) {
    let mut state = self.state.borrow_mut();
    match state.programs.get_mut(&program) {
      Some(object) => match object.attached.iter().position(|s| *s == shader) {
        Some(index) => {
          object.attached.remove(index);
        }
        None => state.error(glow::INVALID_OPERATION),
      },
      None => state.error(glow::INVALID_VALUE),
    }
  }

  fn bind_frag_data_location(&self, program: RawHandle, color: u32, name: &str) {
    let mut state = self.state.borrow_mut();
    if name.starts_with("gl_") {
      state.error(glow::INVALID_OPERATION);
      return;
    }
    match state.programs.get_mut(&program) {
      Some(object) => {
        object.frag_locations.insert(name.to_owned(), color);
      }
      None => state.error(glow::INVALID_VALUE),
    }
  }

  fn link_program(&self, program: RawHandle) {
    let mut guard = self.state.borrow_mut();
    let state = &mut *guard;
    let Some(object) = state.programs.get_mut(&program) else {
      state.error(glow::INVALID_VALUE);
      return;
    };

    let attached: Vec<&ShaderObject> =
      object.attached.iter().filter_map(|handle| state.shaders.get(handle)).collect();
    let result = link_sources(&attached, &object.frag_locations);

    object.uniform_values.clear();
    match result {
      Ok(interface) => {
        object.linked = true;
        object.log.clear();
        object.attribs = interface.attribs;
        object.uniforms = interface.uniforms;
        object.outputs = interface.outputs;
      }
      Err(log) => {
        object.linked = false;
        object.log = log;
        object.attribs.clear();
        object.uniforms.clear();
        object.outputs.clear();
      }
    }
  }

  fn program_link_status(&self, program: RawHandle) -> bool {
    self.state.borrow().programs.get(&program).is_some_and(|p| p.linked)
  }

  fn program_info_log(&self, program: RawHandle) -> String {
    self.state.borrow().programs.get(&program).map(|p| p.log.clone()).unwrap_or_default()
  }

  fn use_program(&self, program: Option<RawHandle>) {
    let mut state = self.state.borrow_mut();
    match program {
      Some(handle) if !state.programs.get(&handle).is_some_and(|p| p.linked) => {
        state.error(glow::INVALID_OPERATION)
      }
      _ => state.current_program = program,
    }
  }

  fn delete_program(&self, program: RawHandle) {
    let mut state = self.state.borrow_mut();
    if state.programs.remove(&program).is_none() {
      state.error(glow::INVALID_VALUE);
    }
    if state.current_program == Some(program) {
      state.current_program = None;
    }
  }

  fn attrib_location(&self, program: RawHandle, name: &str) -> Option<AttribLocation> {
    let state = self.state.borrow();
    let object = state.programs.get(&program)?;
    object.attribs.get(name).copied().map(AttribLocation)
  }

  fn uniform_location(&self, program: RawHandle, name: &str) -> Option<UniformLocation> {
    let state = self.state.borrow();
    let object = state.programs.get(&program)?;
    object.uniforms.get(name).copied().map(UniformLocation)
  }

  fn uniform_1_f32(&self, location: UniformLocation, x: f32) {
    self.set_uniform(location, UniformRecord::Float(x));
  }

  fn uniform_1_i32(&self, location: UniformLocation, x: i32) {
    self.set_uniform(location, UniformRecord::Int(x));
  }

  fn uniform_3_f32(&self, location: UniformLocation, x: f32, y: f32, z: f32) {
    self.set_uniform(location, UniformRecord::Vec3([x, y, z]));
  }

  fn uniform_4_f32(&self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32) {
    self.set_uniform(location, UniformRecord::Vec4([x, y, z, w]));
  }

  fn uniform_matrix_4_f32(&self, location: UniformLocation, columns: &[f32; 16]) {
    self.set_uniform(location, UniformRecord::Mat4(*columns));
  }

  fn create_vertex_array(&self) -> std::result::Result<RawHandle, String> {
    let mut state = self.state.borrow_mut();
    let handle = state.allocate()?;
    state.vertex_arrays.insert(handle, VertexArrayObject::default());
    Ok(handle)
  }

  fn bind_vertex_array(&self, vertex_array: Option<RawHandle>) {
    let mut state = self.state.borrow_mut();
    match vertex_array {
      Some(handle) if !state.vertex_arrays.contains_key(&handle) => {
        state.error(glow::INVALID_OPERATION)
      }
      _ => state.bound_vertex_array = vertex_array,
    }
  }

  fn delete_vertex_array(&self, vertex_array: RawHandle) {
    let mut state = self.state.borrow_mut();
    state.vertex_arrays.remove(&vertex_array);
    if state.bound_vertex_array == Some(vertex_array) {
      state.bound_vertex_array = None;
    }
  }

  fn enable_vertex_array_attrib(&self, vertex_array: RawHandle, index: AttribLocation) {
    let mut state = self.state.borrow_mut();
    match state.vertex_arrays.get_mut(&vertex_array) {
      Some(object) => {
        object.enabled.insert(index.0);
      }
      None => state.error(glow::INVALID_OPERATION),
    }
  }

  fn vertex_attrib_pointer_f32(
    &self,
    index: AttribLocation,
    size: i32,
    normalized: bool,
    stride: i32,
    offset: i32,
  ) {
    let mut guard = self.state.borrow_mut();
    let state = &mut *guard;
    if !(1..=4).contains(&size) || stride < 0 {
      state.error(glow::INVALID_VALUE);
      return;
    }
    let buffer = state.bound_array_buffer;
    if buffer.is_none() && offset != 0 {
      state.error(glow::INVALID_OPERATION);
      return;
    }
    let Some(object) = state.bound_vertex_array.and_then(|h| state.vertex_arrays.get_mut(&h))
    else {
      state.error(glow::INVALID_OPERATION);
      return;
    };
    object.pointers.insert(index.0, AttribPointerRecord {
      size,
      normalized,
      stride,
      offset,
      buffer,
    });
  }

  fn create_buffer(&self) -> std::result::Result<RawHandle, String> {
    let mut state = self.state.borrow_mut();
    let handle = state.allocate()?;
    state.buffers.insert(handle, BufferObject { data: Vec::new(), usage: None });
    Ok(handle)
  }

  fn bind_buffer(&self, target: u32, buffer: Option<RawHandle>) {
    let mut state = self.state.borrow_mut();
    if target != glow::ARRAY_BUFFER {
      state.error(glow::INVALID_ENUM);
      return;
    }
    match buffer {
      Some(handle) if !state.buffers.contains_key(&handle) => state.error(glow::INVALID_OPERATION),
      _ => state.bound_array_buffer = buffer,
    }
  }

  fn buffer_data(&self, target: u32, data: &[u8], usage: u32) {
    let mut guard = self.state.borrow_mut();
    let state = &mut *guard;
    if target != glow::ARRAY_BUFFER {
      state.error(glow::INVALID_ENUM);
      return;
    }
    match state.bound_array_buffer.and_then(|h| state.buffers.get_mut(&h)) {
      Some(object) => {
        object.data = data.to_vec();
        object.usage = Some(usage);
      }
      None => state.error(glow::INVALID_OPERATION),
    }
  }

  fn delete_buffer(&self, buffer: RawHandle) {
    let mut state = self.state.borrow_mut();
    state.buffers.remove(&buffer);
    if state.bound_array_buffer == Some(buffer) {
      state.bound_array_buffer = None;
    }
  }
}

fn check_source(source: &str) -> std::result::Result<(), String> {
  let code = strip_comments(source);
  let trimmed = code.trim_start();
  if !trimmed.starts_with("#version") {
    return Err("0:1(1): error: syntax error, expected #version directive".to_owned());
  }
  if !code.contains("void main") {
    return Err("0:0(0): error: no definition of main() found".to_owned());
  }

  let mut open = Vec::new();
  for (line_no, line) in code.lines().enumerate() {
    for c in line.chars() {
      match c {
        '(' | '{' | '[' => open.push(c),
        ')' | '}' | ']' => {
          let expected = match c {
            ')' => '(',
            '}' => '{',
            _ => '[',
          };
          if open.pop() != Some(expected) {
            return Err(format!("0:{}(1): error: syntax error, unexpected '{}'", line_no + 1, c));
          }
        }
        _ => {}
      }
    }
  }
  match open.last() {
    Some(c) => Err(format!("0:0(0): error: syntax error, unclosed '{c}'")),
    None => Ok(()),
  }
}

fn strip_comments(source: &str) -> String {
  let mut out = String::with_capacity(source.len());
  let mut rest = source;
  while let Some(start) = rest.find("/*") {
    out.push_str(&rest[..start]);
    rest = match rest[start + 2..].find("*/") {
      Some(end) => &rest[start + 2 + end + 2..],
      None => "",
    };
  }
  out.push_str(rest);

  out
    .lines()
    .map(|line| line.split("//").next().unwrap_or(""))
    .collect::<Vec<_>>()
    .join("\n")
}

struct Declaration {
  qualifier: &'static str,
  name:      String,
  location:  Option<u32>,
}

// Parses lines shaped like `layout(location = 1) in vec3 color;` or `uniform mat4 mvp;`.
fn declarations(source: &str) -> Vec<Declaration> {
  let code = strip_comments(source)
    .lines()
    .filter(|line| !line.trim_start().starts_with('#'))
    .collect::<Vec<_>>()
    .join("\n");

  let mut found = Vec::new();
  for statement in code.split(';') {
    let mut statement = statement.trim();
    if let Some(brace) = statement.rfind(['{', '}']) {
      statement = statement[brace + 1..].trim();
    }

    let mut location = None;
    if let Some(rest) = statement.strip_prefix("layout") {
      let Some(open) = rest.find('(') else { continue };
      let Some(close) = rest[open..].find(')').map(|offset| open + offset) else { continue };
      location = rest[open + 1..close]
        .split(',')
        .filter_map(|item| item.split_once('='))
        .find(|(key, _)| key.trim() == "location")
        .and_then(|(_, value)| value.trim().parse().ok());
      statement = rest[close + 1..].trim();
    }

    let mut words = statement.split_whitespace();
    let qualifier = match words.next() {
      Some("in") | Some("attribute") => "in",
      Some("out") => "out",
      Some("uniform") => "uniform",
      _ => continue,
    };
    let words: Vec<&str> = words
      .filter(|w| !matches!(*w, "highp" | "mediump" | "lowp" | "flat" | "smooth"))
      .collect();
    if words.len() < 2 {
      continue;
    }
    for name in words[1..].join(" ").split(',') {
      let name = name.trim().split('[').next().unwrap_or("").trim();
      if !name.is_empty() {
        found.push(Declaration { qualifier, name: name.to_owned(), location });
      }
    }
  }
  found
}

struct LinkedInterface {
  attribs:  FxHashMap<String, u32>,
  uniforms: FxHashMap<String, u32>,
  outputs:  FxHashMap<String, u32>,
}

fn link_sources(
  shaders: &[&ShaderObject],
  frag_locations: &FxHashMap<String, u32>,
) -> std::result::Result<LinkedInterface, String> {
  if let Some(uncompiled) = shaders.iter().find(|s| !s.compiled) {
    return Err(format!(
      "error: linking with uncompiled/unspecialized shader (stage 0x{:04X})",
      uncompiled.stage
    ));
  }
  if !shaders.iter().any(|s| s.stage == glow::VERTEX_SHADER) {
    return Err("error: program lacks a vertex shader".to_owned());
  }
  if !shaders.iter().any(|s| s.stage == glow::FRAGMENT_SHADER) {
    return Err("error: program lacks a fragment shader".to_owned());
  }

  let mut interface = LinkedInterface {
    attribs:  FxHashMap::default(),
    uniforms: FxHashMap::default(),
    outputs:  FxHashMap::default(),
  };
  let mut used_attrib_slots = FxHashSet::default();
  let mut pending_attribs = Vec::new();

  for shader in shaders {
    for declaration in declarations(&shader.source) {
      match (shader.stage, declaration.qualifier) {
        (glow::VERTEX_SHADER, "in") => match declaration.location {
          Some(slot) => {
            used_attrib_slots.insert(slot);
            interface.attribs.insert(declaration.name, slot);
          }
          None => pending_attribs.push(declaration.name),
        },
        (glow::FRAGMENT_SHADER, "out") => {
          let slot = declaration
            .location
            .or_else(|| frag_locations.get(&declaration.name).copied())
            .unwrap_or(interface.outputs.len() as u32);
          interface.outputs.insert(declaration.name, slot);
        }
        (_, "uniform") => {
          let next = interface.uniforms.len() as u32;
          interface.uniforms.entry(declaration.name).or_insert(next);
        }
        _ => {}
      }
    }
  }

  let mut next_slot = 0;
  for name in pending_attribs {
    if interface.attribs.contains_key(&name) {
      continue;
    }
    while used_attrib_slots.contains(&next_slot) {
      next_slot += 1;
    }
    used_attrib_slots.insert(next_slot);
    interface.attribs.insert(name, next_slot);
  }

  Ok(interface)
}

#[derive(Default)]
struct SurfaceState {
  close_requested: bool,
  pressed:         FxHashSet<KeyCode>,
  polls:           usize,
  swaps:           usize,
}

/// Window surface without a display. Clones share state, so a test can keep one clone to
/// press keys while the [`crate::Window`] owns the other.
#[derive(Clone, Default)]
pub struct HeadlessSurface {
  state: Rc<RefCell<SurfaceState>>,
}

impl HeadlessSurface {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn press(&self, key: KeyCode) {
    self.state.borrow_mut().pressed.insert(key);
  }

  pub fn release(&self, key: KeyCode) {
    self.state.borrow_mut().pressed.remove(&key);
  }

  /// Simulates the user clicking the close button.
  pub fn request_close_from_user(&self) {
    self.state.borrow_mut().close_requested = true;
  }

  pub fn polls(&self) -> usize {
    self.state.borrow().polls
  }

  pub fn swaps(&self) -> usize {
    self.state.borrow().swaps
  }
}

impl Surface for HeadlessSurface {
  fn request_close(&mut self) {
    self.state.borrow_mut().close_requested = true;
  }

  fn close_requested(&self) -> bool {
    self.state.borrow().close_requested
  }

  fn poll_events(&mut self) {
    self.state.borrow_mut().polls += 1;
  }

  fn swap_buffers(&mut self) -> Result<()> {
    self.state.borrow_mut().swaps += 1;
    Ok(())
  }

  fn is_key_pressed(&self, key: KeyCode) -> bool {
    self.state.borrow().pressed.contains(&key)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn structural_check_accepts_minimal_shader() {
    assert!(check_source("#version 330 core\nvoid main() {}\n").is_ok());
    assert!(check_source("// header\n#version 330 core\nvoid main() { }").is_ok());
  }

  #[test]
  fn structural_check_rejects_broken_sources() {
    assert!(check_source("void main() {}").is_err());
    assert!(check_source("#version 330 core\nint x;").is_err());
    assert!(check_source("#version 330 core\nvoid main() { if (x { }").is_err());
  }

  #[test]
  fn declarations_understand_layouts_and_lists() {
    let source = "#version 330 core\n\
      layout(location = 2) in vec3 color;\n\
      in vec3 position, normal;\n\
      uniform mat4 model; // transform\n\
      uniform float weights[4];\n\
      out vec4 fragColor;\n";
    let found = declarations(source);
    let names: Vec<(&str, &str, Option<u32>)> = found
      .iter()
      .map(|d| (d.qualifier, d.name.as_str(), d.location))
      .collect();

    assert_eq!(names, vec![
      ("in", "color", Some(2)),
      ("in", "position", None),
      ("in", "normal", None),
      ("uniform", "model", None),
      ("uniform", "weights", None),
      ("out", "fragColor", None),
    ]);
  }

  #[test]
  fn explicit_attribute_slots_are_skipped_when_assigning() {
    let vertex = ShaderObject {
      stage:    glow::VERTEX_SHADER,
      source:   "#version 330 core\nin vec2 uv;\nlayout(location = 0) in vec3 position;\nvoid main() {}".to_owned(),
      compiled: true,
      log:      String::new(),
    };
    let fragment = ShaderObject {
      stage:    glow::FRAGMENT_SHADER,
      source:   "#version 330 core\nout vec4 color;\nvoid main() {}".to_owned(),
      compiled: true,
      log:      String::new(),
    };
    let interface = link_sources(&[&vertex, &fragment], &FxHashMap::default()).unwrap();

    assert_eq!(interface.attribs["position"], 0);
    assert_eq!(interface.attribs["uv"], 1);
    assert_eq!(interface.outputs["color"], 0);
  }

  #[test]
  fn stray_layout_parenthesis_does_not_break_linking() {
    let source = "#version 330 core\nin vec3 position;\nvoid main() { for(;;layout)(0); }\n";
    assert!(check_source(source).is_ok());
    assert_eq!(declarations(source).len(), 1);

    let vertex = ShaderObject {
      stage:    glow::VERTEX_SHADER,
      source:   source.to_owned(),
      compiled: true,
      log:      String::new(),
    };
    let fragment = ShaderObject {
      stage:    glow::FRAGMENT_SHADER,
      source:   "#version 330 core\nout vec4 color;\nvoid main() {}".to_owned(),
      compiled: true,
      log:      String::new(),
    };
    let interface = link_sources(&[&vertex, &fragment], &FxHashMap::default()).unwrap();
    assert_eq!(interface.attribs["position"], 0);
  }
}
