//! The fixed OpenGL entry points this crate issues.
//!
//! Every wrapper talks to the driver through [`GlApi`] rather than through `glow` directly.
//! The trait is deliberately narrow: it lists exactly the calls the wrappers make and
//! nothing else, so the whole device surface of the crate can be read in one place.
//! `glow::Context` is the production implementation; `HeadlessGl` (`headless` feature) is
//! a software stand-in used when no driver is available.

use std::num::NonZeroU32;

use glow::HasContext;

/// Opaque identifier of a device object (shader, program, vertex array, buffer).
pub type RawHandle = NonZeroU32;

/// Location of a uniform inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Location of a vertex attribute inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttribLocation(pub u32);

pub trait GlApi {
  fn get_error(&self) -> u32;

  fn create_shader(&self, stage: u32) -> Result<RawHandle, String>;
  fn shader_source(&self, shader: RawHandle, source: &str);
  fn compile_shader(&self, shader: RawHandle);
  fn shader_compile_status(&self, shader: RawHandle) -> bool;
  fn shader_info_log(&self, shader: RawHandle) -> String;
  fn delete_shader(&self, shader: RawHandle);

  fn create_program(&self) -> Result<RawHandle, String>;
  fn attach_shader(&self, program: RawHandle, shader: RawHandle);
  fn detach_shader(&self, program: RawHandle, shader: RawHandle);
  fn bind_frag_data_location(&self, program: RawHandle, color: u32, name: &str);
  fn link_program(&self, program: RawHandle);
  fn program_link_status(&self, program: RawHandle) -> bool;
  fn program_info_log(&self, program: RawHandle) -> String;
  fn use_program(&self, program: Option<RawHandle>);
  fn delete_program(&self, program: RawHandle);

  fn attrib_location(&self, program: RawHandle, name: &str) -> Option<AttribLocation>;
  fn uniform_location(&self, program: RawHandle, name: &str) -> Option<UniformLocation>;
  fn uniform_1_f32(&self, location: UniformLocation, x: f32);
  fn uniform_1_i32(&self, location: UniformLocation, x: i32);
  fn uniform_3_f32(&self, location: UniformLocation, x: f32, y: f32, z: f32);
  fn uniform_4_f32(&self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32);
  /// `columns` is column-major, as GL expects when `transpose` is false.
  fn uniform_matrix_4_f32(&self, location: UniformLocation, columns: &[f32; 16]);

  fn create_vertex_array(&self) -> Result<RawHandle, String>;
  fn bind_vertex_array(&self, vertex_array: Option<RawHandle>);
  fn delete_vertex_array(&self, vertex_array: RawHandle);
  fn enable_vertex_array_attrib(&self, vertex_array: RawHandle, index: AttribLocation);
  /// Describes float attribute `index` of the bound vertex array, reading the bound
  /// array buffer. `stride` and `offset` are in bytes.
  fn vertex_attrib_pointer_f32(
    &self,
    index: AttribLocation,
    size: i32,
    normalized: bool,
    stride: i32,
    offset: i32,
  );

  fn create_buffer(&self) -> Result<RawHandle, String>;
  fn bind_buffer(&self, target: u32, buffer: Option<RawHandle>);
  fn buffer_data(&self, target: u32, data: &[u8], usage: u32);
  fn delete_buffer(&self, buffer: RawHandle);
}

// All of the calls below are only sound while the context that produced this
// `glow::Context` is current on the calling thread. `Context` is `!Send`, and
// `Context::api` refuses to hand this out once the owning window has been dropped.
impl GlApi for glow::Context {
  fn get_error(&self) -> u32 {
    unsafe { HasContext::get_error(self) }
  }

  fn create_shader(&self, stage: u32) -> Result<RawHandle, String> {
    unsafe { HasContext::create_shader(self, stage) }.map(|shader| shader.0)
  }

  fn shader_source(&self, shader: RawHandle, source: &str) {
    unsafe { HasContext::shader_source(self, glow::NativeShader(shader), source) }
  }

  fn compile_shader(&self, shader: RawHandle) {
    unsafe { HasContext::compile_shader(self, glow::NativeShader(shader)) }
  }

  fn shader_compile_status(&self, shader: RawHandle) -> bool {
    unsafe { self.get_shader_compile_status(glow::NativeShader(shader)) }
  }

  fn shader_info_log(&self, shader: RawHandle) -> String {
    unsafe { self.get_shader_info_log(glow::NativeShader(shader)) }
  }

  fn delete_shader(&self, shader: RawHandle) {
    unsafe { HasContext::delete_shader(self, glow::NativeShader(shader)) }
  }

  fn create_program(&self) -> Result<RawHandle, String> {
    unsafe { HasContext::create_program(self) }.map(|program| program.0)
  }

  fn attach_shader(&self, program: RawHandle, shader: RawHandle) {
    unsafe {
      HasContext::attach_shader(self, glow::NativeProgram(program), glow::NativeShader(shader))
    }
  }

  fn detach_shader(&self, program: RawHandle, shader: RawHandle) {
    unsafe {
      HasContext::detach_shader(self, glow::NativeProgram(program), glow::NativeShader(shader))
    }
  }

  fn bind_frag_data_location(&self, program: RawHandle, color: u32, name: &str) {
    unsafe { HasContext::bind_frag_data_location(self, glow::NativeProgram(program), color, name) }
  }

  fn link_program(&self, program: RawHandle) {
    unsafe { HasContext::link_program(self, glow::NativeProgram(program)) }
  }

  fn program_link_status(&self, program: RawHandle) -> bool {
    unsafe { self.get_program_link_status(glow::NativeProgram(program)) }
  }

  fn program_info_log(&self, program: RawHandle) -> String {
    unsafe { self.get_program_info_log(glow::NativeProgram(program)) }
  }

  fn use_program(&self, program: Option<RawHandle>) {
    unsafe { HasContext::use_program(self, program.map(glow::NativeProgram)) }
  }

  fn delete_program(&self, program: RawHandle) {
    unsafe { HasContext::delete_program(self, glow::NativeProgram(program)) }
  }

  fn attrib_location(&self, program: RawHandle, name: &str) -> Option<AttribLocation> {
    unsafe { self.get_attrib_location(glow::NativeProgram(program), name) }.map(AttribLocation)
  }

  fn uniform_location(&self, program: RawHandle, name: &str) -> Option<UniformLocation> {
    unsafe { self.get_uniform_location(glow::NativeProgram(program), name) }
      .map(|location| UniformLocation(location.0))
  }

  fn uniform_1_f32(&self, location: UniformLocation, x: f32) {
    let location = glow::NativeUniformLocation(location.0);
    unsafe { HasContext::uniform_1_f32(self, Some(&location), x) }
  }

  fn uniform_1_i32(&self, location: UniformLocation, x: i32) {
    let location = glow::NativeUniformLocation(location.0);
    unsafe { HasContext::uniform_1_i32(self, Some(&location), x) }
  }

  fn uniform_3_f32(&self, location: UniformLocation, x: f32, y: f32, z: f32) {
    let location = glow::NativeUniformLocation(location.0);
    unsafe { HasContext::uniform_3_f32(self, Some(&location), x, y, z) }
  }

  fn uniform_4_f32(&self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32) {
    let location = glow::NativeUniformLocation(location.0);
    unsafe { HasContext::uniform_4_f32(self, Some(&location), x, y, z, w) }
  }

  fn uniform_matrix_4_f32(&self, location: UniformLocation, columns: &[f32; 16]) {
    let location = glow::NativeUniformLocation(location.0);
    unsafe { self.uniform_matrix_4_f32_slice(Some(&location), false, columns) }
  }

  fn create_vertex_array(&self) -> Result<RawHandle, String> {
    unsafe { HasContext::create_vertex_array(self) }.map(|vertex_array| vertex_array.0)
  }

  fn bind_vertex_array(&self, vertex_array: Option<RawHandle>) {
    unsafe { HasContext::bind_vertex_array(self, vertex_array.map(glow::NativeVertexArray)) }
  }

  fn delete_vertex_array(&self, vertex_array: RawHandle) {
    unsafe { HasContext::delete_vertex_array(self, glow::NativeVertexArray(vertex_array)) }
  }

  fn enable_vertex_array_attrib(&self, vertex_array: RawHandle, index: AttribLocation) {
    unsafe {
      HasContext::enable_vertex_array_attrib(self, glow::NativeVertexArray(vertex_array), index.0)
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
    unsafe {
      HasContext::vertex_attrib_pointer_f32(
        self,
        index.0,
        size,
        glow::FLOAT,
        normalized,
        stride,
        offset,
      )
    }
  }

  fn create_buffer(&self) -> Result<RawHandle, String> {
    unsafe { HasContext::create_buffer(self) }.map(|buffer| buffer.0)
  }

  fn bind_buffer(&self, target: u32, buffer: Option<RawHandle>) {
    unsafe { HasContext::bind_buffer(self, target, buffer.map(glow::NativeBuffer)) }
  }

  fn buffer_data(&self, target: u32, data: &[u8], usage: u32) {
    unsafe { self.buffer_data_u8_slice(target, data, usage) }
  }

  fn delete_buffer(&self, buffer: RawHandle) {
    unsafe { HasContext::delete_buffer(self, glow::NativeBuffer(buffer)) }
  }
}
