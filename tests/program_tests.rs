//! Shader Program Tests
//!
//! Tests for:
//! - Linking success and failure (missing stage, uncompiled unit)
//! - Uniform lookup, value upload and the active-program rule
//! - Location cache invalidation across relinks
//! - Attribute pointer preconditions and byte scaling

use std::rc::Rc;

use glam::{Mat4, Vec3, Vec4};

use glwrap::headless::{HeadlessGl, UniformRecord};
use glwrap::{
  Context,
  Error,
  LinkState,
  Program,
  Shader,
  ShaderStage,
  VertexArray,
  VertexBuffer,
};

const VERTEX_SOURCE: &str = "#version 330 core
layout(location = 0) in vec3 position;
in vec2 uv;
in vec3 normal;
uniform mat4 model;
uniform mat4 viewProjection;
void main() {
  gl_Position = viewProjection * model * vec4(position, 1.0);
}
";

const FRAGMENT_SOURCE: &str = "#version 330 core
uniform vec4 tint;
uniform float exposure;
uniform int mode;
uniform vec3 lightDirection;
out vec4 color;
void main() {
  color = tint * exposure;
}
";

// A second vertex stage declaring the same names in a different order.
const REORDERED_VERTEX_SOURCE: &str = "#version 330 core
uniform mat4 viewProjection;
uniform mat4 model;
in vec3 normal;
in vec3 position;
void main() {
  gl_Position = viewProjection * model * vec4(position + normal, 1.0);
}
";

fn device() -> (Rc<HeadlessGl>, Rc<Context>) {
  let _ = env_logger::builder().is_test(true).try_init();
  let gl = Rc::new(HeadlessGl::new());
  let context = Context::new(gl.clone());
  (gl, context)
}

fn linked_program(context: &Rc<Context>) -> (Program, Shader, Shader) {
  let vertex = Shader::from_source(context, ShaderStage::Vertex, VERTEX_SOURCE).unwrap();
  let fragment = Shader::from_source(context, ShaderStage::Fragment, FRAGMENT_SOURCE).unwrap();
  let mut program = Program::new(context);
  program.attach(&vertex);
  program.attach(&fragment);
  program.link().unwrap();
  (program, vertex, fragment)
}

// ============================================================================
// Linking
// ============================================================================

#[test]
fn link_succeeds_with_vertex_and_fragment_stages() {
  let (_gl, context) = device();
  let (program, _vertex, _fragment) = linked_program(&context);

  assert!(program.is_linked());
  assert_eq!(program.state(), LinkState::Linked);
  assert_eq!(program.attached_shaders().len(), 2);
  assert!(program.info_log().is_empty());
}

#[test]
fn link_fails_without_a_vertex_stage() {
  let (_gl, context) = device();
  let fragment = Shader::from_source(&context, ShaderStage::Fragment, FRAGMENT_SOURCE).unwrap();
  let mut program = Program::new(&context);
  program.attach(&fragment);

  match program.link() {
    Err(Error::Link { log }) => assert!(log.contains("vertex")),
    other => panic!("expected a link error, got {other:?}"),
  }
  assert_eq!(program.state(), LinkState::Failed);
  assert!(!program.info_log().is_empty());
}

#[test]
fn link_fails_with_an_uncompiled_unit() {
  let (_gl, context) = device();
  let mut vertex = Shader::new(&context, ShaderStage::Vertex);
  vertex.set_source(VERTEX_SOURCE);
  let fragment = Shader::from_source(&context, ShaderStage::Fragment, FRAGMENT_SOURCE).unwrap();

  let mut program = Program::new(&context);
  program.attach(&vertex);
  program.attach(&fragment);
  assert!(matches!(program.link(), Err(Error::Link { .. })));
}

#[test]
fn attaching_twice_is_a_no_op() {
  let (_gl, context) = device();
  let (mut program, vertex, _fragment) = linked_program(&context);

  program.attach(&vertex);
  assert_eq!(program.attached_shaders().len(), 2);
  assert!(program.is_linked());
}

#[test]
fn detach_leaves_the_program_unlinked() {
  let (_gl, context) = device();
  let (mut program, vertex, _fragment) = linked_program(&context);

  program.detach(&vertex);
  assert_eq!(program.state(), LinkState::Unlinked);
  assert!(program.link().is_err());
}

#[test]
#[should_panic(expected = "not linked")]
fn using_an_unlinked_program_panics() {
  let (_gl, context) = device();
  let program = Program::new(&context);
  program.use_program();
}

#[test]
fn dropping_the_active_program_clears_the_slot() {
  let (gl, context) = device();
  let (program, _vertex, _fragment) = linked_program(&context);
  program.use_program();

  drop(program);
  assert_eq!(context.bound_program(), None);
  assert_eq!(gl.current_program(), None);
}

// ============================================================================
// Uniforms
// ============================================================================

#[test]
fn uniform_values_reach_the_device() {
  let (gl, context) = device();
  let (program, _vertex, _fragment) = linked_program(&context);
  program.use_program();

  let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
  program.set_uniform_by_name("model", model);
  program.set_uniform_by_name("tint", Vec4::new(0.5, 0.25, 1.0, 1.0));
  program.set_uniform_by_name("exposure", 2.0f32);
  program.set_uniform_by_name("mode", 3i32);
  program.set_uniform_by_name("lightDirection", Vec3::NEG_Y);

  let handle = program.handle();
  assert_eq!(
    gl.uniform_value(handle, program.uniform_location("model")),
    Some(UniformRecord::Mat4(model.to_cols_array()))
  );
  assert_eq!(
    gl.uniform_value(handle, program.uniform_location("tint")),
    Some(UniformRecord::Vec4([0.5, 0.25, 1.0, 1.0]))
  );
  assert_eq!(
    gl.uniform_value(handle, program.uniform_location("exposure")),
    Some(UniformRecord::Float(2.0))
  );
  assert_eq!(
    gl.uniform_value(handle, program.uniform_location("mode")),
    Some(UniformRecord::Int(3))
  );
  assert_eq!(
    gl.uniform_value(handle, program.uniform_location("lightDirection")),
    Some(UniformRecord::Vec3([0.0, -1.0, 0.0]))
  );
  assert_eq!(glwrap::check_errors(&context), 0);
}

#[test]
fn translation_lands_in_the_last_column() {
  let (gl, context) = device();
  let (program, _vertex, _fragment) = linked_program(&context);
  program.use_program();

  let location = program.uniform_location("model");
  program.set_uniform(location, Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0)));

  let Some(UniformRecord::Mat4(columns)) = gl.uniform_value(program.handle(), location) else {
    panic!("model was not uploaded");
  };
  assert_eq!(&columns[12..15], &[4.0, 5.0, 6.0]);
}

#[test]
#[should_panic(expected = "Unable to find uniform `missing`")]
fn unknown_uniform_panics() {
  let (_gl, context) = device();
  let (program, _vertex, _fragment) = linked_program(&context);
  program.uniform_location("missing");
}

#[test]
#[should_panic(expected = "not in use")]
fn setting_a_uniform_on_an_inactive_program_panics() {
  let (_gl, context) = device();
  let (program, _vertex, _fragment) = linked_program(&context);
  program.set_uniform_by_name("exposure", 1.0f32);
}

#[test]
fn relinking_drops_cached_locations() {
  let (_gl, context) = device();
  let (mut program, vertex, _fragment) = linked_program(&context);
  let before = program.uniform_location("viewProjection");
  assert_eq!(program.uniform_location("viewProjection"), before);
  let normal_before = program.attrib_location("normal");

  let reordered =
    Shader::from_source(&context, ShaderStage::Vertex, REORDERED_VERTEX_SOURCE).unwrap();
  program.detach(&vertex);
  program.attach(&reordered);
  program.link().unwrap();

  assert_ne!(program.uniform_location("viewProjection"), before);
  assert_ne!(program.attrib_location("normal"), normal_before);
}

// ============================================================================
// Vertex attributes
// ============================================================================

#[test]
fn explicit_attribute_slots_are_kept() {
  let (_gl, context) = device();
  let (program, _vertex, _fragment) = linked_program(&context);

  assert_eq!(program.attrib_location("position").0, 0);
  assert_eq!(program.attrib_location("uv").0, 1);
  assert_eq!(program.attrib_location("normal").0, 2);
}

#[test]
fn attribute_pointer_scales_floats_to_bytes() {
  let (gl, context) = device();
  let (program, _vertex, _fragment) = linked_program(&context);

  let vertex_array = VertexArray::new(&context);
  vertex_array.bind();
  let mut buffer = VertexBuffer::new(&context);
  buffer.data(&[0.0f32; 8 * 3]);

  let pointer = program.vertex_attrib_pointer_f32(&vertex_array, "position", 0, 3, false, 8);
  assert_eq!(pointer.stride, 32);
  assert_eq!(pointer.offset, 0);

  let uv = program.vertex_attrib_pointer_f32(&vertex_array, "uv", 3, 2, false, 8);
  assert_eq!(uv.offset, 12);

  let recorded = gl.attrib_pointer(vertex_array.handle(), 0).unwrap();
  assert_eq!(recorded.stride, 32);
  assert_eq!(recorded.size, 3);
  assert!(!recorded.normalized);
  assert_eq!(gl.enabled_attribs(vertex_array.handle()), vec![0, 1]);
}

#[test]
#[should_panic(expected = "must be bound")]
fn attribute_pointer_requires_the_vertex_array_bound() {
  let (_gl, context) = device();
  let (program, _vertex, _fragment) = linked_program(&context);
  let vertex_array = VertexArray::new(&context);
  let buffer = VertexBuffer::new(&context);
  buffer.bind();

  program.vertex_attrib_pointer_f32(&vertex_array, "position", 0, 3, false, 3);
}

#[test]
#[should_panic(expected = "array buffer must be bound")]
fn attribute_pointer_requires_an_array_buffer() {
  let (_gl, context) = device();
  let (program, _vertex, _fragment) = linked_program(&context);
  let vertex_array = VertexArray::new(&context);
  vertex_array.bind();

  program.vertex_attrib_pointer_f32(&vertex_array, "position", 0, 3, false, 3);
}

#[test]
#[should_panic(expected = "Unable to find attribute `missing`")]
fn unknown_attribute_panics() {
  let (_gl, context) = device();
  let (program, _vertex, _fragment) = linked_program(&context);
  program.attrib_location("missing");
}

#[test]
#[should_panic(expected = "Unable to find attribute `missing`")]
fn attribute_pointer_for_an_unknown_attribute_panics() {
  let (_gl, context) = device();
  let (program, _vertex, _fragment) = linked_program(&context);
  let vertex_array = VertexArray::new(&context);
  vertex_array.bind();
  let buffer = VertexBuffer::new(&context);
  buffer.bind();

  program.vertex_attrib_pointer_f32(&vertex_array, "missing", 0, 3, false, 3);
}
