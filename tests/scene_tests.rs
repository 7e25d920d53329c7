//! End-to-end scene setup on the headless device.
//!
//! Tests for:
//! - Window session lifecycle (open, close, drop order of resources)
//! - Pass-through shader pair compiled, linked and activated
//! - Four interleaved position/color triangles uploaded and described to a vertex array
//! - Error probe staying quiet through correct usage

use std::rc::Rc;

use glwrap::headless::{HeadlessGl, HeadlessSurface};
use glwrap::{
  ContextProperties,
  KeyCode,
  Program,
  Shader,
  ShaderStage,
  VertexArray,
  VertexBuffer,
  Window,
  check_errors,
};

const VERTEX_SOURCE: &str = r#"#version 450 core
in vec3 position;
in vec3 color;
out vec3 vertexColor;

void main() {
  gl_Position = vec4(position, 1.0);
  vertexColor = color;
}
"#;

const FRAGMENT_SOURCE: &str = r#"#version 450 core
in vec3 vertexColor;
out vec4 outColor;

void main() {
  outColor = vec4(vertexColor, 1.0);
}
"#;

/// Four triangles, each vertex `[x, y, z, r, g, b]`.
fn triangle_vertices() -> Vec<f32> {
  let mut vertices = Vec::with_capacity(4 * 3 * 6);
  for (i, (dx, dy)) in [(-0.5f32, -0.5f32), (0.5, -0.5), (-0.5, 0.5), (0.5, 0.5)]
    .into_iter()
    .enumerate()
  {
    let shade = i as f32 / 3.0;
    vertices.extend_from_slice(&[dx - 0.25, dy - 0.25, 0.0, 1.0, shade, 0.0]);
    vertices.extend_from_slice(&[dx + 0.25, dy - 0.25, 0.0, 0.0, 1.0, shade]);
    vertices.extend_from_slice(&[dx, dy + 0.25, 0.0, shade, 0.0, 1.0]);
  }
  vertices
}

fn headless_window(gl: &Rc<HeadlessGl>, surface: &HeadlessSurface) -> Window {
  let _ = env_logger::builder().is_test(true).try_init();
  Window::with_surface(
    "Triangles",
    800,
    600,
    ContextProperties {
      major_version:      4,
      minor_version:      5,
      core_profile:       true,
      forward_compatible: true,
    },
    Box::new(surface.clone()),
    gl.clone(),
  )
}

// ============================================================================
// Full pipeline
// ============================================================================

#[test]
fn four_triangles_are_uploaded_and_described() {
  let gl = Rc::new(HeadlessGl::new());
  let surface = HeadlessSurface::new();
  let mut window = headless_window(&gl, &surface);
  assert!(window.is_open());
  assert_eq!((window.width(), window.height()), (800, 600));
  let context = window.context().clone();

  let vertex = Shader::from_source(&context, ShaderStage::Vertex, VERTEX_SOURCE).unwrap();
  let fragment = Shader::from_source(&context, ShaderStage::Fragment, FRAGMENT_SOURCE).unwrap();

  let mut program = Program::new(&context);
  program.attach(&vertex);
  program.attach(&fragment);
  program.bind_fragment_location("outColor", 0);
  program.link().unwrap();
  program.use_program();
  assert!(program.is_active());
  assert_eq!(gl.current_program(), Some(program.handle()));
  assert_eq!(gl.fragment_output(program.handle(), "outColor"), Some(0));

  let vertex_array = VertexArray::new(&context);
  vertex_array.bind();
  let mut buffer = VertexBuffer::new(&context);
  let vertices = triangle_vertices();
  assert_eq!(vertices.len(), 72);
  buffer.data(&vertices);
  assert_eq!(buffer.size_bytes(), 72 * 4);

  let position = program.vertex_attrib_pointer_f32(&vertex_array, "position", 0, 3, false, 6);
  let color = program.vertex_attrib_pointer_f32(&vertex_array, "color", 3, 3, false, 6);
  assert_eq!((position.stride, position.offset), (24, 0));
  assert_eq!((color.stride, color.offset), (24, 12));

  let recorded = gl.attrib_pointer(vertex_array.handle(), position.location.0).unwrap();
  assert_eq!(recorded.size, 3);
  assert_eq!(recorded.stride, 24);
  assert_eq!(recorded.offset, 0);
  assert_eq!(recorded.buffer, Some(buffer.handle()));
  assert_eq!(
    gl.enabled_attribs(vertex_array.handle()),
    vec![position.location.0, color.location.0]
  );

  window.poll_events();
  window.swap_buffers().unwrap();
  assert_eq!(check_errors(&context), 0);

  window.close();
  assert!(!window.is_open());

  drop(buffer);
  drop(vertex_array);
  drop(program);
  drop(vertex);
  drop(fragment);
  assert_eq!(gl.live_programs(), 0);
  assert_eq!(gl.live_shaders(), 0);
  assert_eq!(gl.live_buffers(), 0);
  assert_eq!(gl.live_vertex_arrays(), 0);
  assert_eq!(check_errors(&context), 0);
}

// ============================================================================
// Session
// ============================================================================

#[test]
fn escape_key_drives_the_frame_loop_to_close() {
  let gl = Rc::new(HeadlessGl::new());
  let surface = HeadlessSurface::new();
  let mut window = headless_window(&gl, &surface);

  let mut frames = 0;
  while window.is_open() {
    window.poll_events();
    if frames == 3 {
      surface.press(KeyCode::Escape);
    }
    if window.is_key_pressed(KeyCode::Escape) {
      window.close();
    }
    window.swap_buffers().unwrap();
    frames += 1;
  }

  assert_eq!(frames, 4);
  assert_eq!(surface.swaps(), 4);
}

#[test]
fn misuse_shows_up_in_the_error_probe() {
  let gl = Rc::new(HeadlessGl::new());
  let surface = HeadlessSurface::new();
  let window = headless_window(&gl, &surface);
  let context = window.context().clone();

  // Bypass the wrappers: buffer upload with no array buffer bound.
  context.api().buffer_data(glow::ARRAY_BUFFER, &[0u8; 4], glow::STATIC_DRAW);
  assert_eq!(check_errors(&context), 1);
  assert_eq!(check_errors(&context), 0);
}
