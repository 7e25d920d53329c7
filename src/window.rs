//! Window and device-context session.
//!
//! A [`Window`] is the first object an application creates: every other resource needs the
//! [`Context`] it hands out. Title, size and context properties are fixed at construction.
//!
//! # Lifecycle
//! * `new` acquires the shared windowing subsystem, creates the native window with the
//!   requested context hints, makes the context current and loads GL functions
//! * `poll_events`/`swap_buffers`/`is_key_pressed` pass through to the surface
//! * `close` only requests shutdown; `is_open` turns false and the owner stops its loop
//! * dropping marks the context lost, requests close, drains events once and releases the
//!   surface; the subsystem is torn down when its last window goes away

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

use crate::{context::Context, device::GlApi, error::Result, native::NativeSurface};

/// Context creation hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextProperties {
  pub major_version:      u8,
  pub minor_version:      u8,
  pub core_profile:       bool,
  pub forward_compatible: bool,
}

impl Default for ContextProperties {
  fn default() -> Self {
    Self {
      major_version:      4,
      minor_version:      5,
      core_profile:       true,
      forward_compatible: true,
    }
  }
}

/// Everything needed to open a window, in a form an application can keep in its config.
///
/// ```
/// let descriptor: glwrap::WindowDescriptor =
///   serde_json::from_str(r#"{ "title": "viewer", "context": { "minor_version": 3 } }"#).unwrap();
/// assert_eq!(descriptor.width, 800);
/// assert_eq!(descriptor.context.major_version, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowDescriptor {
  pub title:   String,
  pub width:   u32,
  pub height:  u32,
  pub context: ContextProperties,
}

impl Default for WindowDescriptor {
  fn default() -> Self {
    Self {
      title:   "glwrap".to_owned(),
      width:   800,
      height:  600,
      context: ContextProperties::default(),
    }
  }
}

/// The event/input/present side of a window.
pub trait Surface {
  fn request_close(&mut self);
  fn close_requested(&self) -> bool;
  /// Processes pending events without blocking.
  fn poll_events(&mut self);
  fn swap_buffers(&mut self) -> Result<()>;
  fn is_key_pressed(&self, key: KeyCode) -> bool;
}

pub struct Window {
  title:      String,
  width:      u32,
  height:     u32,
  properties: ContextProperties,
  context:    Rc<Context>,
  surface:    Option<Box<dyn Surface>>,
}

impl Window {
  /// Opens a native window with a current GL context.
  pub fn new(
    title: &str,
    width: u32,
    height: u32,
    properties: ContextProperties,
  ) -> Result<Self> {
    let (surface, gl) = NativeSurface::create(title, width, height, properties)?;
    log::info!("Opened window \"{}\" ({}x{})", title, width, height);
    Ok(Self::with_surface(title, width, height, properties, Box::new(surface), Rc::new(gl)))
  }

  pub fn from_descriptor(descriptor: &WindowDescriptor) -> Result<Self> {
    Self::new(&descriptor.title, descriptor.width, descriptor.height, descriptor.context)
  }

  /// Builds a window over an existing surface and device, e.g. the `HeadlessSurface` and
  /// `HeadlessGl` of the `headless` feature.
  pub fn with_surface(
    title: &str,
    width: u32,
    height: u32,
    properties: ContextProperties,
    surface: Box<dyn Surface>,
    api: Rc<dyn GlApi>,
  ) -> Self {
    Self {
      title: title.to_owned(),
      width,
      height,
      properties,
      context: Context::new(api),
      surface: Some(surface),
    }
  }

  /// The device context resources of this window are created against.
  pub fn context(&self) -> &Rc<Context> {
    &self.context
  }

  /// True until a close has been requested, by the user or through [`Window::close`].
  pub fn is_open(&self) -> bool {
    self.surface.as_ref().is_some_and(|surface| !surface.close_requested())
  }

  /// Requests shutdown and drains pending events once.
  pub fn close(&mut self) {
    if let Some(surface) = self.surface.as_mut() {
      surface.request_close();
      surface.poll_events();
    }
  }

  pub fn poll_events(&mut self) {
    if let Some(surface) = self.surface.as_mut() {
      surface.poll_events();
    }
  }

  pub fn swap_buffers(&mut self) -> Result<()> {
    match self.surface.as_mut() {
      Some(surface) => surface.swap_buffers(),
      None => Ok(()),
    }
  }

  pub fn is_key_pressed(&self, key: KeyCode) -> bool {
    self.surface.as_ref().is_some_and(|surface| surface.is_key_pressed(key))
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn properties(&self) -> ContextProperties {
    self.properties
  }
}

impl fmt::Debug for Window {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Window")
      .field("title", &self.title)
      .field("width", &self.width)
      .field("height", &self.height)
      .field("properties", &self.properties)
      .field("open", &self.is_open())
      .finish()
  }
}

impl Drop for Window {
  fn drop(&mut self) {
    // Resources still holding the context must not reach the device once the GL
    // context inside the surface is gone.
    self.context.mark_lost();
    if let Some(mut surface) = self.surface.take() {
      surface.request_close();
      surface.poll_events();
      log::info!("Closed window \"{}\"", self.title);
    }
  }
}
