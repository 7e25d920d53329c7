//! Native windows: winit for the window and events, glutin for the GL context.
//!
//! winit allows one event loop per process, and it has to outlive every window created
//! from it. The loop therefore lives in a [`WindowingSystem`] shared through a
//! thread-local weak slot: the first window creates it, each window holds a strong
//! reference, and it is dropped together with the last window. winit refuses to build a
//! second loop afterwards, so opening a window after that fails with
//! [`Error::EventLoop`].

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::rc::{Rc, Weak};
use std::thread::LocalKey;
use std::time::Duration;

use glow::HasContext;
use glutin::{
  config::{Config, ConfigTemplateBuilder, GlConfig},
  context::{
    ContextApi,
    ContextAttributesBuilder,
    GlProfile,
    NotCurrentGlContext,
    PossiblyCurrentContext,
    Version,
  },
  display::{Display, DisplayApiPreference, GetGlDisplay, GlDisplay},
  surface::{GlSurface, Surface as GlutinSurface, WindowSurface},
};
use glutin_winit::GlWindow;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use rustc_hash::FxHashSet;
use winit::{
  application::ApplicationHandler,
  dpi::{LogicalSize, PhysicalSize},
  event::{ElementState, WindowEvent},
  event_loop::{ActiveEventLoop, EventLoop},
  keyboard::{KeyCode, PhysicalKey},
  platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
  window::{Window as WinitWindow, WindowAttributes, WindowId},
};

use crate::{
  error::{Error, Result},
  window::{ContextProperties, Surface},
};

thread_local! {
  static WINDOWING: RefCell<Weak<WindowingSystem>> = RefCell::new(Weak::new());
}

/// Returns the live value in `slot`, or creates one with `init` and remembers it weakly.
pub(crate) fn acquire_shared<T>(
  slot: &'static LocalKey<RefCell<Weak<T>>>,
  init: impl FnOnce() -> Result<T>,
) -> Result<Rc<T>> {
  slot.with(|slot| {
    if let Some(shared) = slot.borrow().upgrade() {
      return Ok(shared);
    }
    let shared = Rc::new(init()?);
    *slot.borrow_mut() = Rc::downgrade(&shared);
    Ok(shared)
  })
}

pub(crate) struct WindowingSystem {
  event_loop: RefCell<EventLoop<()>>,
}

impl WindowingSystem {
  fn acquire() -> Result<Rc<Self>> {
    acquire_shared(&WINDOWING, || {
      let event_loop = build_event_loop()?;
      log::info!("Windowing subsystem initialized");
      Ok(Self { event_loop: RefCell::new(event_loop) })
    })
  }
}

fn build_event_loop() -> Result<EventLoop<()>> {
  #[allow(unused_mut)]
  let mut builder = EventLoop::builder();
  // The subsystem slot is per thread, so the loop may live on any of them.
  #[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
  {
    use winit::platform::x11::EventLoopBuilderExtX11;
    EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
  }
  Ok(builder.build()?)
}

impl Drop for WindowingSystem {
  fn drop(&mut self) {
    log::info!("Windowing subsystem terminated");
  }
}

#[derive(Default)]
struct InputState {
  close_requested: bool,
  pressed:         FxHashSet<KeyCode>,
}

/// Collects the events of one window during a pump.
struct EventCollector<'a> {
  window_id: WindowId,
  input:     &'a mut InputState,
  resized:   Option<PhysicalSize<u32>>,
}

impl ApplicationHandler for EventCollector<'_> {
  fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

  fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
    // Events of other windows are dropped; one context per thread is assumed.
    if window_id != self.window_id {
      return;
    }

    match event {
      WindowEvent::CloseRequested => {
        self.input.close_requested = true;
      }
      WindowEvent::Resized(size) => {
        self.resized = Some(size);
      }
      WindowEvent::KeyboardInput { event, .. } => {
        if let PhysicalKey::Code(code) = event.physical_key {
          match event.state {
            ElementState::Pressed => {
              self.input.pressed.insert(code);
            }
            ElementState::Released => {
              self.input.pressed.remove(&code);
            }
          }
        }
      }
      // Key releases are not delivered to an unfocused window.
      WindowEvent::Focused(false) => self.input.pressed.clear(),
      _ => {}
    }
  }
}

pub(crate) struct NativeSurface {
  // Field order is drop order: the GL surface and context go before the window they
  // render into, and the windowing subsystem goes last.
  gl_surface: GlutinSurface<WindowSurface>,
  gl_context: PossiblyCurrentContext,
  window:     WinitWindow,
  input:      InputState,
  windowing:  Rc<WindowingSystem>,
}

impl NativeSurface {
  /// Opens a window, makes its GL context current and loads GL functions through it.
  pub(crate) fn create(
    title: &str,
    width: u32,
    height: u32,
    properties: ContextProperties,
  ) -> Result<(Self, glow::Context)> {
    let windowing = WindowingSystem::acquire()?;

    let window_attributes = WinitWindow::default_attributes()
      .with_title(title)
      .with_inner_size(LogicalSize::new(width, height));

    let (window, gl_config) = window_with_config(&windowing.event_loop.borrow(), window_attributes)?;

    let profile = if properties.core_profile {
      GlProfile::Core
    } else {
      GlProfile::Compatibility
    };
    if properties.forward_compatible && !properties.core_profile {
      log::warn!("Forward compatibility is only honoured for core profile contexts");
    }
    let context_attributes = ContextAttributesBuilder::new()
      .with_profile(profile)
      .with_context_api(ContextApi::OpenGl(Some(Version::new(
        properties.major_version,
        properties.minor_version,
      ))))
      .build(Some(window.window_handle()?.as_raw()));

    let gl_display = gl_config.display();
    let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes)? };
    let surface_attributes = window.build_surface_attributes(Default::default())?;
    let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes)? };
    let gl_context = not_current.make_current(&gl_surface)?;

    if gl_display.get_proc_address(c"glCreateShader").is_null() {
      return Err(Error::LoaderInit("glCreateShader did not resolve".to_owned()));
    }
    let gl =
      unsafe { glow::Context::from_loader_function_cstr(|symbol| gl_display.get_proc_address(symbol)) };

    let version = gl.version();
    log::info!(
      "OpenGL version: {}.{} ({})",
      version.major,
      version.minor,
      version.vendor_info
    );
    let requested = (u32::from(properties.major_version), u32::from(properties.minor_version));
    if (version.major, version.minor) < requested {
      return Err(Error::UnsupportedVersion {
        requested_major: properties.major_version,
        requested_minor: properties.minor_version,
        found_major:     version.major,
        found_minor:     version.minor,
      });
    }

    let surface = Self {
      gl_surface,
      gl_context,
      window,
      input: InputState::default(),
      windowing,
    };
    Ok((surface, gl))
  }
}

/// Creates the GL display, picks the config with the most samples and opens a window
/// whose visual matches it.
fn window_with_config(
  event_loop: &EventLoop<()>,
  attributes: WindowAttributes,
) -> Result<(WinitWindow, Config)> {
  // WGL needs the window before the display; elsewhere the config decides the visual.
  #[cfg(windows)]
  let early_window = {
    #[allow(deprecated)]
    let window = event_loop
      .create_window(attributes.clone())
      .map_err(|e| Error::WindowCreation(e.to_string()))?;
    Some(window)
  };
  #[cfg(not(windows))]
  let early_window: Option<WinitWindow> = None;

  let window_handle = match &early_window {
    Some(window) => Some(window.window_handle()?.as_raw()),
    None => None,
  };
  let display_handle = event_loop.display_handle()?.as_raw();
  let gl_display = unsafe { Display::new(display_handle, display_preference(window_handle))? };

  let mut template = ConfigTemplateBuilder::new();
  if let Some(handle) = window_handle {
    template = template.compatible_with_native_window(handle);
  }
  let configs = unsafe { gl_display.find_configs(template.build())? };
  let gl_config = pick_config(configs, |config| config.num_samples())?;
  log::debug!("Picked GL config with {} samples", gl_config.num_samples());

  let window = match early_window {
    Some(window) => window,
    None => glutin_winit::finalize_window(event_loop, attributes, &gl_config)
      .map_err(|e| Error::WindowCreation(e.to_string()))?,
  };
  Ok((window, gl_config))
}

/// The candidate with the most samples. An empty list is a context creation failure, as
/// glutin reports success with no configs when nothing matches the template.
fn pick_config<C>(configs: impl Iterator<Item = C>, samples: impl Fn(&C) -> u8) -> Result<C> {
  configs
    .max_by_key(|config| samples(config))
    .ok_or_else(|| Error::ContextCreation("display offers no matching GL config".to_owned()))
}

#[cfg(windows)]
fn display_preference(window: Option<RawWindowHandle>) -> DisplayApiPreference {
  DisplayApiPreference::Wgl(window)
}

#[cfg(target_os = "macos")]
fn display_preference(_window: Option<RawWindowHandle>) -> DisplayApiPreference {
  DisplayApiPreference::Cgl
}

#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
fn display_preference(_window: Option<RawWindowHandle>) -> DisplayApiPreference {
  DisplayApiPreference::EglThenGlx(Box::new(winit::platform::x11::register_xlib_error_hook))
}

impl Surface for NativeSurface {
  fn request_close(&mut self) {
    self.input.close_requested = true;
  }

  fn close_requested(&self) -> bool {
    self.input.close_requested
  }

  fn poll_events(&mut self) {
    let mut collector = EventCollector {
      window_id: self.window.id(),
      input:     &mut self.input,
      resized:   None,
    };
    let status = self
      .windowing
      .event_loop
      .borrow_mut()
      .pump_app_events(Some(Duration::ZERO), &mut collector);
    let resized = collector.resized;

    if let PumpStatus::Exit(code) = status {
      log::debug!("Event loop exited with code {}", code);
      self.input.close_requested = true;
    }
    if let Some(size) = resized {
      if let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
        self.gl_surface.resize(&self.gl_context, width, height);
      }
    }
  }

  fn swap_buffers(&mut self) -> Result<()> {
    self.gl_surface.swap_buffers(&self.gl_context)?;
    Ok(())
  }

  fn is_key_pressed(&self, key: KeyCode) -> bool {
    self.input.pressed.contains(&key)
  }
}
