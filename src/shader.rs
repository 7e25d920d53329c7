//! Shader units.
//!
//! A [`Shader`] owns one device shader object and walks it through a one-way state machine:
//!
//! * `Uncompiled`: source may be replaced any number of times; the last one wins
//! * `Compiled`: ready to attach to a [`crate::Program`]
//! * `Failed`: the compiler rejected the source; drop the unit and build a new one
//!
//! Compiler diagnostics are returned inside [`Error::Compile`] and stay available through
//! [`Shader::info_log`].

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{
  context::Context,
  device::RawHandle,
  error::{Error, Result},
};

/// Pipeline stage a shader unit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderStage {
  Vertex,
  Fragment,
  Geometry,
}

impl ShaderStage {
  pub fn gl_enum(self) -> u32 {
    match self {
      ShaderStage::Vertex => glow::VERTEX_SHADER,
      ShaderStage::Fragment => glow::FRAGMENT_SHADER,
      ShaderStage::Geometry => glow::GEOMETRY_SHADER,
    }
  }
}

impl TryFrom<u32> for ShaderStage {
  type Error = Error;

  fn try_from(gl_enum: u32) -> Result<Self> {
    match gl_enum {
      glow::VERTEX_SHADER => Ok(ShaderStage::Vertex),
      glow::FRAGMENT_SHADER => Ok(ShaderStage::Fragment),
      glow::GEOMETRY_SHADER => Ok(ShaderStage::Geometry),
      other => Err(Error::UnsupportedStage(other)),
    }
  }
}

impl fmt::Display for ShaderStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      ShaderStage::Vertex => "vertex",
      ShaderStage::Fragment => "fragment",
      ShaderStage::Geometry => "geometry",
    })
  }
}

/// Position of a [`Shader`] in its compile state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileState {
  Uncompiled,
  Compiled,
  Failed,
}

/// One shader stage object, deleted on drop.
pub struct Shader {
  context: Rc<Context>,
  handle:  RawHandle,
  stage:   ShaderStage,
  state:   CompileState,
}

impl Shader {
  /// Allocates a device shader object for `stage`.
  ///
  /// # Panics
  /// If the device refuses to allocate a shader object.
  pub fn new(context: &Rc<Context>, stage: ShaderStage) -> Self {
    let handle = match context.api().create_shader(stage.gl_enum()) {
      Ok(handle) => handle,
      Err(e) => panic!("Unable to create {stage} shader: {e}"),
    };
    log::debug!("Created {} shader {}", stage, handle);

    Self {
      context: context.clone(),
      handle,
      stage,
      state: CompileState::Uncompiled,
    }
  }

  /// Creates, sources and compiles a shader in one go.
  pub fn from_source(context: &Rc<Context>, stage: ShaderStage, source: &str) -> Result<Self> {
    let mut shader = Self::new(context, stage);
    shader.set_source(source);
    shader.compile()?;
    Ok(shader)
  }

  /// Replaces the pending source text.
  ///
  /// # Panics
  /// If the shader has already been compiled.
  pub fn set_source(&mut self, source: &str) {
    assert!(
      self.state == CompileState::Uncompiled,
      "Attempt to provide source for {} shader {} after compilation",
      self.stage,
      self.handle,
    );
    self.context.api().shader_source(self.handle, source);
  }

  /// Reads `reader` to its end and uses the text as source.
  pub fn source_from_reader(&mut self, mut reader: impl Read) -> Result<()> {
    let mut source = String::new();
    reader
      .read_to_string(&mut source)
      .map_err(|source| Error::SourceRead { path: None, source })?;
    self.set_source(&source);
    Ok(())
  }

  /// Reads the whole file at `path` and uses it as source.
  pub fn source_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| Error::SourceRead {
      path: Some(path.to_path_buf()),
      source,
    })?;
    self.set_source(&source);
    Ok(())
  }

  /// Compiles the pending source.
  ///
  /// On failure the unit moves to [`CompileState::Failed`] and the error carries the
  /// compiler log.
  ///
  /// # Panics
  /// If the unit was already compiled, successfully or not.
  pub fn compile(&mut self) -> Result<()> {
    assert!(
      self.state == CompileState::Uncompiled,
      "Attempt to compile {} shader {} twice",
      self.stage,
      self.handle,
    );

    let api = self.context.api();
    api.compile_shader(self.handle);
    if api.shader_compile_status(self.handle) {
      self.state = CompileState::Compiled;
      log::debug!("Compiled {} shader {}", self.stage, self.handle);
      Ok(())
    } else {
      self.state = CompileState::Failed;
      let log = api.shader_info_log(self.handle);
      log::debug!("{} shader {} failed to compile", self.stage, self.handle);
      Err(Error::Compile { stage: self.stage, log })
    }
  }

  /// The device's compiler log for this unit.
  pub fn info_log(&self) -> String {
    self.context.api().shader_info_log(self.handle)
  }

  /// Raw device name of the shader object.
  pub fn handle(&self) -> RawHandle {
    self.handle
  }

  pub fn stage(&self) -> ShaderStage {
    self.stage
  }

  /// Where the unit is in its compile state machine.
  pub fn state(&self) -> CompileState {
    self.state
  }

  pub fn is_compiled(&self) -> bool {
    self.state == CompileState::Compiled
  }
}

impl fmt::Debug for Shader {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Shader")
      .field("handle", &self.handle)
      .field("stage", &self.stage)
      .field("state", &self.state)
      .finish()
  }
}

impl Drop for Shader {
  fn drop(&mut self) {
    if !self.context.is_alive() {
      return;
    }
    self.context.api().delete_shader(self.handle);
    log::trace!("Deleted {} shader {}", self.stage, self.handle);
  }
}
