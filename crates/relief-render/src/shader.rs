//! Shader source loading, per-stage compilation, and program linking.
//!
//! WGSL is compiled and validated with naga ahead of pipeline creation so
//! that failures come back as values carrying the compiler's diagnostic
//! instead of surfacing later as device validation panics. The compiled
//! module is also reflected for uniform names and stage interface
//! locations, which is what linking checks against.

use std::path::{Path, PathBuf};

use log::{debug, error, info};
use naga::valid::{Capabilities, ValidationFlags, Validator};
use thiserror::Error;

/// Upper bound, in bytes, on the diagnostic text kept from a failed compile.
pub const INFO_LOG_CAPACITY: usize = 1024;

/// Programmable pipeline stage a shader is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }

    /// Lowercase stage name, as used in WGSL entry point attributes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for shader loading, compilation, and linking.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read shader file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} shader failed to compile:\n{diagnostic}")]
    CompilationFailed {
        stage: ShaderStage,
        diagnostic: String,
    },

    #[error("program failed to link: {reason}")]
    LinkFailed { reason: String },
}

/// Handle to a uniform slot in a linked [`ShaderProgram`].
///
/// Unknown names resolve to [`UniformLocation::INVALID`]; uploads to it are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(i32);

impl UniformLocation {
    /// Sentinel for "no such uniform".
    pub const INVALID: Self = Self(-1);

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// Index into [`ShaderProgram::uniforms`], or `None` for the sentinel.
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    pub fn raw(self) -> i32 {
        self.0
    }
}

/// A `var<uniform>` declaration found in a shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformInfo {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    /// Size of the uniform's type in bytes.
    pub size: u32,
}

/// A single validated shader stage.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    stage: ShaderStage,
    entry_point: String,
    source: String,
    uniforms: Vec<UniformInfo>,
    inputs: Vec<u32>,
    outputs: Vec<u32>,
}

impl CompiledShader {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// The WGSL text this stage was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn uniforms(&self) -> &[UniformInfo] {
        &self.uniforms
    }

    /// `@location` indices consumed by the entry point.
    pub fn input_locations(&self) -> &[u32] {
        &self.inputs
    }

    /// `@location` indices produced by the entry point.
    pub fn output_locations(&self) -> &[u32] {
        &self.outputs
    }
}

/// A vertex and fragment stage that link against each other.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    vertex: CompiledShader,
    fragment: CompiledShader,
    uniforms: Vec<UniformInfo>,
}

impl ShaderProgram {
    pub fn vertex(&self) -> &CompiledShader {
        &self.vertex
    }

    pub fn fragment(&self) -> &CompiledShader {
        &self.fragment
    }

    /// Uniforms of both stages, ordered by `(group, binding)`.
    pub fn uniforms(&self) -> &[UniformInfo] {
        &self.uniforms
    }

    /// Look up a uniform by name.
    pub fn uniform_location(&self, name: &str) -> UniformLocation {
        match self.uniforms.iter().position(|u| u.name == name) {
            Some(index) => UniformLocation(index as i32),
            None => {
                debug!("Uniform '{name}' not declared by program");
                UniformLocation::INVALID
            }
        }
    }

    /// The uniform behind `location`, if it is valid.
    pub fn uniform(&self, location: UniformLocation) -> Option<&UniformInfo> {
        location.index().and_then(|i| self.uniforms.get(i))
    }
}

/// Read a whole shader source file.
pub fn load_shader_source(path: impl AsRef<Path>) -> Result<String, ShaderError> {
    let path = path.as_ref();
    debug!("Loading shader source from {}", path.display());

    if !path.exists() {
        error!("Can't read shader file: {}", path.display());
        return Err(ShaderError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| {
        error!("Can't read shader file {}: {source}", path.display());
        ShaderError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Compile and validate WGSL for one stage.
///
/// The source must contain an entry point for `stage`; the first one found
/// is used.
pub fn compile_shader(source: &str, stage: ShaderStage) -> Result<CompiledShader, ShaderError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| compile_failure(stage, e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| compile_failure(stage, e.emit_to_string(source)))?;

    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage.to_naga())
        .ok_or_else(|| {
            compile_failure(
                stage,
                format!("no @{stage} entry point in shader source"),
            )
        })?;

    let inputs = entry
        .function
        .arguments
        .iter()
        .flat_map(|arg| io_locations(&module, arg.ty, arg.binding.as_ref()))
        .collect();
    let outputs = entry
        .function
        .result
        .as_ref()
        .map(|res| io_locations(&module, res.ty, res.binding.as_ref()))
        .unwrap_or_default();

    let compiled = CompiledShader {
        stage,
        entry_point: entry.name.clone(),
        source: source.to_string(),
        uniforms: reflect_uniforms(&module),
        inputs,
        outputs,
    };
    debug!(
        "Compiled {stage} shader '{}' ({} uniform(s))",
        compiled.entry_point,
        compiled.uniforms.len()
    );
    Ok(compiled)
}

/// Link a vertex and a fragment stage into a program.
///
/// Fails if the stages are swapped, if the fragment stage reads a location
/// the vertex stage never writes, or if the stages disagree on a uniform.
pub fn build_program(
    vertex: CompiledShader,
    fragment: CompiledShader,
) -> Result<ShaderProgram, ShaderError> {
    if vertex.stage != ShaderStage::Vertex {
        return Err(link_failure(format!(
            "expected a vertex shader in the vertex slot, got {}",
            vertex.stage
        )));
    }
    if fragment.stage != ShaderStage::Fragment {
        return Err(link_failure(format!(
            "expected a fragment shader in the fragment slot, got {}",
            fragment.stage
        )));
    }

    for location in &fragment.inputs {
        if !vertex.outputs.contains(location) {
            return Err(link_failure(format!(
                "fragment input @location({location}) is not written by the vertex stage"
            )));
        }
    }

    let mut uniforms = vertex.uniforms.clone();
    for uniform in &fragment.uniforms {
        if let Some(existing) = uniforms.iter().find(|u| u.name == uniform.name) {
            if existing != uniform {
                return Err(link_failure(format!(
                    "uniform '{}' declared differently in the two stages",
                    uniform.name
                )));
            }
            continue;
        }
        if let Some(clash) = uniforms
            .iter()
            .find(|u| u.group == uniform.group && u.binding == uniform.binding)
        {
            return Err(link_failure(format!(
                "uniforms '{}' and '{}' both use @group({}) @binding({})",
                clash.name, uniform.name, uniform.group, uniform.binding
            )));
        }
        uniforms.push(uniform.clone());
    }
    uniforms.sort_by_key(|u| (u.group, u.binding));

    info!(
        "Linked program {}/{} with {} uniform(s)",
        vertex.entry_point,
        fragment.entry_point,
        uniforms.len()
    );
    Ok(ShaderProgram {
        vertex,
        fragment,
        uniforms,
    })
}

fn compile_failure(stage: ShaderStage, diagnostic: String) -> ShaderError {
    let diagnostic = truncate_diagnostic(diagnostic);
    error!("The {stage} shader failed to compile with the error:\n{diagnostic}");
    ShaderError::CompilationFailed { stage, diagnostic }
}

fn link_failure(reason: String) -> ShaderError {
    error!("Program failed to link: {reason}");
    ShaderError::LinkFailed { reason }
}

/// Cut `text` down to at most [`INFO_LOG_CAPACITY`] bytes on a char boundary.
fn truncate_diagnostic(mut text: String) -> String {
    if text.len() > INFO_LOG_CAPACITY {
        let mut end = INFO_LOG_CAPACITY;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

fn reflect_uniforms(module: &naga::Module) -> Vec<UniformInfo> {
    module
        .global_variables
        .iter()
        .filter(|(_, var)| matches!(var.space, naga::AddressSpace::Uniform))
        .filter_map(|(_, var)| {
            let name = var.name.clone()?;
            let binding = var.binding.as_ref()?;
            Some(UniformInfo {
                name,
                group: binding.group,
                binding: binding.binding,
                size: module.types[var.ty].inner.size(module.to_ctx()),
            })
        })
        .collect()
}

/// `@location` indices carried by an entry point argument or result, either
/// directly or through the members of a struct.
fn io_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
) -> Vec<u32> {
    match binding {
        Some(naga::Binding::Location { location, .. }) => vec![*location],
        Some(naga::Binding::BuiltIn(_)) => Vec::new(),
        None => match &module.types[ty].inner {
            naga::TypeInner::Struct { members, .. } => members
                .iter()
                .filter_map(|member| match member.binding {
                    Some(naga::Binding::Location { location, .. }) => Some(location),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
    }
}
