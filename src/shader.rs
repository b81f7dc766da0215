use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use crate::error::{Error, InfoLog, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Name of the function each stage's source must define.
    pub fn entry_point(self) -> &'static str {
        match self {
            Self::Vertex => "vs_main",
            Self::Fragment => "fs_main",
        }
    }

    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// Reads a shader source file. A missing or unreadable file reads as an empty
/// source, which then fails to compile.
pub fn read_source(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|err| {
        log::warn!("Could not read shader {}: {err}", path.display());
        String::new()
    })
}

/// WGSL source that parsed, validated and defines its stage's entry point.
#[derive(Debug)]
pub struct CompiledStage {
    stage: ShaderStage,
    source: String,
}

impl CompiledStage {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(match self.stage {
                ShaderStage::Vertex => "Field Vertex Shader",
                ShaderStage::Fragment => "Field Fragment Shader",
            }),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&self.source)),
        })
    }
}

/// Compiles a single stage.
pub fn compile(stage: ShaderStage, source: &str) -> Result<CompiledStage> {
    let failed = |log: String| Error::ShaderCompile {
        stage,
        log: InfoLog::new(log),
    };

    let module = naga::front::wgsl::parse_str(source)
        .map_err(|err| failed(err.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|err| failed(err.to_string()))?;

    let entry_point = stage.entry_point();
    let has_entry_point = module
        .entry_points
        .iter()
        .any(|ep| ep.stage == stage.naga_stage() && ep.name == entry_point);
    if !has_entry_point {
        return Err(failed(format!("no {stage} entry point named `{entry_point}`")));
    }

    Ok(CompiledStage {
        stage,
        source: source.to_owned(),
    })
}

/// Both stages of a program, ready to be linked.
#[derive(Debug)]
pub struct StagePair {
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
}

/// Compiles the vertex and fragment stages.
///
/// When a stage fails, the returned list holds every compile diagnostic
/// followed by the link failure they cause.
pub fn compile_pair(
    vertex_source: &str,
    fragment_source: &str,
) -> std::result::Result<StagePair, Vec<Error>> {
    match (
        compile(ShaderStage::Vertex, vertex_source),
        compile(ShaderStage::Fragment, fragment_source),
    ) {
        (Ok(vertex), Ok(fragment)) => Ok(StagePair { vertex, fragment }),
        (vertex, fragment) => {
            let mut missing = Vec::new();
            let mut diagnostics = Vec::new();
            for result in [vertex, fragment] {
                if let Err(err) = result {
                    if let Error::ShaderCompile { stage, .. } = &err {
                        missing.push(stage.to_string());
                    }
                    diagnostics.push(err);
                }
            }
            diagnostics.push(Error::ShaderLink {
                log: InfoLog::new(format!(
                    "cannot link program: {} stage(s) failed to compile",
                    missing.join(" and ")
                )),
            });
            Err(diagnostics)
        }
    }
}

/// Everything a pipeline needs besides the shaders.
pub struct PipelineTarget<'a> {
    pub layout: &'a wgpu::PipelineLayout,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub format: wgpu::TextureFormat,
}

/// The linked render pipeline, if linking succeeded, and every diagnostic
/// produced on the way.
pub struct ShaderProgram {
    pipeline: Option<wgpu::RenderPipeline>,
    diagnostics: Vec<Error>,
}

impl ShaderProgram {
    /// Compiles and links the two sources. Never fails outright: errors are
    /// logged and kept in [`ShaderProgram::diagnostics`].
    pub fn build(
        device: &wgpu::Device,
        vertex_source: &str,
        fragment_source: &str,
        target: &PipelineTarget,
    ) -> Self {
        let (pipeline, diagnostics) = match compile_pair(vertex_source, fragment_source) {
            Ok(stages) => match link(device, &stages, target) {
                Ok(pipeline) => (Some(pipeline), Vec::new()),
                Err(err) => (None, vec![err]),
            },
            Err(diagnostics) => (None, diagnostics),
        };

        for err in &diagnostics {
            log::error!("{err}");
        }

        Self {
            pipeline,
            diagnostics,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        self.pipeline.as_ref()
    }

    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    /// Applies the shader failure policy: in strict mode the first diagnostic
    /// is returned as an error, otherwise the program is accepted as is.
    pub fn check(self, strict: bool) -> Result<Self> {
        if strict {
            if let Some(err) = self.diagnostics.into_iter().next() {
                return Err(err);
            }
            return Ok(Self {
                pipeline: self.pipeline,
                diagnostics: Vec::new(),
            });
        }
        if !self.is_linked() {
            log::warn!("Continuing without a shader program; the field will not be drawn");
        }
        Ok(self)
    }
}

/// Creates the render pipeline. The per-stage modules are dropped on return.
fn link(
    device: &wgpu::Device,
    stages: &StagePair,
    target: &PipelineTarget,
) -> Result<wgpu::RenderPipeline> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let vertex_module = stages.vertex.create_module(device);
    let fragment_module = stages.fragment.create_module(device);

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Field Render Pipeline"),
        layout: Some(target.layout),
        vertex: wgpu::VertexState {
            module: &vertex_module,
            entry_point: ShaderStage::Vertex.entry_point(),
            buffers: target.vertex_buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &fragment_module,
            entry_point: ShaderStage::Fragment.entry_point(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target.format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(Error::ShaderLink {
            log: InfoLog::new(err.to_string()),
        }),
        None => Ok(pipeline),
    }
}
