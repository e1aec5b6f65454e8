/// Fixed-function pipeline state and pipeline stage validation

use crate::error::{Error, Result};
use crate::program::{ShaderReflection, ShaderStage, ShaderStageFlags};
use crate::forge_bail;

const SOURCE: &str = "forge::pipeline";

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
    /// Required by, and only valid with, tessellation stages
    PatchList { control_points: u32 },
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// Polygon rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

/// Comparison operator for depth tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Color blending applied to every color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// No blending, source replaces destination
    Opaque,
    /// src * a + dst * (1 - a)
    Alpha,
    /// src + dst * (1 - a)
    Premultiplied,
    /// src + dst
    Additive,
}

/// Rasterization state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterizationState {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub polygon_mode: PolygonMode,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            polygon_mode: PolygonMode::Fill,
        }
    }
}

/// Depth testing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    pub test_enable: bool,
    pub write_enable: bool,
    pub compare_op: CompareOp,
}

impl Default for DepthState {
    /// Reverse-Z: near plane at depth 1, cleared to 0
    fn default() -> Self {
        Self {
            test_enable: true,
            write_enable: true,
            compare_op: CompareOp::Greater,
        }
    }
}

/// Fixed-function state of a graphics pipeline
///
/// Viewport and scissor are always dynamic. Vertex input is empty: vertex data is
/// fetched from storage buffers bound through the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsState {
    pub topology: PrimitiveTopology,
    pub rasterization: RasterizationState,
    pub depth: DepthState,
    pub blend: BlendMode,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            rasterization: RasterizationState::default(),
            depth: DepthState::default(),
            blend: BlendMode::Opaque,
        }
    }
}

/// Check that `shaders` can form a graphics pipeline rendering into `color_attachment_count` targets
///
/// # Errors
///
/// - `InvalidStageCombination` if the list is empty, holds a compute stage, repeats
///   a stage, or has neither a vertex nor a mesh stage
/// - `InvalidStageCombination` if vertex and mesh are mixed, a task stage has no
///   mesh stage, or a mesh stage is combined with geometry or tessellation
/// - `InvalidStageCombination` if only one tessellation stage is present, or if
///   the tessellation stages and a `PatchList` topology do not go together
/// - `InvalidResource` if the fragment stage writes more outputs than there are
///   color attachments
pub fn validate_graphics_stages(
    shaders: &[&ShaderReflection],
    color_attachment_count: u32,
    topology: PrimitiveTopology,
) -> Result<()> {
    if shaders.is_empty() {
        forge_bail!(
            SOURCE,
            Error::InvalidStageCombination("a graphics pipeline needs at least one stage".to_string())
        );
    }

    let mut stages = ShaderStageFlags::empty();
    for shader in shaders {
        if shader.stage == ShaderStage::Compute {
            forge_bail!(
                SOURCE,
                Error::InvalidStageCombination(
                    "compute stage passed to a graphics pipeline".to_string()
                )
            );
        }
        if stages.contains(shader.stage.flag()) {
            forge_bail!(
                SOURCE,
                Error::InvalidStageCombination(format!("stage {:?} appears twice", shader.stage))
            );
        }
        stages |= shader.stage.flag();
    }

    if !stages.intersects(ShaderStageFlags::VERTEX | ShaderStageFlags::MESH) {
        forge_bail!(
            SOURCE,
            Error::InvalidStageCombination(format!(
                "graphics pipeline needs a vertex or mesh stage, got {:?}",
                stages
            ))
        );
    }
    if stages.contains(ShaderStageFlags::VERTEX) && stages.contains(ShaderStageFlags::MESH) {
        forge_bail!(
            SOURCE,
            Error::InvalidStageCombination("vertex and mesh stages are exclusive".to_string())
        );
    }
    if stages.contains(ShaderStageFlags::TASK) && !stages.contains(ShaderStageFlags::MESH) {
        forge_bail!(
            SOURCE,
            Error::InvalidStageCombination("task stage needs a mesh stage".to_string())
        );
    }

    let tessellation =
        ShaderStageFlags::TESSELLATION_CONTROL | ShaderStageFlags::TESSELLATION_EVALUATION;
    if stages.contains(ShaderStageFlags::MESH)
        && stages.intersects(tessellation | ShaderStageFlags::GEOMETRY)
    {
        forge_bail!(
            SOURCE,
            Error::InvalidStageCombination(format!(
                "mesh stage cannot be combined with {:?}",
                stages & (tessellation | ShaderStageFlags::GEOMETRY)
            ))
        );
    }

    let has_tessellation = stages.intersects(tessellation);
    if has_tessellation && !stages.contains(tessellation) {
        forge_bail!(
            SOURCE,
            Error::InvalidStageCombination(
                "tessellation control and evaluation stages must be used together".to_string()
            )
        );
    }
    let is_patch_list = matches!(topology, PrimitiveTopology::PatchList { .. });
    if has_tessellation != is_patch_list {
        forge_bail!(
            SOURCE,
            Error::InvalidStageCombination(format!(
                "topology {:?} does not match tessellation stages {:?}",
                topology,
                stages & tessellation
            ))
        );
    }
    if let PrimitiveTopology::PatchList { control_points: 0 } = topology {
        forge_bail!(
            SOURCE,
            Error::InvalidStageCombination("patch list needs at least one control point".to_string())
        );
    }

    if let Some(fragment) = shaders.iter().find(|s| s.stage == ShaderStage::Fragment) {
        if fragment.output_count > color_attachment_count {
            forge_bail!(
                SOURCE,
                Error::InvalidResource(format!(
                    "fragment stage writes {} outputs but the render target has {} color attachments",
                    fragment.output_count, color_attachment_count
                ))
            );
        }
    }

    Ok(())
}

/// Check that `shader` can form a compute pipeline
pub fn validate_compute_stage(shader: &ShaderReflection) -> Result<()> {
    if shader.stage != ShaderStage::Compute {
        forge_bail!(
            SOURCE,
            Error::InvalidStageCombination(format!(
                "{:?} stage passed to a compute pipeline",
                shader.stage
            ))
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_state_tests.rs"]
mod tests;
