/// Conversions from backend-agnostic types to Vulkan, and driver error mapping

use ash::vk;
use shader_forge::forge::Error;
use shader_forge::forge::program::{
    BindPoint, BlendMode, CompareOp, CullMode, DescriptorKind, FrontFace, PolygonMode,
    PrimitiveTopology, ShaderStage, ShaderStageFlags,
};
use shader_forge::{forge_err, forge_error};

pub(crate) fn stage_to_vk(stage: ShaderStage) -> vk::ShaderStageFlags {
    match stage {
        ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderStage::TessellationControl => vk::ShaderStageFlags::TESSELLATION_CONTROL,
        ShaderStage::TessellationEvaluation => vk::ShaderStageFlags::TESSELLATION_EVALUATION,
        ShaderStage::Geometry => vk::ShaderStageFlags::GEOMETRY,
        ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        ShaderStage::Compute => vk::ShaderStageFlags::COMPUTE,
        ShaderStage::Task => vk::ShaderStageFlags::TASK_EXT,
        ShaderStage::Mesh => vk::ShaderStageFlags::MESH_EXT,
    }
}

pub(crate) fn stage_flags_to_vk(flags: ShaderStageFlags) -> vk::ShaderStageFlags {
    let pairs = [
        (ShaderStageFlags::VERTEX, ShaderStage::Vertex),
        (ShaderStageFlags::TESSELLATION_CONTROL, ShaderStage::TessellationControl),
        (ShaderStageFlags::TESSELLATION_EVALUATION, ShaderStage::TessellationEvaluation),
        (ShaderStageFlags::GEOMETRY, ShaderStage::Geometry),
        (ShaderStageFlags::FRAGMENT, ShaderStage::Fragment),
        (ShaderStageFlags::COMPUTE, ShaderStage::Compute),
        (ShaderStageFlags::TASK, ShaderStage::Task),
        (ShaderStageFlags::MESH, ShaderStage::Mesh),
    ];
    pairs
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .fold(vk::ShaderStageFlags::empty(), |acc, (_, stage)| acc | stage_to_vk(*stage))
}

pub(crate) fn descriptor_kind_to_vk(kind: DescriptorKind) -> vk::DescriptorType {
    match kind {
        DescriptorKind::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        DescriptorKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorKind::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        DescriptorKind::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
        DescriptorKind::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
        DescriptorKind::Sampler => vk::DescriptorType::SAMPLER,
    }
}

pub(crate) fn bind_point_to_vk(bind_point: BindPoint) -> vk::PipelineBindPoint {
    match bind_point {
        BindPoint::Graphics => vk::PipelineBindPoint::GRAPHICS,
        BindPoint::Compute => vk::PipelineBindPoint::COMPUTE,
    }
}

// ===== Pipeline state conversions =====

pub(crate) fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveTopology::PatchList { .. } => vk::PrimitiveTopology::PATCH_LIST,
    }
}

pub(crate) fn cull_mode_to_vk(mode: CullMode) -> vk::CullModeFlags {
    match mode {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}

pub(crate) fn front_face_to_vk(face: FrontFace) -> vk::FrontFace {
    match face {
        FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
        FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
    }
}

pub(crate) fn polygon_mode_to_vk(mode: PolygonMode) -> vk::PolygonMode {
    match mode {
        PolygonMode::Fill => vk::PolygonMode::FILL,
        PolygonMode::Line => vk::PolygonMode::LINE,
        PolygonMode::Point => vk::PolygonMode::POINT,
    }
}

pub(crate) fn compare_op_to_vk(op: CompareOp) -> vk::CompareOp {
    match op {
        CompareOp::Never => vk::CompareOp::NEVER,
        CompareOp::Less => vk::CompareOp::LESS,
        CompareOp::Equal => vk::CompareOp::EQUAL,
        CompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareOp::Greater => vk::CompareOp::GREATER,
        CompareOp::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareOp::GreaterOrEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareOp::Always => vk::CompareOp::ALWAYS,
    }
}

/// Color blend attachment state for a blend mode
pub(crate) fn blend_attachment_to_vk(mode: BlendMode) -> vk::PipelineColorBlendAttachmentState {
    let state = vk::PipelineColorBlendAttachmentState::default()
        .color_write_mask(vk::ColorComponentFlags::RGBA);

    let (src_color, dst_color) = match mode {
        BlendMode::Opaque => return state.blend_enable(false),
        BlendMode::Alpha => (vk::BlendFactor::SRC_ALPHA, vk::BlendFactor::ONE_MINUS_SRC_ALPHA),
        BlendMode::Premultiplied => (vk::BlendFactor::ONE, vk::BlendFactor::ONE_MINUS_SRC_ALPHA),
        BlendMode::Additive => (vk::BlendFactor::ONE, vk::BlendFactor::ONE),
    };

    state
        .blend_enable(true)
        .src_color_blend_factor(src_color)
        .dst_color_blend_factor(dst_color)
        .color_blend_op(vk::BlendOp::ADD)
        .src_alpha_blend_factor(vk::BlendFactor::ONE)
        .dst_alpha_blend_factor(dst_color)
        .alpha_blend_op(vk::BlendOp::ADD)
}

/// Map a failed driver call onto an error, logging it
///
/// Out-of-memory results become `OutOfMemory`; everything else is a `BackendError`.
pub(crate) fn vk_error(source: &str, operation: &str, result: vk::Result) -> Error {
    match result {
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            forge_error!(source, "{} failed: {:?}", operation, result);
            Error::OutOfMemory
        }
        other => forge_err!(source, "{} failed: {:?}", operation, other),
    }
}

#[cfg(test)]
#[path = "vulkan_convert_tests.rs"]
mod tests;
