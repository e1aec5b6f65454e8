/// Shader stages, stage flag sets and descriptor kinds

use bitflags::bitflags;

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Tessellation control shader
    TessellationControl,
    /// Tessellation evaluation shader
    TessellationEvaluation,
    /// Geometry shader
    Geometry,
    /// Fragment/Pixel shader
    Fragment,
    /// Compute shader
    Compute,
    /// Task (amplification) shader
    Task,
    /// Mesh shader
    Mesh,
}

impl ShaderStage {
    /// Single-stage flag set for this stage
    pub fn flag(&self) -> ShaderStageFlags {
        match self {
            ShaderStage::Vertex => ShaderStageFlags::VERTEX,
            ShaderStage::TessellationControl => ShaderStageFlags::TESSELLATION_CONTROL,
            ShaderStage::TessellationEvaluation => ShaderStageFlags::TESSELLATION_EVALUATION,
            ShaderStage::Geometry => ShaderStageFlags::GEOMETRY,
            ShaderStage::Fragment => ShaderStageFlags::FRAGMENT,
            ShaderStage::Compute => ShaderStageFlags::COMPUTE,
            ShaderStage::Task => ShaderStageFlags::TASK,
            ShaderStage::Mesh => ShaderStageFlags::MESH,
        }
    }

    /// Whether the stage declares a work-group size
    pub fn has_workgroup(&self) -> bool {
        matches!(self, ShaderStage::Compute | ShaderStage::Task | ShaderStage::Mesh)
    }
}

bitflags! {
    /// Set of shader stages (binding visibility, push-constant visibility)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const TESSELLATION_CONTROL = 1 << 1;
        const TESSELLATION_EVALUATION = 1 << 2;
        const GEOMETRY = 1 << 3;
        const FRAGMENT = 1 << 4;
        const COMPUTE = 1 << 5;
        const TASK = 1 << 6;
        const MESH = 1 << 7;
    }
}

/// Which `DescriptorInfo` payload a descriptor kind consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadClass {
    /// Buffer handle + offset + range
    Buffer,
    /// Sampler + image view + image layout
    Image,
}

/// Resource class declared at a binding slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Read/write structured buffer (SSBO)
    StorageBuffer,
    /// Uniform buffer (UBO)
    UniformBuffer,
    /// Sampled image with its sampler
    CombinedImageSampler,
    /// Sampled image without sampler
    SampledImage,
    /// Read/write image
    StorageImage,
    /// Standalone sampler
    Sampler,
}

impl DescriptorKind {
    pub fn payload_class(&self) -> PayloadClass {
        match self {
            DescriptorKind::StorageBuffer | DescriptorKind::UniformBuffer => PayloadClass::Buffer,
            DescriptorKind::CombinedImageSampler
            | DescriptorKind::SampledImage
            | DescriptorKind::StorageImage
            | DescriptorKind::Sampler => PayloadClass::Image,
        }
    }

    pub fn is_storage_buffer(&self) -> bool {
        *self == DescriptorKind::StorageBuffer
    }
}
