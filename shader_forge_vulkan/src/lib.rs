/*!
# Shader Forge - Vulkan Backend

Vulkan implementation of the shader_forge program composition layer, using the Ash
library for Vulkan bindings and spirq for SPIR-V reflection.

Shaders are loaded and reflected, their reflection records are merged into a
`Program` (set layout, pipeline layout and descriptor update template), and
pipelines are built on the program's layout. Devices, caches, render passes and
command buffers are owned by the caller and passed in.

```no_run
use ash::vk;
use shader_forge::forge::{Config, Result};
use shader_forge_vulkan::forge::{DescriptorInfo, Pipeline, Program, Shader};

fn dispatch_setup(
    device: &ash::Device,
    loader: &ash::khr::push_descriptor::Device,
    cache: vk::PipelineCache,
    cmd: vk::CommandBuffer,
    output: vk::Buffer,
) -> Result<(Program, Pipeline)> {
    let config = Config::default();
    let shader = Shader::load(device, "shaders/cull.comp.spv", &config)?;
    let program = Program::new(device, &[&shader], 0, &config)?;
    let pipeline = Pipeline::create_compute(device, cache, &shader, &program)?;

    pipeline.bind(cmd);
    program.push_descriptors(loader, cmd, &[DescriptorInfo::whole_buffer(output)])?;
    Ok((program, pipeline))
}
```
*/

// Vulkan implementation modules
mod vulkan_spirv;
mod vulkan_reflect;
mod vulkan_convert;
mod vulkan_shader;
mod vulkan_descriptor_info;
mod vulkan_program;
mod vulkan_pipeline;

#[cfg(test)]
#[path = "../tests/common/spirv_builder.rs"]
mod spirv_builder;

pub use vulkan_shader::Shader;
pub use vulkan_program::Program;
pub use vulkan_pipeline::{Pipeline, RenderTarget};
pub use vulkan_descriptor_info::DescriptorInfo;

// Main namespace module
pub mod forge {
    pub use crate::vulkan_shader::Shader;
    pub use crate::vulkan_program::Program;
    pub use crate::vulkan_pipeline::{Pipeline, RenderTarget};
    pub use crate::vulkan_descriptor_info::DescriptorInfo;
}
