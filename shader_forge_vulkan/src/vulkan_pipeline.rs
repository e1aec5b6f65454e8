/// Pipeline - graphics and compute pipeline creation from a Program

use ash::vk;
use shader_forge::forge::{Error, Result};
use shader_forge::forge::program::{
    validate_compute_stage, validate_graphics_stages, BindPoint, GraphicsState, PrimitiveTopology,
    ShaderReflection,
};
use shader_forge::{forge_bail, forge_debug};
use crate::vulkan_convert::{
    blend_attachment_to_vk, compare_op_to_vk, cull_mode_to_vk, front_face_to_vk,
    polygon_mode_to_vk, topology_to_vk, vk_error,
};
use crate::vulkan_program::Program;
use crate::vulkan_shader::Shader;

const SOURCE: &str = "forge::vulkan::pipeline";

/// Attachments a graphics pipeline renders into
///
/// Render passes and framebuffers are owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderTarget {
    /// Subpass of a classic render pass
    RenderPass {
        render_pass: vk::RenderPass,
        subpass: u32,
        color_attachment_count: u32,
    },
    /// Dynamic rendering (Vulkan 1.3); `depth_format` is `UNDEFINED` without depth
    Dynamic {
        color_formats: Vec<vk::Format>,
        depth_format: vk::Format,
    },
}

impl RenderTarget {
    pub fn color_attachment_count(&self) -> u32 {
        match self {
            Self::RenderPass { color_attachment_count, .. } => *color_attachment_count,
            Self::Dynamic { color_formats, .. } => color_formats.len() as u32,
        }
    }
}

/// Executable pipeline object, destroyed on drop
pub struct Pipeline {
    pipeline: vk::Pipeline,
    bind_point: vk::PipelineBindPoint,
    /// Vulkan device (for cleanup)
    device: ash::Device,
}

impl Pipeline {
    /// Create a graphics pipeline from `shaders` and the layout of `program`
    ///
    /// # Arguments
    ///
    /// * `cache` - Pipeline cache owned by the caller, may be null
    /// * `shaders` - Graphics stages, each part of `program`
    /// * `target` - Attachments the pipeline renders into
    /// * `program` - Graphics program providing the pipeline layout
    /// * `state` - Fixed-function state; viewport and scissor are always dynamic
    ///
    /// # Errors
    ///
    /// - `InvalidStageCombination` if the stages cannot form a graphics pipeline
    /// - `InvalidResource` if `program` is not a graphics program, lacks one of the
    ///   stages, or the fragment outputs do not fit `target`
    /// - `OutOfMemory` / `BackendError` if the driver rejects the pipeline
    pub fn create_graphics(
        device: &ash::Device,
        cache: vk::PipelineCache,
        shaders: &[&Shader],
        target: &RenderTarget,
        program: &Program,
        state: &GraphicsState,
    ) -> Result<Self> {
        let reflections: Vec<&ShaderReflection> = shaders.iter().map(|s| s.reflection()).collect();
        validate_graphics_stages(&reflections, target.color_attachment_count(), state.topology)?;
        check_program(program, BindPoint::Graphics, &reflections)?;

        let stages: Vec<vk::PipelineShaderStageCreateInfo> =
            shaders.iter().map(|s| s.stage_create_info()).collect();

        // Vertex data is pulled from storage buffers
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default();

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(state.topology))
            .primitive_restart_enable(false);

        let control_points = match state.topology {
            PrimitiveTopology::PatchList { control_points } => control_points,
            _ => 0,
        };
        let tessellation_state =
            vk::PipelineTessellationStateCreateInfo::default().patch_control_points(control_points);

        // Viewport state (dynamic)
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(polygon_mode_to_vk(state.rasterization.polygon_mode))
            .line_width(1.0)
            .cull_mode(cull_mode_to_vk(state.rasterization.cull_mode))
            .front_face(front_face_to_vk(state.rasterization.front_face))
            .depth_bias_enable(false);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(state.depth.test_enable)
            .depth_write_enable(state.depth.write_enable)
            .depth_compare_op(compare_op_to_vk(state.depth.compare_op))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let blend_attachments =
            vec![blend_attachment_to_vk(state.blend); target.color_attachment_count() as usize];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let mut rendering_info = vk::PipelineRenderingCreateInfo::default();

        let mut create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .depth_stencil_state(&depth_stencil_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(program.pipeline_layout());

        if control_points > 0 {
            create_info = create_info.tessellation_state(&tessellation_state);
        }

        match target {
            RenderTarget::RenderPass { render_pass, subpass, .. } => {
                create_info = create_info.render_pass(*render_pass).subpass(*subpass);
            }
            RenderTarget::Dynamic { color_formats, depth_format } => {
                rendering_info = rendering_info
                    .color_attachment_formats(color_formats)
                    .depth_attachment_format(*depth_format);
                create_info = create_info.push_next(&mut rendering_info);
            }
        }

        let pipeline = unsafe {
            device.create_graphics_pipelines(cache, std::slice::from_ref(&create_info), None)
        }
        .map_err(|(pipelines, result)| {
            destroy_pipelines(device, &pipelines);
            vk_error(SOURCE, "vkCreateGraphicsPipelines", result)
        })?;

        forge_debug!(
            SOURCE,
            "Created graphics pipeline ({} stages, {} color attachments)",
            shaders.len(),
            target.color_attachment_count()
        );

        Self::from_created(device, pipeline, vk::PipelineBindPoint::GRAPHICS)
    }

    /// Create a compute pipeline from `shader` and the layout of `program`
    ///
    /// # Errors
    ///
    /// - `InvalidStageCombination` if `shader` is not a compute stage
    /// - `InvalidResource` if `program` is not a compute program
    /// - `OutOfMemory` / `BackendError` if the driver rejects the pipeline
    pub fn create_compute(
        device: &ash::Device,
        cache: vk::PipelineCache,
        shader: &Shader,
        program: &Program,
    ) -> Result<Self> {
        validate_compute_stage(shader.reflection())?;
        check_program(program, BindPoint::Compute, &[shader.reflection()])?;

        let create_info = vk::ComputePipelineCreateInfo::default()
            .stage(shader.stage_create_info())
            .layout(program.pipeline_layout());

        let pipeline = unsafe {
            device.create_compute_pipelines(cache, std::slice::from_ref(&create_info), None)
        }
        .map_err(|(pipelines, result)| {
            destroy_pipelines(device, &pipelines);
            vk_error(SOURCE, "vkCreateComputePipelines", result)
        })?;

        forge_debug!(
            SOURCE,
            "Created compute pipeline (local size {:?})",
            shader.local_size()
        );

        Self::from_created(device, pipeline, vk::PipelineBindPoint::COMPUTE)
    }

    fn from_created(
        device: &ash::Device,
        pipelines: Vec<vk::Pipeline>,
        bind_point: vk::PipelineBindPoint,
    ) -> Result<Self> {
        match pipelines.first() {
            Some(&pipeline) => Ok(Self {
                pipeline,
                bind_point,
                device: device.clone(),
            }),
            None => Err(vk_error(SOURCE, "pipeline creation", vk::Result::ERROR_UNKNOWN)),
        }
    }

    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn bind_point(&self) -> vk::PipelineBindPoint {
        self.bind_point
    }

    /// Record a bind of this pipeline into `cmd`
    pub fn bind(&self, cmd: vk::CommandBuffer) {
        unsafe {
            self.device.cmd_bind_pipeline(cmd, self.bind_point, self.pipeline);
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
        }
    }
}

/// Check that `program` was built for `bind_point` and covers every stage
fn check_program(
    program: &Program,
    bind_point: BindPoint,
    shaders: &[&ShaderReflection],
) -> Result<()> {
    let layout = program.layout_desc();
    if layout.bind_point() != bind_point {
        forge_bail!(
            SOURCE,
            Error::InvalidResource(format!(
                "{:?} program used for a {:?} pipeline",
                layout.bind_point(),
                bind_point
            ))
        );
    }
    for shader in shaders {
        if !layout.stages().contains(shader.stage.flag()) {
            forge_bail!(
                SOURCE,
                Error::InvalidResource(format!(
                    "{:?} stage is not part of the program (stages {:?})",
                    shader.stage,
                    layout.stages()
                ))
            );
        }
    }
    Ok(())
}

fn destroy_pipelines(device: &ash::Device, pipelines: &[vk::Pipeline]) {
    for &pipeline in pipelines {
        if pipeline != vk::Pipeline::null() {
            unsafe {
                device.destroy_pipeline(pipeline, None);
            }
        }
    }
}
