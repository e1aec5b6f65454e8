/// Program - live Vulkan objects of a synthesized binding contract
///
/// A program owns one descriptor set layout (set 0), the pipeline layout built on
/// it, and a descriptor update template laid out for a packed `DescriptorInfo`
/// array. All three are destroyed on drop.

use ash::khr::push_descriptor;
use ash::vk;
use shader_forge::forge::{Config, DescriptorUpdateMode, Error, Result};
use shader_forge::forge::program::{ProgramLayout, ShaderReflection};
use shader_forge::{forge_bail, forge_info};
use crate::vulkan_convert::{bind_point_to_vk, descriptor_kind_to_vk, stage_flags_to_vk, vk_error};
use crate::vulkan_descriptor_info::{
    pack_descriptors, DescriptorInfo, DescriptorPayload, DESCRIPTOR_PAYLOAD_STRIDE,
};
use crate::vulkan_shader::Shader;

const SOURCE: &str = "forge::vulkan::program";

/// Binding contract of a set of shader stages, ready for pipeline creation
pub struct Program {
    /// Merged contract the Vulkan objects were built from
    layout_desc: ProgramLayout,
    /// Set 0 layout, null when the program has no bindings
    set_layout: vk::DescriptorSetLayout,
    pipeline_layout: vk::PipelineLayout,
    /// Null when the program has no bindings
    update_template: vk::DescriptorUpdateTemplate,
    update_mode: DescriptorUpdateMode,
    /// Vulkan device (for cleanup)
    device: ash::Device,
}

impl Program {
    /// Synthesize the binding contract of `shaders` and create its Vulkan objects
    ///
    /// # Arguments
    ///
    /// * `device` - Logical device; `PushDescriptors` mode needs VK_KHR_push_descriptor enabled
    /// * `shaders` - Stages used together in one pipeline
    /// * `push_constant_size` - Byte size of the push-constant block, 0 for none
    /// * `config` - Update mode and push-constant limit
    ///
    /// # Errors
    ///
    /// Any synthesis error from [`ProgramLayout::synthesize`], or a driver error.
    /// No handle survives a failure.
    pub fn new(
        device: &ash::Device,
        shaders: &[&Shader],
        push_constant_size: u32,
        config: &Config,
    ) -> Result<Self> {
        let reflections: Vec<&ShaderReflection> = shaders.iter().map(|s| s.reflection()).collect();
        let layout_desc = ProgramLayout::synthesize(&reflections, push_constant_size, config)?;
        Self::from_layout(device, layout_desc, config.update_mode)
    }

    /// Create the Vulkan objects of an already synthesized contract
    pub fn from_layout(
        device: &ash::Device,
        layout_desc: ProgramLayout,
        update_mode: DescriptorUpdateMode,
    ) -> Result<Self> {
        // Handles are moved into `program` as they are created so that an early
        // return drops it and destroys whatever exists so far.
        let mut program = Self {
            layout_desc,
            set_layout: vk::DescriptorSetLayout::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            update_template: vk::DescriptorUpdateTemplate::null(),
            update_mode,
            device: device.clone(),
        };

        let has_bindings = !program.layout_desc.bindings().is_empty();

        if has_bindings {
            program.set_layout = program.create_set_layout()?;
        }
        program.pipeline_layout = program.create_pipeline_layout()?;
        if has_bindings {
            program.update_template = program.create_update_template()?;
        }

        forge_info!(
            SOURCE,
            "Created {:?} program: {} bindings, stages {:?}, push constants {:?}",
            program.layout_desc.bind_point(),
            program.layout_desc.bindings().len(),
            program.layout_desc.stages(),
            program.layout_desc.push_constants()
        );

        Ok(program)
    }

    fn create_set_layout(&self) -> Result<vk::DescriptorSetLayout> {
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = self
            .layout_desc
            .bindings()
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(descriptor_kind_to_vk(b.kind))
                    .descriptor_count(1)
                    .stage_flags(stage_flags_to_vk(b.stages))
            })
            .collect();

        let flags = match self.update_mode {
            DescriptorUpdateMode::PushDescriptors => {
                vk::DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR_KHR
            }
            DescriptorUpdateMode::DescriptorSet => vk::DescriptorSetLayoutCreateFlags::empty(),
        };

        let create_info = vk::DescriptorSetLayoutCreateInfo::default()
            .flags(flags)
            .bindings(&bindings);

        unsafe { self.device.create_descriptor_set_layout(&create_info, None) }
            .map_err(|e| vk_error(SOURCE, "vkCreateDescriptorSetLayout", e))
    }

    fn create_pipeline_layout(&self) -> Result<vk::PipelineLayout> {
        let set_layouts: Vec<vk::DescriptorSetLayout> = if self.set_layout == vk::DescriptorSetLayout::null() {
            Vec::new()
        } else {
            vec![self.set_layout]
        };

        let push_constant_ranges: Vec<vk::PushConstantRange> = self
            .layout_desc
            .push_constants()
            .map(|range| {
                vk::PushConstantRange::default()
                    .stage_flags(stage_flags_to_vk(range.stages))
                    .offset(range.offset)
                    .size(range.size)
            })
            .into_iter()
            .collect();

        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        unsafe { self.device.create_pipeline_layout(&create_info, None) }
            .map_err(|e| vk_error(SOURCE, "vkCreatePipelineLayout", e))
    }

    fn create_update_template(&self) -> Result<vk::DescriptorUpdateTemplate> {
        let entries: Vec<vk::DescriptorUpdateTemplateEntry> = self
            .layout_desc
            .template_entries(DESCRIPTOR_PAYLOAD_STRIDE)
            .iter()
            .map(|entry| {
                vk::DescriptorUpdateTemplateEntry::default()
                    .dst_binding(entry.binding)
                    .dst_array_element(0)
                    .descriptor_count(1)
                    .descriptor_type(descriptor_kind_to_vk(entry.kind))
                    .offset(entry.offset)
                    .stride(entry.stride)
            })
            .collect();

        let template_type = match self.update_mode {
            DescriptorUpdateMode::PushDescriptors => {
                vk::DescriptorUpdateTemplateType::PUSH_DESCRIPTORS_KHR
            }
            DescriptorUpdateMode::DescriptorSet => vk::DescriptorUpdateTemplateType::DESCRIPTOR_SET,
        };

        let create_info = vk::DescriptorUpdateTemplateCreateInfo::default()
            .descriptor_update_entries(&entries)
            .template_type(template_type)
            .descriptor_set_layout(self.set_layout)
            .pipeline_bind_point(self.bind_point())
            .pipeline_layout(self.pipeline_layout)
            .set(0);

        unsafe { self.device.create_descriptor_update_template(&create_info, None) }
            .map_err(|e| vk_error(SOURCE, "vkCreateDescriptorUpdateTemplate", e))
    }

    // ===== Batched descriptor updates =====

    /// Check `infos` against the binding list and pack them for the template
    fn pack(&self, infos: &[DescriptorInfo]) -> Result<Vec<DescriptorPayload>> {
        let classes: Vec<_> = infos.iter().map(|info| info.payload_class()).collect();
        self.layout_desc.validate_payloads(&classes)?;
        Ok(pack_descriptors(infos))
    }

    fn require_mode(&self, mode: DescriptorUpdateMode) -> Result<()> {
        if self.update_mode != mode {
            forge_bail!(
                SOURCE,
                Error::InvalidResource(format!(
                    "program was created for {:?} updates, not {:?}",
                    self.update_mode, mode
                ))
            );
        }
        Ok(())
    }

    /// Push every binding of the program into `cmd` in one call
    ///
    /// `infos` holds one entry per binding, in ascending slot order. The caller keeps
    /// the referenced resources alive until the GPU has consumed the command buffer.
    ///
    /// # Errors
    ///
    /// - `InvalidResource` if the program was created for `DescriptorSet` updates
    /// - `DescriptorMismatch` if `infos` does not match the binding list
    pub fn push_descriptors(
        &self,
        loader: &push_descriptor::Device,
        cmd: vk::CommandBuffer,
        infos: &[DescriptorInfo],
    ) -> Result<()> {
        self.require_mode(DescriptorUpdateMode::PushDescriptors)?;
        let payload = self.pack(infos)?;
        if payload.is_empty() {
            return Ok(());
        }

        unsafe {
            loader.cmd_push_descriptor_set_with_template(
                cmd,
                self.update_template,
                self.pipeline_layout,
                0,
                payload.as_ptr().cast(),
            );
        }
        Ok(())
    }

    /// Write every binding of the program into `set` in one call
    ///
    /// `set` must have been allocated with [`Program::set_layout`] and must not be in
    /// use by pending GPU work.
    ///
    /// # Errors
    ///
    /// - `InvalidResource` if the program was created for `PushDescriptors` updates
    /// - `DescriptorMismatch` if `infos` does not match the binding list
    pub fn update_descriptor_set(&self, set: vk::DescriptorSet, infos: &[DescriptorInfo]) -> Result<()> {
        self.require_mode(DescriptorUpdateMode::DescriptorSet)?;
        let payload = self.pack(infos)?;
        if payload.is_empty() {
            return Ok(());
        }

        unsafe {
            self.device.update_descriptor_set_with_template(
                set,
                self.update_template,
                payload.as_ptr().cast(),
            );
        }
        Ok(())
    }

    /// Record a push-constant update covering the whole declared range
    ///
    /// # Errors
    ///
    /// `PushConstantMismatch` if the program has no range or `data` is not exactly its size.
    pub fn push_constants(&self, cmd: vk::CommandBuffer, data: &[u8]) -> Result<()> {
        let range = match self.layout_desc.push_constants() {
            Some(range) => range,
            None => forge_bail!(
                SOURCE,
                Error::PushConstantMismatch("program declares no push constants".to_string())
            ),
        };
        if data.len() != range.size as usize {
            forge_bail!(
                SOURCE,
                Error::PushConstantMismatch(format!(
                    "{} bytes supplied for a {} byte push-constant range",
                    data.len(),
                    range.size
                ))
            );
        }

        unsafe {
            self.device.cmd_push_constants(
                cmd,
                self.pipeline_layout,
                stage_flags_to_vk(range.stages),
                range.offset,
                data,
            );
        }
        Ok(())
    }

    // ===== Accessors =====

    /// Synthesized binding contract
    pub fn layout_desc(&self) -> &ProgramLayout {
        &self.layout_desc
    }

    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    /// Set 0 layout, for allocating descriptor sets in `DescriptorSet` mode
    pub fn set_layout(&self) -> vk::DescriptorSetLayout {
        self.set_layout
    }

    pub fn update_template(&self) -> vk::DescriptorUpdateTemplate {
        self.update_template
    }

    pub fn update_mode(&self) -> DescriptorUpdateMode {
        self.update_mode
    }

    /// Stages that see the push-constant range
    pub fn push_constant_stages(&self) -> vk::ShaderStageFlags {
        stage_flags_to_vk(self.layout_desc.push_constant_stages())
    }

    pub fn bind_point(&self) -> vk::PipelineBindPoint {
        bind_point_to_vk(self.layout_desc.bind_point())
    }

    /// Work-group size of the first stage launched by a dispatch or mesh-task draw
    pub fn local_size(&self) -> Option<[u32; 3]> {
        self.layout_desc.local_size()
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        unsafe {
            if self.update_template != vk::DescriptorUpdateTemplate::null() {
                self.device.destroy_descriptor_update_template(self.update_template, None);
            }
            if self.pipeline_layout != vk::PipelineLayout::null() {
                self.device.destroy_pipeline_layout(self.pipeline_layout, None);
            }
            if self.set_layout != vk::DescriptorSetLayout::null() {
                self.device.destroy_descriptor_set_layout(self.set_layout, None);
            }
        }
    }
}
