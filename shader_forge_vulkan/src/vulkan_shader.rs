/// Shader - a compiled shader stage and its reflected metadata

use std::ffi::{CStr, CString};
use std::path::Path;

use ash::vk;
use shader_forge::forge::{Config, Error, Result};
use shader_forge::forge::program::{ShaderReflection, ShaderStage};
use shader_forge::{forge_debug, forge_fail};
use crate::vulkan_convert::{stage_to_vk, vk_error};
use crate::vulkan_reflect::reflect_spirv;
use crate::vulkan_spirv::words_from_bytes;

const SOURCE: &str = "forge::vulkan::shader";

/// Live shader module plus the reflection record of its entry point
///
/// The module is destroyed on drop.
pub struct Shader {
    /// Vulkan shader module
    module: vk::ShaderModule,
    /// Reflected metadata, immutable after load
    reflection: ShaderReflection,
    /// Entry point name handed to pipeline creation
    entry_point: CString,
    /// Vulkan device (for cleanup)
    device: ash::Device,
}

impl Shader {
    /// Load a SPIR-V binary from disk
    ///
    /// # Errors
    ///
    /// `ShaderLoadFailed` if the file cannot be read, otherwise as [`Shader::from_bytes`].
    pub fn load<P: AsRef<Path>>(device: &ash::Device, path: P, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            forge_fail!(
                SOURCE,
                Error::ShaderLoadFailed(format!("{}: {}", path.display(), e))
            )
        })?;
        Self::from_bytes(device, &bytes, config)
    }

    /// Create a shader from SPIR-V bytes (either endianness)
    ///
    /// Reflection runs before the module is created, so a rejected binary never
    /// allocates a handle.
    ///
    /// # Errors
    ///
    /// - `MalformedShader`, `UnsupportedBinding`, `BindingOutOfRange` or
    ///   `BindingConflict` from reflection
    /// - `OutOfMemory` / `BackendError` if the driver rejects the module
    pub fn from_bytes(device: &ash::Device, bytes: &[u8], config: &Config) -> Result<Self> {
        let entry_point = CString::new(config.entry_point.as_str()).map_err(|_| {
            forge_fail!(
                SOURCE,
                Error::MalformedShader("entry point name contains a NUL byte".to_string())
            )
        })?;

        let words = words_from_bytes(bytes)?;
        let reflection = reflect_spirv(&words, &config.entry_point)?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&words);
        let module = unsafe { device.create_shader_module(&create_info, None) }
            .map_err(|e| vk_error(SOURCE, "vkCreateShaderModule", e))?;

        forge_debug!(
            SOURCE,
            "Loaded {:?} shader '{}' ({} bindings, local size {:?})",
            reflection.stage,
            config.entry_point,
            reflection.bindings.len(),
            reflection.local_size
        );

        Ok(Self {
            module,
            reflection,
            entry_point,
            device: device.clone(),
        })
    }

    /// Reflect SPIR-V bytes without creating a module
    pub fn reflect_bytes(bytes: &[u8], entry_point: &str) -> Result<ShaderReflection> {
        let words = words_from_bytes(bytes)?;
        reflect_spirv(&words, entry_point)
    }

    pub fn module(&self) -> vk::ShaderModule {
        self.module
    }

    pub fn stage(&self) -> ShaderStage {
        self.reflection.stage
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    pub fn entry_point(&self) -> &CStr {
        &self.entry_point
    }

    /// Work-group size, `[0, 0, 0]` for stages without one
    pub fn local_size(&self) -> [u32; 3] {
        self.reflection.local_size
    }

    pub(crate) fn stage_create_info(&self) -> vk::PipelineShaderStageCreateInfo<'_> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(stage_to_vk(self.reflection.stage))
            .module(self.module)
            .name(&self.entry_point)
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_shader_tests.rs"]
mod tests;
