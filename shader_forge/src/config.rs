//! Shader Forge configuration

/// How a program's resource bindings are written each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorUpdateMode {
    /// Bindings are pushed straight into the command buffer (VK_KHR_push_descriptor).
    /// No descriptor sets or pools are involved.
    PushDescriptors,
    /// Bindings are written into a descriptor set allocated by the caller
    DescriptorSet,
}

/// Configuration shared by the loader and program creation
#[derive(Debug, Clone)]
pub struct Config {
    /// Entry point reflected and bound for every shader
    pub entry_point: String,
    /// Descriptor update mechanism baked into the update template
    pub update_mode: DescriptorUpdateMode,
    /// Largest push-constant block a program may declare, in bytes
    pub max_push_constant_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry_point: "main".to_string(),
            update_mode: DescriptorUpdateMode::PushDescriptors,
            // Minimum guaranteed by every Vulkan implementation
            max_push_constant_size: 128,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
