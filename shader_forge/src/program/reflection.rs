/// Per-stage reflection record extracted from a compiled shader

use crate::program::{BindingTable, ShaderStage};

/// Reflected metadata of one compiled shader stage
///
/// Produced by a backend loader. Immutable once built; loading the same binary
/// twice yields equal records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderReflection {
    /// Stage of the reflected entry point
    pub stage: ShaderStage,
    /// Name of the reflected entry point
    pub entry_point: String,
    /// Descriptor kind per binding slot
    pub bindings: BindingTable,
    /// Work-group size, meaningful for compute, task and mesh stages
    pub local_size: [u32; 3],
    /// Whether the stage declares a push-constant block
    pub uses_push_constants: bool,
    /// Byte size of the push-constant block, when the stage declares one
    pub push_constant_size: Option<u32>,
    /// Number of output locations written (max location + 1)
    pub output_count: u32,
}

impl ShaderReflection {
    /// Empty record for `stage` with entry point "main"
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            entry_point: "main".to_string(),
            bindings: BindingTable::new(),
            local_size: [0, 0, 0],
            uses_push_constants: false,
            push_constant_size: None,
            output_count: 0,
        }
    }

    /// Bit i set iff slot i is referenced by this stage
    pub fn used_mask(&self) -> u32 {
        self.bindings.used_mask()
    }

    /// Bit i set iff slot i is a storage buffer in this stage
    pub fn storage_buffer_mask(&self) -> u32 {
        self.bindings.storage_buffer_mask()
    }
}
