/// Binding-contract synthesis
///
/// Merges the reflection records of the stages used together in one pipeline into
/// a single contract: one binding list (one entry per slot used by any stage, with
/// the union of the stages using it), one push-constant range, and the entries of
/// the update template that maps an array of descriptor infos onto the slots.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::program::{
    DescriptorKind, PayloadClass, ShaderReflection, ShaderStage, ShaderStageFlags, MAX_BINDINGS,
};
use crate::{forge_bail, forge_debug, forge_trace};

const SOURCE: &str = "forge::program";

/// Pipeline bind point a program is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindPoint {
    Graphics,
    Compute,
}

/// One slot of the merged binding list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramBinding {
    /// Slot index (0..MAX_BINDINGS)
    pub binding: u32,
    /// Kind agreed on by every stage that uses the slot
    pub kind: DescriptorKind,
    /// Union of the stages that use the slot
    pub stages: ShaderStageFlags,
}

/// Push constant range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushConstantRange {
    /// Stages that can access these push constants
    pub stages: ShaderStageFlags,
    /// Offset in bytes
    pub offset: u32,
    /// Size in bytes
    pub size: u32,
}

/// One entry of a descriptor update template
///
/// Entry `i` reads the `i`-th element of the descriptor info array, located at
/// `offset = i * stride` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateEntry {
    pub binding: u32,
    pub kind: DescriptorKind,
    pub offset: usize,
    pub stride: usize,
}

/// Synthesized binding contract of a set of shader stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramLayout {
    bindings: Vec<ProgramBinding>,
    stages: ShaderStageFlags,
    bind_point: BindPoint,
    push_constants: Option<PushConstantRange>,
    local_size: Option<[u32; 3]>,
}

impl ProgramLayout {
    /// Merge `shaders` into one binding contract
    ///
    /// # Arguments
    ///
    /// * `shaders` - Reflection records of the stages used together (non-empty)
    /// * `push_constant_size` - Size in bytes of the push-constant block the caller will push
    /// * `config` - Limits (maximum push-constant size)
    ///
    /// # Errors
    ///
    /// - `InvalidStageCombination` if `shaders` is empty, repeats a stage, or mixes
    ///   compute with graphics stages
    /// - `BindingConflict` if two stages declare different kinds at the same slot
    /// - `PushConstantMismatch` if the requested size does not fit what the stages declare
    pub fn synthesize(
        shaders: &[&ShaderReflection],
        push_constant_size: u32,
        config: &Config,
    ) -> Result<Self> {
        let (stages, bind_point) = Self::resolve_stages(shaders)?;
        let bindings = Self::merge_bindings(shaders)?;
        let push_constants = Self::resolve_push_constants(shaders, push_constant_size, config)?;
        // The first stage launched by a dispatch or mesh-task draw defines the grid
        let local_size = [ShaderStage::Compute, ShaderStage::Task, ShaderStage::Mesh]
            .iter()
            .find_map(|stage| shaders.iter().find(|s| s.stage == *stage))
            .map(|s| s.local_size);

        forge_debug!(
            SOURCE,
            "Synthesized {:?} program: stages {:?}, {} bindings (used mask {:#010x}), push constants {:?}",
            bind_point,
            stages,
            bindings.len(),
            bindings.iter().fold(0u32, |m, b| m | (1 << b.binding)),
            push_constants
        );

        Ok(Self {
            bindings,
            stages,
            bind_point,
            push_constants,
            local_size,
        })
    }

    fn resolve_stages(shaders: &[&ShaderReflection]) -> Result<(ShaderStageFlags, BindPoint)> {
        if shaders.is_empty() {
            forge_bail!(
                SOURCE,
                Error::InvalidStageCombination("a program needs at least one shader".to_string())
            );
        }

        let mut stages = ShaderStageFlags::empty();
        for shader in shaders {
            let flag = shader.stage.flag();
            if stages.contains(flag) {
                forge_bail!(
                    SOURCE,
                    Error::InvalidStageCombination(format!("stage {:?} appears twice", shader.stage))
                );
            }
            stages |= flag;
        }

        if stages.contains(ShaderStageFlags::COMPUTE) {
            if shaders.len() > 1 {
                forge_bail!(
                    SOURCE,
                    Error::InvalidStageCombination(format!(
                        "compute cannot be combined with other stages ({:?})",
                        stages
                    ))
                );
            }
            Ok((stages, BindPoint::Compute))
        } else {
            Ok((stages, BindPoint::Graphics))
        }
    }

    fn merge_bindings(shaders: &[&ShaderReflection]) -> Result<Vec<ProgramBinding>> {
        let mut merged = Vec::new();

        for binding in 0..MAX_BINDINGS {
            let mut slot: Option<ProgramBinding> = None;

            for shader in shaders {
                let Some(kind) = shader.bindings.get(binding) else {
                    continue;
                };
                match slot.as_mut() {
                    None => {
                        slot = Some(ProgramBinding {
                            binding,
                            kind,
                            stages: shader.stage.flag(),
                        })
                    }
                    Some(existing) if existing.kind != kind => {
                        forge_bail!(
                            SOURCE,
                            Error::BindingConflict {
                                binding,
                                first: existing.kind,
                                second: kind,
                            }
                        );
                    }
                    Some(existing) => existing.stages |= shader.stage.flag(),
                }
            }

            if let Some(entry) = slot {
                forge_trace!(SOURCE, "Binding {}: {:?} visible to {:?}", binding, entry.kind, entry.stages);
                merged.push(entry);
            }
        }

        Ok(merged)
    }

    fn resolve_push_constants(
        shaders: &[&ShaderReflection],
        size: u32,
        config: &Config,
    ) -> Result<Option<PushConstantRange>> {
        let stages = shaders
            .iter()
            .filter(|s| s.uses_push_constants)
            .fold(ShaderStageFlags::empty(), |acc, s| acc | s.stage.flag());

        if stages.is_empty() {
            if size > 0 {
                forge_bail!(
                    SOURCE,
                    Error::PushConstantMismatch(format!(
                        "{} bytes requested but no stage declares push constants",
                        size
                    ))
                );
            }
            return Ok(None);
        }

        if size == 0 {
            forge_bail!(
                SOURCE,
                Error::PushConstantMismatch(format!(
                    "stages {:?} declare push constants but no size was given",
                    stages
                ))
            );
        }
        if size % 4 != 0 {
            forge_bail!(
                SOURCE,
                Error::PushConstantMismatch(format!("size {} is not a multiple of 4", size))
            );
        }
        if size > config.max_push_constant_size {
            forge_bail!(
                SOURCE,
                Error::PushConstantMismatch(format!(
                    "size {} exceeds the limit of {} bytes",
                    size, config.max_push_constant_size
                ))
            );
        }

        let declared = shaders.iter().filter_map(|s| s.push_constant_size).max();
        match declared {
            Some(declared) if declared > size => {
                forge_bail!(
                    SOURCE,
                    Error::PushConstantMismatch(format!(
                        "stages declare a {} byte block but only {} bytes were requested",
                        declared, size
                    ))
                );
            }
            _ => {}
        }

        Ok(Some(PushConstantRange {
            stages,
            offset: 0,
            size,
        }))
    }

    /// Merged binding list, ascending by slot
    pub fn bindings(&self) -> &[ProgramBinding] {
        &self.bindings
    }

    /// Merged entry for `binding`, if any stage uses it
    pub fn binding(&self, binding: u32) -> Option<&ProgramBinding> {
        self.bindings.iter().find(|b| b.binding == binding)
    }

    /// Stages that make up the program
    pub fn stages(&self) -> ShaderStageFlags {
        self.stages
    }

    pub fn bind_point(&self) -> BindPoint {
        self.bind_point
    }

    /// Push-constant range, `None` when no stage declares push constants
    pub fn push_constants(&self) -> Option<PushConstantRange> {
        self.push_constants
    }

    /// Union of the stages that declare push constants (empty when none do)
    pub fn push_constant_stages(&self) -> ShaderStageFlags {
        self.push_constants
            .map(|range| range.stages)
            .unwrap_or_else(ShaderStageFlags::empty)
    }

    /// Work-group size for dispatch sizing, passed through unmodified
    ///
    /// The compute stage for compute programs. For mesh programs the task stage if
    /// present, otherwise the mesh stage. `None` for vertex pipelines.
    pub fn local_size(&self) -> Option<[u32; 3]> {
        self.local_size
    }

    /// Bit i set iff slot i is used by any stage
    pub fn used_mask(&self) -> u32 {
        self.bindings.iter().fold(0, |mask, b| mask | (1 << b.binding))
    }

    /// Bit i set iff slot i is a storage buffer
    pub fn storage_buffer_mask(&self) -> u32 {
        self.bindings
            .iter()
            .filter(|b| b.kind.is_storage_buffer())
            .fold(0, |mask, b| mask | (1 << b.binding))
    }

    /// Update template entries for a descriptor info array with elements `stride` bytes apart
    ///
    /// Entries follow the binding list order, so element `i` of the array lands in
    /// the `i`-th used slot in ascending slot order.
    pub fn template_entries(&self, stride: usize) -> Vec<TemplateEntry> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(index, b)| TemplateEntry {
                binding: b.binding,
                kind: b.kind,
                offset: index * stride,
                stride,
            })
            .collect()
    }

    /// Check a descriptor info array (given by payload class, in array order) against the bindings
    ///
    /// # Errors
    ///
    /// `DescriptorMismatch` if the array length differs from the binding count or an
    /// element's class does not match its slot
    pub fn validate_payloads(&self, classes: &[PayloadClass]) -> Result<()> {
        if classes.len() != self.bindings.len() {
            forge_bail!(
                SOURCE,
                Error::DescriptorMismatch(format!(
                    "{} descriptor infos supplied for {} bindings",
                    classes.len(),
                    self.bindings.len()
                ))
            );
        }

        for (index, (class, binding)) in classes.iter().zip(&self.bindings).enumerate() {
            let expected = binding.kind.payload_class();
            if *class != expected {
                forge_bail!(
                    SOURCE,
                    Error::DescriptorMismatch(format!(
                        "descriptor info {} is a {:?} payload but binding {} ({:?}) expects {:?}",
                        index, class, binding.binding, binding.kind, expected
                    ))
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "program_layout_tests.rs"]
mod tests;
