/// SPIR-V reflection into a ShaderReflection record

use shader_forge::forge::{Error, Result};
use shader_forge::forge::program::{
    BindingTable, DescriptorKind, ShaderReflection, ShaderStage, MAX_BINDINGS,
};
use shader_forge::{forge_bail, forge_err, forge_fail, forge_trace};
use crate::vulkan_spirv::SpirvModule;

const SOURCE: &str = "forge::vulkan::reflect";

/// Reflect the entry point `entry_point` of a SPIR-V module
///
/// Resource variables come from spirq; stage and work-group size come from the
/// module scan. The record is complete or the call fails, nothing partial.
///
/// # Errors
///
/// - `MalformedShader` if the container is invalid, the entry point is missing or
///   spirq rejects the module
/// - `UnsupportedBinding` for a descriptor set other than 0 or a descriptor type
///   without a `DescriptorKind`
/// - `BindingOutOfRange` for a binding slot above 31
/// - `BindingConflict` if two variables alias one slot with different kinds
pub(crate) fn reflect_spirv(words: &[u32], entry_point: &str) -> Result<ShaderReflection> {
    let module = SpirvModule::parse(words)?;
    let entry = module.entry_point(entry_point).ok_or_else(|| {
        forge_fail!(
            SOURCE,
            Error::MalformedShader(format!("entry point '{}' not found", entry_point))
        )
    })?;

    let entry_points = spirq::ReflectConfig::new()
        .spv(words)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| {
            forge_fail!(
                SOURCE,
                Error::MalformedShader(format!("SPIR-V reflection failed: {:?}", e))
            )
        })?;

    let reflected = entry_points
        .iter()
        .find(|ep| ep.name == entry_point)
        .ok_or_else(|| {
            forge_err!(SOURCE, "spirq did not report entry point '{}'", entry_point)
        })?;

    let mut reflection = ShaderReflection {
        stage: entry.stage,
        entry_point: entry_point.to_string(),
        bindings: BindingTable::new(),
        local_size: entry.local_size,
        uses_push_constants: false,
        push_constant_size: None,
        output_count: 0,
    };

    for var in reflected.vars.iter() {
        match var {
            spirq::var::Variable::Descriptor { desc_bind, desc_ty, .. } => {
                let set = desc_bind.set();
                let binding = desc_bind.bind();
                if set != 0 {
                    forge_bail!(
                        SOURCE,
                        Error::UnsupportedBinding {
                            binding,
                            detail: format!("descriptor set {} (only set 0 is supported)", set),
                        }
                    );
                }
                if binding >= MAX_BINDINGS {
                    forge_bail!(SOURCE, Error::BindingOutOfRange { binding });
                }
                let kind = descriptor_kind(binding, desc_ty)?;
                reflection
                    .bindings
                    .insert(binding, kind)
                    .map_err(|e| forge_fail!(SOURCE, e))?;
            }
            spirq::var::Variable::PushConstant { ty, .. } => {
                reflection.uses_push_constants = true;
                let size = ty.nbyte().map(|s| s as u32);
                reflection.push_constant_size = reflection.push_constant_size.max(size);
            }
            spirq::var::Variable::Output { location, .. }
                if reflection.stage == ShaderStage::Fragment =>
            {
                reflection.output_count = reflection.output_count.max(location.loc() + 1);
            }
            _ => {}
        }
    }

    forge_trace!(
        SOURCE,
        "Reflected {:?} '{}': bindings {:#010x}, storage {:#010x}, push constants {:?}",
        reflection.stage,
        reflection.entry_point,
        reflection.used_mask(),
        reflection.storage_buffer_mask(),
        reflection.push_constant_size
    );

    Ok(reflection)
}

/// Map a spirq descriptor type onto a DescriptorKind
fn descriptor_kind(binding: u32, desc_ty: &spirq::ty::DescriptorType) -> Result<DescriptorKind> {
    use spirq::ty::DescriptorType;
    match desc_ty {
        DescriptorType::UniformBuffer() => Ok(DescriptorKind::UniformBuffer),
        DescriptorType::StorageBuffer(..) => Ok(DescriptorKind::StorageBuffer),
        DescriptorType::CombinedImageSampler() => Ok(DescriptorKind::CombinedImageSampler),
        DescriptorType::SampledImage() => Ok(DescriptorKind::SampledImage),
        DescriptorType::StorageImage(..) => Ok(DescriptorKind::StorageImage),
        DescriptorType::Sampler() => Ok(DescriptorKind::Sampler),
        other => forge_bail!(
            SOURCE,
            Error::UnsupportedBinding {
                binding,
                detail: format!("descriptor type {:?}", other),
            }
        ),
    }
}

#[cfg(test)]
#[path = "vulkan_reflect_tests.rs"]
mod tests;
