/// SPIR-V container validation and module-level scan
///
/// Resource variables are reflected by spirq; this scan covers what spirq does
/// not hand back directly: header validation, entry point stages and the
/// work-group size (LocalSize, LocalSizeId or a WorkgroupSize built-in).

use rustc_hash::FxHashMap;
use shader_forge::forge::{Error, Result};
use shader_forge::forge::program::ShaderStage;
use shader_forge::forge_bail;

const SOURCE: &str = "forge::vulkan::spirv";

pub(crate) const SPIRV_MAGIC: u32 = 0x0723_0203;
const HEADER_WORDS: usize = 5;

// Opcodes
const OP_ENTRY_POINT: u32 = 15;
const OP_EXECUTION_MODE: u32 = 16;
const OP_CONSTANT: u32 = 43;
const OP_CONSTANT_COMPOSITE: u32 = 44;
const OP_SPEC_CONSTANT: u32 = 50;
const OP_SPEC_CONSTANT_COMPOSITE: u32 = 51;
const OP_DECORATE: u32 = 71;
const OP_EXECUTION_MODE_ID: u32 = 331;

// Execution modes
const MODE_LOCAL_SIZE: u32 = 17;
const MODE_LOCAL_SIZE_ID: u32 = 38;

// Decorations
const DECORATION_BUILTIN: u32 = 11;
const BUILTIN_WORKGROUP_SIZE: u32 = 25;

/// Entry point declared by a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryPointInfo {
    pub name: String,
    pub stage: ShaderStage,
    /// Resolved work-group size, `[0, 0, 0]` when the module declares none
    pub local_size: [u32; 3],
}

/// Result of scanning a SPIR-V module
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpirvModule {
    pub version: (u32, u32),
    pub entry_points: Vec<EntryPointInfo>,
}

impl SpirvModule {
    pub fn entry_point(&self, name: &str) -> Option<&EntryPointInfo> {
        self.entry_points.iter().find(|e| e.name == name)
    }

    /// Validate the header and scan every instruction
    ///
    /// # Errors
    ///
    /// `MalformedShader` on a bad header, a truncated instruction, an unsupported
    /// execution model or an unresolvable work-group size.
    pub fn parse(words: &[u32]) -> Result<Self> {
        let version = validate_header(words)?;

        let mut entries: Vec<(u32, u32, String)> = Vec::new();
        let mut local_sizes: FxHashMap<u32, [u32; 3]> = FxHashMap::default();
        let mut local_size_ids: FxHashMap<u32, [u32; 3]> = FxHashMap::default();
        let mut constants: FxHashMap<u32, u32> = FxHashMap::default();
        let mut composites: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        let mut workgroup_builtin: Option<u32> = None;

        let mut offset = HEADER_WORDS;
        while offset < words.len() {
            let word = words[offset];
            let count = (word >> 16) as usize;
            let opcode = word & 0xffff;
            if count == 0 || offset + count > words.len() {
                forge_bail!(
                    SOURCE,
                    Error::MalformedShader(format!(
                        "instruction {} at word {} has invalid length {}",
                        opcode, offset, count
                    ))
                );
            }
            let operands = &words[offset + 1..offset + count];

            match opcode {
                OP_ENTRY_POINT if operands.len() >= 3 => {
                    let name = decode_string(&operands[2..])?;
                    entries.push((operands[0], operands[1], name));
                }
                OP_EXECUTION_MODE if operands.len() >= 5 && operands[1] == MODE_LOCAL_SIZE => {
                    local_sizes.insert(operands[0], [operands[2], operands[3], operands[4]]);
                }
                OP_EXECUTION_MODE_ID if operands.len() >= 5 && operands[1] == MODE_LOCAL_SIZE_ID => {
                    local_size_ids.insert(operands[0], [operands[2], operands[3], operands[4]]);
                }
                OP_CONSTANT | OP_SPEC_CONSTANT if operands.len() >= 3 => {
                    constants.insert(operands[1], operands[2]);
                }
                OP_CONSTANT_COMPOSITE | OP_SPEC_CONSTANT_COMPOSITE if operands.len() >= 2 => {
                    composites.insert(operands[1], operands[2..].to_vec());
                }
                OP_DECORATE
                    if operands.len() >= 3
                        && operands[1] == DECORATION_BUILTIN
                        && operands[2] == BUILTIN_WORKGROUP_SIZE =>
                {
                    workgroup_builtin = Some(operands[0]);
                }
                _ => {}
            }

            offset += count;
        }

        let resolve = |ids: &[u32]| -> Result<[u32; 3]> {
            let mut size = [0u32; 3];
            if ids.len() != 3 {
                forge_bail!(
                    SOURCE,
                    Error::MalformedShader(format!("work-group size has {} components", ids.len()))
                );
            }
            for (axis, id) in ids.iter().enumerate() {
                size[axis] = match constants.get(id) {
                    Some(value) => *value,
                    None => forge_bail!(
                        SOURCE,
                        Error::MalformedShader(format!("work-group size refers to unknown constant %{}", id))
                    ),
                };
            }
            Ok(size)
        };

        let builtin_size = match workgroup_builtin {
            Some(id) => match composites.get(&id) {
                Some(constituents) => Some(resolve(constituents)?),
                None => forge_bail!(
                    SOURCE,
                    Error::MalformedShader(format!("WorkgroupSize built-in %{} is not a constant composite", id))
                ),
            },
            None => None,
        };

        let mut entry_points = Vec::with_capacity(entries.len());
        for (model, id, name) in entries {
            let stage = stage_from_execution_model(model)?;
            let local_size = if !stage.has_workgroup() {
                [0, 0, 0]
            } else if let Some(size) = builtin_size {
                size
            } else if let Some(ids) = local_size_ids.get(&id) {
                resolve(ids)?
            } else {
                local_sizes.get(&id).copied().unwrap_or([0, 0, 0])
            };
            entry_points.push(EntryPointInfo { name, stage, local_size });
        }

        Ok(Self { version, entry_points })
    }
}

/// Convert a byte buffer into SPIR-V words in host order
///
/// Both little- and big-endian encodings are accepted; the magic number tells them apart.
pub(crate) fn words_from_bytes(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        forge_bail!(
            SOURCE,
            Error::MalformedShader(format!("size {} is not a multiple of 4 bytes", bytes.len()))
        );
    }

    let mut words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    if words.first() == Some(&SPIRV_MAGIC.swap_bytes()) {
        for word in &mut words {
            *word = word.swap_bytes();
        }
    }

    validate_header(&words)?;
    Ok(words)
}

fn validate_header(words: &[u32]) -> Result<(u32, u32)> {
    if words.len() < HEADER_WORDS {
        forge_bail!(
            SOURCE,
            Error::MalformedShader(format!("module has {} words, header needs {}", words.len(), HEADER_WORDS))
        );
    }
    if words[0] != SPIRV_MAGIC {
        forge_bail!(
            SOURCE,
            Error::MalformedShader(format!("bad magic number {:#010x}", words[0]))
        );
    }
    let major = (words[1] >> 16) & 0xff;
    let minor = (words[1] >> 8) & 0xff;
    if major != 1 {
        forge_bail!(
            SOURCE,
            Error::MalformedShader(format!("unsupported SPIR-V version {}.{}", major, minor))
        );
    }
    Ok((major, minor))
}

/// Decode a nul-terminated literal string packed little-endian into words
fn decode_string(words: &[u32]) -> Result<String> {
    let mut bytes = Vec::new();
    'outer: for word in words {
        for byte in word.to_le_bytes() {
            if byte == 0 {
                break 'outer;
            }
            bytes.push(byte);
        }
    }
    String::from_utf8(bytes).map_err(|_| {
        shader_forge::forge_fail!(
            SOURCE,
            Error::MalformedShader("entry point name is not valid UTF-8".to_string())
        )
    })
}

fn stage_from_execution_model(model: u32) -> Result<ShaderStage> {
    match model {
        0 => Ok(ShaderStage::Vertex),
        1 => Ok(ShaderStage::TessellationControl),
        2 => Ok(ShaderStage::TessellationEvaluation),
        3 => Ok(ShaderStage::Geometry),
        4 => Ok(ShaderStage::Fragment),
        5 => Ok(ShaderStage::Compute),
        // TaskNV / TaskEXT
        5267 | 5364 => Ok(ShaderStage::Task),
        // MeshNV / MeshEXT
        5268 | 5365 => Ok(ShaderStage::Mesh),
        other => forge_bail!(
            SOURCE,
            Error::MalformedShader(format!("execution model {} is not supported", other))
        ),
    }
}

#[cfg(test)]
#[path = "vulkan_spirv_tests.rs"]
mod tests;
