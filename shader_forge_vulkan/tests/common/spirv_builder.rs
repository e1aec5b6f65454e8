//! Minimal SPIR-V assembler used by tests
//!
//! Produces small but well-formed modules: one entry point with an empty body,
//! any number of descriptor resources, an optional push-constant block, fragment
//! outputs and compute work-group sizes.

#![allow(dead_code)]

pub const MAGIC: u32 = 0x0723_0203;
pub const VERSION_1_3: u32 = 0x0001_0300;

/// Execution models
pub mod model {
    pub const VERTEX: u32 = 0;
    pub const TESSELLATION_CONTROL: u32 = 1;
    pub const TESSELLATION_EVALUATION: u32 = 2;
    pub const GEOMETRY: u32 = 3;
    pub const FRAGMENT: u32 = 4;
    pub const GL_COMPUTE: u32 = 5;
    pub const TASK_EXT: u32 = 5364;
    pub const MESH_EXT: u32 = 5365;
    pub const RAY_GENERATION_KHR: u32 = 5313;
}

// Opcodes
const OP_MEMORY_MODEL: u32 = 14;
const OP_ENTRY_POINT: u32 = 15;
const OP_EXECUTION_MODE: u32 = 16;
const OP_CAPABILITY: u32 = 17;
const OP_TYPE_VOID: u32 = 19;
const OP_TYPE_INT: u32 = 21;
const OP_TYPE_FLOAT: u32 = 22;
const OP_TYPE_VECTOR: u32 = 23;
const OP_TYPE_IMAGE: u32 = 25;
const OP_TYPE_SAMPLER: u32 = 26;
const OP_TYPE_SAMPLED_IMAGE: u32 = 27;
const OP_TYPE_RUNTIME_ARRAY: u32 = 29;
const OP_TYPE_STRUCT: u32 = 30;
const OP_TYPE_POINTER: u32 = 32;
const OP_TYPE_FUNCTION: u32 = 33;
const OP_CONSTANT: u32 = 43;
const OP_CONSTANT_COMPOSITE: u32 = 44;
const OP_FUNCTION: u32 = 54;
const OP_FUNCTION_END: u32 = 56;
const OP_VARIABLE: u32 = 59;
const OP_DECORATE: u32 = 71;
const OP_MEMBER_DECORATE: u32 = 72;
const OP_LABEL: u32 = 248;
const OP_RETURN: u32 = 253;
const OP_EXECUTION_MODE_ID: u32 = 331;

// Decorations
const DECORATION_BLOCK: u32 = 2;
const DECORATION_ARRAY_STRIDE: u32 = 6;
const DECORATION_BUILTIN: u32 = 11;
const DECORATION_LOCATION: u32 = 30;
const DECORATION_BINDING: u32 = 33;
const DECORATION_DESCRIPTOR_SET: u32 = 34;
const DECORATION_OFFSET: u32 = 35;
const DECORATION_INPUT_ATTACHMENT_INDEX: u32 = 43;

// Storage classes
const STORAGE_UNIFORM_CONSTANT: u32 = 0;
const STORAGE_UNIFORM: u32 = 2;
const STORAGE_OUTPUT: u32 = 3;
const STORAGE_PUSH_CONSTANT: u32 = 9;
const STORAGE_STORAGE_BUFFER: u32 = 12;

/// Resource declared at a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    StorageBuffer,
    UniformBuffer,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    Sampler,
    InputAttachment,
}

/// Builder for a single-entry-point module
#[derive(Debug, Clone)]
pub struct SpirvBuilder {
    model: u32,
    entry_name: String,
    local_size: Option<[u32; 3]>,
    local_size_id: Option<[u32; 3]>,
    workgroup_builtin: Option<[u32; 3]>,
    resources: Vec<(u32, u32, Resource)>,
    push_constant_floats: u32,
    outputs: Vec<u32>,
}

#[derive(Default)]
struct Sections {
    next_id: u32,
    entry: Vec<u32>,
    modes: Vec<u32>,
    annotations: Vec<u32>,
    globals: Vec<u32>,
}

impl Sections {
    fn id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn emit(section: &mut Vec<u32>, opcode: u32, operands: &[u32]) {
    section.push(((operands.len() as u32 + 1) << 16) | opcode);
    section.extend_from_slice(operands);
}

/// Literal string: UTF-8 bytes, nul terminated, padded to a word boundary
pub fn string_words(s: &str) -> Vec<u32> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Serialize words as little-endian bytes
pub fn to_le_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Serialize words as big-endian bytes
pub fn to_be_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

impl SpirvBuilder {
    pub fn new(model: u32) -> Self {
        Self {
            model,
            entry_name: "main".to_string(),
            local_size: None,
            local_size_id: None,
            workgroup_builtin: None,
            resources: Vec::new(),
            push_constant_floats: 0,
            outputs: Vec::new(),
        }
    }

    pub fn compute(x: u32, y: u32, z: u32) -> Self {
        Self::new(model::GL_COMPUTE).local_size(x, y, z)
    }

    pub fn entry_name(mut self, name: &str) -> Self {
        self.entry_name = name.to_string();
        self
    }

    pub fn local_size(mut self, x: u32, y: u32, z: u32) -> Self {
        self.local_size = Some([x, y, z]);
        self
    }

    /// Work-group size through `OpExecutionModeId LocalSizeId`
    pub fn local_size_id(mut self, x: u32, y: u32, z: u32) -> Self {
        self.local_size_id = Some([x, y, z]);
        self
    }

    /// Work-group size through a constant decorated `BuiltIn WorkgroupSize`
    pub fn workgroup_size_builtin(mut self, x: u32, y: u32, z: u32) -> Self {
        self.workgroup_builtin = Some([x, y, z]);
        self
    }

    pub fn resource(mut self, set: u32, binding: u32, resource: Resource) -> Self {
        self.resources.push((set, binding, resource));
        self
    }

    /// Push-constant block of `count` floats (`4 * count` bytes)
    pub fn push_constants(mut self, count: u32) -> Self {
        self.push_constant_floats = count;
        self
    }

    /// vec4 output at `location`
    pub fn output(mut self, location: u32) -> Self {
        self.outputs.push(location);
        self
    }

    pub fn build(&self) -> Vec<u32> {
        let mut s = Sections { next_id: 1, ..Default::default() };

        let main = s.id();
        let void = s.id();
        emit(&mut s.globals, OP_TYPE_VOID, &[void]);
        let fn_ty = s.id();
        emit(&mut s.globals, OP_TYPE_FUNCTION, &[fn_ty, void]);
        let float = s.id();
        emit(&mut s.globals, OP_TYPE_FLOAT, &[float, 32]);
        let uint = s.id();
        emit(&mut s.globals, OP_TYPE_INT, &[uint, 32, 0]);
        let vec4 = s.id();
        emit(&mut s.globals, OP_TYPE_VECTOR, &[vec4, float, 4]);
        let runtime = s.id();
        emit(&mut s.globals, OP_TYPE_RUNTIME_ARRAY, &[runtime, float]);
        emit(&mut s.annotations, OP_DECORATE, &[runtime, DECORATION_ARRAY_STRIDE, 4]);

        for &(set, binding, resource) in &self.resources {
            let (pointee, storage) = match resource {
                Resource::StorageBuffer => {
                    let block = s.id();
                    emit(&mut s.globals, OP_TYPE_STRUCT, &[block, runtime]);
                    emit(&mut s.annotations, OP_MEMBER_DECORATE, &[block, 0, DECORATION_OFFSET, 0]);
                    emit(&mut s.annotations, OP_DECORATE, &[block, DECORATION_BLOCK]);
                    (block, STORAGE_STORAGE_BUFFER)
                }
                Resource::UniformBuffer => {
                    let block = s.id();
                    emit(&mut s.globals, OP_TYPE_STRUCT, &[block, vec4]);
                    emit(&mut s.annotations, OP_MEMBER_DECORATE, &[block, 0, DECORATION_OFFSET, 0]);
                    emit(&mut s.annotations, OP_DECORATE, &[block, DECORATION_BLOCK]);
                    (block, STORAGE_UNIFORM)
                }
                Resource::CombinedImageSampler => {
                    let image = image_type(&mut s, float, 1, 1, 0);
                    let sampled = s.id();
                    emit(&mut s.globals, OP_TYPE_SAMPLED_IMAGE, &[sampled, image]);
                    (sampled, STORAGE_UNIFORM_CONSTANT)
                }
                Resource::SampledImage => (image_type(&mut s, float, 1, 1, 0), STORAGE_UNIFORM_CONSTANT),
                // Rgba32f
                Resource::StorageImage => (image_type(&mut s, float, 1, 2, 1), STORAGE_UNIFORM_CONSTANT),
                Resource::Sampler => {
                    let sampler = s.id();
                    emit(&mut s.globals, OP_TYPE_SAMPLER, &[sampler]);
                    (sampler, STORAGE_UNIFORM_CONSTANT)
                }
                // SubpassData
                Resource::InputAttachment => (image_type(&mut s, float, 6, 2, 0), STORAGE_UNIFORM_CONSTANT),
            };

            let pointer = s.id();
            emit(&mut s.globals, OP_TYPE_POINTER, &[pointer, storage, pointee]);
            let var = s.id();
            emit(&mut s.globals, OP_VARIABLE, &[pointer, var, storage]);
            emit(&mut s.annotations, OP_DECORATE, &[var, DECORATION_DESCRIPTOR_SET, set]);
            emit(&mut s.annotations, OP_DECORATE, &[var, DECORATION_BINDING, binding]);
            if resource == Resource::InputAttachment {
                emit(&mut s.annotations, OP_DECORATE, &[var, DECORATION_INPUT_ATTACHMENT_INDEX, 0]);
            }
        }

        if self.push_constant_floats > 0 {
            let block = s.id();
            let mut members = vec![block];
            members.extend(std::iter::repeat(float).take(self.push_constant_floats as usize));
            emit(&mut s.globals, OP_TYPE_STRUCT, &members);
            for member in 0..self.push_constant_floats {
                emit(
                    &mut s.annotations,
                    OP_MEMBER_DECORATE,
                    &[block, member, DECORATION_OFFSET, member * 4],
                );
            }
            emit(&mut s.annotations, OP_DECORATE, &[block, DECORATION_BLOCK]);
            let pointer = s.id();
            emit(&mut s.globals, OP_TYPE_POINTER, &[pointer, STORAGE_PUSH_CONSTANT, block]);
            let var = s.id();
            emit(&mut s.globals, OP_VARIABLE, &[pointer, var, STORAGE_PUSH_CONSTANT]);
        }

        let mut interface = Vec::new();
        if !self.outputs.is_empty() {
            let pointer = s.id();
            emit(&mut s.globals, OP_TYPE_POINTER, &[pointer, STORAGE_OUTPUT, vec4]);
            for &location in &self.outputs {
                let var = s.id();
                emit(&mut s.globals, OP_VARIABLE, &[pointer, var, STORAGE_OUTPUT]);
                emit(&mut s.annotations, OP_DECORATE, &[var, DECORATION_LOCATION, location]);
                interface.push(var);
            }
        }

        if let Some([x, y, z]) = self.local_size {
            emit(&mut s.modes, OP_EXECUTION_MODE, &[main, 17, x, y, z]);
        }
        if let Some(size) = self.local_size_id {
            let ids: Vec<u32> = size.iter().map(|&v| constant(&mut s, uint, v)).collect();
            emit(&mut s.modes, OP_EXECUTION_MODE_ID, &[main, 38, ids[0], ids[1], ids[2]]);
        }
        if let Some(size) = self.workgroup_builtin {
            let uvec3 = s.id();
            emit(&mut s.globals, OP_TYPE_VECTOR, &[uvec3, uint, 3]);
            let ids: Vec<u32> = size.iter().map(|&v| constant(&mut s, uint, v)).collect();
            let composite = s.id();
            emit(&mut s.globals, OP_CONSTANT_COMPOSITE, &[uvec3, composite, ids[0], ids[1], ids[2]]);
            emit(&mut s.annotations, OP_DECORATE, &[composite, DECORATION_BUILTIN, 25]);
        }
        if self.model == model::FRAGMENT {
            // OriginUpperLeft
            emit(&mut s.modes, OP_EXECUTION_MODE, &[main, 7]);
        }

        let mut entry = vec![self.model, main];
        entry.extend(string_words(&self.entry_name));
        entry.extend(&interface);
        emit(&mut s.entry, OP_ENTRY_POINT, &entry);

        let mut function = Vec::new();
        emit(&mut function, OP_FUNCTION, &[void, main, 0, fn_ty]);
        let label = s.id();
        emit(&mut function, OP_LABEL, &[label]);
        emit(&mut function, OP_RETURN, &[]);
        emit(&mut function, OP_FUNCTION_END, &[]);

        let mut words = vec![MAGIC, VERSION_1_3, 0, s.next_id, 0];
        // Shader
        emit(&mut words, OP_CAPABILITY, &[1]);
        // Logical GLSL450
        emit(&mut words, OP_MEMORY_MODEL, &[0, 1]);
        words.extend(&s.entry);
        words.extend(&s.modes);
        words.extend(&s.annotations);
        words.extend(&s.globals);
        words.extend(&function);
        words
    }

    pub fn build_bytes(&self) -> Vec<u8> {
        to_le_bytes(&self.build())
    }
}

fn image_type(s: &mut Sections, sampled_type: u32, dim: u32, sampled: u32, format: u32) -> u32 {
    let image = s.id();
    emit(&mut s.globals, OP_TYPE_IMAGE, &[image, sampled_type, dim, 0, 0, 0, sampled, format]);
    image
}

fn constant(s: &mut Sections, ty: u32, value: u32) -> u32 {
    let id = s.id();
    emit(&mut s.globals, OP_CONSTANT, &[ty, id, value]);
    id
}
