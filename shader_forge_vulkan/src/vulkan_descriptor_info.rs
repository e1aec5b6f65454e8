/// Descriptor update payloads written through a program's update template

use ash::vk;
use shader_forge::forge::program::PayloadClass;

/// One resource binding for a batched descriptor update
///
/// Built fresh per draw or dispatch and consumed immediately; a program never keeps it.
/// Supply one per used binding, ordered by ascending slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorInfo {
    /// Sampler and/or image view, for sampled, storage and combined image slots
    Image {
        sampler: vk::Sampler,
        image_view: vk::ImageView,
        image_layout: vk::ImageLayout,
    },
    /// Buffer range, for uniform and storage buffer slots
    Buffer {
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        range: vk::DeviceSize,
    },
}

impl DescriptorInfo {
    pub fn image(sampler: vk::Sampler, image_view: vk::ImageView, image_layout: vk::ImageLayout) -> Self {
        Self::Image { sampler, image_view, image_layout }
    }

    pub fn buffer(buffer: vk::Buffer, offset: vk::DeviceSize, range: vk::DeviceSize) -> Self {
        Self::Buffer { buffer, offset, range }
    }

    /// Whole buffer from offset 0
    pub fn whole_buffer(buffer: vk::Buffer) -> Self {
        Self::buffer(buffer, 0, vk::WHOLE_SIZE)
    }

    /// Payload class this variant carries
    pub fn payload_class(&self) -> PayloadClass {
        match self {
            Self::Image { .. } => PayloadClass::Image,
            Self::Buffer { .. } => PayloadClass::Buffer,
        }
    }

    pub(crate) fn to_payload(self) -> DescriptorPayload {
        match self {
            Self::Image { sampler, image_view, image_layout } => DescriptorPayload {
                image: vk::DescriptorImageInfo {
                    sampler,
                    image_view,
                    image_layout,
                },
            },
            Self::Buffer { buffer, offset, range } => DescriptorPayload {
                buffer: vk::DescriptorBufferInfo { buffer, offset, range },
            },
        }
    }
}

/// Raw storage of one template entry
///
/// Every entry occupies `DESCRIPTOR_PAYLOAD_STRIDE` bytes; the template tells the
/// driver which member to read for each slot.
#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) union DescriptorPayload {
    pub image: vk::DescriptorImageInfo,
    pub buffer: vk::DescriptorBufferInfo,
}

pub(crate) const DESCRIPTOR_PAYLOAD_STRIDE: usize = std::mem::size_of::<DescriptorPayload>();

/// Pack `infos` into a contiguous array laid out for the update template
pub(crate) fn pack_descriptors(infos: &[DescriptorInfo]) -> Vec<DescriptorPayload> {
    infos.iter().map(|info| info.to_payload()).collect()
}

#[cfg(test)]
#[path = "vulkan_descriptor_info_tests.rs"]
mod tests;
