//! Headless Vulkan device for integration tests
//!
//! Picks the first physical device exposing VK_KHR_push_descriptor and a
//! graphics + compute queue, with dynamic rendering enabled. The validation layer
//! is enabled with the `vulkan-validation` feature.

#![allow(dead_code)]

use ash::vk;
use std::ffi::CStr;

pub struct TestDevice {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub queue_family: u32,
    pub push_descriptor: ash::khr::push_descriptor::Device,
    pub command_pool: vk::CommandPool,
}

impl TestDevice {
    pub fn new() -> Self {
        unsafe {
            let entry = ash::Entry::load().expect("Vulkan library not found");

            let app_info = vk::ApplicationInfo::default()
                .application_name(c"shader_forge tests")
                .engine_name(c"shader_forge")
                .api_version(vk::API_VERSION_1_3);
            let layer_names = if cfg!(feature = "vulkan-validation") {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };
            let instance_create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names);
            let instance = entry
                .create_instance(&instance_create_info, None)
                .expect("Failed to create instance");

            let (physical_device, queue_family) = instance
                .enumerate_physical_devices()
                .expect("Failed to enumerate physical devices")
                .into_iter()
                .filter(|&pd| supports_push_descriptor(&instance, pd))
                .find_map(|pd| {
                    instance
                        .get_physical_device_queue_family_properties(pd)
                        .iter()
                        .position(|qf| {
                            qf.queue_flags.contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)
                        })
                        .map(|i| (pd, i as u32))
                })
                .expect("No GPU with VK_KHR_push_descriptor and a graphics queue");

            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_family)
                .queue_priorities(&queue_priorities)];
            let extension_names = [ash::khr::push_descriptor::NAME.as_ptr()];
            let mut vulkan_13 = vk::PhysicalDeviceVulkan13Features::default().dynamic_rendering(true);
            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&extension_names)
                .push_next(&mut vulkan_13);
            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .expect("Failed to create device");

            let push_descriptor = ash::khr::push_descriptor::Device::new(&instance, &device);

            let command_pool = device
                .create_command_pool(
                    &vk::CommandPoolCreateInfo::default().queue_family_index(queue_family),
                    None,
                )
                .expect("Failed to create command pool");

            Self {
                entry,
                instance,
                physical_device,
                device,
                queue_family,
                push_descriptor,
                command_pool,
            }
        }
    }

    /// Primary command buffer in the recording state
    pub fn begin_commands(&self) -> vk::CommandBuffer {
        unsafe {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(self.command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let cmd = self.device.allocate_command_buffers(&allocate_info).unwrap()[0];
            self.device
                .begin_command_buffer(cmd, &vk::CommandBufferBeginInfo::default())
                .unwrap();
            cmd
        }
    }

    pub fn end_commands(&self, cmd: vk::CommandBuffer) {
        unsafe {
            self.device.end_command_buffer(cmd).unwrap();
            self.device.free_command_buffers(self.command_pool, &[cmd]);
        }
    }

    /// Storage buffer backed by host-visible memory
    pub fn create_storage_buffer(&self, size: vk::DeviceSize) -> TestBuffer {
        unsafe {
            let buffer = self
                .device
                .create_buffer(
                    &vk::BufferCreateInfo::default()
                        .size(size)
                        .usage(vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::UNIFORM_BUFFER),
                    None,
                )
                .unwrap();
            let requirements = self.device.get_buffer_memory_requirements(buffer);
            let memory_properties = self
                .instance
                .get_physical_device_memory_properties(self.physical_device);
            let memory_type = (0..memory_properties.memory_type_count)
                .find(|&i| {
                    requirements.memory_type_bits & (1 << i) != 0
                        && memory_properties.memory_types[i as usize]
                            .property_flags
                            .contains(vk::MemoryPropertyFlags::HOST_VISIBLE)
                })
                .expect("No host-visible memory type");
            let memory = self
                .device
                .allocate_memory(
                    &vk::MemoryAllocateInfo::default()
                        .allocation_size(requirements.size)
                        .memory_type_index(memory_type),
                    None,
                )
                .unwrap();
            self.device.bind_buffer_memory(buffer, memory, 0).unwrap();
            TestBuffer {
                buffer,
                memory,
                device: self.device.clone(),
            }
        }
    }
}

impl Drop for TestDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

pub struct TestBuffer {
    pub buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    device: ash::Device,
}

impl Drop for TestBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

fn supports_push_descriptor(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> bool {
    let extensions = unsafe {
        instance
            .enumerate_device_extension_properties(physical_device)
            .unwrap_or_default()
    };
    extensions.iter().any(|ext| {
        let name = unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) };
        name == ash::khr::push_descriptor::NAME
    })
}
