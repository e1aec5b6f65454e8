/// Fixed-capacity table of binding slots and their descriptor kinds

use crate::error::{Error, Result};
use crate::program::DescriptorKind;

/// Number of binding slots a program supports.
///
/// Slots are tracked in a fixed array and summarized as 32-bit masks. Going past
/// 32 slots means widening both.
pub const MAX_BINDINGS: u32 = 32;

/// Descriptor kind declared at each slot 0..MAX_BINDINGS, `None` for unused slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindingTable {
    slots: [Option<DescriptorKind>; MAX_BINDINGS as usize],
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `kind` at `binding`
    ///
    /// Re-declaring a slot with the same kind is accepted (aliased variables).
    ///
    /// # Errors
    ///
    /// - `BindingOutOfRange` if `binding >= MAX_BINDINGS`
    /// - `BindingConflict` if the slot already holds a different kind
    pub fn insert(&mut self, binding: u32, kind: DescriptorKind) -> Result<()> {
        if binding >= MAX_BINDINGS {
            return Err(Error::BindingOutOfRange { binding });
        }
        let slot = &mut self.slots[binding as usize];
        match *slot {
            Some(existing) if existing != kind => Err(Error::BindingConflict {
                binding,
                first: existing,
                second: kind,
            }),
            _ => {
                *slot = Some(kind);
                Ok(())
            }
        }
    }

    /// Kind declared at `binding`, `None` if unused or out of range
    pub fn get(&self, binding: u32) -> Option<DescriptorKind> {
        self.slots.get(binding as usize).copied().flatten()
    }

    pub fn is_used(&self, binding: u32) -> bool {
        self.get(binding).is_some()
    }

    /// Used slots in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (u32, DescriptorKind)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(binding, kind)| kind.map(|k| (binding as u32, k)))
    }

    /// Number of used slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bit i set iff slot i is used
    pub fn used_mask(&self) -> u32 {
        self.iter().fold(0, |mask, (binding, _)| mask | (1 << binding))
    }

    /// Bit i set iff slot i is a storage buffer
    pub fn storage_buffer_mask(&self) -> u32 {
        self.iter()
            .filter(|(_, kind)| kind.is_storage_buffer())
            .fold(0, |mask, (binding, _)| mask | (1 << binding))
    }
}
