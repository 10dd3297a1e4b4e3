// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Generational arena mapping guest-visible descriptors to host values.
//!
//! A descriptor packs a slot index into the low 16 bits and a generation into
//! the next 15 bits, so every handle is a non-negative `i32`. A slot's
//! generation moves forward on every release and the whole table moves to a
//! fresh epoch on [`DescriptorStore::reset_all`], so a stale handle cannot
//! alias a newer value until the generation wraps. That takes 32767 releases
//! of one slot or 32767 session resets; a guest that keeps a handle across
//! that many sessions may see it resolve again.

use crate::store::Value;

/// Guest-visible handle. Negative values are never issued.
pub type Descriptor = i32;

const INDEX_BITS: u32 = 16;
const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: u32 = (1 << (31 - INDEX_BITS)) - 1;

/// Upper bound on simultaneously live descriptors.
pub const MAX_DESCRIPTORS: usize = 1 << INDEX_BITS;

#[derive(Debug)]
struct Slot {
    generation: u32,
    value: Option<Value>,
    owned: Vec<Descriptor>,
}

#[derive(Debug)]
pub struct DescriptorStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    epoch: u32,
    high_water: u32,
    live: usize,
}

impl Default for DescriptorStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Generation zero is skipped so that descriptor `0` is never handed out.
fn next_generation(generation: u32) -> u32 {
    match (generation + 1) & GENERATION_MASK {
        0 => 1,
        next => next,
    }
}

fn encode(index: u32, generation: u32) -> Descriptor {
    (((generation & GENERATION_MASK) << INDEX_BITS) | index) as Descriptor
}

fn decode(descriptor: Descriptor) -> Option<(usize, u32)> {
    if descriptor <= 0 {
        return None;
    }
    let raw = descriptor as u32;
    Some(((raw & INDEX_MASK) as usize, (raw >> INDEX_BITS) & GENERATION_MASK))
}

impl DescriptorStore {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            epoch: 1,
            high_water: 1,
            live: 0,
        }
    }

    /// Stores `value` and returns its descriptor, or `None` when the table is full.
    pub fn allocate(&mut self, value: Value) -> Option<Descriptor> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                if self.slots.len() >= MAX_DESCRIPTORS {
                    return None;
                }
                self.slots.push(Slot {
                    generation: self.epoch,
                    value: None,
                    owned: Vec::new(),
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        self.live += 1;
        Some(encode(index, slot.generation))
    }

    fn slot(&self, descriptor: Descriptor) -> Option<&Slot> {
        let (index, generation) = decode(descriptor)?;
        self.slots
            .get(index)
            .filter(|slot| slot.generation == generation && slot.value.is_some())
    }

    fn slot_mut(&mut self, descriptor: Descriptor) -> Option<&mut Slot> {
        let (index, generation) = decode(descriptor)?;
        self.slots
            .get_mut(index)
            .filter(|slot| slot.generation == generation && slot.value.is_some())
    }

    pub fn read(&self, descriptor: Descriptor) -> Option<&Value> {
        self.slot(descriptor).and_then(|slot| slot.value.as_ref())
    }

    pub fn read_mut(&mut self, descriptor: Descriptor) -> Option<&mut Value> {
        self.slot_mut(descriptor).and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, descriptor: Descriptor) -> bool {
        self.slot(descriptor).is_some()
    }

    /// Overwrites a live descriptor in place. Returns `false` for stale handles.
    pub fn write(&mut self, descriptor: Descriptor, value: Value) -> bool {
        match self.slot_mut(descriptor) {
            Some(slot) => {
                slot.value = Some(value);
                true
            }
            None => false,
        }
    }

    /// Ties `dependent`'s lifetime to `owner`: releasing the owner releases both.
    pub fn link(&mut self, owner: Descriptor, dependent: Descriptor) -> bool {
        if owner == dependent || !self.contains(dependent) {
            return false;
        }
        match self.slot_mut(owner) {
            Some(slot) => {
                slot.owned.push(dependent);
                true
            }
            None => false,
        }
    }

    /// Releases a descriptor and everything linked to it. Unknown handles are ignored.
    pub fn release(&mut self, descriptor: Descriptor) -> bool {
        let mut pending = vec![descriptor];
        let mut released_any = false;

        while let Some(current) = pending.pop() {
            let Some((index, _)) = decode(current) else {
                continue;
            };
            let Some(slot) = self.slot_mut(current) else {
                continue;
            };
            slot.value = None;
            slot.generation = next_generation(slot.generation);
            pending.append(&mut slot.owned);

            let generation = slot.generation;
            self.high_water = self.high_water.max(generation);
            self.free.push(index as u32);
            self.live -= 1;
            released_any = true;
        }

        released_any
    }

    /// Invalidates every descriptor at once and returns how many were live.
    pub fn reset_all(&mut self) -> usize {
        let released = self.live;
        self.slots.clear();
        self.free.clear();
        self.live = 0;
        self.epoch = next_generation(self.high_water.max(self.epoch));
        self.high_water = self.epoch;
        released
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
