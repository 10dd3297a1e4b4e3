// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod descriptor;
mod memory;
mod value;

pub use descriptor::{Descriptor, DescriptorStore, MAX_DESCRIPTORS};
pub use memory::GuestMemory;
pub use value::{AsPropertyMap, Value, ValueKind};
