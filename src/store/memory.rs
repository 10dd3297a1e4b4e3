// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounds-checked view over a guest's linear memory.
//!
//! Every offset and length arriving from a guest is untrusted. Ranges that are
//! negative, empty, or reach past the end of memory resolve to `None` rather
//! than being dereferenced. The view never grows memory or allocates on the
//! guest's behalf; destinations for [`GuestMemory::write_bytes`] must already
//! have been reserved by the guest's own allocator.

use std::ops::Range;

pub struct GuestMemory<'a> {
    data: &'a mut [u8],
}

impl<'a> GuestMemory<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn range(&self, offset: i32, length: i32) -> Option<Range<usize>> {
        if offset < 0 || length <= 0 {
            return None;
        }
        let start = offset as usize;
        let end = start.checked_add(length as usize)?;
        (end <= self.data.len()).then_some(start..end)
    }

    pub fn read_bytes(&self, offset: i32, length: i32) -> Option<Vec<u8>> {
        self.range(offset, length).map(|range| self.data[range].to_vec())
    }

    /// Decodes a UTF-8 range. Invalid UTF-8 is a failure, not a lossy decode.
    pub fn read_string(&self, offset: i32, length: i32) -> Option<String> {
        let range = self.range(offset, length)?;
        std::str::from_utf8(&self.data[range]).ok().map(str::to_owned)
    }

    /// Reads `count` little-endian `i32` values starting at `offset`.
    pub fn read_i32_array(&self, offset: i32, count: i32) -> Option<Vec<i32>> {
        let length = count.checked_mul(4)?;
        let range = self.range(offset, length)?;
        Some(
            self.data[range]
                .chunks_exact(4)
                .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect(),
        )
    }

    /// Copies `bytes` to `offset`. Writing nothing always succeeds.
    pub fn write_bytes(&mut self, bytes: &[u8], offset: i32) -> bool {
        if bytes.is_empty() {
            return offset >= 0;
        }
        let Ok(length) = i32::try_from(bytes.len()) else {
            return false;
        };
        match self.range(offset, length) {
            Some(range) => {
                self.data[range].copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }
}
