// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for descriptor table events.

use std::fmt::{Display, Formatter};

/// All descriptors of a session were invalidated at once.
///
/// # Log Level
/// `debug!` - Happens after every entry point call
///
/// # Example
/// ```
/// use sourcebridge::observability::messages::store::SessionReset;
///
/// let msg = SessionReset {
///     source_id: "en.example",
///     released: 42,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct SessionReset<'a> {
    pub source_id: &'a str,
    pub released: usize,
}

impl Display for SessionReset<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Session reset for '{}', released {} descriptors",
            self.source_id, self.released
        )
    }
}

/// Descriptor table has no free slots; the guest receives `-1`.
///
/// # Log Level
/// `warn!` - Guest is leaking handles or building huge results
pub struct DescriptorTableFull {
    pub capacity: usize,
}

impl Display for DescriptorTableFull {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Descriptor table full ({} live descriptors)", self.capacity)
    }
}
