// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Host functions exposed to guests.
//!
//! Each submodule keeps its logic in plain functions over the descriptor
//! store and a [`GuestMemory`] view, and a `link` function that registers
//! thin wasmtime wrappers under one namespace. Every function treats its
//! arguments as untrusted and answers bad input with a sentinel.

pub mod aidoku;
pub mod dates;
pub mod env;
pub mod html;
pub mod json;
pub mod net;
pub mod value;

use wasmtime::{Caller, Extern, Linker};

use crate::net::NetModule;
use crate::observability::messages::store::DescriptorTableFull;
use crate::store::{Descriptor, DescriptorStore, GuestMemory, Value, MAX_DESCRIPTORS};

/// State of the chapter-list call in flight, used to stamp created chapters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub source_id: String,
    pub current_manga: Option<String>,
    pub chapter_counter: i32,
}

impl Session {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            ..Self::default()
        }
    }

    pub fn begin_chapter_list(&mut self, manga_id: impl Into<String>) {
        self.current_manga = Some(manga_id.into());
        self.chapter_counter = 0;
    }

    pub fn end_chapter_list(&mut self) {
        self.current_manga = None;
        self.chapter_counter = 0;
    }
}

/// Data owned by a guest instance's wasmtime store.
pub struct HostState {
    pub store: DescriptorStore,
    pub session: Session,
    pub net: NetModule,
}

impl HostState {
    pub fn new(source_id: impl Into<String>, net: NetModule) -> Self {
        Self {
            store: DescriptorStore::new(),
            session: Session::new(source_id),
            net,
        }
    }
}

/// Stores `value`, answering `-1` when the table is exhausted.
pub(crate) fn allocate(store: &mut DescriptorStore, value: Value) -> Descriptor {
    match store.allocate(value) {
        Some(descriptor) => descriptor,
        None => {
            tracing::warn!(
                "{}",
                DescriptorTableFull {
                    capacity: MAX_DESCRIPTORS,
                }
            );
            -1
        }
    }
}

/// Runs `f` with the caller's exported `memory` and the host state borrowed
/// side by side. Guests without a memory export see an empty memory.
pub(crate) fn with_memory<R>(
    caller: &mut Caller<'_, HostState>,
    f: impl FnOnce(&mut GuestMemory<'_>, &mut HostState) -> R,
) -> R {
    match caller.get_export("memory").and_then(Extern::into_memory) {
        Some(memory) => {
            let (data, state) = memory.data_and_store_mut(&mut *caller);
            f(&mut GuestMemory::new(data), state)
        }
        None => {
            let mut empty: [u8; 0] = [];
            f(&mut GuestMemory::new(&mut empty), caller.data_mut())
        }
    }
}

/// Registers every host namespace, including the legacy aliases.
pub fn link_imports(linker: &mut Linker<HostState>) -> wasmtime::Result<()> {
    for namespace in ["std", "value"] {
        value::link(linker, namespace)?;
    }
    json::link(linker, "json")?;
    html::link(linker, "html")?;
    net::link(linker, "net")?;
    for namespace in ["aidoku", "domain"] {
        aidoku::link(linker, namespace)?;
    }
    env::link(linker)?;
    Ok(())
}
