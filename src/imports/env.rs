// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Guest diagnostics: `env.print` and the AssemblyScript-style `env.abort`.

use tracing::{error, info};
use wasmtime::{Caller, Linker};

use crate::imports::{with_memory, HostState};
use crate::observability::messages::wasm::{GuestAbort, GuestPrint};
use crate::store::GuestMemory;

/// Reads a managed string whose byte length sits in the four bytes before
/// `pointer`, encoded as UTF-16LE.
pub fn read_managed_string(memory: &GuestMemory, pointer: i32) -> Option<String> {
    let header = memory.read_bytes(pointer.checked_sub(4)?, 4)?;
    let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    if length == 0 {
        return Some(String::new());
    }
    let bytes = memory.read_bytes(pointer, i32::try_from(length).ok()?)?;
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Some(String::from_utf16_lossy(&units))
}

pub fn print(source_id: &str, memory: &GuestMemory, offset: i32, length: i32) {
    let message = memory.read_string(offset, length).unwrap_or_default();
    info!("{}", GuestPrint { source_id, message: &message });
}

/// Logs the abort. Execution continues; the guest traps on its own afterwards.
pub fn abort(source_id: &str, memory: &GuestMemory, message: i32, file: i32, line: i32, column: i32) {
    let message = read_managed_string(memory, message).unwrap_or_default();
    let file = read_managed_string(memory, file).unwrap_or_default();
    error!(
        "{}",
        GuestAbort {
            source_id,
            message: &message,
            file: &file,
            line,
            column,
        }
    );
}

pub fn link(linker: &mut Linker<HostState>) -> wasmtime::Result<()> {
    linker.func_wrap(
        "env",
        "print",
        |mut caller: Caller<'_, HostState>, offset: i32, length: i32| {
            with_memory(&mut caller, |mem, state| {
                print(&state.session.source_id, mem, offset, length)
            })
        },
    )?;
    linker.func_wrap(
        "env",
        "abort",
        |mut caller: Caller<'_, HostState>, message: i32, file: i32, line: i32, column: i32| {
            with_memory(&mut caller, |mem, state| {
                abort(&state.session.source_id, mem, message, file, line, column)
            })
        },
    )?;
    Ok(())
}
