// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use wasmtime::{Caller, Linker};

use crate::imports::{allocate, with_memory, HostState};
use crate::store::{Descriptor, DescriptorStore, GuestMemory, Value};

/// Decodes JSON bytes into a value. Only object and array roots are accepted.
pub fn decode(bytes: &[u8]) -> Option<Value> {
    match serde_json::from_slice::<serde_json::Value>(bytes).ok()? {
        root @ (serde_json::Value::Object(_) | serde_json::Value::Array(_)) => Some(Value::from(root)),
        _ => None,
    }
}

pub fn parse(store: &mut DescriptorStore, memory: &GuestMemory, offset: i32, length: i32) -> Descriptor {
    match memory.read_bytes(offset, length).as_deref().and_then(decode) {
        Some(value) => allocate(store, value),
        None => -1,
    }
}

pub fn link(linker: &mut Linker<HostState>, namespace: &str) -> wasmtime::Result<()> {
    linker.func_wrap(
        namespace,
        "parse",
        |mut caller: Caller<'_, HostState>, offset: i32, length: i32| {
            with_memory(&mut caller, |mem, state| parse(&mut state.store, mem, offset, length))
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::testing::TestMemory;
    use crate::imports::value::{array_len, object_get, read_int};

    #[test]
    fn test_scalar_roots_rejected() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();

        let inputs: [&[u8]; 5] = [b"\"5\"", b"5", b"true", b"null", b"{broken"];
        for input in inputs {
            let (offset, length) = tm.put(input);
            assert_eq!(parse(&mut store, &tm.view(), offset, length), -1);
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_object_root_then_field() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let (offset, length) = tm.put(br#"{"a":1}"#);
        let (key, key_len) = tm.put(b"a");

        let object = parse(&mut store, &tm.view(), offset, length);
        let field = object_get(&mut store, &tm.view(), object, key, key_len);

        assert_eq!(read_int(&store, field), 1);
    }

    #[test]
    fn test_array_root_length() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let (offset, length) = tm.put(b"[1,2,3]");

        let array = parse(&mut store, &tm.view(), offset, length);

        assert_eq!(array_len(&store, array), 3);
    }

    #[test]
    fn test_large_numbers_become_floats() {
        assert_eq!(
            decode(b"[18446744073709551615, 2.5]"),
            Some(Value::Array(vec![
                Value::Float(18446744073709551615.0),
                Value::Float(2.5)
            ]))
        );
    }
}
