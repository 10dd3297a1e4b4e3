// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Generic value construction, coercing reads, and container mutation.
//!
//! Containers have value semantics: a mutation reads the container out of the
//! store, edits the copy and writes it back under the same descriptor. Values
//! placed into a container are copied, so later edits through the source
//! descriptor do not show up inside it.

use std::collections::HashMap;

use wasmtime::{Caller, Linker};

use crate::imports::dates::{from_epoch_seconds, parse_date, to_epoch_seconds};
use crate::imports::{allocate, with_memory, HostState};
use crate::store::{Descriptor, DescriptorStore, GuestMemory, Value};

pub fn create_null(store: &mut DescriptorStore) -> Descriptor {
    allocate(store, Value::Null)
}

pub fn create_int(store: &mut DescriptorStore, value: i64) -> Descriptor {
    allocate(store, Value::Int(value))
}

pub fn create_float(store: &mut DescriptorStore, value: f64) -> Descriptor {
    allocate(store, Value::Float(value))
}

/// A zero length produces the empty string.
pub fn create_string(
    store: &mut DescriptorStore,
    memory: &GuestMemory,
    offset: i32,
    length: i32,
) -> Descriptor {
    if length == 0 && offset >= 0 {
        return allocate(store, Value::from(""));
    }
    match memory.read_string(offset, length) {
        Some(s) => allocate(store, Value::String(s)),
        None => -1,
    }
}

pub fn create_bool(store: &mut DescriptorStore, value: i32) -> Descriptor {
    allocate(store, Value::Bool(value != 0))
}

pub fn create_array(store: &mut DescriptorStore) -> Descriptor {
    allocate(store, Value::Array(Vec::new()))
}

pub fn create_object(store: &mut DescriptorStore) -> Descriptor {
    allocate(store, Value::Object(HashMap::new()))
}

pub fn create_date(store: &mut DescriptorStore, seconds: f64) -> Descriptor {
    allocate(store, Value::Date(from_epoch_seconds(seconds)))
}

/// Negative descriptors read as null; stale ones as `-1`.
pub fn type_of(store: &DescriptorStore, descriptor: Descriptor) -> i32 {
    if descriptor < 0 {
        return 0;
    }
    store
        .read(descriptor)
        .map_or(-1, |value| value.kind() as i32)
}

pub fn string_len(store: &DescriptorStore, descriptor: Descriptor) -> i32 {
    match store.read(descriptor) {
        Some(Value::String(s)) => i32::try_from(s.len()).unwrap_or(-1),
        _ => -1,
    }
}

/// Copies the first `size` bytes of a string value into guest memory.
/// Asking for more bytes than the string holds writes nothing.
pub fn read_string(
    store: &DescriptorStore,
    memory: &mut GuestMemory,
    descriptor: Descriptor,
    buffer: i32,
    size: i32,
) {
    let Some(Value::String(s)) = store.read(descriptor) else {
        return;
    };
    let Ok(size) = usize::try_from(size) else {
        return;
    };
    if size <= s.len() {
        memory.write_bytes(&s.as_bytes()[..size], buffer);
    }
}

pub fn read_int(store: &DescriptorStore, descriptor: Descriptor) -> i64 {
    match store.read(descriptor) {
        Some(Value::Int(i)) => *i,
        Some(Value::Float(f)) => *f as i64,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(-1),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => -1,
    }
}

pub fn read_float(store: &DescriptorStore, descriptor: Descriptor) -> f64 {
    match store.read(descriptor) {
        Some(Value::Float(f)) => *f,
        Some(Value::Int(i)) => *i as f64,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(-1.0),
        _ => -1.0,
    }
}

pub fn read_bool(store: &DescriptorStore, descriptor: Descriptor) -> i32 {
    match store.read(descriptor) {
        Some(Value::Bool(b)) => i32::from(*b),
        Some(Value::Int(i)) => i32::from(*i != 0),
        _ => 0,
    }
}

pub fn read_date(store: &DescriptorStore, descriptor: Descriptor) -> f64 {
    match store.read(descriptor) {
        Some(Value::Date(date)) => to_epoch_seconds(date),
        _ => -1.0,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn read_date_string(
    store: &DescriptorStore,
    memory: &GuestMemory,
    descriptor: Descriptor,
    format: i32,
    format_len: i32,
    _locale: i32,
    _locale_len: i32,
    timezone: i32,
    timezone_len: i32,
) -> f64 {
    let Some(Value::String(text)) = store.read(descriptor) else {
        return -1.0;
    };
    let Some(pattern) = memory.read_string(format, format_len) else {
        return -1.0;
    };
    let zone = if timezone_len > 0 {
        match memory.read_string(timezone, timezone_len) {
            Some(zone) => Some(zone),
            None => return -1.0,
        }
    } else {
        None
    };

    parse_date(text, &pattern, zone.as_deref())
        .map_or(-1.0, |date| to_epoch_seconds(&date))
}

pub fn object_len(store: &DescriptorStore, descriptor: Descriptor) -> i32 {
    match store.read(descriptor) {
        Some(Value::Object(map)) => map.len() as i32,
        _ => 0,
    }
}

/// Plain maps answer from their entries, typed entities from their fields.
pub fn object_get(
    store: &mut DescriptorStore,
    memory: &GuestMemory,
    descriptor: Descriptor,
    key: i32,
    key_len: i32,
) -> Descriptor {
    let Some(key) = memory.read_string(key, key_len) else {
        return -1;
    };
    match store.read(descriptor).and_then(|value| value.property(&key)) {
        Some(found) => allocate(store, found),
        None => -1,
    }
}

pub fn object_set(
    store: &mut DescriptorStore,
    memory: &GuestMemory,
    descriptor: Descriptor,
    key: i32,
    key_len: i32,
    value: Descriptor,
) {
    let Some(key) = memory.read_string(key, key_len) else {
        return;
    };
    let Some(item) = store.read(value).cloned() else {
        return;
    };
    if let Some(Value::Object(mut map)) = store.read(descriptor).cloned() {
        map.insert(key, item);
        store.write(descriptor, Value::Object(map));
    }
}

pub fn object_remove(
    store: &mut DescriptorStore,
    memory: &GuestMemory,
    descriptor: Descriptor,
    key: i32,
    key_len: i32,
) {
    let Some(key) = memory.read_string(key, key_len) else {
        return;
    };
    if let Some(Value::Object(mut map)) = store.read(descriptor).cloned() {
        map.remove(&key);
        store.write(descriptor, Value::Object(map));
    }
}

pub fn object_keys(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let keys = match store.read(descriptor) {
        Some(Value::Object(map)) => map.keys().map(|k| Value::from(k.as_str())).collect(),
        _ => return -1,
    };
    allocate(store, Value::Array(keys))
}

pub fn object_values(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let values = match store.read(descriptor) {
        Some(Value::Object(map)) => map.values().cloned().collect(),
        _ => return -1,
    };
    allocate(store, Value::Array(values))
}

pub fn array_len(store: &DescriptorStore, descriptor: Descriptor) -> i32 {
    match store.read(descriptor) {
        Some(Value::Array(items)) => items.len() as i32,
        _ => 0,
    }
}

pub fn array_get(store: &mut DescriptorStore, descriptor: Descriptor, index: i32) -> Descriptor {
    let Ok(index) = usize::try_from(index) else {
        return -1;
    };
    let item = match store.read(descriptor) {
        Some(Value::Array(items)) => items.get(index).cloned(),
        _ => None,
    };
    match item {
        Some(item) => allocate(store, item),
        None => -1,
    }
}

pub fn array_set(store: &mut DescriptorStore, descriptor: Descriptor, index: i32, value: Descriptor) {
    let Ok(index) = usize::try_from(index) else {
        return;
    };
    let Some(item) = store.read(value).cloned() else {
        return;
    };
    if let Some(Value::Array(mut items)) = store.read(descriptor).cloned() {
        if let Some(slot) = items.get_mut(index) {
            *slot = item;
            store.write(descriptor, Value::Array(items));
        }
    }
}

pub fn array_append(store: &mut DescriptorStore, descriptor: Descriptor, value: Descriptor) {
    let Some(item) = store.read(value).cloned() else {
        return;
    };
    if let Some(Value::Array(mut items)) = store.read(descriptor).cloned() {
        items.push(item);
        store.write(descriptor, Value::Array(items));
    }
}

pub fn array_remove(store: &mut DescriptorStore, descriptor: Descriptor, index: i32) {
    let Ok(index) = usize::try_from(index) else {
        return;
    };
    if let Some(Value::Array(mut items)) = store.read(descriptor).cloned() {
        if index < items.len() {
            items.remove(index);
            store.write(descriptor, Value::Array(items));
        }
    }
}

pub fn copy(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    match store.read(descriptor).cloned() {
        Some(value) => allocate(store, value),
        None => -1,
    }
}

pub fn destroy(store: &mut DescriptorStore, descriptor: Descriptor) {
    store.release(descriptor);
}

pub fn link(linker: &mut Linker<HostState>, namespace: &str) -> wasmtime::Result<()> {
    linker.func_wrap(namespace, "copy", |mut caller: Caller<'_, HostState>, d: i32| {
        copy(&mut caller.data_mut().store, d)
    })?;
    linker.func_wrap(namespace, "destroy", |mut caller: Caller<'_, HostState>, d: i32| {
        destroy(&mut caller.data_mut().store, d)
    })?;

    linker.func_wrap(namespace, "create_null", |mut caller: Caller<'_, HostState>| {
        create_null(&mut caller.data_mut().store)
    })?;
    linker.func_wrap(namespace, "create_int", |mut caller: Caller<'_, HostState>, v: i64| {
        create_int(&mut caller.data_mut().store, v)
    })?;
    linker.func_wrap(namespace, "create_float", |mut caller: Caller<'_, HostState>, v: f64| {
        create_float(&mut caller.data_mut().store, v)
    })?;
    linker.func_wrap(
        namespace,
        "create_string",
        |mut caller: Caller<'_, HostState>, offset: i32, length: i32| {
            with_memory(&mut caller, |mem, state| {
                create_string(&mut state.store, mem, offset, length)
            })
        },
    )?;
    linker.func_wrap(namespace, "create_bool", |mut caller: Caller<'_, HostState>, v: i32| {
        create_bool(&mut caller.data_mut().store, v)
    })?;
    linker.func_wrap(namespace, "create_array", |mut caller: Caller<'_, HostState>| {
        create_array(&mut caller.data_mut().store)
    })?;
    linker.func_wrap(namespace, "create_object", |mut caller: Caller<'_, HostState>| {
        create_object(&mut caller.data_mut().store)
    })?;
    linker.func_wrap(namespace, "create_date", |mut caller: Caller<'_, HostState>, t: f64| {
        create_date(&mut caller.data_mut().store, t)
    })?;

    linker.func_wrap(namespace, "typeof", |caller: Caller<'_, HostState>, d: i32| {
        type_of(&caller.data().store, d)
    })?;
    linker.func_wrap(namespace, "string_len", |caller: Caller<'_, HostState>, d: i32| {
        string_len(&caller.data().store, d)
    })?;
    linker.func_wrap(
        namespace,
        "read_string",
        |mut caller: Caller<'_, HostState>, d: i32, buffer: i32, size: i32| {
            with_memory(&mut caller, |mem, state| {
                read_string(&state.store, mem, d, buffer, size)
            })
        },
    )?;
    linker.func_wrap(namespace, "read_int", |caller: Caller<'_, HostState>, d: i32| {
        read_int(&caller.data().store, d)
    })?;
    linker.func_wrap(namespace, "read_float", |caller: Caller<'_, HostState>, d: i32| {
        read_float(&caller.data().store, d)
    })?;
    linker.func_wrap(namespace, "read_bool", |caller: Caller<'_, HostState>, d: i32| {
        read_bool(&caller.data().store, d)
    })?;
    linker.func_wrap(namespace, "read_date", |caller: Caller<'_, HostState>, d: i32| {
        read_date(&caller.data().store, d)
    })?;
    linker.func_wrap(
        namespace,
        "read_date_string",
        |mut caller: Caller<'_, HostState>,
         d: i32,
         format: i32,
         format_len: i32,
         locale: i32,
         locale_len: i32,
         timezone: i32,
         timezone_len: i32| {
            with_memory(&mut caller, |mem, state| {
                read_date_string(
                    &state.store,
                    mem,
                    d,
                    format,
                    format_len,
                    locale,
                    locale_len,
                    timezone,
                    timezone_len,
                )
            })
        },
    )?;

    linker.func_wrap(namespace, "object_len", |caller: Caller<'_, HostState>, d: i32| {
        object_len(&caller.data().store, d)
    })?;
    linker.func_wrap(
        namespace,
        "object_get",
        |mut caller: Caller<'_, HostState>, d: i32, key: i32, key_len: i32| {
            with_memory(&mut caller, |mem, state| {
                object_get(&mut state.store, mem, d, key, key_len)
            })
        },
    )?;
    linker.func_wrap(
        namespace,
        "object_set",
        |mut caller: Caller<'_, HostState>, d: i32, key: i32, key_len: i32, value: i32| {
            with_memory(&mut caller, |mem, state| {
                object_set(&mut state.store, mem, d, key, key_len, value)
            })
        },
    )?;
    linker.func_wrap(
        namespace,
        "object_remove",
        |mut caller: Caller<'_, HostState>, d: i32, key: i32, key_len: i32| {
            with_memory(&mut caller, |mem, state| {
                object_remove(&mut state.store, mem, d, key, key_len)
            })
        },
    )?;
    linker.func_wrap(namespace, "object_keys", |mut caller: Caller<'_, HostState>, d: i32| {
        object_keys(&mut caller.data_mut().store, d)
    })?;
    linker.func_wrap(namespace, "object_values", |mut caller: Caller<'_, HostState>, d: i32| {
        object_values(&mut caller.data_mut().store, d)
    })?;

    linker.func_wrap(namespace, "array_len", |caller: Caller<'_, HostState>, d: i32| {
        array_len(&caller.data().store, d)
    })?;
    linker.func_wrap(
        namespace,
        "array_get",
        |mut caller: Caller<'_, HostState>, d: i32, index: i32| {
            array_get(&mut caller.data_mut().store, d, index)
        },
    )?;
    linker.func_wrap(
        namespace,
        "array_set",
        |mut caller: Caller<'_, HostState>, d: i32, index: i32, value: i32| {
            array_set(&mut caller.data_mut().store, d, index, value)
        },
    )?;
    linker.func_wrap(
        namespace,
        "array_append",
        |mut caller: Caller<'_, HostState>, d: i32, value: i32| {
            array_append(&mut caller.data_mut().store, d, value)
        },
    )?;
    linker.func_wrap(
        namespace,
        "array_remove",
        |mut caller: Caller<'_, HostState>, d: i32, index: i32| {
            array_remove(&mut caller.data_mut().store, d, index)
        },
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::testing::{string, TestMemory};
    use crate::models::Manga;

    #[test]
    fn test_string_round_trip() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let (offset, length) = tm.put("héllo".as_bytes());

        let handle = create_string(&mut store, &tm.view(), offset, length);
        let size = string_len(&store, handle);
        let buffer = tm.put(&[0; 16]).0;
        read_string(&store, &mut tm.view(), handle, buffer, size);

        assert_eq!(type_of(&store, handle), 3);
        assert_eq!(size, 6);
        assert_eq!(tm.read(buffer, 6), "héllo".as_bytes());
    }

    #[test]
    fn test_empty_and_invalid_strings() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let (offset, _) = tm.put(&[0xff, 0xfe]);

        let empty = create_string(&mut store, &tm.view(), offset, 0);

        assert_eq!(store.read(empty), Some(&Value::from("")));
        assert_eq!(create_string(&mut store, &tm.view(), offset, 2), -1);
        assert_eq!(create_string(&mut store, &tm.view(), 4090, 100), -1);
        assert_eq!(create_string(&mut store, &tm.view(), -5, 3), -1);
    }

    #[test]
    fn test_read_string_too_large_writes_nothing() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let handle = string(&mut store, "abc");
        let buffer = tm.put(&[9; 8]).0;

        read_string(&store, &mut tm.view(), handle, buffer, 5);
        assert_eq!(tm.read(buffer, 3), &[9, 9, 9]);

        read_string(&store, &mut tm.view(), handle, buffer, 2);
        assert_eq!(tm.read(buffer, 3), b"ab\x09");
    }

    #[test]
    fn test_destroyed_handle_fails_every_read() {
        let mut store = DescriptorStore::new();
        let handle = create_int(&mut store, 7);

        destroy(&mut store, handle);

        assert_eq!(read_int(&store, handle), -1);
        assert_eq!(type_of(&store, handle), -1);
        assert_eq!(copy(&mut store, handle), -1);
        assert_eq!(type_of(&store, -3), 0);
    }

    #[test]
    fn test_lenient_coercions() {
        let mut store = DescriptorStore::new();
        let float = create_float(&mut store, 3.9);
        let numeric = string(&mut store, "42");
        let text = string(&mut store, "forty");
        let yes = create_bool(&mut store, 5);
        let zero = create_int(&mut store, 0);
        let two = create_int(&mut store, 2);
        let null = create_null(&mut store);

        assert_eq!(read_int(&store, float), 3);
        assert_eq!(read_int(&store, numeric), 42);
        assert_eq!(read_int(&store, text), -1);
        assert_eq!(read_int(&store, yes), 1);
        assert_eq!(read_float(&store, two), 2.0);
        assert_eq!(read_float(&store, numeric), 42.0);
        assert_eq!(read_float(&store, yes), -1.0);
        assert_eq!(read_bool(&store, two), 1);
        assert_eq!(read_bool(&store, zero), 0);
        assert_eq!(read_bool(&store, numeric), 0);
        assert_eq!(type_of(&store, null), 0);
    }

    #[test]
    fn test_dates() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let fixed = create_date(&mut store, 1_600_000_000.0);
        let now = create_date(&mut store, -1.0);
        let text = string(&mut store, "2023-04-05 10:30");
        let (fmt, fmt_len) = tm.put(b"yyyy-MM-dd HH:mm");
        let (tz, tz_len) = tm.put(b"UTC");

        assert_eq!(read_date(&store, fixed), 1_600_000_000.0);
        assert!(read_date(&store, now) > 1_600_000_000.0);
        assert_eq!(read_date(&store, text), -1.0);
        assert_eq!(
            read_date_string(&store, &tm.view(), text, fmt, fmt_len, 0, 0, tz, tz_len),
            1_680_690_600.0
        );
        assert_eq!(
            read_date_string(&store, &tm.view(), fixed, fmt, fmt_len, 0, 0, 0, 0),
            -1.0
        );
    }

    #[test]
    fn test_object_value_semantics() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let (key, key_len) = tm.put(b"count");
        let object = create_object(&mut store);
        let value = create_int(&mut store, 1);

        object_set(&mut store, &tm.view(), object, key, key_len, value);
        store.write(value, Value::Int(99));
        let fetched = object_get(&mut store, &tm.view(), object, key, key_len);

        assert_eq!(object_len(&store, object), 1);
        assert_eq!(read_int(&store, fetched), 1);

        let keys = object_keys(&mut store, object);
        assert_eq!(store.read(keys), Some(&Value::Array(vec![Value::from("count")])));

        object_remove(&mut store, &tm.view(), object, key, key_len);
        assert_eq!(object_len(&store, object), 0);
    }

    #[test]
    fn test_missing_key_and_index_fail() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let (key, key_len) = tm.put(b"nope");
        let object = create_object(&mut store);
        let array = create_array(&mut store);

        assert_eq!(object_get(&mut store, &tm.view(), object, key, key_len), -1);
        assert_eq!(array_get(&mut store, array, 0), -1);
        assert_eq!(array_get(&mut store, array, -1), -1);
        assert_eq!(object_len(&store, array), 0);
        assert_eq!(array_len(&store, object), 0);
    }

    #[test]
    fn test_object_get_reads_entity_fields() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let (key, key_len) = tm.put(b"id");
        let manga = store.allocate(Value::Manga(Manga::new("src", "m-7"))).unwrap();

        let id = object_get(&mut store, &tm.view(), manga, key, key_len);

        assert_eq!(store.read(id), Some(&Value::from("m-7")));
        assert_eq!(type_of(&store, manga), 6);
    }

    #[test]
    fn test_array_mutations() {
        let mut store = DescriptorStore::new();
        let array = create_array(&mut store);
        let a = create_int(&mut store, 1);
        let b = create_int(&mut store, 2);

        array_append(&mut store, array, a);
        array_append(&mut store, array, b);
        array_set(&mut store, array, 0, b);
        array_set(&mut store, array, 5, a);
        array_remove(&mut store, array, 1);
        array_remove(&mut store, array, 3);

        assert_eq!(array_len(&store, array), 1);
        let first = array_get(&mut store, array, 0);
        assert_eq!(read_int(&store, first), 2);
    }

    #[test]
    fn test_copy_is_independent() {
        let mut store = DescriptorStore::new();
        let array = create_array(&mut store);
        let copied = copy(&mut store, array);
        let item = create_null(&mut store);

        array_append(&mut store, array, item);

        assert_ne!(array, copied);
        assert_eq!(array_len(&store, array), 1);
        assert_eq!(array_len(&store, copied), 0);
    }
}
