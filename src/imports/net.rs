// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Request lifecycle: init, configure, send, read the response, close.

use wasmtime::{Caller, Linker};

use crate::dom::Document;
use crate::imports::json::decode;
use crate::imports::{allocate, with_memory, HostState};
use crate::net::{HttpMethod, Request, Response};
use crate::store::{Descriptor, DescriptorStore, GuestMemory, Value};

fn request_mut(store: &mut DescriptorStore, descriptor: Descriptor) -> Option<&mut Request> {
    match store.read_mut(descriptor)? {
        Value::Request(request) => Some(request),
        _ => None,
    }
}

fn response(store: &DescriptorStore, descriptor: Descriptor) -> Option<&Response> {
    match store.read(descriptor)? {
        Value::Request(request) => request.response.as_ref(),
        _ => None,
    }
}

pub fn init(store: &mut DescriptorStore, method: i32) -> Descriptor {
    allocate(store, Value::Request(Request::new(HttpMethod::from_raw(method))))
}

pub fn close(store: &mut DescriptorStore, descriptor: Descriptor) {
    if matches!(store.read(descriptor), Some(Value::Request(_))) {
        store.release(descriptor);
    }
}

pub fn set_url(store: &mut DescriptorStore, memory: &GuestMemory, descriptor: Descriptor, offset: i32, length: i32) {
    let Some(url) = memory.read_string(offset, length) else {
        return;
    };
    if let Some(request) = request_mut(store, descriptor) {
        request.url = Some(url);
    }
}

/// A non-positive value length removes the header.
#[allow(clippy::too_many_arguments)]
pub fn set_header(
    store: &mut DescriptorStore,
    memory: &GuestMemory,
    descriptor: Descriptor,
    key: i32,
    key_len: i32,
    value: i32,
    value_len: i32,
) {
    let Some(name) = memory.read_string(key, key_len) else {
        return;
    };
    let value = if value_len > 0 {
        match memory.read_string(value, value_len) {
            Some(value) => Some(value),
            None => return,
        }
    } else {
        None
    };
    if let Some(request) = request_mut(store, descriptor) {
        request
            .headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        request.headers.insert(name, value);
    }
}

pub fn set_body(store: &mut DescriptorStore, memory: &GuestMemory, descriptor: Descriptor, offset: i32, length: i32) {
    let Some(body) = memory.read_bytes(offset, length) else {
        return;
    };
    if let Some(request) = request_mut(store, descriptor) {
        request.body = Some(body);
    }
}

pub fn set_rate_limit(state: &mut HostState, limit: i32) {
    state.net.limiter_mut().set_limit(limit);
}

pub fn set_rate_limit_period(state: &mut HostState, seconds: i32) {
    state.net.limiter_mut().set_period_seconds(seconds);
}

/// Blocks until the transfer finishes, then stores the response on the request.
pub fn send(state: &mut HostState, descriptor: Descriptor) {
    let request = match state.store.read(descriptor) {
        Some(Value::Request(request)) => request.clone(),
        _ => return,
    };
    let Some(response) = state.net.send(&request) else {
        return;
    };
    if let Some(request) = request_mut(&mut state.store, descriptor) {
        request.response = Some(response);
    }
}

pub fn get_url(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let url = match store.read(descriptor) {
        Some(Value::Request(request)) => request.url.clone(),
        _ => None,
    };
    match url {
        Some(url) => allocate(store, Value::String(url)),
        None => -1,
    }
}

/// Bytes not yet handed out by `get_data`, or `-1` without a body.
pub fn get_data_size(store: &DescriptorStore, descriptor: Descriptor) -> i32 {
    response(store, descriptor)
        .and_then(Response::remaining)
        .and_then(|remaining| i32::try_from(remaining).ok())
        .unwrap_or(-1)
}

/// Copies the next `size` body bytes to `buffer` and advances the cursor.
pub fn get_data(store: &mut DescriptorStore, memory: &mut GuestMemory, descriptor: Descriptor, buffer: i32, size: i32) {
    let Ok(size) = usize::try_from(size) else {
        return;
    };
    let Some(response) = request_mut(store, descriptor).and_then(|r| r.response.as_mut()) else {
        return;
    };
    let cursor = response.read_cursor;
    if let Some(chunk) = response.take_chunk(size) {
        if !memory.write_bytes(&chunk, buffer) {
            response.read_cursor = cursor;
        }
    }
}

pub fn get_header(
    store: &mut DescriptorStore,
    memory: &GuestMemory,
    descriptor: Descriptor,
    key: i32,
    key_len: i32,
) -> Descriptor {
    let Some(name) = memory.read_string(key, key_len) else {
        return -1;
    };
    let value = response(store, descriptor)
        .and_then(|response| response.header(&name))
        .map(str::to_string);
    match value {
        Some(value) => allocate(store, Value::String(value)),
        None => -1,
    }
}

pub fn get_status_code(store: &DescriptorStore, descriptor: Descriptor) -> i32 {
    response(store, descriptor)
        .and_then(|response| response.status_code)
        .unwrap_or(-1)
}

pub fn json(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let value = response(store, descriptor)
        .and_then(|response| response.data.as_deref())
        .and_then(decode);
    match value {
        Some(value) => allocate(store, value),
        None => -1,
    }
}

/// Parses the body as a document whose base URI is the final response url.
pub fn html(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let parsed = match store.read(descriptor) {
        Some(Value::Request(request)) => request.response.as_ref().and_then(|response| {
            let body = std::str::from_utf8(response.data.as_deref()?).ok()?;
            let base = response.url.as_deref().or(request.url.as_deref());
            Some(Document::parse(body, base))
        }),
        _ => None,
    };
    match parsed {
        Some(node) => allocate(store, Value::Node(node)),
        None => -1,
    }
}

pub fn link(linker: &mut Linker<HostState>, namespace: &str) -> wasmtime::Result<()> {
    linker.func_wrap(namespace, "init", |mut caller: Caller<'_, HostState>, method: i32| {
        init(&mut caller.data_mut().store, method)
    })?;
    linker.func_wrap(namespace, "send", |mut caller: Caller<'_, HostState>, d: i32| {
        send(caller.data_mut(), d)
    })?;
    linker.func_wrap(namespace, "close", |mut caller: Caller<'_, HostState>, d: i32| {
        close(&mut caller.data_mut().store, d)
    })?;
    linker.func_wrap(
        namespace,
        "set_url",
        |mut caller: Caller<'_, HostState>, d: i32, offset: i32, length: i32| {
            with_memory(&mut caller, |mem, state| set_url(&mut state.store, mem, d, offset, length))
        },
    )?;
    linker.func_wrap(
        namespace,
        "set_header",
        |mut caller: Caller<'_, HostState>, d: i32, key: i32, key_len: i32, value: i32, value_len: i32| {
            with_memory(&mut caller, |mem, state| {
                set_header(&mut state.store, mem, d, key, key_len, value, value_len)
            })
        },
    )?;
    linker.func_wrap(
        namespace,
        "set_body",
        |mut caller: Caller<'_, HostState>, d: i32, offset: i32, length: i32| {
            with_memory(&mut caller, |mem, state| set_body(&mut state.store, mem, d, offset, length))
        },
    )?;
    linker.func_wrap(namespace, "set_rate_limit", |mut caller: Caller<'_, HostState>, limit: i32| {
        set_rate_limit(caller.data_mut(), limit)
    })?;
    linker.func_wrap(
        namespace,
        "set_rate_limit_period",
        |mut caller: Caller<'_, HostState>, seconds: i32| set_rate_limit_period(caller.data_mut(), seconds),
    )?;
    linker.func_wrap(namespace, "get_url", |mut caller: Caller<'_, HostState>, d: i32| {
        get_url(&mut caller.data_mut().store, d)
    })?;
    linker.func_wrap(namespace, "get_data_size", |caller: Caller<'_, HostState>, d: i32| {
        get_data_size(&caller.data().store, d)
    })?;
    linker.func_wrap(
        namespace,
        "get_data",
        |mut caller: Caller<'_, HostState>, d: i32, buffer: i32, size: i32| {
            with_memory(&mut caller, |mem, state| get_data(&mut state.store, mem, d, buffer, size))
        },
    )?;
    linker.func_wrap(
        namespace,
        "get_header",
        |mut caller: Caller<'_, HostState>, d: i32, key: i32, key_len: i32| {
            with_memory(&mut caller, |mem, state| get_header(&mut state.store, mem, d, key, key_len))
        },
    )?;
    linker.func_wrap(namespace, "get_status_code", |caller: Caller<'_, HostState>, d: i32| {
        get_status_code(&caller.data().store, d)
    })?;
    linker.func_wrap(namespace, "json", |mut caller: Caller<'_, HostState>, d: i32| {
        json(&mut caller.data_mut().store, d)
    })?;
    linker.func_wrap(namespace, "html", |mut caller: Caller<'_, HostState>, d: i32| {
        html(&mut caller.data_mut().store, d)
    })?;
    Ok(())
}
