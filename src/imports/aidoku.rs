// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Constructors for the domain models a guest hands back to the host.

use wasmtime::{Caller, FuncType, Linker, Val, ValType};

use crate::imports::dates::from_epoch_seconds;
use crate::imports::{allocate, with_memory, HostState, Session};
use crate::models::{
    Chapter, ContentRating, DeepLink, Manga, MangaPageResult, Page, PublishingStatus, Viewer,
    DEFAULT_CHAPTER_LANG,
};
use crate::store::{Descriptor, DescriptorStore, GuestMemory, Value};

const CREATE_MANGA_ARITY: usize = 20;

/// A `(offset, length)` pair pointing at UTF-8 in guest memory.
type Span = (i32, i32);

fn optional(memory: &GuestMemory, (offset, length): Span) -> Option<String> {
    if length > 0 {
        memory.read_string(offset, length)
    } else {
        None
    }
}

/// Raw arguments of `create_manga`, in guest call order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MangaArgs {
    pub id: Span,
    pub cover: Span,
    pub title: Span,
    pub author: Span,
    pub artist: Span,
    pub description: Span,
    pub url: Span,
    /// Pointers to two parallel `i32` arrays of tag offsets and lengths.
    pub tags: Span,
    pub tag_count: i32,
    pub status: i32,
    pub nsfw: i32,
    pub viewer: i32,
}

impl MangaArgs {
    pub fn from_params(p: &[i32]) -> Option<Self> {
        if p.len() != CREATE_MANGA_ARITY {
            return None;
        }
        Some(Self {
            id: (p[0], p[1]),
            cover: (p[2], p[3]),
            title: (p[4], p[5]),
            author: (p[6], p[7]),
            artist: (p[8], p[9]),
            description: (p[10], p[11]),
            url: (p[12], p[13]),
            tags: (p[14], p[15]),
            tag_count: p[16],
            status: p[17],
            nsfw: p[18],
            viewer: p[19],
        })
    }
}

fn read_tags(memory: &GuestMemory, (offsets, lengths): Span, count: i32) -> Vec<String> {
    if count <= 0 {
        return Vec::new();
    }
    let offsets = memory.read_i32_array(offsets, count).unwrap_or_default();
    let lengths = memory.read_i32_array(lengths, count).unwrap_or_default();
    offsets
        .into_iter()
        .zip(lengths)
        .filter_map(|(offset, length)| memory.read_string(offset, length))
        .collect()
}

/// Builds a manga. The id is mandatory; tags that fail to decode are skipped.
pub fn create_manga(
    store: &mut DescriptorStore,
    session: &Session,
    memory: &GuestMemory,
    args: &MangaArgs,
) -> Descriptor {
    let Some(id) = optional(memory, args.id) else {
        return -1;
    };
    let manga = Manga {
        title: optional(memory, args.title),
        author: optional(memory, args.author),
        artist: optional(memory, args.artist),
        description: optional(memory, args.description),
        tags: read_tags(memory, args.tags, args.tag_count),
        cover: optional(memory, args.cover),
        url: optional(memory, args.url),
        status: PublishingStatus::from_raw(args.status),
        nsfw: ContentRating::from_raw(args.nsfw),
        viewer: Viewer::from_raw(args.viewer),
        ..Manga::new(session.source_id.as_str(), id)
    };
    allocate(store, Value::Manga(manga))
}

/// Wraps an array of manga. Any non-manga element rejects the whole array.
///
/// The array handle becomes owned by the result and is released with it.
pub fn create_manga_result(store: &mut DescriptorStore, array: Descriptor, has_more: i32) -> Descriptor {
    let manga = match store.read(array) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Manga(manga) => Some(manga.clone()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>(),
        _ => None,
    };
    let Some(manga) = manga else {
        return -1;
    };
    let result = allocate(
        store,
        Value::MangaPageResult(MangaPageResult {
            manga,
            has_next_page: has_more != 0,
        }),
    );
    if result >= 0 {
        store.link(result, array);
    }
    result
}

/// Raw arguments of `create_chapter`, in guest call order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChapterArgs {
    pub id: Span,
    pub title: Span,
    pub volume: f32,
    pub chapter: f32,
    pub date_uploaded: f64,
    pub scanlator: Span,
    pub url: Span,
    pub lang: Span,
}

/// Builds a chapter stamped with the running chapter list's manga and the
/// next source order.
pub fn create_chapter(
    store: &mut DescriptorStore,
    session: &mut Session,
    memory: &GuestMemory,
    args: &ChapterArgs,
) -> Descriptor {
    let Some(id) = memory.read_string(args.id.0, args.id.1) else {
        return -1;
    };
    let chapter = Chapter {
        manga_id: session.current_manga.clone(),
        title: optional(memory, args.title),
        scanlator: optional(memory, args.scanlator),
        url: optional(memory, args.url),
        lang: optional(memory, args.lang).unwrap_or_else(|| DEFAULT_CHAPTER_LANG.to_string()),
        chapter_num: (args.chapter >= 0.0).then_some(args.chapter),
        volume_num: (args.volume >= 0.0).then_some(args.volume),
        date_uploaded: (args.date_uploaded > 0.0).then(|| from_epoch_seconds(args.date_uploaded)),
        source_order: session.chapter_counter,
        ..Chapter::new(session.source_id.as_str(), id)
    };
    session.chapter_counter += 1;
    allocate(store, Value::Chapter(chapter))
}

pub fn create_page(
    store: &mut DescriptorStore,
    session: &Session,
    memory: &GuestMemory,
    index: i32,
    image_url: Span,
    base64: Span,
    text: Span,
) -> Descriptor {
    let page = Page {
        source_id: session.source_id.clone(),
        chapter_id: String::new(),
        index,
        image_url: optional(memory, image_url),
        base64: optional(memory, base64),
        text: optional(memory, text),
    };
    allocate(store, Value::Page(page))
}

/// Handles `<= 0` or of the wrong kind leave that side of the link empty.
pub fn create_deeplink(store: &mut DescriptorStore, manga: Descriptor, chapter: Descriptor) -> Descriptor {
    let manga = match (manga > 0).then(|| store.read(manga)).flatten() {
        Some(Value::Manga(manga)) => Some(manga.clone()),
        _ => None,
    };
    let chapter = match (chapter > 0).then(|| store.read(chapter)).flatten() {
        Some(Value::Chapter(chapter)) => Some(chapter.clone()),
        _ => None,
    };
    allocate(store, Value::DeepLink(DeepLink { manga, chapter }))
}

pub fn link(linker: &mut Linker<HostState>, namespace: &str) -> wasmtime::Result<()> {
    let manga_type = FuncType::new(
        linker.engine(),
        vec![ValType::I32; CREATE_MANGA_ARITY],
        vec![ValType::I32],
    );
    linker.func_new(
        namespace,
        "create_manga",
        manga_type,
        |mut caller: Caller<'_, HostState>, params: &[Val], results: &mut [Val]| {
            let raw: Vec<i32> = params.iter().map(|param| param.i32().unwrap_or(-1)).collect();
            let descriptor = match MangaArgs::from_params(&raw) {
                Some(args) => with_memory(&mut caller, |mem, state| {
                    create_manga(&mut state.store, &state.session, mem, &args)
                }),
                None => -1,
            };
            if let Some(slot) = results.first_mut() {
                *slot = Val::I32(descriptor);
            }
            Ok(())
        },
    )?;
    linker.func_wrap(
        namespace,
        "create_manga_result",
        |mut caller: Caller<'_, HostState>, array: i32, has_more: i32| {
            create_manga_result(&mut caller.data_mut().store, array, has_more)
        },
    )?;
    linker.func_wrap(
        namespace,
        "create_chapter",
        |mut caller: Caller<'_, HostState>,
         id: i32,
         id_len: i32,
         title: i32,
         title_len: i32,
         volume: f32,
         chapter: f32,
         date_uploaded: f64,
         scanlator: i32,
         scanlator_len: i32,
         url: i32,
         url_len: i32,
         lang: i32,
         lang_len: i32| {
            let args = ChapterArgs {
                id: (id, id_len),
                title: (title, title_len),
                volume,
                chapter,
                date_uploaded,
                scanlator: (scanlator, scanlator_len),
                url: (url, url_len),
                lang: (lang, lang_len),
            };
            with_memory(&mut caller, |mem, state| {
                create_chapter(&mut state.store, &mut state.session, mem, &args)
            })
        },
    )?;
    linker.func_wrap(
        namespace,
        "create_page",
        |mut caller: Caller<'_, HostState>,
         index: i32,
         image_url: i32,
         image_url_len: i32,
         base64: i32,
         base64_len: i32,
         text: i32,
         text_len: i32| {
            with_memory(&mut caller, |mem, state| {
                create_page(
                    &mut state.store,
                    &state.session,
                    mem,
                    index,
                    (image_url, image_url_len),
                    (base64, base64_len),
                    (text, text_len),
                )
            })
        },
    )?;
    linker.func_wrap(
        namespace,
        "create_deeplink",
        |mut caller: Caller<'_, HostState>, manga: i32, chapter: i32| {
            create_deeplink(&mut caller.data_mut().store, manga, chapter)
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::testing::TestMemory;
    use crate::imports::value::{array_append, create_array, create_int};

    fn manga_args(tm: &mut TestMemory, id: &str, tags: &[&str]) -> MangaArgs {
        let id = tm.put(id.as_bytes());
        let title = tm.put(b"Title");
        let spans: Vec<(i32, i32)> = tags.iter().map(|tag| tm.put(tag.as_bytes())).collect();
        let offsets: Vec<i32> = spans.iter().map(|span| span.0).collect();
        let lengths: Vec<i32> = spans.iter().map(|span| span.1).collect();
        MangaArgs {
            id,
            title,
            tags: (tm.put_i32s(&offsets), tm.put_i32s(&lengths)),
            tag_count: tags.len() as i32,
            status: 1,
            nsfw: 2,
            viewer: 4,
            ..MangaArgs::default()
        }
    }

    fn manga(store: &DescriptorStore, descriptor: Descriptor) -> Manga {
        match store.read(descriptor) {
            Some(Value::Manga(manga)) => manga.clone(),
            other => panic!("expected manga, got {:?}", other),
        }
    }

    #[test]
    fn test_create_manga_reads_every_field() {
        let mut store = DescriptorStore::new();
        let session = Session::new("en.example");
        let mut tm = TestMemory::new();
        let args = manga_args(&mut tm, "m-1", &["Action", "Drama"]);

        let descriptor = create_manga(&mut store, &session, &tm.view(), &args);
        let created = manga(&store, descriptor);

        assert_eq!(created.source_id, "en.example");
        assert_eq!(created.id, "m-1");
        assert_eq!(created.title.as_deref(), Some("Title"));
        assert_eq!(created.author, None);
        assert_eq!(created.tags, vec!["Action", "Drama"]);
        assert_eq!(created.status, PublishingStatus::from_raw(1));
        assert_eq!(created.nsfw, ContentRating::from_raw(2));
        assert_eq!(created.viewer, Viewer::from_raw(4));
    }

    #[test]
    fn test_create_manga_requires_id() {
        let mut store = DescriptorStore::new();
        let session = Session::new("en.example");
        let mut tm = TestMemory::new();
        let mut args = manga_args(&mut tm, "m-1", &[]);
        args.id.1 = 0;

        assert_eq!(create_manga(&mut store, &session, &tm.view(), &args), -1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_manga_args_arity() {
        assert!(MangaArgs::from_params(&[0; 19]).is_none());
        let args = MangaArgs::from_params(&(0..20).collect::<Vec<_>>()).unwrap();
        assert_eq!(args.tags, (14, 15));
        assert_eq!(args.viewer, 19);
    }

    #[test]
    fn test_manga_result_owns_array() {
        let mut store = DescriptorStore::new();
        let session = Session::new("en.example");
        let mut tm = TestMemory::new();
        let args = manga_args(&mut tm, "m-1", &[]);
        let array = create_array(&mut store);
        let entry = create_manga(&mut store, &session, &tm.view(), &args);
        array_append(&mut store, array, entry);

        let result = create_manga_result(&mut store, array, 1);
        match store.read(result) {
            Some(Value::MangaPageResult(page)) => {
                assert_eq!(page.manga.len(), 1);
                assert!(page.has_next_page);
            }
            other => panic!("expected result, got {:?}", other),
        }

        store.release(result);
        assert!(!store.contains(array));
    }

    #[test]
    fn test_manga_result_rejects_mixed_arrays() {
        let mut store = DescriptorStore::new();
        let array = create_array(&mut store);
        let number = create_int(&mut store, 3);
        array_append(&mut store, array, number);

        assert_eq!(create_manga_result(&mut store, array, 0), -1);
        assert_eq!(create_manga_result(&mut store, number, 0), -1);
    }

    #[test]
    fn test_create_chapter_stamps_session() {
        let mut store = DescriptorStore::new();
        let mut session = Session::new("en.example");
        session.begin_chapter_list("m-1");
        let mut tm = TestMemory::new();
        let first_id = tm.put(b"c-1");
        let second_id = tm.put(b"c-2");
        let lang = tm.put(b"fr");

        let first = ChapterArgs {
            id: first_id,
            volume: -1.0,
            chapter: 12.5,
            date_uploaded: 1_600_000_000.0,
            ..ChapterArgs::default()
        };
        let second = ChapterArgs {
            id: second_id,
            volume: 2.0,
            chapter: -1.0,
            lang,
            ..ChapterArgs::default()
        };
        let first = create_chapter(&mut store, &mut session, &tm.view(), &first);
        let second = create_chapter(&mut store, &mut session, &tm.view(), &second);

        let (Some(Value::Chapter(first)), Some(Value::Chapter(second))) = (store.read(first), store.read(second)) else {
            panic!("expected chapters");
        };
        assert_eq!(first.manga_id.as_deref(), Some("m-1"));
        assert_eq!(first.lang, "en");
        assert_eq!(first.chapter_num, Some(12.5));
        assert_eq!(first.volume_num, None);
        assert_eq!(first.date_uploaded.map(|d| d.timestamp()), Some(1_600_000_000));
        assert_eq!(first.source_order, 0);
        assert_eq!(second.lang, "fr");
        assert_eq!(second.volume_num, Some(2.0));
        assert_eq!(second.chapter_num, None);
        assert_eq!(second.date_uploaded, None);
        assert_eq!(second.source_order, 1);
    }

    #[test]
    fn test_create_page_and_deeplink() {
        let mut store = DescriptorStore::new();
        let session = Session::new("en.example");
        let mut tm = TestMemory::new();
        let image = tm.put(b"https://cdn.example/1.jpg");
        let args = manga_args(&mut tm, "m-1", &[]);

        let page = create_page(&mut store, &session, &tm.view(), 3, image, (0, 0), (0, 0));
        let entry = create_manga(&mut store, &session, &tm.view(), &args);
        let link = create_deeplink(&mut store, entry, page);

        match store.read(page) {
            Some(Value::Page(page)) => {
                assert_eq!(page.index, 3);
                assert_eq!(page.image_url.as_deref(), Some("https://cdn.example/1.jpg"));
                assert_eq!(page.text, None);
            }
            other => panic!("expected page, got {:?}", other),
        }
        match store.read(link) {
            Some(Value::DeepLink(link)) => {
                assert_eq!(link.manga.as_ref().map(|m| m.id.as_str()), Some("m-1"));
                assert_eq!(link.chapter, None);
            }
            other => panic!("expected deep link, got {:?}", other),
        }
    }
}
