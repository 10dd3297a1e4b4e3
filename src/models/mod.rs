// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fixed-schema entities produced by guests and returned to callers.
//!
//! Each entity implements [`AsPropertyMap`](crate::store::AsPropertyMap) so
//! guests can read its fields back by name through `object_get`.

mod chapter;
mod deeplink;
mod filter;
mod listing;
mod manga;
mod page;

pub use chapter::{Chapter, DEFAULT_CHAPTER_LANG};
pub use deeplink::DeepLink;
pub use filter::{Filter, SortSelection};
pub use listing::Listing;
pub use manga::{ContentRating, Manga, MangaPageResult, PublishingStatus, Viewer};
pub use page::Page;
