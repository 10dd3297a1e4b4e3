// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Async handle to a guest running on its own thread.
//!
//! A wasmtime store is single-threaded and guest calls block on network
//! I/O, so each source gets a dedicated OS thread that owns its
//! [`SourceRuntime`]. Callers send boxed jobs over a channel and await the
//! reply; jobs run strictly one at a time in arrival order.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};
use wasmtime::Module;

use crate::backends::wasm::{create_engine, load_wasm_bytes, require_core_module, WasmError};
use crate::config::Config;
use crate::errors::{SourceError, SourceResult};
use crate::imports::HostState;
use crate::models::{Chapter, DeepLink, Filter, Listing, Manga, MangaPageResult, Page};
use crate::net::{NetBridge, NetModule, Request};
use crate::observability::messages::source::{ActorStopped, SourceLoadFailed, SourceLoaded};
use crate::source::manifest::{default_filters, SourceManifest, MODULE_FILE};
use crate::source::runtime::SourceRuntime;

type Job = Box<dyn FnOnce(&mut SourceRuntime) + Send>;

type Ready = SourceResult<(Vec<Filter>, Vec<Listing>)>;

/// A loaded source. Cheap to share behind an `Arc`; dropping the last handle
/// stops the guest thread once queued jobs finish.
pub struct Source {
    manifest: SourceManifest,
    filters: Vec<Filter>,
    listings: Vec<Listing>,
    jobs: mpsc::UnboundedSender<Job>,
}

impl Source {
    /// Loads a bundle directory containing `source.json` and `main.wasm`.
    ///
    /// Must be called from within a multi-threaded tokio runtime; network
    /// requests issued by the guest are driven on it.
    pub async fn load(bundle: impl AsRef<Path>, config: &Config) -> SourceResult<Self> {
        let bundle = bundle.as_ref();
        let result = Self::try_load(bundle, config).await;
        if let Err(e) = &result {
            let bundle = bundle.display().to_string();
            error!("{}", SourceLoadFailed { bundle: &bundle, error: e });
        }
        result
    }

    async fn try_load(bundle: &Path, config: &Config) -> SourceResult<Self> {
        let manifest = SourceManifest::load(bundle)?;
        let path = bundle.join(MODULE_FILE);
        let bytes = load_wasm_bytes(&path, config.wasm.max_module_size_bytes)?;
        let bridge = NetBridge::from_config(Handle::current(), &config.network)?;
        let net = NetModule::new(Arc::new(bridge), config.network.rate_limit.limiter());
        Self::start(manifest, bytes, net, config.wasm.fuel.budget()).await
    }

    /// Compiles `bytes` and starts the guest thread. Resolves once the guest
    /// has been instantiated and has reported its filters and listings.
    pub async fn start(
        manifest: SourceManifest,
        bytes: Vec<u8>,
        net: NetModule,
        fuel: u64,
    ) -> SourceResult<Self> {
        require_core_module(&bytes)?;
        let engine = create_engine()?;
        let module =
            Module::new(&engine, &bytes).map_err(|e| WasmError::ModuleError(e.to_string()))?;

        let source_id = manifest.id().to_string();
        let (jobs, mut inbox) = mpsc::unbounded_channel::<Job>();
        let (ready_tx, ready_rx) = oneshot::channel::<Ready>();

        let thread_id = source_id.clone();
        thread::Builder::new()
            .name(format!("source-{}", source_id))
            .spawn(move || {
                let host = HostState::new(thread_id.as_str(), net);
                let mut runtime = match SourceRuntime::instantiate(&engine, &module, host, fuel) {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.into()));
                        return;
                    }
                };

                runtime.initialize();
                let filters = runtime.initialize_filters();
                let listings = runtime.initialize_listings();
                if ready_tx.send(Ok((filters, listings))).is_err() {
                    return;
                }

                while let Some(job) = inbox.blocking_recv() {
                    job(&mut runtime);
                }
                info!("{}", ActorStopped { source_id: &thread_id });
            })
            .map_err(SourceError::Spawn)?;

        let (guest_filters, guest_listings) = ready_rx
            .await
            .map_err(|_| SourceError::ActorUnavailable(source_id.clone()))??;

        let mut filters = manifest.parsed_filters();
        filters.extend(guest_filters);
        let mut listings = manifest.listings();
        listings.extend(guest_listings);

        info!(
            "{}",
            SourceLoaded {
                source_id: &source_id,
                name: &manifest.info.name,
                version: manifest.info.version,
            }
        );

        Ok(Self {
            manifest,
            filters,
            listings,
            jobs,
        })
    }

    pub fn id(&self) -> &str {
        self.manifest.id()
    }

    pub fn manifest(&self) -> &SourceManifest {
        &self.manifest
    }

    /// Manifest filters followed by those the guest registered at startup.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn default_filters(&self) -> Vec<Filter> {
        default_filters(&self.filters)
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    async fn run<R>(&self, f: impl FnOnce(&mut SourceRuntime) -> R + Send + 'static) -> SourceResult<R>
    where
        R: Send + 'static,
    {
        let unavailable = || SourceError::ActorUnavailable(self.id().to_string());
        let (reply, result) = oneshot::channel();
        self.jobs
            .send(Box::new(move |runtime| {
                let _ = reply.send(f(runtime));
            }))
            .map_err(|_| unavailable())?;
        result.await.map_err(|_| unavailable())
    }

    pub async fn get_manga_list(&self, filters: Vec<Filter>, page: i32) -> SourceResult<MangaPageResult> {
        self.run(move |rt| rt.manga_list(&filters, page)).await
    }

    /// Free-text search, expressed as a title filter appended to `filters`.
    pub async fn search_manga(
        &self,
        query: &str,
        mut filters: Vec<Filter>,
        page: i32,
    ) -> SourceResult<MangaPageResult> {
        filters.push(Filter::title(query));
        self.get_manga_list(filters, page).await
    }

    pub async fn get_manga_listing(&self, listing: Listing, page: i32) -> SourceResult<MangaPageResult> {
        self.run(move |rt| rt.manga_listing(&listing, page)).await
    }

    pub async fn get_manga_details(&self, manga: Manga) -> SourceResult<Manga> {
        self.run(move |rt| rt.manga_details(&manga)).await?
    }

    pub async fn get_chapter_list(&self, manga: Manga) -> SourceResult<Vec<Chapter>> {
        self.run(move |rt| rt.chapter_list(&manga)).await
    }

    pub async fn get_page_list(&self, chapter: Chapter) -> SourceResult<Vec<Page>> {
        self.run(move |rt| rt.page_list(&chapter)).await
    }

    pub async fn handle_url(&self, url: String) -> SourceResult<DeepLink> {
        self.run(move |rt| rt.handle_url(&url)).await?
    }

    pub async fn get_image_request(&self, url: String) -> SourceResult<Request> {
        self.run(move |rt| rt.modify_image_request(&url)).await?
    }

    pub async fn handle_notification(&self, key: String) -> SourceResult<()> {
        self.run(move |rt| rt.handle_notification(&key)).await
    }
}
