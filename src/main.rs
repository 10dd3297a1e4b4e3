// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::time::Instant;

use anyhow::{bail, Context};
use serde::Serialize;
use sourcebridge::config::load_and_validate_config;
use sourcebridge::models::{Chapter, Listing, Manga};
use sourcebridge::source::Source;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: sourcebridge <config.yaml> <bundle-dir> <command> [args]

Commands:
  info                          Source manifest
  filters                       Manifest and guest filters
  listings                      Available listings
  search <query> [page]         Free-text search
  listing <name> [page]         Manga in a listing
  details <manga-id>            Manga details
  chapters <manga-id>           Chapter list
  pages <manga-id> <chapter-id> Page list
  url <url>                     Resolve a deep link
  image <url>                   Image request with guest headers";

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn page_arg(args: &[String], index: usize) -> anyhow::Result<i32> {
    match args.get(index) {
        Some(raw) => raw.parse().with_context(|| format!("invalid page number '{}'", raw)),
        None => Ok(1),
    }
}

fn required<'a>(args: &'a [String], index: usize, name: &str) -> anyhow::Result<&'a str> {
    match args.get(index) {
        Some(value) => Ok(value),
        None => bail!("missing <{}>\n\n{}", name, USAGE),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 3 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let config = load_and_validate_config(&args[0])
        .with_context(|| format!("loading config {}", args[0]))?;
    let started = Instant::now();
    let source = Source::load(&args[1], &config)
        .await
        .with_context(|| format!("loading source bundle {}", args[1]))?;
    tracing::debug!("source ready in {:?}", started.elapsed());

    let rest = &args[3..];
    match args[2].as_str() {
        "info" => print_json(source.manifest())?,
        "filters" => print_json(&source.filters())?,
        "listings" => print_json(&source.listings())?,
        "search" => {
            let query = required(rest, 0, "query")?;
            let result = source
                .search_manga(query, source.default_filters(), page_arg(rest, 1)?)
                .await?;
            print_json(&result)?;
        }
        "listing" => {
            let name = required(rest, 0, "name")?;
            let listing = source
                .listings()
                .iter()
                .find(|l| l.name == name)
                .cloned()
                .unwrap_or_else(|| Listing::new(name));
            print_json(&source.get_manga_listing(listing, page_arg(rest, 1)?).await?)?;
        }
        "details" => {
            let id = required(rest, 0, "manga-id")?;
            let manga = Manga::new(source.id(), id);
            print_json(&source.get_manga_details(manga).await?)?;
        }
        "chapters" => {
            let id = required(rest, 0, "manga-id")?;
            let manga = Manga::new(source.id(), id);
            print_json(&source.get_chapter_list(manga).await?)?;
        }
        "pages" => {
            let manga_id = required(rest, 0, "manga-id")?;
            let chapter_id = required(rest, 1, "chapter-id")?;
            let chapter = Chapter {
                manga_id: Some(manga_id.to_string()),
                ..Chapter::new(source.id(), chapter_id)
            };
            print_json(&source.get_page_list(chapter).await?)?;
        }
        "url" => {
            let url = required(rest, 0, "url")?;
            print_json(&source.handle_url(url.to_string()).await?)?;
        }
        "image" => {
            let url = required(rest, 0, "url")?;
            let request = source.get_image_request(url.to_string()).await?;
            print_json(&serde_json::json!({
                "url": request.url,
                "method": request.method.as_str(),
                "headers": request.headers,
            }))?;
        }
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }

    Ok(())
}
