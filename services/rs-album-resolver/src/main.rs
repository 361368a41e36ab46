//!
//! src/main.rs  Andrew Belles  Oct 18th, 2025
//!
//! Main source file: wires configuration, logging, upstream clients,
//! the album cache and the resolvers together, then hands off to the
//! console. Live testbenches against the real services live here.
//!
//!

mod config;
mod errors;
mod logging;

mod types;
mod normalize;
mod cache;

mod dto;
mod fetch;
mod sources;

mod strategy;
mod links;
mod tracks;
mod catalog;
mod resolver;
mod artist;
mod console;

use std::sync::Arc;

use crate::errors::ResolverError;

#[tokio::main]
async fn main() -> Result<(), ResolverError> {
    let cfgs = config::load_config()?;
    let _log_guard = logging::init_logging(&cfgs.logging)?;

    tracing::info!(
        service = "rs-album-resolver",
        version = %env!("CARGO_PKG_VERSION"),
        lastfm = cfgs.lastfm.api_key.is_some(),
        "starting"
    );

    let itunes      = Arc::new(fetch::ItunesClient::new(&cfgs.http, &cfgs.itunes)?);
    let odesli      = Arc::new(fetch::OdesliClient::new(&cfgs.http, &cfgs.odesli)?);
    let deezer      = Arc::new(fetch::DeezerClient::new(&cfgs.http, &cfgs.deezer)?);
    let musicbrainz = Arc::new(fetch::MusicBrainzClient::new(
        &cfgs.http,
        &cfgs.identity,
        &cfgs.musicbrainz
    )?);
    let lastfm      = Arc::new(fetch::LastFmClient::new(&cfgs.http, &cfgs.lastfm)?);

    let links = Arc::new(links::LinkResolver::new(
        odesli.clone(), deezer, musicbrainz, &cfgs.resolve, &cfgs.musicbrainz
    ));
    let lookup = catalog::CatalogLookup::new(
        itunes,
        links.clone(),
        tracks::TrackResolver::new(odesli, &cfgs.resolve)
    );

    let cache = Arc::new(cache::AlbumCache::from_config(&cfgs.cache));
    let albums = resolver::AlbumResolver::new(cache, lookup, links);
    let artists = artist::ArtistLookup::new(lastfm);

    console::Console::new(albums, artists, cfgs.resolve.request_timeout)
        .run(cfgs.cache.sweep_interval)
        .await?;

    tracing::info!("stopped");
    Ok(())
}
