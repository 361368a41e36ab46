//!
//! src/artist.rs  Andrew Belles  Oct 18th, 2025
//!
//! Artist confirmation, artist top albums, and playlist urls. None of
//! these are cached.
//!

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::normalize::{parse_artist_url, parse_playlist_url, search_url};
use crate::sources::{ArtistAlbum, ArtistCatalog};
use crate::types::{ArtistMatch, ResolvedArtist, TopAlbum};
use crate::ResolverError;

pub const DEFAULT_TOP_ALBUMS: u32 = 5;

/// Candidates asked for when confirming an artist name
const ARTIST_CANDIDATES: u32 = 3;

/// Extra top albums requested to survive filtering of junk entries
const TOP_ALBUM_SLACK: u32 = 5;

pub struct ArtistLookup {
    catalog: Arc<dyn ArtistCatalog>,
}

fn pick_match<'c>(query: &str, candidates: &'c [String]) -> Option<&'c String> {
    let wanted = query.to_lowercase();
    candidates.iter()
        .find(|c| c.to_lowercase() == wanted)
        .or_else(|| candidates.iter().find(|c| {
            let c = c.to_lowercase();
            c.contains(&wanted) || wanted.contains(&c)
        }))
}

fn is_listed(album: &ArtistAlbum) -> bool {
    let name = album.name.trim();
    !name.is_empty() && name != "(null)" && album.playcount > 0
}

fn rank_albums(albums: Vec<ArtistAlbum>, limit: u32) -> Vec<TopAlbum> {
    albums.into_iter()
        .filter(is_listed)
        .take(limit as usize)
        .zip(1..)
        .map(|(a, rank)| TopAlbum {
            rank,
            name: a.name,
            playcount: a.playcount,
            url: a.url,
            image: a.image,
        })
        .collect()
}

impl ArtistLookup {
    pub fn new(catalog: Arc<dyn ArtistCatalog>) -> Self {
        Self { catalog }
    }

    /// Confirms `query` names an artist. Artist urls are taken as is;
    /// anything else needs a catalog match. Upstream failure means no match.
    pub async fn is_artist_query(&self, query: &str) -> Option<ArtistMatch> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Some(target_url) = parse_artist_url(query) {
            return Some(ArtistMatch { artist_name: query.to_string(), target_url });
        }

        let candidates = match self.catalog.search_artists(query, ARTIST_CANDIDATES).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(query, error = %e, "artist.search.failed");
                return None;
            }
        };

        let name = pick_match(query, &candidates)?;
        debug!(query, artist = %name, "artist.match");
        Some(ArtistMatch {
            artist_name: name.clone(),
            target_url: search_url(name, "artists"),
        })
    }

    /// Top `limit` albums for `name` with listener count; None when the
    /// catalog does not know the artist
    pub async fn get_artist_top_albums(
        &self,
        name: &str,
        source_url: &str,
        limit: u32
    ) -> Result<Option<ResolvedArtist>, ResolverError> {
        let Some(info) = self.catalog.artist_info(name).await? else {
            info!(artist = name, "artist.not_found");
            return Ok(None);
        };

        let albums = self.catalog
            .top_albums(&info.name, limit + TOP_ALBUM_SLACK)
            .await?;
        let albums = rank_albums(albums, limit);
        info!(artist = %info.name, albums = albums.len(), "artist.resolved");

        Ok(Some(ResolvedArtist {
            name: info.name,
            url: source_url.to_string(),
            listeners: info.listeners,
            albums,
        }))
    }
}

/// Canonical playlist url when `query` carries one, else a playlist search
pub fn find_spotify_playlist_url(query: &str) -> String {
    let query = query.trim();
    parse_playlist_url(query).unwrap_or_else(|| search_url(query, "playlists"))
}
