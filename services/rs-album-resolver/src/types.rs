//!
//! src/types.rs  Andrew Belles  Oct 18th, 2025
//!
//! Domain types handed between catalog lookup, link resolution,
//! the cache, and whoever renders results
//!

use serde::{Deserialize, Serialize};

/// An album as returned by the primary catalog search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogAlbum {
    pub collection_id: u64,
    pub name: String,
    pub artist_name: String,
    pub artist_url: Option<String>,
    pub view_url: String,
    pub artwork_url: Option<String>,
    pub track_count: u32,
    pub release_date: Option<String>,
    pub genre: Option<String>,
    pub copyright: Option<String>,
}

/// A track entry from the primary catalog detail lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub name: String,
    pub duration_ms: u64,
    pub track_number: Option<u32>,
    pub view_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistLink {
    pub name: String,
    pub url: Option<String>,
}

/// `target_url` of None means no link could be resolved; rendering
/// should show the row without a link rather than fail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrack {
    pub name: String,
    pub duration_ms: u64,
    pub track_number: Option<u32>,
    pub target_url: Option<String>,
}

impl ResolvedTrack {
    pub fn unresolved(track: &CatalogTrack) -> Self {
        Self {
            name: track.name.clone(),
            duration_ms: track.duration_ms,
            track_number: track.track_number,
            target_url: None,
        }
    }

    pub fn resolved(track: &CatalogTrack, target_url: Option<String>) -> Self {
        Self { target_url, ..Self::unresolved(track) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAlbum {
    pub source: String,
    pub name: String,
    pub url: String,
    pub artists: Vec<ArtistLink>,
    pub release_date: String,
    pub total_tracks: u32,
    pub artwork: Option<String>,
    pub genres: Vec<String>,
    pub label: Option<String>,
    pub popularity: Option<u32>,
    pub copyright: Option<String>,
    pub tracks: Vec<ResolvedTrack>,
}

impl ResolvedAlbum {
    pub fn resolved_track_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.target_url.is_some()).count()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.tracks.iter().map(|t| t.duration_ms).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopAlbum {
    pub rank: u32,
    pub name: String,
    pub playcount: u64,
    pub url: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedArtist {
    pub name: String,
    pub url: String,
    pub listeners: u64,
    pub albums: Vec<TopAlbum>,
}

/// A confirmed artist name together with where to find it on the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistMatch {
    pub artist_name: String,
    pub target_url: String,
}

/// Equivalent urls for one item across platforms, plus whatever the
/// link service knows about the item it was asked about
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformLinks {
    pub links: std::collections::HashMap<String, String>,
    pub title: Option<String>,
    pub artist_name: Option<String>,
}

impl PlatformLinks {
    pub fn url_for(&self, platform: &str) -> Option<&str> {
        self.links.get(platform).map(String::as_str).filter(|u| !u.is_empty())
    }
}
