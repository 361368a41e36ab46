//!
//! src/sources.rs  Andrew Belles  Oct 18th, 2025
//!
//! One trait per upstream concern so the resolver can be driven by the
//! real clients in production and by stubs in tests. Conversions from
//! the wire payloads into domain types live next to each impl.
//!

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::dto;
use crate::fetch::{
    send_json, DeezerClient, ItunesClient, LastFmClient, MusicBrainzClient, OdesliClient
};
use crate::types::{CatalogAlbum, CatalogTrack, PlatformLinks};
use crate::ResolverError;

/// Search by text, then detail lookup by collection id
#[async_trait]
pub trait PrimaryCatalog: Send + Sync {
    async fn search_albums(&self, term: &str, limit: u32) ->
        Result<Vec<CatalogAlbum>, ResolverError>;

    /// Track entries only, in catalog order
    async fn album_tracks(&self, collection_id: u64) ->
        Result<Vec<CatalogTrack>, ResolverError>;
}

/// Maps one platform's item url to the equivalent urls elsewhere
#[async_trait]
pub trait LinkService: Send + Sync {
    async fn links(&self, source_url: &str) -> Result<PlatformLinks, ResolverError>;
}

/// Secondary catalog, only asked for the url of its best album hit
#[async_trait]
pub trait SecondaryCatalog: Send + Sync {
    async fn top_album_url(&self, query: &str) -> Result<Option<String>, ResolverError>;
}

/// Release-group metadata registry with url relationships
#[async_trait]
pub trait ReleaseRegistry: Send + Sync {
    async fn release_groups(&self, album: &str, artist: &str, limit: u32) ->
        Result<Vec<String>, ResolverError>;

    async fn release_group_urls(&self, group_id: &str) -> Result<Vec<String>, ResolverError>;

    /// Relation urls of every release in the group, flattened in order
    async fn release_urls(&self, group_id: &str) -> Result<Vec<String>, ResolverError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistInfo {
    pub name: String,
    pub listeners: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistAlbum {
    pub name: String,
    pub playcount: u64,
    pub url: String,
    pub image: Option<String>,
}

#[async_trait]
pub trait ArtistCatalog: Send + Sync {
    async fn search_artists(&self, query: &str, limit: u32) ->
        Result<Vec<String>, ResolverError>;

    /// None when the catalog does not know the artist
    async fn artist_info(&self, name: &str) -> Result<Option<ArtistInfo>, ResolverError>;

    async fn top_albums(&self, name: &str, limit: u32) ->
        Result<Vec<ArtistAlbum>, ResolverError>;
}

///
/// iTunes
///

fn to_catalog_album(item: dto::ItunesItem) -> Option<CatalogAlbum> {
    Some(CatalogAlbum {
        collection_id: item.collection_id?,
        name: item.collection_name?,
        artist_name: item.artist_name.unwrap_or_default(),
        artist_url: item.artist_view_url,
        view_url: item.collection_view_url?,
        artwork_url: item.artwork_url100,
        track_count: item.track_count.unwrap_or(0),
        release_date: item.release_date,
        genre: item.primary_genre_name,
        copyright: item.copyright,
    })
}

fn to_catalog_track(item: dto::ItunesItem) -> Option<CatalogTrack> {
    if item.wrapper_type.as_deref() != Some("track") {
        return None;
    }
    Some(CatalogTrack {
        name: item.track_name.unwrap_or_default(),
        duration_ms: item.track_time_millis.unwrap_or(0),
        track_number: item.track_number,
        view_url: item.track_view_url.filter(|u| !u.is_empty()),
    })
}

#[async_trait]
impl PrimaryCatalog for ItunesClient {
    async fn search_albums(&self, term: &str, limit: u32) ->
        Result<Vec<CatalogAlbum>, ResolverError> {
        let response: dto::ItunesResponse = send_json(
            "itunes", self.search_album(term, limit)?
        ).await?;
        debug!(term, hits = response.result_count, "itunes.search");
        Ok(response.results.into_iter().filter_map(to_catalog_album).collect())
    }

    async fn album_tracks(&self, collection_id: u64) ->
        Result<Vec<CatalogTrack>, ResolverError> {
        let response: dto::ItunesResponse = send_json(
            "itunes", self.lookup_collection(collection_id)?
        ).await?;
        Ok(response.results.into_iter().filter_map(to_catalog_track).collect())
    }
}

///
/// Odesli
///

fn to_platform_links(response: dto::OdesliResponse) -> PlatformLinks {
    let entity = response.entity_unique_id.as_ref()
        .and_then(|id| response.entities_by_unique_id.get(id));
    let title = entity.and_then(|e| e.title.clone());
    let artist_name = entity.and_then(|e| e.artist_name.clone());

    let links = response.links_by_platform.into_iter()
        .filter_map(|(platform, link)| link.url.map(|url| (platform, url)))
        .collect();

    PlatformLinks { links, title, artist_name }
}

#[async_trait]
impl LinkService for OdesliClient {
    async fn links(&self, source_url: &str) -> Result<PlatformLinks, ResolverError> {
        let response: dto::OdesliResponse = send_json(
            "odesli", OdesliClient::links(self, source_url)?
        ).await?;
        Ok(to_platform_links(response))
    }
}

///
/// Deezer
///

#[async_trait]
impl SecondaryCatalog for DeezerClient {
    async fn top_album_url(&self, query: &str) -> Result<Option<String>, ResolverError> {
        let response: dto::DeezerSearch = send_json(
            "deezer", self.search_album(query, 1)?
        ).await?;
        Ok(response.data.into_iter().next().and_then(|a| a.link))
    }
}

///
/// MusicBrainz
///

fn lucene_phrase(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait]
impl ReleaseRegistry for MusicBrainzClient {
    async fn release_groups(&self, album: &str, artist: &str, limit: u32) ->
        Result<Vec<String>, ResolverError> {
        let query = format!(
            "release:\"{}\" AND artist:\"{}\"",
            lucene_phrase(album), lucene_phrase(artist)
        );
        let response: dto::ReleaseGroupSearch = send_json(
            "musicbrainz", self.search_release_group(&query, limit)?
        ).await?;
        Ok(response.release_groups.into_iter().map(|g| g.id).collect())
    }

    async fn release_group_urls(&self, group_id: &str) -> Result<Vec<String>, ResolverError> {
        let response: dto::WithRelations = send_json(
            "musicbrainz", self.lookup_release_group(group_id)?
        ).await?;
        Ok(response.resources().map(str::to_string).collect())
    }

    async fn release_urls(&self, group_id: &str) -> Result<Vec<String>, ResolverError> {
        let response: dto::ReleaseBrowse = send_json(
            "musicbrainz", self.browse_releases(group_id)?
        ).await?;
        Ok(response.releases.iter()
            .flat_map(|r| r.resources())
            .map(str::to_string)
            .collect())
    }
}

///
/// Last.fm, read straight off the json since single results come back
/// as an object instead of a one element array
///

fn one_or_many(v: Option<&Value>) -> Vec<&Value> {
    match v {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new()
    }
}

/// Last.fm reports counts as strings, occasionally as numbers
fn as_count(v: Option<&Value>) -> u64 {
    match v {
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0
    }
}

fn parse_artist_names(search: &Value) -> Vec<String> {
    one_or_many(search.pointer("/results/artistmatches/artist"))
        .into_iter()
        .filter_map(|a| a.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn parse_artist_info(info: &Value, asked: &str) -> Option<ArtistInfo> {
    if info.get("error").is_some() {
        return None;
    }
    let artist = info.get("artist")?;
    let name = artist.get("name")
        .and_then(Value::as_str)
        .unwrap_or(asked)
        .to_string();
    let listeners = as_count(artist.pointer("/stats/listeners"));
    Some(ArtistInfo { name, listeners })
}

fn parse_top_albums(top: &Value) -> Vec<ArtistAlbum> {
    one_or_many(top.pointer("/topalbums/album"))
        .into_iter()
        .map(|a| {
            let image = a.get("image")
                .and_then(Value::as_array)
                .and_then(|images| images.iter().find(|img| {
                    img.get("size").and_then(Value::as_str) == Some("extralarge")
                }))
                .and_then(|img| img.get("#text"))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            ArtistAlbum {
                name: a.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                playcount: as_count(a.get("playcount")),
                url: a.get("url").and_then(Value::as_str).unwrap_or_default().to_string(),
                image,
            }
        })
        .collect()
}

#[async_trait]
impl ArtistCatalog for LastFmClient {
    async fn search_artists(&self, query: &str, limit: u32) ->
        Result<Vec<String>, ResolverError> {
        let search: Value = send_json("lastfm", self.artist_search(query, limit)?).await?;
        Ok(parse_artist_names(&search))
    }

    async fn artist_info(&self, name: &str) -> Result<Option<ArtistInfo>, ResolverError> {
        let info: Value = send_json("lastfm", LastFmClient::artist_info(self, name)?).await?;
        Ok(parse_artist_info(&info, name))
    }

    async fn top_albums(&self, name: &str, limit: u32) ->
        Result<Vec<ArtistAlbum>, ResolverError> {
        let top: Value = send_json("lastfm", self.artist_top_albums(name, limit)?).await?;
        Ok(parse_top_albums(&top))
    }
}
