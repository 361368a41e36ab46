//!
//! src/dto.rs  Andrew Belles  Oct 18th, 2025
//!
//! Payload shapes of the upstream apis. Only the fields the resolver
//! reads are declared; everything is converted to domain types in
//! sources.rs and should not leak further.
//!

use std::collections::HashMap;
use serde::Deserialize;

///
/// iTunes search / lookup
///

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItunesResponse {
    #[serde(default)]
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<ItunesItem>,
}

/// search results are collections, lookup results mix the collection
/// with its tracks; `wrapper_type` tells them apart
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItunesItem {
    pub wrapper_type: Option<String>,
    pub collection_id: Option<u64>,
    pub collection_name: Option<String>,
    pub collection_view_url: Option<String>,
    pub artist_name: Option<String>,
    pub artist_view_url: Option<String>,
    pub artwork_url100: Option<String>,
    pub track_count: Option<u32>,
    pub release_date: Option<String>,
    pub primary_genre_name: Option<String>,
    pub copyright: Option<String>,
    pub track_name: Option<String>,
    pub track_number: Option<u32>,
    pub track_time_millis: Option<u64>,
    pub track_view_url: Option<String>,
}

///
/// Odesli (song.link) /links
///

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OdesliResponse {
    pub entity_unique_id: Option<String>,
    #[serde(default)]
    pub entities_by_unique_id: HashMap<String, OdesliEntity>,
    #[serde(default)]
    pub links_by_platform: HashMap<String, OdesliPlatformLink>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OdesliEntity {
    pub title: Option<String>,
    pub artist_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OdesliPlatformLink {
    pub url: Option<String>,
}

///
/// Deezer /search/album
///

#[derive(Debug, Clone, Deserialize)]
pub struct DeezerSearch {
    #[serde(default)]
    pub data: Vec<DeezerAlbum>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeezerAlbum {
    pub link: Option<String>,
}

///
/// MusicBrainz release-group search, release-group lookup, release browse
///

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseGroupSearch {
    #[serde(rename = "release-groups", default)]
    pub release_groups: Vec<ReleaseGroupRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseGroupRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithRelations {
    #[serde(default)]
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Relation {
    pub url: Option<RelationUrl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationUrl {
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseBrowse {
    #[serde(default)]
    pub releases: Vec<WithRelations>,
}

impl WithRelations {
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.relations.iter()
            .filter_map(|r| r.url.as_ref())
            .filter_map(|u| u.resource.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odesli_payload_parses() {
        let raw = r#"{
            "entityUniqueId": "ITUNES_ALBUM::1441164426",
            "userCountry": "US",
            "entitiesByUniqueId": {
                "ITUNES_ALBUM::1441164426": {
                    "id": "1441164426", "type": "album",
                    "title": "Abbey Road (Remastered)", "artistName": "The Beatles"
                }
            },
            "linksByPlatform": {
                "spotify": {
                    "url": "https://open.spotify.com/album/0ETFjACtuP2ADo6LFhL6HN",
                    "entityUniqueId": "SPOTIFY_ALBUM::0ETFjACtuP2ADo6LFhL6HN"
                }
            }
        }"#;
        let parsed: OdesliResponse = serde_json::from_str(raw).unwrap();
        let spotify = parsed.links_by_platform.get("spotify").unwrap();
        assert_eq!(
            spotify.url.as_deref(),
            Some("https://open.spotify.com/album/0ETFjACtuP2ADo6LFhL6HN")
        );
        let entity = &parsed.entities_by_unique_id["ITUNES_ALBUM::1441164426"];
        assert_eq!(entity.artist_name.as_deref(), Some("The Beatles"));
    }

    #[test]
    fn musicbrainz_relations_parse() {
        let raw = r#"{
            "id": "9162580e-5df4-32de-80cc-f45a8d8a9b1d",
            "relations": [
                { "type": "discogs", "url": { "resource": "https://www.discogs.com/master/24047" } },
                { "type": "streaming", "url": { "resource": "https://open.spotify.com/album/0ETFjACtuP2ADo6LFhL6HN" } },
                { "type": "wikidata" }
            ]
        }"#;
        let parsed: WithRelations = serde_json::from_str(raw).unwrap();
        let urls: Vec<&str> = parsed.resources().collect();
        assert_eq!(urls.len(), 2);
        assert!(urls[1].contains("open.spotify.com/album"));
    }

    #[test]
    fn itunes_missing_fields_default() {
        let raw = r#"{ "resultCount": 1, "results": [ { "wrapperType": "collection", "collectionId": 1 } ] }"#;
        let parsed: ItunesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.result_count, 1);
        assert!(parsed.results[0].collection_name.is_none());

        let empty: ItunesResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(empty.results.is_empty());
    }
}
