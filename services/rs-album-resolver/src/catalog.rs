//!
//! src/catalog.rs  Andrew Belles  Oct 18th, 2025
//!
//! Catalog lookup: primary catalog search and track list, then album
//! and track links, assembled into one ResolvedAlbum
//!

use std::sync::Arc;

use chrono::DateTime;
use tracing::{debug, info};

use crate::links::LinkResolver;
use crate::sources::PrimaryCatalog;
use crate::tracks::TrackResolver;
use crate::types::{ArtistLink, CatalogAlbum, CatalogTrack, ResolvedAlbum, ResolvedTrack};
use crate::ResolverError;

pub const SOURCE: &str = "itunes";

pub struct CatalogLookup {
    catalog: Arc<dyn PrimaryCatalog>,
    links: Arc<LinkResolver>,
    tracks: TrackResolver,
}

/// `YYYY-MM-DD` from the catalog's rfc3339 timestamp, or whatever precedes
/// the `T` when it does not parse
fn release_day(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return "Unknown".to_string();
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.date_naive().format("%Y-%m-%d").to_string(),
        Err(_) => raw.split('T').next().unwrap_or(raw).to_string()
    }
}

/// Catalog artwork comes as a 100px thumbnail; the same path serves 600px
fn large_artwork(raw: Option<&str>) -> Option<String> {
    raw.map(|url| url.replace("100x100", "600x600"))
}

fn assemble(album: CatalogAlbum, url: String, tracks: Vec<ResolvedTrack>) -> ResolvedAlbum {
    ResolvedAlbum {
        source: SOURCE.to_string(),
        release_date: release_day(album.release_date.as_deref()),
        artwork: large_artwork(album.artwork_url.as_deref()),
        artists: vec![ArtistLink { name: album.artist_name, url: album.artist_url }],
        genres: album.genre.into_iter().collect(),
        total_tracks: album.track_count,
        label: None,
        popularity: None,
        copyright: album.copyright,
        name: album.name,
        url,
        tracks,
    }
}

impl CatalogLookup {
    pub fn new(
        catalog: Arc<dyn PrimaryCatalog>,
        links: Arc<LinkResolver>,
        tracks: TrackResolver
    ) -> Self {
        Self { catalog, links, tracks }
    }

    /// None when the catalog has no album for `query`. Failures of the
    /// search or the track lookup propagate; link failures never do.
    pub async fn search_album(&self, query: &str) ->
        Result<Option<ResolvedAlbum>, ResolverError> {
        self.search_album_for(query, None).await
    }

    /// Same as search_album, but a caller that already knows the album's
    /// target url passes it as `known_target` and no album link is resolved
    pub async fn search_album_for(&self, query: &str, known_target: Option<String>) ->
        Result<Option<ResolvedAlbum>, ResolverError> {
        let Some(album) = self.catalog.search_albums(query, 1).await?.into_iter().next() else {
            info!(query, "catalog.not_found");
            return Ok(None);
        };
        debug!(
            collection_id = album.collection_id,
            name = %album.name,
            artist = %album.artist_name,
            "catalog.match"
        );

        let tracks: Vec<CatalogTrack> = self.catalog.album_tracks(album.collection_id).await?;

        let url = match known_target {
            Some(url) => url,
            None => self.links
                .resolve_target_url(&album.view_url, &album.name, &album.artist_name)
                .await
                .unwrap_or_else(|| album.view_url.clone())
        };

        let resolved_tracks = self.tracks.resolve_tracks(&tracks).await;
        Ok(Some(assemble(album, url, resolved_tracks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MusicBrainzConfig, ResolveConfig};
    use crate::sources::mocks::*;

    const SPOTIFY_URL: &str = "https://open.spotify.com/album/0ETFjACtuP2ADo6LFhL6HN";

    fn mb_cfg() -> MusicBrainzConfig {
        MusicBrainzConfig {
            base_url: url::Url::parse("https://musicbrainz.org/ws/2/").unwrap(),
            group_limit: 3,
            release_limit: 10,
            timeout: std::time::Duration::from_secs(8),
        }
    }

    fn lookup(catalog: Arc<StubCatalog>, links: Arc<StubLinks>) -> CatalogLookup {
        let resolve = ResolveConfig::default();
        let link_resolver = LinkResolver::new(
            links.clone(),
            Arc::new(StubSecondary::default()),
            Arc::new(StubRegistry::default()),
            &resolve,
            &mb_cfg()
        );
        CatalogLookup::new(
            catalog,
            Arc::new(link_resolver),
            TrackResolver::new(links, &resolve)
        )
    }

    #[tokio::test]
    async fn abbey_road_keeps_all_seventeen_tracks() {
        let album = album_fixture("Abbey Road", "The Beatles", 17);
        let view_url = album.view_url.clone();
        let catalog = Arc::new(StubCatalog::with_album(album, tracks_fixture(17)));
        let links = Arc::new(StubLinks::new(LinkReply::Empty)
            .reply(&view_url, LinkReply::Found(links_to("spotify", SPOTIFY_URL))));

        let resolved = lookup(catalog.clone(), links).search_album("Abbey Road").await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.total_tracks, 17);
        assert_eq!(resolved.tracks.len(), 17);
        assert_eq!(resolved.url, SPOTIFY_URL);
        assert_eq!(resolved.source, "itunes");
        assert_eq!(resolved.release_date, "1969-09-26");
        assert_eq!(resolved.genres, vec!["Rock".to_string()]);
        assert_eq!(resolved.label, None);
        assert_eq!(resolved.popularity, None);
        assert!(resolved.artwork.unwrap().contains("600x600"));
        assert_eq!(resolved.artists[0].name, "The Beatles");
        assert_eq!(catalog.searches(), 1);
    }

    #[tokio::test]
    async fn no_search_hit_is_none() {
        let catalog = Arc::new(StubCatalog::empty());
        let links = Arc::new(StubLinks::new(LinkReply::Empty));

        let got = lookup(catalog.clone(), links.clone())
            .search_album("zzzznonexistentalbum")
            .await
            .unwrap();

        assert_eq!(got, None);
        assert_eq!(links.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn link_service_down_falls_back_to_catalog_url() {
        let album = album_fixture("Abbey Road", "The Beatles", 3);
        let view_url = album.view_url.clone();
        let catalog = Arc::new(StubCatalog::with_album(album, tracks_fixture(3)));
        let links = Arc::new(StubLinks::new(LinkReply::Fail)
            .reply(&track_url(2), LinkReply::Hang));

        let resolved = lookup(catalog, links).search_album("Abbey Road").await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.url, view_url);
        assert_eq!(resolved.tracks.len(), 3);
        assert_eq!(resolved.resolved_track_count(), 0);
    }

    #[tokio::test]
    async fn known_target_skips_album_link_resolution() {
        let album = album_fixture("Abbey Road", "The Beatles", 2);
        let view_url = album.view_url.clone();
        let catalog = Arc::new(StubCatalog::with_album(album, tracks_fixture(2)));
        let links = Arc::new(StubLinks::new(LinkReply::Empty)
            .reply(&view_url, LinkReply::Found(links_to("spotify", "https://open.spotify.com/album/other"))));

        let resolved = lookup(catalog, links.clone())
            .search_album_for("Abbey Road", Some(SPOTIFY_URL.to_string()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.url, SPOTIFY_URL);
        assert!(!links.asked().contains(&view_url));
        assert_eq!(links.calls(), 2);
    }

    #[tokio::test]
    async fn search_failure_propagates() {
        let catalog = Arc::new(StubCatalog { fail_search: true, ..Default::default() });
        let links = Arc::new(StubLinks::new(LinkReply::Empty));

        let err = lookup(catalog, links).search_album("Abbey Road").await.unwrap_err();
        assert!(matches!(err, ResolverError::Http(_)));
    }

    #[test]
    fn release_day_handles_odd_inputs() {
        assert_eq!(release_day(Some("1997-05-21T07:00:00Z")), "1997-05-21");
        assert_eq!(release_day(Some("1997-05-21")), "1997-05-21");
        assert_eq!(release_day(Some("")), "Unknown");
        assert_eq!(release_day(None), "Unknown");
    }
}
