//!
//! src/links.rs  Andrew Belles  Oct 18th, 2025
//!
//! Album-level link resolution. Finds the target platform url for one
//! album through three strategies, in order:
//!
//!   1. direct       source catalog url -> link service
//!   2. secondary    secondary catalog top hit -> link service
//!   3. registry     release-group url relations, then those of its releases
//!

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{MusicBrainzConfig, ResolveConfig};
use crate::sources::{LinkService, ReleaseRegistry, SecondaryCatalog};
use crate::strategy::{first_success, Strategy};
use crate::ResolverError;

pub struct LinkResolver {
    links: Arc<dyn LinkService>,
    secondary: Arc<dyn SecondaryCatalog>,
    registry: Arc<dyn ReleaseRegistry>,
    target_platform: String,
    target_album_marker: String,
    group_limit: u32,
}

impl LinkResolver {
    pub fn new(
        links: Arc<dyn LinkService>,
        secondary: Arc<dyn SecondaryCatalog>,
        registry: Arc<dyn ReleaseRegistry>,
        resolve: &ResolveConfig,
        musicbrainz: &MusicBrainzConfig
    ) -> Self {
        Self {
            links,
            secondary,
            registry,
            target_platform: resolve.target_platform.clone(),
            target_album_marker: resolve.target_album_marker.clone(),
            group_limit: musicbrainz.group_limit,
        }
    }

    /// Target platform url for the album, None when every strategy came
    /// back empty or failed. Callers fall back to the source url.
    pub async fn resolve_target_url(
        &self,
        reference: &str,
        album_name: &str,
        artist_name: &str
    ) -> Option<String> {
        let strategies = vec![
            Strategy::new("direct", move || self.direct(reference)),
            Strategy::new("secondary", move || self.secondary_bridge(album_name, artist_name)),
            Strategy::new("registry", move || self.registry_bridge(album_name, artist_name)),
        ];
        first_success("album.link", strategies).await
    }

    /// Title and artist the link service reports for `source_url`, as one
    /// search string. Used to turn a bare target-platform id into a query.
    pub async fn describe(&self, source_url: &str) -> Option<String> {
        match self.links.links(source_url).await {
            Ok(links) => {
                let text = match (links.title, links.artist_name) {
                    (Some(title), Some(artist)) => format!("{title} {artist}"),
                    (Some(title), None) => title,
                    _ => return None
                };
                debug!(source = source_url, text = %text, "link.describe");
                Some(text)
            }
            Err(e) => {
                warn!(source = source_url, error = %e, "link.describe.failed");
                None
            }
        }
    }

    async fn direct(&self, source_url: &str) -> Result<Option<String>, ResolverError> {
        if source_url.is_empty() {
            return Ok(None);
        }
        let links = self.links.links(source_url).await?;
        Ok(links.url_for(&self.target_platform).map(str::to_string))
    }

    async fn secondary_bridge(&self, album_name: &str, artist_name: &str) ->
        Result<Option<String>, ResolverError> {
        let query = format!("{album_name} {artist_name}");
        match self.secondary.top_album_url(query.trim()).await? {
            Some(url) => self.direct(&url).await,
            None => Ok(None)
        }
    }

    fn direct_album_url<'u>(&self, urls: &'u [String]) -> Option<&'u String> {
        urls.iter().find(|u| u.contains(&self.target_album_marker))
    }

    async fn registry_bridge(&self, album_name: &str, artist_name: &str) ->
        Result<Option<String>, ResolverError> {
        let groups = self.registry
            .release_groups(album_name, artist_name, self.group_limit)
            .await?;

        for group in groups.iter().take(self.group_limit as usize) {
            let urls = self.registry.release_group_urls(group).await?;
            if let Some(url) = self.direct_album_url(&urls) {
                return Ok(Some(url.clone()));
            }

            let urls = self.registry.release_urls(group).await?;
            if let Some(url) = self.direct_album_url(&urls) {
                return Ok(Some(url.clone()));
            }
        }
        Ok(None)
    }
}
