//!
//! src/resolver.rs  Andrew Belles  Oct 18th, 2025
//!
//! Album entry point: cache for direct album ids, catalog lookup for
//! everything else
//!

use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::cache::AlbumCache;
use crate::catalog::CatalogLookup;
use crate::links::LinkResolver;
use crate::normalize::{album_url, parse_album_id};
use crate::types::ResolvedAlbum;
use crate::ResolverError;

pub struct AlbumResolver {
    cache: Arc<AlbumCache>,
    catalog: CatalogLookup,
    links: Arc<LinkResolver>,
}

impl AlbumResolver {
    pub fn new(cache: Arc<AlbumCache>, catalog: CatalogLookup, links: Arc<LinkResolver>) -> Self {
        Self { cache, catalog, links }
    }

    pub fn cache(&self) -> &Arc<AlbumCache> {
        &self.cache
    }

    /// Resolves an album from free text or a direct album id, url or uri.
    /// Only direct ids go through the cache; free text always searches.
    #[instrument(name = "album.request", skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn get_album(&self, query: &str) ->
        Result<Option<Arc<ResolvedAlbum>>, ResolverError> {
        let query = query.trim();

        let Some(id) = parse_album_id(query) else {
            debug!("album.text_query");
            let album = self.catalog.search_album(query).await?;
            return Ok(album.map(Arc::new));
        };

        if let Some(hit) = self.cache.get(&id) {
            return Ok(Some(hit));
        }

        // the catalog only understands text, so ask what the id names
        let search_text = match self.links.describe(&album_url(&id)).await {
            Some(text) => text,
            None => query.to_string()
        };
        debug!(id = %id, search_text = %search_text, "album.id_query");

        // the caller already named the target album, only its metadata is searched
        let target = album_url(&id);
        let Some(album) = self.catalog.search_album_for(&search_text, Some(target)).await? else {
            return Ok(None);
        };
        let album = Arc::new(album);
        self.cache.set(&id, Arc::clone(&album));
        info!(
            id = %id,
            name = %album.name,
            tracks = album.tracks.len(),
            linked = album.resolved_track_count(),
            duration_ms = album.total_duration_ms(),
            "album.resolved"
        );
        Ok(Some(album))
    }

    /// Drops the cached entry a query would hit, if any
    pub fn forget(&self, query: &str) -> bool {
        let query = query.trim();
        match parse_album_id(query) {
            Some(id) => self.cache.delete(&id),
            None => self.cache.delete(query)
        }
    }
}
