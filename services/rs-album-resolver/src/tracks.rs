//!
//! src/tracks.rs  Andrew Belles  Oct 18th, 2025
//!
//! Per-track link resolution. Every track is resolved concurrently and
//! the batch is joined as a whole; a track that fails just keeps no link.
//!

use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::ResolveConfig;
use crate::sources::LinkService;
use crate::types::{CatalogTrack, ResolvedTrack};

pub struct TrackResolver {
    links: Arc<dyn LinkService>,
    target_platform: String,
    timeout: Duration,
}

impl TrackResolver {
    pub fn new(links: Arc<dyn LinkService>, cfg: &ResolveConfig) -> Self {
        Self {
            links,
            target_platform: cfg.target_platform.clone(),
            timeout: cfg.track_timeout,
        }
    }

    async fn resolve_one(&self, track: &CatalogTrack) -> ResolvedTrack {
        let Some(view_url) = track.view_url.as_deref() else {
            return ResolvedTrack::unresolved(track);
        };

        match timeout(self.timeout, self.links.links(view_url)).await {
            Ok(Ok(links)) => {
                let url = links.url_for(&self.target_platform).map(str::to_string);
                ResolvedTrack::resolved(track, url)
            }
            Ok(Err(e)) => {
                warn!(track = %track.name, error = %e, "track.link.failed");
                ResolvedTrack::unresolved(track)
            }
            Err(_) => {
                warn!(
                    track = %track.name,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "track.link.timeout"
                );
                ResolvedTrack::unresolved(track)
            }
        }
    }

    /// One output per input, in input order. Never fails.
    pub async fn resolve_tracks(&self, tracks: &[CatalogTrack]) -> Vec<ResolvedTrack> {
        let resolved = join_all(tracks.iter().map(|t| self.resolve_one(t))).await;

        let linked = resolved.iter().filter(|t| t.target_url.is_some()).count();
        info!(total = resolved.len(), linked, "tracks.resolved");
        resolved
    }
}
