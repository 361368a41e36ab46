//!
//! src/console.rs  Andrew Belles  Oct 18th, 2025
//!
//! Line-oriented front end over stdin/stdout. Owns the album resolver,
//! the artist lookup, and the cache sweeper for the life of the process.
//!

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::artist::{find_spotify_playlist_url, ArtistLookup, DEFAULT_TOP_ALBUMS};
use crate::cache::spawn_sweeper;
use crate::normalize::parse_artist_url;
use crate::resolver::AlbumResolver;
use crate::ResolverError;

const USAGE: &str = "commands: album <query> | artist <query> | playlist <query> | \
stats | clear | forget <query> | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Album(String),
    Artist(String),
    Playlist(String),
    Stats,
    Clear,
    Forget(String),
    Quit,
    Help,
}

impl Command {
    /// None for a blank line. Unknown words and missing arguments map to Help.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, "")
        };

        let with_arg = |make: fn(String) -> Command| {
            if rest.is_empty() { Command::Help } else { make(rest.to_string()) }
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "album"    => with_arg(Command::Album),
            "artist"   => with_arg(Command::Artist),
            "playlist" => with_arg(Command::Playlist),
            "forget"   => with_arg(Command::Forget),
            "stats"    => Command::Stats,
            "clear"    => Command::Clear,
            "quit" | "exit" => Command::Quit,
            _ => Command::Help
        };
        Some(command)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Found(Value),
    NotFound(String),
    Failed(String),
    Info(String),
    Quit,
}

impl Reply {
    fn found<T: Serialize>(value: &T) -> Reply {
        match serde_json::to_value(value) {
            Ok(v) => Reply::Found(v),
            Err(e) => Reply::Failed(format!("render: {e}"))
        }
    }

    fn failed(e: &ResolverError) -> Reply {
        Reply::Failed(e.to_string())
    }

    pub fn render(&self) -> String {
        match self {
            Reply::Found(v) => serde_json::to_string_pretty(v)
                .unwrap_or_else(|e| format!("something went wrong: {e}")),
            Reply::NotFound(what) => format!("not found: {what}"),
            Reply::Failed(why) => format!("something went wrong: {why}"),
            Reply::Info(msg) => msg.clone(),
            Reply::Quit => "bye".to_string(),
        }
    }
}

pub struct Console {
    albums: AlbumResolver,
    artists: ArtistLookup,
    request_timeout: Duration,
}

impl Console {
    pub fn new(albums: AlbumResolver, artists: ArtistLookup, request_timeout: Duration) -> Self {
        Self { albums, artists, request_timeout }
    }

    async fn album(&self, query: &str) -> Reply {
        match timeout(self.request_timeout, self.albums.get_album(query)).await {
            Ok(Ok(Some(album))) => Reply::found(&*album),
            Ok(Ok(None)) => Reply::NotFound(format!("no album for \"{query}\"")),
            Ok(Err(e)) => {
                error!(query, error = %e, "console.album.failed");
                Reply::failed(&e)
            }
            Err(elapsed) => {
                warn!(query, "console.album.timeout");
                Reply::failed(&ResolverError::from(elapsed))
            }
        }
    }

    async fn artist(&self, query: &str) -> Reply {
        let Some(found) = self.artists.is_artist_query(query).await else {
            return Reply::NotFound(format!("no artist matching \"{query}\""));
        };
        // an artist url is already the answer
        if parse_artist_url(query).is_some() {
            return Reply::found(&found);
        }

        let top = self.artists.get_artist_top_albums(
            &found.artist_name, &found.target_url, DEFAULT_TOP_ALBUMS
        );
        match timeout(self.request_timeout, top).await {
            Ok(Ok(Some(artist))) => Reply::found(&artist),
            Ok(Ok(None)) => Reply::NotFound(format!("no details for {}", found.artist_name)),
            Ok(Err(e)) => {
                error!(query, error = %e, "console.artist.failed");
                Reply::failed(&e)
            }
            Err(elapsed) => Reply::failed(&ResolverError::from(elapsed))
        }
    }

    fn stats(&self) -> Reply {
        let stats = self.albums.cache().stats();
        Reply::Found(json!({
            "size": stats.size,
            "ttl_ms": stats.ttl.as_millis() as u64,
            "entries": stats.entries,
        }))
    }

    pub async fn execute(&self, command: Command) -> Reply {
        info!(command = ?command, "console.command");
        match command {
            Command::Album(q) => self.album(&q).await,
            Command::Artist(q) => self.artist(&q).await,
            Command::Playlist(q) => Reply::Found(json!({ "url": find_spotify_playlist_url(&q) })),
            Command::Stats => self.stats(),
            Command::Clear => {
                let removed = self.albums.cache().clear();
                Reply::Info(format!("cleared {removed} cached albums"))
            }
            Command::Forget(q) => match self.albums.forget(&q) {
                true => Reply::Info(format!("forgot \"{q}\"")),
                false => Reply::NotFound(format!("nothing cached for \"{q}\""))
            },
            Command::Quit => Reply::Quit,
            Command::Help => Reply::Info(USAGE.to_string()),
        }
    }

    /// Answers one command per input line until quit, end of input, or
    /// `shutdown`. Returns how many commands were answered.
    pub async fn serve<R, W>(
        &self,
        input: R,
        mut output: W,
        shutdown: &CancellationToken
    ) -> Result<usize, ResolverError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin
    {
        let mut lines = input.lines();
        let mut answered = 0_usize;

        loop {
            let line = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                info!("console.eof");
                break;
            };
            let Some(command) = Command::parse(&line) else {
                continue;
            };

            let reply = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                reply = self.execute(command) => reply,
            };
            if reply == Reply::Quit {
                break;
            }

            output.write_all(reply.render().as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
            answered += 1;
        }
        Ok(answered)
    }

    /// Runs against stdin/stdout with the cache sweeper alongside;
    /// Ctrl-C cancels both
    pub async fn run(self, sweep_every: Duration) -> Result<(), ResolverError> {
        let shutdown = CancellationToken::new();
        let sweeper = spawn_sweeper(
            self.albums.cache().clone(), sweep_every, shutdown.clone()
        );

        let token = shutdown.clone();
        let trigger = tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                signal = tokio::signal::ctrl_c() => {
                    if signal.is_ok() {
                        warn!(msg = "shutting resolver down", "console.signal");
                    }
                    token.cancel();
                }
            }
        });

        info!("console.start");
        let served = self.serve(
            BufReader::new(tokio::io::stdin()), tokio::io::stdout(), &shutdown
        ).await;
        shutdown.cancel();

        if let Err(e) = sweeper.await {
            error!(error = ?e, "sweeper task found error");
        }
        let _ = trigger.await;

        let answered = served?;
        info!(answered, "console.exit");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cache::AlbumCache;
    use crate::catalog::CatalogLookup;
    use crate::config::{MusicBrainzConfig, ResolveConfig};
    use crate::links::LinkResolver;
    use crate::sources::mocks::*;
    use crate::tracks::TrackResolver;

    const ID: &str = "0ETFjACtuP2ADo6LFhL6HN";

    fn console(catalog: StubCatalog, links: StubLinks) -> Console {
        let resolve = ResolveConfig::default();
        let mb = MusicBrainzConfig {
            base_url: url::Url::parse("https://musicbrainz.org/ws/2/").unwrap(),
            group_limit: 3,
            release_limit: 10,
            timeout: Duration::from_secs(8),
        };
        let links = Arc::new(links);
        let link_resolver = Arc::new(LinkResolver::new(
            links.clone(),
            Arc::new(StubSecondary::default()),
            Arc::new(StubRegistry::default()),
            &resolve,
            &mb
        ));
        let lookup = CatalogLookup::new(
            Arc::new(catalog), link_resolver.clone(), TrackResolver::new(links, &resolve)
        );
        let albums = AlbumResolver::new(
            Arc::new(AlbumCache::new(Duration::from_secs(600))), lookup, link_resolver
        );
        let artists = ArtistLookup::new(Arc::new(StubArtists { fail: true, ..Default::default() }));
        Console::new(albums, artists, Duration::from_secs(45))
    }

    fn abbey_road() -> StubCatalog {
        StubCatalog::with_album(album_fixture("Abbey Road", "The Beatles", 2), tracks_fixture(2))
    }

    #[test]
    fn commands_parse() {
        assert_eq!(Command::parse("   "), None);
        assert_eq!(
            Command::parse("album  Abbey Road "),
            Some(Command::Album("Abbey Road".into()))
        );
        assert_eq!(Command::parse("ARTIST radiohead"), Some(Command::Artist("radiohead".into())));
        assert_eq!(Command::parse("album"), Some(Command::Help));
        assert_eq!(Command::parse("stats"), Some(Command::Stats));
        assert_eq!(Command::parse("dance"), Some(Command::Help));
        assert_eq!(Command::parse("quit"), Some(Command::Quit));
    }

    #[test]
    fn not_found_and_failure_render_differently() {
        let missing = Reply::NotFound("no album".into()).render();
        let broken = Reply::Failed("itunes returned status 503".into()).render();
        assert!(missing.starts_with("not found"));
        assert!(broken.starts_with("something went wrong"));
    }

    #[tokio::test]
    async fn album_found_missing_and_failed() {
        let found = console(abbey_road(), StubLinks::new(LinkReply::Empty))
            .execute(Command::Album("Abbey Road".into()))
            .await;
        let Reply::Found(value) = found else { panic!("expected an album") };
        assert_eq!(value["name"], "Abbey Road");
        assert_eq!(value["tracks"].as_array().unwrap().len(), 2);

        let missing = console(StubCatalog::empty(), StubLinks::new(LinkReply::Empty))
            .execute(Command::Album("zzzznonexistentalbum".into()))
            .await;
        assert!(matches!(missing, Reply::NotFound(_)));

        let failing = StubCatalog { fail_search: true, ..Default::default() };
        let failed = console(failing, StubLinks::new(LinkReply::Empty))
            .execute(Command::Album("Abbey Road".into()))
            .await;
        assert!(matches!(failed, Reply::Failed(_)));
    }

    #[tokio::test]
    async fn artist_lookup_failure_reads_as_not_found() {
        let reply = console(StubCatalog::empty(), StubLinks::new(LinkReply::Empty))
            .execute(Command::Artist("radiohead".into()))
            .await;
        assert!(matches!(reply, Reply::NotFound(_)));
    }

    #[tokio::test]
    async fn serve_answers_until_quit() {
        let console = console(abbey_road(), StubLinks::new(LinkReply::Empty));
        let input: &[u8] = b"album Abbey Road\n\nstats\nplaylist lofi\nquit\nstats\n";
        let mut output = Vec::new();

        let answered = console
            .serve(input, &mut output, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(answered, 3);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("\"name\": \"Abbey Road\""));
        assert!(text.contains("\"size\": 0"));
        assert!(text.contains("https://open.spotify.com/search/lofi/playlists"));
    }

    #[tokio::test]
    async fn serve_stops_on_cancelled_token() {
        let console = console(abbey_road(), StubLinks::new(LinkReply::Empty));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let mut output = Vec::new();
        let answered = console
            .serve(&b"stats\nstats\n"[..], &mut output, &shutdown)
            .await
            .unwrap();
        assert_eq!(answered, 0);
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn id_query_is_cached_and_forgettable() {
        let mut found = links_to("spotify", &format!("https://open.spotify.com/album/{ID}"));
        found.title = Some("Abbey Road".into());
        found.artist_name = Some("The Beatles".into());
        let links = StubLinks::new(LinkReply::Empty)
            .reply(&format!("https://open.spotify.com/album/{ID}"), LinkReply::Found(found));
        let console = console(abbey_road(), links);

        console.execute(Command::Album(ID.into())).await;
        let Reply::Found(stats) = console.execute(Command::Stats).await else { panic!() };
        assert_eq!(stats["size"], 1);

        let forgot = console.execute(Command::Forget(ID.into())).await;
        assert!(matches!(forgot, Reply::Info(_)));
        let again = console.execute(Command::Forget(ID.into())).await;
        assert!(matches!(again, Reply::NotFound(_)));
    }
}
