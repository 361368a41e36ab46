//!
//! src/fetch.rs  Andrew Belles  Oct 18th, 2025
//!
//! Defines methods for hitting specified endpoints and
//! returning unparsed requests, plus one send helper that turns a
//! response into json or a typed error
//!

use serde::de::DeserializeOwned;
use url::Url;
use reqwest::{Client, header, redirect, RequestBuilder};
use crate::config::{
    DeezerConfig, HttpConfig, IdentityConfig, ItunesConfig, LastFmConfig,
    MusicBrainzConfig, OdesliConfig
};
use crate::ResolverError;

/// Client building functionality
fn client_helper(http: &HttpConfig) -> reqwest::ClientBuilder  {
    Client::builder()
        .timeout(http.timeout)
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Some(http.pool_idle_timeout))
        .redirect(redirect::Policy::limited(http.max_redirects as usize))
}

fn client_with_headers(http: &HttpConfig, headers: header::HeaderMap) ->
    Result<Client, ResolverError> {
    client_helper(http)
        .default_headers(headers)
        .build()
        .map_err(|e| ResolverError::Http(format!("build client: {e}")))
}

fn json_headers() -> header::HeaderMap {
    let mut h = header::HeaderMap::new();
    h.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    h
}

pub fn base_client(http: &HttpConfig) -> Result<Client, ResolverError> {
    client_with_headers(http, json_headers())
}

pub fn musicbrainz_client(http: &HttpConfig, id: &IdentityConfig) ->
    Result<Client, ResolverError> {

    let mut h = json_headers();
    h.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&id.user_agent)
            .map_err(|e| ResolverError::Config(
                format!("invalid mb user-agent {e}")
            ))?
    );
    client_with_headers(http, h)
}

fn join(base: &Url, path: &str) -> Result<Url, ResolverError> {
    base.join(path)
        .map_err(|e| ResolverError::Config(format!("join {base} + {path}: {e}")))
}

/// Sends the request and decodes a 2xx body as `T`; a 404 is NotFound,
/// anything else is an error tagged with the upstream `service`
pub async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder
) -> Result<T, ResolverError> {
    let response = request.send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ResolverError::NotFound(format!("{service} {}", response.url())));
    }
    if !status.is_success() {
        return Err(ResolverError::Status { service, status: status.as_u16() });
    }
    let bytes = response.bytes().await?;
    Ok( serde_json::from_slice::<T>(&bytes)? )
}

#[derive(Clone, Debug)]
pub struct ItunesClient {
    pub http: Client,
    pub cfg: ItunesConfig
}

impl ItunesClient {
    pub fn new(http_config: &HttpConfig, cfg: &ItunesConfig) ->
        Result<Self, ResolverError> {
        let http = base_client(http_config)?;
        Ok( Self { http, cfg: cfg.clone() })
    }

    fn with_country(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.cfg.country {
            Some(country) => rb.query(&[("country", country.as_str())]),
            None => rb
        }
    }

    /// GET /search?term=...&entity=album&limit=
    pub fn search_album(&self, term: &str, limit: u32) ->
        Result<RequestBuilder, ResolverError> {
        let url = join(&self.cfg.base_url, "search")?;
        let rb = self.http.get(url).query(&[
            ("term", term),
            ("entity", "album"),
            ("limit", &limit.to_string())
        ]);
        Ok(self.with_country(rb))
    }

    /// GET /lookup?id=...&entity=song
    pub fn lookup_collection(&self, collection_id: u64) ->
        Result<RequestBuilder, ResolverError> {
        let url = join(&self.cfg.base_url, "lookup")?;
        let rb = self.http.get(url).query(&[
            ("id", collection_id.to_string().as_str()),
            ("entity", "song")
        ]);
        Ok(self.with_country(rb))
    }
}

#[derive(Clone, Debug)]
pub struct OdesliClient {
    pub http: Client,
    pub cfg: OdesliConfig
}

impl OdesliClient {
    pub fn new(http_config: &HttpConfig, cfg: &OdesliConfig) ->
        Result<Self, ResolverError> {
        let http = base_client(http_config)?;
        Ok( Self { http, cfg: cfg.clone() })
    }

    /// GET /links?url=...&userCountry=...
    pub fn links(&self, source_url: &str) -> Result<RequestBuilder, ResolverError> {
        let url = join(&self.cfg.base_url, "links")?;
        Ok(self.http.get(url)
            .timeout(self.cfg.timeout)
            .query(&[
                ("url", source_url),
                ("userCountry", self.cfg.user_country.as_str())
            ]))
    }
}

#[derive(Clone, Debug)]
pub struct DeezerClient {
    pub http: Client,
    pub cfg: DeezerConfig
}

impl DeezerClient {
    pub fn new(http_config: &HttpConfig, cfg: &DeezerConfig) ->
        Result<Self, ResolverError> {
        let http = base_client(http_config)?;
        Ok( Self { http, cfg: cfg.clone() })
    }

    /// GET /search/album?q=...&limit=
    pub fn search_album(&self, query: &str, limit: u32) ->
        Result<RequestBuilder, ResolverError> {
        let url = join(&self.cfg.base_url, "search/album")?;
        Ok(self.http.get(url)
            .timeout(self.cfg.timeout)
            .query(&[("q", query), ("limit", &limit.to_string())]))
    }
}

#[derive(Debug, Clone)]
pub struct MusicBrainzClient {
    pub http: Client,
    pub cfg: MusicBrainzConfig
}

impl MusicBrainzClient {
    pub fn new(
        http_config: &HttpConfig,
        id: &IdentityConfig,
        cfg: &MusicBrainzConfig) -> Result<Self, ResolverError> {
        let http = musicbrainz_client(http_config, id)?;
        Ok( Self{ http, cfg: cfg.clone() })
    }

    /// GET /ws/2/release-group?query=...&limit=&fmt=json
    pub fn search_release_group(&self, lucene: &str, limit: u32) ->
        Result<RequestBuilder, ResolverError> {
        let url = join(&self.cfg.base_url, "release-group")?;
        Ok(self.http.get(url)
            .timeout(self.cfg.timeout)
            .query(&[
                ("query", lucene),
                ("limit", &limit.to_string()),
                ("fmt", "json")
            ]))
    }

    /// GET /ws/2/release-group/{MBID}?inc=url-rels&fmt=json
    pub fn lookup_release_group(&self, mbid: &str) -> Result<RequestBuilder, ResolverError> {
        let url = join(&self.cfg.base_url, &format!("release-group/{mbid}"))?;
        Ok(self.http.get(url)
            .timeout(self.cfg.timeout)
            .query(&[("inc", "url-rels"), ("fmt", "json")]))
    }

    /// GET /ws/2/release?release-group={MBID}&inc=url-rels&fmt=json&limit=
    pub fn browse_releases(&self, group_mbid: &str) -> Result<RequestBuilder, ResolverError> {
        let url = join(&self.cfg.base_url, "release")?;
        Ok(self.http.get(url)
            .timeout(self.cfg.timeout)
            .query(&[
                ("release-group", group_mbid),
                ("inc", "url-rels"),
                ("fmt", "json"),
                ("limit", &self.cfg.release_limit.to_string())
            ]))
    }
}

#[derive(Clone, Debug)]
pub struct LastFmClient {
    pub http: Client,
    pub cfg: LastFmConfig,
}

impl LastFmClient {
    pub fn new(http_cfg: &HttpConfig, last_cfg: &LastFmConfig) ->
        Result<Self, ResolverError> {
        let http = base_client(http_cfg)?;
        Ok( Self{ http, cfg: last_cfg.clone() })
    }

    fn api_key(&self) -> Result<&str, ResolverError> {
        self.cfg.api_key.as_deref()
            .ok_or_else(|| ResolverError::Config("LASTFM_API_KEY was not set".into()))
    }

    fn method(&self, method: &str) -> Result<RequestBuilder, ResolverError> {
        let api_key = self.api_key()?;
        Ok(self.http.get(self.cfg.base_url.clone())
            .timeout(self.cfg.timeout)
            .query(&[
                ("method", method),
                ("api_key", api_key),
                ("format", "json"),
            ]))
    }

    /// GET /?method=artist.search&artist=...&limit=...&api_key=...&format=json
    pub fn artist_search(&self, artist: &str, limit: u32) ->
        Result<RequestBuilder, ResolverError> {
        Ok(self.method("artist.search")?
            .query(&[("artist", artist), ("limit", &limit.to_string())]))
    }

    /// GET /?method=artist.getinfo&artist=...&api_key=...&format=json
    pub fn artist_info(&self, artist: &str) -> Result<RequestBuilder, ResolverError> {
        Ok(self.method("artist.getinfo")?.query(&[("artist", artist)]))
    }

    /// GET /?method=artist.gettopalbums&artist=...&limit=...&api_key=...&format=json
    pub fn artist_top_albums(&self, artist: &str, limit: u32) ->
        Result<RequestBuilder, ResolverError> {
        Ok(self.method("artist.gettopalbums")?
            .query(&[("artist", artist), ("limit", &limit.to_string())]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn odesli_cfg() -> OdesliConfig {
        OdesliConfig {
            base_url: Url::parse("https://api.song.link/v1-alpha.1/").unwrap(),
            user_country: "US".into(),
            timeout: Duration::from_secs(15),
        }
    }

    #[test]
    fn odesli_request_carries_url_and_country() {
        let client = OdesliClient::new(&HttpConfig::default(), &odesli_cfg()).unwrap();
        let request = client.links("https://music.apple.com/us/album/x/1")
            .unwrap()
            .build()
            .unwrap();
        let url = request.url();
        assert_eq!(url.path(), "/v1-alpha.1/links");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("url".into(), "https://music.apple.com/us/album/x/1".into())));
        assert!(pairs.contains(&("userCountry".into(), "US".into())));
        assert_eq!(request.timeout(), Some(&Duration::from_secs(15)));
    }

    #[test]
    fn itunes_search_is_album_scoped() {
        let cfg = ItunesConfig {
            base_url: Url::parse("https://itunes.apple.com/").unwrap(),
            country: Some("GB".into()),
        };
        let client = ItunesClient::new(&HttpConfig::default(), &cfg).unwrap();
        let request = client.search_album("Abbey Road", 1).unwrap().build().unwrap();
        let pairs: Vec<(String, String)> = request.url().query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![
            ("term".into(), "Abbey Road".into()),
            ("entity".into(), "album".into()),
            ("limit".into(), "1".into()),
            ("country".into(), "GB".into()),
        ]);
    }

    #[test]
    fn musicbrainz_agent_comes_from_identity() {
        let cfg = MusicBrainzConfig {
            base_url: Url::parse("https://musicbrainz.org/ws/2/").unwrap(),
            group_limit: 3,
            release_limit: 10,
            timeout: Duration::from_secs(8),
        };
        let good = IdentityConfig { user_agent: "rs-album-resolver/0.1.0 (ops@example.com)".into() };
        assert!(MusicBrainzClient::new(&HttpConfig::default(), &good, &cfg).is_ok());

        let bad = IdentityConfig { user_agent: "broken\nagent".into() };
        assert!(matches!(
            MusicBrainzClient::new(&HttpConfig::default(), &bad, &cfg),
            Err(ResolverError::Config(_))
        ));
    }

    #[test]
    fn lastfm_without_key_is_config_error() {
        let cfg = LastFmConfig {
            base_url: Url::parse("https://ws.audioscrobbler.com/2.0/").unwrap(),
            api_key: None,
            timeout: Duration::from_secs(8),
        };
        let client = LastFmClient::new(&HttpConfig::default(), &cfg).unwrap();
        assert!(matches!(client.artist_info("Radiohead"), Err(ResolverError::Config(_))));
    }
}
