//!
//! src/config.rs  Andrew Belles  Oct 18th, 2025
//!
//! Reads environment into typed configuration for every upstream,
//! the album cache, and the logger
//!

use url::Url;
use std::time;
use crate::ResolverError;

/// Constants for HTTP Config
pub const HTTP_TIMEOUT: u64 = 8000;
pub const HTTP_CONNECT_TIMEOUT: u64 = 2000;
pub const HTTP_POOL_MAX_IDLE: usize = 16;
pub const HTTP_POOL_IDLE_TIMEOUT: u64 = 90000;
pub const HTTP_MAX_REDIRECTS: u8 = 4;

/// Per-upstream call budgets
pub const ODESLI_TIMEOUT: u64 = 15000;
pub const DEEZER_TIMEOUT: u64 = 6000;
pub const MB_TIMEOUT: u64 = 8000;
pub const LASTFM_TIMEOUT: u64 = 8000;
pub const TRACK_TIMEOUT: u64 = 15000;
pub const REQUEST_TIMEOUT: u64 = 45000;

/// Album cache defaults
pub const CACHE_TTL: u64 = 600_000;
pub const CACHE_SWEEP: u64 = 60_000;

/// Wrapper over env::var to return an invalid enviroment var error
fn env_check(s: &str) -> Result<String, ResolverError> {
    match std::env::var(s) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ResolverError::Config(format!("{s} was not set"))),
    }
}

fn env_or(s: &str, default: &str) -> String {
    match std::env::var(s) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string()
    }
}

fn env_to_u64(s: &str, default: u64) -> u64 {
    match std::env::var(s) {
        Ok(s) => s.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default
    }
}

/// Values that do not fit a u32 fall back to `default` instead of wrapping
fn fit_u32(value: u64, default: u32) -> u32 {
    u32::try_from(value).unwrap_or(default)
}

fn env_to_u32(s: &str, default: u32) -> u32 {
    fit_u32(env_to_u64(s, u64::from(default)), default)
}

/// Ensures that url is https
fn ensure_https(url: &Url) -> Result<(), String> {
    if url.scheme() == "https" {
        Ok(())
    } else {
        Err(format!("URL must be https: {url}"))
    }
}

fn ensure_host(url: &Url, expected_host: &str) -> Result<(), String> {
    match url.host_str() {
        Some(h) if h.eq_ignore_ascii_case(expected_host) => Ok(()),
        Some(h) => Err(
            format!("Unexpected host for {url} (got {h}, expected {expected_host})")
        ),
        None => Err(format!("URL missing host: {url}"))
    }
}

/// Parses a base url from env (or default), checks scheme and host, and
/// guarantees a trailing slash so that `join` appends rather than replaces
fn base_url(var: &str, default: &str, expected_host: &str) -> Result<Url, ResolverError> {
    let raw = env_or(var, default);
    let mut url = Url::parse(&raw)
        .map_err(|e| ResolverError::Config(format!("{var} invalid {e}")))?;

    ensure_https(&url).map_err(ResolverError::Config)?;
    ensure_host(&url, expected_host).map_err(ResolverError::Config)?;

    if !url.path().ends_with('/') {
        let mut path = url.path().to_string();
        path.push('/');
        url.set_path(&path);
    }
    Ok(url)
}

/// Identity expected by musicbrainz
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub user_agent: String,
}

fn build_identity() -> IdentityConfig {
    let default_agent = format!(
        "rs-album-resolver/{} (album-resolver)", env!("CARGO_PKG_VERSION")
    );

    // both halves are needed for a useful agent, else fall back
    let user_agent = match (env_check("APPLICATION"), env_check("MUSIC_BRAINZ_HEADER")) {
        (Ok(application), Ok(header)) => format!("{application} {header}"),
        _ => default_agent
    };
    IdentityConfig { user_agent }
}

/// Primary open catalog
#[derive(Debug, Clone)]
pub struct ItunesConfig {
    pub base_url: Url,
    pub country: Option<String>,
}

fn build_itunes() -> Result<ItunesConfig, ResolverError> {
    let base_url = base_url(
        "ITUNES_BASE_URL", "https://itunes.apple.com/", "itunes.apple.com"
    )?;
    let country = std::env::var("ITUNES_COUNTRY").ok()
        .filter(|c| !c.trim().is_empty());
    Ok( ItunesConfig { base_url, country } )
}

/// Cross-platform link resolution (song.link)
#[derive(Debug, Clone)]
pub struct OdesliConfig {
    pub base_url: Url,
    pub user_country: String,
    pub timeout: time::Duration,
}

fn build_odesli() -> Result<OdesliConfig, ResolverError> {
    let base_url = base_url(
        "ODESLI_BASE_URL", "https://api.song.link/v1-alpha.1/", "api.song.link"
    )?;
    let user_country = env_or("ODESLI_USER_COUNTRY", "US");
    let timeout = time::Duration::from_millis(
        env_to_u64("ODESLI_TIMEOUT_MS", ODESLI_TIMEOUT)
    );
    Ok( OdesliConfig { base_url, user_country, timeout } )
}

/// Secondary open catalog, only used as a bridge into odesli
#[derive(Debug, Clone)]
pub struct DeezerConfig {
    pub base_url: Url,
    pub timeout: time::Duration,
}

fn build_deezer() -> Result<DeezerConfig, ResolverError> {
    let base_url = base_url(
        "DEEZER_BASE_URL", "https://api.deezer.com/", "api.deezer.com"
    )?;
    let timeout = time::Duration::from_millis(DEEZER_TIMEOUT);
    Ok( DeezerConfig { base_url, timeout } )
}

///
/// Configuration for musicbrainz api
///
#[derive(Debug, Clone)]
pub struct MusicBrainzConfig {
    pub base_url: Url,         // https://musicbrainz.org/ws/2/
    pub group_limit: u32,      // default 3
    pub release_limit: u32,    // default 10
    pub timeout: time::Duration
}

fn build_musicbrainz() -> Result<MusicBrainzConfig, ResolverError> {

    let base_url = base_url(
        "MB_BASE_URL", "https://musicbrainz.org/ws/2/", "musicbrainz.org"
    )?;

    let group_limit   = env_to_u32("MB_GROUP_LIMIT", 3);
    let release_limit = env_to_u32("MB_RELEASE_LIMIT", 10);

    Ok( MusicBrainzConfig {
        base_url,
        group_limit,
        release_limit,
        timeout: time::Duration::from_millis(MB_TIMEOUT),
    })
}

#[derive(Debug, Clone)]
pub struct LastFmConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub timeout: time::Duration
}

fn build_lastfm() -> Result<LastFmConfig, ResolverError> {
    let base_url = base_url(
        "LASTFM_BASE_URL", "https://ws.audioscrobbler.com/2.0/", "ws.audioscrobbler.com"
    )?;

    // only the artist flow needs a key
    let api_key = env_check("LASTFM_API_KEY").ok();

    Ok(LastFmConfig {
        base_url,
        api_key,
        timeout: time::Duration::from_millis(LASTFM_TIMEOUT)
    })
}

///
/// Configuration for what counts as the target platform and how long
/// resolution is allowed to take
///
#[derive(Debug, Clone)]
pub struct ResolveConfig {
    pub target_platform: String,        // key in odesli linksByPlatform
    pub target_album_marker: String,    // substring of a direct album url
    pub track_timeout: time::Duration,
    pub request_timeout: time::Duration
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            target_platform: "spotify".to_string(),
            target_album_marker: "open.spotify.com/album".to_string(),
            track_timeout: time::Duration::from_millis(TRACK_TIMEOUT),
            request_timeout: time::Duration::from_millis(REQUEST_TIMEOUT),
        }
    }
}

fn build_resolve() -> ResolveConfig {
    let mut cfg = ResolveConfig::default();
    cfg.request_timeout = time::Duration::from_millis(
        env_to_u64("REQUEST_TIMEOUT_MS", REQUEST_TIMEOUT)
    );
    cfg
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: time::Duration,
    pub sweep_interval: time::Duration
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: time::Duration::from_millis(CACHE_TTL),
            sweep_interval: time::Duration::from_millis(CACHE_SWEEP)
        }
    }
}

fn build_cache() -> CacheConfig {
    CacheConfig {
        ttl: time::Duration::from_millis(env_to_u64("CACHE_TTL_MS", CACHE_TTL)),
        sweep_interval: time::Duration::from_millis(
            env_to_u64("CACHE_SWEEP_MS", CACHE_SWEEP).max(1)
        ),
    }
}

///
/// Configuration for Http timeouts, pools, etc.
///
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: time::Duration,
    pub connect_timeout: time::Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: time::Duration,
    pub max_redirects: u8,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: time::Duration::from_millis(HTTP_TIMEOUT),
            connect_timeout: time::Duration::from_millis(HTTP_CONNECT_TIMEOUT),
            pool_max_idle_per_host: HTTP_POOL_MAX_IDLE,
            pool_idle_timeout: time::Duration::from_millis(HTTP_POOL_IDLE_TIMEOUT),
            max_redirects: HTTP_MAX_REDIRECTS,
        }
    }
}

///
/// Configuration for Logger
///

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter_directives: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub include_file_line: bool,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter_directives: "info,rs_album_resolver=debug,reqwest=warn".to_string(),
            format: LogFormat::Json,
            with_ansi: true,
            include_file_line: true,
            include_target: true,
        }
    }
}

fn build_logging() -> LoggingConfig {
    let mut cfg = LoggingConfig::default();
    if env_or("LOG_FORMAT", "json").eq_ignore_ascii_case("pretty") {
        cfg.format = LogFormat::Pretty;
    }
    cfg
}

///
/// AppConfig which holds everything the clients and resolver need
///
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub identity: IdentityConfig,
    pub itunes: ItunesConfig,
    pub odesli: OdesliConfig,
    pub deezer: DeezerConfig,
    pub musicbrainz: MusicBrainzConfig,
    pub lastfm: LastFmConfig,
    pub resolve: ResolveConfig,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig
}

///
/// Return all environment variables to caller at program start.
///
pub fn load_config() -> Result<AppConfig, ResolverError> {
    dotenvy::dotenv().ok();

    let identity    = build_identity();
    let itunes      = build_itunes()?;
    let odesli      = build_odesli()?;
    let deezer      = build_deezer()?;
    let musicbrainz = build_musicbrainz()?;
    let lastfm      = build_lastfm()?;
    let resolve     = build_resolve();
    let cache       = build_cache();
    let http        = HttpConfig::default();
    let logging     = build_logging();

    Ok( AppConfig {
        identity, itunes, odesli, deezer, musicbrainz, lastfm,
        resolve, cache, http, logging
    } )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_is_required() {
        let url = Url::parse("http://itunes.apple.com/").unwrap();
        assert!(ensure_https(&url).is_err());
        let url = Url::parse("https://itunes.apple.com/").unwrap();
        assert!(ensure_https(&url).is_ok());
    }

    #[test]
    fn host_mismatch_is_rejected() {
        let url = Url::parse("https://evil.example.com/ws/2/").unwrap();
        let err = ensure_host(&url, "musicbrainz.org").unwrap_err();
        assert!(err.contains("expected musicbrainz.org"));
        assert!(ensure_host(&url, "EVIL.example.com").is_ok());
    }

    #[test]
    fn defaults_match_documented_budgets() {
        let cache = CacheConfig::default();
        assert_eq!(cache.ttl, time::Duration::from_millis(600_000));

        let resolve = ResolveConfig::default();
        assert_eq!(resolve.target_platform, "spotify");
        assert_eq!(resolve.track_timeout, time::Duration::from_secs(15));
    }

    #[test]
    fn oversized_limits_fall_back_instead_of_wrapping() {
        assert_eq!(fit_u32(7, 3), 7);
        assert_eq!(fit_u32(u64::from(u32::MAX), 3), u32::MAX);
        assert_eq!(fit_u32(u64::from(u32::MAX) + 4, 3), 3);
        assert_eq!(env_to_u32("RS_ALBUM_RESOLVER_UNSET_LIMIT", 10), 10);
    }

    #[test]
    fn default_base_urls_keep_trailing_slash() {
        let url = base_url(
            "RS_ALBUM_RESOLVER_UNSET_VAR", "https://api.song.link/v1-alpha.1",
            "api.song.link"
        ).unwrap();
        assert_eq!(url.as_str(), "https://api.song.link/v1-alpha.1/");
        assert_eq!(url.join("links").unwrap().path(), "/v1-alpha.1/links");
    }
}
