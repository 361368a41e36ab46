//!
//! src/normalize.rs  Andrew Belles  Oct 18th, 2025
//!
//! Turns free-form user input (ids, web urls, uris, search text) into
//! cache keys and canonical spotify references
//!

use url::Url;

pub const SPOTIFY_WEB: &str = "https://open.spotify.com";

/// Length of a bare spotify base62 id
const SPOTIFY_ID_LEN: usize = 22;

/// Byte span of the first non-empty ascii alphanumeric run that directly
/// follows `marker`. Both strings are searched as given, callers fold case.
fn token_span(haystack: &str, marker: &str) -> Option<(usize, usize)> {
    haystack.match_indices(marker).find_map(|(i, m)| {
        let start = i + m.len();
        let rest = &haystack[start..];
        let len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        (len > 0).then_some((start, start + len))
    })
}

fn token_after<'a>(haystack: &'a str, marker: &str) -> Option<&'a str> {
    token_span(haystack, marker).map(|(start, end)| &haystack[start..end])
}

/// Same as token_after but `<scheme>:<kind>:<token>`, scheme being at
/// least one ascii letter
fn uri_token<'a>(haystack: &'a str, kind: &str) -> Option<&'a str> {
    let marker = format!(":{kind}:");
    haystack.match_indices(marker.as_str()).find_map(|(i, m)| {
        let has_scheme = haystack[..i]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphabetic());
        if !has_scheme {
            return None;
        }
        token_after(&haystack[i..], m)
    })
}

/// Canonical cache key for any album reference or search text.
///
/// `/album/<token>` wins over `<scheme>:album:<token>`, which wins over the
/// whole input; the result is always lower-cased so the function is
/// idempotent and an id, its url, and its uri land on the same key.
pub fn normalize(input: &str) -> String {
    let lowered = input.to_lowercase();
    if let Some(token) = token_after(&lowered, "/album/") {
        return token.to_string();
    }
    if let Some(token) = uri_token(&lowered, "album") {
        return token.to_string();
    }
    lowered
}

fn is_bare_id(s: &str) -> bool {
    s.len() == SPOTIFY_ID_LEN && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Extracts a spotify id of `kind` from a web url or uri, keeping its case.
/// Ascii folding keeps byte offsets identical so the slice comes from input.
fn spotify_ref<'a>(input: &'a str, kind: &str) -> Option<&'a str> {
    let folded = input.to_ascii_lowercase();

    let web = format!("open.spotify.com/{kind}/");
    let uri = format!("spotify:{kind}:");
    for marker in [web, uri] {
        if let Some((start, end)) = token_span(&folded, &marker) {
            return Some(&input[start..end]);
        }
    }
    None
}

/// Returns the album id when the query names a spotify album directly:
/// a web url, a `spotify:album:` uri, or a bare 22 character id
pub fn parse_album_id(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if let Some(id) = spotify_ref(trimmed, "album") {
        return Some(id.to_string());
    }
    is_bare_id(trimmed).then(|| trimmed.to_string())
}

pub fn album_url(id: &str) -> String {
    format!("{SPOTIFY_WEB}/album/{id}")
}

/// `https://open.spotify.com/artist/<id>` if the query carries an artist url
pub fn parse_artist_url(query: &str) -> Option<String> {
    spotify_ref(query.trim(), "artist").map(|id| format!("{SPOTIFY_WEB}/artist/{id}"))
}

/// `https://open.spotify.com/playlist/<id>` if the query carries a playlist url
pub fn parse_playlist_url(query: &str) -> Option<String> {
    spotify_ref(query.trim(), "playlist").map(|id| format!("{SPOTIFY_WEB}/playlist/{id}"))
}

/// Spotify web search page for `query`, scoped to `kind` (artists, playlists)
pub fn search_url(query: &str, kind: &str) -> String {
    let base = format!("{SPOTIFY_WEB}/search");
    match Url::parse(&base) {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.push(query).push(kind);
            }
            url.to_string()
        }
        Err(_) => format!("{base}/{query}/{kind}")
    }
}
