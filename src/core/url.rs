//! Request URL construction.
//!
//! Every URL sent to a service goes through here so the response format and
//! query parameters are always set the same way.

use url::Url;
use url::form_urlencoded;

use crate::core::models::QueryOptions;
use crate::error::RequestError;

/// Query parameter selecting the response format.
pub const FORMAT_PARAM: &str = "f";

/// Response format forced on every request.
pub const FORCED_FORMAT: &str = "pjson";

/// Parse `raw` as an absolute http(s) URL.
///
/// # Errors
/// Returns `RequestError::InvalidUrl` for blank, relative, or non-http input.
pub fn parse_http_url(raw: &str) -> Result<Url, RequestError> {
    let invalid = || RequestError::InvalidUrl {
        input: raw.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(invalid()),
    }
}

/// Add or overwrite `f=pjson` on `raw`.
///
/// # Errors
/// Returns `RequestError::InvalidUrl` when `raw` is not an absolute http(s) URL.
pub fn with_forced_format(raw: &str) -> Result<String, RequestError> {
    let mut url = parse_http_url(raw)?;
    set_params(&mut url, &[(FORMAT_PARAM, FORCED_FORMAT)]);
    Ok(url.into())
}

/// URL of a layer or table: the service URL without trailing slashes, then `/<id>`.
#[must_use]
pub fn layer_url(service_url: &str, layer_id: impl std::fmt::Display) -> String {
    format!("{}/{layer_id}", service_url.trim_end_matches('/'))
}

/// Query URL for a record preview of one layer.
///
/// Parameters are set in a fixed order: `where`, `outFields`, `returnGeometry`,
/// `resultRecordCount`, `f`.
///
/// # Errors
/// Returns `RequestError::InvalidUrl` when the service URL is not an absolute
/// http(s) URL.
pub fn preview_query_url(
    service_url: &str,
    layer_id: impl std::fmt::Display,
    options: &QueryOptions,
) -> Result<String, RequestError> {
    let mut url = parse_http_url(&layer_url(service_url, layer_id))?;

    let path = format!("{}/query", url.path().trim_end_matches('/'));
    url.set_path(&path);

    let count = options.record_count().to_string();
    set_params(
        &mut url,
        &[
            ("where", options.where_clause()),
            ("outFields", "*"),
            ("returnGeometry", "false"),
            ("resultRecordCount", &count),
            (FORMAT_PARAM, FORCED_FORMAT),
        ],
    );
    Ok(url.into())
}

/// Origin and path of `raw` with trailing slashes removed.
///
/// Input that does not parse is returned unchanged.
#[must_use]
pub fn strip_query(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return raw.to_string();
    };
    url.set_query(None);
    url.set_fragment(None);
    String::from(url).trim_end_matches('/').to_string()
}

/// Percent-encode a query component, with `%20` for spaces.
fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Set each `(key, value)` on the query string.
///
/// An existing key keeps its position and later duplicates are dropped;
/// new keys are appended in the order given.
fn set_params(url: &mut Url, params: &[(&str, &str)]) {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for (key, value) in params {
        match pairs.iter().position(|(k, _)| k == key) {
            Some(first) => {
                pairs[first].1 = (*value).to_string();
                let mut index = 0;
                pairs.retain(|(k, _)| {
                    let keep = index <= first || k != key;
                    index += 1;
                    keep
                });
            }
            None => pairs.push(((*key).to_string(), (*value).to_string())),
        }
    }

    let query = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&");
    url.set_query(Some(&query));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::QueryOptions;

    const SERVICE: &str = "https://x/arcgis/rest/services/Census/MapServer";

    #[test]
    fn forced_format_is_appended() {
        let url = with_forced_format(&format!("  {SERVICE}  ")).unwrap();
        assert_eq!(url, format!("{SERVICE}?f=pjson"));
    }

    #[test]
    fn forced_format_overwrites_in_place() {
        let url = with_forced_format(&format!("{SERVICE}?f=html&token=&f=json&x=1")).unwrap();
        assert_eq!(url, format!("{SERVICE}?f=pjson&token=&x=1"));
    }

    #[test]
    fn invalid_urls_are_rejected() {
        for raw in ["", "   ", "not a url", "/relative/path", "ftp://x/MapServer", "mailto:a@b"] {
            let err = with_forced_format(raw).unwrap_err();
            assert!(
                matches!(err, RequestError::InvalidUrl { .. }),
                "{raw:?} gave {err:?}"
            );
            assert_eq!(
                err.to_string(),
                "Invalid URL. Paste a full URL starting with http:// or https://"
            );
        }
    }

    #[test]
    fn layer_url_ignores_trailing_slashes() {
        assert_eq!(layer_url("https://x/MapServer///", 3), "https://x/MapServer/3");
        assert_eq!(layer_url("https://x/MapServer", 0), "https://x/MapServer/0");
    }

    #[test]
    fn preview_url_sets_params_in_order() {
        let options = QueryOptions::new("POP > 1000", 250.0);
        let url = preview_query_url("https://x/MapServer/", 3, &options).unwrap();
        assert_eq!(
            url,
            "https://x/MapServer/3/query?where=POP%20%3E%201000&outFields=*\
             &returnGeometry=false&resultRecordCount=100&f=pjson"
        );
    }

    #[test]
    fn preview_url_defaults() {
        let url = preview_query_url(SERVICE, 1, &QueryOptions::default()).unwrap();
        assert!(url.ends_with(
            "/MapServer/1/query?where=1%3D1&outFields=*&returnGeometry=false&resultRecordCount=5&f=pjson"
        ));
    }

    #[test]
    fn preview_url_encodes_quotes_and_plus() {
        let options = QueryOptions::new("NAME = 'A+B'", 5.0);
        let url = preview_query_url(SERVICE, 1, &options).unwrap();
        assert!(url.contains("where=NAME%20%3D%20%27A%2BB%27&"), "{url}");
    }

    #[test]
    fn strip_query_keeps_origin_and_path() {
        assert_eq!(
            strip_query(&format!("{SERVICE}/?f=pjson#top")),
            SERVICE.to_string()
        );
        assert_eq!(strip_query("not a url"), "not a url");
    }
}
