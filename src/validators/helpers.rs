//! Lexical format predicates
//!
//! Every function here is total: malformed input yields `false` (or `None`),
//! never a panic. Registry membership is not checked here; see
//! [`reference`](crate::reference).

use crate::terms::{OPTIONAL_IMAGE_MIMES, REQUIRED_IMAGE_MIMES};
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::net::Ipv4Addr;
use url::Url;

// =============================================================================
// Patterns
// =============================================================================

static URN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^urn:[a-z0-9][a-z0-9-]{0,31}:[a-z0-9()+,\-.:=@;$_!*'%/?#]+$").unwrap()
});

static DOMAIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]([a-z0-9-]{0,61}[a-z0-9])?$")
        .unwrap()
});

static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?P(\d+Y)?(\d+M)?(\d+W)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$").unwrap()
});

static DVB_LOCATOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^dvb://[0-9a-fA-F]{1,4}\.[0-9a-fA-F]{0,4}\.[0-9a-fA-F]{1,4}(;[0-9a-fA-F]{1,4})?$")
        .unwrap()
});

static POSTCODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Z]+(-[0-9A-Z]+)?$").unwrap());

static WILDCARD_POSTCODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9A-Z]+\*[0-9A-Z]*|[0-9A-Z]*\*[0-9A-Z]+)$").unwrap());

static RATIO_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+:\d+$").unwrap());

static FRAME_RATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,3}(\.[0-9]{1,3})?|[0-9]{1,3}/1\.001)$").unwrap());

static LANGUAGE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(",
        r"([a-z]{2,3}(-[a-z]{3}){0,3}|[a-z]{4}|[a-z]{5,8})",
        r"(-[a-z]{4})?",
        r"(-([a-z]{2}|[0-9]{3}))?",
        r"(-([a-z0-9]{5,8}|[0-9][a-z0-9]{3}))*",
        r"(-[0-9a-wyz](-[a-z0-9]{2,8})+)*",
        r"(-x(-[a-z0-9]{1,8})+)?",
        r"|x(-[a-z0-9]{1,8})+",
        r"|i-[a-z]{2,8}",
        r")$"
    ))
    .unwrap()
});

static TAG_URI_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^tag:([a-zA-Z0-9\-.]+|[^@\s,]+@[a-zA-Z0-9\-.]+),\d{4}(-\d{2}(-\d{2})?)?:\S*$")
        .unwrap()
});

static CRID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^crid://[^/\s]+/\S+$").unwrap());

// =============================================================================
// URLs and identifiers
// =============================================================================

/// An absolute `http` or `https` URL with a host
pub fn is_http_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// A URN in RFC 8141 syntax
pub fn is_urn(value: &str) -> bool {
    URN_REGEX.is_match(value)
}

/// A URL or a URN
pub fn is_uri(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    is_urn(value) || Url::parse(value).is_ok()
}

/// An `rtsp` URL with a host
pub fn is_rtsp_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => url.scheme() == "rtsp" && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// A fully qualified domain name
pub fn is_domain_name(value: &str) -> bool {
    value.len() <= 253 && DOMAIN_REGEX.is_match(value)
}

/// An RFC 4151 `tag:` URI, as used for service identifiers
pub fn is_tag_uri(value: &str) -> bool {
    TAG_URI_REGEX.is_match(value)
}

/// A TV-Anytime content reference identifier
pub fn is_crid(value: &str) -> bool {
    CRID_REGEX.is_match(value)
}

/// A DVB locator, `dvb://onid.[tsid].sid[;event]` in hex
pub fn is_dvb_locator(value: &str) -> bool {
    DVB_LOCATOR_REGEX.is_match(value)
}

/// Only ASCII characters
pub fn is_ascii(value: &str) -> bool {
    value.is_ascii()
}

/// A dotted-quad IPv4 multicast address
pub fn is_ipv4_multicast(value: &str) -> bool {
    value
        .parse::<Ipv4Addr>()
        .map(|addr| addr.is_multicast())
        .unwrap_or(false)
}

// =============================================================================
// Dates and times
// =============================================================================

/// An ISO 8601 date-time in UTC, written with a `Z` designator
pub fn is_utc_datetime(value: &str) -> bool {
    value.ends_with('Z') && DateTime::parse_from_rfc3339(value).is_ok()
}

/// An ISO 8601 duration such as `PT1H30M`
pub fn is_iso_duration(value: &str) -> bool {
    DURATION_REGEX.is_match(value)
        && !value.ends_with('P')
        && !value.ends_with('T')
        && value.chars().any(|c| c.is_ascii_digit())
}

// =============================================================================
// Regions
// =============================================================================

/// A postcode, optionally with one hyphenated part
pub fn is_postcode(value: &str) -> bool {
    POSTCODE_REGEX.is_match(value)
}

/// A postcode with a single `*` wildcard
pub fn is_wildcard_postcode(value: &str) -> bool {
    WILDCARD_POSTCODE_REGEX.is_match(value)
}

/// A latitude in degrees
pub fn is_latitude(value: &str) -> bool {
    in_decimal_range(value, Decimal::from(-90), Decimal::from(90))
}

/// A longitude in degrees
pub fn is_longitude(value: &str) -> bool {
    in_decimal_range(value, Decimal::from(-180), Decimal::from(180))
}

fn in_decimal_range(value: &str, lo: Decimal, hi: Decimal) -> bool {
    match value.trim().parse::<Decimal>() {
        Ok(d) => d >= lo && d <= hi,
        Err(_) => false,
    }
}

// =============================================================================
// Media
// =============================================================================

/// A MIME type accepted for images
pub fn is_allowed_image_mime(value: &str) -> bool {
    REQUIRED_IMAGE_MIMES.contains(&value) || OPTIONAL_IMAGE_MIMES.contains(&value)
}

/// A ratio such as `16:9`
pub fn is_ratio(value: &str) -> bool {
    RATIO_REGEX.is_match(value)
}

/// A frame rate, decimal (`25`, `29.97`) or NTSC style (`30/1.001`)
pub fn is_frame_rate(value: &str) -> bool {
    if !FRAME_RATE_REGEX.is_match(value) {
        return false;
    }
    let numerator = value.split('/').next().unwrap_or(value);
    numerator
        .parse::<Decimal>()
        .map(|d| d > Decimal::ZERO)
        .unwrap_or(false)
}

/// The lexical shape of a BCP 47 language tag
pub fn is_language_tag_syntax(value: &str) -> bool {
    LANGUAGE_TAG_REGEX.is_match(value)
}

// =============================================================================
// Conversions
// =============================================================================

/// Parse a number written in decimal, or in hex with or without `0x`
pub fn parse_dec_or_hex(value: &str) -> Option<u32> {
    let value = value.trim();
    if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        return u32::from_str_radix(hex, 16).ok();
    }
    value
        .parse::<u32>()
        .ok()
        .or_else(|| u32::from_str_radix(value, 16).ok())
}

/// Interpret an `xs:boolean` value
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_urls() {
        assert!(is_http_url("https://example.com/logo.png"));
        assert!(is_http_url("http://example.com"));
        assert!(!is_http_url("ftp://example.com/x"));
        assert!(!is_http_url("example.com"));
        assert!(is_rtsp_url("rtsp://192.0.2.1:554/stream"));
        assert!(!is_rtsp_url("http://192.0.2.1/stream"));
    }

    #[test]
    fn test_uris() {
        assert!(is_urn("urn:dvb:metadata:cs:HowRelatedCS:2019:1001.1"));
        assert!(!is_urn("urn:"));
        assert!(is_uri("urn:dvb:casystemid:1234"));
        assert!(is_uri("https://example.com/a?b=c"));
        assert!(!is_uri("not a uri"));
    }

    #[test]
    fn test_identifiers() {
        assert!(is_tag_uri("tag:example.com,2021:service1"));
        assert!(is_tag_uri("tag:user@example.com,2021-03-04:x"));
        assert!(!is_tag_uri("tag:example.com:service1"));
        assert!(is_crid("crid://example.com/programme/1"));
        assert!(!is_crid("crid://example.com"));
        assert!(is_domain_name("dvb.example.org"));
        assert!(!is_domain_name("-bad.example"));
        assert!(is_dvb_locator("dvb://233a.1004.1080"));
        assert!(is_dvb_locator("dvb://233a..1080;1f3"));
        assert!(!is_dvb_locator("dvb://233a.1004"));
    }

    #[test]
    fn test_times() {
        assert!(is_utc_datetime("2024-05-01T10:00:00Z"));
        assert!(!is_utc_datetime("2024-05-01T10:00:00+01:00"));
        assert!(!is_utc_datetime("yesterday"));
        assert!(is_iso_duration("PT1H30M"));
        assert!(is_iso_duration("P1D"));
        assert!(!is_iso_duration("P"));
        assert!(!is_iso_duration("PT"));
        assert!(!is_iso_duration("1H"));
    }

    #[test]
    fn test_postcodes() {
        assert!(is_postcode("SW1A"));
        assert!(is_postcode("1234-567"));
        assert!(!is_postcode("SW1A 1AA"));
        assert!(is_wildcard_postcode("SW1*"));
        assert!(is_wildcard_postcode("*1AA"));
        assert!(!is_wildcard_postcode("SW1"));
        assert!(!is_wildcard_postcode("*"));
    }

    #[test]
    fn test_media() {
        assert!(is_allowed_image_mime("image/png"));
        assert!(is_allowed_image_mime("image/webp"));
        assert!(!is_allowed_image_mime("image/gif"));
        assert!(is_ratio("16:9"));
        assert!(!is_ratio("16/9"));
        assert!(is_frame_rate("25"));
        assert!(is_frame_rate("29.97"));
        assert!(is_frame_rate("30/1.001"));
        assert!(!is_frame_rate("0"));
        assert!(!is_frame_rate("30/1"));
    }

    #[test]
    fn test_language_tag_syntax() {
        assert!(is_language_tag_syntax("en"));
        assert!(is_language_tag_syntax("en-GB"));
        assert!(is_language_tag_syntax("zh-Hant-TW"));
        assert!(is_language_tag_syntax("sgn-bfi"));
        assert!(!is_language_tag_syntax("e"));
        assert!(!is_language_tag_syntax("en_GB"));
        assert!(!is_language_tag_syntax("en-"));
    }

    #[test]
    fn test_parse_dec_or_hex() {
        assert_eq!(parse_dec_or_hex("0x1F"), Some(31));
        assert_eq!(parse_dec_or_hex("256"), Some(256));
        assert_eq!(parse_dec_or_hex("01FF"), Some(0x1FF));
        assert_eq!(parse_dec_or_hex("0xZZ"), None);
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("yes"), None);
    }

    #[test]
    fn test_coordinates_and_multicast() {
        assert!(is_latitude("51.5"));
        assert!(!is_latitude("91"));
        assert!(is_longitude("-179.99"));
        assert!(is_ipv4_multicast("239.1.1.1"));
        assert!(!is_ipv4_multicast("192.0.2.1"));
    }

    proptest! {
        #[test]
        fn predicates_are_total(s in "\\PC*") {
            let _ = is_http_url(&s);
            let _ = is_uri(&s);
            let _ = is_rtsp_url(&s);
            let _ = is_domain_name(&s);
            let _ = is_utc_datetime(&s);
            let _ = is_iso_duration(&s);
            let _ = is_dvb_locator(&s);
            let _ = is_postcode(&s);
            let _ = is_wildcard_postcode(&s);
            let _ = is_frame_rate(&s);
            let _ = is_language_tag_syntax(&s);
            let _ = is_tag_uri(&s);
            let _ = parse_dec_or_hex(&s);
            let _ = is_latitude(&s);
        }

        #[test]
        fn decimal_round_trips(n in any::<u32>()) {
            prop_assert_eq!(parse_dec_or_hex(&n.to_string()), Some(n));
            let hex = format!("0x{:X}", n);
            prop_assert_eq!(parse_dec_or_hex(&hex), Some(n));
        }
    }
}
