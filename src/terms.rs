//! Fixed DVB-I term identifiers
//!
//! These are the classification scheme terms that the rule checks compare
//! against directly, as opposed to the large vocabularies loaded at runtime
//! into [`crate::reference`] stores.

#![allow(missing_docs)]

// HowRelatedCS
pub const BANNER_OUTSIDE_AVAILABILITY: &str = "urn:dvb:metadata:cs:HowRelatedCS:2019:1000.1";
pub const BANNER_CONTENT_FINISHED: &str = "urn:dvb:metadata:cs:HowRelatedCS:2020:1000.2";
pub const LOGO_SERVICE_LIST: &str = "urn:dvb:metadata:cs:HowRelatedCS:2019:1001.1";
pub const LOGO_SERVICE: &str = "urn:dvb:metadata:cs:HowRelatedCS:2019:1001.2";
pub const LOGO_CG_PROVIDER: &str = "urn:dvb:metadata:cs:HowRelatedCS:2019:1002.1";
pub const PROMOTIONAL_STILL_IMAGE: &str = "urn:tva:metadata:cs:HowRelatedCS:2012:19";

// LinkedApplicationCS
pub const APP_IN_PARALLEL: &str = "urn:dvb:metadata:cs:LinkedApplicationCS:2019:1.1";
pub const APP_IN_CONTROL: &str = "urn:dvb:metadata:cs:LinkedApplicationCS:2019:1.2";
pub const APP_OUTSIDE_AVAILABILITY: &str = "urn:dvb:metadata:cs:LinkedApplicationCS:2019:2";
pub const APP_SERVICE_LIST_AGREEMENT: &str = "urn:dvb:metadata:cs:LinkedApplicationCS:2024:3";

// MPEG-7 FileFormatCS
pub const JPEG_IMAGE_CS: &str = "urn:mpeg:mpeg7:cs:FileFormatCS:2001:1";
pub const PNG_IMAGE_CS: &str = "urn:mpeg:mpeg7:cs:FileFormatCS:2001:15";

// Image MIME types
pub const JPEG_MIME: &str = "image/jpeg";
pub const PNG_MIME: &str = "image/png";
pub const WEBP_MIME: &str = "image/webp";

/// Image types a logo must offer at least one of
pub const REQUIRED_IMAGE_MIMES: &[&str] = &[JPEG_MIME, PNG_MIME];
/// Image types permitted only next to a required one
pub const OPTIONAL_IMAGE_MIMES: &[&str] = &[WEBP_MIME];

// Signalled application content types
pub const XML_AIT_CONTENT_TYPE: &str = "application/vnd.dvb.ait+xml";
pub const HTML5_APP_CONTENT_TYPE: &str = "text/html";
pub const XHTML_APP_CONTENT_TYPE: &str = "application/xhtml+xml";
pub const HBBTV_APP_CONTENT_TYPE: &str = "application/vnd.hbbtv.xhtml+xml";

/// Content types permitted for a signalled application
pub const APPLICATION_CONTENT_TYPES: &[&str] = &[
    XML_AIT_CONTENT_TYPE,
    HTML5_APP_CONTENT_TYPE,
    XHTML_APP_CONTENT_TYPE,
    HBBTV_APP_CONTENT_TYPE,
];

// Source types
pub const SOURCE_DVB_T: &str = "urn:dvb:metadata:source:dvb-t";
pub const SOURCE_DVB_S: &str = "urn:dvb:metadata:source:dvb-s";
pub const SOURCE_DVB_C: &str = "urn:dvb:metadata:source:dvb-c";
pub const SOURCE_DVB_IPTV: &str = "urn:dvb:metadata:source:dvb-iptv";
pub const SOURCE_DVB_DASH: &str = "urn:dvb:metadata:source:dvb-dash";
pub const SOURCE_APPLICATION: &str = "urn:dvb:metadata:source:application";

// DASH
pub const DASH_CONTENT_TYPE: &str = "application/dash+xml";

// Content protection identifier prefixes
pub const CA_SYSTEM_ID_PREFIX: &str = "urn:dvb:casystemid:";
pub const DRM_SYSTEM_ID_PREFIX: &str = "urn:uuid:";

// NVOD modes
pub const NVOD_REFERENCE: &str = "reference";
pub const NVOD_TIMESHIFTED: &str = "timeshifted";

// Satellite modulation systems
pub const DVB_S: &str = "DVB-S";
pub const DVB_S2: &str = "DVB-S2";
pub const DVB_S2X: &str = "DVB-S2X";
