//! `RelatedMaterial` blocks
//!
//! What a `RelatedMaterial` may signal depends on where it sits (service list,
//! service, service instance, content guide source, programme) and on the
//! schema revision. The `HowRelated@href` is looked up in a gated table for
//! the location; a logo or banner then gets the image checks and a linked
//! application gets the application checks.

use crate::documents::{ElementExt, XmlDocument};
use crate::report::{Finding, Report};
use crate::terms::*;
use crate::validators::helpers::{is_allowed_image_mime, is_ascii, is_http_url};
use crate::validators::validation::{ValidationContext, KEY_MISSING};
use crate::versions::{permitted, recognised, values_for, Gated, VersionRange, SL_V2, SL_V4, SL_V7};
use roxmltree::Node;
use std::fmt;

/// Category key for a `HowRelated@href` not usable at this location
pub const KEY_INVALID_HREF: &str = "invalid href";
/// Category key for image signalling problems
pub const KEY_INVALID_IMAGE: &str = "invalid image";
/// Category key for application signalling problems
pub const KEY_INVALID_APPLICATION: &str = "invalid application";

/// Where a `RelatedMaterial` element appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialLocation {
    /// Directly under `ServiceList`
    ServiceList,
    /// Under `Service`
    Service,
    /// Under `ServiceInstance`
    ServiceInstance,
    /// Under a `ContentGuideSource`
    ContentGuideSource,
    /// Under a programme's `BasicDescription`
    Programme,
}

impl fmt::Display for MaterialLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MaterialLocation::ServiceList => "service list",
            MaterialLocation::Service => "service",
            MaterialLocation::ServiceInstance => "service instance",
            MaterialLocation::ContentGuideSource => "content guide source",
            MaterialLocation::Programme => "programme",
        };
        f.write_str(name)
    }
}

/// What a recognised `HowRelated@href` signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// A still image (logo or banner)
    Image,
    /// A linked application
    Application,
}

/// One row of a location table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signalling {
    /// `HowRelated@href`
    pub href: &'static str,
    /// What it signals
    pub kind: MaterialKind,
}

impl PartialEq<&str> for Signalling {
    fn eq(&self, other: &&str) -> bool {
        self.href == *other
    }
}

const fn image(href: &'static str) -> Signalling {
    Signalling {
        href,
        kind: MaterialKind::Image,
    }
}

const fn application(href: &'static str) -> Signalling {
    Signalling {
        href,
        kind: MaterialKind::Application,
    }
}

const SERVICE_LIST_MATERIAL: &[Gated<Signalling>] = &[
    Gated::any(image(LOGO_SERVICE_LIST)),
    Gated::new(VersionRange::From(SL_V7), application(APP_SERVICE_LIST_AGREEMENT)),
];

const SERVICE_MATERIAL: &[Gated<Signalling>] = &[
    Gated::any(image(LOGO_SERVICE)),
    Gated::any(image(BANNER_OUTSIDE_AVAILABILITY)),
    Gated::new(VersionRange::From(SL_V2), image(BANNER_CONTENT_FINISHED)),
    Gated::any(application(APP_IN_CONTROL)),
    Gated::new(VersionRange::From(SL_V4), application(APP_IN_PARALLEL)),
    Gated::any(application(APP_OUTSIDE_AVAILABILITY)),
];

const CONTENT_GUIDE_SOURCE_MATERIAL: &[Gated<Signalling>] = &[Gated::any(image(LOGO_CG_PROVIDER))];

const PROGRAMME_MATERIAL: &[Gated<Signalling>] = &[Gated::any(image(PROMOTIONAL_STILL_IMAGE))];

impl MaterialLocation {
    /// The signalling table for this location
    pub fn table(self) -> &'static [Gated<Signalling>] {
        match self {
            MaterialLocation::ServiceList => SERVICE_LIST_MATERIAL,
            MaterialLocation::Service | MaterialLocation::ServiceInstance => SERVICE_MATERIAL,
            MaterialLocation::ContentGuideSource => CONTENT_GUIDE_SOURCE_MATERIAL,
            MaterialLocation::Programme => PROGRAMME_MATERIAL,
        }
    }

    /// Classify `href` for this location and schema revision
    pub fn classify(self, href: &str, ordinal: u32) -> Option<MaterialKind> {
        let table = self.table();
        if !permitted(table, ordinal, href) {
            return None;
        }
        table.iter().find(|g| g.value == href).map(|g| g.value.kind)
    }
}

/// Check one `RelatedMaterial` element found at `location`
pub fn check_related_material(
    doc: &XmlDocument,
    ctx: &ValidationContext,
    material: Node,
    location: MaterialLocation,
    code: &str,
    report: &mut Report,
) {
    let Some(how_related) = ctx.required_child(doc, material, "HowRelated", code, report) else {
        return;
    };
    let Some(href) = ctx.required_attribute(doc, how_related, "href", code, report) else {
        return;
    };

    let ordinal = ctx.ordinal();
    match location.classify(href, ordinal) {
        Some(MaterialKind::Image) => {
            let allowed: Vec<&str> = values_for(location.table(), ordinal)
                .into_iter()
                .filter(|s| s.kind == MaterialKind::Image)
                .map(|s| s.href)
                .collect();
            validate_related_material_image(doc, ctx, material, &allowed, code, report);
        }
        Some(MaterialKind::Application) => {
            validate_signalled_application(doc, ctx, material, code, report);
        }
        None => {
            let message = if recognised(location.table(), href) {
                format!(
                    "HowRelated@href=\"{}\" is not permitted for a {} in {}",
                    href, location, ctx.namespace
                )
            } else {
                format!("HowRelated@href=\"{}\" is not valid for a {}", href, location)
            };
            report.add(
                Finding::error(code, message)
                    .with_key(KEY_INVALID_HREF)
                    .at(doc.source_ref(how_related)),
            );
        }
    }
}

/// Check a `RelatedMaterial` that signals an image
///
/// `allowed` lists the `HowRelated@href` values accepted by the caller.
pub fn validate_related_material_image(
    doc: &XmlDocument,
    ctx: &ValidationContext,
    material: Node,
    allowed: &[&str],
    code: &str,
    report: &mut Report,
) {
    let how_related = material.find_children("HowRelated");
    if how_related.len() != 1 {
        report.add(
            Finding::error(code, "exactly one HowRelated is required for an image")
                .with_key(KEY_INVALID_IMAGE)
                .at(doc.source_ref(material)),
        );
        return;
    }
    match how_related[0].attribute("href") {
        Some(href) if allowed.contains(&href) => {}
        other => {
            report.add(
                Finding::error(
                    code,
                    format!(
                        "HowRelated@href=\"{}\" does not signal a permitted image",
                        other.unwrap_or_default()
                    ),
                )
                .with_key(KEY_INVALID_HREF)
                .at(doc.source_ref(how_related[0])),
            );
            return;
        }
    }

    let formats = material.find_children("Format");
    if formats.len() > 1 {
        report.add(
            Finding::error(code, "at most one Format is permitted for an image")
                .with_key(KEY_INVALID_IMAGE)
                .at_all(formats.iter().map(|f| doc.source_ref(*f)).collect()),
        );
    }
    let declared_mime = formats
        .first()
        .and_then(|f| f.first_child_named("StillPictureFormat"))
        .and_then(|spf| {
            let href = spf.attribute("href").unwrap_or_default();
            match href {
                JPEG_IMAGE_CS => Some(JPEG_MIME),
                PNG_IMAGE_CS => Some(PNG_MIME),
                _ => {
                    report.add(
                        Finding::error(code, format!("StillPictureFormat@href=\"{}\" is not a permitted image format", href))
                            .with_key(KEY_INVALID_IMAGE)
                            .at(doc.source_ref(spf)),
                    );
                    None
                }
            }
        });

    let locators = material.find_children("MediaLocator");
    if locators.len() != 1 {
        report.add(
            Finding::error(code, "exactly one MediaLocator is required for an image")
                .with_key(KEY_INVALID_IMAGE)
                .at(doc.source_ref(material)),
        );
        return;
    }
    let Some(_) = ctx.required_child(doc, locators[0], "MediaUri", code, report) else {
        return;
    };

    let mut has_required = false;
    let mut has_optional = false;
    for uri in locators[0].find_children("MediaUri") {
        let mime = uri.attribute("contentType").unwrap_or_default();
        if REQUIRED_IMAGE_MIMES.contains(&mime) {
            has_required = true;
        } else if OPTIONAL_IMAGE_MIMES.contains(&mime) {
            has_optional = true;
        }
        if !is_allowed_image_mime(mime) {
            report.add(
                Finding::error(code, format!("MediaUri@contentType=\"{}\" is not a permitted image type", mime))
                    .with_key(KEY_INVALID_IMAGE)
                    .at(doc.source_ref(uri)),
            );
        }
        if let Some(expected) = declared_mime {
            if is_allowed_image_mime(mime) && mime != expected {
                report.add(
                    Finding::error(
                        code,
                        format!(
                            "MediaUri@contentType=\"{}\" does not match the declared StillPictureFormat ({})",
                            mime, expected
                        ),
                    )
                    .with_key(KEY_INVALID_IMAGE)
                    .at(doc.source_ref(uri)),
                );
            }
        }
        let url = uri.text_content();
        if !is_http_url(url.trim()) {
            report.add(
                Finding::error(code, format!("MediaUri \"{}\" is not a valid HTTP(S) URL", url.trim()))
                    .with_key(KEY_INVALID_IMAGE)
                    .at(doc.source_ref(uri)),
            );
        }
    }

    if !has_required {
        let message = if has_optional {
            format!("{} is only permitted alongside a JPEG or PNG image", WEBP_MIME)
        } else {
            "a JPEG or PNG image is required".to_string()
        };
        report.add(
            Finding::error(code, message)
                .with_key(KEY_INVALID_IMAGE)
                .at(doc.source_ref(locators[0])),
        );
    }
}

/// Check a `RelatedMaterial` that signals a linked application
pub fn validate_signalled_application(
    doc: &XmlDocument,
    ctx: &ValidationContext,
    material: Node,
    code: &str,
    report: &mut Report,
) {
    let Some(locator) = ctx.required_child(doc, material, "MediaLocator", code, report) else {
        return;
    };
    let uris = locator.find_children("MediaUri");
    if uris.is_empty() {
        report.add(
            Finding::error(code, "a MediaUri is required for a linked application")
                .with_key(KEY_MISSING)
                .at(doc.source_ref(locator)),
        );
        return;
    }
    for uri in uris {
        match uri.attribute("contentType") {
            Some(ct) if APPLICATION_CONTENT_TYPES.contains(&ct) => {}
            Some(ct) => report.add(
                Finding::error(code, format!("\"{}\" is not a permitted application content type", ct))
                    .with_key(KEY_INVALID_APPLICATION)
                    .at(doc.source_ref(uri)),
            ),
            None => report.add(
                Finding::error(code, "@contentType is required for an application MediaUri")
                    .with_key(KEY_MISSING)
                    .at(doc.source_ref(uri)),
            ),
        }
        let url = uri.text_content();
        let url = url.trim();
        if !is_ascii(url) {
            report.add(
                Finding::error(code, format!("application URL \"{}\" contains non-ASCII characters", url))
                    .with_key(KEY_INVALID_APPLICATION)
                    .at(doc.source_ref(uri)),
            );
        } else if !is_http_url(url) {
            report.add(
                Finding::error(code, format!("application URL \"{}\" is not a valid HTTP(S) URL", url))
                    .with_key(KEY_INVALID_APPLICATION)
                    .at(doc.source_ref(uri)),
            );
        }
    }
}
