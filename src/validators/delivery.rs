//! Delivery parameters of a service instance
//!
//! `SourceType` says how an instance is delivered and therefore which
//! `*DeliveryParameters` element must be present. Each delivery parameter
//! block then gets its own syntax checks. Satellite delivery is the fiddly
//! one: what `RollOff`, `ModulationType`, `FEC` and `ChannelBonding` may hold
//! depends on the `ModulationSystem`.

use crate::documents::{ElementExt, XmlDocument};
use crate::reference::{ReferenceData, ReferenceStore};
use crate::report::{Finding, Report};
use crate::terms::*;
use crate::validators::helpers::{
    is_domain_name, is_http_url, is_ipv4_multicast, is_rtsp_url, parse_dec_or_hex,
};
use crate::validators::validation::{ValidationContext, KEY_INVALID_VALUE, KEY_MISSING};
use roxmltree::Node;

/// Category key for delivery parameters that do not match the source type
pub const KEY_DELIVERY: &str = "delivery parameters";
/// Category key for a malformed DVB triplet
pub const KEY_TRIPLET: &str = "invalid triplet";
/// Category key for satellite parameters illegal for the modulation system
pub const KEY_MODULATION: &str = "modulation system";
/// Category key for an unregistered CA or DRM system
pub const KEY_CONTENT_PROTECTION: &str = "content protection";

const CODE: &str = "DP001";
const CP_CODE: &str = "CP001";

const DELIVERY_ELEMENTS: &[&str] = &[
    "DVBTDeliveryParameters",
    "DVBSDeliveryParameters",
    "DVBCDeliveryParameters",
    "SATIPDeliveryParameters",
    "RTSPDeliveryParameters",
    "MulticastTSDeliveryParameters",
    "DASHDeliveryParameters",
    "OtherDeliveryParameters",
];

/// Delivery parameter elements acceptable for a source type
fn expected_for(source_type: &str) -> Option<&'static [&'static str]> {
    match source_type {
        SOURCE_DVB_T => Some(&["DVBTDeliveryParameters"]),
        SOURCE_DVB_S => Some(&["DVBSDeliveryParameters"]),
        SOURCE_DVB_C => Some(&["DVBCDeliveryParameters"]),
        SOURCE_DVB_IPTV => Some(&["MulticastTSDeliveryParameters", "RTSPDeliveryParameters"]),
        SOURCE_DVB_DASH => Some(&["DASHDeliveryParameters"]),
        SOURCE_APPLICATION => Some(&[]),
        _ => None,
    }
}

/// Satellite parameter legality for one modulation system
#[derive(Debug, Clone, Copy)]
pub struct ModulationRules {
    /// `ModulationSystem` value
    pub system: &'static str,
    /// Permitted `RollOff` values
    pub roll_off: &'static [&'static str],
    /// Permitted `ModulationType` values, `None` when the element is forbidden
    pub modulation_type: Option<&'static [&'static str]>,
    /// Permitted `FEC` values, `None` when the element is forbidden
    pub fec: Option<&'static [&'static str]>,
    /// Whether `ChannelBonding` may appear
    pub channel_bonding: bool,
}

/// Rules per modulation system
pub const MODULATION_RULES: &[ModulationRules] = &[
    ModulationRules {
        system: DVB_S,
        roll_off: &["0.35"],
        modulation_type: Some(&["QPSK"]),
        fec: Some(&["1/2", "2/3", "3/4", "5/6", "7/8"]),
        channel_bonding: false,
    },
    ModulationRules {
        system: DVB_S2,
        roll_off: &["0.35", "0.25", "0.20"],
        modulation_type: Some(&["QPSK", "8PSK", "16APSK", "32APSK"]),
        fec: Some(&[
            "1/4", "1/3", "2/5", "1/2", "3/5", "2/3", "3/4", "4/5", "5/6", "8/9", "9/10",
        ]),
        channel_bonding: false,
    },
    ModulationRules {
        system: DVB_S2X,
        roll_off: &["0.35", "0.25", "0.20", "0.15", "0.10", "0.05"],
        modulation_type: None,
        fec: None,
        channel_bonding: true,
    },
];

/// Rules for `system`
pub fn modulation_rules(system: &str) -> Option<&'static ModulationRules> {
    MODULATION_RULES.iter().find(|r| r.system == system)
}

/// Check that an instance's delivery parameters match its source type
///
/// `service` is the enclosing `Service`, consulted for application signalling.
pub fn check_delivery(
    doc: &XmlDocument,
    ctx: &ValidationContext,
    instance: Node,
    service: Node,
    report: &mut Report,
) {
    let present: Vec<Node> = instance
        .element_children()
        .into_iter()
        .filter(|n| DELIVERY_ELEMENTS.contains(&n.local_name()))
        .collect();

    if let Some(source) = instance.first_child_named("SourceType") {
        let source_type = source.text_content();
        let source_type = source_type.trim();
        match expected_for(source_type) {
            None => report.add(
                Finding::error(CODE, format!("\"{}\" is not a valid SourceType", source_type))
                    .with_key(KEY_INVALID_VALUE)
                    .at(doc.source_ref(source)),
            ),
            Some([]) => {
                if let Some(first) = present.first() {
                    report.add(
                        Finding::error(
                            CODE,
                            format!("{} is not permitted for an application source", first.local_name()),
                        )
                        .with_key(KEY_DELIVERY)
                        .at(doc.source_ref(*first)),
                    );
                }
                if !signals_application(instance) && !signals_application(service) {
                    report.add(
                        Finding::error(CODE, "an application source requires a linked application")
                            .with_key(KEY_DELIVERY)
                            .at(doc.source_ref(source)),
                    );
                }
            }
            Some(expected) => {
                if !present.iter().any(|n| expected.contains(&n.local_name())) {
                    report.add(
                        Finding::error(
                            CODE,
                            format!("SourceType {} requires {}", source_type, expected.join(" or ")),
                        )
                        .with_key(KEY_DELIVERY)
                        .at(doc.source_ref(source)),
                    );
                }
            }
        }
    } else if present.is_empty() && !signals_application(instance) {
        report.add(
            Finding::error(CODE, "a ServiceInstance requires delivery parameters")
                .with_key(KEY_DELIVERY)
                .at(doc.source_ref(instance)),
        );
    }

    for params in present {
        match params.local_name() {
            "DVBTDeliveryParameters" => check_terrestrial(doc, ctx, params, report),
            "DVBSDeliveryParameters" => check_satellite(doc, ctx, params, report),
            "DVBCDeliveryParameters" => check_cable(doc, ctx, params, report),
            "RTSPDeliveryParameters" => check_rtsp(doc, ctx, params, report),
            "MulticastTSDeliveryParameters" => check_multicast(doc, ctx, params, report),
            "DASHDeliveryParameters" => check_dash(doc, ctx, params, report),
            _ => {}
        }
    }
}

/// Whether `node` has a `RelatedMaterial` linking an application in control or in parallel
pub(crate) fn signals_application(node: Node) -> bool {
    node.find_children("RelatedMaterial").iter().any(|rm| {
        rm.first_child_named("HowRelated")
            .and_then(|h| h.attribute("href"))
            .map_or(false, |href| href == APP_IN_CONTROL || href == APP_IN_PARALLEL)
    })
}

fn check_triplet(doc: &XmlDocument, ctx: &ValidationContext, params: Node, required: bool, report: &mut Report) {
    let triplet = if required {
        ctx.required_child(doc, params, "DVBTriplet", CODE, report)
    } else {
        params.first_child_named("DVBTriplet")
    };
    let Some(triplet) = triplet else {
        return;
    };
    for (name, mandatory) in [("origNetId", true), ("tsId", false), ("serviceId", true)] {
        match triplet.attribute(name) {
            Some(value) if value.trim().parse::<u16>().is_ok() => {}
            Some(value) => report.add(
                Finding::error(CODE, format!("DVBTriplet@{}=\"{}\" is not a 16-bit number", name, value))
                    .with_key(KEY_TRIPLET)
                    .at(doc.source_ref(triplet)),
            ),
            None if mandatory => report.add(
                Finding::error(CODE, format!("DVBTriplet@{} is required", name))
                    .with_key(KEY_TRIPLET)
                    .at(doc.source_ref(triplet)),
            ),
            None => {}
        }
    }
}

fn check_target_country(doc: &XmlDocument, ctx: &ValidationContext, params: Node, report: &mut Report) {
    for country in params.find_children("TargetCountry") {
        let value = country.text_content();
        ctx.check_country(doc, country, value.trim(), CODE, report);
    }
}

fn check_terrestrial(doc: &XmlDocument, ctx: &ValidationContext, params: Node, report: &mut Report) {
    check_triplet(doc, ctx, params, true, report);
    check_target_country(doc, ctx, params, report);
}

fn check_cable(doc: &XmlDocument, ctx: &ValidationContext, params: Node, report: &mut Report) {
    check_triplet(doc, ctx, params, true, report);
    check_target_country(doc, ctx, params, report);
    if let Some(network) = params.first_child_named("NetworkID") {
        let value = network.text_content();
        if value.trim().parse::<u16>().is_err() {
            report.add(
                Finding::error(CODE, format!("NetworkID \"{}\" is not a 16-bit number", value.trim()))
                    .with_key(KEY_INVALID_VALUE)
                    .at(doc.source_ref(network)),
            );
        }
    }
}

fn check_satellite(doc: &XmlDocument, ctx: &ValidationContext, params: Node, report: &mut Report) {
    check_triplet(doc, ctx, params, true, report);

    let system_node = params.first_child_named("ModulationSystem");
    let system = system_node
        .map(|n| n.text_content().trim().to_string())
        .unwrap_or_else(|| DVB_S.to_string());
    let Some(rules) = modulation_rules(&system) else {
        if let Some(node) = system_node {
            report.add(
                Finding::error(CODE, format!("\"{}\" is not a valid ModulationSystem", system))
                    .with_key(KEY_INVALID_VALUE)
                    .at(doc.source_ref(node)),
            );
        }
        return;
    };

    let mut check_values = |element: &str, allowed: Option<&[&str]>| {
        for node in params.find_children(element) {
            let value = node.text_content();
            let value = value.trim();
            let message = match allowed {
                None => format!("{} is not permitted for {}", element, rules.system),
                Some(values) if !values.contains(&value) => {
                    format!("{}=\"{}\" is not permitted for {}", element, value, rules.system)
                }
                Some(_) => continue,
            };
            report.add(
                Finding::error(CODE, message)
                    .with_key(KEY_MODULATION)
                    .at(doc.source_ref(node)),
            );
        }
    };
    check_values("RollOff", Some(rules.roll_off));
    check_values("ModulationType", rules.modulation_type);
    check_values("FEC", rules.fec);
    if !rules.channel_bonding {
        check_values("ChannelBonding", None);
    }

    if let Some(polarization) = params.first_child_named("Polarization") {
        let value = polarization.text_content();
        if !matches!(
            value.trim(),
            "horizontal" | "vertical" | "left circular" | "right circular"
        ) {
            report.add(
                Finding::error(CODE, format!("\"{}\" is not a valid Polarization", value.trim()))
                    .with_key(KEY_INVALID_VALUE)
                    .at(doc.source_ref(polarization)),
            );
        }
    }
}

fn check_rtsp(doc: &XmlDocument, ctx: &ValidationContext, params: Node, report: &mut Report) {
    check_triplet(doc, ctx, params, false, report);
    if let Some(url) = ctx.required_child(doc, params, "RTSPURL", CODE, report) {
        let value = url.text_content();
        if !is_rtsp_url(value.trim()) {
            report.add(
                Finding::error(CODE, format!("\"{}\" is not a valid RTSP URL", value.trim()))
                    .with_key(KEY_INVALID_VALUE)
                    .at(doc.source_ref(url)),
            );
        }
    }
}

fn check_multicast(doc: &XmlDocument, ctx: &ValidationContext, params: Node, report: &mut Report) {
    check_triplet(doc, ctx, params, false, report);
    let Some(address) = ctx.required_child(doc, params, "IPMulticastAddress", CODE, report) else {
        return;
    };
    let group = address
        .first_child_named("Address")
        .map(|a| a.text_content())
        .unwrap_or_else(|| address.text_content());
    if !is_ipv4_multicast(group.trim()) {
        report.add(
            Finding::error(CODE, format!("\"{}\" is not an IPv4 multicast address", group.trim()))
                .with_key(KEY_INVALID_VALUE)
                .at(doc.source_ref(address)),
        );
    }
    if let Some(source) = address.first_child_named("Source") {
        let value = source.text_content();
        let value = value.trim();
        if value.parse::<std::net::Ipv4Addr>().is_err() && !is_domain_name(value) {
            report.add(
                Finding::error(CODE, format!("\"{}\" is not a valid multicast source", value))
                    .with_key(KEY_INVALID_VALUE)
                    .at(doc.source_ref(source)),
            );
        }
    }
}

fn check_dash(doc: &XmlDocument, ctx: &ValidationContext, params: Node, report: &mut Report) {
    let Some(location) = ctx.required_child(doc, params, "UriBasedLocation", CODE, report) else {
        return;
    };
    match location.attribute("contentType") {
        Some(DASH_CONTENT_TYPE) => {}
        other => report.add(
            Finding::error(
                CODE,
                format!(
                    "UriBasedLocation@contentType must be {}, found \"{}\"",
                    DASH_CONTENT_TYPE,
                    other.unwrap_or_default()
                ),
            )
            .with_key(KEY_INVALID_VALUE)
            .at(doc.source_ref(location)),
        ),
    }
    if let Some(uri) = ctx.required_child(doc, location, "URI", CODE, report) {
        let value = uri.text_content();
        if !is_http_url(value.trim()) {
            report.add(
                Finding::error(CODE, format!("\"{}\" is not a valid HTTP(S) URL", value.trim()))
                    .with_key(KEY_INVALID_VALUE)
                    .at(doc.source_ref(uri)),
            );
        }
    }
}

/// Check a `ContentProtection` element against the CA and DRM registries
pub fn check_content_protection(
    doc: &XmlDocument,
    data: &ReferenceData,
    protection: Node,
    report: &mut Report,
) {
    for ca in protection.find_children("CASystemId") {
        let raw = ca.text_content();
        let raw = raw.trim();
        let value = raw.strip_prefix(CA_SYSTEM_ID_PREFIX).unwrap_or(raw);
        let Some(id) = parse_dec_or_hex(value) else {
            report.add(
                Finding::error(CP_CODE, format!("CASystemId \"{}\" is not a number", raw))
                    .with_key(KEY_CONTENT_PROTECTION)
                    .at(doc.source_ref(ca)),
            );
            continue;
        };
        if let Some(registry) = &data.ca_systems {
            if registry.is_empty() {
                report.add(
                    Finding::warning(CP_CODE, "CA system registry not loaded")
                        .with_key(crate::validators::validation::KEY_REFERENCE_UNAVAILABLE)
                        .at(doc.source_ref(ca)),
                );
            } else if !registry.is_known(id) {
                report.add(
                    Finding::error(CP_CODE, format!("CASystemId {:#06x} is not registered", id))
                        .with_key(KEY_CONTENT_PROTECTION)
                        .at(doc.source_ref(ca)),
                );
            }
        }
    }

    for drm in protection.find_children("DRMSystemId") {
        let raw = drm.text_content();
        let raw = raw.trim();
        if raw.is_empty() {
            report.add(
                Finding::error(CP_CODE, "DRMSystemId must not be empty")
                    .with_key(KEY_MISSING)
                    .at(doc.source_ref(drm)),
            );
            continue;
        }
        if let Some(registry) = &data.drm_systems {
            if registry.is_empty() {
                report.add(
                    Finding::warning(CP_CODE, "DRM system registry not loaded")
                        .with_key(crate::validators::validation::KEY_REFERENCE_UNAVAILABLE)
                        .at(doc.source_ref(drm)),
                );
            } else if !registry.is_known(raw) {
                let bare = raw.strip_prefix(DRM_SYSTEM_ID_PREFIX).unwrap_or(raw);
                report.add(
                    Finding::error(CP_CODE, format!("DRMSystemId {} is not registered", bare))
                        .with_key(KEY_CONTENT_PROTECTION)
                        .at(doc.source_ref(drm)),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::SL_2023;
    use crate::reference::{CaSystemRegistry, ReferenceStore};
    use crate::report::Severity;
    use crate::versions::{resolve, SERVICE_LIST_VERSIONS};

    fn run(instance: &str) -> Report {
        let xml = format!("<Service xmlns=\"{}\">{}</Service>", SL_2023, instance);
        let doc = XmlDocument::parse(&xml).unwrap();
        let data = ReferenceData::new();
        let version = resolve(SERVICE_LIST_VERSIONS, SL_2023).unwrap();
        let ctx = ValidationContext::new(doc.root(), version, &data);
        let mut report = Report::new();
        let si = doc.root().first_child_named("ServiceInstance").unwrap();
        check_delivery(&doc, &ctx, si, doc.root(), &mut report);
        report
    }

    #[test]
    fn test_source_type_requires_parameters() {
        let report = run(
            "<ServiceInstance><SourceType>urn:dvb:metadata:source:dvb-t</SourceType><DVBCDeliveryParameters><DVBTriplet origNetId=\"1\" serviceId=\"2\"/></DVBCDeliveryParameters></ServiceInstance>",
        );
        assert_eq!(report.key_count(Severity::Error, KEY_DELIVERY), 1);
    }

    #[test]
    fn test_terrestrial_triplet() {
        let report = run(
            "<ServiceInstance><SourceType>urn:dvb:metadata:source:dvb-t</SourceType><DVBTDeliveryParameters><DVBTriplet origNetId=\"99999\"/></DVBTDeliveryParameters></ServiceInstance>",
        );
        assert_eq!(report.key_count(Severity::Error, KEY_TRIPLET), 2);
        assert_eq!(report.key_count(Severity::Error, KEY_DELIVERY), 0);
    }

    #[test]
    fn test_satellite_modulation_systems() {
        let report = run(
            "<ServiceInstance><DVBSDeliveryParameters><DVBTriplet origNetId=\"1\" serviceId=\"2\"/><RollOff>0.25</RollOff><ModulationType>8PSK</ModulationType></DVBSDeliveryParameters></ServiceInstance>",
        );
        assert_eq!(report.key_count(Severity::Error, KEY_MODULATION), 2);

        let report = run(
            "<ServiceInstance><DVBSDeliveryParameters><DVBTriplet origNetId=\"1\" serviceId=\"2\"/><ModulationSystem>DVB-S2</ModulationSystem><RollOff>0.25</RollOff><ModulationType>8PSK</ModulationType><ChannelBonding/></DVBSDeliveryParameters></ServiceInstance>",
        );
        assert_eq!(report.key_count(Severity::Error, KEY_MODULATION), 1);

        let report = run(
            "<ServiceInstance><DVBSDeliveryParameters><DVBTriplet origNetId=\"1\" serviceId=\"2\"/><ModulationSystem>DVB-S2X</ModulationSystem><RollOff>0.05</RollOff><FEC>1/2</FEC></DVBSDeliveryParameters></ServiceInstance>",
        );
        assert_eq!(report.key_count(Severity::Error, KEY_MODULATION), 1);
    }

    #[test]
    fn test_application_source() {
        let report = run(
            "<ServiceInstance><SourceType>urn:dvb:metadata:source:application</SourceType></ServiceInstance>",
        );
        assert_eq!(report.key_count(Severity::Error, KEY_DELIVERY), 1);

        let report = run(&format!(
            "<RelatedMaterial><HowRelated href=\"{}\"/></RelatedMaterial><ServiceInstance><SourceType>urn:dvb:metadata:source:application</SourceType></ServiceInstance>",
            APP_IN_CONTROL
        ));
        assert!(report.findings().is_empty());
    }

    #[test]
    fn test_dash_and_rtsp() {
        let report = run(
            "<ServiceInstance><DASHDeliveryParameters><UriBasedLocation contentType=\"video/mp4\"><URI>https://example.com/manifest.mpd</URI></UriBasedLocation></DASHDeliveryParameters><RTSPDeliveryParameters><RTSPURL>http://example.com</RTSPURL></RTSPDeliveryParameters></ServiceInstance>",
        );
        assert_eq!(report.key_count(Severity::Error, KEY_INVALID_VALUE), 2);
    }

    #[test]
    fn test_content_protection() {
        let mut registry = CaSystemRegistry::new();
        let batch = registry.parse(r#"[{"start": "0x0100", "end": "0x01FF"}]"#).unwrap();
        registry.extend(batch);
        let data = ReferenceData::new().with_ca_systems(registry);

        let xml = "<ContentProtection><CASystemId>0x0101</CASystemId><CASystemId>urn:dvb:casystemid:2560</CASystemId><CASystemId>zz</CASystemId></ContentProtection>";
        let doc = XmlDocument::parse(xml).unwrap();
        let mut report = Report::new();
        check_content_protection(&doc, &data, doc.root(), &mut report);
        assert_eq!(report.key_count(Severity::Error, KEY_CONTENT_PROTECTION), 2);
    }
}
