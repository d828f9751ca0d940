//! XML namespaces used by DVB-I documents
//!
//! Service List namespaces select a schema revision (see [`crate::versions`]).
//! The remaining namespaces belong to the TV-Anytime and MPEG-7 vocabularies
//! that DVB-I imports.

/// Service List namespace, first edition
pub const SL_2019: &str = "urn:dvb:metadata:servicediscovery:2019";
/// Service List namespace, A177r1
pub const SL_2020: &str = "urn:dvb:metadata:servicediscovery:2020";
/// Service List namespace, A177r2
pub const SL_2021: &str = "urn:dvb:metadata:servicediscovery:2021";
/// Service List namespace, A177r3
pub const SL_2022: &str = "urn:dvb:metadata:servicediscovery:2022";
/// Service List namespace, A177r4
pub const SL_2022B: &str = "urn:dvb:metadata:servicediscovery:2022b";
/// Service List namespace, A177r5
pub const SL_2023: &str = "urn:dvb:metadata:servicediscovery:2023";
/// Service List namespace, A177r6 (draft)
pub const SL_2024: &str = "urn:dvb:metadata:servicediscovery:2024";

/// TV-Anytime metadata namespace used by the first DVB-I content guide
pub const TVA_2019: &str = "urn:tva:metadata:2019";
/// TV-Anytime metadata namespace, 2024 revision
pub const TVA_2024: &str = "urn:tva:metadata:2024";

/// TV-Anytime extended metadata namespace
pub const TVA_EXTENDED: &str = "urn:tva:metadata:extended:2019";
/// MPEG-7 namespace (for still picture formats and media locators)
pub const MPEG7: &str = "urn:tva:mpeg7:2008";
/// DVB-I content guide extensions
pub const DVBI_TYPES: &str = "urn:dvb:metadata:dvbi:2019";

/// XML namespace (`xml:lang`)
pub const XML_NAMESPACE: &str = roxmltree::NS_XML_URI;

/// Local name of the Service List root element
pub const SERVICE_LIST_ROOT: &str = "ServiceList";
/// Local name of the Content Guide root element
pub const CONTENT_GUIDE_ROOT: &str = "TVAMain";

/// Find the prefix bound to `namespace` on `node`, or `""` for the default namespace
pub fn prefix_for<'a>(node: roxmltree::Node<'a, '_>, namespace: &str) -> String {
    node.lookup_prefix(namespace)
        .map(str::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_lookup() {
        let xml = format!(r#"<sl:ServiceList xmlns:sl="{}"/>"#, SL_2023);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert_eq!(prefix_for(doc.root_element(), SL_2023), "sl");
    }

    #[test]
    fn test_default_namespace_has_empty_prefix() {
        let xml = format!(r#"<ServiceList xmlns="{}"/>"#, SL_2023);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert_eq!(prefix_for(doc.root_element(), SL_2023), "");
    }
}
