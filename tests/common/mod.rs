//! Shared helpers for the integration tests

#![allow(dead_code)]

use dvbi_validator::namespaces::TVA_2019;
use dvbi_validator::{Loader, ReferenceConfig, ReferenceData};
use std::path::PathBuf;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read fixture {}: {}", path.display(), e))
}

pub fn reference_config() -> ReferenceConfig {
    ReferenceConfig::from_file(fixtures_dir().join("reference.toml")).unwrap()
}

/// Reference data loaded from `tests/fixtures/reference`
///
/// Vocabularies without a fixture file end up loaded but empty.
pub fn reference_data() -> ReferenceData {
    let loader = Loader::new().with_allow_remote(false);
    ReferenceData::load(&reference_config(), &loader)
}

/// A Service List around `body`, with the mandatory list names
pub fn service_list(namespace: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ServiceList xmlns="{}" xml:lang="en" version="1">
  <Name>List</Name>
  <ProviderName>Provider</ProviderName>
{}
</ServiceList>"#,
        namespace, body
    )
}

/// A DASH service with `extra` appended after its names
pub fn dash_service(id: &str, extra: &str) -> String {
    format!(
        r#"  <Service version="1">
    <UniqueIdentifier>{}</UniqueIdentifier>
    <ServiceInstance>
      <SourceType>urn:dvb:metadata:source:dvb-dash</SourceType>
      <DASHDeliveryParameters>
        <UriBasedLocation contentType="application/dash+xml">
          <URI>https://cdn.example.com/manifest.mpd</URI>
        </UriBasedLocation>
      </DASHDeliveryParameters>
    </ServiceInstance>
    <ServiceName>Service</ServiceName>
    <ProviderName>Provider</ProviderName>
{}
  </Service>"#,
        id, extra
    )
}

/// A `TVAMain` response around `tables`
pub fn content_guide(tables: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<TVAMain xmlns="{}" xml:lang="en">
  <ProgramDescription>
{}
  </ProgramDescription>
</TVAMain>"#,
        TVA_2019, tables
    )
}

/// A programme information table holding one programme with `description`
pub fn programme(crid: &str, description: &str) -> String {
    format!(
        r#"<ProgramInformationTable>
  <ProgramInformation programId="{}">
    <BasicDescription>
      <Title>Programme</Title>
{}
    </BasicDescription>
  </ProgramInformation>
</ProgramInformationTable>"#,
        crid, description
    )
}

pub fn medium_synopsis(text: &str) -> String {
    format!(r#"<Synopsis length="medium">{}</Synopsis>"#, text)
}
