use std::path::Path;

use anyhow::Context;
use il2scope::{DumpConfig, MetadataSnapshot};

use crate::app::DumpSelection;

/// Load a metadata snapshot.
pub fn load_snapshot(path: &Path) -> anyhow::Result<MetadataSnapshot> {
    MetadataSnapshot::from_file(path)
        .with_context(|| format!("failed to load snapshot: {}", path.display()))
}

/// Build the dump configuration: the config file (or defaults), then the `--no-*` flags.
pub fn load_config(selection: &DumpSelection) -> anyhow::Result<DumpConfig> {
    let mut config = match &selection.config {
        Some(path) => DumpConfig::from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => DumpConfig::default(),
    };

    config.dump_method &= !selection.no_methods;
    config.dump_field &= !selection.no_fields;
    config.dump_property &= !selection.no_properties;
    config.dump_attribute &= !selection.no_attributes;
    config.dump_field_offset &= !selection.no_field_offsets;
    config.dump_method_offset &= !selection.no_method_offsets;
    config.dump_type_def_index &= !selection.no_typedef_index;
    config.dump_to_cs &= !selection.no_cs;
    config.dump_to_json &= !selection.no_json;
    config.parallel |= selection.parallel;

    Ok(config)
}
