use std::path::Path;

use il2scope::MetadataProvider;
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::load_snapshot,
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
pub struct SnapshotInfo {
    pub version: String,
    pub image_base: String,
    pub type_count: usize,
    pub method_count: usize,
    pub field_count: usize,
    pub generic_instance_count: usize,
    pub images: Vec<ImageInfo>,
}

#[derive(Debug, Serialize)]
pub struct ImageInfo {
    pub name: String,
    pub type_start: u32,
    pub type_count: u32,
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let snapshot = load_snapshot(path)?;

    let images = snapshot
        .images()
        .iter()
        .map(|image| {
            Ok(ImageInfo {
                name: snapshot.string_at(image.name_index)?.to_string(),
                type_start: image.type_start,
                type_count: image.type_count,
            })
        })
        .collect::<il2scope::Result<Vec<_>>>()?;

    let info = SnapshotInfo {
        version: snapshot.version().to_string(),
        image_base: format!("0x{:X}", snapshot.image_base),
        type_count: snapshot.type_defs.len(),
        method_count: snapshot.methods.len(),
        field_count: snapshot.fields.len(),
        generic_instance_count: snapshot.method_specs.len(),
        images,
    };

    print_output(&info, opts, |info| {
        println!("Metadata version:  {}", info.version);
        println!("Image base:        {}", info.image_base);
        println!("Types:             {}", info.type_count);
        println!("Methods:           {}", info.method_count);
        println!("Fields:            {}", info.field_count);
        println!("Generic instances: {}", info.generic_instance_count);
        println!();

        let mut table = TabWriter::new(vec![
            ("#", Align::Right),
            ("Image", Align::Left),
            ("TypeStart", Align::Right),
            ("Types", Align::Right),
        ]);
        for (index, image) in info.images.iter().enumerate() {
            table.row(vec![
                index.to_string(),
                image.name.clone(),
                image.type_start.to_string(),
                image.type_count.to_string(),
            ]);
        }
        table.print();
    })
}
