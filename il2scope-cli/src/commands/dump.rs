use std::path::Path;

use anyhow::Context;
use il2scope::{Decompiler, DumpSummary};
use serde::Serialize;

use crate::{
    app::{DumpSelection, GlobalOptions},
    commands::common::{load_config, load_snapshot},
    output::print_output,
};

#[derive(Debug, Serialize)]
pub struct DumpReport {
    pub output_dir: String,
    pub images: usize,
    pub failed: usize,
    pub text: bool,
    pub json: bool,
}

pub fn run(
    snapshot_path: &Path,
    output_dir: &Path,
    selection: &DumpSelection,
    opts: &GlobalOptions,
) -> anyhow::Result<DumpSummary> {
    let snapshot = load_snapshot(snapshot_path)?;
    let config = load_config(selection)?;
    log::debug!("Dump configuration: {config:?}");

    let decompiler = Decompiler::new(&snapshot, config);
    let summary = decompiler
        .decompile(output_dir)
        .with_context(|| format!("failed to write dump to {}", output_dir.display()))?;

    let report = DumpReport {
        output_dir: output_dir.display().to_string(),
        images: summary.images,
        failed: summary.failed,
        text: decompiler.config().dump_to_cs,
        json: decompiler.config().dump_to_json,
    };

    print_output(&report, opts, |report| {
        println!("Output:  {}", report.output_dir);
        println!("Images:  {}", report.images);
        if report.failed > 0 {
            println!("Failed:  {}", report.failed);
        }
        if !report.text && !report.json {
            println!("Nothing written, both artifacts are disabled");
        }
    })?;

    Ok(summary)
}
