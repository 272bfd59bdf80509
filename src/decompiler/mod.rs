//! Declaration reconstruction and dual emission.
//!
//! The [`Decompiler`] drives a run: it selects the custom attribute scheme for the
//! metadata version, assembles every image into a declaration tree and hands the ordered
//! outcomes to the text and JSON renderers.
//!
//! # Architecture
//!
//! - [`assembler`] - builds one [`model::Image`] per metadata image
//! - [`modifiers`] - decodes type, field and method flags into keyword tokens
//! - [`literals`] - formats default values and parameter directions
//! - [`generics`] - groups generic method specializations by code pointer
//! - [`output`] - the `dump.cs` and `dump.json` renderers
//!
//! A failure while assembling one image is recorded as an [`ImageOutcome::Failed`] at that
//! image's position; all other images are unaffected.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//! use il2scope::{Decompiler, DumpConfig, MetadataSnapshot};
//!
//! let snapshot = MetadataSnapshot::from_file(Path::new("snapshot.json"))?;
//! let decompiler = Decompiler::new(&snapshot, DumpConfig::default());
//! let summary = decompiler.decompile(Path::new("out"))?;
//! println!("{} images, {} failed", summary.images, summary.failed);
//! # Ok::<(), il2scope::Error>(())
//! ```

pub mod assembler;
pub mod config;
pub mod generics;
pub mod literals;
pub mod model;
pub mod modifiers;
pub mod output;

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use log::{debug, error, info};
use rayon::prelude::*;

use crate::{
    metadata::{
        customattributes::{decoder_for, AttributeDecoder},
        definitions::ImageDefinition,
        provider::MetadataProvider,
    },
    Result,
};

pub use assembler::Assembler;
pub use config::{DumpConfig, JSON_OUTPUT_FILE, TEXT_OUTPUT_FILE};
pub use model::{ImageFailure, ImageOutcome};
pub use modifiers::ModifierCache;

/// Counts of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpSummary {
    /// Number of images processed
    pub images: usize,
    /// Number of images that could not be assembled
    pub failed: usize,
}

impl DumpSummary {
    /// Summarize a list of outcomes
    #[must_use]
    pub fn from_outcomes(outcomes: &[ImageOutcome]) -> Self {
        DumpSummary {
            images: outcomes.len(),
            failed: outcomes.iter().filter(|outcome| outcome.is_failed()).count(),
        }
    }

    /// Returns true if every image was assembled
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Reconstructs declarations from a [`MetadataProvider`] and renders them.
pub struct Decompiler<'a, P: MetadataProvider> {
    provider: &'a P,
    config: DumpConfig,
    attributes: Option<Box<dyn AttributeDecoder>>,
    modifiers: ModifierCache,
}

impl<'a, P: MetadataProvider> Decompiler<'a, P> {
    /// Create a decompiler for `provider`, selecting the attribute scheme of its version.
    pub fn new(provider: &'a P, config: DumpConfig) -> Self {
        let version = provider.version();
        let attributes = decoder_for(version);
        if attributes.is_none() {
            debug!("Metadata version {version} carries no custom attributes");
        }

        Decompiler {
            provider,
            config,
            attributes,
            modifiers: ModifierCache::new(),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Assemble every image, in metadata order.
    ///
    /// With [`DumpConfig::parallel`] set the images are assembled on the rayon thread pool;
    /// the returned order is the same either way.
    pub fn assemble(&self) -> Vec<ImageOutcome> {
        let assembler = Assembler::new(
            self.provider,
            &self.config,
            self.attributes.as_deref(),
            &self.modifiers,
        );
        let images = self.provider.images();

        if self.config.parallel {
            images
                .par_iter()
                .enumerate()
                .map(|(index, image)| self.assemble_one(&assembler, index, image))
                .collect()
        } else {
            images
                .iter()
                .enumerate()
                .map(|(index, image)| self.assemble_one(&assembler, index, image))
                .collect()
        }
    }

    fn assemble_one(
        &self,
        assembler: &Assembler<'_, P>,
        index: usize,
        image: &ImageDefinition,
    ) -> ImageOutcome {
        match assembler.assemble_image(index, image) {
            Ok(assembled) => {
                debug!(
                    "Assembled image {index} '{}' - {} types",
                    assembled.name,
                    assembled.types.len()
                );
                ImageOutcome::Assembled(assembled)
            }
            Err(err) => {
                let name = self
                    .provider
                    .string_at(image.name_index)
                    .map(str::to_string)
                    .unwrap_or_default();
                error!("Some errors in dumping image {index} '{name}' - {err}");
                ImageOutcome::Failed(ImageFailure {
                    index,
                    name,
                    type_start: image.type_start,
                    error: err,
                })
            }
        }
    }

    /// Render the text artifact of `outcomes` into `out`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the sink fails.
    pub fn render_text<W: Write>(&self, outcomes: &[ImageOutcome], out: W) -> Result<()> {
        output::write_text(outcomes, &self.config, out)
    }

    /// Render the JSON artifact of `outcomes` into `out`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Json`] if serialization or the sink fails.
    pub fn render_json<W: Write>(&self, outcomes: &[ImageOutcome], out: W) -> Result<()> {
        output::write_json(outcomes, &self.config, out)
    }

    /// Assemble once and write the enabled artifacts into `output_dir`.
    ///
    /// Output files are created before any image is assembled, so an unwritable directory
    /// fails the run without doing any work. Image failures do not fail the run; they are
    /// reported in the artifacts and counted in the returned summary.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if an artifact cannot be created or written, or
    /// [`crate::Error::Json`] if the JSON document cannot be serialized.
    pub fn decompile(&self, output_dir: &Path) -> Result<DumpSummary> {
        let text_sink = if self.config.dump_to_cs {
            Some(BufWriter::new(File::create(output_dir.join(TEXT_OUTPUT_FILE))?))
        } else {
            None
        };
        let json_sink = if self.config.dump_to_json {
            Some(BufWriter::new(File::create(output_dir.join(JSON_OUTPUT_FILE))?))
        } else {
            None
        };

        let outcomes = self.assemble();

        if let Some(sink) = text_sink {
            self.render_text(&outcomes, sink)?;
            debug!("Wrote {}", output_dir.join(TEXT_OUTPUT_FILE).display());
        }
        if let Some(sink) = json_sink {
            self.render_json(&outcomes, sink)?;
            debug!("Wrote {}", output_dir.join(JSON_OUTPUT_FILE).display());
        }

        let summary = DumpSummary::from_outcomes(&outcomes);
        info!(
            "Dumped {} images ({} failed), {} distinct method modifier sets decoded",
            summary.images,
            summary.failed,
            self.modifiers.len()
        );
        Ok(summary)
    }
}
