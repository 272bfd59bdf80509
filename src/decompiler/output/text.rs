//! C#-like pseudo-source rendering.
//!
//! The layout is compatible with the `dump.cs` files produced by existing IL2CPP dumpers:
//! an image index header, then every type with its fields, properties and methods.
//!
//! ```text
//! // Image 0: Assembly-CSharp.dll - 0
//!
//! // Namespace: Game
//! public class Player : MonoBehaviour // TypeDefIndex: 0
//! {
//! 	// Fields
//! 	private int health; // 0x10
//!
//! 	// Methods
//!
//! 	// RVA: 0x1000 Offset: 0x400 VA: 0x180001000
//! 	private void Update() { }
//! }
//! ```

use std::io::Write;

use crate::{
    decompiler::{
        config::DumpConfig,
        model::{
            Field, GenericGroup, ImageFailure, ImageOutcome, Method, Parameter, Property,
            TypeDeclaration,
        },
    },
    metadata::provider::AddressTriple,
    Result,
};

/// Writes the text artifact for a list of image outcomes.
pub struct TextRenderer<'a, W: Write> {
    config: &'a DumpConfig,
    out: W,
}

impl<'a, W: Write> TextRenderer<'a, W> {
    /// Create a renderer writing into `out`
    pub fn new(config: &'a DumpConfig, out: W) -> Self {
        TextRenderer { config, out }
    }

    /// Render all outcomes: the image header first, then every image's types in order.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the sink fails.
    pub fn render(&mut self, outcomes: &[ImageOutcome]) -> Result<()> {
        for outcome in outcomes {
            writeln!(
                self.out,
                "// Image {}: {} - {}",
                outcome.index(),
                outcome.name(),
                outcome.type_start()
            )?;
        }

        for outcome in outcomes {
            match outcome {
                ImageOutcome::Assembled(image) => {
                    for declaration in &image.types {
                        self.write_type(declaration)?;
                    }
                }
                ImageOutcome::Failed(failure) => self.write_failure(failure)?,
            }
        }

        self.out.flush()?;
        Ok(())
    }

    /// Consume the renderer and return its sink
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_failure(&mut self, failure: &ImageFailure) -> Result<()> {
        write!(
            self.out,
            "/*ERROR: Some errors in dumping image {}\n{}*/\n",
            failure.name, failure.error
        )?;
        Ok(())
    }

    fn write_type(&mut self, declaration: &TypeDeclaration) -> Result<()> {
        write!(self.out, "\n// Namespace: {}\n", declaration.namespace)?;

        if self.config.dump_attribute {
            self.out.write_all(declaration.attributes.as_bytes())?;
            if declaration.serializable {
                self.out.write_all(b"[Serializable]\n")?;
            }
        }

        write!(self.out, "{} ", declaration.visibility)?;
        if let Some(modifier) = declaration.modifier {
            write!(self.out, "{modifier} ")?;
        }
        write!(self.out, "{} {}", declaration.category, declaration.name)?;
        if !declaration.extends.is_empty() {
            write!(self.out, " : {}", declaration.extends.join(", "))?;
        }
        if self.config.dump_type_def_index {
            write!(self.out, " // TypeDefIndex: {}\n{{", declaration.index)?;
        } else {
            write!(self.out, "\n{{")?;
        }

        if self.config.dump_field && !declaration.fields.is_empty() {
            self.out.write_all(b"\n\t// Fields\n")?;
            for field in &declaration.fields {
                self.write_field(field)?;
            }
        }

        if self.config.dump_property && !declaration.properties.is_empty() {
            self.out.write_all(b"\n\t// Properties\n")?;
            for property in &declaration.properties {
                self.write_property(property)?;
            }
        }

        if self.config.dump_method && !declaration.methods.is_empty() {
            self.out.write_all(b"\n\t// Methods\n")?;
            for method in &declaration.methods {
                self.write_method(method)?;
            }
        }

        self.out.write_all(b"}\n")?;
        Ok(())
    }

    fn write_field(&mut self, field: &Field) -> Result<()> {
        self.out.write_all(field.attributes.as_bytes())?;
        self.out.write_all(b"\t")?;
        for token in &field.modifiers {
            write!(self.out, "{token} ")?;
        }
        write!(self.out, "{} {}", field.type_name, field.name)?;
        if let Some(default) = &field.default {
            self.out.write_all(default.declaration_suffix().as_bytes())?;
        }
        match field.offset {
            Some(offset) => writeln!(self.out, "; // 0x{offset:X}")?,
            None => self.out.write_all(b";\n")?,
        }
        Ok(())
    }

    fn write_property(&mut self, property: &Property) -> Result<()> {
        self.out.write_all(property.attributes.as_bytes())?;
        self.out.write_all(b"\t")?;

        // A property without accessors still lists its name
        let Some(primary) = property.primary() else {
            writeln!(self.out, "{} {{ }}", property.name)?;
            return Ok(());
        };

        for token in primary.modifiers.iter() {
            write!(self.out, "{token} ")?;
        }
        write!(self.out, "{} {} {{ ", primary.type_name, property.name)?;
        for accessor in property.accessors() {
            write!(self.out, "{accessor}; ")?;
        }
        self.out.write_all(b"}\n")?;
        Ok(())
    }

    fn write_method(&mut self, method: &Method) -> Result<()> {
        self.out.write_all(b"\n")?;
        self.out.write_all(method.attributes.as_bytes())?;

        if self.config.dump_method_offset {
            self.out.write_all(b"\t// ")?;
            self.write_address(method.address)?;
            if let Some(slot) = method.slot {
                write!(self.out, " Slot: {slot}")?;
            }
            self.out.write_all(b"\n")?;
        }

        self.out.write_all(b"\t")?;
        for token in method.modifiers.iter() {
            write!(self.out, "{token} ")?;
        }
        if method.returns_by_ref {
            self.out.write_all(b"ref ")?;
        }
        write!(self.out, "{} {}(", method.return_type, method.name)?;
        for (position, parameter) in method.parameters.iter().enumerate() {
            if position > 0 {
                self.out.write_all(b", ")?;
            }
            self.write_parameter(parameter)?;
        }
        if method.is_abstract {
            self.out.write_all(b");\n")?;
        } else {
            self.out.write_all(b") { }\n")?;
        }

        if !method.generic_groups.is_empty() {
            self.out.write_all(b"\t/* GenericInstMethod :\n")?;
            for group in &method.generic_groups {
                self.write_generic_group(group)?;
            }
            self.out.write_all(b"\t*/\n")?;
        }
        Ok(())
    }

    fn write_parameter(&mut self, parameter: &Parameter) -> Result<()> {
        let keyword = parameter.direction.keyword();
        if !keyword.is_empty() {
            write!(self.out, "{keyword} ")?;
        }
        write!(self.out, "{} {}", parameter.type_name, parameter.name)?;
        if let Some(default) = &parameter.default {
            self.out.write_all(default.declaration_suffix().as_bytes())?;
        }
        Ok(())
    }

    fn write_generic_group(&mut self, group: &GenericGroup) -> Result<()> {
        self.out.write_all(b"\t|\n\t|-")?;
        self.write_address(group.address)?;
        self.out.write_all(b"\n")?;
        for instance in &group.instances {
            writeln!(self.out, "\t|-{}.{}", instance.type_name, instance.method_name)?;
        }
        Ok(())
    }

    fn write_address(&mut self, address: Option<AddressTriple>) -> Result<()> {
        match address {
            Some(address) => write!(
                self.out,
                "RVA: 0x{:X} Offset: 0x{:X} VA: 0x{:X}",
                address.rva, address.offset, address.va
            )?,
            None => self.out.write_all(b"RVA: -1 Offset: -1")?,
        }
        Ok(())
    }
}

/// Render the text artifact into `out`.
///
/// # Errors
/// Returns [`crate::Error::FileError`] if the sink fails.
pub fn write_text<W: Write>(outcomes: &[ImageOutcome], config: &DumpConfig, out: W) -> Result<()> {
    TextRenderer::new(config, out).render(outcomes)
}
