//! Declaration assembly.
//!
//! The [`Assembler`] walks one image's type range and builds its [`Image`] tree, applying
//! the flag decoders, the attribute strategy, default value formatting and the generic
//! instantiation grouper to every member. It performs no output; both renderers consume
//! the tree it returns.
//!
//! Member ranges come straight from the definition rows: a type owns
//! `[field_start, field_start + field_count)` of the field table and likewise for
//! properties and methods, property accessors are indices relative to the owning type's
//! `method_start`.

use crate::{
    decompiler::{
        config::DumpConfig,
        generics::group_instantiations,
        literals::{DefaultLiteral, ParamDirection},
        model::{Field, Image, Method, Parameter, Property, PropertyAccessor, TypeDeclaration},
        modifiers::{decode_field_modifiers, decode_type_modifiers, ModifierCache},
    },
    metadata::{
        customattributes::{custom_attributes, AttributeDecoder},
        definitions::{DefaultValueRef, ImageDefinition, TypeDefinition},
        flags::{MethodAttributes, TypeAttributes},
        provider::MetadataProvider,
    },
    Error, Result,
};

/// Name of the implicit root type that is never listed as a parent
const UNIVERSAL_BASE: &str = "object";

/// Builds declaration trees from a [`MetadataProvider`].
pub struct Assembler<'a, P: MetadataProvider> {
    provider: &'a P,
    config: &'a DumpConfig,
    attributes: Option<&'a dyn AttributeDecoder>,
    modifiers: &'a ModifierCache,
}

impl<'a, P: MetadataProvider> Assembler<'a, P> {
    /// Create an assembler. `attributes` is the attribute strategy of the metadata version,
    /// `None` if the version has no custom attributes.
    pub fn new(
        provider: &'a P,
        config: &'a DumpConfig,
        attributes: Option<&'a dyn AttributeDecoder>,
        modifiers: &'a ModifierCache,
    ) -> Self {
        Assembler {
            provider,
            config,
            attributes,
            modifiers,
        }
    }

    /// Assemble the declaration tree of one image.
    ///
    /// # Errors
    /// Returns the first error raised while resolving the image's definitions.
    pub fn assemble_image(&self, index: usize, image: &ImageDefinition) -> Result<Image> {
        let name = self.provider.string_at(image.name_index)?.to_string();

        // The whole range must exist before anything is sized from the count
        let range = image.type_range()?;
        if !range.is_empty() {
            self.provider.type_def(range.end - 1)?;
        }

        let mut types = Vec::with_capacity(range.len());
        for type_index in range {
            types.push(self.assemble_type(image, &name, type_index)?);
        }

        Ok(Image {
            index,
            name,
            type_start: image.type_start,
            types,
        })
    }

    fn assemble_type(
        &self,
        image: &ImageDefinition,
        image_name: &str,
        index: usize,
    ) -> Result<TypeDeclaration> {
        let def = self.provider.type_def(index)?;
        let extends = self.extends(def)?;
        let namespace = self.provider.string_at(def.namespace_index)?.to_string();

        let attributes = if self.config.dump_attribute {
            self.attributes(image, def.custom_attribute_index, def.token, "")?
        } else {
            String::new()
        };
        let serializable =
            self.config.dump_attribute && def.flags & TypeAttributes::SERIALIZABLE != 0;

        let decoded = decode_type_modifiers(def.flags, def.is_value_type(), def.is_enum());
        let name = self.provider.type_def_name(index, false, true)?;

        let fields = if self.config.dump_field {
            def.field_range()
                .map(|field| self.assemble_field(image, index, def, field))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        let properties = if self.config.dump_property {
            def.property_range()
                .map(|property| self.assemble_property(image, def, property))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        let methods = if self.config.dump_method {
            def.method_range()
                .map(|method| self.assemble_method(image, image_name, method))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(TypeDeclaration {
            index,
            namespace,
            name,
            category: decoded.category,
            visibility: decoded.visibility,
            modifier: decoded.modifier,
            extends,
            attributes,
            serializable,
            fields,
            properties,
            methods,
        })
    }

    /// Parent (for reference types not deriving from `object` directly) followed by all
    /// interfaces in declaration order.
    fn extends(&self, def: &TypeDefinition) -> Result<Vec<String>> {
        let mut extends = Vec::with_capacity(usize::from(def.interfaces_count) + 1);

        if def.parent_index >= 0 {
            let parent = self.provider.type_name_of(def.parent_index, false, false)?;
            if !def.is_value_type() && !def.is_enum() && parent != UNIVERSAL_BASE {
                extends.push(parent);
            }
        }

        for position in def.interface_range() {
            let interface = self
                .provider
                .interface_index(table_index(position, "interface_indices")?)?;
            extends.push(self.provider.type_name_of(interface, false, false)?);
        }

        Ok(extends)
    }

    fn assemble_field(
        &self,
        image: &ImageDefinition,
        type_index: usize,
        owner: &TypeDefinition,
        global: i64,
    ) -> Result<Field> {
        let index = table_index(global, "fields")?;
        let def = self.provider.field_def(index)?;
        let reference = self.provider.type_of(def.type_index)?;

        let attributes = if self.config.dump_attribute {
            self.attributes(image, def.custom_attribute_index, def.token, "\t")?
        } else {
            String::new()
        };

        let decoded = decode_field_modifiers(u32::from(reference.attrs));
        let offset = if self.config.dump_field_offset && !decoded.is_const {
            let local = table_index(global - i64::from(owner.field_start), "fields")?;
            Some(self.provider.field_offset_of(
                type_index,
                local,
                index,
                owner.is_value_type(),
                decoded.is_static,
            ))
        } else {
            None
        };

        Ok(Field {
            attributes,
            modifiers: decoded.tokens(),
            is_const: decoded.is_const,
            type_name: self.provider.type_name_of(def.type_index, false, false)?,
            name: self.provider.string_at(def.name_index)?.to_string(),
            default: self.default_literal(self.provider.field_default_value(index)),
            offset,
        })
    }

    fn assemble_property(
        &self,
        image: &ImageDefinition,
        owner: &TypeDefinition,
        global: i64,
    ) -> Result<Property> {
        let def = self.provider.property_def(table_index(global, "properties")?)?;

        let attributes = if self.config.dump_attribute {
            self.attributes(image, def.custom_attribute_index, def.token, "\t")?
        } else {
            String::new()
        };

        Ok(Property {
            attributes,
            name: self.provider.string_at(def.name_index)?.to_string(),
            get: self.accessor(owner, def.get, false)?,
            set: self.accessor(owner, def.set, true)?,
        })
    }

    /// Resolve a property accessor. The getter exposes its return type, the setter the
    /// type of its first parameter.
    fn accessor(
        &self,
        owner: &TypeDefinition,
        relative: i32,
        is_setter: bool,
    ) -> Result<Option<PropertyAccessor>> {
        if relative < 0 {
            return Ok(None);
        }

        let method_index = table_index(
            i64::from(owner.method_start) + i64::from(relative),
            "methods",
        )?;
        let method = self.provider.method_def(method_index)?;

        let type_index = if is_setter {
            let parameter = table_index(i64::from(method.parameter_start), "parameters")?;
            self.provider.parameter_def(parameter)?.type_index
        } else {
            method.return_type
        };

        Ok(Some(PropertyAccessor {
            method_index,
            modifiers: self
                .modifiers
                .get_or_decode(method_index, u32::from(method.flags)),
            type_name: self.provider.type_name_of(type_index, false, false)?,
        }))
    }

    fn assemble_method(
        &self,
        image: &ImageDefinition,
        image_name: &str,
        global: i64,
    ) -> Result<Method> {
        let index = table_index(global, "methods")?;
        let def = self.provider.method_def(index)?;
        let is_abstract = u32::from(def.flags) & MethodAttributes::ABSTRACT != 0;

        let attributes = if self.config.dump_attribute {
            self.attributes(image, def.custom_attribute_index, def.token, "\t")?
        } else {
            String::new()
        };

        let (address, slot) = if self.config.dump_method_offset {
            let pointer = self.provider.method_pointer_of(image_name, def);
            let address =
                (!is_abstract && pointer > 0).then(|| self.provider.address_triple(pointer));
            (address, def.vtable_slot())
        } else {
            (None, None)
        };

        let mut name = self.provider.string_at(def.name_index)?.to_string();
        if def.generic_container_index >= 0 {
            name.push_str(
                &self
                    .provider
                    .generic_container_params(def.generic_container_index)?,
            );
        }

        let return_reference = self.provider.type_of(def.return_type)?;
        let parameters = def
            .parameter_range()
            .map(|parameter| self.assemble_parameter(parameter))
            .collect::<Result<Vec<_>>>()?;

        Ok(Method {
            index,
            attributes,
            modifiers: self.modifiers.get_or_decode(index, u32::from(def.flags)),
            returns_by_ref: return_reference.byref,
            return_type: self.provider.type_name_of(def.return_type, false, false)?,
            name,
            parameters,
            is_abstract,
            address,
            slot,
            generic_groups: group_instantiations(self.provider, index)?,
        })
    }

    fn assemble_parameter(&self, global: i64) -> Result<Parameter> {
        let index = table_index(global, "parameters")?;
        let def = self.provider.parameter_def(index)?;
        let reference = self.provider.type_of(def.type_index)?;

        Ok(Parameter {
            direction: ParamDirection::from_type_reference(&reference),
            type_name: self.provider.type_name_of(def.type_index, false, false)?,
            name: self.provider.string_at(def.name_index)?.to_string(),
            default: self.default_literal(self.provider.parameter_default_value(index)),
        })
    }

    /// A default value is only shown when its data index is set.
    fn default_literal(&self, value: Option<DefaultValueRef>) -> Option<DefaultLiteral> {
        value
            .filter(|value| value.data_index != -1)
            .map(|value| {
                DefaultLiteral::from(
                    &self
                        .provider
                        .default_value(value.type_index, value.data_index),
                )
            })
    }

    fn attributes(
        &self,
        image: &ImageDefinition,
        custom_attribute_index: i32,
        token: u32,
        indent: &str,
    ) -> Result<String> {
        custom_attributes(
            self.provider,
            self.attributes,
            image,
            custom_attribute_index,
            token,
            indent,
        )
    }
}

fn table_index(index: i64, table: &'static str) -> Result<usize> {
    usize::try_from(index).map_err(|_| Error::IndexOutOfRange { table, index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decompiler::{literals::ParamDirection, model::TypeCategory},
        metadata::{
            flags::{FieldAttributes, ParamAttributes},
            provider::DefaultValue,
            snapshot::MethodSpecEntry,
        },
        test::{sample_snapshot, SnapshotBuilder},
    };

    fn assemble(snapshot: &crate::MetadataSnapshot, config: &DumpConfig) -> Result<Image> {
        let cache = ModifierCache::new();
        let assembler = Assembler::new(snapshot, config, None, &cache);
        assembler.assemble_image(0, &snapshot.images[0])
    }

    #[test]
    fn test_assemble_sample() {
        let snapshot = sample_snapshot();
        let image = assemble(&snapshot, &DumpConfig::default()).unwrap();
        assert_eq!(image.name, "Assembly-CSharp.dll");

        let player = image
            .types
            .iter()
            .find(|t| t.name == "Player")
            .unwrap();
        assert_eq!(player.namespace, "Game");
        assert_eq!(player.category, TypeCategory::Class);
        assert_eq!(player.extends, vec!["MonoBehaviour", "IDamageable"]);
        assert_eq!(player.fields.len(), 3);
        assert_eq!(player.properties.len(), 1);
        assert!(!player.methods.is_empty());
    }

    #[test]
    fn test_extends_skips_object_and_value_types() {
        let mut builder = SnapshotBuilder::new();
        let object = builder.add_type_ref("object");
        let value_type = builder.add_type_ref("ValueType");
        let disposable = builder.add_type_ref("IDisposable");
        builder.add_image("Test.dll");

        let class = builder.add_type("", "Plain");
        builder.type_def_mut(class).parent_index = object;
        builder.add_interface(class, disposable);

        let value = builder.add_type("", "Point");
        builder.type_def_mut(value).parent_index = value_type;
        builder.type_def_mut(value).bitfield = 0x1;

        let snapshot = builder.build();
        let image = assemble(&snapshot, &DumpConfig::default()).unwrap();
        assert_eq!(image.types[0].extends, vec!["IDisposable"]);
        assert!(image.types[1].extends.is_empty());
        assert_eq!(image.types[1].category, TypeCategory::Struct);
    }

    #[test]
    fn test_field_offsets_and_defaults() {
        let mut builder = SnapshotBuilder::new();
        let int_const = builder.add_type_ref_with_attrs(
            "int",
            (FieldAttributes::PUBLIC | FieldAttributes::LITERAL) as u16,
        );
        let int_field = builder.add_type_ref_with_attrs("int", FieldAttributes::PRIVATE as u16);
        builder.add_image("Test.dll");
        let owner = builder.add_type("", "Limits");
        let max = builder.add_field(owner, "Max", int_const);
        let current = builder.add_field(owner, "current", int_field);
        builder.set_field_offset(owner, 1, 0x18);
        builder.set_field_default(max, int_const, 0, DefaultValue::Int(10));
        let mut snapshot = builder.build();
        snapshot.field_default_values.insert(
            current,
            DefaultValueRef {
                type_index: int_field,
                data_index: -1,
            },
        );

        let image = assemble(&snapshot, &DumpConfig::default()).unwrap();
        let fields = &image.types[0].fields;
        assert_eq!(fields[0].modifiers, vec!["public", "const"]);
        assert_eq!(fields[0].offset, None);
        assert_eq!(fields[0].default, Some(DefaultLiteral::Value("10".to_string())));
        assert_eq!(fields[1].offset, Some(0x18));
        assert_eq!(fields[1].default, None);

        let image = assemble(&snapshot, &DumpConfig::declarations_only()).unwrap();
        assert_eq!(image.types[0].fields[1].offset, None);
    }

    #[test]
    fn test_setter_only_property() {
        let mut builder = SnapshotBuilder::new();
        let void = builder.add_type_ref("void");
        let float = builder.add_type_ref("float");
        builder.add_image("Test.dll");
        let owner = builder.add_type("", "Settings");
        let setter = builder.add_method(owner, "set_Volume", MethodAttributes::PUBLIC, void);
        builder.add_parameter(setter, "value", float);
        builder.add_property(owner, "Volume", -1, 0);

        let snapshot = builder.build();
        let image = assemble(&snapshot, &DumpConfig::default()).unwrap();
        let property = &image.types[0].properties[0];
        assert!(property.get.is_none());
        let primary = property.primary().unwrap();
        assert_eq!(primary.type_name, "float");
        assert_eq!(&*primary.modifiers, &["public"]);
        assert_eq!(property.accessors(), vec!["set"]);
    }

    #[test]
    fn test_method_addresses_and_parameters() {
        let mut builder = SnapshotBuilder::new();
        let void = builder.add_type_ref("void");
        let out_int = builder.add_type_ref_with(crate::metadata::snapshot::TypeEntry {
            name: "int".to_string(),
            attrs: ParamAttributes::OUT as u16,
            byref: true,
            ..Default::default()
        });
        builder.add_image("Test.dll");
        let owner = builder.add_type("", "Parser");
        let parse = builder.add_method(
            owner,
            "TryParse",
            MethodAttributes::PUBLIC | MethodAttributes::STATIC,
            void,
        );
        builder.add_parameter(parse, "result", out_int);
        builder.set_method_pointer("Test.dll", parse, 0x1800_1000);
        builder.method_mut(parse).slot = 4;
        let abstract_method = builder.add_method(
            owner,
            "Run",
            MethodAttributes::PUBLIC | MethodAttributes::ABSTRACT | MethodAttributes::VIRTUAL,
            void,
        );
        builder.set_method_pointer("Test.dll", abstract_method, 0x1800_2000);

        let mut snapshot = builder.build();
        snapshot.image_base = 0x1800_0000;
        snapshot.method_specs = vec![MethodSpecEntry {
            method_definition_index: parse,
            type_name: "Parser".to_string(),
            method_name: "TryParse<int>".to_string(),
            pointer: 0,
        }];

        let image = assemble(&snapshot, &DumpConfig::default()).unwrap();
        let methods = &image.types[0].methods;

        assert_eq!(methods[0].address.map(|a| a.rva), Some(0x1000));
        assert_eq!(methods[0].slot, Some(4));
        assert_eq!(methods[0].parameters[0].direction, ParamDirection::Out);
        assert_eq!(methods[0].generic_groups.len(), 1);
        assert_eq!(&*methods[0].modifiers, &["public", "static"]);

        assert!(methods[1].is_abstract);
        assert!(methods[1].address.is_none());
        assert_eq!(&*methods[1].modifiers, &["public", "abstract", "override"]);

        let image = assemble(&snapshot, &DumpConfig::declarations_only()).unwrap();
        assert!(image.types[0].methods[0].address.is_none());
        assert!(image.types[0].methods[0].slot.is_none());
    }

    #[test]
    fn test_missing_type_reference_fails_image() {
        let mut builder = SnapshotBuilder::new();
        builder.add_image("Broken.dll");
        let owner = builder.add_type("", "Broken");
        builder.add_field(owner, "missing", 42);

        let snapshot = builder.build();
        let result = assemble(&snapshot, &DumpConfig::default());
        assert!(matches!(
            result,
            Err(Error::IndexOutOfRange {
                table: "types",
                index: 42
            })
        ));
    }

    #[test]
    fn test_type_count_past_table_fails_image() {
        let mut snapshot = sample_snapshot();
        snapshot.images[0].type_count = u32::MAX;

        let result = assemble(&snapshot, &DumpConfig::default());
        assert!(matches!(
            result,
            Err(Error::IndexOutOfRange {
                table: "type_defs",
                index: 4_294_967_294
            })
        ));
    }

    #[test]
    fn test_disabled_sections() {
        let snapshot = sample_snapshot();
        let config = DumpConfig {
            dump_field: false,
            dump_property: false,
            dump_method: false,
            ..DumpConfig::default()
        };
        let image = assemble(&snapshot, &config).unwrap();
        assert!(image
            .types
            .iter()
            .all(|t| t.fields.is_empty() && t.properties.is_empty() && t.methods.is_empty()));
    }
}
