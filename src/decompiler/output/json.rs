//! JSON document tree rendering.
//!
//! The document mirrors the text artifact field for field. Keys are camelCase; a failed
//! image keeps its place with an `error` member and no objects:
//!
//! ```json
//! {
//!   "images": [
//!     { "name": "Assembly-CSharp.dll", "typedObjects": [ ... ] },
//!     {
//!       "name": "Broken.dll",
//!       "error": "Index 99 is out of range for table 'types'",
//!       "typedObjects": []
//!     }
//!   ]
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::{
    decompiler::{
        config::DumpConfig,
        model::{
            Field, ImageOutcome, Method, Parameter, Property, PropertyAccessor, TypeCategory,
            TypeDeclaration,
        },
    },
    Result,
};

#[derive(Serialize)]
struct Document<'a> {
    images: Vec<ImageRecord<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRecord<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    typed_objects: Vec<TypedObject<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TypedObject<'a> {
    namespace: &'a str,
    extends: &'a [String],
    attributes: String,
    visibility: Vec<&'static str>,
    category: TypeCategory,
    type_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_def_index: Option<usize>,
    fields: Vec<FieldRecord<'a>>,
    properties: Vec<PropertyRecord<'a>>,
    methods: Vec<MethodRecord<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldRecord<'a> {
    attributes: &'a str,
    visibility: &'a [&'static str],
    #[serde(rename = "type")]
    type_name: &'a str,
    name: &'a str,
    default_value: Option<String>,
    offset: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PropertyRecord<'a> {
    attributes: &'a str,
    modifiers: &'a [&'static str],
    #[serde(rename = "type")]
    type_name: Option<&'a str>,
    name: &'a str,
    accessors: Vec<&'static str>,
    get: Option<AccessorRecord<'a>>,
    set: Option<AccessorRecord<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessorRecord<'a> {
    modifiers: &'a [&'static str],
    return_type: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MethodRecord<'a> {
    attributes: &'a str,
    modifiers: &'a [&'static str],
    returns_by_ref: bool,
    return_type: &'a str,
    name: &'a str,
    parameters: Vec<ParameterRecord<'a>>,
    rva: u64,
    offset: u64,
    va: u64,
    slot: Option<u16>,
    is_abstract: bool,
    generic_instances: Vec<GenericInstanceRecord<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParameterRecord<'a> {
    keyword: &'static str,
    type_name: &'a str,
    name: &'a str,
    default_value: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenericInstanceRecord<'a> {
    return_type: &'a str,
    name: &'a str,
    rva: u64,
    offset: u64,
    va: u64,
}

impl<'a> ImageRecord<'a> {
    fn new(outcome: &'a ImageOutcome, config: &DumpConfig) -> Self {
        match outcome {
            ImageOutcome::Assembled(image) => ImageRecord {
                name: &image.name,
                error: None,
                typed_objects: image
                    .types
                    .iter()
                    .map(|declaration| TypedObject::new(declaration, config))
                    .collect(),
            },
            ImageOutcome::Failed(failure) => ImageRecord {
                name: &failure.name,
                error: Some(failure.error.to_string()),
                typed_objects: Vec::new(),
            },
        }
    }
}

impl<'a> TypedObject<'a> {
    fn new(declaration: &'a TypeDeclaration, config: &DumpConfig) -> Self {
        let mut attributes = declaration.attributes.clone();
        if declaration.serializable {
            attributes.push_str("[Serializable]\n");
        }

        TypedObject {
            namespace: &declaration.namespace,
            extends: &declaration.extends,
            attributes,
            visibility: declaration.visibility_tokens(),
            category: declaration.category,
            type_name: &declaration.name,
            type_def_index: config.dump_type_def_index.then_some(declaration.index),
            fields: declaration.fields.iter().map(FieldRecord::from).collect(),
            properties: declaration
                .properties
                .iter()
                .map(PropertyRecord::from)
                .collect(),
            methods: declaration.methods.iter().map(MethodRecord::from).collect(),
        }
    }
}

impl<'a> From<&'a Field> for FieldRecord<'a> {
    fn from(field: &'a Field) -> Self {
        FieldRecord {
            attributes: &field.attributes,
            visibility: &field.modifiers,
            type_name: &field.type_name,
            name: &field.name,
            default_value: field.default.as_ref().map(|value| value.as_text()),
            offset: field.offset.unwrap_or(0),
        }
    }
}

impl<'a> AccessorRecord<'a> {
    fn new(accessor: &'a PropertyAccessor, name: &'a str) -> Self {
        AccessorRecord {
            modifiers: &accessor.modifiers,
            return_type: &accessor.type_name,
            name,
        }
    }
}

impl<'a> From<&'a Property> for PropertyRecord<'a> {
    fn from(property: &'a Property) -> Self {
        let primary = property.primary();
        PropertyRecord {
            attributes: &property.attributes,
            modifiers: primary.map_or(&[][..], |accessor| &*accessor.modifiers),
            type_name: primary.map(|accessor| accessor.type_name.as_str()),
            name: &property.name,
            accessors: property.accessors(),
            get: property
                .get
                .as_ref()
                .map(|accessor| AccessorRecord::new(accessor, &property.name)),
            set: property
                .set
                .as_ref()
                .map(|accessor| AccessorRecord::new(accessor, &property.name)),
        }
    }
}

impl<'a> From<&'a Parameter> for ParameterRecord<'a> {
    fn from(parameter: &'a Parameter) -> Self {
        ParameterRecord {
            keyword: parameter.direction.keyword(),
            type_name: &parameter.type_name,
            name: &parameter.name,
            default_value: parameter.default.as_ref().map(|value| value.as_text()),
        }
    }
}

impl<'a> From<&'a Method> for MethodRecord<'a> {
    fn from(method: &'a Method) -> Self {
        let address = method.address.unwrap_or_default();

        // One record per specialization, each carrying its group's shared address
        let generic_instances = method
            .generic_groups
            .iter()
            .flat_map(|group| {
                let address = group.address.unwrap_or_default();
                group
                    .instances
                    .iter()
                    .map(move |instance| GenericInstanceRecord {
                        return_type: &instance.type_name,
                        name: &instance.method_name,
                        rva: address.rva,
                        offset: address.offset,
                        va: address.va,
                    })
            })
            .collect();

        MethodRecord {
            attributes: &method.attributes,
            modifiers: &method.modifiers,
            returns_by_ref: method.returns_by_ref,
            return_type: &method.return_type,
            name: &method.name,
            parameters: method.parameters.iter().map(ParameterRecord::from).collect(),
            rva: address.rva,
            offset: address.offset,
            va: address.va,
            slot: method.slot,
            is_abstract: method.is_abstract,
            generic_instances,
        }
    }
}

/// Render the JSON artifact into `out`.
///
/// # Errors
/// Returns [`crate::Error::Json`] if serialization or the sink fails.
pub fn write_json<W: Write>(
    outcomes: &[ImageOutcome],
    config: &DumpConfig,
    mut out: W,
) -> Result<()> {
    let document = Document {
        images: outcomes
            .iter()
            .map(|outcome| ImageRecord::new(outcome, config))
            .collect(),
    };

    serde_json::to_writer_pretty(&mut out, &document)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;

    use super::*;
    use crate::{
        decompiler::{
            literals::{DefaultLiteral, ParamDirection},
            model::{GenericGroup, GenericInstantiation, Image, ImageFailure},
        },
        metadata::provider::AddressTriple,
        Error,
    };

    fn render(outcomes: &[ImageOutcome]) -> Value {
        let mut buffer = Vec::new();
        write_json(outcomes, &DumpConfig::default(), &mut buffer).unwrap();
        serde_json::from_slice(&buffer).unwrap()
    }

    fn sample_type() -> TypeDeclaration {
        TypeDeclaration {
            index: 3,
            namespace: "Game".to_string(),
            name: "Pool".to_string(),
            category: TypeCategory::Class,
            visibility: "public",
            modifier: Some("static"),
            extends: Vec::new(),
            attributes: "[Preserve]\n".to_string(),
            serializable: true,
            fields: vec![
                Field {
                    attributes: String::new(),
                    modifiers: vec!["private", "static"],
                    is_const: false,
                    type_name: "int".to_string(),
                    name: "count".to_string(),
                    default: None,
                    offset: Some(0x18),
                },
                Field {
                    attributes: String::new(),
                    modifiers: vec!["public", "const"],
                    is_const: true,
                    type_name: "int".to_string(),
                    name: "Capacity".to_string(),
                    default: Some(DefaultLiteral::Value("64".to_string())),
                    offset: None,
                },
            ],
            properties: vec![Property {
                attributes: String::new(),
                name: "Count".to_string(),
                get: None,
                set: Some(PropertyAccessor {
                    method_index: 1,
                    modifiers: Arc::from(vec!["public", "static"]),
                    type_name: "int".to_string(),
                }),
            }],
            methods: vec![Method {
                index: 0,
                attributes: String::new(),
                modifiers: Arc::from(vec!["public", "static"]),
                returns_by_ref: false,
                return_type: "T".to_string(),
                name: "Rent<T>".to_string(),
                parameters: vec![Parameter {
                    direction: ParamDirection::In,
                    type_name: "bool".to_string(),
                    name: "clear".to_string(),
                    default: Some(DefaultLiteral::Value("false".to_string())),
                }],
                is_abstract: false,
                address: Some(AddressTriple {
                    rva: 0x10,
                    offset: 0x20,
                    va: 0x30,
                }),
                slot: None,
                generic_groups: vec![
                    GenericGroup {
                        pointer: 0x40,
                        address: Some(AddressTriple {
                            rva: 0x40,
                            offset: 0x50,
                            va: 0x60,
                        }),
                        instances: vec![
                            GenericInstantiation {
                                type_name: "Pool".to_string(),
                                method_name: "Rent<string>".to_string(),
                            },
                            GenericInstantiation {
                                type_name: "Pool".to_string(),
                                method_name: "Rent<object>".to_string(),
                            },
                        ],
                    },
                    GenericGroup {
                        pointer: 0,
                        address: None,
                        instances: vec![GenericInstantiation {
                            type_name: "Pool".to_string(),
                            method_name: "Rent<int>".to_string(),
                        }],
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_document_shape() {
        let outcomes = vec![ImageOutcome::Assembled(Image {
            index: 0,
            name: "Game.dll".to_string(),
            type_start: 0,
            types: vec![sample_type()],
        })];
        let json = render(&outcomes);

        let object = &json["images"][0]["typedObjects"][0];
        assert_eq!(json["images"][0]["name"], "Game.dll");
        assert!(json["images"][0].get("error").is_none());
        assert_eq!(object["attributes"], "[Preserve]\n[Serializable]\n");
        assert_eq!(object["visibility"], serde_json::json!(["public", "static"]));
        assert_eq!(object["category"], "class");
        assert_eq!(object["typeName"], "Pool");
        assert_eq!(object["typeDefIndex"], 3);

        let field = &object["fields"][0];
        assert_eq!(field["type"], "int");
        assert_eq!(field["visibility"], serde_json::json!(["private", "static"]));
        assert_eq!(field["defaultValue"], Value::Null);
        assert_eq!(field["offset"], 0x18);

        let constant = &object["fields"][1];
        assert_eq!(constant["defaultValue"], "64");
        assert_eq!(constant["offset"], 0);

        let property = &object["properties"][0];
        assert_eq!(property["type"], "int");
        assert_eq!(property["accessors"], serde_json::json!(["set"]));
        assert_eq!(property["get"], Value::Null);
        assert_eq!(property["set"]["returnType"], "int");

        let method = &object["methods"][0];
        assert_eq!(method["rva"], 0x10);
        assert_eq!(method["slot"], Value::Null);
        assert_eq!(method["parameters"][0]["keyword"], "in");
        assert_eq!(method["parameters"][0]["defaultValue"], "false");

        let instances = method["genericInstances"].as_array().unwrap();
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[1]["name"], "Rent<object>");
        assert_eq!(instances[1]["va"], 0x60);
        assert_eq!(instances[2]["rva"], 0);
    }

    #[test]
    fn test_failed_image_entry() {
        let outcomes = vec![ImageOutcome::Failed(ImageFailure {
            index: 0,
            name: "Broken.dll".to_string(),
            type_start: 0,
            error: Error::IndexOutOfRange {
                table: "methods",
                index: -1,
            },
        })];
        let json = render(&outcomes);

        let image = &json["images"][0];
        assert_eq!(image["name"], "Broken.dll");
        assert_eq!(image["error"], "Index -1 is out of range for table 'methods'");
        assert_eq!(image["typedObjects"], serde_json::json!([]));
    }
}
