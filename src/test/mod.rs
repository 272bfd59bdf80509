//! Shared fixtures for unit tests.
//!
//! [`SnapshotBuilder`] assembles small [`MetadataSnapshot`]s table by table, keeping member
//! ranges contiguous as long as members are added type after type. [`sample_snapshot`]
//! loads the three image game fixture that the integration tests use as well.

use crate::metadata::{
    definitions::{
        DefaultValueRef, FieldDefinition, ImageDefinition, MethodDefinition, ParameterDefinition,
        PropertyDefinition, TypeDefinition, TypeIndex,
    },
    provider::DefaultValue,
    snapshot::{MetadataSnapshot, TypeEntry},
    version::MetadataVersion,
};

const ELEMENT_TYPE_VALUETYPE: u8 = 0x11;

// The fixture under tests/samples, shared with the integration tests
pub fn sample_snapshot() -> MetadataSnapshot {
    MetadataSnapshot::from_json(include_str!("../../tests/samples/game_snapshot.json"))
        .expect("sample snapshot must parse")
}

/// Builds a [`MetadataSnapshot`] for tests.
pub struct SnapshotBuilder {
    snapshot: MetadataSnapshot,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        let mut snapshot = MetadataSnapshot::default();
        snapshot.version = MetadataVersion::new(24, 1);
        snapshot.pointer_size = 8;
        snapshot.strings = vec![String::new()];
        SnapshotBuilder { snapshot }
    }

    pub fn set_version(&mut self, version: MetadataVersion) -> &mut Self {
        self.snapshot.version = version;
        self
    }

    // Index of an existing string, or of the newly appended one
    fn intern(&mut self, value: &str) -> u32 {
        let position = match self.snapshot.strings.iter().position(|s| s == value) {
            Some(position) => position,
            None => {
                self.snapshot.strings.push(value.to_string());
                self.snapshot.strings.len() - 1
            }
        };
        u32::try_from(position).unwrap()
    }

    pub fn add_image(&mut self, name: &str) -> usize {
        let name_index = self.intern(name);
        let type_start = u32::try_from(self.snapshot.type_defs.len()).unwrap();
        self.snapshot.images.push(ImageDefinition {
            name_index,
            type_start,
            token: 1,
            ..Default::default()
        });
        self.snapshot.images.len() - 1
    }

    /// Adds a type definition to the most recently added image, if any.
    pub fn add_type(&mut self, namespace: &str, name: &str) -> usize {
        let index = self.snapshot.type_defs.len();
        let name_index = self.intern(name);
        let namespace_index = self.intern(namespace);

        self.snapshot.type_defs.push(TypeDefinition {
            name_index,
            namespace_index,
            field_start: table_position(self.snapshot.fields.len()),
            method_start: table_position(self.snapshot.methods.len()),
            property_start: table_position(self.snapshot.properties.len()),
            interfaces_start: table_position(self.snapshot.interface_indices.len()),
            token: 0x0200_0000 | u32::try_from(index + 1).unwrap(),
            ..Default::default()
        });

        if let Some(image) = self.snapshot.images.last_mut() {
            image.type_count += 1;
        }
        index
    }

    pub fn type_def_mut(&mut self, index: usize) -> &mut TypeDefinition {
        &mut self.snapshot.type_defs[index]
    }

    pub fn add_type_ref(&mut self, name: &str) -> TypeIndex {
        self.add_type_ref_with(TypeEntry {
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn add_type_ref_with_attrs(&mut self, name: &str, attrs: u16) -> TypeIndex {
        self.add_type_ref_with(TypeEntry {
            name: name.to_string(),
            attrs,
            ..Default::default()
        })
    }

    pub fn add_enum_type_ref(&mut self, name: &str, element: u8) -> TypeIndex {
        self.add_type_ref_with(TypeEntry {
            name: name.to_string(),
            kind: ELEMENT_TYPE_VALUETYPE,
            enum_element: Some(element),
            ..Default::default()
        })
    }

    pub fn add_type_ref_with(&mut self, entry: TypeEntry) -> TypeIndex {
        self.snapshot.types.push(entry);
        TypeIndex::try_from(self.snapshot.types.len() - 1).unwrap()
    }

    pub fn add_interface(&mut self, type_def: usize, interface: TypeIndex) {
        let position = table_position(self.snapshot.interface_indices.len());
        let owner = &mut self.snapshot.type_defs[type_def];
        if owner.interfaces_count == 0 {
            owner.interfaces_start = position;
        }
        owner.interfaces_count += 1;
        self.snapshot.interface_indices.push(interface);
    }

    pub fn add_field(&mut self, type_def: usize, name: &str, type_index: TypeIndex) -> usize {
        let index = self.snapshot.fields.len();
        let name_index = self.intern(name);

        let owner = &mut self.snapshot.type_defs[type_def];
        if owner.field_count == 0 {
            owner.field_start = table_position(index);
        }
        owner.field_count += 1;

        self.snapshot.fields.push(FieldDefinition {
            name_index,
            type_index,
            token: 0x0400_0000 | u32::try_from(index + 1).unwrap(),
            ..Default::default()
        });
        index
    }

    pub fn set_field_offset(&mut self, type_def: usize, local_index: usize, offset: i32) {
        let offsets = self.snapshot.field_offsets.entry(type_def).or_default();
        if offsets.len() <= local_index {
            offsets.resize(local_index + 1, 0);
        }
        offsets[local_index] = offset;
    }

    pub fn set_field_default(
        &mut self,
        field: usize,
        type_index: TypeIndex,
        data_index: i32,
        value: DefaultValue,
    ) {
        self.snapshot.field_default_values.insert(
            field,
            DefaultValueRef {
                type_index,
                data_index,
            },
        );
        self.snapshot.literals.insert(data_index, value);
    }

    /// Adds a property; `get` and `set` are relative to the type's first method.
    pub fn add_property(&mut self, type_def: usize, name: &str, get: i32, set: i32) -> usize {
        let index = self.snapshot.properties.len();
        let name_index = self.intern(name);

        let owner = &mut self.snapshot.type_defs[type_def];
        if owner.property_count == 0 {
            owner.property_start = table_position(index);
        }
        owner.property_count += 1;

        self.snapshot.properties.push(PropertyDefinition {
            name_index,
            get,
            set,
            token: 0x1700_0000 | u32::try_from(index + 1).unwrap(),
            ..Default::default()
        });
        index
    }

    pub fn add_method(
        &mut self,
        type_def: usize,
        name: &str,
        flags: u32,
        return_type: TypeIndex,
    ) -> usize {
        let index = self.snapshot.methods.len();
        let name_index = self.intern(name);

        let owner = &mut self.snapshot.type_defs[type_def];
        if owner.method_count == 0 {
            owner.method_start = table_position(index);
        }
        owner.method_count += 1;

        self.snapshot.methods.push(MethodDefinition {
            name_index,
            declaring_type: u32::try_from(type_def).unwrap(),
            return_type,
            parameter_start: table_position(self.snapshot.parameters.len()),
            token: 0x0600_0000 | u32::try_from(index + 1).unwrap(),
            flags: u16::try_from(flags).unwrap(),
            ..Default::default()
        });
        index
    }

    pub fn method_mut(&mut self, index: usize) -> &mut MethodDefinition {
        &mut self.snapshot.methods[index]
    }

    pub fn add_parameter(&mut self, method: usize, name: &str, type_index: TypeIndex) -> usize {
        let index = self.snapshot.parameters.len();
        let name_index = self.intern(name);

        let owner = &mut self.snapshot.methods[method];
        if owner.parameter_count == 0 {
            owner.parameter_start = table_position(index);
        }
        owner.parameter_count += 1;

        self.snapshot.parameters.push(ParameterDefinition {
            name_index,
            token: 0x0800_0000 | u32::try_from(index + 1).unwrap(),
            type_index,
        });
        index
    }

    /// Registers the code pointer of a method under the row id of its token.
    pub fn set_method_pointer(&mut self, image: &str, method: usize, pointer: u64) {
        let rid = (self.snapshot.methods[method].token & 0x00FF_FFFF) as usize;
        let pointers = self
            .snapshot
            .method_pointers
            .entry(image.to_string())
            .or_default();
        if pointers.len() < rid {
            pointers.resize(rid, 0);
        }
        pointers[rid - 1] = pointer;
    }

    pub fn build(self) -> MetadataSnapshot {
        self.snapshot
    }
}

fn table_position(len: usize) -> i32 {
    i32::try_from(len).unwrap()
}
