//! Grouping of generic method specializations.
//!
//! IL2CPP shares compiled code between specializations whose type arguments have the same
//! representation, so several specializations usually point at one generic method body.
//! Grouping by that pointer shows which instantiations run which code.

use std::collections::HashMap;

use crate::{
    decompiler::model::{GenericGroup, GenericInstantiation},
    metadata::provider::MetadataProvider,
    Result,
};

/// Group the known specializations of a method definition by their shared code pointer.
///
/// Groups appear in the order their pointer is first seen, specializations within a
/// group in source order. A zero pointer still forms a group, without an address.
///
/// # Errors
/// Returns an error if a specialization name cannot be resolved.
pub fn group_instantiations<P: MetadataProvider + ?Sized>(
    provider: &P,
    method_index: usize,
) -> Result<Vec<GenericGroup>> {
    let mut groups: Vec<GenericGroup> = Vec::new();
    let mut positions: HashMap<u64, usize> = HashMap::new();

    for spec in provider.method_specs_of(method_index) {
        let pointer = provider.method_spec_pointer(spec);
        let (type_name, method_name) = provider.method_spec_name(spec)?;
        let instance = GenericInstantiation {
            type_name,
            method_name,
        };

        match positions.get(&pointer) {
            Some(&position) => groups[position].instances.push(instance),
            None => {
                positions.insert(pointer, groups.len());
                groups.push(GenericGroup {
                    pointer,
                    address: (pointer != 0).then(|| provider.address_triple(pointer)),
                    instances: vec![instance],
                });
            }
        }
    }

    Ok(groups)
}
