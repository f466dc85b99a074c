//! Field collection across embedded structs
//!
//! Fields declared directly on a struct are recorded under their own name.
//! Fields of embedded structs (by value or through one pointer) are promoted
//! unless a direct field already uses the name. When two embedded structs
//! promote the same name and no direct field claims it, the name is dropped.

use rustc_hash::FxHashMap;
use tether_types::{StructField, Type, TypeContext, TypeId};
use tracing::trace;

use crate::proxy::FieldPath;

/// A field reachable from a struct, with the path that reaches it
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedField {
    /// The field as declared on its own struct
    pub field: StructField,
    /// Path from the collected type down to the field
    pub path: FieldPath,
}

/// Collect the exported fields reachable from `ty`, keyed by declared name
///
/// Returns an empty map for anything that is not a struct.
pub fn collect_fields(types: &TypeContext, ty: TypeId) -> FxHashMap<String, CollectedField> {
    let mut chain = Vec::new();
    collect(types, ty, &mut chain)
}

fn collect(
    types: &TypeContext,
    ty: TypeId,
    chain: &mut Vec<TypeId>,
) -> FxHashMap<String, CollectedField> {
    let mut direct = FxHashMap::default();
    let Some(fields) = types.struct_fields(ty) else {
        return direct;
    };

    chain.push(ty);
    let mut promoted: FxHashMap<String, Option<CollectedField>> = FxHashMap::default();
    for (index, field) in fields.iter().enumerate() {
        if field.is_exported() {
            direct.insert(
                field.name.clone(),
                CollectedField {
                    field: field.clone(),
                    path: FieldPath::root(index),
                },
            );
        }

        if !field.embedded {
            continue;
        }
        let Some(inner) = embedded_struct(types, field.ty) else {
            continue;
        };
        if chain.contains(&inner) {
            continue;
        }
        for (name, mut sub) in collect(types, inner, chain) {
            sub.path = sub.path.nested_under(index);
            promoted
                .entry(name)
                .and_modify(|slot| *slot = None)
                .or_insert(Some(sub));
        }
    }
    chain.pop();

    for (name, sub) in promoted {
        match sub {
            Some(sub) => {
                direct.entry(name).or_insert(sub);
            }
            None if !direct.contains_key(&name) => {
                trace!(ty = %types.name_of(ty), field = %name, "ambiguous promoted field dropped");
            }
            None => {}
        }
    }
    direct
}

/// The struct an embedded field's type names, directly or through one pointer
fn embedded_struct(types: &TypeContext, ty: TypeId) -> Option<TypeId> {
    match types.ty(ty)? {
        Type::Struct(_) => Some(ty),
        Type::Pointer { elem } => match types.ty(*elem)? {
            Type::Struct(_) => Some(*elem),
            _ => None,
        },
        _ => None,
    }
}
