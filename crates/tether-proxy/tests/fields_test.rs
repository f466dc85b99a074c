use std::sync::Arc;

use tether_proxy::{
    collect_fields, Accessor, AccessorTable, Bridge, Metamethod, NativeResult, NoopAccessors,
    ProxyKind, ScriptValue,
};
use tether_types::{
    ChanDir, MethodDef, PrimitiveType, StructField, StructType, Type, TypeContext, TypeId,
};

fn strukt(fields: Vec<StructField>) -> Type {
    Type::Struct(StructType::new(fields))
}

fn bridge(types: TypeContext) -> Bridge {
    Bridge::new(Arc::new(types), Arc::new(NoopAccessors))
}

fn path(bridge: &Bridge, ty: TypeId, name: &str) -> Option<Vec<usize>> {
    let proxy = bridge.proxy(ty)?;
    proxy.field(name).map(|path| path.as_slice().to_vec())
}

#[test]
fn test_direct_field_shadows_promoted() {
    let mut types = TypeContext::new();
    let int = types.int_type();
    let string = types.string_type();
    let inner = types
        .named(
            "Inner",
            strukt(vec![
                StructField::new("Name", int),
                StructField::new("Depth", int),
            ]),
        )
        .unwrap();
    let outer = types
        .named(
            "Outer",
            strukt(vec![
                StructField::new("Name", string),
                StructField::embedded("Inner", inner),
            ]),
        )
        .unwrap();
    let bridge = bridge(types);

    assert_eq!(path(&bridge, outer, "Name"), Some(vec![0]));
    assert_eq!(path(&bridge, outer, "name"), Some(vec![0]));
    assert_eq!(path(&bridge, outer, "Depth"), Some(vec![1, 1]));
    assert_eq!(path(&bridge, outer, "Inner"), Some(vec![1]));
}

#[test]
fn test_ambiguous_promoted_field_dropped() {
    let mut types = TypeContext::new();
    let int = types.int_type();
    let left = types
        .named("Left", strukt(vec![StructField::new("ID", int)]))
        .unwrap();
    let right = types
        .named(
            "Right",
            strukt(vec![
                StructField::new("ID", int),
                StructField::new("Extra", int),
            ]),
        )
        .unwrap();
    let both = types.struct_of(vec![
        StructField::embedded("Left", left),
        StructField::embedded("Right", right),
    ]);
    let claimed = types.struct_of(vec![
        StructField::embedded("Left", left),
        StructField::embedded("Right", right),
        StructField::new("ID", int),
    ]);

    let fields = collect_fields(&types, both);
    assert!(!fields.contains_key("ID"));
    assert_eq!(fields["Extra"].path.as_slice(), &[1, 1]);

    let fields = collect_fields(&types, claimed);
    assert_eq!(fields["ID"].path.as_slice(), &[2]);

    let bridge = bridge(types);
    assert_eq!(path(&bridge, both, "ID"), None);
    assert_eq!(path(&bridge, both, "id"), None);
    assert_eq!(path(&bridge, both, "extra"), Some(vec![1, 1]));
}

#[test]
fn test_same_struct_embedded_at_different_depths() {
    let mut types = TypeContext::new();
    let int = types.int_type();
    let base = types
        .named("Base", strukt(vec![StructField::new("Tag", int)]))
        .unwrap();
    let base_ptr = types.pointer_to(base);
    let mid = types
        .named("Mid", strukt(vec![StructField::embedded("Base", base_ptr)]))
        .unwrap();
    let top = types.struct_of(vec![
        StructField::embedded("Mid", mid),
        StructField::embedded("Base", base),
    ]);

    // Tag is promoted through both Mid and Base, so neither wins
    let fields = collect_fields(&types, top);
    assert!(!fields.contains_key("Tag"));
    assert_eq!(fields["Base"].path.as_slice(), &[1]);
    assert_eq!(fields["Mid"].path.as_slice(), &[0]);
}

#[test]
fn test_hidden_field_type_reached_through_method() {
    let mut types = TypeContext::new();
    let int = types.int_type();
    let payload = types
        .named("Payload", strukt(vec![StructField::new("Size", int)]))
        .unwrap();
    let blob = types
        .named("Blob", strukt(vec![StructField::new("Bytes", int)]))
        .unwrap();
    let holder = types
        .named(
            "Holder",
            strukt(vec![
                StructField::new("payload", payload),
                StructField::new("Blob", blob).with_tag("tether", "-"),
            ]),
        )
        .unwrap();
    let mut bridge = bridge(types);
    bridge.config_mut().set_preprocess(true);

    let proxy = bridge.new_value(holder).unwrap();
    assert_eq!(proxy.field_count(), 0);
    assert!(!bridge.config().cache().contains(payload));
    // a `-` tag hides the name but the field type is still reachable
    assert!(bridge.config().cache().contains(blob));

    let mut types = TypeContext::new();
    let int = types.int_type();
    let payload = types
        .named("Payload", strukt(vec![StructField::new("Size", int)]))
        .unwrap();
    let holder = types
        .named("Holder", strukt(vec![StructField::new("payload", payload)]))
        .unwrap();
    types
        .add_method(holder, MethodDef::new("Payload", 0).returns(payload))
        .unwrap();
    let mut bridge = Bridge::new(Arc::new(types), Arc::new(NoopAccessors));
    bridge.config_mut().set_preprocess(true);

    let proxy = bridge.new_value(holder).unwrap();
    assert!(proxy.field("payload").is_none());
    assert!(proxy.method("payload").is_some());
    assert!(bridge.config().cache().contains(payload));
}

#[test]
fn test_tag_alias_and_tag_key() {
    let mut types = TypeContext::new();
    let int = types.int_type();
    let record = types
        .named(
            "Record",
            strukt(vec![
                StructField::new("Count", int)
                    .with_tag("tether", "n")
                    .with_tag("lua", "count_total"),
                StructField::new("Label", int).with_tag("lua", "-"),
            ]),
        )
        .unwrap();
    let types = Arc::new(types);

    let default = Bridge::new(Arc::clone(&types), Arc::new(NoopAccessors));
    let proxy = default.proxy(record).unwrap();
    let mut names: Vec<_> = proxy.fields().unwrap().keys().cloned().collect();
    names.sort();
    assert_eq!(names, vec!["Label", "label", "n"]);

    let mut lua = Bridge::new(types, Arc::new(NoopAccessors));
    lua.config_mut().set_tag_key("lua");
    let proxy = lua.proxy(record).unwrap();
    let names: Vec<_> = proxy.fields().unwrap().keys().cloned().collect();
    assert_eq!(names, vec!["count_total"]);
}

#[test]
fn test_naming_overrides() {
    let mut types = TypeContext::new();
    let int = types.int_type();
    let stats = types
        .named(
            "Stats",
            strukt(vec![StructField::new("Hits", int).with_tag("tether", "-")]),
        )
        .unwrap();
    types
        .add_method(stats, MethodDef::new("Reset", 0))
        .unwrap();
    let mut bridge = bridge(types);
    let config = bridge.config_mut();
    config.set_field_names(|types, owner, field| {
        vec![format!("{}_{}", types.name_of(owner), field.name).to_lowercase()]
    });
    config.set_method_names(|_types, _receiver, method| vec![format!("do{}", method.name())]);

    let proxy = bridge.proxy(stats).unwrap();
    assert_eq!(proxy.field("stats_hits").unwrap().as_slice(), &[0]);
    assert!(proxy.field("Hits").is_none());
    assert_eq!(proxy.method_count(), 1);
    assert!(proxy.method("doReset").is_some());
}

#[test]
fn test_empty_names_skip_registration() {
    let mut types = TypeContext::new();
    let int = types.int_type();
    let stats = types
        .named("Stats", strukt(vec![StructField::new("Hits", int)]))
        .unwrap();
    types
        .add_method(stats, MethodDef::new("Reset", 0))
        .unwrap();
    let mut bridge = bridge(types);
    bridge
        .config_mut()
        .set_method_names(|_types, _receiver, _method| Vec::new());

    let proxy = bridge.proxy(stats).unwrap();
    assert_eq!(proxy.method_count(), 0);
    assert_eq!(proxy.field_count(), 2);
}

fn named_accessors() -> AccessorTable {
    let mut table = AccessorTable::new();
    for accessor in Accessor::ALL {
        table.register(accessor, move |_args: &[ScriptValue]| -> NativeResult<Vec<ScriptValue>> {
            Ok(vec![ScriptValue::from(accessor.name())])
        });
    }
    table
}

fn wired(bridge: &Bridge, ty: TypeId) -> Vec<(Metamethod, String)> {
    let proxy = bridge.proxy(ty).unwrap();
    proxy
        .op_slots()
        .into_iter()
        .map(|slot| {
            let stub = proxy.op(slot).unwrap();
            let result = stub(&[]).unwrap();
            (slot, result[0].to_string())
        })
        .collect()
}

fn ops(pairs: &[(Metamethod, &str)]) -> Vec<(Metamethod, String)> {
    pairs
        .iter()
        .map(|(slot, name)| (*slot, name.to_string()))
        .collect()
}

#[test]
fn test_operations_per_kind() {
    use Metamethod::*;

    let mut types = TypeContext::new();
    let int = types.int_type();
    let array = types.array_of(int, 4);
    let chan = types.chan_of(int, ChanDir::Both);
    let map = types.map_of(int, int);
    let slice = types.slice_of(int);
    let point = types.struct_of(vec![StructField::new("X", int)]);
    let array_ptr = types.pointer_to(array);
    let point_ptr = types.pointer_to(point);
    let int_ptr = types.pointer_to(int);
    let bridge = Bridge::new(Arc::new(types), Arc::new(named_accessors()));

    assert_eq!(
        wired(&bridge, array),
        ops(&[
            (Index, "arrayIndex"),
            (Len, "arrayLen"),
            (Call, "arrayCall"),
            (Eq, "arrayEq"),
            (ToString, "tostring"),
        ])
    );
    assert_eq!(
        wired(&bridge, chan),
        ops(&[
            (Index, "chanIndex"),
            (Len, "chanLen"),
            (Call, "chanCall"),
            (Eq, "chanEq"),
            (Unm, "chanUnm"),
            (ToString, "tostring"),
        ])
    );
    assert_eq!(
        wired(&bridge, map),
        ops(&[
            (Index, "mapIndex"),
            (NewIndex, "mapNewIndex"),
            (Len, "mapLen"),
            (Call, "mapCall"),
            (ToString, "tostring"),
        ])
    );
    assert_eq!(
        wired(&bridge, slice),
        ops(&[
            (Index, "sliceIndex"),
            (NewIndex, "sliceNewIndex"),
            (Len, "sliceLen"),
            (Call, "sliceCall"),
            (Add, "sliceAdd"),
            (ToString, "tostring"),
        ])
    );
    assert_eq!(
        wired(&bridge, point),
        ops(&[
            (Index, "structIndex"),
            (Eq, "structEq"),
            (ToString, "tostring"),
        ])
    );
    assert_eq!(
        wired(&bridge, array_ptr),
        ops(&[
            (Index, "arrayPtrIndex"),
            (NewIndex, "arrayPtrNewIndex"),
            (Len, "arrayLen"),
            (Call, "arrayCall"),
            (Eq, "ptrEq"),
            (Unm, "ptrUnm"),
            (Pow, "ptrPow"),
            (ToString, "tostring"),
        ])
    );
    assert_eq!(
        wired(&bridge, point_ptr),
        ops(&[
            (Index, "structPtrIndex"),
            (NewIndex, "structPtrNewIndex"),
            (Eq, "ptrEq"),
            (Unm, "ptrUnm"),
            (Pow, "ptrPow"),
            (ToString, "tostring"),
        ])
    );
    assert_eq!(
        wired(&bridge, int_ptr),
        ops(&[
            (Index, "ptrIndex"),
            (Eq, "ptrEq"),
            (Unm, "ptrUnm"),
            (Pow, "ptrPow"),
            (ToString, "tostring"),
        ])
    );

    let point = bridge.proxy(point).unwrap();
    assert!(point.fields().is_some());
    let point_ptr = bridge.proxy(point_ptr).unwrap();
    assert!(point_ptr.fields().is_none());
}

#[test]
fn test_constructor_operations() {
    let mut types = TypeContext::new();
    let int = types.int_type();
    let bridge = Bridge::new(Arc::new(types), Arc::new(named_accessors()));

    let proxy = bridge.new_type(int);
    let call = proxy.op(Metamethod::Call).unwrap();
    let eq = proxy.op(Metamethod::Eq).unwrap();
    assert_eq!(call(&[]).unwrap()[0].to_string(), "typeCall");
    assert_eq!(eq(&[]).unwrap()[0].to_string(), "typeEq");
    assert!(!proxy.has_op(Metamethod::ToString));
}

#[test]
fn test_receiver_convention() {
    let mut types = TypeContext::new();
    let counter = types
        .named("Counter", Type::Primitive(PrimitiveType::Int))
        .unwrap();
    types.add_method(counter, MethodDef::new("Value", 0)).unwrap();
    types
        .add_method(counter, MethodDef::new("Inc", 1).on_pointer())
        .unwrap();
    let counter_ptr = types.pointer_to(counter);
    let counters = types.named("Counters", Type::Slice { elem: counter }).unwrap();
    types
        .add_method(counters, MethodDef::new("Total", 2))
        .unwrap();

    let mut table = named_accessors();
    table.set_method_binder(|_types, method, ptr_receiver| {
        let tag = format!("{}:{}", method.name(), ptr_receiver);
        Arc::new(move |_args: &[ScriptValue]| -> NativeResult<Vec<ScriptValue>> {
            Ok(vec![ScriptValue::string(&tag)])
        })
    });
    let bridge = Bridge::new(Arc::new(types), Arc::new(table));

    let proxy = bridge.proxy(counter_ptr).unwrap();
    assert_eq!(proxy.kind(), Some(ProxyKind::Ptr));
    let mut names: Vec<_> = proxy.methods().keys().cloned().collect();
    names.sort();
    assert_eq!(names, vec!["Inc", "Value", "inc", "value"]);
    let inc = proxy.method("inc").unwrap();
    assert!(inc.ptr_receiver);
    assert_eq!((inc.call)(&[]).unwrap()[0].to_string(), "Inc:true");

    let proxy = bridge.proxy(counters).unwrap();
    let total = proxy.method("Total").unwrap();
    assert!(!total.ptr_receiver);
    assert_eq!((total.call)(&[]).unwrap()[0].to_string(), "Total:false");
}
