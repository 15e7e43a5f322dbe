use std::rc::Rc;

use attrkit_core::{name, AttributeAccess, Error, SlotStorage, Value};
use attrkit_member::{
    AliasConfig, AliasDescriptor, AliasFlags, AliasRead, GuardScope, Instance, Member,
    ObjectType, ObjectTypeBuilder,
};

fn leaf_type() -> Rc<ObjectType> {
    ObjectTypeBuilder::new("Leaf")
        .member(Member::slot(name!("value")))
        .build()
}

fn holder_type() -> Rc<ObjectType> {
    ObjectTypeBuilder::new("Holder")
        .member(Member::slot(name!("leaf")))
        .alias(
            name!("leaf_alias"),
            AliasDescriptor::new(name!("leaf"), None, false),
        )
        .alias(
            name!("deep"),
            AliasDescriptor::new(name!("leaf"), Some(name!("value")), false),
        )
        .build()
}

#[test]
fn single_hop_reads_the_named_attribute() {
    let leaf = Instance::new(&leaf_type());
    let holder = Instance::new(&holder_type());
    holder
        .set_attribute(&name!("leaf"), Value::from(leaf.to_ref()))
        .unwrap();

    let alias = holder.object_type().alias(&name!("leaf_alias")).unwrap();
    let value = alias
        .get(Some(&*holder as &dyn AttributeAccess))
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(value, Value::from(leaf.to_ref()));
}

#[test]
fn double_hop_reads_through_the_sub_object() {
    let leaf = Instance::new(&leaf_type());
    let holder = Instance::new(&holder_type());
    holder
        .set_attribute(&name!("leaf"), Value::from(leaf.to_ref()))
        .unwrap();
    leaf.set_attribute(&name!("value"), Value::from("deep value"))
        .unwrap();

    assert_eq!(
        holder.get_attribute(&name!("deep")).unwrap(),
        Value::from("deep value")
    );
}

#[test]
fn set_then_get_round_trips() {
    let leaf = Instance::new(&leaf_type());
    let holder = Instance::new(&holder_type());
    let other_leaf = Instance::new(&leaf_type());
    holder
        .set_attribute(&name!("leaf"), Value::from(leaf.to_ref()))
        .unwrap();

    holder
        .set_attribute(&name!("deep"), Value::from(17))
        .unwrap();
    assert_eq!(holder.get_attribute(&name!("deep")).unwrap(), Value::from(17));
    assert_eq!(leaf.get_slot(0), Some(Value::from(17)));

    holder
        .set_attribute(&name!("leaf_alias"), Value::from(other_leaf.to_ref()))
        .unwrap();
    assert_eq!(
        holder.get_attribute(&name!("leaf")).unwrap(),
        Value::from(other_leaf.to_ref())
    );
}

#[test]
fn missing_target_is_wrapped_with_context() {
    let holder = Instance::new(&holder_type());
    holder.set_attribute(&name!("leaf"), Value::from(5)).unwrap();

    let get_err = holder.get_attribute(&name!("deep")).unwrap_err();
    assert!(get_err.is_not_found());
    assert!(format!("{}", get_err).starts_with("error while getting alias - "));

    let set_err = holder
        .set_attribute(&name!("deep"), Value::Null)
        .unwrap_err();
    assert!(set_err.is_not_found());
    assert!(format!("{}", set_err).starts_with("error while setting alias - "));
}

#[test]
fn self_referential_alias_reports_recursion() {
    let ty = ObjectTypeBuilder::new("Loop")
        .alias(
            name!("again"),
            AliasDescriptor::new(name!("again"), None, false),
        )
        .build();
    let obj = Instance::new(&ty);

    let err = obj.get_attribute(&name!("again")).unwrap_err();
    assert!(err.is_recursion());
    assert_eq!(
        format!("{}", err),
        "error while getting alias - recursion detected"
    );

    let err = obj
        .set_attribute(&name!("again"), Value::from(1))
        .unwrap_err();
    assert!(err.is_recursion());

    // Markers are gone once the outer call returns.
    let alias = ty.alias(&name!("again")).unwrap();
    assert!(alias.active_flags(&*obj).is_empty());
}

#[test]
fn recursion_error_is_raised_directly_by_the_reentered_descriptor() {
    let ty = ObjectTypeBuilder::new("Loop")
        .alias(
            name!("again"),
            AliasDescriptor::new(name!("again"), None, false),
        )
        .build();
    let obj = Instance::new(&ty);
    let alias = ty.alias(&name!("again")).unwrap();

    let err = alias.get_value(&*obj).unwrap_err();
    match err {
        Error::Propagated { context, source } => {
            assert_eq!(context, "error while getting alias");
            assert!(matches!(*source, Error::Recursion { .. }));
        }
        other => panic!("unexpected error: {}", other),
    }
}

/// `A.reading -> A.next (B).reading -> B.next (C).reading`, where the last hop is
/// a plain slot. The same descriptor is re-entered for a different target.
fn chain(scope: GuardScope) -> Result<Value, Error> {
    let end = ObjectTypeBuilder::new("End")
        .member(Member::slot(name!("reading")))
        .build();
    let link = ObjectTypeBuilder::new("Link")
        .member(Member::slot(name!("next")))
        .alias(
            name!("reading"),
            AliasDescriptor::with_scope(name!("next"), Some(name!("reading")), false, scope),
        )
        .build();

    let c = Instance::new(&end);
    c.set_attribute(&name!("reading"), Value::from(5))?;
    let b = Instance::new(&link);
    b.set_attribute(&name!("next"), Value::from(c.to_ref()))?;
    let a = Instance::new(&link);
    a.set_attribute(&name!("next"), Value::from(b.to_ref()))?;

    a.get_attribute(&name!("reading"))
}

#[test]
fn per_target_guard_allows_nested_resolution_on_other_objects() {
    assert_eq!(chain(GuardScope::PerTarget).unwrap(), Value::from(5));
}

#[test]
fn per_descriptor_guard_is_conservative() {
    let err = chain(GuardScope::PerDescriptor).unwrap_err();
    assert!(err.is_recursion());
}

#[test]
fn flags_are_held_only_during_the_call() {
    let leaf = Instance::new(&leaf_type());
    let holder = Instance::new(&holder_type());
    holder
        .set_attribute(&name!("leaf"), Value::from(leaf.to_ref()))
        .unwrap();
    let alias = holder.object_type().alias(&name!("deep")).unwrap();

    holder.get_attribute(&name!("deep")).unwrap();
    assert_eq!(alias.active_flags(&*holder), AliasFlags::empty());
}

#[test]
fn type_level_access_yields_the_descriptor() {
    let ty = holder_type();
    match ty.get_alias(&name!("deep")).unwrap() {
        AliasRead::Descriptor(alias) => {
            assert_eq!(alias.name(), &name!("leaf"));
            assert_eq!(alias.attr(), Some(&name!("value")));
            assert!(!alias.observable());
        }
        AliasRead::Value(v) => panic!("expected descriptor, got {:?}", v),
    }
}

#[test]
fn descriptor_built_from_json_config() {
    let config = AliasConfig::from_json(r#"{"name": "leaf", "attr": "value"}"#).unwrap();
    let ty = ObjectTypeBuilder::new("Holder")
        .member(Member::slot(name!("leaf")))
        .alias(name!("deep"), AliasDescriptor::from_config(config))
        .build();
    let leaf = Instance::new(&leaf_type());
    let holder = Instance::new(&ty);
    holder
        .set_attribute(&name!("leaf"), Value::from(leaf.to_ref()))
        .unwrap();

    holder.set_attribute(&name!("deep"), Value::from(true)).unwrap();
    assert_eq!(leaf.get_slot(0), Some(Value::from(true)));
}
