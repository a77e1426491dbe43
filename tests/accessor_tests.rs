mod common;

use chrono::{TimeZone, Utc};
use common::{RecordingAdapter, isolated_schema};
use modelschema::{
    CustomType, Entity, ModelBase, ModelClass, ModelSettings, Properties, Result, Schema,
    SchemaError, SchemaSettings, TypeRef, Value,
};
use serde_json::json;
use std::sync::Arc;

fn schema() -> Schema {
    isolated_schema(Arc::new(RecordingAdapter::bare()), SchemaSettings::new())
}

fn typed_model(schema: &Schema) -> Result<Arc<ModelClass>> {
    schema.define(
        "Sample",
        Properties::new()
            .with("name", TypeRef::String)
            .with("score", TypeRef::Number)
            .with("count", TypeRef::Integer)
            .with("active", TypeRef::Boolean)
            .with("born", TypeRef::Date)
            .with("bio", TypeRef::Text)
            .with("meta", TypeRef::Json)
            .with("tags", TypeRef::list(TypeRef::String)),
        ModelSettings::new(),
    )
}

fn blank(model: &Arc<ModelClass>) -> Result<Entity> {
    model.create(Vec::<(String, Value)>::new())
}

#[test]
fn scalar_properties_store_coerced_values() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = blank(&model)?;

    entity.set("name", 12)?;
    entity.set("score", "4.5")?;
    entity.set("count", 9.99)?;
    entity.set("bio", Value::Integer(7))?;

    assert_eq!(entity.get("name")?, Some(Value::Text("12".into())));
    assert_eq!(entity.get("score")?, Some(Value::Float(4.5)));
    assert_eq!(entity.get("count")?, Some(Value::Integer(9)));
    assert_eq!(entity.get("bio")?, Some(Value::Integer(7)));
    Ok(())
}

#[test]
fn coercion_is_idempotent() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = blank(&model)?;

    for (attr, raw) in [
        ("name", Value::Integer(3)),
        ("score", Value::Text("8".into())),
        ("count", Value::Float(2.2)),
        ("active", Value::Text("yes".into())),
        ("born", Value::Text("2020-05-17".into())),
    ] {
        entity.set(attr, raw)?;
        let once = entity.get(attr)?.unwrap();
        entity.set(attr, once.clone())?;
        assert_eq!(entity.get(attr)?, Some(once), "{} changed on re-coercion", attr);
    }
    Ok(())
}

#[test]
fn null_is_stored_as_is_for_every_type() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = blank(&model)?;

    for attr in model.properties()?.names() {
        entity.set(&attr, Value::Null)?;
        assert_eq!(entity.get(&attr)?, Some(Value::Null));
    }

    entity.set("name", None::<String>)?;
    assert_eq!(entity.raw("name"), Some(&Value::Null));

    entity.set("name", "x")?;
    assert_eq!(entity.unset("name"), Some(Value::Text("x".into())));
    assert_eq!(entity.get("name")?, None);
    Ok(())
}

#[test]
fn boolean_properties_follow_truthiness_except_false_string() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = blank(&model)?;

    let cases = [
        (Value::Text("false".into()), false),
        (Value::Text("true".into()), true),
        (Value::Text("1".into()), true),
        (Value::Text("0".into()), true),
        (Value::Integer(1), true),
        (Value::Integer(0), false),
        (Value::Text(String::new()), false),
        (Value::Boolean(false), false),
    ];

    for (raw, expected) in cases {
        entity.set("active", raw.clone())?;
        assert_eq!(
            entity.get("active")?,
            Some(Value::Boolean(expected)),
            "input {:?}",
            raw
        );
    }
    Ok(())
}

#[test]
fn date_properties_always_hold_dates() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = blank(&model)?;
    let expected = Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap();

    entity.set("born", "2021-01-02T03:04:05Z")?;
    assert_eq!(entity.get("born")?, Some(Value::Date(expected)));

    entity.set("born", expected.timestamp_millis())?;
    assert_eq!(entity.get("born")?, Some(Value::Date(expected)));

    entity.set("born", expected)?;
    assert_eq!(entity.get("born")?, Some(Value::Date(expected)));
    Ok(())
}

#[test]
fn json_and_opaque_values_are_not_coerced() -> Result<()> {
    let schema = schema();
    schema.register_type(CustomType::opaque("Point"))?;
    let model = schema.define(
        "Shape",
        Properties::new()
            .with("meta", TypeRef::Json)
            .with("origin", TypeRef::named("Point")),
        ModelSettings::new(),
    )?;
    let mut shape = blank(&model)?;

    shape.set("meta", Value::Json(json!({"a": [1, 2]})))?;
    shape.set("origin", Value::List(vec![Value::Integer(0), Value::Float(1.5)]))?;

    assert_eq!(shape.get("meta")?, Some(Value::Json(json!({"a": [1, 2]}))));
    assert_eq!(
        shape.get("origin")?,
        Some(Value::List(vec![Value::Integer(0), Value::Float(1.5)]))
    );
    assert!(model.resolved_type("origin")?.unwrap().is_opaque());
    Ok(())
}

#[test]
fn list_properties_coerce_each_item() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = blank(&model)?;

    entity.set("tags", Value::List(vec![Value::Integer(1), Value::Null, Value::Boolean(true)]))?;
    assert_eq!(
        entity.get("tags")?,
        Some(Value::List(vec!["1".into(), Value::Null, "true".into()]))
    );

    assert!(matches!(
        entity.set("tags", "solo"),
        Err(SchemaError::Coercion(_))
    ));
    Ok(())
}

#[test]
fn coercion_failure_propagates_and_keeps_previous_value() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = blank(&model)?;

    entity.set("score", 10)?;
    let err = entity.set("score", "ten").unwrap_err();

    assert!(matches!(err, SchemaError::Coercion(_)));
    assert_eq!(entity.get("score")?, Some(Value::Integer(10)));
    Ok(())
}

#[test]
fn constructor_coerces_declared_and_keeps_undeclared() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let entity = model.create([
        ("score", Value::Text("3".into())),
        ("extra", Value::Text("kept".into())),
    ])?;

    assert_eq!(entity.get("score")?, Some(Value::Integer(3)));
    assert_eq!(entity.raw("extra"), Some(&Value::Text("kept".into())));
    assert_eq!(entity.get("extra")?, None);

    let bad = model.create([("count", "many")]);
    assert!(matches!(bad, Err(SchemaError::Coercion(_))));
    Ok(())
}

#[test]
fn undeclared_property_cannot_be_set() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = blank(&model)?;

    assert_eq!(
        entity.set("missing", 1).unwrap_err(),
        SchemaError::PropertyNotFound("missing".into(), "Sample".into())
    );
    Ok(())
}

#[test]
fn was_reflects_snapshot_not_current_value() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = model.create([("name", "before")])?;

    assert_eq!(entity.was("name"), None);

    entity.snapshot_current();
    entity.set("name", "after")?;
    assert_eq!(entity.was("name"), Some(&Value::Text("before".into())));
    assert_eq!(entity.get("name")?, Some(Value::Text("after".into())));

    entity.set_was("score", Value::Text("raw snapshot".into()));
    entity.set("score", 5)?;
    assert_eq!(entity.was("score"), Some(&Value::Text("raw snapshot".into())));
    Ok(())
}

#[test]
fn raw_accessor_bypasses_coercion() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = blank(&model)?;

    entity.set_raw("count", Value::Text("not a number".into()));
    assert_eq!(entity.get("count")?, Some(Value::Text("not a number".into())));
    assert_eq!(entity.raw("count"), Some(&Value::Text("not a number".into())));
    Ok(())
}

#[test]
fn custom_getter_and_setter_take_over() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;

    model.set_getter("name", |entity: &Entity| match entity.raw("name") {
        Some(Value::Text(s)) => Value::Text(s.to_uppercase()),
        other => other.cloned().unwrap_or(Value::Null),
    })?;
    model.set_setter("count", |entity: &mut Entity, value: Value| {
        entity.set_raw("count", Value::List(vec![value]));
        Ok(())
    })?;

    let mut entity = blank(&model)?;
    entity.set("name", "quiet")?;
    entity.set("count", "not coerced")?;

    assert_eq!(entity.get("name")?, Some(Value::Text("QUIET".into())));
    assert_eq!(entity.raw("name"), Some(&Value::Text("quiet".into())));
    assert_eq!(
        entity.get("count")?,
        Some(Value::List(vec![Value::Text("not coerced".into())]))
    );

    model.remove_getter("name")?;
    model.remove_setter("count")?;
    assert_eq!(entity.get("name")?, Some(Value::Text("quiet".into())));
    entity.set("count", "4")?;
    assert_eq!(entity.get("count")?, Some(Value::Integer(4)));
    Ok(())
}

#[test]
fn setter_errors_propagate() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    model.set_setter("name", |_: &mut Entity, _: Value| {
        Err(SchemaError::Coercion("read-only".into()))
    })?;

    let mut entity = blank(&model)?;
    assert_eq!(
        entity.set("name", "x").unwrap_err(),
        SchemaError::Coercion("read-only".into())
    );
    Ok(())
}

#[test]
fn register_property_is_idempotent_and_picks_up_new_types() -> Result<()> {
    let schema = schema();
    schema.register_type(CustomType::new("Cents", |v: Value| {
        Ok(Value::Integer(v.as_f64().unwrap_or(0.0) as i64 * 100))
    }))?;
    let model = schema.define(
        "Price",
        Properties::new().with("amount", TypeRef::named("Cents")),
        ModelSettings::new(),
    )?;
    let mut price = blank(&model)?;
    price.set("amount", 2)?;
    assert_eq!(price.get("amount")?, Some(Value::Integer(200)));

    schema.register_type(CustomType::new("Cents", |v: Value| {
        Ok(Value::Integer(v.as_f64().unwrap_or(0.0) as i64))
    }))?;
    price.set("amount", 2)?;
    assert_eq!(price.get("amount")?, Some(Value::Integer(200)));

    model.register_property("amount")?;
    model.register_property("amount")?;
    price.set("amount", 2)?;
    assert_eq!(price.get("amount")?, Some(Value::Integer(2)));
    Ok(())
}

#[test]
fn user_types_named_like_builtins_are_special_cased() -> Result<()> {
    let schema = schema();
    let model = schema.define(
        "Odd",
        Properties::new()
            .with("when", TypeRef::Custom(CustomType::new("Date", |_| Ok(Value::Null))))
            .with("note", TypeRef::Custom(CustomType::new("Text", |_| Ok(Value::Null)))),
        ModelSettings::new(),
    )?;
    let mut odd = blank(&model)?;

    odd.set("when", 0)?;
    odd.set("note", 5)?;

    assert_eq!(
        odd.get("when")?,
        Some(Value::Date(Utc.timestamp_millis_opt(0).unwrap()))
    );
    assert_eq!(odd.get("note")?, Some(Value::Integer(5)));
    Ok(())
}

#[test]
fn model_base_helpers() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = blank(&model)?;

    assert!(entity.is_new_record()?);
    entity.set_attributes([("id", Value::Integer(1)), ("name", Value::Text("n".into()))])?;
    assert!(!entity.is_new_record()?);
    assert_eq!(entity.model_name(), "Sample");
    assert_eq!(ModelBase::table_name(&entity), "Sample");
    assert_eq!(entity.to_object()?, json!({"name": "n", "id": 1}));
    assert_eq!(entity.schema().unwrap().name(), "recording");
    Ok(())
}

#[test]
fn removed_property_loses_its_accessor() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = model.create([("name", "x")])?;

    assert!(schema.remove_property("Sample", "name")?.is_some());
    assert!(schema.remove_property("Sample", "name")?.is_none());
    assert_eq!(entity.get("name")?, None);
    assert!(matches!(
        entity.set("name", "y"),
        Err(SchemaError::PropertyNotFound(_, _))
    ));
    assert!(!schema.definition("Sample")?.properties()?.contains("name"));
    Ok(())
}

#[test]
fn oversized_integers_are_rejected_not_clamped() -> Result<()> {
    let schema = schema();
    let model = typed_model(&schema)?;
    let mut entity = blank(&model)?;

    entity.set("id", 7)?;
    assert!(matches!(
        entity.set("id", "99999999999999999999"),
        Err(SchemaError::Coercion(_))
    ));
    assert!(matches!(
        entity.set("count", -1e30),
        Err(SchemaError::Coercion(_))
    ));
    assert_eq!(entity.id()?, Some(Value::Integer(7)));
    Ok(())
}
