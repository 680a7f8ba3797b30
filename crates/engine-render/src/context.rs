//! Stable render context construction.

use engine_core::{Graph, PropertyValue};
use serde_json::{json, Map, Value};

/// Build the render context for `graph`: entities/relationships/triples,
/// metadata, and the convenience views (`service`, `mainEntity`,
/// `endpoints`), with `overrides` merged last.
pub fn build_context(graph: &Graph, overrides: &Value) -> Value {
    let mut root = Map::new();
    root.insert("entities".to_string(), entities_value(graph));
    root.insert("relationships".to_string(), serde_json::to_value(&graph.relationships).unwrap_or(Value::Null));
    root.insert("triples".to_string(), serde_json::to_value(&graph.triples).unwrap_or(Value::Null));
    root.insert("metadata".to_string(), serde_json::to_value(&graph.metadata).unwrap_or(Value::Null));

    if let Some(service) = first_of_type(graph, "RESTService") {
        root.insert("service".to_string(), entity_view(service));
    }
    if let Some(main_entity) = first_of_type(graph, "Entity") {
        root.insert("mainEntity".to_string(), entity_view(main_entity));
    }
    root.insert("endpoints".to_string(), endpoints_value(graph));

    let mut ctx = Value::Object(root);
    merge_overrides(&mut ctx, overrides);
    ctx
}

fn entities_value(graph: &Graph) -> Value {
    Value::Array(graph.entities.iter().map(entity_view).collect())
}

fn first_of_type<'a>(graph: &'a Graph, type_name: &str) -> Option<&'a engine_core::Entity> {
    graph.entities.iter().find(|e| e.entity_type == type_name)
}

fn entity_view(entity: &engine_core::Entity) -> Value {
    let mut props = Map::new();
    for (name, values) in &entity.properties {
        props.insert(name.clone(), property_values(values));
    }
    json!({
        "id": entity.id,
        "type": entity.entity_type,
        "properties": Value::Object(props),
        "checksum": entity.checksum,
    })
}

fn property_values(values: &[PropertyValue]) -> Value {
    if values.len() == 1 {
        property_value(&values[0])
    } else {
        Value::Array(values.iter().map(property_value).collect())
    }
}

fn property_value(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Integer(n) => json!(n),
        PropertyValue::Text(s) => json!(s),
    }
}

/// Entities of type `Endpoint`, projected to method/path/status/path-parameter fields.
fn endpoints_value(graph: &Graph) -> Value {
    Value::Array(
        graph
            .entities
            .iter()
            .filter(|e| e.entity_type == "Endpoint")
            .map(|e| {
                json!({
                    "id": e.id,
                    "method": first_text(e, "method"),
                    "path": first_text(e, "path"),
                    "status": first_text(e, "status"),
                    "pathParameters": property_values_for(e, "pathParameter"),
                })
            })
            .collect(),
    )
}

fn first_text(entity: &engine_core::Entity, name: &str) -> Value {
    match entity.first(name) {
        Some(v) => property_value(v),
        None => Value::Null,
    }
}

fn property_values_for(entity: &engine_core::Entity, name: &str) -> Value {
    match entity.properties.get(name) {
        Some(values) => Value::Array(values.iter().map(property_value).collect()),
        None => Value::Array(Vec::new()),
    }
}

/// Shallow top-level merge: keys present in `overrides` replace the base
/// value entirely; caller-supplied overrides are always merged last.
fn merge_overrides(base: &mut Value, overrides: &Value) {
    if let (Value::Object(base_map), Value::Object(override_map)) = (base, overrides) {
        for (key, value) in override_map {
            base_map.insert(key.clone(), value.clone());
        }
    }
}
