//! Turtle parsing and graph construction.

use crate::error::GraphError;
use engine_core::{canon, Clock, Entity, Graph, GraphMetadata, ObjectKind, PropertyValue, Relationship, Triple};
use rio_api::model::{NamedOrBlankNode, Term};
use rio_api::parser::TriplesParser;
use rio_turtle::{TurtleError, TurtleParser};
use std::collections::BTreeMap;
use std::io::BufReader;

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

/// A single RDF source to ingest: a Turtle document plus its declared kind.
#[derive(Debug, Clone)]
pub struct Source {
    /// Always `"rdf"` for this ingestor; kept as a field so future source
    /// kinds can be rejected explicitly rather than silently misparsed.
    pub kind: String,
    /// Raw document bytes.
    pub body: Vec<u8>,
    /// MIME-style format tag; only `"text/turtle"` is supported.
    pub format: String,
}

impl Source {
    /// Construct a Turtle source.
    pub fn turtle(body: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: "rdf".to_string(),
            body: body.into(),
            format: "text/turtle".to_string(),
        }
    }
}

/// `localName(iri)`: characters after the last `/` or `#`; the full IRI if
/// neither is present.
pub fn local_name(iri: &str) -> &str {
    let slash = iri.rfind('/');
    let hash = iri.rfind('#');
    match [slash, hash].into_iter().flatten().max() {
        Some(idx) => &iri[idx + 1..],
        None => iri,
    }
}

/// Parse and merge `sources` into a single deduplicated [`Graph`].
pub fn ingest(sources: &[Source], clock: &dyn Clock, operation_id: Option<&str>) -> Result<Graph, GraphError> {
    let mut all_triples: Vec<Triple> = Vec::new();

    for (index, source) in sources.iter().enumerate() {
        if source.format != "text/turtle" {
            return Err(GraphError::UnsupportedFormat {
                format: source.format.clone(),
            });
        }
        let mut parser = TurtleParser::new(BufReader::new(source.body.as_slice()), None)
            .map_err(|e| parse_error(index, e))?;
        parser
            .parse_all(&mut |triple| -> Result<(), TurtleError> {
                let subject = subject_to_string(&triple.subject);
                let predicate = triple.predicate.iri.to_string();
                let (object, object_kind) = term_to_string(&triple.object);
                all_triples.push(Triple::new(subject, predicate, object, object_kind));
                Ok(())
            })
            .map_err(|e| parse_error(index, e))?;
    }

    // Dedup triples by (s, p, o), first occurrence wins, order preserved.
    let mut seen_triples = std::collections::HashSet::new();
    let triples: Vec<Triple> = all_triples
        .into_iter()
        .filter(|t| seen_triples.insert(t.dedup_key()))
        .collect();

    // Pass 1: rdf:type triples establish entity type.
    let mut entities: BTreeMap<String, (String, BTreeMap<String, Vec<PropertyValue>>)> = BTreeMap::new();
    for t in &triples {
        if t.predicate == RDF_TYPE {
            let entry = entities
                .entry(t.subject.clone())
                .or_insert_with(|| ("Entity".to_string(), BTreeMap::new()));
            entry.0 = local_name(&t.object).to_string();
        }
    }

    // Pass 2: remaining triples become properties on the subject entity.
    for t in &triples {
        if t.predicate == RDF_TYPE {
            continue;
        }
        if !t.subject.starts_with("_:") {
            let entry = entities
                .entry(t.subject.clone())
                .or_insert_with(|| ("Entity".to_string(), BTreeMap::new()));
            let value = literal_value(&t.object, &t.object_kind);
            entry
                .1
                .entry(local_name(&t.predicate).to_string())
                .or_default()
                .push(value);
        }
    }

    let entities: Vec<Entity> = entities
        .into_iter()
        .map(|(id, (entity_type, properties))| {
            Entity {
                id,
                entity_type,
                properties,
                checksum: String::new(),
            }
            .with_checksum()
        })
        .collect();

    // Relationships: one per triple whose object is an IRI, deduped by (from, type, to).
    let mut seen_rel = std::collections::HashSet::new();
    let relationships: Vec<Relationship> = triples
        .iter()
        .filter(|t| t.object_kind == ObjectKind::Iri && t.predicate != RDF_TYPE)
        .map(|t| Relationship::new(t.subject.clone(), t.object.clone(), local_name(&t.predicate)))
        .filter(|r| seen_rel.insert(r.dedup_key()))
        .collect();

    let concatenated: Vec<u8> = sources.iter().flat_map(|s| s.body.iter().copied()).collect();
    let graph_id = canon::short_hash(&canon::sha256_hex(&concatenated)).to_string();

    Ok(Graph {
        id: graph_id,
        entities,
        relationships,
        triples,
        metadata: GraphMetadata {
            source_count: sources.len(),
            ingested_at: clock.now_iso(),
            operation_id: operation_id.map(str::to_string),
        },
    })
}

fn parse_error(source_index: usize, err: TurtleError) -> GraphError {
    GraphError::ParseError {
        source_index,
        position: "unknown".to_string(),
        message: err.to_string(),
    }
}

fn subject_to_string(subject: &NamedOrBlankNode<'_>) -> String {
    match subject {
        NamedOrBlankNode::NamedNode(n) => n.iri.to_string(),
        NamedOrBlankNode::BlankNode(b) => format!("_:{}", b.id),
    }
}

fn term_to_string(term: &Term<'_>) -> (String, ObjectKind) {
    match term {
        Term::NamedNode(n) => (n.iri.to_string(), ObjectKind::Iri),
        Term::BlankNode(b) => (format!("_:{}", b.id), ObjectKind::Blank),
        Term::Literal(lit) => (literal_lexical(lit), ObjectKind::Literal),
        Term::Triple(_) => ("<<rdf-star>>".to_string(), ObjectKind::Blank),
    }
}

fn literal_lexical(lit: &rio_api::model::Literal<'_>) -> String {
    match lit {
        rio_api::model::Literal::Simple { value } => value.to_string(),
        rio_api::model::Literal::LanguageTaggedString { value, .. } => value.to_string(),
        rio_api::model::Literal::Typed { value, .. } => value.to_string(),
    }
}

fn literal_value(object: &str, kind: &ObjectKind) -> PropertyValue {
    if *kind == ObjectKind::Literal {
        if let Ok(n) = object.parse::<i64>() {
            return PropertyValue::Integer(n);
        }
    }
    PropertyValue::Text(object.to_string())
}

/// Returns `true` when a typed literal's datatype IRI is `xsd:integer`.
pub fn is_xsd_integer(datatype_iri: &str) -> bool {
    datatype_iri == XSD_INTEGER
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::SystemClock;

    fn ingest_one(ttl: &str) -> Graph {
        ingest(&[Source::turtle(ttl.as_bytes().to_vec())], &SystemClock, None).unwrap()
    }

    #[test]
    fn local_name_strips_iri_prefix() {
        assert_eq!(local_name("http://e/RESTService"), "RESTService");
        assert_eq!(local_name("http://e/ns#label"), "label");
        assert_eq!(local_name("plain"), "plain");
    }

    #[test]
    fn s1_service_entity_has_label() {
        let graph = ingest_one(
            r#"@prefix ex: <http://e/> . ex:s a ex:RESTService ; ex:label "A" ."#,
        );
        assert_eq!(graph.entities.len(), 1);
        let e = &graph.entities[0];
        assert_eq!(e.entity_type, "RESTService");
        assert_eq!(e.first("label"), Some(&PropertyValue::Text("A".to_string())));
    }

    #[test]
    fn s2_triple_order_does_not_affect_entity_set() {
        let a = ingest_one(
            r#"@prefix ex: <http://e/> .
               ex:s a ex:RESTService .
               ex:s ex:label "A" .
               ex:s ex:owner ex:bob ."#,
        );
        let b = ingest_one(
            r#"@prefix ex: <http://e/> .
               ex:s ex:owner ex:bob .
               ex:s ex:label "A" .
               ex:s a ex:RESTService ."#,
        );
        assert_ne!(a.id, b.id, "raw-content graph id should differ");
        assert_eq!(a.entities, b.entities);
    }

    #[test]
    fn graph_dedup_triples_relationships_entities() {
        let graph = ingest_one(
            r#"@prefix ex: <http://e/> .
               ex:s a ex:RESTService .
               ex:s a ex:RESTService .
               ex:s ex:owner ex:bob .
               ex:s ex:owner ex:bob ."#,
        );
        assert_eq!(graph.triples.len(), 2);
        assert_eq!(graph.relationships.len(), 1);
        assert_eq!(graph.entities.len(), 1);
    }

    #[test]
    fn duplicate_predicate_values_are_preserved_in_order() {
        let graph = ingest_one(
            r#"@prefix ex: <http://e/> .
               ex:s ex:tag "one" .
               ex:s ex:tag "two" ."#,
        );
        let e = graph
            .entities
            .iter()
            .find(|e| e.id == "http://e/s")
            .unwrap();
        assert_eq!(
            e.properties.get("tag"),
            Some(&vec![
                PropertyValue::Text("one".to_string()),
                PropertyValue::Text("two".to_string())
            ])
        );
    }

    #[test]
    fn integer_literal_converts_to_integer() {
        let graph = ingest_one(
            r#"@prefix ex: <http://e/> .
               ex:s ex:age "25" ."#,
        );
        let e = &graph.entities[0];
        assert_eq!(e.first("age"), Some(&PropertyValue::Integer(25)));
    }

    #[test]
    fn unsupported_format_is_rejected() {
        let src = Source {
            kind: "rdf".to_string(),
            body: b"{}".to_vec(),
            format: "application/json".to_string(),
        };
        let err = ingest(&[src], &SystemClock, None).unwrap_err();
        assert!(matches!(err, GraphError::UnsupportedFormat { .. }));
    }

    #[test]
    fn blank_node_subject_gets_no_property_entity() {
        let graph = ingest_one(
            r#"@prefix ex: <http://e/> . _:b1 ex:knows ex:bob ."#,
        );
        assert!(graph.entities.is_empty());
        assert_eq!(graph.relationships.len(), 1);
    }

    #[test]
    fn non_slash_scheme_iri_subject_gets_a_property_entity() {
        let graph = ingest_one(
            r#"<urn:isbn:0451450523> <http://e/label> "X" ."#,
        );
        assert_eq!(graph.entities.len(), 1);
        let e = &graph.entities[0];
        assert_eq!(e.id, "urn:isbn:0451450523");
        assert_eq!(e.first("label"), Some(&PropertyValue::Text("X".to_string())));
    }

    #[test]
    fn s1_ingested_graph_is_a_stable_snapshot() {
        let graph = ingest_one(
            r#"@prefix ex: <http://e/> . ex:s a ex:RESTService ; ex:label "A" ."#,
        );
        insta::assert_json_snapshot!("s1_service_graph", graph, {
            ".id" => "[graph-id]",
            ".metadata.ingested_at" => "[timestamp]",
        });
    }

    #[test]
    fn parse_error_reports_source_index() {
        let good = Source::turtle(b"@prefix ex: <http://e/> . ex:s ex:p ex:o .".to_vec());
        let bad = Source::turtle(b"this is not turtle @@@ <<<".to_vec());
        let err = ingest(&[good, bad], &SystemClock, None).unwrap_err();
        match err {
            GraphError::ParseError { source_index, .. } => assert_eq!(source_index, 1),
            other => panic!("expected ParseError, got {other:?}"),
        }
    }
}
