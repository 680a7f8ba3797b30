// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render engine: build a stable context from a graph, invoke the external
//! renderer, hash the output, and record dependency metadata.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod deps;
mod error;
mod renderer;

pub use context::build_context;
pub use deps::extract_dependencies;
pub use error::RenderError;
pub use renderer::{MinijinjaRenderer, TemplateRenderer};

use engine_cas::CasBackend;
use engine_core::{ArtifactBuilder, Graph, Template};
use serde_json::Value;

/// Render `template` against `graph`, store the bytes in `cas`, and return
/// the resulting [`engine_core::Artifact`].
///
/// Determinism: given identical `(graph, template, overrides)`
/// the returned artifact's `content`/`hash` are byte-identical across
/// calls and platforms — the context never includes wall-clock time or
/// other non-deterministic identifiers.
pub async fn generate(
    graph: &Graph,
    template: &Template,
    overrides: &Value,
    renderer: &dyn TemplateRenderer,
    cas: &dyn CasBackend,
) -> Result<engine_core::Artifact, RenderError> {
    let context = build_context(graph, overrides);
    let content = renderer.render(&template.id, &template.body, &context)?;
    let dependencies = extract_dependencies(&template.body);

    let mut builder = ArtifactBuilder::new()
        .template_id(template.id.clone())
        .artifact_type(template.template_type.clone())
        .language(template.language.clone())
        .content(content.clone())
        .dependencies(dependencies);
    if let Some(path) = &template.output_path {
        builder = builder.output_path(path.clone());
    }
    let artifact = builder
        .build()
        .map_err(|e| RenderError::TemplateError {
            template_id: template.id.clone(),
            message: e.to_string(),
        })?;

    cas.store(content.as_bytes())
        .await
        .map_err(|e| RenderError::TemplateError {
            template_id: template.id.clone(),
            message: e.to_string(),
        })?;

    tracing::info!(target: "engine.render", template_id = %template.id, hash = %artifact.hash, "rendered artifact");
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_cas::MemoryCas;
    use engine_core::{Clock, FixedClock};
    use engine_graph::{ingest, Source};

    fn clock() -> FixedClock {
        FixedClock::parse("2026-01-01T00:00:00.000Z").unwrap()
    }

    #[tokio::test]
    async fn s1_deterministic_generation() {
        let clock = clock();
        let graph = ingest(
            &[Source::turtle(
                br#"@prefix ex: <http://e/> . ex:s a ex:RESTService ; ex:label "A" ."#.to_vec(),
            )],
            &clock,
            None,
        )
        .unwrap();
        let template = Template::new("svc", "Service: {{ service.label }}", "code", "text", None);
        let renderer = MinijinjaRenderer::new();
        let cas = MemoryCas::new();

        let a1 = generate(&graph, &template, &Value::Null, &renderer, &cas).await.unwrap();
        let a2 = generate(&graph, &template, &Value::Null, &renderer, &cas).await.unwrap();

        assert_eq!(a1.content, "Service: A");
        assert_eq!(a1.hash, engine_core::canon::sha256_hex(b"Service: A"));
        assert_eq!(a1.hash, a2.hash);
    }

    #[tokio::test]
    async fn dependencies_are_recorded_but_do_not_affect_hash() {
        let clock = clock();
        let graph = ingest(
            &[Source::turtle(
                br#"@prefix ex: <http://e/> . ex:s a ex:RESTService ; ex:label "A" ."#.to_vec(),
            )],
            &clock,
            None,
        )
        .unwrap();
        let template = Template::new("svc", "Service: {{ service.label }}", "code", "text", None);
        let renderer = MinijinjaRenderer::new();
        let cas = MemoryCas::new();

        let artifact = generate(&graph, &template, &Value::Null, &renderer, &cas).await.unwrap();
        assert!(artifact.dependencies.contains("service.label"));
    }
}
