//! Template-variable dependency extraction: advisory metadata only, never
//! affects the artifact hash.

use std::collections::BTreeSet;

/// Scan `body` for `{{ path[.path]* [| filter ...] }}` expressions and
/// return the distinct dotted variable paths, ignoring filter arguments.
pub fn extract_dependencies(body: &str) -> BTreeSet<String> {
    let mut deps = BTreeSet::new();
    let mut rest = body;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else { break };
        let expr = &after[..end];
        if let Some(path) = leading_path(expr) {
            deps.insert(path);
        }
        rest = &after[end + 2..];
    }
    deps
}

fn leading_path(expr: &str) -> Option<String> {
    let before_filter = expr.split('|').next().unwrap_or(expr).trim();
    let path: String = before_filter
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '.' || *c == '_')
        .collect();
    let path = path.trim_matches('.').to_string();
    if path.is_empty() || path.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true) {
        None
    } else {
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_simple_path() {
        let deps = extract_dependencies("Service: {{ service.label }}");
        assert!(deps.contains("service.label"));
    }

    #[test]
    fn ignores_filter_arguments() {
        let deps = extract_dependencies("{{ service.label | upper(3) }}");
        assert_eq!(deps, BTreeSet::from(["service.label".to_string()]));
    }

    #[test]
    fn collects_distinct_paths_only_once() {
        let deps = extract_dependencies("{{ a.b }} and {{ a.b }} and {{ c }}");
        assert_eq!(deps.len(), 2);
    }

    #[test]
    fn numeric_literals_are_not_dependencies() {
        let deps = extract_dependencies("{{ 42 }}");
        assert!(deps.is_empty());
    }
}
