//! Static query differ.
//!
//! After a successful round, every registered template that took part in the
//! compilation gets its static query set recomputed from the module graph: the
//! union of the queries referenced by the template and by everything it
//! imports, transitively. Sets that differ from the stored ones produce
//! exactly two actions each, in this order:
//!
//! 1. [`StoreAction::AddPendingTemplateDataWrite`]
//! 2. [`StoreAction::SetStaticQueriesByTemplate`]
//!
//! Templates missing from the fresh mapping are left alone. An incremental
//! round that did not touch a template says nothing about it.

use crate::compiler::CompilationGraph;
use crate::store::{StaticQueryMap, StoreAction, StoreSnapshot};
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

/// Compute the fresh template → static query mapping from a compilation.
///
/// Templates that are not part of `graph` are skipped.
pub fn map_templates_to_static_queries<'a>(
    templates: impl IntoIterator<Item = &'a String>,
    graph: &CompilationGraph,
) -> StaticQueryMap {
    let mut mapping = StaticQueryMap::new();

    for template in templates {
        if !graph.contains(template) {
            continue;
        }

        let mut queries = BTreeSet::new();
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut stack = vec![template.as_str()];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(module) = graph.get(id) else {
                continue;
            };
            queries.extend(module.static_queries.iter().cloned());
            stack.extend(
                module
                    .imports
                    .iter()
                    .map(String::as_str)
                    .filter(|import| !visited.contains(import)),
            );
        }

        mapping.insert(template.clone(), queries);
    }

    mapping
}

/// Compare a fresh mapping against the stored one.
///
/// Set equality is unordered. Output is ordered by template path.
pub fn diff_static_queries(previous: &StaticQueryMap, fresh: &StaticQueryMap) -> Vec<StoreAction> {
    let mut actions = Vec::new();

    for (component_path, static_query_hashes) in fresh {
        if previous.get(component_path) == Some(static_query_hashes) {
            continue;
        }
        actions.push(StoreAction::AddPendingTemplateDataWrite {
            component_path: component_path.clone(),
        });
        actions.push(StoreAction::SetStaticQueriesByTemplate {
            component_path: component_path.clone(),
            static_query_hashes: static_query_hashes.clone(),
        });
    }

    actions
}

/// Diff a compilation against the store's current state.
pub fn static_query_changes(snapshot: &StoreSnapshot, graph: &CompilationGraph) -> Vec<StoreAction> {
    let fresh = map_templates_to_static_queries(snapshot.components.keys(), graph);
    diff_static_queries(&snapshot.static_queries_by_template, &fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ModuleInfo;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn map(entries: &[(&str, &[&str])]) -> StaticQueryMap {
        entries
            .iter()
            .map(|(unit, queries)| (unit.to_string(), set(queries)))
            .collect()
    }

    fn changed_units(actions: &[StoreAction]) -> Vec<(String, BTreeSet<String>)> {
        actions
            .iter()
            .filter_map(|action| match action {
                StoreAction::SetStaticQueriesByTemplate {
                    component_path,
                    static_query_hashes,
                } => Some((component_path.clone(), static_query_hashes.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_only_changed_and_new_units_produce_actions() {
        let previous = map(&[("A", &["q1", "q2"]), ("B", &["q3"])]);
        let fresh = map(&[("A", &["q1", "q2"]), ("B", &["q3", "q4"]), ("C", &["q5"])]);

        let actions = diff_static_queries(&previous, &fresh);

        assert_eq!(actions.len(), 4);
        assert_eq!(
            changed_units(&actions),
            vec![("B".to_string(), set(&["q3", "q4"])), ("C".to_string(), set(&["q5"]))]
        );
        assert_eq!(
            actions[0],
            StoreAction::AddPendingTemplateDataWrite {
                component_path: "B".into()
            }
        );
    }

    #[test]
    fn test_set_comparison_ignores_order() {
        let previous = map(&[("A", &["q2", "q1"])]);
        let fresh = map(&[("A", &["q1", "q2"])]);
        assert!(diff_static_queries(&previous, &fresh).is_empty());
    }

    #[test]
    fn test_absent_units_are_untouched() {
        let previous = map(&[("A", &["q1"]), ("B", &["q2"])]);
        let fresh = map(&[("A", &["q1"])]);
        assert!(diff_static_queries(&previous, &fresh).is_empty());
    }

    #[test]
    fn test_unit_losing_all_queries_is_a_change() {
        let previous = map(&[("A", &["q1"])]);
        let fresh = map(&[("A", &[])]);
        assert_eq!(changed_units(&diff_static_queries(&previous, &fresh)), vec![("A".to_string(), set(&[]))]);
    }

    #[test]
    fn test_mapping_follows_transitive_imports() {
        let mut graph = CompilationGraph::new();
        graph.insert("pages/index.js", ModuleInfo::new(["components/layout.js"], ["q-page"]));
        graph.insert(
            "components/layout.js",
            ModuleInfo::new(["components/seo.js", "components/header.js"], Vec::<String>::new()),
        );
        graph.insert("components/seo.js", ModuleInfo::new(Vec::<String>::new(), ["q-site"]));
        graph.insert("components/header.js", ModuleInfo::new(Vec::<String>::new(), ["q-site", "q-nav"]));
        graph.insert("pages/about.js", ModuleInfo::new(["components/seo.js"], Vec::<String>::new()));

        let templates = vec![
            "pages/index.js".to_string(),
            "pages/about.js".to_string(),
            "pages/missing.js".to_string(),
        ];
        let mapping = map_templates_to_static_queries(&templates, &graph);

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["pages/index.js"], set(&["q-page", "q-site", "q-nav"]));
        assert_eq!(mapping["pages/about.js"], set(&["q-site"]));
        assert!(!mapping.contains_key("pages/missing.js"));
    }

    #[test]
    fn test_mapping_survives_import_cycles() {
        let mut graph = CompilationGraph::new();
        graph.insert("a.js", ModuleInfo::new(["b.js"], ["qa"]));
        graph.insert("b.js", ModuleInfo::new(["a.js", "external"], ["qb"]));

        let templates = vec!["a.js".to_string()];
        let mapping = map_templates_to_static_queries(&templates, &graph);
        assert_eq!(mapping["a.js"], set(&["qa", "qb"]));
    }

    #[test]
    fn test_changes_against_snapshot() {
        let mut graph = CompilationGraph::new();
        graph.insert("pages/index.js", ModuleInfo::new(Vec::<String>::new(), ["q1"]));

        let mut snapshot = StoreSnapshot::default();
        snapshot
            .components
            .insert("pages/index.js".into(), set(&["/"]));
        assert_eq!(static_query_changes(&snapshot, &graph).len(), 2);

        snapshot
            .static_queries_by_template
            .insert("pages/index.js".into(), set(&["q1"]));
        assert!(static_query_changes(&snapshot, &graph).is_empty());
    }
}
