//! Source scanning: imports, static queries and module resolution.
//!
//! This is a lexical scan, not a parser. It finds `import`/`export ... from`,
//! `import()` and `require()` specifiers, and `graphql` template literals
//! passed to `useStaticQuery` or the `query` prop of `<StaticQuery>`.

use kiln_core::{BuildStats, CompilationGraph, CompilerDiagnostic, ModuleId, ModuleInfo};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use walkdir::{DirEntry, WalkDir};

/// Extensions compiled as source modules, in resolution order.
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs"];

/// An import specifier and where it appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    pub specifier: String,
    pub line: u32,
    pub column: u32,
}

/// What a scan found in one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedModule {
    pub imports: Vec<ImportRef>,
    /// Raw query bodies
    pub queries: Vec<String>,
}

/// Compiled scan patterns.
pub struct ModuleScanner {
    static_import: Regex,
    call_import: Regex,
    static_query: Regex,
}

impl ModuleScanner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            static_import: Regex::new(
                r#"(?:^|[^\w$.])(?:import|export)\s+(?:[\w*${}\s,]+?\s+from\s+)?["']([^"'\n]+)["']"#,
            )?,
            call_import: Regex::new(r#"(?:\brequire|\bimport)\s*\(\s*["']([^"'\n]+)["']\s*\)"#)?,
            static_query: Regex::new(
                r"(?:\buseStaticQuery\s*\(\s*graphql\s*|<StaticQuery\b[^>]*?\bquery\s*=\s*\{\s*graphql\s*)`([^`]*)`",
            )?,
        })
    }

    /// Scan one module's source text.
    pub fn parse(&self, source: &str) -> ParsedModule {
        let mut imports: Vec<(usize, String)> = Vec::new();

        for re in [&self.static_import, &self.call_import] {
            for caps in re.captures_iter(source) {
                if let Some(m) = caps.get(1) {
                    imports.push((m.start(), m.as_str().to_string()));
                }
            }
        }
        imports.sort_by_key(|(offset, _)| *offset);
        imports.dedup();

        let imports = imports
            .into_iter()
            .map(|(offset, specifier)| {
                let (line, column) = line_column(source, offset);
                ImportRef {
                    specifier,
                    line,
                    column,
                }
            })
            .collect();

        let queries = self
            .static_query
            .captures_iter(source)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect();

        ParsedModule { imports, queries }
    }
}

/// 1-based line and column of a byte offset.
fn line_column(source: &str, offset: usize) -> (u32, u32) {
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(newline) => before[newline + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line as u32, column as u32)
}

/// Stable hash of a query, insensitive to whitespace layout.
pub fn hash_query(query: &str) -> String {
    let normalized = query.split_whitespace().collect::<Vec<_>>().join(" ");
    seahash::hash(normalized.as_bytes()).to_string()
}

/// Check whether a path is a compilable source module.
pub fn is_source_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if name.ends_with(".d.ts") {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Resolve a relative specifier against the importing file.
///
/// Tries the exact path, then each source extension, then an index module.
pub fn resolve_import(importer: &Path, specifier: &str) -> Option<PathBuf> {
    let base = path_clean::clean(importer.parent()?.join(specifier));

    if base.is_file() {
        return Some(base);
    }

    for ext in SOURCE_EXTENSIONS {
        let mut candidate = base.clone().into_os_string();
        candidate.push(".");
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    SOURCE_EXTENSIONS
        .iter()
        .map(|ext| base.join(format!("index.{}", ext)))
        .find(|candidate| candidate.is_file())
}

/// Module id of a file: its path relative to the project root, `/`-separated.
pub fn module_id(root: &Path, path: &Path) -> ModuleId {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "node_modules"
}

/// Compile everything under `src_dir` into a module graph.
pub fn scan_sources(scanner: &ModuleScanner, root: &Path, src_dir: &Path) -> BuildStats {
    let started = Instant::now();
    let mut graph = CompilationGraph::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for entry in WalkDir::new(src_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                errors.push(CompilerDiagnostic::new(format!(
                    "Failed to read source directory: {}",
                    e
                )));
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_source_file(path) {
            continue;
        }

        let id = module_id(root, path);
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                errors.push(
                    CompilerDiagnostic::new(format!("Failed to read module: {}", e))
                        .with_file(id.clone()),
                );
                continue;
            }
        };

        let parsed = scanner.parse(&source);

        let mut imports = Vec::new();
        for import in parsed.imports.iter().filter(|i| is_relative(&i.specifier)) {
            match resolve_import(path, &import.specifier) {
                Some(resolved) => imports.push(module_id(root, &resolved)),
                None => errors.push(
                    CompilerDiagnostic::new(format!(
                        "Module not found: Can't resolve '{}'",
                        import.specifier
                    ))
                    .with_file(id.clone())
                    .with_location(import.line, import.column),
                ),
            }
        }

        let mut static_queries = Vec::new();
        for query in &parsed.queries {
            if query.trim().is_empty() {
                warnings.push(
                    CompilerDiagnostic::new("Empty graphql query in static query")
                        .with_file(id.clone()),
                );
            } else {
                static_queries.push(hash_query(query));
            }
        }

        graph.insert(
            id,
            ModuleInfo {
                imports,
                static_queries,
            },
        );
    }

    BuildStats {
        errors,
        warnings,
        graph,
        duration: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scanner() -> ModuleScanner {
        ModuleScanner::new().unwrap()
    }

    fn specifiers(parsed: &ParsedModule) -> Vec<&str> {
        parsed.imports.iter().map(|i| i.specifier.as_str()).collect()
    }

    #[test]
    fn test_parse_import_forms() {
        let source = r#"import React from "react"
import { Header, Footer } from './components/layout'
import * as utils from "../utils"
import './global.css'
export { default as Seo } from "./seo"
const lazy = import("./lazy")
const legacy = require('./legacy')
"#;
        let parsed = scanner().parse(source);
        assert_eq!(
            specifiers(&parsed),
            vec![
                "react",
                "./components/layout",
                "../utils",
                "./global.css",
                "./seo",
                "./lazy",
                "./legacy"
            ]
        );
    }

    #[test]
    fn test_parse_multiline_import() {
        let source = "import {\n  a,\n  b,\n} from './letters'\n";
        let parsed = scanner().parse(source);
        assert_eq!(specifiers(&parsed), vec!["./letters"]);
        assert_eq!(parsed.imports[0].line, 4);
    }

    #[test]
    fn test_import_location() {
        let source = "// header\nimport x from './x'\n";
        let parsed = scanner().parse(source);
        assert_eq!(parsed.imports[0].line, 2);
        assert_eq!(parsed.imports[0].column, 15);
    }

    #[test]
    fn test_non_import_strings_are_ignored() {
        let source = "export const name = './not-an-import'\nconst s = \"import x from './y'\".length\n";
        let parsed = scanner().parse(source);
        assert!(!specifiers(&parsed).contains(&"./not-an-import"));
    }

    #[test]
    fn test_parse_static_queries() {
        let source = r#"
const data = useStaticQuery(graphql`
  query { site { siteMetadata { title } } }
`)
export default () => (
  <StaticQuery
    query={graphql`query { allFile { nodes { name } } }`}
    render={() => null}
  />
)
const pageQuery = graphql`query { ignored }`
"#;
        let parsed = scanner().parse(source);
        assert_eq!(parsed.queries.len(), 2);
        assert!(parsed.queries[0].contains("siteMetadata"));
        assert!(parsed.queries[1].contains("allFile"));
    }

    #[test]
    fn test_hash_query_ignores_layout() {
        assert_eq!(
            hash_query("query {\n  site { title }\n}"),
            hash_query("query { site { title } }")
        );
        assert_ne!(hash_query("query { a }"), hash_query("query { b }"));
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file(Path::new("src/pages/index.js")));
        assert!(is_source_file(Path::new("src/pages/blog.tsx")));
        assert!(!is_source_file(Path::new("src/types.d.ts")));
        assert!(!is_source_file(Path::new("src/styles.css")));
        assert!(!is_source_file(Path::new("README")));
    }

    #[test]
    fn test_module_id_is_root_relative() {
        let id = module_id(Path::new("/site"), Path::new("/site/src/pages/index.js"));
        assert_eq!(id, "src/pages/index.js");
    }

    #[test]
    fn test_resolve_import_variants() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("components/header")).unwrap();
        std::fs::write(src.join("page.js"), "").unwrap();
        std::fs::write(src.join("components/seo.tsx"), "").unwrap();
        std::fs::write(src.join("components/header/index.js"), "").unwrap();
        std::fs::write(src.join("data.json"), "{}").unwrap();

        let importer = src.join("page.js");
        assert_eq!(
            resolve_import(&importer, "./components/seo"),
            Some(src.join("components/seo.tsx"))
        );
        assert_eq!(
            resolve_import(&importer, "./components/header"),
            Some(src.join("components/header/index.js"))
        );
        assert_eq!(resolve_import(&importer, "./data.json"), Some(src.join("data.json")));
        assert_eq!(resolve_import(&importer, "./missing"), None);
    }

    #[test]
    fn test_scan_sources_builds_graph() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src/pages")).unwrap();
        std::fs::create_dir_all(root.join("src/components")).unwrap();
        std::fs::create_dir_all(root.join("src/node_modules/pkg")).unwrap();
        std::fs::write(
            root.join("src/pages/index.js"),
            "import Header from '../components/header'\nimport React from 'react'\n",
        )
        .unwrap();
        std::fs::write(
            root.join("src/components/header.js"),
            "const d = useStaticQuery(graphql`query { site { title } }`)\n",
        )
        .unwrap();
        std::fs::write(root.join("src/node_modules/pkg/index.js"), "import './nope'").unwrap();

        let stats = scan_sources(&scanner(), root, &root.join("src"));

        assert!(!stats.has_errors(), "{:?}", stats.errors);
        assert_eq!(stats.graph.len(), 2);
        let page = stats.graph.get("src/pages/index.js").unwrap();
        assert_eq!(page.imports, vec!["src/components/header.js".to_string()]);
        let header = stats.graph.get("src/components/header.js").unwrap();
        assert_eq!(
            header.static_queries,
            vec![hash_query("query { site { title } }")]
        );
    }

    #[test]
    fn test_scan_sources_reports_missing_modules() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("src/index.js"), "\nimport Gone from './gone'\n").unwrap();

        let stats = scan_sources(&scanner(), root, &root.join("src"));

        assert_eq!(stats.errors.len(), 1);
        let error = &stats.errors[0];
        assert_eq!(error.message, "Module not found: Can't resolve './gone'");
        assert_eq!(error.file.as_deref(), Some(Path::new("src/index.js")));
        assert_eq!(error.location.map(|l| l.line), Some(2));
    }

    #[test]
    fn test_scan_sources_warns_on_empty_query() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("src/a.js"), "useStaticQuery(graphql`  `)").unwrap();

        let stats = scan_sources(&scanner(), root, &root.join("src"));

        assert!(!stats.has_errors());
        assert_eq!(stats.warnings.len(), 1);
    }
}
