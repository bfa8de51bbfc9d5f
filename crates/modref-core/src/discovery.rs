//! Static export discovery for client modules.
//!
//! Walks the top-level statements of a module and collects the names it
//! exports, in declaration order. `export * from '...'` is followed: the
//! target is resolved, fetched and transformed through the same pipeline
//! stages the server loader captured, then scanned in turn.
//!
//! Parsing happens in a synchronous scan that produces owned
//! [`ExportEntry`] values, so no arena-allocated AST lives across an await.

use crate::error::{Error, Result};
use crate::loader::state::LoaderState;
use crate::loader::types::{
    FetchContext, ModuleFormat, ResolveContext, TransformContext, TransformSourceFn,
};
use futures::future::BoxFuture;
use oxc_allocator::Allocator;
use oxc_ast::ast::{BindingPattern, Declaration, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;

/// One export-relevant top-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEntry {
    /// Names exported directly by the statement.
    Names(Vec<String>),
    /// `export * from 'specifier'`, to be expanded.
    ReExportAll(String),
}

/// Scan `source` for export statements.
pub fn scan_exports(source: &str, url: &str) -> Result<Vec<ExportEntry>> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::mjs()).parse();

    if parsed.panicked || !parsed.errors.is_empty() {
        let message = parsed
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::Parse {
            url: url.to_string(),
            message,
        });
    }

    let mut entries = Vec::new();
    for stmt in &parsed.program.body {
        match stmt {
            Statement::ExportAllDeclaration(decl) => match &decl.exported {
                Some(alias) => entries.push(ExportEntry::Names(vec![alias.name().to_string()])),
                None => entries.push(ExportEntry::ReExportAll(decl.source.value.to_string())),
            },
            Statement::ExportDefaultDeclaration(_) => {
                entries.push(ExportEntry::Names(vec!["default".to_string()]));
            }
            Statement::ExportNamedDeclaration(decl) => {
                let mut names = Vec::new();
                match &decl.declaration {
                    Some(Declaration::VariableDeclaration(var)) => {
                        for declarator in &var.declarations {
                            add_binding_names(&mut names, &declarator.id);
                        }
                    }
                    Some(other) => {
                        if let Some(id) = other.id() {
                            names.push(id.name.to_string());
                        }
                    }
                    None => {}
                }
                for specifier in &decl.specifiers {
                    names.push(specifier.exported.name().to_string());
                }
                if !names.is_empty() {
                    entries.push(ExportEntry::Names(names));
                }
            }
            _ => {}
        }
    }

    Ok(entries)
}

/// Collect every identifier bound by a destructuring pattern.
fn add_binding_names(names: &mut Vec<String>, pattern: &BindingPattern<'_>) {
    match pattern {
        BindingPattern::BindingIdentifier(ident) => names.push(ident.name.to_string()),
        BindingPattern::ObjectPattern(object) => {
            for property in &object.properties {
                add_binding_names(names, &property.value);
            }
            if let Some(rest) = &object.rest {
                add_binding_names(names, &rest.argument);
            }
        }
        BindingPattern::ArrayPattern(array) => {
            // Holes are `None`.
            for element in array.elements.iter().flatten() {
                add_binding_names(names, element);
            }
            if let Some(rest) = &array.rest {
                add_binding_names(names, &rest.argument);
            }
        }
        BindingPattern::AssignmentPattern(assign) => add_binding_names(names, &assign.left),
    }
}

/// Dependencies export discovery needs from the surrounding pipeline.
pub struct DiscoveryContext<'a> {
    /// Captured resolve and fetch-source stages.
    pub state: &'a LoaderState,
    /// Conditions for resolving `export *` targets as a client import.
    pub client_conditions: &'a [String],
    /// The outer transform stage, applied to every fetched target.
    pub transform_source: TransformSourceFn,
}

impl std::fmt::Debug for DiscoveryContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryContext")
            .field("state", &self.state)
            .field("client_conditions", &self.client_conditions)
            .finish_non_exhaustive()
    }
}

/// Discover the export names of a module.
pub async fn discover_exports(
    source: &str,
    url: &str,
    cx: &DiscoveryContext<'_>,
) -> Result<Vec<String>> {
    let mut names = Vec::new();
    parse_export_names_into(source, &mut names, url, cx).await?;
    Ok(names)
}

/// Append the export names of `source` (located at `parent_url`) to `names`.
pub async fn parse_export_names_into(
    source: &str,
    names: &mut Vec<String>,
    parent_url: &str,
    cx: &DiscoveryContext<'_>,
) -> Result<()> {
    let mut chain = vec![parent_url.to_string()];
    walk(source.to_string(), names, parent_url.to_string(), cx, &mut chain).await
}

fn walk<'a>(
    source: String,
    names: &'a mut Vec<String>,
    parent_url: String,
    cx: &'a DiscoveryContext<'a>,
    chain: &'a mut Vec<String>,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        for entry in scan_exports(&source, &parent_url)? {
            match entry {
                ExportEntry::Names(found) => names.extend(found),
                ExportEntry::ReExportAll(specifier) => {
                    let url = resolve_client_import(&specifier, &parent_url, cx).await?;
                    if chain.contains(&url) {
                        tracing::debug!(%url, from = %parent_url, "skipping cyclic export *");
                        continue;
                    }
                    let text = load_client_import(&url, cx).await?;

                    tracing::debug!(%url, from = %parent_url, "following export *");
                    chain.push(url.clone());
                    walk(text, names, url, cx, chain).await?;
                    chain.pop();
                }
            }
        }
        Ok(())
    })
}

/// Resolve `specifier` the way a client import would, without the
/// restricted condition the server loader adds.
async fn resolve_client_import(
    specifier: &str,
    parent_url: &str,
    cx: &DiscoveryContext<'_>,
) -> Result<String> {
    let resolve = cx.state.resolve()?;
    let context = ResolveContext::new(cx.client_conditions.to_vec(), Some(parent_url.to_string()));
    Ok(resolve(specifier.to_string(), context).await?.url)
}

/// Fetch and transform a re-export target, returning its source text.
async fn load_client_import(url: &str, cx: &DiscoveryContext<'_>) -> Result<String> {
    let fetch_source = cx.state.fetch_source()?;
    let fetched = fetch_source(
        url.to_string(),
        FetchContext {
            format: Some(ModuleFormat::Module),
        },
    )
    .await?;

    let transformed = (cx.transform_source)(
        fetched.source,
        TransformContext {
            format: Some(ModuleFormat::Module),
            url: url.to_string(),
        },
    )
    .await?;

    match transformed.source.as_text() {
        Some(text) => Ok(text.to_string()),
        None => Err(Error::NonTextualSource {
            url: url.to_string(),
        }),
    }
}
