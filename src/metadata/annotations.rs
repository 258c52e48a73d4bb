#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Finds graded test methods by reading their annotations, eg.
//!
//! ```java
//! @Test
//! @Graded(points = 10, friendlyName = "Adds two numbers")
//! @Tag(name = "difficulty", value = "easy")
//! void testAdd() { ... }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use tree_sitter::Node;

use super::{Parser, PointManifest, PointMetadata, Tag};
use crate::{constants::PACKAGE_QUERY, fingerprint::find_test_sources};

/// Named children of `node`, collected so the cursor borrow ends here.
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Removes the surrounding quotes of a Java string literal and resolves the
/// common escapes.
fn unquote(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Key/value arguments of an annotation. A lone positional argument is keyed
/// as `value`, which is what Java does too.
fn annotation_arguments<'t>(parser: &Parser, annotation: Node<'t>) -> Result<Vec<(String, Node<'t>)>> {
    let Some(args) = annotation.child_by_field_name("arguments") else {
        return Ok(vec![]);
    };

    let mut pairs = vec![];
    for child in named_children(args) {
        if child.kind() == "element_value_pair" {
            let (Some(key), Some(value)) =
                (child.child_by_field_name("key"), child.child_by_field_name("value"))
            else {
                continue;
            };
            pairs.push((parser.text(key)?.to_string(), value));
        } else if child.kind() != "comment" {
            pairs.push(("value".to_string(), child));
        }
    }
    Ok(pairs)
}

/// Simple name of an annotation, without any package qualifier.
fn annotation_name<'p>(parser: &'p Parser, annotation: Node<'_>) -> Result<&'p str> {
    let name = annotation
        .child_by_field_name("name")
        .context("Annotation without a name")?;
    let name = parser.text(name)?;
    Ok(name.rsplit('.').next().unwrap_or(name))
}

/// Reads one `@Tag(name = ..., value = ...)` annotation.
fn read_tag(parser: &Parser, annotation: Node<'_>) -> Result<Option<Tag>> {
    let mut name = None;
    let mut value = String::new();

    for (key, node) in annotation_arguments(parser, annotation)? {
        match key.as_str() {
            "name" => name = Some(unquote(parser.text(node)?)),
            "value" => value = unquote(parser.text(node)?),
            _ => {}
        }
    }

    // JUnit's own @Tag("fast") only has a positional value; it carries no
    // grading information.
    Ok(name.map(|name| Tag { name, value }))
}

/// Reads the grading annotations of a method, if it has `@Graded`.
fn read_method(parser: &Parser, method: Node<'_>) -> Result<Option<PointMetadata>> {
    let Some(modifiers) = named_children(method)
        .into_iter()
        .find(|n| n.kind() == "modifiers")
    else {
        return Ok(None);
    };

    let mut graded: Option<PointMetadata> = None;
    let mut tags = vec![];

    for annotation in named_children(modifiers)
        .into_iter()
        .filter(|n| n.kind() == "annotation")
    {
        match annotation_name(parser, annotation)? {
            "Graded" => {
                let mut metadata = PointMetadata::default();
                for (key, node) in annotation_arguments(parser, annotation)? {
                    match key.as_str() {
                        "points" => {
                            let text = parser.text(node)?.replace('_', "");
                            metadata.points = text.parse().with_context(|| {
                                format!("@Graded points must be an integer literal, found `{text}`")
                            })?;
                        }
                        "friendlyName" => {
                            let name = unquote(parser.text(node)?);
                            if !name.is_empty() {
                                metadata.friendly_name = Some(name);
                            }
                        }
                        _ => {}
                    }
                }
                graded = Some(metadata);
            }
            "Tag" => tags.extend(read_tag(parser, annotation)?),
            "Tags" => {
                for (_, node) in annotation_arguments(parser, annotation)? {
                    let nested = if node.kind() == "element_value_array_initializer" {
                        named_children(node)
                    } else {
                        vec![node]
                    };
                    for tag in nested.into_iter().filter(|n| n.kind() == "annotation") {
                        tags.extend(read_tag(parser, tag)?);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(graded.map(|mut metadata| {
        metadata.tags = tags;
        metadata
    }))
}

/// Walks class declarations below `node`, registering graded methods.
///
/// Nested classes are named `Outer$Inner`, matching the suite names test
/// reports use.
fn visit(
    parser: &Parser,
    node: Node<'_>,
    package: Option<&str>,
    outer: &[String],
    manifest: &mut PointManifest,
) -> Result<()> {
    for child in named_children(node) {
        if child.kind() != "class_declaration" {
            continue;
        }
        let (Some(name), Some(body)) =
            (child.child_by_field_name("name"), child.child_by_field_name("body"))
        else {
            continue;
        };

        let mut nesting = outer.to_vec();
        nesting.push(parser.text(name)?.to_string());
        let class_name = nesting.join("$");
        let suite = match package {
            Some(package) => format!("{package}.{class_name}"),
            None => class_name,
        };

        for member in named_children(body)
            .into_iter()
            .filter(|n| n.kind() == "method_declaration")
        {
            let Some(method_name) = member.child_by_field_name("name") else {
                continue;
            };
            if let Some(metadata) = read_method(parser, member)? {
                let method_name = parser.text(method_name)?;
                tracing::debug!("{suite}.{method_name} is worth {} point(s)", metadata.points);
                manifest.insert(suite.clone(), method_name, metadata);
            }
        }

        visit(parser, body, package, &nesting, manifest)?;
    }
    Ok(())
}

/// Collects the graded test methods declared in one Java source file.
pub fn scan_source(source: String) -> Result<PointManifest> {
    let parser = Parser::new(source)?;
    let package = parser
        .query(PACKAGE_QUERY)?
        .into_iter()
        .find_map(|mut d| d.remove("name"));

    let mut manifest = PointManifest::new();
    visit(&parser, parser.root(), package.as_deref(), &[], &mut manifest)?;
    Ok(manifest)
}

/// Collects graded test methods from every `.java` file under `root` that
/// matches one of `patterns`.
pub fn scan_sources(root: &Path, patterns: &[String]) -> Result<PointManifest> {
    let mut manifest = PointManifest::new();

    for file in find_test_sources(root, patterns)?
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == "java"))
    {
        let source = std::fs::read_to_string(&file)
            .with_context(|| format!("Could not read test file {}", file.display()))?;
        let found = scan_source(source)
            .with_context(|| format!("Could not read annotations in {}", file.display()))?;
        manifest.extend(found);
    }

    tracing::info!("Found {} graded test(s) under {}", manifest.len(), root.display());
    Ok(manifest)
}
