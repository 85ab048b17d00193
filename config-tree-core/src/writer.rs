use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use crate::tree::ConfigNode;

/// Errors raised while serializing a [`ConfigNode`] tree.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("failed to write XML file: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialization knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Spaces per nesting level; `None` writes the document on one line.
    pub indent: Option<usize>,
    /// Lead with `<?xml version="1.0" encoding="UTF-8"?>`.
    pub declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: Some(2),
            declaration: false,
        }
    }
}

/// Serialize a tree into indented XML bytes.
pub fn write(node: &ConfigNode) -> Result<Vec<u8>, WriteError> {
    write_with(node, WriteOptions::default())
}

/// Serialize a tree and write it to `path` as a standalone document.
pub fn write_file(node: &ConfigNode, path: &Path) -> Result<(), WriteError> {
    let bytes = write_with(
        node,
        WriteOptions {
            declaration: true,
            ..WriteOptions::default()
        },
    )?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Serialize a tree with explicit options.
pub fn write_with(node: &ConfigNode, opts: WriteOptions) -> Result<Vec<u8>, WriteError> {
    let mut writer = match opts.indent {
        Some(width) => Writer::new_with_indent(Vec::new(), b' ', width),
        None => Writer::new(Vec::new()),
    };
    if opts.declaration {
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    }
    emit(&mut writer, node)?;
    Ok(writer.into_inner())
}

fn emit(writer: &mut Writer<Vec<u8>>, node: &ConfigNode) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new(node.tag.as_str());
    // Namespace declarations lead so a reader sees the scope before any qualified attribute.
    let (namespaces, others): (Vec<_>, Vec<_>) = node
        .attributes
        .iter()
        .partition(|(name, _)| is_namespace_declaration(name));
    for (name, value) in namespaces.into_iter().chain(others) {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    // Presence containers such as `<create/>` carry no value; blank text counts as none.
    let text = node.text.as_deref().filter(|text| !text.trim().is_empty());
    if node.children.is_empty() && text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &node.children {
        emit(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(node.tag.as_str())))?;
    Ok(())
}

fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}
