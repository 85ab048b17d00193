use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use thiserror::Error;

use crate::tree::ConfigNode;

/// Errors raised while reading XML into a [`ConfigNode`] tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Input XML could not be tokenized.
    #[error("failed to parse XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Tag, attribute, or text bytes were not UTF-8.
    #[error("invalid UTF-8 while parsing XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// Entity or character reference could not be decoded.
    #[error("failed to decode XML text: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    /// Input file could not be read.
    #[error("failed to read XML file: {0}")]
    Io(#[from] std::io::Error),
    /// Structural problem in the document.
    #[error("malformed XML: {0}")]
    Malformed(String),
}

/// Parsing knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Drop `prefix:` from element names and discard `xmlns` declarations.
    ///
    /// Device payloads are namespace-qualified; the tree addresses nodes by local name.
    pub strip_namespaces: bool,
}

/// Parse XML bytes into a [`ConfigNode`] tree, keeping names as written.
pub fn parse(xml: &[u8]) -> Result<ConfigNode, ParseError> {
    parse_with(xml, ParseOptions::default())
}

/// Parse an XML file into a [`ConfigNode`] tree with namespaces stripped.
pub fn parse_file(path: &Path) -> Result<ConfigNode, ParseError> {
    let bytes = fs::read(path)?;
    parse_with(
        &bytes,
        ParseOptions {
            strip_namespaces: true,
        },
    )
}

/// Parse XML bytes with explicit options.
pub fn parse_with(xml: &[u8], opts: ParseOptions) -> Result<ConfigNode, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<ConfigNode> = Vec::new();
    let mut root: Option<ConfigNode> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => stack.push(open_node(&e, &reader, opts)?),
            Event::Empty(e) => {
                let node = open_node(&e, &reader, opts)?;
                close_node(node, &mut stack, &mut root)?;
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    append_text(current, &e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    append_text(current, std::str::from_utf8(e.as_ref())?);
                }
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| {
                    ParseError::Malformed("encountered closing tag without open tag".to_string())
                })?;
                close_node(node, &mut stack, &mut root)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ParseError::Malformed(
            "unclosed element(s) at end of document".to_string(),
        ));
    }

    root.ok_or_else(|| ParseError::Malformed("no root element found".to_string()))
}

fn close_node(
    node: ConfigNode,
    stack: &mut [ConfigNode],
    root: &mut Option<ConfigNode>,
) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::Malformed(
            "multiple top-level elements found".to_string(),
        ));
    }
    *root = Some(node);
    Ok(())
}

// Whitespace-only runs are indentation, not values.
fn append_text(node: &mut ConfigNode, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    match &mut node.text {
        Some(existing) => existing.push_str(text),
        None => node.text = Some(text.to_string()),
    }
}

fn open_node(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    opts: ParseOptions,
) -> Result<ConfigNode, ParseError> {
    let mut node = ConfigNode::new(element_name(e.name(), opts)?);

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        if opts.strip_namespaces && (key == "xmlns" || key.starts_with("xmlns:")) {
            continue;
        }
        let value = attr
            .decode_and_unescape_value(reader.decoder())?
            .into_owned();
        node.attributes.insert(key.to_string(), value);
    }

    Ok(node)
}

fn element_name(name: QName<'_>, opts: ParseOptions) -> Result<String, ParseError> {
    let raw = if opts.strip_namespaces {
        name.local_name().into_inner()
    } else {
        name.as_ref()
    };
    Ok(std::str::from_utf8(raw)?.to_string())
}
