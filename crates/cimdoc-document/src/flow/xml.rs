//! Flat-XML persistence for [`FlowDocument`].
//!
//! ```xml
//! <document>
//!   <properties title="..." subject="..." author="..." comments="..."/>
//!   <styles><style name="Heading 1" kind="paragraph" outline="1"/></styles>
//!   <body>
//!     <p style="Heading 1"><t>Text</t><seq label="Figure" number="1"/></p>
//!     <p><img name="a.png">BASE64</img><bookmark name="bm"/><link bookmark="bm">x</link></p>
//!     <table style="..."><tr><tc><p>...</p></tc></tr></table>
//!     <toc label="Figure" entry-style="Table of Figures"><p>...</p></toc>
//!   </body>
//! </document>
//! ```
//!
//! Text content is only significant inside `<t>`, `<link>` and `<img>`;
//! whitespace between structural elements is ignored.

use std::collections::HashMap;
use std::fmt::Write;
use std::io::BufRead;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::{Block, DEFAULT_TOC_STYLE, FlowDocument, Image, Inline, Paragraph, Table, Toc};
use crate::document::{DocProperties, StyleDef, StyleKind};
use crate::error::DocumentError;

/// Generic element tree produced by the reader.
#[derive(Debug, Default)]
struct XmlNode {
    tag: String,
    attrs: HashMap<String, String>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }
}

/// Parse a flat-XML document.
pub(crate) fn parse_document(xml: &str) -> Result<FlowDocument, DocumentError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let root = parse_element(&mut reader)?;
    if root.tag != "document" {
        return Err(DocumentError::Malformed(format!(
            "expected <document> root, found <{}>",
            root.tag
        )));
    }

    let mut doc = FlowDocument::new();
    if let Some(props) = root.child("properties") {
        doc.properties = DocProperties {
            title: props.attr("title").map(str::to_owned),
            subject: props.attr("subject").map(str::to_owned),
            author: props.attr("author").map(str::to_owned),
            comments: props.attr("comments").map(str::to_owned),
        };
    }
    if let Some(styles) = root.child("styles") {
        for style in styles.children.iter().filter(|c| c.tag == "style") {
            let name = style
                .attr("name")
                .ok_or_else(|| DocumentError::Malformed("<style> without name".to_owned()))?;
            let kind = style
                .attr("kind")
                .and_then(StyleKind::parse)
                .unwrap_or_default();
            let outline_level = style.attr("outline").and_then(|l| l.parse().ok());
            doc.styles.insert(
                name.to_owned(),
                StyleDef {
                    kind,
                    outline_level,
                },
            );
        }
    }
    if let Some(body) = root.child("body") {
        for node in &body.children {
            if let Some(block) = read_block(node)? {
                doc.blocks.push(block);
            }
        }
    }
    Ok(doc)
}

fn read_block(node: &XmlNode) -> Result<Option<Block>, DocumentError> {
    let block = match node.tag.as_str() {
        "p" => Block::Paragraph(read_paragraph(node)?),
        "table" => {
            let mut rows = Vec::new();
            for tr in node.children.iter().filter(|c| c.tag == "tr") {
                let mut cells = Vec::new();
                for tc in tr.children.iter().filter(|c| c.tag == "tc") {
                    let paragraph = match tc.child("p") {
                        Some(p) => read_paragraph(p)?,
                        None => Paragraph::default(),
                    };
                    cells.push(paragraph);
                }
                rows.push(cells);
            }
            Block::Table(Table {
                style: node.attr("style").map(str::to_owned),
                rows,
            })
        }
        "toc" => {
            let entries = node
                .children
                .iter()
                .filter(|c| c.tag == "p")
                .map(read_paragraph)
                .collect::<Result<_, _>>()?;
            Block::Toc(Toc {
                caption_label: node.attr("label").map(str::to_owned),
                entry_style: node
                    .attr("entry-style")
                    .unwrap_or(DEFAULT_TOC_STYLE)
                    .to_owned(),
                entries,
            })
        }
        other => {
            tracing::debug!(tag = %other, "Skipping unknown body element");
            return Ok(None);
        }
    };
    Ok(Some(block))
}

fn read_paragraph(node: &XmlNode) -> Result<Paragraph, DocumentError> {
    let mut inlines = Vec::with_capacity(node.children.len());
    for child in &node.children {
        let inline = match child.tag.as_str() {
            "t" => Inline::Text(child.text.clone()),
            "seq" => Inline::Seq {
                label: child.attr("label").unwrap_or_default().to_owned(),
                number: child
                    .attr("number")
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(0),
            },
            "img" => Inline::Image(Image {
                name: child.attr("name").unwrap_or_default().to_owned(),
                data: BASE64_STANDARD.decode(child.text.trim())?,
            }),
            "bookmark" => Inline::Bookmark(child.attr("name").unwrap_or_default().to_owned()),
            "link" => Inline::Hyperlink {
                bookmark: child.attr("bookmark").unwrap_or_default().to_owned(),
                text: child.text.clone(),
            },
            _ => continue,
        };
        inlines.push(inline);
    }
    Ok(Paragraph {
        style: node.attr("style").map(str::to_owned),
        inlines,
    })
}

fn parse_element<R: BufRead>(reader: &mut Reader<R>) -> Result<XmlNode, DocumentError> {
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let tag = decode_tag(reader, e.name().as_ref());
                let attrs = decode_attrs(reader, &e);
                let mut node = parse_children(reader, &tag)?;
                node.tag = tag;
                node.attrs = attrs;
                return Ok(node);
            }
            Event::Empty(e) => {
                return Ok(XmlNode {
                    tag: decode_tag(reader, e.name().as_ref()),
                    attrs: decode_attrs(reader, &e),
                    ..XmlNode::default()
                });
            }
            Event::Eof => {
                return Err(DocumentError::Malformed("empty document".to_owned()));
            }
            Event::Text(_)
            | Event::GeneralRef(_)
            | Event::CData(_)
            | Event::End(_)
            | Event::Comment(_)
            | Event::Decl(_)
            | Event::PI(_)
            | Event::DocType(_) => {}
        }
        buf.clear();
    }
}

fn parse_children<R: BufRead>(
    reader: &mut Reader<R>,
    parent_tag: &str,
) -> Result<XmlNode, DocumentError> {
    let mut buf = Vec::new();
    let mut node = XmlNode::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let child_tag = decode_tag(reader, e.name().as_ref());
                let child_attrs = decode_attrs(reader, &e);
                let mut child = parse_children(reader, &child_tag)?;
                child.tag = child_tag;
                child.attrs = child_attrs;
                node.children.push(child);
            }
            Event::Empty(e) => {
                node.children.push(XmlNode {
                    tag: decode_tag(reader, e.name().as_ref()),
                    attrs: decode_attrs(reader, &e),
                    ..XmlNode::default()
                });
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                node.text.push_str(&text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?.into_owned();
                node.text.push_str(&decode_entity(&entity));
            }
            Event::CData(e) => {
                node.text.push_str(&String::from_utf8_lossy(&e));
            }
            Event::End(e) => {
                if decode_tag(reader, e.name().as_ref()) == parent_tag {
                    return Ok(node);
                }
            }
            Event::Eof => {
                return Err(DocumentError::Malformed(format!(
                    "unexpected end of document inside <{parent_tag}>"
                )));
            }
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }
}

fn decode_tag<R: BufRead>(reader: &Reader<R>, name: &[u8]) -> String {
    reader.decoder().decode(name).map_or_else(
        |_| String::from_utf8_lossy(name).into_owned(),
        std::borrow::Cow::into_owned,
    )
}

fn decode_attrs<R: BufRead>(reader: &Reader<R>, e: &BytesStart) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = decode_tag(reader, attr.key.as_ref());
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            std::borrow::Cow::into_owned,
        );
        attrs.insert(key, value);
    }
    attrs
}

/// Decode XML entity references to their character values.
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        _ => format!("&{entity};"),
    }
}

/// Serialize a document to flat XML.
pub(crate) fn serialize_document(doc: &FlowDocument) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<document>\n");

    let props = &doc.properties;
    out.push_str("<properties");
    for (name, value) in [
        ("title", &props.title),
        ("subject", &props.subject),
        ("author", &props.author),
        ("comments", &props.comments),
    ] {
        if let Some(value) = value {
            let _ = write!(out, r#" {name}="{}""#, escape_attr(value));
        }
    }
    out.push_str("/>\n<styles>\n");
    for (name, def) in &doc.styles {
        let _ = write!(
            out,
            r#"<style name="{}" kind="{}""#,
            escape_attr(name),
            def.kind.as_str()
        );
        if let Some(level) = def.outline_level {
            let _ = write!(out, r#" outline="{level}""#);
        }
        out.push_str("/>\n");
    }
    out.push_str("</styles>\n<body>\n");
    for block in &doc.blocks {
        write_block(block, &mut out);
        out.push('\n');
    }
    out.push_str("</body>\n</document>\n");
    out
}

fn write_block(block: &Block, out: &mut String) {
    match block {
        Block::Paragraph(p) => write_paragraph(p, out),
        Block::Table(t) => {
            out.push_str("<table");
            write_style_attr(t.style.as_deref(), out);
            out.push('>');
            for row in &t.rows {
                out.push_str("<tr>");
                for cell in row {
                    out.push_str("<tc>");
                    write_paragraph(cell, out);
                    out.push_str("</tc>");
                }
                out.push_str("</tr>");
            }
            out.push_str("</table>");
        }
        Block::Toc(toc) => {
            out.push_str("<toc");
            if let Some(label) = &toc.caption_label {
                let _ = write!(out, r#" label="{}""#, escape_attr(label));
            }
            let _ = write!(out, r#" entry-style="{}">"#, escape_attr(&toc.entry_style));
            for entry in &toc.entries {
                write_paragraph(entry, out);
            }
            out.push_str("</toc>");
        }
    }
}

fn write_paragraph(p: &Paragraph, out: &mut String) {
    out.push_str("<p");
    write_style_attr(p.style.as_deref(), out);
    out.push('>');
    for inline in &p.inlines {
        match inline {
            Inline::Text(t) => {
                let _ = write!(out, "<t>{}</t>", escape_text(t));
            }
            Inline::Seq { label, number } => {
                let _ = write!(
                    out,
                    r#"<seq label="{}" number="{number}"/>"#,
                    escape_attr(label)
                );
            }
            Inline::Image(image) => {
                let _ = write!(
                    out,
                    r#"<img name="{}">{}</img>"#,
                    escape_attr(&image.name),
                    BASE64_STANDARD.encode(&image.data)
                );
            }
            Inline::Bookmark(name) => {
                let _ = write!(out, r#"<bookmark name="{}"/>"#, escape_attr(name));
            }
            Inline::Hyperlink { bookmark, text } => {
                let _ = write!(
                    out,
                    r#"<link bookmark="{}">{}</link>"#,
                    escape_attr(bookmark),
                    escape_text(text)
                );
            }
        }
    }
    out.push_str("</p>");
}

fn write_style_attr(style: Option<&str>, out: &mut String) {
    if let Some(style) = style {
        let _ = write!(out, r#" style="{}""#, escape_attr(style));
    }
}

/// Escape text for XML content.
fn escape_text(text: &str) -> String {
    escape_xml(text, false)
}

/// Escape text for XML attribute values.
fn escape_attr(text: &str) -> String {
    escape_xml(text, true)
}

/// Escape XML special characters.
fn escape_xml(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            '\'' if escape_quotes => result.push_str("&apos;"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use pretty_assertions::assert_eq;

    fn sample() -> FlowDocument {
        let mut doc = FlowDocument::new()
            .with_style("Heading 1", StyleDef::heading(1))
            .with_style("Grid", StyleDef::table());
        doc.push_toc(None, &["Intro"])
            .push_paragraph(Some("Heading 1"), "Intro & <scope>")
            .push_caption("Figure", 1, "Overview")
            .push_table(&[&["Name", "Type"], &["mRID", "String"]]);
        doc.properties.title = Some("Profile \"A\"".to_owned());
        doc
    }

    #[test]
    fn test_round_trip_preserves_document() {
        let doc = sample();
        let xml = serialize_document(&doc);
        let parsed = parse_document(&xml).unwrap();
        assert_eq!(parsed, doc);
        assert_eq!(parsed.text(), doc.text());
    }

    #[test]
    fn test_round_trip_images_links_bookmarks() {
        let mut doc = FlowDocument::new();
        doc.blocks.push(Block::Paragraph(Paragraph {
            style: None,
            inlines: vec![
                Inline::Bookmark("bm_a".to_owned()),
                Inline::Image(Image {
                    name: "d.png".to_owned(),
                    data: vec![0, 159, 146, 150],
                }),
                Inline::Hyperlink {
                    bookmark: "bm_a".to_owned(),
                    text: "A".to_owned(),
                },
            ],
        }));
        let parsed = parse_document(&serialize_document(&doc)).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_text_whitespace_is_significant_in_runs() {
        let xml = "<document><body>\n  <p>\n    <t>  two  spaces  </t>\n  </p>\n</body></document>";
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.text(), "  two  spaces  \n");
    }

    #[test]
    fn test_unknown_elements_are_skipped() {
        let xml = "<document><body><sectPr/><p><t>x</t><rsid/></p></body></document>";
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.text(), "x\n");
    }

    #[test]
    fn test_wrong_root_is_malformed() {
        let err = parse_document("<html/>").unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }

    #[test]
    fn test_numeric_entities() {
        let xml = "<document><body><p><t>&#x2013;&#65;</t></p></body></document>";
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.text(), "\u{2013}A\n");
    }
}
