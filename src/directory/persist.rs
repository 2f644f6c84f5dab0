//! Versioned XML snapshot of the directory tree.
//!
//! Layout:
//!
//! ```text
//! <rhythmbox_iradio version="2.2">
//!   <node id="7" type="genre">
//!     <property id="0" value_type="string">Jazz</property>
//!     <parent id="0"/>
//!   </node>
//!   <node id="8" type="station">
//!     <property id="23" value_type="list"><entry>http://b</entry></property>
//!     <property id="5" value_type="node">7</property>
//!     <parent id="1"/>
//!     <parent id="7"/>
//!   </node>
//! </rhythmbox_iradio>
//! ```
//!
//! Nodes are written in the order given and read back in document order.
//! Snapshots are written to a temporary file beside the target and renamed
//! over it, so the target is never partially written.

use crate::error::{DirectoryError, Result};
use crate::node::{NodeDatabase, PropId, Property, ValueKind};
use crate::types::NodeId;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Format version written to, and required from, the root element.
pub const XML_VERSION: &str = "2.2";

pub const ROOT_ELEMENT: &str = "rhythmbox_iradio";

/// One node as read from a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotNode {
    pub id: NodeId,
    pub kind: String,
    pub properties: Vec<Property>,
    pub parents: Vec<NodeId>,
}

/// Serializes `nodes` (id and type tag) into a complete XML document.
pub fn write_snapshot<W: Write>(db: &NodeDatabase, nodes: &[(NodeId, &str)], out: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new(ROOT_ELEMENT);
    root.push_attribute(("version", XML_VERSION));
    writer.write_event(Event::Start(root))?;

    for (id, kind) in nodes {
        let node = db.get(*id)?;
        let id_text = id.to_string();
        let mut start = BytesStart::new("node");
        start.push_attribute(("id", id_text.as_str()));
        start.push_attribute(("type", *kind));
        writer.write_event(Event::Start(start))?;

        for property in node.properties() {
            write_property(&mut writer, property)?;
        }
        for parent in node.parents() {
            let parent_text = parent.to_string();
            let mut elem = BytesStart::new("parent");
            elem.push_attribute(("id", parent_text.as_str()));
            writer.write_event(Event::Empty(elem))?;
        }

        writer.write_event(Event::End(BytesEnd::new("node")))?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
    writer.get_mut().write_all(b"\n")?;
    Ok(())
}

fn write_property<W: Write>(writer: &mut Writer<W>, property: &Property) -> Result<()> {
    let prop = property.id();
    let id_text = prop.as_u32().to_string();
    let mut start = BytesStart::new("property");
    start.push_attribute(("id", id_text.as_str()));
    start.push_attribute(("value_type", prop.kind().tag()));

    let text = match property {
        Property::AltLocations(entries) => {
            writer.write_event(Event::Start(start))?;
            for entry in entries {
                writer.write_event(Event::Start(BytesStart::new("entry")))?;
                writer.write_event(Event::Text(BytesText::new(entry)))?;
                writer.write_event(Event::End(BytesEnd::new("entry")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("property")))?;
            return Ok(());
        }
        Property::RealGenre(id) => id.to_string(),
        Property::Priority(flag) => if *flag { "1" } else { "0" }.to_string(),
        other => match other.as_i64() {
            Some(v) => v.to_string(),
            None => other.as_str().unwrap_or_default().to_string(),
        },
    };

    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(&text)))?;
    writer.write_event(Event::End(BytesEnd::new("property")))?;
    Ok(())
}

/// Writes `bytes` to a temporary file beside `target` and returns its path.
/// The target itself is not touched.
pub fn write_temp(target: &Path, bytes: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp_name = target.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(tmp_path)
}

/// Atomically replaces `target` with the temporary file.
pub fn commit_temp(tmp_path: &Path, target: &Path) -> Result<()> {
    fs::rename(tmp_path, target)?;
    Ok(())
}

/// Reads and parses a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Vec<SnapshotNode>> {
    let content = fs::read_to_string(path)?;
    parse_snapshot(&content, path)
}

/// Parses snapshot text. `path` is only used in error messages.
pub fn parse_snapshot(content: &str, path: &Path) -> Result<Vec<SnapshotNode>> {
    let mut parser = SnapshotParser {
        path,
        nodes: Vec::new(),
        current: None,
        property: None,
        in_entry: false,
        seen_root: false,
    };
    // no trimming: property and entry text is kept verbatim
    let mut reader = Reader::from_str(content);

    loop {
        let event = reader.read_event().map_err(|e| parser.error(e.to_string()))?;
        match event {
            Event::Start(e) => parser.start(&e, false)?,
            Event::Empty(e) => parser.start(&e, true)?,
            Event::End(e) => parser.end(e.name().as_ref())?,
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| parser.error(e.to_string()))?;
                parser.text(&text);
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t).into_owned();
                parser.text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !parser.seen_root {
        return Err(parser.error("missing root element".to_string()));
    }
    if parser.current.is_some() {
        return Err(parser.error("unterminated node element".to_string()));
    }
    debug!(count = parser.nodes.len(), "parsed directory snapshot");
    Ok(parser.nodes)
}

struct PendingProperty {
    prop: Option<PropId>,
    kind: ValueKind,
    text: String,
    entries: Vec<String>,
}

struct SnapshotParser<'a> {
    path: &'a Path,
    nodes: Vec<SnapshotNode>,
    current: Option<SnapshotNode>,
    property: Option<PendingProperty>,
    in_entry: bool,
    seen_root: bool,
}

impl<'a> SnapshotParser<'a> {
    fn error(&self, message: String) -> DirectoryError {
        DirectoryError::Parse {
            path: self.path.to_path_buf(),
            message,
        }
    }

    fn attribute(&self, elem: &BytesStart<'_>, key: &str) -> Result<Option<String>> {
        for attr in elem.attributes() {
            let attr = attr?;
            if attr.key.as_ref() == key.as_bytes() {
                let value = attr
                    .unescape_value()
                    .map_err(|e| self.error(e.to_string()))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    fn id_attribute(&self, elem: &BytesStart<'_>) -> Result<NodeId> {
        let raw = self
            .attribute(elem, "id")?
            .ok_or_else(|| self.error("element without id".to_string()))?;
        raw.trim()
            .parse::<u64>()
            .map(NodeId)
            .map_err(|_| self.error(format!("invalid id {:?}", raw)))
    }

    fn start(&mut self, elem: &BytesStart<'_>, empty: bool) -> Result<()> {
        let name = elem.name();
        match name.as_ref() {
            b"rhythmbox_iradio" => {
                let version = self.attribute(elem, "version")?;
                if version.as_deref() != Some(XML_VERSION) {
                    return Err(DirectoryError::VersionMismatch {
                        found: version,
                        expected: XML_VERSION,
                    });
                }
                self.seen_root = true;
            }
            _ if !self.seen_root => {
                return Err(self.error("missing root element".to_string()));
            }
            b"node" => {
                if self.current.is_some() {
                    return Err(self.error("nested node element".to_string()));
                }
                let node = SnapshotNode {
                    id: self.id_attribute(elem)?,
                    kind: self.attribute(elem, "type")?.unwrap_or_default(),
                    properties: Vec::new(),
                    parents: Vec::new(),
                };
                if empty {
                    self.nodes.push(node);
                } else {
                    self.current = Some(node);
                }
            }
            b"property" => {
                if self.current.is_none() {
                    return Err(self.error("property outside node".to_string()));
                }
                let raw_id = self.attribute(elem, "id")?.unwrap_or_default();
                let prop = raw_id.trim().parse::<u32>().ok().and_then(PropId::from_u32);
                let tag = self.attribute(elem, "value_type")?.unwrap_or_default();
                let kind = ValueKind::from_tag(&tag)
                    .ok_or_else(|| self.error(format!("unknown value_type {:?}", tag)))?;
                if let Some(prop) = prop {
                    if prop.kind() != kind {
                        return Err(self.error(format!(
                            "property {:?} stored as {}",
                            prop, tag
                        )));
                    }
                }
                self.property = Some(PendingProperty {
                    prop,
                    kind,
                    text: String::new(),
                    entries: Vec::new(),
                });
                if empty {
                    self.end(b"property")?;
                }
            }
            b"entry" => {
                if self.property.is_none() {
                    return Err(self.error("entry outside property".to_string()));
                }
                if let Some(pending) = self.property.as_mut() {
                    pending.entries.push(String::new());
                }
                self.in_entry = !empty;
            }
            b"parent" => {
                let id = self.id_attribute(elem)?;
                match self.current.as_mut() {
                    Some(node) => node.parents.push(id),
                    None => return Err(self.error("parent outside node".to_string())),
                }
            }
            other => {
                return Err(self.error(format!(
                    "unexpected element {}",
                    String::from_utf8_lossy(other)
                )));
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(pending) = self.property.as_mut() {
            if self.in_entry {
                if let Some(last) = pending.entries.last_mut() {
                    last.push_str(text);
                }
            } else {
                pending.text.push_str(text);
            }
        }
    }

    fn end(&mut self, name: &[u8]) -> Result<()> {
        match name {
            b"entry" => self.in_entry = false,
            b"property" => {
                let Some(pending) = self.property.take() else {
                    return Ok(());
                };
                let Some(prop) = pending.prop else {
                    debug!("skipping unknown property in snapshot");
                    return Ok(());
                };
                let property = self.build_property(prop, pending)?;
                if let Some(node) = self.current.as_mut() {
                    node.properties.push(property);
                }
            }
            b"node" => {
                if let Some(node) = self.current.take() {
                    self.nodes.push(node);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn build_property(&self, prop: PropId, pending: PendingProperty) -> Result<Property> {
        let text = pending.text.trim();
        let invalid = || self.error(format!("invalid value {:?} for {:?}", text, prop));
        let property = match pending.kind {
            ValueKind::String => Property::string(prop, pending.text.clone()),
            ValueKind::Int | ValueKind::Long => text
                .parse::<i64>()
                .ok()
                .and_then(|v| Property::integer(prop, v)),
            ValueKind::Bool => match text {
                "1" | "true" => Some(Property::Priority(true)),
                "0" | "false" => Some(Property::Priority(false)),
                _ => None,
            },
            ValueKind::Node => text
                .parse::<u64>()
                .ok()
                .map(|v| Property::RealGenre(NodeId(v))),
            ValueKind::List => Some(Property::AltLocations(pending.entries)),
        };
        property.ok_or_else(invalid)
    }
}
