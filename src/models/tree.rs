use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ReportError;

#[derive(Debug, Clone)]
pub struct XmlNode {
    pub id: usize,
    pub children: Vec<usize>,
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

/// Arena-backed element tree with typed attribute access.
#[derive(Debug, Default)]
pub struct XmlTree {
    nodes: Vec<XmlNode>,
    root_ids: Vec<usize>,
}

impl XmlTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a complete document. Text and comments are dropped; only
    /// elements and their attributes are kept.
    pub fn parse(xml: &str) -> Result<Self, ReportError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().expand_empty_elements = true;

        let mut tree = Self::new();
        let mut stack: Vec<usize> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let (name, attributes) = read_element(&e)?;
                    let id = match stack.last() {
                        Some(&parent_id) => tree.add_child(parent_id, name, attributes),
                        None => tree.add_root(name, attributes),
                    };
                    stack.push(id);
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(&open) = stack.last() {
            return Err(ReportError::Unclosed(tree.nodes[open].name.clone()));
        }
        if tree.root_ids.is_empty() {
            return Err(ReportError::Empty);
        }
        Ok(tree)
    }

    /// Add a top-level element. Returns the node id.
    pub fn add_root(&mut self, name: String, attributes: BTreeMap<String, String>) -> usize {
        let id = self.add_node(name, attributes);
        self.root_ids.push(id);
        id
    }

    /// Add an element under a parent. Returns the node id.
    pub fn add_child(
        &mut self,
        parent_id: usize,
        name: String,
        attributes: BTreeMap<String, String>,
    ) -> usize {
        let id = self.add_node(name, attributes);
        self.nodes[parent_id].children.push(id);
        id
    }

    fn add_node(&mut self, name: String, attributes: BTreeMap<String, String>) -> usize {
        let id = self.nodes.len();
        self.nodes.push(XmlNode {
            id,
            children: Vec::new(),
            name,
            attributes,
        });
        id
    }

    pub fn get(&self, id: usize) -> Option<&XmlNode> {
        self.nodes.get(id)
    }

    /// The document element.
    pub fn root(&self) -> Option<&XmlNode> {
        self.root_ids.first().and_then(|&id| self.nodes.get(id))
    }

    pub fn attr(&self, id: usize, key: &str) -> Option<&str> {
        self.nodes.get(id)?.attributes.get(key).map(String::as_str)
    }

    /// Direct children of `parent` whose tag is `tag`, in document order.
    pub fn children_named<'a>(
        &'a self,
        parent: usize,
        tag: &'a str,
    ) -> impl Iterator<Item = usize> + 'a {
        self.get(parent)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(move |&id| self.nodes[id].name == tag)
    }

    /// Find the first child of `parent` with the given tag whose `name`
    /// attribute equals `name`.
    pub fn find_child_by_name(&self, parent: usize, tag: &str, name: &str) -> Option<usize> {
        self.children_named(parent, tag)
            .find(|&id| self.attr(id, "name") == Some(name))
    }
}

fn read_element(e: &BytesStart<'_>) -> Result<(String, BTreeMap<String, String>), ReportError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = BTreeMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.insert(key, value);
    }
    Ok((name, attributes))
}
