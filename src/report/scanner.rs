//! Event scanner over loosely-formed report markup.
//!
//! Test reporters are not always careful about the XML they write, so the
//! scanner keeps going past mismatched close tags and undecodable entities.
//! Only input the tokenizer cannot split into tags at all is an error.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ReportError;

/// An open tag with its attributes. Names are lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Callbacks invoked while scanning. `stack` holds the currently open
/// elements, outermost first; on `close` the closed element has already been
/// removed from it.
pub trait ScanHandler {
    fn open(&mut self, _element: &Element, _stack: &[Element]) {}

    fn close(&mut self, _element: Element, _stack: &[Element]) {}

    fn text(&mut self, _text: &str, _stack: &[Element]) {}

    fn cdata(&mut self, _content: &str, _stack: &[Element]) {}
}

/// Scan `xml` end to end, feeding every event to `handler`.
pub fn scan<H: ScanHandler>(xml: &str, handler: &mut H) -> Result<(), ReportError> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.expand_empty_elements = true;

    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let element = read_element(&e);
                handler.open(&element, &stack);
                stack.push(element);
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                // A close tag with no matching open tag is dropped; one that
                // matches further down closes everything above it too.
                if let Some(depth) = stack.iter().rposition(|el| el.name == name) {
                    while stack.len() > depth {
                        if let Some(element) = stack.pop() {
                            handler.close(element, &stack);
                        }
                    }
                }
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map(|t| t.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                handler.text(&text, &stack);
            }
            Event::CData(e) => {
                handler.cdata(&String::from_utf8_lossy(&e), &stack);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    while let Some(element) = stack.pop() {
        handler.close(element, &stack);
    }
    Ok(())
}

fn read_element(e: &BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
    let attributes = e
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_lowercase();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            (key, value)
        })
        .collect();
    Element { name, attributes }
}
