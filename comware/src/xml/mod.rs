//! Namespaced XML trees for NETCONF payloads and replies.
//!
//! [`Element`] is a small owned tree: every call that builds a query makes a
//! fresh one, so templates are never shared or mutated across calls.
//! Parsing and serialization go through quick-xml.

pub mod mapping;
pub mod namespace;

use std::fmt;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::error::XmlError;

pub use mapping::{
    EditOperation, KeyMap, ParamMap, ValueMap, data_element_to_dict, element_to_dict,
    operation_attribute, params_to_elements, reverse_key_map, reverse_value_map,
};
pub use namespace::{
    ElementMaker, NCACTION, NCCONFIG, NCDATA, NETCONFBASE, find_all_in_action, find_all_in_data,
    find_in_action, find_in_config, find_in_data,
};

/// An XML attribute, optionally namespaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(namespace: Option<&str>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An XML element with its namespace resolved.
///
/// `text` is the character data before the first child, which is where
/// NETCONF replies keep leaf values and CLI output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element.
    pub fn new(namespace: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children, in order.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Add attributes.
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Append a child in place.
    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Check the qualified name.
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// Text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Look up an attribute value.
    pub fn attribute(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == namespace)
            .map(|a| a.value.as_str())
    }

    /// Iterate over all descendants in document order (self excluded).
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// First descendant with the given qualified name.
    pub fn find(&self, namespace: &str, name: &str) -> Option<&Element> {
        self.descendants().find(|e| e.is(namespace, name))
    }

    /// Mutable access to the first descendant with the given qualified name.
    pub fn find_mut(&mut self, namespace: &str, name: &str) -> Option<&mut Element> {
        for child in &mut self.children {
            if child.is(namespace, name) {
                return Some(child);
            }
            if let Some(found) = child.find_mut(namespace, name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given qualified name.
    pub fn find_all(&self, namespace: &str, name: &str) -> Vec<&Element> {
        self.descendants().filter(|e| e.is(namespace, name)).collect()
    }

    /// Text of the first matching descendant.
    pub fn find_text(&self, namespace: &str, name: &str) -> Option<&str> {
        self.find(namespace, name).and_then(Element::text)
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Element, XmlError> {
        let mut reader = NsReader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();

        loop {
            match reader.read_resolved_event()? {
                (ns, Event::Start(start)) => {
                    let namespace = owned_namespace(ns);
                    stack.push(open_element(&reader, namespace, &start)?);
                }
                (ns, Event::Empty(start)) => {
                    let namespace = owned_namespace(ns);
                    let element = open_element(&reader, namespace, &start)?;
                    if let Some(root) = close_element(&mut stack, element) {
                        return Ok(root);
                    }
                }
                (_, Event::End(_)) => {
                    if let Some(element) = stack.pop() {
                        if let Some(root) = close_element(&mut stack, element) {
                            return Ok(root);
                        }
                    }
                }
                (_, Event::Text(text)) => {
                    let text = text.unescape()?;
                    append_text(&mut stack, &text);
                }
                (_, Event::CData(data)) => {
                    let data = data.into_inner();
                    append_text(&mut stack, &String::from_utf8_lossy(&data));
                }
                (_, Event::Eof) => return Err(XmlError::NoRoot),
                _ => {}
            }
        }
    }

    /// Serialize without indentation.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self, &Scope::default())?;
        Ok(String::from_utf8(writer.into_inner())?)
    }

    /// Serialize with two-space indentation.
    pub fn to_pretty_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        write_element(&mut writer, self, &Scope::default())?;
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.to_xml().map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}

/// Depth-first iterator over an element's descendants.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

fn owned_namespace(ns: ResolveResult<'_>) -> Option<String> {
    match ns {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.0).into_owned()),
        _ => None,
    }
}

fn open_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> Result<Element, XmlError> {
    let mut element = Element {
        namespace,
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        ..Default::default()
    };

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let namespace = owned_namespace(ns);
        element.attributes.push(Attribute {
            namespace,
            name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value: attr.unescape_value()?.into_owned(),
        });
    }

    Ok(element)
}

/// Attach a finished element to its parent, or hand it back as the root.
fn close_element(stack: &mut [Element], element: Element) -> Option<Element> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            None
        }
        None => Some(element),
    }
}

fn append_text(stack: &mut [Element], text: &str) {
    // Text after a child is tail text; replies never carry data there.
    if let Some(current) = stack.last_mut() {
        if current.children.is_empty() {
            current.text.get_or_insert_with(String::new).push_str(text);
        }
    }
}

/// Namespace bindings in effect while writing.
#[derive(Default, Clone)]
struct Scope {
    default_ns: Option<String>,
    prefixes: Vec<(String, String)>,
}

impl Scope {
    fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .rev()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &Element,
    parent: &Scope,
) -> Result<(), quick_xml::Error> {
    let mut scope = parent.clone();
    let mut start = BytesStart::new(element.name.as_str());

    if element.namespace != scope.default_ns {
        start.push_attribute(("xmlns", element.namespace.as_deref().unwrap_or("")));
        scope.default_ns = element.namespace.clone();
    }

    for attr in &element.attributes {
        let key = match attr.namespace.as_deref() {
            None => attr.name.clone(),
            Some(uri) => {
                let prefix = match scope.prefix_for(uri) {
                    Some(prefix) => prefix.to_string(),
                    None => {
                        let prefix = if uri == NETCONFBASE {
                            "nc".to_string()
                        } else {
                            format!("ns{}", scope.prefixes.len())
                        };
                        let decl = format!("xmlns:{prefix}");
                        start.push_attribute((decl.as_str(), uri));
                        scope.prefixes.push((prefix.clone(), uri.to_string()));
                        prefix
                    }
                };
                format!("{}:{}", prefix, attr.name)
            }
        };
        start.push_attribute((key.as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() && element.text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &element.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &element.children {
        write_element(writer, child, &scope)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="101">
  <data>
    <top xmlns="http://www.h3c.com/netconf/data:1.0">
      <VLAN>
        <VLANs>
          <VLANID><ID>10</ID><Name>web &amp; api</Name></VLANID>
          <VLANID><ID>20</ID><Name>db</Name></VLANID>
        </VLANs>
      </VLAN>
    </top>
  </data>
</rpc-reply>"#;

    #[test]
    fn test_parse_resolves_namespaces() {
        let root = Element::parse(REPLY).unwrap();
        assert!(root.is(NETCONFBASE, "rpc-reply"));
        assert_eq!(root.attribute(None, "message-id"), Some("101"));

        let ids: Vec<_> = root
            .find_all(NCDATA, "ID")
            .into_iter()
            .filter_map(Element::text)
            .collect();
        assert_eq!(ids, vec!["10", "20"]);
        assert_eq!(root.find_text(NCDATA, "Name"), Some("web & api"));
    }

    #[test]
    fn test_find_is_namespace_exact() {
        let root = Element::parse(REPLY).unwrap();
        assert!(root.find(NCCONFIG, "ID").is_none());
        assert!(root.find_all(NETCONFBASE, "ID").is_empty());
    }

    #[test]
    fn test_find_excludes_self() {
        let el = Element::new(Some(NCDATA), "ID").with_text("1");
        assert!(el.find(NCDATA, "ID").is_none());
    }

    #[test]
    fn test_find_mut_appends_in_place() {
        let mut top = ElementMaker::data().node(
            "top",
            [ElementMaker::data().node("VLAN", [ElementMaker::data().empty("VLANID")])],
        );
        top.find_mut(NCDATA, "VLANID")
            .unwrap()
            .push(ElementMaker::data().leaf("ID", "7"));
        assert_eq!(top.find_text(NCDATA, "ID"), Some("7"));
    }

    #[test]
    fn test_serialize_declares_namespaces_once() {
        let e = ElementMaker::config();
        let tree = e.node("top", [e.node("VLAN", [e.leaf("ID", "10")])]);
        assert_eq!(
            tree.to_xml().unwrap(),
            r#"<top xmlns="http://www.h3c.com/netconf/config:1.0"><VLAN><ID>10</ID></VLAN></top>"#
        );
    }

    #[test]
    fn test_serialize_prefixes_namespaced_attribute() {
        let e = ElementMaker::config();
        let tree = ElementMaker::netconf().node(
            "config",
            [e.node("VLAN", []).with_attributes(operation_attribute(Some(EditOperation::Delete)))],
        );
        assert_eq!(
            tree.to_xml().unwrap(),
            concat!(
                r#"<config xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">"#,
                r#"<VLAN xmlns="http://www.h3c.com/netconf/config:1.0" xmlns:nc="urn:ietf:params:xml:ns:netconf:base:1.0" nc:operation="delete"/>"#,
                r#"</config>"#
            )
        );
    }

    #[test]
    fn test_text_is_escaped_and_reparsed() {
        let el = Element::new(Some(NETCONFBASE), "Execution").with_text("display <vlan> & more");
        let xml = el.to_xml().unwrap();
        assert!(xml.contains("display &lt;vlan&gt; &amp; more"));
        assert_eq!(Element::parse(&xml).unwrap(), el);
    }

    #[test]
    fn test_pretty_output_is_indented() {
        let e = ElementMaker::data();
        let tree = e.node("top", [e.node("VLAN", [e.leaf("ID", "1")])]);
        let pretty = tree.to_pretty_xml().unwrap();
        assert!(pretty.contains("\n  <VLAN>"));
        assert!(pretty.contains("<ID>1</ID>"));
    }

    #[test]
    fn test_parse_rejects_empty_document() {
        assert!(matches!(Element::parse(""), Err(XmlError::NoRoot)));
        assert!(Element::parse("<a><b></a>").is_err());
    }

    #[test]
    fn test_cdata_is_text() {
        let root = Element::parse(
            r#"<CLI xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><Execution><![CDATA[<H3C>]]></Execution></CLI>"#,
        )
        .unwrap();
        assert_eq!(root.find_text(NETCONFBASE, "Execution"), Some("<H3C>"));
    }
}
