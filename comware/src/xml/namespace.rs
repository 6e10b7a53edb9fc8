//! Comware NETCONF namespaces and per-namespace element builders.

use super::Element;

/// NETCONF base namespace (rpc envelopes, `operation` attribute, CLI tunnel).
pub const NETCONFBASE: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// Comware configuration namespace, used inside `edit-config`.
pub const NCCONFIG: &str = "http://www.h3c.com/netconf/config:1.0";

/// Comware data namespace, used for `get` filters and replies.
pub const NCDATA: &str = "http://www.h3c.com/netconf/data:1.0";

/// Comware action namespace.
pub const NCACTION: &str = "http://www.h3c.com/netconf/action:1.0";

/// Builds elements that all live in one namespace.
///
/// ```
/// use comware::xml::ElementMaker;
///
/// let e = ElementMaker::data();
/// let top = e.node("top", [e.node("VLAN", [e.node("VLANs", [e.empty("VLANID")])])]);
/// assert_eq!(top.children[0].name, "VLAN");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementMaker {
    namespace: &'static str,
}

impl ElementMaker {
    pub const fn new(namespace: &'static str) -> Self {
        Self { namespace }
    }

    pub const fn config() -> Self {
        Self::new(NCCONFIG)
    }

    pub const fn data() -> Self {
        Self::new(NCDATA)
    }

    pub const fn action() -> Self {
        Self::new(NCACTION)
    }

    pub const fn netconf() -> Self {
        Self::new(NETCONFBASE)
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// Element with no content.
    pub fn empty(&self, name: &str) -> Element {
        Element::new(Some(self.namespace), name)
    }

    /// Leaf element carrying text.
    pub fn leaf(&self, name: &str, text: impl Into<String>) -> Element {
        self.empty(name).with_text(text)
    }

    /// Element with children.
    pub fn node(&self, name: &str, children: impl IntoIterator<Item = Element>) -> Element {
        self.empty(name).with_children(children)
    }
}

pub fn find_in_data<'a>(tag: &str, element: &'a Element) -> Option<&'a Element> {
    element.find(NCDATA, tag)
}

pub fn find_all_in_data<'a>(tag: &str, element: &'a Element) -> Vec<&'a Element> {
    element.find_all(NCDATA, tag)
}

pub fn find_in_config<'a>(tag: &str, element: &'a Element) -> Option<&'a Element> {
    element.find(NCCONFIG, tag)
}

pub fn find_in_action<'a>(tag: &str, element: &'a Element) -> Option<&'a Element> {
    element.find(NCACTION, tag)
}

pub fn find_all_in_action<'a>(tag: &str, element: &'a Element) -> Vec<&'a Element> {
    element.find_all(NCACTION, tag)
}
