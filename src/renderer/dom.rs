//! DOM (Document Object Model) implementation
//!
//! Nodes are a tagged variant; elements keep their attributes as an ordered
//! list in parse order, which is what makes `serialize_dom` canonical.

/// Node types in the DOM
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    /// Document root
    Document,
    /// Element node (e.g., `<div>`)
    Element(ElementData),
    /// Text node
    Text(String),
    /// Comment node
    Comment(String),
    /// `<!DOCTYPE …>` marker
    Doctype,
}

/// Data for element nodes
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name, lowercase ASCII after parsing
    pub tag_name: String,
    /// Attributes in parse order; names are lowercase ASCII
    attributes: Vec<(String, String)>,
}

impl ElementData {
    /// Create a new element
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute value, replacing an existing one in place
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// Record an attribute during parsing; the first occurrence of a
    /// duplicated name wins.
    pub fn push_parsed_attribute(&mut self, name: String, value: String) {
        if self.get_attribute(&name).is_none() {
            self.attributes.push((name, value));
        }
    }

    /// Remove an attribute; returns whether it was present
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(n, _)| n != name);
        self.attributes.len() != before
    }

    /// All attributes, in parse order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Get the ID attribute
    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id")
    }

    /// Get class names
    pub fn classes(&self) -> Vec<&str> {
        self.get_attribute("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Whether the `class` attribute contains the given token
    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().contains(&class_name)
    }
}

/// A node in the DOM tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node type and data
    pub node_type: NodeType,
    /// Child nodes in parse order
    pub children: Vec<Node>,
}

impl Node {
    /// Create a new node
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            children: Vec::new(),
        }
    }

    /// Create an element node
    pub fn element(tag_name: impl Into<String>) -> Self {
        Self::new(NodeType::Element(ElementData::new(tag_name)))
    }

    /// Create a text node
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeType::Text(content.into()))
    }

    /// Create a comment node
    pub fn comment(content: impl Into<String>) -> Self {
        Self::new(NodeType::Comment(content.into()))
    }

    /// Add a child node
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        matches!(self.node_type, NodeType::Element(_))
    }

    /// Get element data if this is an element
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Get mutable element data if this is an element
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Tag name for elements, empty otherwise
    pub fn tag_name(&self) -> &str {
        match &self.node_type {
            NodeType::Element(data) => &data.tag_name,
            _ => "",
        }
    }

    /// Concatenated text content of this subtree
    pub fn inner_text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// First element in document order with the given id
    pub fn find_by_id(&self, id: &str) -> Option<&Node> {
        if let Some(data) = self.as_element() {
            if data.id() == Some(id) {
                return Some(self);
            }
        }
        self.children.iter().find_map(|c| c.find_by_id(id))
    }

    /// Mutable variant of `find_by_id`
    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Node> {
        let is_match = self
            .as_element()
            .map(|data| data.id() == Some(id))
            .unwrap_or(false);
        if is_match {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_by_id_mut(id))
    }

    /// First element in document order with the given tag name
    pub fn find_first_by_tag(&self, tag: &str) -> Option<&Node> {
        if self.is_element() && self.tag_name() == tag {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_first_by_tag(tag))
    }

    /// All elements in document order with the given tag name
    pub fn find_all_by_tag<'a>(&'a self, tag: &str, out: &mut Vec<&'a Node>) {
        if self.is_element() && self.tag_name() == tag {
            out.push(self);
        }
        for child in &self.children {
            child.find_all_by_tag(tag, out);
        }
    }

    /// All elements in document order carrying the given class token
    pub fn find_all_by_class<'a>(&'a self, class_name: &str, out: &mut Vec<&'a Node>) {
        if let Some(data) = self.as_element() {
            if data.has_class(class_name) {
                out.push(self);
            }
        }
        for child in &self.children {
            child.find_all_by_class(class_name, out);
        }
    }
}

fn collect_text(node: &Node, out: &mut String) {
    if let NodeType::Text(text) = &node.node_type {
        out.push_str(text);
    }
    for child in &node.children {
        collect_text(child, out);
    }
}

/// The DOM document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Root node
    pub root: Node,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self {
            root: Node::new(NodeType::Document),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a DOM subtree to a canonical string for deterministic
/// comparison. Attribute order is parse order.
pub fn serialize_dom(node: &Node) -> String {
    let mut out = String::new();

    match &node.node_type {
        NodeType::Document => out.push_str("#document"),
        NodeType::Text(text) => {
            return format!("TEXT(\"{}\")", text);
        }
        NodeType::Comment(text) => {
            return format!("COMMENT(\"{}\")", text);
        }
        NodeType::Doctype => {
            return "DOCTYPE".to_string();
        }
        NodeType::Element(data) => {
            out.push('<');
            out.push_str(&data.tag_name);
            for (name, value) in data.attributes() {
                out.push_str(&format!(" {}=\"{}\"", name, value));
            }
            out.push('>');
        }
    }

    for child in &node.children {
        out.push('[');
        out.push_str(&serialize_dom(child));
        out.push(']');
    }

    if let NodeType::Element(data) = &node.node_type {
        out.push_str(&format!("</{}>", data.tag_name));
    }

    out
}
