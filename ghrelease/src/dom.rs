use std::fmt::{self, Write};

/// The document operations the release widget needs. The crate ships [`HtmlDocument`], but any
/// node tree that can do these things can be rendered into.
pub trait Document {
    /// A cheap handle to one element of the document.
    type Node: Copy + fmt::Debug;

    /// Finds the element with the given `id` attribute among the elements attached to the
    /// document.
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Creates a new element that is not attached to anything yet.
    fn create_element(&mut self, tag: &str) -> Self::Node;

    /// Adds a class to the element. Adding a class it already has does nothing.
    fn add_class(&mut self, node: Self::Node, class: &str);

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    fn set_text(&mut self, node: Self::Node, text: &str);

    /// Appends `child` as the last child of `parent`, detaching it from its old parent first.
    /// Appending an element to itself or to one of its own descendants does nothing.
    fn append_child(&mut self, parent: Self::Node, child: Self::Node);

    /// Detaches every child of the element.
    fn clear_children(&mut self, node: Self::Node);
}

/// Creates an element with the given tag and classes.
pub fn create_element_with_classes<D: Document + ?Sized>(
    doc: &mut D,
    tag: &str,
    classes: &[&str],
) -> D::Node {
    let node = doc.create_element(tag);
    for class in classes {
        doc.add_class(node, class);
    }
    node
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
    text: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// An in-memory element tree that can be serialized as HTML. Elements live in an arena and are
/// never freed, so detached elements keep their handles valid.
#[derive(Debug)]
pub struct HtmlDocument {
    elements: Vec<Element>,
    body: NodeId,
}

impl Default for HtmlDocument {
    fn default() -> Self {
        HtmlDocument::new()
    }
}

impl HtmlDocument {
    /// Returns a document containing only an empty `body` element.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = HtmlDocument {
            elements: vec![],
            body: NodeId(0),
        };
        doc.body = doc.create_element("body");
        doc
    }

    /// Returns a document whose body holds a single empty `div` with the given id.
    #[must_use]
    pub fn with_container(id: &str) -> Self {
        let mut doc = HtmlDocument::new();
        let container = doc.create_element("div");
        doc.set_attribute(container, "id", id);
        doc.append_child(doc.body, container);
        doc
    }

    #[must_use]
    pub fn body(&self) -> NodeId {
        self.body
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> &str {
        &self.elements[node.0].tag
    }

    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.elements[node.0].children
    }

    #[must_use]
    pub fn classes(&self, node: NodeId) -> &[String] {
        &self.elements[node.0].classes
    }

    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).iter().any(|c| c == class)
    }

    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.elements[node.0]
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.elements[node.0].text.as_deref()
    }

    /// Returns every element under `root` (not including `root`) with the given class, in
    /// document order.
    #[must_use]
    pub fn find_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|n| self.has_class(*n, class))
            .collect()
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = vec![];
        let mut stack = self.children(root).iter().rev().copied().collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            found.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        found
    }

    fn is_self_or_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == candidate {
                return true;
            }
            current = self.elements[n.0].parent;
        }
        false
    }

    /// Serializes `node` and everything under it as HTML.
    #[must_use]
    pub fn to_html(&self, node: NodeId) -> String {
        let mut html = String::new();
        // Writing to a String never fails.
        let _ = self.write_html(node, &mut html);
        html
    }

    fn write_html(&self, node: NodeId, out: &mut String) -> fmt::Result {
        let element = &self.elements[node.0];
        write!(out, "<{}", element.tag)?;
        for (name, value) in &element.attributes {
            write!(out, r#" {name}="{}""#, escape(value))?;
        }
        if !element.classes.is_empty() {
            write!(out, r#" class="{}""#, escape(&element.classes.join(" ")))?;
        }
        out.push('>');
        if let Some(text) = &element.text {
            out.push_str(&escape(text));
        }
        for child in &element.children {
            self.write_html(*child, out)?;
        }
        write!(out, "</{}>", element.tag)
    }
}

impl Document for HtmlDocument {
    type Node = NodeId;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|n| self.attribute(*n, "id") == Some(id))
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.elements.push(Element {
            tag: tag.to_string(),
            attributes: vec![],
            classes: vec![],
            text: None,
            children: vec![],
            parent: None,
        });
        NodeId(self.elements.len() - 1)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            self.elements[node.0].classes.push(class.to_string());
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let attributes = &mut self.elements[node.0].attributes;
        if let Some((_, v)) = attributes.iter_mut().find(|(n, _)| n == name) {
            *v = value.to_string();
        } else {
            attributes.push((name.to_string(), value.to_string()));
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        self.elements[node.0].text = Some(text.to_string());
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.is_self_or_ancestor(child, parent) {
            return;
        }
        if let Some(old_parent) = self.elements[child.0].parent.take() {
            self.elements[old_parent.0].children.retain(|c| *c != child);
        }
        self.elements[child.0].parent = Some(parent);
        self.elements[parent.0].children.push(child);
    }

    fn clear_children(&mut self, node: NodeId) {
        for child in std::mem::take(&mut self.elements[node.0].children) {
            self.elements[child.0].parent = None;
        }
    }
}

fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
