//! Arena-backed document tree.
//!
//! This is the contract between the external parser and the transform/print
//! pipeline. Nodes live in a flat arena owned by [`Document`] and are
//! addressed by [`NodeId`] handles; the owning edges are the child links,
//! while `parent`/sibling links are non-owning back-references used for
//! lookup only. Detaching and re-attaching nodes never frees them — the
//! arena is append-only for the lifetime of one compilation.

/// A byte range into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset of the range start.
    pub start: u32,
    /// Byte offset of the range end (exclusive).
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// The empty span used for synthesized nodes with no source position.
    pub fn empty() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root. Exactly one per tree.
    Document,
    /// The leading fenced script region of a component file.
    Frontmatter,
    /// An element, component, fragment or expression container.
    Element,
    /// A text run. For expression containers, text children hold the raw
    /// JavaScript chunks between embedded elements.
    Text,
    /// An HTML comment (`<!-- ... -->`), `content` holds the interior text.
    Comment,
    /// A `<!DOCTYPE ...>` node, `content` holds the doctype name.
    Doctype,
    /// Raw text passed through without interpretation (`is:raw` content).
    Raw,
}

/// How an attribute was written in the source, which determines both its
/// rendering and its scoping rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// `key="value"` or `key='value'`.
    Quoted,
    /// Bare `key` with no value (boolean attribute).
    Empty,
    /// `key={expression}` — `value` holds the raw expression text.
    Expression,
    /// `{...expression}` — `value` holds the spread expression text.
    Spread,
    /// `{key}` shorthand for `key={key}`.
    Shorthand,
    /// ``key=`template ${literal}` `` — `value` holds the template body.
    TemplateLiteral,
}

/// A single attribute on an element node.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub key: String,
    pub value: String,
    pub key_span: Span,
    pub value_span: Span,
    /// Namespace prefix for `ns:name` attributes (e.g. `xlink`). The full
    /// prefixed name is kept in `key`; this is informational.
    pub namespace: Option<String>,
}

impl Attribute {
    pub fn quoted(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_kind(AttributeKind::Quoted, key, value)
    }

    pub fn empty(key: impl Into<String>) -> Self {
        Self::with_kind(AttributeKind::Empty, key, "")
    }

    pub fn expression(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_kind(AttributeKind::Expression, key, value)
    }

    pub fn spread(value: impl Into<String>) -> Self {
        Self::with_kind(AttributeKind::Spread, "", value)
    }

    pub fn shorthand(key: impl Into<String>) -> Self {
        Self::with_kind(AttributeKind::Shorthand, key, "")
    }

    pub fn template_literal(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_kind(AttributeKind::TemplateLiteral, key, value)
    }

    fn with_kind(kind: AttributeKind, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let namespace = key.split_once(':').map(|(ns, _)| ns.to_string());
        Self {
            kind,
            key,
            value: value.into(),
            key_span: Span::empty(),
            value_span: Span::empty(),
            namespace,
        }
    }

    #[must_use]
    pub fn with_spans(mut self, key_span: Span, value_span: Span) -> Self {
        self.key_span = key_span;
        self.value_span = value_span;
        self
    }
}

/// Handle to a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the document tree.
///
/// Structural links are `Option<NodeId>` indices into the owning
/// [`Document`]'s arena. The `parent` link is a non-owning back-reference:
/// it is kept consistent by the mutation methods on `Document` but never
/// drives teardown.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Element/component name. Empty for text-like kinds.
    pub tag: String,
    /// Raw text for Text/Comment/Raw/Frontmatter nodes.
    pub content: String,
    pub attributes: Vec<Attribute>,
    /// Span of the opening syntax (or the whole node for point nodes).
    pub span: Span,
    /// Span of the closing syntax, for nodes that have one.
    pub close_span: Option<Span>,

    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,

    /// Uppercase-initial or dotted name — rendered via the component path.
    pub is_component: bool,
    /// Dashed name — rendered with a quoted tag-name reference.
    pub is_custom_element: bool,
    /// `<Fragment>` or `<>...</>`.
    pub is_fragment: bool,
    /// An expression container `{ ... }`; children alternate raw text
    /// chunks and embedded elements.
    pub is_expression: bool,
    /// Carries a `transition:*` directive.
    pub is_transition_target: bool,
    /// A `<script>` already consumed by the transform (hoisted or rendered
    /// through the script runtime); the printer must not re-emit it.
    pub is_handled_script: bool,

    /// Set on expression nodes synthesized from `set:html` — the printed
    /// interpolation is wrapped in the HTML-unescape runtime helper.
    pub needs_unescape: bool,
    /// Memoized per-node transition scope id, filled by the transform.
    pub transition_scope: Option<String>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: String::new(),
            content: String::new(),
            attributes: Vec::new(),
            span: Span::empty(),
            close_span: None,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            is_component: false,
            is_custom_element: false,
            is_fragment: false,
            is_expression: false,
            is_transition_target: false,
            is_handled_script: false,
            needs_unescape: false,
            transition_scope: None,
        }
    }

    /// Find an attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.key == key)
    }

    pub fn attribute_mut(&mut self, key: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.key == key)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attribute(key).is_some()
    }

    /// Remove an attribute by key, returning it if present.
    pub fn remove_attribute(&mut self, key: &str) -> Option<Attribute> {
        let pos = self.attributes.iter().position(|a| a.key == key)?;
        Some(self.attributes.remove(pos))
    }

    /// True for plain built-in elements (not components, custom elements,
    /// fragments or expression containers).
    pub fn is_plain_element(&self) -> bool {
        self.kind == NodeKind::Element
            && !self.is_component
            && !self.is_custom_element
            && !self.is_fragment
            && !self.is_expression
    }
}

/// The kind of a hoisted script, mirroring the runtime's hoisted-script
/// metadata shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoistedScriptKind {
    /// Inline code content.
    Inline,
    /// External script referenced by a `src` URL.
    External,
    /// Inline code with `define:vars` bindings.
    DefineVars,
}

/// A script extracted from the tree into the document aggregate.
#[derive(Debug, Clone)]
pub struct HoistedScript {
    pub kind: HoistedScriptKind,
    /// The detached script node.
    pub node: NodeId,
    /// Inline code (for `Inline` and `DefineVars`).
    pub value: Option<String>,
    /// External src URL (for `External`).
    pub src: Option<String>,
    /// Comma-joined `define:vars` object keys (for `DefineVars`).
    pub keys: Option<String>,
}

/// A component registered for hydration (`client:*`) or server deferral
/// (`server:*`), resolved against the frontmatter import table.
#[derive(Debug, Clone)]
pub struct HydratedComponent {
    /// The local name as written in the template (may be dotted).
    pub name: String,
    /// The import specifier the name resolves to.
    pub specifier: String,
    /// The export name within the imported module.
    pub export_name: String,
    /// The specifier after path resolution.
    pub resolved_path: String,
    pub is_custom_element: bool,
}

/// A parsed component document: the node arena plus the side-collections
/// populated by the transform pass.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    pub root: NodeId,

    /// Extracted `<style>` nodes, in authored order. Their `content` holds
    /// the scoped CSS after the transform runs.
    pub styles: Vec<NodeId>,
    /// Hoisted `<script>` descriptors, in authored order.
    pub scripts: Vec<HoistedScript>,
    /// Components with a `client:*` directive other than `client:only`.
    pub hydrated_components: Vec<HydratedComponent>,
    /// Components with `client:only`.
    pub client_only_components: Vec<HydratedComponent>,
    /// Components with a `server:*` directive.
    pub server_components: Vec<HydratedComponent>,
    /// Hydration directive names seen, in first-seen order, deduplicated.
    pub hydration_directives: Vec<String>,
    /// A `<head>` detached from a document without an `<html>` wrapper.
    pub head: Option<NodeId>,
    /// Whether any node carries a transition directive.
    pub uses_transitions: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        nodes.push(Node::new(NodeKind::Document));
        Self {
            nodes,
            root: NodeId(0),
            styles: Vec::new(),
            scripts: Vec::new(),
            hydrated_components: Vec::new(),
            client_only_components: Vec::new(),
            server_components: Vec::new(),
            hydration_directives: Vec::new(),
            head: None,
            uses_transitions: false,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("arena exceeds u32"));
        self.nodes.push(node);
        id
    }

    /// Create a detached node of the given kind.
    pub fn new_node(&mut self, kind: NodeKind) -> NodeId {
        self.alloc(Node::new(kind))
    }

    /// Create a detached element node, classifying the tag name.
    pub fn new_element(&mut self, tag: impl Into<String>) -> NodeId {
        let tag = tag.into();
        let mut node = Node::new(NodeKind::Element);
        node.is_component = is_component_name(&tag);
        node.is_custom_element = is_custom_element_name(&tag);
        node.is_fragment = tag == "Fragment" || tag.is_empty();
        node.tag = tag;
        self.alloc(node)
    }

    /// Create a detached text node.
    pub fn new_text(&mut self, content: impl Into<String>) -> NodeId {
        let mut node = Node::new(NodeKind::Text);
        node.content = content.into();
        self.alloc(node)
    }

    /// Create a detached expression container node.
    pub fn new_expression(&mut self) -> NodeId {
        let mut node = Node::new(NodeKind::Element);
        node.is_expression = true;
        self.alloc(node)
    }

    /// Create a detached frontmatter node holding the given script text.
    pub fn new_frontmatter(&mut self, content: impl Into<String>) -> NodeId {
        let mut node = Node::new(NodeKind::Frontmatter);
        node.content = content.into();
        self.alloc(node)
    }

    /// Append `child` as the last child of `parent`. The child must be
    /// detached; re-parenting requires an explicit [`detach`](Self::detach).
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none(), "child must be detached");
        let last = self.node(parent).last_child;
        {
            let c = self.node_mut(child);
            c.parent = Some(parent);
            c.prev_sibling = last;
            c.next_sibling = None;
        }
        match last {
            Some(last) => self.node_mut(last).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
    }

    /// Insert `new` immediately before `reference` under the same parent.
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) {
        debug_assert!(self.node(new).parent.is_none(), "node must be detached");
        let parent = self.node(reference).parent.expect("reference has a parent");
        let prev = self.node(reference).prev_sibling;
        {
            let n = self.node_mut(new);
            n.parent = Some(parent);
            n.prev_sibling = prev;
            n.next_sibling = Some(reference);
        }
        self.node_mut(reference).prev_sibling = Some(new);
        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = Some(new),
            None => self.node_mut(parent).first_child = Some(new),
        }
    }

    /// Detach a node from its parent, clearing all structural links except
    /// its own children. The node stays alive in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let n = self.node(id);
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        let Some(parent) = parent else { return };

        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }
        let n = self.node_mut(id);
        n.parent = None;
        n.prev_sibling = None;
        n.next_sibling = None;
    }

    /// Detach every child of `parent`, returning them in order.
    pub fn take_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children = self.children(parent);
        for &child in &children {
            let n = self.node_mut(child);
            n.parent = None;
            n.prev_sibling = None;
            n.next_sibling = None;
        }
        let p = self.node_mut(parent);
        p.first_child = None;
        p.last_child = None;
        children
    }

    /// Collect the children of a node, in order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.node(id).first_child;
        while let Some(c) = cur {
            out.push(c);
            cur = self.node(c).next_sibling;
        }
        out
    }

    /// Pre-order depth-first traversal starting at (and including) `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            let children = self.children(n);
            for &c in children.iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    /// Walk up the parent chain looking for the closest ancestor matching
    /// the predicate. Does not test `id` itself.
    pub fn closest_ancestor(&self, id: NodeId, pred: impl Fn(&Node) -> bool) -> Option<NodeId> {
        let mut cur = self.node(id).parent;
        while let Some(p) = cur {
            if pred(self.node(p)) {
                return Some(p);
            }
            cur = self.node(p).parent;
        }
        None
    }

    /// The document's frontmatter node, if the tree has one.
    pub fn frontmatter(&self) -> Option<NodeId> {
        self.children(self.root)
            .into_iter()
            .find(|&c| self.node(c).kind == NodeKind::Frontmatter)
    }

    /// Register a hydration directive name, keeping first-seen order.
    pub fn record_hydration_directive(&mut self, name: &str) {
        if !self.hydration_directives.iter().any(|d| d == name) {
            self.hydration_directives.push(name.to_string());
        }
    }
}

/// Component names start with an uppercase letter or use dot/namespace
/// notation (`components.Card`, `ns:tag`).
pub fn is_component_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase()) || name.contains('.')
}

/// Custom elements are identified by a dash in the tag name.
pub fn is_custom_element_name(name: &str) -> bool {
    name.contains('-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_children_order() {
        let mut doc = Document::new();
        let div = doc.new_element("div");
        let a = doc.new_text("a");
        let b = doc.new_text("b");
        doc.append_child(doc.root, div);
        doc.append_child(div, a);
        doc.append_child(div, b);

        assert_eq!(doc.children(div), vec![a, b]);
        assert_eq!(doc.node(a).parent, Some(div));
        assert_eq!(doc.node(a).next_sibling, Some(b));
        assert_eq!(doc.node(b).prev_sibling, Some(a));
    }

    #[test]
    fn detach_relinks_siblings() {
        let mut doc = Document::new();
        let div = doc.new_element("div");
        let a = doc.new_text("a");
        let b = doc.new_text("b");
        let c = doc.new_text("c");
        doc.append_child(doc.root, div);
        for id in [a, b, c] {
            doc.append_child(div, id);
        }

        doc.detach(b);
        assert_eq!(doc.children(div), vec![a, c]);
        assert_eq!(doc.node(b).parent, None);
        assert_eq!(doc.node(a).next_sibling, Some(c));

        doc.detach(a);
        doc.detach(c);
        assert_eq!(doc.children(div), Vec::<NodeId>::new());
        assert_eq!(doc.node(div).first_child, None);
        assert_eq!(doc.node(div).last_child, None);
    }

    #[test]
    fn insert_before_front_and_middle() {
        let mut doc = Document::new();
        let div = doc.new_element("div");
        let b = doc.new_text("b");
        doc.append_child(doc.root, div);
        doc.append_child(div, b);

        let a = doc.new_text("a");
        doc.insert_before(b, a);
        assert_eq!(doc.children(div), vec![a, b]);
        assert_eq!(doc.node(div).first_child, Some(a));

        let mid = doc.new_text("mid");
        doc.insert_before(b, mid);
        assert_eq!(doc.children(div), vec![a, mid, b]);
    }

    #[test]
    fn element_classification() {
        let mut doc = Document::new();
        let card = doc.new_element("Card");
        let dotted = doc.new_element("ns.Widget");
        let custom = doc.new_element("my-element");
        let plain = doc.new_element("div");

        assert!(doc.node(card).is_component);
        assert!(doc.node(dotted).is_component);
        assert!(doc.node(custom).is_custom_element);
        assert!(doc.node(plain).is_plain_element());
    }

    #[test]
    fn descendants_preorder() {
        let mut doc = Document::new();
        let div = doc.new_element("div");
        let span = doc.new_element("span");
        let t1 = doc.new_text("1");
        let t2 = doc.new_text("2");
        doc.append_child(doc.root, div);
        doc.append_child(div, span);
        doc.append_child(span, t1);
        doc.append_child(div, t2);

        assert_eq!(doc.descendants(doc.root), vec![doc.root, div, span, t1, t2]);
    }

    #[test]
    fn closest_ancestor_skips_self() {
        let mut doc = Document::new();
        let svg = doc.new_element("svg");
        let g = doc.new_element("g");
        let rect = doc.new_element("rect");
        doc.append_child(doc.root, svg);
        doc.append_child(svg, g);
        doc.append_child(g, rect);

        assert_eq!(doc.closest_ancestor(rect, |n| n.tag == "svg"), Some(svg));
        assert_eq!(doc.closest_ancestor(svg, |n| n.tag == "svg"), None);
    }
}
