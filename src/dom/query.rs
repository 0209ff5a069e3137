use crate::dom::dom_model::{DomNode, DomSnapshot};

impl DomSnapshot {
    /// Indices of every node matching the predicate, in document order.
    pub fn find_all(&self, pred: impl Fn(&DomNode) -> bool) -> Vec<usize> {
        self.nodes
            .iter()
            .filter(|n| pred(n))
            .map(|n| n.index)
            .collect()
    }

    pub fn find_by_dom_id(&self, dom_id: &str) -> Option<usize> {
        self.nodes.iter().find(|n| n.id() == Some(dom_id)).map(|n| n.index)
    }

    /// Ancestor indices from the immediate parent up to the root.
    pub fn ancestors(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut current = self.nodes[index].parent;
        while let Some(idx) = current {
            out.push(idx);
            current = self.nodes[idx].parent;
        }
        out
    }

    /// Nearest ancestor (excluding the node itself) matching the predicate.
    pub fn closest(&self, index: usize, pred: impl Fn(&DomNode) -> bool) -> Option<usize> {
        self.ancestors(index)
            .into_iter()
            .find(|&idx| pred(&self.nodes[idx]))
    }

    /// Whether `ancestor` contains `index` (strictly).
    pub fn contains(&self, ancestor: usize, index: usize) -> bool {
        self.ancestors(index).contains(&ancestor)
    }

    /// Preorder descendant indices, excluding the node itself.
    pub fn descendants(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[index].children.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            out.push(idx);
            for &child in self.nodes[idx].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// All text inside a subtree (own text of the node and its descendants),
    /// whitespace-joined and capped at `max_len` characters.
    pub fn subtree_text(&self, index: usize, max_len: usize) -> String {
        let mut parts = Vec::new();
        let own = self.nodes[index].own_text();
        if !own.is_empty() {
            parts.push(own.to_string());
        }
        for idx in self.descendants(index) {
            let text = self.nodes[idx].own_text();
            if !text.is_empty() {
                parts.push(text.to_string());
            }
        }
        let mut joined = parts.join(" ");
        if joined.len() > max_len {
            joined.truncate(truncation_point(&joined, max_len));
        }
        joined
    }

    /// Sibling indices before the node, nearest first.
    pub fn preceding_siblings(&self, index: usize) -> Vec<usize> {
        let Some(parent) = self.nodes[index].parent else {
            return Vec::new();
        };
        let siblings = &self.nodes[parent].children;
        let position = siblings.iter().position(|&c| c == index).unwrap_or(0);
        siblings[..position].iter().rev().copied().collect()
    }

    /// Sibling indices after the node, nearest first.
    pub fn following_siblings(&self, index: usize) -> Vec<usize> {
        let Some(parent) = self.nodes[index].parent else {
            return Vec::new();
        };
        let siblings = &self.nodes[parent].children;
        let position = siblings.iter().position(|&c| c == index).unwrap_or(0);
        siblings[position + 1..].to_vec()
    }

    /// The `<label for="...">` node associated with a control, if any.
    pub fn label_for_control(&self, dom_id: &str) -> Option<usize> {
        self.nodes
            .iter()
            .find(|n| n.tag == "label" && n.attr("for") == Some(dom_id))
            .map(|n| n.index)
    }

    /// Nearest enclosing `<form>`, if any.
    pub fn enclosing_form(&self, index: usize) -> Option<usize> {
        self.closest(index, |n| n.tag == "form")
    }

    /// Nearest enclosing fieldset-equivalent grouping container.
    pub fn enclosing_fieldset(&self, index: usize) -> Option<usize> {
        self.closest(index, |n| {
            n.tag == "fieldset" || n.role() == Some("group") || n.role() == Some("radiogroup")
        })
    }
}

/// Largest char boundary at or below `max_len`.
fn truncation_point(s: &str, max_len: usize) -> usize {
    let mut point = max_len.min(s.len());
    while point > 0 && !s.is_char_boundary(point) {
        point -= 1;
    }
    point
}
