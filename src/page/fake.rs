//! In-memory page driver for tests: a mutable DOM arena, a virtual clock,
//! and scripted mutations (options appearing on click, spinners clearing,
//! page-owned autofill firing after a delay). `wait()` advances the clock
//! instead of sleeping, so every bounded wait in the engine runs instantly
//! and deterministically against this driver.

use std::collections::HashMap;

use crate::dom::dom_model::{DomSnapshot, FieldValue, RawNode};
use crate::error::EngineError;
use crate::page::driver::{Key, PageDriver};

// ============================================================================
// Element builder
// ============================================================================

/// Declarative element tree for constructing fake pages.
#[derive(Debug, Clone)]
pub struct Elem {
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub text: Option<String>,
    pub value: Option<String>,
    pub checked: Option<bool>,
    pub selected: Option<bool>,
    pub visible: bool,
    pub children: Vec<Elem>,
}

impl Elem {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            attrs: HashMap::new(),
            text: None,
            value: None,
            checked: None,
            selected: None,
            visible: true,
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = Some(selected);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn child(mut self, child: Elem) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: Vec<Elem>) -> Self {
        self.children.extend(children);
        self
    }

    /// Shorthand for `<input type=.. id=..>`.
    pub fn input(input_type: &str, id: &str) -> Self {
        Elem::new("input").attr("type", input_type).attr("id", id)
    }

    /// Shorthand for `<label for=..>text</label>`.
    pub fn label(for_id: &str, text: &str) -> Self {
        Elem::new("label").attr("for", for_id).text(text)
    }

    /// Shorthand for `<option value=..>text</option>`.
    pub fn option(value: &str, text: &str) -> Self {
        Elem::new("option").attr("value", value).value(value).text(text)
    }
}

// ============================================================================
// Scripted mutations
// ============================================================================

/// One document mutation a fake page can apply, either on a schedule or in
/// reaction to a click/keypress.
#[derive(Debug, Clone)]
pub enum Mutation {
    SetValue { selector: String, value: String },
    SetChecked { selector: String, checked: bool },
    SetVisible { selector: String, visible: bool },
    SetAttr { selector: String, name: String, value: String },
    Append { parent: String, element: Elem },
    Remove { selector: String },
}

#[derive(Debug, Clone)]
struct ScheduledMutation {
    at_ms: u64,
    mutation: Mutation,
    applied: bool,
}

#[derive(Debug, Clone)]
struct Reaction {
    selector: String,
    key: Option<Key>,
    mutations: Vec<Mutation>,
    once: bool,
    spent: bool,
}

// ============================================================================
// Arena
// ============================================================================

#[derive(Debug, Clone)]
struct FakeNode {
    tag: String,
    attrs: HashMap<String, String>,
    text: Option<String>,
    value: Option<String>,
    checked: Option<bool>,
    selected: Option<bool>,
    visible: bool,
    parent: Option<usize>,
    children: Vec<usize>,
    detached: bool,
}

pub struct FakePage {
    nodes: Vec<FakeNode>,
    root: usize,
    version: u64,
    clock_ms: u64,
    scheduled: Vec<ScheduledMutation>,
    reactions: Vec<Reaction>,
    // snapshot ordinal -> arena index, from the most recent snapshot()
    last_snapshot_map: Vec<usize>,
}

impl FakePage {
    pub fn new() -> Self {
        let body = FakeNode {
            tag: "body".into(),
            attrs: HashMap::new(),
            text: None,
            value: None,
            checked: None,
            selected: None,
            visible: true,
            parent: None,
            children: Vec::new(),
            detached: false,
        };
        Self {
            nodes: vec![body],
            root: 0,
            version: 0,
            clock_ms: 0,
            scheduled: Vec::new(),
            reactions: Vec::new(),
            last_snapshot_map: Vec::new(),
        }
    }

    pub fn with_body(children: Vec<Elem>) -> Self {
        let mut page = Self::new();
        for child in children {
            page.append(page.root, child);
        }
        page
    }

    fn append(&mut self, parent: usize, elem: Elem) -> usize {
        let index = self.nodes.len();
        self.nodes.push(FakeNode {
            tag: elem.tag,
            attrs: elem.attrs,
            text: elem.text,
            value: elem.value,
            checked: elem.checked,
            selected: elem.selected,
            visible: elem.visible,
            parent: Some(parent),
            children: Vec::new(),
            detached: false,
        });
        self.nodes[parent].children.push(index);
        for child in elem.children {
            self.append(index, child);
        }
        index
    }

    /// Apply a mutation when the virtual clock reaches `at_ms`.
    pub fn schedule(&mut self, at_ms: u64, mutation: Mutation) {
        self.scheduled.push(ScheduledMutation { at_ms, mutation, applied: false });
    }

    /// Apply mutations every time the matching element is clicked.
    pub fn on_click(&mut self, selector: &str, mutations: Vec<Mutation>) {
        self.reactions.push(Reaction {
            selector: selector.to_string(),
            key: None,
            mutations,
            once: false,
            spent: false,
        });
    }

    /// Apply mutations the first time the matching element is clicked.
    pub fn on_click_once(&mut self, selector: &str, mutations: Vec<Mutation>) {
        self.reactions.push(Reaction {
            selector: selector.to_string(),
            key: None,
            mutations,
            once: true,
            spent: false,
        });
    }

    /// Apply mutations when a specific key lands on the matching element.
    pub fn on_key(&mut self, selector: &str, key: Key, mutations: Vec<Mutation>) {
        self.reactions.push(Reaction {
            selector: selector.to_string(),
            key: Some(key),
            mutations,
            once: false,
            spent: false,
        });
    }

    // ------------------------------------------------------------------
    // Test assertions
    // ------------------------------------------------------------------

    pub fn value_of(&self, selector: &str) -> Option<String> {
        let idx = self.resolve(selector).into_iter().next()?;
        self.nodes[idx].value.clone()
    }

    pub fn checked_of(&self, selector: &str) -> Option<bool> {
        let idx = self.resolve(selector).into_iter().next()?;
        self.nodes[idx].checked
    }

    pub fn attr_of(&self, selector: &str, name: &str) -> Option<String> {
        let idx = self.resolve(selector).into_iter().next()?;
        self.nodes[idx].attrs.get(name).cloned()
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    // ------------------------------------------------------------------
    // Selector resolution (tag, #id, .class, [attr], [attr="v"], [attr*="v"])
    // ------------------------------------------------------------------

    fn resolve(&self, selector: &str) -> Vec<usize> {
        let mut out = Vec::new();
        for part in split_selector_list(selector) {
            let Some(compound) = parse_compound(&part) else {
                continue;
            };
            for idx in self.document_order() {
                if !out.contains(&idx) && self.matches(idx, &compound) {
                    out.push(idx);
                }
            }
        }
        out.sort_by_key(|&idx| self.document_position(idx));
        out
    }

    fn document_order(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            if self.nodes[idx].detached {
                continue;
            }
            out.push(idx);
            for &child in self.nodes[idx].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    fn document_position(&self, index: usize) -> usize {
        self.document_order()
            .iter()
            .position(|&i| i == index)
            .unwrap_or(usize::MAX)
    }

    fn matches(&self, index: usize, compound: &Compound) -> bool {
        let node = &self.nodes[index];
        if let Some(tag) = &compound.tag {
            if &node.tag != tag {
                return false;
            }
        }
        for step in &compound.steps {
            let ok = match step {
                Step::Id(id) => node.attrs.get("id").map(|v| v == id).unwrap_or(false),
                Step::Class(class) => node
                    .attrs
                    .get("class")
                    .map(|v| v.split_whitespace().any(|c| c == class))
                    .unwrap_or(false),
                Step::AttrPresent(name) => {
                    // data-ff-node ordinals are snapshot-scoped
                    if name == "data-ff-node" {
                        false
                    } else {
                        node.attrs.contains_key(name)
                    }
                }
                Step::AttrEquals(name, value) => {
                    if name == "data-ff-node" {
                        self.ordinal_of(index).map(|o| o.to_string()) == Some(value.clone())
                    } else {
                        node.attrs.get(name).map(|v| v == value).unwrap_or(false)
                    }
                }
                Step::AttrContains(name, value) => node
                    .attrs
                    .get(name)
                    .map(|v| v.to_lowercase().contains(&value.to_lowercase()))
                    .unwrap_or(false),
            };
            if !ok {
                return false;
            }
        }
        true
    }

    fn ordinal_of(&self, index: usize) -> Option<usize> {
        self.last_snapshot_map.iter().position(|&arena| arena == index)
    }

    // ------------------------------------------------------------------
    // Mutation application
    // ------------------------------------------------------------------

    fn apply(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::SetValue { selector, value } => {
                if let Some(idx) = self.resolve(selector).into_iter().next() {
                    self.nodes[idx].value = Some(value.clone());
                    self.version += 1;
                }
            }
            Mutation::SetChecked { selector, checked } => {
                if let Some(idx) = self.resolve(selector).into_iter().next() {
                    self.nodes[idx].checked = Some(*checked);
                    self.version += 1;
                }
            }
            Mutation::SetVisible { selector, visible } => {
                for idx in self.resolve(selector) {
                    self.nodes[idx].visible = *visible;
                    self.version += 1;
                }
            }
            Mutation::SetAttr { selector, name, value } => {
                if let Some(idx) = self.resolve(selector).into_iter().next() {
                    self.nodes[idx].attrs.insert(name.clone(), value.clone());
                    self.version += 1;
                }
            }
            Mutation::Append { parent, element } => {
                if let Some(idx) = self.resolve(parent).into_iter().next() {
                    self.append(idx, element.clone());
                    self.version += 1;
                }
            }
            Mutation::Remove { selector } => {
                for idx in self.resolve(selector) {
                    self.nodes[idx].detached = true;
                    self.version += 1;
                }
            }
        }
    }

    fn fire_reactions(&mut self, target: usize, key: Option<Key>) {
        let mut pending = Vec::new();
        for (i, reaction) in self.reactions.iter().enumerate() {
            if reaction.spent || reaction.key != key {
                continue;
            }
            let Some(compound) = parse_compound(&reaction.selector) else {
                continue;
            };
            if self.matches(target, &compound) {
                pending.push(i);
            }
        }
        for i in pending {
            let mutations = self.reactions[i].mutations.clone();
            if self.reactions[i].once {
                self.reactions[i].spent = true;
            }
            for mutation in &mutations {
                self.apply(mutation);
            }
        }
    }

    fn effectively_visible(&self, index: usize) -> bool {
        let mut current = Some(index);
        while let Some(idx) = current {
            let node = &self.nodes[idx];
            if !node.visible || node.detached {
                return false;
            }
            current = node.parent;
        }
        true
    }

    fn to_raw(&self, index: usize) -> RawNode {
        let node = &self.nodes[index];
        RawNode {
            tag: node.tag.clone(),
            attrs: node.attrs.clone(),
            text: node.text.clone(),
            value: node.value.clone(),
            checked: node.checked,
            selected: node.selected,
            visible: self.effectively_visible(index),
            children: node
                .children
                .iter()
                .filter(|&&c| !self.nodes[c].detached)
                .map(|&c| self.to_raw(c))
                .collect(),
        }
    }

    fn record_snapshot_map(&mut self) {
        let mut map = Vec::new();
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            if self.nodes[idx].detached {
                continue;
            }
            map.push(idx);
            for &child in self.nodes[idx].children.iter().rev() {
                stack.push(child);
            }
        }
        self.last_snapshot_map = map;
    }

    fn control_value(&self, index: usize) -> FieldValue {
        let node = &self.nodes[index];
        let input_type = node.attrs.get("type").map(|t| t.to_lowercase());
        match (node.tag.as_str(), input_type.as_deref()) {
            ("input", Some("checkbox")) | ("input", Some("radio")) => {
                FieldValue::Flag(node.checked.unwrap_or(false))
            }
            ("select", _) if node.attrs.contains_key("multiple") => {
                let values = node
                    .children
                    .iter()
                    .filter(|&&c| self.nodes[c].selected == Some(true))
                    .filter_map(|&c| self.nodes[c].value.clone())
                    .collect();
                FieldValue::List(values)
            }
            ("select", _) => {
                let value = node.value.clone().or_else(|| {
                    node.children
                        .iter()
                        .find(|&&c| self.nodes[c].selected == Some(true))
                        .and_then(|&c| self.nodes[c].value.clone())
                });
                FieldValue::Text(value.unwrap_or_default())
            }
            _ => FieldValue::Text(node.value.clone().unwrap_or_default()),
        }
    }
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PageDriver implementation
// ============================================================================

impl PageDriver for FakePage {
    fn snapshot(&mut self) -> Result<DomSnapshot, EngineError> {
        self.record_snapshot_map();
        Ok(DomSnapshot::from_raw(self.to_raw(self.root)))
    }

    fn dom_version(&mut self) -> Result<u64, EngineError> {
        Ok(self.version)
    }

    fn click(&mut self, selector: &str) -> Result<bool, EngineError> {
        let Some(idx) = self.resolve(selector).into_iter().next() else {
            return Ok(false);
        };
        self.fire_reactions(idx, None);
        Ok(true)
    }

    fn press_key(&mut self, selector: &str, key: Key) -> Result<bool, EngineError> {
        let Some(idx) = self.resolve(selector).into_iter().next() else {
            return Ok(false);
        };
        self.fire_reactions(idx, Some(key));
        Ok(true)
    }

    fn set_value(&mut self, selector: &str, value: &str) -> Result<bool, EngineError> {
        let Some(idx) = self.resolve(selector).into_iter().next() else {
            return Ok(false);
        };
        self.nodes[idx].value = Some(value.to_string());
        self.version += 1;
        Ok(true)
    }

    fn set_checked(&mut self, selector: &str, checked: bool) -> Result<bool, EngineError> {
        let Some(idx) = self.resolve(selector).into_iter().next() else {
            return Ok(false);
        };
        // Native radio semantics: checking one unchecks its name group.
        let is_radio = self.nodes[idx].attrs.get("type").map(|t| t.to_lowercase())
            == Some("radio".into());
        if is_radio && checked {
            if let Some(name) = self.nodes[idx].attrs.get("name").cloned() {
                for other in 0..self.nodes.len() {
                    if other != idx
                        && self.nodes[other].attrs.get("name") == Some(&name)
                        && self.nodes[other].attrs.get("type").map(|t| t.to_lowercase())
                            == Some("radio".into())
                    {
                        self.nodes[other].checked = Some(false);
                    }
                }
            }
        }
        self.nodes[idx].checked = Some(checked);
        self.version += 1;
        self.fire_reactions(idx, None);
        Ok(true)
    }

    fn select_values(&mut self, selector: &str, values: &[String]) -> Result<bool, EngineError> {
        let Some(idx) = self.resolve(selector).into_iter().next() else {
            return Ok(false);
        };
        if self.nodes[idx].tag != "select" {
            return Ok(false);
        }
        let children = self.nodes[idx].children.clone();
        let mut first_selected = None;
        for child in children {
            let matches = self.nodes[child]
                .value
                .as_ref()
                .map(|v| values.contains(v))
                .unwrap_or(false);
            self.nodes[child].selected = Some(matches);
            if matches && first_selected.is_none() {
                first_selected = self.nodes[child].value.clone();
            }
        }
        self.nodes[idx].value = first_selected;
        self.version += 1;
        Ok(true)
    }

    fn set_attribute(
        &mut self,
        selector: &str,
        name: &str,
        value: &str,
    ) -> Result<bool, EngineError> {
        let Some(idx) = self.resolve(selector).into_iter().next() else {
            return Ok(false);
        };
        self.nodes[idx].attrs.insert(name.to_string(), value.to_string());
        self.version += 1;
        Ok(true)
    }

    fn read_value(&mut self, selector: &str) -> Result<Option<FieldValue>, EngineError> {
        Ok(self
            .resolve(selector)
            .into_iter()
            .next()
            .map(|idx| self.control_value(idx)))
    }

    fn query_visible(&mut self, selector: &str) -> Result<bool, EngineError> {
        Ok(self
            .resolve(selector)
            .into_iter()
            .any(|idx| self.effectively_visible(idx)))
    }

    fn outer_html(
        &mut self,
        selector: &str,
        max_len: usize,
    ) -> Result<Option<String>, EngineError> {
        let Some(idx) = self.resolve(selector).into_iter().next() else {
            return Ok(None);
        };
        let mut html = render_html(self, idx);
        if html.len() > max_len {
            let mut cut = max_len;
            while cut > 0 && !html.is_char_boundary(cut) {
                cut -= 1;
            }
            html.truncate(cut);
        }
        Ok(Some(html))
    }

    fn upload(&mut self, selector: &str, path: &str) -> Result<bool, EngineError> {
        let Some(idx) = self.resolve(selector).into_iter().next() else {
            return Ok(false);
        };
        self.nodes[idx].value = Some(path.to_string());
        self.version += 1;
        self.fire_reactions(idx, None);
        Ok(true)
    }

    fn wait(&mut self, ms: u64) -> Result<(), EngineError> {
        self.clock_ms += ms;
        let due: Vec<Mutation> = self
            .scheduled
            .iter_mut()
            .filter(|s| !s.applied && s.at_ms <= self.clock_ms)
            .map(|s| {
                s.applied = true;
                s.mutation.clone()
            })
            .collect();
        for mutation in &due {
            self.apply(mutation);
        }
        Ok(())
    }
}

fn render_html(page: &FakePage, index: usize) -> String {
    let node = &page.nodes[index];
    let mut attrs: Vec<String> = node
        .attrs
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect();
    attrs.sort();
    let mut out = format!("<{} {}>", node.tag, attrs.join(" "));
    if let Some(text) = &node.text {
        out.push_str(text);
    }
    for &child in &node.children {
        if !page.nodes[child].detached {
            out.push_str(&render_html(page, child));
        }
    }
    out.push_str(&format!("</{}>", node.tag));
    out
}

// ============================================================================
// Mini selector parser
// ============================================================================

#[derive(Debug)]
struct Compound {
    tag: Option<String>,
    steps: Vec<Step>,
}

#[derive(Debug)]
enum Step {
    Id(String),
    Class(String),
    AttrPresent(String),
    AttrEquals(String, String),
    AttrContains(String, String),
}

fn split_selector_list(selector: &str) -> Vec<String> {
    // Commas inside quoted attribute values must not split the list.
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in selector.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts.retain(|p| !p.is_empty());
    parts
}

fn parse_compound(selector: &str) -> Option<Compound> {
    let mut chars = selector.trim().chars().peekable();
    let mut tag = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '-' {
            tag.push(c);
            chars.next();
        } else {
            break;
        }
    }
    let mut compound = Compound {
        tag: if tag.is_empty() { None } else { Some(tag.to_lowercase()) },
        steps: Vec::new(),
    };

    while let Some(c) = chars.next() {
        match c {
            '#' => {
                let ident = take_ident(&mut chars);
                compound.steps.push(Step::Id(ident));
            }
            '.' => {
                let ident = take_ident(&mut chars);
                compound.steps.push(Step::Class(ident));
            }
            '[' => {
                let mut body = String::new();
                for ac in chars.by_ref() {
                    if ac == ']' {
                        break;
                    }
                    body.push(ac);
                }
                compound.steps.push(parse_attr_step(&body)?);
            }
            c if c.is_whitespace() => return None, // descendant combinators unsupported
            _ => return None,
        }
    }
    Some(compound)
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

fn parse_attr_step(body: &str) -> Option<Step> {
    if let Some(pos) = body.find("*=") {
        let name = body[..pos].trim().to_string();
        let value = unquote(body[pos + 2..].trim());
        Some(Step::AttrContains(name, value))
    } else if let Some(pos) = body.find('=') {
        let name = body[..pos].trim().to_string();
        let value = unquote(body[pos + 1..].trim());
        Some(Step::AttrEquals(name, value))
    } else {
        Some(Step::AttrPresent(body.trim().to_string()))
    }
}

fn unquote(s: &str) -> String {
    let trimmed = s.trim_matches('"').trim_matches('\'');
    trimmed.replace("\\\"", "\"").replace("\\\\", "\\")
}
