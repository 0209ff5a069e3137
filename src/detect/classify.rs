use crate::detect::field_model::FieldType;
use crate::dom::dom_model::DomNode;

// ============================================================================
// Element facts
// ============================================================================

/// Everything the control classifier is allowed to look at, lifted out of
/// the DOM node so the rule table can be exercised without a document.
#[derive(Debug, Clone, Default)]
pub struct ElementFacts {
    pub tag: String,
    pub input_type: Option<String>,
    pub role: Option<String>,
    pub multiple: bool,
    pub haspopup_listbox: bool,
    pub content_editable: bool,
}

impl ElementFacts {
    pub fn from_node(node: &DomNode) -> Self {
        Self {
            tag: node.tag.clone(),
            input_type: node.input_type(),
            role: node.role().map(|r| r.to_lowercase()),
            multiple: node.has_attr("multiple"),
            haspopup_listbox: matches!(
                node.attr("aria-haspopup"),
                Some("listbox") | Some("true") | Some("menu")
            ),
            content_editable: matches!(node.attr("contenteditable"), Some("") | Some("true")),
        }
    }

    fn input_is(&self, t: &str) -> bool {
        self.tag == "input" && self.input_type.as_deref() == Some(t)
    }

    fn role_is(&self, r: &str) -> bool {
        self.role.as_deref() == Some(r)
    }
}

// ============================================================================
// Rule table
// ============================================================================

type Predicate = fn(&ElementFacts) -> bool;

/// Ordered predicate -> type rules, evaluated top to bottom; the first match
/// wins. Native tag semantics outrank role hints, so an
/// `<input type="radio" role="anything">` stays a radio.
pub const CLASSIFIER_RULES: &[(&str, Predicate, FieldType)] = &[
    ("select-multiple", |f| f.tag == "select" && f.multiple, FieldType::MultiSelect),
    ("select", |f| f.tag == "select", FieldType::Select),
    ("textarea", |f| f.tag == "textarea", FieldType::Textarea),
    ("input-email", |f| f.input_is("email"), FieldType::Email),
    ("input-tel", |f| f.input_is("tel"), FieldType::Tel),
    ("input-url", |f| f.input_is("url"), FieldType::Url),
    ("input-password", |f| f.input_is("password"), FieldType::Password),
    ("input-number", |f| f.input_is("number"), FieldType::Number),
    ("input-date", |f| f.input_is("date"), FieldType::Date),
    (
        "input-datetime",
        |f| f.input_is("datetime-local") || f.input_is("datetime"),
        FieldType::Datetime,
    ),
    ("input-time", |f| f.input_is("time"), FieldType::Time),
    ("input-month", |f| f.input_is("month"), FieldType::Month),
    ("input-week", |f| f.input_is("week"), FieldType::Week),
    ("input-checkbox", |f| f.input_is("checkbox"), FieldType::Checkbox),
    ("input-radio", |f| f.input_is("radio"), FieldType::Radio),
    ("input-file", |f| f.input_is("file"), FieldType::File),
    ("input-range", |f| f.input_is("range"), FieldType::Range),
    ("input-color", |f| f.input_is("color"), FieldType::Color),
    ("input-search", |f| f.input_is("search"), FieldType::Search),
    (
        "role-combobox",
        |f| f.role_is("combobox") || (f.haspopup_listbox && f.tag != "select"),
        FieldType::CustomDropdown,
    ),
    ("role-listbox", |f| f.role_is("listbox"), FieldType::CustomDropdown),
    ("role-searchbox", |f| f.role_is("searchbox"), FieldType::Search),
    ("role-spinbutton", |f| f.role_is("spinbutton"), FieldType::Number),
    (
        "role-checkbox",
        |f| f.role_is("checkbox") || f.role_is("switch"),
        FieldType::Checkbox,
    ),
    ("role-radio", |f| f.role_is("radio"), FieldType::Radio),
    ("contenteditable", |f| f.content_editable, FieldType::Textarea),
];

/// Classify a control. Anything no rule claims is a plain text field.
pub fn classify_control(facts: &ElementFacts) -> FieldType {
    for (_name, predicate, field_type) in CLASSIFIER_RULES {
        if predicate(facts) {
            return *field_type;
        }
    }
    FieldType::Text
}

/// Convenience: classify straight from a snapshot node.
pub fn classify_node(node: &DomNode) -> FieldType {
    classify_control(&ElementFacts::from_node(node))
}
