use formfill::detect::discover::{discover, DiscoverOptions};
use formfill::detect::field_model::FieldDescriptor;
use formfill::page::driver::Key;
use formfill::page::fake::{Elem, FakePage, Mutation};
use formfill::page::wait::Timing;
use formfill::trace::logger::TraceLogger;

pub fn scan(page: &mut FakePage) -> Vec<FieldDescriptor> {
    discover(
        page,
        &DiscoverOptions::default(),
        &Timing::default(),
        &TraceLogger::disabled(),
    )
}

pub fn scan_empty_only(page: &mut FakePage) -> Vec<FieldDescriptor> {
    discover(
        page,
        &DiscoverOptions {
            filter_empty_only: true,
        },
        &Timing::default(),
        &TraceLogger::disabled(),
    )
}

pub fn field<'a>(fields: &'a [FieldDescriptor], id: &str) -> &'a FieldDescriptor {
    fields
        .iter()
        .find(|f| f.id == id)
        .unwrap_or_else(|| panic!("no field with id '{}' in scan result", id))
}

pub fn has_field(fields: &[FieldDescriptor], id: &str) -> bool {
    fields.iter().any(|f| f.id == id)
}

/// A job-application style form: labeled email, id-less full-name input,
/// native select with a placeholder option, radio pair, checkbox fieldset,
/// textarea, and a hidden file input.
pub fn job_form_page() -> FakePage {
    FakePage::with_body(vec![Elem::new("form").attr("id", "application-form").children(vec![
        Elem::new("div").children(vec![
            Elem::label("email", "Email Address"),
            Elem::input("email", "email").attr("required", ""),
        ]),
        Elem::new("div").child(Elem::new("input").attr("type", "text").attr("name", "fullName")),
        Elem::new("div").children(vec![
            Elem::label("country", "Country"),
            Elem::new("select").attr("id", "country").children(vec![
                Elem::option("", "Select a country..."),
                Elem::option("us", "United States"),
                Elem::option("ca", "Canada"),
            ]),
        ]),
        Elem::new("div").children(vec![
            Elem::input("radio", "auth-yes").attr("name", "workAuth").attr("value", "yes"),
            Elem::label("auth-yes", "Yes"),
            Elem::input("radio", "auth-no").attr("name", "workAuth").attr("value", "no"),
            Elem::label("auth-no", "No"),
        ]),
        Elem::new("fieldset").attr("id", "interests-set").children(vec![
            Elem::new("legend").text("Interests"),
            Elem::input("checkbox", "cb-eng")
                .attr("name", "interests[]")
                .attr("value", "engineering"),
            Elem::label("cb-eng", "Engineering"),
            Elem::input("checkbox", "cb-design")
                .attr("name", "interests[]")
                .attr("value", "design"),
            Elem::label("cb-design", "Design"),
        ]),
        Elem::new("div").children(vec![
            Elem::label("notes", "Additional Notes"),
            Elem::new("textarea").attr("id", "notes"),
        ]),
        Elem::new("div").children(vec![
            Elem::label("resume", "Resume"),
            Elem::input("file", "resume").hidden(),
        ]),
    ])])
}

/// A custom combobox whose option list is portal-rendered at body level and
/// only becomes visible once the widget is activated.
pub fn combobox_page() -> FakePage {
    let mut page = FakePage::with_body(vec![
        Elem::new("form").child(
            Elem::new("div")
                .attr("id", "visa-widget")
                .attr("role", "combobox")
                .attr("aria-haspopup", "listbox")
                .attr("aria-label", "Visa Status")
                .attr("tabindex", "0")
                .child(Elem::new("input").attr("type", "text").attr("id", "visa-input")),
        ),
        Elem::new("div").attr("id", "visa-portal").hidden().children(vec![
            Elem::new("div")
                .attr("class", "select__option")
                .attr("data-value", "citizen")
                .text("Citizen"),
            Elem::new("div")
                .attr("class", "select__option")
                .attr("data-value", "visa-holder")
                .text("Visa Holder"),
        ]),
    ]);

    let open_portal = vec![Mutation::SetVisible {
        selector: "[id=\"visa-portal\"]".into(),
        visible: true,
    }];
    page.on_key("[id=\"visa-input\"]", Key::Space, open_portal.clone());
    page.on_click("[id=\"visa-widget\"]", open_portal);
    page.on_click(
        "[data-value=\"citizen\"]",
        vec![Mutation::SetValue {
            selector: "[id=\"visa-input\"]".into(),
            value: "Citizen".into(),
        }],
    );
    page
}

/// A native select and a portal combobox side by side. The scan enlarges the
/// select, so its option elements are on screen the whole time; nothing
/// about the widget may key off options the select owns.
pub fn combobox_beside_select_page() -> FakePage {
    let mut page = FakePage::with_body(vec![
        Elem::new("form").children(vec![
            Elem::new("div").children(vec![
                Elem::label("doc-type", "Document Type"),
                Elem::new("select").attr("id", "doc-type").children(vec![
                    Elem::option("", "Select a document..."),
                    Elem::option("cert", "Citizenship Certificate"),
                    Elem::option("passport", "Passport"),
                ]),
            ]),
            Elem::new("div")
                .attr("id", "visa-widget")
                .attr("role", "combobox")
                .attr("aria-haspopup", "listbox")
                .attr("aria-label", "Visa Status")
                .attr("tabindex", "0")
                .child(Elem::new("input").attr("type", "text").attr("id", "visa-input")),
        ]),
        Elem::new("div").attr("id", "visa-portal").hidden().children(vec![
            Elem::new("div")
                .attr("class", "select__option")
                .attr("data-value", "citizen")
                .text("Citizen"),
            Elem::new("div")
                .attr("class", "select__option")
                .attr("data-value", "visa-holder")
                .text("Visa Holder"),
        ]),
    ]);

    let open_portal = vec![Mutation::SetVisible {
        selector: "[id=\"visa-portal\"]".into(),
        visible: true,
    }];
    page.on_key("[id=\"visa-input\"]", Key::Space, open_portal.clone());
    page.on_click("[id=\"visa-widget\"]", open_portal);
    page.on_click(
        "[data-value=\"citizen\"]",
        vec![Mutation::SetValue {
            selector: "[id=\"visa-input\"]".into(),
            value: "Citizen".into(),
        }],
    );
    page
}
