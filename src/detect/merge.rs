use crate::detect::field_model::FieldDescriptor;
use crate::detect::passes::PassOutput;

/// Merge pass outputs by identifier with the specificity rule: a later
/// pass's descriptor replaces an earlier one for the same element only when
/// its type ranks strictly higher (custom-dropdown dominates any generic
/// classification); otherwise the earlier descriptor wins and the later one
/// is dropped. Absorbed ids (e.g. a combobox's inner input) are removed at
/// the end.
///
/// This is a pure function of the pass outputs, so the final classification
/// for a static document is deterministic.
pub fn merge_passes(group_fields: Vec<FieldDescriptor>, passes: Vec<PassOutput>) -> Vec<FieldDescriptor> {
    let mut merged: Vec<FieldDescriptor> = group_fields;
    let mut absorbed: Vec<String> = Vec::new();

    for pass in passes {
        absorbed.extend(pass.absorbed);
        for descriptor in pass.descriptors {
            match merged.iter().position(|d| d.id == descriptor.id) {
                Some(existing) => {
                    if descriptor.field_type.specificity()
                        > merged[existing].field_type.specificity()
                    {
                        merged[existing] = descriptor;
                    }
                }
                None => merged.push(descriptor),
            }
        }
    }

    merged.retain(|d| !absorbed.contains(&d.id));
    merged
}
