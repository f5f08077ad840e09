//! Form controls: live values, field encoding and reset.
//!
//! Controls keep the markup default (`value` attribute, `checked` attribute,
//! `<textarea>` text, `selected` option) separate from the live value the
//! user typed. Reset drops the live state so every control reads its
//! default again.

use crate::dom::{Document, NodeId};
use crate::errors::{DomError, Result};

/// Input types that never contribute a field on submission.
const NON_DATA_INPUT_TYPES: &[&str] = &["submit", "button", "reset", "image", "file"];

impl Document {
    fn input_type(&self, id: NodeId) -> &str {
        self.attr(id, "type").unwrap_or("text")
    }

    fn is_toggle(&self, id: NodeId) -> bool {
        self.tag_name(id) == Some("input")
            && matches!(self.input_type(id), "checkbox" | "radio")
    }

    /// Current value of a control (`input`, `textarea`, `select`).
    pub fn field_value(&self, id: NodeId) -> Option<String> {
        let el = self.element(id)?;
        if let Some(live) = &el.value {
            return Some(live.clone());
        }
        match el.tag_name() {
            "input" if self.is_toggle(id) => Some(el.attr("value").unwrap_or("on").to_string()),
            "input" => Some(el.attr("value").unwrap_or_default().to_string()),
            "textarea" => Some(self.text_content(id)),
            "select" => Some(self.selected_option_value(id).unwrap_or_default()),
            _ => None,
        }
    }

    fn selected_option_value(&self, select: NodeId) -> Option<String> {
        let options: Vec<NodeId> = self
            .descendants(select)
            .into_iter()
            .filter(|&n| self.tag_name(n) == Some("option"))
            .collect();
        let chosen = options
            .iter()
            .copied()
            .find(|&o| self.has_attr(o, "selected"))
            .or_else(|| options.first().copied())?;
        Some(
            self.attr(chosen, "value")
                .map_or_else(|| self.text_content(chosen).trim().to_string(), str::to_string),
        )
    }

    /// Set the live value of a control.
    pub fn set_field_value(&mut self, id: NodeId, value: &str) -> Result<()> {
        self.element_mut(id)?.value = Some(value.to_string());
        Ok(())
    }

    /// Whether a checkbox or radio is currently checked.
    pub fn is_checked(&self, id: NodeId) -> bool {
        self.element(id)
            .is_some_and(|el| el.checked.unwrap_or_else(|| el.has_attr("checked")))
    }

    /// Set the live checkedness of a checkbox or radio.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<()> {
        self.element_mut(id)?.checked = Some(checked);
        Ok(())
    }

    /// Encode the form's successful controls as `(name, value)` pairs in
    /// tree order.
    ///
    /// Unnamed and disabled controls are skipped, as are button-like inputs
    /// and unchecked checkboxes/radios.
    pub fn form_fields(&self, form: NodeId) -> Result<Vec<(String, String)>> {
        if self.element(form).is_none() {
            return Err(if self.contains(form) {
                DomError::NotAnElement(form)
            } else {
                DomError::UnknownNode(form)
            });
        }
        let mut fields = Vec::new();
        for n in self.descendants(form) {
            let Some(tag) = self.tag_name(n) else {
                continue;
            };
            if !matches!(tag, "input" | "textarea" | "select") {
                continue;
            }
            let name = match self.attr(n, "name") {
                Some(name) if !name.is_empty() => name,
                _ => continue,
            };
            if self.has_attr(n, "disabled") {
                continue;
            }
            if tag == "input" && NON_DATA_INPUT_TYPES.contains(&self.input_type(n)) {
                continue;
            }
            if self.is_toggle(n) && !self.is_checked(n) {
                continue;
            }
            if let Some(value) = self.field_value(n) {
                fields.push((name.to_string(), value));
            }
        }
        Ok(fields)
    }

    /// Restore every control under `form` to its markup default.
    pub fn reset_form(&mut self, form: NodeId) -> Result<()> {
        let _ = self.element_mut(form)?;
        for n in self.descendants(form) {
            if let Ok(el) = self.element_mut(n) {
                el.value = None;
                el.checked = None;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn form_doc() -> (Document, NodeId) {
        let mut doc = Document::new();
        let nodes = doc.parse_fragment(
            r#"<form sx-post="/todo">
                 <input name="todo_text" value="">
                 <input type="hidden" name="post_index" value="3">
                 <input type="checkbox" name="done">
                 <input type="checkbox" name="starred" value="yes" checked>
                 <textarea name="notes">default notes</textarea>
                 <select name="prio"><option value="lo">Low</option><option selected>High</option></select>
                 <input name="off" value="x" disabled>
                 <input value="nameless">
                 <button type="submit" name="go">Go</button>
                 <input type="submit" name="send" value="Send">
               </form>"#,
        );
        let form = nodes[0];
        doc.append_child(doc.root(), form).unwrap();
        (doc, form)
    }

    fn control(doc: &Document, form: NodeId, name: &str) -> NodeId {
        doc.descendants(form)
            .into_iter()
            .find(|&n| doc.attr(n, "name") == Some(name))
            .unwrap()
    }

    fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn default_fields_in_tree_order() {
        let (doc, form) = form_doc();
        let fields = doc.form_fields(form).unwrap();
        let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["todo_text", "post_index", "starred", "notes", "prio"]);
        assert_eq!(field(&fields, "post_index"), Some("3"));
        assert_eq!(field(&fields, "starred"), Some("yes"));
        assert_eq!(field(&fields, "notes"), Some("default notes"));
        assert_eq!(field(&fields, "prio"), Some("High"));
    }

    #[test]
    fn live_values_are_encoded() {
        let (mut doc, form) = form_doc();
        let input = control(&doc, form, "todo_text");
        doc.set_field_value(input, "buy milk").unwrap();
        let done = control(&doc, form, "done");
        doc.set_checked(done, true).unwrap();
        let fields = doc.form_fields(form).unwrap();
        assert_eq!(field(&fields, "todo_text"), Some("buy milk"));
        assert_eq!(field(&fields, "done"), Some("on"));
    }

    #[test]
    fn reset_restores_defaults() {
        let (mut doc, form) = form_doc();
        let input = control(&doc, form, "todo_text");
        doc.set_field_value(input, "typed").unwrap();
        doc.reset_form(form).unwrap();
        assert_eq!(doc.field_value(input), Some(String::new()));
    }

    #[test]
    fn unchecking_default_checked_box_drops_field() {
        let (mut doc, form) = form_doc();
        let starred = control(&doc, form, "starred");
        doc.set_checked(starred, false).unwrap();
        assert!(field(&doc.form_fields(form).unwrap(), "starred").is_none());
        doc.reset_form(form).unwrap();
        assert!(doc.is_checked(starred));
    }

    #[test]
    fn form_fields_on_text_node_fails() {
        let mut doc = Document::new();
        let text = doc.create_text("x");
        assert_matches!(doc.form_fields(text), Err(DomError::NotAnElement(_)));
    }

    #[test]
    fn non_control_has_no_value() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        assert_eq!(doc.field_value(div), None);
    }
}
