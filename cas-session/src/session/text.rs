use crate::{connector::Connector, slot::ExprSlot};
use super::CasSession;

/// Delimits the key of an expression in a template.
const DELIMITER: char = '@';

impl<C: Connector, S: ExprSlot> CasSession<C, S> {
    /// Replaces each `@key@` placeholder in the template with the display form of the expression
    /// with that key, evaluating the session if needed.
    ///
    /// An expression with errors is shown as it was typed instead, as is an expression the
    /// engine returned no display form for. Expressions are substituted one at a time, in
    /// session order, so text inserted for one expression is searched again for the keys of the
    /// expressions after it. Expressions with an empty key have no placeholder.
    ///
    /// If the session is invalid, the raw text of every expression is used.
    pub fn substitute(&mut self, template: &str) -> String {
        self.ensure_instantiated();

        let mut text = template.to_string();
        for slot in self.slots.iter().filter(|slot| !slot.key().is_empty()) {
            let placeholder = format!("{DELIMITER}{}{DELIMITER}", slot.key());
            if !text.contains(&placeholder) {
                continue;
            }

            let replacement = if slot.has_errors() {
                slot.raw_text()
            } else {
                slot.display().unwrap_or_else(|| slot.raw_text())
            };
            text = text.replace(&placeholder, replacement);
        }
        text
    }
}
