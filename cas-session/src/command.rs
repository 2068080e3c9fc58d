//! Serializes a session into the single script sent to the engine.
//!
//! The script is one `block` statement. It declares every variable it uses local to the block,
//! seeds the engine's random number generator, applies the [`CommandPrologue`], then prints the
//! result of each expression in session order, each fragment tagged with the expression's
//! position:
//!
//! ```text
//! cab:block([ RANDOM_SEED, simp, a], stack_randseed(42), simp:true,
//!     print("[TimeStamp= [ 42 ], Locals= [ "),
//!     print("0=[ error= ["), cte("a",errcatch(a:1+1)),
//!     print("] ]"), return(true) );
//! ```
//!
//! `errcatch` keeps one failing expression from aborting the rest of the script, and `cte`
//! prints the value and display form of the expression after its error section.

use crate::{options::CommandPrologue, slot::ExprSlot};
use std::borrow::Cow;

/// The character that cannot appear in a script.
const ILLEGAL: char = '?';

/// The token that replaces [`ILLEGAL`].
const ILLEGAL_REPLACEMENT: &str = "qmchar";

/// Returns the label an expression is bound to in the script: its key, or `dumvar<index>` if
/// the key is empty.
pub fn label(key: &str, index: usize) -> Cow<'_, str> {
    if key.is_empty() {
        Cow::Owned(format!("dumvar{}", index))
    } else {
        Cow::Borrowed(key)
    }
}

/// Replaces the characters that cannot appear in a script.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if text.contains(ILLEGAL) {
        Cow::Owned(text.replace(ILLEGAL, ILLEGAL_REPLACEMENT))
    } else {
        Cow::Borrowed(text)
    }
}

/// Builds the script that evaluates the given expressions.
///
/// The output only depends on the order, keys and canonical text of the expressions, the seed
/// and the prologue. Labels are assumed to be unique.
pub fn build_script<S: ExprSlot>(slots: &[S], seed: i64, prologue: &CommandPrologue) -> String {
    let mut names = String::from("RANDOM_SEED");
    let mut commands = String::new();

    for name in &prologue.variable_names {
        names.push_str(", ");
        names.push_str(name);
    }

    for (i, slot) in slots.iter().enumerate() {
        let label = label(slot.key(), i);
        let text = sanitize(slot.canonical_text());

        names.push_str(", ");
        names.push_str(&label);
        commands.push_str(&format!(
            ", print(\"{i}=[ error= [\"), cte(\"{label}\",errcatch({label}:{text})) ",
        ));
    }

    let setup = prologue.setup_commands.iter()
        .map(|command| format!(", {}", command))
        .collect::<String>();

    format!(
        "cab:block([ {names}], stack_randseed({seed}){setup}, print(\"[TimeStamp= [ {seed} ], Locals= [ \") {commands}, print(\"] ]\") , return(true) ); \n ",
    )
}

#[cfg(test)]
mod tests {
    use crate::{casstring::CasString, options::CasOptions, slot::{SecurityLevel, SyntaxPolicy}};
    use pretty_assertions::assert_eq;
    use super::*;

    fn slots(texts: &[&str]) -> Vec<CasString> {
        let policy = SyntaxPolicy { security: SecurityLevel::Teacher, ..SyntaxPolicy::default() };
        texts.iter()
            .map(|text| {
                let mut cs = CasString::new(text);
                cs.validate(policy);
                cs
            })
            .collect()
    }

    #[test]
    fn labels() {
        assert_eq!(label("", 2), "dumvar2");
        assert_eq!(label("a", 2), "a");
    }

    #[test]
    fn sanitize_question_marks() {
        assert_eq!(sanitize("x?y?"), "xqmcharyqmchar");
        assert!(matches!(sanitize("x+y"), Cow::Borrowed(_)));
    }

    #[test]
    fn single_expression() {
        let script = build_script(&slots(&["a:1+1"]), 42, &CommandPrologue::default());
        assert_eq!(
            script,
            "cab:block([ RANDOM_SEED, a], stack_randseed(42), print(\"[TimeStamp= [ 42 ], Locals= [ \") \
             , print(\"0=[ error= [\"), cte(\"a\",errcatch(a:1+1)) , print(\"] ]\") , return(true) ); \n ",
        );
    }

    #[test]
    fn dummy_labels_and_prologue() {
        let prologue = CommandPrologue {
            variable_names: vec!["simp".to_string()],
            setup_commands: vec!["simp:true".to_string()],
        };
        let script = build_script(&slots(&["a:x^2", "x?", "b:[1,2]"]), 7, &prologue);
        assert_eq!(
            script,
            "cab:block([ RANDOM_SEED, simp, a, dumvar1, b], stack_randseed(7), simp:true, \
             print(\"[TimeStamp= [ 7 ], Locals= [ \") \
             , print(\"0=[ error= [\"), cte(\"a\",errcatch(a:x^2)) \
             , print(\"1=[ error= [\"), cte(\"dumvar1\",errcatch(dumvar1:xqmchar)) \
             , print(\"2=[ error= [\"), cte(\"b\",errcatch(b:[1,2])) \
             , print(\"] ]\") , return(true) ); \n ",
        );
    }

    #[test]
    fn deterministic() {
        let slots = slots(&["p:x+1", "q:sin(x)"]);
        let prologue = CasOptions::default().command_prologue();
        assert_eq!(build_script(&slots, 3, &prologue), build_script(&slots, 3, &prologue));
        assert_ne!(build_script(&slots, 3, &prologue), build_script(&slots, 4, &prologue));
    }
}
