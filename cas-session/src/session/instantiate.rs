use crate::{
    command::build_script,
    connector::{CasResults, Connector},
    error::SessionError,
    slot::ExprSlot,
};
use super::{CasSession, Instantiation, Validity};
use tracing::{debug, trace, warn};

impl<C: Connector, S: ExprSlot> CasSession<C, S> {
    /// Sends the expressions to the engine and merges the results back into them, validating
    /// the session first if needed.
    ///
    /// Returns false without calling the engine if the session is invalid. Otherwise the engine
    /// is called at most once per epoch: calling this again before the session is modified does
    /// nothing. Failures of the engine are recorded as errors, and the session still counts as
    /// evaluated; to evaluate it again, modify it with [`CasSession::add_slots`].
    pub fn instantiate(&mut self) -> bool {
        if self.valid == Validity::Unknown {
            self.validate();
        }
        if self.valid == Validity::Invalid {
            return false;
        }
        if self.instantiated == Instantiation::Done || self.slots.is_empty() {
            return true;
        }

        self.instantiated = Instantiation::Pending;
        let script = build_script(&self.slots, self.seed, &self.options.command_prologue());
        debug!(slots = self.slots.len(), seed = self.seed, bytes = script.len(), "sending script to engine");
        trace!(%script);

        let results = self.connector.evaluate(&script);
        debug!(results = results.len(), "engine returned");
        self.merge(&results);

        self.instantiated = Instantiation::Done;
        true
    }

    /// Writes the results back into the expressions.
    ///
    /// This walks the expressions rather than the results, so that every expression ends up
    /// with either a value or an error, even if the engine never mentioned it.
    fn merge(&mut self, results: &CasResults) {
        let mut new_errors = Vec::new();
        let mut all_failed = true;

        for (i, slot) in self.slots.iter_mut().enumerate() {
            let mut got_value = false;

            if let Some(result) = results.get(&i.to_string()) {
                all_failed = false;

                if let Some(value) = &result.value {
                    slot.set_value(value.clone());
                    got_value = true;
                }

                if let Some(display) = &result.display {
                    slot.set_display(display.clone());
                }

                if !result.error.is_empty() {
                    let error = SessionError::evaluation(slot.raw_text(), &result.error);
                    slot.add_error(error.clone());
                    new_errors.push(error);
                }
            }

            if !got_value {
                warn!(index = i, expr = slot.raw_text(), "engine returned no value");
                let error = SessionError::missing_result(slot.raw_text());
                slot.add_error(error.clone());
                new_errors.push(error);
            }
        }

        if all_failed {
            warn!(slots = self.slots.len(), "engine returned no results at all");
            self.errors = vec![SessionError::all_failed()];
        } else {
            self.errors.extend(new_errors);
        }
        self.all_failed = all_failed;
    }
}

#[cfg(test)]
mod tests {
    use crate::{casstring::CasString, connector::CasResult, error::{FailedReturn, SessionErrorKind}};
    use pretty_assertions::assert_eq;
    use super::super::tests::{new_session, Canned};
    use super::*;

    fn kinds(errors: &[SessionError]) -> Vec<SessionErrorKind> {
        errors.iter().map(|err| err.kind).collect()
    }

    #[test]
    fn missing_index() {
        let mut session = new_session(
            [("a", "1"), ("b", "2"), ("c", "3")],
            Canned::new([("0", CasResult::new("1", "1")), ("1", CasResult::new("2", "2"))]),
        );
        assert!(session.instantiate());

        assert_eq!(session.get_value("a"), Some("1"));
        assert_eq!(session.get_value("b"), Some("2"));
        assert_eq!(session.get_value("c"), None);

        let slots = session.slots();
        assert!(slots[0].errors().is_empty());
        assert!(slots[1].errors().is_empty());
        assert_eq!(kinds(slots[2].errors()), vec![SessionErrorKind::MissingResult]);
        assert!(slots[2].errors()[0].error.is::<FailedReturn>());

        assert!(!session.all_failed());
        let errors = session.errors().to_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].expr, "3");
    }

    #[test]
    fn empty_response() {
        let mut session = new_session([("a", "1"), ("b", "2"), ("c", "3")], Canned::default());
        assert!(session.instantiate());
        assert!(session.all_failed());
        assert_eq!(kinds(session.errors()), vec![SessionErrorKind::AllFailed]);
        assert_eq!(
            session.errors_text(),
            "the CAS failed to return any results; the connection may have failed or timed out",
        );

        // the expressions still carry their own errors
        for slot in session.slots() {
            assert_eq!(kinds(slot.errors()), vec![SessionErrorKind::MissingResult]);
        }
    }

    #[test]
    fn total_failure_is_not_retried() {
        let mut session = new_session([("a", "1")], Canned::default());
        assert_eq!(session.get_value("a"), None);
        assert_eq!(session.get_value("a"), None);
        assert_eq!(session.connector().calls(), 1);
        assert_eq!(session.instantiation(), Instantiation::Done);
    }

    #[test]
    fn error_with_value() {
        let mut session = new_session(
            [("a", "1/0")],
            Canned::new([("0", CasResult {
                value: Some("und".to_string()),
                display: None,
                error: "Division by 0".to_string(),
            })]),
        );
        assert_eq!(session.get_value("a"), Some("und"));
        assert_eq!(session.get_display("a"), None);
        let errors = session.get_errors("a").map(<[_]>::to_vec).unwrap_or_default();
        assert_eq!(kinds(&errors), vec![SessionErrorKind::Evaluation]);
        assert_eq!(
            errors[0].message(),
            "the CAS reported an error while evaluating this expression: Division by 0",
        );
    }

    #[test]
    fn error_only_record() {
        let mut session = new_session(
            [("a", "x"), ("b", "1/0")],
            Canned::new([("0", CasResult::new("x", "x")), ("1", CasResult::error("Division by 0"))]),
        );
        session.instantiate();
        assert!(!session.all_failed());
        assert_eq!(
            kinds(session.slots()[1].errors()),
            vec![SessionErrorKind::Evaluation, SessionErrorKind::MissingResult],
        );
        assert_eq!(session.errors().len(), 2);
    }

    #[test]
    fn record_without_value_is_not_total_failure() {
        // a record with no value still counts as a response from the engine
        let mut session = new_session([("a", "x")], Canned::new([("0", CasResult::default())]));
        session.instantiate();
        assert!(!session.all_failed());
        assert_eq!(kinds(session.errors()), vec![SessionErrorKind::MissingResult]);
    }

    #[test]
    fn empty_value_is_a_value() {
        let mut session = new_session([("a", "\"\"")], Canned::new([("0", CasResult::new("", ""))]));
        assert_eq!(session.get_value("a"), Some(""));
        assert!(session.errors().is_empty());
        assert!(!session.all_failed());
    }

    #[test]
    fn positions_match_script() {
        let mut session = CasSession::new(
            [CasString::new("x+1"), CasString::new("y+2")],
            Canned::new([("1", CasResult::new("y+2", "y+2"))]),
        )
            .with_seed(1);
        session.instantiate();

        let script = &session.connector().scripts[0];
        assert!(script.contains("print(\"1=[ error= [\"), cte(\"dumvar1\",errcatch(dumvar1:y+2))"));
        assert_eq!(session.slots()[1].value(), Some("y+2"));
        assert_eq!(session.slots()[0].value(), None);
    }
}
