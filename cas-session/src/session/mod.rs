mod instantiate;
mod text;

use crate::{
    casstring::CasString,
    connector::Connector,
    error::{errors_to_string, SessionError},
    options::CasOptions,
    slot::{ExprSlot, SecurityLevel, SyntaxPolicy},
};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Whether the expressions of a session have been validated, and the outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Validity {
    /// Not validated since the session was created or last modified.
    #[default]
    Unknown,

    /// Every expression is valid.
    Valid,

    /// At least one expression is invalid.
    Invalid,
}

/// Whether the expressions of a session have been sent to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Instantiation {
    /// Not sent since the session was created or last modified.
    #[default]
    Unknown,

    /// The script has been sent and the session is waiting for the results.
    Pending,

    /// The results have been merged back into the expressions.
    Done,
}

/// An ordered batch of expressions, evaluated together through a single call to the engine.
///
/// Reading any result validates and evaluates the session if it has not been already. The
/// engine is called at most once until the session is modified with
/// [`CasSession::add_slots`], after which the whole batch is evaluated again on the next read.
///
/// ```
/// use cas_session::{CasResult, CasResults, CasSession, CasString};
///
/// let connector = |_: &str| CasResults::from([("0".to_string(), CasResult::new("2", "2"))]);
/// let mut session = CasSession::new([CasString::new("a:1+1")], connector).with_seed(42);
///
/// assert_eq!(session.get_value("a"), Some("2"));
/// assert_eq!(session.substitute("result is @a@"), "result is 2");
/// assert!(session.errors().is_empty());
/// ```
#[derive(Debug)]
pub struct CasSession<C, S = CasString> {
    /// The expressions, in the order they are evaluated in.
    slots: Vec<S>,

    /// Runs the script through the engine.
    connector: C,

    /// Engine-side settings applied before any expression.
    options: CasOptions,

    /// Seeds the engine's random number generator.
    seed: i64,

    /// The settings each expression is validated under.
    policy: SyntaxPolicy,

    valid: Validity,
    instantiated: Instantiation,

    /// Errors of the whole session.
    errors: Vec<SessionError>,

    /// True if the engine returned nothing at all the last time it was called.
    all_failed: bool,
}

/// Returns the current UNIX time, in seconds.
fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |time| time.as_secs() as i64)
}

impl<C: Connector, S: ExprSlot> CasSession<C, S> {
    /// Creates a new session over the given expressions.
    ///
    /// The session uses the default [`CasOptions`], student-level security, strict syntax
    /// without inserting multiplication signs, and the current time as its seed.
    pub fn new(slots: impl IntoIterator<Item = S>, connector: C) -> Self {
        Self {
            slots: slots.into_iter().collect(),
            connector,
            options: CasOptions::default(),
            seed: now(),
            policy: SyntaxPolicy::default(),
            valid: Validity::Unknown,
            instantiated: Instantiation::Unknown,
            errors: Vec::new(),
            all_failed: false,
        }
    }

    /// Set the engine options. Returns an updated [`CasSession`] for chaining.
    pub fn with_options(mut self, options: CasOptions) -> Self {
        self.options = options;
        self.reset();
        self
    }

    /// Set the seed. Returns an updated [`CasSession`] for chaining.
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self.reset();
        self
    }

    /// Set the security level. Returns an updated [`CasSession`] for chaining.
    pub fn with_security(mut self, security: SecurityLevel) -> Self {
        self.policy.security = security;
        self.reset();
        self
    }

    /// Set whether syntax is checked strictly. Returns an updated [`CasSession`] for chaining.
    pub fn with_syntax_strict(mut self, strict: bool) -> Self {
        self.policy.strict = strict;
        self.reset();
        self
    }

    /// Set whether missing multiplication signs are inserted. Returns an updated [`CasSession`]
    /// for chaining.
    pub fn with_insert_stars(mut self, insert_stars: bool) -> Self {
        self.policy.insert_stars = insert_stars;
        self.reset();
        self
    }

    /// Forgets the outcome of validation and evaluation.
    fn reset(&mut self) {
        self.valid = Validity::Unknown;
        self.instantiated = Instantiation::Unknown;
        self.errors.clear();
        self.all_failed = false;
    }

    /// The expressions of the session, in order.
    pub fn slots(&self) -> &[S] {
        &self.slots
    }

    /// The connector of the session.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// The seed of the session.
    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// The options of the session.
    pub fn options(&self) -> &CasOptions {
        &self.options
    }

    /// The settings each expression is validated under.
    pub fn policy(&self) -> &SyntaxPolicy {
        &self.policy
    }

    /// The current validation state.
    pub fn validity(&self) -> Validity {
        self.valid
    }

    /// The current evaluation state.
    pub fn instantiation(&self) -> Instantiation {
        self.instantiated
    }

    /// Returns true if the engine returned nothing at all the last time it was called.
    pub fn all_failed(&self) -> bool {
        self.all_failed
    }

    /// Validates every expression and starts a new evaluation epoch. Returns true if every
    /// expression is valid.
    ///
    /// Errors of all invalid expressions are collected, not only those of the first one.
    pub fn validate(&mut self) -> bool {
        self.reset();

        let mut valid = true;
        for slot in &mut self.slots {
            slot.clear_results();
            slot.prepare(&self.policy);
            if !slot.is_valid() {
                valid = false;
                self.errors.extend(slot.errors().iter().cloned());
            }
        }

        debug!(slots = self.slots.len(), valid, "validated session");
        self.valid = if valid { Validity::Valid } else { Validity::Invalid };
        valid
    }

    /// Validates the session if it has not been validated yet. Returns true if it is valid.
    fn ensure_valid(&mut self) -> bool {
        if self.valid == Validity::Unknown {
            self.validate();
        }
        self.valid == Validity::Valid
    }

    /// Validates and evaluates the session if that has not been done yet. Returns true if the
    /// session is valid.
    fn ensure_instantiated(&mut self) -> bool {
        if !self.ensure_valid() {
            return false;
        }
        if self.instantiated == Instantiation::Unknown {
            self.instantiate();
        }
        true
    }

    /// Returns true if every expression is valid, validating the session if needed.
    pub fn get_valid(&mut self) -> bool {
        self.ensure_valid()
    }

    /// Returns the errors of the session, validating it if needed. This does not evaluate the
    /// session; evaluation errors only appear once it has been evaluated.
    pub fn errors(&mut self) -> &[SessionError] {
        self.ensure_valid();
        &self.errors
    }

    /// Returns the errors of the session as text, one error per line.
    pub fn errors_text(&mut self) -> String {
        errors_to_string(self.errors())
    }

    /// Returns true if any expression uses any of the given words, validating the session if
    /// needed.
    pub fn check_external_forbidden_words(&mut self, keywords: &[&str]) -> bool {
        self.ensure_valid();
        self.slots.iter().any(|slot| slot.matches_forbidden(keywords))
    }

    /// Returns the first expression with the given key.
    fn find(&self, key: &str) -> Option<&S> {
        self.slots.iter().find(|slot| slot.key() == key)
    }

    /// Returns the value of the expression with the given key, evaluating the session if
    /// needed.
    ///
    /// Returns [`None`] if the session is invalid, if no expression has the key, or if the
    /// engine returned no value for it.
    pub fn get_value(&mut self, key: &str) -> Option<&str> {
        if !self.ensure_instantiated() {
            return None;
        }
        self.find(key).and_then(|slot| slot.value())
    }

    /// Returns the display form of the expression with the given key, evaluating the session
    /// if needed.
    ///
    /// Returns [`None`] if the session is invalid, if no expression has the key, or if the
    /// engine returned no display form for it.
    pub fn get_display(&mut self, key: &str) -> Option<&str> {
        if !self.ensure_instantiated() {
            return None;
        }
        self.find(key).and_then(|slot| slot.display())
    }

    /// Returns the errors of the expression with the given key, evaluating the session if
    /// needed.
    ///
    /// Returns [`None`] if the session is invalid or if no expression has the key.
    pub fn get_errors(&mut self, key: &str) -> Option<&[SessionError]> {
        if !self.ensure_instantiated() {
            return None;
        }
        self.find(key).map(|slot| slot.errors())
    }

    /// Appends expressions to the session.
    ///
    /// Any result read before this call is stale: the session is validated and evaluated again,
    /// as a whole, on the next read.
    pub fn add_slots(&mut self, slots: impl IntoIterator<Item = S>) {
        self.slots.extend(slots);
        self.reset();
    }
}
