//! Engine-side settings that apply to every expression in a session.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The multiplication sign the engine uses in display forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MultiplicationSign {
    /// A centered dot, `\cdot`.
    #[default]
    Dot,

    /// A cross, `\times`.
    Cross,

    /// No sign at all.
    Blank,
}

/// The symbol the engine uses for the imaginary unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ComplexNo {
    /// `i`, as in mathematics.
    #[default]
    I,

    /// `j`, as in engineering.
    J,

    /// `i`, with `i` also usable as a variable.
    SymI,

    /// `j`, with `j` also usable as a variable.
    SymJ,
}

/// How inverse trigonometric functions are displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InverseTrig {
    /// `cos^-1(x)`.
    #[default]
    Cos1,

    /// `acos(x)`.
    Acos,

    /// `arccos(x)`.
    Arccos,
}

/// The engine-side declarations a session emits before any expression: the extra variables to
/// declare local, followed by the commands that set them up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPrologue {
    /// Names of the variables to declare local to the script.
    pub variable_names: Vec<String>,

    /// Commands to run once, before any expression is evaluated.
    pub setup_commands: Vec<String>,
}

/// Options to use when evaluating a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CasOptions {
    /// Whether the engine simplifies expressions automatically.
    ///
    /// The default value is `true`.
    pub simplify: bool,

    /// Whether floating-point numbers are rejected in answers.
    ///
    /// The default value is `true`.
    pub no_floats: bool,

    /// Whether square roots are displayed with a radical sign instead of a power of `1/2`.
    ///
    /// The default value is `true`.
    pub sqrt_sign: bool,

    /// Whether the engine assumes that all variables are positive.
    ///
    /// The default value is `false`.
    pub assume_positive: bool,

    /// The multiplication sign used in display forms.
    ///
    /// The default value is [`MultiplicationSign::Dot`].
    pub multiplication: MultiplicationSign,

    /// The symbol used for the imaginary unit.
    ///
    /// The default value is [`ComplexNo::I`].
    pub complex_no: ComplexNo,

    /// How inverse trigonometric functions are displayed.
    ///
    /// The default value is [`InverseTrig::Cos1`].
    pub inverse_trig: InverseTrig,
}

/// The default options. Returns a [`CasOptions`] with the following values:
///
/// - [`simplify`](CasOptions::simplify): `true`
/// - [`no_floats`](CasOptions::no_floats): `true`
/// - [`sqrt_sign`](CasOptions::sqrt_sign): `true`
/// - [`assume_positive`](CasOptions::assume_positive): `false`
/// - [`multiplication`](CasOptions::multiplication): [`MultiplicationSign::Dot`]
/// - [`complex_no`](CasOptions::complex_no): [`ComplexNo::I`]
/// - [`inverse_trig`](CasOptions::inverse_trig): [`InverseTrig::Cos1`]
impl Default for CasOptions {
    fn default() -> CasOptions {
        CasOptions {
            simplify: true,
            no_floats: true,
            sqrt_sign: true,
            assume_positive: false,
            multiplication: MultiplicationSign::default(),
            complex_no: ComplexNo::default(),
            inverse_trig: InverseTrig::default(),
        }
    }
}

impl CasOptions {
    /// Set whether to simplify. Returns an updated [`CasOptions`] for chaining.
    pub fn simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    /// Set whether to reject floats. Returns an updated [`CasOptions`] for chaining.
    pub fn no_floats(mut self, no_floats: bool) -> Self {
        self.no_floats = no_floats;
        self
    }

    /// Set whether to display a radical sign. Returns an updated [`CasOptions`] for chaining.
    pub fn sqrt_sign(mut self, sqrt_sign: bool) -> Self {
        self.sqrt_sign = sqrt_sign;
        self
    }

    /// Set whether to assume positive variables. Returns an updated [`CasOptions`] for chaining.
    pub fn assume_positive(mut self, assume_positive: bool) -> Self {
        self.assume_positive = assume_positive;
        self
    }

    /// Set the multiplication sign. Returns an updated [`CasOptions`] for chaining.
    pub fn multiplication(mut self, sign: MultiplicationSign) -> Self {
        self.multiplication = sign;
        self
    }

    /// Set the imaginary unit. Returns an updated [`CasOptions`] for chaining.
    pub fn complex_no(mut self, complex_no: ComplexNo) -> Self {
        self.complex_no = complex_no;
        self
    }

    /// Set the inverse trigonometric display. Returns an updated [`CasOptions`] for chaining.
    pub fn inverse_trig(mut self, inverse_trig: InverseTrig) -> Self {
        self.inverse_trig = inverse_trig;
        self
    }

    /// Returns the declarations and commands that apply these options inside the engine.
    pub fn command_prologue(&self) -> CommandPrologue {
        let flags = [
            ("simp", self.simplify),
            ("OPT_NoFloats", self.no_floats),
            ("sqrtdispflag", self.sqrt_sign),
            ("assume_pos", self.assume_positive),
        ];

        let multiplication = match self.multiplication {
            MultiplicationSign::Dot => "dot",
            MultiplicationSign::Cross => "cross",
            MultiplicationSign::Blank => "blank",
        };
        let complex_no = match self.complex_no {
            ComplexNo::I => "i",
            ComplexNo::J => "j",
            ComplexNo::SymI => "symi",
            ComplexNo::SymJ => "symj",
        };
        let inverse_trig = match self.inverse_trig {
            InverseTrig::Cos1 => "cos-1",
            InverseTrig::Acos => "acos",
            InverseTrig::Arccos => "arccos",
        };

        CommandPrologue {
            variable_names: flags.iter().map(|(name, _)| name.to_string()).collect(),
            setup_commands: flags.iter()
                .map(|(name, value)| format!("{}:{}", name, value))
                .chain([
                    format!("make_multsgn(\"{}\")", multiplication),
                    format!("make_complexJ({})", complex_no),
                    format!("make_arccos(\"{}\")", inverse_trig),
                ])
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn default_prologue() {
        let prologue = CasOptions::default().command_prologue();
        assert_eq!(prologue.variable_names, vec!["simp", "OPT_NoFloats", "sqrtdispflag", "assume_pos"]);
        assert_eq!(prologue.setup_commands, vec![
            "simp:true",
            "OPT_NoFloats:true",
            "sqrtdispflag:true",
            "assume_pos:false",
            "make_multsgn(\"dot\")",
            "make_complexJ(i)",
            "make_arccos(\"cos-1\")",
        ]);
    }

    #[test]
    fn chained() {
        let options = CasOptions::default()
            .simplify(false)
            .multiplication(MultiplicationSign::Cross)
            .complex_no(ComplexNo::J)
            .inverse_trig(InverseTrig::Arccos);
        let prologue = options.command_prologue();
        assert_eq!(prologue.setup_commands[0], "simp:false");
        assert_eq!(&prologue.setup_commands[4..], [
            "make_multsgn(\"cross\")",
            "make_complexJ(j)",
            "make_arccos(\"arccos\")",
        ]);
    }
}
