use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Characters that may never appear in an expression, regardless of who wrote it.
pub const FORBIDDEN_CHARS: &[char] = &['$', '@', '\\', ';', '`'];

/// Words that may never appear in an expression. These give access to the engine's host
/// environment or alter the engine's global state.
pub static GLOBAL_FORBIDDEN: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "appendfile", "batch", "batchload", "closefile", "compfile", "compile", "concat",
        "filename_merge", "file_search", "kill", "load", "loadfile", "opena", "openr", "openw",
        "printfile", "remfunction", "remvalue", "reset", "restore", "run_testsuite", "save",
        "setup_autoload", "stringout", "system", "translate", "translate_file", "with_stdout",
        "writefile",
    ])
});

/// Words that only a teacher may use: engine commands that would let a student hand the
/// computation of an answer to the engine.
pub static STUDENT_FORBIDDEN: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "algsys", "coeff", "denom", "diff", "divide", "ev", "expand", "factor", "fullratsimp",
        "gcd", "integrate", "lhs", "limit", "linsolve", "num", "partfrac", "radcan", "ratsimp",
        "rhs", "simp", "solve", "subst", "sum", "taylor", "trigexpand", "trigreduce",
        "trigsimp",
    ])
});

/// Infix and control-flow keywords of the engine's language. Two operands separated by one of
/// these are not an implicit multiplication.
pub static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "and", "do", "else", "elseif", "for", "from", "if", "in", "next", "not", "or", "step",
        "then", "thru", "unless", "while",
    ])
});

/// Returns true if the given name is a keyword.
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(name.to_ascii_lowercase().as_str())
}
