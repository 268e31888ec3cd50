//! Expression scanning for trend and logic expressions.
//!
//! This is not an expression parser. It tokenizes well enough to tell
//! operator calls, their signal arguments, bare references, comparison
//! operators and window literals apart.

/// Operators accepted inside expressions.
pub(crate) const KNOWN_OPERATORS: &[&str] = &[
    "delta",
    "slope",
    "sma",
    "ema",
    "min",
    "max",
    "count",
    "first",
    "std",
    "stddev",
    "percentile",
    "last",
    "exists",
    "missing",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Ident(&'a str),
    Number(&'a str),
    /// A number immediately followed by a unit suffix, e.g. `48h`
    Duration(&'a str),
    Str(&'a str),
    Compare(&'a str),
    Symbol(char),
}

pub(crate) fn tokenize(expr: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let mut end = start + c.len_utf8();
            while let Some(&(i, n)) = chars.peek() {
                if n.is_ascii_alphanumeric() || n == '_' {
                    end = i + n.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(&expr[start..end]));
            continue;
        }

        if c.is_ascii_digit() {
            let mut end = start + 1;
            let mut has_suffix = false;
            while let Some(&(i, n)) = chars.peek() {
                if n.is_ascii_digit() || (n == '.' && !has_suffix) {
                    end = i + 1;
                    chars.next();
                } else if n.is_ascii_alphabetic() {
                    has_suffix = true;
                    end = i + 1;
                    chars.next();
                } else {
                    break;
                }
            }
            let text = &expr[start..end];
            tokens.push(if has_suffix {
                Token::Duration(text)
            } else {
                Token::Number(text)
            });
            continue;
        }

        if c == '"' || c == '\'' {
            let mut end = expr.len();
            for (i, n) in chars.by_ref() {
                if n == c {
                    end = i + 1;
                    break;
                }
            }
            tokens.push(Token::Str(&expr[start..end]));
            continue;
        }

        if matches!(c, '<' | '>' | '=' | '!') {
            let end = match chars.peek() {
                Some(&(i, '=')) => {
                    chars.next();
                    i + 1
                }
                _ => start + 1,
            };
            let op = &expr[start..end];
            // lone `=` and `!` are not comparisons
            if op == "=" || op == "!" {
                tokens.push(Token::Symbol(c));
            } else {
                tokens.push(Token::Compare(op));
            }
            continue;
        }

        tokens.push(Token::Symbol(c));
    }

    tokens
}

/// An operator call such as `delta(Cr, 48h)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call<'a> {
    pub function: &'a str,
    /// First argument when it is a plain identifier
    pub first_arg: Option<&'a str>,
    /// Nesting depth of enclosing calls
    pub depth: usize,
}

/// Structural summary of one expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ExprSummary<'a> {
    pub calls: Vec<Call<'a>>,
    /// Identifiers used as call arguments
    pub call_args: Vec<&'a str>,
    /// Identifiers outside any call, in order of appearance
    pub references: Vec<&'a str>,
    pub comparisons: Vec<&'a str>,
    pub durations: Vec<&'a str>,
}

impl<'a> ExprSummary<'a> {
    pub fn scan(expr: &'a str) -> Self {
        let tokens = tokenize(expr);
        let mut summary = ExprSummary::default();
        // true for call parentheses, false for grouping parentheses
        let mut stack: Vec<bool> = Vec::new();
        let mut pending_call = false;

        for (idx, token) in tokens.iter().enumerate() {
            let next = tokens.get(idx + 1);
            match *token {
                Token::Ident(name) if next == Some(&Token::Symbol('(')) => {
                    // a nested call in first position is not a signal argument
                    let first_arg = match (tokens.get(idx + 2), tokens.get(idx + 3)) {
                        (Some(Token::Ident(_)), Some(Token::Symbol('('))) => None,
                        (Some(Token::Ident(arg)), _) => Some(*arg),
                        _ => None,
                    };
                    summary.calls.push(Call {
                        function: name,
                        first_arg,
                        depth: stack.iter().filter(|is_call| **is_call).count(),
                    });
                    pending_call = true;
                }
                Token::Ident(name) => {
                    if stack.iter().any(|is_call| *is_call) {
                        summary.call_args.push(name);
                    } else {
                        summary.references.push(name);
                    }
                }
                Token::Symbol('(') => {
                    stack.push(pending_call);
                    pending_call = false;
                }
                Token::Symbol(')') => {
                    stack.pop();
                }
                Token::Compare(op) => summary.comparisons.push(op),
                Token::Duration(text) => summary.durations.push(text),
                _ => {}
            }
        }

        summary
    }

    /// The outermost call, if the expression starts with one.
    pub fn outer_call(&self) -> Option<&Call<'a>> {
        self.calls.iter().find(|c| c.depth == 0)
    }
}

/// `true` for an integer followed by a single s/m/h/d/w unit.
pub(crate) fn is_valid_window(text: &str) -> bool {
    let Some(unit) = text.chars().last() else {
        return false;
    };
    let digits = &text[..text.len() - unit.len_utf8()];
    matches!(unit, 's' | 'm' | 'h' | 'd' | 'w')
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
}
