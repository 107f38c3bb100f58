//! XPath 1.0 core library and the YANG extension functions.

mod extensions;
mod numeric;
mod strings;

use super::evaluator::{EvalOutcome, Evaluator, Focus};
use crate::names::prefixed;
use crate::value::EvalResult;
use tracing::debug;
use yangval_core::{Expr, Function};

impl Evaluator<'_> {
    pub(in crate::engine) fn call(&mut self, func: Function, args: &[Expr], focus: &Focus) -> EvalOutcome {
        match func {
            Function::Current => Ok(EvalResult::NodeSet(vec![self.origin.clone()])),
            Function::Count => match args.first() {
                Some(arg) => self.count(arg, focus),
                None => Ok(EvalResult::number(0.0)),
            },
            Function::Last => Ok(numeric::from_usize(focus.size)),
            Function::Position => Ok(numeric::from_usize(focus.position)),
            Function::True => Ok(EvalResult::Bool(true)),
            Function::False => Ok(EvalResult::Bool(false)),
            // Configuration trees carry no `xml:lang`.
            Function::Lang => {
                debug!(origin = %self.error_path(), "lang() has no xml:lang to match");
                Ok(EvalResult::Bool(false))
            }
            func if func.defaults_to_context() => {
                let subject = match args.first() {
                    Some(arg) => self.eval(arg, focus)?,
                    None => EvalResult::NodeSet(vec![focus.item.clone()]),
                };
                Ok(self.of_subject(func, &subject))
            }
            func => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, focus)?);
                }
                Ok(library(func, &values))
            }
        }
    }

    /// Functions of one value that default to the context node.
    fn of_subject(&self, func: Function, subject: &EvalResult) -> EvalResult {
        if subject.is_absent() {
            return EvalResult::Absent;
        }
        if matches!(func, Function::LocalName | Function::NamespaceUri | Function::Name) {
            let Some(item) = subject.items().first() else {
                return EvalResult::string("");
            };
            let name = item.name();
            return EvalResult::string(match func {
                Function::LocalName => name.local().to_owned(),
                Function::NamespaceUri => name.namespace().to_owned(),
                _ => prefixed(self.navigator(item.anchor()).as_ref(), &name),
            });
        }
        let Some(text) = subject.to_text() else {
            return EvalResult::Absent;
        };
        match func {
            Function::Number => EvalResult::number(subject.to_number()),
            Function::StringLength => numeric::from_usize(text.chars().count()),
            Function::NormalizeSpace => EvalResult::string(strings::normalize_space(&text)),
            _ => EvalResult::string(text),
        }
    }
}

/// Functions whose arguments are fully evaluated up front. Absent arguments
/// behave like empty node-sets.
fn library(func: Function, args: &[EvalResult]) -> EvalResult {
    let text = |i: usize| args.get(i).and_then(EvalResult::to_text).unwrap_or_default();
    let number = |i: usize| args.get(i).map_or(f64::NAN, EvalResult::to_number);
    match func {
        Function::Concat => EvalResult::string((0..args.len()).map(text).collect::<String>()),
        Function::StartsWith => EvalResult::Bool(text(0).starts_with(&text(1))),
        Function::Contains => EvalResult::Bool(text(0).contains(&text(1))),
        Function::SubstringBefore => EvalResult::string(strings::before(&text(0), &text(1))),
        Function::SubstringAfter => EvalResult::string(strings::after(&text(0), &text(1))),
        Function::Substring => {
            let length = (args.len() > 2).then(|| number(2));
            EvalResult::string(strings::substring(&text(0), number(1), length))
        }
        Function::Translate => EvalResult::string(strings::translate(&text(0), &text(1), &text(2))),
        Function::Boolean => EvalResult::Bool(args.first().is_some_and(EvalResult::to_bool)),
        Function::Not => EvalResult::Bool(!args.first().is_some_and(EvalResult::to_bool)),
        Function::Sum => EvalResult::number(numeric::sum(args.first())),
        Function::Floor => EvalResult::number(number(0).floor()),
        Function::Ceiling => EvalResult::number(number(0).ceil()),
        Function::Round => EvalResult::number(numeric::round(number(0))),
        _ => EvalResult::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn s(text: &str) -> EvalResult {
        EvalResult::string(text)
    }

    #[rstest]
    #[case(Function::Concat, vec![s("a"), s("b"), EvalResult::number(1.0)], "ab1")]
    #[case(Function::SubstringBefore, vec![s("1999/04/01"), s("/")], "1999")]
    #[case(Function::SubstringAfter, vec![s("1999/04/01"), s("/")], "04/01")]
    #[case(Function::Substring, vec![s("12345"), EvalResult::number(2.0), EvalResult::number(3.0)], "234")]
    #[case(Function::Substring, vec![s("12345"), EvalResult::number(1.5), EvalResult::number(2.6)], "234")]
    #[case(Function::Substring, vec![s("12345"), EvalResult::number(0.0), EvalResult::number(3.0)], "12")]
    #[case(Function::Substring, vec![s("12345"), EvalResult::number(f64::NAN), EvalResult::number(3.0)], "")]
    #[case(Function::Translate, vec![s("--aaa--"), s("abc-"), s("ABC")], "AAA")]
    #[case(Function::Concat, vec![EvalResult::Absent, s("x")], "x")]
    fn string_functions(#[case] func: Function, #[case] args: Vec<EvalResult>, #[case] expected: &str) {
        assert_eq!(library(func, &args).to_text().as_deref(), Some(expected));
    }

    #[rstest]
    #[case(Function::Not, vec![EvalResult::Absent], true)]
    #[case(Function::Not, vec![s("x")], false)]
    #[case(Function::Boolean, vec![EvalResult::NodeSet(Vec::new())], false)]
    #[case(Function::StartsWith, vec![s("GigabitEthernet0"), s("Gigabit")], true)]
    #[case(Function::Contains, vec![s("eth0"), s("x")], false)]
    fn boolean_functions(#[case] func: Function, #[case] args: Vec<EvalResult>, #[case] expected: bool) {
        assert_eq!(library(func, &args), expected);
    }

    #[rstest]
    #[case(Function::Round, 2.5, 3.0)]
    #[case(Function::Round, -2.5, -2.0)]
    #[case(Function::Floor, -1.5, -2.0)]
    #[case(Function::Ceiling, 1.1, 2.0)]
    fn numeric_functions(#[case] func: Function, #[case] arg: f64, #[case] expected: f64) {
        assert_eq!(library(func, &[EvalResult::number(arg)]).to_number(), expected);
    }
}
