// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::ops::Range;

use chumsky::{
    error::Simple,
    primitive::{end, filter, just, one_of},
    text::TextParser,
    Parser,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Ident(Vec<String>),
    Number(String),
    Op(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Token::Ident(path) => f.write_str(&path.join(".")),
            Token::Number(value) => f.write_str(value),
            Token::Op(symbol) => f.write_str(symbol),
        }
    }
}

fn is_ident_start(c: &char) -> bool {
    c.is_alphabetic() || *c == '_'
}

fn is_ident_char(c: &char) -> bool {
    c.is_alphanumeric() || *c == '_' || *c == '-'
}

pub fn gen_lexer() -> impl Parser<char, Vec<(Token, Range<usize>)>, Error = Simple<char>> {
    let segment = filter(is_ident_start)
        .chain::<char, _, _>(filter(is_ident_char).repeated())
        .collect::<String>();

    // A dot only continues a name when another name segment follows it, so `.5` still lexes as a number.
    let ident = segment
        .clone()
        .then(just('.').ignore_then(segment).repeated())
        .map(|(first, rest)| {
            let mut path = vec![first];
            path.extend(rest);
            Token::Ident(path)
        })
        .labelled("identifier");

    let frac = just('.').chain::<char, _, _>(filter(|c: &char| c.is_ascii_digit()).repeated());

    let number = filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .chain::<char, _, _>(frac.or_not().flatten())
        .or(just('.').chain::<char, _, _>(filter(|c: &char| c.is_ascii_digit()).repeated().at_least(1)))
        .collect::<String>()
        .map(Token::Number)
        .labelled("number");

    let op = one_of("^*/+-%=!")
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map(Token::Op)
        .labelled("operator");

    let token = ident.or(number).or(op);

    token
        .map_with_span(|tok, span| (tok, span))
        .padded()
        .repeated()
        .then_ignore(end())
}
