//! Omnibox input handling: prefix parsing and suggestion ranking

pub mod parse;
pub mod suggest;

pub use parse::{parse, MatchKind, ParsedInput};
pub use suggest::{rank, Suggestion, SuggestionLabel};
