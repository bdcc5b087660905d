//! Selector engine: tokenizer, parser, model, matching.
//!
//! Supports type, `*`, `.class`, `#id`, `[attr]`, `[attr=value]`, descendant
//! and `>` combinators, and comma lists. Used by the DOM query methods.

pub mod matching;
pub mod model;
pub mod parser;
pub mod tokenizer;

pub use matching::{matches_compound, matches_list, matches_selector};
pub use model::{Combinator, CompoundSelector, Selector, SelectorComponent, SelectorList, SelectorPart};
pub use parser::parse_selector_list;
