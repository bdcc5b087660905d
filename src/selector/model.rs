//! Parsed form of the selectors accepted by `query_selector` and friends.

/// A single simple selector.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Type selector: matches the tag name (e.g. `div`).
    Type(String),
    /// `*`
    Universal,
    /// `.name`; matched against the whitespace-split `class` attribute.
    Class(String),
    /// ID selector: `#id`.
    Id(String),
    /// Attribute selector: `[name]` or `[name=value]`.
    Attribute { name: String, value: Option<String> },
}

/// How two compound selectors relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `A B`: any ancestor.
    Descendant,
    /// `A > B`: the direct parent.
    Child,
}

/// A sequence of simple selectors without combinators.
///
/// For example, `ojs-counter[uid="3"].active` is one `CompoundSelector` with
/// three components.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    pub components: Vec<SelectorComponent>,
}

impl CompoundSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, component: SelectorComponent) {
        self.components.push(component);
    }
}

/// A step of a [`Selector`].
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorPart {
    Compound(CompoundSelector),
    Combinator(Combinator),
}

/// A full selector: compound selectors joined by combinators.
///
/// `section > p.note` has parts
/// `[Compound(section), Combinator(Child), Compound(p.note)]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    /// Compounds and combinators, alternating; first and last are compounds.
    pub parts: Vec<SelectorPart>,
}

/// A comma-separated selector list. Matches when any member matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectorList {
    pub selectors: Vec<Selector>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_push() {
        let mut compound = CompoundSelector::new();
        compound.push(SelectorComponent::Type("div".into()));
        compound.push(SelectorComponent::Attribute {
            name: "uid".into(),
            value: Some("1".into()),
        });
        assert_eq!(compound.components.len(), 2);
    }

    #[test]
    fn defaults_are_empty() {
        assert!(Selector::default().parts.is_empty());
        assert!(SelectorList::default().selectors.is_empty());
    }
}
