//! Declarative element matchers.
//!
//! A [`Pattern`] covers the slice of CSS selector syntax the extraction
//! tables need (tag, attribute presence/equality/substring, class, leaf
//! elements, one ancestor constraint) and can be built in `const` context,
//! so every selector table is a plain static.

use std::fmt;

use crate::traits::HostTree;

/// A single attribute condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrMatch {
    /// `[name]`
    Present(&'static str),
    /// `[name="value"]`
    Equals(&'static str, &'static str),
    /// `[name*="needle"]`
    Contains(&'static str, &'static str),
    /// `.class`
    Class(&'static str),
}

impl AttrMatch {
    fn matches<T: HostTree>(&self, tree: &T, node: &T::Node) -> bool {
        match self {
            AttrMatch::Present(name) => tree.attribute(node, name).is_some(),
            AttrMatch::Equals(name, value) => tree.attribute(node, name).as_deref() == Some(*value),
            AttrMatch::Contains(name, needle) => tree
                .attribute(node, name)
                .is_some_and(|v| v.contains(needle)),
            AttrMatch::Class(class) => tree
                .attribute(node, "class")
                .is_some_and(|v| v.split_whitespace().any(|c| c == *class)),
        }
    }
}

impl fmt::Display for AttrMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrMatch::Present(name) => write!(f, "[{name}]"),
            AttrMatch::Equals(name, value) => write!(f, "[{name}=\"{value}\"]"),
            AttrMatch::Contains(name, needle) => write!(f, "[{name}*=\"{needle}\"]"),
            AttrMatch::Class(class) => write!(f, ".{class}"),
        }
    }
}

/// Element matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub tag: Option<&'static str>,
    pub attrs: &'static [AttrMatch],
    /// Only match elements without element children.
    pub leaf: bool,
    /// Require an ancestor matching this pattern.
    pub within: Option<&'static Pattern>,
}

impl Pattern {
    pub const fn any() -> Self {
        Self {
            tag: None,
            attrs: &[],
            leaf: false,
            within: None,
        }
    }

    pub const fn tag(tag: &'static str) -> Self {
        Self {
            tag: Some(tag),
            ..Self::any()
        }
    }

    pub const fn attrs(attrs: &'static [AttrMatch]) -> Self {
        Self {
            attrs,
            ..Self::any()
        }
    }

    pub const fn leaf(self) -> Self {
        Self { leaf: true, ..self }
    }

    pub const fn within(self, ancestor: &'static Pattern) -> Self {
        Self {
            within: Some(ancestor),
            ..self
        }
    }

    pub fn matches<T: HostTree>(&self, tree: &T, node: &T::Node) -> bool {
        if let Some(tag) = self.tag {
            if !tree.tag_name(node).eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if !self.attrs.iter().all(|a| a.matches(tree, node)) {
            return false;
        }
        if self.leaf && !tree.children(node).is_empty() {
            return false;
        }
        match self.within {
            Some(ancestor) => {
                let mut current = tree.parent(node);
                while let Some(p) = current {
                    if ancestor.matches(tree, &p) {
                        return true;
                    }
                    current = tree.parent(&p);
                }
                false
            }
            None => true,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ancestor) = self.within {
            write!(f, "{ancestor} ")?;
        }
        match self.tag {
            Some(tag) => write!(f, "{tag}")?,
            None if self.attrs.is_empty() => write!(f, "*")?,
            None => {}
        }
        for attr in self.attrs {
            write!(f, "{attr}")?;
        }
        if self.leaf {
            write!(f, ":leaf")?;
        }
        Ok(())
    }
}
