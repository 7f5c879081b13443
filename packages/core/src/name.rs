//! Dotted names with validated Unicode identifier components.
//!
//! Class names and logical resource names share this form:
//! `MyApp.view.Index`, `hearth.class.Base`.

use std::fmt;
use std::str::FromStr;

/// Errors related to name parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// A component is not a valid Unicode identifier.
    #[error("invalid name component '{component}' at position {position}: {message}")]
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },
    /// The name string is empty.
    #[error("name must not be empty")]
    Empty,
}

/// A validated dotted name.
///
/// Components must be valid Unicode identifiers (per UAX#31), separated by
/// `.`. Unlike paths, empty components are rejected rather than normalized:
/// `a..b` is a typo, not a name.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name {
    components: Vec<String>,
}

impl Name {
    /// Parse a dotted name, validating components.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hearth_core::Name;
    ///
    /// let name = Name::parse("MyApp.view.Index").unwrap();
    /// assert_eq!(name.len(), 3);
    /// assert_eq!(name.last(), "Index");
    /// ```
    pub fn parse(s: &str) -> Result<Self, NameError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NameError::Empty);
        }

        let components: Vec<String> = s.split('.').map(|c| c.to_string()).collect();
        for (i, component) in components.iter().enumerate() {
            Self::validate_component(component, i)?;
        }

        Ok(Name { components })
    }

    /// Build a name from a literal known to be valid, such as the built-in
    /// class names. Components are split on `.` but not validated.
    pub fn from_static(s: &'static str) -> Self {
        Name {
            components: s.split('.').map(str::to_string).collect(),
        }
    }

    /// Validate a single component.
    fn validate_component(component: &str, position: usize) -> Result<(), NameError> {
        let mut chars = component.chars();
        let Some(first) = chars.next() else {
            return Err(NameError::InvalidComponent {
                component: component.to_string(),
                position,
                message: "empty component".to_string(),
            });
        };

        // First char: XID_Start or underscore followed by XID_Continue
        let valid_start = unicode_ident::is_xid_start(first)
            || (first == '_'
                && chars
                    .clone()
                    .next()
                    .is_some_and(unicode_ident::is_xid_continue));

        if !valid_start {
            return Err(NameError::InvalidComponent {
                component: component.to_string(),
                position,
                message: "must start with a letter or underscore followed by letter/digit"
                    .to_string(),
            });
        }

        for c in chars {
            if !unicode_ident::is_xid_continue(c) {
                return Err(NameError::InvalidComponent {
                    component: component.to_string(),
                    position,
                    message: format!("invalid character '{}' in identifier", c),
                });
            }
        }

        Ok(())
    }

    /// Get the number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Names are never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Iterate over components.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    /// The final component (`Index` in `MyApp.view.Index`).
    pub fn last(&self) -> &str {
        self.components.last().map(String::as_str).unwrap_or_default()
    }

    /// Check if this name starts with the given component sequence.
    pub fn has_prefix(&self, prefix: &Name) -> bool {
        prefix.components.len() <= self.components.len()
            && prefix.components == self.components[..prefix.components.len()]
    }

    /// Components after `prefix`, or `None` when the prefix doesn't match.
    pub fn strip_prefix(&self, prefix: &Name) -> Option<&[String]> {
        if self.has_prefix(prefix) {
            Some(&self.components[prefix.components.len()..])
        } else {
            None
        }
    }

    /// Join components with a separator other than `.`.
    pub fn join_with(&self, separator: &str) -> String {
        self.components.join(separator)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("."))
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::parse(s)
    }
}

impl TryFrom<&str> for Name {
    type Error = NameError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Name::parse(s)
    }
}

impl TryFrom<String> for Name {
    type Error = NameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Name::parse(&s)
    }
}

/// Anything that can name a class or resource.
///
/// Implemented for string types (parsed and validated) and for `Name`
/// itself, so registry operations accept either.
pub trait IntoName {
    fn into_name(self) -> Result<Name, NameError>;
}

impl IntoName for Name {
    fn into_name(self) -> Result<Name, NameError> {
        Ok(self)
    }
}

impl IntoName for &Name {
    fn into_name(self) -> Result<Name, NameError> {
        Ok(self.clone())
    }
}

impl IntoName for &str {
    fn into_name(self) -> Result<Name, NameError> {
        Name::parse(self)
    }
}

impl IntoName for String {
    fn into_name(self) -> Result<Name, NameError> {
        Name::parse(&self)
    }
}

impl IntoName for &String {
    fn into_name(self) -> Result<Name, NameError> {
        Name::parse(self)
    }
}

/// Macro for creating names from literals.
///
/// # Example
///
/// ```rust
/// use hearth_core::name;
///
/// let n = name!("MyApp.store.Users");
/// assert_eq!(n.len(), 3);
/// ```
#[macro_export]
macro_rules! name {
    ($s:expr) => {
        $crate::Name::parse($s).expect("invalid name literal")
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_names() {
        assert_eq!(Name::parse("Base").unwrap().len(), 1);
        assert_eq!(Name::parse("MyApp.view").unwrap().len(), 2);
        assert_eq!(Name::parse("MyApp.view.Index").unwrap().len(), 3);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(name!("  MyApp.view.Index "), name!("MyApp.view.Index"));
    }

    #[test]
    fn empty_names_rejected() {
        assert_eq!(Name::parse(""), Err(NameError::Empty));
        assert_eq!(Name::parse("   "), Err(NameError::Empty));
    }

    #[test]
    fn empty_components_rejected() {
        let err = Name::parse("MyApp..Index").unwrap_err();
        assert!(err.to_string().contains("empty component"));
        assert!(Name::parse(".MyApp").is_err());
        assert!(Name::parse("MyApp.").is_err());
    }

    #[test]
    fn invalid_components_rejected() {
        assert!(Name::parse("my-app.view").is_err());
        assert!(Name::parse("MyApp.1view").is_err());
        assert!(Name::parse("MyApp/view").is_err());
        assert!(Name::parse("_").is_err());
    }

    #[test]
    fn unicode_identifiers_allowed() {
        assert_eq!(Name::parse("アプリ.view.名前").unwrap().len(), 3);
    }

    #[test]
    fn prefix_handling() {
        let n = name!("MyApp.view.Index");
        assert!(n.has_prefix(&name!("MyApp")));
        assert!(n.has_prefix(&name!("MyApp.view")));
        assert!(!n.has_prefix(&name!("Other")));
        assert_eq!(
            n.strip_prefix(&name!("MyApp")).unwrap(),
            &["view".to_string(), "Index".to_string()]
        );
    }

    #[test]
    fn display_and_join() {
        let n = name!("MyApp.view.Index");
        assert_eq!(n.to_string(), "MyApp.view.Index");
        assert_eq!(n.join_with("/"), "MyApp/view/Index");
        assert_eq!(n.last(), "Index");
    }

    #[test]
    fn from_str_and_try_from() {
        let a: Name = "A.B".parse().unwrap();
        let b = Name::try_from("A.B").unwrap();
        assert_eq!(a, b);
        assert_eq!("A.B".into_name().unwrap(), b);
        assert_eq!((&b).into_name().unwrap(), a);
    }
}
