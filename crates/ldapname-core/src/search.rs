use ldap3::Scope;
use strum::{Display, EnumString};

use crate::connection::ConnectionSettings;
use crate::dn::Dn;

/// Search scope as written in an LDAP URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum SearchScope {
    #[strum(serialize = "base")]
    Base,
    #[strum(serialize = "one")]
    OneLevel,
    #[strum(serialize = "sub")]
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

impl From<Scope> for SearchScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Base => SearchScope::Base,
            Scope::OneLevel => SearchScope::OneLevel,
            Scope::Subtree => SearchScope::Subtree,
        }
    }
}

/// The parameters of a search, as needed to express it as an LDAP URL.
#[derive(Debug, Clone)]
pub struct SearchSpec {
    pub connection: ConnectionSettings,
    pub base: Dn,
    pub scope: Scope,
    pub filter: String,
    pub attributes: Vec<String>,
}

impl SearchSpec {
    /// A base-scope search for every attribute of `base`.
    pub fn new(connection: ConnectionSettings, base: Dn) -> Self {
        Self {
            connection,
            base,
            scope: Scope::Base,
            filter: "(objectClass=*)".to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::TlsMode;

    #[test]
    fn test_scope_tokens() {
        assert_eq!(SearchScope::Base.to_string(), "base");
        assert_eq!(SearchScope::OneLevel.to_string(), "one");
        assert_eq!(SearchScope::Subtree.to_string(), "sub");
        assert_eq!("sub".parse::<SearchScope>().unwrap(), SearchScope::Subtree);
        assert!("SUB".parse::<SearchScope>().is_err());
        assert!("subtree".parse::<SearchScope>().is_err());
    }

    #[test]
    fn test_scope_conversion_round_trip() {
        for scope in [SearchScope::Base, SearchScope::OneLevel, SearchScope::Subtree] {
            assert_eq!(SearchScope::from(Scope::from(scope)), scope);
        }
    }

    #[test]
    fn test_search_spec_builder() {
        let connection = ConnectionSettings::new("localhost", 389, TlsMode::None);
        let search = SearchSpec::new(connection, Dn::parse("dc=example,dc=com").unwrap())
            .with_scope(Scope::OneLevel)
            .with_filter("(cn=a*)")
            .with_attributes(["cn", "mail"]);
        assert_eq!(SearchScope::from(search.scope), SearchScope::OneLevel);
        assert_eq!(search.filter, "(cn=a*)");
        assert_eq!(search.attributes, vec!["cn", "mail"]);
    }
}
