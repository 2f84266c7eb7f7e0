pub mod connection;
pub mod control;
pub mod dn;
pub mod error;
pub mod escape;
pub mod rdn;
mod scan;
pub mod schema;
pub mod search;
pub mod url;

pub use control::ControlValue;
pub use dn::Dn;
pub use error::{CoreError, RdnDefect, UrlField};
pub use rdn::{Rdn, RdnPart};
pub use schema::{OidLookup, SchemaCache};
pub use url::{LdapUrl, Protocol};
