//! URI and identifier-binding derivation for resource descriptors.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::ResourceError;
use crate::name::ResourceName;
use crate::request::{Params, ResourceId};
use crate::verb::Cardinality;

/// Bytes escaped in a URI path segment: everything except ASCII
/// alphanumerics and `-._~`.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Addressing information derived from a name and an id list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    pub uri: String,
    pub params: Params,
    pub cardinality: Cardinality,
}

impl ResourcePath {
    /// Walks the name's segments, appending `/segment` and, when an id was
    /// supplied at that position, `/id` to `prefix`.
    ///
    /// Segments and ids are percent-encoded in the URI; `params` keeps the
    /// ids as given.
    ///
    /// With `N` segments, `N - 1` ids address a collection and `N` ids
    /// address a member.
    ///
    /// # Errors
    ///
    /// [`ResourceError::TooManyIdentifiers`] above `N` ids and
    /// [`ResourceError::TooFewIdentifiers`] below `N - 1`.
    pub fn derive(
        prefix: &str,
        name: &ResourceName,
        ids: &[ResourceId],
    ) -> Result<Self, ResourceError> {
        let depth = name.depth();

        let cardinality = if ids.len() == depth {
            Cardinality::Member
        } else if ids.len() + 1 == depth {
            Cardinality::Collection
        } else if ids.len() > depth {
            return Err(ResourceError::TooManyIdentifiers {
                resource: name.to_string(),
                expected: depth,
                provided: ids.len(),
            });
        } else {
            return Err(ResourceError::TooFewIdentifiers {
                resource: name.to_string(),
                expected: depth - 1,
                provided: ids.len(),
            });
        };

        let mut uri = prefix.to_string();
        let mut params = Params::new();

        for (idx, segment) in name.segments().iter().enumerate() {
            uri.push('/');
            uri.extend(utf8_percent_encode(segment, SEGMENT));

            if let Some(id) = ids.get(idx) {
                uri.push('/');
                uri.extend(utf8_percent_encode(id.as_str(), SEGMENT));
                params.insert(segment.clone(), id.to_string());
            }
        }

        tracing::debug!(resource = %name, %uri, "URI derived");

        Ok(Self {
            uri,
            params,
            cardinality,
        })
    }
}
