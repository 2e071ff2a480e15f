//! HTTP header types

use serde::{Deserialize, Serialize};

/// Name of the header carrying bearer credentials.
pub const AUTHORIZATION: &str = "Authorization";

/// A single HTTP header with name and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// The header name (e.g., "Content-Type")
    pub name: String,
    /// The header value (e.g., "application/json")
    pub value: String,
}

impl Header {
    /// Creates a new header.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates an `Authorization: Bearer <token>` header.
    #[must_use]
    pub fn bearer(token: &str) -> Self {
        Self::new(AUTHORIZATION, format!("Bearer {token}"))
    }
}

/// An ordered collection of HTTP headers with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers {
    items: Vec<Header>,
}

impl Headers {
    /// Creates an empty header collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Adds a header, keeping any existing header with the same name.
    pub fn add(&mut self, header: Header) {
        self.items.push(header);
    }

    /// Sets a header, replacing every existing header with the same name.
    pub fn set(&mut self, header: Header) {
        self.remove(&header.name);
        self.items.push(header);
    }

    /// Removes all headers with the given name.
    pub fn remove(&mut self, name: &str) {
        self.items.retain(|h| !h.name.eq_ignore_ascii_case(name));
    }

    /// Returns the value of the first header with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Returns an iterator over all headers.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.items.iter()
    }

    /// Returns the number of headers.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len is not const in stable
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty is not const in stable
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<T: IntoIterator<Item = Header>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_replaces_case_insensitively() {
        let mut headers = Headers::new();
        headers.add(Header::new("authorization", "Bearer old"));
        headers.add(Header::new("Accept", "application/json"));
        headers.set(Header::bearer("new"));

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("AUTHORIZATION"), Some("Bearer new"));
    }

    #[test]
    fn test_remove() {
        let mut headers: Headers = [Header::new("X-Debug", "1")].into_iter().collect();
        headers.remove("x-debug");
        assert!(headers.is_empty());
    }
}
