use crate::base::neterror::NetError;
use http::header::{HeaderName, HeaderValue};

/// Case-preserving, insertion-ordered header list for outbound requests.
///
/// Names are compared case-insensitively: a later insert with the same
/// name replaces the earlier value in place instead of appending a
/// duplicate. The original casing of the first insert is kept on the wire.
#[derive(Debug, Clone, Default)]
pub struct HeaderList {
    /// Headers as (original_name, value) pairs
    headers: Vec<(String, String)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Insert header, validating name and value the way `http` does.
    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| NetError::InvalidHeader)?;
        HeaderValue::from_str(value.trim()).map_err(|_| NetError::InvalidHeader)?;

        let name = name.trim();
        let value = value.trim().to_string();

        // Update existing (case-insensitive match)
        if let Some((_, v)) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            *v = value;
        } else {
            self.headers.push((name.to_string(), value));
        }
        Ok(())
    }

    /// Insert a raw `Name: value` line.
    ///
    /// The name is everything before the first `:`.
    pub fn insert_line(&mut self, line: &str) -> Result<(), NetError> {
        let (name, value) = line.split_once(':').ok_or(NetError::InvalidHeader)?;
        self.insert(name, value)
    }

    /// Get header value (case-insensitive lookup).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get all headers as-is with original casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// Convert a header name to title case, word by word around `-`.
pub fn title_case(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars: Vec<char> = word.chars().collect();
            if let Some(first) = chars.first_mut() {
                *first = first.to_ascii_uppercase();
            }
            for c in chars.iter_mut().skip(1) {
                *c = c.to_ascii_lowercase();
            }
            chars.into_iter().collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}
