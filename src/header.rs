use std::slice::Iter;

use super::rfc2047::decode_header_value;

/// Trait for converting from RFC822 Header values into
/// Rust types.
pub trait FromHeader: Sized {
    /// Parse the `value` of the header.
    ///
    /// Returns None if the value failed to be parsed
    fn from_header(value: &str) -> Option<Self>;
}

impl FromHeader for String {
    fn from_header(value: &str) -> Option<String> {
        Some(value.to_string())
    }
}

/// Represents an RFC 822 Header
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Header {
    /// The name of this header
    pub name: String,
    value: String,
}

impl Header {
    /// Creates a new Header for the given `name` and `value`
    pub fn new(name: String, value: String) -> Header {
        Header { name, value }
    }

    /// The unfolded value, exactly as it appeared in the message.
    pub fn raw_value(&self) -> &str {
        &self.value
    }

    /// The value with any RFC 2047 encoded words decoded.
    pub fn decoded_value(&self) -> String {
        decode_header_value(&self.value)
    }

    /// Get the value represented by this header, as parsed
    /// into whichever type `T`
    pub fn get_value<T: FromHeader>(&self) -> Option<T> {
        FromHeader::from_header(&self.value)
    }
}

/// A collection of Headers, kept in the order they appeared.
///
/// Lookups by name are case-insensitive, as header field names are.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    headers: Vec<Header>,
}

impl HeaderMap {
    pub fn new() -> HeaderMap {
        HeaderMap {
            headers: Vec::new(),
        }
    }

    /// Adds a header to the collection
    pub fn insert(&mut self, header: Header) {
        self.headers.push(header);
    }

    /// Get an Iterator over the collection of headers.
    pub fn iter(&self) -> Iter<Header> {
        self.headers.iter()
    }

    /// Get the first header called `name`
    pub fn get(&self, name: &str) -> Option<&Header> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
    }

    /// Parse the first header called `name` into `T`
    pub fn get_value<T: FromHeader>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|h| h.get_value())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLE_HEADERS: [(&str, &str); 4] = [
        ("Test", "Value"),
        ("Test", "Value 2"),
        ("Test-2", "Value 3"),
        ("Test-Multiline", "Foo Bar"),
    ];

    fn make_sample_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        for &(name, value) in SAMPLE_HEADERS.iter() {
            headers.insert(Header::new(name.to_string(), value.to_string()));
        }
        headers
    }

    #[test]
    fn test_string_get_value() {
        let header = Header::new("Test".to_string(), "Value".to_string());
        let string_value: String = header.get_value().unwrap();
        assert_eq!(string_value, "Value".to_string());
    }

    #[test]
    fn test_decoded_value() {
        let header = Header::new(
            "Subject".to_string(),
            "=?utf-8?q?Quarterly_report?= attached".to_string(),
        );
        assert_eq!(header.decoded_value(), "Quarterly report attached");
        assert_eq!(header.raw_value(), "=?utf-8?q?Quarterly_report?= attached");
    }

    #[test]
    fn test_header_map_len() {
        let headers = make_sample_headers();
        assert_eq!(headers.len(), SAMPLE_HEADERS.len());
        assert!(!headers.is_empty());
        assert!(HeaderMap::new().is_empty());
    }

    #[test]
    fn test_header_map_get_is_case_insensitive_and_first_wins() {
        let headers = make_sample_headers();
        assert_eq!(headers.get("test").unwrap().raw_value(), "Value");
        assert_eq!(headers.get("TEST-2").unwrap().raw_value(), "Value 3");
        assert!(headers.get("Missing").is_none());
    }

    #[test]
    fn test_header_map_iter_keeps_order() {
        let headers = make_sample_headers();
        let names: Vec<&str> = headers.iter().map(|h| &h.name[..]).collect();
        assert_eq!(names, vec!["Test", "Test", "Test-2", "Test-Multiline"]);
    }
}
