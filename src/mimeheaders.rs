use super::header::FromHeader;
use super::results::ParsingResult;
use super::rfc2045::Rfc2045Parser;
use super::rfc2047::{decode_base64, decode_header_value, decode_quoted_printable};

use encoding_rs::{Encoding, UTF_8};
use std::collections::HashMap;

/// Content-Type string, major/minor as the first and second elements
/// respectively.
pub type MimeContentType = (String, String);

/// Special header type for the Content-Type header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeContentTypeHeader {
    /// The content type presented by this header, lowercased
    pub content_type: MimeContentType,
    /// Parameters of this header
    pub params: HashMap<String, String>,
}

impl MimeContentTypeHeader {
    /// The type assumed for a part with no (or an unreadable) Content-Type.
    pub fn text_plain() -> MimeContentTypeHeader {
        MimeContentTypeHeader {
            content_type: ("text".to_string(), "plain".to_string()),
            params: HashMap::new(),
        }
    }

    pub fn is(&self, major: &str, minor: &str) -> bool {
        self.content_type.0 == major && self.content_type.1 == minor
    }

    /// Get a parameter, with any RFC 2231 or RFC 2047 encoding undone.
    pub fn param(&self, name: &str) -> Option<String> {
        decoded_param(&self.params, name)
    }
}

impl FromHeader for MimeContentTypeHeader {
    fn from_header(value: &str) -> Option<MimeContentTypeHeader> {
        let mut parser = Rfc2045Parser::new(value);
        let (value, params) = parser.consume_all();

        let mime_parts: Vec<&str> = value.splitn(2, '/').collect();

        if mime_parts.len() == 2 && !mime_parts[0].is_empty() && !mime_parts[1].is_empty() {
            Some(MimeContentTypeHeader {
                content_type: (
                    mime_parts[0].trim().to_ascii_lowercase(),
                    mime_parts[1].trim().to_ascii_lowercase(),
                ),
                params,
            })
        } else {
            None
        }
    }
}

/// Special header type for the Content-Disposition header (RFC 2183).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeContentDisposition {
    /// `inline`, `attachment` or an extension token, lowercased
    pub disposition: String,
    /// Parameters of this header
    pub params: HashMap<String, String>,
}

impl MimeContentDisposition {
    pub fn is_attachment(&self) -> bool {
        self.disposition == "attachment"
    }

    /// Get a parameter, with any RFC 2231 or RFC 2047 encoding undone.
    pub fn param(&self, name: &str) -> Option<String> {
        decoded_param(&self.params, name)
    }
}

impl FromHeader for MimeContentDisposition {
    fn from_header(value: &str) -> Option<MimeContentDisposition> {
        let mut parser = Rfc2045Parser::new(value);
        let (disposition, params) = parser.consume_all();
        Some(MimeContentDisposition {
            disposition: disposition.to_ascii_lowercase(),
            params,
        })
    }
}

/// Special header type for the Content-Transfer-Encoding header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeContentTransferEncoding {
    /// Message content is not encoded in any way.
    Identity,
    /// Content transfered using the quoted-printable encoding.
    ///
    /// This encoding is defined in RFC 2045 Section 6.7
    QuotedPrintable,
    /// Content transfered as BASE64
    ///
    /// This encoding is defined in RFC 2045 Section 6.8
    Base64,
}

impl MimeContentTransferEncoding {
    /// Decode the input with this transfer encoding.
    ///
    /// Note that this will return a copy of the input's bytes if the
    /// transfer encoding is the Identity encoding.
    pub fn decode(&self, input: &[u8]) -> ParsingResult<Vec<u8>> {
        match *self {
            MimeContentTransferEncoding::Identity => Ok(input.to_vec()),
            MimeContentTransferEncoding::QuotedPrintable => decode_quoted_printable(input),
            MimeContentTransferEncoding::Base64 => decode_base64(input),
        }
    }
}

impl FromHeader for MimeContentTransferEncoding {
    fn from_header(value: &str) -> Option<MimeContentTransferEncoding> {
        let lower = value.trim().to_ascii_lowercase();
        match &lower[..] {
            "7bit" | "8bit" | "binary" => Some(MimeContentTransferEncoding::Identity),
            "quoted-printable" => Some(MimeContentTransferEncoding::QuotedPrintable),
            "base64" => Some(MimeContentTransferEncoding::Base64),
            _ => None,
        }
    }
}

/// Look up parameter `name`, joining RFC 2231 continuations
/// (`name*0`, `name*1*`, ...) and decoding extended values
/// (`name*=charset'lang'percent%20encoded`).
///
/// Plain values have RFC 2047 encoded words decoded, which RFC 2047
/// forbids but which many mailers send for file names anyway.
pub fn decoded_param(params: &HashMap<String, String>, name: &str) -> Option<String> {
    if let Some(value) = params.get(&format!("{}*", name)) {
        let (charset, rest) = split_charset(value);
        return Some(decode_charset(charset, &percent_decode(rest)));
    }

    let mut raw = Vec::new();
    let mut charset = None;
    for index in 0.. {
        if let Some(segment) = params.get(&format!("{}*{}*", name, index)) {
            let segment = if index == 0 {
                let (cs, rest) = split_charset(segment);
                charset = cs;
                rest
            } else {
                segment.as_str()
            };
            raw.extend(percent_decode(segment));
        } else if let Some(segment) = params.get(&format!("{}*{}", name, index)) {
            raw.extend_from_slice(segment.as_bytes());
        } else {
            break;
        }
    }
    if !raw.is_empty() {
        return Some(decode_charset(charset, &raw));
    }

    params.get(name).map(|v| decode_header_value(v))
}

// `charset'language'rest`, where either may be empty.
fn split_charset(value: &str) -> (Option<&str>, &str) {
    let mut parts = value.splitn(3, '\'');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(charset), Some(_), Some(rest)) => {
            let charset = if charset.is_empty() { None } else { Some(charset) };
            (charset, rest)
        }
        _ => (None, value),
    }
}

fn decode_charset(charset: Option<&str>, bytes: &[u8]) -> String {
    let encoding = charset
        .and_then(|cs| Encoding::for_label(cs.trim().as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes.get(i..i + 3) {
            Some(&[b'%', hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                let hex = [hi as char, lo as char].iter().collect::<String>();
                result.push(u8::from_str_radix(&hex, 16).unwrap_or(b'?'));
                i += 3;
            }
            _ => {
                result.push(bytes[i]);
                i += 1;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;

    use std::collections::HashMap;

    struct ContentTypeParseTestResult<'a> {
        major_type: &'a str,
        minor_type: &'a str,
        params: Vec<(&'a str, &'a str)>,
    }

    struct ContentTypeParseTest<'a> {
        input: &'a str,
        result: Option<ContentTypeParseTestResult<'a>>,
    }

    #[test]
    fn test_content_type_parse() {
        let tests = vec![
            ContentTypeParseTest {
                input: "text/plain",
                result: Some(ContentTypeParseTestResult {
                    major_type: "text",
                    minor_type: "plain",
                    params: vec![],
                }),
            },
            ContentTypeParseTest {
                input: "text/plain; charset=us-ascii",
                result: Some(ContentTypeParseTestResult {
                    major_type: "text",
                    minor_type: "plain",
                    params: vec![("charset", "us-ascii")],
                }),
            },
            ContentTypeParseTest {
                input: "Multipart/Mixed; boundary=\"==XYZ==\"",
                result: Some(ContentTypeParseTestResult {
                    major_type: "multipart",
                    minor_type: "mixed",
                    params: vec![("boundary", "==XYZ==")],
                }),
            },
            ContentTypeParseTest {
                input: "application/octet-stream; charset=us-ascii; param=value",
                result: Some(ContentTypeParseTestResult {
                    major_type: "application",
                    minor_type: "octet-stream",
                    params: vec![("charset", "us-ascii"), ("param", "value")],
                }),
            },
            ContentTypeParseTest {
                input: "garbage",
                result: None,
            },
        ];

        for test in tests.into_iter() {
            let header = Header::new("Content-Type".to_string(), test.input.to_string());
            let parsed_header: Option<MimeContentTypeHeader> = header.get_value();

            let result = match (parsed_header, test.result) {
                (Some(given_result), Some(expected_result)) => {
                    let (given_major, given_minor) = given_result.content_type;
                    let mut expected_params = HashMap::new();
                    for &(param_name, param_value) in expected_result.params.iter() {
                        expected_params.insert(param_name.to_string(), param_value.to_string());
                    }
                    given_major == expected_result.major_type
                        && given_minor == expected_result.minor_type
                        && given_result.params == expected_params
                }
                (None, None) => true,
                (_, _) => false,
            };
            assert!(result, "Content-Type parse: '{}'", test.input);
        }
    }

    #[test]
    fn test_content_disposition_parse() {
        let header = Header::new(
            "Content-Disposition".to_string(),
            "ATTACHMENT; filename=\"report.pdf\"".to_string(),
        );
        let disposition: MimeContentDisposition = header.get_value().unwrap();
        assert!(disposition.is_attachment());
        assert_eq!(disposition.param("filename"), Some("report.pdf".to_string()));
        assert_eq!(disposition.param("size"), None);
    }

    #[test]
    fn test_decoded_param() {
        struct ParamTest<'s> {
            params: Vec<(&'s str, &'s str)>,
            expected: Option<&'s str>,
            name: &'s str,
        }

        let tests = vec![
            ParamTest {
                params: vec![("filename", "plain.txt")],
                expected: Some("plain.txt"),
                name: "Plain value",
            },
            ParamTest {
                params: vec![("filename", "=?utf-8?b?Y2Fmw6kucGRm?=")],
                expected: Some("café.pdf"),
                name: "RFC 2047 encoded value",
            },
            ParamTest {
                params: vec![("filename*", "utf-8''caf%C3%A9.txt"), ("filename", "cafe.txt")],
                expected: Some("café.txt"),
                name: "Extended value wins over plain",
            },
            ParamTest {
                params: vec![("filename*", "iso-8859-1'fr'caf%E9.txt")],
                expected: Some("café.txt"),
                name: "Extended value in another charset",
            },
            ParamTest {
                params: vec![
                    ("filename*0*", "utf-8''long%20"),
                    ("filename*1", "file"),
                    ("filename*2*", "name.txt"),
                ],
                expected: Some("long filename.txt"),
                name: "Continuations",
            },
            ParamTest {
                params: vec![("name", "other")],
                expected: None,
                name: "Missing",
            },
        ];

        for test in tests.into_iter() {
            let params: HashMap<String, String> = test
                .params
                .iter()
                .map(|&(k, v)| (k.to_string(), v.to_string()))
                .collect();
            assert_eq!(
                decoded_param(&params, "filename").as_deref(),
                test.expected,
                "{}",
                test.name
            );
        }
    }

    #[test]
    fn test_content_transfer_parse() {
        let tests = vec![
            ("base64", Some(MimeContentTransferEncoding::Base64)),
            ("quoted-printable", Some(MimeContentTransferEncoding::QuotedPrintable)),
            ("7bit", Some(MimeContentTransferEncoding::Identity)),
            ("8bit", Some(MimeContentTransferEncoding::Identity)),
            ("binary", Some(MimeContentTransferEncoding::Identity)),
            // Check for case insensitivity
            ("BASE64", Some(MimeContentTransferEncoding::Base64)),
            // Check for fail case
            ("lkasjdl", None),
        ];

        for (test, expected) in tests.into_iter() {
            let header = Header::new("Content-Transfer-Encoding".to_string(), test.to_string());
            let parsed: Option<MimeContentTransferEncoding> = header.get_value();
            assert_eq!(parsed, expected);
        }
    }

    struct ContentTransferDecodeTest<'s> {
        encoding: MimeContentTransferEncoding,
        input: &'s str,
        output: Option<Vec<u8>>,
    }

    #[test]
    fn test_content_transfer_decode() {
        let tests = vec![
            ContentTransferDecodeTest {
                encoding: MimeContentTransferEncoding::Identity,
                input: "foo",
                output: Some(vec![102, 111, 111]),
            },
            ContentTransferDecodeTest {
                encoding: MimeContentTransferEncoding::QuotedPrintable,
                input: "foo=\r\nbar\r\nbaz",
                output: Some(vec![
                    102, 111, 111, 98, 97, 114, 13, 10, // foobar
                    98, 97, 122, // baz
                ]),
            },
            ContentTransferDecodeTest {
                encoding: MimeContentTransferEncoding::Base64,
                input: "Zm9vCmJhcgpi\r\nYXoKcXV4Cg==",
                output: Some(vec![
                    102, 111, 111, 10, // foo
                    98, 97, 114, 10, // bar
                    98, 97, 122, 10, // baz
                    113, 117, 120, 10, // qux
                ]),
            },
            // Bad base64 content
            ContentTransferDecodeTest {
                encoding: MimeContentTransferEncoding::Base64,
                input: "/?#",
                output: None,
            },
        ];

        for test in tests.into_iter() {
            let result = test.encoding.decode(test.input.as_bytes());
            assert_eq!(result.ok(), test.output);
        }
    }
}
