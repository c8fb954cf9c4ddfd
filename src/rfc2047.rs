//! Module for decoding RFC 2047 strings
use encoding_rs::Encoding;

use super::results::{Error, ParsingResult};

/// Decode an RFC 2047 string (`s`) into a Rust String.
///
/// Will accept either "Q" encoding (RFC 2047 Section 4.2) or
/// "B" encoding (BASE64)
pub fn decode_rfc2047(s: &str) -> Option<String> {
    let parts: Vec<&str> = s.split('?').collect();
    if parts.len() != 5 || parts[0] != "=" || parts[4] != "=" {
        return None;
    }

    // RFC 2231 allows a language suffix on the charset: `utf-8*en`
    let charset = parts[1].split('*').next().unwrap_or("").to_ascii_lowercase();
    let encoding = parts[2].to_ascii_lowercase();
    let content = parts[3];

    let bytes = match &encoding[..] {
        "q" => decode_q_encoding(content),
        "b" => decode_base64(content.as_bytes()),
        _ => return None,
    };

    // XXX: Relies on WHATWG labels, rather than MIME labels for
    // charset. Consider adding mapping upstream.
    let decoder = Encoding::for_label(charset.as_bytes());

    match (bytes, decoder) {
        (Ok(b), Some(d)) => {
            let (text, _, _) = d.decode(&b);
            Some(text.into_owned())
        }
        _ => None,
    }
}

/// Decode every encoded word found in an unstructured header value.
///
/// Words which fail to decode are left as they are. Whitespace separating
/// two encoded words is dropped, as RFC 2047 Section 6.2 requires.
pub fn decode_header_value(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut pending_space = String::new();
    let mut last_was_encoded = false;

    let mut rest = s;
    while !rest.is_empty() {
        let space_len = rest
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or_else(|| rest.len());
        if space_len > 0 {
            pending_space.push_str(&rest[..space_len]);
            rest = &rest[space_len..];
            continue;
        }

        let word_len = rest
            .find(|c: char| c == ' ' || c == '\t')
            .unwrap_or_else(|| rest.len());
        let word = &rest[..word_len];
        rest = &rest[word_len..];

        let decoded = if word.starts_with("=?") && word.ends_with("?=") {
            decode_rfc2047(word)
        } else {
            None
        };

        match decoded {
            Some(text) => {
                if !last_was_encoded {
                    result.push_str(&pending_space);
                }
                result.push_str(&text);
                last_was_encoded = true;
            }
            None => {
                result.push_str(&pending_space);
                result.push_str(word);
                last_was_encoded = false;
            }
        }
        pending_space.clear();
    }
    result.push_str(&pending_space);

    result
}

/// Decode the "Q" encoding used inside encoded words, where `_` stands
/// for a space.
pub fn decode_q_encoding(s: &str) -> ParsingResult<Vec<u8>> {
    let spaced: Vec<u8> = s
        .bytes()
        .map(|b| if b == b'_' { b' ' } else { b })
        .collect();
    decode_quoted_printable(&spaced)
}

/// Decode quoted-printable content (RFC 2045 Section 6.7).
///
/// Soft line breaks (`=` at the end of a line, CRLF or bare LF) are removed.
/// An `=` which is not followed by two hex digits is kept as it is.
pub fn decode_quoted_printable(input: &[u8]) -> ParsingResult<Vec<u8>> {
    let mut result = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let b = input[i];
        if b != b'=' {
            result.push(b);
            i += 1;
            continue;
        }

        match input.get(i + 1..i + 3) {
            Some(b"\r\n") => i += 3,
            _ if input.get(i + 1) == Some(&b'\n') => i += 2,
            Some(&[hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                let hex = [hi as char, lo as char].iter().collect::<String>();
                let value = u8::from_str_radix(&hex, 16)
                    .map_err(|e| Error::decode(format!("'{}' is not a hex number: {}", hex, e)))?;
                result.push(value);
                i += 3;
            }
            _ => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    Ok(result)
}

/// Decode BASE64 content, dropping line breaks and anything else outside
/// the BASE64 alphabet.
///
/// Padding is dropped and put back according to the length, so missing or
/// misplaced `=` is not an error. Only a leftover single character is.
pub fn decode_base64(input: &[u8]) -> ParsingResult<Vec<u8>> {
    let mut compact: Vec<u8> = input
        .iter()
        .cloned()
        .filter(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
        .collect();

    match compact.len() % 4 {
        1 => {
            return Err(Error::decode(format!(
                "invalid base64: {} characters leave one over",
                compact.len()
            )))
        }
        2 => compact.extend_from_slice(b"=="),
        3 => compact.push(b'='),
        _ => {}
    }

    base64::decode(&compact).map_err(|e| Error::decode(format!("invalid base64: {}", e)))
}
