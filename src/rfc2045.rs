//! Parameterised header values in the style of RFC 2045, such as
//! `multipart/mixed; boundary="b1"` or `attachment; filename=report.pdf`.
use super::rfc5322::Rfc5322Parser;

use std::collections::HashMap;

/// Parser over a parameterised header value.
pub struct Rfc2045Parser<'s> {
    parser: Rfc5322Parser<'s>,
}

impl<'s> Rfc2045Parser<'s> {
    pub fn new(s: &'s str) -> Rfc2045Parser<'s> {
        Rfc2045Parser {
            parser: Rfc5322Parser::new(s),
        }
    }

    /// A parameter name: anything printable but the RFC 2045 tspecials.
    /// `*` is allowed so RFC 2231 names like `filename*0*` come through.
    fn consume_attribute(&mut self) -> Option<String> {
        let attribute = self.parser.consume_while(|c| match c {
            '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']'
            | '?' | '=' => false,
            '!'..='~' => true,
            _ => false,
        });

        if attribute.is_empty() {
            None
        } else {
            Some(attribute.to_ascii_lowercase())
        }
    }

    fn skip_to_separator(&mut self) {
        self.parser.consume_while(|c| c != ';');
    }

    /// Parse one `name=value` pair, leaving the parser on the following
    /// `;` or at the end of input.
    ///
    /// Unquoted values run up to the `;` since plenty of mailers send file
    /// names with spaces in them unquoted. Anything else after a quoted
    /// value is dropped.
    fn consume_parameter(&mut self) -> Option<(String, String)> {
        let attribute = self.consume_attribute();
        self.parser.consume_linear_whitespace();
        if self.parser.peek() != Some('=') {
            self.skip_to_separator();
            return None;
        }
        self.parser.consume_char();
        self.parser.consume_linear_whitespace();

        let value = if self.parser.peek() == Some('"') {
            let quoted = self.parser.consume_quoted_string();
            self.skip_to_separator();
            quoted
        } else {
            Some(self.parser.consume_while(|c| c != ';').trim_end().to_string())
        };

        match (attribute, value) {
            (Some(attribute), Some(value)) => Some((attribute, value)),
            _ => None,
        }
    }

    /// Split the input into its leading value and its parameters, keyed by
    /// lowercased name. Bare words and empty trailing `;` are ignored.
    pub fn consume_all(&mut self) -> (String, HashMap<String, String>) {
        let value = self.parser.consume_while(|c| c != ';').trim().to_string();

        let mut params = HashMap::new();
        while self.parser.consume_char().is_some() {
            self.parser.consume_linear_whitespace();
            if self.parser.eof() {
                break;
            }
            if let Some((attribute, value)) = self.consume_parameter() {
                params.insert(attribute, value);
            }
        }

        (value, params)
    }
}
