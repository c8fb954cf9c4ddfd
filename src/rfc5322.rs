//! Module with helpers for dealing with RFC 5322

use super::header::{Header, HeaderMap};

trait Rfc5322Character {
    /// Is considered to be field text as defined by RFC 5322 Section 3.6.8
    fn is_ftext(&self) -> bool;
}

impl Rfc5322Character for char {
    fn is_ftext(&self) -> bool {
        match *self {
            '!'..='9' | ';'..='~' => true,
            _ => false,
        }
    }
}

/// Returns true if `line` starts like a header field: a field name of
/// `ftext` characters, optional linear whitespace, then a `:`.
pub fn is_field_line(line: &[u8]) -> bool {
    let name_len = line
        .iter()
        .take_while(|&&b| (b as char).is_ftext())
        .count();
    if name_len == 0 {
        return false;
    }
    line[name_len..]
        .iter()
        .find(|&&b| b != b' ' && b != b'\t')
        .map_or(false, |&b| b == b':')
}

/// RFC 5322 base parser for the header section of a message, and for
/// the `quoted-string` values that appear within header values.
///
/// Both CRLF and bare LF line endings are accepted, since mbox archives
/// are usually written with the line endings of the host that made them.
pub struct Rfc5322Parser<'s> {
    s: &'s str,
    pos: usize,
}

impl<'s> Rfc5322Parser<'s> {
    /// Make a new parser, initialized with the given string.
    pub fn new(source: &'s str) -> Rfc5322Parser<'s> {
        Rfc5322Parser { s: source, pos: 0 }
    }

    /// Consume every header in the input.
    ///
    /// Lines which cannot be parsed as a header are dropped.
    pub fn consume_headers(&mut self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        while !self.eof() {
            match self.consume_header() {
                Some(header) => headers.insert(header),
                None => self.skip_line(),
            }
        }
        headers
    }

    /// Consume a header from the input.
    ///
    /// A header is defined as:
    ///
    /// `ftext = "!".."9" / ";".."~"
    /// field-name = 1*ftext
    /// field = field-name *LWSP ":" unstructured`
    pub fn consume_header(&mut self) -> Option<Header> {
        let last_pos = self.pos;
        // Parse field-name
        let field_name = self.consume_while(|c| c.is_ftext());
        self.consume_linear_whitespace();
        if field_name.is_empty() || self.peek() != Some(':') {
            // Fail to parse if we didn't see a field, we're at the end of input
            // or we haven't just seen a ":"
            self.pos = last_pos;
            None
        } else {
            // Consume the ":" and any leading whitespace
            self.consume_char();
            self.consume_linear_whitespace();
            let field_value = self.consume_unstructured();
            self.consume_line_break();

            Some(Header::new(field_name.to_string(), field_value))
        }
    }

    /// Consume an unstructured value, unfolding any continuation lines.
    ///
    /// Unfolding removes the line break only; the whitespace that starts
    /// the continuation line is kept.
    pub fn consume_unstructured(&mut self) -> String {
        let mut result = String::new();
        loop {
            result.push_str(self.consume_while(|c| c != '\r' && c != '\n'));
            if !self.consume_folding_whitespace() {
                break;
            }
        }
        result
    }

    /// Consume folding whitespace.
    ///
    /// This is a line break followed by a space or tab. Only the line
    /// break is consumed.
    ///
    /// Returns true if whitespace was consumed
    pub fn consume_folding_whitespace(&mut self) -> bool {
        let current_position = self.pos;
        if self.consume_line_break() {
            match self.peek() {
                Some(' ') | Some('\t') => return true,
                _ => {}
            }
        }
        // Reset back if we didn't see a folding whitespace
        self.pos = current_position;
        false
    }

    /// Consume a single CRLF or LF, returning true if there was one.
    pub fn consume_line_break(&mut self) -> bool {
        let rest = &self.s[self.pos..];
        if rest.starts_with("\r\n") {
            self.pos += 2;
            true
        } else if rest.starts_with('\n') {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_line(&mut self) {
        self.consume_while(|c| c != '\n');
        self.consume_char();
    }

    /// Consume a quoted string from the input
    pub fn consume_quoted_string(&mut self) -> Option<String> {
        if self.peek() != Some('"') {
            // Fail if we were called wrong
            return None;
        }

        let mut quoted_string = String::new();
        let mut inside_escape = false;
        let mut terminated = false;
        // Consume the leading "
        self.consume_char();
        while !terminated {
            match self.peek() {
                None => break,
                Some('\\') if !inside_escape => {
                    // If we were not already being escaped, consume the
                    // escape character and mark that we're being escaped.
                    self.consume_char();
                    inside_escape = true;
                }
                Some('"') if !inside_escape => {
                    // If this is a DQUOTE and we haven't seen an escape character,
                    // consume it and mark that we should break from the loop
                    self.consume_char();
                    terminated = true;
                }
                Some(c) => {
                    quoted_string.push(c);
                    self.consume_char();
                    inside_escape = false;
                }
            }
        }

        if inside_escape || !terminated {
            // Return an error state if we're still expecting a character
            None
        } else {
            Some(quoted_string)
        }
    }

    /// Consume LWSP (Linear whitespace)
    pub fn consume_linear_whitespace(&mut self) {
        self.consume_while(|c| c == '\t' || c == ' ');
    }

    /// Consume a single character from the input.
    #[inline]
    pub fn consume_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume a set of characters, each passed to `test` until this function
    /// returns false.
    ///
    /// The position after calling this function will be pointing to the character
    /// which caused a false result from `test`.
    ///
    /// Returns the string of characters that returned true for the test function.
    #[inline]
    pub fn consume_while<F: Fn(char) -> bool>(&mut self, test: F) -> &'s str {
        let s = self.s;
        let start_pos = self.pos;
        while let Some(c) = self.peek() {
            if !test(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &s[start_pos..self.pos]
    }

    /// Peek at the current character.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.s[self.pos..].chars().next()
    }

    /// Returns true if we have reached the end of the input.
    #[inline]
    pub fn eof(&self) -> bool {
        self.pos >= self.s.len()
    }
}
