//! Dates as found in the `Date` header, e.g. `Wed, 01 Jan 2020 10:00:00 +0000`.
use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

use super::results::{Error, ParsingResult};
use super::rfc5322::Rfc5322Parser;

static DAYS_OF_WEEK: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

static MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

lazy_static! {
    static ref TZ_DATA: HashMap<&'static str, i32> = {
        let mut map = HashMap::new();
        map.insert("Z", 0); // Zulu
        map.insert("UT", 0);
        map.insert("UTC", 0);
        map.insert("GMT", 0);
        map.insert("PST", -28800); // UTC-8
        map.insert("PDT", -25200); // UTC-7
        map.insert("MST", -25200); // UTC-7
        map.insert("MDT", -21600); // UTC-6
        map.insert("CST", -21600); // UTC-6
        map.insert("CDT", -18000); // UTC-5
        map.insert("EST", -18000); // UTC-5
        map.insert("EDT", -14400); // UTC-4
        map
    };
}

/// Parser for RFC 822 dates, with the obsolete forms RFC 5322 section 4.3
/// still asks readers to accept.
///
/// The day of week is optional and is not checked against the date.
/// Seconds are optional. Two digit years are read as 19xx or 20xx. Zone
/// names are looked up in a table of the common US ones; an unknown or
/// missing zone is taken as UTC, the same as `-0000`. Anything after the
/// zone, typically a `(UTC)` style comment, is ignored.
pub struct Rfc822DateParser<'s> {
    parser: Rfc5322Parser<'s>,
}

impl<'s> Rfc822DateParser<'s> {
    pub fn new(s: &'s str) -> Rfc822DateParser<'s> {
        Rfc822DateParser {
            parser: Rfc5322Parser::new(s),
        }
    }

    fn consume_u32(&mut self) -> Option<u32> {
        self.parser.consume_while(|c| c.is_ascii_digit()).parse().ok()
    }

    fn consume_word(&mut self) -> &'s str {
        self.parser.consume_while(|c| c.is_ascii_alphabetic())
    }

    fn consume_time(&mut self) -> ParsingResult<(u32, u32, u32)> {
        let hour = self
            .consume_u32()
            .ok_or_else(|| Error::date("expected hour"))?;
        if self.parser.consume_char() != Some(':') {
            return Err(Error::date("expected ':' after hour"));
        }
        let minute = self
            .consume_u32()
            .ok_or_else(|| Error::date("expected minute"))?;

        let second = if self.parser.peek() == Some(':') {
            self.parser.consume_char();
            self.consume_u32()
                .ok_or_else(|| Error::date("expected second"))?
        } else {
            0
        };

        Ok((hour, minute, second))
    }

    fn consume_timezone_offset(&mut self) -> ParsingResult<i32> {
        let sign = match self.parser.peek() {
            Some('+') => 1,
            Some('-') => -1,
            _ => {
                let name = self.consume_word().to_ascii_uppercase();
                return Ok(TZ_DATA.get(&name[..]).cloned().unwrap_or(0));
            }
        };
        self.parser.consume_char();

        let digits = self.parser.consume_while(|c| c.is_ascii_digit());
        if digits.len() != 4 {
            return Err(Error::date(format!("invalid zone offset: {:?}", digits)));
        }
        let hhmm: i32 = digits
            .parse()
            .map_err(|_| Error::date(format!("invalid zone offset: {:?}", digits)))?;
        Ok(sign * ((hhmm / 100) * 3600 + (hhmm % 100) * 60))
    }

    /// Consume a date from the input, keeping the zone offset it was
    /// written in.
    ///
    /// ```
    /// use mbox_attachments::rfc822::Rfc822DateParser;
    ///
    /// let mut p = Rfc822DateParser::new("Mon, 09 Jan 2012 21:20:00 +0000 (UTC)");
    /// let d = p.consume_datetime().unwrap();
    /// assert_eq!(d.to_rfc3339(), "2012-01-09T21:20:00+00:00");
    /// ```
    pub fn consume_datetime(&mut self) -> ParsingResult<DateTime<FixedOffset>> {
        self.parser.consume_linear_whitespace();

        // Optional day of week
        let day_of_week = self.consume_word();
        if !day_of_week.is_empty() {
            let lower_dow = day_of_week.to_ascii_lowercase();
            if !DAYS_OF_WEEK.contains(&&lower_dow[..]) {
                return Err(Error::date(format!("invalid day of week: {}", day_of_week)));
            }
            self.parser.consume_while(|c| c == ',' || c.is_whitespace());
        }

        let day = self
            .consume_u32()
            .ok_or_else(|| Error::date("expected day of month"))?;
        self.parser.consume_linear_whitespace();

        let month_name = self.consume_word().to_ascii_lowercase();
        let month = MONTHS
            .iter()
            .position(|&m| m == month_name)
            .map(|i| i as u32 + 1)
            .ok_or_else(|| Error::date(format!("invalid month: {:?}", month_name)))?;
        self.parser.consume_linear_whitespace();

        let year = match self.consume_u32() {
            Some(y @ 0..=49) => y + 2000,
            Some(y @ 50..=999) => y + 1900,
            Some(y) => y,
            None => return Err(Error::date("expected year")),
        };
        self.parser.consume_linear_whitespace();

        let (hour, minute, second) = self.consume_time()?;
        self.parser.consume_linear_whitespace();

        let offset = self.consume_timezone_offset()?;
        let zone = FixedOffset::east_opt(offset)
            .ok_or_else(|| Error::date(format!("zone offset out of range: {}", offset)))?;

        let naive = NaiveDate::from_ymd_opt(year as i32, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .ok_or_else(|| {
                Error::date(format!(
                    "no such date: {}-{:02}-{:02} {:02}:{:02}:{:02}",
                    year, month, day, hour, minute, second
                ))
            })?;

        zone.from_local_datetime(&naive)
            .single()
            .ok_or_else(|| Error::date("ambiguous local time"))
    }
}

/// Parse the value of a `Date` header.
pub fn parse_date(s: &str) -> ParsingResult<DateTime<FixedOffset>> {
    Rfc822DateParser::new(s.trim())
        .consume_datetime()
        .map_err(|e| match e {
            Error::Date(reason) => Error::date(format!("{:?}: {}", s.trim(), reason)),
            other => other,
        })
}

/// The coarse `Year-Month` label used to file a message, e.g. `2020-Jan`.
///
/// The month is the one in the sender's own offset.
pub fn month_label(date: &DateTime<FixedOffset>) -> String {
    date.format("%Y-%b").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_parse() {
        struct TimeParseTest<'s> {
            input: &'s str,
            result: Option<&'s str>,
        }

        let tests = vec![
            TimeParseTest {
                input: "Wed, 01 Jan 2020 10:00:00 +0000",
                result: Some("2020-01-01T10:00:00+00:00"),
            },
            TimeParseTest {
                // Check different TZ parsing
                input: "Sun, 20 Jun 1982 10:01:59 +0100",
                result: Some("1982-06-20T10:01:59+01:00"),
            },
            TimeParseTest {
                input: "Sun, 20 Jun 1982 10:01:59 -0400",
                result: Some("1982-06-20T10:01:59-04:00"),
            },
            TimeParseTest {
                // Test for wierd minute offsets in TZ
                input: "Sun, 20 Jun 1982 10:01:59 +0545",
                result: Some("1982-06-20T10:01:59+05:45"),
            },
            TimeParseTest {
                // Single digit day and surrounding whitespace
                input: "  Thu, 9 Jan 2014 21:20:00 +0000\r\n",
                result: Some("2014-01-09T21:20:00+00:00"),
            },
            TimeParseTest {
                // The day of week is not checked against the date
                input: "Mon, 01 Jan 2020 10:00:00 +0000",
                result: Some("2020-01-01T10:00:00+00:00"),
            },
            TimeParseTest {
                input: "Mon, 20 Jun 1982 10:01:59 EDT",
                result: Some("1982-06-20T10:01:59-04:00"),
            },
            TimeParseTest {
                input: "Tue, 15 Nov 1994 08:12:31 GMT",
                result: Some("1994-11-15T08:12:31+00:00"),
            },
            TimeParseTest {
                // Unknown zone names count as UTC
                input: "Tue, 15 Nov 1994 08:12:31 XYZ",
                result: Some("1994-11-15T08:12:31+00:00"),
            },
            TimeParseTest {
                input: "Tue, 15 Nov 1994 08:12:31 -0000",
                result: Some("1994-11-15T08:12:31+00:00"),
            },
            TimeParseTest {
                // The day of week is optional
                input: "09 Jan 2012 21:20:00 +0000",
                result: Some("2012-01-09T21:20:00+00:00"),
            },
            TimeParseTest {
                input: "9 Jan 2012 21:20:00 +0000",
                result: Some("2012-01-09T21:20:00+00:00"),
            },
            TimeParseTest {
                // Seconds are optional
                input: "Mon, 09 Jan 2012 21:20 +0000",
                result: Some("2012-01-09T21:20:00+00:00"),
            },
            TimeParseTest {
                // Trailing comments are ignored
                input: "Mon, 09 Jan 2012 21:20:00 +0000 (UTC)",
                result: Some("2012-01-09T21:20:00+00:00"),
            },
            TimeParseTest {
                input: "Fri, 3 Mar 2017 16:04:05 -0800 (PST)",
                result: Some("2017-03-03T16:04:05-08:00"),
            },
            TimeParseTest {
                // Two digit years
                input: "Mon, 20 Jun 82 10:01:59 EDT",
                result: Some("1982-06-20T10:01:59-04:00"),
            },
            TimeParseTest {
                input: "Mon, 20 Jun 02 10:01:59 EDT",
                result: Some("2002-06-20T10:01:59-04:00"),
            },
            TimeParseTest {
                input: "Someday, 09 Jan 2012 21:20:00 +0000",
                result: None,
            },
            TimeParseTest {
                input: "Mon, 09 Janvier 2012 21:20:00 +0000",
                result: None,
            },
            TimeParseTest {
                input: "Mon, 31 Feb 2012 21:20:00 +0000",
                result: None,
            },
            TimeParseTest {
                input: "Mon, 09 Jan 2012 +0000",
                result: None,
            },
            TimeParseTest {
                input: "Mon, 09 Jan 2012 21:20:00 +00",
                result: None,
            },
            TimeParseTest {
                input: "yesterday-ish",
                result: None,
            },
            TimeParseTest {
                input: "",
                result: None,
            },
        ];

        for test in tests.into_iter() {
            let given = parse_date(test.input).ok().map(|d| d.to_rfc3339());
            assert_eq!(given.as_deref(), test.result, "{:?}", test.input);
        }
    }

    #[test]
    fn test_month_label() {
        let tests = vec![
            ("Wed, 01 Jan 2020 10:00:00 +0000", "2020-Jan"),
            ("Sun, 20 Jun 1982 10:01:59 +0100", "1982-Jun"),
            ("Mon, 20 Jun 1982 10:01:59 EDT", "1982-Jun"),
            ("Mon, 09 Jan 2012 21:20:00 +0000 (UTC)", "2012-Jan"),
            ("9 Jan 2012 21:20:00 +0000", "2012-Jan"),
            // Late on New Year's Eve in New York is still December
            ("Tue, 31 Dec 2019 23:30:00 -0500", "2019-Dec"),
        ];

        for (input, expected) in tests.into_iter() {
            assert_eq!(month_label(&parse_date(input).unwrap()), expected);
        }
    }
}
