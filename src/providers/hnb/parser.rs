//! Parser for the HNB fixed-width exchange list.
//!
//! The list starts with a 21 character header:
//!
//! | Field                            | Format   | Length |
//! |----------------------------------|----------|--------|
//! | Exchange number                  |          | 3      |
//! | Date of creation                 | ddmmyyyy | 8      |
//! | Date of application              | ddmmyyyy | 8      |
//! | Number of currencies that follow |          | 2      |
//!
//! followed by one record per currency, e.g.
//! `392JPY100       6,161252       6,179791       6,198330`: a 9 character
//! block of numeric code, label and unit count, then buy, middle and sell
//! rates written with `,` as the decimal separator.

use crate::core::error::ParseError;
use crate::core::exchange::{Exchange, Rate};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::ops::Range;
use std::str::FromStr;

const HEADER_LEN: usize = 21;
const APPLICATION_DATE: Range<usize> = 11..19;
const CODE_BLOCK_LEN: usize = 9;
const LABEL: Range<usize> = 3..6;
const UNITS: Range<usize> = 6..9;

/// Incremental parser fed one line at a time.
///
/// Nothing is returned until [`ExchangeParser::finish`], so an error on any
/// line discards the whole payload.
#[derive(Debug, Default)]
pub struct ExchangeParser {
    line: usize,
    date: Option<NaiveDate>,
    rates: BTreeMap<String, Rate>,
}

impl ExchangeParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_line(&mut self, line: &str) -> Result<(), ParseError> {
        self.line += 1;

        if line.trim().is_empty() {
            return Ok(());
        }

        if line.len() == HEADER_LEN && line.is_ascii() {
            let date = NaiveDate::parse_from_str(&line[APPLICATION_DATE], "%d%m%Y").map_err(
                |source| ParseError::InvalidDate {
                    line: self.line,
                    content: line.to_string(),
                    source,
                },
            )?;
            self.date = Some(date);
            return Ok(());
        }

        let (currency, rate) = self.parse_record(line)?;
        self.rates.insert(currency, rate);
        Ok(())
    }

    pub fn finish(self) -> Result<Exchange, ParseError> {
        let date = self.date.ok_or(ParseError::MissingHeader)?;
        Ok(Exchange::new(date, self.rates))
    }

    fn parse_record(&self, line: &str) -> Result<(String, Rate), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [code, buy, middle, sell] = parts.as_slice() else {
            return Err(ParseError::UnknownFormat {
                line: self.line,
                content: line.to_string(),
            });
        };

        if code.len() != CODE_BLOCK_LEN
            || !code.is_ascii()
            || !code[LABEL].chars().all(|c| c.is_ascii_uppercase())
        {
            return Err(ParseError::InvalidCodeBlock {
                line: self.line,
                content: line.to_string(),
            });
        }
        let currency = code[LABEL].to_string();

        let units = match code[UNITS].parse::<u32>() {
            Ok(units) if units > 0 => units,
            _ => {
                return Err(ParseError::InvalidUnits {
                    line: self.line,
                    content: line.to_string(),
                });
            }
        };

        let rate = Rate {
            buy: self.normalise_rate(line, buy, units)?,
            middle: self.normalise_rate(line, middle, units)?,
            sell: self.normalise_rate(line, sell, units)?,
        };

        Ok((currency, rate))
    }

    fn normalise_rate(&self, line: &str, value: &str, units: u32) -> Result<Decimal, ParseError> {
        let number = Decimal::from_str(&english_decimal(value)).map_err(|source| {
            ParseError::InvalidRate {
                line: self.line,
                content: line.to_string(),
                value: value.to_string(),
                source,
            }
        })?;

        if units == 1 {
            return Ok(number);
        }
        Ok(number / Decimal::from(units))
    }
}

/// Rewrites `1.234,56` as `1234.56`.
fn english_decimal(value: &str) -> String {
    value
        .chars()
        .filter_map(|c| match c {
            ',' => Some('.'),
            '.' => None,
            c => Some(c),
        })
        .collect()
}

/// Parses a complete in-memory payload.
pub fn parse_exchange(payload: &str) -> Result<Exchange, ParseError> {
    let mut parser = ExchangeParser::new();
    for line in payload.lines() {
        parser.feed_line(line)?;
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exchange::format_fixed;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = "
059240320172503201713
036AUD001       5,207988       5,223659       5,239330
348HUF100       2,388187       2,395373       2,402559
392JPY100       6,161252       6,179791       6,198330
840USD001       6,839371       6,859951       6,880531
978EUR001       7,388573       7,410805       7,433037
";

    #[test]
    fn test_parse_sample() {
        let exchange = parse_exchange(SAMPLE).unwrap();

        assert_eq!(exchange.date, NaiveDate::from_ymd_opt(2017, 3, 25).unwrap());
        assert_eq!(exchange.rates.len(), 5);
        assert_eq!(
            exchange.rate("USD"),
            Some(&Rate {
                buy: dec!(6.839371),
                middle: dec!(6.859951),
                sell: dec!(6.880531),
            })
        );
        assert_eq!(
            exchange.rate("EUR"),
            Some(&Rate {
                buy: dec!(7.388573),
                middle: dec!(7.410805),
                sell: dec!(7.433037),
            })
        );
    }

    #[test]
    fn test_units_are_normalised() {
        let exchange = parse_exchange(SAMPLE).unwrap();

        let jpy = exchange.rate("JPY").unwrap();
        assert_eq!(jpy.buy, dec!(0.06161252));
        assert_eq!(jpy.middle, dec!(0.06179791));
        assert_eq!(jpy.sell, dec!(0.0619833));

        let huf = exchange.rate("HUF").unwrap();
        assert_eq!(huf.buy, dec!(0.02388187));
        assert_eq!(format_fixed(huf.middle), "0.023954");
    }

    #[test]
    fn test_six_digit_values_round_trip() {
        let exchange = parse_exchange(SAMPLE).unwrap();
        let aud = exchange.rate("AUD").unwrap();

        assert_eq!(format_fixed(aud.buy), "5.207988");
        assert_eq!(format_fixed(aud.middle), "5.223659");
        assert_eq!(format_fixed(aud.sell), "5.239330");
    }

    #[test]
    fn test_english_decimal() {
        assert_eq!(english_decimal("6,839371"), "6.839371");
        assert_eq!(english_decimal("1.234,500000"), "1234.500000");
        assert_eq!(english_decimal("12"), "12");
    }

    #[test]
    fn test_thousands_separator() {
        let payload = "059240320172503201713\n999XAU001   1.234,500000   1.240,000000   1.245,500000\n";
        let exchange = parse_exchange(payload).unwrap();
        assert_eq!(exchange.rate("XAU").unwrap().middle, dec!(1240));
    }

    #[test]
    fn test_repeated_label_overwrites() {
        let payload = "\
059240320172503201713
840USD001       6,839371       6,859951       6,880531
840USD001       1,000000       2,000000       3,000000
";
        let exchange = parse_exchange(payload).unwrap();
        assert_eq!(exchange.rates.len(), 1);
        assert_eq!(exchange.rate("USD").unwrap().middle, dec!(2));
    }

    #[test]
    fn test_rate_order_is_not_enforced() {
        let payload = "059240320172503201713\n840USD001       9,000000       2,000000       1,000000\n";
        let usd = *parse_exchange(payload).unwrap().rate("USD").unwrap();
        assert_eq!(usd.buy, dec!(9));
        assert_eq!(usd.sell, dec!(1));
    }

    #[test]
    fn test_blank_lines_and_crlf_are_skipped() {
        let payload = "\r\n059240320172503201713\r\n\r\n   \r\n840USD001       6,839371       6,859951       6,880531\r\n";
        let exchange = parse_exchange(payload).unwrap();
        assert_eq!(exchange.rates.len(), 1);
    }

    #[test]
    fn test_wrong_field_count_fails_whole_payload() {
        let payload = "\
059240320172503201713
840USD001       6,839371       6,859951       6,880531
978EUR001       7,388573       7,410805
";
        let err = parse_exchange(payload).unwrap_err();
        assert!(matches!(err, ParseError::UnknownFormat { line: 3, .. }), "{err:?}");
        assert!(err.to_string().contains("978EUR001"));
    }

    #[test]
    fn test_invalid_header_date() {
        let err = parse_exchange("059240320179903201713\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidDate { line: 1, .. }), "{err:?}");
    }

    #[test]
    fn test_missing_header() {
        let err =
            parse_exchange("840USD001       6,839371       6,859951       6,880531\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingHeader));

        assert!(matches!(parse_exchange(""), Err(ParseError::MissingHeader)));
    }

    #[test]
    fn test_invalid_units() {
        for code in ["840USDabc", "840USD000"] {
            let payload =
                format!("059240320172503201713\n{code}       6,839371       6,859951       6,880531\n");
            let err = parse_exchange(&payload).unwrap_err();
            assert!(matches!(err, ParseError::InvalidUnits { line: 2, .. }), "{err:?}");
        }
    }

    #[test]
    fn test_invalid_code_block() {
        for code in ["840US001", "840U5D001", "840USD0010", "840usd001", "840Usd001"] {
            let payload =
                format!("059240320172503201713\n{code}       6,839371       6,859951       6,880531\n");
            let err = parse_exchange(&payload).unwrap_err();
            assert!(matches!(err, ParseError::InvalidCodeBlock { line: 2, .. }), "{err:?}");
        }
    }

    #[test]
    fn test_invalid_rate() {
        let payload = "059240320172503201713\n840USD001       6,839371       n/a       6,880531\n";
        let err = parse_exchange(payload).unwrap_err();
        match err {
            ParseError::InvalidRate { line, value, .. } => {
                assert_eq!(line, 2);
                assert_eq!(value, "n/a");
            }
            other => panic!("Expected invalid rate, got {other:?}"),
        }
    }

    #[test]
    fn test_incremental_feed() {
        let mut parser = ExchangeParser::new();
        parser.feed_line("059240320172503201713").unwrap();
        parser
            .feed_line("978EUR001       7,388573       7,410805       7,433037")
            .unwrap();

        let exchange = parser.finish().unwrap();
        assert_eq!(exchange.rate("EUR").unwrap().sell, dec!(7.433037));
    }
}
