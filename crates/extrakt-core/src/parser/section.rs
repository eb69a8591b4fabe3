//! Sections: ordered line matchers producing named captures.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::trace;

use super::rules::{self, NumberLocale};
use crate::document::LineRange;
use crate::error::{ConfigError, ExtractionError};
use crate::models::money::CurrencyCode;

/// Named captures of one successful section match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureMap {
    values: BTreeMap<String, String>,
}

impl CaptureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// A capture that must be present.
    pub fn get(&self, name: &str) -> Result<&str, ExtractionError> {
        self.get_opt(name)
            .ok_or_else(|| ExtractionError::MissingCapture(name.to_string()))
    }

    /// A capture from an optional group.
    pub fn get_opt(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Capture coerced into an amount scaled to cents.
    pub fn amount(&self, name: &str, locale: NumberLocale) -> Result<Decimal, ExtractionError> {
        rules::parse_amount(self.get(name)?, locale).map_err(|e| e.with_field(name))
    }

    /// Capture coerced into a share quantity.
    pub fn shares(&self, name: &str, locale: NumberLocale) -> Result<Decimal, ExtractionError> {
        rules::parse_shares(self.get(name)?, locale).map_err(|e| e.with_field(name))
    }

    /// Capture coerced into an exchange rate.
    pub fn rate(&self, name: &str, locale: NumberLocale) -> Result<Decimal, ExtractionError> {
        rules::parse_exchange_rate(self.get(name)?, locale).map_err(|e| e.with_field(name))
    }

    pub fn date(&self, name: &str) -> Result<NaiveDate, ExtractionError> {
        rules::parse_date(self.get(name)?).map_err(|e| e.with_field(name))
    }

    pub fn time(&self, name: &str) -> Result<NaiveTime, ExtractionError> {
        rules::parse_time(self.get(name)?).map_err(|e| e.with_field(name))
    }

    pub fn currency(&self, name: &str) -> Result<CurrencyCode, ExtractionError> {
        rules::parse_currency(self.get(name)?).map_err(|e| e.with_field(name))
    }
}

/// Whether a matcher captures or only synchronizes the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    /// The whole line must match; named groups are captured.
    Match,
    /// The pattern must occur somewhere in the line; nothing is captured.
    Find,
}

/// One line pattern of a section.
#[derive(Debug, Clone)]
pub struct Matcher {
    kind: MatcherKind,
    pattern: Regex,
    source: String,
}

impl Matcher {
    /// Full-line matcher with named capture groups.
    pub fn matching(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            kind: MatcherKind::Match,
            pattern: compile_line_pattern(pattern)?,
            source: pattern.to_string(),
        })
    }

    /// Find-anchor: located anywhere in a line, captures discarded.
    pub fn find(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            kind: MatcherKind::Find,
            pattern: regex,
            source: pattern.to_string(),
        })
    }

    pub fn kind(&self) -> MatcherKind {
        self.kind
    }

    /// The pattern as written in the definition.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names this matcher contributes to the capture map.
    pub fn capture_names(&self) -> Vec<&str> {
        match self.kind {
            MatcherKind::Match => self.pattern.capture_names().flatten().collect(),
            MatcherKind::Find => Vec::new(),
        }
    }

    /// Try the line; on success merge captures and return `true`.
    fn apply(&self, line: &str, captures: &mut CaptureMap) -> bool {
        match self.kind {
            MatcherKind::Find => self.pattern.is_match(line),
            MatcherKind::Match => {
                let Some(caps) = self.pattern.captures(line) else {
                    return false;
                };
                for name in self.pattern.capture_names().flatten() {
                    if let Some(m) = caps.name(name) {
                        captures.insert(name, m.as_str());
                    }
                }
                true
            }
        }
    }
}

/// Compile a pattern that must match a whole line.
pub(crate) fn compile_line_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// The pattern a section could not satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmatched {
    pub pattern: String,
}

/// An ordered group of matchers, required unless marked optional.
///
/// Every matcher scans forward from the line after the previous match; the
/// first satisfying line wins and is never revisited.
#[derive(Debug, Clone)]
pub struct Section {
    attributes: Vec<String>,
    matchers: Vec<Matcher>,
    optional: bool,
    multiple_times: bool,
}

impl Section {
    /// Declare a section by the capture names it is expected to produce.
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
            matchers: Vec::new(),
            optional: false,
            multiple_times: false,
        }
    }

    /// Add a find-anchor.
    pub fn find(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.matchers.push(Matcher::find(pattern)?);
        Ok(self)
    }

    /// Add a full-line matcher.
    pub fn matching(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.matchers.push(Matcher::matching(pattern)?);
        Ok(self)
    }

    /// Skip the section instead of failing the candidate when it does not match.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Keep matching after the first hit, once per further occurrence.
    pub fn multiple_times(mut self) -> Self {
        self.multiple_times = true;
        self
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Short label for diagnostics: the declared attribute names.
    pub fn label(&self) -> String {
        self.attributes.join(", ")
    }

    /// Check declared attributes against the capture groups of the matchers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.matchers.is_empty() {
            return Err(ConfigError::EmptySection(self.label()));
        }

        let mut declared = BTreeSet::new();
        for attribute in &self.attributes {
            if !declared.insert(attribute.as_str()) {
                return Err(ConfigError::DuplicateCapture {
                    section: self.label(),
                    name: attribute.clone(),
                });
            }
        }

        let mut produced = BTreeSet::new();
        for matcher in &self.matchers {
            for name in matcher.capture_names() {
                if !declared.contains(name) {
                    return Err(ConfigError::UndeclaredCapture {
                        section: self.label(),
                        name: name.to_string(),
                    });
                }
                if !produced.insert(name) {
                    return Err(ConfigError::DuplicateCapture {
                        section: self.label(),
                        name: name.to_string(),
                    });
                }
            }
        }

        if let Some(unused) = declared.difference(&produced).next() {
            return Err(ConfigError::UnusedAttribute {
                section: self.label(),
                name: unused.to_string(),
            });
        }

        Ok(())
    }

    /// Run the matchers once from `cursor` up to `end`.
    ///
    /// Returns the captures and the cursor after the last matched line.
    fn match_once(
        &self,
        lines: &[String],
        mut cursor: usize,
        end: usize,
    ) -> Result<(CaptureMap, usize), Unmatched> {
        let mut captures = CaptureMap::new();

        for matcher in &self.matchers {
            let found = (cursor..end).find(|&index| matcher.apply(&lines[index], &mut captures));
            match found {
                Some(index) => {
                    trace!("`{}` matched line {}", matcher.source(), index + 1);
                    cursor = index + 1;
                }
                None => {
                    return Err(Unmatched {
                        pattern: matcher.source().to_string(),
                    });
                }
            }
        }

        Ok((captures, cursor))
    }

    /// Match the section inside `range`, starting at the range start.
    ///
    /// A plain section yields exactly one capture map; a repeating section
    /// yields one per complete match. Partial captures of a failed attempt
    /// are discarded.
    pub fn scan(&self, lines: &[String], range: LineRange) -> Result<Vec<CaptureMap>, Unmatched> {
        let end = range.end.min(lines.len());
        let (first, mut cursor) = self.match_once(lines, range.start, end)?;
        let mut matches = vec![first];

        if self.multiple_times {
            while cursor < end {
                match self.match_once(lines, cursor, end) {
                    Ok((captures, next)) => {
                        matches.push(captures);
                        cursor = next;
                    }
                    Err(_) => break,
                }
            }
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.trim().to_string()).collect()
    }

    fn whole(lines: &[String]) -> LineRange {
        LineRange::new(0, lines.len())
    }

    #[test]
    fn test_find_anchor_synchronizes_cursor() {
        let doc = lines(
            "Stück 99 IGNORED
             Nominale Wertpapierbezeichnung ISIN (WKN)
             Stück 2 3M CO. US88579Y1010 (851745)
             REGISTERED SHARES DL -,01",
        );
        let section = Section::new(["name", "isin", "wkn", "name_continued"])
            .find(r"Nominale Wertpapierbezeichnung ISIN \(WKN\)")
            .unwrap()
            .matching(r"^St.ck [\.,\d]+ (?<name>.*) (?<isin>[A-Z]{2}[A-Z0-9]{9}[0-9]) \((?<wkn>.*)\)$")
            .unwrap()
            .matching(r"^(?<name_continued>.*)$")
            .unwrap();
        section.validate().unwrap();

        let result = section.scan(&doc, whole(&doc)).unwrap();
        assert_eq!(result.len(), 1);
        let captures = &result[0];
        assert_eq!(captures.get("name").unwrap(), "3M CO.");
        assert_eq!(captures.get("isin").unwrap(), "US88579Y1010");
        assert_eq!(captures.get("wkn").unwrap(), "851745");
        assert_eq!(captures.get("name_continued").unwrap(), "REGISTERED SHARES DL -,01");
        assert_eq!(captures.len(), 4);
    }

    #[test]
    fn test_no_backtracking_after_consumed_line() {
        // The second matcher can only be satisfied by a line before the first hit.
        let doc = lines(
            "Kurswert 317,96- EUR
             Ausmachender Betrag 325,86- EUR",
        );
        let section = Section::new(["amount", "currency"])
            .matching(r"^Ausmachender Betrag (?<amount>[\.,\d]+)\- [A-Z]{3}$")
            .unwrap()
            .matching(r"^Kurswert [\.,\d]+\- (?<currency>[A-Z]{3})$")
            .unwrap();

        let err = section.scan(&doc, whole(&doc)).unwrap_err();
        assert_eq!(err.pattern, r"^Kurswert [\.,\d]+\- (?<currency>[A-Z]{3})$");
    }

    #[test]
    fn test_scan_stays_inside_range() {
        let doc = lines(
            "Dividendengutschrift
             Ausmachender Betrag 2,07+ EUR
             Dividendengutschrift",
        );
        let section = Section::new(["amount"])
            .matching(r"^Ausmachender Betrag (?<amount>[\.,\d]+)\+ EUR$")
            .unwrap();

        assert!(section.scan(&doc, LineRange::new(0, 2)).is_ok());
        assert!(section.scan(&doc, LineRange::new(2, 3)).is_err());
    }

    #[test]
    fn test_match_requires_whole_line() {
        let doc = lines("Provision 7,90- EUR zzgl. Auslagen");
        let section = Section::new(["fee"])
            .matching(r"Provision (?<fee>[\.,\d]+)\- EUR")
            .unwrap();
        assert!(section.scan(&doc, whole(&doc)).is_err());
    }

    #[test]
    fn test_multiple_times_collects_every_occurrence() {
        let doc = lines(
            "Provision 7,90- EUR
             Kurswert 317,96- EUR
             Provision 0,60- EUR
             Ausmachender Betrag 326,46- EUR",
        );
        let section = Section::new(["fee"])
            .matching(r"^Provision (?<fee>[\.,\d]+)\- EUR$")
            .unwrap()
            .multiple_times();

        let result = section.scan(&doc, whole(&doc)).unwrap();
        let fees: Vec<&str> = result.iter().map(|c| c.get("fee").unwrap()).collect();
        assert_eq!(fees, ["7,90", "0,60"]);
    }

    #[test]
    fn test_validate_rejects_duplicate_capture() {
        let section = Section::new(["currency"])
            .matching(r"^Kurswert [\.,\d]+\- (?<currency>[A-Z]{3})$")
            .unwrap()
            .matching(r"^Ausmachender Betrag [\.,\d]+\- (?<currency>[A-Z]{3})$")
            .unwrap();
        assert!(matches!(
            section.validate(),
            Err(ConfigError::DuplicateCapture { name, .. }) if name == "currency"
        ));
    }

    #[test]
    fn test_validate_rejects_undeclared_and_unused() {
        let undeclared = Section::new(["amount"])
            .matching(r"^(?<amount>\d+) (?<currency>[A-Z]{3})$")
            .unwrap();
        assert!(matches!(
            undeclared.validate(),
            Err(ConfigError::UndeclaredCapture { name, .. }) if name == "currency"
        ));

        let unused = Section::new(["amount", "note"])
            .matching(r"^(?<amount>\d+)$")
            .unwrap();
        assert!(matches!(
            unused.validate(),
            Err(ConfigError::UnusedAttribute { name, .. }) if name == "note"
        ));

        assert!(matches!(
            Section::new(["x"]).validate(),
            Err(ConfigError::EmptySection(_))
        ));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        assert!(matches!(
            Section::new(["x"]).matching(r"^(?<x>[unclosed$"),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_capture_map_coercion_labels_field() {
        let mut captures = CaptureMap::new();
        captures.insert("fee", "7,9x");
        let err = captures.amount("fee", NumberLocale::German).unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedValue { ref field, .. } if field == "fee"));
        assert_eq!(
            captures.amount("missing", NumberLocale::German).unwrap_err(),
            ExtractionError::MissingCapture("missing".to_string())
        );
    }
}
