//! Transaction builders: factory, ordered section assignments and wrap.

use tracing::debug;

use super::block::BlockTransaction;
use super::context::Context;
use super::section::{CaptureMap, Section};
use crate::document::LineRange;
use crate::error::{ConfigError, ExtractionError};
use crate::models::transaction::Item;

/// Callback applying one section's captures to the candidate.
pub type Assignment<T> =
    Box<dyn Fn(&mut T, &CaptureMap, &mut Context) -> Result<(), ExtractionError> + Send + Sync>;

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;
type Wrap<T> = Box<dyn Fn(T) -> Result<Item, ExtractionError> + Send + Sync>;

/// Builds one candidate per block instance and wraps it into an [`Item`].
///
/// Sections run in declaration order and each assignment is applied right
/// after its section matched, so later assignments observe context values
/// written by earlier ones.
pub struct TransactionBuilder<T> {
    factory: Factory<T>,
    sections: Vec<(Section, Assignment<T>)>,
    wrap: Option<Wrap<T>>,
}

impl<T> TransactionBuilder<T> {
    /// Start a builder with the factory producing a fresh candidate.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            sections: Vec::new(),
            wrap: None,
        }
    }

    /// Append a section and the assignment applied to its captures.
    pub fn section<F>(mut self, section: Section, assign: F) -> Result<Self, ConfigError>
    where
        F: Fn(&mut T, &CaptureMap, &mut Context) -> Result<(), ExtractionError>
            + Send
            + Sync
            + 'static,
    {
        section.validate()?;
        self.sections.push((section, Box::new(assign)));
        Ok(self)
    }

    /// Set the function turning the finished candidate into an item.
    pub fn wrap<F>(mut self, wrap: F) -> Self
    where
        F: Fn(T) -> Result<Item, ExtractionError> + Send + Sync + 'static,
    {
        self.wrap = Some(Box::new(wrap));
        self
    }

    /// Whether the builder has a wrap function and at least one section.
    pub fn is_complete(&self) -> bool {
        self.wrap.is_some() && !self.sections.is_empty()
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().map(|(section, _)| section)
    }

    /// Run every section over `range` and wrap the candidate.
    ///
    /// A required section miss aborts before wrap is invoked.
    pub fn execute(
        &self,
        lines: &[String],
        range: LineRange,
        context: &mut Context,
    ) -> Result<Item, ExtractionError> {
        let mut candidate = (self.factory)();

        for (section, assign) in &self.sections {
            match section.scan(lines, range) {
                Ok(matches) => {
                    for captures in &matches {
                        assign(&mut candidate, captures, context)?;
                    }
                }
                Err(unmatched) if section.is_optional() => {
                    debug!(
                        "Optional section [{}] skipped at line {}: `{}`",
                        section.label(),
                        range.first_line_number(),
                        unmatched.pattern
                    );
                }
                Err(unmatched) => {
                    return Err(ExtractionError::MissingSection {
                        section: section.label(),
                        pattern: unmatched.pattern,
                    });
                }
            }
        }

        match &self.wrap {
            Some(wrap) => wrap(candidate),
            None => Err(ExtractionError::MissingField("wrap".to_string())),
        }
    }
}

impl<T> BlockTransaction for TransactionBuilder<T> {
    fn run(
        &self,
        lines: &[String],
        range: LineRange,
        context: &mut Context,
    ) -> Result<Item, ExtractionError> {
        self.execute(lines, range, context)
    }

    fn is_complete(&self) -> bool {
        TransactionBuilder::is_complete(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::money::CurrencyCode;
    use crate::models::transaction::{Transaction, TransactionKind};
    use crate::parser::context::keys;
    use crate::parser::context::ContextValue;
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.trim().to_string()).collect()
    }

    fn fee_builder() -> TransactionBuilder<Transaction> {
        TransactionBuilder::new(|| Transaction::new(TransactionKind::Fee))
            .section(
                Section::new(["date"])
                    .matching(r"^Schlusstag (?<date>\d{2}\.\d{2}\.\d{4})$")
                    .unwrap(),
                |t: &mut Transaction, v, _| {
                    t.set_date_time(v.date("date")?, None);
                    Ok(())
                },
            )
            .unwrap()
            .section(
                Section::new(["time"])
                    .matching(r"^Zeit (?<time>\d{2}:\d{2}:\d{2})$")
                    .unwrap(),
                |t: &mut Transaction, v, _| {
                    t.time = Some(v.time("time")?);
                    Ok(())
                },
            )
            .unwrap()
            .section(
                Section::new(["note"])
                    .matching(r"^(?<note>Limit .*)$")
                    .unwrap()
                    .optional(),
                |t: &mut Transaction, v, _| {
                    t.note = Some(v.get("note")?.to_string());
                    Ok(())
                },
            )
            .unwrap()
            .section(
                Section::new(["amount", "currency"])
                    .matching(r"^Ausmachender Betrag (?<amount>[\.,\d]+)\- (?<currency>[A-Z]{3})$")
                    .unwrap(),
                |t: &mut Transaction, v, ctx| {
                    t.amount = Some(v.amount("amount", ctx.locale())?);
                    t.currency = Some(v.currency("currency")?);
                    Ok(())
                },
            )
            .unwrap()
            .wrap(Item::new)
    }

    #[test]
    fn test_date_and_time_from_two_sections() {
        let doc = lines(
            "Schlusstag 17.03.2021
             Zeit 16:53:45
             Ausmachender Betrag 325,86- EUR",
        );
        let builder = fee_builder();
        let mut context = Context::default();

        let item = builder
            .execute(&doc, LineRange::new(0, doc.len()), &mut context)
            .unwrap();
        assert_eq!(item.date_time().to_string(), "2021-03-17 16:53:45");
        assert_eq!(item.amount().amount.to_string(), "325.86");
        assert_eq!(item.note(), None);
    }

    #[test]
    fn test_required_miss_names_section_and_pattern() {
        let doc = lines(
            "Schlusstag 17.03.2021
             Ausmachender Betrag 325,86- EUR",
        );
        let err = fee_builder()
            .execute(&doc, LineRange::new(0, doc.len()), &mut Context::default())
            .unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingSection {
                section: "time".to_string(),
                pattern: r"^Zeit (?<time>\d{2}:\d{2}:\d{2})$".to_string(),
            }
        );
    }

    #[test]
    fn test_optional_absence_keeps_later_sections_intact() {
        let with_note = lines(
            "Schlusstag 17.03.2021
             Zeit 16:53:45
             Limit billigst
             Ausmachender Betrag 325,86- EUR",
        );
        let without_note = lines(
            "Schlusstag 17.03.2021
             Zeit 16:53:45
             Ausmachender Betrag 325,86- EUR",
        );
        let builder = fee_builder();

        let a = builder
            .execute(&with_note, LineRange::new(0, with_note.len()), &mut Context::default())
            .unwrap();
        let b = builder
            .execute(&without_note, LineRange::new(0, without_note.len()), &mut Context::default())
            .unwrap();

        assert_eq!(a.note(), Some("Limit billigst"));
        assert_eq!(a.amount(), b.amount());
        assert_eq!(a.date_time(), b.date_time());
    }

    #[test]
    fn test_assignments_see_context_writes_of_earlier_sections() {
        let doc = lines(
            "Währung EUR
             Betrag 10,00",
        );
        let builder = TransactionBuilder::new(|| Transaction::new(TransactionKind::Deposit))
            .section(
                Section::new(["currency"])
                    .matching(r"^Währung (?<currency>[A-Z]{3})$")
                    .unwrap(),
                |_: &mut Transaction, v, ctx| {
                    ctx.put(keys::CURRENCY, ContextValue::Currency(v.currency("currency")?));
                    Ok(())
                },
            )
            .unwrap()
            .section(
                Section::new(["amount"])
                    .matching(r"^Betrag (?<amount>[\.,\d]+)$")
                    .unwrap(),
                |t: &mut Transaction, v, ctx| {
                    t.amount = Some(v.amount("amount", ctx.locale())?);
                    t.currency = Some(ctx.currency(keys::CURRENCY)?);
                    t.date = chrono::NaiveDate::from_ymd_opt(2023, 5, 19);
                    Ok(())
                },
            )
            .unwrap()
            .wrap(Item::new);

        let item = builder
            .execute(&doc, LineRange::new(0, doc.len()), &mut Context::default())
            .unwrap();
        assert_eq!(item.amount().currency, CurrencyCode::EUR);
    }

    #[test]
    fn test_builder_without_wrap_is_incomplete() {
        let builder = TransactionBuilder::new(|| Transaction::new(TransactionKind::Fee))
            .section(
                Section::new(["fee"]).matching(r"^Provision (?<fee>.*)$").unwrap(),
                |_: &mut Transaction, _, _| Ok(()),
            )
            .unwrap();
        assert!(!builder.is_complete());
        assert!(builder.wrap(Item::new).is_complete());
    }
}
