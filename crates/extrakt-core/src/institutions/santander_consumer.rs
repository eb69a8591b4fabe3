//! Santander Consumer Bank: trade confirmations, dividend vouchers and
//! account statements.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ConfigError, ExtractionError};
use crate::models::money::{ExchangeRate, Money};
use crate::models::transaction::{Item, Security, Transaction, TransactionKind};
use crate::parser::context::{keys, Context, ContextValue};
use crate::parser::rules::{self, add_fee, add_tax, check_and_set_gross_unit};
use crate::parser::{Block, CaptureMap, DocumentType, Institution, Section, TransactionBuilder};

pub const LABEL: &str = "Santander Consumer Bank";

lazy_static! {
    // € 0,00 € 38,98 € 40,64 € 1,66 € 6,63 € 1,66
    static ref STATEMENT_CURRENCY: Regex =
        Regex::new(r"^(?<currency>\p{Sc}) [\.,\d]+ \p{Sc} [\.,\d]+.*$").unwrap();
}

pub fn institution() -> Result<Institution, ConfigError> {
    Ok(Institution::new(LABEL)
        .identifier("Santander Consumer Bank AG")
        .identifier("Santander Consumer Bank GmbH")
        .add_document_type(purchase()?)
        .add_document_type(dividend()?)
        .add_document_type(account_statement()?))
}

type Builder = TransactionBuilder<Transaction>;

fn security(v: &CaptureMap) -> Result<Security, ExtractionError> {
    let mut name = rules::trim(v.get("name")?);
    if let Some(continued) = v.get_opt("name_continued").map(rules::trim) {
        if !continued.is_empty() {
            name = format!("{} {}", name, continued);
        }
    }

    Ok(Security {
        name: rules::replace_multiple_blanks(&name),
        isin: Some(v.get("isin")?.to_string()),
        wkn: v.get_opt("wkn").map(str::to_string),
        currency: Some(v.currency("currency")?),
    })
}

fn set_amount(t: &mut Transaction, v: &CaptureMap, ctx: &Context) -> Result<(), ExtractionError> {
    t.amount = Some(v.amount("amount", ctx.locale())?);
    t.currency = Some(v.currency("currency")?);
    Ok(())
}

fn purchase() -> Result<DocumentType, ConfigError> {
    let builder = Builder::new(|| Transaction::new(TransactionKind::Purchase))
        // Stück 2 3M CO. US88579Y1010 (851745)
        // REGISTERED SHARES DL -,01
        // Kurswert 317,96- EUR
        .section(
            Section::new(["name", "isin", "wkn", "name_continued", "currency"])
                .find(r"Nominale Wertpapierbezeichnung ISIN \(WKN\)")?
                .matching(r"^St.ck [\.,\d]+ (?<name>.*) (?<isin>[A-Z0-9]{12}) (\((?<wkn>.*)\))$")?
                .matching(r"^(?<name_continued>.*)$")?
                .matching(r"^Kurswert [\.,\d]+\- (?<currency>[A-Z]{3})$")?,
            |t: &mut Transaction, v: &CaptureMap, _: &mut Context| {
                t.security = Some(security(v)?);
                Ok(())
            },
        )?
        // Stück 13 VANGUARD FTSE ALL-WORLD U.ETF      IE00B3RBWM25 (A1JX52)
        .section(
            Section::new(["shares"]).matching(r"^St.ck (?<shares>[\.,\d]+) .*$")?,
            |t: &mut Transaction, v: &CaptureMap, ctx: &mut Context| {
                t.shares = Some(v.shares("shares", ctx.locale())?);
                Ok(())
            },
        )?
        // Schlusstag/-Zeit 17.03.2021 16:53:45 Auftraggeber NACHNAME VORNAME
        .section(
            Section::new(["date", "time"]).matching(
                r"^Schlusstag/\-Zeit (?<date>\d{2}\.\d{2}\.\d{4}) (?<time>\d{2}:\d{2}:\d{2}) .*$",
            )?,
            |t: &mut Transaction, v: &CaptureMap, _: &mut Context| {
                t.set_date_time(v.date("date")?, Some(v.time("time")?));
                Ok(())
            },
        )?
        // Ausmachender Betrag 325,86- EUR
        .section(
            Section::new(["amount", "currency"])
                .matching(r"^Ausmachender Betrag (?<amount>[\.,\d]+)\- (?<currency>[A-Z]{3})$")?,
            |t: &mut Transaction, v: &CaptureMap, ctx: &mut Context| set_amount(t, v, ctx),
        )?
        // Limit billigst
        .section(
            Section::new(["note"]).matching(r"^(?<note>Limit .*)$")?.optional(),
            |t: &mut Transaction, v: &CaptureMap, _: &mut Context| {
                t.note = Some(rules::trim(v.get("note")?));
                Ok(())
            },
        )?;

    let builder = with_fees(builder)?.wrap(Item::new);

    DocumentType::new("Wertpapier Abrechnung Kauf")?
        .add_block(Block::new(r"^Wertpapier Abrechnung Kauf.*$")?.named("purchase").set(builder)?)
}

fn dividend() -> Result<DocumentType, ConfigError> {
    let builder = Builder::new(|| Transaction::new(TransactionKind::Dividend))
        // Nominale Wertpapierbezeichnung ISIN (WKN)
        // Stück 2 3M CO. US88579Y1010 (851745)
        // REGISTERED SHARES DL -,01
        // Zahlbarkeitstag 14.06.2021 Dividende pro Stück 1,48 USD
        .section(
            Section::new(["name", "isin", "wkn", "name_continued", "currency"])
                .find(r"Nominale Wertpapierbezeichnung ISIN \(WKN\)")?
                .matching(r"^St.ck [\.,\d]+ (?<name>.*) (?<isin>[A-Z0-9]{12}) (\((?<wkn>.*)\))$")?
                .matching(r"^(?<name_continued>.*)$")?
                .matching(r"^Zahlbarkeitstag .* [\.,\d]+ (?<currency>[A-Z]{3})$")?,
            |t: &mut Transaction, v: &CaptureMap, ctx: &mut Context| {
                t.security = Some(security(v)?);
                // The context outlives the voucher; start without a withheld tax.
                ctx.put(keys::WITHHOLDING_TAX, ContextValue::Flag(false));
                Ok(())
            },
        )?
        .section(
            Section::new(["shares"]).matching(r"^St.ck (?<shares>[\.,\d]+) .* (\(.*\))$")?,
            |t: &mut Transaction, v: &CaptureMap, ctx: &mut Context| {
                t.shares = Some(v.shares("shares", ctx.locale())?);
                Ok(())
            },
        )?
        // Den Betrag buchen wir mit Wertstellung 16.06.2021 zu Gunsten des Kontos ...
        .section(
            Section::new(["date"]).matching(
                r"^Den Betrag buchen wir mit Wertstellung (?<date>\d{2}\.\d{2}\.\d{4}) .*$",
            )?,
            |t: &mut Transaction, v: &CaptureMap, _: &mut Context| {
                t.set_date_time(v.date("date")?, None);
                Ok(())
            },
        )?
        // Ausmachender Betrag 2,07+ EUR
        .section(
            Section::new(["amount", "currency"])
                .matching(r"^Ausmachender Betrag (?<amount>[\.,\d]+)\+ (?<currency>[A-Z]{3})$")?,
            |t: &mut Transaction, v: &CaptureMap, ctx: &mut Context| set_amount(t, v, ctx),
        )?
        // Devisenkurs EUR / USD 1,2137
        // Dividendengutschrift 2,96 USD 2,44+ EUR
        .section(
            Section::new([
                "base_currency",
                "term_currency",
                "exchange_rate",
                "fx_gross",
                "fx_currency",
                "gross",
                "currency",
            ])
            .matching(
                r"^Devisenkurs (?<base_currency>[A-Z]{3}) / (?<term_currency>[A-Z]{3}) (\s+)?(?<exchange_rate>[\.,\d]+)$",
            )?
            .matching(
                r"^Dividendengutschrift (?<fx_gross>[\.,\d]+) (?<fx_currency>[A-Z]{3}) (?<gross>[\.,\d]+)\+ (?<currency>[A-Z]{3})$",
            )?
            .optional(),
            |t: &mut Transaction, v: &CaptureMap, ctx: &mut Context| {
                let locale = ctx.locale();
                let rate = ExchangeRate::new(
                    v.currency("base_currency")?,
                    v.currency("term_currency")?,
                    v.rate("exchange_rate", locale)?,
                );
                ctx.put_exchange_rate(rate);

                let gross = Money::new(v.currency("currency")?, v.amount("gross", locale)?);
                let fx_gross = Money::new(v.currency("fx_currency")?, v.amount("fx_gross", locale)?);
                check_and_set_gross_unit(t, gross, fx_gross, ctx);
                Ok(())
            },
        )?
        // Ex-Tag 20.05.2021 Art der Dividende Quartalsdividende
        .section(
            Section::new(["note"]).matching(r"^.* Art der Dividende (?<note>.*)$")?.optional(),
            |t: &mut Transaction, v: &CaptureMap, _: &mut Context| {
                t.note = Some(rules::trim(v.get("note")?));
                Ok(())
            },
        )?;

    let builder = with_fees(with_taxes(builder)?)?.wrap(Item::new);

    DocumentType::new("Dividendengutschrift")?
        .add_block(Block::new(r"^Dividendengutschrift$")?.named("dividend").set(builder)?)
}

fn account_statement() -> Result<DocumentType, ConfigError> {
    let document_type = DocumentType::new("Kontoauszug")?.with_pre_scan(|lines, ctx| {
        let symbol = lines
            .iter()
            .find_map(|line| STATEMENT_CURRENCY.captures(line))
            .and_then(|caps| caps.name("currency"));
        if let Some(symbol) = symbol {
            let currency = rules::parse_currency(symbol.as_str())?;
            ctx.put(keys::CURRENCY, ContextValue::Currency(currency));
        }
        Ok(())
    });

    document_type
        // 31.05.2023 31.05.2023 -1,66 38,98 Kapitalertragsteuer
        .add_block(statement_block(
            "tax",
            r"^(?<date>\d{2}\.\d{2}\.\d{4}) (\d{2}\.\d{2}\.\d{4}) (?<amount>[\.,\d-]+) ([\.,\d-]+) (Kapitalertragsteuer).*$",
            TransactionKind::Tax,
        )?)?
        // 31.05.2023 31.05.2023 6,63 40,64 Zinsgutschrift Habenzinsen
        .add_block(statement_block(
            "interest",
            r"^(?<date>\d{2}\.\d{2}\.\d{4}) (\d{2}\.\d{2}\.\d{4}) (?<amount>[\.,\d-]+) ([\.,\d-]+) (Zinsgutschrift) (?<note>.*)$",
            TransactionKind::Interest,
        )?)?
        // 19.05.2023 19.05.2023 34,00 34,01 Einzahlung von ...
        .add_block(statement_block(
            "deposit",
            r"^(?<date>\d{2}\.\d{2}\.\d{4}) (\d{2}\.\d{2}\.\d{4}) (?<amount>[\.,\d-]+) ([\.,\d-]+) (Einzahlung) (?<note>.*)$",
            TransactionKind::Deposit,
        )?)
}

/// One statement line per transaction; the currency comes from the pre-scan.
fn statement_block(name: &str, pattern: &str, kind: TransactionKind) -> Result<Block, ConfigError> {
    let attributes: &[&str] = if pattern.contains("(?<note>") {
        &["date", "amount", "note"]
    } else {
        &["date", "amount"]
    };
    let section = Section::new(attributes.iter().copied());

    let builder = Builder::new(move || Transaction::new(kind))
        .section(
            section.matching(pattern)?,
            |t: &mut Transaction, v: &CaptureMap, ctx: &mut Context| {
                t.set_date_time(v.date("date")?, None);
                t.amount = Some(v.amount("amount", ctx.locale())?.abs());
                t.currency = Some(ctx.currency(keys::CURRENCY)?);
                if let Some(note) = v.get_opt("note") {
                    t.note = Some(rules::replace_multiple_blanks(note));
                }
                Ok(())
            },
        )?
        .wrap(Item::new);

    Block::new(pattern)?.named(name).set(builder)
}

fn with_taxes(builder: Builder) -> Result<Builder, ConfigError> {
    builder
        // Einbehaltene Quellensteuer 15 % auf 2,96 USD 0,37- EUR
        .section(
            Section::new(["withholding_tax", "currency"])
                .matching(
                    r"^Einbehaltene Quellensteuer \d+ % .* [\.,\d]+ [A-Z]{3} (?<withholding_tax>[\.,\d]+)\- (?<currency>[A-Z]{3})$",
                )?
                .optional(),
            |t: &mut Transaction, v: &CaptureMap, ctx: &mut Context| {
                let tax = Money::new(v.currency("currency")?, v.amount("withholding_tax", ctx.locale())?);
                add_tax(t, tax, ctx);
                ctx.put(keys::WITHHOLDING_TAX, ContextValue::Flag(true));
                Ok(())
            },
        )?
        // Anrechenbare Quellensteuer 15 % auf 2,44 EUR 0,37- EUR
        .section(
            Section::new(["creditable_withholding_tax", "currency"])
                .matching(
                    r"^Anrechenbare Quellensteuer \d+ % .* [\.,\d]+ [A-Z]{3} (?<creditable_withholding_tax>[\.,\d]+)\- (?<currency>[A-Z]{3})$",
                )?
                .optional(),
            |t: &mut Transaction, v: &CaptureMap, ctx: &mut Context| {
                // Same tax as the withheld one when both are printed.
                if !ctx.flag(keys::WITHHOLDING_TAX)? {
                    let tax = Money::new(
                        v.currency("currency")?,
                        v.amount("creditable_withholding_tax", ctx.locale())?,
                    );
                    add_tax(t, tax, ctx);
                }
                Ok(())
            },
        )
}

fn with_fees(builder: Builder) -> Result<Builder, ConfigError> {
    builder
        // Provision 7,90- EUR
        .section(
            Section::new(["fee", "currency"])
                .matching(r"^Provision (?<fee>[\.,\d]+)\- (?<currency>[A-Z]{3})$")?
                .optional(),
            fee,
        )?
        // Fremde Abwicklungsgebühr für die Umschreibung von Namensaktien 0,60- EUR
        .section(
            Section::new(["fee", "currency"])
                .matching(r"^Fremde Abwicklungsgeb.hr .* (?<fee>[\.,\d]+)\- (?<currency>[A-Z]{3})$")?
                .optional()
                .multiple_times(),
            fee,
        )
}

fn fee(t: &mut Transaction, v: &CaptureMap, ctx: &mut Context) -> Result<(), ExtractionError> {
    let fee = Money::new(v.currency("currency")?, v.amount("fee", ctx.locale())?);
    add_fee(t, fee, ctx);
    Ok(())
}
