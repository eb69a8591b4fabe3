//! Institutions command - list bundled institution definitions.

use clap::Args;
use console::style;
use serde::Serialize;

use extrakt_core::institutions::bundled;

/// Arguments for the institutions command.
#[derive(Args)]
pub struct InstitutionsArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct InstitutionInfo<'a> {
    label: &'a str,
    identifiers: &'a [String],
    document_types: Vec<DocumentTypeInfo<'a>>,
}

#[derive(Serialize)]
struct DocumentTypeInfo<'a> {
    name: &'a str,
    pre_scan: bool,
    blocks: Vec<&'a str>,
}

pub async fn run(args: InstitutionsArgs) -> anyhow::Result<()> {
    let institutions = bundled()?;

    let infos: Vec<InstitutionInfo<'_>> = institutions
        .iter()
        .map(|institution| InstitutionInfo {
            label: institution.label(),
            identifiers: institution.identifiers(),
            document_types: institution
                .document_types()
                .iter()
                .map(|document_type| DocumentTypeInfo {
                    name: document_type.name(),
                    pre_scan: document_type.has_pre_scan(),
                    blocks: document_type.blocks().iter().map(|b| b.name()).collect(),
                })
                .collect(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    for info in &infos {
        println!("{}", style(info.label).bold());
        if !info.identifiers.is_empty() {
            println!("  Identified by: {}", info.identifiers.join(", "));
        }
        for document_type in &info.document_types {
            println!(
                "  - {} ({})",
                document_type.name,
                document_type.blocks.join(", ")
            );
        }
    }

    Ok(())
}
