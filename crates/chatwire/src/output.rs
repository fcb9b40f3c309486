use std::io::IsTerminal;

use bytes::Bytes;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ListingOutput {
    count: usize,
    clients: Vec<String>,
}

pub fn print_listing(names: &[Bytes], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ListingOutput {
                count: names.len(),
                clients: names.iter().map(|n| text_preview(n)).collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["HANDLE"]);
            for name in names {
                table.add_row(vec![text_preview(name)]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Number of clients: {}", names.len());
            for name in names {
                println!("  {}", text_preview(name));
            }
        }
    }
}

#[derive(Serialize)]
struct DeliveryOutput<'a> {
    event: &'a str,
    name: String,
}

/// Report a recipient the server could not find.
pub fn print_unknown_recipient(name: &Bytes, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = DeliveryOutput {
                event: "unknown-recipient",
                name: text_preview(name),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Client with handle {} does not exist", text_preview(name));
        }
    }
}

/// Names and texts are raw bytes on the wire; render them lossily.
pub fn text_preview(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}
