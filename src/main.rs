//! # Folio CLI
//!
//! Usage:
//!   folio order.json -o invoice.pdf
//!   folio --saleor response.json --config shop.json -o invoice.pdf
//!   cat order.json | folio --data-uri invoice.txt
//!   folio --example > order.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use folio::adapter::{AdapterDefaults, SaleorOrder};
use folio::config::InvoiceConfig;
use folio::error::FolioError;
use folio::model::OrderDocument;
use folio::InvoiceEngine;

#[derive(Parser, Debug)]
#[command(version, about = "Render an order as a paginated invoice PDF", long_about = None)]
struct CliArguments {
    /// Order JSON; read from stdin when omitted
    #[arg(value_name = "order_file")]
    input: Option<PathBuf>,
    #[arg(short = 'c', long = "config", value_name = "json_file")]
    config_path: Option<PathBuf>,
    #[arg(short = 'o', long = "output", value_name = "file_path", default_value = "invoice.pdf")]
    output_path: PathBuf,
    /// Also write the PDF as a base64 data URI to this file
    #[arg(long = "data-uri", value_name = "file_path")]
    data_uri_path: Option<PathBuf>,
    /// Input is a Saleor GraphQL order payload
    #[arg(long)]
    saleor: bool,
    /// Currency for Saleor amounts that carry none
    #[arg(long = "default-currency", value_name = "code")]
    default_currency: Option<String>,
    /// Print a sample order and exit
    #[arg(long)]
    example: bool,
}

fn main() {
    if let Err(error) = fallible_main() {
        log::error!("{}", error);
        eprintln!("✗ {}", error);
        std::process::exit(1);
    }
}

fn fallible_main() -> Result<(), FolioError> {
    env_logger::init();
    let arguments = CliArguments::parse();
    log::debug!("{:?}", arguments);

    if arguments.example {
        print!("{}", example_order_json());
        return Ok(());
    }

    let input = match &arguments.input {
        Some(path) => fs::read_to_string(path).map_err(|source| FolioError::Io {
            path: path.clone(),
            source,
        })?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| FolioError::Io {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            buf
        }
    };

    let config = match &arguments.config_path {
        Some(path) => InvoiceConfig::from_path(path)?,
        None => InvoiceConfig::default(),
    };

    let order = if arguments.saleor {
        let defaults = AdapterDefaults {
            currency: arguments.default_currency.clone(),
        };
        SaleorOrder::from_json(&input)?.into_document(&defaults)?
    } else {
        OrderDocument::from_json(&input)?
    };

    let engine = InvoiceEngine::new(config)?;
    let rendered = engine.generate(&order)?;

    write_file(&arguments.output_path, &rendered.bytes)?;
    if let Some(path) = &arguments.data_uri_path {
        write_file(path, rendered.data_uri.as_bytes())?;
    }
    eprintln!(
        "✓ Invoice {}: {} pages, {} bytes written to {}",
        rendered.invoice_number,
        rendered.summary.total_pages,
        rendered.bytes.len(),
        arguments.output_path.display()
    );
    Ok(())
}

fn write_file(path: &PathBuf, bytes: &[u8]) -> Result<(), FolioError> {
    fs::write(path, bytes).map_err(|source| FolioError::Io {
        path: path.clone(),
        source,
    })
}

fn example_order_json() -> &'static str {
    r##"{
  "orderNumber": "1042",
  "createdAt": "2026-10-19T08:30:00Z",
  "customer": {
    "name": "Ada Wong",
    "email": "ada@example.com",
    "phone": "+852 5555 0000",
    "address": {
      "streetLines": ["8 Finance Street", "Central"],
      "city": "Hong Kong",
      "country": "Hong Kong"
    }
  },
  "shippingMethodName": "Courier",
  "paymentStatusLabel": "Fully paid",
  "lineItems": [
    {
      "sku": "CH-MARG-15",
      "description": "Chateau Margaux, Premier Grand Cru Classe",
      "quantity": 2,
      "unitPrice": { "amount": 4800, "currency": "HKD" },
      "subtotal": { "amount": 9600, "currency": "HKD" },
      "attributes": [
        { "name": "Vintage", "values": ["2015"] },
        { "name": "Size", "values": ["750ml"] }
      ]
    },
    {
      "sku": "DRC-ECH-18",
      "description": "Domaine de la Romanee-Conti Echezeaux Grand Cru",
      "quantity": 1,
      "unitPrice": { "amount": 12500, "currency": "HKD" },
      "subtotal": { "amount": 12500, "currency": "HKD" },
      "attributes": [
        { "name": "Vintage", "values": ["2018"] },
        { "name": "Size", "values": ["1.5L"] }
      ]
    }
  ],
  "shippingCost": { "amount": 200, "currency": "HKD" },
  "totals": {
    "net": { "amount": 22300, "currency": "HKD" },
    "tax": { "amount": 0, "currency": "HKD" },
    "gross": { "amount": 22300, "currency": "HKD" }
  }
}
"##
}
