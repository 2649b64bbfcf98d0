//! CSV rendering for the Opus "import postings from Excel" feature.
//!
//! The import schema is fixed: 25 semicolon-separated columns, of which the
//! first nine are populated and the remaining sixteen are always empty.

use crate::error::FlowError;
use crate::invoice::InvoiceData;
use csv::{Terminator, WriterBuilder};
use std::io::Write;

/// Column names required by the Opus bulk import, in order.
pub const OPUS_CSV_HEADERS: [&str; 25] = [
    "Artskonto",
    "Omkostningssted",
    "PSP-element",
    "Profitcenter",
    "Ordre",
    "Debet/kredit",
    "Beløb",
    "Næste agent",
    "Tekst",
    "Betalingsart",
    "Påligningsår",
    "Betalingsmodtagernr.",
    "Betalingsmodtagernr.kode",
    "Ydelsesmodtagernr.",
    "Ydelsesmodtagernr.kode",
    "Ydelsesperiode fra",
    "Ydelsesperiode til",
    "Oplysningspligtnr.",
    "Oplysningspligtmodtagernr.kode",
    "Oplysningspligtkode",
    "Netværk",
    "Operation",
    "Mængde",
    "Mængdeenhed",
    "Referencenøgle",
];

/// Side of a posting line, written verbatim into the `Debet/kredit` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Debet,
    Kredit,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Debet => "Debet",
            Side::Kredit => "Kredit",
        }
    }
}

/// Renders one posting line over the full 25-column schema.
fn posting_row(invoice: &InvoiceData, side: Side) -> [String; 25] {
    let (account, psp, text) = match side {
        Side::Debet => (
            invoice.debet_account(),
            invoice.debet_psp(),
            invoice.debet_posting_text(),
        ),
        Side::Kredit => (
            invoice.kredit_account(),
            invoice.kredit_psp(),
            invoice.kredit_posting_text(),
        ),
    };

    let mut row: [String; 25] = Default::default();
    row[0] = account.to_string();
    row[2] = psp.clone();
    row[5] = side.as_str().to_string();
    row[6] = invoice.amount().to_string();
    row[8] = text.clone();
    row
}

/// The two data rows, debit first.
pub fn posting_rows(invoice: &InvoiceData) -> [[String; 25]; 2] {
    [
        posting_row(invoice, Side::Debet),
        posting_row(invoice, Side::Kredit),
    ]
}

/// Writes header and both posting rows to `writer`.
pub fn write_postings<W: Write>(invoice: &InvoiceData, writer: W) -> csv::Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .delimiter(b';')
        .terminator(Terminator::CRLF)
        .from_writer(writer);

    csv_writer.write_record(OPUS_CSV_HEADERS)?;
    for row in posting_rows(invoice) {
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes the import file to the invoice's `csv_filename`, replacing its
/// contents.
pub fn write_csv(invoice: &InvoiceData) -> Result<(), FlowError> {
    let path = invoice.csv_filename();
    let to_flow_error = |source: csv::Error| FlowError::CsvWrite {
        path: path.clone(),
        source,
    };

    let file = std::fs::File::create(path).map_err(|e| to_flow_error(e.into()))?;
    write_postings(invoice, file).map_err(to_flow_error)
}
