//! Flat-table codec for the requisition file.
//!
//! The on-disk format is a comma-separated table with a fixed header.
//! Multi-valued fields (items, quotes) are stored as a single cell per
//! column, sub-values joined with `;` and zipped positionally on decode.
//!
//! Decoding never fails: empty or malformed input yields an empty canonical
//! table, and a header missing canonical columns is repaired additively by
//! synthesizing the absent columns as empty strings. Problems are reported
//! as diagnostics for the caller to log.

use std::str::FromStr;

use crate::models::{ItemLine, QuoteLine, Requisition, RequisitionStatus, RequisitionTable};

/// Canonical column set. Every decoded table contains exactly these columns;
/// unknown columns in the input are ignored.
pub const COLUMNS: [&str; 14] = [
    "ID",
    "Status",
    "Data Solicitação",
    "Solicitante",
    "Centro Custo",
    "Itens",
    "Quantidades",
    "Justificativa",
    "Local Entrega",
    "Aprovador",
    "Comprador",
    "Fornecedores",
    "Preços Unitários",
    "Preços Totais",
];

/// Intra-cell separator for multi-valued columns. Reserved: sub-values may
/// not contain it.
const MULTI_SEP: char = ';';

/// Serializes the table, canonical header first, one record per row.
pub fn encode(table: &RequisitionTable) -> String {
    let mut out = String::new();
    out.push_str(&COLUMNS.join(","));
    out.push('\n');
    for requisition in &table.rows {
        let cells = row_cells(requisition);
        let line: Vec<String> = cells.iter().map(|c| quote_cell(c)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

/// Parses raw table text. Never fails: returns the decoded (and possibly
/// repaired) table together with diagnostics describing every repair made.
pub fn decode(raw: &str) -> (RequisitionTable, Vec<String>) {
    let mut diagnostics = Vec::new();
    let records = parse_records(raw);
    let Some((header, data)) = records.split_first() else {
        return (RequisitionTable::default(), diagnostics);
    };

    // Map each canonical column to its position in the actual header.
    let mut positions: [Option<usize>; COLUMNS.len()] = [None; COLUMNS.len()];
    for (canonical_index, name) in COLUMNS.iter().enumerate() {
        positions[canonical_index] = header.iter().position(|h| h.trim() == *name);
        if positions[canonical_index].is_none() {
            diagnostics.push(format!(
                "column '{}' missing from header; synthesized as empty",
                name
            ));
        }
    }

    let mut rows = Vec::with_capacity(data.len());
    for (record_index, record) in data.iter().enumerate() {
        let cell = |canonical_index: usize| -> &str {
            positions[canonical_index]
                .and_then(|i| record.get(i))
                .map(String::as_str)
                .unwrap_or("")
        };

        let status_text = cell(1).trim();
        let status = match RequisitionStatus::from_str(status_text) {
            Ok(status) => status,
            Err(_) => {
                if !status_text.is_empty() {
                    diagnostics.push(format!(
                        "row {}: unknown status '{}'; treated as {}",
                        record_index + 1,
                        status_text,
                        RequisitionStatus::Pending
                    ));
                }
                RequisitionStatus::Pending
            }
        };

        let items = zip_items(cell(5), cell(6), record_index, &mut diagnostics);
        let quotes = zip_quotes(cell(11), cell(12), cell(13), record_index, &mut diagnostics);

        rows.push(Requisition {
            id: cell(0).to_string(),
            status,
            requested_at: cell(2).to_string(),
            requester: cell(3).to_string(),
            cost_center: cell(4).to_string(),
            justification: cell(7).to_string(),
            delivery_location: cell(8).to_string(),
            approver: cell(9).to_string(),
            buyer: cell(10).to_string(),
            items,
            quotes,
        });
    }

    (RequisitionTable { rows }, diagnostics)
}

/// Minimum shape a payload must have before the sync layer may adopt it:
/// a header record carrying at least the `ID` and `Status` columns.
pub fn is_well_formed(raw: &str) -> bool {
    match parse_records(raw).first() {
        Some(header) => {
            header.iter().any(|h| h.trim() == "ID") && header.iter().any(|h| h.trim() == "Status")
        }
        None => false,
    }
}

fn row_cells(r: &Requisition) -> [String; COLUMNS.len()] {
    [
        r.id.clone(),
        r.status.to_string(),
        r.requested_at.clone(),
        r.requester.clone(),
        r.cost_center.clone(),
        join_multi(r.items.iter().map(|i| i.description.as_str())),
        join_multi(r.items.iter().map(|i| i.quantity.as_str())),
        r.justification.clone(),
        r.delivery_location.clone(),
        r.approver.clone(),
        r.buyer.clone(),
        join_multi(r.quotes.iter().map(|q| q.supplier.as_str())),
        join_multi(r.quotes.iter().map(|q| q.unit_price.as_str())),
        join_multi(r.quotes.iter().map(|q| q.total_price.as_str())),
    ]
}

fn join_multi<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(&MULTI_SEP.to_string())
}

fn split_multi(cell: &str) -> Vec<String> {
    if cell.is_empty() {
        Vec::new()
    } else {
        cell.split(MULTI_SEP).map(str::to_string).collect()
    }
}

fn quote_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn zip_items(
    descriptions: &str,
    quantities: &str,
    record_index: usize,
    diagnostics: &mut Vec<String>,
) -> Vec<ItemLine> {
    let mut descriptions = split_multi(descriptions);
    let mut quantities = split_multi(quantities);
    let len = descriptions.len().max(quantities.len());
    if descriptions.len() != quantities.len() {
        diagnostics.push(format!(
            "row {}: item descriptions and quantities have different lengths; padded with empty values",
            record_index + 1
        ));
    }
    descriptions.resize(len, String::new());
    quantities.resize(len, String::new());
    descriptions
        .into_iter()
        .zip(quantities)
        .map(|(description, quantity)| ItemLine {
            description,
            quantity,
        })
        .collect()
}

fn zip_quotes(
    suppliers: &str,
    unit_prices: &str,
    total_prices: &str,
    record_index: usize,
    diagnostics: &mut Vec<String>,
) -> Vec<QuoteLine> {
    let mut suppliers = split_multi(suppliers);
    let mut unit_prices = split_multi(unit_prices);
    let mut total_prices = split_multi(total_prices);
    let len = suppliers
        .len()
        .max(unit_prices.len())
        .max(total_prices.len());
    if suppliers.len() != len || unit_prices.len() != len || total_prices.len() != len {
        diagnostics.push(format!(
            "row {}: supplier quote columns have different lengths; padded with empty values",
            record_index + 1
        ));
    }
    suppliers.resize(len, String::new());
    unit_prices.resize(len, String::new());
    total_prices.resize(len, String::new());
    suppliers
        .into_iter()
        .zip(unit_prices)
        .zip(total_prices)
        .map(|((supplier, unit_price), total_price)| QuoteLine {
            supplier,
            unit_price,
            total_price,
        })
        .collect()
}

/// Quote-aware record parser. Cells may be wrapped in double quotes, with
/// `""` as the escape; quoted cells may contain commas and newlines.
/// Records where every cell is empty (blank lines included) are dropped.
fn parse_records(raw: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;

    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(c);
            }
            continue;
        }
        match c {
            '"' if cell.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut cell)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                flush_record(&mut records, &mut record, &mut cell);
            }
            '\n' => flush_record(&mut records, &mut record, &mut cell),
            _ => cell.push(c),
        }
    }
    flush_record(&mut records, &mut record, &mut cell);
    records
}

fn flush_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, cell: &mut String) {
    record.push(std::mem::take(cell));
    let finished = std::mem::take(record);
    if finished.iter().any(|c| !c.is_empty()) {
        records.push(finished);
    }
}
