//! Extraction of the first `<table>` element from a metadata page.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::table::RawTable;

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("static selector is valid"));

/// Parse the first table of `html`.
///
/// The header is the first row made only of `<th>` cells, or the first row
/// when no such row exists. Rows of tables nested inside cells are not
/// rows of the outer table. Returns `None` when the page has no table.
pub fn first_table(html: &str) -> Option<RawTable> {
    let document = Html::parse_document(html);
    let table = document.select(&TABLE).next()?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for row in own_rows(table) {
        let (cells, all_header_cells) = row_cells(row);
        if cells.is_empty() {
            continue;
        }
        if headers.is_none() && (all_header_cells || rows.is_empty()) {
            headers = Some(cells);
        } else {
            rows.push(cells);
        }
    }

    Some(RawTable::new(headers.unwrap_or_default(), rows))
}

/// `<tr>` elements of `table` itself, directly or through its row groups.
fn own_rows(table: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    table
        .children()
        .filter_map(ElementRef::wrap)
        .flat_map(|child| match child.value().name() {
            "tr" => vec![child],
            "thead" | "tbody" | "tfoot" => child
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|row| row.value().name() == "tr")
                .collect(),
            _ => Vec::new(),
        })
}

/// Text of the direct `<th>`/`<td>` children of a row, and whether every
/// one of them was a `<th>`.
fn row_cells(row: ElementRef<'_>) -> (Vec<String>, bool) {
    let mut all_header_cells = true;
    let cells = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "th" | "td"))
        .map(|cell| {
            all_header_cells &= cell.value().name() == "th";
            collapse_whitespace(&cell.text().collect::<String>())
        })
        .collect();
    (cells, all_header_cells)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
