use std::path::Path;

use calamine::Data;

use crate::error::FitError;
use crate::io::excel_io::first_sheet;

/// Spreadsheet column letters: 0 -> A, 25 -> Z, 26 -> AA.
fn column_letter(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().replace('|', "\\|").replace('\n', " "),
    }
}

/// Render the first sheet of a workbook as a markdown table.
///
/// The header row holds a blank corner cell followed by column letters; every sheet row is
/// prefixed with its 1-based row number. Cell values are transcribed verbatim.
pub fn excel_to_markdown(path: impl AsRef<Path>) -> Result<String, FitError> {
    let range = first_sheet(path.as_ref())?;
    let (row_offset, col_offset) = range
        .start()
        .map_or((0, 0), |(r, c)| (r as usize, c as usize));
    let width = range.width();

    let mut out = String::new();
    let header: Vec<String> = (0..width).map(|c| column_letter(col_offset + c)).collect();
    out.push_str(&format!("|   | {} |\n", header.join(" | ")));
    out.push_str(&format!("|---|{}\n", "---|".repeat(width)));

    for (idx, row) in range.rows().enumerate() {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        out.push_str(&format!("| {} | {} |\n", row_offset + idx + 1, cells.join(" | ")));
    }

    Ok(out)
}
