use anyhow::Result;
use comfy_table::Table;

pub fn print_table(table: Table) -> Result<()> {
    println!("{table}");
    Ok(())
}

/// Table with the given header, or `None` when there are no rows to show.
pub fn table_with_header(header: Vec<&str>, rows: Vec<Vec<String>>) -> Option<Table> {
    if rows.is_empty() {
        return None;
    }
    let mut table = Table::new();
    table.set_header(header);
    for row in rows {
        table.add_row(row);
    }
    Some(table)
}
