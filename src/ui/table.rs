use crate::Result;
use comfy_table::Table;
use std::fmt::Display;

/// Prints a borderless table with the padding comfy-table leaves at line
/// edges removed.
pub fn print_table(table: Table) -> Result<()> {
    let table = table.to_string();
    for line in table.lines() {
        println!("{}", line.trim());
    }
    Ok(())
}

/// Cell text for an optional value; absent values render as "-".
pub fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
