//! Header translation table for localized price history exports

/// Canonical name of the date column (deduplication and sort key)
pub const DATE_COLUMN: &str = "Date";

/// Canonical name of the closing price column
pub const CLOSE_COLUMN: &str = "Close";

/// Columns every normalized table must carry
pub const REQUIRED_COLUMNS: &[&str] = &[DATE_COLUMN, CLOSE_COLUMN];

/// Known header variants and the canonical name each one maps to.
///
/// `Price` is the "last traded price" column of English exports and is kept
/// as an alias of `Close`.
pub const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("Fecha", "Date"),
    ("Date", "Date"),
    ("Último", "Close"),
    ("Ultimo", "Close"),
    ("Price", "Close"),
    ("Cierre", "Close"),
    ("Apertura", "Open"),
    ("Open", "Open"),
    ("Máximo", "High"),
    ("High", "High"),
    ("Mínimo", "Low"),
    ("Low", "Low"),
    ("Vol.", "Volume"),
    ("% var.", "Change%"),
    ("Change %", "Change%"),
];

/// Look up the canonical name for a header (exact, case-sensitive)
pub fn canonical_name(header: &str) -> Option<&'static str> {
    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == header)
        .map(|(_, canonical)| *canonical)
}

/// Rename a header, passing unknown headers through unchanged
pub fn rename_header(header: &str) -> String {
    canonical_name(header).unwrap_or(header).to_string()
}
