//! Plain-text emitter.
//!
//! Writes one line per event in the stable format consumed by editor
//! integrations: `fileName(line:column)[error|warn]: message`.

use std::io::{self, Write};

use crate::Diagnostic;

/// Write all diagnostics to `out`, one line each.
pub fn write_all<W: Write>(
    out: &mut W,
    file_name: &str,
    diagnostics: &[Diagnostic],
) -> io::Result<()> {
    for diagnostic in diagnostics {
        writeln!(out, "{}", diagnostic.render(file_name))?;
    }
    Ok(())
}
