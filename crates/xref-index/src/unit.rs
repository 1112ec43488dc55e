//! Processing of a single translation unit.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use xref_core::{FileEntry, FileHandle, Link, Markup, TokenKind, WHOLE_FILE};

use crate::dump::{CursorRecord, DumpFile, TuDump};
use crate::{DumpIndex, Result};

/// What one TU contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitStats {
    /// Files this TU populated (first to claim them).
    pub files_claimed: usize,
    /// Definitions registered in the definition index.
    pub definitions: usize,
    /// Markups added to claimed files.
    pub markups: usize,
}

/// Display name of a declaration: spelling plus offset, safe for HTML ids.
pub fn file_unique_name(spelling: &str, offset: u32) -> String {
    let mut name: String = spelling
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        name.push('_');
    }
    format!("{}_{}", name, offset)
}

/// Markups of one claimed file, keyed by span so cursor data merges into
/// the token at the same range.
type PendingMarkups = BTreeMap<(u32, u32), Markup>;

/// Feed `dump` into `index`. `base` resolves relative file paths.
///
/// Only files this TU wins the claim for receive text and markups; every
/// other included file still gets its symbols referenced and definitions
/// registered. A dump referencing a file it does not list is rejected
/// before the index is touched.
#[instrument(skip_all, fields(unit = %dump.display_name()), level = "debug")]
pub fn process_tu(index: &DumpIndex, dump: &TuDump, base: &Path) -> Result<UnitStats> {
    dump.validate()?;
    let files = dump.resolve_files(base);
    let mut stats = UnitStats::default();

    let claimed: Vec<Option<Arc<FileEntry>>> = files
        .iter()
        .map(|f| index.prepare_to_process(f))
        .collect();
    let mut pending: Vec<Option<PendingMarkups>> = claimed
        .iter()
        .map(|c| c.as_ref().map(|_| PendingMarkups::new()))
        .collect();

    for (file, entry) in files.iter().zip(&claimed) {
        let Some(entry) = entry else { continue };
        stats.files_claimed += 1;
        let path = file.path();
        match std::fs::read_to_string(&path) {
            Ok(text) => entry.highlighted().set_text(text),
            Err(e) => warn!(path = %path.display(), error = %e, "cannot read source"),
        }
    }

    for token in &dump.tokens {
        if let Some(markups) = pending[token.file].as_mut() {
            let kind = TokenKind::from_name(&token.kind).unwrap_or_else(|| {
                debug!(kind = %token.kind, "unknown token kind");
                TokenKind::Plain
            });
            markups.insert((token.begin, token.end), Markup::new(token.begin, token.end, kind));
        }
    }

    for cursor in &dump.cursors {
        let markup = process_cursor(index, &files, cursor, &mut stats);
        if let (Some(markups), Some(update)) = (pending[cursor.file].as_mut(), markup) {
            merge(markups, update);
        }
    }

    for include in &dump.includes {
        let Some(markups) = pending[include.file].as_mut() else {
            continue;
        };
        let target = &files[include.target];
        if let Some(decl) = index.reference_symbol(target, 0, WHOLE_FILE, String::new) {
            let update = Markup::new(include.begin, include.end, TokenKind::Preprocessor)
                .with_link(Link::Symbol(decl));
            merge(markups, update);
        }
    }

    for (entry, markups) in claimed.iter().zip(pending) {
        if let (Some(entry), Some(markups)) = (entry, markups) {
            stats.markups += markups.len();
            entry.highlighted().extend_markups(markups.into_values());
        }
    }

    debug!(
        claimed = stats.files_claimed,
        definitions = stats.definitions,
        markups = stats.markups,
        "unit processed"
    );
    Ok(stats)
}

/// Register what `cursor` declares or references; return its markup.
fn process_cursor(
    index: &DumpIndex,
    files: &[DumpFile],
    cursor: &CursorRecord,
    stats: &mut UnitStats,
) -> Option<Markup> {
    let file = &files[cursor.file];
    if index.obtain_file_entry(file).is_none() {
        return None;
    }

    let kind = cursor
        .kind
        .as_deref()
        .and_then(TokenKind::from_name)
        .unwrap_or(TokenKind::Plain);
    let mut markup = Markup::new(cursor.offset, cursor.end, kind);

    // Cursors without a referenced location declare the entity right here.
    if cursor.is_definition || cursor.referenced.is_none() {
        let decl = index.reference_symbol(file, cursor.line, cursor.offset, || {
            file_unique_name(&cursor.spelling, cursor.offset)
        })?;
        match &cursor.usr {
            Some(usr) if cursor.is_definition => {
                index.register_def(usr.clone(), &decl);
                stats.definitions += 1;
            }
            // Plain declarations link to the definition, wherever it ends up.
            Some(usr) => markup.link = Link::MissingDef(usr.clone()),
            None => {}
        }
        markup.anchor = Some(decl);
    }

    if let Some(target) = &cursor.referenced {
        let decl = target.file.and_then(|fi| {
            index.reference_symbol(&files[fi], target.line, target.offset, || {
                file_unique_name(&cursor.spelling, target.offset)
            })
        });
        match decl {
            // A definition referencing itself needs no link.
            Some(decl) if markup.anchor.as_ref().is_some_and(|a| Arc::ptr_eq(a, &decl)) => {}
            Some(decl) => markup.link = Link::Symbol(decl),
            None => {
                index.link_external_ref(&mut markup, cursor);
                if matches!(markup.link, Link::None) {
                    if let Some(usr) = target.usr.as_ref().or(cursor.usr.as_ref()) {
                        markup.link = Link::MissingDef(usr.clone());
                    }
                }
            }
        }
    }

    Some(markup)
}

/// Merge cursor data into the markup already recorded for the same span.
fn merge(markups: &mut PendingMarkups, update: Markup) {
    let slot = markups
        .entry((update.begin, update.end))
        .or_insert_with(|| Markup::new(update.begin, update.end, TokenKind::Plain));
    if update.kind != TokenKind::Plain {
        slot.kind = update.kind;
    }
    if update.anchor.is_some() {
        slot.anchor = update.anchor;
    }
    if !matches!(update.link, Link::None) {
        slot.link = update.link;
    }
}
