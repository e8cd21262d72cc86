//! Text format of the persisted learning tables.
//!
//! ```text
//! qtable 1 <N>
//! <count>
//! <key> <utility_0> .. <utility_N-1>
//! <count>
//! <key> <visits_0> .. <visits_N-1>
//! ```
//! Rows are written in ascending key order.

use std::fmt::Display;
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use itertools::Itertools;

use crate::learn::table::{QTable, VisitTable};
use crate::prelude::{QlError, StateKey, View};

const MAGIC: &str = "qtable";
const FORMAT_VERSION: u32 = 1;

/// Writes both tables to `path`.
///
/// The content goes to a temporary file in the same directory first, which is then renamed over `path`,
/// so an interrupted write never leaves a truncated table behind.
pub fn save_tables<V: View, const N: usize>(path: &Path, utilities: &QTable<V, N>, visits: &VisitTable<V, N>) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("failed to create table directory {}", dir.display()))?;
    }
    let tmp_path = temp_path(path);
    {
        let file = File::create(&tmp_path).with_context(|| format!("failed to create {}", tmp_path.display()))?;
        let mut w = BufWriter::new(file);
        write_tables(&mut w, utilities, visits).with_context(|| format!("failed to write {}", tmp_path.display()))?;
        let file = w.into_inner().map_err(|e| e.into_error()).with_context(|| format!("failed to flush {}", tmp_path.display()))?;
        file.sync_all().with_context(|| format!("failed to sync {}", tmp_path.display()))?;
    }
    fs::rename(&tmp_path, path).with_context(|| format!("failed to rename {} to {}", tmp_path.display(), path.display()))?;
    log::debug!("saved {} utility rows and {} visit rows to {}", utilities.len(), visits.len(), path.display());
    Ok(())
}

/// Reads both tables from `path`. A missing file yields empty tables.
pub fn load_tables<V: View, const N: usize>(path: &Path) -> Result<(QTable<V, N>, VisitTable<V, N>)> {
    if !path.exists() {
        log::debug!("no table file at {} - starting from scratch", path.display());
        return Ok((QTable::new(), VisitTable::new()));
    }
    let content = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let tables = parse_tables(&content).with_context(|| format!("malformed table file {}", path.display()))?;
    log::debug!("loaded {} utility rows and {} visit rows from {}", tables.0.len(), tables.1.len(), path.display());
    Ok(tables)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_tables<W: Write, V: View, const N: usize>(w: &mut W, utilities: &QTable<V, N>, visits: &VisitTable<V, N>) -> std::io::Result<()> {
    writeln!(w, "{} {} {}", MAGIC, FORMAT_VERSION, N)?;
    write_block(w, &utilities.sorted_rows())?;
    write_block(w, &visits.sorted_rows())
}

fn write_block<W: Write, V: View, T: Display, const N: usize>(w: &mut W, rows: &[(StateKey<V>, [T; N])]) -> std::io::Result<()> {
    writeln!(w, "{}", rows.len())?;
    for (key, row) in rows {
        writeln!(w, "{} {}", key, row.iter().join(" "))?;
    }
    Ok(())
}

fn parse_tables<V: View, const N: usize>(content: &str) -> Result<(QTable<V, N>, VisitTable<V, N>)> {
    let mut lines = Lines::new(content);

    let header = lines.next_fields()?;
    match header.as_slice() {
        [magic, version, slots] if *magic == MAGIC => {
            let version: u32 = lines.parse(version)?;
            if version != FORMAT_VERSION {
                return Err(QlError(format!("unsupported format version {}", version)).into());
            }
            let slots: usize = lines.parse(slots)?;
            if slots != N {
                return Err(QlError(format!("table has {} action slots, expected {}", slots, N)).into());
            }
        }
        _ => return Err(lines.error("missing table header")),
    }

    let mut utilities = QTable::new();
    for (key, row) in read_block::<V, f32, N>(&mut lines)? {
        if utilities.insert(key, row).is_some() {
            return Err(QlError(format!("duplicate utility row for key {}", key)).into());
        }
    }
    let mut visits = VisitTable::new();
    for (key, row) in read_block::<V, u32, N>(&mut lines)? {
        if visits.insert(key, row).is_some() {
            return Err(QlError(format!("duplicate visit row for key {}", key)).into());
        }
    }
    if lines.next_fields().is_ok() {
        return Err(lines.error("unexpected content after visit table"));
    }
    Ok((utilities, visits))
}

fn read_block<V: View, T, const N: usize>(lines: &mut Lines) -> Result<Vec<(StateKey<V>, [T; N])>>
where
    T: FromStr + Copy + Default,
{
    let count: usize = match lines.next_fields()?.as_slice() {
        [count] => lines.parse(count)?,
        _ => return Err(lines.error("expected row count")),
    };
    // the count is untrusted, rows are only allocated as they are read
    let mut rows = Vec::new();
    for _ in 0..count {
        let fields = lines.next_fields()?;
        if fields.len() != N + 1 {
            return Err(lines.error(&format!("expected key and {} values, found {} fields", N, fields.len())));
        }
        let key = StateKey::new(lines.parse(fields[0])?);
        let mut row = [T::default(); N];
        for (slot, field) in row.iter_mut().zip(&fields[1..]) {
            *slot = lines.parse(field)?;
        }
        rows.push((key, row));
    }
    Ok(rows)
}

/// Line cursor which remembers the line number for error messages
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    line_no: usize,
}

impl<'a> Lines<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            inner: content.lines().enumerate(),
            line_no: 0,
        }
    }

    /// Whitespace separated fields of the next non-empty line
    fn next_fields(&mut self) -> Result<Vec<&'a str>> {
        for (i, line) in self.inner.by_ref() {
            self.line_no = i + 1;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if !fields.is_empty() {
                return Ok(fields);
            }
        }
        Err(QlError(format!("unexpected end of file after line {}", self.line_no)).into())
    }

    fn parse<T: FromStr>(&self, field: &str) -> Result<T> {
        field
            .parse::<T>()
            .map_err(|_| self.error(&format!("invalid number '{}'", field)))
    }

    fn error(&self, msg: &str) -> anyhow::Error {
        QlError(format!("line {}: {}", self.line_no, msg)).into()
    }
}
