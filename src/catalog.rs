//! Gettext PO catalogs.
//!
//! The reader keeps the raw text of every block, so a catalog that is
//! loaded and saved without changes is written back byte for byte. Only
//! entries touched through [`Entry::set_msgstr`], [`Entry::set_msgstr_plural`]
//! or [`Entry::add_flag`] are re-rendered, and even then their comments and
//! source lines are copied verbatim: only the flags line and the `msgstr`
//! lines are regenerated.

use crate::error::CatalogError;
use regex::Regex;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// `keyword[index] "value"` on a single (trimmed) line.
static KEYWORD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(msgctxt|msgid_plural|msgid|msgstr)(?:\[(\d+)\])?\s+(".*")$"#)
        .expect("keyword pattern is valid")
});

const BOM: &str = "\u{feff}";

/// Flag marking a translation as needing review.
pub const FUZZY_FLAG: &str = "fuzzy";

/// One message in a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    raw: String,
    modified: bool,
    /// Comment lines (with terminators), flag lines excluded.
    comments: Vec<String>,
    /// Position of the original `#,` line within `comments`.
    flags_at: Option<usize>,
    flags: Vec<String>,
    /// Raw `msgctxt` / `msgid` / `msgid_plural` lines including continuations.
    source_lines: String,
    msgctxt: Option<String>,
    msgid: String,
    msgid_plural: Option<String>,
    msgstr: Vec<String>,
    eol: &'static str,
}

impl Entry {
    pub fn msgctxt(&self) -> Option<&str> {
        self.msgctxt.as_deref()
    }

    pub fn msgid(&self) -> &str {
        &self.msgid
    }

    pub fn msgid_plural(&self) -> Option<&str> {
        self.msgid_plural.as_deref()
    }

    /// Singular translation, or `msgstr[0]` for plural entries.
    pub fn msgstr(&self) -> &str {
        self.msgstr.first().map(String::as_str).unwrap_or("")
    }

    /// All translation slots, in index order.
    pub fn msgstr_plural(&self) -> &[String] {
        &self.msgstr
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn is_plural(&self) -> bool {
        self.msgid_plural.is_some()
    }

    pub fn is_fuzzy(&self) -> bool {
        self.has_flag(FUZZY_FLAG)
    }

    /// Translated in the gettext sense: not fuzzy and no empty `msgstr` slot.
    pub fn is_translated(&self) -> bool {
        !self.is_fuzzy() && !self.msgstr.is_empty() && self.msgstr.iter().all(|s| !s.is_empty())
    }

    /// Whether the entry will be re-rendered on save.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_msgstr(&mut self, translation: String) {
        self.msgstr = vec![translation];
        self.modified = true;
    }

    pub fn set_msgstr_plural(&mut self, translations: Vec<String>) {
        self.msgstr = translations;
        self.modified = true;
    }

    /// Adds `flag` unless already present.
    pub fn add_flag(&mut self, flag: &str) {
        if !self.has_flag(flag) {
            self.flags.push(flag.to_string());
            self.modified = true;
        }
    }

    fn write_to<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        if !self.modified {
            return out.write_str(&self.raw);
        }

        // gettext puts flags after references and before previous-msgid comments
        let flags_pos = self.flags_at.unwrap_or_else(|| {
            self.comments
                .iter()
                .position(|c| c.starts_with("#|"))
                .unwrap_or(self.comments.len())
        });
        for index in 0..=self.comments.len() {
            if index == flags_pos && !self.flags.is_empty() {
                write!(out, "#, {}{}", self.flags.join(", "), self.eol)?;
            }
            if let Some(comment) = self.comments.get(index) {
                out.write_str(comment)?;
            }
        }

        out.write_str(&self.source_lines)?;
        if !self.source_lines.ends_with('\n') {
            out.write_str(self.eol)?;
        }

        if self.is_plural() {
            for (index, value) in self.msgstr.iter().enumerate() {
                write_field(out, &format!("msgstr[{}]", index), value, self.eol)?;
            }
        } else {
            write_field(out, "msgstr", self.msgstr(), self.eol)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    /// Blank lines, stray comments and obsolete (`#~`) entries.
    Verbatim(String),
    Entry(Entry),
}

/// A PO file held in memory.
#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
    /// The file started with a UTF-8 byte order mark.
    bom: bool,
    blocks: Vec<Block>,
    /// Index into `blocks` of every entry, in file order.
    entry_slots: Vec<usize>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Parses catalog text; `path` is where [`Catalog::save`] will write.
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self, CatalogError> {
        let path = path.into();
        let (bom, text) = match text.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let mut blocks = Vec::new();
        let mut pending: Option<EntryBuilder> = None;

        for (index, line) in text.split_inclusive('\n').enumerate() {
            let line_no = index + 1;
            let parse_error = |message: String| CatalogError::Parse {
                path: path.clone(),
                line: line_no,
                message,
            };
            let trimmed = line.trim();

            if trimmed.is_empty() {
                flush(&mut pending, &mut blocks);
                blocks.push(Block::Verbatim(line.to_string()));
                continue;
            }

            if trimmed.starts_with('#') {
                if pending.as_ref().is_some_and(|b| b.msgid.is_some()) {
                    flush(&mut pending, &mut blocks);
                }
                pending
                    .get_or_insert_with(EntryBuilder::default)
                    .push_comment(line, trimmed);
                continue;
            }

            if let Some(caps) = KEYWORD_LINE.captures(trimmed) {
                let field = match (&caps[1], caps.get(2)) {
                    ("msgctxt", None) => Field::Context,
                    ("msgid", None) => Field::Id,
                    ("msgid_plural", None) => Field::IdPlural,
                    ("msgstr", None) => Field::Str(0),
                    ("msgstr", Some(n)) => Field::Str(n.as_str().parse().map_err(|_| {
                        parse_error(format!("invalid msgstr index {:?}", n.as_str()))
                    })?),
                    (keyword, Some(_)) => {
                        return Err(parse_error(format!("{} does not take an index", keyword)));
                    }
                    (keyword, None) => {
                        return Err(parse_error(format!("unknown keyword {}", keyword)));
                    }
                };
                let value = unquote(&caps[3]);

                let starts_new = matches!(field, Field::Context | Field::Id)
                    && pending.as_ref().is_some_and(|b| b.msgid.is_some());
                if starts_new {
                    flush(&mut pending, &mut blocks);
                }
                let builder = pending.get_or_insert_with(EntryBuilder::default);
                if matches!(field, Field::IdPlural | Field::Str(_)) && builder.msgid.is_none() {
                    return Err(parse_error(format!("{} before msgid", &caps[1])));
                }
                builder.set(field, value, line);
                continue;
            }

            if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
                let builder = pending
                    .as_mut()
                    .filter(|b| b.current.is_some())
                    .ok_or_else(|| parse_error("string without a keyword".to_string()))?;
                builder.append(unquote(trimmed), line);
                continue;
            }

            return Err(parse_error(format!("unexpected line {:?}", trimmed)));
        }
        flush(&mut pending, &mut blocks);

        let entry_slots = blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| matches!(block, Block::Entry(_)))
            .map(|(index, _)| index)
            .collect();

        Ok(Self {
            path,
            bom,
            blocks,
            entry_slots,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries, header included.
    pub fn len(&self) -> usize {
        self.entry_slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_slots.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Entry(entry) => Some(entry),
            Block::Verbatim(_) => None,
        })
    }

    pub fn entry(&self, index: usize) -> Option<&Entry> {
        match self.blocks.get(*self.entry_slots.get(index)?) {
            Some(Block::Entry(entry)) => Some(entry),
            _ => None,
        }
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut Entry> {
        let slot = *self.entry_slots.get(index)?;
        match self.blocks.get_mut(slot) {
            Some(Block::Entry(entry)) => Some(entry),
            _ => None,
        }
    }

    /// First entry with the given source text (and no context).
    pub fn find(&self, msgid: &str) -> Option<&Entry> {
        self.entries()
            .find(|entry| entry.msgctxt.is_none() && entry.msgid == msgid)
    }

    /// Writes the catalog back to its path through a temp file and rename.
    pub fn save(&self) -> Result<(), CatalogError> {
        write_atomic(&self.path, &self.to_string()).map_err(|source| CatalogError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bom {
            f.write_str(BOM)?;
        }
        for block in &self.blocks {
            match block {
                Block::Verbatim(text) => f.write_str(text)?,
                Block::Entry(entry) => entry.write_to(f)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Context,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Default)]
struct EntryBuilder {
    raw: String,
    comments: Vec<String>,
    flags_at: Option<usize>,
    flags: Vec<String>,
    source_lines: String,
    msgctxt: Option<String>,
    msgid: Option<String>,
    msgid_plural: Option<String>,
    msgstr: Vec<String>,
    current: Option<Field>,
    eol: Option<&'static str>,
}

impl EntryBuilder {
    fn note_line(&mut self, line: &str) {
        if self.eol.is_none() {
            self.eol = Some(if line.ends_with("\r\n") { "\r\n" } else { "\n" });
        }
        self.raw.push_str(line);
    }

    fn push_comment(&mut self, line: &str, trimmed: &str) {
        self.note_line(line);
        self.current = None;
        if let Some(flags) = trimmed.strip_prefix("#,") {
            if self.flags_at.is_none() {
                self.flags_at = Some(self.comments.len());
            }
            self.flags.extend(
                flags
                    .split(',')
                    .map(str::trim)
                    .filter(|flag| !flag.is_empty())
                    .map(str::to_string),
            );
        } else {
            self.comments.push(line.to_string());
        }
    }

    fn set(&mut self, field: Field, value: String, line: &str) {
        self.note_line(line);
        self.current = Some(field);
        match field {
            Field::Context => self.msgctxt = Some(value),
            Field::Id => self.msgid = Some(value),
            Field::IdPlural => self.msgid_plural = Some(value),
            Field::Str(index) => {
                if self.msgstr.len() <= index {
                    self.msgstr.resize(index + 1, String::new());
                }
                self.msgstr[index] = value;
            }
        }
        if !matches!(field, Field::Str(_)) {
            self.source_lines.push_str(line);
        }
    }

    fn append(&mut self, value: String, line: &str) {
        self.note_line(line);
        let target = match self.current {
            Some(Field::Context) => self.msgctxt.as_mut(),
            Some(Field::Id) => self.msgid.as_mut(),
            Some(Field::IdPlural) => self.msgid_plural.as_mut(),
            Some(Field::Str(index)) => self.msgstr.get_mut(index),
            None => None,
        };
        if let Some(target) = target {
            target.push_str(&value);
        }
        if !matches!(self.current, Some(Field::Str(_))) {
            self.source_lines.push_str(line);
        }
    }

    fn build(self) -> Block {
        let Some(msgid) = self.msgid else {
            return Block::Verbatim(self.raw);
        };
        Block::Entry(Entry {
            raw: self.raw,
            modified: false,
            comments: self.comments,
            flags_at: self.flags_at,
            flags: self.flags,
            source_lines: self.source_lines,
            msgctxt: self.msgctxt,
            msgid,
            msgid_plural: self.msgid_plural,
            msgstr: self.msgstr,
            eol: self.eol.unwrap_or("\n"),
        })
    }
}

fn flush(pending: &mut Option<EntryBuilder>, blocks: &mut Vec<Block>) {
    if let Some(builder) = pending.take() {
        blocks.push(builder.build());
    }
}

/// Writes `keyword "value"`, or the multi-line `keyword ""` form when the
/// value has embedded newlines.
fn write_field<W: fmt::Write>(out: &mut W, keyword: &str, value: &str, eol: &str) -> fmt::Result {
    let chunks: Vec<&str> = value.split_inclusive('\n').collect();
    if chunks.len() <= 1 {
        return write!(out, "{} \"{}\"{}", keyword, escape(value), eol);
    }
    write!(out, "{} \"\"{}", keyword, eol)?;
    for chunk in chunks {
        write!(out, "\"{}\"{}", escape(chunk), eol)?;
    }
    Ok(())
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Remove surrounding quotes and unescape in a single pass.
fn unquote(s: &str) -> String {
    let s = s.trim();
    let s = s.strip_prefix('"').unwrap_or(s);
    let s = s.strip_suffix('"').unwrap_or(s);

    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// Writes content to a file atomically.
///
/// Uses a `.tmp` sibling, then renames over the final path, so a crash
/// mid-write never leaves a truncated catalog behind.
fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, content)?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(())
}
