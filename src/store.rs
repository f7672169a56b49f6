use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::models::{Expense, OperationRecord};

pub const RECORDS_FILE: &str = "registros.json";
pub const EXPENSES_FILE: &str = "gastos.json";

/// Read a JSON array of objects. A missing file, unreadable file or anything
/// that is not a JSON array reads as an empty store.
fn read_array(path: &Path) -> Vec<Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %path.display(), "store not readable, starting empty: {e}");
            return Vec::new();
        }
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "store is not a JSON array, treating as empty");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "store contains invalid JSON, treating as empty: {e}");
            Vec::new()
        }
    }
}

/// What a store file held: the entries that parsed, plus every unreadable
/// entry as the JSON it was read as. Each kept entry remembers how many
/// readable entries preceded it, so it goes back to the same spot on save.
#[derive(Debug, Clone, PartialEq)]
pub struct Contents<T> {
    items: Vec<T>,
    kept: Vec<(usize, Value)>,
}

impl<T> Contents<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn remove(&mut self, pos: usize) -> T {
        for (before, _) in &mut self.kept {
            if *before > pos {
                *before -= 1;
            }
        }
        self.items.remove(pos)
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Entries in file order.
    fn slots(&self) -> Vec<Slot<'_, T>> {
        let mut kept = self.kept.iter().peekable();
        let mut slots = Vec::with_capacity(self.items.len() + self.kept.len());
        for i in 0..=self.items.len() {
            while let Some((_, raw)) = kept.next_if(|(before, _)| *before <= i) {
                slots.push(Slot::Raw(raw));
            }
            if let Some(item) = self.items.get(i) {
                slots.push(Slot::Item(item));
            }
        }
        slots
    }
}

impl<T> std::ops::Index<usize> for Contents<T> {
    type Output = T;

    fn index(&self, pos: usize) -> &T {
        &self.items[pos]
    }
}

impl<T> std::ops::IndexMut<usize> for Contents<T> {
    fn index_mut(&mut self, pos: usize) -> &mut T {
        &mut self.items[pos]
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Slot<'a, T> {
    Item(&'a T),
    Raw(&'a Value),
}

/// Deserialize each entry on its own so a single malformed entry does not
/// hide the rest of the file. `normalize` runs on a copy; an unreadable entry
/// keeps its original JSON.
fn read_contents<T: DeserializeOwned>(path: &Path, normalize: impl Fn(&mut Value)) -> Contents<T> {
    let mut contents = Contents {
        items: Vec::new(),
        kept: Vec::new(),
    };
    for (i, raw) in read_array(path).into_iter().enumerate() {
        let mut item = raw.clone();
        normalize(&mut item);
        match serde_json::from_value(item) {
            Ok(v) => contents.items.push(v),
            Err(e) => {
                tracing::warn!(path = %path.display(), entry = i, "unreadable entry left untouched: {e}");
                contents.kept.push((contents.items.len(), raw));
            }
        }
    }
    contents
}

/// Overwrite `path` with the whole list, pretty-printed with 4-space indents.
fn write_array<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    items.serialize(&mut ser)?;
    buf.push(b'\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, buf)?;
    tracing::info!(path = %path.display(), count = items.len(), "store saved");
    Ok(())
}

// ---------------------------------------------------------------------------
// Operation records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(RECORDS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Vec<OperationRecord> {
        self.load_for_year(chrono::Local::now().year())
    }

    /// Load, filling a missing `ano` with `current_year` and a missing
    /// `tipo_operacao` with the untyped placeholder. The backfill lives in
    /// memory until the next save.
    pub fn load_for_year(&self, current_year: i32) -> Vec<OperationRecord> {
        self.contents_for_year(current_year).into_items()
    }

    pub fn contents(&self) -> Contents<OperationRecord> {
        self.contents_for_year(chrono::Local::now().year())
    }

    fn contents_for_year(&self, current_year: i32) -> Contents<OperationRecord> {
        read_contents(&self.path, |item| {
            if let Some(obj) = item.as_object_mut() {
                obj.entry("ano").or_insert_with(|| Value::from(current_year));
                obj.entry("tipo_operacao")
                    .or_insert_with(|| Value::String(String::new()));
            }
        })
    }

    /// Overwrite the file with exactly `records`.
    pub fn save(&self, records: &[OperationRecord]) -> Result<()> {
        write_array(&self.path, records)
    }

    /// Rewrite the file from `contents`, unreadable entries included.
    pub fn save_contents(&self, contents: &Contents<OperationRecord>) -> Result<()> {
        write_array(&self.path, &contents.slots())
    }
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExpenseStore {
    path: PathBuf,
}

impl ExpenseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(EXPENSES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Vec<Expense> {
        self.contents().into_items()
    }

    pub fn contents(&self) -> Contents<Expense> {
        read_contents(&self.path, |_| {})
    }

    pub fn save(&self, expenses: &[Expense]) -> Result<()> {
        write_array(&self.path, expenses)
    }

    pub fn save_contents(&self, contents: &Contents<Expense>) -> Result<()> {
        write_array(&self.path, &contents.slots())
    }
}

/// Both stores of one data directory.
#[derive(Debug, Clone)]
pub struct Stores {
    pub records: RecordStore,
    pub expenses: ExpenseStore,
}

impl Stores {
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            records: RecordStore::in_dir(data_dir),
            expenses: ExpenseStore::in_dir(data_dir),
        }
    }
}
