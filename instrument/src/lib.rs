//! Event sink for simulation traces.
//!
//! The engine emits structured `tracing` events, one target per kind of
//! occurrence (`trade`, `payment_failed`, `produce`, `consume`, `manufact`,
//! `tick`). `EventSubscriber` records each event as a row in a per-target
//! table held in a thread-local `Recorder`. Tables convert to polars
//! DataFrames for analysis and can be written out as parquet.
//!
//! # Usage
//!
//! ```ignore
//! instrument::install_subscriber();
//! world.run(100)?;
//! let recorder = instrument::drain();
//! let trades = &recorder.tables["trade"];
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Level, Metadata, Subscriber};

/// A single recorded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            Value::I64(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            Value::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            Value::U64(v) => Some(*v as f64),
            Value::I64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// One event: field name -> value.
pub type Row = BTreeMap<&'static str, Value>;

/// All events recorded under one target, in emission order.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    pub rows: Vec<Row>,
}

impl EventTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column view: one entry per row, `None` where the row lacks the field.
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Option<&'a Value>> + 'a {
        self.rows.iter().map(move |row| row.get(name))
    }

    pub fn u64s(&self, name: &str) -> Vec<Option<u64>> {
        self.column(name).map(|v| v.and_then(Value::as_u64)).collect()
    }

    pub fn i64s(&self, name: &str) -> Vec<Option<i64>> {
        self.column(name).map(|v| v.and_then(Value::as_i64)).collect()
    }

    pub fn strs(&self, name: &str) -> Vec<Option<String>> {
        self.column(name)
            .map(|v| v.and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    /// Field names seen in any row, sorted.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.rows.iter().flat_map(|r| r.keys().copied()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Tables keyed by tracing target.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub tables: BTreeMap<String, EventTable>,
}

impl Recorder {
    /// Rows recorded under `target`; zero if the target never fired.
    pub fn count(&self, target: &str) -> usize {
        self.tables.get(target).map_or(0, EventTable::len)
    }
}

thread_local! {
    static RECORDER: RefCell<Recorder> = RefCell::default();
}

struct RowVisitor<'a> {
    row: &'a mut Row,
}

impl Visit for RowVisitor<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.row.insert(field.name(), Value::U64(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.row.insert(field.name(), Value::I64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.row.insert(field.name(), Value::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.row.insert(field.name(), Value::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.row.insert(field.name(), Value::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.row.insert(field.name(), Value::Str(format!("{:?}", value)));
    }
}

/// Tracing subscriber that appends INFO-and-above events to the thread-local recorder.
#[derive(Debug, Clone, Default)]
pub struct EventSubscriber {
    /// Record only these targets; empty records everything.
    targets: Vec<String>,
}

impl EventSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriber restricted to the given targets.
    pub fn only<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    fn wants(&self, target: &str) -> bool {
        self.targets.is_empty() || self.targets.iter().any(|t| t == target)
    }
}

impl Subscriber for EventSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= Level::INFO && self.wants(metadata.target())
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        // Spans are not recorded
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut row = Row::new();
        event.record(&mut RowVisitor { row: &mut row });
        let target = event.metadata().target().to_string();

        RECORDER.with(|r| {
            r.borrow_mut()
                .tables
                .entry(target)
                .or_default()
                .rows
                .push(row);
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Install an unfiltered `EventSubscriber` as the global default.
/// Later calls are no-ops.
pub fn install_subscriber() {
    let _ = tracing::subscriber::set_global_default(EventSubscriber::new());
}

/// Take everything recorded on this thread so far.
pub fn drain() -> Recorder {
    RECORDER.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

pub fn clear() {
    RECORDER.with(|r| *r.borrow_mut() = Recorder::default());
}

// === Polars Integration ===

use polars::prelude::*;

impl EventTable {
    /// Convert to a DataFrame. Each column takes the type of its first
    /// value; rows missing the field, or holding another type, become null.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::new();

        for name in self.field_names() {
            let first = self.column(name).flatten().next();
            let column = match first {
                Some(Value::U64(_)) => Column::new(name.into(), self.u64s(name)),
                Some(Value::I64(_)) => Column::new(name.into(), self.i64s(name)),
                Some(Value::F64(_)) => {
                    let values: Vec<Option<f64>> =
                        self.column(name).map(|v| v.and_then(Value::as_f64)).collect();
                    Column::new(name.into(), values)
                }
                Some(Value::Bool(_)) => {
                    let values: Vec<Option<bool>> = self
                        .column(name)
                        .map(|v| match v {
                            Some(Value::Bool(b)) => Some(*b),
                            _ => None,
                        })
                        .collect();
                    Column::new(name.into(), values)
                }
                Some(Value::Str(_)) | None => Column::new(name.into(), self.strs(name)),
            };
            columns.push(column);
        }

        DataFrame::new(columns)
    }
}

impl Recorder {
    /// One DataFrame per target. Fails on the first table that does not convert.
    pub fn to_dataframes(&self) -> PolarsResult<BTreeMap<String, DataFrame>> {
        self.tables
            .iter()
            .map(|(name, table)| Ok((name.clone(), table.to_dataframe()?)))
            .collect()
    }
}

pub fn drain_to_dataframes() -> PolarsResult<BTreeMap<String, DataFrame>> {
    drain().to_dataframes()
}

/// Write each DataFrame to `{dir}/{target}.parquet`.
pub fn save_parquet(dfs: &mut BTreeMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    let io_err = |e: std::io::Error| PolarsError::IO {
        error: e.into(),
        msg: None,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    for (name, df) in dfs.iter_mut() {
        let file = std::fs::File::create(dir.join(format!("{}.parquet", name))).map_err(io_err)?;
        ParquetWriter::new(file).finish(df)?;
    }
    Ok(())
}

/// Records one run and writes its tables as parquet under `{parent}/{name}/` on drop.
///
/// ```ignore
/// let mut run = instrument::RunRecorder::new("data", "sample_economy");
/// world.run(500)?;
/// let trades = &run.get()?["trade"];
/// ```
pub struct RunRecorder {
    run_dir: PathBuf,
    dfs: Option<BTreeMap<String, DataFrame>>,
}

impl RunRecorder {
    pub fn new(parent: impl Into<PathBuf>, name: &str) -> Self {
        let safe: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        clear();
        install_subscriber();
        Self {
            run_dir: parent.into().join(safe),
            dfs: None,
        }
    }

    /// Drain the recorder on first call; later calls return the same frames.
    pub fn get(&mut self) -> PolarsResult<&BTreeMap<String, DataFrame>> {
        let dfs = match self.dfs.take() {
            Some(dfs) => dfs,
            None => drain_to_dataframes()?,
        };
        Ok(self.dfs.insert(dfs))
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }
}

impl Drop for RunRecorder {
    fn drop(&mut self) {
        let written = match self.dfs.take() {
            Some(dfs) => Ok(dfs),
            None => drain_to_dataframes(),
        }
        .and_then(|mut dfs| {
            if dfs.is_empty() {
                return Ok(());
            }
            save_parquet(&mut dfs, &self.run_dir)
        });
        if let Err(e) = written {
            eprintln!("RunRecorder: failed to write {}: {}", self.run_dir.display(), e);
        }
    }
}
