use std::sync::Arc;

use parking_lot::Mutex;

pub trait TabularLogger: Send {
    fn push_prefix(&mut self, prefix: String);
    fn pop_prefix(&mut self);
    fn record(&mut self, key: &str, value: f64);
    /// Emit the recorded row and start a new one.
    fn dump(&mut self);
}

/// One dumped row, keys in recording order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularRow {
    pub prefix: String,
    pub values: Vec<(String, f64)>,
}

impl TabularRow {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }
}

/// Writes each dumped row through `tracing` at info level.
#[derive(Debug, Default)]
pub struct TracingTabular {
    prefixes: Vec<String>,
    row: Vec<(String, f64)>,
}

impl TracingTabular {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TabularLogger for TracingTabular {
    fn push_prefix(&mut self, prefix: String) {
        self.prefixes.push(prefix);
    }

    fn pop_prefix(&mut self) {
        self.prefixes.pop();
    }

    fn record(&mut self, key: &str, value: f64) {
        self.row.push((key.to_string(), value));
    }

    fn dump(&mut self) {
        let prefix = self.prefixes.concat();
        let width = self.row.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in self.row.drain(..) {
            tracing::info!(target: "ferrum_cem::tabular", "{prefix}{key:<width$}  {value}");
        }
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    prefixes: Vec<String>,
    current: Vec<(String, f64)>,
    rows: Vec<TabularRow>,
}

/// Keeps dumped rows in memory. Clones share the same storage, so a caller can
/// hand one clone to the trainer and read rows from another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTabular {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryTabular {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<TabularRow> {
        self.inner.lock().rows.clone()
    }

    pub fn last(&self) -> Option<TabularRow> {
        self.inner.lock().rows.last().cloned()
    }

    /// Values of `key` across all dumped rows.
    pub fn column(&self, key: &str) -> Vec<f64> {
        self.inner.lock().rows.iter().filter_map(|r| r.get(key)).collect()
    }
}

impl TabularLogger for MemoryTabular {
    fn push_prefix(&mut self, prefix: String) {
        self.inner.lock().prefixes.push(prefix);
    }

    fn pop_prefix(&mut self) {
        self.inner.lock().prefixes.pop();
    }

    fn record(&mut self, key: &str, value: f64) {
        self.inner.lock().current.push((key.to_string(), value));
    }

    fn dump(&mut self) {
        let mut inner = self.inner.lock();
        let row = TabularRow {
            prefix: inner.prefixes.concat(),
            values: std::mem::take(&mut inner.current),
        };
        inner.rows.push(row);
    }
}
