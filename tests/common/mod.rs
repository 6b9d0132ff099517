//! Recording store double shared by the integration tests.
#![allow(dead_code)]

use std::fmt;
use std::sync::{Arc, Mutex};

use schema_bootstrap::{DataStore, DatabaseError, DatabaseResult, SqlConnection};

/// One call observed on a recording connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Execute(String),
    AddBatch(String),
    ExecuteBatch(Vec<String>),
}

/// Scripted behavior of a [`RecordingStore`].
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Report batch support
    pub batch: bool,
    /// Fail every `execute` (and flush) whose SQL contains one of these
    pub fail_on: Vec<String>,
    /// Fail the n-th `add_batch` call across the store, 1-based
    pub fail_add_batch_at: Option<usize>,
    /// Refuse every connection
    pub refuse_connections: bool,
}

#[derive(Debug, Default)]
struct Log {
    calls: Vec<(usize, Call)>,
    connections: usize,
    add_batch_calls: usize,
}

/// Store handing out recording connections that share one call log.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    script: Script,
    log: Arc<Mutex<Log>>,
}

impl RecordingStore {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            log: Arc::default(),
        }
    }

    pub fn sequential() -> Self {
        Self::new(Script::default())
    }

    pub fn batching() -> Self {
        Self::new(Script {
            batch: true,
            ..Script::default()
        })
    }

    /// Fail every statement containing `needle`.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.script.fail_on.push(needle.to_string());
        self
    }

    /// Open a connection without going through [`DataStore`].
    pub fn connection(&self) -> RecordingConnection {
        self.open()
    }

    /// Every call, tagged with the connection number (0-based).
    pub fn calls(&self) -> Vec<(usize, Call)> {
        self.log.lock().unwrap().calls.clone()
    }

    /// SQL passed to `execute`, in order, across all connections.
    pub fn executed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|(_, call)| match call {
                Call::Execute(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    /// Statement lists flushed with `execute_batch`, in order.
    pub fn flushes(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|(_, call)| match call {
                Call::ExecuteBatch(statements) => Some(statements),
                _ => None,
            })
            .collect()
    }

    pub fn connections(&self) -> usize {
        self.log.lock().unwrap().connections
    }

    fn open(&self) -> RecordingConnection {
        let mut log = self.log.lock().unwrap();
        let id = log.connections;
        log.connections += 1;
        RecordingConnection {
            id,
            script: self.script.clone(),
            log: self.log.clone(),
            pending: Vec::new(),
        }
    }
}

impl DataStore for RecordingStore {
    type Connection = RecordingConnection;

    fn connect(&self) -> DatabaseResult<RecordingConnection> {
        if self.script.refuse_connections {
            return Err(DatabaseError::ConnectionFailed("refused".to_string()));
        }
        Ok(self.open())
    }

    fn backend_type(&self) -> &'static str {
        "recording"
    }
}

pub struct RecordingConnection {
    id: usize,
    script: Script,
    log: Arc<Mutex<Log>>,
    pending: Vec<String>,
}

impl RecordingConnection {
    fn record(&self, call: Call) {
        self.log.lock().unwrap().calls.push((self.id, call));
    }

    fn check(&self, sql: &str) -> DatabaseResult<()> {
        match self.script.fail_on.iter().find(|needle| sql.contains(needle.as_str())) {
            Some(needle) => Err(DatabaseError::QueryFailed(format!("scripted failure on {}", needle))),
            None => Ok(()),
        }
    }
}

impl SqlConnection for RecordingConnection {
    fn execute(&mut self, sql: &str) -> DatabaseResult<()> {
        self.record(Call::Execute(sql.to_string()));
        self.check(sql)
    }

    fn supports_batch_updates(&self) -> bool {
        self.script.batch
    }

    fn add_batch(&mut self, sql: &str) -> DatabaseResult<()> {
        if !self.script.batch {
            return Err(DatabaseError::BatchUnsupported);
        }
        let call_number = {
            let mut log = self.log.lock().unwrap();
            log.add_batch_calls += 1;
            log.add_batch_calls
        };
        self.record(Call::AddBatch(sql.to_string()));
        if self.script.fail_add_batch_at == Some(call_number) {
            return Err(DatabaseError::QueryFailed(format!(
                "scripted add_batch failure #{}",
                call_number
            )));
        }
        self.pending.push(sql.to_string());
        Ok(())
    }

    fn execute_batch(&mut self) -> DatabaseResult<()> {
        let statements = std::mem::take(&mut self.pending);
        self.record(Call::ExecuteBatch(statements.clone()));
        statements.iter().try_for_each(|sql| self.check(sql))
    }
}

/// Log sink collecting messages for assertions.
#[derive(Clone, Default)]
pub struct CapturedLog(Arc<Mutex<Vec<String>>>);

impl CapturedLog {
    pub fn sink(&self) -> impl Fn(fmt::Arguments<'_>) + Send + Sync + 'static {
        let lines = self.0.clone();
        move |args: fmt::Arguments<'_>| lines.lock().unwrap().push(args.to_string())
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}
