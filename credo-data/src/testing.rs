//! In-memory [`Executor`] double for tests.
//!
//! Records every statement it receives and replays queued responses in
//! FIFO order. When the queue is empty it answers with no rows
//! (`fetch_one` then fails with `DataError::NotFound`) and an empty
//! [`ExecResult`].

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::DataError;
use crate::executor::{ExecResult, Executor, TxOptions};
use crate::value::{Record, Value};

enum Response {
    Rows(Vec<Record>),
    Exec(ExecResult),
    Error(DataError),
}

#[derive(Default)]
pub struct MockExecutor {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    responses: Mutex<VecDeque<Response>>,
    delay: Option<Duration>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_rows(&self, rows: Vec<Record>) {
        self.push(Response::Rows(rows));
    }

    pub fn push_exec(&self, result: ExecResult) {
        self.push(Response::Exec(result));
    }

    pub fn push_error(&self, err: DataError) {
        self.push(Response::Error(err));
    }

    /// Every `(sql, args)` pair received so far.
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls().into_iter().map(|(sql, _)| sql).collect()
    }

    fn push(&self, response: Response) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    async fn record(&self, sql: &str, args: &[Value]) -> Option<Response> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((sql.to_string(), args.to_vec()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

fn unexpected(expected: &str) -> DataError {
    DataError::Unsupported(format!("mock executor: queued response is not {expected}"))
}

impl Executor for MockExecutor {
    type Transaction = ();

    async fn fetch_one(&self, sql: &str, args: &[Value]) -> Result<Record, DataError> {
        match self.record(sql, args).await {
            Some(Response::Rows(rows)) => rows.into_iter().next().ok_or(DataError::NotFound),
            Some(Response::Error(err)) => Err(err),
            Some(Response::Exec(_)) => Err(unexpected("rows")),
            None => Err(DataError::NotFound),
        }
    }

    async fn fetch_all(&self, sql: &str, args: &[Value]) -> Result<Vec<Record>, DataError> {
        match self.record(sql, args).await {
            Some(Response::Rows(rows)) => Ok(rows),
            Some(Response::Error(err)) => Err(err),
            Some(Response::Exec(_)) => Err(unexpected("rows")),
            None => Ok(Vec::new()),
        }
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> Result<ExecResult, DataError> {
        match self.record(sql, args).await {
            Some(Response::Exec(result)) => Ok(result),
            Some(Response::Error(err)) => Err(err),
            Some(Response::Rows(_)) => Err(unexpected("an exec result")),
            None => Ok(ExecResult::default()),
        }
    }

    async fn begin(&self, _options: TxOptions) -> Result<Self::Transaction, DataError> {
        Ok(())
    }
}
