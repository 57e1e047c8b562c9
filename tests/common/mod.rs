#![allow(dead_code)]

use dynobatch::{AsyncBackend, Backend, ItemError, MultiError, StoreError};
use std::collections::HashMap;
use std::sync::Mutex;

/// Offset added to a key when the fake backend "assigns" it on put.
pub const ASSIGNED_OFFSET: u64 = 100_000;

/// What a given call (by call index) should do.
#[derive(Debug, Clone)]
pub enum Plan {
    /// Fail the whole call.
    Total(String),
    /// Fail the given window-local positions.
    Partial(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: &'static str,
    pub keys: Vec<u64>,
}

/// Records every call and fails the calls named in its plan.
///
/// Keys are `u64` positions, records are `String`. Put assigns
/// `key + ASSIGNED_OFFSET`, get fills `"value-{key}"`.
#[derive(Debug, Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    plan: HashMap<usize, Plan>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plan(mut self, call: usize, plan: Plan) -> Self {
        self.plan.insert(call, plan);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn begin(&self, op: &'static str, keys: &[u64]) -> Option<Plan> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(Call {
            op,
            keys: keys.to_vec(),
        });
        self.plan.get(&index).cloned()
    }

    fn outcome(plan: Option<Plan>, len: usize) -> Result<(), StoreError> {
        match plan {
            None => Ok(()),
            Some(Plan::Total(msg)) => Err(StoreError::Backend(msg)),
            Some(Plan::Partial(failing)) => Err(StoreError::Partial(MultiError::from_errors(
                (0..len).map(|i| {
                    failing
                        .contains(&i)
                        .then(|| ItemError::Rejected(format!("local {}", i)))
                }),
            ))),
        }
    }

    fn delete(&self, keys: &[u64]) -> Result<(), StoreError> {
        let plan = self.begin("delete", keys);
        Self::outcome(plan, keys.len())
    }

    fn put(&self, keys: &mut [u64], _records: &[String]) -> Result<(), StoreError> {
        let plan = self.begin("put", keys);
        if let Some(Plan::Total(_)) = plan {
            return Self::outcome(plan, keys.len());
        }
        for key in keys.iter_mut() {
            *key += ASSIGNED_OFFSET;
        }
        Self::outcome(plan, keys.len())
    }

    fn get(&self, keys: &[u64], records: &mut [String]) -> Result<(), StoreError> {
        let plan = self.begin("get", keys);
        if let Some(Plan::Total(_)) = plan {
            return Self::outcome(plan, keys.len());
        }
        for (key, slot) in keys.iter().zip(records.iter_mut()) {
            *slot = format!("value-{}", key);
        }
        Self::outcome(plan, keys.len())
    }
}

impl Backend for FakeBackend {
    type Key = u64;
    type Record = String;

    fn delete_many(&self, keys: &[u64]) -> Result<(), StoreError> {
        self.delete(keys)
    }

    fn put_many(&self, keys: &mut [u64], records: &[String]) -> Result<(), StoreError> {
        self.put(keys, records)
    }

    fn get_many(&self, keys: &[u64], records: &mut [String]) -> Result<(), StoreError> {
        self.get(keys, records)
    }
}

impl AsyncBackend for FakeBackend {
    type Key = u64;
    type Record = String;

    async fn delete_many(&self, keys: &[u64]) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.delete(keys)
    }

    async fn put_many(&self, keys: &mut [u64], records: &[String]) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.put(keys, records)
    }

    async fn get_many(&self, keys: &[u64], records: &mut [String]) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.get(keys, records)
    }
}

pub fn keys(len: usize) -> Vec<u64> {
    (0..len as u64).collect()
}

pub fn records(len: usize) -> Vec<String> {
    (0..len).map(|i| format!("record-{}", i)).collect()
}
