//! In-memory `Database` double for unit tests.
//!
//! Keeps targets and results in a mutex-guarded map and can be told to fail
//! reads, which lets scheduler and poll-task tests exercise the degraded
//! paths without a real store.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use super::models::{MonitorTarget, PollResult};
use super::repository::Database;

#[derive(Default)]
pub struct MemoryDatabase {
    targets: Mutex<BTreeMap<i64, MonitorTarget>>,
    results: Mutex<Vec<PollResult>>,
    next_id: AtomicI64,
    fail_list: AtomicBool,
    fail_get: AtomicBool,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self { next_id: AtomicI64::new(1), ..Default::default() }
    }

    /// Insert a target directly, bypassing validation
    pub fn put_target(&self, mut target: MonitorTarget) -> i64 {
        let id = if target.id > 0 { target.id } else { self.next_id.fetch_add(1, Ordering::SeqCst) };
        target.id = id;
        self.targets.lock().unwrap().insert(id, target);
        id
    }

    pub fn remove_target(&self, id: i64) {
        self.targets.lock().unwrap().remove(&id);
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn results_for(&self, target_id: i64) -> Vec<PollResult> {
        self.results.lock().unwrap().iter().filter(|r| r.target_id == target_id).cloned().collect()
    }

    pub fn result_count(&self) -> usize {
        self.results.lock().unwrap().len()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn list_targets(&self) -> Result<Vec<MonitorTarget>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated list failure"));
        }
        Ok(self.targets.lock().unwrap().values().cloned().collect())
    }

    async fn get_target(&self, id: i64) -> Result<Option<MonitorTarget>> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated get failure"));
        }
        Ok(self.targets.lock().unwrap().get(&id).cloned())
    }

    async fn save_target(&self, target: &MonitorTarget) -> Result<i64> {
        Ok(self.put_target(target.clone()))
    }

    async fn update_target(&self, target: &MonitorTarget) -> Result<()> {
        let mut targets = self.targets.lock().unwrap();
        if targets.contains_key(&target.id) {
            targets.insert(target.id, target.clone());
        }
        Ok(())
    }

    async fn delete_target(&self, id: i64) -> Result<()> {
        self.remove_target(id);
        Ok(())
    }

    async fn insert_result(&self, result: &PollResult) -> Result<i64> {
        let mut results = self.results.lock().unwrap();
        results.push(result.clone());
        Ok(results.len() as i64)
    }

    async fn get_recent_results(&self, target_id: i64, limit: usize) -> Result<Vec<PollResult>> {
        let mut rows = self.results_for(target_id);
        rows.reverse();
        rows.truncate(limit);
        Ok(rows)
    }
}
