//! Mock implementations for the capability traits
//!
//! This module provides in-memory mock implementations that can be used
//! for unit testing without requiring a Redis server or the agent directory.
//! Every mock records its calls so tests can assert exact counts and arguments.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use allocator_core::{
    models::{Agent, AssignmentRequest},
    traits::{AgentDirectory, AssignCommand, DedupIndex, Dequeued, WorkQueue},
    AllocatorError, Result,
};

/// Mock implementation of WorkQueue for testing
///
/// `pop` returns `Dequeued::Closed` once the queue is drained, which ends a
/// consumption loop the same way a closed queue does.
#[derive(Debug, Clone, Default)]
pub struct MockWorkQueue {
    items: Arc<Mutex<VecDeque<String>>>,
    pushed: Arc<Mutex<Vec<AssignmentRequest>>>,
    pushed_front: Arc<Mutex<Vec<AssignmentRequest>>>,
    fail_push: Arc<Mutex<bool>>,
}

impl MockWorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置原始负载，可以包含格式错误的数据
    pub fn with_payloads<I, S>(payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue = Self::new();
        {
            let mut items = queue.items.lock().unwrap();
            items.extend(payloads.into_iter().map(Into::into));
        }
        queue
    }

    pub fn set_fail_push(&self, fail: bool) {
        *self.fail_push.lock().unwrap() = fail;
    }

    /// 所有经过 `push` 写入的请求，按顺序
    pub fn pushed(&self) -> Vec<AssignmentRequest> {
        self.pushed.lock().unwrap().clone()
    }

    /// 所有经过 `push_front` 放回队首的请求，按顺序
    pub fn pushed_front(&self) -> Vec<AssignmentRequest> {
        self.pushed_front.lock().unwrap().clone()
    }

    pub fn push_count(&self) -> usize {
        self.pushed.lock().unwrap().len()
    }

    /// 队列中剩余的原始负载
    pub fn pending(&self) -> Vec<String> {
        self.items.lock().unwrap().iter().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.items.lock().unwrap().clear();
        self.pushed.lock().unwrap().clear();
        self.pushed_front.lock().unwrap().clear();
    }
}

#[async_trait]
impl WorkQueue for MockWorkQueue {
    async fn push(&self, request: &AssignmentRequest) -> Result<()> {
        if *self.fail_push.lock().unwrap() {
            return Err(AllocatorError::Queue("mock push failure".to_string()));
        }
        let payload = request.encode()?;
        self.items.lock().unwrap().push_back(payload);
        self.pushed.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn push_front(&self, request: &AssignmentRequest) -> Result<()> {
        if *self.fail_push.lock().unwrap() {
            return Err(AllocatorError::Queue("mock push failure".to_string()));
        }
        let payload = request.encode()?;
        self.items.lock().unwrap().push_front(payload);
        self.pushed_front.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn pop(&self, _timeout: Duration) -> Result<Dequeued> {
        Ok(match self.items.lock().unwrap().pop_front() {
            Some(payload) => Dequeued::Payload(payload),
            None => Dequeued::Closed,
        })
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.count())
    }
}

/// Mock implementation of DedupIndex for testing
#[derive(Debug, Clone, Default)]
pub struct MockDedupIndex {
    rooms: Arc<Mutex<HashSet<String>>>,
    released: Arc<Mutex<Vec<String>>>,
    fail_release: Arc<Mutex<bool>>,
}

impl MockDedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_release(&self, fail: bool) {
        *self.fail_release.lock().unwrap() = fail;
    }

    pub fn has(&self, room_id: &str) -> bool {
        self.rooms.lock().unwrap().contains(room_id)
    }

    /// 每次 `release` 调用的房间号，包括失败的调用
    pub fn released(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }

    pub fn release_count(&self, room_id: &str) -> usize {
        self.released
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == room_id)
            .count()
    }

    pub fn count(&self) -> usize {
        self.rooms.lock().unwrap().len()
    }
}

#[async_trait]
impl DedupIndex for MockDedupIndex {
    async fn try_admit(&self, room_id: &str) -> Result<bool> {
        Ok(self.rooms.lock().unwrap().insert(room_id.to_string()))
    }

    async fn release(&self, room_id: &str) -> Result<bool> {
        self.released.lock().unwrap().push(room_id.to_string());
        if *self.fail_release.lock().unwrap() {
            return Err(AllocatorError::DedupIndex("mock release failure".to_string()));
        }
        Ok(self.rooms.lock().unwrap().remove(room_id))
    }

    async fn contains(&self, room_id: &str) -> Result<bool> {
        Ok(self.has(room_id))
    }
}

/// `available_agents` 的脚本化响应
#[derive(Debug, Clone)]
pub enum AvailableResponse {
    Agents(Vec<Agent>),
    Failure(String),
}

/// `assign` 的脚本化响应
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignResponse {
    Ok,
    Status(u16),
    TransportError,
}

#[derive(Debug, Default)]
struct DirectoryState {
    loads: HashMap<i64, Agent>,
    load_failures: HashSet<i64>,
    load_calls: Vec<i64>,
    available_script: VecDeque<AvailableResponse>,
    available_fallback: Vec<Agent>,
    available_calls: Vec<String>,
    assign_script: VecDeque<AssignResponse>,
    assign_calls: Vec<AssignCommand>,
}

/// Mock implementation of AgentDirectory for testing
///
/// `available_agents` consumes scripted responses in order and falls back to a
/// fixed list once the script is exhausted; `assign` does the same with `Ok`
/// as the fallback.
#[derive(Debug, Clone, Default)]
pub struct MockAgentDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl MockAgentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(self, agent: Agent) -> Self {
        self.state.lock().unwrap().loads.insert(agent.id, agent);
        self
    }

    pub fn with_load_failure(self, agent_id: i64) -> Self {
        self.state.lock().unwrap().load_failures.insert(agent_id);
        self
    }

    pub fn with_available(self, response: AvailableResponse) -> Self {
        self.state
            .lock()
            .unwrap()
            .available_script
            .push_back(response);
        self
    }

    pub fn with_available_fallback(self, agents: Vec<Agent>) -> Self {
        self.state.lock().unwrap().available_fallback = agents;
        self
    }

    pub fn with_assign_response(self, response: AssignResponse) -> Self {
        self.state.lock().unwrap().assign_script.push_back(response);
        self
    }

    pub fn assign_calls(&self) -> Vec<AssignCommand> {
        self.state.lock().unwrap().assign_calls.clone()
    }

    pub fn assign_calls_for(&self, agent_id: i64) -> usize {
        self.state
            .lock()
            .unwrap()
            .assign_calls
            .iter()
            .filter(|c| c.agent_id == agent_id)
            .count()
    }

    pub fn load_calls(&self) -> Vec<i64> {
        self.state.lock().unwrap().load_calls.clone()
    }

    pub fn available_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().available_calls.clone()
    }
}

#[async_trait]
impl AgentDirectory for MockAgentDirectory {
    async fn agent_load(&self, agent_id: i64) -> Result<Agent> {
        let mut state = self.state.lock().unwrap();
        state.load_calls.push(agent_id);

        if state.load_failures.contains(&agent_id) {
            return Err(AllocatorError::Directory("mock directory unreachable".to_string()));
        }

        state
            .loads
            .get(&agent_id)
            .cloned()
            .ok_or(AllocatorError::AgentNotFound { id: agent_id })
    }

    async fn available_agents(&self, room_id: &str) -> Result<Vec<Agent>> {
        let mut state = self.state.lock().unwrap();
        state.available_calls.push(room_id.to_string());

        match state.available_script.pop_front() {
            Some(AvailableResponse::Agents(agents)) => Ok(agents),
            Some(AvailableResponse::Failure(message)) => Err(AllocatorError::Directory(message)),
            None => Ok(state.available_fallback.clone()),
        }
    }

    async fn assign(&self, command: &AssignCommand) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.assign_calls.push(command.clone());

        match state.assign_script.pop_front().unwrap_or(AssignResponse::Ok) {
            AssignResponse::Ok => Ok(()),
            AssignResponse::Status(status) => Err(AllocatorError::DirectoryStatus {
                status,
                operation: "assign_agent".to_string(),
            }),
            AssignResponse::TransportError => {
                Err(AllocatorError::Directory("mock connection reset".to_string()))
            }
        }
    }
}
