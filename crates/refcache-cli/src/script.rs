//! Operation scripts: a JSON array of cache operations, replayed in order.
//!
//! ```json
//! [
//!   {"op": "put", "value": {"uid": 1, "text": "a"}},
//!   {"op": "put", "value": {"uid": 1, "text": "b"}, "threads": ["draft"]},
//!   {"op": "get", "key": 1, "thread": "draft"},
//!   {"op": "close", "thread": "draft"},
//!   {"op": "undo"}
//! ]
//! ```

use refcache_sdk::{Cache, OpResult, SdkResult, ThreadId, ThreadState, Value};
use serde::{Deserialize, Serialize};

fn strong_default() -> bool {
    true
}

/// One scripted operation. Thread fields default to `main`.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Put {
        value: Value,
        #[serde(default)]
        threads: Vec<ThreadId>,
        #[serde(default = "strong_default")]
        strong: bool,
    },
    Get {
        key: Value,
        #[serde(default)]
        thread: ThreadId,
    },
    Evict {
        keys: Value,
        #[serde(default)]
        threads: Vec<ThreadId>,
    },
    Undo {
        #[serde(default)]
        thread: ThreadId,
    },
    Redo {
        #[serde(default)]
        thread: ThreadId,
    },
    Close {
        thread: ThreadId,
        #[serde(default)]
        target: ThreadId,
    },
    Merge {
        thread: ThreadId,
        #[serde(default)]
        target: ThreadId,
    },
    Cut {
        thread: ThreadId,
    },
    Reset,
    Size {
        #[serde(default)]
        thread: ThreadId,
    },
    Length {
        #[serde(default)]
        thread: ThreadId,
    },
    State {
        #[serde(default)]
        thread: ThreadId,
    },
    Dump,
}

impl Op {
    /// Operation name as written in scripts.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Put { .. } => "put",
            Op::Get { .. } => "get",
            Op::Evict { .. } => "evict",
            Op::Undo { .. } => "undo",
            Op::Redo { .. } => "redo",
            Op::Close { .. } => "close",
            Op::Merge { .. } => "merge",
            Op::Cut { .. } => "cut",
            Op::Reset => "reset",
            Op::Size { .. } => "size",
            Op::Length { .. } => "length",
            Op::State { .. } => "state",
            Op::Dump => "dump",
        }
    }

    /// Run this operation against `cache`.
    pub fn apply(&self, cache: &Cache) -> SdkResult<Outcome> {
        Ok(match self {
            Op::Put { value, threads, strong } => Outcome::Write(cache.put_in(value, threads, *strong)?),
            Op::Get { key, thread } => Outcome::Value(cache.lookup(key, thread)?),
            Op::Evict { keys, threads } => Outcome::Write(cache.evict_values_in(keys, threads)?),
            Op::Undo { thread } => Outcome::Write(cache.undo(thread)?),
            Op::Redo { thread } => Outcome::Write(cache.redo(thread)?),
            Op::Close { thread, target } => Outcome::Write(cache.close_thread(thread, target)?),
            Op::Merge { thread, target } => Outcome::Write(cache.merge_thread(thread, target)?),
            Op::Cut { thread } => Outcome::Write(cache.cut_thread(thread)?),
            Op::Reset => {
                cache.reset()?;
                Outcome::Reset
            }
            Op::Size { thread } => Outcome::Count(cache.size(thread)?),
            Op::Length { thread } => Outcome::Count(cache.length(thread)?),
            Op::State { thread } => Outcome::State(cache.thread_state(thread)?),
            Op::Dump => Outcome::Dump(cache.dump()?),
        })
    }
}

/// What an operation produced.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Write(OpResult),
    Value(Value),
    Count(usize),
    State(Option<ThreadState>),
    Dump(serde_json::Value),
    Reset,
}

/// Parse a JSON array of operations.
pub fn parse_script(text: &str) -> serde_json::Result<Vec<Op>> {
    serde_json::from_str(text)
}
