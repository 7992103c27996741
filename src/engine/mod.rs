//! Engine modules: pure planning between user choices and tool execution.

pub mod storage;
