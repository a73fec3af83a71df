//! Per-invocation task context.

use crate::context::RemoteArgs;
use crate::map_transformer::MapTransformer;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::sync::Arc;

/// Context handed to an all-to-all transform for one invocation.
///
/// The pipeline that invokes the shuffle owns this value; the shuffle only reads
/// it. When a per-block map operator was fused into the shuffle, its transformer
/// and resource requests ride along in the `upstream_*` fields.
pub struct TaskContext<T> {
    /// Index of the invoking task.
    pub task_idx: usize,
    /// Name of the operator being executed (for logs).
    pub op_name: String,
    /// Target size for output blocks, in bytes.
    pub target_max_block_size: f64,
    /// Fused upstream map transformer, if any.
    pub upstream_map_transformer: Option<Arc<dyn MapTransformer<T>>>,
    /// Resource requests of the fused upstream operator.
    pub upstream_map_remote_args: Option<RemoteArgs>,
}

impl<T> TaskContext<T> {
    /// Context with no fused upstream operator.
    #[must_use]
    pub fn new(op_name: impl Into<String>, target_max_block_size: f64) -> Self {
        Self {
            task_idx: 0,
            op_name: op_name.into(),
            target_max_block_size,
            upstream_map_transformer: None,
            upstream_map_remote_args: None,
        }
    }

    /// Attach a fused upstream map transformer and its resource requests.
    #[must_use]
    pub fn with_upstream(
        mut self,
        transformer: Arc<dyn MapTransformer<T>>,
        remote_args: Option<RemoteArgs>,
    ) -> Self {
        self.upstream_map_transformer = Some(transformer);
        self.upstream_map_remote_args = remote_args;
        self
    }

    #[must_use]
    pub fn with_task_idx(mut self, task_idx: usize) -> Self {
        self.task_idx = task_idx;
        self
    }
}

impl<T> Clone for TaskContext<T> {
    fn clone(&self) -> Self {
        Self {
            task_idx: self.task_idx,
            op_name: self.op_name.clone(),
            target_max_block_size: self.target_max_block_size,
            upstream_map_transformer: self.upstream_map_transformer.clone(),
            upstream_map_remote_args: self.upstream_map_remote_args.clone(),
        }
    }
}

impl<T> Debug for TaskContext<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("TaskContext")
            .field("task_idx", &self.task_idx)
            .field("op_name", &self.op_name)
            .field("target_max_block_size", &self.target_max_block_size)
            .field("has_upstream", &self.upstream_map_transformer.is_some())
            .field("upstream_map_remote_args", &self.upstream_map_remote_args)
            .finish()
    }
}
