use std::collections::HashMap;
use std::time::{Duration, Instant};

/// The four periodic activities the scheduler tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskName {
    Collect,
    Icon,
    UploadData,
    UploadPicture,
}

impl TaskName {
    pub const ALL: [TaskName; 4] = [
        TaskName::Collect,
        TaskName::Icon,
        TaskName::UploadData,
        TaskName::UploadPicture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::Collect => "collect",
            TaskName::Icon => "icon",
            TaskName::UploadData => "upload_data",
            TaskName::UploadPicture => "upload_picture",
        }
    }
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskIntervals {
    pub collect: Duration,
    pub icon: Duration,
    pub upload_data: Duration,
    pub upload_picture: Duration,
}

impl TaskIntervals {
    pub fn get(&self, task: TaskName) -> Duration {
        match task {
            TaskName::Collect => self.collect,
            TaskName::Icon => self.icon,
            TaskName::UploadData => self.upload_data,
            TaskName::UploadPicture => self.upload_picture,
        }
    }

    /// Loop granularity: the tightest configured cadence.
    pub fn min(&self) -> Duration {
        TaskName::ALL
            .iter()
            .map(|task| self.get(*task))
            .min()
            .unwrap_or(self.collect)
    }
}

/// Last trigger time per task. Intervals measure time since a task was last
/// started, not since it last finished.
#[derive(Debug, Clone)]
pub struct TaskTimestamps {
    intervals: TaskIntervals,
    last_run: HashMap<TaskName, Instant>,
}

impl TaskTimestamps {
    pub fn new(intervals: TaskIntervals) -> Self {
        Self {
            intervals,
            last_run: HashMap::new(),
        }
    }

    /// Due when never run, or strictly more than the interval has elapsed.
    pub fn is_due(&self, task: TaskName, now: Instant) -> bool {
        match self.last_run.get(&task) {
            None => true,
            Some(last) => now.saturating_duration_since(*last) > self.intervals.get(task),
        }
    }

    pub fn stamp(&mut self, task: TaskName, now: Instant) {
        self.last_run.insert(task, now);
    }

    pub fn last_run(&self, task: TaskName) -> Option<Instant> {
        self.last_run.get(&task).copied()
    }
}
