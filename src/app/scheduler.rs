use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{
    context::StationContext,
    jobs::{self, Collector, PictureSettings, Services},
    lifecycle::StopSignal,
    tasks::{Launch, TaskRunner},
    triggers::{TaskIntervals, TaskName, TaskTimestamps},
};
use crate::display::{BLUE, RED};

pub const NO_CONNECTION_MESSAGE: &str = "No internet connection";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub intervals: TaskIntervals,
    pub weather_upload: bool,
    pub webcam_enabled: bool,
    pub picture: PictureSettings,
}

/// What a single tick did; used by logs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub collected: bool,
    pub connected: bool,
    pub launched: Vec<(TaskName, Launch)>,
}

/// Foreground loop: collect when due, then fire network jobs behind the
/// connectivity gate.
pub struct Scheduler {
    ctx: Arc<StationContext>,
    collector: Collector,
    services: Services,
    runner: TaskRunner,
    timestamps: TaskTimestamps,
    settings: SchedulerSettings,
}

impl Scheduler {
    pub fn new(
        ctx: Arc<StationContext>,
        collector: Collector,
        services: Services,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            runner: TaskRunner::new(ctx.shared_logger()),
            timestamps: TaskTimestamps::new(settings.intervals),
            ctx,
            collector,
            services,
            settings,
        }
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    pub fn timestamps(&self) -> &TaskTimestamps {
        &self.timestamps
    }

    /// Sleep between ticks: the tightest configured cadence.
    pub fn tick_interval(&self) -> Duration {
        self.settings.intervals.min()
    }

    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        if self.timestamps.is_due(TaskName::Collect, now) {
            // Stamped even on failure so a dead sensor is retried once per
            // interval rather than every tick.
            self.timestamps.stamp(TaskName::Collect, now);
            match self.collector.collect() {
                Ok(reading) => {
                    report.collected = true;
                    if let Err(err) = jobs::publish_reading(&self.ctx, reading) {
                        self.ctx.logger().warn(format!("display update failed: {err}"));
                    }
                }
                Err(err) => self
                    .ctx
                    .logger()
                    .error(format!("data collection failed: {err}")),
            }
        }

        report.connected = self.ctx.is_connected();
        if !report.connected {
            self.ctx.logger().warn(NO_CONNECTION_MESSAGE);
            if let Err(err) = self.ctx.display().show_text(NO_CONNECTION_MESSAGE, RED, BLUE) {
                self.ctx.logger().warn(format!("display update failed: {err}"));
            }
            return report;
        }

        let enabled = [
            (TaskName::Icon, true),
            (TaskName::UploadData, self.settings.weather_upload),
            (TaskName::UploadPicture, self.settings.webcam_enabled),
        ];
        for (task, enabled) in enabled {
            if !enabled || !self.timestamps.is_due(task, now) {
                continue;
            }
            // Stamped at trigger time, even when the runner skips a busy task.
            self.timestamps.stamp(task, now);
            match self.launch(task) {
                Ok(launch) => report.launched.push((task, launch)),
                Err(err) => self
                    .ctx
                    .logger()
                    .error(format!("could not start task {task}: {err}")),
            }
        }
        report
    }

    fn launch(&self, task: TaskName) -> crate::Result<Launch> {
        let ctx = self.ctx.clone();
        let services = self.services.clone();
        match task {
            TaskName::Icon => self
                .runner
                .launch_if_idle(task, move || jobs::update_icon(&ctx, services.forecast.as_ref())),
            TaskName::UploadData => self.runner.launch_if_idle(task, move || {
                jobs::upload_data(&ctx, services.uploader.as_ref())
            }),
            TaskName::UploadPicture => {
                let picture = self.settings.picture.clone();
                self.runner.launch_if_idle(task, move || {
                    jobs::upload_picture(
                        &ctx,
                        services.camera.as_ref(),
                        services.image_uploader.as_ref(),
                        &picture,
                    )
                })
            }
            TaskName::Collect => Err(crate::Error::InvalidArgs(
                "collection runs inline, not on the task runner".into(),
            )),
        }
    }

    /// Tick until `stop` fires; the wait between ticks wakes early on stop.
    pub fn run(&mut self, stop: &StopSignal) {
        let interval = self.tick_interval();
        self.ctx
            .logger()
            .debug(format!("scheduler tick every {interval:?}"));
        while !stop.is_stopped() {
            let report = self.tick(Instant::now());
            self.ctx.logger().trace(format!("tick: {report:?}"));
            if stop.wait(interval) {
                break;
            }
        }
    }

    /// Bounded wait for in-flight jobs; returns the names abandoned.
    pub fn shutdown(&self, grace: Duration) -> Vec<TaskName> {
        self.runner.join_all(grace)
    }
}
