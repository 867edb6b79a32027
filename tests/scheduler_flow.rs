use std::sync::Arc;
use std::time::{Duration, Instant};

use weather_station::{
    app::{
        Collector, Launch, LogLevel, Logger, PictureSettings, Scheduler, SchedulerSettings,
        Services, StationContext, TaskIntervals, TaskName, NO_CONNECTION_MESSAGE,
    },
    display::{BLUE, RED},
    fake::{
        DisplayEvent, FakeCamera, FakeDisplay, FakeForecast, FakeImageUploader,
        FakeRecordUploader, FakeSensors, FakeThermometer, Gate,
    },
    forecast::Icon,
    sensing::TemperatureEstimator,
};

const MIN: Duration = Duration::from_secs(60);
// Real ticks land a little after each sleep ends; the due check is strict.
const TICK: Duration = Duration::from_secs(61);

struct Station {
    scheduler: Scheduler,
    ctx: Arc<StationContext>,
    display: FakeDisplay,
    uploader: FakeRecordUploader,
    images: FakeImageUploader,
    forecast: FakeForecast,
    _pictures: tempfile::TempDir,
}

fn station(uploader: FakeRecordUploader, images: FakeImageUploader) -> Station {
    let pictures = tempfile::tempdir().unwrap();
    let display = FakeDisplay::new();
    let ctx = StationContext::new(
        Arc::new(Logger::new(LogLevel::Error, None)),
        Box::new(display.clone()),
    );
    let forecast = FakeForecast::new("nt_partlycloudy");
    let services = Services {
        uploader: Arc::new(uploader.clone()),
        image_uploader: Arc::new(images.clone()),
        forecast: Arc::new(forecast.clone()),
        camera: Arc::new(FakeCamera::new(pictures.path().join("latest.jpg"))),
    };
    let collector = Collector::new(
        Box::new(FakeSensors::new(20.0, 22.0, 55.0, 1016.0)),
        Box::new(FakeThermometer::new(45.0)),
        TemperatureEstimator::default(),
    );
    let settings = SchedulerSettings {
        intervals: TaskIntervals {
            collect: MIN,
            icon: 30 * MIN,
            upload_data: 5 * MIN,
            upload_picture: 5 * MIN,
        },
        weather_upload: true,
        webcam_enabled: true,
        picture: PictureSettings {
            resolution: "1280x720".into(),
            preserve_old: true,
            archive_dir: pictures.path().join("old"),
        },
    };
    Station {
        scheduler: Scheduler::new(ctx.clone(), collector, services, settings),
        ctx,
        display,
        uploader,
        images,
        forecast,
        _pictures: pictures,
    }
}

fn settle(station: &Station) {
    assert!(station.scheduler.shutdown(Duration::from_secs(5)).is_empty());
}

#[test]
fn three_connected_ticks_collect_each_time_and_upload_once() {
    let mut station = station(FakeRecordUploader::new(), FakeImageUploader::new());
    station.ctx.set_connected(true);
    let start = Instant::now();

    let mut collected = 0;
    let mut data_launches = 0;
    for n in 0..3u32 {
        let report = station.scheduler.tick(start + n * TICK);
        if report.collected {
            collected += 1;
        }
        data_launches += report
            .launched
            .iter()
            .filter(|(task, _)| *task == TaskName::UploadData)
            .count();
        settle(&station);
    }

    assert_eq!(collected, 3);
    assert_eq!(data_launches, 1);
    assert_eq!(station.uploader.count(), 1);
    assert_eq!(station.images.count(), 1);
    assert_eq!(station.forecast.fetches(), 1);
    assert_eq!(station.ctx.icon(), Icon::CloudyNight);
    assert_eq!(station.uploader.uploads()[0].temperature_c, 5.0);
}

#[test]
fn upload_fires_again_once_interval_has_strictly_elapsed() {
    let mut station = station(FakeRecordUploader::new(), FakeImageUploader::new());
    station.ctx.set_connected(true);
    let start = Instant::now();

    station.scheduler.tick(start);
    station.scheduler.tick(start + 5 * MIN);
    settle(&station);
    assert_eq!(station.uploader.count(), 1);

    station.scheduler.tick(start + 5 * MIN + Duration::from_secs(1));
    settle(&station);
    assert_eq!(station.uploader.count(), 2);
}

#[test]
fn disconnected_station_only_collects() {
    let mut station = station(FakeRecordUploader::new(), FakeImageUploader::new());
    let start = Instant::now();
    for n in 0..40u32 {
        let report = station.scheduler.tick(start + n * TICK);
        assert!(report.launched.is_empty());
    }
    settle(&station);

    assert_eq!(station.uploader.count(), 0);
    assert_eq!(station.images.count(), 0);
    assert_eq!(station.forecast.fetches(), 0);
    let warnings = station
        .display
        .events()
        .into_iter()
        .filter(|event| {
            *event
                == DisplayEvent::Text {
                    msg: NO_CONNECTION_MESSAGE.into(),
                    fg: RED,
                    bg: BLUE,
                }
        })
        .count();
    assert_eq!(warnings, 40);
}

#[test]
fn reconnecting_runs_overdue_tasks_on_next_tick() {
    let mut station = station(FakeRecordUploader::new(), FakeImageUploader::new());
    let start = Instant::now();
    station.scheduler.tick(start);
    station.scheduler.tick(start + TICK);
    assert_eq!(station.uploader.count(), 0);

    station.ctx.set_connected(true);
    let report = station.scheduler.tick(start + 2 * TICK);
    settle(&station);
    assert_eq!(report.launched.len(), 3);
    assert_eq!(station.uploader.count(), 1);
}

#[test]
fn slow_picture_upload_is_never_doubled() {
    let (gate, release) = Gate::pair();
    let mut station = station(FakeRecordUploader::new(), FakeImageUploader::gated(gate));
    station.ctx.set_connected(true);
    let start = Instant::now();

    station.scheduler.tick(start);
    let report = station.scheduler.tick(start + 6 * MIN);
    assert!(report
        .launched
        .contains(&(TaskName::UploadPicture, Launch::Busy)));
    assert!(report
        .launched
        .contains(&(TaskName::UploadData, Launch::Started)));

    drop(release);
    settle(&station);
    assert_eq!(station.images.count(), 1);
    assert_eq!(station.uploader.count(), 2);
}

#[test]
fn failing_uploads_do_not_stop_the_loop() {
    let uploader = FakeRecordUploader::new();
    uploader.fail_with("INVALIDPASSWORDID|Password or key and/or id are incorrect");
    let images = FakeImageUploader::new();
    images.fail_with("530 Login incorrect");
    let mut station = station(uploader, images);
    station.ctx.set_connected(true);
    let start = Instant::now();

    station.scheduler.tick(start);
    settle(&station);
    let report = station.scheduler.tick(start + 6 * MIN);
    settle(&station);

    assert!(report.collected);
    assert_eq!(station.uploader.count(), 2);
    assert_eq!(station.images.count(), 2);
    assert!(!station.scheduler.runner().is_active(TaskName::UploadData));
}
