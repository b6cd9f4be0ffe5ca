//! Pipeline cycles against an in-memory camera and remote store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{daily_clock, fixed_clock, test_config, FlickerCamera, MemoryDrive};
use mlog_models::{FaultKind, FolderName};
use mlog_worker::{Pipeline, PipelineState, WorkerConfig};

async fn started(config: WorkerConfig, camera: FlickerCamera, drive: &MemoryDrive) -> Pipeline<FlickerCamera> {
    let mut pipeline = Pipeline::new(config, camera, Arc::new(drive.clone())).unwrap();
    pipeline.startup().await.unwrap();
    pipeline
}

#[tokio::test(start_paused = true)]
async fn test_cycle_records_indexes_and_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::default();
    let mut pipeline = started(test_config(dir.path()), FlickerCamera::default(), &drive)
        .await
        .with_clock(fixed_clock());

    let record = pipeline.run_cycle().await.unwrap();

    assert_eq!(record.date.as_str(), "2024-01-01");
    assert_eq!(record.time.as_str(), "12:00:00.000000.h264");
    assert_eq!(
        record.local_path,
        dir.path().join("clips/2024-01-01/12:00:00.000000.h264")
    );
    assert!(record.local_path.exists());
    assert!(record.is_uploaded());

    assert_eq!(drive.folder_names(), vec!["2024-01-01"]);
    assert_eq!(drive.file_count(), 1);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("folder_list.txt")).unwrap(),
        "2024-01-01\n"
    );
    assert_eq!(pipeline.state(), PipelineState::Detecting);
}

#[tokio::test(start_paused = true)]
async fn test_same_day_clips_reuse_cached_folder() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::default();
    let mut pipeline = started(test_config(dir.path()), FlickerCamera::default(), &drive)
        .await
        .with_clock(fixed_clock());

    for _ in 0..3 {
        pipeline.run_cycle().await.unwrap();
    }

    assert_eq!(drive.folder_names().len(), 1);
    assert_eq!(drive.file_count(), 3);
    assert_eq!(drive.state.lock().unwrap().list_calls, 1);
    assert_eq!(pipeline.retention().len(), 1);
    assert!(pipeline.cached_folder(&FolderName::from("2024-01-01")).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_existing_remote_folder_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::default();
    {
        use mlog_storage::RemoteStorage;
        drive.create_folder("2024-01-01").await.unwrap();
    }
    let mut pipeline = started(test_config(dir.path()), FlickerCamera::default(), &drive)
        .await
        .with_clock(fixed_clock());

    let record = pipeline.run_cycle().await.unwrap();

    assert_eq!(drive.folder_names().len(), 1);
    assert_eq!(record.remote_folder_id.unwrap().as_str(), "folder-1");
    // Known remotely but absent from the log, so it is logged now.
    assert_eq!(pipeline.retention().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_window_of_seven_over_nine_days() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::default();
    let mut pipeline = started(test_config(dir.path()), FlickerCamera::default(), &drive)
        .await
        .with_clock(daily_clock());

    for _ in 0..9 {
        pipeline.run_cycle().await.unwrap();
    }

    let state = drive.state.lock().unwrap();
    assert_eq!(state.deleted, vec!["folder-1", "folder-3"]);
    drop(state);

    let expected: Vec<String> = (3..=9).map(|d| format!("2024-01-{:02}", d)).collect();
    assert_eq!(drive.folder_names(), expected);

    let text = std::fs::read_to_string(dir.path().join("folder_list.txt")).unwrap();
    assert_eq!(text.lines().collect::<Vec<_>>(), expected);

    assert!(!dir.path().join("clips/2024-01-01").exists());
    assert!(!dir.path().join("clips/2024-01-02").exists());
    assert!(dir.path().join("clips/2024-01-03").exists());
    assert!(pipeline.cached_folder(&FolderName::from("2024-01-01")).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_upload_failure_keeps_clip_and_next_cycle_runs() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::default();
    drive.state.lock().unwrap().fail_uploads = true;
    let mut pipeline = started(test_config(dir.path()), FlickerCamera::default(), &drive)
        .await
        .with_clock(fixed_clock());

    let err = pipeline.run_cycle().await.unwrap_err();
    assert_eq!(err.phase, PipelineState::Uploading);
    assert_eq!(err.fault_kind(), FaultKind::Transport);
    assert!(dir.path().join("clips/2024-01-01/12:00:00.000000.h264").exists());
    assert_eq!(pipeline.state(), PipelineState::Detecting);

    drive.state.lock().unwrap().fail_uploads = false;
    let record = pipeline.run_cycle().await.unwrap();
    assert!(record.is_uploaded());
    assert_eq!(pipeline.retention().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_recording_failure_is_hardware_fault() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::default();
    let camera = FlickerCamera {
        fail_recording: true,
        ..FlickerCamera::default()
    };
    let mut pipeline = started(test_config(dir.path()), camera, &drive)
        .await
        .with_clock(fixed_clock());

    let err = pipeline.run_cycle().await.unwrap_err();
    assert_eq!(err.phase, PipelineState::Recording);
    assert_eq!(err.fault_kind(), FaultKind::Hardware);
    assert!(drive.folder_names().is_empty());
    assert!(pipeline.retention().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_eviction_without_remote_folder_still_rotates() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let logged: String = (25..=31).map(|d| format!("2023-12-{}\n", d)).collect();
    std::fs::write(&config.retention_file, logged).unwrap();
    std::fs::create_dir_all(config.clips_dir.join("2023-12-25")).unwrap();

    let drive = MemoryDrive::default();
    let mut pipeline = started(config, FlickerCamera::default(), &drive)
        .await
        .with_clock(fixed_clock());
    assert_eq!(pipeline.retention().len(), 7);

    pipeline.run_cycle().await.unwrap();

    let text = std::fs::read_to_string(dir.path().join("folder_list.txt")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines.first(), Some(&"2023-12-26"));
    assert_eq!(lines.last(), Some(&"2024-01-01"));
    assert!(!dir.path().join("clips/2023-12-25").exists());
    assert!(drive.state.lock().unwrap().deleted.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_startup_configures_camera_and_loads_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = WorkerConfig {
        rotation: 180,
        ..test_config(dir.path())
    };
    std::fs::write(&config.retention_file, "2024-01-01\n2024-01-02\n").unwrap();

    let drive = MemoryDrive::default();
    let pipeline = started(config, FlickerCamera::default(), &drive).await;

    assert_eq!(pipeline.state(), PipelineState::Ready);
    assert_eq!(pipeline.camera().rotation, Some(180));
    assert_eq!(pipeline.retention().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_startup_auth_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::default();
    drive.state.lock().unwrap().fail_auth = true;

    let mut pipeline =
        Pipeline::new(test_config(dir.path()), FlickerCamera::default(), Arc::new(drive.clone())).unwrap();
    let err = pipeline.startup().await.unwrap_err();

    assert_eq!(err.fault_kind(), FaultKind::Auth);
    assert!(err.fault_kind().is_fatal());
    assert_eq!(pipeline.state(), PipelineState::Authenticating);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_releases_camera() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::default();
    let mut pipeline = started(test_config(dir.path()), FlickerCamera::default(), &drive).await;

    pipeline.shutdown().await.unwrap();
    assert!(pipeline.camera().closed);
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = WorkerConfig {
        retention_window_days: 0,
        ..test_config(dir.path())
    };
    let result = Pipeline::new(config, FlickerCamera::default(), Arc::new(MemoryDrive::default()));
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_failed_eviction_is_retried_next_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let config = WorkerConfig {
        retention_window_days: 2,
        ..test_config(dir.path())
    };
    let drive = MemoryDrive::default();
    let mut pipeline = started(config, FlickerCamera::default(), &drive)
        .await
        .with_clock(daily_clock());

    pipeline.run_cycle().await.unwrap();
    pipeline.run_cycle().await.unwrap();

    drive.state.lock().unwrap().fail_deletes = 1;
    let err = pipeline.run_cycle().await.unwrap_err();
    assert_eq!(err.phase, PipelineState::Rotating);
    assert_eq!(err.fault_kind(), FaultKind::Transport);
    assert!(pipeline.retention().contains(&FolderName::from("2024-01-01")));
    assert!(dir.path().join("clips/2024-01-01").exists());

    for _ in 4..=6 {
        pipeline.run_cycle().await.unwrap();
    }

    let expected = vec!["2024-01-05".to_string(), "2024-01-06".to_string()];
    assert_eq!(drive.folder_names(), expected);
    let text = std::fs::read_to_string(dir.path().join("folder_list.txt")).unwrap();
    assert_eq!(text.lines().collect::<Vec<_>>(), expected);
    assert!(drive.state.lock().unwrap().deleted.contains(&"folder-1".to_string()));
    assert!(!dir.path().join("clips/2024-01-01").exists());
}

#[tokio::test(start_paused = true)]
async fn test_failing_camera_waits_one_interval_between_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::default();
    let camera = FlickerCamera {
        fail_stills: true,
        ..FlickerCamera::default()
    };
    let mut pipeline = started(test_config(dir.path()), camera, &drive).await;

    // 2 Hz sampling: one failed cycle per 500ms.
    let outcome = tokio::time::timeout(Duration::from_secs(10), pipeline.run()).await;
    assert!(outcome.is_err());

    let cycles = pipeline.cycles();
    assert!((19..=21).contains(&cycles), "ran {} cycles", cycles);
    assert!(drive.folder_names().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_eviction_of_already_deleted_cached_folder() {
    let dir = tempfile::tempdir().unwrap();
    let config = WorkerConfig {
        retention_window_days: 1,
        ..test_config(dir.path())
    };
    let drive = MemoryDrive::default();
    let mut pipeline = started(config, FlickerCamera::default(), &drive)
        .await
        .with_clock(daily_clock());

    pipeline.run_cycle().await.unwrap();
    drive.state.lock().unwrap().folders.clear();

    pipeline.run_cycle().await.unwrap();

    let text = std::fs::read_to_string(dir.path().join("folder_list.txt")).unwrap();
    assert_eq!(text, "2024-01-02\n");
    assert!(!dir.path().join("clips/2024-01-01").exists());
    assert!(pipeline.cached_folder(&FolderName::from("2024-01-01")).is_none());
}
