use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use csi_monitor::capture::{CaptureError, load_capture, trim_to_common_length};
use csi_monitor::presence::{Detection, Features, Thresholds};
use csi_monitor::report::{analyze_scenario, write_cards};
use tempfile::TempDir;

const SUBCARRIERS: usize = 16;

/// Static channel with a small periodic jitter.
fn empty_room(frames: usize) -> String {
    let mut log = String::from("I (312) CSI: CSI initialized\n");
    for t in 0..frames {
        log.push_str("CSI_DATA:");
        for sc in 0..SUBCARRIERS {
            let jitter = ((t * 7 + sc * 5) % 3) as i32 - 1;
            write!(log, " {}", 10 + sc as i32 + jitter).unwrap();
        }
        log.push('\n');
    }
    log
}

/// A strong disturbance sweeping back and forth across the subcarriers.
fn walking(frames: usize) -> String {
    let mut log = String::new();
    for t in 0..frames {
        let phase = (t / 4) % (2 * SUBCARRIERS);
        let active = if phase < SUBCARRIERS { phase } else { 2 * SUBCARRIERS - 1 - phase };
        log.push_str("CSI_DATA:");
        for sc in 0..SUBCARRIERS {
            let disturbance = if sc.abs_diff(active) <= 1 { 40 } else { 0 };
            write!(log, " {}", 10 + sc as i32 + disturbance).unwrap();
        }
        log.push_str(" \n");
        if t % 50 == 0 {
            log.push_str("I (900) CSI: Retrying WiFi connection...\n");
        }
    }
    log
}

fn write_capture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn walking_is_told_apart_from_the_empty_room() {
    let dir = TempDir::new().unwrap();
    let empty_path = write_capture(&dir, "empty.txt", &empty_room(150));
    let walking_path = write_capture(&dir, "walking.txt", &walking(130));

    let mut captures = vec![
        load_capture(&empty_path).unwrap(),
        load_capture(&walking_path).unwrap(),
    ];
    assert_eq!(trim_to_common_length(&mut captures), 130);
    assert_eq!(captures[0].width(), SUBCARRIERS);

    let sigma = 2.0;
    let thresholds = Thresholds::default();
    let baseline = Features::extract(&captures[0], sigma);

    let empty = analyze_scenario("empty", &captures[0], &baseline, sigma, &thresholds);
    let moving = analyze_scenario("walking", &captures[1], &baseline, sigma, &thresholds);

    assert_eq!(empty.assessment.detection, Detection::NoPerson);
    assert!(moving.assessment.detection.is_occupied());
    assert!(moving.features.motion_variance > 10.0 * empty.features.motion_variance);
    assert!(moving.features.mean_energy > empty.features.mean_energy);
    assert_eq!(moving.motion_path.len(), 130);

    let mut out = Vec::new();
    write_cards(&mut out, &[empty, moving]).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(" SCENARIO: walking"));
    assert!(text.ends_with("Detection Complete.\n"));
}

#[test]
fn log_without_samples_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_capture(&dir, "boot.txt", "I (10) CSI: CSI initialized\n");
    assert!(matches!(load_capture(&path), Err(CaptureError::NoCsiData(_))));
}

#[test]
fn missing_file_reports_its_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.txt");
    let err = load_capture(&path).unwrap_err();
    assert!(matches!(err, CaptureError::Io { .. }));
    assert!(err.to_string().contains("absent.txt"));
}
