// src/sensor/tests.rs
//! Unit tests for sensor components

use crate::sensor::{
    BodyPose, JointId, JointSample, MotionScript, Point3, ScriptedSkeletonSource,
    SimulatorConfig, SimulatorError, SkeletonFrame, SkeletonSource, SourceType, Body, JointMap,
};

fn short_script() -> MotionScript {
    MotionScript::starting_at(BodyPose::standing(3.0))
        .hold(2)
        .then(3, |pose| {
            pose.translate(Point3::new(0.0, 0.0, -0.3));
        })
}

#[test]
fn test_joint_sample_creation() {
    let sample = JointSample::tracked(Point3::new(0.1, 0.2, 0.3), 42, 1234567890);
    assert!(sample.tracked);
    assert_eq!(sample.frame_index, 42);
    assert_eq!(sample.position.axis(crate::sensor::Axis::Z), 0.3);

    let lost = JointSample::untracked(43, 0);
    assert!(!lost.tracked);
}

#[test]
fn test_first_tracked_body_wins() {
    let mut frame = SkeletonFrame::empty(0, 0);
    assert!(frame.first_tracked_body().is_none());

    frame.bodies.push(Body { tracking_id: 7, is_tracked: false, joints: JointMap::new() });
    frame.bodies.push(Body { tracking_id: 8, is_tracked: true, joints: JointMap::new() });
    frame.bodies.push(Body { tracking_id: 9, is_tracked: true, joints: JointMap::new() });
    assert_eq!(frame.first_tracked_body().map(|b| b.tracking_id), Some(8));
}

#[test]
fn test_point_distance() {
    let a = Point3::new(0.0, 0.0, 0.0);
    let b = Point3::new(3.0, 4.0, 0.0);
    assert!((a.distance_to(&b) - 5.0).abs() < 1e-6);
    assert_eq!(a.lerp(&b, 0.5), Point3::new(1.5, 2.0, 0.0));
}

#[test]
fn test_source_type_serialization() {
    let json = serde_json::to_string(&SourceType::Kinect).expect("Failed to serialize");
    assert_eq!(json, "\"kinect\"");
    let joint: JointId = serde_json::from_str("\"spine_mid\"").expect("Failed to deserialize");
    assert_eq!(joint, JointId::SpineMid);
}

#[test]
fn test_simulator_config_validation() {
    assert!(SimulatorConfig::default().validate().is_ok());

    let mut config = SimulatorConfig::default();
    config.dropout_probability = 1.5;
    assert!(config.validate().is_err());

    let mut config = SimulatorConfig::default();
    config.frame_rate_hz = 0;
    assert!(matches!(
        ScriptedSkeletonSource::new(short_script(), config),
        Err(SimulatorError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_source_requires_open() {
    let mut source = ScriptedSkeletonSource::new(short_script(), SimulatorConfig::noiseless()).unwrap();
    assert_eq!(source.next_frame().await, Err(SimulatorError::NotOpen));
}

#[tokio::test]
async fn test_source_replays_script() {
    let mut source = ScriptedSkeletonSource::new(short_script(), SimulatorConfig::noiseless()).unwrap();
    source.open().await.unwrap();

    let mut depths = Vec::new();
    while let Some(frame) = source.next_frame().await.unwrap() {
        let body = frame.first_tracked_body().unwrap();
        assert_eq!(body.joints.len(), JointId::ALL.len());
        depths.push(body.joints[&JointId::SpineMid].position.z);
    }

    assert_eq!(depths.len(), 6);
    assert_eq!(depths[0], 3.0);
    assert!((depths[5] - 2.7).abs() < 1e-6);
    assert_eq!(source.frames_remaining(), 0);
    source.close().await.unwrap();
}

#[tokio::test]
async fn test_jitter_is_seeded() {
    let config = SimulatorConfig { jitter_m: 0.01, ..SimulatorConfig::default() };

    let mut first = ScriptedSkeletonSource::new(short_script(), config.clone()).unwrap();
    let mut second = ScriptedSkeletonSource::new(short_script(), config).unwrap();
    first.open().await.unwrap();
    second.open().await.unwrap();

    let a = first.next_frame().await.unwrap().unwrap();
    let b = second.next_frame().await.unwrap().unwrap();
    assert_eq!(a, b);

    let spine = a.bodies[0].joints[&JointId::SpineMid].position;
    assert!((spine.z - 3.0).abs() <= 0.0101);
}

#[tokio::test]
async fn test_dropout_and_untracked_bodies() {
    let config = SimulatorConfig {
        dropout_probability: 1.0,
        untracked_bodies: 2,
        ..SimulatorConfig::noiseless()
    };
    let mut source = ScriptedSkeletonSource::new(short_script(), config).unwrap();
    source.open().await.unwrap();

    let frame = source.next_frame().await.unwrap().unwrap();
    assert_eq!(frame.bodies.len(), 3);
    let body = frame.first_tracked_body().unwrap();
    assert_eq!(body.tracking_id, 1);
    assert!(body.joints.values().all(|s| !s.tracked));
}

#[test]
fn test_source_info() {
    let source = ScriptedSkeletonSource::new(short_script(), SimulatorConfig::default()).unwrap();
    let info = source.source_info();
    assert_eq!(info.capabilities.nominal_frame_rate_hz, 30);
    assert_eq!(info.capabilities.joint_count, 25);
}
