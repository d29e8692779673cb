use std::time::Duration;
use wayline::common::{IoValue, MotionSettings, PlanningError, Pose};
use wayline::domains::actions::{Action, AsyncActionSpec, CombinedActions, MotionTarget};
use wayline::domains::planning::MotionKind;

fn pose(x: f64) -> Pose {
    Pose::from_position(x, 0.0, 0.0)
}

fn spec(name: &str, blocking: bool) -> AsyncActionSpec {
    AsyncActionSpec {
        name: name.to_string(),
        args: Vec::new(),
        kwargs: serde_json::Map::new(),
        blocking,
        timeout: None,
    }
}

#[test]
fn write_between_two_motions_gets_path_parameter_one() {
    let actions: CombinedActions = [
        Action::linear(pose(100.0)),
        Action::write("gripper", IoValue::Bool(true)),
        Action::linear(pose(200.0)),
    ]
    .into_iter()
    .collect();

    let locations = actions.action_locations();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].path_parameter, 1.0);
    assert!(matches!(locations[0].action, Action::Write { .. }));
}

#[test]
fn side_effects_between_the_same_motions_share_one_parameter() {
    let actions: CombinedActions = [
        Action::linear(pose(100.0)),
        Action::write("valve", IoValue::Bool(true)),
        Action::wait(Duration::from_millis(100)),
        Action::run(spec("take_photo", false)),
        Action::linear(pose(200.0)),
    ]
    .into_iter()
    .collect();

    let locations = actions.action_locations();
    assert_eq!(locations.len(), 3);
    assert!(locations.iter().all(|l| l.path_parameter == 1.0));
}

#[test]
fn leading_side_effects_anchor_at_zero() {
    let actions: CombinedActions = [
        Action::write("lamp", IoValue::Bool(true)),
        Action::linear(pose(50.0)),
    ]
    .into_iter()
    .collect();

    let locations = actions.action_locations();
    assert_eq!(locations[0].path_parameter, 0.0);
}

#[test]
fn combine_preserves_order() {
    let mut a = CombinedActions::new();
    a.append(Action::linear(pose(1.0)));
    a.append(Action::write("out", IoValue::Int(1)));
    let mut b = CombinedActions::new();
    b.append(Action::cartesian_ptp(pose(2.0)));

    let combined = CombinedActions::combine(&a, &b);
    assert_eq!(combined.len(), 3);
    assert!(matches!(combined.items()[0], Action::Linear { .. }));
    assert!(matches!(combined.items()[1], Action::Write { .. }));
    assert!(matches!(combined.items()[2], Action::CartesianPtp { .. }));
}

#[test]
fn motion_classification_is_exhaustive() {
    assert!(Action::linear(pose(1.0)).is_motion());
    assert!(Action::cartesian_ptp(pose(1.0)).is_motion());
    assert!(Action::circular(pose(2.0), pose(1.0)).is_motion());
    assert!(Action::joint_ptp(vec![0.0; 6]).unwrap().is_motion());
    assert!(Action::spline(vec![pose(1.0), pose(2.0)]).unwrap().is_motion());
    assert!(Action::collision_free(MotionTarget::Joints(vec![0.0; 6]))
        .unwrap()
        .is_motion());
    assert!(!Action::write("k", IoValue::Bool(false)).is_motion());
    assert!(!Action::wait(Duration::from_millis(10)).is_motion());
    assert!(!Action::run(spec("beep", false)).is_motion());
}

#[test]
fn empty_targets_are_rejected() {
    assert!(matches!(
        Action::joint_ptp(Vec::new()),
        Err(PlanningError::InvalidTarget { .. })
    ));
    assert!(matches!(
        Action::spline(Vec::new()),
        Err(PlanningError::InvalidTarget { .. })
    ));
    assert!(matches!(
        Action::collision_free(MotionTarget::Joints(Vec::new())),
        Err(PlanningError::InvalidTarget { .. })
    ));
}

#[test]
fn to_set_io_list_projects_writes_at_their_location() {
    let actions: CombinedActions = [
        Action::write("start_lamp", IoValue::Bool(true)),
        Action::linear(pose(100.0)),
        Action::write("gripper", IoValue::Float(0.5)),
        Action::linear(pose(200.0)),
        Action::run(spec("take_photo", false)),
    ]
    .into_iter()
    .collect();

    let set_ios = actions.to_set_io_list();
    assert_eq!(set_ios.len(), 2);
    assert_eq!(set_ios[0].location, 0.0);
    assert_eq!(set_ios[0].key, "start_lamp");
    assert_eq!(set_ios[1].location, 1.0);
    assert_eq!(set_ios[1].key, "gripper");

    let async_actions = actions.async_actions();
    assert_eq!(async_actions.len(), 1);
    assert_eq!(async_actions[0].0, 2.0);
    assert_eq!(async_actions[0].1.name, "take_photo");
}

#[test]
fn motion_commands_carry_kind_and_settings() {
    let settings = MotionSettings {
        tcp_velocity_limit: Some(250.0),
        tcp_acceleration_limit: None,
        blending_radius: Some(5.0),
    };
    let actions: CombinedActions = [
        Action::linear(pose(100.0)).with_settings(settings),
        Action::write("ignored", IoValue::Bool(true)),
        Action::circular(pose(300.0), pose(200.0)),
    ]
    .into_iter()
    .collect();

    let commands = actions.to_motion_commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].kind, MotionKind::Linear);
    assert_eq!(commands[0].settings.tcp_velocity_limit, Some(250.0));
    assert_eq!(commands[1].kind, MotionKind::Circular);
    assert!(commands[1].intermediate.is_some());
}

#[test]
fn collision_scene_only_applies_to_motions() {
    let motion = Action::linear(pose(1.0)).with_collision_scene("cell-1");
    assert_eq!(motion.collision_scene(), Some("cell-1"));

    let write = Action::write("k", IoValue::Bool(true)).with_collision_scene("cell-1");
    assert_eq!(write.collision_scene(), None);
}
