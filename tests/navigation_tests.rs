//! Nav mesh and kinematic navigator tests

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use parking_sim::simulation::{Anchor, KinematicNavigator, NavMesh, Navigator, Position, SceneLayout};

fn straight_mesh() -> Arc<NavMesh> {
    let mut mesh = NavMesh::new();
    mesh.connect_chain(&[
        Position::new(0.0, 0.0, 0.0),
        Position::new(10.0, 0.0, 0.0),
        Position::new(20.0, 0.0, 0.0),
    ]);
    Arc::new(mesh)
}

#[test]
fn test_add_node_reuses_positions() {
    let mut mesh = NavMesh::new();
    let a = mesh.add_node(Position::new(1.0, 0.0, 1.0));
    let b = mesh.add_node(Position::new(1.0, 0.0, 1.0));
    assert_eq!(a, b);
    assert_eq!(mesh.node_count(), 1);

    let c = mesh.add_node(Position::new(5.0, 0.0, 1.0));
    mesh.connect(a, c);
    mesh.connect(a, c);
    assert_eq!(mesh.edge_count(), 2);
}

#[test]
fn test_find_path_follows_the_chain() {
    let mesh = straight_mesh();
    let path = mesh.find_path(&Position::new(0.0, 0.0, 0.0), &Position::new(20.0, 0.0, 0.0));
    assert_eq!(
        path,
        vec![Position::new(10.0, 0.0, 0.0), Position::new(20.0, 0.0, 0.0)]
    );
}

#[test]
fn test_find_path_ends_at_the_exact_target() {
    let mesh = straight_mesh();
    let target = Position::new(19.0, 0.0, 1.0);
    let path = mesh.find_path(&Position::new(0.0, 0.0, 0.0), &target);
    assert_eq!(path.last(), Some(&target));
    assert_eq!(path.first(), Some(&Position::new(10.0, 0.0, 0.0)));
}

#[test]
fn test_find_path_on_empty_mesh_is_straight() {
    let mesh = NavMesh::new();
    let target = Position::new(3.0, 0.0, 4.0);
    assert_eq!(mesh.find_path(&Position::default(), &target), vec![target]);
}

#[test]
fn test_demo_mesh_links_lot_to_road() {
    let layout = SceneLayout::demo(4);
    let mesh = layout.build_nav_mesh();

    // spawn + 5 waypoints + exit, lot entry, 4 bay entries
    assert_eq!(mesh.node_count(), 12);

    let bay_entry = layout.spot_markers[0]
        .entry_point
        .expect("demo bays have entry points")
        .position;
    let path = mesh.find_path(&layout.spawn_point.position, &bay_entry);
    let lot_entry = layout.parking_entry.expect("demo lot has an entry").position;
    assert!(path.contains(&lot_entry));
    assert_eq!(path.last(), Some(&bay_entry));
}

#[test]
fn test_navigator_path_is_pending_for_one_tick() {
    let mut nav = KinematicNavigator::new(straight_mesh());
    nav.warp(Anchor::at(0.0, 0.0));
    nav.set_speed(5.0);
    nav.set_angular_speed(360.0);

    nav.set_destination(Position::new(20.0, 0.0, 0.0));
    assert!(nav.path_pending());
    assert_eq!(nav.remaining_distance(), f32::INFINITY);
    assert!(!nav.has_arrived());

    nav.advance(0.1);
    assert!(!nav.path_pending());
    assert_eq!(nav.pose().position, Position::new(0.0, 0.0, 0.0));
    assert!((nav.remaining_distance() - 20.0).abs() < 1e-4);

    nav.advance(1.0);
    assert!((nav.pose().position.x - 5.0).abs() < 1e-4);

    nav.advance(3.0);
    assert_eq!(nav.pose().position, Position::new(20.0, 0.0, 0.0));
    assert!(nav.has_arrived());
}

#[test]
fn test_navigator_turns_at_limited_rate() {
    let mut nav = KinematicNavigator::new(straight_mesh());
    nav.warp(Anchor::at(0.0, 0.0));
    nav.set_speed(1.0);
    nav.set_angular_speed(45.0);
    nav.set_destination(Position::new(10.0, 0.0, 0.0));
    nav.advance(0.1);

    nav.advance(1.0);
    let yaw = nav.pose().yaw;
    assert!((yaw - 45f32.to_radians()).abs() < 1e-4, "yaw was {}", yaw);

    nav.advance(2.0);
    assert!((nav.pose().yaw - FRAC_PI_2).abs() < 1e-4);
}

#[test]
fn test_stopped_navigator_holds_position() {
    let mut nav = KinematicNavigator::new(straight_mesh());
    nav.warp(Anchor::at(0.0, 0.0));
    nav.set_speed(5.0);
    nav.set_destination(Position::new(10.0, 0.0, 0.0));
    nav.advance(0.1);

    nav.set_stopped(true);
    nav.advance(1.0);
    assert_eq!(nav.pose().position, Position::new(0.0, 0.0, 0.0));
    assert!(nav.is_stopped());

    nav.set_stopped(false);
    nav.advance(1.0);
    assert!((nav.pose().position.x - 5.0).abs() < 1e-4);
}

#[test]
fn test_warp_drops_the_current_path() {
    let mut nav = KinematicNavigator::new(straight_mesh()).with_stopping_distance(0.25);
    nav.set_destination(Position::new(20.0, 0.0, 0.0));
    assert_eq!(nav.destination(), Some(Position::new(20.0, 0.0, 0.0)));

    let anchor = Anchor::at(7.0, 3.0).with_yaw(1.0);
    nav.warp(anchor);
    assert_eq!(nav.pose(), anchor);
    assert_eq!(nav.destination(), None);
    assert!(!nav.path_pending());
    assert_eq!(nav.remaining_distance(), 0.0);
    assert_eq!(nav.stopping_distance(), 0.25);
}

#[test]
fn test_position_helpers() {
    let a = Position::new(0.0, 0.0, 0.0);
    let b = Position::new(3.0, 0.0, 4.0);
    assert_eq!(a.distance(&b), 5.0);
    assert_eq!(a.move_towards(&b, 10.0), b);
    assert_eq!(a.lerp(&b, 0.5), Position::new(1.5, 0.0, 2.0));

    let east = Position::new(1.0, 0.0, 0.0);
    assert!((a.angle_to(&east) - FRAC_PI_2).abs() < 1e-6);
    assert_eq!(a.angle_to(&a), 0.0);
}

#[test]
fn test_segments_list_every_link() {
    let mesh = straight_mesh();
    let positions: Vec<Position> = mesh.positions().copied().collect();
    assert_eq!(positions.len(), mesh.node_count());
    assert!(positions.contains(&Position::new(10.0, 0.0, 0.0)));

    let segments: Vec<(Position, Position)> = mesh.segments().collect();
    assert_eq!(segments.len(), mesh.edge_count());
    assert!(segments.contains(&(Position::new(0.0, 0.0, 0.0), Position::new(10.0, 0.0, 0.0))));
    assert!(segments.contains(&(Position::new(20.0, 0.0, 0.0), Position::new(10.0, 0.0, 0.0))));

    let mut one_way = NavMesh::new();
    let a = one_way.add_node(Position::new(0.0, 0.0, 0.0));
    let b = one_way.add_node(Position::new(5.0, 0.0, 0.0));
    one_way.add_link(a, b);
    assert_eq!(
        one_way.segments().collect::<Vec<_>>(),
        vec![(Position::new(0.0, 0.0, 0.0), Position::new(5.0, 0.0, 0.0))]
    );
}

#[test]
fn test_navigator_reports_its_speeds() {
    let mut nav = KinematicNavigator::new(straight_mesh());
    nav.set_speed(4.5);
    nav.set_angular_speed(180.0);
    assert_eq!(nav.speed(), 4.5);
    assert_eq!(nav.angular_speed(), 180.0);
}
