// Tank-drive trajectory demo: curvature-limited profile with independent
// left/right wheel channels.
use trajectory_planner::{
    PathType, RobotSpecs, TankTrajectory, TrajectoryParams, Waypoint,
};

use gnuplot::{AxesCommon, Caption, Color, Figure};
use std::f64::consts::FRAC_PI_2;

fn main() {
    println!("Tank trajectory demo start!!");

    let specs = RobotSpecs::new(5.0, 3.5, 2.0);
    let params = TrajectoryParams {
        waypoints: vec![
            Waypoint::new(0.0, 0.0, 0.0),
            Waypoint::new(10.0, 10.0, FRAC_PI_2),
        ],
        alpha: 10.0,
        sample_count: 1000,
        path_type: PathType::QuinticHermite,
        is_tank: true,
    };

    let trajectory = match TankTrajectory::new(&specs, &params) {
        Ok(t) => t,
        Err(e) => {
            println!("Failed to generate tank trajectory: {}", e);
            return;
        }
    };

    println!(
        "Generated {} moments, total time {:.2} s",
        trajectory.moments().len(),
        trajectory.total_time()
    );

    // Wheel curves traced on the ground
    let n = 200;
    let mut lx: Vec<f64> = Vec::with_capacity(n + 1);
    let mut ly: Vec<f64> = Vec::with_capacity(n + 1);
    let mut rx: Vec<f64> = Vec::with_capacity(n + 1);
    let mut ry: Vec<f64> = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let (left, right) = trajectory.path().wheels_at(i as f64 / n as f64);
        lx.push(left[0]);
        ly.push(left[1]);
        rx.push(right[0]);
        ry.push(right[1]);
    }

    let mut fg = Figure::new();
    let axes = fg.axes2d();
    axes.lines(&lx, &ly, &[Caption("Left wheel"), Color("blue")]);
    axes.lines(&rx, &ry, &[Caption("Right wheel"), Color("green")]);
    axes.set_title("Tank Drive Wheel Paths", &[])
        .set_x_label("X [m]", &[])
        .set_y_label("Y [m]", &[])
        .set_aspect_ratio(gnuplot::AutoOption::Fix(1.0));
    fg.save_to_png("img/tank_wheel_paths.png", 800, 600).unwrap();
    println!("Plot saved to: img/tank_wheel_paths.png");

    // Per-wheel velocity profiles: the outer wheel rides the limit
    // through the turn while the inner wheel slows down
    let times: Vec<f64> = trajectory.moments().iter().map(|m| m.time).collect();
    let left_v: Vec<f64> = trajectory.moments().iter().map(|m| m.left_velocity).collect();
    let right_v: Vec<f64> = trajectory
        .moments()
        .iter()
        .map(|m| m.right_velocity)
        .collect();

    let mut fg = Figure::new();
    let axes = fg.axes2d();
    axes.lines(&times, &left_v, &[Caption("Left wheel"), Color("blue")]);
    axes.lines(&times, &right_v, &[Caption("Right wheel"), Color("green")]);
    axes.set_title("Wheel Velocity Profiles", &[])
        .set_x_label("Time [s]", &[])
        .set_y_label("Speed [m/s]", &[]);
    fg.save_to_png("img/tank_velocity_profiles.png", 800, 600)
        .unwrap();
    println!("Plot saved to: img/tank_velocity_profiles.png");

    println!("Tank trajectory demo finish!!");
}
