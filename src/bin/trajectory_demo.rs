// Trajectory generation demo: profile an S-curve and plot the result.
use trajectory_planner::{
    Moment, PathType, RobotSpecs, Trajectory, TrajectoryParams, Waypoint,
};

use gnuplot::{AxesCommon, Caption, Color, Figure};
use std::f64::consts::FRAC_PI_2;

fn main() {
    println!("Trajectory generation demo start!!");

    let specs = RobotSpecs::new(5.0, 3.5, 2.0);
    let params = TrajectoryParams {
        waypoints: vec![
            Waypoint::new(0.0, 0.0, 0.0),
            Waypoint::new(8.0, 4.0, FRAC_PI_2),
            Waypoint::new(6.0, 12.0, std::f64::consts::PI),
        ],
        alpha: 6.0,
        sample_count: 1000,
        path_type: PathType::QuinticHermite,
        is_tank: false,
    };

    let trajectory = match Trajectory::<Moment>::new(&specs, &params) {
        Ok(t) => t,
        Err(e) => {
            println!("Failed to generate trajectory: {}", e);
            return;
        }
    };

    println!(
        "Generated {} moments, total time {:.2} s, path length {:.2} m",
        trajectory.moments().len(),
        trajectory.total_time(),
        trajectory.path().total_length()
    );

    // Plot the path
    let n = 200;
    let mut px: Vec<f64> = Vec::with_capacity(n + 1);
    let mut py: Vec<f64> = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let p = trajectory.path().at(i as f64 / n as f64);
        px.push(p[0]);
        py.push(p[1]);
    }
    let wx: Vec<f64> = params.waypoints.iter().map(|w| w.x).collect();
    let wy: Vec<f64> = params.waypoints.iter().map(|w| w.y).collect();

    let mut fg = Figure::new();
    let axes = fg.axes2d();
    axes.lines(&px, &py, &[Caption("Quintic Hermite Path"), Color("blue")]);
    axes.points(&wx, &wy, &[Caption("Waypoints"), Color("red")]);
    axes.set_title("Trajectory Path", &[])
        .set_x_label("X [m]", &[])
        .set_y_label("Y [m]", &[])
        .set_aspect_ratio(gnuplot::AutoOption::Fix(1.0));
    fg.save_to_png("img/trajectory_path.png", 800, 600).unwrap();
    println!("Plot saved to: img/trajectory_path.png");

    // Plot the velocity profile
    let times: Vec<f64> = trajectory.moments().iter().map(|m| m.time).collect();
    let velocities: Vec<f64> = trajectory.moments().iter().map(|m| m.velocity).collect();
    let mut fg = Figure::new();
    let axes = fg.axes2d();
    axes.lines(&times, &velocities, &[Caption("Velocity"), Color("red")]);
    axes.set_title("Velocity Profile", &[])
        .set_x_label("Time [s]", &[])
        .set_y_label("Speed [m/s]", &[]);
    fg.save_to_png("img/trajectory_velocity_profile.png", 800, 600)
        .unwrap();
    println!("Plot saved to: img/trajectory_velocity_profile.png");

    println!("Trajectory generation demo finish!!");
}
