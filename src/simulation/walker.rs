use super::types::{SimulationParams, SpinRecord};

use rand::Rng;
use rand_distr::StandardNormal;

/// Simulates one spin diffusing inside the circle and returns its accumulated phases.
///
/// The start point is uniform over the disc. Every step adds an independent gaussian
/// displacement per axis; displacements leaving the circle are redrawn.
pub fn walk_spin<R: Rng>(params: &SimulationParams, rng: &mut R) -> SpinRecord {
    let radius = params.radius();
    let square_radius = radius * radius;
    let deviation = params.step_deviation();
    let sin_step = params.sin_phase_step();
    let half = params.num_steps / 2;

    let (mut x, mut y) = loop {
        let x = rng.gen_range(-radius..=radius);
        let y = rng.gen_range(-radius..=radius);
        if x * x + y * y <= square_radius {
            break (x, y);
        }
    };
    let start_x = x;

    let mut phase_square = 0.0;
    let mut phase_sin = 0.0;

    for j in 0..params.num_steps {
        if j < half {
            phase_square += x;
        } else {
            phase_square -= x;
        }
        phase_sin += x * (sin_step * j as f64).sin();

        (x, y) = loop {
            let dx: f64 = rng.sample(StandardNormal);
            let dy: f64 = rng.sample(StandardNormal);
            let next_x = x + deviation * dx;
            let next_y = y + deviation * dy;
            if next_x * next_x + next_y * next_y <= square_radius {
                break (next_x, next_y);
            }
        };
    }

    let dt = params.dt();
    SpinRecord {
        phase_delta: start_x - x,
        phase_square: phase_square * dt,
        phase_sin: phase_sin * dt,
    }
}
