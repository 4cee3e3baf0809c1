use approx::assert_abs_diff_eq;
use integration_tests::{TankCascade, default_tank, levels};
use tanksim_components::{TankModel, TankSimConfig, TankSnapshot};
use tanksim_core::{ControllerConfig, Gains, Simulator, SimulatorConfig, Stepping};
use uom::si::{f64::Time, length::meter, time::second};

#[test]
fn steady_state_holds_for_a_long_run() {
    let mut sim = default_tank();
    let trajectory = levels(&mut sim, 1000);

    for level in trajectory {
        assert_abs_diff_eq!(level, 2.5, epsilon = 1e-4);
    }
    assert_abs_diff_eq!(sim.inputs()[TankModel::VALVE_POSITION], 0.5, epsilon = 1e-4);
}

#[test]
fn raising_the_setpoint_fills_the_tank() {
    let mut sim = default_tank();
    sim.set_setpoint(0, 3.0).unwrap();

    let trajectory = levels(&mut sim, 1000);

    // The loop is underdamped, so the level overshoots before settling.
    let peak = trajectory.iter().copied().fold(f64::MIN, f64::max);
    assert!(peak > 3.0);
    assert!(peak < TankModel::default().max_height().get::<meter>());

    assert_abs_diff_eq!(sim.state()[0], 3.0, epsilon = 0.01);
    assert_abs_diff_eq!(sim.error(0).unwrap(), 0.0, epsilon = 0.01);

    // At the new level, the valve must open less to pass the same inflow.
    let expected_valve = 1.0 / (1.2649 * 3.0_f64.sqrt());
    assert_abs_diff_eq!(sim.controller_output(0).unwrap(), expected_valve, epsilon = 0.01);
}

#[test]
fn lowering_the_setpoint_drains_the_tank() {
    let mut sim = default_tank();
    sim.set_setpoint(0, 2.0).unwrap();

    let trajectory = levels(&mut sim, 1000);

    let trough = trajectory.iter().copied().fold(f64::MAX, f64::min);
    assert!(trough < 2.0);
    assert!(trough > 0.0);
    assert_abs_diff_eq!(sim.state()[0], 2.0, epsilon = 0.01);
}

#[test]
fn inlet_disturbance_is_rejected() {
    let mut sim = default_tank();
    sim.set_input(TankModel::INLET_FLOW, 1.2).unwrap();

    levels(&mut sim, 1500);

    // The inlet is not under control, so the disturbance persists.
    assert_eq!(sim.inputs()[TankModel::INLET_FLOW], 1.2);
    assert_abs_diff_eq!(sim.state()[0], 2.5, epsilon = 1e-3);
    assert_abs_diff_eq!(sim.controller_output(0).unwrap(), 0.6, epsilon = 1e-3);
}

#[test]
fn saturated_valve_winds_up_only_to_its_bound() {
    let mut sim = default_tank();

    // More inflow than a fully open valve can pass at any safe level.
    sim.set_input(TankModel::INLET_FLOW, 3.0).unwrap();
    levels(&mut sim, 1500);

    let controller = sim.controller(0).unwrap();
    assert_eq!(sim.controller_output(0).unwrap(), 1.0);
    assert_eq!(controller.integral(), controller.max_integral());
    assert!(sim.state()[0] > TankModel::default().max_height().get::<meter>());

    // Once the disturbance clears, the bounded accumulator lets the loop recover.
    sim.set_input(TankModel::INLET_FLOW, 1.0).unwrap();
    let recovery = levels(&mut sim, 2000);

    assert!(recovery.iter().any(|&level| level < 2.5));
    assert_abs_diff_eq!(sim.state()[0], 2.5, epsilon = 1e-3);
    for _ in 0..10 {
        sim.step().unwrap();
        let output = sim.controller_output(0).unwrap();
        assert!((0.0..=1.0).contains(&output));
    }
}

#[test]
fn retuning_mid_transient_is_bumpless() {
    let mut sim = default_tank();
    sim.set_setpoint(0, 3.0).unwrap();
    levels(&mut sim, 100);

    let integral = sim.controller(0).unwrap().integral();
    sim.set_controller_gains(0, Gains::new(-2.0, 5.0, 1.0)).unwrap();
    assert_eq!(sim.controller(0).unwrap().integral(), integral);

    levels(&mut sim, 900);
    assert_abs_diff_eq!(sim.state()[0], 3.0, epsilon = 1e-3);
}

#[test]
fn cascaded_tanks_are_controlled_independently() {
    let upper = TankSimConfig::level_controller();
    let lower = ControllerConfig {
        measured_index: 1,
        output_index: 2,
        ..upper.clone()
    };

    let config = SimulatorConfig {
        controllers: vec![upper, lower],
        initial_state: vec![2.5, 2.5],
        initial_inputs: vec![1.0, 0.5, 0.5],
        dt: Time::new::<second>(1.0),
    };
    let mut sim = Simulator::new(TankCascade::default(), config).unwrap();

    sim.set_setpoint(1, 2.0).unwrap();
    sim.advance(Stepping::FixedSteps { num_steps: 1500 }).unwrap();

    assert_abs_diff_eq!(sim.state()[0], 2.5, epsilon = 1e-3);
    assert_abs_diff_eq!(sim.state()[1], 2.0, epsilon = 1e-3);
    assert_eq!(sim.setpoint(0), Ok(2.5));
    assert_eq!(sim.setpoint(1), Ok(2.0));
}

#[test]
fn reset_replays_a_scripted_run_exactly() {
    fn script(sim: &mut Simulator<TankModel>) -> Vec<TankSnapshot> {
        let mut snapshots = Vec::new();
        for tick in 0..400 {
            match tick {
                10 => sim.set_setpoint(0, 3.2).unwrap(),
                150 => sim.set_input(TankModel::INLET_FLOW, 1.3).unwrap(),
                300 => sim.set_setpoint(0, 2.2).unwrap(),
                _ => {}
            }
            sim.step().unwrap();
            snapshots.push(TankSnapshot::capture(sim, 0).unwrap());
        }
        snapshots
    }

    let expected = script(&mut default_tank());

    let mut sim = default_tank();
    sim.reset();
    assert_eq!(script(&mut sim), expected);

    sim.reset();
    assert_eq!(script(&mut sim), expected);
}

#[test]
fn until_time_covers_the_requested_span() {
    let mut sim = default_tank();
    sim.advance(Stepping::UntilTime {
        end_time: Time::new::<second>(59.5),
    })
    .unwrap()
    .advance(Stepping::FixedSteps { num_steps: 40 })
    .unwrap();

    assert_eq!(sim.time().get::<second>(), 100.0);
}
