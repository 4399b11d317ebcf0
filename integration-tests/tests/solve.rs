use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use braid_core::function::{Identity, SumOfSquares};
use braid_core::{Problem, Vector, shared};
use braid_observers::{
    IterationLimit, JOURNAL, JsonLinesSink, LogFacets, MemorySink, OptimizationLogger,
};
use braid_solvers::{
    Action, Callback, CallbackError, FactoryError, ResultAnalyzer, SolverError, SolverFactory,
    SolverState, SolverWarning, Status, Wrapper,
};
use integration_tests::fixtures::bounded_bowl;
use ndarray::array;

struct Failing;

impl Callback for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn on_iteration(
        &mut self,
        _problem: &Problem,
        _state: &SolverState,
    ) -> Result<Option<Action>, CallbackError> {
        Err(CallbackError::new("failing", "disk full"))
    }
}

fn sum_of_squares_from(start: Vector) -> Arc<Problem> {
    let cost = SumOfSquares::new(shared(Identity::new(2))).unwrap();
    let mut problem = Problem::new(shared(cost)).unwrap();
    problem.set_starting_point(start).unwrap();
    Arc::new(problem)
}

#[test]
fn only_the_origin_is_stationary() {
    let factory = SolverFactory::with_builtin();

    let far = sum_of_squares_from(array![10.0, 10.0]);
    let solution = factory.create("dummy", Arc::clone(&far)).unwrap().solve().unwrap();
    assert_eq!(solution.x, array![10.0, 10.0]);
    assert_relative_eq!(solution.value, 200.0);
    let kkt = ResultAnalyzer::new(&far, &solution).kkt().unwrap().clone();
    assert!(!kkt.is_satisfied());
    assert_relative_eq!(kkt.residual_norm(), 800.0_f64.sqrt(), max_relative = 1e-6);

    let origin = sum_of_squares_from(array![0.0, 0.0]);
    let solution = factory.create("dummy", Arc::clone(&origin)).unwrap().solve().unwrap();
    let kkt = ResultAnalyzer::new(&origin, &solution).kkt().unwrap().clone();
    assert!(kkt.is_satisfied());
    assert_relative_eq!(kkt.residual_norm(), 0.0);
}

#[test]
fn dummy_solution_is_analyzed() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let factory = SolverFactory::with_builtin();

    let far = bounded_bowl(array![10.0, 10.0]);
    let mut solver = factory.create("dummy", Arc::clone(&far)).unwrap();
    assert_eq!(solver.status(), Status::Created);

    let solution = solver.solve().unwrap();
    assert_eq!(solver.status(), Status::Succeeded);
    assert_eq!(solution.x, array![10.0, 10.0]);
    assert_relative_eq!(solution.value, 81.0 + 64.0);

    let analyzer = ResultAnalyzer::new(&far, &solution);
    let kkt = analyzer.kkt().unwrap();
    assert!(!kkt.is_satisfied());
    assert!(kkt.residual_norm() > 1.0);
    assert!(analyzer.active_set().unwrap().rows.is_empty());

    let optimum = bounded_bowl(array![1.0, 2.0]);
    let solution = factory.create("dummy", Arc::clone(&optimum)).unwrap().solve().unwrap();
    let analyzer = ResultAnalyzer::new(&optimum, &solution);
    assert!(analyzer.kkt().unwrap().is_satisfied());
    assert!(analyzer.active_set().unwrap().bounds.is_empty());
}

#[test]
fn unknown_solvers_list_the_alternatives() {
    let factory = SolverFactory::with_builtin();
    let error = factory
        .create("ipopt", bounded_bowl(array![0.0, 0.0]))
        .err()
        .unwrap();

    assert!(matches!(error, FactoryError::UnknownSolver { .. }));
    assert_eq!(
        error.to_string(),
        "no solver named `ipopt` (available: dummy, dummy-iterations, dummy-laststate)"
    );
}

#[test]
fn failing_solver_reports_its_last_state() {
    let factory = SolverFactory::with_builtin();
    let journal = MemorySink::new();
    let mut solver = factory
        .create("dummy-laststate", bounded_bowl(array![0.0, 0.0]))
        .unwrap();
    solver.add_callback(Box::new(OptimizationLogger::new(
        journal.clone(),
        LogFacets::X | LogFacets::COST,
    )));

    let error = solver.solve().unwrap_err();
    assert_eq!(solver.status(), Status::Failed);
    assert!(matches!(error, SolverError::Failed { .. }));

    let last = error.last_state().unwrap();
    assert_eq!(last.x, Vector::from_elem(2, 1337.0));
    assert_eq!(last.cost, Some(42.0));

    let records = journal.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].cost, Some(42.0));
}

#[test]
fn callback_failures_do_not_stop_the_solve() {
    let factory = SolverFactory::with_builtin();
    let mut solver = factory.create("dummy", bounded_bowl(array![1.0, 1.0])).unwrap();

    let seen = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&seen);
    solver.add_callback(Box::new(Failing));
    solver.add_callback(Box::new(Wrapper::new(
        "counter",
        move |_: &Problem, _: &SolverState| {
            *counter.lock().unwrap() += 1;
            None
        },
    )));
    solver.add_callback(Box::new(IterationLimit::new(1)));

    let solution = solver.solve().unwrap();
    assert_eq!(solver.status(), Status::Warning);
    assert_eq!(*seen.lock().unwrap(), 1);
    assert_eq!(
        solution.warnings,
        [SolverWarning::Callback {
            callback: "failing".into(),
            iteration: 0,
            message: "disk full".into(),
        }]
    );
}

#[test]
fn journal_is_written_as_json_lines() {
    let directory = std::env::temp_dir().join(format!("braid-journal-{}", std::process::id()));
    let factory = SolverFactory::with_builtin();
    {
        let mut solver = factory.create("dummy", bounded_bowl(array![3.0, 4.0])).unwrap();
        let sink = JsonLinesSink::create(&directory).unwrap();
        solver.add_callback(Box::new(OptimizationLogger::new(sink, LogFacets::ALL)));
        solver.solve().unwrap();
    }

    let text = std::fs::read_to_string(directory.join(JOURNAL)).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["event"], "begin");
    assert_eq!(lines[1]["event"], "iteration");
    assert_eq!(lines[1]["x"], serde_json::json!([3.0, 4.0]));
    assert_eq!(lines[1]["cost"], 8.0);
    assert_eq!(lines[1]["constraints"][0]["values"], serde_json::json!([7.0]));
    assert_eq!(lines[1]["constraints"][0]["jacobian"], serde_json::json!([[1.0, 1.0]]));
    assert_eq!(lines[1]["constraint_violation"], 0.0);
    assert_eq!(lines[2]["event"], "finish");
    assert_eq!(lines[2]["iterations"], 1);

    std::fs::remove_dir_all(&directory).unwrap();
}

#[test]
fn iteration_limit_ends_a_longer_solve() {
    let factory = SolverFactory::with_builtin();
    let mut solver = factory
        .create("dummy-iterations", bounded_bowl(array![3.0, 4.0]))
        .unwrap();
    let journal = MemorySink::new();
    solver.add_callback(Box::new(OptimizationLogger::new(
        journal.clone(),
        LogFacets::COST | LogFacets::SOLVER,
    )));
    solver.add_callback(Box::new(IterationLimit::new(3)));

    let solution = solver.solve().unwrap();
    assert_eq!(solution.iterations, 3);
    assert_eq!(solver.status(), Status::Succeeded);

    let records = journal.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].iteration, 2);
    assert_eq!(records[0].cost, Some(8.0));
    assert_eq!(records[0].solver.as_ref().unwrap()["max-iterations"], "10");
}
