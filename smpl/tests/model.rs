use float_cmp::approx_eq;
use rstest::rstest;
use smpl::{Admission, Error, Model, ModelConfig, Phase, Reservation, TransactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Arrival,
    Departure,
}

fn tx(id: u64) -> TransactionId {
    TransactionId::from(id)
}

fn model(servers: usize) -> anyhow::Result<Model<Kind>> {
    let mut model = Model::new(ModelConfig::default());
    model.init("integration")?;
    model.resource(servers)?;
    Ok(model)
}

#[test]
fn test_waiting_transactions_are_admitted_in_order() -> anyhow::Result<()> {
    let mut model = model(2)?;
    for id in 1..=5 {
        model.request(tx(id))?;
    }
    let state = model.resource_state(smpl::ResourceId::PRIMARY)?;
    assert_eq!(state.busy(), 2);
    assert_eq!(
        state.queue().iter().copied().collect::<Vec<_>>(),
        vec![tx(3), tx(4), tx(5)]
    );

    assert_eq!(model.release(tx(2))?, Admission::Admitted(tx(3)));
    assert_eq!(model.release(tx(1))?, Admission::Admitted(tx(4)));
    assert_eq!(model.release(tx(3))?, Admission::Admitted(tx(5)));
    assert_eq!(model.release(tx(4))?, Admission::Vacant);
    assert_eq!(model.release(tx(5))?, Admission::Vacant);
    assert_eq!(
        model.release(tx(5)),
        Err(Error::ReleaseWithoutReservation(tx(5)))
    );

    let report = model.report()?;
    assert_eq!(report.total_releases, 5);
    assert_eq!(report.total_direct_admissions, 2);
    assert_eq!(report.total_queue_exits, 3);
    assert_eq!(report.max_queue_length, 3);
    Ok(())
}

#[test]
fn test_report_does_not_stop_the_model() -> anyhow::Result<()> {
    let mut model = model(1)?;
    model.schedule(Kind::Arrival, 0.0, tx(1))?;
    model.schedule(Kind::Departure, 2.0, tx(1))?;
    model.schedule(Kind::Arrival, 4.0, tx(2))?;

    model.cause()?;
    model.request(tx(1))?;
    model.cause()?;
    let first = model.report()?;
    assert_eq!(model.phase(), Phase::Reported);
    assert_eq!(first.elapsed, 2.0);
    assert_eq!(first.utilization, 1.0);
    assert_eq!(first.total_releases, 0);

    // The report reflects the state at the time it was taken, and nothing is reset.
    model.release(tx(1))?;
    assert_eq!(model.phase(), Phase::Running);
    model.cause()?;
    let second = model.report()?;
    assert_eq!(second.elapsed, 4.0);
    assert_eq!(second.events, 3);
    assert!(approx_eq!(f64, second.utilization, 0.5, ulps = 2));
    assert!(approx_eq!(f64, second.mean_busy_period, 2.0, ulps = 2));
    assert_eq!(second.total_releases, 1);
    Ok(())
}

#[test]
fn test_report_serializes() -> anyhow::Result<()> {
    let mut model = model(3)?;
    let report = serde_json::to_value(model.report()?)?;
    assert_eq!(report["name"], "integration");
    assert_eq!(report["servers"], 3);
    assert_eq!(report["utilization"], 0.0);
    assert_eq!(report["resources"][0]["capacity"], 3);
    Ok(())
}

#[rstest(
    stream,
    expected,
    case(1, 0.562_458_934_028_959_9),
    case(5, 0.162_232_898_242_698_6)
)]
fn test_streams_are_reproducible(stream: usize, expected: f64) {
    let mut first: Model<Kind> = Model::new(ModelConfig::default());
    let mut second: Model<Kind> = Model::new(ModelConfig::default());
    first.select_stream(stream).unwrap();
    second.select_stream(stream).unwrap();
    assert_eq!(first.uniform(), expected);
    assert_eq!(second.uniform(), expected);
    for _ in 0..100 {
        assert_eq!(first.uniform(), second.uniform());
    }
}
