use anyhow::Result;
use rand::Rng;
use rand::distr::Uniform;
use sdrflow::blocks::Apply;
use sdrflow::blocks::Combine;
use sdrflow::blocks::Head;
use sdrflow::blocks::MovingAverage;
use sdrflow::blocks::MultiplyConst;
use sdrflow::blocks::Repeat;
use sdrflow::runtime::Error;
use sdrflow::runtime::Mocker;
use sdrflow::runtime::Pmt;

#[test]
fn apply_mock() -> Result<()> {
    let input: Vec<u32> = rand::rng()
        .sample_iter(Uniform::<u32>::new(0, 1024)?)
        .take(128)
        .collect();

    let block = Apply::new(|x: &u32| x + 1);

    let mut mocker = Mocker::new(block);
    mocker.init()?;
    mocker.input(0, input.clone());
    mocker.init_output::<u32>(0, 128);
    mocker.run()?;
    mocker.deinit()?;
    let output = mocker.output::<u32>(0);

    assert_eq!(input.len(), output.len());
    for (a, b) in input.iter().zip(output.iter()) {
        assert_eq!(a + 1, *b);
    }

    Ok(())
}

#[test]
fn output_limits_budget() -> Result<()> {
    let mut mocker = Mocker::new(Apply::new(|x: &u8| x.wrapping_mul(2)));
    mocker.init()?;
    mocker.input(0, vec![1u8; 100]);
    mocker.init_output::<u8>(0, 40);

    mocker.run()?;
    assert_eq!(mocker.output::<u8>(0).len(), 40);
    mocker.run()?;
    assert_eq!(mocker.output::<u8>(0).len(), 40);
    mocker.run()?;
    assert_eq!(mocker.output::<u8>(0).len(), 20);
    assert!(!mocker.finished());

    mocker.run()?;
    assert!(mocker.finished());
    assert_eq!(mocker.stats().items_consumed, 100);

    Ok(())
}

#[test]
fn combine_mock() -> Result<()> {
    let mut mocker = Mocker::new(Combine::new(|a: &f32, b: &f32| a * b));
    mocker.input(0, vec![1.0f32, 2.0, 3.0, 4.0]);
    mocker.input(1, vec![2.0f32, 2.0, 2.0]);
    mocker.init_output::<f32>(0, 16);
    mocker.run_to_completion()?;

    assert_eq!(mocker.output::<f32>(0), vec![2.0, 4.0, 6.0]);
    assert!(mocker.finished());

    Ok(())
}

#[test]
fn head_mock() -> Result<()> {
    let mut mocker = Mocker::new(Head::<u64>::new(10));
    mocker.init()?;
    mocker.input(0, (0..100u64).collect());
    mocker.init_output::<u64>(0, 100);
    mocker.run()?;

    assert!(mocker.finished());
    assert_eq!(mocker.output::<u64>(0), (0..10).collect::<Vec<_>>());

    Ok(())
}

#[test]
fn history_mock() -> Result<()> {
    let mut mocker = Mocker::new(MovingAverage::new(2));
    mocker.input(0, vec![2.0f32, 4.0, 6.0]);
    mocker.init_output::<f32>(0, 8);
    mocker.run_to_completion()?;

    assert_eq!(mocker.output::<f32>(0), vec![1.0, 3.0, 5.0]);

    Ok(())
}

#[test]
fn output_multiple_mock() -> Result<()> {
    let mut mocker = Mocker::new(Repeat::<u8>::new(3));
    mocker.input(0, vec![7u8, 8]);
    mocker.init_output::<u8>(0, 5);

    // room for one repetition only
    mocker.run()?;
    assert_eq!(mocker.output::<u8>(0), vec![7, 7, 7]);
    mocker.run()?;
    assert_eq!(mocker.output::<u8>(0), vec![8, 8, 8]);

    Ok(())
}

#[test]
fn cap_below_output_multiple() -> Result<()> {
    let mut block = Repeat::<u8>::new(3);
    block.meta_mut().set_max_noutput_items(2);
    let mut mocker = Mocker::new(block);
    mocker.input(0, vec![1u8, 2]);
    mocker.init_output::<u8>(0, 16);

    // the cap is raised to one repetition per call
    mocker.run()?;
    assert_eq!(mocker.output::<u8>(0), vec![1, 1, 1]);
    mocker.run_to_completion()?;
    assert_eq!(mocker.output::<u8>(0), vec![2, 2, 2]);
    assert!(mocker.finished());

    Ok(())
}

#[test]
fn mock_messages() -> Result<()> {
    let mut mocker = Mocker::new(MultiplyConst::new(1.0));
    mocker.init()?;

    assert_eq!(mocker.post("const", 3.0f32), Ok(Pmt::F32(3.0)));
    assert_eq!(mocker.post("const", Pmt::Null), Ok(Pmt::F32(3.0)));
    assert_eq!(mocker.post("const", "three"), Ok(Pmt::InvalidValue));
    assert!(matches!(
        mocker.post("gain", 1.0f32),
        Err(Error::InvalidMessagePort { .. })
    ));

    mocker.input(0, vec![1.0f32, -2.0]);
    mocker.init_output::<f32>(0, 2);
    mocker.run()?;
    assert_eq!(mocker.output::<f32>(0), vec![3.0, -6.0]);
    assert_eq!(mocker.kernel::<MultiplyConst>().map(|k| k.constant()), Some(3.0));

    Ok(())
}
