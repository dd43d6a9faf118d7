// tests/simulation_tests.rs
//! Synthetic transient and propagation stack tests

use optimap_core::simulation::TransientCount;
use optimap_core::{model_stack_propagation, model_transient, model_transients, ErrorKind, PropagationSpec, TransientType, WaveformSpec};
use proptest::prelude::*;

fn noise_free(model_type: TransientType) -> WaveformSpec {
    WaveformSpec::builder(model_type)
        .duration_ms(300.0)
        .onset_ms(20.0)
        .baseline(1000)
        .amplitude(100)
        .build()
        .unwrap()
}

#[test]
fn test_vm_is_a_downward_deflection() {
    let signal = model_transient(&noise_free(TransientType::Vm)).unwrap();
    let data = signal.data();

    assert_eq!(data.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 1000.0);
    assert_eq!(data.iter().cloned().fold(f64::INFINITY, f64::min), 900.0);
    assert!(data.iter().all(|v| v.fract() == 0.0));
}

#[test]
fn test_ca_is_an_upward_deflection() {
    let signal = model_transient(&noise_free(TransientType::Ca)).unwrap();
    let data = signal.data();

    assert_eq!(data.iter().cloned().fold(f64::INFINITY, f64::min), 1000.0);
    assert_eq!(data.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 1100.0);
    // nothing before the onset
    assert!(data.iter().take(20).all(|&v| v == 1000.0));
}

#[test]
fn test_full_transient_train() {
    let spec = WaveformSpec::builder(TransientType::Ca)
        .duration_ms(500.0)
        .baseline(1000)
        .amplitude(100)
        .count(TransientCount::Full)
        .cycle_length_ms(100.0)
        .build()
        .unwrap();
    assert_eq!(spec.onset_frames(), vec![0, 100, 200, 300, 400]);

    let signal = model_transients(&spec).unwrap();
    let data = signal.data();
    // every cycle repeats the first
    for cycle in 1..5 {
        assert_eq!(data[cycle * 100 + 15], data[15]);
    }
}

#[test]
fn test_seeded_noise_is_reproducible() {
    let spec = WaveformSpec::builder(TransientType::Vm)
        .duration_ms(200.0)
        .baseline(1000)
        .amplitude(100)
        .noise(5.0)
        .seed(42)
        .build()
        .unwrap();

    let a = model_transient(&spec).unwrap();
    let b = model_transient(&spec).unwrap();
    assert_eq!(a, b);
    // noise lands after truncation
    assert!(a.data().iter().any(|v| v.fract() != 0.0));
}

#[test]
fn test_invalid_waveform_parameters() {
    let cases = [
        WaveformSpec::builder(TransientType::Vm).duration_ms(50.0).build(),
        WaveformSpec::builder(TransientType::Vm).fps(200).build(),
        WaveformSpec::builder(TransientType::Vm).fps(1001).build(),
        WaveformSpec::builder(TransientType::Vm).onset_ms(100.0).build(),
        WaveformSpec::builder(TransientType::Vm).amplitude(-5).build(),
        WaveformSpec::builder(TransientType::Vm).baseline(70_000).build(),
        WaveformSpec::builder(TransientType::Vm).noise(-1.0).build(),
        WaveformSpec::builder(TransientType::Vm).count(TransientCount::Count(0)).build(),
    ];
    for case in cases {
        assert_eq!(case.unwrap_err().kind(), ErrorKind::InvalidValue);
    }

    let err = WaveformSpec::builder(TransientType::Vm).duration_ms(f64::NAN).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidType);
}

#[test]
fn test_propagation_stack() {
    let waveform = WaveformSpec::builder(TransientType::Ca)
        .duration_ms(150.0)
        .onset_ms(15.0)
        .fps(500)
        .baseline(1000)
        .amplitude(100)
        .build()
        .unwrap();
    let spec = PropagationSpec::new(waveform).with_size(9, 9);
    let (time, stack) = model_stack_propagation(&spec).unwrap();

    assert_eq!(time.len(), 75);
    assert_eq!(stack.dim(), (75, 9, 9));
    assert_eq!(time[1], 2.0);

    let peak = |row: usize, col: usize| {
        let trace = stack.slice(ndarray::s![.., row, col]);
        trace
            .iter()
            .enumerate()
            .fold(0, |best, (i, &v)| if v > trace[best] { i } else { best })
    };
    // activation spreads outward from the centre
    assert!(peak(4, 4) < peak(0, 0));
    // equidistant pixels carry the same trace
    assert_eq!(stack.slice(ndarray::s![.., 0, 0]), stack.slice(ndarray::s![.., 8, 8]));
}

#[test]
fn test_propagation_rejects_late_activation() {
    let spec = PropagationSpec::default_for(TransientType::Vm)
        .unwrap()
        .with_size(10, 10)
        .with_velocity(0.01);
    let err = model_stack_propagation(&spec).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

proptest! {
    #[test]
    fn prop_signal_length_matches_frame_count(duration in 100.0f64..2000.0, fps in 201u32..=1000) {
        let spec = WaveformSpec::builder(TransientType::Ca)
            .duration_ms(duration)
            .fps(fps)
            .build()
            .unwrap();
        let signal = model_transient(&spec).unwrap();

        let expected = (fps as f64 / 1000.0 * duration).floor() as usize;
        prop_assert_eq!(signal.len(), expected);
        prop_assert_eq!(signal.time().len(), expected);
        prop_assert_eq!(signal.time()[0], 0.0);
    }
}
