use proptest::prelude::*;
use rand::{SeedableRng, rngs::SmallRng};
use std::f64::consts::PI;
use std::sync::atomic::AtomicBool;
use trackdraw::{
    BasicFilter, ControlContour, KlattSynthesizer, RadiationFilter, Resonator, SynthError,
    SynthesisMethod, SynthesisParameters, Voicing, synthesize, synthesize_cancellable,
    synthesize_with_rng,
};

fn single_formant(f0: f64, formant: f64, bandwidth: f64) -> SynthesisParameters {
    SynthesisParameters::default()
        .with_f0([f0])
        .with_formants(
            vec![ControlContour::constant(formant)],
            vec![ControlContour::constant(bandwidth)],
        )
        .with_envelope([1.0])
        .with_sample_rate(10_000)
        .with_duration(0.1)
        .with_interval_len(50)
}

/// |X(f)| of `x` sampled at `fs`.
fn dft_magnitude(x: &[f64], f: f64, fs: f64) -> f64 {
    let w = 2.0 * PI * f / fs;
    let (re, im) = x.iter().enumerate().fold((0.0, 0.0), |(re, im), (n, v)| {
        let phi = w * n as f64;
        (re + v * phi.cos(), im - v * phi.sin())
    });
    re.hypot(im)
}

fn first_difference(x: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(x.len());
    let mut x1 = 0.0;
    for v in x {
        out.push(v - x1);
        x1 = *v;
    }
    out
}

/// Locates the spectral envelope peak of a voiced sound from its harmonics.
///
/// The -12 dB/octave glottal tilt is flattened by differencing twice, the strongest
/// harmonic below 4900 Hz is picked and refined by a parabola through the log
/// magnitudes of it and its neighbours.
fn formant_peak(x: &[f64], f0: f64, fs: f64) -> f64 {
    let flat = first_difference(&first_difference(x));
    let harmonics: Vec<(f64, f64)> = (1u32..)
        .map(|k| f64::from(k) * f0)
        .take_while(|f| *f < 4900.0)
        .map(|f| (f, dft_magnitude(&flat, f, fs)))
        .collect();
    let i = (1..harmonics.len() - 1)
        .max_by(|a, b| harmonics[*a].1.total_cmp(&harmonics[*b].1))
        .unwrap();
    let (l, c, r) = (
        harmonics[i - 1].1.ln(),
        harmonics[i].1.ln(),
        harmonics[i + 1].1.ln(),
    );
    let offset = 0.5 * (l - r) / (l - 2.0 * c + r);
    harmonics[i].0 + offset * f0
}

#[test]
fn single_formant_vowel() {
    let sound = synthesize(&single_formant(120.0, 800.0, 100.0)).unwrap();
    assert_eq!(sound.len(), 1000);
    assert_eq!(sound.sample_rate(), 10_000);
    assert!(sound.samples().iter().all(|y| y.is_finite()));
    assert!(sound.peak() > 0.01, "peak {}", sound.peak());

    let peak = formant_peak(sound.samples(), 120.0, 10_000.0);
    assert!((760.0..=840.0).contains(&peak), "spectral peak at {peak} Hz");
}

#[test]
fn spectral_peak_follows_the_formant() {
    for (f0, formant) in [(100.0, 500.0), (100.0, 1200.0), (120.0, 1200.0)] {
        let sound = synthesize(&single_formant(f0, formant, 100.0)).unwrap();
        let peak = formant_peak(sound.samples(), f0, 10_000.0);
        assert!(
            (peak - formant).abs() <= 0.05 * formant,
            "formant {formant} Hz at f0 {f0}: peak at {peak} Hz"
        );
    }
}

#[test]
fn non_positive_duration_is_invalid_input() {
    for duration in [0.0, -0.5] {
        let err = synthesize(&single_formant(120.0, 800.0, 100.0).with_duration(duration))
            .unwrap_err();
        assert!(err.is_invalid_input(), "{err}");
    }
}

#[test]
fn formant_and_bandwidth_counts_must_agree() {
    let params = SynthesisParameters::default().with_formants(
        vec![ControlContour::constant(600.0); 3],
        vec![ControlContour::constant(90.0); 5],
    );
    let err = synthesize(&params).unwrap_err();
    assert!(matches!(err, SynthError::ShapeMismatch { expected: 3, found: 5, .. }));
    assert!(err.is_invalid_input());
}

#[test]
fn silent_envelope_gives_silence() {
    let params = SynthesisParameters::default()
        .with_voicing(Voicing::Unvoiced)
        .with_envelope([0.0])
        .with_duration(0.25);
    let sound = synthesize(&params).unwrap();
    assert_eq!(sound.len(), 2500);
    assert!(sound.samples().iter().all(|y| *y == 0.0));
}

#[test]
fn default_parameters_render() {
    let sound = synthesize(&SynthesisParameters::default()).unwrap();
    assert_eq!(sound.len(), 10_000);
    assert!(sound.samples().iter().all(|y| y.is_finite()));
    // envelope starts and ends at zero
    assert_eq!(sound.samples()[0], 0.0);
    assert_eq!(sound.samples()[9_999], 0.0);
    assert!(sound.rms() > 0.0);
}

#[test]
fn update_interval_does_not_matter_for_constant_tracks() {
    let params = single_formant(110.0, 650.0, 70.0);
    let coarse = synthesize(&params).unwrap();
    for interval_len in [1, 7, 50, 333, 1000] {
        let fine = synthesize(&params.clone().with_interval_len(interval_len)).unwrap();
        assert_eq!(fine, coarse, "interval length {interval_len}");
    }
}

#[test]
fn time_varying_tracks_stay_finite() {
    let params = SynthesisParameters::default()
        .with_f0([90.0, 140.0, 110.0])
        .with_formants(
            vec![
                ControlContour::from([300.0, 750.0, 280.0]),
                ControlContour::from([2300.0, 1100.0, 800.0]),
                ControlContour::constant(2800.0),
            ],
            vec![
                ControlContour::from([40.0, 90.0]),
                ControlContour::constant(100.0),
                ControlContour::constant(150.0),
            ],
        )
        .with_radiation(true)
        .with_duration(0.4);
    let sound = synthesize(&params).unwrap();
    assert_eq!(sound.len(), 4000);
    assert!(sound.samples().iter().all(|y| y.is_finite()));
}

#[test]
fn non_finite_tracks_are_rejected() {
    let params = single_formant(120.0, f64::NAN, 100.0);
    assert!(matches!(synthesize(&params), Err(SynthError::NonFinite { .. })));
    let params = single_formant(120.0, 800.0, -5.0);
    assert!(matches!(synthesize(&params), Err(SynthError::NonPositive { .. })));
}

#[test]
fn same_seed_same_noise() {
    let params = SynthesisParameters::default()
        .with_voicing(Voicing::Unvoiced)
        .with_noise_differencing(true)
        .with_duration(0.1)
        .with_seed(42);
    let a = synthesize(&params).unwrap();
    assert_eq!(a, synthesize(&params).unwrap());
    assert_eq!(a, synthesize_with_rng(&params, SmallRng::seed_from_u64(42)).unwrap());
    assert_ne!(a, synthesize(&params.with_seed(43)).unwrap());
}

#[test]
fn cancelled_synthesis_returns_nothing() {
    let cancel = AtomicBool::new(true);
    assert_eq!(
        synthesize_cancellable(&SynthesisParameters::default(), &cancel),
        Err(SynthError::Cancelled { interval: 0 })
    );
}

#[test]
fn cancellable_sine_matches_plain_sine() {
    let params = SynthesisParameters::default()
        .with_f0([0.0])
        .with_method(SynthesisMethod::Sine)
        .with_duration(0.05);
    let plain = synthesize(&params).unwrap();
    assert_eq!(synthesize_cancellable(&params, &AtomicBool::new(false)).unwrap(), plain);
    // a Klatt synthesizer built from the same parameters still needs a usable F0
    assert!(KlattSynthesizer::new(&params).unwrap_err().is_invalid_input());
}

#[test]
fn overlong_duration_is_rejected_before_allocating() {
    let err = synthesize(&SynthesisParameters::default().with_duration(1e15)).unwrap_err();
    assert!(matches!(err, SynthError::InvalidInput { .. }), "{err}");
}

#[test]
fn sine_method_is_selected_by_parameters() {
    let params = single_formant(120.0, 500.0, 100.0).with_method(SynthesisMethod::Sine);
    let sound = synthesize(&params).unwrap();
    assert_eq!(sound.len(), 1000);
    assert!(sound.peak() <= 1.0);
    assert!(sound.peak() > 0.99);
}

#[test]
fn resonators_are_stable() {
    for bw in [10.0, 50.0, 300.0, 2000.0] {
        for f in [0.0, 250.0, 1000.0, 4900.0] {
            let mut r = Resonator::new(10_000);
            r.set(f, bw).unwrap();
            let mut x = vec![0.0; 20_000];
            x[0] = 1.0;
            r.process_block(&mut x);
            assert!(x.iter().all(|y| y.is_finite()));
            assert!(x[19_999].abs() < 1e-6, "f {f} bw {bw}: {}", x[19_999]);
        }
    }
}

#[test]
fn radiation_removes_dc() {
    let mut radiation = RadiationFilter::new();
    let mut x = vec![0.7; 100];
    radiation.process_block(&mut x);
    assert_eq!(x[0], 0.7);
    assert!(x[1..].iter().all(|y| *y == 0.0));
}

#[cfg(feature = "serde")]
#[test]
fn parameters_from_toml() {
    let params: SynthesisParameters = toml::from_str(
        r#"
        f0 = [130.0, 100.0]
        formants = [[700.0], [1200.0, 1500.0]]
        bandwidths = [[80.0], [90.0]]
        voicing = "unvoiced"
        method = "sine"
        duration = 0.5
        "#,
    )
    .unwrap();
    assert_eq!(params.f0, ControlContour::from([130.0, 100.0]));
    assert_eq!(params.formants.len(), 2);
    assert_eq!(params.voicing, Voicing::Unvoiced);
    assert_eq!(params.method, SynthesisMethod::Sine);
    // unspecified fields keep their defaults
    assert_eq!(params.sample_rate, 10_000);
    assert_eq!(params.interval_len, 50);
    assert_eq!(synthesize(&params).unwrap().len(), 5000);
}

proptest! {
    #[test]
    fn resonator_state_carries_across_blocks(
        f in 0.0f64..4500.0,
        bw in 20.0f64..1000.0,
        cuts in prop::collection::vec(1usize..200, 1..8),
    ) {
        let input: Vec<f64> = (0..600).map(|n| ((n * 37) % 101) as f64 / 50.0 - 1.0).collect();

        let mut whole = input.clone();
        let mut r = Resonator::new(10_000);
        r.set(f, bw).unwrap();
        r.process_block(&mut whole);

        let mut split = input;
        let mut r = Resonator::new(10_000);
        r.set(f, bw).unwrap();
        let mut rest = split.as_mut_slice();
        for cut in cuts {
            let at = cut.min(rest.len());
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(at);
            r.process_block(head);
            rest = tail;
        }
        r.process_block(rest);
        prop_assert_eq!(whole, split);
    }
}
