//! Property tests shared by every filter variant.

use multiframe::ndarray::{Array4, Array5, Array6, ArrayView1, ArrayView2, Axis, s};
use multiframe::{
    Complex32, FilterBank, FilterConfig, FilterInputs, FilterKind, Regularization, psd, solve,
    spec_unfold,
};
use multiframe_proptest::comparison::compare_complex;
use multiframe_proptest::generators::{complex_array, hermitian_covariance, spectrogram};
use multiframe_proptest::strategies::{FilterSetup, any_f32};
use multiframe_proptest::test_strategy::proptest;
use proptest::collection::vec;
use proptest::{prop_assert, prop_assert_eq};

const KINDS: [FilterKind; 6] = [
    FilterKind::DeepFilter { conj: false },
    FilterKind::DeepFilter { conj: true },
    FilterKind::DeepFilterSplit { conj: true },
    FilterKind::RatioMask,
    FilterKind::Wiener,
    FilterKind::mvdr(),
];

fn config_for(kind: FilterKind, setup: &FilterSetup) -> FilterConfig {
    let (frame_size, lookahead) = match kind {
        FilterKind::RatioMask => (1, 0),
        _ => (setup.frame_size, setup.lookahead),
    };
    FilterConfig {
        num_bins: setup.num_bins,
        num_freqs: setup.num_freqs,
        frame_size,
        lookahead,
        ..Default::default()
    }
}

/// Owned per-call inputs for one variant.
enum Inputs {
    Coefficients(Array5<Complex32>),
    Mask(Array4<Complex32>),
    Covariance {
        ifc: Array5<Complex32>,
        covariance: Array6<Complex32>,
    },
}

impl Inputs {
    fn generate(kind: FilterKind, config: &FilterConfig, setup: &FilterSetup) -> Self {
        let (b, c, t, f) = setup.band_shape();
        let n = config.frame_size;
        let seed = setup.seed.wrapping_add(1);
        match kind {
            FilterKind::DeepFilter { .. } | FilterKind::DeepFilterSplit { .. } => {
                Self::Coefficients(complex_array((b, c, t, f, n), seed, 0.5))
            }
            FilterKind::RatioMask => Self::Mask(complex_array((b, c, t, f), seed, 1.0)),
            FilterKind::Wiener | FilterKind::Mvdr { .. } => Self::Covariance {
                ifc: complex_array((b, c, t, f, n), seed, 1.0),
                covariance: hermitian_covariance((b, c, t, f), n, seed.wrapping_add(1)),
            },
        }
    }

    /// Overwrites every input value with samples from `next`.
    fn fill_with(&mut self, mut next: impl FnMut() -> Complex32) {
        match self {
            Self::Coefficients(coefs) => coefs.map_inplace(|z| *z = next()),
            Self::Mask(mask) => mask.map_inplace(|z| *z = next()),
            Self::Covariance { ifc, covariance } => {
                ifc.map_inplace(|z| *z = next());
                covariance.map_inplace(|z| *z = next());
            }
        }
    }

    fn view(&self) -> FilterInputs<'_> {
        match self {
            Self::Coefficients(coefs) => FilterInputs::Coefficients(coefs.view()),
            Self::Mask(mask) => FilterInputs::Mask(mask.view()),
            Self::Covariance { ifc, covariance } => FilterInputs::Covariance {
                ifc: ifc.view(),
                covariance: covariance.view(),
            },
        }
    }
}

#[proptest(cases = 64)]
fn upper_bins_pass_through(setup: FilterSetup) {
    let spec = spectrogram(setup.spec_shape(), setup.seed);
    for kind in KINDS {
        let config = config_for(kind, &setup);
        let bank = FilterBank::new(kind, config).unwrap();
        let inputs = Inputs::generate(kind, &config, &setup);
        let out = bank.apply(&spec, inputs.view()).unwrap();

        prop_assert_eq!(out.spectrogram.dim(), spec.dim());
        prop_assert_eq!(
            out.spectrogram.slice(s![.., .., .., setup.num_freqs..]),
            spec.slice(s![.., .., .., setup.num_freqs..]),
            "{:?}",
            kind
        );
        let (b, c, t, f) = setup.band_shape();
        prop_assert_eq!(out.report.filtered_bins, b * c * t * f);
    }
}

fn bits(z: &Complex32) -> (u32, u32) {
    (z.re.to_bits(), z.im.to_bits())
}

#[proptest(cases = 64)]
fn non_finite_values_are_counted(
    setup: FilterSetup,
    #[strategy(vec(any_f32(), 1..32))] values: Vec<f32>,
) {
    let mut samples = values.iter().copied().cycle();
    let mut next = || {
        let re = samples.next().unwrap_or(0.0);
        Complex32::new(re, samples.next().unwrap_or(0.0))
    };
    let mut spec = spectrogram(setup.spec_shape(), setup.seed);
    spec.map_inplace(|z| *z = next());
    let upper: Vec<_> = spec
        .slice(s![.., .., .., setup.num_freqs..])
        .iter()
        .map(bits)
        .collect();

    for kind in KINDS {
        let config = config_for(kind, &setup);
        let bank = FilterBank::new(kind, config).unwrap();
        let mut inputs = Inputs::generate(kind, &config, &setup);
        inputs.fill_with(&mut next);
        let out = bank.apply(&spec, inputs.view()).unwrap();

        let passed: Vec<_> = out
            .spectrogram
            .slice(s![.., .., .., setup.num_freqs..])
            .iter()
            .map(bits)
            .collect();
        prop_assert_eq!(&passed, &upper, "{:?}", kind);

        let low = out.spectrogram.slice(s![.., .., .., ..setup.num_freqs]);
        let non_finite = low.iter().filter(|z| !z.is_finite()).count();
        prop_assert_eq!(out.report.non_finite_outputs, non_finite, "{:?}", kind);
        prop_assert_eq!(out.report.filtered_bins, low.len());
        prop_assert!(non_finite == 0 || !out.report.is_clean());
    }
}

#[proptest(cases = 64)]
fn repeated_calls_are_identical(setup: FilterSetup) {
    let spec = spectrogram(setup.spec_shape(), setup.seed);
    for kind in KINDS {
        let config = config_for(kind, &setup);
        let bank = FilterBank::new(kind, config).unwrap();
        let inputs = Inputs::generate(kind, &config, &setup);
        let first = bank.apply(&spec, inputs.view()).unwrap();
        let second = bank.apply(&spec, inputs.view()).unwrap();
        prop_assert_eq!(first, second, "{:?}", kind);
    }
}

#[proptest(cases = 64)]
fn in_place_matches_copy(setup: FilterSetup) {
    let spec = spectrogram(setup.spec_shape(), setup.seed);
    for kind in KINDS {
        let config = config_for(kind, &setup);
        let bank = FilterBank::new(kind, config).unwrap();
        let inputs = Inputs::generate(kind, &config, &setup);

        let copied = bank.apply(&spec, inputs.view()).unwrap();
        let mut in_place = spec.clone();
        let report = bank.apply_in_place(&mut in_place, inputs.view()).unwrap();

        let result = compare_complex(copied.spectrogram.iter(), in_place.iter(), 0.0);
        prop_assert!(result.is_match(), "{:?}: {}", kind, result);
        prop_assert_eq!(copied.report, report);
    }
}

#[proptest(cases = 64)]
fn split_deep_filter_matches_complex(setup: FilterSetup, conj: bool) {
    let spec = spectrogram(setup.spec_shape(), setup.seed);
    let coefs = complex_array(setup.taps_shape(), setup.seed ^ 0x5eed, 0.5);
    let config = config_for(FilterKind::DeepFilter { conj }, &setup);

    let complex = FilterBank::new(FilterKind::DeepFilter { conj }, config)
        .unwrap()
        .apply(&spec, FilterInputs::Coefficients(coefs.view()))
        .unwrap();
    let split = FilterBank::new(FilterKind::DeepFilterSplit { conj }, config)
        .unwrap()
        .apply(&spec, FilterInputs::Coefficients(coefs.view()))
        .unwrap();

    let result = compare_complex(complex.spectrogram.iter(), split.spectrogram.iter(), 1e-5);
    prop_assert!(result.is_match(), "{}", result);
}

#[proptest(cases = 64)]
fn unfold_follows_causal_index_formula(setup: FilterSetup) {
    let spec = spectrogram(setup.spec_shape(), setup.seed);
    let unfolded = spec_unfold(&spec, setup.frame_size, setup.lookahead).unwrap();
    let past = setup.frame_size - 1 - setup.lookahead;

    for ((b, c, t, f, n), &value) in unfolded.indexed_iter() {
        let source = (t + n)
            .checked_sub(past)
            .filter(|&source| source < setup.frames);
        let expected = source.map_or(Complex32::new(0.0, 0.0), |source| spec[[b, c, source, f]]);
        prop_assert_eq!(value, expected, "at {:?}", (b, c, t, f, n));
    }
}

#[proptest(cases = 32)]
fn mvdr_passes_the_target_undistorted(setup: FilterSetup) {
    let eps = 1e-8;
    let kind = FilterKind::Mvdr { eps };
    let config = config_for(kind, &setup);
    let (b, c, t, f) = setup.band_shape();
    let n = config.frame_size;

    // Take the target correlation from the signal itself, ifc = conj(window),
    // so that sum_n x[n] w[n] = conj(w^H ifc) must be one.
    let spec = spectrogram(setup.spec_shape(), setup.seed);
    let windows = spec_unfold(&spec, n, config.lookahead).unwrap();
    let ifc = windows
        .slice(s![.., .., .., ..setup.num_freqs, ..])
        .mapv(|z| z.conj());
    let covariance = hermitian_covariance((b, c, t, f), n, setup.seed);

    let out = FilterBank::new(kind, config)
        .unwrap()
        .apply(
            &spec,
            FilterInputs::Covariance {
                ifc: ifc.view(),
                covariance: covariance.view(),
            },
        )
        .unwrap();

    for ((idx, &y), target) in out
        .spectrogram
        .slice(s![.., .., .., ..setup.num_freqs])
        .indexed_iter()
        .zip(ifc.lanes(Axis(4)))
    {
        let energy: f32 = target.iter().map(|z| z.norm_sqr()).sum();
        if energy > 1e-2 {
            prop_assert!(
                (y - Complex32::new(1.0, 0.0)).norm() < 1e-3,
                "bin {:?}: {}",
                idx,
                y
            );
        }
    }
}

#[proptest(cases = 64)]
fn solve_inverts_well_conditioned_systems(
    #[strategy(1usize..=6)] n: usize,
    #[strategy(1usize..=4)] bins: usize,
    seed: u64,
) {
    let matrices = hermitian_covariance((1, 1, bins, 1), n, seed);
    let expected = complex_array((1, 1, bins, 1, n), seed.wrapping_add(1), 1.0);
    let mut targets = Array5::<Complex32>::zeros((1, 1, bins, 1, n));
    for bin in 0..bins {
        let a: ArrayView2<'_, Complex32> = matrices.slice(s![0, 0, bin, 0, .., ..]);
        let x: ArrayView1<'_, Complex32> = expected.slice(s![0, 0, bin, 0, ..]);
        targets.slice_mut(s![0, 0, bin, 0, ..]).assign(&a.dot(&x));
    }

    let exact = Regularization {
        diag_eps: 0.0,
        eps: 0.0,
    };
    let solution = solve(&matrices, &targets, exact).unwrap();
    prop_assert_eq!(solution.singular, 0);
    prop_assert_eq!(solution.ill_conditioned, 0);
    let result = compare_complex(solution.value.iter(), expected.iter(), 1e-3);
    prop_assert!(result.is_match(), "{}", result);
}

#[proptest(cases = 64)]
fn psd_is_hermitian_with_real_power_diagonal(setup: FilterSetup) {
    let spec = spectrogram(setup.spec_shape(), setup.seed);
    let rxx = psd(&spec, setup.frame_size).unwrap();
    let n = setup.frame_size;
    prop_assert_eq!(rxx.shape()[4..].to_vec(), vec![n, n]);
    for ((b, c, t, f, i, j), &value) in rxx.indexed_iter() {
        prop_assert_eq!(value, rxx[[b, c, t, f, j, i]].conj());
        if i == j {
            prop_assert!(value.re >= 0.0 && value.im == 0.0);
        }
    }
}
