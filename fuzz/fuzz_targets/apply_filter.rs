#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use multiframe::ndarray::{Array4, Array5, Array6};
use multiframe::{Complex32, FilterBank, FilterConfig, FilterInputs, FilterKind};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Filter index: 0=deep, 1=deep conj, 2=split, 3=mask, 4=wiener, 5=mvdr
    kind_idx: u8,
    /// Use the covariance path instead of a predicted inverse
    covariance: bool,
    frames: u8,
    num_bins: u8,
    num_freqs: u8,
    frame_size: u8,
    lookahead: u8,
    /// Flat values, cycled to fill the spectrogram and the filter inputs
    values: Vec<f32>,
}

fn kind(idx: u8) -> FilterKind {
    match idx % 6 {
        0 => FilterKind::DeepFilter { conj: false },
        1 => FilterKind::DeepFilter { conj: true },
        2 => FilterKind::DeepFilterSplit { conj: true },
        3 => FilterKind::RatioMask,
        4 => FilterKind::Wiener,
        _ => FilterKind::mvdr(),
    }
}

/// NaN and infinities are kept, only the magnitude of finite values is bounded.
fn sanitize(x: f32) -> f32 {
    if x.is_finite() { x.clamp(-1e3, 1e3) } else { x }
}

fuzz_target!(|input: FuzzInput| {
    if input.values.len() < 2 {
        return;
    }
    let kind = kind(input.kind_idx);
    let config = FilterConfig {
        num_bins: input.num_bins as usize % 17 + 1,
        num_freqs: input.num_freqs as usize % 18,
        frame_size: input.frame_size as usize % 6 + 1,
        lookahead: input.lookahead as usize % 6,
        ..Default::default()
    };
    let Ok(bank) = FilterBank::new(kind, config) else {
        return;
    };

    let mut values = input.values.iter().copied().map(sanitize).cycle();
    let mut next = move || {
        let re = values.next().unwrap_or_default();
        let im = values.next().unwrap_or_default();
        Complex32::new(re, im)
    };

    let t = input.frames as usize % 16;
    let (f, n) = (config.num_freqs, config.frame_size);
    let spec = Array4::from_shape_simple_fn((1, 1, t, config.num_bins), &mut next);

    let _ = match kind {
        FilterKind::DeepFilter { .. } | FilterKind::DeepFilterSplit { .. } => {
            let coefs = Array5::from_shape_simple_fn((1, 1, t, f, n), &mut next);
            bank.apply(&spec, FilterInputs::Coefficients(coefs.view()))
        }
        FilterKind::RatioMask => {
            let mask = Array4::from_shape_simple_fn((1, 1, t, f), &mut next);
            bank.apply(&spec, FilterInputs::Mask(mask.view()))
        }
        FilterKind::Wiener | FilterKind::Mvdr { .. } => {
            let ifc = Array5::from_shape_simple_fn((1, 1, t, f, n), &mut next);
            let matrices = Array6::from_shape_simple_fn((1, 1, t, f, n, n), &mut next);
            let inputs = if input.covariance {
                FilterInputs::Covariance {
                    ifc: ifc.view(),
                    covariance: matrices.view(),
                }
            } else {
                FilterInputs::InverseCovariance {
                    ifc: ifc.view(),
                    inverse: matrices.view(),
                }
            };
            bank.apply(&spec, inputs)
        }
    };
});
