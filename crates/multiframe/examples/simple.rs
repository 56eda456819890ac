//! End-to-end use of the filter bank on interleaved predictor outputs.
//!
//! Builds a synthetic noisy spectrogram, unpacks deep filter taps and MVDR
//! statistics from the flat `f32` layouts a predictor emits, and applies
//! both filters.
//!
//! Run with `RUST_LOG=multiframe=trace cargo run --example simple` to see
//! the per-call logs.

use multiframe::ndarray::{Array4, Array5, s};
use multiframe::packing::{interleaved_from_complex, unpack_coefs, unpack_matrix, unpack_vector};
use multiframe::{
    Complex32, FilterBank, FilterConfig, FilterInputs, FilterKind, Regularization, Spectrogram,
    psd, regularize_batch,
};
use tracing_subscriber::EnvFilter;

const FRAMES: usize = 50;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = FilterConfig::default();
    let (nf, n) = (config.num_freqs, config.frame_size);

    // A decaying tone in noise, [B, C, T, F].
    let spec = Spectrogram::from_shape_fn((1, 1, FRAMES, config.num_bins), |(_, _, t, f)| {
        let tone = if f == 10 { 1.0 / (1.0 + t as f32 * 0.1) } else { 0.0 };
        let noise = ((t * 31 + f * 17) % 97) as f32 / 97.0 - 0.5;
        Complex32::new(tone + 0.05 * noise, 0.05 * noise)
    });

    // Deep filter taps as a predictor would emit them: [B, C*N, T, F', 2],
    // here a plain average over the window.
    let packed_taps = Array5::from_shape_fn((1, n, FRAMES, nf, 2), |(.., k)| {
        if k == 0 { 1.0 / n as f32 } else { 0.0 }
    });
    let taps = unpack_coefs(&packed_taps, n)?;
    let deep = FilterBank::new(FilterKind::DeepFilter { conj: false }, config)?;
    let smoothed = deep.apply(&spec, FilterInputs::Coefficients(taps.view()))?;
    println!(
        "deep filter: {} bins filtered, latency {} frames",
        smoothed.report.filtered_bins,
        deep.latency_frames()
    );

    // MVDR with a diagonally loaded noise covariance estimated from the
    // noisy signal and a target correlation pointing at the current frame.
    // Statistics arrive packed as [B, C, T, F', N*2] and [B, C, T, F', N*N*2].
    let loading = Regularization {
        diag_eps: 0.1,
        eps: 1e-3,
    };
    let rnn = regularize_batch(&psd(&spec.slice(s![.., .., .., ..nf]), n)?, loading)?;
    let packed_rnn = interleaved_from_complex(&rnn)
        .into_shape_with_order((1, 1, FRAMES, nf, n * n * 2))?;
    let current = n - 1 - config.lookahead;
    let packed_ifc = Array5::from_shape_fn((1, 1, FRAMES, nf, n * 2), |(.., k)| {
        if k == current * 2 { 1.0 } else { 0.0 }
    });
    let covariance = unpack_matrix(&packed_rnn, n)?;
    let ifc = unpack_vector(&packed_ifc, n)?;

    let mvdr = FilterBank::new(FilterKind::mvdr(), config)?;
    let enhanced = mvdr.apply(
        &spec,
        FilterInputs::Covariance {
            ifc: ifc.view(),
            covariance: covariance.view(),
        },
    )?;
    println!("mvdr: {:?}", enhanced.report);

    let energy = |x: &Array4<Complex32>| x.iter().map(|z| z.norm_sqr()).sum::<f32>();
    println!(
        "energy: noisy {:.3}, deep filter {:.3}, mvdr {:.3}",
        energy(&spec),
        energy(&smoothed.spectrogram),
        energy(&enhanced.spectrogram)
    );
    Ok(())
}
