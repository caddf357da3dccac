//! Dump the header and payload stats of a binary table file
//!
//! Usage: `table-inspect <waveform|fir|cqt> <path>`
//!
//! Prints the raw header fields as declared by the wire layout, then a short
//! decoded summary so a bad table can be diagnosed without a hex editor.

use anyhow::{bail, Context, Result};

use platter_core::table::{
    layout_size, ByteCursor, CqtMatrix, FieldLayout, FirKernel, WaveformTable, CQT_FIELDS,
    FIR_FIELDS, WAVEFORM_FIELDS_V0, WAVEFORM_FIELDS_V1,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        bail!("usage: table-inspect <waveform|fir|cqt> <path>");
    }
    let kind = args[1].as_str();
    let path = &args[2];

    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path))?;
    println!("{} ({} bytes)", path, bytes.len());

    match kind {
        "waveform" => inspect_waveform(&bytes)?,
        "fir" => inspect_fir(&bytes)?,
        "cqt" => inspect_cqt(&bytes)?,
        other => bail!("unknown table kind '{}', expected waveform|fir|cqt", other),
    }
    Ok(())
}

/// Print each header field as the layout declares it
fn dump_fields(bytes: &[u8], layout: FieldLayout) -> Result<()> {
    let mut cursor = ByteCursor::new(bytes);
    for ((name, _), value) in layout.iter().zip(cursor.read_fields(layout)?) {
        println!("  {:<16} {}", name, value);
    }
    println!("  payload starts at byte {}", layout_size(layout));
    Ok(())
}

fn inspect_waveform(bytes: &[u8]) -> Result<()> {
    let table = WaveformTable::decode(bytes)?;
    let layout = if table.header().version == 0 {
        WAVEFORM_FIELDS_V0
    } else {
        WAVEFORM_FIELDS_V1
    };
    println!("waveform header:");
    dump_fields(bytes, layout)?;

    let peak = table
        .samples()
        .iter()
        .fold(0.0f32, |acc, s| acc.max(s.abs()));
    println!(
        "decoded: {} columns, {} samples/pixel, {}-bit payload, peak {:.3}",
        table.columns(),
        table.header().samples_per_pixel,
        if table.header().is_8_bit() { 8 } else { 16 },
        peak
    );
    if table.columns() > 0 {
        let (lo, hi) = table.min_max(0);
        println!("first column: min {:.3} max {:.3}", lo, hi);
    }
    Ok(())
}

fn inspect_fir(bytes: &[u8]) -> Result<()> {
    let kernel = FirKernel::decode(bytes)?;
    println!("fir header:");
    dump_fields(bytes, FIR_FIELDS)?;

    // unity gain check: the zero-offset taps should sum to ~1
    let dc: f32 = kernel
        .coeffs()
        .iter()
        .step_by(kernel.samples_per_crossing())
        .sum();
    let peak = kernel
        .coeffs()
        .iter()
        .fold(0.0f32, |acc, c| acc.max(c.abs()));
    println!(
        "decoded: {} taps, half width {} crossings, dc gain {:.6}, peak tap {:.4}",
        kernel.filter_size(),
        kernel.half_crossings(),
        dc,
        peak
    );
    Ok(())
}

fn inspect_cqt(bytes: &[u8]) -> Result<()> {
    let matrix = CqtMatrix::decode(bytes)?;
    println!("cqt header:");
    dump_fields(bytes, CQT_FIELDS)?;

    let nnz = matrix.values().len();
    let density = nnz as f64 / (matrix.rows() as f64 * matrix.cols() as f64);
    println!(
        "decoded: {}x{} map, {} stored entries ({:.2}% dense, {:.1} per column)",
        matrix.rows(),
        matrix.cols(),
        nnz,
        density * 100.0,
        nnz as f64 / matrix.cols() as f64
    );
    Ok(())
}
