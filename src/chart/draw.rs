//! Rasterisation with plotters' bitmap backend and PNG encoding.
//!
//! Charts carry no text: labels would need a font backend, so the title goes
//! into the PNG `Title` metadata chunk and the numbers into the description.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;
use std::ops::Range;

use super::{ChartData, ChartKind};
use crate::{Error, ErrorContext, Result};

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;
const MARGIN: u32 = 40;

const PRIMARY: RGBColor = RGBColor(0x0e, 0xa5, 0xe9);
const PALETTE: [RGBColor; 5] = [
    RGBColor(0x0e, 0xa5, 0xe9),
    RGBColor(0x38, 0xbd, 0xf8),
    RGBColor(0x7d, 0xd3, 0xfc),
    RGBColor(0x0a, 0x6f, 0x9c),
    RGBColor(0x02, 0x84, 0xc7),
];
const GRID: RGBColor = RGBColor(0xe5, 0xe7, 0xeb);
const AXIS: RGBColor = RGBColor(0x37, 0x41, 0x51);

type Area<'b> = DrawingArea<BitMapBackend<'b>, Shift>;
type Plot<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn draw_err(e: impl std::fmt::Display) -> Error {
    Error::runtime_with_context(
        format!("Failed to generate graph: {}", e),
        ErrorContext::new().with_source("chart"),
    )
}

/// Render `data` as `kind` and return the PNG, base64-encoded.
pub(super) fn render_png(kind: ChartKind, title: &str, data: &ChartData) -> Result<String> {
    let mut pixels = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        match kind {
            ChartKind::Bar => draw_bars(&root, data)?,
            ChartKind::Line => draw_line(&root, data)?,
            ChartKind::Scatter => draw_scatter(&root, data)?,
            ChartKind::Pie => draw_pie(&root, data)?,
            ChartKind::Histogram => draw_histogram(&root, data)?,
        }
        root.present().map_err(draw_err)?;
    }
    let png = encode_png(&pixels, title)?;
    Ok(STANDARD.encode(png))
}

fn encode_png(rgb: &[u8], title: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, WIDTH, HEIGHT);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .add_itxt_chunk("Title".to_string(), title.to_string())
            .map_err(draw_err)?;
        let mut writer = encoder.write_header().map_err(draw_err)?;
        writer.write_image_data(rgb).map_err(draw_err)?;
        writer.finish().map_err(draw_err)?;
    }
    Ok(out)
}

/// Value axis covering the data and zero, with 8% headroom.
fn value_range(values: &[f64]) -> Range<f64> {
    let lo = values.iter().copied().fold(0.0_f64, f64::min);
    let hi = values.iter().copied().fold(0.0_f64, f64::max);
    let span = (hi - lo).max(1.0);
    let pad = span * 0.08;
    let lo = if lo < 0.0 { lo - pad } else { 0.0 };
    let hi = if hi > 0.0 { hi + pad } else { 0.0 };
    if hi - lo <= f64::EPSILON {
        0.0..1.0
    } else {
        lo..hi
    }
}

/// Cartesian frame with horizontal grid lines and both axes drawn.
fn frame<'a, 'b>(root: &'a Area<'b>, x: Range<f64>, y: Range<f64>) -> Result<Plot<'a, 'b>> {
    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .build_cartesian_2d(x.clone(), y.clone())
        .map_err(draw_err)?;

    let step = (y.end - y.start) / 5.0;
    chart
        .draw_series((1..=5).map(|i| {
            let gy = y.start + step * i as f64;
            PathElement::new(vec![(x.start, gy), (x.end, gy)], GRID.stroke_width(1))
        }))
        .map_err(draw_err)?;

    let baseline = 0.0_f64.clamp(y.start, y.end);
    chart
        .draw_series([
            PathElement::new(vec![(x.start, baseline), (x.end, baseline)], AXIS.stroke_width(2)),
            PathElement::new(vec![(x.start, y.start), (x.start, y.end)], AXIS.stroke_width(2)),
        ])
        .map_err(draw_err)?;
    Ok(chart)
}

fn slot_count(data: &ChartData) -> f64 {
    data.len().max(1) as f64
}

fn draw_bars(root: &Area<'_>, data: &ChartData) -> Result<()> {
    let mut chart = frame(root, 0.0..slot_count(data), value_range(&data.values))?;
    chart
        .draw_series(data.values.iter().enumerate().map(|(i, v)| {
            let x = i as f64;
            Rectangle::new(
                [(x + 0.15, 0.0), (x + 0.85, *v)],
                PALETTE[i % PALETTE.len()].filled(),
            )
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn points(data: &ChartData) -> Vec<(f64, f64)> {
    data.values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 + 0.5, *v))
        .collect()
}

fn draw_line(root: &Area<'_>, data: &ChartData) -> Result<()> {
    let mut chart = frame(root, 0.0..slot_count(data), value_range(&data.values))?;
    let pts = points(data);
    chart
        .draw_series(AreaSeries::new(pts.clone(), 0.0, PRIMARY.mix(0.3).filled()))
        .map_err(draw_err)?;
    chart
        .draw_series(LineSeries::new(pts.clone(), PRIMARY.stroke_width(3)))
        .map_err(draw_err)?;
    chart
        .draw_series(pts.into_iter().map(|p| Circle::new(p, 6, PRIMARY.filled())))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_scatter(root: &Area<'_>, data: &ChartData) -> Result<()> {
    let mut chart = frame(root, 0.0..slot_count(data), value_range(&data.values))?;
    chart
        .draw_series(
            points(data)
                .into_iter()
                .map(|p| Circle::new(p, 9, PRIMARY.mix(0.6).filled())),
        )
        .map_err(draw_err)?;
    Ok(())
}

/// Equal-width bins, `ceil(sqrt(n))` of them, capped at 10.
fn histogram_bins(values: &[f64]) -> (Range<f64>, Vec<usize>) {
    if values.is_empty() {
        return (0.0..1.0, Vec::new());
    }
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let bins = ((values.len() as f64).sqrt().ceil() as usize).clamp(1, 10);
    let span = if hi > lo { hi - lo } else { 1.0 };
    let width = span / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    (lo..lo + span, counts)
}

fn draw_histogram(root: &Area<'_>, data: &ChartData) -> Result<()> {
    let (x, counts) = histogram_bins(&data.values);
    let tallest = counts.iter().copied().max().unwrap_or(0) as f64;
    let mut chart = frame(root, x.clone(), 0.0..(tallest * 1.1).max(1.0))?;
    let width = (x.end - x.start) / counts.len().max(1) as f64;
    chart
        .draw_series(counts.iter().enumerate().map(|(i, c)| {
            let x0 = x.start + width * i as f64;
            Rectangle::new([(x0, 0.0), (x0 + width, *c as f64)], PRIMARY.filled())
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(counts.iter().enumerate().map(|(i, c)| {
            let x0 = x.start + width * i as f64;
            Rectangle::new([(x0, 0.0), (x0 + width, *c as f64)], WHITE.stroke_width(2))
        }))
        .map_err(draw_err)?;
    Ok(())
}

/// Slices for positive values only; non-positive values get no area.
fn draw_pie(root: &Area<'_>, data: &ChartData) -> Result<()> {
    let center = ((WIDTH / 2) as f64, (HEIGHT / 2) as f64);
    let radius = (HEIGHT / 2 - MARGIN) as f64;
    let total: f64 = data.values.iter().filter(|v| **v > 0.0).sum();

    root.draw(&Circle::new(
        (center.0 as i32, center.1 as i32),
        radius as i32,
        GRID.stroke_width(2),
    ))
    .map_err(draw_err)?;
    if total <= 0.0 {
        return Ok(());
    }

    let at = |angle: f64| {
        (
            (center.0 + radius * angle.cos()).round() as i32,
            (center.1 + radius * angle.sin()).round() as i32,
        )
    };

    let mut start = -PI / 2.0;
    for (i, v) in data.values.iter().enumerate().filter(|(_, v)| **v > 0.0) {
        let sweep = v / total * 2.0 * PI;
        let steps = ((sweep.to_degrees()).ceil() as usize).max(2);
        let mut outline = Vec::with_capacity(steps + 2);
        outline.push((center.0 as i32, center.1 as i32));
        outline.extend((0..=steps).map(|s| at(start + sweep * s as f64 / steps as f64)));

        root.draw(&Polygon::new(
            outline.clone(),
            PALETTE[i % PALETTE.len()].filled(),
        ))
        .map_err(draw_err)?;
        outline.push((center.0 as i32, center.1 as i32));
        root.draw(&PathElement::new(outline, WHITE.stroke_width(2)))
            .map_err(draw_err)?;
        start += sweep;
    }
    Ok(())
}
