//! Two panel charts of the projections, drawn with plotters.
//!
//! Upper panel: the main metric (deaths, or infections and hospital use)
//! with confidence bands; lower panel: the secondary metric (mobility, or
//! death rate). Both share the date range. NAN values split lines and
//! fills, so that the padding of the projections is never drawn.

use crate::error::{C19Error, Result};
use crate::load::{
    DeathFraming, CONFIRMED, DEATHS_LOWER, DEATHS_MEAN, DEATHS_UPPER, DEATH_RATE, HOSPITALIZED,
    ICU, INFECTED, MOBILITY, VENTILATED,
};
use crate::projection::{cut_projections, first_divergent_index, last_observed_index};
use crate::{format_y_tick, min_and_max, nan_min_and_max, suitable_xfmt, title_case, to_utc};
use crate::{DeathTable, HospTable};
use chrono::{DateTime, Utc};
use log::{debug, info};
use plotters::coord::ranged1d::{Ranged, ValueFormatter};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

type PlotResult = std::result::Result<(), Box<dyn std::error::Error>>;

pub const CHART_SIZE: (u32, u32) = (2000, 1000);

pub const ORANGE: RGBColor = RGBColor(255, 165, 0);
pub const GRAY: RGBColor = RGBColor(128, 128, 128);
pub const PURPLE: RGBColor = RGBColor(128, 0, 128);

/// Switches of a chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// draw the projected part and mark where it starts
    pub projections: bool,
    /// log scale for the upper panel
    pub log_scale: bool,
}

/// Output image type, chosen by the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn from_path(fout: &Path) -> ImageFormat {
        match fout.extension().and_then(|e| e.to_str()) {
            Some(e) if e.eq_ignore_ascii_case("png") => ImageFormat::Png,
            _ => ImageFormat::Svg,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

/// Colors and labels of an interval band
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandStyle {
    /// red worst case, yellow best case, orange average over gray fills
    WorstBestCase,
    Custom {
        upper: RGBColor,
        lower: RGBColor,
        average: RGBColor,
        fill: RGBColor,
        label: &'static str,
    },
}

impl BandStyle {
    /// same color for lines and fills
    pub const fn uniform(color: RGBColor, label: &'static str) -> BandStyle {
        BandStyle::Custom {
            upper: color,
            lower: color,
            average: color,
            fill: color,
            label,
        }
    }
}

/// mean, lower and upper bound of an interval band
#[derive(Debug, Clone, Copy)]
pub struct Band<'a> {
    pub mean: &'a [f64],
    pub lower: &'a [f64],
    pub upper: &'a [f64],
}

/// Plots deaths with their bounds and the mobility change below.
/// The boundary of the projections is where the mean departs from the upper bound.
pub fn plot_deaths(
    table: DeathTable,
    location: &str,
    framing: DeathFraming,
    opts: RenderOptions,
    fout: &Path,
) -> Result<()> {
    debug!(
        "plot_deaths, location {}, {}, {:?}",
        location,
        framing.label(),
        opts
    );
    let chart = DeathChart::new(table, location, framing, opts)?;
    render(fout, |root| chart.draw(root), |root| chart.draw(root))
}

/// Plots the estimated infections, hospital use and confirmed cases,
/// with the death rate per 100K below.
/// The boundary of the projections is the last confirmed case count.
pub fn plot_hospitalizations(
    table: HospTable,
    location: &str,
    opts: RenderOptions,
    fout: &Path,
) -> Result<()> {
    debug!("plot_hospitalizations, location {}, {:?}", location, opts);
    let chart = HospChart::new(table, location, opts)?;
    render(fout, |root| chart.draw(root), |root| chart.draw(root))
}

/// picks the backend from the file extension and runs the matching drawing closure
fn render<S, P>(fout: &Path, svg: S, png: P) -> Result<()>
where
    S: FnOnce(DrawingArea<SVGBackend, Shift>) -> PlotResult,
    P: FnOnce(DrawingArea<BitMapBackend, Shift>) -> PlotResult,
{
    let format = ImageFormat::from_path(fout);
    let drawn = match format {
        ImageFormat::Svg => svg(SVGBackend::new(fout, CHART_SIZE).into_drawing_area()),
        ImageFormat::Png => png(BitMapBackend::new(fout, CHART_SIZE).into_drawing_area()),
    };
    drawn.map_err(|e| C19Error::Plot(e.to_string()))?;
    info!("chart written to {}", fout.display());
    Ok(())
}

struct DeathChart {
    x: Vec<DateTime<Utc>>,
    mean: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    mobility: Vec<f64>,
    marker: Option<usize>,
    observed_end: usize,
    title: String,
    opts: RenderOptions,
}

impl DeathChart {
    fn new(
        mut table: DeathTable,
        location: &str,
        framing: DeathFraming,
        opts: RenderOptions,
    ) -> Result<DeathChart> {
        let boundary =
            first_divergent_index(&table.column(DEATHS_MEAN), &table.column(DEATHS_UPPER));
        let marker = cut_projections(&mut table, boundary, opts.projections);
        if table.is_empty() {
            return Err(C19Error::EmptySeries);
        }
        let observed_end = boundary.map_or(table.len(), |i| (i + 1).min(table.len()));
        Ok(DeathChart {
            x: table.dates().iter().map(to_utc).collect(),
            mean: table.column(DEATHS_MEAN),
            lower: table.column(DEATHS_LOWER),
            upper: table.column(DEATHS_UPPER),
            mobility: table.column(MOBILITY),
            marker,
            observed_end,
            title: format!(
                "{} Covid Deaths and Mobility Data: {}",
                framing.label(),
                title_case(location)
            ),
            opts,
        })
    }

    fn draw<DB>(&self, root: DrawingArea<DB, Shift>) -> PlotResult
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let (upper_area, lower_area) = layout(&root, &self.title)?;
        let x_range = date_range(&self.x)?;
        let xfmt = suitable_xfmt(x_range.end - x_range.start);
        let (floor, top) = y_bounds(
            &[&self.mean[..], &self.lower[..], &self.upper[..]],
            self.opts.log_scale,
        );
        if self.opts.log_scale {
            let mut chart = panel(&upper_area, false)
                .build_cartesian_2d(x_range.clone(), (floor..top).log_scale())?;
            draw_mesh(&mut chart, "Deaths (log)", None)?;
            self.draw_deaths(&mut chart, floor)?;
        } else {
            let mut chart = panel(&upper_area, false).build_cartesian_2d(x_range.clone(), floor..top)?;
            draw_mesh(&mut chart, "Deaths", None)?;
            self.draw_deaths(&mut chart, floor)?;
        }

        let (lo, hi) = around_zero(&self.mobility);
        let mut chart = panel(&lower_area, true).build_cartesian_2d(x_range.clone(), lo..hi)?;
        draw_mesh(&mut chart, "Change in Mobility", Some(xfmt))?;
        draw_line(&mut chart, &self.x, &self.mobility, 0., WHITE.stroke_width(2), None)?;
        let (first, last) = (self.x[0], self.x[self.x.len() - 1]);
        chart.draw_series(DashedLineSeries::new(
            vec![(first, 0.), (last, 0.)],
            10,
            6,
            CYAN.mix(0.5).stroke_width(2),
        ))?;
        if let Some(i) = self.marker {
            if let Some((min, max)) = nan_min_and_max(&self.mobility) {
                draw_marker(&mut chart, self.x[i], min, max, 0., WHITE)?;
            }
        }
        root.present()?;
        Ok(())
    }

    fn draw_deaths<'a, DB, X, Y>(
        &self,
        chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
        floor: f64,
    ) -> PlotResult
    where
        DB: DrawingBackend + 'a,
        DB::ErrorType: 'static,
        X: Ranged<ValueType = DateTime<Utc>>,
        Y: Ranged<ValueType = f64>,
    {
        if self.opts.projections {
            if let (Some(i), Some((_, max))) = (self.marker, nan_min_and_max(&self.upper)) {
                draw_marker(chart, self.x[i], 0., max, floor, WHITE)?;
            }
            let band = Band {
                mean: &self.mean,
                lower: &self.lower,
                upper: &self.upper,
            };
            plot_intervals(chart, &self.x, band, BandStyle::WorstBestCase, 0.2, floor)?;
        }
        let end = self.observed_end;
        draw_line(
            chart,
            &self.x[..end],
            &self.mean[..end],
            floor,
            WHITE.stroke_width(2),
            Some("Observed"),
        )?;
        if self.opts.projections {
            draw_legend(chart)?;
        }
        Ok(())
    }
}

struct HospChart {
    x: Vec<DateTime<Utc>>,
    columns: Vec<Vec<f64>>,
    marker: Option<usize>,
    title: String,
    opts: RenderOptions,
}

impl HospChart {
    /// bands of the upper panel: first column, style, fill alpha
    const BANDS: [(usize, BandStyle, f64); 4] = [
        (INFECTED, BandStyle::uniform(ORANGE, "Estimated Infected"), 0.2),
        (HOSPITALIZED, BandStyle::uniform(BLUE, "Hospitalized"), 0.3),
        (ICU, BandStyle::uniform(PURPLE, "Hospitalized in ICU"), 0.5),
        (VENTILATED, BandStyle::uniform(RED, "Ventilated"), 0.2),
    ];

    fn new(mut table: HospTable, location: &str, opts: RenderOptions) -> Result<HospChart> {
        let boundary = last_observed_index(&table.column(CONFIRMED));
        let marker = cut_projections(&mut table, boundary, opts.projections);
        if table.is_empty() {
            return Err(C19Error::EmptySeries);
        }
        Ok(HospChart {
            x: table.dates().iter().map(to_utc).collect(),
            columns: (0..16).map(|j| table.column(j)).collect(),
            marker,
            title: format!(
                "Covid Hospitalization and Mortality Rates: {}",
                title_case(location)
            ),
            opts,
        })
    }

    fn band(&self, first: usize) -> Band<'_> {
        Band {
            mean: &self.columns[first],
            lower: &self.columns[first + 1],
            upper: &self.columns[first + 2],
        }
    }

    fn draw<DB>(&self, root: DrawingArea<DB, Shift>) -> PlotResult
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let (upper_area, lower_area) = layout(&root, &self.title)?;
        let x_range = date_range(&self.x)?;
        let xfmt = suitable_xfmt(x_range.end - x_range.start);
        let shown: Vec<&[f64]> = (INFECTED..DEATH_RATE)
            .chain(std::iter::once(CONFIRMED))
            .map(|j| &self.columns[j][..])
            .collect();
        let (floor, top) = y_bounds(&shown, self.opts.log_scale);
        if self.opts.log_scale {
            let mut chart = panel(&upper_area, false)
                .build_cartesian_2d(x_range.clone(), (floor..top).log_scale())?;
            draw_mesh(&mut chart, "Cases (log)", None)?;
            self.draw_cases(&mut chart, floor)?;
        } else {
            let mut chart = panel(&upper_area, false).build_cartesian_2d(x_range.clone(), floor..top)?;
            draw_mesh(&mut chart, "Cases", None)?;
            self.draw_cases(&mut chart, floor)?;
        }

        let rate = self.band(DEATH_RATE);
        let (floor, top) = y_bounds(&[rate.mean, rate.lower, rate.upper], false);
        let mut chart = panel(&lower_area, true).build_cartesian_2d(x_range.clone(), floor..top)?;
        draw_mesh(&mut chart, "Death (per 100K)", Some(xfmt))?;
        plot_intervals(
            &mut chart,
            &self.x,
            rate,
            BandStyle::uniform(WHITE, "Deaths per 100K"),
            0.2,
            floor,
        )?;
        if let (Some(i), Some((_, max))) = (self.marker, nan_min_and_max(rate.upper)) {
            draw_marker(&mut chart, self.x[i], 0., max, floor, CYAN)?;
        }
        root.present()?;
        Ok(())
    }

    fn draw_cases<'a, DB, X, Y>(
        &self,
        chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
        floor: f64,
    ) -> PlotResult
    where
        DB: DrawingBackend + 'a,
        DB::ErrorType: 'static,
        X: Ranged<ValueType = DateTime<Utc>>,
        Y: Ranged<ValueType = f64>,
    {
        if let (Some(i), Some((_, max))) = (self.marker, nan_min_and_max(&self.columns[INFECTED + 2])) {
            draw_marker(chart, self.x[i], 0., max, floor, CYAN)?;
        }
        for (first, style, alpha) in HospChart::BANDS.iter() {
            plot_intervals(chart, &self.x, self.band(*first), *style, *alpha, floor)?;
        }
        let confirmed = &self.columns[CONFIRMED];
        let icu = &self.columns[ICU];
        draw_line(
            chart,
            &self.x,
            confirmed,
            floor,
            WHITE.stroke_width(2),
            Some("Confirmed Cases"),
        )?;
        for points in polygons_above(&self.x, confirmed, icu) {
            let points: Vec<_> = points.into_iter().map(|(x, y)| (x, clip(y, floor))).collect();
            chart.draw_series(std::iter::once(Polygon::new(points, WHITE.mix(0.2).filled())))?;
        }
        draw_legend(chart)
    }
}

/// Draws the upper, lower and mean lines of a band, fills upper to mean and
/// lower to mean at alpha, and upper to zero (the floor in log scale) at alpha - 0.1.
pub fn plot_intervals<'a, DB, X, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
    x: &[DateTime<Utc>],
    band: Band<'_>,
    style: BandStyle,
    alpha: f64,
    floor: f64,
) -> PlotResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    X: Ranged<ValueType = DateTime<Utc>>,
    Y: Ranged<ValueType = f64>,
{
    let (upper, lower, average, fill, upper_label, lower_label, average_label) = match style {
        BandStyle::WorstBestCase => (
            RED,
            YELLOW,
            ORANGE,
            GRAY,
            Some("Worst Case"),
            Some("Best Case"),
            "Average",
        ),
        BandStyle::Custom {
            upper,
            lower,
            average,
            fill,
            label,
        } => (upper, lower, average, fill, None, None, label),
    };
    draw_line(chart, x, band.upper, floor, upper.mix(0.8).stroke_width(2), upper_label)?;
    draw_line(chart, x, band.lower, floor, lower.mix(0.8).stroke_width(2), lower_label)?;
    draw_line(chart, x, band.mean, floor, average.stroke_width(2), Some(average_label))?;
    fill_between(chart, x, band.upper, band.mean, floor, fill.mix(alpha))?;
    fill_between(chart, x, band.lower, band.mean, floor, fill.mix(alpha))?;
    let zeros = vec![0.; x.len()];
    let zero_alpha = (alpha - 0.1).max(0.);
    fill_between(chart, x, band.upper, &zeros, floor, fill.mix(zero_alpha))?;
    Ok(())
}

/// index ranges where keep holds, in order
fn runs<F: Fn(usize) -> bool>(len: usize, keep: F) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    for i in 0..len {
        match (keep(i), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..len);
    }
    runs
}

/// raises y to the floor of a log scale, a linear floor is 0 and leaves y as is
fn clip(y: f64, floor: f64) -> f64 {
    if floor > 0. {
        y.max(floor)
    } else {
        y
    }
}

fn draw_line<'a, DB, X, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
    x: &[DateTime<Utc>],
    y: &[f64],
    floor: f64,
    style: ShapeStyle,
    label: Option<&str>,
) -> PlotResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    X: Ranged<ValueType = DateTime<Utc>>,
    Y: Ranged<ValueType = f64>,
{
    let n = x.len().min(y.len());
    let mut label = label.map(String::from);
    for run in runs(n, |i| !y[i].is_nan()) {
        let anno = chart.draw_series(LineSeries::new(
            run.map(|i| (x[i], clip(y[i], floor))),
            style,
        ))?;
        // one legend entry per line, not per segment
        if let Some(l) = label.take() {
            let color = style.color;
            anno.label(l).legend(move |(px, py)| {
                PathElement::new(vec![(px, py), (px + 20, py)], color.stroke_width(2))
            });
        }
    }
    Ok(())
}

/// fills between y1 and y2 where both are valid
fn fill_between<'a, DB, X, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
    x: &[DateTime<Utc>],
    y1: &[f64],
    y2: &[f64],
    floor: f64,
    color: RGBAColor,
) -> PlotResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    X: Ranged<ValueType = DateTime<Utc>>,
    Y: Ranged<ValueType = f64>,
{
    let n = x.len().min(y1.len()).min(y2.len());
    for run in runs(n, |i| !y1[i].is_nan() && !y2[i].is_nan()) {
        let mut points: Vec<(DateTime<Utc>, f64)> =
            run.clone().map(|i| (x[i], clip(y1[i], floor))).collect();
        points.extend(run.rev().map(|i| (x[i], clip(y2[i], floor))));
        chart.draw_series(std::iter::once(Polygon::new(points, color.filled())))?;
    }
    Ok(())
}

/// Outlines of the regions where y1 lies above y2: y1 forward, then y2 backward.
/// A region next to a valid sample starts or ends at the interpolated crossing.
fn polygons_above(
    x: &[DateTime<Utc>],
    y1: &[f64],
    y2: &[f64],
) -> Vec<Vec<(DateTime<Utc>, f64)>> {
    let n = x.len().min(y1.len()).min(y2.len());
    let valid = |i: usize| !y1[i].is_nan() && !y2[i].is_nan();
    runs(n, |i| valid(i) && y1[i] > y2[i])
        .into_iter()
        .map(|run| {
            let mut points = Vec::with_capacity(2 * run.len() + 2);
            if run.start > 0 && valid(run.start - 1) {
                points.push(crossing(x, y1, y2, run.start - 1));
            }
            points.extend(run.clone().map(|i| (x[i], y1[i])));
            if run.end < n && valid(run.end) {
                points.push(crossing(x, y1, y2, run.end - 1));
            }
            points.extend(run.rev().map(|i| (x[i], y2[i])));
            points
        })
        .collect()
}

/// where y1 - y2 changes sign between samples i and i + 1, linear in between
fn crossing(x: &[DateTime<Utc>], y1: &[f64], y2: &[f64], i: usize) -> (DateTime<Utc>, f64) {
    let d0 = y1[i] - y2[i];
    let d1 = y1[i + 1] - y2[i + 1];
    let t = d0 / (d0 - d1);
    let step = (x[i + 1] - x[i]).num_milliseconds() as f64;
    let at = x[i] + chrono::Duration::milliseconds((step * t).round() as i64);
    (at, y1[i] + (y1[i + 1] - y1[i]) * t)
}

/// dashed vertical line at the start of the projections
fn draw_marker<'a, DB, X, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
    at: DateTime<Utc>,
    from: f64,
    to: f64,
    floor: f64,
    color: RGBColor,
) -> PlotResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    X: Ranged<ValueType = DateTime<Utc>>,
    Y: Ranged<ValueType = f64>,
{
    chart.draw_series(DashedLineSeries::new(
        vec![(at, clip(from, floor)), (at, clip(to, floor))],
        10,
        6,
        color.mix(0.5).stroke_width(2),
    ))?;
    Ok(())
}

fn draw_mesh<'a, DB, X, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
    y_desc: &str,
    xfmt: Option<&'static str>,
) -> PlotResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    X: Ranged<ValueType = DateTime<Utc>> + ValueFormatter<DateTime<Utc>>,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    // the upper panel shares the dates of the lower one and shows no x labels
    let x_formatter = |x: &DateTime<Utc>| match xfmt {
        Some(f) => x.format(f).to_string(),
        None => String::new(),
    };
    chart
        .configure_mesh()
        .light_line_style(TRANSPARENT.stroke_width(0))
        .bold_line_style(WHITE.mix(0.15).stroke_width(1))
        .axis_style(WHITE.mix(0.6).stroke_width(1))
        .set_all_tick_mark_size(2)
        .label_style(("sans-serif", 20).into_font().color(&WHITE))
        .axis_desc_style(("sans-serif", 22).into_font().color(&WHITE))
        .y_desc(y_desc)
        .x_labels(14) // max number of labels
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&|y: &f64| format_y_tick(*y))
        .draw()?;
    Ok(())
}

fn draw_legend<'a, DB, X, Y>(chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>) -> PlotResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    X: Ranged,
    Y: Ranged,
{
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(BLACK.mix(0.8))
        .border_style(WHITE.mix(0.4))
        .label_font(("sans-serif", 18).into_font().color(&WHITE))
        .draw()?;
    Ok(())
}

/// dark canvas, title on the left, then the two panels stacked 2:1
fn layout<DB>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
) -> std::result::Result<(DrawingArea<DB, Shift>, DrawingArea<DB, Shift>), Box<dyn std::error::Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&BLACK)?;
    let (title_area, body) = root.split_vertically(60);
    title_area.draw(&Text::new(
        title,
        (110, 20),
        ("sans-serif", 30).into_font().color(&WHITE),
    ))?;
    let body_height = body.dim_in_pixel().1;
    Ok(body.split_vertically(body_height * 2 / 3))
}

fn panel<'a, 'b, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    x_labels: bool,
) -> ChartBuilder<'a, 'b, DB> {
    let mut builder = ChartBuilder::on(area);
    builder
        .margin_left(10)
        .margin_right(30)
        .x_label_area_size(if x_labels { 50 } else { 0 })
        .y_label_area_size(100);
    builder
}

/// date range of the x axis, with a small margin on both sides
fn date_range(x: &[DateTime<Utc>]) -> Result<Range<DateTime<Utc>>> {
    let (first, last) = min_and_max(x).ok_or(C19Error::EmptySeries)?;
    let margin = ((last - first) / 50).max(chrono::Duration::days(1));
    Ok(first - margin..last + margin)
}

/// (floor, top) of a panel holding the series; the floor is 0 unless log scale
fn y_bounds(series: &[&[f64]], log_scale: bool) -> (f64, f64) {
    let values: Vec<f64> = series
        .iter()
        .flat_map(|s| s.iter().copied())
        .filter(|v| !v.is_nan())
        .collect();
    let max = values.iter().copied().fold(f64::NAN, f64::max);
    if log_scale {
        let min_positive = values
            .iter()
            .copied()
            .filter(|v| *v > 0.)
            .fold(f64::INFINITY, f64::min);
        if min_positive.is_finite() {
            (min_positive / 2., max * 2.)
        } else {
            (0.1, 1.)
        }
    } else if max > 0. {
        (0., max * 1.05)
    } else {
        (0., 1.)
    }
}

/// range covering the series and zero, with 5% padding
fn around_zero(values: &[f64]) -> (f64, f64) {
    let (min, max) = nan_min_and_max(values).unwrap_or((0., 0.));
    let (min, max) = (min.min(0.), max.max(0.));
    let pad = if max > min { (max - min) * 0.05 } else { 1. };
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn out(name: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("c19_render_{}_{}.{}", name, std::process::id(), ext))
    }

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
    }

    /// observed for 10 days, then projections with widening bounds
    fn death_table() -> DeathTable {
        let mut table = DeathTable::new(20);
        for (i, d) in dates(20).into_iter().enumerate() {
            let mean = (i * i) as f64;
            let spread = if i < 10 { 0. } else { (i - 9) as f64 * 5. };
            table.push_row(d, [mean, mean - spread, mean + spread, (i as f64) - 10.]);
        }
        table
    }

    fn hosp_table() -> HospTable {
        let mut table = HospTable::new(20);
        for (i, d) in dates(20).into_iter().enumerate() {
            let mut row = [0.; 16];
            for (j, v) in row.iter_mut().enumerate() {
                let base = 1000. / (1 + j / 3) as f64 + (i * 10) as f64;
                *v = match j % 3 {
                    1 => base * 0.8,
                    2 => base * 1.2,
                    _ => base,
                };
            }
            row[CONFIRMED] = if i < 12 { 400. + (i * 30) as f64 } else { f64::NAN };
            table.push_row(d, row);
        }
        table
    }

    /// text of the written svg; the file is removed
    fn read_svg(fout: &Path) -> String {
        let svg = std::fs::read_to_string(fout).unwrap();
        std::fs::remove_file(fout).unwrap();
        svg
    }

    /// charts with text can only be laid out when a sans-serif font is found
    fn fonts_available() -> bool {
        let found = ("sans-serif", 20).into_font().box_size("Deaths").is_ok();
        if !found {
            eprintln!("no sans-serif font, chart text not checked");
        }
        found
    }

    fn at(day: i64, hours: i64) -> DateTime<Utc> {
        to_utc(&dates(1)[0]) + chrono::Duration::days(day) + chrono::Duration::hours(hours)
    }

    #[test]
    fn test_runs_split_on_gaps() {
        let v = [1., f64::NAN, 2., 3., f64::NAN, f64::NAN, 4.];
        assert_eq!(runs(v.len(), |i| !v[i].is_nan()), vec![0..1, 2..4, 6..7]);
        assert!(runs(3, |_| false).is_empty());
        assert_eq!(runs(3, |_| true), vec![0..3]);
    }

    #[test]
    fn test_clip_only_in_log_scale() {
        assert_eq!(clip(-3., 0.), -3.);
        assert_eq!(clip(0., 0.5), 0.5);
        assert_eq!(clip(7., 0.5), 7.);
    }

    #[test]
    fn test_y_bounds() {
        let a = [0., 10., f64::NAN];
        let b = [20.];
        let (floor, top) = y_bounds(&[&a[..], &b[..]], false);
        assert_eq!(floor, 0.);
        assert!((top - 21.).abs() < 1e-9);
        let c = [0., 4., 8.];
        assert_eq!(y_bounds(&[&c[..]], true), (2., 16.));
        let nan = [f64::NAN];
        assert_eq!(y_bounds(&[&nan[..]], false), (0., 1.));
        let zero = [0.];
        assert_eq!(y_bounds(&[&zero[..]], true), (0.1, 1.));
    }

    #[test]
    fn test_around_zero_includes_zero() {
        let (lo, hi) = around_zero(&[-40., -10., f64::NAN]);
        assert!(lo < -40. && hi > 0.);
        assert_eq!(around_zero(&[]), (-1., 1.));
    }

    #[test]
    fn test_image_format_from_extension() {
        assert_eq!(ImageFormat::from_path(Path::new("a/global_Hosp.PNG")), ImageFormat::Png);
        assert_eq!(ImageFormat::from_path(Path::new("global_Hosp.svg")), ImageFormat::Svg);
        assert_eq!(ImageFormat::from_path(Path::new("global")), ImageFormat::Svg);
    }

    #[test]
    fn test_crossing_is_interpolated() {
        let x: Vec<_> = (0..2).map(|d| at(d, 0)).collect();
        assert_eq!(crossing(&x, &[0., 2.], &[1., 1.], 0), (at(0, 12), 1.));
        assert_eq!(crossing(&x, &[3., 0.], &[1., 2.], 0), (at(0, 12), 1.5));
    }

    #[test]
    fn test_polygons_above_close_at_crossings() {
        let x: Vec<_> = (0..4).map(|d| at(d, 0)).collect();
        let polygons = polygons_above(&x, &[0., 2., 2., 0.], &[1., 1., 1., 1.]);
        assert_eq!(
            polygons,
            vec![vec![
                (at(0, 12), 1.),
                (at(1, 0), 2.),
                (at(2, 0), 2.),
                (at(2, 12), 1.),
                (at(2, 0), 1.),
                (at(1, 0), 1.),
            ]]
        );
    }

    #[test]
    fn test_polygons_above_stop_at_nan() {
        let x: Vec<_> = (0..3).map(|d| at(d, 0)).collect();
        let polygons = polygons_above(&x, &[f64::NAN, 2., 0.], &[1., 1., 1.]);
        assert_eq!(
            polygons,
            vec![vec![(at(1, 0), 2.), (at(1, 12), 1.), (at(1, 0), 1.)]]
        );
        assert!(polygons_above(&x, &[0., 0., 0.], &[1., 1., 1.]).is_empty());
    }

    #[test]
    fn test_death_chart_cut_to_boundary_without_projections() {
        let chart = DeathChart::new(
            death_table(),
            "new_york",
            DeathFraming::Daily,
            RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(chart.x.len(), 10);
        assert_eq!(chart.mobility.len(), 10);
        assert_eq!(chart.marker, None);
        assert_eq!(chart.observed_end, 10);
        assert_eq!(chart.title, "Daily Covid Deaths and Mobility Data: New York");
    }

    #[test]
    fn test_death_chart_marks_boundary_with_projections() {
        let opts = RenderOptions {
            projections: true,
            log_scale: false,
        };
        let chart = DeathChart::new(death_table(), "global", DeathFraming::Total, opts).unwrap();
        assert_eq!(chart.x.len(), 20);
        assert_eq!(chart.marker, Some(10));
        assert_eq!(chart.observed_end, 11);
        assert_eq!(chart.title, "Total Covid Deaths and Mobility Data: Global");
    }

    #[test]
    fn test_hosp_chart_boundary_is_last_confirmed() {
        let cut = HospChart::new(hosp_table(), "global", RenderOptions::default()).unwrap();
        assert_eq!(cut.x.len(), 11);
        assert!(cut.columns.iter().all(|c| c.len() == 11));
        assert_eq!(cut.marker, None);
        let opts = RenderOptions {
            projections: true,
            log_scale: true,
        };
        let full = HospChart::new(hosp_table(), "global", opts).unwrap();
        assert_eq!(full.x.len(), 20);
        assert_eq!(full.marker, Some(11));
        assert_eq!(full.title, "Covid Hospitalization and Mortality Rates: Global");
    }

    #[test]
    fn test_plot_deaths_svg() {
        if !fonts_available() {
            return;
        }
        for (name, opts) in [
            ("plain", RenderOptions::default()),
            ("proj", RenderOptions { projections: true, log_scale: false }),
            ("proj_log", RenderOptions { projections: true, log_scale: true }),
        ]
        .iter()
        {
            let fout = out(&format!("deaths_{}", name), "svg");
            plot_deaths(death_table(), "new_york", DeathFraming::Daily, *opts, &fout).unwrap();
            let svg = read_svg(&fout);
            assert!(svg.contains("Daily Covid Deaths and Mobility Data: New York"));
            assert!(svg.contains("Change in Mobility"));
            assert_eq!(svg.contains("Deaths (log)"), opts.log_scale, "{}", name);
            assert_eq!(svg.contains("Worst Case"), opts.projections, "{}", name);
            assert_eq!(svg.contains("Best Case"), opts.projections, "{}", name);
        }
    }

    #[test]
    fn test_plot_hospitalizations_svg() {
        if !fonts_available() {
            return;
        }
        for (name, opts) in [
            ("plain", RenderOptions::default()),
            ("proj_log", RenderOptions { projections: true, log_scale: true }),
        ]
        .iter()
        {
            let fout = out(&format!("hosp_{}", name), "svg");
            plot_hospitalizations(hosp_table(), "global", *opts, &fout).unwrap();
            let svg = read_svg(&fout);
            assert!(svg.contains("Covid Hospitalization and Mortality Rates: Global"));
            assert!(svg.contains("Death (per 100K)"));
            assert!(svg.contains("Estimated Infected"));
            assert!(svg.contains("Confirmed Cases"));
            assert_eq!(svg.contains("Cases (log)"), opts.log_scale, "{}", name);
        }
    }

    #[test]
    fn test_plot_without_observed_rows_fails() {
        let mut table = DeathTable::new(2);
        for d in dates(2) {
            table.push_row(d, [1., 0., 2., 0.]);
        }
        let fout = out("empty", "svg");
        assert!(matches!(
            plot_deaths(table, "global", DeathFraming::Total, RenderOptions::default(), &fout),
            Err(C19Error::EmptySeries)
        ));
    }
}
