//! SVG charts of the grid search results.

use plotters::prelude::*;
use rfgrid_rf::SplitCriterion;
use rfgrid_search::ResultTable;

type ChartResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const FACET_WIDTH: u32 = 380;
const CHART_HEIGHT: u32 = 440;
const REFERENCE_LINE: RGBColor = RGBColor(130, 130, 130);

fn criterion_color(criterion: SplitCriterion) -> RGBColor {
    match criterion {
        SplitCriterion::Gini => RGBColor(31, 119, 180),
        SplitCriterion::DistAuc => RGBColor(214, 39, 40),
        SplitCriterion::InfGain => RGBColor(44, 160, 44),
    }
}

fn distinct<T: Ord + Copy>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = values.collect();
    out.sort_unstable();
    out.dedup();
    out
}

/// Accuracy against ensemble size, one facet per leaf size and one line per
/// criterion, with a horizontal reference at the best accuracy overall.
pub fn accuracy_chart_svg(table: &ResultTable) -> ChartResult<String> {
    let max_acc = table.max_accuracy().ok_or("no results to plot")?;
    let min_acc = table
        .iter()
        .map(|r| r.accuracy())
        .fold(f64::INFINITY, f64::min);

    let leaves = distinct(table.iter().map(|r| r.config.min_leaf_size));
    let criteria = distinct(table.iter().map(|r| r.config.criterion));
    let trees = distinct(table.iter().map(|r| r.config.n_trees));
    let (first_trees, last_trees) = match (trees.first(), trees.last()) {
        (Some(&a), Some(&b)) => (a as f64, b as f64),
        _ => return Err("no results to plot".into()),
    };

    let x_pad = ((last_trees - first_trees) * 0.05).max(1.0);
    let x_range = (first_trees - x_pad)..(last_trees + x_pad);
    let y_pad = ((max_acc - min_acc) * 0.15).max(0.01);
    let y_range = (min_acc - y_pad).max(0.0)..(max_acc + y_pad).min(1.0);

    let mut svg = String::new();
    {
        let width = FACET_WIDTH * leaves.len() as u32;
        let root = SVGBackend::with_string(&mut svg, (width, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled("Test accuracy by number of trees", ("sans-serif", 22))?;
        let facets = root.split_evenly((1, leaves.len()));

        for (facet, &leaf) in facets.iter().zip(&leaves) {
            let mut chart = ChartBuilder::on(facet)
                .caption(format!("min leaf size {leaf}"), ("sans-serif", 16))
                .margin(10)
                .x_label_area_size(35)
                .y_label_area_size(55)
                .build_cartesian_2d(x_range.clone(), y_range.clone())?;

            chart
                .configure_mesh()
                .x_desc("trees")
                .y_desc("accuracy")
                .y_label_formatter(&|y: &f64| format!("{y:.3}"))
                .draw()?;

            chart.draw_series(std::iter::once(PathElement::new(
                vec![(x_range.start, max_acc), (x_range.end, max_acc)],
                REFERENCE_LINE.stroke_width(1),
            )))?;

            for &criterion in &criteria {
                let mut points: Vec<(f64, f64)> = table
                    .iter()
                    .filter(|r| r.config.min_leaf_size == leaf && r.config.criterion == criterion)
                    .map(|r| (r.config.n_trees as f64, r.accuracy()))
                    .collect();
                points.sort_by(|a, b| a.0.total_cmp(&b.0));
                let color = criterion_color(criterion);

                chart
                    .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
                    .label(criterion.name())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))?;
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::LowerRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }
        root.present()?;
    }
    Ok(svg)
}

/// Accuracy with its confidence bounds for the `top` best configurations,
/// labeled by composite identifier.
pub fn interval_chart_svg(table: &ResultTable, top: usize) -> ChartResult<String> {
    let rows = table.top(top);
    if rows.is_empty() {
        return Err("no results to plot".into());
    }
    let lo = rows
        .iter()
        .map(|r| r.metrics.accuracy_lower)
        .fold(f64::INFINITY, f64::min);
    let hi = rows
        .iter()
        .map(|r| r.metrics.accuracy_upper)
        .fold(f64::NEG_INFINITY, f64::max);
    let pad = ((hi - lo) * 0.1).max(0.01);
    let labels: Vec<String> = rows.iter().map(|r| r.config.label()).collect();
    let n = rows.len() as f64;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (760, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Top {} configurations: accuracy and 95% CI", rows.len()),
                ("sans-serif", 20),
            )
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..(n - 0.5), (lo - pad).max(0.0)..(hi + pad).min(1.0))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(rows.len())
            .x_label_formatter(&|x: &f64| {
                let i = x.round();
                if (x - i).abs() < 1e-6 && i >= 0.0 {
                    labels.get(i as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .y_desc("accuracy")
            .y_label_formatter(&|y: &f64| format!("{y:.3}"))
            .draw()?;

        chart.draw_series(rows.iter().enumerate().map(|(i, r)| {
            let x = i as f64;
            PathElement::new(
                vec![(x, r.metrics.accuracy_lower), (x, r.metrics.accuracy_upper)],
                BLACK.stroke_width(2),
            )
        }))?;
        chart.draw_series(rows.iter().enumerate().flat_map(|(i, r)| {
            let x = i as f64;
            [r.metrics.accuracy_lower, r.metrics.accuracy_upper]
                .map(|y| PathElement::new(vec![(x - 0.12, y), (x + 0.12, y)], BLACK.stroke_width(2)))
        }))?;
        chart.draw_series(rows.iter().enumerate().map(|(i, r)| {
            Circle::new(
                (i as f64, r.accuracy()),
                6,
                criterion_color(r.config.criterion).filled(),
            )
        }))?;

        root.present()?;
    }
    Ok(svg)
}
