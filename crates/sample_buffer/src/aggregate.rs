//! Collapse a rolling snapshot into one gaze position.

use contracts::{AggregationMethod, GazePair, Point2};

/// Aggregate both eyes across the window
///
/// Invalid (NaN) points are ignored. Returns `None` when nothing valid is
/// left to aggregate.
pub fn aggregate(window: &[GazePair], method: AggregationMethod) -> Option<Point2> {
    match method {
        AggregationMethod::Last => {
            let last = window.last()?;
            mean_of(valid_points(std::slice::from_ref(last)))
        }
        AggregationMethod::Mean => mean_of(valid_points(window)),
        AggregationMethod::Median => {
            let points: Vec<Point2> = valid_points(window).collect();
            if points.is_empty() {
                return None;
            }
            let mut xs: Vec<f64> = points.iter().map(|p| p.x).collect();
            let mut ys: Vec<f64> = points.iter().map(|p| p.y).collect();
            Some(Point2::new(median(&mut xs), median(&mut ys)))
        }
    }
}

fn valid_points(window: &[GazePair]) -> impl Iterator<Item = Point2> + '_ {
    window
        .iter()
        .flat_map(|pair| [pair.left, pair.right])
        .filter(Point2::is_valid)
}

fn mean_of(points: impl Iterator<Item = Point2>) -> Option<Point2> {
    let (mut sx, mut sy, mut n) = (0.0, 0.0, 0usize);
    for p in points {
        sx += p.x;
        sy += p.y;
        n += 1;
    }
    (n > 0).then(|| Point2::new(sx / n as f64, sy / n as f64))
}

// Values are finite, so total_cmp matches numeric order
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
