//! Column layouts and the sample -> row transform for both schema variants.

use contracts::{ContractError, EyeData, GazeSample, Point2, Point3, SchemaVariant};
use coords::SurfaceTransform;

use crate::table::{ColumnKind, ColumnSpec, Value};
use ColumnKind::{Bool, Integer, Real, Text};

/// Relative timestamp column (ms since the first sample of the session)
pub const TIMESTAMP: &str = "TimeStamp";

/// Event label column
pub const EVENTS: &str = "Events";

/// Absolute sample clock column, raw schema only (µs)
pub const SYSTEM_TIME_STAMP: &str = "system_time_stamp";

macro_rules! eye_columns {
    ($p:literal) => {
        [
            ColumnSpec::new(concat!($p, "_gaze_point_on_display_area_x"), Real),
            ColumnSpec::new(concat!($p, "_gaze_point_on_display_area_y"), Real),
            ColumnSpec::new(concat!($p, "_gaze_point_in_user_coordinate_system_x"), Real),
            ColumnSpec::new(concat!($p, "_gaze_point_in_user_coordinate_system_y"), Real),
            ColumnSpec::new(concat!($p, "_gaze_point_in_user_coordinate_system_z"), Real),
            ColumnSpec::new(concat!($p, "_gaze_point_validity"), Bool),
            ColumnSpec::new(concat!($p, "_pupil_diameter"), Real),
            ColumnSpec::new(concat!($p, "_pupil_validity"), Bool),
            ColumnSpec::new(concat!($p, "_gaze_origin_in_user_coordinate_system_x"), Real),
            ColumnSpec::new(concat!($p, "_gaze_origin_in_user_coordinate_system_y"), Real),
            ColumnSpec::new(concat!($p, "_gaze_origin_in_user_coordinate_system_z"), Real),
            ColumnSpec::new(concat!($p, "_gaze_origin_in_trackbox_coordinate_system_x"), Real),
            ColumnSpec::new(concat!($p, "_gaze_origin_in_trackbox_coordinate_system_y"), Real),
            ColumnSpec::new(concat!($p, "_gaze_origin_in_trackbox_coordinate_system_z"), Real),
            ColumnSpec::new(concat!($p, "_gaze_origin_validity"), Bool),
        ]
    };
}

const LEFT: [ColumnSpec; 15] = eye_columns!("left");
const RIGHT: [ColumnSpec; 15] = eye_columns!("right");

const fn raw_columns() -> [ColumnSpec; 34] {
    let mut cols = [ColumnSpec::new(TIMESTAMP, Integer); 34];
    cols[1] = ColumnSpec::new("device_time_stamp", Integer);
    cols[2] = ColumnSpec::new(SYSTEM_TIME_STAMP, Integer);
    let mut i = 0;
    while i < 15 {
        cols[3 + i] = LEFT[i];
        cols[18 + i] = RIGHT[i];
        i += 1;
    }
    cols[33] = ColumnSpec::new(EVENTS, Text);
    cols
}

/// Every vendor field, multi-component points expanded to `_x/_y/_z`
pub const RAW_COLUMNS: &[ColumnSpec] = &raw_columns();

/// Per-eye gaze in surface units with short names
pub const SIMPLIFIED_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new(TIMESTAMP, Integer),
    ColumnSpec::new("Left_X", Real),
    ColumnSpec::new("Left_Y", Real),
    ColumnSpec::new("Left_Validity", Integer),
    ColumnSpec::new("Left_Pupil", Real),
    ColumnSpec::new("Left_Pupil_Validity", Integer),
    ColumnSpec::new("Right_X", Real),
    ColumnSpec::new("Right_Y", Real),
    ColumnSpec::new("Right_Validity", Integer),
    ColumnSpec::new("Right_Pupil", Real),
    ColumnSpec::new("Right_Pupil_Validity", Integer),
    ColumnSpec::new(EVENTS, Text),
];

pub fn columns(variant: SchemaVariant) -> &'static [ColumnSpec] {
    match variant {
        SchemaVariant::Raw => RAW_COLUMNS,
        SchemaVariant::Simplified => SIMPLIFIED_COLUMNS,
    }
}

/// Milliseconds since `first`, rounded to an integer
pub fn relative_ms(system_time_stamp: i64, first: i64) -> i64 {
    ((system_time_stamp - first) as f64 / 1000.0).round() as i64
}

/// Build one row per sample in the variant's column order
///
/// `labels` is parallel to `samples`.
pub fn build_rows(
    variant: SchemaVariant,
    transform: &SurfaceTransform,
    samples: &[GazeSample],
    labels: &[Option<String>],
    first_timestamp: i64,
) -> Result<Vec<Vec<Value>>, ContractError> {
    samples
        .iter()
        .zip(labels)
        .map(|(sample, label)| {
            let ts = relative_ms(sample.system_time_stamp, first_timestamp);
            let label = Value::Text(label.clone().unwrap_or_default());
            match variant {
                SchemaVariant::Raw => Ok(raw_row(ts, sample, label)),
                SchemaVariant::Simplified => simplified_row(ts, transform, sample, label),
            }
        })
        .collect()
}

fn raw_row(ts: i64, sample: &GazeSample, label: Value) -> Vec<Value> {
    let mut row = Vec::with_capacity(RAW_COLUMNS.len());
    row.push(Value::Int(ts));
    row.push(Value::Int(sample.device_time_stamp));
    row.push(Value::Int(sample.system_time_stamp));
    push_raw_eye(&mut row, &sample.left);
    push_raw_eye(&mut row, &sample.right);
    row.push(label);
    row
}

fn push_raw_eye(row: &mut Vec<Value>, eye: &EyeData) {
    push_point2(row, eye.gaze_point_on_display_area);
    push_point3(row, eye.gaze_point_in_user_coordinate_system);
    row.push(Value::Bool(eye.gaze_point_validity));
    row.push(Value::Real(eye.pupil_diameter));
    row.push(Value::Bool(eye.pupil_validity));
    push_point3(row, eye.gaze_origin_in_user_coordinate_system);
    push_point3(row, eye.gaze_origin_in_trackbox_coordinate_system);
    row.push(Value::Bool(eye.gaze_origin_validity));
}

fn push_point2(row: &mut Vec<Value>, p: Point2) {
    row.extend([Value::Real(p.x), Value::Real(p.y)]);
}

fn push_point3(row: &mut Vec<Value>, p: Point3) {
    row.extend([Value::Real(p.x), Value::Real(p.y), Value::Real(p.z)]);
}

fn simplified_row(
    ts: i64,
    transform: &SurfaceTransform,
    sample: &GazeSample,
    label: Value,
) -> Result<Vec<Value>, ContractError> {
    let mut row = Vec::with_capacity(SIMPLIFIED_COLUMNS.len());
    row.push(Value::Int(ts));
    for eye in [&sample.left, &sample.right] {
        let p = transform.to_surface(eye.gaze_point_on_display_area)?;
        row.extend([
            Value::Real(p.x),
            Value::Real(p.y),
            Value::Int(eye.gaze_point_validity as i64),
            Value::Real(eye.pupil_diameter),
            Value::Int(eye.pupil_validity as i64),
        ]);
    }
    row.push(label);
    Ok(row)
}
