//! Parquet ingestion with column auto-mapping (§6), mirroring the
//! teacher's `telemetry_export` use of `arrow`/`parquet` but reading a
//! table of ride requests instead of writing simulation snapshots.

use crate::geo::LonLat;
use crate::model::Request;
use arrow::array::{Array, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::error::Error;
use std::fs::File;
use std::path::Path;

const ID_CANDIDATES: &[&str] = &["KEY1", "req_id", "id", "request_id", "ride_id", "trip_id"];
const T_CANDIDATES: &[&str] = &[
    "t_request",
    "t_pick",
    "pickup_ts",
    "request_ts",
    "timestamp",
    "ts",
    "call_time",
    "req_time",
    "requested_at",
];
const O_LON_CANDIDATES: &[&str] = &[
    "o_lon",
    "pickup_lon",
    "start_lon",
    "lon_o",
    "origin_lon",
    "orig_lon",
    "O_LON",
    "o_lng",
    "pulon",
    "PULongitude",
];
const O_LAT_CANDIDATES: &[&str] = &[
    "o_lat",
    "pickup_lat",
    "start_lat",
    "lat_o",
    "origin_lat",
    "orig_lat",
    "O_LAT",
    "o_latitude",
    "pulat",
    "PULatitude",
];
const D_LON_CANDIDATES: &[&str] = &[
    "d_lon",
    "dropoff_lon",
    "end_lon",
    "lon_d",
    "dest_lon",
    "dst_lon",
    "D_LON",
    "d_lng",
    "dolon",
    "DOLongitude",
];
const D_LAT_CANDIDATES: &[&str] = &[
    "d_lat",
    "dropoff_lat",
    "end_lat",
    "lat_d",
    "dest_lat",
    "dst_lat",
    "D_LAT",
    "d_latitude",
    "dolat",
    "DOLatitude",
];

fn pick_first(names: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|cand| names.iter().position(|n| n == cand))
}

/// Narrows ingestion per §6: time-window filter and optional sampling.
pub struct IngestOptions {
    pub sim_start_sec: Option<f64>,
    pub sim_end_sec: Option<f64>,
    pub limit_n: Option<usize>,
    pub limit_random: bool,
    pub limit_seed: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            sim_start_sec: None,
            sim_end_sec: None,
            limit_n: None,
            limit_random: false,
            limit_seed: 42,
        }
    }
}

fn column_to_f64(batch: &RecordBatch, idx: usize) -> Result<Vec<Option<f64>>, Box<dyn Error>> {
    let col = batch.column(idx);
    let floats = cast(col, &DataType::Float64)?;
    let floats = floats
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or("expected a numeric column after cast to float64")?;
    Ok((0..floats.len())
        .map(|i| (!floats.is_null(i)).then(|| floats.value(i)))
        .collect())
}

fn column_to_string(batch: &RecordBatch, idx: usize) -> Result<Vec<Option<String>>, Box<dyn Error>> {
    let col = batch.column(idx);
    if matches!(col.data_type(), DataType::Utf8 | DataType::LargeUtf8) {
        let arr = col
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or("expected a utf8 id column")?;
        Ok((0..arr.len())
            .map(|i| (!arr.is_null(i)).then(|| arr.value(i).to_string()))
            .collect())
    } else {
        Ok(column_to_f64(batch, idx)?
            .into_iter()
            .map(|v| {
                v.map(|f| {
                    if f.fract() == 0.0 {
                        format!("{}", f as i64)
                    } else {
                        f.to_string()
                    }
                })
            })
            .collect())
    }
}

/// Rescales a time column to seconds per §6: a median exceeding 1e12 is
/// treated as microseconds (/1_000_000), exceeding 1e10 as milliseconds
/// (/1000), otherwise left alone.
fn ensure_seconds(values: &mut [Option<f64>]) {
    let mut finite: Vec<f64> = values
        .iter()
        .filter_map(|v| *v)
        .filter(|v| v.is_finite())
        .collect();
    if finite.is_empty() {
        return;
    }
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median = finite[finite.len() / 2];
    let divisor = if median > 1e12 {
        1_000_000.0
    } else if median > 1e10 {
        1000.0
    } else {
        1.0
    };
    if divisor != 1.0 {
        for v in values.iter_mut().flatten() {
            *v /= divisor;
        }
    }
}

/// Loads requests from a parquet file: column auto-mapping, unit
/// rescaling, null-row dropping, time-window filter, optional sampling,
/// then ascending sort by `t_request` (§6).
pub fn load_requests_parquet(
    path: impl AsRef<Path>,
    opts: &IngestOptions,
) -> Result<Vec<Request>, Box<dyn Error>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut req_ids: Vec<Option<String>> = Vec::new();
    let mut t_request: Vec<Option<f64>> = Vec::new();
    let mut o_lon: Vec<Option<f64>> = Vec::new();
    let mut o_lat: Vec<Option<f64>> = Vec::new();
    let mut d_lon: Vec<Option<f64>> = Vec::new();
    let mut d_lat: Vec<Option<f64>> = Vec::new();

    type ColumnIndices = (Option<usize>, usize, usize, usize, usize, usize);
    let mut col_idx: Option<ColumnIndices> = None;
    let mut row_offset = 0usize;

    for batch in reader {
        let batch = batch?;
        if col_idx.is_none() {
            let names: Vec<String> = batch
                .schema()
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect();
            let id_pos = pick_first(&names, ID_CANDIDATES);
            let t_pos =
                pick_first(&names, T_CANDIDATES).ok_or("no time column found among known candidates")?;
            let o_lon_pos =
                pick_first(&names, O_LON_CANDIDATES).ok_or("no origin-longitude column found")?;
            let o_lat_pos =
                pick_first(&names, O_LAT_CANDIDATES).ok_or("no origin-latitude column found")?;
            let d_lon_pos =
                pick_first(&names, D_LON_CANDIDATES).ok_or("no destination-longitude column found")?;
            let d_lat_pos =
                pick_first(&names, D_LAT_CANDIDATES).ok_or("no destination-latitude column found")?;
            col_idx = Some((id_pos, t_pos, o_lon_pos, o_lat_pos, d_lon_pos, d_lat_pos));
        }
        let (id_pos, t_pos, o_lon_pos, o_lat_pos, d_lon_pos, d_lat_pos) = col_idx.unwrap();

        let ids = match id_pos {
            Some(idx) => column_to_string(&batch, idx)?,
            None => (0..batch.num_rows())
                .map(|i| Some((row_offset + i).to_string()))
                .collect(),
        };
        req_ids.extend(ids);
        t_request.extend(column_to_f64(&batch, t_pos)?);
        o_lon.extend(column_to_f64(&batch, o_lon_pos)?);
        o_lat.extend(column_to_f64(&batch, o_lat_pos)?);
        d_lon.extend(column_to_f64(&batch, d_lon_pos)?);
        d_lat.extend(column_to_f64(&batch, d_lat_pos)?);
        row_offset += batch.num_rows();
    }

    ensure_seconds(&mut t_request);

    let mut requests = Vec::new();
    for i in 0..req_ids.len() {
        let (Some(id), Some(t), Some(ol), Some(ola), Some(dl), Some(dla)) = (
            req_ids[i].clone(),
            t_request[i],
            o_lon[i],
            o_lat[i],
            d_lon[i],
            d_lat[i],
        ) else {
            continue;
        };
        requests.push(Request {
            req_id: id,
            origin: LonLat::new(ol, ola),
            destination: LonLat::new(dl, dla),
            t_request: t,
        });
    }

    requests.retain(|r| {
        opts.sim_start_sec.map_or(true, |s| r.t_request >= s)
            && opts.sim_end_sec.map_or(true, |e| r.t_request < e)
    });
    requests.sort_by(|a, b| a.t_request.partial_cmp(&b.t_request).unwrap());

    if let Some(n) = opts.limit_n {
        if opts.limit_random {
            let mut rng = StdRng::seed_from_u64(opts.limit_seed);
            requests.shuffle(&mut rng);
            requests.truncate(n);
            requests.sort_by(|a, b| a.t_request.partial_cmp(&b.t_request).unwrap());
        } else {
            requests.truncate(n);
        }
    }

    Ok(requests)
}
