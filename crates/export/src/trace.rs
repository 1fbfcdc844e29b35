//! CSV traces of flown trajectories and body ephemerides.

use std::path::Path;

use pathfinder_ephemeris::Ephemerides;
use pathfinder_transfer::FlightChain;
use serde::Serialize;

use crate::{ExportError, writer_for_path};

/// One sampled point of a chain leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TracePoint {
    pub leg: usize,
    /// Share of the leg's swept arc flown so far.
    pub t_fraction: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodySample {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Sample every leg of `chain` at `0, step, 2·step, …, 1` of its swept arc.
pub fn flight_trace(chain: &FlightChain, step: f64) -> Result<Vec<TracePoint>, ExportError> {
    if !(step > 0.0 && step <= 1.0) {
        return Err(ExportError::InvalidStep(step));
    }
    let count = (1.0 / step).ceil() as usize;
    let mut points = Vec::with_capacity(chain.legs.len() * (count + 1));
    for (leg, info) in chain.legs.iter().enumerate() {
        for i in 0..=count {
            let t_fraction = (i as f64 * step).min(1.0);
            let [x, y, z] = info.link.point_at_fraction(t_fraction);
            points.push(TracePoint {
                leg,
                t_fraction,
                x,
                y,
                z,
            });
        }
    }
    Ok(points)
}

/// Sample `body` at `begin, begin + step, …` while before `end`.
pub fn body_trace(
    body: &dyn Ephemerides,
    begin: f64,
    end: f64,
    step: f64,
) -> Result<Vec<BodySample>, ExportError> {
    if !(step > 0.0) {
        return Err(ExportError::InvalidStep(step));
    }
    let samples = (0_u64..)
        .map(|i| begin + i as f64 * step)
        .take_while(|&t| t < end)
        .map(|t| {
            let [x, y, z] = body.position(t);
            BodySample { t, x, y, z }
        })
        .collect();
    Ok(samples)
}

pub fn write_flight_trace(path: &Path, points: &[TracePoint]) -> Result<(), ExportError> {
    write_rows(path, points)
}

pub fn write_body_trace(path: &Path, samples: &[BodySample]) -> Result<(), ExportError> {
    write_rows(path, samples)
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(writer_for_path(path)?);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
