// src/python.rs
use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::BTreeMap;

use crate::event::{Game, RawEvent};
use crate::hand::SEATS;
use crate::meld::decode_meld;
use crate::reshaper::{reshape_with_rule, Reshaped};
use crate::rule::ReshapeRule;
use crate::tiles::{try_tile_id, RAW_TILE_COUNT};

/// Canonical id of one raw tile index (1..=136).
#[pyfunction]
#[pyo3(name = "tile_id")]
fn tile_id_py(raw: u8) -> PyResult<u8> {
    Ok(try_tile_id(raw, "<python>", "tile_id")?)
}

/// Vectorised `tile_id` over a uint8 array.
#[pyfunction]
fn tile_ids<'py>(
    py: Python<'py>,
    raw: PyReadonlyArray1<'py, u8>,
) -> PyResult<Bound<'py, PyArray1<u8>>> {
    let ids = raw
        .as_slice()?
        .iter()
        .map(|&r| try_tile_id(r, "<python>", "tile_ids"))
        .collect::<Result<Vec<u8>, _>>()?;
    Ok(ids.into_pyarray_bound(py))
}

/// "chi", "pon", "kan", "kakan", or None for an unknown pattern.
#[pyfunction]
#[pyo3(name = "decode_meld")]
fn decode_meld_py(bits: u32) -> Option<&'static str> {
    decode_meld(bits).map(|call| call.as_str())
}

fn build_game(log_id: &str, events: Vec<(String, BTreeMap<String, String>)>) -> Game {
    let events = events
        .into_iter()
        .map(|(tag, attrs)| RawEvent { tag, attrs })
        .collect();
    Game::new(log_id, events)
}

fn run(
    log_id: &str,
    events: Vec<(String, BTreeMap<String, String>)>,
    rule: Option<ReshapeRule>,
) -> PyResult<Reshaped> {
    let game = build_game(log_id, events);
    reshape_with_rule(&game, &rule.unwrap_or_default())
        .map_err(|failure| PyValueError::new_err(failure.to_string()))
}

/// Reshapes one game given as a list of `(tag, attributes)` pairs.
///
/// Returns the reshaped game as a JSON string. Per-event problems are logged
/// and skipped; a broken hand lifecycle raises `ValueError`.
#[pyfunction]
#[pyo3(signature = (log_id, events, rule=None))]
fn reshape_game(
    log_id: &str,
    events: Vec<(String, BTreeMap<String, String>)>,
    rule: Option<ReshapeRule>,
) -> PyResult<String> {
    let reshaped = run(log_id, events, rule)?;
    serde_json::to_string(&reshaped.game).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Per-hand score deltas as an `(n_hands, 4)` int32 array.
#[pyfunction]
#[pyo3(signature = (log_id, events, rule=None))]
fn hand_score_deltas<'py>(
    py: Python<'py>,
    log_id: &str,
    events: Vec<(String, BTreeMap<String, String>)>,
    rule: Option<ReshapeRule>,
) -> PyResult<Bound<'py, PyArray2<i32>>> {
    let reshaped = run(log_id, events, rule)?;
    let rows: Vec<Vec<i32>> = reshaped
        .game
        .hands()
        .map(|hand| hand.result.score_deltas.to_vec())
        .collect();
    if rows.is_empty() {
        return Ok(PyArray2::zeros_bound(py, (0, SEATS), false));
    }
    PyArray2::from_vec2_bound(py, &rows).map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pymodule]
fn tenhou_reshaper(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("RAW_TILE_COUNT", RAW_TILE_COUNT)?;
    m.add_class::<ReshapeRule>()?;
    m.add_function(wrap_pyfunction!(tile_id_py, m)?)?;
    m.add_function(wrap_pyfunction!(tile_ids, m)?)?;
    m.add_function(wrap_pyfunction!(decode_meld_py, m)?)?;
    m.add_function(wrap_pyfunction!(reshape_game, m)?)?;
    m.add_function(wrap_pyfunction!(hand_score_deltas, m)?)?;
    Ok(())
}
