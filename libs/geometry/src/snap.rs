//! Snapping utilities (eg. conversion to a database-unit grid).

/// Converts a micrometre coordinate to the nearest integer multiple of `dbu`.
///
/// # Examples
///
/// ```
/// use geometry::snap::to_dbu;
///
/// assert_eq!(to_dbu(1.2345, 0.001), 1235);
/// assert_eq!(to_dbu(-0.0004, 0.001), 0);
/// ```
pub fn to_dbu(pos: f64, dbu: f64) -> i64 {
    assert!(dbu > 0.);
    (pos / dbu).round() as i64
}

/// Snaps `pos` to the nearest multiple of `grid`, returning micrometres.
pub fn snap_to_grid(pos: f64, grid: f64) -> f64 {
    to_dbu(pos, grid) as f64 * grid
}
