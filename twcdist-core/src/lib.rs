// Modules
pub mod clustering;
pub mod color;
pub mod data;
pub mod io;
pub mod plot;
pub mod prelude;
pub mod simdata;
pub mod stats;
pub mod utils;

#[cfg(test)]
#[macro_export]
macro_rules! assert_float_eq {
    ($lhs: expr, $rhs: expr) => {
        let (a, b): (f64, f64) = ($lhs, $rhs);
        assert!((a - b).abs() < f64::EPSILON, "{a} != {b}")
    };
    ($lhs: expr, $rhs: expr, $tol: expr) => {
        let (a, b, tol): (f64, f64, f64) = ($lhs, $rhs, $tol);
        assert!((a - b).abs() < tol, "{a} != {b} (tolerance {tol})")
    };
}
