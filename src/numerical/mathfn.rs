use libm::{exp, pow};

/// Positive root of a*x^2 + b*x + c = 0. Returns NaN when there is no
/// real root. Used to invert the trapezoidal stage-area relation.
pub fn quadratic_plus(a: f64, b: f64, c: f64) -> f64 {
    let d = b * b - 4.0 * a * c;
    if d < 0f64 {
        f64::NAN
    } else if a == 0f64 {
        -c / b
    } else {
        (-b + d.sqrt()) / (2.0 * a)
    }
}

/// Upper-tail probability of the standard normal distribution,
/// approximated with the three-term polynomial of Abramowitz and
/// Stegun (1972), eq. 26.2.16. The argument is the (non-negative)
/// upper limit of integration.
pub fn normal_tail(y: f64) -> f64 {
    let yy = y.abs();
    //standard normal density at yy
    let fy = (1.0 / pow(2.0 * std::f64::consts::PI, 0.5)) * exp(-0.5 * yy * yy);
    //rational argument of the polynomial
    let xy = 1.0 / (1.0 + 0.3327 * yy);
    1.0 - fy * (0.4362 * xy - 0.1202 * xy * xy + 0.9373 * xy * xy * xy)
}
