use crate::numerical::mathfn::{normal_tail, quadratic_plus};

#[test]
fn test_quadratic_plus_roots() {
    //x^2 - 5x + 6 = 0 has roots 2 and 3; the positive branch is 3
    let x = quadratic_plus(1.0, -5.0, 6.0);
    assert!((x - 3.0).abs() < 1e-12);

    //degenerate linear case: 2x - 8 = 0
    let x = quadratic_plus(0.0, 2.0, -8.0);
    assert!((x - 4.0).abs() < 1e-12);

    //no real root
    let x = quadratic_plus(1.0, 0.0, 1.0);
    assert!(x.is_nan());
}

#[test]
fn test_quadratic_plus_inverts_trapezoid() {
    //A trapezoidal channel with bw = 2 and z = 1 at depth 0.8 has
    //cross-section area (bw + z*h)*h; the positive quadratic root
    //must recover the depth from the area
    let bw = 2.0;
    let z = 1.0;
    let h = 0.8;
    let area = (bw + z * h) * h;
    let recovered = quadratic_plus(z, bw, -area);
    assert!((recovered - h).abs() < 1e-12);
}

#[test]
fn test_normal_tail_values() {
    //at y = 0 the approximation gives the half split
    let p = normal_tail(0.0);
    assert!((p - 0.5).abs() < 0.01);

    //far into the distribution nearly everything is below
    let p = normal_tail(5.0);
    assert!(p > 0.999);

    //reference value: the cumulative probability at 0.877 is about
    //0.8097, so the complement is about 0.190
    let p = 1.0 - normal_tail(0.877);
    assert!((p - 0.190).abs() < 0.005);
}
