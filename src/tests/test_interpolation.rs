use crate::numerical::interpolation::{lerp, lerp_segment};

#[test]
fn test_lerp_interior() {
    let x = vec![0.0, 1.0, 2.0];
    let y = vec![0.0, 10.0, 30.0];
    assert!((lerp(&x, &y, 0.5) - 5.0).abs() < 1e-12);
    assert!((lerp(&x, &y, 1.5) - 20.0).abs() < 1e-12);
    assert!((lerp(&x, &y, 1.0) - 10.0).abs() < 1e-12);
}

#[test]
fn test_lerp_clamps_outside_range() {
    let x = vec![1.0, 2.0];
    let y = vec![5.0, 7.0];
    assert_eq!(lerp(&x, &y, 0.0), 5.0);
    assert_eq!(lerp(&x, &y, 3.0), 7.0);
}

#[test]
fn test_lerp_single_point() {
    assert_eq!(lerp(&[2.0], &[9.0], 100.0), 9.0);
}

#[test]
fn test_lerp_segment_zero_width() {
    assert_eq!(lerp_segment(1.0, 4.0, 1.0, 8.0, 1.0), 4.0);
}
