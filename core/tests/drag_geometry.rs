use machipin_core::{
    corrected_drop_point, pan_vector, EdgePanConfig, ScreenPoint, DRAG_OFFSET_Y_POINTER,
    DRAG_OFFSET_Y_TOUCH,
};

#[test]
fn touch_drop_point_uses_the_larger_offset() {
    let raw = ScreenPoint::new(120.0, 480.0);
    let corrected = corrected_drop_point(raw, true);
    assert_eq!(corrected.y, 480.0 - DRAG_OFFSET_Y_TOUCH);
    assert_eq!(corrected.x, raw.x);
}

#[test]
fn pointer_drop_point_uses_the_smaller_offset() {
    let raw = ScreenPoint::new(400.0, 300.0);
    let corrected = corrected_drop_point(raw, false);
    assert_eq!(corrected, ScreenPoint::new(400.0, 300.0 - DRAG_OFFSET_Y_POINTER));
}

#[test]
fn pan_vector_is_none_in_the_viewport_interior() {
    let config = EdgePanConfig::default();
    for (x, y) in [(60.0, 60.0), (750.0, 550.0), (400.0, 300.0)] {
        assert_eq!(pan_vector(x, y, 800.0, 600.0, &config), None, "at ({x},{y})");
    }
}

#[test]
fn pan_vector_points_toward_the_nearest_edge() {
    let config = EdgePanConfig::default();

    let left = pan_vector(10.0, 300.0, 800.0, 600.0, &config).unwrap();
    assert!(left.x < 0.0 && left.y == 0.0);

    let right = pan_vector(790.0, 300.0, 800.0, 600.0, &config).unwrap();
    assert!(right.x > 0.0 && right.y == 0.0);

    let top = pan_vector(400.0, 10.0, 800.0, 600.0, &config).unwrap();
    assert!(top.y < 0.0 && top.x == 0.0);

    let bottom = pan_vector(400.0, 590.0, 800.0, 600.0, &config).unwrap();
    assert!(bottom.y > 0.0 && bottom.x == 0.0);
}

#[test]
fn corner_pans_on_both_axes() {
    let config = EdgePanConfig::default();
    let v = pan_vector(5.0, 5.0, 800.0, 600.0, &config).unwrap();
    assert!(v.x < 0.0 && v.y < 0.0);
}

#[test]
fn speed_never_exceeds_the_cap() {
    let config = EdgePanConfig::default();
    for x in [-500.0, -50.0, 0.0, 1.0, 49.0] {
        let v = pan_vector(x, 300.0, 800.0, 600.0, &config).unwrap();
        assert!(v.x.abs() <= config.max_speed, "x={x} -> {}", v.x);
    }
}
