use crate::math::Point2d;
#[cfg(feature = "debug")]
use crate::octagon::SafetyOctagon;
#[cfg(feature = "debug")]
use serde_json::json;

#[cfg(feature = "debug")]
thread_local!(
    static DEBUG_FRAME: std::cell::RefCell<Vec<serde_json::Value>> = Default::default();
);

#[allow(unused)]
pub fn debug_point(name: &str, point: Point2d) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "point",
            "name": name,
            "point": [point.x, point.y],
        }))
    })
}

#[cfg(feature = "debug")]
pub fn debug_octagon(name: &str, octagon: &SafetyOctagon) {
    let points = octagon
        .vertices()
        .iter()
        .map(|v| [v.x, v.y])
        .collect::<Vec<_>>();
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "polygon",
            "name": name,
            "points": points,
            "heading": octagon.relative_heading(),
        }))
    })
}

/// Takes everything recorded on this thread since the last call.
#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    json!(DEBUG_FRAME.with(|frame| frame.take()))
}

#[cfg(all(test, feature = "debug"))]
mod test {
    use super::*;
    use crate::footprint::Footprint;

    #[test]
    fn frame_is_taken() {
        let car = Footprint::default();
        let octagon = SafetyOctagon::build(&car, &car, 0.0).unwrap();
        debug_point("neighbour", Point2d::new(1.0, 2.0));
        debug_octagon("octagon", &octagon);
        let frame = take_debug_frame();
        assert_eq!(frame[0]["type"], "point");
        assert_eq!(frame[1]["points"].as_array().unwrap().len(), 8);
        assert_eq!(take_debug_frame(), json!([]));
    }
}
