use crate::common::config::GapSettings;
use crate::sys::geometry::{Point, Rect, Round, Size};

/// Usable area of a monitor once outer gaps are taken off.
pub fn compute_tiling_area(screen: Rect, gaps: &GapSettings) -> Rect {
    let outer = &gaps.outer;
    if outer.top == 0.0 && outer.left == 0.0 && outer.bottom == 0.0 && outer.right == 0.0 {
        return screen;
    }
    Rect::new(
        Point::new(screen.origin.x + outer.left, screen.origin.y + outer.top),
        Size::new(
            (screen.size.width - outer.left - outer.right).max(0.0),
            (screen.size.height - outer.top - outer.bottom).max(0.0),
        ),
    )
    .round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::OuterGaps;

    #[test]
    fn subtracts_outer_gaps() {
        let screen = Rect::from_xywh(0.0, 25.0, 1920.0, 1055.0);
        assert_eq!(compute_tiling_area(screen, &GapSettings::default()), screen);

        let gaps = GapSettings {
            outer: OuterGaps {
                top: 8.0,
                left: 10.0,
                bottom: 8.0,
                right: 10.0,
            },
            ..Default::default()
        };
        assert_eq!(
            compute_tiling_area(screen, &gaps),
            Rect::from_xywh(10.0, 33.0, 1900.0, 1039.0)
        );
    }

    #[test]
    fn never_goes_negative() {
        let gaps = GapSettings {
            outer: OuterGaps {
                left: 600.0,
                right: 600.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let area = compute_tiling_area(Rect::from_xywh(0.0, 0.0, 1000.0, 500.0), &gaps);
        assert_eq!(area.size.width, 0.0);
    }
}
