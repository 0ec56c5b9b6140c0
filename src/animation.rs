use crate::board::PieceId;
use crate::geometry::Point;
use std::time::Duration;

/// Interval between two animation frames.
pub const TICK: Duration = Duration::from_millis(15);

/// Pixels travelled per tick.
pub const SPEED: f64 = 30.0;

/// Result of advancing an animation by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    Moving(Point),
    /// Final frame, exactly on the target.
    Arrived(Point),
}

impl Frame {
    pub fn point(&self) -> Point {
        match *self {
            Frame::Moving(p) | Frame::Arrived(p) => p,
        }
    }
}

/// Straight-line motion of one piece at constant speed.
///
/// The piece advances `speed` pixels per tick along the angle from `from` to
/// `to`. On the tick where its travel along the dominant axis would reach or
/// pass the target it lands exactly on `to` instead of overshooting.
#[derive(Debug, Clone)]
pub struct Animation {
    piece: PieceId,
    from: Point,
    to: Point,
    step: (f64, f64),
    travelled: f64,
    done: bool,
}

impl Animation {
    pub fn new(piece: PieceId, from: Point, to: Point, speed: f64) -> Self {
        let angle = (to.y - from.y).atan2(to.x - from.x);
        Self {
            piece,
            from,
            to,
            step: (speed * angle.cos(), speed * angle.sin()),
            travelled: 0.0,
            done: false,
        }
    }

    pub fn piece(&self) -> PieceId {
        self.piece
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Distance to cover along the dominant axis and the per-tick progress on it.
    fn dominant(&self) -> (f64, f64) {
        let (dx, dy) = (self.to.x - self.from.x, self.to.y - self.from.y);
        if dx.abs() >= dy.abs() {
            (dx.abs(), self.step.0.abs())
        } else {
            (dy.abs(), self.step.1.abs())
        }
    }

    pub fn tick(&mut self) -> Frame {
        if self.done {
            return Frame::Arrived(self.to);
        }
        let (distance, per_tick) = self.dominant();
        let next = self.travelled + 1.0;
        if next * per_tick >= distance {
            self.done = true;
            return Frame::Arrived(self.to);
        }
        self.travelled = next;
        Frame::Moving(Point::new(
            self.from.x + self.step.0 * next,
            self.from.y + self.step.1 * next,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PieceId;

    fn piece() -> PieceId {
        // ids are opaque outside the board; any resting piece will do
        let rules = crate::game_repr::Rules::default();
        let board = crate::board::Board::from_rules(
            &rules,
            Default::default(),
            Box::new(crate::renderer::NullRenderer),
        );
        board.occupant(chess::Square::E2).unwrap()
    }

    fn run(anim: &mut Animation) -> Vec<Frame> {
        let mut frames = Vec::new();
        loop {
            let frame = anim.tick();
            frames.push(frame);
            if let Frame::Arrived(_) = frame {
                return frames;
            }
        }
    }

    #[test]
    fn test_horizontal_motion_snaps_to_target() {
        let mut anim = Animation::new(piece(), Point::new(0.0, 0.0), Point::new(100.0, 0.0), SPEED);
        let frames = run(&mut anim);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], Frame::Moving(Point::new(30.0, 0.0)));
        assert_eq!(frames[2], Frame::Moving(Point::new(90.0, 0.0)));
        assert_eq!(frames[3], Frame::Arrived(Point::new(100.0, 0.0)));
        assert!(anim.is_done());
    }

    #[test]
    fn test_exact_multiple_does_not_overshoot() {
        let mut anim = Animation::new(piece(), Point::new(0.0, 0.0), Point::new(0.0, -90.0), SPEED);
        let frames = run(&mut anim);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames.last(), Some(&Frame::Arrived(Point::new(0.0, -90.0))));
        for frame in &frames {
            assert!(frame.point().y >= -90.0);
        }
    }

    #[test]
    fn test_diagonal_follows_the_line() {
        let from = Point::new(400.0, 80.0);
        let to = Point::new(0.0, 480.0);
        let mut anim = Animation::new(piece(), from, to, SPEED);
        for frame in run(&mut anim) {
            let p = frame.point();
            assert!((p.x - from.x + (p.y - from.y)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_distance_arrives_immediately() {
        let p = Point::new(5.0, 5.0);
        let mut anim = Animation::new(piece(), p, p, SPEED);
        assert_eq!(anim.tick(), Frame::Arrived(p));
        assert_eq!(anim.tick(), Frame::Arrived(p));
    }
}
