//! Scripted angle sequences for state machine scenarios

use formcoach_core::SessionTime;
use formcoach_pose::AngleSet;

/// Clean-form angles at a hip-knee-vertical angle
pub fn clean_angles(hip_knee_vertical: i32) -> AngleSet {
    AngleSet::new(hip_knee_vertical, 30, 120, 20, 10)
}

/// A frame-by-frame script of angle sets; `None` is an incomplete frame
#[derive(Clone, Debug, Default)]
pub struct AngleScript {
    fps: u32,
    steps: Vec<Option<AngleSet>>,
}

impl AngleScript {
    pub fn new(fps: u32) -> Self {
        AngleScript {
            fps: fps.max(1),
            steps: Vec::new(),
        }
    }

    /// Repeat an angle set for `frames` frames
    pub fn angles(mut self, angles: AngleSet, frames: usize) -> Self {
        self.steps.extend(std::iter::repeat(Some(angles)).take(frames));
        self
    }

    /// Clean form held at a hip-knee-vertical angle
    pub fn hold(self, hip_knee_vertical: i32, frames: usize) -> Self {
        self.angles(clean_angles(hip_knee_vertical), frames)
    }

    /// Clean form through a list of hip-knee-vertical angles
    pub fn sweep(mut self, angles: &[i32], frames_each: usize) -> Self {
        for angle in angles {
            self = self.hold(*angle, frames_each);
        }
        self
    }

    /// Normal → transition → pass → transition → normal
    pub fn clean_rep(self, frames_each: usize) -> Self {
        self.sweep(&[10, 50, 80, 50, 10], frames_each)
    }

    /// Incomplete frames
    pub fn dropout(mut self, frames: usize) -> Self {
        self.steps.extend(std::iter::repeat(None).take(frames));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Timestamp of a frame index
    pub fn time_of(&self, index: usize) -> SessionTime {
        SessionTime::from_micros(index as i64 * 1_000_000 / self.fps as i64)
    }

    /// Timestamped steps
    pub fn iter(&self) -> impl Iterator<Item = (SessionTime, Option<AngleSet>)> + '_ {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| (self.time_of(i), *step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_layout() {
        let script = AngleScript::new(30).clean_rep(10).dropout(5).hold(10, 3);

        assert_eq!(script.len(), 58);
        let steps: Vec<_> = script.iter().collect();
        assert_eq!(steps[0].1.map(|a| a.hip_knee_vertical), Some(10));
        assert_eq!(steps[20].1.map(|a| a.hip_knee_vertical), Some(80));
        assert!(steps[50..55].iter().all(|(_, a)| a.is_none()));
        assert_eq!(steps[30].0, SessionTime::from_secs_f64(1.0));
    }
}
