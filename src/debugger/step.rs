/// How the debuggee proceeds after a resume.
///
/// Modes other than `Continue` are paired with the frame depth captured when
/// the mode was set; the pause predicate compares the current depth against
/// it, which keeps the semantics stable across both calls and returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepMode {
    /// Run until a breakpoint.
    #[default]
    Continue,
    /// Pause at the next steppable statement, at any depth.
    StepInto,
    /// Pause at the next statement at the captured depth or shallower.
    StepOver,
    /// Pause at the next statement strictly shallower than the captured depth.
    StepOut,
}

impl StepMode {
    pub fn should_pause(self, depth: usize, step_depth: usize) -> bool {
        match self {
            StepMode::Continue => false,
            StepMode::StepInto => true,
            StepMode::StepOver => depth <= step_depth,
            StepMode::StepOut => depth < step_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_over_skips_deeper_frames() {
        assert!(!StepMode::StepOver.should_pause(3, 2));
        assert!(StepMode::StepOver.should_pause(2, 2));
        assert!(StepMode::StepOver.should_pause(1, 2));
    }

    #[test]
    fn step_out_requires_strict_shallowing() {
        assert!(!StepMode::StepOut.should_pause(2, 2));
        assert!(StepMode::StepOut.should_pause(1, 2));
    }

    #[test]
    fn step_into_ignores_depth() {
        assert!(StepMode::StepInto.should_pause(9, 1));
        assert!(!StepMode::Continue.should_pause(1, 9));
    }
}
