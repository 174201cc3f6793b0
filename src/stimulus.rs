//! Per-frame description of what to show.
//!
//! Angles are degrees of visual angle; luminance and colour are unit-range
//! gains. A [`FrameSpec`] is rebuilt by the caller every frame and never
//! stored by the renderer.

use crate::error::SpecError;
use crate::mesh::ShapeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    pub fn index(self) -> usize {
        match self {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }
}

/// Which eye(s) a slot is drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EyeTarget {
    Left,
    Right,
    #[default]
    Both,
}

impl EyeTarget {
    /// Codes 0, 1 and 2 for left, right and both.
    pub fn from_code(code: i32) -> Result<Self, SpecError> {
        match code {
            0 => Ok(EyeTarget::Left),
            1 => Ok(EyeTarget::Right),
            2 => Ok(EyeTarget::Both),
            other => Err(SpecError::EyeCode(other)),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            EyeTarget::Left => 0,
            EyeTarget::Right => 1,
            EyeTarget::Both => 2,
        }
    }

    pub fn includes(self, eye: Eye) -> bool {
        match self {
            EyeTarget::Both => true,
            EyeTarget::Left => eye == Eye::Left,
            EyeTarget::Right => eye == Eye::Right,
        }
    }
}

/// The three independently parameterized things on screen, in paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Background,
    Fixation,
    Stimulus,
}

impl Slot {
    pub const PAINT_ORDER: [Slot; 3] = [Slot::Background, Slot::Fixation, Slot::Stimulus];

    pub fn label(self) -> &'static str {
        match self {
            Slot::Background => "background",
            Slot::Fixation => "fixation",
            Slot::Stimulus => "stimulus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StimulusSpec {
    pub eye: EyeTarget,
    pub kind: ShapeKind,
    /// Center (x, y) in degrees.
    pub center: [f32; 2],
    /// Extent (x, y) in degrees.
    pub size: [f32; 2],
    /// Degrees, counter-clockwise.
    pub rotation: f32,
    pub luminance: f32,
    pub color: [f32; 3],
}

impl Default for StimulusSpec {
    fn default() -> Self {
        Self {
            eye: EyeTarget::Both,
            kind: ShapeKind::None,
            center: [0.0; 2],
            size: [0.0; 2],
            rotation: 0.0,
            luminance: 0.0,
            color: [1.0; 3],
        }
    }
}

impl StimulusSpec {
    /// Checks the ranges a perimetry client is allowed to send.
    ///
    /// The renderer itself draws anything; this is for callers that accept
    /// parameters from outside.
    pub fn validate(&self, slot: Slot) -> Result<(), SpecError> {
        let slot = slot.label();
        let finite = [
            ("center", self.center[0].is_finite() && self.center[1].is_finite()),
            ("size", self.size[0].is_finite() && self.size[1].is_finite()),
            ("rotation", self.rotation.is_finite()),
            ("luminance", self.luminance.is_finite()),
            ("color", self.color.iter().all(|c| c.is_finite())),
        ];
        if let Some(&(field, _)) = finite.iter().find(|(_, ok)| !ok) {
            return Err(SpecError::NotFinite { slot, field });
        }
        if !(0.0..=1.0).contains(&self.luminance) {
            return Err(SpecError::Luminance {
                slot,
                value: self.luminance,
            });
        }
        if let Some((channel, &value)) = self
            .color
            .iter()
            .enumerate()
            .find(|(_, c)| !(0.0..=1.0).contains(*c))
        {
            return Err(SpecError::Color {
                slot,
                channel,
                value,
            });
        }
        if !(0.0..360.0).contains(&self.rotation) {
            return Err(SpecError::Rotation {
                slot,
                value: self.rotation,
            });
        }
        Ok(())
    }
}

/// Everything drawn in one frame.
///
/// The background's geometric fields are ignored: it is always a square
/// filling the field of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSpec {
    pub background: StimulusSpec,
    pub fixation: StimulusSpec,
    pub stimulus: StimulusSpec,
}

impl Default for FrameSpec {
    /// Idle screen: dim white background, no fixation target, no stimulus.
    fn default() -> Self {
        Self {
            background: StimulusSpec {
                kind: ShapeKind::Square,
                luminance: 0.1,
                color: [1.0, 1.0, 1.0],
                ..Default::default()
            },
            fixation: StimulusSpec {
                luminance: 0.5,
                color: [0.0, 1.0, 0.0],
                ..Default::default()
            },
            stimulus: StimulusSpec::default(),
        }
    }
}

impl FrameSpec {
    pub fn slot(&self, slot: Slot) -> &StimulusSpec {
        match slot {
            Slot::Background => &self.background,
            Slot::Fixation => &self.fixation,
            Slot::Stimulus => &self.stimulus,
        }
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        Slot::PAINT_ORDER
            .iter()
            .try_for_each(|&slot| self.slot(slot).validate(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_targets() {
        assert!(EyeTarget::Both.includes(Eye::Left));
        assert!(EyeTarget::Both.includes(Eye::Right));
        assert!(EyeTarget::Left.includes(Eye::Left));
        assert!(!EyeTarget::Left.includes(Eye::Right));
        assert!(!EyeTarget::Right.includes(Eye::Left));
    }

    #[test]
    fn eye_codes() {
        for target in [EyeTarget::Left, EyeTarget::Right, EyeTarget::Both] {
            assert_eq!(EyeTarget::from_code(target.code()), Ok(target));
        }
        assert_eq!(EyeTarget::from_code(3), Err(SpecError::EyeCode(3)));
    }

    #[test]
    fn default_frame_is_valid() {
        assert_eq!(FrameSpec::default().validate(), Ok(()));
    }

    #[test]
    fn validation_rejects_out_of_range() {
        let spec = StimulusSpec {
            luminance: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            spec.validate(Slot::Stimulus),
            Err(SpecError::Luminance { slot: "stimulus", .. })
        ));

        let spec = StimulusSpec {
            color: [0.5, -0.1, 0.0],
            ..Default::default()
        };
        assert!(matches!(
            spec.validate(Slot::Fixation),
            Err(SpecError::Color { channel: 1, .. })
        ));

        let spec = StimulusSpec {
            rotation: 360.0,
            ..Default::default()
        };
        assert!(matches!(
            spec.validate(Slot::Stimulus),
            Err(SpecError::Rotation { .. })
        ));

        let spec = StimulusSpec {
            center: [f32::NAN, 0.0],
            ..Default::default()
        };
        assert!(matches!(
            spec.validate(Slot::Stimulus),
            Err(SpecError::NotFinite { field: "center", .. })
        ));
    }
}
