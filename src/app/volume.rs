//! Volume slider: level 0-100, speech volume 0.0-1.0, and the matching icon.

use crate::error::{MemeError, MemeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeIcon {
    Muted,
    Low,
    Medium,
    High,
}

impl VolumeIcon {
    pub fn for_level(level: u8) -> Self {
        match level {
            0 => VolumeIcon::Muted,
            1..=33 => VolumeIcon::Low,
            34..=66 => VolumeIcon::Medium,
            _ => VolumeIcon::High,
        }
    }

    /// Icon asset name, `volume-level-0` through `volume-level-3`.
    pub fn asset(self) -> &'static str {
        match self {
            VolumeIcon::Muted => "volume-level-0",
            VolumeIcon::Low => "volume-level-1",
            VolumeIcon::Medium => "volume-level-2",
            VolumeIcon::High => "volume-level-3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeSlider {
    level: u8,
}

impl Default for VolumeSlider {
    fn default() -> Self {
        Self { level: 100 }
    }
}

impl VolumeSlider {
    pub fn new(level: u8) -> MemeResult<Self> {
        let mut slider = Self::default();
        slider.set_level(level)?;
        Ok(slider)
    }

    pub fn set_level(&mut self, level: u8) -> MemeResult<VolumeIcon> {
        if level > 100 {
            return Err(MemeError::validation(
                "volume",
                "must be between 0 and 100",
                level.to_string(),
            ));
        }
        self.level = level;
        Ok(self.icon())
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn volume(&self) -> f32 {
        self.level as f32 / 100.0
    }

    pub fn icon(&self) -> VolumeIcon {
        VolumeIcon::for_level(self.level)
    }
}
