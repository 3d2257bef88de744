use serde::{Deserialize, Serialize};

/// Gating condition on a region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Hazard {
    #[default]
    None,
    /// Wait lockout. `cooldown_end` is a millisecond timestamp, 0 until armed.
    Time {
        seconds: u32,
        #[serde(rename = "cooldownEnd")]
        cooldown_end: u64,
    },
    /// Travel in needs a shield module of at least this level.
    Shield { required: u32 },
}

impl Hazard {
    pub fn is_hazard(&self) -> bool {
        !matches!(self, Hazard::None)
    }

    /// True while a time lockout is running.
    pub fn cooldown_active(&self, now: u64) -> bool {
        match self {
            Hazard::Time { cooldown_end, .. } => now < *cooldown_end,
            Hazard::None | Hazard::Shield { .. } => false,
        }
    }

    pub fn shield_requirement(&self) -> Option<u32> {
        match self {
            Hazard::Shield { required } => Some(*required),
            Hazard::None | Hazard::Time { .. } => None,
        }
    }

    /// Whether a ship with this shield level may enter.
    pub fn admits_shield(&self, shield_level: u32) -> bool {
        self.shield_requirement()
            .map_or(true, |required| shield_level >= required)
    }

    /// Re-arm an expired time lockout. Returns true if it was re-armed.
    pub fn rearm(&mut self, now: u64) -> bool {
        match self {
            Hazard::Time {
                seconds,
                cooldown_end,
            } if *cooldown_end < now => {
                *cooldown_end = now + u64::from(*seconds) * 1000;
                true
            }
            Hazard::None | Hazard::Time { .. } | Hazard::Shield { .. } => false,
        }
    }

    pub fn remaining_seconds(&self, now: u64) -> u64 {
        match self {
            Hazard::Time { cooldown_end, .. } => cooldown_end.saturating_sub(now).div_ceil(1000),
            Hazard::None | Hazard::Shield { .. } => 0,
        }
    }
}

pub fn hazard_label(hazard: &Hazard, now: u64) -> String {
    match hazard {
        Hazard::None => "None".to_string(),
        Hazard::Time { .. } => format!("Time wait {}s", hazard.remaining_seconds(now)),
        Hazard::Shield { required } => format!("Shield L{required}"),
    }
}
