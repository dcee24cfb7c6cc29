//! Configuração de controlador em TOML
//!
//! ```toml
//! name = "elevator"
//! idle_mode = "brake"
//! position_factor = 2048.0
//! selected_slot = 0
//!
//! [device]
//! family = "talon_fx"
//! can_id = 12
//! bus = "canivore"
//!
//! [simulation]
//! response_time_factor = 9.0
//! counts_per_revolution = 1.0
//!
//! [[slots]]
//! slot = 0
//! p = 0.8
//! d = 0.05
//! max_velocity = 3.0
//! max_acceleration = 6.0
//! tolerance = 0.01
//! ```

use std::path::Path;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::clock::Clock;
use crate::controller::MotorController;
use crate::error::{MotorError, MotorResult};
use crate::factory::{BackendFactory, DeviceSpec};
use crate::sim::SimConfig;
use crate::types::{IdleMode, ProfileConstraints};
use crate::units::ConversionFactor;

/// Ganhos e perfil de um slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotConfig {
    pub slot: u8,
    #[serde(default)]
    pub p: f64,
    #[serde(default)]
    pub i: f64,
    #[serde(default)]
    pub d: f64,
    #[serde(default)]
    pub f: f64,
    #[serde(default)]
    pub max_velocity: Option<f64>,
    #[serde(default)]
    pub max_acceleration: Option<f64>,
    #[serde(default)]
    pub tolerance: Option<f64>,
}

impl SlotConfig {
    /// Perfil completo, ou nenhum; parcial é erro
    pub fn profile(&self) -> MotorResult<Option<ProfileConstraints>> {
        match (self.max_velocity, self.max_acceleration, self.tolerance) {
            (None, None, None) => Ok(None),
            (Some(max_velocity), Some(max_acceleration), tolerance) => Ok(Some(ProfileConstraints {
                max_velocity,
                max_acceleration,
                tolerance: tolerance.unwrap_or(0.0),
            })),
            _ => Err(MotorError::InvalidConfig(format!(
                "slot {}: max_velocity and max_acceleration must be given together",
                self.slot
            ))),
        }
    }
}

/// Configuração completa de um controlador
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub name: String,
    pub device: DeviceSpec,
    /// Presente = controlador simulado
    #[serde(default)]
    pub simulation: Option<SimConfig>,
    #[serde(default)]
    pub idle_mode: IdleMode,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default = "default_factor")]
    pub position_factor: f64,
    #[serde(default = "default_factor")]
    pub velocity_factor: f64,
    #[serde(default)]
    pub selected_slot: u8,
    #[serde(default)]
    pub slots: Vec<SlotConfig>,
}

fn default_factor() -> f64 {
    1.0
}

impl ControllerConfig {
    /// Configuração mínima para um dispositivo
    pub fn new(name: &str, device: DeviceSpec) -> Self {
        Self {
            name: name.to_string(),
            device,
            simulation: None,
            idle_mode: IdleMode::default(),
            inverted: false,
            position_factor: default_factor(),
            velocity_factor: default_factor(),
            selected_slot: 0,
            slots: Vec::new(),
        }
    }

    /// Lê configuração de texto TOML
    pub fn from_str(content: &str) -> MotorResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Lê configuração de um arquivo TOML
    pub fn from_file(path: &Path) -> MotorResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MotorError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_str(&content)
    }

    /// Serializa para TOML
    pub fn to_string(&self) -> MotorResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| MotorError::ConfigParse(format!("Failed to serialize config: {}", e)))
    }
}

impl MotorController {
    /// Constrói o controlador e aplica toda a configuração, persistindo no
    /// dispositivo uma única vez ao final
    pub fn from_config(
        factory: &dyn BackendFactory,
        config: &ControllerConfig,
        clock: Arc<dyn Clock>,
    ) -> MotorResult<Self> {
        let sim = config.simulation.map(|sim| (sim, clock));
        let mut controller = MotorController::build(factory, &config.name, &config.device, sim)?;

        controller.set_conversion_factor(ConversionFactor::position(config.position_factor))?;
        controller.set_conversion_factor(ConversionFactor::velocity(config.velocity_factor))?;
        controller.set_idle_mode(config.idle_mode)?;
        controller.set_inverted(config.inverted)?;

        for slot in &config.slots {
            let profile = slot.profile()?;
            let device = controller.device_mut();
            device.configure_gains(slot.slot, slot.p, slot.i, slot.d, slot.f)?;
            if let Some(profile) = profile {
                device.configure_profile(
                    slot.slot,
                    profile.max_velocity,
                    profile.max_acceleration,
                    profile.tolerance,
                )?;
            }
        }
        controller.select_profile_slot(config.selected_slot)?;
        controller.no_reset_but_update_config()?;

        info!(
            name = %config.name,
            family = %config.device.family,
            can_id = config.device.can_id,
            slots = config.slots.len(),
            "controller configured"
        );
        Ok(controller)
    }
}
