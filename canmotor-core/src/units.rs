//! Conversão entre unidades do dispositivo e unidades físicas
//!
//! Posição: `physical = raw / scale`. Velocidade: o dispositivo reporta
//! taxa por minuto (RPM) e o chamador trabalha por segundo, então a
//! conversão de velocidade aplica também o fator fixo [`SECONDS_PER_MINUTE`].

use serde::{Deserialize, Serialize};
use crate::error::{MotorError, MotorResult};
use crate::types::ControlMode;

/// Normalização fixa minuto ↔ segundo
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Grandeza escalada por um fator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionDomain {
    Position,
    Velocity,
}

/// Fator de conversão e a grandeza que ele escala
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionFactor {
    pub scale: f64,
    pub domain: ConversionDomain,
}

impl ConversionFactor {
    /// Fator de posição (contagens por unidade física)
    pub fn position(scale: f64) -> Self {
        Self { scale, domain: ConversionDomain::Position }
    }

    /// Fator de velocidade (contagens por unidade física)
    pub fn velocity(scale: f64) -> Self {
        Self { scale, domain: ConversionDomain::Velocity }
    }

    /// Rejeita escalas não positivas ou não finitas
    pub fn validate(&self) -> MotorResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(MotorError::InvalidConfig(format!(
                "{:?} conversion factor must be finite and positive, got {}",
                self.domain, self.scale
            )));
        }
        Ok(())
    }
}

/// Contagens → unidade física
#[inline]
pub fn to_physical(raw: f64, scale: f64) -> f64 {
    raw / scale
}

/// Unidade física → contagens
#[inline]
pub fn to_raw(physical: f64, scale: f64) -> f64 {
    physical * scale
}

/// Taxa bruta por minuto → taxa física por segundo
#[inline]
pub fn velocity_to_physical(raw_per_minute: f64, scale: f64) -> f64 {
    raw_per_minute / scale / SECONDS_PER_MINUTE
}

/// Taxa física por segundo → taxa bruta por minuto
#[inline]
pub fn velocity_to_raw(physical_per_second: f64, scale: f64) -> f64 {
    physical_per_second * scale * SECONDS_PER_MINUTE
}

/// Par de fatores (posição, velocidade), ajustáveis de forma independente
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitConverter {
    pub position_scale: f64,
    pub velocity_scale: f64,
}

impl UnitConverter {
    /// Cria conversor com as duas escalas
    pub fn new(position_scale: f64, velocity_scale: f64) -> Self {
        Self { position_scale, velocity_scale }
    }

    /// Aplica um fator após validação
    pub fn set_factor(&mut self, factor: ConversionFactor) -> MotorResult<()> {
        factor.validate()?;
        match factor.domain {
            ConversionDomain::Position => self.position_scale = factor.scale,
            ConversionDomain::Velocity => self.velocity_scale = factor.scale,
        }
        Ok(())
    }

    /// Retorna escala de um domínio
    pub fn scale(&self, domain: ConversionDomain) -> f64 {
        match domain {
            ConversionDomain::Position => self.position_scale,
            ConversionDomain::Velocity => self.velocity_scale,
        }
    }

    /// Posição bruta → física
    pub fn position_to_physical(&self, raw: f64) -> f64 {
        to_physical(raw, self.position_scale)
    }

    /// Posição física → bruta
    pub fn position_to_raw(&self, physical: f64) -> f64 {
        to_raw(physical, self.position_scale)
    }

    /// Velocidade bruta (por minuto) → física (por segundo)
    pub fn velocity_to_physical(&self, raw_per_minute: f64) -> f64 {
        velocity_to_physical(raw_per_minute, self.velocity_scale)
    }

    /// Velocidade física (por segundo) → bruta (por minuto)
    pub fn velocity_to_raw(&self, physical_per_second: f64) -> f64 {
        velocity_to_raw(physical_per_second, self.velocity_scale)
    }

    /// Converte a demanda de um comando para unidades do dispositivo.
    /// Modos em malha aberta passam inalterados.
    pub fn demand_to_raw(&self, mode: ControlMode, demand: f64) -> f64 {
        if mode.is_position() {
            self.position_to_raw(demand)
        } else if mode.is_velocity() {
            self.velocity_to_raw(demand)
        } else {
            demand
        }
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}
