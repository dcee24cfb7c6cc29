//! Seleção da família de dispositivo

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::backend::HardwareBackend;
use crate::error::{MotorError, MotorResult};

/// Maior ID válido no barramento CAN
pub const MAX_CAN_ID: u8 = 62;

/// Famílias de controladores suportadas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    SparkMax,
    SparkFlex,
    TalonFx,
    TalonSrx,
}

impl DeviceFamily {
    /// Número de slots de ganho do firmware
    pub fn gain_slot_count(&self) -> u8 {
        match self {
            DeviceFamily::SparkMax | DeviceFamily::SparkFlex => 4,
            DeviceFamily::TalonFx => 3,
            DeviceFamily::TalonSrx => 4,
        }
    }

    /// Apenas a família Talon FX aceita barramento nomeado
    pub fn supports_named_bus(&self) -> bool {
        matches!(self, DeviceFamily::TalonFx)
    }

    /// Famílias SPARK: encoder externo e tipo de motor configuráveis
    pub fn is_spark(&self) -> bool {
        matches!(self, DeviceFamily::SparkMax | DeviceFamily::SparkFlex)
    }
}

/// Tipo de motor ligado a um controlador SPARK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorType {
    #[default]
    Brushless,
    Brushed,
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceFamily::SparkMax => "SPARK MAX",
            DeviceFamily::SparkFlex => "SPARK Flex",
            DeviceFamily::TalonFx => "Talon FX",
            DeviceFamily::TalonSrx => "Talon SRX",
        };
        f.write_str(name)
    }
}

/// Identificação de um dispositivo no barramento
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub family: DeviceFamily,
    pub can_id: u8,
    /// Barramento nomeado (vazio = barramento padrão)
    #[serde(default)]
    pub bus: Option<String>,
    /// Encoder externo em vez do encoder integrado
    #[serde(default)]
    pub external_encoder: bool,
    /// Tipo de motor (só famílias SPARK); ausente = sem escova
    #[serde(default)]
    pub motor_type: Option<MotorType>,
}

impl DeviceSpec {
    /// Cria especificação no barramento padrão, com encoder integrado
    pub fn new(family: DeviceFamily, can_id: u8) -> Self {
        Self { family, can_id, bus: None, external_encoder: false, motor_type: None }
    }

    /// SPARK MAX no ID dado
    pub fn spark_max(can_id: u8) -> Self {
        Self::new(DeviceFamily::SparkMax, can_id)
    }

    /// SPARK Flex no ID dado
    pub fn spark_flex(can_id: u8) -> Self {
        Self::new(DeviceFamily::SparkFlex, can_id)
    }

    /// Talon FX no barramento padrão
    pub fn talon_fx(can_id: u8) -> Self {
        Self::new(DeviceFamily::TalonFx, can_id)
    }

    /// Talon FX em barramento nomeado (vazio = padrão)
    pub fn talon_fx_on(can_id: u8, bus: &str) -> Self {
        Self {
            bus: if bus.is_empty() { None } else { Some(bus.to_string()) },
            ..Self::talon_fx(can_id)
        }
    }

    /// Talon SRX no ID dado
    pub fn talon_srx(can_id: u8) -> Self {
        Self::new(DeviceFamily::TalonSrx, can_id)
    }

    /// Usa encoder externo
    pub fn with_external_encoder(mut self) -> Self {
        self.external_encoder = true;
        self
    }

    /// Define tipo de motor (famílias SPARK)
    pub fn with_motor_type(mut self, motor_type: MotorType) -> Self {
        self.motor_type = Some(motor_type);
        self
    }

    /// Tipo de motor efetivo; `None` fora das famílias SPARK
    pub fn effective_motor_type(&self) -> Option<MotorType> {
        if self.family.is_spark() {
            Some(self.motor_type.unwrap_or_default())
        } else {
            None
        }
    }

    /// Valida ID e combinação família/barramento
    pub fn validate(&self) -> MotorResult<()> {
        if self.can_id > MAX_CAN_ID {
            return Err(MotorError::OutOfRange(format!(
                "CAN id must be 0-{}, got {}",
                MAX_CAN_ID, self.can_id
            )));
        }
        if self.bus.is_some() && !self.family.supports_named_bus() {
            return Err(MotorError::InvalidConfig(format!(
                "{} does not support a named CAN bus",
                self.family
            )));
        }
        if self.external_encoder && !self.family.is_spark() {
            return Err(MotorError::InvalidConfig(format!(
                "{} does not support an external encoder",
                self.family
            )));
        }
        if self.motor_type.is_some() && !self.family.is_spark() {
            return Err(MotorError::InvalidConfig(format!(
                "{} does not take a motor type",
                self.family
            )));
        }
        Ok(())
    }
}

/// Constrói o driver concreto para uma especificação.
///
/// Cada integração de fornecedor implementa este trait; a fachada só vê
/// o [`HardwareBackend`] resultante.
pub trait BackendFactory {
    fn create(&self, spec: &DeviceSpec) -> MotorResult<Box<dyn HardwareBackend>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_counts() {
        assert_eq!(DeviceFamily::SparkMax.gain_slot_count(), 4);
        assert_eq!(DeviceFamily::SparkFlex.gain_slot_count(), 4);
        assert_eq!(DeviceFamily::TalonFx.gain_slot_count(), 3);
        assert_eq!(DeviceFamily::TalonSrx.gain_slot_count(), 4);
    }

    #[test]
    fn test_spec_constructors() {
        assert_eq!(DeviceSpec::spark_max(3).family, DeviceFamily::SparkMax);
        assert_eq!(DeviceSpec::talon_srx(9).can_id, 9);
        let fx = DeviceSpec::talon_fx_on(12, "canivore");
        assert_eq!(fx.bus.as_deref(), Some("canivore"));
        assert_eq!(DeviceSpec::talon_fx_on(12, ""), DeviceSpec::talon_fx(12));
        assert!(DeviceSpec::spark_flex(1).with_external_encoder().external_encoder);
    }

    #[test]
    fn test_spec_validate_can_id() {
        assert!(DeviceSpec::spark_max(62).validate().is_ok());
        let err = DeviceSpec::spark_max(63).validate().unwrap_err();
        assert!(matches!(err, MotorError::OutOfRange(_)));
    }

    #[test]
    fn test_spec_validate_bus_and_encoder() {
        assert!(DeviceSpec::talon_fx_on(1, "canivore").validate().is_ok());
        let mut srx = DeviceSpec::talon_srx(1);
        srx.bus = Some("canivore".into());
        assert!(srx.validate().is_err());
        assert!(DeviceSpec::talon_fx(1).with_external_encoder().validate().is_err());
        assert!(DeviceSpec::spark_max(1).with_external_encoder().validate().is_ok());
    }

    #[test]
    fn test_spec_motor_type() {
        assert_eq!(DeviceSpec::spark_max(1).effective_motor_type(), Some(MotorType::Brushless));
        let brushed = DeviceSpec::spark_max(1).with_motor_type(MotorType::Brushed);
        assert!(brushed.validate().is_ok());
        assert_eq!(brushed.effective_motor_type(), Some(MotorType::Brushed));

        assert_eq!(DeviceSpec::talon_fx(1).effective_motor_type(), None);
        let err = DeviceSpec::talon_srx(1).with_motor_type(MotorType::Brushed).validate().unwrap_err();
        assert!(matches!(err, MotorError::InvalidConfig(_)));
    }

    #[test]
    fn test_family_display() {
        assert_eq!(DeviceFamily::TalonFx.to_string(), "Talon FX");
    }
}
