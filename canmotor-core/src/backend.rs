//! Capacidades exigidas de um dispositivo e seleção hardware/simulação

use std::fmt::Debug;
use crate::error::MotorResult;
use crate::factory::DeviceFamily;
use crate::sim::SimulatedActuator;
use crate::types::{ControlMode, GainSlot, IdleMode};
use crate::units::{ConversionDomain, ConversionFactor, UnitConverter};

/// Conjunto de capacidades que todo driver de controlador de motor provê.
///
/// Trabalha em unidades do dispositivo: `send` recebe a demanda já
/// convertida, `read_position` devolve contagens e `read_velocity` devolve
/// contagens por minuto. Os fatores de conversão ficam guardados no
/// dispositivo, que é a fonte da verdade para toda a configuração.
pub trait HardwareBackend: Send + Debug {
    /// Família do dispositivo
    fn family(&self) -> DeviceFamily;

    /// Envia um comando de acionamento
    fn send(&mut self, mode: ControlMode, demand: f64, feedforward: f64) -> MotorResult<()>;

    fn read_position(&self) -> f64;
    fn read_velocity(&self) -> f64;
    /// Saída aplicada (-1.0 a 1.0)
    fn read_output_percent(&self) -> f64;
    /// Corrente (A)
    fn read_output_current(&self) -> f64;
    /// Temperatura (°C)
    fn read_temperature(&self) -> f64;

    fn configure_gains(&mut self, slot: u8, p: f64, i: f64, d: f64, f: f64) -> MotorResult<()>;
    fn configure_profile(
        &mut self,
        slot: u8,
        max_velocity: f64,
        max_acceleration: f64,
        tolerance: f64,
    ) -> MotorResult<()>;
    /// Ganhos atualmente aplicados em um slot
    fn gains(&self, slot: u8) -> MotorResult<GainSlot>;

    fn select_gain_slot(&mut self, slot: u8) -> MotorResult<()>;
    fn current_gain_slot(&self) -> u8;

    fn set_conversion_factor(&mut self, factor: ConversionFactor) -> MotorResult<()>;
    fn conversion_factor(&self, domain: ConversionDomain) -> f64;

    fn set_idle_behavior(&mut self, mode: IdleMode) -> MotorResult<()>;
    fn idle_behavior(&self) -> IdleMode;

    fn set_inverted(&mut self, inverted: bool) -> MotorResult<()>;

    /// Semeia a posição do encoder (contagens)
    fn set_encoder_position(&mut self, raw: f64) -> MotorResult<()>;

    /// Aplica a configuração pendente, opcionalmente restaurando padrões de
    /// fábrica antes e persistindo na memória do dispositivo depois
    fn apply_config(&mut self, reset_to_defaults: bool, persist: bool) -> MotorResult<()>;
}

/// Fonte ativa do controlador, escolhida uma única vez na construção
#[derive(Debug)]
pub enum ActuatorBackend {
    /// Dispositivo físico: comandos e leituras passam pelo driver
    Hardware(Box<dyn HardwareBackend>),
    /// Simulação: comandos e configuração continuam chegando ao dispositivo,
    /// mas posição e velocidade vêm do modelo
    Simulated {
        device: Box<dyn HardwareBackend>,
        sim: SimulatedActuator,
    },
}

impl ActuatorBackend {
    /// Verifica se a fonte ativa é a simulação
    pub fn is_simulated(&self) -> bool {
        matches!(self, ActuatorBackend::Simulated { .. })
    }

    /// Dispositivo, em ambos os modos
    pub fn device(&self) -> &dyn HardwareBackend {
        match self {
            ActuatorBackend::Hardware(device) => device.as_ref(),
            ActuatorBackend::Simulated { device, .. } => device.as_ref(),
        }
    }

    /// Dispositivo (mutável), em ambos os modos
    pub fn device_mut(&mut self) -> &mut dyn HardwareBackend {
        match self {
            ActuatorBackend::Hardware(device) => device.as_mut(),
            ActuatorBackend::Simulated { device, .. } => device.as_mut(),
        }
    }

    /// Modelo de simulação, se ativo
    pub fn sim(&self) -> Option<&SimulatedActuator> {
        match self {
            ActuatorBackend::Hardware(_) => None,
            ActuatorBackend::Simulated { sim, .. } => Some(sim),
        }
    }

    /// Demanda em unidades físicas. O dispositivo recebe o valor convertido
    /// pelos seus próprios fatores; o simulador só recebe o valor físico
    /// depois que o dispositivo aceita o comando.
    pub fn send(&mut self, mode: ControlMode, demand: f64, feedforward: f64) -> MotorResult<()> {
        let device = self.device_mut();
        let raw = converter(device).demand_to_raw(mode, demand);
        device.send(mode, raw, feedforward)?;

        if let ActuatorBackend::Simulated { sim, .. } = self {
            sim.set(mode, demand);
        }
        Ok(())
    }

    /// Avança a simulação; nada a fazer com hardware
    pub fn update(&mut self) {
        if let ActuatorBackend::Simulated { sim, .. } = self {
            sim.update();
        }
    }

    /// Posição física, do modelo ou do dispositivo convertido
    pub fn position(&self) -> f64 {
        match self {
            ActuatorBackend::Hardware(device) => {
                converter(device.as_ref()).position_to_physical(device.read_position())
            }
            ActuatorBackend::Simulated { sim, .. } => sim.position(),
        }
    }

    /// Velocidade física por segundo, do modelo ou do dispositivo convertido
    pub fn velocity(&self) -> f64 {
        match self {
            ActuatorBackend::Hardware(device) => {
                converter(device.as_ref()).velocity_to_physical(device.read_velocity())
            }
            ActuatorBackend::Simulated { sim, .. } => sim.velocity(),
        }
    }

    /// Posição física; no simulador rebaseia também o modelo
    pub fn set_encoder_position(&mut self, position: f64) -> MotorResult<()> {
        if let ActuatorBackend::Simulated { sim, .. } = self {
            sim.set_encoder_position(position);
        }

        let device = self.device_mut();
        let raw = converter(device).position_to_raw(position);
        device.set_encoder_position(raw)
    }
}

/// Fatores reportados pelo dispositivo no momento da chamada
fn converter(device: &dyn HardwareBackend) -> UnitConverter {
    UnitConverter::new(
        device.conversion_factor(ConversionDomain::Position),
        device.conversion_factor(ConversionDomain::Velocity),
    )
}
