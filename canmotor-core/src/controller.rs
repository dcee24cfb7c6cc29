//! Fachada do controlador de motor

use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use crate::backend::{ActuatorBackend, HardwareBackend};
use crate::clock::Clock;
use crate::error::MotorResult;
use crate::factory::{BackendFactory, DeviceSpec};
use crate::sim::{SimConfig, SimulatedActuator};
use crate::types::{ControlMode, GainSlot, IdleMode, LastCommand, MotorSetpoint, MotorTelemetry};
use crate::units::ConversionFactor;

/// Controlador de motor independente de hardware.
///
/// Único ponto de contato do restante do software com um atuador. Repete
/// comandos idênticos sem tocar o barramento, despacha por modo de controle
/// e lê de volta do dispositivo ou da simulação, escolhidos na construção.
#[derive(Debug)]
pub struct MotorController {
    name: String,
    backend: ActuatorBackend,
    last_command: Option<LastCommand>,
}

impl MotorController {
    /// Controlador ligado a um dispositivo físico
    pub fn hardware(name: &str, device: Box<dyn HardwareBackend>) -> Self {
        info!(name, family = %device.family(), "motor controller on hardware");
        Self {
            name: name.to_string(),
            backend: ActuatorBackend::Hardware(device),
            last_command: None,
        }
    }

    /// Controlador simulado; o dispositivo continua recebendo comandos e
    /// configuração
    pub fn simulated(
        name: &str,
        device: Box<dyn HardwareBackend>,
        config: SimConfig,
        clock: Arc<dyn Clock>,
    ) -> MotorResult<Self> {
        let sim = SimulatedActuator::new(config, clock)?;
        info!(
            name,
            family = %device.family(),
            response_time_factor = config.response_time_factor,
            counts_per_revolution = config.counts_per_revolution,
            "motor controller in simulation"
        );
        Ok(Self {
            name: name.to_string(),
            backend: ActuatorBackend::Simulated { device, sim },
            last_command: None,
        })
    }

    /// Constrói o dispositivo pela fábrica; simula quando `sim` é dado
    pub fn build(
        factory: &dyn BackendFactory,
        name: &str,
        spec: &DeviceSpec,
        sim: Option<(SimConfig, Arc<dyn Clock>)>,
    ) -> MotorResult<Self> {
        let device = factory.create(spec)?;
        match sim {
            Some((config, clock)) => Self::simulated(name, device, config, clock),
            None => Ok(Self::hardware(name, device)),
        }
    }

    /// Retorna o nome do controlador
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Verifica se leituras vêm da simulação
    pub fn is_simulated(&self) -> bool {
        self.backend.is_simulated()
    }

    /// Modelo de simulação, se ativo
    pub fn sim(&self) -> Option<&SimulatedActuator> {
        self.backend.sim()
    }

    /// Acesso direto ao dispositivo, para aplicar configuração em lote
    pub(crate) fn device_mut(&mut self) -> &mut dyn HardwareBackend {
        self.backend.device_mut()
    }

    /// Último comando aceito; `None` antes do primeiro
    pub fn last_command(&self) -> Option<LastCommand> {
        self.last_command
    }

    // ─────────────────────────────────────────────────────────────────────
    // Comando
    // ─────────────────────────────────────────────────────────────────────

    /// Envia `(modo, demanda, feedforward)`.
    ///
    /// Um trio idêntico bit a bit ao último aceito não faz nada: nenhum
    /// quadro no barramento, nenhum setpoint novo. Se o dispositivo rejeitar
    /// o comando o erro é devolvido, o trio não é registrado e a simulação
    /// mantém o setpoint anterior, então o próximo ciclo tenta de novo.
    pub fn set(&mut self, mode: ControlMode, demand: f64, feedforward: f64) -> MotorResult<()> {
        if let Some(last) = &self.last_command {
            if last.is_repeat(mode, demand, feedforward) {
                trace!(name = %self.name, %mode, demand, "duplicate command suppressed");
                return Ok(());
            }
        }

        if let Err(err) = self.backend.send(mode, demand, feedforward) {
            warn!(name = %self.name, %mode, demand, error = %err, "command rejected");
            return Err(err);
        }

        debug!(name = %self.name, %mode, demand, feedforward, "command accepted");
        self.last_command = Some(LastCommand { mode, demand, feedforward });
        Ok(())
    }

    /// `set` sem feedforward
    pub fn set_simple(&mut self, mode: ControlMode, demand: f64) -> MotorResult<()> {
        self.set(mode, demand, 0.0)
    }

    /// Envia um [`MotorSetpoint`] sem feedforward
    pub fn apply(&mut self, setpoint: MotorSetpoint) -> MotorResult<()> {
        self.set(setpoint.mode, setpoint.output, 0.0)
    }

    /// Avança o relógio da simulação. Chamar uma vez por ciclo de controle.
    pub fn update(&mut self) {
        self.backend.update();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Leitura
    // ─────────────────────────────────────────────────────────────────────

    /// Retorna posição atual (unidade física)
    pub fn position(&self) -> f64 {
        self.backend.position()
    }

    /// Retorna velocidade atual (unidade física por segundo)
    pub fn velocity(&self) -> f64 {
        self.backend.velocity()
    }

    /// Retorna saída aplicada (-1.0 a 1.0), lida do dispositivo
    pub fn percent(&self) -> f64 {
        self.backend.device().read_output_percent()
    }

    /// Retorna corrente de saída (A)
    pub fn output_current(&self) -> f64 {
        self.backend.device().read_output_current()
    }

    /// Retorna temperatura do motor (°C)
    pub fn temperature(&self) -> f64 {
        self.backend.device().read_temperature()
    }

    /// Leitura completa do ciclo
    pub fn telemetry(&self) -> MotorTelemetry {
        MotorTelemetry {
            position: self.position(),
            velocity: self.velocity(),
            percent: self.percent(),
            current: self.output_current(),
            temperature: self.temperature(),
        }
    }

    /// Leitura na grandeza que o modo implica
    pub fn output_from_mode(&self, mode: ControlMode) -> f64 {
        match mode {
            ControlMode::PercentOutput | ControlMode::Voltage => self.percent(),
            ControlMode::Position | ControlMode::ProfiledPosition => self.position(),
            ControlMode::Velocity | ControlMode::ProfiledVelocity => self.velocity(),
        }
    }

    /// `|posição − última demanda| < tol`; falso antes do primeiro comando
    pub fn within_tolerance(&self, tolerance: f64) -> bool {
        self.last_command
            .is_some_and(|last| (self.position() - last.demand).abs() < tolerance)
    }

    /// `|velocidade − última demanda| < tol`; falso antes do primeiro comando
    pub fn within_velocity_tolerance(&self, tolerance: f64) -> bool {
        self.last_command
            .is_some_and(|last| (self.velocity() - last.demand).abs() < tolerance)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Configuração (repassada ao dispositivo, que valida)
    // ─────────────────────────────────────────────────────────────────────

    /// Configura P, I e D do slot (F = 0) e persiste
    pub fn set_pid(&mut self, slot: u8, p: f64, i: f64, d: f64) -> MotorResult<()> {
        self.set_pidf(slot, p, i, d, 0.0)
    }

    /// Configura P, I, D e F do slot e persiste
    pub fn set_pidf(&mut self, slot: u8, p: f64, i: f64, d: f64, f: f64) -> MotorResult<()> {
        debug!(name = %self.name, slot, p, i, d, f, "configure gains");
        self.backend.device_mut().configure_gains(slot, p, i, d, f)?;
        self.no_reset_but_update_config()
    }

    /// Configura limites do perfil de movimento do slot e persiste
    pub fn configure_profiled(
        &mut self,
        slot: u8,
        max_velocity: f64,
        max_acceleration: f64,
        tolerance: f64,
    ) -> MotorResult<()> {
        debug!(name = %self.name, slot, max_velocity, max_acceleration, tolerance, "configure profile");
        self.backend
            .device_mut()
            .configure_profile(slot, max_velocity, max_acceleration, tolerance)?;
        self.no_reset_but_update_config()
    }

    /// Ganhos em vigor no dispositivo
    pub fn gains(&self, slot: u8) -> MotorResult<GainSlot> {
        self.backend.device().gains(slot)
    }

    /// Seleciona o slot usado em malha fechada (sem persistir)
    pub fn select_profile_slot(&mut self, slot: u8) -> MotorResult<()> {
        self.backend.device_mut().select_gain_slot(slot)?;
        self.no_reset_and_no_update_config()
    }

    /// Retorna o slot selecionado no dispositivo
    pub fn selected_profile_slot(&self) -> u8 {
        self.backend.device().current_gain_slot()
    }

    /// Define fator de conversão de posição ou velocidade (sem persistir)
    pub fn set_conversion_factor(&mut self, factor: ConversionFactor) -> MotorResult<()> {
        debug!(name = %self.name, domain = ?factor.domain, scale = factor.scale, "conversion factor");
        self.backend.device_mut().set_conversion_factor(factor)?;
        self.no_reset_and_no_update_config()
    }

    /// Define comportamento com saída zero (sem persistir)
    pub fn set_idle_mode(&mut self, mode: IdleMode) -> MotorResult<()> {
        self.backend.device_mut().set_idle_behavior(mode)?;
        self.no_reset_and_no_update_config()
    }

    /// Retorna comportamento com saída zero em vigor
    pub fn idle_mode(&self) -> IdleMode {
        self.backend.device().idle_behavior()
    }

    /// Inverte o sentido de rotação (sem persistir)
    pub fn set_inverted(&mut self, inverted: bool) -> MotorResult<()> {
        self.backend.device_mut().set_inverted(inverted)?;
        self.no_reset_and_no_update_config()
    }

    /// Semeia a posição (unidade física); estado de sensor, sem aplicar
    /// configuração
    pub fn set_encoder_position(&mut self, position: f64) -> MotorResult<()> {
        self.backend.set_encoder_position(position)
    }

    /// Aplica a configuração pendente no dispositivo
    pub fn apply_motor_config(&mut self, reset_to_defaults: bool, persist: bool) -> MotorResult<()> {
        self.backend.device_mut().apply_config(reset_to_defaults, persist)
    }

    /// Restaura padrões de fábrica, aplica e persiste
    pub fn reset_and_update_config(&mut self) -> MotorResult<()> {
        self.apply_motor_config(true, true)
    }

    /// Aplica e persiste
    pub fn no_reset_but_update_config(&mut self) -> MotorResult<()> {
        self.apply_motor_config(false, true)
    }

    /// Aplica sem persistir
    pub fn no_reset_and_no_update_config(&mut self) -> MotorResult<()> {
        self.apply_motor_config(false, false)
    }
}
